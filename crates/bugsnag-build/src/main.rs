fn main() -> anyhow::Result<()> {
    bugsnag_build::run()
}
