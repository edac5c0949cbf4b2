//! Manifest extraction for Android and Apple platforms.
//!
//! Build metadata is read from the platform's build descriptor:
//!
//! | Platform | File | Fields |
//! |----------|------|--------|
//! | Android | `AndroidManifest.xml` | `apiKey`, `appVersion`, `releaseStage` |
//! | iOS / macOS | `Info.plist` | `apiKey` |
//!
//! File parsing sits behind the [`ManifestParser`] trait so the extraction
//! rules can be exercised against in-memory trees. [`FileManifestParser`]
//! is the implementation used outside of tests.
//!
//! ## Example
//!
//! ```ignore
//! use bugsnag_build_sdk::manifest::{read_manifest, FileManifestParser};
//! use bugsnag_build_sdk::Platform;
//! use std::path::Path;
//!
//! let options = read_manifest(
//!     &FileManifestParser,
//!     Platform::Android,
//!     Path::new("app/src/main/AndroidManifest.xml"),
//! )?;
//! println!("api key: {:?}", options.api_key);
//! # Ok::<(), bugsnag_build_sdk::NotifyError>(())
//! ```

pub mod android;
pub mod ios;

pub use android::{ManifestNode, MetadataEntry};

use crate::types::{BuildOptions, NotifyError, Platform};
use std::path::Path;

/// Reads structured manifest files.
pub trait ManifestParser {
    /// Parses an XML document into a [`ManifestNode`] tree.
    ///
    /// Fails with [`NotifyError::ManifestNotFound`] when the file is missing
    /// or is not well-formed XML.
    fn parse_xml(&self, path: &Path) -> Result<ManifestNode, NotifyError>;

    /// Looks up a top-level string entry in a property list.
    ///
    /// Returns `Ok(None)` when the key is absent or not a string.
    fn plist_string(
        &self,
        platform: Platform,
        path: &Path,
        key: &str,
    ) -> Result<Option<String>, NotifyError>;
}

/// Parses manifests from disk using `roxmltree` and `plist`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileManifestParser;

impl ManifestParser for FileManifestParser {
    fn parse_xml(&self, path: &Path) -> Result<ManifestNode, NotifyError> {
        android::parse_file(path)
    }

    fn plist_string(
        &self,
        platform: Platform,
        path: &Path,
        key: &str,
    ) -> Result<Option<String>, NotifyError> {
        ios::read_string(platform, path, key)
    }
}

/// Extracts the build options carried by a platform manifest.
pub fn read_manifest<P: ManifestParser + ?Sized>(
    parser: &P,
    platform: Platform,
    path: &Path,
) -> Result<BuildOptions, NotifyError> {
    let options = match platform {
        Platform::Android => {
            let root = parser.parse_xml(path)?;
            android::options_from_tree(&root)
        }
        Platform::Ios | Platform::Mac => {
            let api_key = parser.plist_string(platform, path, ios::API_KEY_ENTRY)?;
            ios::options_from_api_key(api_key)
        }
    };
    tracing::debug!(%platform, ?path, ?options, "read manifest options");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Parser that serves canned results and records plist lookups.
    struct FakeParser {
        tree: ManifestNode,
        plist: Option<String>,
        lookups: RefCell<Vec<String>>,
    }

    impl ManifestParser for FakeParser {
        fn parse_xml(&self, _path: &Path) -> Result<ManifestNode, NotifyError> {
            Ok(self.tree.clone())
        }

        fn plist_string(
            &self,
            _platform: Platform,
            _path: &Path,
            key: &str,
        ) -> Result<Option<String>, NotifyError> {
            self.lookups.borrow_mut().push(key.to_string());
            Ok(self.plist.clone())
        }
    }

    fn meta(name: &str, value: &str) -> ManifestNode {
        ManifestNode::Mapping(vec![
            ("android:name".into(), ManifestNode::Leaf(name.into())),
            ("android:value".into(), ManifestNode::Leaf(value.into())),
        ])
    }

    #[test]
    fn android_reads_tree_from_parser() {
        let parser = FakeParser {
            tree: ManifestNode::Mapping(vec![(
                "meta-data".into(),
                ManifestNode::Sequence(vec![meta(android::API_KEY_NAME, "abc123")]),
            )]),
            plist: None,
            lookups: RefCell::new(Vec::new()),
        };
        let options = read_manifest(&parser, Platform::Android, Path::new("m.xml")).unwrap();
        assert_eq!(options.api_key.as_deref(), Some("abc123"));
        assert!(parser.lookups.borrow().is_empty());
    }

    #[test]
    fn apple_platforms_read_api_key_from_plist() {
        for platform in [Platform::Ios, Platform::Mac] {
            let parser = FakeParser {
                tree: ManifestNode::Mapping(Vec::new()),
                plist: Some("plist-key".into()),
                lookups: RefCell::new(Vec::new()),
            };
            let options = read_manifest(&parser, platform, Path::new("Info.plist")).unwrap();
            assert_eq!(
                options,
                BuildOptions {
                    api_key: Some("plist-key".into()),
                    ..BuildOptions::default()
                }
            );
            assert_eq!(*parser.lookups.borrow(), vec!["BugsnagAPIKey".to_string()]);
        }
    }

    #[test]
    fn missing_plist_key_yields_empty_options() {
        let parser = FakeParser {
            tree: ManifestNode::Mapping(Vec::new()),
            plist: None,
            lookups: RefCell::new(Vec::new()),
        };
        let options = read_manifest(&parser, Platform::Ios, Path::new("Info.plist")).unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn file_parser_reports_missing_android_manifest() {
        let err = read_manifest(
            &FileManifestParser,
            Platform::Android,
            Path::new("/definitely/missing/AndroidManifest.xml"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            NotifyError::ManifestNotFound {
                platform: Platform::Android,
                ..
            }
        ));
    }
}
