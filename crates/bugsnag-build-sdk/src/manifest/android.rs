//! AndroidManifest.xml extraction
//!
//! The manifest is loaded into a loose [`ManifestNode`] tree, then every
//! node found under a `meta-data` key is collected no matter how deeply the
//! element is nested. The `android:name` / `android:value` pairs of those
//! nodes are folded into a map, and the three Bugsnag keys are projected
//! into [`BuildOptions`].

use crate::types::{BuildOptions, NotifyError, Platform};
use std::collections::HashMap;
use std::path::Path;

/// Metadata name holding the API key.
pub const API_KEY_NAME: &str = "com.bugsnag.android.API_KEY";
/// Metadata name holding the app version.
pub const APP_VERSION_NAME: &str = "com.bugsnag.android.APP_VERSION";
/// Metadata name holding the release stage.
pub const RELEASE_STAGE_NAME: &str = "com.bugsnag.android.RELEASE_STAGE";

const META_DATA_KEY: &str = "meta-data";
const NAME_ATTR: &str = "android:name";
const VALUE_ATTR: &str = "android:value";
const CONTENT_KEY: &str = "content";

/// A loosely typed XML tree.
///
/// The root element itself is dropped. An element becomes a `Mapping`
/// whose entries are its attributes (as `Leaf` values, keyed by qualified
/// name such as `android:name`) followed by its child elements grouped by
/// tag name into a `Sequence`. Non-blank text is stored under `content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestNode {
    Leaf(String),
    Sequence(Vec<ManifestNode>),
    Mapping(Vec<(String, ManifestNode)>),
}

impl ManifestNode {
    /// Returns the first entry with the given key, if this is a mapping.
    pub fn get(&self, key: &str) -> Option<&ManifestNode> {
        match self {
            ManifestNode::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns the text of a leaf node.
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            ManifestNode::Leaf(value) => Some(value),
            _ => None,
        }
    }
}

/// A single `android:name` / `android:value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub name: String,
    pub value: Option<String>,
}

/// Reads and parses an Android manifest from disk.
pub fn parse_file(path: &Path) -> Result<ManifestNode, NotifyError> {
    let not_found = || NotifyError::ManifestNotFound {
        platform: Platform::Android,
        path: path.to_path_buf(),
    };
    let contents = std::fs::read_to_string(path).map_err(|err| {
        tracing::debug!(?path, %err, "cannot read android manifest");
        not_found()
    })?;
    parse_str(&contents).map_err(|err| {
        tracing::debug!(?path, %err, "android manifest is not valid xml");
        not_found()
    })
}

/// Parses manifest XML text into a [`ManifestNode`] tree.
pub fn parse_str(xml: &str) -> Result<ManifestNode, roxmltree::Error> {
    let document = roxmltree::Document::parse(xml)?;
    Ok(element_to_node(document.root_element()))
}

fn element_to_node(element: roxmltree::Node<'_, '_>) -> ManifestNode {
    let mut entries: Vec<(String, ManifestNode)> = element
        .attributes()
        .map(|attr| {
            (
                qualified_name(element, attr.namespace(), attr.name()),
                ManifestNode::Leaf(attr.value().to_string()),
            )
        })
        .collect();
    let mut text = String::new();

    for child in element.children() {
        if child.is_element() {
            let tag = child.tag_name();
            let name = qualified_name(child, tag.namespace(), tag.name());
            let node = element_to_node(child);
            let existing = entries.iter_mut().find_map(|(key, value)| match value {
                ManifestNode::Sequence(items) if *key == name => Some(items),
                _ => None,
            });
            match existing {
                Some(items) => items.push(node),
                None => entries.push((name, ManifestNode::Sequence(vec![node]))),
            }
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let text = text.trim();
    if !text.is_empty() {
        entries.push((CONTENT_KEY.to_string(), ManifestNode::Leaf(text.to_string())));
    }

    ManifestNode::Mapping(entries)
}

fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

/// Collects every node stored under a `meta-data` key, depth first.
///
/// Sequences under a `meta-data` key are flattened so the result only holds
/// the element nodes themselves. Nodes under a `meta-data` key are not
/// searched further.
pub fn collect_meta_data(root: &ManifestNode) -> Vec<&ManifestNode> {
    let mut found = Vec::new();
    walk(root, &mut found);
    found
}

fn walk<'a>(node: &'a ManifestNode, found: &mut Vec<&'a ManifestNode>) {
    match node {
        ManifestNode::Sequence(items) => {
            for item in items {
                walk(item, found);
            }
        }
        ManifestNode::Mapping(entries) => {
            for (key, value) in entries {
                if key == META_DATA_KEY {
                    flatten(value, found);
                } else {
                    walk(value, found);
                }
            }
        }
        ManifestNode::Leaf(_) => {}
    }
}

fn flatten<'a>(node: &'a ManifestNode, found: &mut Vec<&'a ManifestNode>) {
    match node {
        ManifestNode::Sequence(items) => {
            for item in items {
                flatten(item, found);
            }
        }
        other => found.push(other),
    }
}

/// Reads the name/value pair of each collected `meta-data` node.
///
/// Nodes without an `android:name` are skipped.
pub fn metadata_entries(root: &ManifestNode) -> Vec<MetadataEntry> {
    collect_meta_data(root)
        .into_iter()
        .filter_map(|node| {
            let name = node.get(NAME_ATTR)?.as_leaf()?;
            Some(MetadataEntry {
                name: name.to_string(),
                value: node
                    .get(VALUE_ATTR)
                    .and_then(ManifestNode::as_leaf)
                    .map(str::to_string),
            })
        })
        .collect()
}

/// Folds metadata entries into a map; the last entry for a name wins.
pub fn metadata_map(entries: Vec<MetadataEntry>) -> HashMap<String, Option<String>> {
    entries
        .into_iter()
        .map(|entry| (entry.name, entry.value))
        .collect()
}

/// Projects the recognized Bugsnag metadata keys into build options.
pub fn options_from_tree(root: &ManifestNode) -> BuildOptions {
    let mut meta = metadata_map(metadata_entries(root));
    let mut take = |name: &str| meta.remove(name).flatten();
    BuildOptions {
        api_key: take(API_KEY_NAME),
        app_version: take(APP_VERSION_NAME),
        release_stage: take(RELEASE_STAGE_NAME),
        ..BuildOptions::default()
    }
}
