//! Stored record shapes and the store contract.

use citenav_navigation::{CitableUnit, PathIndex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::StoreError;

/// Key addressing one of a resource's citation trees. The default tree
/// has no name; it round-trips through JSON as the literal string "null".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TreeKey(pub Option<String>);

impl TreeKey {
    pub fn default_tree() -> Self {
        TreeKey(None)
    }

    pub fn named(name: impl Into<String>) -> Self {
        TreeKey(Some(name.into()))
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<&str>> for TreeKey {
    fn from(name: Option<&str>) -> Self {
        TreeKey(name.map(str::to_string))
    }
}

impl fmt::Display for TreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_deref().unwrap_or("null"))
    }
}

impl Serialize for TreeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_deref().unwrap_or("null"))
    }
}

impl<'de> Deserialize<'de> for TreeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == "null" {
            TreeKey(None)
        } else {
            TreeKey(Some(raw))
        })
    }
}

/// What the store keeps per resource: the enumerated reference tree and
/// the path index of every citation tree, keyed by tree name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigationRecord {
    pub references: BTreeMap<TreeKey, Vec<CitableUnit>>,
    pub paths: BTreeMap<TreeKey, PathIndex>,
}

impl NavigationRecord {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// The units of one tree; `None` addresses the default tree.
    pub fn references_for(&self, tree: Option<&str>) -> Option<&[CitableUnit]> {
        self.references
            .get(&TreeKey::from(tree))
            .map(Vec::as_slice)
    }

    pub fn paths_for(&self, tree: Option<&str>) -> Option<&PathIndex> {
        self.paths.get(&TreeKey::from(tree))
    }
}

/// The persistence contract the core writes through during ingestion and
/// reads through during queries. A `put_navigation` call is atomic per
/// resource.
pub trait ReferenceStore {
    fn put_navigation(&mut self, resource: &str, record: &NavigationRecord)
    -> Result<(), StoreError>;

    fn navigation(&self, resource: &str) -> Result<Option<NavigationRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_key_sentinel_round_trip() {
        let json = serde_json::to_string(&TreeKey::default_tree()).unwrap();
        assert_eq!(json, "\"null\"");
        let back: TreeKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TreeKey(None));

        let json = serde_json::to_string(&TreeKey::named("nums")).unwrap();
        assert_eq!(json, "\"nums\"");
        let back: TreeKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_deref(), Some("nums"));
    }

    #[test]
    fn test_record_round_trip_with_null_key() {
        let mut record = NavigationRecord::default();
        let unit = CitableUnit::new("book", "Luke", None, 1);
        let index = PathIndex::from_units(std::slice::from_ref(&unit));
        record
            .references
            .insert(TreeKey::default_tree(), vec![unit.clone()]);
        record
            .references
            .insert(TreeKey::named("nums"), vec![unit.clone()]);
        record.paths.insert(TreeKey::default_tree(), index);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["references"].get("null").is_some());
        assert!(json["references"].get("nums").is_some());

        let back: NavigationRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.references_for(None).unwrap()[0].reference, "Luke");
        assert_eq!(back.references_for(Some("nums")).unwrap().len(), 1);
    }
}
