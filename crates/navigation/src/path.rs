//! The path index: an order-preserving map from each reference to the
//! sequence of child indices locating its unit in the tree.

use crate::tree::CitableUnit;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Maps `ref → [i0, i1, …]` such that
/// `units[i0].children[i1].children[i2]…` lands on the unit bearing that
/// ref. Iteration order equals document order of the references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathIndex {
    entries: Vec<(String, Vec<usize>)>,
    positions: HashMap<String, usize>,
}

impl PathIndex {
    /// Walks a reference tree in document order and records every unit's
    /// index path.
    pub fn from_units(units: &[CitableUnit]) -> Self {
        fn recurse(
            units: &[CitableUnit],
            prefix: &[usize],
            entries: &mut Vec<(String, Vec<usize>)>,
        ) {
            for (index, unit) in units.iter().enumerate() {
                let mut path = prefix.to_vec();
                path.push(index);
                entries.push((unit.reference.clone(), path.clone()));
                recurse(&unit.children, &path, entries);
            }
        }

        let mut entries = Vec::new();
        recurse(units, &[], &mut entries);
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<(String, Vec<usize>)>) -> Self {
        let positions = entries
            .iter()
            .enumerate()
            .map(|(i, (reference, _))| (reference.clone(), i))
            .collect();
        Self { entries, positions }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The index path recorded for a reference.
    pub fn get(&self, reference: &str) -> Option<&[usize]> {
        self.positions
            .get(reference)
            .map(|&i| self.entries[i].1.as_slice())
    }

    /// The document-order position of a reference within the index.
    pub fn position(&self, reference: &str) -> Option<usize> {
        self.positions.get(reference).copied()
    }

    /// The (reference, path) entry at a document-order position.
    pub fn entry(&self, index: usize) -> (&str, &[usize]) {
        let (reference, path) = &self.entries[index];
        (reference, path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.entries
            .iter()
            .map(|(reference, path)| (reference.as_str(), path.as_slice()))
    }
}

/// Walks a unit slice by stepwise indexing: every intermediate step enters
/// the unit's children, the terminal step returns the unit itself.
pub fn get_member_by_path<'u>(
    units: &'u [CitableUnit],
    path: &[usize],
) -> Option<&'u CitableUnit> {
    let (&first, rest) = path.split_first()?;
    let mut current = units.get(first)?;
    for &index in rest {
        current = current.children.get(index)?;
    }
    Some(current)
}

// The index serializes as a JSON object in insertion order so document
// order round-trips through the store.
impl Serialize for PathIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (reference, path) in &self.entries {
            map.serialize_entry(reference, path)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PathIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PathIndexVisitor;

        impl<'de> Visitor<'de> for PathIndexVisitor {
            type Value = PathIndex;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from reference to index path")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((reference, path)) = access.next_entry::<String, Vec<usize>>()? {
                    entries.push((reference, path));
                }
                Ok(PathIndex::from_entries(entries))
            }
        }

        deserializer.deserialize_map(PathIndexVisitor)
    }
}
