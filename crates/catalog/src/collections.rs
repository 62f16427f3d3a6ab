//! Collection and metadata types produced by catalog ingestion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Property URI prefix of Dublin Core terms.
pub const DC_TERMS: &str = "http://purl.org/dc/terms/";

/// A Dublin Core metadata statement, addressed by its bare term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DublinCore {
    pub term: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl DublinCore {
    /// The full property URI of this statement.
    pub fn property(&self) -> String {
        format!("{}{}", DC_TERMS, self.term)
    }
}

/// A metadata statement outside the Dublin Core terms, addressed by its
/// full namespace-qualified property URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub property: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A collection or resource of the catalog. A resource points at a
/// document on disk via `filepath`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub identifier: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dublin_core: Vec<DublinCore>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
    pub resource: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<PathBuf>,
}

/// The ingested catalog: every collection by identifier, plus the
/// (parent, child) identifier pairs in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub collections: BTreeMap<String, Collection>,
    pub relationships: Vec<(String, String)>,
}

impl Catalog {
    /// The resources of the catalog, i.e. the leaves bearing documents.
    pub fn resources(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values().filter(|c| c.resource)
    }

    /// Identifiers of the children of a collection, in discovery order.
    pub fn children_of(&self, identifier: &str) -> Vec<&str> {
        self.relationships
            .iter()
            .filter(|(parent, _)| parent == identifier)
            .map(|(_, child)| child.as_str())
            .collect()
    }

    /// Identifiers of the parents of a collection, in discovery order.
    pub fn parents_of(&self, identifier: &str) -> Vec<&str> {
        self.relationships
            .iter()
            .filter(|(_, child)| child == identifier)
            .map(|(parent, _)| parent.as_str())
            .collect()
    }
}
