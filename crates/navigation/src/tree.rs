//! The citation-tree data model.

use crate::path::PathIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property URI prefix classifying metadata into the Dublin Core bucket.
pub const DUBLIN_CORE_TERMS: &str = "http://purl.org/dc/terms/";

/// A metadata binding declared on a citation level: an xpath producing
/// string values relative to a matched unit, and the property key they are
/// stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiteData {
    pub xpath: String,
    pub property: String,
}

/// Which metadata map of a unit a property belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataBucket {
    DublinCore,
    Extension,
}

impl CiteData {
    /// Properties under the Dublin Core terms URI classify into the
    /// `dublinCore` bucket, everything else into `extension`.
    pub fn bucket(&self) -> MetadataBucket {
        if self.property.starts_with(DUBLIN_CORE_TERMS) {
            MetadataBucket::DublinCore
        } else {
            MetadataBucket::Extension
        }
    }
}

/// One declared level of a citation tree: the semantic unit name, the
/// locator fragments selecting candidate nodes and their identifiers, the
/// delimiter joining this level's identifier to its parent's, and the
/// declared child levels.
///
/// Immutable once the grammar that owns it is compiled. Serializes to the
/// DTS `citeStructure` JSON shape (unit names and nesting only).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitableStructure {
    #[serde(rename = "citeType")]
    pub cite_type: String,
    #[serde(skip)]
    pub match_expr: String,
    #[serde(skip)]
    pub use_expr: String,
    #[serde(skip)]
    pub delim: String,
    #[serde(rename = "citeStructure", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CitableStructure>,
    #[serde(skip)]
    pub metadata: Vec<CiteData>,
}

/// One node of the enumerated reference tree.
///
/// `reference` is the fully qualified identifier (e.g. `Mark 1:3`),
/// `parent` the reference of the containing unit, `level` the 1-based
/// depth. Children appear in document order even when heterogeneous child
/// structures produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitableUnit {
    #[serde(rename = "citeType")]
    pub cite_type: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub level: usize,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(rename = "members", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CitableUnit>,
    #[serde(
        rename = "dublinCore",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dublin_core: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extension: BTreeMap<String, Vec<String>>,
}

impl CitableUnit {
    pub fn new(cite_type: &str, reference: &str, parent: Option<&str>, level: usize) -> Self {
        Self {
            cite_type: cite_type.to_string(),
            reference: reference.to_string(),
            level,
            parent: parent.map(str::to_string),
            children: Vec::new(),
            dublin_core: BTreeMap::new(),
            extension: BTreeMap::new(),
        }
    }

    /// Appends a metadata value, preserving occurrence order for
    /// multi-valued properties.
    pub fn add_metadata(&mut self, bucket: MetadataBucket, property: &str, value: String) {
        let map = match bucket {
            MetadataBucket::DublinCore => &mut self.dublin_core,
            MetadataBucket::Extension => &mut self.extension,
        };
        map.entry(property.to_string()).or_default().push(value);
    }

    /// A copy of this unit without its members; navigation answers are
    /// unit summaries, not sub-trees.
    pub fn summary(&self) -> CitableUnit {
        CitableUnit {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

/// A named reference tree for a document: the compiled structure
/// declaration, the enumerated top-level units, and the path index over
/// the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CitationTree {
    /// `None` addresses the document's default tree.
    pub name: Option<String>,
    pub structure: CitableStructure,
    pub units: Vec<CitableUnit>,
    pub path_index: PathIndex,
}

impl CitationTree {
    pub fn new(
        name: Option<String>,
        structure: CitableStructure,
        units: Vec<CitableUnit>,
    ) -> Self {
        let path_index = PathIndex::from_units(&units);
        Self {
            name,
            structure,
            units,
            path_index,
        }
    }

    /// Answers a navigation query over this tree. See [`crate::get_nav`].
    pub fn navigate(
        &self,
        start_or_ref: Option<&str>,
        end: Option<&str>,
        down: Option<i64>,
    ) -> Result<crate::Navigation, crate::NavError> {
        crate::get_nav(&self.units, &self.path_index, start_or_ref, end, down)
    }
}
