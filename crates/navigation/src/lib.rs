//! Reference-tree data model and navigation queries.
//!
//! A citation tree is the enumerated hierarchy of citable units of one
//! document (book → chapter → verse …). This crate owns the unit/tree
//! types, the path index mapping each reference to its position in the
//! tree, and the `get_nav` query engine answering range and depth queries
//! over it.

pub mod error;
pub mod path;
pub mod query;
pub mod tree;

pub use error::NavError;
pub use path::{PathIndex, get_member_by_path};
pub use query::{NavQuery, Navigation, get_nav};
pub use tree::{
    CitableStructure, CitableUnit, CitationTree, CiteData, DUBLIN_CORE_TERMS, MetadataBucket,
};
