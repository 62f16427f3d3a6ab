//! The reference-store contract: per-resource persistence of enumerated
//! reference trees and their path indexes, plus the catalog ingestion
//! driver that fills a store.

pub mod error;
pub mod ingest;
pub mod memory;
pub mod record;

pub use error::StoreError;
pub use ingest::{IngestSummary, ingest_catalog_documents, navigation_record};
pub use memory::MemoryStore;
pub use record::{NavigationRecord, ReferenceStore, TreeKey};
