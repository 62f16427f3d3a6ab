// --- Module Structure ---
// `citenav-xpath`:      the locator expression language (parser + engine)
//                       over a generic document abstraction.
// `citenav-navigation`: reference-tree data model, path index, and the
//                       navigation query engine.
// `citenav-tei`:        TEI documents: citation-grammar compilation,
//                       reference enumeration, passage reconstruction.
// `citenav-catalog`:    catalog descriptor ingestion.
// `citenav-store`:      reference-store contract and ingestion driver.
// --- Public API ---
// The root crate re-exposes the pieces a server embeds: the document
// façade, the navigation engine, and the ingestion path from a catalog
// into a reference store.

pub use citenav_catalog::{Catalog, CatalogError, Collection, ingest_catalog};
pub use citenav_navigation::{
    CitableStructure, CitableUnit, CitationTree, CiteData, NavError, NavQuery, Navigation,
    PathIndex, get_member_by_path, get_nav,
};
pub use citenav_store::{
    IngestSummary, MemoryStore, NavigationRecord, ReferenceStore, StoreError, TreeKey,
    ingest_catalog_documents, navigation_record,
};
pub use citenav_tei::{CitationGrammar, PassageElement, TeiDocument, TeiError};
pub use citenav_xpath::{XPathError, parse_expression};
