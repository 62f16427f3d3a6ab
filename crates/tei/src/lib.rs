//! TEI document handling: citation-grammar compilation, reference-tree
//! enumeration, and passage reconstruction.
//!
//! A document declares one or more citation grammars under
//! `/TEI/teiHeader/refsDecl`. Compiling a grammar yields a two-way
//! translator between human-readable references ("Luke 1:2") and locator
//! expressions; walking the document with it yields the ordered tree of
//! citable units; and any ref or range translates back into a minimal
//! well-formed sub-document.

pub mod document;
pub mod error;
pub mod grammar;
pub mod passage;
pub mod resolver;
pub mod writer;
pub mod xml;

pub use document::TeiDocument;
pub use error::TeiError;
pub use grammar::CitationGrammar;
pub use passage::{reconstruct, split_locator};
pub use resolver::find_refs;
pub use writer::{PassageElement, PassageNode};
pub use xml::{XmlDocument, XmlNode};
