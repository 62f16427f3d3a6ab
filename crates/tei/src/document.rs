//! The document façade: owns the XML source, compiles every declared
//! citation grammar eagerly, and answers passage and enumeration requests.

use crate::error::TeiError;
use crate::grammar::CitationGrammar;
use crate::passage::{reconstruct, split_locator};
use crate::resolver::find_refs;
use crate::writer::PassageElement;
use crate::xml::XmlDocument;
use citenav_navigation::CitationTree;
use std::fs;
use std::path::Path;

/// A TEI document with its compiled citation grammars.
///
/// The source text is owned and re-parsed per request; the compiled
/// grammars borrow nothing from the tree, so the document is immutable and
/// freely shareable after construction.
pub struct TeiDocument {
    source: String,
    entries: Vec<TreeEntry>,
    default_index: usize,
}

struct TreeEntry {
    name: Option<String>,
    grammar: CitationGrammar,
}

impl TeiDocument {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TeiError> {
        let path = path.as_ref();
        log::debug!("loading TEI document from {}", path.display());
        let source = fs::read_to_string(path)?;
        Self::from_source(source)
    }

    /// Parses the document and compiles every
    /// `/TEI/teiHeader/refsDecl[citeStructure]` grammar. The declaration
    /// carrying `default="true"` becomes the default tree; absent that,
    /// the first declared one.
    pub fn from_source(source: String) -> Result<Self, TeiError> {
        let mut entries = Vec::new();
        let mut default_index = None;

        {
            let parsed = roxmltree::Document::parse(&source)?;
            let refs_decls = parsed
                .root()
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "TEI")
                .flat_map(|tei| {
                    tei.children()
                        .filter(|n| n.is_element() && n.tag_name().name() == "teiHeader")
                })
                .flat_map(|header| {
                    header
                        .children()
                        .filter(|n| n.is_element() && n.tag_name().name() == "refsDecl")
                })
                .filter(|decl| {
                    decl.children()
                        .any(|c| c.is_element() && c.tag_name().name() == "citeStructure")
                });

            for refs_decl in refs_decls {
                let grammar = CitationGrammar::compile(refs_decl)?;
                if refs_decl.attribute("default") == Some("true") && default_index.is_none() {
                    default_index = Some(entries.len());
                }
                entries.push(TreeEntry {
                    name: refs_decl.attribute("n").map(str::to_string),
                    grammar,
                });
            }
        }

        log::debug!(
            "document declares {} citation tree(s): [{}]",
            entries.len(),
            entries
                .iter()
                .map(|e| e.name.as_deref().unwrap_or("<default>"))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            source,
            entries,
            default_index: default_index.unwrap_or(0),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of the declared trees, in declaration order.
    pub fn tree_names(&self) -> Vec<Option<&str>> {
        self.entries.iter().map(|e| e.name.as_deref()).collect()
    }

    /// The name of the default tree, or `None` when the document declares
    /// no citation tree at all.
    pub fn default_tree(&self) -> Option<Option<&str>> {
        self.entries
            .get(self.default_index)
            .map(|e| e.name.as_deref())
    }

    /// The compiled grammar for a tree name; `None` addresses the default
    /// tree.
    pub fn grammar(&self, tree: Option<&str>) -> Result<&CitationGrammar, TeiError> {
        let entry = match tree {
            Some(name) => self
                .entries
                .iter()
                .find(|e| e.name.as_deref() == Some(name)),
            None => self.entries.get(self.default_index),
        };
        entry
            .map(|e| &e.grammar)
            .ok_or_else(|| TeiError::UnknownTree(tree.unwrap_or("default").to_string()))
    }

    /// Enumerates the reference tree of every declared grammar, path index
    /// included.
    pub fn reference_trees(&self) -> Result<Vec<CitationTree>, TeiError> {
        let parsed = XmlDocument::parse(&self.source)?;
        let mut trees = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let units = find_refs(parsed.root_node(), &entry.grammar)?;
            trees.push(CitationTree::new(
                entry.name.clone(),
                entry.grammar.structure().clone(),
                units,
            ));
        }
        Ok(trees)
    }

    /// Retrieves a passage as a reconstructed sub-document.
    ///
    /// With both `ref_or_start` and `end` unset, the whole document comes
    /// back. A single ref reconstructs that unit; a range reconstructs
    /// everything between the two boundaries inclusive.
    pub fn get_passage(
        &self,
        ref_or_start: Option<&str>,
        end: Option<&str>,
        tree: Option<&str>,
    ) -> Result<PassageElement, TeiError> {
        let parsed = XmlDocument::parse(&self.source)?;

        let Some(start) = ref_or_start else {
            if end.is_some() {
                return Err(TeiError::Passage(
                    "a range requires a start reference".to_string(),
                ));
            }
            let root = parsed
                .root_element()
                .expect_element("document root element")?;
            return Ok(PassageElement::from_node(root, true));
        };

        let grammar = self.grammar(tree)?;
        let start_locator = grammar.to_locator(start)?;
        let start_tokens = split_locator(&start_locator);
        let end_tokens = match end {
            Some(end_ref) => split_locator(&grammar.to_locator(end_ref)?),
            None => start_tokens.clone(),
        };

        log::debug!(
            "reconstructing passage [{}] .. [{}]",
            start_tokens.join(" / "),
            end_tokens.join(" / ")
        );

        reconstruct(parsed.root_node(), &start_tokens, &end_tokens)
    }
}
