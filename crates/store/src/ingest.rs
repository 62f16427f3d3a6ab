//! Walks a catalog, enumerates every resource document, and writes one
//! navigation record per resource to the store.

use crate::error::StoreError;
use crate::record::{NavigationRecord, ReferenceStore, TreeKey};
use citenav_catalog::Catalog;
use citenav_tei::TeiDocument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Resources whose navigation was stored.
    pub resources: usize,
    /// Citation trees enumerated across them (null-key aliases excluded).
    pub trees: usize,
}

/// Ingests every resource of a catalog. Resources without a filepath or
/// without citation trees are skipped; each stored record is written in
/// one `put_navigation` call.
pub fn ingest_catalog_documents(
    catalog: &Catalog,
    store: &mut impl ReferenceStore,
) -> Result<IngestSummary, StoreError> {
    let mut summary = IngestSummary::default();

    for resource in catalog.resources() {
        let Some(path) = &resource.filepath else {
            log::warn!(
                "resource '{}' has no filepath, skipping",
                resource.identifier
            );
            continue;
        };

        let document = TeiDocument::from_file(path)?;
        let tree_count = document.tree_names().len();
        let record = navigation_record(&document)?;
        if record.is_empty() {
            log::debug!(
                "resource '{}' declares no citation tree, skipping",
                resource.identifier
            );
            continue;
        }

        store.put_navigation(&resource.identifier, &record)?;
        summary.resources += 1;
        summary.trees += tree_count;
        log::info!(
            "stored navigation for '{}' ({} tree(s))",
            resource.identifier,
            tree_count
        );
    }

    Ok(summary)
}

/// Builds the stored record for one document: every declared tree under
/// its name, with the default tree also addressable under the null key.
pub fn navigation_record(document: &TeiDocument) -> Result<NavigationRecord, StoreError> {
    let default = document.default_tree();
    let mut record = NavigationRecord::default();

    for tree in document.reference_trees()? {
        if default == Some(tree.name.as_deref()) && tree.name.is_some() {
            record
                .references
                .insert(TreeKey::default_tree(), tree.units.clone());
            record
                .paths
                .insert(TreeKey::default_tree(), tree.path_index.clone());
        }
        let key = TreeKey(tree.name.clone());
        record.paths.insert(key.clone(), tree.path_index);
        record.references.insert(key, tree.units);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use citenav_navigation::get_nav;

    const MULTI_TREE: &str = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
    <teiHeader>
        <refsDecl n="nums" default="true">
            <citeStructure unit="book" match="//body/div" use="@n"/>
        </refsDecl>
        <refsDecl n="alpha">
            <citeStructure unit="book" match="//body/div" use="@xml:id"/>
        </refsDecl>
    </teiHeader>
    <text>
    <body>
        <div xml:id="div-a1" n="I"><p>one</p></div>
        <div xml:id="div-002" n="1"><p>two</p></div>
    </body>
    </text>
    </TEI>"#;

    #[test]
    fn test_default_tree_stored_under_null_key() {
        let document = TeiDocument::from_source(MULTI_TREE.to_string()).unwrap();
        let record = navigation_record(&document).unwrap();

        // The unnamed key sorts first.
        let keys: Vec<String> = record.references.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["null", "alpha", "nums"]);

        // The null key aliases the default tree.
        assert_eq!(
            record.references_for(None),
            record.references_for(Some("nums"))
        );
        let alpha: Vec<&str> = record
            .references_for(Some("alpha"))
            .unwrap()
            .iter()
            .map(|u| u.reference.as_str())
            .collect();
        assert_eq!(alpha, vec!["div-a1", "div-002"]);
    }

    #[test]
    fn test_stored_record_supports_navigation() {
        let document = TeiDocument::from_source(MULTI_TREE.to_string()).unwrap();
        let record = navigation_record(&document).unwrap();

        let units = record.references_for(None).unwrap();
        let paths = record.paths_for(None).unwrap();
        let nav = get_nav(units, paths, None, None, Some(1)).unwrap();
        let refs: Vec<&str> = nav.members.iter().map(|m| m.reference.as_str()).collect();
        assert_eq!(refs, vec!["I", "1"]);
    }
}
