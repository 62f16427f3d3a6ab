//! Parses catalog descriptor files into a [`Catalog`].

use crate::collections::{Catalog, Collection, DublinCore, Extension};
use crate::error::CatalogError;
use roxmltree::Node;
use std::fs;
use std::path::Path;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Ingests a collection descriptor file, following nested descriptor
/// references. Returns the updated catalog and the identifier of the root
/// collection found at `path`.
pub fn ingest_catalog(
    path: impl AsRef<Path>,
    catalog: Option<Catalog>,
) -> Result<(Catalog, String), CatalogError> {
    let mut catalog = catalog.unwrap_or_default();
    let root = ingest_file(path.as_ref(), &mut catalog)?;
    log::debug!(
        "catalog now holds {} collection(s), {} relationship(s)",
        catalog.collections.len(),
        catalog.relationships.len()
    );
    Ok((catalog, root))
}

fn ingest_file(path: &Path, catalog: &mut Catalog) -> Result<String, CatalogError> {
    let source = fs::read_to_string(path)?;
    let basedir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let parsed = roxmltree::Document::parse(&source)?;
    parse_collection(parsed.root_element(), &basedir, catalog)
}

/// Parses one `collection` or `resource` element, its metadata and its
/// members, recording relationships as they are discovered.
fn parse_collection(
    element: Node,
    basedir: &Path,
    catalog: &mut Catalog,
) -> Result<String, CatalogError> {
    let identifier = element
        .attribute("identifier")
        .ok_or_else(|| {
            CatalogError::Descriptor("collection is missing its identifier attribute".to_string())
        })?
        .to_string();
    let title = child_text(element, "title").ok_or_else(|| {
        CatalogError::Descriptor(format!("collection '{}' has no title", identifier))
    })?;

    let is_resource = element.tag_name().name() == "resource";
    let mut collection = Collection {
        identifier: identifier.clone(),
        title,
        description: child_text(element, "description"),
        dublin_core: Vec::new(),
        extensions: Vec::new(),
        resource: is_resource,
        filepath: None,
    };

    if let Some(filepath) = element.attribute("filepath") {
        if is_resource {
            collection.filepath = Some(basedir.join(filepath));
        }
    }

    for node in grandchildren(element, "dublinCore") {
        collection.dublin_core.push(DublinCore {
            term: node.tag_name().name().to_string(),
            value: node.text().unwrap_or("").to_string(),
            language: node.attribute((XML_NAMESPACE, "lang")).map(str::to_string),
        });
    }

    for node in grandchildren(element, "extension") {
        let namespace = node.tag_name().namespace().unwrap_or("");
        collection.extensions.push(Extension {
            property: format!("{}{}", namespace, node.tag_name().name()),
            value: node.text().unwrap_or("").to_string(),
            language: node.attribute((XML_NAMESPACE, "lang")).map(str::to_string),
        });
    }

    // Explicit parent back-references by identifier.
    for parent in element
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == "parent")
    {
        if let Some(parent_id) = parent.text() {
            catalog
                .relationships
                .push((parent_id.to_string(), identifier.clone()));
        }
    }

    catalog.collections.insert(identifier.clone(), collection);

    for member in grandchildren(element, "members") {
        let child_id = if member
            .children()
            .any(|c| c.is_element() && c.tag_name().name() == "title")
        {
            parse_collection(member, basedir, catalog)?
        } else {
            // A member without inline content references another
            // descriptor file.
            let filepath = member.attribute("filepath").ok_or_else(|| {
                CatalogError::Descriptor(format!(
                    "member of '{}' has neither a title nor a filepath",
                    identifier
                ))
            })?;
            ingest_file(&basedir.join(filepath), catalog)?
        };
        catalog.relationships.push((identifier.clone(), child_id));
    }

    Ok(identifier)
}

fn child_text(element: Node, name: &str) -> Option<String> {
    element
        .children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
        .and_then(|c| c.text())
        .map(str::to_string)
}

fn grandchildren<'a, 'input>(element: Node<'a, 'input>, container: &str) -> Vec<Node<'a, 'input>> {
    element
        .children()
        .filter(|c| c.is_element() && c.tag_name().name() == container)
        .flat_map(|c| c.children().filter(|n| n.is_element()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"<collection identifier="https://foo.bar/default" xmlns:dct="http://purl.org/dc/terms/" xmlns:foo="http://foo.bar/">
        <title>A collection</title>
        <dublinCore>
            <dct:abstract>This is a perfect example of an abstract.</dct:abstract>
            <dct:abstract xml:lang="fr">Et je peux traduire en francais</dct:abstract>
        </dublinCore>
        <members>
            <collection identifier="https://example.org/collection1">
                <title>My First Collection</title>
                <dublinCore>
                    <dct:creator>John Doe</dct:creator>
                </dublinCore>
                <members>
                    <resource identifier="https://example.org/resource1" filepath="texts/resource1.xml">
                        <title>Historical Document</title>
                        <description>A document about historical events.</description>
                        <extension>
                            <foo:source>archive</foo:source>
                        </extension>
                    </resource>
                </members>
            </collection>
            <resource identifier="https://foo.bar/text" filepath="texts/base.xml">
                <title>A simple resource</title>
                <parent>https://example.org/collection1</parent>
            </resource>
        </members>
    </collection>"#;

    fn parse_descriptor(xml: &str) -> (Catalog, String) {
        let parsed = roxmltree::Document::parse(xml).unwrap();
        let mut catalog = Catalog::default();
        let root =
            parse_collection(parsed.root_element(), Path::new("/data"), &mut catalog).unwrap();
        (catalog, root)
    }

    #[test]
    fn test_hierarchy_and_relationships() {
        let (catalog, root) = parse_descriptor(DESCRIPTOR);
        assert_eq!(root, "https://foo.bar/default");
        assert_eq!(catalog.collections.len(), 4);

        assert_eq!(
            catalog.children_of("https://foo.bar/default"),
            vec!["https://example.org/collection1", "https://foo.bar/text"]
        );
        assert_eq!(
            catalog.children_of("https://example.org/collection1"),
            vec!["https://example.org/resource1"]
        );
        // The parent element contributes a second inbound edge.
        assert_eq!(
            catalog.parents_of("https://foo.bar/text"),
            vec!["https://example.org/collection1", "https://foo.bar/default"]
        );
    }

    #[test]
    fn test_metadata() {
        let (catalog, _) = parse_descriptor(DESCRIPTOR);
        let root = &catalog.collections["https://foo.bar/default"];
        assert_eq!(root.dublin_core.len(), 2);
        assert_eq!(root.dublin_core[0].term, "abstract");
        assert_eq!(
            root.dublin_core[0].property(),
            "http://purl.org/dc/terms/abstract"
        );
        assert_eq!(root.dublin_core[0].language, None);
        assert_eq!(root.dublin_core[1].language.as_deref(), Some("fr"));

        let resource = &catalog.collections["https://example.org/resource1"];
        assert_eq!(resource.extensions.len(), 1);
        assert_eq!(resource.extensions[0].property, "http://foo.bar/source");
        assert_eq!(resource.extensions[0].value, "archive");
        assert_eq!(
            resource.description.as_deref(),
            Some("A document about historical events.")
        );
    }

    #[test]
    fn test_resource_filepaths() {
        let (catalog, _) = parse_descriptor(DESCRIPTOR);
        let resource = &catalog.collections["https://example.org/resource1"];
        assert!(resource.resource);
        assert_eq!(
            resource.filepath.as_deref(),
            Some(Path::new("/data/texts/resource1.xml"))
        );
        let collection = &catalog.collections["https://example.org/collection1"];
        assert!(!collection.resource);
        assert!(collection.filepath.is_none());
    }

    #[test]
    fn test_missing_identifier_rejected() {
        let xml = "<collection><title>Untitled</title></collection>";
        let parsed = roxmltree::Document::parse(xml).unwrap();
        let mut catalog = Catalog::default();
        assert!(matches!(
            parse_collection(parsed.root_element(), Path::new("."), &mut catalog),
            Err(CatalogError::Descriptor(_))
        ));
    }
}
