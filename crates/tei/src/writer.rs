//! The detached output tree built by the passage reconstructor, and its
//! event-based XML serialization.

use crate::error::TeiError;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use roxmltree::Node;

use crate::xml::XML_NAMESPACE;

/// A node of the reconstructed passage tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassageNode {
    Element(PassageElement),
    Text(String),
    Comment(String),
}

/// An element of the reconstructed passage tree, detached from any source
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassageElement {
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<PassageNode>,
}

impl PassageElement {
    /// Copies an element's name, namespace and attributes; children only
    /// when `deep`.
    pub fn from_node(node: Node, deep: bool) -> Self {
        let attributes = node
            .attributes()
            .map(|attr| {
                let name = if attr.namespace() == Some(XML_NAMESPACE) {
                    format!("xml:{}", attr.name())
                } else {
                    attr.name().to_string()
                };
                (name, attr.value().to_string())
            })
            .collect();

        let mut element = Self {
            name: node.tag_name().name().to_string(),
            namespace: node.tag_name().namespace().map(str::to_string),
            attributes,
            children: Vec::new(),
        };
        if deep {
            element.children = copy_children(node);
        }
        element
    }

    pub fn push_element(&mut self, child: PassageElement) {
        self.children.push(PassageNode::Element(child));
    }

    /// Serializes the tree as a standalone document fragment. The default
    /// namespace is declared wherever it changes from the inherited one,
    /// which for a TEI passage means once on the root element.
    pub fn to_xml_string(&self) -> Result<String, TeiError> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self, None)?;
        let bytes = writer.into_inner();
        String::from_utf8(bytes).map_err(|e| TeiError::Serialize(e.to_string()))
    }
}

fn copy_children(node: Node) -> Vec<PassageNode> {
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(PassageNode::Element(PassageElement::from_node(child, true)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                children.push(PassageNode::Text(text.to_string()));
            }
        } else if child.is_comment() {
            if let Some(comment) = child.text() {
                children.push(PassageNode::Comment(comment.to_string()));
            }
        }
        // Processing instructions are not carried into passages.
    }
    children
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &PassageElement,
    inherited_ns: Option<&str>,
) -> Result<(), TeiError> {
    let mut start = BytesStart::new(element.name.as_str());
    if element.namespace.as_deref() != inherited_ns {
        start.push_attribute(("xmlns", element.namespace.as_deref().unwrap_or("")));
    }
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| TeiError::Serialize(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| TeiError::Serialize(e.to_string()))?;
    for child in &element.children {
        match child {
            PassageNode::Element(child_element) => {
                write_element(writer, child_element, element.namespace.as_deref())?;
            }
            PassageNode::Text(text) => {
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(|e| TeiError::Serialize(e.to_string()))?;
            }
            PassageNode::Comment(comment) => {
                // Comment content is written verbatim, not entity-escaped.
                writer
                    .write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))
                    .map_err(|e| TeiError::Serialize(e.to_string()))?;
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| TeiError::Serialize(e.to_string()))?;
    Ok(())
}
