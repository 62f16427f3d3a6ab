//! roxmltree-backed implementation of the locator engine's data source.

use crate::error::TeiError;
use citenav_xpath::{DataSourceNode, NodeType, QName};
use roxmltree::Node;
use std::hash::{Hash, Hasher};

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Wrapper around `roxmltree::Document` providing data source capabilities.
pub struct XmlDocument<'input> {
    doc: roxmltree::Document<'input>,
}

impl<'input> XmlDocument<'input> {
    pub fn parse(text: &'input str) -> Result<Self, TeiError> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self { doc })
    }

    /// The document node: the parent of the root element, matching the
    /// XPath root.
    pub fn root_node(&self) -> XmlNode<'_, 'input> {
        XmlNode::Element(self.doc.root())
    }

    pub fn root_element(&self) -> XmlNode<'_, 'input> {
        XmlNode::Element(self.doc.root_element())
    }
}

/// Either an element/text node or an attribute in the XML tree.
/// Attributes need special handling because roxmltree treats them as data
/// on elements, not as navigable nodes.
#[derive(Debug, Clone, Copy)]
pub enum XmlNode<'a, 'input> {
    /// A regular node (element, text, comment, etc.)
    Element(Node<'a, 'input>),
    /// An attribute, represented by its parent element and the attribute index
    Attribute {
        parent: Node<'a, 'input>,
        index: usize,
    },
}

impl<'a, 'input> XmlNode<'a, 'input> {
    pub fn new(node: Node<'a, 'input>) -> Self {
        XmlNode::Element(node)
    }

    pub fn inner(&self) -> Option<Node<'a, 'input>> {
        match self {
            XmlNode::Element(node) => Some(*node),
            XmlNode::Attribute { .. } => None,
        }
    }

    /// The inner element node, or a serialization error naming `what` for
    /// callers that must copy an element.
    pub fn expect_element(&self, what: &str) -> Result<Node<'a, 'input>, TeiError> {
        match self.inner() {
            Some(node) if node.is_element() => Ok(node),
            _ => Err(TeiError::Serialize(format!(
                "{} did not resolve to an element node",
                what
            ))),
        }
    }
}

impl<'a, 'input> PartialEq for XmlNode<'a, 'input> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (XmlNode::Element(a), XmlNode::Element(b)) => a.id() == b.id(),
            (
                XmlNode::Attribute {
                    parent: p1,
                    index: i1,
                },
                XmlNode::Attribute {
                    parent: p2,
                    index: i2,
                },
            ) => p1.id() == p2.id() && i1 == i2,
            _ => false,
        }
    }
}

impl<'a, 'input> Eq for XmlNode<'a, 'input> {}

impl<'a, 'input> PartialOrd for XmlNode<'a, 'input> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// Node ids are assigned in document order by roxmltree, which makes this
// comparison the document-order predicate the engine relies on.
impl<'a, 'input> Ord for XmlNode<'a, 'input> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (XmlNode::Element(a), XmlNode::Element(b)) => a.id().get().cmp(&b.id().get()),
            (
                XmlNode::Attribute {
                    parent: p1,
                    index: i1,
                },
                XmlNode::Attribute {
                    parent: p2,
                    index: i2,
                },
            ) => match p1.id().get().cmp(&p2.id().get()) {
                std::cmp::Ordering::Equal => i1.cmp(i2),
                other => other,
            },
            // Elements come before their attributes in document order
            (XmlNode::Element(e), XmlNode::Attribute { parent, .. }) => {
                if e.id() == parent.id() {
                    std::cmp::Ordering::Less
                } else {
                    e.id().get().cmp(&parent.id().get())
                }
            }
            (XmlNode::Attribute { parent, .. }, XmlNode::Element(e)) => {
                if parent.id() == e.id() {
                    std::cmp::Ordering::Greater
                } else {
                    parent.id().get().cmp(&e.id().get())
                }
            }
        }
    }
}

impl<'a, 'input> Hash for XmlNode<'a, 'input> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            XmlNode::Element(node) => {
                0u8.hash(state);
                node.id().hash(state);
            }
            XmlNode::Attribute { parent, index } => {
                1u8.hash(state);
                parent.id().hash(state);
                index.hash(state);
            }
        }
    }
}

impl<'a> DataSourceNode<'a> for XmlNode<'a, 'a> {
    fn node_type(&self) -> NodeType {
        match self {
            XmlNode::Element(node) => {
                if node.is_root() {
                    NodeType::Root
                } else if node.is_element() {
                    NodeType::Element
                } else if node.is_text() {
                    NodeType::Text
                } else if node.is_comment() {
                    NodeType::Comment
                } else if node.is_pi() {
                    NodeType::ProcessingInstruction
                } else {
                    NodeType::Element
                }
            }
            XmlNode::Attribute { .. } => NodeType::Attribute,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        match self {
            XmlNode::Element(node) => {
                if !node.tag_name().name().is_empty() {
                    // Documents address TEI elements by local name; the
                    // namespace is carried by the document, not the locator.
                    Some(QName {
                        prefix: None,
                        local_part: node.tag_name().name(),
                    })
                } else if node.is_pi() {
                    node.pi().map(|pi| QName {
                        prefix: None,
                        local_part: pi.target,
                    })
                } else {
                    None
                }
            }
            XmlNode::Attribute { parent, index } => {
                parent.attributes().nth(*index).map(|attr| {
                    let prefix = if attr.namespace() == Some(XML_NAMESPACE) {
                        Some("xml")
                    } else {
                        None
                    };
                    QName {
                        prefix,
                        local_part: attr.name(),
                    }
                })
            }
        }
    }

    fn string_value(&self) -> String {
        match self {
            XmlNode::Element(node) => {
                if node.is_text() {
                    node.text().unwrap_or("").to_string()
                } else if node.is_element() || node.is_root() {
                    node.descendants()
                        .filter(|n| n.is_text())
                        .filter_map(|n| n.text())
                        .collect::<Vec<_>>()
                        .join("")
                } else if node.is_comment() {
                    node.text().unwrap_or("").to_string()
                } else if node.is_pi() {
                    node.pi()
                        .map(|pi| pi.value.unwrap_or(""))
                        .unwrap_or("")
                        .to_string()
                } else {
                    String::new()
                }
            }
            XmlNode::Attribute { parent, index } => parent
                .attributes()
                .nth(*index)
                .map(|attr| attr.value().to_string())
                .unwrap_or_default(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Element(node) => {
                let parent = *node;
                let attr_count = node.attributes().len();
                Box::new((0..attr_count).map(move |index| XmlNode::Attribute { parent, index }))
            }
            XmlNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Element(node) => Box::new(node.children().map(XmlNode::Element)),
            XmlNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn parent(&self) -> Option<Self> {
        match self {
            XmlNode::Element(node) => node.parent().map(XmlNode::Element),
            XmlNode::Attribute { parent, .. } => Some(XmlNode::Element(*parent)),
        }
    }
}
