//! The core abstraction for a navigable, read-only document tree.
use std::hash::Hash;

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

/// The type of a node, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The contract for a node in a read-only, hierarchical document.
///
/// The grammar compiler, reference resolver and passage reconstructor are
/// all written against this trait rather than a concrete XML library. The
/// `Ord` implementation MUST order nodes by document position; branch
/// merging and traversing-step detection rely on it.
///
/// `'a` is the lifetime of the underlying document (e.g. the XML string).
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The type of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The qualified name of the node. Returns `None` for node types that do
    /// not have names, such as text or root nodes.
    fn name(&self) -> Option<QName<'a>>;

    /// The string value of the node, as defined by the XPath 1.0 `string()`
    /// function: text content for text nodes, concatenated descendant text
    /// for elements, the value for attributes.
    fn string_value(&self) -> String;

    /// An iterator over the attribute nodes of this node.
    /// Empty for non-element nodes.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// An iterator over the child nodes of this node, in document order.
    /// Empty for leaf nodes (like text or attributes).
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. `None` for the root.
    fn parent(&self) -> Option<Self>;
}

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::collections::HashMap;
    use std::hash::Hasher;

    #[derive(Debug, Clone)]
    struct MockNodeData<'a> {
        node_type: NodeType,
        name: Option<QName<'a>>,
        value: String,
        children: Vec<usize>,
        attributes: Vec<usize>,
    }

    #[derive(Debug)]
    pub struct MockTree<'a> {
        nodes: HashMap<usize, MockNodeData<'a>>,
        parent_map: HashMap<usize, usize>,
    }

    /// An in-memory node that holds a reference to its tree so it can
    /// navigate itself. Node ids are assigned in document order, which makes
    /// the derived `Ord` the document-order comparison the engine expects.
    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree<'a>,
    }

    impl<'a> PartialEq for MockNode<'a> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl<'a> Eq for MockNode<'a> {}

    impl<'a> PartialOrd for MockNode<'a> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl<'a> Ord for MockNode<'a> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl<'a> Hash for MockNode<'a> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.tree.nodes[&self.id].node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            self.tree.nodes[&self.id].name
        }

        fn string_value(&self) -> String {
            self.tree.nodes[&self.id].value.clone()
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            let attribute_ids = tree.nodes[&self.id].attributes.clone();
            Box::new(
                attribute_ids
                    .into_iter()
                    .map(move |id| MockNode { id, tree }),
            )
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            let children_ids = tree.nodes[&self.id].children.clone();
            Box::new(
                children_ids
                    .into_iter()
                    .map(move |id| MockNode { id, tree }),
            )
        }

        fn parent(&self) -> Option<Self> {
            self.tree.parent_map.get(&self.id).map(|&pid| MockNode {
                id: pid,
                tree: self.tree,
            })
        }
    }

    /// Builds a miniature citable document for engine tests:
    /// <root>                         <!-- id 0 -->
    ///   <body>                       <!-- id 1 -->
    ///     <div n="Luke">             <!-- id 2, attr 3 -->
    ///       <div>Text</div>          <!-- id 4, text 5 -->
    ///       <div>Text 2</div>        <!-- id 6, text 7 -->
    ///       <l>Text 3</l>            <!-- id 8, text 9 -->
    ///     </div>
    ///     <div n="Mark"/>            <!-- id 10, attr 11 -->
    ///   </body>
    /// </root>
    pub fn create_test_tree<'a>() -> MockTree<'a> {
        struct Builder<'a> {
            nodes: HashMap<usize, MockNodeData<'a>>,
            parent_map: HashMap<usize, usize>,
        }

        impl<'a> Builder<'a> {
            fn element(
                &mut self,
                id: usize,
                parent: usize,
                name: &'a str,
                value: &str,
                children: Vec<usize>,
                attributes: Vec<usize>,
            ) {
                self.nodes.insert(
                    id,
                    MockNodeData {
                        node_type: NodeType::Element,
                        name: Some(QName {
                            prefix: None,
                            local_part: name,
                        }),
                        value: value.to_string(),
                        children,
                        attributes,
                    },
                );
                self.parent_map.insert(id, parent);
            }

            fn attr(&mut self, id: usize, parent: usize, name: &'a str, value: &str) {
                self.nodes.insert(
                    id,
                    MockNodeData {
                        node_type: NodeType::Attribute,
                        name: Some(QName {
                            prefix: None,
                            local_part: name,
                        }),
                        value: value.to_string(),
                        children: vec![],
                        attributes: vec![],
                    },
                );
                self.parent_map.insert(id, parent);
            }

            fn text(&mut self, id: usize, parent: usize, value: &str) {
                self.nodes.insert(
                    id,
                    MockNodeData {
                        node_type: NodeType::Text,
                        name: None,
                        value: value.to_string(),
                        children: vec![],
                        attributes: vec![],
                    },
                );
                self.parent_map.insert(id, parent);
            }
        }

        let mut b = Builder {
            nodes: HashMap::new(),
            parent_map: HashMap::new(),
        };
        b.nodes.insert(
            0,
            MockNodeData {
                node_type: NodeType::Root,
                name: None,
                value: "TextText 2Text 3".to_string(),
                children: vec![1],
                attributes: vec![],
            },
        );
        b.element(1, 0, "body", "TextText 2Text 3", vec![2, 10], vec![]);
        b.element(2, 1, "div", "TextText 2Text 3", vec![4, 6, 8], vec![3]);
        b.attr(3, 2, "n", "Luke");
        b.element(4, 2, "div", "Text", vec![5], vec![]);
        b.text(5, 4, "Text");
        b.element(6, 2, "div", "Text 2", vec![7], vec![]);
        b.text(7, 6, "Text 2");
        b.element(8, 2, "l", "Text 3", vec![9], vec![]);
        b.text(9, 8, "Text 3");
        b.element(10, 1, "div", "", vec![], vec![11]);
        b.attr(11, 10, "n", "Mark");

        MockTree {
            nodes: b.nodes,
            parent_map: b.parent_map,
        }
    }
}
