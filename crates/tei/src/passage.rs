//! Reconstructs a minimal well-formed sub-document for a passage range.
//!
//! Given two locators relative to the document root, the walk descends
//! both in parallel, sharing work while they address the same node,
//! copying the inclusive sibling span where they diverge, and carrying
//! every ancestor up to the document root without its non-passage
//! siblings. A "traversing" step (`.//name`) may consume several levels
//! of unnamed intermediate elements before it resolves.

use crate::error::TeiError;
use crate::writer::PassageElement;
use crate::xml::XmlNode;
use citenav_xpath::{EvaluationContext, evaluate_nodes, parse_expression};

/// Splits a locator on `/`, keeping `//` descent markers attached to the
/// following step as a leading slash.
pub fn split_locator(locator: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending_descent = false;
    for segment in locator.split('/') {
        if segment.is_empty() {
            pending_descent = true;
            continue;
        }
        if pending_descent {
            tokens.push(format!("/{}", segment));
            pending_descent = false;
        } else {
            tokens.push(segment.to_string());
        }
    }
    tokens
}

/// Reconstructs the passage between two locators. Equal locators request a
/// single ref. The returned element is the document's root element wrapped
/// around exactly the passage content.
pub fn reconstruct<'a>(
    doc_root: XmlNode<'a, 'a>,
    start_path: &[String],
    end_path: &[String],
) -> Result<PassageElement, TeiError> {
    if start_path.is_empty() || end_path.is_empty() {
        return Err(TeiError::Passage("empty passage locator".to_string()));
    }

    let walker = PassageWalker { doc_root };

    // Both locators live inside the single document element, so the
    // outermost step always resolves to the same node for start and end.
    let (current_start, queue_start) = xpath_walk(start_path);
    let (node, traversing) = walker.walk_step(doc_root, &current_start)?;
    let queue_start = if traversing {
        start_path.to_vec()
    } else {
        queue_start
    };

    let queue_end = if end_path == start_path {
        queue_start.clone()
    } else {
        let (current_end, queue_end) = xpath_walk(end_path);
        if walker.is_traversing(doc_root, &current_end)? {
            end_path.to_vec()
        } else {
            queue_end
        }
    };

    let mut root_element =
        PassageElement::from_node(node.expect_element("passage root")?, queue_start.is_empty());
    if !queue_start.is_empty() {
        walker.reconstruct_range(node, &mut root_element, &queue_start, &queue_end)?;
    }
    Ok(root_element)
}

struct PassageWalker<'a> {
    doc_root: XmlNode<'a, 'a>,
}

impl<'a> PassageWalker<'a> {
    fn eval(&self, context: XmlNode<'a, 'a>, xpath: &str) -> Result<Vec<XmlNode<'a, 'a>>, TeiError> {
        let expr = parse_expression(xpath)?;
        Ok(evaluate_nodes(
            &expr,
            &EvaluationContext::new(context, self.doc_root),
        )?)
    }

    fn first(&self, context: XmlNode<'a, 'a>, xpath: &str) -> Result<Option<XmlNode<'a, 'a>>, TeiError> {
        Ok(self.eval(context, xpath)?.into_iter().next())
    }

    /// Whether a `.//` step matches deeper than a direct child here: true
    /// when the first match of `.//X` is not the first match of `./X`.
    fn is_traversing(&self, context: XmlNode<'a, 'a>, xpath: &str) -> Result<bool, TeiError> {
        let Some(rest) = xpath.strip_prefix(".//") else {
            return Ok(false);
        };
        let deep = self.first(context, xpath)?;
        let direct = self.first(context, &format!("./{}", rest))?;
        Ok(match (deep, direct) {
            (Some(a), Some(b)) => a != b,
            _ => true,
        })
    }

    /// Resolves one walk step against a context node. For a traversing
    /// step the result is the direct child containing the match, and the
    /// step stays valid one level deeper (`true` in the returned pair).
    fn walk_step(
        &self,
        context: XmlNode<'a, 'a>,
        xpath: &str,
    ) -> Result<(XmlNode<'a, 'a>, bool), TeiError> {
        if xpath.starts_with(".//") && self.is_traversing(context, xpath)? {
            let node = self
                .first(context, &format!("./*[{}]", xpath))?
                .ok_or_else(|| no_match(xpath))?;
            return Ok((node, true));
        }
        let node = self.first(context, xpath)?.ok_or_else(|| no_match(xpath))?;
        Ok((node, false))
    }

    /// One level of the parallel descent. `root` is the shared context the
    /// current heads are resolved against; copies attach to `parent`.
    fn reconstruct_range(
        &self,
        root: XmlNode<'a, 'a>,
        parent: &mut PassageElement,
        start_path: &[String],
        end_path: &[String],
    ) -> Result<(), TeiError> {
        let (current_start, queue_start) = xpath_walk(start_path);
        let (result_start, start_traversing) = self.walk_step(root, &current_start)?;
        let queue_start = if start_traversing {
            start_path.to_vec()
        } else {
            queue_start
        };

        // While a traversing head is being consumed with identical paths,
        // the end side shares everything with the start side.
        let (current_end, queue_end) = if start_traversing && end_path == start_path {
            (current_start.clone(), queue_start.clone())
        } else {
            xpath_walk(end_path)
        };

        let same_node = start_path == end_path || {
            let a = self.first(root, &current_start)?;
            let b = self.first(root, &current_end)?;
            a.is_some() && a == b
        };

        if same_node {
            let mut copied = PassageElement::from_node(
                result_start.expect_element("passage step")?,
                queue_start.is_empty(),
            );
            let queue_end = if start_path != end_path && self.is_traversing(root, &current_end)? {
                end_path.to_vec()
            } else {
                queue_end
            };
            if !queue_start.is_empty() {
                self.reconstruct_range(result_start, &mut copied, &queue_start, &queue_end)?;
            }
            parent.push_element(copied);
            return Ok(());
        }

        // The paths diverge here: copy start's subtree, every sibling
        // strictly between the two subtrees, then end's subtree.
        let (result_end, end_traversing) = self.walk_step(root, &current_end)?;
        let queue_end = if end_traversing {
            end_path.to_vec()
        } else {
            queue_end
        };

        let mut copied_start = PassageElement::from_node(
            result_start.expect_element("range start")?,
            queue_start.is_empty(),
        );
        if !queue_start.is_empty() {
            self.reconstruct_range(result_start, &mut copied_start, &queue_start, &queue_start)?;
        }
        parent.push_element(copied_start);

        let sibling_start = sibling_step(&current_start, start_traversing);
        let sibling_end = sibling_step(&current_end, end_traversing);
        let between = format!(
            "./*[preceding-sibling::{} and following-sibling::{}]",
            sibling_start, sibling_end
        );
        for sibling in self.eval(root, &between)? {
            parent.push_element(PassageElement::from_node(
                sibling.expect_element("range sibling")?,
                true,
            ));
        }

        let mut copied_end = PassageElement::from_node(
            result_end.expect_element("range end")?,
            queue_end.is_empty(),
        );
        if !queue_end.is_empty() {
            self.reconstruct_range(result_end, &mut copied_end, &queue_end, &queue_end)?;
        }
        parent.push_element(copied_end);

        Ok(())
    }
}

/// Builds the walkable head for the first token of a locator tail: the
/// head constrained by the existence of the remaining steps.
fn xpath_walk(tokens: &[String]) -> (String, Vec<String>) {
    if tokens.len() > 1 {
        let tail = tokens[1..].to_vec();
        (
            format!("./{}[./{}]", tokens[0], tail.join("/")),
            tail,
        )
    } else {
        (format!("./{}", tokens[0]), Vec::new())
    }
}

/// Rewrites a walk head into a form usable on the sibling axes when
/// bridging between the start and end subtrees.
fn sibling_step(current: &str, traversing: bool) -> String {
    if traversing && current.starts_with(".//") {
        format!("*[{}]", current)
    } else if let Some(rest) = current.strip_prefix(".//") {
        rest.to_string()
    } else {
        current.strip_prefix("./").unwrap_or(current).to_string()
    }
}

fn no_match(xpath: &str) -> TeiError {
    TeiError::NonTraversable(format!("no node matches walk step '{}'", xpath))
}
