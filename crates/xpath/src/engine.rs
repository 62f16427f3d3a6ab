//! The evaluation engine for executing a parsed locator AST against a
//! generic `DataSourceNode`.

use super::ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step};
use super::axes;
use super::functions;
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use std::collections::HashSet;

/// The possible result types of an expression evaluation.
#[derive(Debug, Clone)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<N> XPathValue<N> {
    /// Coerces the value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the value to a number as per XPath 1.0 rules.
    pub fn to_number<'a>(&self) -> f64
    where
        N: DataSourceNode<'a>,
    {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => {
                let s = nodes.first().map(|n| n.string_value()).unwrap_or_default();
                s.trim().parse().unwrap_or(f64::NAN)
            }
        }
    }

    /// Coerces the value to a string as per XPath 1.0 rules: a node set
    /// stringifies to its first node's string value.
    pub fn to_string_value<'a>(&self) -> String
    where
        N: DataSourceNode<'a>,
    {
        match self {
            XPathValue::NodeSet(nodes) => {
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            }
            XPathValue::String(s) => s.clone(),
            XPathValue::Number(n) => n.to_string(),
            XPathValue::Boolean(b) => b.to_string(),
        }
    }

    /// The XPath type name of the value, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            XPathValue::NodeSet(_) => "node-set",
            XPathValue::String(_) => "string",
            XPathValue::Number(_) => "number",
            XPathValue::Boolean(_) => "boolean",
        }
    }
}

/// All state needed during expression evaluation.
/// `'a` is the lifetime of the underlying document.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<N> {
    pub context_node: N,
    pub root_node: N,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
}

impl<N: Copy> EvaluationContext<N> {
    pub fn new(context_node: N, root_node: N) -> Self {
        Self {
            context_node,
            root_node,
            context_position: 1,
            context_size: 1,
        }
    }

    fn at(&self, node: N, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            root_node: self.root_node,
            context_position: position,
            context_size: size,
        }
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            let right_val = evaluate(right, e_ctx)?;
            evaluate_binary_op(*op, left_val, right_val)
        }
    }
}

/// Evaluates an expression that is expected to select nodes.
/// Convenience for callers that only ever deal in node sets.
pub fn evaluate_nodes<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match evaluate(expr, e_ctx)? {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        other => Err(XPathError::Type(format!(
            "expected a node set, got a {}",
            other.kind()
        ))),
    }
}

/// Evaluates an expression and returns the first selected node, if any.
pub fn first_node<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<N>,
) -> Result<Option<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    Ok(evaluate_nodes(expr, e_ctx)?.into_iter().next())
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    // A relative path with no steps refers to the context node itself.
    if path.steps.is_empty() && !path.is_absolute {
        return Ok(vec![e_ctx.context_node]);
    }

    let initial_context = if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    let mut current_nodes = initial_context;
    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// Evaluates a single step by chaining axis collection, node testing, and
/// predicate application.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    // The abbreviated step '.' means the context node set itself.
    if step.axis == Axis::SelfAxis && step.node_test == NodeTest::Name(".".to_string()) {
        return Ok(context_nodes.to_vec());
    }

    let axis_nodes = collect_axis_nodes(step.axis, context_nodes);
    let tested_nodes = filter_by_node_test(&axis_nodes, &step.node_test, step.axis);
    apply_predicates(&tested_nodes, &step.predicates, e_ctx)
}

/// Stage 1: collects all unique nodes from the context set along an axis.
fn collect_axis_nodes<'a, N>(axis: Axis, context_nodes: &[N]) -> Vec<N>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut result_nodes = Vec::new();
    let mut seen = HashSet::new();

    for &node in context_nodes {
        match axis {
            Axis::Child => axes::collect_child_nodes(node, &mut seen, &mut result_nodes),
            Axis::Attribute => axes::collect_attribute_nodes(node, &mut seen, &mut result_nodes),
            Axis::Descendant => axes::collect_descendant_nodes(node, &mut seen, &mut result_nodes),
            Axis::DescendantOrSelf => {
                axes::collect_descendant_or_self_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::Parent => axes::collect_parent_nodes(node, &mut seen, &mut result_nodes),
            Axis::Ancestor => axes::collect_ancestor_nodes(node, &mut seen, &mut result_nodes),
            Axis::SelfAxis => axes::collect_self_nodes(node, &mut seen, &mut result_nodes),
            Axis::FollowingSibling => {
                axes::collect_following_sibling_nodes(node, &mut seen, &mut result_nodes)
            }
            Axis::PrecedingSibling => {
                axes::collect_preceding_sibling_nodes(node, &mut seen, &mut result_nodes)
            }
        }
    }
    result_nodes
}

/// Stage 2: filters a set of nodes based on a `NodeTest`.
fn filter_by_node_test<'a, N>(nodes: &[N], test: &NodeTest, axis: Axis) -> Vec<N>
where
    N: DataSourceNode<'a> + 'a,
{
    nodes
        .iter()
        .filter(|&node| match test {
            NodeTest::Wildcard => match axis {
                Axis::Attribute => node.node_type() == NodeType::Attribute,
                _ => node.node_type() == NodeType::Element,
            },
            NodeTest::Name(name_to_test) => node.name().is_some_and(|q_name| {
                match name_to_test.split_once(':') {
                    // A prefixed test such as xml:id must match both parts.
                    Some((prefix, local)) => {
                        q_name.prefix == Some(prefix) && q_name.local_part == local
                    }
                    None => q_name.prefix.is_none() && q_name.local_part == name_to_test,
                }
            }),
            NodeTest::NodeType(ntt) => match ntt {
                NodeTypeTest::Text => node.node_type() == NodeType::Text,
                NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
                NodeTypeTest::ProcessingInstruction => {
                    node.node_type() == NodeType::ProcessingInstruction
                }
                NodeTypeTest::Node => true,
            },
        })
        .copied()
        .collect()
}

/// Stage 3: filters a set of nodes by applying a series of predicates.
fn apply_predicates<'a, N>(
    nodes: &[N],
    predicates: &[Expression],
    e_ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut final_nodes = nodes.to_vec();
    for predicate in predicates {
        let mut predicate_results = Vec::new();
        let context_size = final_nodes.len();
        for (i, node) in final_nodes.iter().enumerate() {
            let predicate_e_ctx = e_ctx.at(*node, i + 1, context_size);
            let result = evaluate(predicate, &predicate_e_ctx)?;
            let keep = match result {
                // A bare number predicate selects by position.
                XPathValue::Number(n) => (n as usize) == (i + 1),
                _ => result.to_bool(),
            };
            if keep {
                predicate_results.push(*node);
            }
        }
        final_nodes = predicate_results;
    }
    Ok(final_nodes)
}

/// Comparison and logical operators, with the node-set coercions of
/// XPath 1.0 section 3.4.
fn evaluate_binary_op<'a, N>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let result = match op {
        BinaryOperator::Or => left.to_bool() || right.to_bool(),
        BinaryOperator::And => left.to_bool() && right.to_bool(),
        BinaryOperator::Equals => compare_equality(&left, &right),
        BinaryOperator::NotEquals => !compare_equality(&left, &right),
        BinaryOperator::LessThan => compare_numeric(&left, &right, |a, b| a < b),
        BinaryOperator::LessThanOrEqual => compare_numeric(&left, &right, |a, b| a <= b),
        BinaryOperator::GreaterThan => compare_numeric(&left, &right, |a, b| a > b),
        BinaryOperator::GreaterThanOrEqual => compare_numeric(&left, &right, |a, b| a >= b),
    };
    Ok(XPathValue::Boolean(result))
}

fn compare_equality<'a, N>(left: &XPathValue<N>, right: &XPathValue<N>) -> bool
where
    N: DataSourceNode<'a> + 'a,
{
    match (left, right) {
        // Node-set comparisons are existential: true if ANY node matches.
        (XPathValue::NodeSet(nodes), other) | (other, XPathValue::NodeSet(nodes)) => {
            match other {
                XPathValue::NodeSet(other_nodes) => {
                    let values: HashSet<String> =
                        other_nodes.iter().map(|n| n.string_value()).collect();
                    nodes.iter().any(|n| values.contains(&n.string_value()))
                }
                XPathValue::String(s) => nodes.iter().any(|n| n.string_value() == *s),
                XPathValue::Number(v) => nodes.iter().any(|n| {
                    n.string_value().trim().parse::<f64>().is_ok_and(|x| x == *v)
                }),
                XPathValue::Boolean(b) => !nodes.is_empty() == *b,
            }
        }
        (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => {
            left.to_bool() == right.to_bool()
        }
        (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
            left.to_number() == right.to_number()
        }
        (XPathValue::String(a), XPathValue::String(b)) => a == b,
    }
}

fn compare_numeric<'a, N, F>(left: &XPathValue<N>, right: &XPathValue<N>, cmp: F) -> bool
where
    N: DataSourceNode<'a> + 'a,
    F: Fn(f64, f64) -> bool,
{
    cmp(left.to_number(), right.to_number())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, create_test_tree};
    use crate::parser::parse_expression;

    fn ctx<'a>(
        tree: &'a crate::datasource::tests::MockTree<'a>,
    ) -> EvaluationContext<MockNode<'a>> {
        let root = MockNode { id: 0, tree };
        EvaluationContext::new(root, root)
    }

    fn eval_ids(expr: &str, e_ctx: &EvaluationContext<MockNode>) -> Vec<usize> {
        let parsed = parse_expression(expr).unwrap();
        evaluate_nodes(&parsed, e_ctx)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect()
    }

    #[test]
    fn test_absolute_descendant_path() {
        let tree = create_test_tree();
        let e_ctx = ctx(&tree);
        assert_eq!(eval_ids("//body/div", &e_ctx), vec![2, 10]);
    }

    #[test]
    fn test_predicate_by_attribute() {
        let tree = create_test_tree();
        let e_ctx = ctx(&tree);
        assert_eq!(eval_ids("//body/div[@n='Luke']", &e_ctx), vec![2]);
        assert_eq!(eval_ids("//body/div[@n='Mark']", &e_ctx), vec![10]);
    }

    #[test]
    fn test_predicate_by_position() {
        let tree = create_test_tree();
        let luke = MockNode { id: 2, tree: &tree };
        let root = MockNode { id: 0, tree: &tree };
        let e_ctx = EvaluationContext::new(luke, root);

        assert_eq!(eval_ids("./div[position()=2]", &e_ctx), vec![6]);
        assert_eq!(eval_ids("./div[2]", &e_ctx), vec![6]);
        assert_eq!(eval_ids("./l[position()=1]", &e_ctx), vec![8]);
    }

    #[test]
    fn test_attribute_selection() {
        let tree = create_test_tree();
        let e_ctx = ctx(&tree);
        let parsed = parse_expression("//body/div/@n").unwrap();
        let result = evaluate(&parsed, &e_ctx).unwrap();
        let XPathValue::NodeSet(nodes) = result else {
            panic!("Expected node set");
        };
        let values: Vec<String> = nodes.iter().map(|n| n.string_value()).collect();
        assert_eq!(values, vec!["Luke", "Mark"]);
    }

    #[test]
    fn test_sibling_bridge_predicate() {
        let tree = create_test_tree();
        let luke = MockNode { id: 2, tree: &tree };
        let root = MockNode { id: 0, tree: &tree };
        let e_ctx = EvaluationContext::new(luke, root);

        // Everything strictly between the first div and the l element.
        assert_eq!(
            eval_ids(
                "./*[preceding-sibling::div[position()=1] and following-sibling::l]",
                &e_ctx
            ),
            vec![6]
        );
    }

    #[test]
    fn test_relative_descendant_existence() {
        let tree = create_test_tree();
        let e_ctx = ctx(&tree);
        // The child of the root that contains a body anywhere below: body itself
        // is the direct child here.
        assert_eq!(eval_ids("./*[.//div[@n='Luke']]", &e_ctx), vec![1]);
    }

    #[test]
    fn test_count_function() {
        let tree = create_test_tree();
        let e_ctx = ctx(&tree);
        let parsed = parse_expression("count(//body/div)").unwrap();
        let result = evaluate(&parsed, &e_ctx).unwrap();
        assert_eq!(result.to_number(), 2.0);
    }

    #[test]
    fn test_last_function() {
        let tree = create_test_tree();
        let luke = MockNode { id: 2, tree: &tree };
        let root = MockNode { id: 0, tree: &tree };
        let e_ctx = EvaluationContext::new(luke, root);
        assert_eq!(eval_ids("./div[position()=last()]", &e_ctx), vec![6]);
    }
}
