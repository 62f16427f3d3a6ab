//! A `nom`-based parser for the locator expression language.

use super::ast::*;
use crate::error::XPathError;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, peek, recognize},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated},
};

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(XPathError::Parse(
            input.to_string(),
            format!("parser did not consume all input, remainder: '{}'", rem),
        )),
        Err(e) => Err(XPathError::Parse(input.to_string(), e.to_string())),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Left-associative chain of a sub-expression parser joined by operators.
fn binary_chain<'a, F, G>(sub: F, op: G) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Fn(&'a str) -> IResult<&'a str, Expression> + Copy,
    G: Fn(&'a str) -> IResult<&'a str, BinaryOperator> + Copy,
{
    move |input: &'a str| {
        let (input, mut left) = sub(input)?;
        let (input, remainder) = many0(pair(ws(op), sub))(input)?;

        for (op, right) in remainder {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(tag("or"), |_| BinaryOperator::Or)(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(tag("and"), |_| BinaryOperator::And)(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(equality_expr, and_op)(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
    ))(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag("&lt;="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("&gt;="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag("&lt;"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
        map(tag("&gt;"), |_| BinaryOperator::GreaterThan),
    ))(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(path_expr, relational_op)(input)
}

/// Handles the ambiguity between location paths and primary expressions.
/// A function call like `position()` is a primary expression, but the more
/// general `location_path` parser would happily consume `position` as a
/// step name before the function parser sees the `()`.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    alt((primary_expr, map(location_path, Expression::LocationPath)))(input)
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(double, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))(input)
}

// --- Literal Parsers ---
fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )(input)
}

// --- Name and NodeTest Parsers ---
fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
    ))(input)
}

fn q_name(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(nc_name, opt(pair(tag(":"), nc_name)))),
        |s: &str| s.to_string(),
    )(input)
}

fn node_type_test(input: &str) -> IResult<&str, NodeTest> {
    map(
        terminated(
            alt((
                tag("text"),
                tag("node"),
                tag("comment"),
                tag("processing-instruction"),
            )),
            pair(ws(char('(')), ws(char(')'))),
        ),
        |node_type: &str| match node_type {
            "text" => NodeTest::NodeType(NodeTypeTest::Text),
            "comment" => NodeTest::NodeType(NodeTypeTest::Comment),
            "processing-instruction" => NodeTest::NodeType(NodeTypeTest::ProcessingInstruction),
            _ => NodeTest::NodeType(NodeTypeTest::Node), // "node"
        },
    )(input)
}

pub fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        map(tag("*"), |_| NodeTest::Wildcard),
        node_type_test,
        map(q_name, NodeTest::Name),
    ))(input)
}

// --- Path Parsers ---
fn axis(input: &str) -> IResult<&str, Axis> {
    map(
        pair(
            alt((
                tag("child"),
                tag("descendant-or-self"),
                tag("descendant"),
                tag("attribute"),
                tag("parent"),
                tag("ancestor"),
                tag("self"),
                tag("following-sibling"),
                tag("preceding-sibling"),
            )),
            tag("::"),
        ),
        |(axis_str, _)| match axis_str {
            "descendant-or-self" => Axis::DescendantOrSelf,
            "descendant" => Axis::Descendant,
            "attribute" => Axis::Attribute,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "self" => Axis::SelfAxis,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            _ => Axis::Child, // child
        },
    )(input)
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']')))(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    let (i, (axis, node_test)) = alt((
        map(tag("."), |_| {
            (Axis::SelfAxis, NodeTest::Name(".".to_string()))
        }),
        map(preceded(char('@'), node_test), |nt| (Axis::Attribute, nt)),
        map(pair(opt(axis), node_test), |(ax, nt)| {
            (ax.unwrap_or(Axis::Child), nt)
        }),
    ))(input)?;
    let (i, predicates) = many0(predicate)(i)?;
    Ok((
        i,
        Step {
            axis,
            node_test,
            predicates,
        },
    ))
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (i, (is_absolute, first_step)) =
        if let Ok((rem, _)) = tag::<&str, &str, nom::error::Error<&str>>("//")(input) {
            let (rem, step) = step(rem)?;
            let initial_steps = vec![
                Step {
                    axis: Axis::DescendantOrSelf,
                    node_test: NodeTest::NodeType(NodeTypeTest::Node),
                    predicates: vec![],
                },
                step,
            ];
            (rem, (true, initial_steps))
        } else if let Ok((rem, _)) = tag::<&str, &str, nom::error::Error<&str>>("/")(input) {
            if let Ok((rem, first_step)) = step(rem) {
                (rem, (true, vec![first_step]))
            } else {
                // A path that is just "/"
                (rem, (true, vec![]))
            }
        } else {
            let (rem, first_step) = step(input)?;
            (rem, (false, vec![first_step]))
        };

    let (i, mut steps) = (i, first_step);
    // After the first step, subsequent steps MUST be preceded by / or //.
    let (i, remainder) = many0(pair(alt((tag("//"), tag("/"))), step))(i)?;

    for (sep, next_step) in remainder {
        if sep == "//" {
            steps.push(Step {
                axis: Axis::DescendantOrSelf,
                node_test: NodeTest::NodeType(NodeTypeTest::Node),
                predicates: vec![],
            });
        }
        steps.push(next_step);
    }

    Ok((
        i,
        LocationPath {
            is_absolute,
            steps,
        },
    ))
}

// --- Function Call Parser ---
fn function_call(input: &str) -> IResult<&str, Expression> {
    // A function call must be a QName followed by '('. The lookahead avoids
    // parsing a simple step name (like 'div' in 'div/l') as a function.
    let (i, name) = q_name(input)?;
    let (i, _) = peek(ws(char('(')))(i)?;

    // Node-type tests like text() are not functions; the step parser owns them.
    if name == "text" || name == "node" || name == "comment" || name == "processing-instruction" {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        char(')'),
    )(i)?;

    Ok((i, Expression::FunctionCall { name, args }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_path() {
        let result = parse_expression("body/div").unwrap();
        assert_eq!(
            result,
            Expression::LocationPath(LocationPath {
                is_absolute: false,
                steps: vec![
                    Step {
                        axis: Axis::Child,
                        node_test: NodeTest::Name("body".into()),
                        predicates: vec![]
                    },
                    Step {
                        axis: Axis::Child,
                        node_test: NodeTest::Name("div".into()),
                        predicates: vec![]
                    },
                ]
            })
        );
    }

    #[test]
    fn test_parse_descendant_shorthand() {
        let result = parse_expression("//body").unwrap();
        assert_eq!(
            result,
            Expression::LocationPath(LocationPath {
                is_absolute: true,
                steps: vec![
                    Step {
                        axis: Axis::DescendantOrSelf,
                        node_test: NodeTest::NodeType(NodeTypeTest::Node),
                        predicates: vec![]
                    },
                    Step {
                        axis: Axis::Child,
                        node_test: NodeTest::Name("body".into()),
                        predicates: vec![]
                    },
                ]
            })
        );
    }

    #[test]
    fn test_parse_relative_descendant() {
        let result = parse_expression(".//l[@n='3']").unwrap();
        let Expression::LocationPath(lp) = result else {
            panic!("Expected location path");
        };
        assert!(!lp.is_absolute);
        assert_eq!(lp.steps.len(), 3);
        assert_eq!(lp.steps[0].axis, Axis::SelfAxis);
        assert_eq!(
            lp.steps[1].node_test,
            NodeTest::NodeType(NodeTypeTest::Node)
        );
        assert_eq!(lp.steps[2].node_test, NodeTest::Name("l".into()));
        assert_eq!(lp.steps[2].predicates.len(), 1);
    }

    #[test]
    fn test_parse_attribute_predicate() {
        let result = parse_expression("div[@n = 'Luke']").unwrap();
        let expected_predicate_path = LocationPath {
            is_absolute: false,
            steps: vec![Step {
                axis: Axis::Attribute,
                node_test: NodeTest::Name("n".into()),
                predicates: vec![],
            }],
        };
        assert_eq!(
            result,
            Expression::LocationPath(LocationPath {
                is_absolute: false,
                steps: vec![Step {
                    axis: Axis::Child,
                    node_test: NodeTest::Name("div".into()),
                    predicates: vec![Expression::BinaryOp {
                        left: Box::new(Expression::LocationPath(expected_predicate_path)),
                        op: BinaryOperator::Equals,
                        right: Box::new(Expression::Literal("Luke".into())),
                    }]
                }]
            })
        );
    }

    #[test]
    fn test_parse_prefixed_attribute() {
        let result = parse_expression("div[@xml:id='div-002']").unwrap();
        let Expression::LocationPath(lp) = result else {
            panic!("Expected location path");
        };
        let Expression::BinaryOp { left, .. } = &lp.steps[0].predicates[0] else {
            panic!("Expected comparison predicate");
        };
        let Expression::LocationPath(attr_path) = left.as_ref() else {
            panic!("Expected attribute path");
        };
        assert_eq!(
            attr_path.steps[0].node_test,
            NodeTest::Name("xml:id".into())
        );
    }

    #[test]
    fn test_parse_positional_predicate() {
        let result = parse_expression("div[position()=2]").unwrap();
        let Expression::LocationPath(lp) = result else {
            panic!("Expected location path");
        };
        assert_eq!(lp.steps.len(), 1);
        assert_eq!(lp.steps[0].predicates.len(), 1);
        assert!(matches!(
            lp.steps[0].predicates[0],
            Expression::BinaryOp {
                op: BinaryOperator::Equals,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_numeric_predicate() {
        let result = parse_expression("div[1]").unwrap();
        assert_eq!(
            result,
            Expression::LocationPath(LocationPath {
                is_absolute: false,
                steps: vec![Step {
                    axis: Axis::Child,
                    node_test: NodeTest::Name("div".into()),
                    predicates: vec![Expression::Number(1.0)]
                }]
            })
        );
    }

    #[test]
    fn test_parse_sibling_axes() {
        let result = parse_expression(
            "*[preceding-sibling::div[@n='1'] and following-sibling::l[@n='3']]",
        )
        .unwrap();
        let Expression::LocationPath(lp) = result else {
            panic!("Expected location path");
        };
        assert_eq!(lp.steps[0].node_test, NodeTest::Wildcard);
        let Expression::BinaryOp { left, op, right } = &lp.steps[0].predicates[0] else {
            panic!("Expected binary predicate");
        };
        assert_eq!(*op, BinaryOperator::And);
        let Expression::LocationPath(lhs) = left.as_ref() else {
            panic!("Expected path on lhs");
        };
        assert_eq!(lhs.steps[0].axis, Axis::PrecedingSibling);
        let Expression::LocationPath(rhs) = right.as_ref() else {
            panic!("Expected path on rhs");
        };
        assert_eq!(rhs.steps[0].axis, Axis::FollowingSibling);
    }

    #[test]
    fn test_parse_abbreviated_step() {
        let result = parse_expression(".").unwrap();
        let Expression::LocationPath(lp) = result else {
            panic!("Expected location path for '.'");
        };
        assert_eq!(lp.steps.len(), 1);
        assert_eq!(lp.steps[0].node_test, NodeTest::Name(".".to_string()));
        assert_eq!(lp.steps[0].axis, Axis::SelfAxis);
    }

    #[test]
    fn test_parse_text_node_test() {
        let result = parse_expression("head/text()").unwrap();
        let Expression::LocationPath(lp) = result else {
            panic!("Expected location path");
        };
        assert_eq!(lp.steps.len(), 2);
        assert_eq!(
            lp.steps[1].node_test,
            NodeTest::NodeType(NodeTypeTest::Text)
        );
    }

    #[test]
    fn test_parse_nested_existence_predicate() {
        // The reconstruction walk builds shapes like ./*[.//body[./div]]
        let result = parse_expression("./*[.//body[./div[@n='Luke']]]").unwrap();
        let Expression::LocationPath(lp) = result else {
            panic!("Expected location path");
        };
        assert_eq!(lp.steps.len(), 2);
        assert_eq!(lp.steps[1].node_test, NodeTest::Wildcard);
        assert_eq!(lp.steps[1].predicates.len(), 1);
        assert!(lp.steps[1].predicates[0].is_location_path());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse_expression("div[@n='x'] extra{").is_err());
    }
}
