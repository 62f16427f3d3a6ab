//! Built-in implementations for the core functions locators use.

use super::engine::{EvaluationContext, XPathValue};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    match name {
        // Core & node-set
        "position" => func_position(args, e_ctx),
        "last" => func_last(args, e_ctx),
        "count" => func_count(args),
        "string" => func_string(args, e_ctx),

        // String
        "concat" => func_concat(args),
        "contains" => func_contains(args),
        "starts-with" => func_starts_with(args),
        "normalize-space" => func_normalize_space(args, e_ctx),

        // Boolean
        "not" => func_not(args),
        "true" => func_true(args),
        "false" => func_false(args),

        _ => Err(XPathError::Function {
            function: name.to_string(),
            message: "unknown function".to_string(),
        }),
    }
}

fn expect_args<N>(
    function: &str,
    args: &[XPathValue<N>],
    expected: usize,
) -> Result<(), XPathError> {
    if args.len() != expected {
        return Err(XPathError::Function {
            function: function.to_string(),
            message: format!("expected {} argument(s), got {}", expected, args.len()),
        });
    }
    Ok(())
}

fn func_position<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("position()", &args, 0)?;
    Ok(XPathValue::Number(e_ctx.context_position as f64))
}

fn func_last<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("last()", &args, 0)?;
    Ok(XPathValue::Number(e_ctx.context_size as f64))
}

fn func_count<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("count()", &args, 1)?;
    match &args[0] {
        XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(nodes.len() as f64)),
        _ => Err(XPathError::Function {
            function: "count()".to_string(),
            message: "argument must be a node set".to_string(),
        }),
    }
}

fn func_string<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let value = match args.into_iter().next() {
        Some(v) => v.to_string_value(),
        None => e_ctx.context_node.string_value(),
    };
    Ok(XPathValue::String(value))
}

fn func_concat<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    if args.len() < 2 {
        return Err(XPathError::Function {
            function: "concat()".to_string(),
            message: "expected at least 2 arguments".to_string(),
        });
    }
    let joined: String = args.iter().map(|a| a.to_string_value()).collect();
    Ok(XPathValue::String(joined))
}

fn func_contains<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("contains()", &args, 2)?;
    let haystack = args[0].to_string_value();
    let needle = args[1].to_string_value();
    Ok(XPathValue::Boolean(haystack.contains(&needle)))
}

fn func_starts_with<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("starts-with()", &args, 2)?;
    let haystack = args[0].to_string_value();
    let prefix = args[1].to_string_value();
    Ok(XPathValue::Boolean(haystack.starts_with(&prefix)))
}

fn func_normalize_space<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let value = match args.into_iter().next() {
        Some(v) => v.to_string_value(),
        None => e_ctx.context_node.string_value(),
    };
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(XPathValue::String(normalized))
}

fn func_not<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("not()", &args, 1)?;
    Ok(XPathValue::Boolean(!args[0].to_bool()))
}

fn func_true<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("true()", &args, 0)?;
    Ok(XPathValue::Boolean(true))
}

fn func_false<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    expect_args("false()", &args, 0)?;
    Ok(XPathValue::Boolean(false))
}
