pub mod ast;
pub mod axes;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod parser;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step};
pub use datasource::{DataSourceNode, NodeType, QName};
pub use engine::{EvaluationContext, XPathValue, evaluate, evaluate_nodes, first_node};
pub use error::XPathError;
pub use parser::parse_expression;

// Re-export the mock tree for integration testing in downstream crates
pub use datasource::tests;
