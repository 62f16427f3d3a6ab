use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum XPathError {
    #[error("expression parse error in '{0}': {1}")]
    Parse(String, String),

    #[error("function '{function}' error: {message}")]
    Function { function: String, message: String },

    #[error("type error: {0}")]
    Type(String),
}
