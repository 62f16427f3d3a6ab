use citenav_xpath::XPathError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeiError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("I/O error reading document: {0}")]
    Io(#[from] std::io::Error),

    #[error("locator evaluation error: {0}")]
    XPath(#[from] XPathError),

    #[error("invalid citation grammar: {0}")]
    Grammar(String),

    #[error("reference '{0}' does not match the citation grammar")]
    RefSyntax(String),

    #[error("unknown citation tree '{0}'")]
    UnknownTree(String),

    #[error("invalid passage request: {0}")]
    Passage(String),

    #[error("cannot traverse between passage boundaries: {0}")]
    NonTraversable(String),

    #[error("XML serialization error: {0}")]
    Serialize(String),
}
