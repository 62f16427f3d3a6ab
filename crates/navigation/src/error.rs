use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    #[error("unknown reference '{0}' in the requested tree")]
    UnknownRef(String),

    #[error("end reference comes before start in document order")]
    InvalidRangeOrder,

    #[error("reference '{0}' is indexed but does not resolve in the reference tree")]
    StaleIndex(String),

    #[error("invalid navigation query: {0}")]
    BadRangeRequest(String),
}
