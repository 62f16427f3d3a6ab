use citenav_tei::TeiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document error: {0}")]
    Tei(#[from] TeiError),

    #[error("record serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}
