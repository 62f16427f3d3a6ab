use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("I/O error reading catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog descriptor: {0}")]
    Descriptor(String),
}
