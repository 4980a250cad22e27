//! Error types for HAL document decoding and rendering

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("Failed to render XML: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HalError {
    pub(crate) fn missing_attribute(element: &str, attribute: &str) -> Self {
        HalError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }
}
