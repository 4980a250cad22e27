//! Wire format selection

use std::fmt;
use std::path::Path;

use crate::document::Document;
use crate::error::HalError;
use crate::{json, xml};

/// The two HAL wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Format::Json),
            "xml" => Some(Format::Xml),
            _ => None,
        }
    }

    /// Guess the format from content: a leading `<` means XML
    pub fn sniff(text: &str) -> Self {
        if text.trim_start().starts_with('<') {
            Format::Xml
        } else {
            Format::Json
        }
    }

    pub fn decode(self, text: &str, max_depth: usize) -> Result<Document, HalError> {
        match self {
            Format::Json => json::from_str(text, max_depth),
            Format::Xml => xml::from_str(text, max_depth),
        }
    }

    pub fn render(self, document: &Document, pretty: bool) -> Result<String, HalError> {
        match self {
            Format::Json => json::to_string(document, pretty),
            Format::Xml => xml::to_string(document, pretty),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Xml => f.write_str("xml"),
        }
    }
}
