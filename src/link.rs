//! A single navigable relation target

use std::fmt;

use serde_json::{Map, Value};

use crate::vocab::{HREF_ATTR, REL_ATTR, TEMPLATED_ATTR};

/// Link parameters (`templated`, `name`, `type`, ...) in insertion order
pub type Attributes = Map<String, Value>;

/// A link target plus its RFC 5988 style parameters
///
/// `rel` and `href` are structural and never appear among the attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    target: String,
    attributes: Attributes,
}

impl Link {
    pub fn new(target: impl Into<String>, attributes: Attributes) -> Self {
        let attributes = attributes
            .into_iter()
            .filter(|(key, _)| key != REL_ATTR && key != HREF_ATTR)
            .collect();

        Self {
            target: target.into(),
            attributes,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// True when `templated` is set, either as a boolean or as the XML string form
    pub fn is_templated(&self) -> bool {
        match self.attributes.get(TEMPLATED_ATTR) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text == "true",
            _ => false,
        }
    }

    /// JSON link object: `href` first, then the attributes
    pub(crate) fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(HREF_ATTR.to_string(), Value::String(self.target.clone()));
        for (key, value) in &self.attributes {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target)
    }
}
