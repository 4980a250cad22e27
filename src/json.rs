//! HAL+JSON decoding and rendering
//!
//! Decoding pulls `_links` and `_embedded` out of a parsed JSON object,
//! normalizes one-or-many shapes into sequences and recurses into
//! embedded resources while depth remains. Rendering walks the document
//! back into the same shape.

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::document::{Data, Document};
use crate::error::HalError;
use crate::link::{Attributes, Link};
use crate::vocab::{CURIES_REL, EMBEDDED_KEY, HREF_ATTR, LINKS_KEY, SELF_REL, TITLE_ATTR};

/// Parse JSON text and decode it, expanding at most `max_depth` embedding levels
pub fn from_str(text: &str, max_depth: usize) -> Result<Document, HalError> {
    let value: Value = serde_json::from_str(text)?;
    decode(value, max_depth)
}

/// Decode a parsed JSON value into a document
///
/// With `max_depth == 0` embedded resources are dropped entirely.
pub fn decode(value: Value, max_depth: usize) -> Result<Document, HalError> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(HalError::InvalidStructure(format!(
                "expected a JSON object, found {}",
                kind(&other)
            )))
        }
    };

    let mut links = take_container(&mut object, LINKS_KEY)?;
    let embedded = take_container(&mut object, EMBEDDED_KEY)?;
    let uri = take_self_href(&mut links).unwrap_or_default();

    debug!(uri = %uri, relations = links.len(), embedded = embedded.len(), max_depth, "decoding JSON document");

    let mut document = Document::new(uri, object);

    for (rel, value) in links {
        for item in one_or_many(value) {
            let link = parse_link(&rel, item)?;
            document.push_link(rel.as_str(), link);
        }
    }

    if max_depth == 0 {
        if !embedded.is_empty() {
            trace!(dropped = embedded.len(), "depth exhausted, dropping embedded resources");
        }
        return Ok(document);
    }

    for (rel, value) in embedded {
        for child in one_or_many(value) {
            let child = decode(child, max_depth - 1)?;
            document.add_resource(rel.as_str(), child);
        }
    }

    Ok(document)
}

/// Render a document as a HAL+JSON value
pub fn to_value(document: &Document) -> Value {
    let mut object = document.data().clone();

    let links = links_to_value(document);
    if !links.is_empty() {
        object.insert(LINKS_KEY.to_string(), Value::Object(links));
    }

    let mut embedded = Map::new();
    for (rel, children) in document.resources() {
        let value = if children.len() == 1 && !document.is_forced_resource_array(rel) {
            to_value(&children[0])
        } else {
            Value::Array(children.iter().map(to_value).collect())
        };
        embedded.insert(rel.clone(), value);
    }
    if !embedded.is_empty() {
        object.insert(EMBEDDED_KEY.to_string(), Value::Object(embedded));
    }

    Value::Object(object)
}

/// Render a document as HAL+JSON text
pub fn to_string(document: &Document, pretty: bool) -> Result<String, HalError> {
    let value = to_value(document);
    if pretty {
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(serde_json::to_string(&value)?)
    }
}

/// Merge a `_links` value found in caller-supplied data, skipping bad entries
pub(crate) fn absorb_links(document: &mut Document, links: Value) {
    let mut links = match links {
        Value::Object(links) => links,
        other => {
            warn!("ignoring {} under {}", kind(&other), LINKS_KEY);
            return;
        }
    };

    if let Some(uri) = take_self_href(&mut links) {
        if document.uri().is_none() {
            document.set_uri(uri);
        }
    }

    for (rel, value) in links {
        for item in one_or_many(value) {
            match parse_link(&rel, item) {
                Ok(link) => {
                    document.push_link(rel.as_str(), link);
                }
                Err(e) => warn!(rel = %rel, "dropping link: {}", e),
            }
        }
    }
}

/// Merge an `_embedded` value found in caller-supplied data, skipping bad entries
pub(crate) fn absorb_embedded(document: &mut Document, embedded: Value) {
    let embedded = match embedded {
        Value::Object(embedded) => embedded,
        other => {
            warn!("ignoring {} under {}", kind(&other), EMBEDDED_KEY);
            return;
        }
    };

    for (rel, value) in embedded {
        for child in one_or_many(value) {
            match child {
                Value::Object(child) => {
                    document.add_resource(rel.as_str(), Document::new("", child));
                }
                other => warn!(rel = %rel, "dropping embedded {}", kind(&other)),
            }
        }
    }
}

/// Remove a reserved container; absent or null counts as empty
fn take_container(object: &mut Data, key: &str) -> Result<Map<String, Value>, HalError> {
    match object.shift_remove(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(container)) => Ok(container),
        Some(other) => Err(HalError::InvalidStructure(format!(
            "{} must be an object, found {}",
            key,
            kind(&other)
        ))),
    }
}

/// Remove the self relation and return its href, if any
///
/// The self link is identity, not a navigable relation, so it is dropped
/// whatever its shape.
fn take_self_href(links: &mut Map<String, Value>) -> Option<String> {
    let first = match links.shift_remove(SELF_REL)? {
        Value::Array(items) => items.into_iter().next()?,
        single => single,
    };
    first
        .get(HREF_ATTR)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// A single object and an array of objects decode the same way
fn one_or_many(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        single => vec![single],
    }
}

/// Build a link from a JSON link object; `href` is the target and `title` is dropped
fn parse_link(rel: &str, value: Value) -> Result<Link, HalError> {
    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(HalError::InvalidStructure(format!(
                "link under '{}' must be an object, found {}",
                rel,
                kind(&other)
            )))
        }
    };

    let mut href = None;
    let mut attributes = Attributes::new();
    for (key, value) in fields {
        match key.as_str() {
            HREF_ATTR => href = Some(value),
            TITLE_ATTR => {}
            _ => {
                attributes.insert(key, value);
            }
        }
    }

    match href {
        Some(Value::String(target)) => Ok(Link::new(target, attributes)),
        _ => Err(HalError::missing_attribute("link", HREF_ATTR)),
    }
}

fn links_to_value(document: &Document) -> Map<String, Value> {
    let mut links = Map::new();

    if let Some(uri) = document.uri() {
        links.insert(
            SELF_REL.to_string(),
            Link::new(uri, Attributes::new()).to_json(),
        );
    }

    for (rel, rel_links) in document.links().iter() {
        let as_array = rel_links.len() != 1
            || rel == CURIES_REL
            || document.links().is_forced_array(rel);
        let value = if as_array {
            Value::Array(rel_links.iter().map(Link::to_json).collect())
        } else {
            rel_links[0].to_json()
        };
        links.insert(rel.to_string(), value);
    }

    links
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
