//! HAL+XML decoding and rendering
//!
//! A document is a `<resource href="...">` element. Its `<link>` children
//! are relations, its `<resource rel="...">` children are embedded
//! documents and every other child element is plain data.
//!
//! Attributes are named by local name; only the `xml:` namespace keeps its
//! prefix. Text interleaved with child elements is joined into one `#text`
//! entry, so its position relative to the children is not preserved.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use roxmltree::{Attribute, Node};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::document::{Data, Document};
use crate::error::HalError;
use crate::link::Attributes;
use crate::vocab::{
    is_attribute_key, ATTRIBUTE_MARKER, HREF_ATTR, LINK_ELEMENT, REL_ATTR, RESOURCE_ELEMENT,
    TEXT_KEY,
};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
const XML_PREFIX: &str = "xml:";

/// Parse XML text and decode its root element
pub fn from_str(text: &str, max_depth: usize) -> Result<Document, HalError> {
    let tree = roxmltree::Document::parse(text)?;
    decode(tree.root_element(), max_depth)
}

/// Decode a parsed `<resource>` element into a document
///
/// The identity comes from the element's own `href`. Embedded
/// `<resource>` children are decoded only while `max_depth > 0`.
pub fn decode(element: Node<'_, '_>, max_depth: usize) -> Result<Document, HalError> {
    let uri = element.attribute(HREF_ATTR).unwrap_or_default();

    let mut data = Data::new();
    for attribute in element.attributes() {
        let name = attribute_key(&attribute);
        if name != HREF_ATTR && name != REL_ATTR {
            data.insert(
                marked(&name),
                Value::String(attribute.value().to_string()),
            );
        }
    }

    let mut link_elements = Vec::new();
    let mut resource_elements = Vec::new();
    for child in element.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            LINK_ELEMENT => link_elements.push(child),
            RESOURCE_ELEMENT => resource_elements.push(child),
            name => insert_repeated(&mut data, name, element_to_value(child)),
        }
    }

    debug!(
        uri,
        links = link_elements.len(),
        embedded = resource_elements.len(),
        max_depth,
        "decoding XML document"
    );

    let mut document = Document::new(uri, data);

    for link in link_elements {
        let rel = required_attribute(link, REL_ATTR)?;
        let href = required_attribute(link, HREF_ATTR)?;
        let attributes: Attributes = link
            .attributes()
            .map(|attribute| (attribute_key(&attribute), attribute.value()))
            .filter(|(name, _)| name != REL_ATTR && name != HREF_ATTR)
            .map(|(name, value)| (name, Value::String(value.to_string())))
            .collect();
        document.add_link(rel, href, attributes);
    }

    if max_depth == 0 {
        if !resource_elements.is_empty() {
            trace!(
                dropped = resource_elements.len(),
                "depth exhausted, dropping embedded resources"
            );
        }
        return Ok(document);
    }

    for resource in resource_elements {
        // the child's href is picked up again by its own decode
        let rel = required_attribute(resource, REL_ATTR)?;
        let child = decode(resource, max_depth - 1)?;
        document.add_resource(rel, child);
    }

    Ok(document)
}

/// Render a document as HAL+XML text
///
/// Fails with [`HalError::Render`] when a data key cannot be written as an
/// element or attribute name that the decoder reads back as data.
pub fn to_string(document: &Document, pretty: bool) -> Result<String, HalError> {
    let mut writer = if pretty {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", None, None)))?;
    write_resource(&mut writer, document, None)?;

    String::from_utf8(writer.into_inner()).map_err(|e| HalError::Render(e.to_string()))
}

fn write_resource<W: Write>(
    writer: &mut Writer<W>,
    document: &Document,
    rel: Option<&str>,
) -> Result<(), HalError> {
    for key in document.data().keys() {
        match key.strip_prefix(ATTRIBUTE_MARKER).unwrap_or(key.as_str()) {
            HREF_ATTR | REL_ATTR if is_attribute_key(key) => {
                return Err(HalError::Render(format!(
                    "data key '{}' collides with the structural attribute",
                    key
                )))
            }
            LINK_ELEMENT | RESOURCE_ELEMENT if !is_attribute_key(key) => {
                return Err(HalError::Render(format!(
                    "data key '{}' collides with the <{}> element",
                    key, key
                )))
            }
            _ => {}
        }
    }

    let mut start = BytesStart::new(RESOURCE_ELEMENT);
    if let Some(rel) = rel {
        start.push_attribute((REL_ATTR, rel));
    }
    if let Some(uri) = document.uri() {
        start.push_attribute((HREF_ATTR, uri));
    }
    push_marked_attributes(&mut start, document.data())?;
    emit(writer, Event::Start(start))?;

    for (rel, links) in document.links().iter() {
        for link in links {
            let mut element = BytesStart::new(LINK_ELEMENT);
            element.push_attribute((REL_ATTR, rel));
            element.push_attribute((HREF_ATTR, link.target()));
            for (name, value) in link.attributes() {
                element.push_attribute((attribute_name(name)?, scalar_text(value).as_str()));
            }
            emit(writer, Event::Empty(element))?;
        }
    }

    write_data(writer, document.data())?;

    for (rel, children) in document.resources() {
        for child in children {
            write_resource(writer, child, Some(rel.as_str()))?;
        }
    }

    emit(writer, Event::End(BytesEnd::new(RESOURCE_ELEMENT)))
}

/// Write every non-attribute entry of `data` as child elements
fn write_data<W: Write>(
    writer: &mut Writer<W>,
    data: &Map<String, Value>,
) -> Result<(), HalError> {
    for (key, value) in data {
        if is_attribute_key(key) || key == TEXT_KEY {
            continue;
        }
        write_element(writer, element_name(key)?, value)?;
    }
    Ok(())
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
) -> Result<(), HalError> {
    match value {
        // arrays become repeated siblings
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
            Ok(())
        }
        Value::Object(object) => {
            let mut start = BytesStart::new(name);
            push_marked_attributes(&mut start, object)?;

            let text = object.get(TEXT_KEY).map(scalar_text);
            let has_children = object
                .keys()
                .any(|key| !is_attribute_key(key) && key != TEXT_KEY);
            if text.is_none() && !has_children {
                return emit(writer, Event::Empty(start));
            }

            emit(writer, Event::Start(start))?;
            if let Some(text) = text {
                emit(writer, Event::Text(BytesText::new(&text)))?;
            }
            write_data(writer, object)?;
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        Value::Null => emit(writer, Event::Empty(BytesStart::new(name))),
        scalar => {
            let text = scalar_text(scalar);
            if text.is_empty() {
                return emit(writer, Event::Empty(BytesStart::new(name)));
            }
            emit(writer, Event::Start(BytesStart::new(name)))?;
            emit(writer, Event::Text(BytesText::new(&text)))?;
            emit(writer, Event::End(BytesEnd::new(name)))
        }
    }
}

fn push_marked_attributes(
    start: &mut BytesStart<'_>,
    data: &Map<String, Value>,
) -> Result<(), HalError> {
    for (key, value) in data {
        if let Some(name) = key.strip_prefix(ATTRIBUTE_MARKER) {
            start.push_attribute((attribute_name(name)?, scalar_text(value).as_str()));
        }
    }
    Ok(())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), HalError> {
    writer
        .write_event(event)
        .map_err(|e| HalError::Render(e.to_string()))
}

/// An XML name without a namespace prefix
fn is_local_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_'))
}

fn element_name(name: &str) -> Result<&str, HalError> {
    if is_local_name(name) {
        Ok(name)
    } else {
        Err(HalError::Render(format!(
            "'{}' is not a valid XML element name",
            name
        )))
    }
}

/// Attribute names may carry the always-bound `xml:` prefix
fn attribute_name(name: &str) -> Result<&str, HalError> {
    if is_local_name(name.strip_prefix(XML_PREFIX).unwrap_or(name)) {
        Ok(name)
    } else {
        Err(HalError::Render(format!(
            "'{}' is not a valid XML attribute name",
            name
        )))
    }
}

/// Text form of a value placed in an attribute or text node
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}

fn required_attribute<'a>(element: Node<'a, '_>, name: &str) -> Result<&'a str, HalError> {
    element
        .attribute(name)
        .ok_or_else(|| HalError::missing_attribute(element.tag_name().name(), name))
}

/// Local name of an attribute, or `xml:name` in the XML namespace
fn attribute_key(attribute: &Attribute<'_, '_>) -> String {
    match attribute.namespace() {
        Some(XML_NAMESPACE) => format!("{}{}", XML_PREFIX, attribute.name()),
        _ => attribute.name().to_string(),
    }
}

fn marked(name: &str) -> String {
    format!("{}{}", ATTRIBUTE_MARKER, name)
}

/// Convert a data element into a value
///
/// Leaf elements become strings, or a mapping of `@`-attributes plus
/// `#text` when they carry attributes. Elements with child elements become
/// mappings keyed by child name, with any non-blank text under `#text`.
fn element_to_value(element: Node<'_, '_>) -> Value {
    let mut object = Map::new();
    for attribute in element.attributes() {
        object.insert(
            marked(&attribute_key(&attribute)),
            Value::String(attribute.value().to_string()),
        );
    }

    let children: Vec<Node<'_, '_>> = element.children().filter(|node| node.is_element()).collect();
    if children.is_empty() {
        let text = element.text().unwrap_or_default();
        if object.is_empty() {
            return Value::String(text.to_string());
        }
        if !text.is_empty() {
            object.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        return Value::Object(object);
    }

    let text: Vec<&str> = element
        .children()
        .filter(|node| node.is_text())
        .filter_map(|node| node.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect();
    if !text.is_empty() {
        object.insert(TEXT_KEY.to_string(), Value::String(text.join(" ")));
    }

    for child in children {
        insert_repeated(&mut object, child.tag_name().name(), element_to_value(child));
    }
    Value::Object(object)
}

/// Insert under `key`, collecting repeated keys into an array
fn insert_repeated(object: &mut Map<String, Value>, key: &str, value: Value) {
    match object.get_mut(key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            object.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const ORDERS: &str = r#"<?xml version="1.0"?>
<resource href="http://example.org/orders">
  <link rel="next" href="http://example.org/orders?page=2" title="Next page"/>
  <link rel="curies" href="http://docs.acme.com/rels/{rel}" name="acme" templated="true"/>
  <currentlyProcessing>14</currentlyProcessing>
  <shippedToday>20</shippedToday>
  <resource rel="acme:order" href="http://example.org/orders/123">
    <total>30.00</total>
    <resource rel="acme:customer" href="http://example.org/customers/7">
      <name>Ann</name>
    </resource>
  </resource>
  <resource rel="acme:order" href="http://example.org/orders/124">
    <total>20.00</total>
  </resource>
</resource>"#;

    fn embed_depth(document: &Document) -> usize {
        document
            .resources()
            .values()
            .flatten()
            .map(|child| 1 + embed_depth(child))
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_decode_depth_zero() {
        let doc = from_str(ORDERS, 0).unwrap();

        assert_eq!(doc.uri(), Some("http://example.org/orders"));
        assert_eq!(
            doc.data(),
            json!({"currentlyProcessing": "14", "shippedToday": "20"})
                .as_object()
                .unwrap()
        );
        assert!(doc.resources().is_empty());
    }

    #[test]
    fn test_decode_links() {
        let doc = from_str(ORDERS, 0).unwrap();

        let next = doc.first_link("next").unwrap();
        assert_eq!(next.target(), "http://example.org/orders?page=2");
        assert_eq!(next.attributes(), json!({"title": "Next page"}).as_object().unwrap());

        let curie = doc.first_link("curies").unwrap();
        assert!(curie.attribute("rel").is_none());
        assert!(curie.attribute("href").is_none());
        assert!(curie.is_templated());

        assert_eq!(
            doc.first_link("acme:order").unwrap().target(),
            "http://docs.acme.com/rels/order"
        );
    }

    #[test]
    fn test_decode_embedded_depth() {
        let doc = from_str(ORDERS, 1).unwrap();
        let orders = doc.resource("acme:order").unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].uri(), Some("http://example.org/orders/123"));
        assert_eq!(orders[1].uri(), Some("http://example.org/orders/124"));
        assert!(!orders[0].data().contains_key("@rel"));
        assert_eq!(embed_depth(&doc), 1);

        let doc = from_str(ORDERS, 2).unwrap();
        assert_eq!(embed_depth(&doc), 2);
        let customer = doc.resource("acme:order").unwrap()[0]
            .first_resource("acme:customer")
            .unwrap();
        assert_eq!(customer.uri(), Some("http://example.org/customers/7"));
        assert_eq!(customer.data().get("name"), Some(&json!("Ann")));

        assert_eq!(embed_depth(&from_str(ORDERS, 10).unwrap()), 2);
    }

    #[test]
    fn test_missing_href_is_empty_identity() {
        let doc = from_str("<resource><name>x</name></resource>", 0).unwrap();
        assert_eq!(doc.uri(), None);
        assert_eq!(doc.data().get("name"), Some(&json!("x")));
    }

    #[test]
    fn test_missing_required_attributes() {
        let err = from_str(r#"<resource><link href="http://x"/></resource>"#, 0).unwrap_err();
        assert!(matches!(
            err,
            HalError::MissingAttribute { ref element, ref attribute }
                if element == "link" && attribute == "rel"
        ));

        let err = from_str(r#"<resource><link rel="next"/></resource>"#, 0).unwrap_err();
        assert!(matches!(err, HalError::MissingAttribute { ref attribute, .. } if attribute == "href"));

        let err = from_str(r#"<resource><resource href="http://x"/></resource>"#, 1).unwrap_err();
        assert!(matches!(
            err,
            HalError::MissingAttribute { ref element, .. } if element == "resource"
        ));
    }

    #[test]
    fn test_unexpanded_resources_are_not_validated() {
        let doc = from_str(r#"<resource><resource href="http://x"/></resource>"#, 0).unwrap();
        assert!(doc.resources().is_empty());
        assert!(doc.data().is_empty());
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(from_str("<resource>", 0), Err(HalError::Xml(_))));
    }

    #[test]
    fn test_data_elements() {
        let doc = from_str(
            r#"<resource lang="en">
                 <tag>a</tag>
                 <tag>b</tag>
                 <address><city>Oslo</city><zip>0150</zip></address>
                 <price currency="EUR">12</price>
                 <empty/>
               </resource>"#,
            0,
        )
        .unwrap();

        assert_eq!(
            Value::Object(doc.data().clone()),
            json!({
                "@lang": "en",
                "tag": ["a", "b"],
                "address": {"city": "Oslo", "zip": "0150"},
                "price": {"@currency": "EUR", "#text": "12"},
                "empty": ""
            })
        );
    }

    #[test]
    fn test_render_shape() {
        let mut doc = Document::new(
            "http://x/1",
            json!({"@lang": "en", "name": "a & b", "tags": ["x", "y"], "active": true})
                .as_object()
                .cloned()
                .unwrap(),
        );
        doc.add_link(
            "next",
            "http://x/2",
            json!({"type": "text/html"}).as_object().cloned().unwrap(),
        )
        .add_resource("item", Document::new("http://x/i", Data::new()));

        let text = to_string(&doc, false).unwrap();
        assert_eq!(
            text,
            concat!(
                r#"<?xml version="1.0"?>"#,
                r#"<resource href="http://x/1" lang="en">"#,
                r#"<link rel="next" href="http://x/2" type="text/html"/>"#,
                r#"<name>a &amp; b</name><tags>x</tags><tags>y</tags><active>true</active>"#,
                r#"<resource rel="item" href="http://x/i"></resource>"#,
                r#"</resource>"#
            )
        );
    }

    #[test]
    fn test_round_trip() {
        let mut doc = Document::new(
            "http://x/1",
            json!({
                "@lang": "en",
                "name": "widget",
                "tags": ["a", "b"],
                "price": {"@currency": "EUR", "#text": "12"},
                "dims": {"w": "1", "h": "2"}
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        doc.add_link(
            "next",
            "http://x/2",
            json!({"type": "text/html", "name": "n"}).as_object().cloned().unwrap(),
        )
        .add_curie("acme", "http://x/rels/{rel}")
        .add_resource(
            "acme:part",
            Document::new("http://x/p1", json!({"sku": "p1"}).as_object().cloned().unwrap()),
        )
        .add_resource("acme:part", Document::new("http://x/p2", Data::new()));

        for pretty in [false, true] {
            let decoded = from_str(&to_string(&doc, pretty).unwrap(), 1).unwrap();

            assert_eq!(decoded.uri(), doc.uri());
            assert_eq!(decoded.data(), doc.data());
            assert_eq!(decoded.resources(), doc.resources());
            let next = decoded.first_link("next").unwrap();
            assert_eq!(next.target(), "http://x/2");
            let keys: Vec<&str> = next.attributes().keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["type", "name"]);
            // booleans come back as text
            assert_eq!(decoded.first_link("curies").unwrap().attribute("templated"), Some(&json!("true")));
        }
    }

    fn data(value: Value) -> Data {
        value.as_object().cloned().unwrap()
    }

    /// `levels` nested embedded resources under one root
    fn nested(levels: usize) -> String {
        let mut inner = String::new();
        for level in (1..=levels).rev() {
            inner = format!(
                r#"<resource rel="child" href="http://x/{}"><n>{}</n>{}</resource>"#,
                level, level, inner
            );
        }
        format!(r#"<resource href="http://x/0">{}</resource>"#, inner)
    }

    proptest! {
        #[test]
        fn prop_depth_bound(levels in 0usize..8, max_depth in 0usize..10) {
            let doc = from_str(&nested(levels), max_depth).unwrap();
            prop_assert_eq!(embed_depth(&doc), levels.min(max_depth));
        }
    }

    #[test]
    fn test_render_rejects_invalid_names() {
        for bad in [
            json!({"first name": "a"}),
            json!({"acme:total": 3}),
            json!({"1st": "a"}),
            json!({"@bad attr": "a"}),
            json!({"nested": {"@x:y": "a"}}),
        ] {
            let doc = Document::new("http://x/1", data(bad.clone()));
            assert!(
                matches!(to_string(&doc, false), Err(HalError::Render(_))),
                "{} should not render",
                bad
            );
        }

        let mut doc = Document::new("http://x/1", Data::new());
        doc.add_link("next", "http://x/2", data(json!({"bad name": "a"})));
        assert!(matches!(to_string(&doc, false), Err(HalError::Render(_))));
    }

    #[test]
    fn test_render_rejects_structural_attributes() {
        for key in ["@href", "@rel"] {
            let doc = Document::new("http://x/1", data(json!({key: "http://evil"})));
            assert!(matches!(to_string(&doc, false), Err(HalError::Render(_))));
        }

        // nested elements may carry them
        let doc = Document::new("http://x/1", data(json!({"a": {"@href": "http://y"}})));
        let decoded = from_str(&to_string(&doc, false).unwrap(), 0).unwrap();
        assert_eq!(decoded.data(), doc.data());
    }

    #[test]
    fn test_render_rejects_structural_element_keys() {
        let doc =
            Document::from_json(r#"{"link": "http://x/other", "resource": "r"}"#, 0).unwrap();
        assert!(matches!(doc.to_xml(false), Err(HalError::Render(_))));

        let doc = Document::new("http://x/1", data(json!({"resource": "r"})));
        assert!(matches!(to_string(&doc, false), Err(HalError::Render(_))));

        // only top-level data competes with links and embedded resources
        let doc = Document::new(
            "http://x/1",
            data(json!({"meta": {"link": "http://x/other", "resource": "r"}})),
        );
        let decoded = from_str(&to_string(&doc, false).unwrap(), 0).unwrap();
        assert_eq!(decoded.data(), doc.data());
        assert!(decoded.links().is_empty());
    }

    #[test]
    fn test_xml_namespace_attributes_round_trip() {
        let doc = from_str(
            r#"<resource href="http://x/1" xml:lang="en">
                 <title xml:lang="fr">Bonjour</title>
                 <link rel="alternate" href="http://x/fr" xml:lang="fr"/>
               </resource>"#,
            0,
        )
        .unwrap();

        assert_eq!(doc.data().get("@xml:lang"), Some(&json!("en")));
        assert_eq!(
            doc.data().get("title"),
            Some(&json!({"@xml:lang": "fr", "#text": "Bonjour"}))
        );
        assert_eq!(
            doc.first_link("alternate").unwrap().attribute("xml:lang"),
            Some(&json!("fr"))
        );

        let text = to_string(&doc, false).unwrap();
        assert!(text.contains(r#"xml:lang="en""#));
        let decoded = from_str(&text, 0).unwrap();
        assert_eq!(decoded.data(), doc.data());
        assert_eq!(decoded.links(), doc.links());
    }

    #[test]
    fn test_mixed_content_keeps_text() {
        let doc = from_str(
            r#"<resource><note lang="en">Call <b>now</b> please</note></resource>"#,
            0,
        )
        .unwrap();

        assert_eq!(
            doc.data().get("note"),
            Some(&json!({"@lang": "en", "#text": "Call please", "b": "now"}))
        );

        let decoded = from_str(&to_string(&doc, true).unwrap(), 0).unwrap();
        assert_eq!(decoded.data(), doc.data());
    }
}
