//! The HAL document model
//!
//! A [`Document`] is one hypermedia resource: an optional identity URI,
//! plain data fields, a [`RelationIndex`] of links and the embedded child
//! documents it owns. Decoders and callers build it through the same
//! mutators; renderers only read it.

use std::borrow::Cow;

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::HalError;
use crate::json;
use crate::link::{Attributes, Link};
use crate::relation::RelationIndex;
use crate::vocab::{CURIES_REL, EMBEDDED_KEY, LINKS_KEY, NAME_ATTR, TEMPLATED_ATTR};
use crate::xml;

/// Plain data fields of a document, in insertion order
pub type Data = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    uri: Option<String>,
    data: Data,
    links: RelationIndex,
    resources: IndexMap<String, Vec<Document>>,
    /// Embedded relations rendered as an array even with one child
    forced_resource_arrays: IndexSet<String>,
}

impl Document {
    /// Create a document from an identity and data
    ///
    /// An empty `uri` means no identity. `_links` and `_embedded` entries
    /// found in `data` are moved into the links and embedded resources.
    pub fn new(uri: impl Into<String>, data: Data) -> Self {
        let mut document = Self::default();
        document.set_uri(uri);
        document.set_data(data);
        document
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Replace the identity; an empty string clears it
    pub fn set_uri(&mut self, uri: impl Into<String>) -> &mut Self {
        let uri = uri.into();
        self.uri = (!uri.is_empty()).then_some(uri);
        self
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Replace the whole data mapping (no merge)
    pub fn set_data(&mut self, data: Data) -> &mut Self {
        self.data = data;
        self.absorb_reserved();
        self
    }

    pub fn add_link(
        &mut self,
        rel: impl Into<String>,
        target: impl Into<String>,
        attributes: Attributes,
    ) -> &mut Self {
        self.links.add(rel, target, attributes);
        self
    }

    pub(crate) fn push_link(&mut self, rel: impl Into<String>, link: Link) -> &mut Self {
        self.links.push(rel, link);
        self
    }

    /// Replace all links of `rel` with a single one
    pub fn set_link(
        &mut self,
        rel: impl Into<String>,
        target: impl Into<String>,
        attributes: Attributes,
    ) -> &mut Self {
        self.links.set(rel, target, attributes);
        self
    }

    pub fn remove_links(&mut self, rel: &str) -> Option<Vec<Link>> {
        self.links.remove(rel)
    }

    /// Render `rel` as an array of links even when it holds one
    pub fn force_link_array(&mut self, rel: impl Into<String>) -> &mut Self {
        self.links.force_array(rel);
        self
    }

    /// Register a CURIE template such as `http://example.org/rels/{rel}`
    pub fn add_curie(&mut self, name: &str, template: impl Into<String>) -> &mut Self {
        let mut attributes = Attributes::new();
        attributes.insert(NAME_ATTR.to_string(), Value::String(name.to_string()));
        attributes.insert(TEMPLATED_ATTR.to_string(), Value::Bool(true));
        self.add_link(CURIES_REL, template, attributes)
    }

    /// Links of `rel`, expanding CURIEs when there is no exact match
    pub fn link(&self, rel: &str) -> Option<Cow<'_, [Link]>> {
        self.links.get(rel)
    }

    pub fn first_link(&self, rel: &str) -> Option<Link> {
        self.links.first(rel)
    }

    pub fn links(&self) -> &RelationIndex {
        &self.links
    }

    /// Embed `child` under `rel`
    ///
    /// An empty document is a valid child; it stands for an unresolved
    /// resource.
    pub fn add_resource(&mut self, rel: impl Into<String>, child: Document) -> &mut Self {
        self.resources.entry(rel.into()).or_default().push(child);
        self
    }

    /// Replace the embedded children of `rel` with `child`
    pub fn set_resource(&mut self, rel: impl Into<String>, child: Document) -> &mut Self {
        self.resources.insert(rel.into(), vec![child]);
        self
    }

    pub fn force_resource_array(&mut self, rel: impl Into<String>) -> &mut Self {
        self.forced_resource_arrays.insert(rel.into());
        self
    }

    pub fn is_forced_resource_array(&self, rel: &str) -> bool {
        self.forced_resource_arrays.contains(rel)
    }

    pub fn resources(&self) -> &IndexMap<String, Vec<Document>> {
        &self.resources
    }

    pub fn resource(&self, rel: &str) -> Option<&[Document]> {
        self.resources.get(rel).map(Vec::as_slice)
    }

    pub fn first_resource(&self, rel: &str) -> Option<&Document> {
        self.resource(rel).and_then(<[Document]>::first)
    }

    pub fn from_json(text: &str, max_depth: usize) -> Result<Self, HalError> {
        json::from_str(text, max_depth)
    }

    pub fn from_xml(text: &str, max_depth: usize) -> Result<Self, HalError> {
        xml::from_str(text, max_depth)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, HalError> {
        json::to_string(self, pretty)
    }

    pub fn to_xml(&self, pretty: bool) -> Result<String, HalError> {
        xml::to_string(self, pretty)
    }

    /// Move `_links` / `_embedded` out of the data mapping
    fn absorb_reserved(&mut self) {
        let links = self.data.shift_remove(LINKS_KEY);
        let embedded = self.data.shift_remove(EMBEDDED_KEY);

        if let Some(links) = links {
            json::absorb_links(self, links);
        }
        if let Some(embedded) = embedded {
            json::absorb_embedded(self, embedded);
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        json::to_value(self).serialize(serializer)
    }
}
