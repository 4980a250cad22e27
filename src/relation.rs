//! Relation storage with CURIE-aware lookup
//!
//! Relations are kept in insertion order so that rendering is
//! deterministic. CURIE expansion happens at lookup time, never when a
//! link is added: a template may arrive after the links that use it.

use std::borrow::Cow;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::link::{Attributes, Link};
use crate::vocab::{CURIES_REL, NAME_ATTR, REL_PLACEHOLDER};

/// Ordered mapping from relation name to one or more links
///
/// A relation that is present always holds at least one link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationIndex {
    relations: IndexMap<String, Vec<Link>>,
    /// Relations rendered as an array even when they hold one link
    forced_arrays: IndexSet<String>,
}

impl RelationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a link under `rel`; duplicates are kept in order
    pub fn add(&mut self, rel: impl Into<String>, target: impl Into<String>, attributes: Attributes) {
        self.push(rel, Link::new(target, attributes));
    }

    pub fn push(&mut self, rel: impl Into<String>, link: Link) {
        self.relations.entry(rel.into()).or_default().push(link);
    }

    /// Replace every link under `rel` with a single one
    pub fn set(&mut self, rel: impl Into<String>, target: impl Into<String>, attributes: Attributes) {
        self.relations
            .insert(rel.into(), vec![Link::new(target, attributes)]);
    }

    /// Remove a relation entirely, returning its links
    pub fn remove(&mut self, rel: &str) -> Option<Vec<Link>> {
        self.forced_arrays.shift_remove(rel);
        self.relations.shift_remove(rel)
    }

    /// Look up a relation by exact name, falling back to CURIE expansion
    ///
    /// `prefix:suffix` names with no exact entry are expanded through the
    /// `curies` template whose `name` equals `prefix`. Returns `None` when
    /// neither succeeds.
    pub fn get(&self, rel: &str) -> Option<Cow<'_, [Link]>> {
        if let Some(links) = self.relations.get(rel) {
            return Some(Cow::Borrowed(links.as_slice()));
        }
        self.resolve_curie(rel).map(|link| Cow::Owned(vec![link]))
    }

    pub fn first(&self, rel: &str) -> Option<Link> {
        self.get(rel).and_then(|links| links.first().cloned())
    }

    /// Expand a `prefix:suffix` relation name through the CURIE templates
    pub fn resolve_curie(&self, rel: &str) -> Option<Link> {
        let (prefix, suffix) = rel.split_once(':')?;
        let template = self.curies().iter().find(|curie| {
            matches!(curie.attribute(NAME_ATTR), Some(Value::String(name)) if name == prefix)
        })?;

        Some(Link::new(
            template.target().replace(REL_PLACEHOLDER, suffix),
            Attributes::new(),
        ))
    }

    pub fn curies(&self) -> &[Link] {
        self.relations
            .get(CURIES_REL)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.relations.contains_key(rel)
    }

    pub fn force_array(&mut self, rel: impl Into<String>) {
        self.forced_arrays.insert(rel.into());
    }

    pub fn is_forced_array(&self, rel: &str) -> bool {
        self.forced_arrays.contains(rel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Link])> {
        self.relations
            .iter()
            .map(|(rel, links)| (rel.as_str(), links.as_slice()))
    }

    /// Number of relations (not links)
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
