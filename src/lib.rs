//! HAL Document Library
//!
//! This library models HAL hypermedia documents and converts them to and
//! from their JSON and XML representations.
//!
//! # Overview
//!
//! A [`Document`] holds:
//!
//! 1. An optional identity URI (the `self` link on the wire)
//! 2. Plain data fields
//! 3. A [`RelationIndex`] mapping relation names to one or more [`Link`]s
//! 4. Embedded child documents grouped by relation name
//!
//! Decoders take a maximum embedding depth. Depth 0 materializes only the
//! top-level document; each embedded level consumes one unit and content
//! below the limit is silently omitted.
//!
//! Relation names of the form `prefix:suffix` resolve through `curies`
//! templates at lookup time, so the order in which links and CURIEs are
//! added does not matter.
//!
//! # Usage
//!
//! ```ignore
//! use hal_document::{Attributes, Document};
//!
//! let doc = Document::from_json(text, 1)?;
//! let next = doc.first_link("next");
//! let custom = doc.first_link("acme:widgets"); // expanded through a CURIE
//!
//! let mut order = Document::new("http://example.org/orders/1", Default::default());
//! order
//!     .add_curie("acme", "http://docs.acme.com/rels/{rel}")
//!     .add_link("acme:customer", "http://example.org/customers/7", Attributes::new());
//!
//! println!("{}", order.to_xml(true)?);
//! ```

pub mod document;
pub mod error;
pub mod format;
pub mod json;
pub mod link;
pub mod relation;
pub mod vocab;
pub mod xml;

// Re-export main types for convenience
pub use crate::document::{Data, Document};
pub use crate::error::HalError;
pub use crate::format::Format;
pub use crate::link::{Attributes, Link};
pub use crate::relation::RelationIndex;
pub use crate::vocab::{CURIES_REL, EMBEDDED_KEY, LINKS_KEY, SELF_REL};
