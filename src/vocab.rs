//! Reserved vocabulary of the HAL wire formats
//!
//! Keys, relation names and element names that carry structure (links,
//! embedded resources, identity) rather than plain data.

/// JSON key of the links container
pub const LINKS_KEY: &str = "_links";

/// JSON key of the embedded resources container
pub const EMBEDDED_KEY: &str = "_embedded";

/// Relation holding the document's own identity
pub const SELF_REL: &str = "self";

/// Relation holding CURIE templates
pub const CURIES_REL: &str = "curies";

/// Placeholder replaced by the relation suffix when a CURIE is expanded
pub const REL_PLACEHOLDER: &str = "{rel}";

pub const HREF_ATTR: &str = "href";
pub const TITLE_ATTR: &str = "title";
pub const REL_ATTR: &str = "rel";
pub const NAME_ATTR: &str = "name";
pub const TEMPLATED_ATTR: &str = "templated";

/// XML element carrying one link
pub const LINK_ELEMENT: &str = "link";

/// XML element carrying a document (root or embedded)
pub const RESOURCE_ELEMENT: &str = "resource";

/// Prefix marking a data key as an XML attribute
pub const ATTRIBUTE_MARKER: char = '@';

/// Data key holding the text of an XML element that also has attributes
pub const TEXT_KEY: &str = "#text";

/// Whether a data key is one of the reserved JSON containers
pub fn is_reserved_key(key: &str) -> bool {
    key == LINKS_KEY || key == EMBEDDED_KEY
}

/// Whether a data key is rendered as an XML attribute
pub fn is_attribute_key(key: &str) -> bool {
    key.starts_with(ATTRIBUTE_MARKER)
}
