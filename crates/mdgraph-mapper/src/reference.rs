use std::fmt;

use mdgraph_hash::ObjectId;

/// Typed pointer to a persisted value.
///
/// `location == None` is the "no object" sentinel: it still names the codec
/// the absent value would have used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub type_tag: String,
    pub location: Option<ObjectId>,
}

impl Reference {
    pub fn new(type_tag: impl Into<String>, location: ObjectId) -> Self {
        Self {
            type_tag: type_tag.into(),
            location: Some(location),
        }
    }

    pub fn none(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            location: None,
        }
    }

    pub fn is_none(&self) -> bool {
        self.location.is_none()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(oid) => write!(f, "{}:{}", self.type_tag, oid),
            None => write!(f, "{}:none", self.type_tag),
        }
    }
}
