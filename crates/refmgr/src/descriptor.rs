//! Endpoint descriptors and logical names

use std::fmt;
use std::sync::Arc;
use crate::error::{RefError, Result};

/// Separator between naming context and leaf in a logical name
pub const NAME_SEPARATOR: char = '.';

/// Opaque, serializable encoding of a resolved object's network location
///
/// Descriptors are produced by the naming directory and handed to the
/// runtime unchanged; the manager never interprets them. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EndpointDescriptor(Arc<str>);

impl EndpointDescriptor {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(Arc::from(encoded.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Stringified references run to hundreds of characters
        const SHOWN: usize = 24;
        match self.0.char_indices().nth(SHOWN) {
            Some((cut, _)) => write!(f, "EndpointDescriptor({}…)", &self.0[..cut]),
            None => write!(f, "EndpointDescriptor({})", self.0),
        }
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EndpointDescriptor {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for EndpointDescriptor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A configured object name split into its directory path
///
/// `billing.Invoice` names leaf `Invoice` in context `billing`. A name
/// without a separator lives in the server's default context. Only the
/// first separator splits; the leaf may itself contain dots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicalName {
    pub context: String,
    pub leaf: String,
}

impl LogicalName {
    pub fn parse(name: &str, default_context: &str) -> Result<Self> {
        let (context, leaf) = match name.split_once(NAME_SEPARATOR) {
            Some((context, leaf)) => (context, leaf),
            None => (default_context, name),
        };
        if context.is_empty() || leaf.is_empty() {
            return Err(RefError::InvalidName(name.to_string()));
        }
        Ok(Self {
            context: context.to_string(),
            leaf: leaf.to_string(),
        })
    }
}

impl fmt::Display for LogicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.context, NAME_SEPARATOR, self.leaf)
    }
}
