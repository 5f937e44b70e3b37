//! Two-level directory names
//!
//! The directory is organised as naming contexts holding leaf bindings,
//! so every name is a `(context, leaf)` pair.

use std::fmt;
use bytes::{Buf, BufMut};
use crate::codec::{get_str, put_str, str_len};
use crate::error::{NamingError, Result};

/// A name within the directory: a leaf binding inside a naming context
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name {
    /// Naming context
    pub context: String,
    /// Binding name within the context
    pub leaf: String,
}

impl Name {
    /// Create a name, rejecting empty components
    pub fn new(context: impl Into<String>, leaf: impl Into<String>) -> Result<Self> {
        let name = Self {
            context: context.into(),
            leaf: leaf.into(),
        };
        if name.context.is_empty() || name.leaf.is_empty() {
            return Err(NamingError::InvalidName(name.to_string()));
        }
        if str_len(&name.context).is_err() || str_len(&name.leaf).is_err() {
            return Err(NamingError::InvalidName("name component too long".to_string()));
        }
        Ok(name)
    }

    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        put_str(buf, &self.context)?;
        put_str(buf, &self.leaf)
    }

    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let context = get_str(buf)?;
        let leaf = get_str(buf)?;
        Self::new(context, leaf)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.context, self.leaf)
    }
}
