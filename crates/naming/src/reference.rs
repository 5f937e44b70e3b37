//! Object references
//!
//! An object reference carries everything a client needs to reach a remote
//! object: the host and port of the server exporting it, an opaque object
//! key understood by that server, and a repository type id. References
//! travel in binary form inside directory frames and in stringified form
//! (`IOR:` followed by lowercase hex of the binary form) wherever they must
//! be stored as text.

use std::fmt;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use crate::codec::{blob_len, ensure, get_blob, get_str, get_u16, get_u8, put_blob, put_str, str_len};
use crate::error::{NamingError, Result};

/// Reference signature ("IOER" in little-endian)
pub const REFERENCE_SIGNATURE: u32 = 0x52454F49;

/// Current encoding version
pub const REFERENCE_VERSION: u8 = 1;

/// Prefix of the stringified form
pub const STRINGIFIED_PREFIX: &str = "IOR:";

/// Location of a remote object
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectReference {
    /// Repository id of the object's interface, e.g. `IDL:Registry:1.0`
    pub type_id: String,
    /// Host exporting the object
    pub host: String,
    /// Port of the exporting server
    pub port: u16,
    /// Server-specific key identifying the object
    pub object_key: Bytes,
}

impl ObjectReference {
    /// Create a new reference
    pub fn new(
        type_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        object_key: impl Into<Bytes>,
    ) -> Self {
        Self {
            type_id: type_id.into(),
            host: host.into(),
            port,
            object_key: object_key.into(),
        }
    }

    /// `host:port` of the exporting server
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check that every field fits its length prefix
    pub fn validate(&self) -> Result<()> {
        str_len(&self.type_id)?;
        str_len(&self.host)?;
        blob_len(&self.object_key)?;
        Ok(())
    }

    /// Encode to buffer
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.validate()?;
        buf.put_u32_le(REFERENCE_SIGNATURE);
        buf.put_u8(REFERENCE_VERSION);
        put_str(buf, &self.type_id)?;
        put_str(buf, &self.host)?;
        buf.put_u16_le(self.port);
        put_blob(buf, &self.object_key)
    }

    /// Decode from buffer
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        ensure(buf, 4)?;
        let signature = buf.get_u32_le();
        if signature != REFERENCE_SIGNATURE {
            return Err(NamingError::InvalidReference(format!(
                "bad signature 0x{:08x}",
                signature
            )));
        }

        let version = get_u8(buf)?;
        if version != REFERENCE_VERSION {
            return Err(NamingError::InvalidReference(format!(
                "unsupported version {}",
                version
            )));
        }

        let type_id = get_str(buf)?;
        let host = get_str(buf)?;
        let port = get_u16(buf)?;
        let object_key = get_blob(buf)?;

        if host.is_empty() {
            return Err(NamingError::InvalidReference("empty host".to_string()));
        }

        Ok(Self {
            type_id,
            host,
            port,
            object_key,
        })
    }

    /// Stringified form, suitable for storing as text
    pub fn to_stringified(&self) -> Result<String> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(format!("{}{}", STRINGIFIED_PREFIX, hex::encode(&buf)))
    }

    /// Parse the stringified form
    pub fn parse_stringified(s: &str) -> Result<Self> {
        let body = s
            .trim()
            .strip_prefix(STRINGIFIED_PREFIX)
            .ok_or_else(|| NamingError::InvalidReference("missing IOR: prefix".to_string()))?;

        let raw = hex::decode(body)
            .map_err(|e| NamingError::InvalidReference(format!("bad hex: {}", e)))?;

        let mut cursor = raw.as_slice();
        let reference = Self::decode(&mut cursor)?;
        if cursor.has_remaining() {
            return Err(NamingError::InvalidReference(format!(
                "{} trailing bytes",
                cursor.remaining()
            )));
        }
        Ok(reference)
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.type_id, self.host, self.port)
    }
}
