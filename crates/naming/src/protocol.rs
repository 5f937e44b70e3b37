//! Directory wire protocol
//!
//! ```text
//! +--------+--------+--------+--------+--------+---------------
//! |        body length (u32 LE)       | opcode |  payload ...
//! +--------+--------+--------+--------+--------+---------------
//! ```
//!
//! Requests and responses share the framing; the opcode spaces are
//! disjoint so a misrouted frame is rejected rather than misread.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use crate::codec::{get_str, get_u32, get_u8, put_str};
use crate::error::{NamingError, Result};
use crate::name::Name;
use crate::reference::ObjectReference;

/// Request opcodes
pub mod opcode {
    pub const RESOLVE: u8 = 0x01;
    pub const BIND: u8 = 0x02;
    pub const UNBIND: u8 = 0x03;
    pub const LIST: u8 = 0x04;

    pub const RESOLVED: u8 = 0x81;
    pub const NOT_FOUND: u8 = 0x82;
    pub const ALREADY_BOUND: u8 = 0x83;
    pub const DONE: u8 = 0x84;
    pub const LISTING: u8 = 0x85;
    pub const FAILED: u8 = 0x8F;
}

/// Client to directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Resolve(Name),
    Bind {
        name: Name,
        reference: ObjectReference,
        /// Replace an existing binding instead of failing
        rebind: bool,
    },
    Unbind(Name),
    List(String),
}

/// Directory to client
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Resolved(ObjectReference),
    NotFound(Name),
    AlreadyBound(Name),
    Done,
    Listing(Vec<(String, ObjectReference)>),
    Failed(String),
}

impl Request {
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        match self {
            Request::Resolve(name) => {
                buf.put_u8(opcode::RESOLVE);
                name.encode(&mut buf)?;
            }
            Request::Bind {
                name,
                reference,
                rebind,
            } => {
                buf.put_u8(opcode::BIND);
                name.encode(&mut buf)?;
                reference.encode(&mut buf)?;
                buf.put_u8(u8::from(*rebind));
            }
            Request::Unbind(name) => {
                buf.put_u8(opcode::UNBIND);
                name.encode(&mut buf)?;
            }
            Request::List(context) => {
                buf.put_u8(opcode::LIST);
                put_str(&mut buf, context)?;
            }
        }
        Ok(buf.freeze())
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buf = data;
        let request = match get_u8(&mut buf)? {
            opcode::RESOLVE => Request::Resolve(Name::decode(&mut buf)?),
            opcode::BIND => {
                let name = Name::decode(&mut buf)?;
                let reference = ObjectReference::decode(&mut buf)?;
                let rebind = get_u8(&mut buf)? != 0;
                Request::Bind {
                    name,
                    reference,
                    rebind,
                }
            }
            opcode::UNBIND => Request::Unbind(Name::decode(&mut buf)?),
            opcode::LIST => Request::List(get_str(&mut buf)?),
            other => {
                return Err(NamingError::InvalidFrame(format!(
                    "unknown request opcode 0x{:02x}",
                    other
                )))
            }
        };
        finish(buf, request)
    }
}

impl Response {
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        match self {
            Response::Resolved(reference) => {
                buf.put_u8(opcode::RESOLVED);
                reference.encode(&mut buf)?;
            }
            Response::NotFound(name) => {
                buf.put_u8(opcode::NOT_FOUND);
                name.encode(&mut buf)?;
            }
            Response::AlreadyBound(name) => {
                buf.put_u8(opcode::ALREADY_BOUND);
                name.encode(&mut buf)?;
            }
            Response::Done => buf.put_u8(opcode::DONE),
            Response::Listing(entries) => {
                buf.put_u8(opcode::LISTING);
                let count = u32::try_from(entries.len())
                    .map_err(|_| NamingError::InvalidFrame("listing too long".to_string()))?;
                buf.put_u32_le(count);
                for (leaf, reference) in entries {
                    put_str(&mut buf, leaf)?;
                    reference.encode(&mut buf)?;
                }
            }
            Response::Failed(message) => {
                buf.put_u8(opcode::FAILED);
                put_str(&mut buf, message)?;
            }
        }
        Ok(buf.freeze())
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buf = data;
        let response = match get_u8(&mut buf)? {
            opcode::RESOLVED => Response::Resolved(ObjectReference::decode(&mut buf)?),
            opcode::NOT_FOUND => Response::NotFound(Name::decode(&mut buf)?),
            opcode::ALREADY_BOUND => Response::AlreadyBound(Name::decode(&mut buf)?),
            opcode::DONE => Response::Done,
            opcode::LISTING => {
                let count = get_u32(&mut buf)? as usize;
                // Each entry is at least a string length plus a reference header
                let mut entries = Vec::with_capacity(count.min(buf.remaining() / 8));
                for _ in 0..count {
                    let leaf = get_str(&mut buf)?;
                    let reference = ObjectReference::decode(&mut buf)?;
                    entries.push((leaf, reference));
                }
                Response::Listing(entries)
            }
            opcode::FAILED => Response::Failed(get_str(&mut buf)?),
            other => {
                return Err(NamingError::InvalidFrame(format!(
                    "unknown response opcode 0x{:02x}",
                    other
                )))
            }
        };
        finish(buf, response)
    }
}

fn finish<T>(rest: &[u8], value: T) -> Result<T> {
    if !rest.is_empty() {
        return Err(NamingError::InvalidFrame(format!(
            "{} trailing bytes",
            rest.len()
        )));
    }
    Ok(value)
}
