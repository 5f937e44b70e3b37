//! Little-endian primitives shared by the reference and frame encodings.

use bytes::{Buf, BufMut};
use crate::error::{NamingError, Result};

pub(crate) fn ensure<B: Buf>(buf: &B, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(NamingError::BufferUnderflow {
            needed,
            have: buf.remaining(),
        });
    }
    Ok(())
}

pub(crate) fn get_u8<B: Buf>(buf: &mut B) -> Result<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub(crate) fn get_u16<B: Buf>(buf: &mut B) -> Result<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16_le())
}

pub(crate) fn get_u32<B: Buf>(buf: &mut B) -> Result<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32_le())
}

/// Length prefix of a string, if it fits in a u16
pub(crate) fn str_len(value: &str) -> Result<u16> {
    u16::try_from(value.len()).map_err(|_| {
        NamingError::InvalidFrame(format!("string of {} bytes is too long", value.len()))
    })
}

/// Length prefix of a blob, if it fits in a u32
pub(crate) fn blob_len(value: &[u8]) -> Result<u32> {
    u32::try_from(value.len()).map_err(|_| {
        NamingError::InvalidFrame(format!("blob of {} bytes is too long", value.len()))
    })
}

/// Length-prefixed (u16) UTF-8 string
pub(crate) fn put_str<B: BufMut>(buf: &mut B, value: &str) -> Result<()> {
    buf.put_u16_le(str_len(value)?);
    buf.put_slice(value.as_bytes());
    Ok(())
}

pub(crate) fn get_str<B: Buf>(buf: &mut B) -> Result<String> {
    let len = get_u16(buf)? as usize;
    ensure(buf, len)?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    String::from_utf8(raw).map_err(|_| NamingError::InvalidFrame("invalid UTF-8 string".to_string()))
}

/// Length-prefixed (u32) opaque bytes
pub(crate) fn put_blob<B: BufMut>(buf: &mut B, value: &[u8]) -> Result<()> {
    buf.put_u32_le(blob_len(value)?);
    buf.put_slice(value);
    Ok(())
}

pub(crate) fn get_blob<B: Buf>(buf: &mut B) -> Result<bytes::Bytes> {
    let len = get_u32(buf)? as usize;
    ensure(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}
