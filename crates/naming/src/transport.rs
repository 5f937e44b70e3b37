//! Length-prefixed frame transport
//!
//! Frames are self-delimiting via the 4-byte length header, so a transport
//! can sit directly on a TCP stream or any other byte stream.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use crate::error::{NamingError, Result};

/// Frame length header size
pub const FRAME_HEADER_SIZE: usize = 4;

/// Maximum frame body size (64 KB default)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 65536;

/// Reads and writes directory frames over a byte stream
pub struct FrameTransport<T> {
    inner: T,
    max_frame_size: usize,
    read_buf: BytesMut,
}

impl<T> FrameTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_buf: BytesMut::with_capacity(4096),
        }
    }

    pub fn with_max_frame_size(mut self, max_size: usize) -> Self {
        self.max_frame_size = max_size;
        self
    }
}

impl<T: AsyncRead + Unpin> FrameTransport<T> {
    /// Read one complete frame body
    pub async fn read_frame(&mut self) -> Result<Bytes> {
        while self.read_buf.len() < FRAME_HEADER_SIZE {
            if self.fill_buf().await? == 0 {
                if self.read_buf.is_empty() {
                    return Err(NamingError::ConnectionClosed);
                }
                return Err(NamingError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "incomplete frame header",
                )));
            }
        }

        let body_len = (&self.read_buf[..FRAME_HEADER_SIZE]).get_u32_le() as usize;
        if body_len > self.max_frame_size {
            return Err(NamingError::FrameTooLarge {
                size: body_len,
                max: self.max_frame_size,
            });
        }

        let frame_len = FRAME_HEADER_SIZE + body_len;
        while self.read_buf.len() < frame_len {
            if self.fill_buf().await? == 0 {
                return Err(NamingError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "incomplete frame: expected {} bytes, got {}",
                        frame_len,
                        self.read_buf.len()
                    ),
                )));
            }
        }

        let mut frame = self.read_buf.split_to(frame_len);
        frame.advance(FRAME_HEADER_SIZE);
        Ok(frame.freeze())
    }

    async fn fill_buf(&mut self) -> Result<usize> {
        if self.read_buf.capacity() - self.read_buf.len() < 1024 {
            self.read_buf.reserve(4096);
        }
        Ok(self.inner.read_buf(&mut self.read_buf).await?)
    }
}

impl<T: AsyncWrite + Unpin> FrameTransport<T> {
    /// Write one frame body with its length header
    pub async fn write_frame(&mut self, body: &[u8]) -> Result<()> {
        if body.len() > self.max_frame_size {
            return Err(NamingError::FrameTooLarge {
                size: body.len(),
                max: self.max_frame_size,
            });
        }
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + body.len());
        buf.put_u32_le(body.len() as u32);
        buf.put_slice(body);
        self.inner.write_all(&buf).await?;
        self.inner.flush().await?;
        Ok(())
    }
}
