use crate::codec;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Sequential field writer over a growable buffer.
///
/// There is no framing metadata; packet boundaries are implicit in the
/// fixed per-packet sizes.
#[derive(Default)]
pub struct PacketWriter {
    buffer: Vec<u8>,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn write_string(&mut self, data: &str) {
        self.buffer.extend_from_slice(&codec::encode_string(data));
    }

    pub fn write_short(&mut self, data: i16) {
        self.buffer.extend_from_slice(&codec::encode_short(data));
    }

    pub fn write_byte(&mut self, data: u8) {
        self.buffer.push(data);
    }

    /// Writes `data` zero-padded to the fixed 1024-byte array size.
    pub fn write_byte_array(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(&codec::encode_byte_array(data));
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Writes the whole buffer to the socket and clears it.
    pub async fn flush_to<W: AsyncWrite + Unpin>(&mut self, socket: &mut W) -> io::Result<()> {
        socket.write_all(&self.buffer).await?;
        self.buffer.clear();
        Ok(())
    }
}
