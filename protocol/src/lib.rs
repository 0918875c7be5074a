//! Wire codec for the Minecraft Classic 0x07 protocol.
//!
//! Everything on the wire is fixed-layout and big-endian: packets are a
//! 1-byte ID followed by fixed-width fields, strings are space-padded to
//! 64 bytes, and level data travels in zero-padded 1024-byte chunks.

/// Block IDs of the Classic block table
pub mod blocks;
/// Fixed-width field primitives shared by the reader, writer and packets
pub mod codec;
/// All packets of the Classic protocol
pub mod packets;
pub mod reader;
pub mod writer;

pub use reader::PacketReader;
pub use writer::PacketWriter;

/// Protocol version byte exchanged during identification.
pub const PROTOCOL_VERSION: u8 = 0x07;

/// Strings are right-padded with ASCII spaces to exactly this many bytes.
pub const STRING_LENGTH: usize = 64;

/// Byte arrays are right-padded with zeroes to exactly this many bytes;
/// the true length travels in a companion 16-bit field.
pub const BYTE_ARRAY_LENGTH: usize = 1024;

/// Raw SHA-256 output, no padding.
pub const HASH_LENGTH: usize = 32;
