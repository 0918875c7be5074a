mod generate;
mod persist;

pub use generate::{generate, Mode};
pub use persist::{to_hex, LevelError};

use protocol::blocks;
use protocol::codec;
use protocol::{HASH_LENGTH, STRING_LENGTH};
use sha2::{Digest, Sha256};

/// How the level is persisted: a raw voxel array, or an ordered,
/// hash-linked log of block updates (useful for audits and rollbacks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Plain,
    Chain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawnpoint {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub yaw: u8,
    pub pitch: u8,
}

/// Serialized size of one chain entry:
/// x(2) y(2) z(2) id(1) name(64) prev_hash(32).
pub const BLOCK_UPDATE_SIZE: usize = 2 + 2 + 2 + 1 + STRING_LENGTH + HASH_LENGTH;

/// One entry of a chain level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockUpdate {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub id: u8,
    /// Player that placed the block; empty when not player-initiated.
    pub name: String,
    /// SHA-256 of the previous entry's serialization; zero for the first
    /// entry of a chain.
    pub prev_hash: [u8; HASH_LENGTH],
}

impl BlockUpdate {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(BLOCK_UPDATE_SIZE);

        buffer.extend_from_slice(&codec::encode_short(self.x));
        buffer.extend_from_slice(&codec::encode_short(self.y));
        buffer.extend_from_slice(&codec::encode_short(self.z));
        buffer.push(self.id);
        buffer.extend_from_slice(&codec::encode_string(&self.name));
        buffer.extend_from_slice(&self.prev_hash);

        buffer
    }

    /// `data` must hold at least [`BLOCK_UPDATE_SIZE`] bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut prev_hash = [0u8; HASH_LENGTH];
        prev_hash.copy_from_slice(&data[7 + STRING_LENGTH..7 + STRING_LENGTH + HASH_LENGTH]);

        Self {
            x: codec::decode_short(data, 0),
            y: codec::decode_short(data, 2),
            z: codec::decode_short(data, 4),
            id: data[6],
            name: codec::decode_string(data, 7),
            prev_hash,
        }
    }

    /// SHA-256 of this entry's serialization.
    pub fn hash(&self) -> [u8; HASH_LENGTH] {
        Sha256::digest(self.to_bytes()).into()
    }
}

/// The shared world: a dense row-major voxel array plus the optional
/// update chain. Dimensions, spawn and kind never change after creation;
/// only `data` and `chain` mutate.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    width: i16,
    height: i16,
    depth: i16,
    data: Vec<u8>,
    spawn: Spawnpoint,
    kind: Kind,
    chain: Vec<BlockUpdate>,
}

impl Level {
    /// An all-air level. Dimensions must be positive.
    pub fn new(width: i16, height: i16, depth: i16, spawn: Spawnpoint, kind: Kind) -> Self {
        let volume = width as usize * height as usize * depth as usize;

        Self {
            width,
            height,
            depth,
            data: vec![blocks::AIR; volume],
            spawn,
            kind,
            chain: Vec::new(),
        }
    }

    pub fn width(&self) -> i16 {
        self.width
    }

    pub fn height(&self) -> i16 {
        self.height
    }

    pub fn depth(&self) -> i16 {
        self.depth
    }

    pub fn spawn(&self) -> Spawnpoint {
        self.spawn
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn chain(&self) -> &[BlockUpdate] {
        &self.chain
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn index(&self, x: i16, y: i16, z: i16) -> usize {
        ((y as usize * self.depth as usize) + z as usize) * self.width as usize + x as usize
    }

    pub fn in_bounds(&self, x: i16, y: i16, z: i16) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y) && (0..self.depth).contains(&z)
    }

    /// Returns AIR for out-of-bounds coordinates.
    pub fn get(&self, x: i16, y: i16, z: i16) -> u8 {
        if !self.in_bounds(x, y, z) {
            return blocks::AIR;
        }

        self.data[self.index(x, y, z)]
    }

    pub fn set(&mut self, x: i16, y: i16, z: i16, id: u8) {
        self.set_by(x, y, z, id, "");
    }

    /// Writes the cell and, for chain levels, appends the update to the
    /// chain linked to the previous entry's hash. Out-of-bounds writes are
    /// ignored.
    pub fn set_by(&mut self, x: i16, y: i16, z: i16, id: u8, name: &str) {
        if !self.in_bounds(x, y, z) {
            return;
        }

        let index = self.index(x, y, z);
        self.data[index] = id;

        if self.kind == Kind::Chain {
            let prev_hash = match self.chain.last() {
                Some(previous) => previous.hash(),
                None => [0u8; HASH_LENGTH],
            };

            self.chain.push(BlockUpdate {
                x,
                y,
                z,
                id,
                name: name.to_string(),
                prev_hash,
            });
        }
    }
}
