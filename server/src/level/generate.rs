use super::{Kind, Level, Spawnpoint};
use anyhow::{bail, Result};
use log::info;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use protocol::blocks;
use std::time::{SystemTime, UNIX_EPOCH};

/// Terrain synthesis mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stone up to layer 4, dirt on 5 and 6, grass on 7.
    Flat,
    /// Reserved; requesting it is an error.
    Classic,
    /// Layered Perlin fields: cliff biomes stack stone, the rest gets
    /// rolling dirt hills with a grass top.
    Experimental,
}

/// Generates a level seeded from the current time. Writes go through
/// [`Level::set`], so a chain level records its own terrain.
pub fn generate(width: i16, height: i16, depth: i16, mode: Mode, kind: Kind) -> Result<Level> {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;

    build(width, height, depth, mode, kind, seed)
}

fn build(width: i16, height: i16, depth: i16, mode: Mode, kind: Kind, seed: u64) -> Result<Level> {
    let spawn = Spawnpoint {
        x: width / 2,
        y: 0,
        z: depth / 2,
        yaw: 0,
        pitch: 0,
    };
    let mut level = Level::new(width, height, depth, spawn, kind);

    match mode {
        Mode::Flat => flat(&mut level),
        Mode::Classic => bail!("the classic generator is not implemented"),
        Mode::Experimental => {
            info!("Level seed: {seed}");
            experimental(&mut level, seed);
        }
    }

    // spawn one block above the first open cell in the spawn column
    for y in 0..level.height() {
        if level.get(level.spawn.x, y, level.spawn.z) == blocks::AIR {
            level.spawn.y = y + 1;
            break;
        }
    }

    Ok(level)
}

fn flat(level: &mut Level) {
    for y in 0..8 {
        let id = match y {
            0..=4 => blocks::STONE,
            5..=6 => blocks::DIRT,
            _ => blocks::GRASS,
        };

        for x in 0..level.width() {
            for z in 0..level.depth() {
                level.set(x, y, z, id);
            }
        }
    }
}

fn noise_field(seed: u64, offset: u64) -> Fbm<Perlin> {
    Fbm::<Perlin>::new(seed.wrapping_add(offset) as u32)
        .set_octaves(3)
        .set_lacunarity(2.0)
}

/// Samples a field at (x, z), rescaled from [-1, 1] to [0, 1].
fn sample(field: &Fbm<Perlin>, x: i16, z: i16, scale: f64) -> f64 {
    field.get([f64::from(x) / scale, f64::from(z) / scale]) * 0.5 + 0.5
}

fn experimental(level: &mut Level, seed: u64) {
    let height1 = noise_field(seed, 0);
    let height2 = noise_field(seed, 1);
    let cliff1 = noise_field(seed, 2);
    let cliff2 = noise_field(seed, 3);
    let biome1 = noise_field(seed, 4);
    let biome2 = noise_field(seed, 5);

    for y in 0..5 {
        for x in 0..level.width() {
            for z in 0..level.depth() {
                level.set(x, y, z, blocks::STONE);
            }
        }
    }

    for x in 0..level.width() {
        for z in 0..level.depth() {
            let noise_height =
                ((sample(&height1, x, z, 10.0) * sample(&height2, x, z, 10.0)) * 20.0) as i16;
            let cliff_height =
                ((sample(&cliff1, x, z, 20.0) * sample(&cliff2, x, z, 20.0)) * 40.0) as i16;
            let biome = sample(&biome1, x, z, 20.0) * sample(&biome2, x, z, 20.0);

            if biome > 0.3 {
                for y in 0..cliff_height {
                    level.set(x, 5 + y, z, blocks::STONE);
                }
            } else {
                for y in 0..noise_height {
                    level.set(x, 5 + y, z, blocks::DIRT);
                }
                level.set(x, 5 + noise_height, z, blocks::GRASS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_layers() {
        let level = build(16, 16, 16, Mode::Flat, Kind::Plain, 0).unwrap();

        for x in 0..16 {
            for z in 0..16 {
                for y in 0..5 {
                    assert_eq!(level.get(x, y, z), blocks::STONE);
                }
                assert_eq!(level.get(x, 5, z), blocks::DIRT);
                assert_eq!(level.get(x, 6, z), blocks::DIRT);
                assert_eq!(level.get(x, 7, z), blocks::GRASS);
                assert_eq!(level.get(x, 8, z), blocks::AIR);
            }
        }
    }

    #[test]
    fn flat_spawn_sits_above_the_surface() {
        let level = build(16, 16, 16, Mode::Flat, Kind::Plain, 0).unwrap();
        let spawn = level.spawn();

        assert_eq!(spawn.x, 8);
        assert_eq!(spawn.z, 8);
        // the first air cell is at y=8, spawn one above it
        assert_eq!(spawn.y, 9);
    }

    #[test]
    fn classic_mode_is_not_implemented() {
        assert!(build(16, 16, 16, Mode::Classic, Kind::Plain, 0).is_err());
    }

    #[test]
    fn experimental_terrain_invariants() {
        let level = build(32, 64, 32, Mode::Experimental, Kind::Plain, 12345).unwrap();

        for x in 0..32 {
            for z in 0..32 {
                // the bedrock-replacement stone layers are unconditional
                for y in 0..5 {
                    assert_eq!(level.get(x, y, z), blocks::STONE);
                }
                for y in 0..64 {
                    assert!(blocks::is_valid(level.get(x, y, z)));
                }
            }
        }

        let spawn = level.spawn();
        assert!(level.in_bounds(spawn.x, spawn.y - 1, spawn.z));
        // the cell below head height is the first open one in the column
        assert_eq!(level.get(spawn.x, spawn.y - 1, spawn.z), blocks::AIR);
    }

    #[test]
    fn chain_level_records_its_terrain() {
        let level = build(8, 8, 8, Mode::Flat, Kind::Chain, 0).unwrap();

        // every generated block is in the chain, so a replay reconstructs
        // the terrain
        assert_eq!(level.chain().len(), 8 * 8 * 8);
        let restored = Level::deserialize(&level.serialize()).unwrap();
        assert_eq!(restored, level);
    }
}
