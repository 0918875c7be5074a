use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

/// gzip-wraps `source`. Both the level file and the level transfer sent
/// during session init travel gzipped.
pub fn compress(source: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(source)?;
    encoder.finish()
}

pub fn decompress(source: &[u8]) -> io::Result<Vec<u8>> {
    let mut output = Vec::new();
    GzDecoder::new(source).read_to_end(&mut output)?;
    Ok(output)
}
