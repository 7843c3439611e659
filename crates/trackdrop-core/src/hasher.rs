use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub fn read_full_file(file: &Path) -> io::Result<Vec<u8>> {
    let mut f = File::open(file)?;
    let mut buffer = Vec::new();
    f.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Hex-encoded BLAKE3 digest of `data`, as recorded in the manifest.
pub fn hash_data(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}
