use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024; // 64 KB

/// Files above this size are never hashed; providers match them by name.
pub const DEFAULT_MAX_HASH_SIZE: u64 = 64 * 1024 * 1024;

/// Content hashes used to identify a ROM with a metadata provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHashes {
    /// Lowercase hex
    pub md5: String,
    /// Uppercase hex, 8 digits
    pub crc32: String,
    pub size: u64,
}

/// Hash a ROM file in one streaming pass.
///
/// Returns `Ok(None)` when the file is larger than `max_size`.
pub fn compute_rom_hashes(path: &Path, max_size: u64) -> io::Result<Option<RomHashes>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size > max_size {
        log::debug!(
            "Not hashing {} ({} bytes > {} byte cap)",
            path.display(),
            size,
            max_size
        );
        return Ok(None);
    }

    let mut crc = crc32fast::Hasher::new();
    let mut md5 = md5::Context::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        crc.update(&buf[..n]);
        md5.consume(&buf[..n]);
    }

    Ok(Some(RomHashes {
        md5: format!("{:x}", md5.compute()),
        crc32: format!("{:08X}", crc.finalize()),
        size,
    }))
}
