use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};

/// Checksum algorithm advertised to the registration endpoint.
pub const ALGORITHM: &str = "md5";

const BUF_SIZE: usize = 8 * 1024;

/// Hex-encoded MD5 digest of a file, streamed in fixed-size chunks.
pub fn md5_hex(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
