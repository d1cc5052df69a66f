//! Content digest used for deduplication.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use echomark_audio::AudioError;

use crate::error::Result;

/// Lowercase hex MD5 of the file's bytes. An unreadable source is a decode
/// failure, the same as when the decoder itself cannot open it.
pub fn file_hash(path: &Path) -> Result<String> {
    let unreadable = |source: io::Error| AudioError::Open {
        path: path.display().to_string(),
        source,
    };
    let mut file = File::open(path).map_err(unreadable)?;
    let mut ctx = md5::Context::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(unreadable)?;
        if n == 0 {
            break;
        }
        ctx.consume(&buf[..n]);
    }
    Ok(format!("{:x}", ctx.compute()))
}
