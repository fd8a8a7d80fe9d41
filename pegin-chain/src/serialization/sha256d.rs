//! SHA256d, a.k.a., double SHA2, a.k.a., 2 SHA 2 Furious

use std::{fmt, io::prelude::*};

use sha2::{Digest, Sha256};

/// An `io::Write` instance that produces a SHA256d output.
#[derive(Default)]
pub struct Writer {
    hash: Sha256,
}

impl Writer {
    /// Consume the Writer and produce the hash result.
    pub fn finish(self) -> [u8; 32] {
        let result1 = self.hash.finalize();
        let result2 = Sha256::digest(result1);
        let mut buffer = [0u8; 32];
        buffer[0..32].copy_from_slice(&result2[0..32]);
        buffer
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.hash.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Returns the SHA256d hash of `bytes`.
pub fn hash(bytes: &[u8]) -> [u8; 32] {
    let mut writer = Writer::default();
    writer
        .write_all(bytes)
        .expect("writing to a hasher is infallible");
    writer.finish()
}

/// Formats a SHA256d hash the way Bitcoin displays it: hex, with the bytes reversed.
pub(crate) fn fmt_reversed_hex(bytes: &[u8; 32], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut reversed = *bytes;
    reversed.reverse();
    f.write_str(&hex::encode(reversed))
}

/// Parses a hash from Bitcoin's display format: hex, with the bytes reversed.
pub(crate) fn parse_reversed_hex(s: &str) -> Option<[u8; 32]> {
    let mut bytes = [0; 32];
    hex::decode_to_slice(s, &mut bytes[..]).ok()?;
    bytes.reverse();
    Some(bytes)
}
