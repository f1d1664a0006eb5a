//! A Writer for SHA-256d (two rounds of SHA-256) digests.

use std::io;

use sha2::{Digest, Sha256};

/// A type that lets you write out SHA-256d (double-SHA-256, as in two rounds).
#[derive(Default)]
pub struct Writer {
    hash: Sha256,
}

impl Writer {
    /// Consume the Writer and produce the hash result.
    pub fn finish(self) -> [u8; 32] {
        let first = self.hash.finalize();
        let second = Sha256::digest(&first);
        let mut output = [0u8; 32];
        output.copy_from_slice(&second);
        output
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hash.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
