//! An output stream with injectable failures.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use sift_io::IndexOutput;

/// In-memory [`IndexOutput`] that can be told to fail writes past a given size or
/// to fail on `seal`.
#[derive(Debug, Default)]
pub struct FaultyOutput {
    data: Vec<u8>,
    write_limit: Option<usize>,
    fail_seal: bool,
    seal_attempted: Arc<AtomicBool>,
}

impl FaultyOutput {
    pub fn new() -> FaultyOutput {
        Default::default()
    }

    /// Fails any write that would grow the output beyond `limit` bytes.
    pub fn failing_after(limit: usize) -> FaultyOutput {
        FaultyOutput {
            write_limit: Some(limit),
            ..Default::default()
        }
    }

    /// Accepts writes but fails to seal.
    pub fn failing_seal() -> FaultyOutput {
        FaultyOutput {
            fail_seal: true,
            ..Default::default()
        }
    }

    /// A flag set once `seal` has been called, whether or not it succeeded.
    /// Stays observable after the output has been moved or dropped.
    pub fn seal_probe(&self) -> Arc<AtomicBool> {
        self.seal_attempted.clone()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl std::io::Write for FaultyOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(limit) = self.write_limit {
            if self.data.len() + buf.len() > limit {
                return Err(std::io::Error::other("injected write failure"));
            }
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl IndexOutput for FaultyOutput {
    fn file_pointer(&self) -> u64 {
        self.data.len() as u64
    }

    fn seal(&mut self) -> std::io::Result<()> {
        self.seal_attempted.store(true, Ordering::SeqCst);
        if self.fail_seal {
            Err(std::io::Error::other("injected seal failure"))
        } else {
            Ok(())
        }
    }
}
