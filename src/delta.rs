//! Delta encoding (component G): the rolling scan over the new stream that
//! drives the match emitter.

use std::io::{Read, Write};

use tracing::{debug, trace};

use crate::error::{RdiffError, Result};
use crate::matcher::MatchEmitter;
use crate::rollsum::Rollsum;
use crate::signature::Signature;
use crate::strong::{strong_hash, DELTA_MAGIC};
use crate::window::CircularBuffer;
use crate::OUTPUT_BUFFER_SIZE;

/// Drives a byte-at-a-time rolling scan of the new stream against an
/// immutable [`Signature`], emitting copy/literal delta opcodes.
///
/// The scan is strictly forward and greedy: the first weak-sum hit that
/// also confirms under the strong hash always commits, and a confirmed
/// match is never reconsidered.
pub struct DeltaEncoder<W> {
    sig: Signature,
    window: CircularBuffer,
    rollsum: Rollsum,
    emitter: MatchEmitter<W>,
}

impl<W: Write> DeltaEncoder<W> {
    /// Creates a delta encoder with an internally allocated literal buffer
    /// of [`OUTPUT_BUFFER_SIZE`] bytes, writing the delta magic immediately.
    pub fn new(sig: Signature, output: W) -> Result<Self> {
        Self::with_lit_buf(sig, output, Vec::with_capacity(OUTPUT_BUFFER_SIZE))
    }

    /// Creates a delta encoder reusing a caller-supplied literal buffer.
    /// The buffer must be empty with non-zero capacity.
    pub fn with_lit_buf(sig: Signature, mut output: W, lit_buf: Vec<u8>) -> Result<Self> {
        output.write_all(&DELTA_MAGIC.to_be_bytes())?;
        let emitter = MatchEmitter::with_buffer(output, lit_buf)?;
        let block_len = sig.block_len() as usize;
        Ok(Self {
            sig,
            window: CircularBuffer::new(block_len),
            rollsum: Rollsum::new(),
            emitter,
        })
    }

    /// Feeds an in-memory slice of the new stream through the scan.
    pub fn digest(&mut self, bytes: &[u8]) -> Result<()> {
        for &b in bytes {
            self.process_byte(b)?;
        }
        Ok(())
    }

    /// Feeds a stream through the scan, one byte at a time.
    pub fn digest_reader<R: Read>(&mut self, reader: R) -> Result<()> {
        for b in reader.bytes() {
            self.process_byte(b?)?;
        }
        Ok(())
    }

    fn process_byte(&mut self, b: u8) -> Result<()> {
        let evicted = self.window.push(b);
        self.rollsum.roll_in(b);

        let block_len = u64::from(self.sig.block_len());

        if u64::from(self.rollsum.count()) < block_len {
            return Ok(());
        }

        if u64::from(self.rollsum.count()) > block_len {
            let prev = evicted.ok_or_else(|| RdiffError::internal("expected an evicted byte"))?;
            self.emitter.add_literal(prev)?;
            self.rollsum.roll_out(prev);
        }

        let weak = self.rollsum.digest();
        if let Some(idx) = self.sig.block_for_weak(weak) {
            let expected = self
                .sig
                .strong_sig(idx)
                .ok_or_else(|| RdiffError::internal("signature index out of range"))?;
            let actual = strong_hash(self.window.bytes(), self.sig.sig_type(), self.sig.strong_len());
            if actual.as_slice() == expected {
                debug!(block = idx, weak, "confirmed match");
                self.emitter.add_copy(idx as u64 * block_len, block_len)?;
                self.rollsum.reset();
                self.window.reset();
            } else {
                trace!(weak, "weak-sum collision rejected by strong hash");
            }
        }
        Ok(())
    }

    /// Drains the remaining window as literals, flushes the match emitter,
    /// and writes the terminating END opcode.
    pub fn end(mut self) -> Result<()> {
        let remaining: Vec<u8> = self.window.bytes().to_vec();
        for b in remaining {
            self.emitter.add_literal(b)?;
        }
        self.emitter.flush()?;
        self.emitter.write_end()
    }
}
