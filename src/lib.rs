//! A librsync-compatible signature/delta codec.
//!
//! Given a "basis" stream, [`signature`] (or the streaming [`SignatureEncoder`])
//! produces a compact, block-hashed description of its content. Given that
//! signature and a "new" stream, [`delta`] (or the streaming [`DeltaEncoder`])
//! produces a delta of copy/literal operations that, applied to the basis,
//! reconstructs the new stream. The wire format is bit-for-bit compatible
//! with rsync/librsync's signature and delta files.
//!
//! This crate only speaks the wire format: generating signatures and deltas.
//! Applying a delta to reconstruct a file is out of scope; pair it with a
//! patch implementation such as the `librsync` crate's `whole::patch`.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use rdiff_rs::{delta, signature, SigMagic};
//!
//! let basis = b"the quick brown fox jumps over the lazy dog";
//! let modified = b"the quick brown fox leaps over the lazy dog";
//!
//! let mut sig_bytes = Vec::new();
//! let sig = signature(Cursor::new(basis), &mut sig_bytes, 8, 32, SigMagic::Blake2).unwrap();
//!
//! let mut delta_bytes = Vec::new();
//! delta(&sig, Cursor::new(modified), &mut delta_bytes).unwrap();
//! assert_eq!(&delta_bytes[..4], &[0x72, 0x73, 0x02, 0x36]);
//! ```

mod delta;
mod error;
mod matcher;
mod rollsum;
mod signature;
mod strong;
mod window;

pub use delta::DeltaEncoder;
pub use error::{RdiffError, Result};
pub use rollsum::{weak_checksum, Rollsum};
pub use signature::{read_signature, Signature, SignatureEncoder};
pub use strong::{strong_hash, SigMagic};
pub use window::CircularBuffer;

use std::io::{Read, Write};
use tracing::error;

/// Default capacity, in bytes, of the match emitter's literal buffer.
pub const OUTPUT_BUFFER_SIZE: usize = 65536;

/// Computes a signature for `input` in one call, writing the wire-format
/// bytes to `output` and returning the in-memory [`Signature`].
///
/// # Errors
/// Returns an error if `block_len` is zero, if `strong_len` exceeds
/// `sig_type`'s maximum digest length, or if reading or writing fails.
pub fn signature<R: Read, W: Write>(
    input: R,
    output: W,
    block_len: u32,
    strong_len: u32,
    sig_type: SigMagic,
) -> Result<Signature> {
    signature_inner(input, output, block_len, strong_len, sig_type).inspect_err(|e| {
        error!(error = %e, "signature generation failed");
    })
}

fn signature_inner<R: Read, W: Write>(
    input: R,
    output: W,
    block_len: u32,
    strong_len: u32,
    sig_type: SigMagic,
) -> Result<Signature> {
    let mut enc = SignatureEncoder::new(sig_type, block_len, strong_len, output)?;
    enc.digest_reader(input)?;
    Ok(enc.end())
}

/// Computes a delta of `input` against `sig` in one call, writing the
/// wire-format bytes to `output`.
///
/// # Errors
/// Returns an error if reading or writing fails.
pub fn delta<R: Read, W: Write>(sig: &Signature, input: R, output: W) -> Result<()> {
    delta_inner(sig, input, output).inspect_err(|e| {
        error!(error = %e, "delta generation failed");
    })
}

fn delta_inner<R: Read, W: Write>(sig: &Signature, input: R, output: W) -> Result<()> {
    let mut enc = DeltaEncoder::new(sig.clone(), output)?;
    enc.digest_reader(input)?;
    enc.end()
}
