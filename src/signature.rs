//! Signature encoding (component D) and the matching container reader
//! (component E).

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use tracing::trace;

use crate::error::{RdiffError, Result};
use crate::rollsum::weak_checksum;
use crate::strong::{strong_hash, SigMagic};

/// An in-memory signature: header fields, one strong digest per basis block,
/// and a weak-checksum index for quickly finding candidate blocks.
///
/// Block `i` corresponds to basis bytes `[i * block_len, (i + 1) * block_len)`,
/// except possibly the last block, which may be shorter.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    sig_type: SigMagic,
    block_len: u32,
    strong_len: u32,
    strong_sigs: Vec<Vec<u8>>,
    weak2block: HashMap<u32, usize>,
}

impl Signature {
    /// The strong-hash algorithm this signature was built with.
    #[must_use]
    pub const fn sig_type(&self) -> SigMagic {
        self.sig_type
    }

    /// The block length used to split the basis.
    #[must_use]
    pub const fn block_len(&self) -> u32 {
        self.block_len
    }

    /// The truncated strong-hash length, in bytes.
    #[must_use]
    pub const fn strong_len(&self) -> u32 {
        self.strong_len
    }

    /// Number of blocks recorded in this signature.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.strong_sigs.len()
    }

    /// The strong digest recorded for block `idx`, if any.
    #[must_use]
    pub fn strong_sig(&self, idx: usize) -> Option<&[u8]> {
        self.strong_sigs.get(idx).map(Vec::as_slice)
    }

    /// Looks up the block index whose weak checksum is `weak`, if recorded.
    ///
    /// On a weak-sum collision during encoding only the first block that
    /// produced `weak` is reachable here; later blocks with the same weak
    /// sum must still be found by scanning, which the delta encoder never
    /// needs to do since it always confirms with the strong hash.
    #[must_use]
    pub fn block_for_weak(&self, weak: u32) -> Option<usize> {
        self.weak2block.get(&weak).copied()
    }
}

/// Reads at least `buf.len()` bytes, or as many as remain before EOF.
///
/// Mirrors `io.ReadAtLeast` semantics: keeps reading until the buffer is
/// full or the underlying reader reports EOF, whichever comes first.
fn read_at_least<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

/// Builds a [`Signature`], writing the wire-format header and per-block
/// records to `output` as blocks are digested.
pub struct SignatureEncoder<W> {
    sig_type: SigMagic,
    block_len: u32,
    strong_len: u32,
    block: Vec<u8>,
    strong_sigs: Vec<Vec<u8>>,
    weak2block: HashMap<u32, usize>,
    output: W,
}

impl<W: Write> SignatureEncoder<W> {
    /// Creates a signature encoder and writes the 12-byte header.
    ///
    /// `block_len` must be greater than zero, and `strong_len` must be at
    /// most `sig_type.max_strong_len()`.
    pub fn new(sig_type: SigMagic, block_len: u32, strong_len: u32, mut output: W) -> Result<Self> {
        if block_len == 0 {
            return Err(RdiffError::format("block_len must be greater than zero"));
        }
        let max_strong_len = sig_type.max_strong_len();
        if strong_len > max_strong_len {
            return Err(RdiffError::format(format!(
                "strong_len {strong_len} exceeds maximum {max_strong_len} for {sig_type:?}"
            )));
        }

        output.write_all(&sig_type.to_magic().to_be_bytes())?;
        output.write_all(&block_len.to_be_bytes())?;
        output.write_all(&strong_len.to_be_bytes())?;

        Ok(Self {
            sig_type,
            block_len,
            strong_len,
            block: vec![0u8; block_len as usize],
            strong_sigs: Vec::new(),
            weak2block: HashMap::new(),
            output,
        })
    }

    /// Digests an in-memory byte slice.
    pub fn digest(&mut self, bytes: &[u8]) -> Result<()> {
        self.digest_reader(Cursor::new(bytes))
    }

    /// Digests a stream, reading fixed-size blocks until the input is
    /// exhausted. A short final block (fewer than `block_len` bytes) still
    /// forms one last block, provided it is non-empty.
    pub fn digest_reader<R: Read>(&mut self, mut reader: R) -> Result<()> {
        loop {
            let n = read_at_least(&mut reader, &mut self.block)?;
            if n == 0 {
                break;
            }

            let data = &self.block[..n];
            let weak = weak_checksum(data);
            self.output.write_all(&weak.to_be_bytes())?;

            let strong = strong_hash(data, self.sig_type, self.strong_len);
            self.output.write_all(&strong)?;

            let idx = self.strong_sigs.len();
            self.weak2block.entry(weak).or_insert(idx);
            self.strong_sigs.push(strong);
            trace!(block = idx, len = n, weak, "signature block digested");

            if n < self.block.len() {
                break;
            }
        }
        Ok(())
    }

    /// Finalizes the signature, returning the in-memory structure. The
    /// output stream has already received the complete signature file.
    #[must_use]
    pub fn end(self) -> Signature {
        Signature {
            sig_type: self.sig_type,
            block_len: self.block_len,
            strong_len: self.strong_len,
            strong_sigs: self.strong_sigs,
            weak2block: self.weak2block,
        }
    }
}

/// Parses a signature wire-format stream back into a [`Signature`].
///
/// A short read in the middle of a record is a format error; end-of-stream
/// exactly at a record boundary is clean termination.
pub fn read_signature<R: Read>(mut reader: R) -> Result<Signature> {
    let mut header = [0u8; 12];
    reader.read_exact(&mut header)?;

    let magic = u32::from_be_bytes(header[0..4].try_into().unwrap());
    let block_len = u32::from_be_bytes(header[4..8].try_into().unwrap());
    let strong_len = u32::from_be_bytes(header[8..12].try_into().unwrap());
    let sig_type = SigMagic::from_magic(magic)?;

    let mut strong_sigs = Vec::new();
    let mut weak2block = HashMap::new();

    loop {
        let mut weak_buf = [0u8; 4];
        let n = read_at_least(&mut reader, &mut weak_buf)?;
        if n == 0 {
            break;
        }
        if n != 4 {
            return Err(RdiffError::format("truncated weak checksum in signature"));
        }
        let weak = u32::from_be_bytes(weak_buf);

        let mut strong = vec![0u8; strong_len as usize];
        reader
            .read_exact(&mut strong)
            .map_err(|_| RdiffError::format("truncated strong hash record in signature"))?;

        let idx = strong_sigs.len();
        weak2block.entry(weak).or_insert(idx);
        strong_sigs.push(strong);
    }

    Ok(Signature {
        sig_type,
        block_len,
        strong_len,
        strong_sigs,
        weak2block,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_input_yields_header_only() {
        let mut out = Vec::new();
        let enc = SignatureEncoder::new(SigMagic::Blake2, 512, 32, &mut out).unwrap();
        let sig = enc.end();
        assert_eq!(sig.block_count(), 0);
        assert_eq!(
            out,
            vec![0x72, 0x73, 0x01, 0x37, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x20]
        );
    }

    #[test]
    fn single_short_block() {
        let mut out = Vec::new();
        let mut enc = SignatureEncoder::new(SigMagic::Blake2, 512, 32, &mut out).unwrap();
        enc.digest(b"hello").unwrap();
        let sig = enc.end();
        assert_eq!(sig.block_count(), 1);

        let weak = weak_checksum(b"hello");
        let strong = strong_hash(b"hello", SigMagic::Blake2, 32);
        let mut expected = vec![0x72, 0x73, 0x01, 0x37, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x20];
        expected.extend_from_slice(&weak.to_be_bytes());
        expected.extend_from_slice(&strong);
        assert_eq!(out, expected);
    }

    #[test]
    fn block_count_matches_ceil_division() {
        let mut out = Vec::new();
        let mut enc = SignatureEncoder::new(SigMagic::Md4, 4, 16, &mut out).unwrap();
        enc.digest(b"0123456789").unwrap();
        let sig = enc.end();
        assert_eq!(sig.block_count(), 3); // ceil(10 / 4)
    }

    #[test]
    fn round_trips_through_wire_format() {
        let mut out = Vec::new();
        let mut enc = SignatureEncoder::new(SigMagic::Blake2, 8, 32, &mut out).unwrap();
        enc.digest(b"a bit of sample data, more than one block").unwrap();
        let sig = enc.end();

        let parsed = read_signature(Cursor::new(out)).unwrap();
        assert_eq!(parsed.sig_type(), sig.sig_type());
        assert_eq!(parsed.block_len(), sig.block_len());
        assert_eq!(parsed.strong_len(), sig.strong_len());
        assert_eq!(parsed.block_count(), sig.block_count());
    }

    #[test]
    fn truncated_record_is_format_error() {
        let mut out = Vec::new();
        let mut enc = SignatureEncoder::new(SigMagic::Blake2, 8, 32, &mut out).unwrap();
        enc.digest(b"a bit of sample data, more than one block").unwrap();
        drop(enc);
        out.truncate(out.len() - 5);
        assert!(read_signature(Cursor::new(out)).is_err());
    }

    #[test]
    fn rejects_strong_len_above_maximum() {
        let mut out = Vec::new();
        assert!(SignatureEncoder::new(SigMagic::Md4, 512, 17, &mut out).is_err());
    }

    #[test]
    fn rejects_zero_block_len() {
        let mut out = Vec::new();
        assert!(SignatureEncoder::new(SigMagic::Blake2, 0, 32, &mut out).is_err());
    }
}
