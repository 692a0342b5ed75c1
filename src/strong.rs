//! Strong (cryptographic) hashing and the signature/delta magic numbers.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use md4::Md4;

use crate::error::{RdiffError, Result};

/// BLAKE2b-256 signature magic (0x72730137).
pub const BLAKE2_SIG_MAGIC: u32 = 0x7273_0137;
/// MD4 signature magic (0x72730136).
pub const MD4_SIG_MAGIC: u32 = 0x7273_0136;
/// Delta stream magic (0x72730236).
pub const DELTA_MAGIC: u32 = 0x7273_0236;

/// Full BLAKE2b-256 digest length, in bytes.
pub const BLAKE2_SUM_LENGTH: u32 = 32;
/// Full MD4 digest length, in bytes.
pub const MD4_SUM_LENGTH: u32 = 16;

/// BLAKE2b with a 32-byte output, i.e. BLAKE2b-256. The output length is
/// mixed into BLAKE2b's parameter block, so this is *not* the same digest
/// as truncating a BLAKE2b-512 (`Blake2b512`) result.
type Blake2b256 = Blake2b<U32>;

/// Which strong-hash algorithm a signature uses, identified by its magic
/// number at the head of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SigMagic {
    /// BLAKE2b-256, truncated to the signature's `strong_len`.
    Blake2,
    /// MD4, truncated to the signature's `strong_len`.
    Md4,
}

impl SigMagic {
    /// Parses a 32-bit magic number, rejecting anything but the two
    /// recognized signature magics.
    pub fn from_magic(magic: u32) -> Result<Self> {
        match magic {
            BLAKE2_SIG_MAGIC => Ok(Self::Blake2),
            MD4_SIG_MAGIC => Ok(Self::Md4),
            other => Err(RdiffError::format(format!(
                "invalid signature magic {other:#010x}"
            ))),
        }
    }

    /// The wire-format magic number for this algorithm.
    #[must_use]
    pub const fn to_magic(self) -> u32 {
        match self {
            Self::Blake2 => BLAKE2_SIG_MAGIC,
            Self::Md4 => MD4_SIG_MAGIC,
        }
    }

    /// The algorithm's natural digest length, which bounds `strong_len`.
    #[must_use]
    pub const fn max_strong_len(self) -> u32 {
        match self {
            Self::Blake2 => BLAKE2_SUM_LENGTH,
            Self::Md4 => MD4_SUM_LENGTH,
        }
    }
}

/// Computes the truncated strong hash of `data` for the given algorithm.
///
/// `strong_len` must be at most `sig_type.max_strong_len()`; callers
/// (`SignatureEncoder::new`) are expected to validate this once up front
/// rather than on every block.
#[must_use]
pub fn strong_hash(data: &[u8], sig_type: SigMagic, strong_len: u32) -> Vec<u8> {
    let strong_len = strong_len as usize;
    match sig_type {
        SigMagic::Blake2 => {
            let digest = Blake2b256::digest(data);
            digest[..strong_len].to_vec()
        }
        SigMagic::Md4 => {
            let digest = Md4::digest(data);
            digest[..strong_len].to_vec()
        }
    }
}
