//! Content fingerprinting for datasets and cache keys.
//!
//! All hashing is BLAKE3. A [`Fingerprint`] covers every cell value of a
//! loaded dataset and is the staleness tag for derived caches.

use blake3::Hasher;

/// 256-bit content fingerprint of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Wraps a raw 32-byte BLAKE3 digest.
    #[inline]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering, used for snapshot tagging and logging.
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        let mut out = String::with_capacity(64);
        for byte in &self.0 {
            // Writing to a String cannot fail.
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    /// Parses the hex rendering produced by [`Fingerprint::to_hex`].
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let s = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(s, 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Incremental fingerprint builder fed one cell at a time.
///
/// Cells are separated by a `0x1f` unit separator and rows by `0x1e` so that
/// shifting text between adjacent cells or rows changes the digest.
#[derive(Debug, Default)]
pub struct FingerprintBuilder {
    hasher: Hasher,
}

impl FingerprintBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one cell value.
    #[inline]
    pub fn cell(&mut self, value: &str) {
        self.hasher.update(value.as_bytes());
        self.hasher.update(&[0x1f]);
    }

    /// Marks the end of a row.
    #[inline]
    pub fn end_row(&mut self) {
        self.hasher.update(&[0x1e]);
    }

    /// Finalizes the digest.
    #[inline]
    pub fn finish(self) -> Fingerprint {
        Fingerprint(*self.hasher.finalize().as_bytes())
    }
}

/// Computes a 64-bit BLAKE3-truncated hash, used for compact cache keys.
///
/// 64 bits is ample for per-dataset record counts; a collision only costs a
/// recomputed embedding, never corruption.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
