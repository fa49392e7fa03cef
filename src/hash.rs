use serde::{Deserialize, Serialize};

/// Two-level deduplication key.
///
/// `coarse` groups states by a cheap progress measure (foundation heights,
/// stock position); `fine` identifies the symmetry-normalised configuration
/// within that group. The dedup table is bucketed by `coarse` so whole
/// buckets can be dropped between generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey {
    pub coarse: u32,
    pub fine: u128,
}

impl DedupKey {
    #[inline]
    pub const fn new(coarse: u32, fine: u128) -> Self {
        Self { coarse, fine }
    }
}

/// SplitMix64 PRNG step for stable, fast mixing.
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Streaming 128-bit fingerprint over a byte encoding.
///
/// Deterministic across runs and platforms. Collisions are possible in
/// principle; a colliding state is treated as already visited.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    a: u64,
    b: u64,
    len: u64,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self {
            a: 0xC0FF_EE00_D15E_CAFE,
            b: 0xDEAD_BEEF_F00D_FACE,
            len: 0,
        }
    }
}

impl Fingerprint {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn write_u64(&mut self, word: u64) {
        let m1 = splitmix64(word ^ self.len.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15);
        let m2 = splitmix64(m1 ^ 0xA5A5_A5A5_A5A5_A5A5);
        self.a = (self.a ^ m1).rotate_left(17).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        self.b = self.b.rotate_left(13) ^ m2;
        self.len = self.len.wrapping_add(1);
    }

    /// Feed bytes eight at a time; the tail is zero-padded and the byte
    /// count is folded in so `[0]` and `[0, 0]` differ.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let mut chunks = bytes.chunks_exact(8);
        for chunk in &mut chunks {
            let mut w = [0u8; 8];
            w.copy_from_slice(chunk);
            self.write_u64(u64::from_le_bytes(w));
        }
        let rest = chunks.remainder();
        let mut w = [0u8; 8];
        w[..rest.len()].copy_from_slice(rest);
        self.write_u64(u64::from_le_bytes(w) ^ ((bytes.len() as u64) << 56));
    }

    #[inline]
    pub fn finish(&self) -> u128 {
        let hi = splitmix64(self.a ^ self.len);
        let lo = splitmix64(self.b ^ hi.rotate_left(29));
        (u128::from(hi) << 64) | u128::from(lo)
    }
}

/// Fingerprint an already-canonical byte encoding in one call.
#[inline]
pub fn fingerprint(bytes: &[u8]) -> u128 {
    let mut fp = Fingerprint::new();
    fp.write_bytes(bytes);
    fp.finish()
}
