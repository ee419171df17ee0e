//! Incremental SHA-256 (FIPS 180-4).

use super::Digest;

/// Initial hash values: first 32 bits of the fractional parts of the square
/// roots of the first 8 primes.
const H0: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

/// Round constants: first 32 bits of the fractional parts of the cube roots
/// of the first 64 primes.
const K: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

/// Size of one compression block in bytes.
pub const BLOCK_SIZE: usize = 64;

#[inline]
fn ch(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (!x & z)
}

#[inline]
fn maj(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (x & z) ^ (y & z)
}

#[inline]
fn big_sigma0(x: u32) -> u32 {
    x.rotate_right(2) ^ x.rotate_right(13) ^ x.rotate_right(22)
}

#[inline]
fn big_sigma1(x: u32) -> u32 {
    x.rotate_right(6) ^ x.rotate_right(11) ^ x.rotate_right(25)
}

#[inline]
fn small_sigma0(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline]
fn small_sigma1(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

/// Runs the compression function over one 64-byte block.
fn compress(state: &mut [u32; 8], block: &[u8; BLOCK_SIZE]) {
    let mut w = [0u32; 64];
    for (t, word) in block.chunks_exact(4).enumerate() {
        w[t] = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
    }
    for t in 16..64 {
        w[t] = small_sigma1(w[t - 2])
            .wrapping_add(w[t - 7])
            .wrapping_add(small_sigma0(w[t - 15]))
            .wrapping_add(w[t - 16]);
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

    for t in 0..64 {
        let t1 = h
            .wrapping_add(big_sigma1(e))
            .wrapping_add(ch(e, f, g))
            .wrapping_add(K[t])
            .wrapping_add(w[t]);
        let t2 = big_sigma0(a).wrapping_add(maj(a, b, c));
        h = g;
        g = f;
        f = e;
        e = d.wrapping_add(t1);
        d = c;
        c = b;
        b = a;
        a = t1.wrapping_add(t2);
    }

    for (slot, value) in state.iter_mut().zip([a, b, c, d, e, f, g, h]) {
        *slot = slot.wrapping_add(value);
    }
}

/// An incremental SHA-256 hasher.
///
/// Feed bytes with [`update`](Self::update) in pieces of any size, then call
/// [`finalize`](Self::finalize). Finalizing applies the padding in place, so
/// the instance is spent afterwards: call [`reset`](Self::reset) before
/// hashing another message. Updating a spent instance without a reset is a
/// caller error and yields a meaningless digest.
#[derive(Debug, Clone)]
pub struct Sha256 {
    state: [u32; 8],
    block: [u8; BLOCK_SIZE],
    block_len: usize,
    bit_len: u64,
}

impl Sha256 {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self {
            state: H0,
            block: [0u8; BLOCK_SIZE],
            block_len: 0,
            bit_len: 0,
        }
    }

    /// Resets the hasher to its initial state.
    pub fn reset(&mut self) {
        self.state = H0;
        self.block_len = 0;
        self.bit_len = 0;
    }

    /// Updates the hasher with more data.
    pub fn update(&mut self, mut data: &[u8]) {
        // Message length is defined modulo 2^64 bits.
        self.bit_len = self.bit_len.wrapping_add((data.len() as u64).wrapping_mul(8));

        if self.block_len > 0 {
            let take = (BLOCK_SIZE - self.block_len).min(data.len());
            self.block[self.block_len..self.block_len + take].copy_from_slice(&data[..take]);
            self.block_len += take;
            data = &data[take..];

            if self.block_len < BLOCK_SIZE {
                return;
            }
            compress(&mut self.state, &self.block);
            self.block_len = 0;
        }

        // Whole blocks are compressed straight from the input.
        while let Some((block, rest)) = data.split_first_chunk::<BLOCK_SIZE>() {
            compress(&mut self.state, block);
            data = rest;
        }

        self.block[..data.len()].copy_from_slice(data);
        self.block_len = data.len();
    }

    /// Applies the final padding and returns the digest.
    ///
    /// The hasher must be [`reset`](Self::reset) before it is used again.
    pub fn finalize(&mut self) -> Digest {
        let bit_len = self.bit_len;

        // 0x80, zeros up to 56 mod 64, then the 64-bit big-endian length.
        let pad_len = if self.block_len < 56 {
            56 - self.block_len
        } else {
            120 - self.block_len
        };
        let mut padding = [0u8; 72];
        padding[0] = 0x80;
        padding[pad_len..pad_len + 8].copy_from_slice(&bit_len.to_be_bytes());
        self.update(&padding[..pad_len + 8]);
        debug_assert_eq!(self.block_len, 0);

        let mut out = [0u8; 32];
        for (dst, word) in out.chunks_exact_mut(4).zip(self.state) {
            dst.copy_from_slice(&word.to_be_bytes());
        }
        Digest::new(out)
    }

    /// Total number of message bytes fed since the last reset.
    pub fn len(&self) -> u64 {
        self.bit_len / 8
    }

    /// Returns true if no bytes were fed since the last reset.
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Convenience method to hash data in one shot.
    pub fn digest(data: &[u8]) -> Digest {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

impl Default for Sha256 {
    fn default() -> Self {
        Self::new()
    }
}
