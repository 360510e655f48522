//! Error reconciliation: both parties hold noisy, nearly-equal ring
//! elements and must agree on identical secret bits.
//!
//! Coefficients are processed in groups of four (i, i+256, i+512, i+768),
//! each group yielding one of the 256 key bits. The responder's `helprec`
//! quantizes its group against the D̃₄ lattice, randomly dithered by one
//! fresh bit to remove the bias of rounding near cell boundaries, and
//! publishes the 2-bit-per-coefficient cell coordinates as the hint. Both
//! sides then run the same `reconcile` decoder, which uses the hint to
//! shift its own noisy group onto the chosen grid and reads off the bit.
//!
//! For noise within the design bound the two sides disagree on some bit
//! only with probability around 2^-60. That residual failure is a property
//! of the parameters, not an error this module can observe.
//!
//! Everything here touches secret data: quotients are by compile-time
//! constants, absolute values and selections are mask arithmetic, and no
//! branch or index depends on a coefficient.

use crate::params::{N, Q, REC_BYTES, SEED_BYTES, SHARED_KEY_BYTES};
use crate::poly::Poly;

const Q32: i32 = Q as i32;

/// Per-coefficient 2-bit reconciliation hint.
#[derive(Clone)]
pub(crate) struct Hint {
    vals: [u8; N],
}

impl Hint {
    /// Four 2-bit values per byte; byte i carries coefficients 4i..4i+3 at
    /// bit offsets 0, 2, 4, 6. Fixed wire layout shared with the peer.
    pub(crate) fn to_bytes(&self) -> [u8; REC_BYTES] {
        let mut out = [0u8; REC_BYTES];
        for i in 0..REC_BYTES {
            out[i] = self.vals[4 * i]
                | (self.vals[4 * i + 1] << 2)
                | (self.vals[4 * i + 2] << 4)
                | (self.vals[4 * i + 3] << 6);
        }
        out
    }

    pub(crate) fn from_bytes(bytes: &[u8; REC_BYTES]) -> Hint {
        let mut vals = [0u8; N];
        for i in 0..REC_BYTES {
            vals[4 * i] = bytes[i] & 0x03;
            vals[4 * i + 1] = (bytes[i] >> 2) & 0x03;
            vals[4 * i + 2] = (bytes[i] >> 4) & 0x03;
            vals[4 * i + 3] = bytes[i] >> 6;
        }
        Hint { vals }
    }
}

/// Branchless |x|.
#[inline]
fn abs_mask(x: i32) -> i32 {
    let m = x >> 31;
    (x ^ m) - m
}

/// Distance from x (positive) to the nearest multiple of 8Q, computed by
/// rounding to the nearest multiple of 4Q and pushing odd multiples up.
#[inline]
fn dist_8q(x: i32) -> i32 {
    let r = (x + 2 * Q32) / (4 * Q32);
    let t = (r >> 1) + (r & 1);
    abs_mask(x - t * 8 * Q32)
}

/// Produce the public hint for the noisy element `v`.
///
/// `rand` supplies one fresh dither bit per coefficient group, 256 bits in
/// all, which is why it is exactly seed-sized. Each scaled coefficient
/// x = 8v + 4b is rounded both to the nearest multiple of 2Q (`v0`) and
/// down (`v1`); the group uses `v1` when its total distance to the `v0`
/// grid reaches 2Q. The published cell is expressed in the lattice basis
/// (c0-c3, c1-c3, c2-c3, k+2·c3), each entry mod 4.
pub(crate) fn helprec(v: &Poly, rand: &[u8; SEED_BYTES]) -> Hint {
    let c = v.coeffs();
    let mut vals = [0u8; N];

    for i in 0..N / 4 {
        let b = ((rand[i >> 3] >> (i & 7)) & 1) as i32;

        let mut v0 = [0i32; 4];
        let mut v1 = [0i32; 4];
        let mut k = 0i32;
        for j in 0..4 {
            let x = 8 * c[i + 256 * j] as i32 + 4 * b;
            v0[j] = (x + Q32) / (2 * Q32);
            v1[j] = x / (2 * Q32);
            k += abs_mask(x - v0[j] * 2 * Q32);
        }

        // All-ones when k >= 2Q, i.e. the group is closer to the v1 grid.
        let mask = (2 * Q32 - 1 - k) >> 31;
        let mut chosen = [0i32; 4];
        for j in 0..4 {
            chosen[j] = (v0[j] & !mask) | (v1[j] & mask);
        }

        vals[i] = ((chosen[0] - chosen[3]) & 3) as u8;
        vals[i + 256] = ((chosen[1] - chosen[3]) & 3) as u8;
        vals[i + 512] = ((chosen[2] - chosen[3]) & 3) as u8;
        vals[i + 768] = (((mask & 1) + 2 * chosen[3]) & 3) as u8;
    }

    Hint { vals }
}

/// Recover the 256 shared-secret bits from a noisy element and the hint.
///
/// Both parties call this with their own element; as long as the elements
/// differ by noise within the design bound, the outputs are identical.
pub(crate) fn reconcile(v: &Poly, hint: &Hint) -> [u8; SHARED_KEY_BYTES] {
    let c = v.coeffs();
    let mut key = [0u8; SHARED_KEY_BYTES];

    for i in 0..N / 4 {
        let h3 = hint.vals[i + 768] as i32;
        let mut t = 0i32;
        for j in 0..3 {
            let h = hint.vals[i + 256 * j] as i32;
            t += dist_8q(16 * Q32 + 8 * c[i + 256 * j] as i32 - Q32 * (2 * h + h3));
        }
        t += dist_8q(16 * Q32 + 8 * c[i + 768] as i32 - Q32 * h3);

        let bit = (((t - 8 * Q32) >> 31) & 1) as u8;
        key[i >> 3] |= bit << (i & 7);
    }

    key
}
