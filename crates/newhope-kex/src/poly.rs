//! Ring elements, noise/uniform sampling, and byte encoding.
//!
//! Coefficient-domain and NTT-domain elements are separate types so that a
//! transform can never be skipped or applied twice without a type error; the
//! two wire formats only ever carry NTT-domain elements.

use rand::{CryptoRng, RngCore};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake128;
use zeroize::Zeroize;

use newhope_types::KexError;

use crate::ntt::{add_mod, mul_mod, sub_mod};
use crate::params::{N, POLY_BYTES, Q, SEED_BYTES};

/// SHAKE128 block size; the uniform sampler squeezes whole blocks.
const SHAKE128_RATE: usize = 168;

/// A polynomial in the coefficient domain, every coefficient in [0, Q).
#[derive(Clone, Zeroize)]
pub(crate) struct Poly {
    coeffs: [u16; N],
}

/// A polynomial in the NTT domain, every coefficient in [0, Q).
#[derive(Clone, Zeroize)]
pub(crate) struct NttPoly {
    coeffs: [u16; N],
}

impl Poly {
    pub(crate) fn from_coeffs(coeffs: [u16; N]) -> Self {
        Poly { coeffs }
    }

    pub(crate) fn coeffs(&self) -> &[u16; N] {
        &self.coeffs
    }

    pub(crate) fn into_coeffs(self) -> [u16; N] {
        self.coeffs
    }

    pub(crate) fn add(&self, other: &Poly) -> Poly {
        let mut coeffs = [0u16; N];
        for i in 0..N {
            coeffs[i] = add_mod(self.coeffs[i], other.coeffs[i]);
        }
        Poly { coeffs }
    }

    /// Sample a noise polynomial from the centered binomial distribution
    /// ψ₁₆: each coefficient is the difference of the popcounts of two
    /// independent 16-bit strings, mod Q.
    ///
    /// The bit counting uses byte-lane mask summation rather than a
    /// per-bit loop over the sampled value, so the work done never depends
    /// on the sampled (secret) bits.
    pub(crate) fn noise<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Poly, KexError> {
        let mut buf = [0u8; 4 * N];
        rng.try_fill_bytes(&mut buf)
            .map_err(|_| KexError::RandomSourceFailure)?;

        let mut coeffs = [0u16; N];
        for i in 0..N {
            let t = u32::from_le_bytes([buf[4 * i], buf[4 * i + 1], buf[4 * i + 2], buf[4 * i + 3]]);
            let mut d = 0u32;
            for j in 0..8 {
                d += (t >> j) & 0x0101_0101;
            }
            let a = ((d & 0xff) + ((d >> 8) & 0xff)) as u16;
            let b = (((d >> 16) & 0xff) + (d >> 24)) as u16;
            coeffs[i] = sub_mod(a, b);
        }

        buf.zeroize();
        Ok(Poly { coeffs })
    }
}

impl NttPoly {
    pub(crate) fn from_coeffs(coeffs: [u16; N]) -> Self {
        NttPoly { coeffs }
    }

    pub(crate) fn into_coeffs(self) -> [u16; N] {
        self.coeffs
    }

    pub(crate) fn add(&self, other: &NttPoly) -> NttPoly {
        let mut coeffs = [0u16; N];
        for i in 0..N {
            coeffs[i] = add_mod(self.coeffs[i], other.coeffs[i]);
        }
        NttPoly { coeffs }
    }

    /// Coefficient-wise product; in the NTT domain this is ring
    /// multiplication modulo x^N + 1.
    pub(crate) fn pointwise(&self, other: &NttPoly) -> NttPoly {
        let mut coeffs = [0u16; N];
        for i in 0..N {
            coeffs[i] = mul_mod(self.coeffs[i], other.coeffs[i]);
        }
        NttPoly { coeffs }
    }

    /// Expand a public seed into a uniformly random element via SHAKE128
    /// rejection sampling: 16-bit little-endian candidates are masked to
    /// 14 bits and redrawn while ≥ Q.
    ///
    /// Both peers derive the identical element from one seed. The result is
    /// taken to be in the NTT domain by protocol convention; a uniform
    /// element is uniform in either domain, so no transform is spent on it.
    pub(crate) fn uniform(seed: &[u8; SEED_BYTES]) -> NttPoly {
        let mut xof = Shake128::default();
        xof.update(seed);
        let mut reader = xof.finalize_xof();

        let mut coeffs = [0u16; N];
        let mut buf = [0u8; SHAKE128_RATE];
        let mut ctr = 0;
        while ctr < N {
            reader.read(&mut buf);
            let mut pos = 0;
            while pos + 2 <= SHAKE128_RATE && ctr < N {
                let val = u16::from_le_bytes([buf[pos], buf[pos + 1]]) & 0x3fff;
                if val < Q {
                    coeffs[ctr] = val;
                    ctr += 1;
                }
                pos += 2;
            }
        }

        NttPoly { coeffs }
    }

    pub(crate) fn to_bytes(&self) -> [u8; POLY_BYTES] {
        pack(&self.coeffs)
    }

    pub(crate) fn from_bytes(bytes: &[u8; POLY_BYTES]) -> NttPoly {
        NttPoly {
            coeffs: unpack(bytes),
        }
    }
}

/// Serialize coefficients at 14 bits each: four coefficients fill seven
/// bytes, low-order bits first. This layout is a wire contract shared with
/// every other implementation of the scheme.
pub(crate) fn pack(coeffs: &[u16; N]) -> [u8; POLY_BYTES] {
    let mut out = [0u8; POLY_BYTES];
    for i in 0..N / 4 {
        let t0 = coeffs[4 * i];
        let t1 = coeffs[4 * i + 1];
        let t2 = coeffs[4 * i + 2];
        let t3 = coeffs[4 * i + 3];
        out[7 * i] = t0 as u8;
        out[7 * i + 1] = ((t0 >> 8) | (t1 << 6)) as u8;
        out[7 * i + 2] = (t1 >> 2) as u8;
        out[7 * i + 3] = ((t1 >> 10) | (t2 << 4)) as u8;
        out[7 * i + 4] = (t2 >> 4) as u8;
        out[7 * i + 5] = ((t2 >> 12) | (t3 << 2)) as u8;
        out[7 * i + 6] = (t3 >> 6) as u8;
    }
    out
}

/// Inverse of [`pack`]. Every coefficient is masked to 14 bits; a peer can
/// therefore smuggle in values in [Q, 2^14), which the modular arithmetic
/// tolerates. The fixed input length means no bounds decision ever depends
/// on the data.
pub(crate) fn unpack(bytes: &[u8; POLY_BYTES]) -> [u16; N] {
    let mut coeffs = [0u16; N];
    for i in 0..N / 4 {
        let b = &bytes[7 * i..7 * i + 7];
        coeffs[4 * i] = b[0] as u16 | ((b[1] as u16 & 0x3f) << 8);
        coeffs[4 * i + 1] =
            (b[1] as u16 >> 6) | ((b[2] as u16) << 2) | ((b[3] as u16 & 0x0f) << 10);
        coeffs[4 * i + 2] =
            (b[3] as u16 >> 4) | ((b[4] as u16) << 4) | ((b[5] as u16 & 0x03) << 12);
        coeffs[4 * i + 3] = (b[5] as u16 >> 2) | ((b[6] as u16) << 6);
    }
    coeffs
}
