//! Negacyclic number-theoretic transform over Z_12289[x]/(x^1024+1).
//!
//! The forward transform twists the input by powers of ψ, then runs an
//! in-place Cooley-Tukey butterfly network over ω = ψ²; the inverse runs
//! Gentleman-Sande butterflies, untwists by ψ^-i and scales by N^-1. All
//! twiddle tables are generated at compile time and are read-only afterwards.
//!
//! The butterfly network is fixed regardless of coefficient values, and the
//! modular reductions below are branchless, so the transform's run time does
//! not depend on the (possibly secret) data passing through it.

use crate::params::{N, N_INV, OMEGA, PSI, Q};
use crate::poly::{NttPoly, Poly};

const QU: u32 = Q as u32;
const LOG_N: u32 = 10;

const fn pow_mod(base: u32, mut exp: u32) -> u32 {
    let mut result = 1u32;
    let mut b = base % QU;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * b % QU;
        }
        b = b * b % QU;
        exp >>= 1;
    }
    result
}

/// x^-1 mod Q via Fermat's little theorem (Q is prime).
const fn inv_mod(x: u32) -> u32 {
    pow_mod(x, QU - 2)
}

const fn power_table<const LEN: usize>(root: u32) -> [u16; LEN] {
    let mut table = [0u16; LEN];
    let mut acc = 1u32;
    let mut i = 0;
    while i < LEN {
        table[i] = acc as u16;
        acc = acc * root % QU;
        i += 1;
    }
    table
}

/// ω^j for the forward butterflies, indexed by j·(N/len) per stage.
static FORWARD_TWIDDLES: [u16; N / 2] = power_table(OMEGA as u32);

/// ω^-j for the inverse butterflies.
static INVERSE_TWIDDLES: [u16; N / 2] = power_table(inv_mod(OMEGA as u32));

/// ψ^i pre-twist factors.
static PSI_POWERS: [u16; N] = power_table(PSI as u32);

/// ψ^-i post-untwist factors.
static PSI_INV_POWERS: [u16; N] = power_table(inv_mod(PSI as u32));

/// Reduce a value in [0, 2Q) into [0, Q) without branching.
#[inline]
fn csub(a: u32) -> u32 {
    let t = a.wrapping_sub(QU);
    t.wrapping_add(QU & 0u32.wrapping_sub(t >> 31))
}

#[inline]
pub(crate) fn add_mod(a: u16, b: u16) -> u16 {
    csub(a as u32 + b as u32) as u16
}

#[inline]
pub(crate) fn sub_mod(a: u16, b: u16) -> u16 {
    csub(a as u32 + QU - b as u32) as u16
}

/// Product mod Q. Division by the constant Q compiles to a multiply/shift
/// sequence, so this does not branch on the operands. Inputs need not be
/// reduced as long as they fit 14 bits.
#[inline]
pub(crate) fn mul_mod(a: u16, b: u16) -> u16 {
    (a as u32 * b as u32 % QU) as u16
}

fn bit_reverse_permute(c: &mut [u16; N]) {
    for i in 0..N {
        let j = (i as u32).reverse_bits() as usize >> (32 - LOG_N);
        if i < j {
            c.swap(i, j);
        }
    }
}

/// Forward transform. Consumes the coefficient-domain element and returns
/// its NTT-domain image; `invntt` is the exact inverse.
pub(crate) fn ntt(p: Poly) -> NttPoly {
    let mut c = p.into_coeffs();

    for i in 0..N {
        c[i] = mul_mod(c[i], PSI_POWERS[i]);
    }
    bit_reverse_permute(&mut c);

    let mut len = 2;
    while len <= N {
        let half = len / 2;
        let step = N / len;
        let mut start = 0;
        while start < N {
            let mut k = 0;
            for j in start..start + half {
                let t = mul_mod(FORWARD_TWIDDLES[k], c[j + half]);
                let u = c[j];
                c[j] = add_mod(u, t);
                c[j + half] = sub_mod(u, t);
                k += step;
            }
            start += len;
        }
        len <<= 1;
    }

    NttPoly::from_coeffs(c)
}

/// Inverse transform, including the N^-1 scaling and ψ^-i untwist.
pub(crate) fn invntt(p: NttPoly) -> Poly {
    let mut c = p.into_coeffs();

    let mut len = N;
    while len >= 2 {
        let half = len / 2;
        let step = N / len;
        let mut start = 0;
        while start < N {
            let mut k = 0;
            for j in start..start + half {
                let u = c[j];
                let v = c[j + half];
                c[j] = add_mod(u, v);
                c[j + half] = mul_mod(INVERSE_TWIDDLES[k], sub_mod(u, v));
                k += step;
            }
            start += len;
        }
        len >>= 1;
    }

    bit_reverse_permute(&mut c);
    for i in 0..N {
        c[i] = mul_mod(mul_mod(c[i], PSI_INV_POWERS[i]), N_INV);
    }

    Poly::from_coeffs(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_poly(rng: &mut ChaCha8Rng) -> Poly {
        let mut c = [0u16; N];
        for coeff in c.iter_mut() {
            *coeff = rng.gen_range(0..Q);
        }
        Poly::from_coeffs(c)
    }

    /// Direct negacyclic convolution modulo x^N+1 and Q.
    fn schoolbook_mul(a: &[u16; N], b: &[u16; N]) -> [u16; N] {
        let q = Q as u64;
        let mut acc = [0i64; N];
        for i in 0..N {
            for j in 0..N {
                let prod = (a[i] as u64 * b[j] as u64 % q) as i64;
                let k = i + j;
                if k < N {
                    acc[k] = (acc[k] + prod) % q as i64;
                } else {
                    acc[k - N] = (acc[k - N] - prod).rem_euclid(q as i64);
                }
            }
        }
        let mut out = [0u16; N];
        for i in 0..N {
            out[i] = acc[i].rem_euclid(q as i64) as u16;
        }
        out
    }

    #[test]
    fn test_twiddle_tables() {
        assert_eq!(FORWARD_TWIDDLES[0], 1);
        assert_eq!(PSI_POWERS[1], PSI);
        assert_eq!(mul_mod(PSI_POWERS[5], PSI_INV_POWERS[5]), 1);
        assert_eq!(mul_mod(FORWARD_TWIDDLES[7], INVERSE_TWIDDLES[7]), 1);
    }

    #[test]
    fn test_reductions() {
        assert_eq!(add_mod(Q - 1, 1), 0);
        assert_eq!(sub_mod(0, 1), Q - 1);
        assert_eq!(mul_mod(Q - 1, Q - 1), 1);
        assert_eq!(csub(QU), 0);
        assert_eq!(csub(QU - 1), QU - 1);
    }

    #[test]
    fn test_ntt_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..4 {
            let p = random_poly(&mut rng);
            let expected = *p.coeffs();
            let back = invntt(ntt(p));
            assert_eq!(back.coeffs(), &expected);
        }
    }

    #[test]
    fn test_pointwise_mul_matches_schoolbook() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let a = random_poly(&mut rng);
        let b = random_poly(&mut rng);
        let expected = schoolbook_mul(a.coeffs(), b.coeffs());

        let product = invntt(ntt(a).pointwise(&ntt(b)));
        assert_eq!(product.coeffs(), &expected);
    }

    #[test]
    fn test_mul_by_x_shifts_and_negates() {
        // x * (c0 + c1 x + ...) = -c_{N-1} + c0 x + ... modulo x^N + 1.
        let mut a = [0u16; N];
        for (i, coeff) in a.iter_mut().enumerate() {
            *coeff = (i % Q as usize) as u16;
        }
        let mut x = [0u16; N];
        x[1] = 1;

        let product = invntt(ntt(Poly::from_coeffs(a)).pointwise(&ntt(Poly::from_coeffs(x))));
        let c = product.coeffs();
        assert_eq!(c[0], sub_mod(0, a[N - 1]));
        for i in 1..N {
            assert_eq!(c[i], a[i - 1]);
        }
    }
}
