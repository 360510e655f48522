//! The three-step handshake: offer, accept, finish.
//!
//! The initiator keeps only an opaque [`SecretKey`] between its two steps;
//! the responder is stateless. Each invocation draws fresh randomness from
//! the caller-supplied RNG and owns all of its working data, so independent
//! handshakes can run concurrently without shared state. Secret material is
//! zeroized before the functions return.

use rand::{CryptoRng, RngCore};
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use newhope_types::KexError;

use crate::ntt::{invntt, ntt};
use crate::params::{
    ACCEPT_MSG_BYTES, OFFER_MSG_BYTES, POLY_BYTES, REC_BYTES, SEED_BYTES, SHARED_KEY_BYTES,
};
use crate::poly::{NttPoly, Poly};
use crate::reconcile::{helprec, reconcile, Hint};

/// The initiator's private state between `create_offer` and
/// `process_accept`: the secret polynomial, kept in the NTT domain.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SecretKey {
    secret: NttPoly,
}

/// The derived 32-byte session key.
///
/// Compares in constant time and is wiped on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SessionKey([u8; SHARED_KEY_BYTES]);

impl core::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionKey").finish_non_exhaustive()
    }
}

impl SessionKey {
    /// Hash capability boundary: the raw reconciled secret is passed once
    /// through SHA3-256 to produce the session key.
    fn derive(raw: &[u8; SHARED_KEY_BYTES]) -> Result<SessionKey, KexError> {
        let digest = Sha3_256::digest(raw);
        let bytes = digest
            .as_slice()
            .try_into()
            .map_err(|_| KexError::HashFailure)?;
        Ok(SessionKey(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SHARED_KEY_BYTES] {
        &self.0
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SessionKey {}

/// Initiator step 1: sample a secret, publish pk = a·s + e together with
/// the seed that regenerates `a`.
///
/// Returns the offer message to send to the peer and the secret state for
/// [`process_accept`]. The seed must never be reused; it is drawn fresh
/// from `rng` on every call.
pub fn create_offer<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<([u8; OFFER_MSG_BYTES], SecretKey), KexError> {
    let secret = ntt(Poly::noise(rng)?);
    let mut error = ntt(Poly::noise(rng)?);

    let mut seed = [0u8; SEED_BYTES];
    rng.try_fill_bytes(&mut seed)
        .map_err(|_| KexError::RandomSourceFailure)?;
    let a = NttPoly::uniform(&seed);

    let pk = a.pointwise(&secret).add(&error);
    error.zeroize();

    let mut msg = [0u8; OFFER_MSG_BYTES];
    msg[..POLY_BYTES].copy_from_slice(&pk.to_bytes());
    msg[POLY_BYTES..].copy_from_slice(&seed);

    Ok((msg, SecretKey { secret }))
}

/// Responder: consume an offer message, produce the accept message and the
/// responder's session key in one step.
///
/// Fails with [`KexError::LengthMismatch`] unless the message is exactly
/// [`OFFER_MSG_BYTES`] long; nothing is processed in that case.
pub fn process_offer<R: RngCore + CryptoRng>(
    rng: &mut R,
    offermsg: &[u8],
) -> Result<([u8; ACCEPT_MSG_BYTES], SessionKey), KexError> {
    if offermsg.len() != OFFER_MSG_BYTES {
        return Err(KexError::LengthMismatch {
            expected: OFFER_MSG_BYTES,
            got: offermsg.len(),
        });
    }

    let mut pk_bytes = [0u8; POLY_BYTES];
    pk_bytes.copy_from_slice(&offermsg[..POLY_BYTES]);
    let pk = NttPoly::from_bytes(&pk_bytes);

    let mut seed = [0u8; SEED_BYTES];
    seed.copy_from_slice(&offermsg[POLY_BYTES..]);
    let a = NttPoly::uniform(&seed);

    let mut secret = ntt(Poly::noise(rng)?);
    let mut error = ntt(Poly::noise(rng)?);
    let mut error2 = Poly::noise(rng)?;

    let bp = a.pointwise(&secret).add(&error);

    // v = pk·s' + e'', back in the coefficient domain for reconciliation.
    let mut v = invntt(pk.pointwise(&secret)).add(&error2);

    let mut dither = [0u8; SEED_BYTES];
    rng.try_fill_bytes(&mut dither)
        .map_err(|_| KexError::RandomSourceFailure)?;
    let hint = helprec(&v, &dither);
    let mut raw = reconcile(&v, &hint);
    let key = SessionKey::derive(&raw)?;

    secret.zeroize();
    error.zeroize();
    error2.zeroize();
    v.zeroize();
    raw.zeroize();
    dither.zeroize();

    let mut msg = [0u8; ACCEPT_MSG_BYTES];
    msg[..POLY_BYTES].copy_from_slice(&bp.to_bytes());
    msg[POLY_BYTES..].copy_from_slice(&hint.to_bytes());

    Ok((msg, key))
}

/// Initiator step 2: consume the retained secret and the peer's accept
/// message, produce the initiator's session key.
///
/// Fails with [`KexError::LengthMismatch`] unless the message is exactly
/// [`ACCEPT_MSG_BYTES`] long. A structurally valid exchange whose
/// reconciliation nevertheless disagreed is not detectable here; the two
/// sides simply hold different keys.
pub fn process_accept(secret_key: SecretKey, acceptmsg: &[u8]) -> Result<SessionKey, KexError> {
    if acceptmsg.len() != ACCEPT_MSG_BYTES {
        return Err(KexError::LengthMismatch {
            expected: ACCEPT_MSG_BYTES,
            got: acceptmsg.len(),
        });
    }

    let mut bp_bytes = [0u8; POLY_BYTES];
    bp_bytes.copy_from_slice(&acceptmsg[..POLY_BYTES]);
    let bp = NttPoly::from_bytes(&bp_bytes);

    let mut rec_bytes = [0u8; REC_BYTES];
    rec_bytes.copy_from_slice(&acceptmsg[POLY_BYTES..]);
    let hint = Hint::from_bytes(&rec_bytes);

    let mut v = invntt(secret_key.secret.pointwise(&bp));
    let mut raw = reconcile(&v, &hint);
    let key = SessionKey::derive(&raw)?;

    v.zeroize();
    raw.zeroize();

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_handshake_agrees() {
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let (offermsg, sk) = create_offer(&mut rng).unwrap();
        let (acceptmsg, responder_key) = process_offer(&mut rng, &offermsg).unwrap();
        let initiator_key = process_accept(sk, &acceptmsg).unwrap();
        assert_eq!(initiator_key, responder_key);
    }

    #[test]
    fn test_short_offer_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let err = process_offer(&mut rng, &[0u8; OFFER_MSG_BYTES - 1]).unwrap_err();
        assert!(matches!(
            err,
            KexError::LengthMismatch {
                expected: OFFER_MSG_BYTES,
                got
            } if got == OFFER_MSG_BYTES - 1
        ));
    }

    #[test]
    fn test_long_accept_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let (_, sk) = create_offer(&mut rng).unwrap();
        let err = process_accept(sk, &[0u8; ACCEPT_MSG_BYTES + 1]).unwrap_err();
        assert!(matches!(
            err,
            KexError::LengthMismatch {
                expected: ACCEPT_MSG_BYTES,
                got
            } if got == ACCEPT_MSG_BYTES + 1
        ));
    }

    #[test]
    fn test_mixed_handshakes_disagree() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let (offer_a, sk_a) = create_offer(&mut rng).unwrap();
        let (_offer_b, sk_b) = create_offer(&mut rng).unwrap();
        let (accept_a, key_a) = process_offer(&mut rng, &offer_a).unwrap();

        // Finishing handshake A with B's secret must not yield A's key.
        let key_mixed = process_accept(sk_b, &accept_a).unwrap();
        assert_ne!(key_mixed, key_a);

        // The honest finish still works.
        let key_honest = process_accept(sk_a, &accept_a).unwrap();
        assert_eq!(key_honest, key_a);
    }
}
