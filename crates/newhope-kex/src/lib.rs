#![forbid(unsafe_code)]
//! NewHope ring-LWE key agreement.
//!
//! An unauthenticated post-quantum key exchange in which two parties trade
//! two fixed-size messages and derive a shared 32-byte session key. Security
//! rests on the ring learning-with-errors problem over
//! Z_12289\[x\]/(x^1024+1); the scheme is the one described by Alkim, Ducas,
//! Pöppelmann and Schwabe (USENIX Security 2016).
//!
//! The initiator calls [`create_offer`], sends the offer message, and later
//! feeds the peer's accept message to [`process_accept`]. The responder
//! answers an offer with [`process_offer`], which yields both the accept
//! message and the responder's copy of the session key.
//!
//! With the chosen noise parameters the two sides agree on the same key
//! except with probability around 2^-60; the engine cannot detect the
//! residual disagreement case, so callers that need certainty must run a
//! key-confirmation round on top.

mod kex;
mod ntt;
mod params;
mod poly;
mod reconcile;

pub use kex::{create_offer, process_accept, process_offer, SecretKey, SessionKey};
pub use params::{
    ACCEPT_MSG_BYTES, N, OFFER_MSG_BYTES, POLY_BYTES, Q, REC_BYTES, SEED_BYTES, SHARED_KEY_BYTES,
};

pub use newhope_types::KexError;
