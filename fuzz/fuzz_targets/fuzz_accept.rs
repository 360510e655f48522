#![no_main]
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fuzz_target!(|data: &[u8]| {
    let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
    let (_, sk) = newhope_kex::create_offer(&mut rng).expect("deterministic rng cannot fail");
    let result = newhope_kex::process_accept(sk, data);
    if data.len() == newhope_kex::ACCEPT_MSG_BYTES {
        assert!(result.is_ok());
    } else {
        assert!(result.is_err());
    }
});
