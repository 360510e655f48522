#![no_main]
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fuzz_target!(|data: &[u8]| {
    // Wrong lengths must error out, the right length must always process;
    // neither may panic.
    let mut rng = ChaCha20Rng::from_seed([0u8; 32]);
    let result = newhope_kex::process_offer(&mut rng, data);
    if data.len() == newhope_kex::OFFER_MSG_BYTES {
        assert!(result.is_ok());
    } else {
        assert!(result.is_err());
    }
});
