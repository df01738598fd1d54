use cmesh_cipher::codec::{decode, decode_with, encode};
use cmesh_cipher::generator::generate;
use cmesh_cipher::{CipherError, KeyShare};
use cmesh_domain::alphabet::{ALPHABET, alphabet_index};
use cmesh_domain::key::CipherKey;

#[test]
fn generate_encode_decode_full_cycle() {
    let key = generate().unwrap();

    let plain = "meet at the usual place at 2100";
    let encoded = encode(plain, &key);

    assert_ne!(encoded, plain, "a permutation never maps every symbol to itself");
    assert_eq!(encoded.chars().count(), plain.chars().count());
    assert_eq!(decode(&encoded, &key), plain);
}

#[test]
fn two_keys_give_independent_ciphertexts() {
    let k1 = generate().unwrap();
    let k2 = generate().unwrap();

    let plain = "same plaintext";
    let c1 = encode(plain, &k1);
    let c2 = encode(plain, &k2);

    // Decoding with the wrong key must not restore the plaintext for a
    // full-alphabet message (the maps differ).
    assert_eq!(decode(&c1, &k1), plain);
    assert_eq!(decode(&c2, &k2), plain);
    assert_ne!(decode(&c1, &k2), plain);
}

#[test]
fn bulk_decode_path_uses_a_prederived_inverse() {
    let key = generate().unwrap();
    let inverse = key.map.invert();

    for plain in ["short", "with spaces and 42", ""] {
        let encoded = encode(plain, &key);
        assert_eq!(decode_with(&encoded, &inverse), plain);
    }
}

#[test]
fn shared_key_decodes_the_partners_traffic() {
    // One side mints a protocol and shares it; the other imports and reads.
    let minted = generate().unwrap();
    let code = minted.to_share_code().unwrap();

    let imported = CipherKey::from_share_code(&code).unwrap();
    assert_eq!(imported.id, minted.id);

    let encoded = encode("rendezvous at dawn", &minted);
    assert_eq!(decode(&encoded, &imported), "rendezvous at dawn");
}

#[test]
fn generated_output_symbols_cover_the_alphabet() {
    let key = generate().unwrap();
    let all: String = ALPHABET.iter().collect();
    let encoded = encode(&all, &key);

    let mut seen = [false; 36];
    for c in encoded.chars() {
        seen[alphabet_index(c).expect("alphabet maps into itself")] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn entropy_failures_surface_as_cipher_errors() {
    // The error enum is part of the public contract even though the OS RNG
    // virtually never fails in practice.
    let err = CipherError::Entropy { message: "simulated".into(), context: None };
    assert!(err.to_string().contains("Entropy source failed"));
}
