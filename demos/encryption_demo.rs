//! # Encryption Demo
//!
//! Demonstrates the layered encryption scheme: Diffie-Hellman key agreement,
//! the body and data wire framings, and passphrase-protected exports.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example encryption_demo
//! ```

use shinkai_message_core::crypto::{
    decrypt_message_body, decrypt_message_data, decrypt_with_passphrase, encrypt_message_body,
    encrypt_message_data, encrypt_with_passphrase, shared_message_key,
};
use shinkai_message_core::EncryptionKeyPair;

fn main() {
    println!("=== Shinkai Message Core: Encryption Demo ===\n");

    // Step 1: Create two parties (Alice and Bob)
    println!("Step 1: Creating encryption keypairs for Alice and Bob...");

    let alice_seed: [u8; 32] = [1u8; 32]; // In production, use secure random
    let bob_seed: [u8; 32] = [2u8; 32];

    let alice = EncryptionKeyPair::from_seed(&alice_seed);
    let bob = EncryptionKeyPair::from_seed(&bob_seed);

    println!(
        "  Alice's public encryption key: {}...",
        &alice.public_hex()[..16]
    );
    println!(
        "  Bob's public encryption key:   {}...",
        &bob.public_hex()[..16]
    );
    println!();

    // Step 2: Both sides derive the same message key
    println!("Step 2: Deriving the shared message key (X25519 + BLAKE3)...");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                    KEY DERIVATION FLOW                      │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │   Alice                              Bob                    │");
    println!("  │     │                                  │                    │");
    println!("  │     │──── Alice's Public Key ─────────►│                    │");
    println!("  │     │                                  │                    │");
    println!("  │     │◄──── Bob's Public Key ───────────│                    │");
    println!("  │     │                                  │                    │");
    println!("  │     ▼                                  ▼                    │");
    println!("  │  X25519(sk_A, pk_B)              X25519(sk_B, pk_A)         │");
    println!("  │     │                                  │                    │");
    println!("  │     └───────────┐     ┌────────────────┘                    │");
    println!("  │                 ▼     ▼                                     │");
    println!("  │          BLAKE3(shared point)                               │");
    println!("  │                   │                                         │");
    println!("  │                   ▼                                         │");
    println!("  │        SAME ChaCha20-Poly1305 KEY                           │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    let alice_key = shared_message_key(&alice, &bob.public_bytes());
    let bob_key = shared_message_key(&bob, &alice.public_bytes());

    if alice_key == bob_key {
        println!("  [OK] Both sides derived the same message key!");
    } else {
        println!("  [FAILED] Derived keys don't match!");
        return;
    }
    println!();

    // Step 3: Body-layer framing
    println!("Step 3: Encrypting a body-layer payload...");

    let body_plaintext = r#"{"message":"Hello Bob!"}"#;
    let encrypted_body = encrypt_message_body(body_plaintext, &alice, &bob.public_bytes())
        .expect("Body encryption failed");

    println!("  Plaintext:  {}", body_plaintext);
    println!("  Wire form:  {}...", &encrypted_body[..48]);
    println!("  Framing:    \"encrypted:\" + hex(nonce) + hex(ciphertext)");

    let decrypted_body = decrypt_message_body(&encrypted_body, &bob, &alice.public_bytes())
        .expect("Body decryption failed");
    if decrypted_body == body_plaintext {
        println!("  [OK] Bob recovered the body plaintext!");
    } else {
        println!("  [FAILED] Decryption produced wrong result!");
    }
    println!();

    // Step 4: Data-layer framing with its twin length prefixes
    println!("Step 4: Encrypting a data-layer payload (content + schema)...");

    let encrypted_data = encrypt_message_data("hi", "TextContent", &alice, &bob.public_bytes())
        .expect("Data encryption failed");

    println!("  Content:    \"hi\"  /  Schema: \"TextContent\"");
    println!("  Wire form:  {}...", &encrypted_data[..58]);
    println!("  Framing:    \"encrypted:\" + hex(len8) + hex(len8) + hex(nonce) + hex(ct)");

    let (content, schema) = decrypt_message_data(&encrypted_data, &bob, &alice.public_bytes())
        .expect("Data decryption failed");
    if content == "hi" && schema == "TextContent" {
        println!("  [OK] Length prefixes split content and schema apart again!");
    } else {
        println!("  [FAILED] Wrong split: {:?} / {:?}", content, schema);
    }
    println!();

    // Step 5: Tamper detection
    println!("Step 5: Tamper detection (AEAD integrity)...");

    let mut tampered = encrypted_body.clone();
    let flipped = if tampered.ends_with('0') { '1' } else { '0' };
    tampered.pop();
    tampered.push(flipped);

    match decrypt_message_body(&tampered, &bob, &alice.public_bytes()) {
        Ok(_) => println!("  [FAILED] Tampered ciphertext was accepted!"),
        Err(_) => println!("  [OK] Tampered ciphertext detected and rejected!"),
    }

    let mallory = EncryptionKeyPair::from_seed(&[9u8; 32]);
    match decrypt_message_body(&encrypted_body, &mallory, &alice.public_bytes()) {
        Ok(_) => println!("  [FAILED] Wrong key was accepted!"),
        Err(_) => println!("  [OK] Wrong key detected and rejected!"),
    }
    println!();

    // Step 6: Passphrase-protected export
    println!("Step 6: Passphrase export (Argon2id + ChaCha20-Poly1305)...");

    let bundle = r#"{"node":"@@alice.shinkai","encryption_sk":"..."}"#;
    let exported =
        encrypt_with_passphrase(bundle, "correct horse battery staple").expect("Export failed");

    println!("  Wire form:  {}...", &exported[..48]);
    println!("  Framing:    \"encrypted:\" + hex(salt) + hex(nonce) + hex(ciphertext)");

    let imported = decrypt_with_passphrase(&exported, "correct horse battery staple")
        .expect("Import failed");
    if imported == bundle {
        println!("  [OK] Bundle round-tripped through the passphrase!");
    }

    match decrypt_with_passphrase(&exported, "wrong passphrase") {
        Ok(_) => println!("  [FAILED] Wrong passphrase was accepted!"),
        Err(_) => println!("  [OK] Wrong passphrase detected and rejected!"),
    }
    println!();

    println!("=== Example Complete ===");
}
