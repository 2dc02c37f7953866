//! # Messaging Demo
//!
//! Builds a signed, body-encrypted message with the builder, then runs the
//! receiving side: verify the outer signature, decrypt the body, verify the
//! inner signature, and read the content.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example messaging_demo
//! ```

use shinkai_message_core::messaging::MessageBody;
use shinkai_message_core::{
    EncryptionKeyPair, EncryptionMethod, MessageSchemaType, ShinkaiMessageBuilder, SigningKeyPair,
};

fn main() {
    println!("=== Shinkai Message Core: Messaging Demo ===\n");

    // Step 1: Key material for both parties
    println!("Step 1: Creating key material for Alice and Bob...");

    let alice_encryption = EncryptionKeyPair::from_seed(&[1u8; 32]);
    let alice_signing = SigningKeyPair::from_seed(&[2u8; 32]);
    let bob_encryption = EncryptionKeyPair::from_seed(&[3u8; 32]);

    println!(
        "  Alice signs with:    {}...",
        &alice_signing.public_hex()[..16]
    );
    println!(
        "  Alice encrypts for:  {}... (Bob)",
        &bob_encryption.public_hex()[..16]
    );
    println!();

    // Step 2: Build a message through the five-step pipeline
    println!("Step 2: Building a body-encrypted text message...");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                      BUILD PIPELINE                         │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │   validate ──► derive inbox ──► encrypt data (optional)     │");
    println!("  │      ──► sign inner ──► encrypt body (optional)             │");
    println!("  │      ──► sign outer ──► ShinkaiMessage                      │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    let message = ShinkaiMessageBuilder::new(
        alice_encryption.clone(),
        alice_signing.clone(),
        bob_encryption.public_bytes(),
    )
    .set_message_raw_content("Hello Bob, this is Alice.")
    .set_message_schema_type(MessageSchemaType::TextContent)
    .set_internal_metadata("main", "", EncryptionMethod::None)
    .set_body_encryption(EncryptionMethod::DiffieHellmanChaChaPoly1305)
    .set_external_metadata_with_intra_sender("@@bob.shinkai", "@@alice.shinkai", "main")
    .build()
    .expect("Build failed");

    match &message.body {
        MessageBody::Encrypted(_) => println!("  [OK] Body is ciphertext on the wire!"),
        MessageBody::Unencrypted(_) => println!("  [FAILED] Body left in the clear!"),
    }
    println!(
        "  Outer signature: {}...",
        &message.external_metadata.signature[..16]
    );
    println!();

    // Step 3: The wire format
    println!("Step 3: Serializing to the JSON wire format...");

    let wire = message.to_json_string().expect("Serialization failed");
    println!("  {} bytes of JSON", wire.len());
    println!("  {}...", &wire[..72]);
    println!();

    // Step 4: Receiving side, in reverse order
    println!("Step 4: Bob verifies and unwraps the message...");

    let received = shinkai_message_core::ShinkaiMessage::from_json_str(&wire)
        .expect("Wire parsing failed");

    // Outer signature first; the verifying key comes from Bob's registry of
    // known peers, never from the message itself.
    let outer_ok = received
        .verify_outer_layer_signature(&alice_signing.verifying_key())
        .expect("Outer verification errored");
    if outer_ok {
        println!("  [OK] Outer signature verifies under Alice's key!");
    } else {
        println!("  [FAILED] Outer signature rejected!");
        return;
    }

    let decrypted = received
        .decrypt_outer_layer(&bob_encryption, &alice_encryption.public_bytes())
        .expect("Body decryption failed");
    let body = decrypted.body_unencrypted().expect("Body should be plaintext now");

    let inner_ok = body
        .verify_inner_layer_signature(&alice_signing.verifying_key())
        .expect("Inner verification errored");
    if inner_ok {
        println!("  [OK] Inner signature verifies too!");
    }

    let data = body.data_unencrypted().expect("Data should be plaintext");
    println!("  Content: \"{}\"", data.message_raw_content);
    println!("  Inbox:   {}", body.internal_metadata.inbox);
    println!();

    // Step 5: Tampering breaks the outer signature
    println!("Step 5: Tamper detection...");

    let mut forged = received.clone();
    forged.external_metadata.recipient = "@@mallory.shinkai".to_string();

    match forged.verify_outer_layer_signature(&alice_signing.verifying_key()) {
        Ok(false) => println!("  [OK] Forged recipient detected: signature no longer verifies!"),
        Ok(true) => println!("  [FAILED] Forged message still verifies!"),
        Err(e) => println!("  [FAILED] Unexpected error: {}", e),
    }
    println!();

    // Step 6: A prebuilt intent
    println!("Step 6: Prebuilt intents (ACK)...");

    let ack = ShinkaiMessageBuilder::ack_message(
        alice_encryption,
        alice_signing,
        bob_encryption.public_bytes(),
        "@@alice.shinkai",
        "@@bob.shinkai",
    )
    .expect("ACK build failed");

    let content = &ack
        .body_unencrypted()
        .expect("ACK is plaintext")
        .data_unencrypted()
        .expect("ACK data is plaintext")
        .message_raw_content;
    println!("  ack_message() content: \"{}\"", content);
    println!();

    println!("=== Example Complete ===");
}
