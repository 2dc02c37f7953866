//! # Naming Demo
//!
//! Walks through the hierarchical identity grammar and the deterministic
//! inbox addressing built on top of it.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example naming_demo
//! ```

use shinkai_message_core::{InboxName, ShinkaiName};

fn main() {
    println!("=== Shinkai Message Core: Naming & Addressing Demo ===\n");

    // Step 1: Canonicalization
    println!("Step 1: Parsing and canonicalizing identities...");

    let bare = ShinkaiName::new("Alice").expect("Bare label should canonicalize");
    println!("  \"Alice\"  ──►  {}", bare.get_value());

    let device = ShinkaiName::new("@@alice.shinkai/main/device/phone1")
        .expect("Device name should parse");
    println!(
        "  {}  ──►  node={} profile={:?} device={:?}",
        device.get_value(),
        device.get_node_name(),
        device.get_profile_name(),
        device.get_device_name()
    );
    println!();

    // Step 2: The grammar rejects malformed names with the violated rule
    println!("Step 2: Grammar violations carry the failed rule...");

    for raw in [
        "@@al ice.shinkai",
        "@@alice.shinkai/main/robot/r2d2",
        "@@alice.shinkai/main/device",
    ] {
        match ShinkaiName::new(raw) {
            Ok(_) => println!("  [FAILED] \"{}\" was accepted!", raw),
            Err(e) => println!("  [OK] rejected: {}", e),
        }
    }
    println!();

    // Step 3: Containment is the authorization primitive
    println!("Step 3: Structural containment...");

    let node = ShinkaiName::new("@@alice.shinkai").expect("Node name should parse");
    let profile = ShinkaiName::new("@@alice.shinkai/main").expect("Profile should parse");

    println!(
        "  {} contains {}: {}",
        node.get_value(),
        device.get_value(),
        node.contains(&device)
    );
    println!(
        "  {} contains {}: {}",
        device.get_value(),
        profile.get_value(),
        device.contains(&profile)
    );
    println!();

    // Step 4: Deterministic inbox addressing
    println!("Step 4: Inbox names are derived, never negotiated...");

    let from_alice = InboxName::get_regular_inbox_name_from_params(
        "@@alice.shinkai",
        "main",
        "@@bob.shinkai",
        "",
        false,
    )
    .expect("Inbox derivation failed");
    let from_bob = InboxName::get_regular_inbox_name_from_params(
        "@@bob.shinkai",
        "",
        "@@alice.shinkai",
        "main",
        false,
    )
    .expect("Inbox derivation failed");

    println!("  Alice derives: {}", from_alice.get_value());
    println!("  Bob derives:   {}", from_bob.get_value());

    if from_alice == from_bob {
        println!("  [OK] Both peers computed the identical inbox independently!");
    } else {
        println!("  [FAILED] Inbox names diverged!");
    }
    println!();

    // Step 5: Job inboxes and access control
    println!("Step 5: Job inboxes and creation access...");

    let job_inbox = InboxName::get_job_inbox_name_from_params("jobid_12345")
        .expect("Job inbox derivation failed");
    println!("  Job channel: {}", job_inbox.get_value());

    let alice_device =
        ShinkaiName::new("@@alice.shinkai/main/device/phone1").expect("Device should parse");
    let carol = ShinkaiName::new("@@carol.shinkai").expect("Node should parse");

    let access_device = from_alice
        .has_creation_access(&alice_device)
        .expect("Access check failed");
    let access_carol = from_alice
        .has_creation_access(&carol)
        .expect("Access check failed");
    println!(
        "  {} may write: {}",
        alice_device.get_value(),
        access_device
    );
    println!("  {} may write: {}", carol.get_value(), access_carol);
    println!();

    println!("=== Example Complete ===");
}
