//! Build script for keypoint topology validation
//!
//! Runs the shared table checks at compile time so a malformed limb table
//! never reaches a running rig.

// Include the shared keypoint tables
#[path = "src/topology_tables.rs"]
mod topology_tables;

use topology_tables::*;

fn main() {
    println!("cargo:rerun-if-changed=src/topology_tables.rs");

    let tables = [
        (
            "body",
            BODYPOSE_SIZE,
            BODYPOSE_LIMBS,
            BODYPOSE_IGNORED_INDICES,
            BODYPOSE_END_INDICES,
        ),
        (
            "hand",
            HANDPOSE_SIZE,
            HANDPOSE_LIMBS,
            HANDPOSE_IGNORED_INDICES,
            HANDPOSE_END_INDICES,
        ),
    ];

    let mut has_errors = false;
    for (name, size, limbs, ignored, ends) in tables {
        if let Err(e) = validate_tables(name, size, limbs, ignored, ends) {
            println!("cargo:warning=TOPOLOGY ERROR: {}", e);
            has_errors = true;
        }
    }

    if has_errors {
        panic!("Topology validation failed! Fix the tables in src/topology_tables.rs.");
    }
}
