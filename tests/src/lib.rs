//! # TSS Share Filter Test Suite
//!
//! Unified test crate exercising the tagging API the way a signing
//! coordinator and an independent verifier would use it.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # End-to-end tagging flows
//!     ├── flows.rs      # Coordinator to verifier round trips
//!     └── concurrency.rs# Parallel folding and batch verification
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p tss-tests
//!
//! # By category
//! cargo test -p tss-tests integration::flows::
//! cargo test -p tss-tests integration::concurrency::
//! ```
