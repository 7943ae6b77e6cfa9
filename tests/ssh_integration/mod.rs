//! SSH integration tests
//!
//! These tests start a disposable OpenSSH server container through
//! testcontainers and therefore need a running Docker daemon. They are
//! ignored by default.
//!
//! ## Running the tests
//!
//! ```bash
//! cargo test --test ssh_integration -- --ignored
//! ```

pub mod fixtures;

mod runner_tests;
mod session_tests;
