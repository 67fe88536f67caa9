//! # Tempest Test Suite
//!
//! Unified test crate for behaviour that spans crates.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── bus_benchmarks.rs   # Queue and hub throughput
//! └── src/integration/
//!     ├── fanout.rs           # Hub delivery guarantees under load
//!     ├── session_lifecycle.rs# Connect/disconnect cycles end to end
//!     └── observer.rs         # Disconnect observer, logging, metrics
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p tempest-tests
//!
//! # By category
//! cargo test -p tempest-tests integration::session_lifecycle::
//!
//! # Benchmarks
//! cargo bench -p tempest-tests
//! ```

pub mod integration;
