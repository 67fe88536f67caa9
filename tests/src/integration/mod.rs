//! Cross-crate integration tests.

pub mod fanout;
pub mod session_lifecycle;
