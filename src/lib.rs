//! Cross-crate integration tests for the vecpool workspace live in `tests/`.
