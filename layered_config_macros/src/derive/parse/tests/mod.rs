//! Unit tests for `#[layered(...)]` attribute parsing.
