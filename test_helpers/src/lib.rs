//! Test helpers shared across crates in the layered-config workspace.
//!
//! Provides guards for process-global state (environment variables and the
//! working directory) and in-memory stand-ins for the Consul and Vault
//! collaborators.

pub mod cwd;
pub mod env;
pub mod kv;
