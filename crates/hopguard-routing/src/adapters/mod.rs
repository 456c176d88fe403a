//! Collaborator implementations.

pub mod memory;

pub use memory::{InMemoryBackend, InMemoryNetwork, ScriptedFailure};
