//! InMemory 実装

pub mod client_registry;

pub use client_registry::InMemoryClientRegistry;
