//! Utilities shared by the Murmur server and client.

pub mod logger;
pub mod time;
