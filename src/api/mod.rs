//! API clients for external services
//!
//! - Addon: stream links via the Stremio addon protocol

pub mod addon;

pub use addon::AddonClient;
