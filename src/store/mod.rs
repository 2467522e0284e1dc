//! State management: the video record collection and its persistence.

pub mod library;
pub mod persist;
pub mod session;

pub use library::Library;
pub use persist::{FileKvStore, KvStore, MemoryKvStore};
pub use session::Session;
