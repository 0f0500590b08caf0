//! Filesystem access for the compliance engine.
//!
//! Every check recomputes its verdict from filesystem facts at call time, so
//! the analyzers only ever read through [`FileSystem`]. Production code uses
//! [`RealFileSystem`]; unit tests use the in-memory [`MemoryFileSystem`].

pub mod memory;
pub mod real;
pub mod traits;

pub use memory::MemoryFileSystem;
pub use real::RealFileSystem;
pub use traits::FileSystem;
