//! Pluggable allocators and the containers built on them.
//!
//! Every container in this crate takes an [`Allocator`] type parameter and
//! gets all of its memory through it. The default is [`HeapAllocator`], a
//! thin layer over the global allocator, but any allocator can be swapped
//! in, including an [`Arena`] that bump-allocates from a chain of blocks and
//! frees everything at once.
//! ```rust
//! use stowage::{Arena, GrowableArray, HeapAllocator};
//!
//! let arena = Arena::new(HeapAllocator, 4096).unwrap();
//! let mut numbers = GrowableArray::new_in(&arena);
//!
//! for n in 0..100 {
//!     numbers.push(n).unwrap();
//! }
//!
//! assert_eq!(numbers.len(), 100);
//! assert_eq!(numbers[42], 42);
//! ```
//!
//! Allocators are single-threaded. Nothing here locks; an allocator shared
//! between containers must only be used from one thread at a time.
//!
//! The [`Heap`] is a binary min-heap over a [`GrowableArray`], and
//! [`BufferStream`] is an in-memory implementation of the [`Stream`]
//! capability that also speaks `std::io`.
//! ```
//! use stowage::{BufferStream, Heap, Stream, Whence};
//!
//! let mut heap = Heap::new_ord();
//! for word in ["pear", "apple", "fig"] {
//!     heap.insert(word).unwrap();
//! }
//!
//! let mut out = BufferStream::new();
//! while let Some(word) = heap.remove_top() {
//!     out.write(word.as_bytes()).unwrap();
//!     out.write_byte(b' ').unwrap();
//! }
//!
//! out.seek(0, Whence::Start).unwrap();
//! assert_eq!(out.as_bytes(), b"apple fig pear ");
//! ```
mod allocator;
mod array;
mod config;
mod error;
mod heap;
mod metrics;
mod stream;

pub use allocator::{Action, Allocator, Arena, HeapAllocator, LoggingAllocator, Request};
pub use array::GrowableArray;
pub use config::ArenaConfig;
pub use error::{AllocError, ArrayError, StreamError};
pub use heap::Heap;
pub use metrics::ArenaMetrics;
pub use stream::{BufferStream, PollEvent, Stream, Whence};

#[cfg(test)]
mod test;
