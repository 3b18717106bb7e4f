mod allocator;
mod arena;
mod block;
mod logging;
mod system;


pub use allocator::{Action, Allocator, Request};
pub use arena::Arena;
pub use logging::LoggingAllocator;
pub use system::HeapAllocator;
