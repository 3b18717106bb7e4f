use super::allocator::{Allocator, Request};
use std::ptr::NonNull;
use tracing::trace;

/// Decorator that emits a `tracing` event for every request it forwards.
///
/// Events are emitted at `TRACE` level under the `stowage::alloc` target, so
/// they cost nothing unless a subscriber asks for them.
#[derive(Clone, Debug, Default)]
pub struct LoggingAllocator<A: Allocator> {
    inner: A,
    name: &'static str,
}

impl<A: Allocator> LoggingAllocator<A> {
    pub fn new(inner: A) -> Self {
        Self::named(inner, "allocator")
    }

    /// `name` is attached to every event, to tell several decorators apart.
    pub fn named(inner: A, name: &'static str) -> Self {
        Self { inner, name }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

unsafe impl<A: Allocator> Allocator for LoggingAllocator<A> {
    unsafe fn handle(&self, request: Request) -> Option<NonNull<u8>> {
        let result = self.inner.handle(request);

        match request {
            Request::Allocate(layout) => trace!(
                target: "stowage::alloc",
                allocator = self.name,
                action = ?request.action(),
                size = layout.size(),
                align = layout.align(),
                ptr = ?result,
                ok = result.is_some()
            ),
            Request::Resize { ptr, layout } => trace!(
                target: "stowage::alloc",
                allocator = self.name,
                action = ?request.action(),
                size = layout.size(),
                align = layout.align(),
                old = ?ptr,
                ptr = ?result,
                ok = result.is_some()
            ),
            Request::Free(ptr) => trace!(
                target: "stowage::alloc",
                allocator = self.name,
                action = ?request.action(),
                ptr = ?ptr
            ),
        }

        result
    }
}
