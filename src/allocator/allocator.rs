use crate::error::AllocError;
use std::alloc::Layout;
use std::ptr::NonNull;

/// The three things a caller can ask of an allocator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Allocate,
    Resize,
    Free,
}

/// A single request routed through [`Allocator::handle`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Obtain a fresh block satisfying `layout`.
    Allocate(Layout),
    /// Obtain a block satisfying `layout` whose prefix holds the contents of
    /// `ptr`. On success `ptr` must no longer be used; on failure it is
    /// still valid.
    Resize { ptr: NonNull<u8>, layout: Layout },
    /// Release `ptr`. `None` is a no-op.
    Free(Option<NonNull<u8>>),
}

impl Request {
    pub fn action(&self) -> Action {
        match self {
            Request::Allocate(_) => Action::Allocate,
            Request::Resize { .. } => Action::Resize,
            Request::Free(_) => Action::Free,
        }
    }

    /// The layout carried by the request, if any.
    pub fn layout(&self) -> Option<Layout> {
        match self {
            Request::Allocate(layout) | Request::Resize { layout, .. } => Some(*layout),
            Request::Free(_) => None,
        }
    }
}

/// A memory provider.
///
/// Every strategy in this crate (the heap-backed default, the arena, the
/// logging decorator) is reached through the single [`Allocator::handle`]
/// dispatch point, so containers can be written once against this trait and
/// handed whichever provider the caller picks.
///
/// Shared references to an allocator are allocators too, which is how a
/// single arena backs many containers at once. None of the implementations
/// here synchronize internally; callers sharing one across threads must
/// serialize access themselves.
///
/// # Safety
///
/// Implementors must return pointers to memory that is at least
/// `layout.size()` bytes long, aligned to `layout.align()`, and not handed
/// out to anyone else until it is freed (or, for allocators that never free
/// individual blocks, until the allocator itself is dropped).
pub unsafe trait Allocator {
    /// Serve `request`, returning `None` when no memory could be obtained.
    /// [`Request::Free`] always returns `None`.
    ///
    /// # Safety
    ///
    /// The pointer carried by [`Request::Resize`] or [`Request::Free`] must
    /// have been returned by this allocator and not freed since.
    unsafe fn handle(&self, request: Request) -> Option<NonNull<u8>>;

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        // An allocate request carries no pointer, so there is no contract to uphold.
        unsafe { self.handle(Request::Allocate(layout)) }.ok_or(AllocError::OOM {
            size: layout.size(),
            align: layout.align(),
        })
    }

    /// # Safety
    ///
    /// See [`Allocator::handle`].
    unsafe fn resize(&self, ptr: NonNull<u8>, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.handle(Request::Resize { ptr, layout })
            .ok_or(AllocError::OOM {
                size: layout.size(),
                align: layout.align(),
            })
    }

    /// # Safety
    ///
    /// See [`Allocator::handle`].
    unsafe fn free(&self, ptr: NonNull<u8>) {
        self.handle(Request::Free(Some(ptr)));
    }
}

unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    unsafe fn handle(&self, request: Request) -> Option<NonNull<u8>> {
        (**self).handle(request)
    }
}
