use super::allocator::Allocator;
use crate::error::AllocError;
use std::alloc::Layout;
use std::ptr::NonNull;

/// A chunk of memory obtained from an arena's backing allocator.
///
/// Blocks do not free themselves; the arena that owns them hands them back
/// to the same allocator they came from.
pub struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
    oversized: bool,
}

impl Block {
    pub fn new<A: Allocator + ?Sized>(backing: &A, layout: Layout) -> Result<Block, AllocError> {
        Ok(Block {
            ptr: backing.allocate(layout)?,
            layout,
            oversized: false,
        })
    }

    /// A block dedicated to a single request too large for a standard block.
    pub fn oversized<A: Allocator + ?Sized>(
        backing: &A,
        layout: Layout,
    ) -> Result<Block, AllocError> {
        let mut block = Self::new(backing, layout)?;
        block.oversized = true;

        Ok(block)
    }

    pub fn at_offset(&self, offset: usize) -> *mut u8 {
        debug_assert!(offset <= self.layout.size());

        unsafe { self.ptr.as_ptr().add(offset) }
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn get_size(&self) -> usize {
        self.layout.size()
    }

    pub fn is_oversized(&self) -> bool {
        self.oversized
    }

    /// Bytes between `ptr` and the end of this block, or `None` when `ptr`
    /// does not point into it.
    pub fn remaining_from(&self, ptr: *const u8) -> Option<usize> {
        let start = self.ptr.as_ptr() as usize;
        let end = start + self.layout.size();
        let addr = ptr as usize;

        if start <= addr && addr < end {
            Some(end - addr)
        } else {
            None
        }
    }

    /// Returns the block's memory to `backing`.
    ///
    /// # Safety
    ///
    /// `backing` must be the allocator this block was created from, and no
    /// pointer into the block may be used afterwards.
    pub unsafe fn release<A: Allocator + ?Sized>(self, backing: &A) {
        backing.free(self.ptr);
    }
}
