use super::allocator::{Allocator, Request};
use std::alloc::{alloc, dealloc, realloc, Layout};
use std::ptr::{self, NonNull};

/// The default allocator, backed by the process heap.
///
/// `std::alloc` needs the original layout to free or grow a block, while the
/// [`Allocator`] contract only hands back the pointer. Every block therefore
/// carries a small header, written just before the returned pointer, that
/// records the layout the caller asked for.
///
/// ```text
///   base                      ptr (returned)
///   |                         |
///   v                         v
///   +---------+---------------+--------------------------+
///   | padding | Header        | size bytes               |
///   +---------+---------------+--------------------------+
/// ```
///
/// Because it knows the true old size, [`Request::Resize`] here copies
/// exactly `min(old_size, new_size)` bytes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapAllocator;

#[derive(Copy, Clone)]
struct Header {
    size: usize,
    align: usize,
}

impl Header {
    // The full layout handed to `std::alloc` for a caller layout, and the
    // offset of the caller's pointer inside it.
    fn block_layout(layout: Layout) -> Option<(Layout, usize)> {
        let (block, offset) = Layout::new::<Header>().extend(layout).ok()?;

        Some((block.pad_to_align(), offset))
    }

    unsafe fn read(ptr: NonNull<u8>) -> Layout {
        let header = ptr.as_ptr().cast::<Header>().sub(1).read();

        Layout::from_size_align_unchecked(header.size, header.align)
    }

    unsafe fn write(ptr: *mut u8, layout: Layout) {
        let header = Header {
            size: layout.size(),
            align: layout.align(),
        };

        ptr.cast::<Header>().sub(1).write(header);
    }
}

impl HeapAllocator {
    fn alloc_block(layout: Layout) -> Option<NonNull<u8>> {
        let (block, offset) = Header::block_layout(layout)?;

        unsafe {
            let base = alloc(block);

            if base.is_null() {
                return None;
            }

            let ptr = base.add(offset);
            Header::write(ptr, layout);

            Some(NonNull::new_unchecked(ptr))
        }
    }

    unsafe fn free_block(ptr: NonNull<u8>) {
        let layout = Header::read(ptr);

        // the header layout was valid when this block was allocated
        if let Some((block, offset)) = Header::block_layout(layout) {
            dealloc(ptr.as_ptr().sub(offset), block);
        }
    }

    unsafe fn resize_block(ptr: NonNull<u8>, layout: Layout) -> Option<NonNull<u8>> {
        let old_layout = Header::read(ptr);

        if old_layout.align() != layout.align() {
            let new_ptr = Self::alloc_block(layout)?;
            let count = old_layout.size().min(layout.size());

            ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), count);
            Self::free_block(ptr);

            return Some(new_ptr);
        }

        let (old_block, offset) = Header::block_layout(old_layout)?;
        let (new_block, new_offset) = Header::block_layout(layout)?;
        debug_assert_eq!(offset, new_offset);

        let base = realloc(ptr.as_ptr().sub(offset), old_block, new_block.size());

        if base.is_null() {
            return None;
        }

        let new_ptr = base.add(offset);
        Header::write(new_ptr, layout);

        Some(NonNull::new_unchecked(new_ptr))
    }
}

unsafe impl Allocator for HeapAllocator {
    unsafe fn handle(&self, request: Request) -> Option<NonNull<u8>> {
        match request {
            Request::Allocate(layout) => Self::alloc_block(layout),
            Request::Resize { ptr, layout } => Self::resize_block(ptr, layout),
            Request::Free(ptr) => {
                if let Some(ptr) = ptr {
                    Self::free_block(ptr);
                }

                None
            }
        }
    }
}
