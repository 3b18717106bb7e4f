use super::allocator::{Allocator, Request};
use super::block::Block;
use super::system::HeapAllocator;
use crate::config::{ArenaConfig, ARENA_CONFIG_MIN_BLOCK_SIZE};
use crate::error::AllocError;
use crate::metrics::ArenaMetrics;
use std::alloc::Layout;
use std::cell::RefCell;
use std::ptr::{self, NonNull};
use tracing::{debug, warn};

/// A bump allocator over a chain of fixed-size blocks.
///
/// Allocating moves a cursor forward through the current block; when the
/// block is full a new one is chained after it. Individual allocations are
/// never reclaimed, and memory never moves, so every pointer handed out stays
/// valid until [`Arena::clear`] or until the arena is dropped.
///
/// ```text
///   blocks[0]            blocks[1]            blocks[2] (current)
///   +----+----+----+     +------+---------+    +----+-----------+
///   | a1 | a2 | a3 | --> | big allocation | -> | a4 |   free    |
///   +----+----+----+     +------+---------+    +----+-----------+
///                          oversized               ^ cursor
/// ```
///
/// Requests that can never fit a standard block take the oversized path: a
/// dedicated block sized to the request is spliced in right after the
/// current block, followed by a fresh standard block that becomes current.
/// If the backing allocator cannot supply both blocks the request fails and
/// the chain is left as it was.
///
/// The arena is itself an [`Allocator`], so containers can be built on a
/// `&Arena`:
///
/// ```
/// use stowage::{Arena, GrowableArray, HeapAllocator};
///
/// let arena = Arena::new(HeapAllocator, 4096).unwrap();
/// let mut array = GrowableArray::new_in(&arena);
///
/// array.push(1u32).unwrap();
/// array.push(2u32).unwrap();
///
/// assert_eq!(array.as_slice(), &[1, 2]);
/// ```
///
/// The arena tracks no per-allocation sizes. A [`Request::Resize`] therefore
/// copies up to the *new* size from the old pointer (stopping at the end of
/// the block holding it), not the true old size. That is exact when growing,
/// but a shrinking resize may carry over bytes the caller never wrote and a
/// growing one carries over whatever followed the old allocation. Callers
/// that need precise truncation must track old sizes themselves.
pub struct Arena<A: Allocator = HeapAllocator> {
    backing: A,
    config: ArenaConfig,
    chain: RefCell<Chain>,
}

struct Chain {
    blocks: Vec<Block>,
    current: usize,
    cursor: usize,
}

impl<A: Allocator> Drop for Arena<A> {
    fn drop(&mut self) {
        let chain = self.chain.get_mut();
        let count = chain.blocks.len();

        for block in chain.blocks.drain(..) {
            // every block came from `backing` and the arena is going away
            unsafe { block.release(&self.backing) };
        }

        debug!(blocks = count, "arena released");
    }
}

impl Arena<HeapAllocator> {
    /// An arena over the process heap with the default configuration.
    pub fn with_default_config() -> Result<Self, AllocError> {
        Self::with_config(HeapAllocator, ArenaConfig::default())
    }
}

impl<A: Allocator> Arena<A> {
    /// Creates an arena and requests its first block from `backing`.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is smaller than 4 bytes.
    pub fn new(backing: A, block_size: usize) -> Result<Self, AllocError> {
        Self::with_config(backing, ArenaConfig::new(block_size))
    }

    /// # Panics
    ///
    /// Panics if the config is not valid, see [`ArenaConfig::is_valid`].
    pub fn with_config(backing: A, config: ArenaConfig) -> Result<Self, AllocError> {
        assert!(
            config.block_size >= ARENA_CONFIG_MIN_BLOCK_SIZE,
            "arena block size must be at least {} bytes, got {}",
            ARENA_CONFIG_MIN_BLOCK_SIZE,
            config.block_size
        );
        assert!(config.is_valid(), "invalid arena config: {:?}", config);

        let first = Block::new(&backing, Self::standard_layout(&config)?)?;

        Ok(Self {
            backing,
            config,
            chain: RefCell::new(Chain {
                blocks: vec![first],
                current: 0,
                cursor: 0,
            }),
        })
    }

    fn standard_layout(config: &ArenaConfig) -> Result<Layout, AllocError> {
        Layout::from_size_align(config.block_size, config.block_align)
            .map_err(|_| AllocError::BadRequest)
    }

    pub fn config(&self) -> ArenaConfig {
        self.config
    }

    pub fn backing(&self) -> &A {
        &self.backing
    }

    /// Bump-allocates `layout` and returns a pointer to uninitialized memory.
    pub fn alloc_layout(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if !self.fits_standard(layout) {
            return self.alloc_oversized(layout);
        }

        let mut chain = self.chain.borrow_mut();

        if let Some(ptr) = chain.bump(layout, self.config.block_size) {
            return Ok(ptr);
        }

        let block = self.new_standard_block()?;
        let next = chain.current + 1;

        chain.blocks.insert(next, block);
        chain.current = next;
        chain.cursor = 0;

        debug!(blocks = chain.blocks.len(), "arena chained a new block");

        // a fresh block always has room for a request that fits a standard block
        chain
            .bump(layout, self.config.block_size)
            .ok_or(AllocError::BadRequest)
    }

    /// Moves `value` into the arena. The value is never dropped.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc<T>(&self, value: T) -> Result<&mut T, AllocError> {
        let ptr = self.alloc_layout(Layout::new::<T>())?.cast::<T>();

        unsafe {
            ptr.as_ptr().write(value);

            Ok(&mut *ptr.as_ptr())
        }
    }

    /// Copies `items` into the arena.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T: Copy>(&self, items: &[T]) -> Result<&mut [T], AllocError> {
        let layout = Layout::for_value(items);
        let ptr = self.alloc_layout(layout)?.cast::<T>();

        unsafe {
            ptr::copy_nonoverlapping(items.as_ptr(), ptr.as_ptr(), items.len());

            Ok(std::slice::from_raw_parts_mut(ptr.as_ptr(), items.len()))
        }
    }

    /// Releases every block except the first and rewinds the cursor to its
    /// start. Takes `&mut self` so no reference into the arena survives.
    pub fn clear(&mut self) {
        let chain = self.chain.get_mut();

        for block in chain.blocks.drain(1..) {
            unsafe { block.release(&self.backing) };
        }

        chain.current = 0;
        chain.cursor = 0;

        debug!("arena cleared");
    }

    /// Releases every block back to the backing allocator.
    pub fn release(self) {
        drop(self)
    }

    /// Total bytes obtained from the backing allocator. O(blocks).
    pub fn allocated_bytes(&self) -> usize {
        self.chain.borrow().blocks.iter().map(Block::get_size).sum()
    }

    /// Number of blocks in the chain, oversized blocks included.
    pub fn allocated_block_count(&self) -> usize {
        self.chain.borrow().blocks.len()
    }

    pub fn metrics(&self) -> ArenaMetrics {
        let chain = self.chain.borrow();

        ArenaMetrics {
            allocated_bytes: chain.blocks.iter().map(Block::get_size).sum(),
            block_count: chain.blocks.len(),
            oversized_blocks: chain.blocks.iter().filter(|b| b.is_oversized()).count(),
            block_size: self.config.block_size,
            cursor: chain.cursor,
        }
    }

    // A standard block only fits a request if it does so even after the
    // worst-case padding needed to honor the request's alignment.
    fn fits_standard(&self, layout: Layout) -> bool {
        let worst_pad = layout.align().saturating_sub(self.config.block_align);

        layout
            .size()
            .checked_add(worst_pad)
            .is_some_and(|needed| needed <= self.config.block_size)
    }

    fn new_standard_block(&self) -> Result<Block, AllocError> {
        let layout = Self::standard_layout(&self.config)?;

        Block::new(&self.backing, layout).inspect_err(|_| {
            warn!(
                block_size = self.config.block_size,
                "backing allocator failed to supply an arena block"
            )
        })
    }

    fn alloc_oversized(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let block_layout = Layout::from_size_align(
            layout.size(),
            layout.align().max(self.config.block_align),
        )
        .map_err(|_| AllocError::BadRequest)?;

        let big = Block::oversized(&self.backing, block_layout).inspect_err(|_| {
            warn!(
                size = layout.size(),
                "backing allocator failed to supply an oversized arena block"
            )
        })?;
        let ptr = big.as_ptr();

        // Bump allocation continues in a fresh block after the oversized one,
        // so both blocks are obtained before the chain changes.
        let fresh = match self.new_standard_block() {
            Ok(fresh) => fresh,
            Err(err) => {
                // `big` came from `backing` and nothing points into it yet
                unsafe { big.release(&self.backing) };

                return Err(err);
            }
        };

        let mut chain = self.chain.borrow_mut();
        let after = chain.current + 1;
        chain.blocks.insert(after, big);
        chain.blocks.insert(after + 1, fresh);
        chain.current = after + 1;
        chain.cursor = 0;

        debug!(
            size = layout.size(),
            blocks = chain.blocks.len(),
            "arena spliced in an oversized block"
        );

        // the backing allocator never returns null on success
        NonNull::new(ptr).ok_or(AllocError::BadRequest)
    }

    // Allocate-and-copy. The copy length is the new size, clamped to the end
    // of the block holding `old` so it never reads memory the arena does not
    // own. Source and destination may overlap when the old pointer's block is
    // the current one, hence `ptr::copy`.
    unsafe fn resize_copy(&self, old: NonNull<u8>, layout: Layout) -> Option<NonNull<u8>> {
        let new = self.alloc_layout(layout).ok()?;
        let available = self
            .chain
            .borrow()
            .blocks
            .iter()
            .find_map(|block| block.remaining_from(old.as_ptr()))
            .unwrap_or(0);
        let count = layout.size().min(available);

        ptr::copy(old.as_ptr(), new.as_ptr(), count);

        Some(new)
    }
}

impl Chain {
    fn bump(&mut self, layout: Layout, block_size: usize) -> Option<NonNull<u8>> {
        let block = &self.blocks[self.current];
        let base = block.as_ptr() as usize;
        let aligned = (base + self.cursor).checked_next_multiple_of(layout.align())?;
        let start = aligned - base;
        let end = start.checked_add(layout.size())?;

        if end > block_size {
            return None;
        }

        self.cursor = end;

        NonNull::new(block.at_offset(start))
    }
}

unsafe impl<A: Allocator> Allocator for Arena<A> {
    unsafe fn handle(&self, request: Request) -> Option<NonNull<u8>> {
        match request {
            Request::Allocate(layout) => self.alloc_layout(layout).ok(),
            Request::Resize { ptr, layout } => self.resize_copy(ptr, layout),
            Request::Free(_) => None,
        }
    }
}
