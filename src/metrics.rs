/// A snapshot of an arena's block chain.
///
/// Obtained by calling [`crate::Arena::metrics`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArenaMetrics {
    /// Total bytes obtained from the backing allocator, oversized blocks
    /// included.
    pub allocated_bytes: usize,

    /// Number of blocks in the chain.
    pub block_count: usize,

    /// How many of those blocks were created for a single oversized request.
    pub oversized_blocks: usize,

    /// Size of a standard block.
    pub block_size: usize,

    /// Offset of the bump cursor within the current block.
    pub cursor: usize,
}

impl ArenaMetrics {
    /// Bytes still free in the current block.
    pub fn current_block_remaining(&self) -> usize {
        self.block_size - self.cursor
    }
}
