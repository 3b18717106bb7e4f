/// Configuration settings for an [`crate::Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size in bytes of every standard block the arena requests from its
    /// backing allocator. Requests larger than this take the oversized path
    /// and get a dedicated block of their own.
    pub block_size: usize,
    /// Alignment of every block requested from the backing allocator.
    /// Allocations asking for a larger alignment still succeed, the cursor is
    /// simply padded further inside the block.
    pub block_align: usize,
}

pub const ARENA_CONFIG_DEFAULT_BLOCK_SIZE: usize = 4096;
pub const ARENA_CONFIG_DEFAULT_BLOCK_ALIGN: usize = 16;
pub const ARENA_CONFIG_MIN_BLOCK_SIZE: usize = 4;

impl ArenaConfig {
    /// Creates a config with the given block size and the default alignment.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            ..Self::default()
        }
    }

    /// Returns true when an arena can be built from this config.
    pub fn is_valid(&self) -> bool {
        self.block_size >= ARENA_CONFIG_MIN_BLOCK_SIZE && self.block_align.is_power_of_two()
    }
}

impl Default for ArenaConfig {
    /// One page per block. Good for most use cases.
    fn default() -> Self {
        ArenaConfig {
            block_size: ARENA_CONFIG_DEFAULT_BLOCK_SIZE,
            block_align: ARENA_CONFIG_DEFAULT_BLOCK_ALIGN,
        }
    }
}
