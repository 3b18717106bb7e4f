use std::io;
use thiserror::Error;

/// Failure to obtain memory from an [`crate::Allocator`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The size or alignment of the request could not be represented, for
    /// example `capacity * size_of::<T>()` overflowed.
    #[error("bad allocation request")]
    BadRequest,
    /// The backing allocator has no memory left for the request.
    #[error("out of memory: requested {size} bytes aligned to {align}")]
    OOM { size: usize, align: usize },
}

/// Errors returned by index-checked [`crate::GrowableArray`] operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ArrayError {
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Errors shared by every [`crate::Stream`] implementation.
///
/// Consumers are expected to handle all three uniformly, whatever stream
/// they hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The stream does not support the operation (e.g. writing to a
    /// read-only view).
    #[error("operation not implemented by this stream")]
    NotImplemented,
    /// No more data can be read, or no more room to write.
    #[error("end of stream")]
    EndOfStream,
    /// A seek or positional access landed past the logical length.
    #[error("offset {offset} out of bounds for stream of length {len}")]
    OutOfBounds { offset: i64, len: usize },
}

impl From<StreamError> for io::Error {
    fn from(error: StreamError) -> io::Error {
        let kind = match error {
            StreamError::NotImplemented => io::ErrorKind::Unsupported,
            StreamError::EndOfStream => io::ErrorKind::UnexpectedEof,
            StreamError::OutOfBounds { .. } => io::ErrorKind::InvalidInput,
        };

        io::Error::new(kind, error)
    }
}
