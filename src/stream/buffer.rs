use super::{PollEvent, Stream, Whence};
use crate::allocator::{Allocator, HeapAllocator};
use crate::array::GrowableArray;
use crate::error::{AllocError, StreamError};
use std::fmt;
use std::time::Duration;
use tracing::debug;

enum Backing<'a, A: Allocator> {
    ReadOnly(&'a [u8]),
    Fixed { buf: &'a mut [u8], len: usize },
    Growable(GrowableArray<u8, A>),
}

/// An in-memory [`Stream`] over a byte buffer.
///
/// A stream is one of three kinds, chosen at construction:
///
/// * read-only, a view of borrowed bytes that rejects every write,
/// * fixed, writing into borrowed memory and failing with
///   [`StreamError::EndOfStream`] rather than growing past it,
/// * growable, owning a [`GrowableArray`] that doubles as writes need room.
///
/// ```
/// use stowage::{BufferStream, Stream, Whence};
///
/// let mut stream = BufferStream::new();
/// stream.write(b"hello").unwrap();
/// stream.seek(0, Whence::Start).unwrap();
///
/// let mut out = [0; 5];
/// assert_eq!(stream.read(&mut out).unwrap(), 5);
/// assert_eq!(&out, b"hello");
/// ```
pub struct BufferStream<'a, A: Allocator = HeapAllocator> {
    backing: Backing<'a, A>,
    cursor: usize,
}

impl<'a> BufferStream<'a> {
    /// A read-only view of `bytes`. Nothing is copied or allocated.
    pub fn read_only(bytes: &'a [u8]) -> Self {
        Self {
            backing: Backing::ReadOnly(bytes),
            cursor: 0,
        }
    }

    /// A writable stream over `buf` whose current contents are readable.
    pub fn fixed(buf: &'a mut [u8]) -> Self {
        let len = buf.len();

        Self {
            backing: Backing::Fixed { buf, len },
            cursor: 0,
        }
    }

    /// A writable stream that treats `buf` as empty space.
    pub fn fixed_empty(buf: &'a mut [u8]) -> Self {
        Self {
            backing: Backing::Fixed { buf, len: 0 },
            cursor: 0,
        }
    }

    pub fn new() -> Self {
        Self::new_in(HeapAllocator)
    }
}

impl Default for BufferStream<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, A: Allocator> BufferStream<'a, A> {
    pub fn new_in(alloc: A) -> Self {
        Self::from_array(GrowableArray::new_in(alloc))
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, AllocError> {
        Ok(Self::from_array(GrowableArray::with_capacity_in(capacity, alloc)?))
    }

    /// A growable stream starting with a copy of `bytes`.
    pub fn copied_in(bytes: &[u8], alloc: A) -> Result<Self, AllocError> {
        let mut array = GrowableArray::with_capacity_in(bytes.len(), alloc)?;
        array.concat(bytes)?;

        Ok(Self::from_array(array))
    }

    /// A growable stream over the contents of `array`, cursor at the start.
    pub fn from_array(array: GrowableArray<u8, A>) -> Self {
        Self {
            backing: Backing::Growable(array),
            cursor: 0,
        }
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self.backing, Backing::ReadOnly(_))
    }

    pub fn is_fixed(&self) -> bool {
        !matches!(self.backing, Backing::Growable(_))
    }

    /// Bytes the stream can hold without growing.
    pub fn capacity(&self) -> usize {
        match &self.backing {
            Backing::ReadOnly(bytes) => bytes.len(),
            Backing::Fixed { buf, .. } => buf.len(),
            Backing::Growable(array) => array.capacity(),
        }
    }

    /// The stream's content, independent of the cursor.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::ReadOnly(bytes) => bytes,
            Backing::Fixed { buf, len } => &buf[..*len],
            Backing::Growable(array) => array.as_slice(),
        }
    }

    /// The owned buffer of a growable stream. Borrowing streams give `None`.
    pub fn into_array(self) -> Option<GrowableArray<u8, A>> {
        match self.backing {
            Backing::Growable(array) => Some(array),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn out_of_bounds(&self, offset: i64) -> StreamError {
        StreamError::OutOfBounds {
            offset,
            len: self.len(),
        }
    }

    fn copy_out(&self, buf: &mut [u8], offset: usize) -> Result<usize, StreamError> {
        let content = self.as_bytes();

        if offset >= content.len() {
            return Err(StreamError::EndOfStream);
        }

        let n = buf.len().min(content.len() - offset);
        buf[..n].copy_from_slice(&content[offset..offset + n]);

        Ok(n)
    }

    fn copy_in(&mut self, bytes: &[u8], offset: usize) -> Result<usize, StreamError> {
        if !self.is_writable() {
            return Err(StreamError::NotImplemented);
        }

        let content_len = self.len();
        if offset > content_len {
            return Err(self.out_of_bounds(offset as i64));
        }

        let end = offset.checked_add(bytes.len()).ok_or(StreamError::EndOfStream)?;

        match &mut self.backing {
            Backing::ReadOnly(_) => Err(StreamError::NotImplemented),
            Backing::Fixed { buf, len } => {
                if end > buf.len() {
                    return Err(StreamError::EndOfStream);
                }

                buf[offset..end].copy_from_slice(bytes);
                *len = (*len).max(end);

                Ok(bytes.len())
            }
            Backing::Growable(array) => {
                if let Err(err) = array.ensure_capacity(end) {
                    debug!(error = %err, end, "buffer stream could not grow");
                    return Err(StreamError::EndOfStream);
                }

                let overlap = (content_len - offset).min(bytes.len());
                array[offset..offset + overlap].copy_from_slice(&bytes[..overlap]);
                array
                    .concat(&bytes[overlap..])
                    .map_err(|_| StreamError::EndOfStream)?;

                Ok(bytes.len())
            }
        }
    }
}

impl<A: Allocator> Stream for BufferStream<'_, A> {
    fn seek(&mut self, to: i64, whence: Whence) -> Result<usize, StreamError> {
        let len = self.len() as i64;

        let target = match whence {
            Whence::Start => Some(to),
            Whence::Current => (self.cursor as i64).checked_add(to),
            Whence::End => len.checked_sub(to),
        }
        .ok_or_else(|| self.out_of_bounds(to))?;

        if !(0..=len).contains(&target) {
            return Err(self.out_of_bounds(target));
        }

        self.cursor = target as usize;

        Ok(self.cursor)
    }

    fn tell(&self) -> Result<usize, StreamError> {
        Ok(self.cursor)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let n = self.copy_out(buf, self.cursor)?;
        self.cursor += n;

        Ok(n)
    }

    fn read_at(&mut self, buf: &mut [u8], offset: usize) -> Result<usize, StreamError> {
        self.copy_out(buf, offset)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        let n = self.copy_in(buf, self.cursor)?;
        self.cursor += n;

        Ok(n)
    }

    fn write_at(&mut self, buf: &[u8], offset: usize) -> Result<usize, StreamError> {
        self.copy_in(buf, offset)
    }

    /// Releases a growable stream's buffer. Borrowing streams have nothing
    /// to release.
    fn close(&mut self) -> Result<(), StreamError> {
        if let Backing::Growable(array) = &mut self.backing {
            array.reset();
            self.cursor = 0;
        }

        Ok(())
    }

    /// Empties a growable stream and rewinds it. Fixed and read-only
    /// streams cannot be flushed.
    fn flush(&mut self) -> Result<(), StreamError> {
        match &mut self.backing {
            Backing::Growable(array) => {
                array.clear();
                self.cursor = 0;

                Ok(())
            }
            _ => Err(StreamError::NotImplemented),
        }
    }

    fn size(&self) -> Result<usize, StreamError> {
        Ok(self.len())
    }

    /// Never waits; memory is always ready except for writing to a
    /// read-only view.
    fn poll(&mut self, event: PollEvent, _timeout: Duration) -> Result<bool, StreamError> {
        Ok(match event {
            PollEvent::Read => true,
            PollEvent::Write => self.is_writable(),
        })
    }
}

impl<A: Allocator> fmt::Debug for BufferStream<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferStream")
            .field("len", &self.len())
            .field("cursor", &self.cursor)
            .field("writable", &self.is_writable())
            .field("fixed", &self.is_fixed())
            .finish()
    }
}
