use crate::allocator::{Allocator, HeapAllocator};
use crate::error::{AllocError, ArrayError};
use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut, Range};
use std::ptr::{self, NonNull};
use std::slice;
use tracing::warn;

const DEFAULT_CAP: usize = 8;
const GROW_RATE: usize = 2;

/// A contiguous, growable buffer of `T` whose memory comes from an
/// [`Allocator`].
///
/// Capacity doubles whenever it runs out and never shrinks on its own.
/// Every operation that may need memory returns a `Result`; when the
/// allocator refuses, the array is left exactly as it was and remains usable
/// at its old capacity. Indexing past `len` panics, as it does for slices.
///
/// ```
/// use stowage::GrowableArray;
///
/// let mut array = GrowableArray::new();
///
/// for i in [10, 20, 30, 40] {
///     array.push(i).unwrap();
/// }
///
/// assert_eq!(array.fast_delete(1), 20);
/// assert_eq!(array.as_slice(), &[10, 40, 30]);
/// ```
pub struct GrowableArray<T, A: Allocator = HeapAllocator> {
    data: NonNull<T>,
    len: usize,
    cap: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send, A: Allocator + Send> Send for GrowableArray<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for GrowableArray<T, A> {}

impl<T> GrowableArray<T> {
    pub fn new() -> Self {
        Self::new_in(HeapAllocator)
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Self::with_capacity_in(capacity, HeapAllocator)
    }
}

impl<T> Default for GrowableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> GrowableArray<T, A> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    /// An empty array that allocates nothing until the first push.
    pub fn new_in(alloc: A) -> Self {
        Self {
            data: NonNull::dangling(),
            len: 0,
            cap: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, AllocError> {
        let mut array = Self::new_in(alloc);

        if capacity > 0 && !Self::IS_ZST {
            array.data = array.alloc.allocate(Self::layout_for(capacity)?)?.cast();
            array.cap = capacity;
        }

        Ok(array)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Zero-sized types never need memory, so their capacity is unbounded.
    pub fn capacity(&self) -> usize {
        if Self::IS_ZST {
            usize::MAX
        } else {
            self.cap
        }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    fn layout_for(capacity: usize) -> Result<Layout, AllocError> {
        Layout::array::<T>(capacity).map_err(|_| AllocError::BadRequest)
    }

    /// Makes room for at least `n` elements.
    ///
    /// Capacity doubles until it covers `n`, starting from the current
    /// capacity (or a small default when empty), then the buffer is resized
    /// through the allocator. On failure nothing changes.
    pub fn ensure_capacity(&mut self, n: usize) -> Result<(), AllocError> {
        if n <= self.capacity() {
            return Ok(());
        }

        let mut new_cap = if self.cap == 0 { DEFAULT_CAP } else { self.cap };
        while new_cap < n {
            new_cap = new_cap.checked_mul(GROW_RATE).ok_or(AllocError::BadRequest)?;
        }

        let layout = Self::layout_for(new_cap)?;
        let result = if self.cap == 0 {
            self.alloc.allocate(layout)
        } else {
            // `data` came from this allocator and has not been freed
            unsafe { self.alloc.resize(self.data.cast(), layout) }
        };

        match result {
            Ok(ptr) => {
                self.data = ptr.cast();
                self.cap = new_cap;

                Ok(())
            }
            Err(err) => {
                warn!(
                    len = self.len,
                    capacity = self.cap,
                    requested = new_cap,
                    "growable array failed to grow"
                );

                Err(err)
            }
        }
    }

    pub fn push(&mut self, value: T) -> Result<(), AllocError> {
        self.ensure_capacity(self.len + 1)?;

        unsafe { self.data.as_ptr().add(self.len).write(value) };
        self.len += 1;

        Ok(())
    }

    /// Inserts `value` before the element at `index`, shifting the tail
    /// toward the end. `index` must name an existing element; use
    /// [`GrowableArray::push`] to append.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), ArrayError> {
        self.check_insert_index(index)?;
        self.ensure_capacity(self.len + 1)?;

        unsafe {
            let at = self.data.as_ptr().add(index);

            ptr::copy(at, at.add(1), self.len - index);
            at.write(value);
        }
        self.len += 1;

        Ok(())
    }

    /// Inserts clones of `values` before the element at `index`, keeping the
    /// order of both the existing elements and `values`.
    pub fn insert_slice(&mut self, index: usize, values: &[T]) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        self.check_insert_index(index)?;

        let count = values.len();
        let new_len = self.len.checked_add(count).ok_or(AllocError::BadRequest)?;
        self.ensure_capacity(new_len)?;

        let old_len = self.len;
        let tail = old_len - index;

        unsafe {
            let at = self.data.as_ptr().add(index);
            ptr::copy(at, at.add(count), tail);

            // If a clone panics the shifted tail is leaked rather than
            // dropped twice.
            self.len = index;
            for (i, value) in values.iter().enumerate() {
                at.add(i).write(value.clone());
            }
        }
        self.len = new_len;

        Ok(())
    }

    fn check_insert_index(&self, index: usize) -> Result<(), ArrayError> {
        if index >= self.len {
            return Err(ArrayError::OutOfBounds {
                index,
                len: self.len,
            });
        }

        Ok(())
    }

    /// Removes and returns the element at `index`, shifting everything after
    /// it down by one. O(len - index).
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn delete(&mut self, index: usize) -> T {
        self.assert_index(index, "delete");

        unsafe {
            let at = self.data.as_ptr().add(index);
            let value = at.read();

            ptr::copy(at.add(1), at, self.len - index - 1);
            self.len -= 1;

            value
        }
    }

    /// Removes and returns the element at `index`, moving the last element
    /// into its slot. O(1), does not preserve order.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn fast_delete(&mut self, index: usize) -> T {
        self.assert_index(index, "fast_delete");

        unsafe {
            let base = self.data.as_ptr();
            let value = base.add(index).read();

            self.len -= 1;
            if index != self.len {
                ptr::copy_nonoverlapping(base.add(self.len), base.add(index), 1);
            }

            value
        }
    }

    fn assert_index(&self, index: usize, op: &str) {
        assert!(
            index < self.len,
            "{op} index (is {index}) should be < len (is {})",
            self.len
        );
    }

    /// Drops every element equal to `value`, keeping the order of the rest.
    /// Returns how many were removed.
    pub fn remove(&mut self, value: &T) -> usize
    where
        T: PartialEq,
    {
        self.filter(|item| item != value)
    }

    /// Keeps only the elements for which `keep` returns true, in one pass
    /// and without allocating. Returns how many were removed.
    pub fn filter<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let original_len = self.len;

        // Until the pass finishes the array owns only the compacted prefix;
        // the guard stitches the unvisited tail back on even if `keep` or a
        // destructor panics.
        let mut guard = FilterGuard {
            array: self,
            read: 0,
            write: 0,
            original_len,
        };
        guard.array.len = 0;

        while guard.read < original_len {
            let base = guard.array.data.as_ptr();

            unsafe {
                let current = base.add(guard.read);

                if keep(&*current) {
                    if guard.read != guard.write {
                        ptr::copy_nonoverlapping(current, base.add(guard.write), 1);
                    }
                    guard.read += 1;
                    guard.write += 1;
                } else {
                    guard.read += 1;
                    ptr::drop_in_place(current);
                }
            }
        }

        original_len - guard.write
    }

    /// Removes the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;

        Some(unsafe { self.data.as_ptr().add(self.len).read() })
    }

    /// Shrinks the array by `min(n, len)` and returns what was the last
    /// element. The other removed elements are dropped. Returns `None` when
    /// the array is empty or `n` is zero.
    pub fn pop_n(&mut self, n: usize) -> Option<T> {
        let count = n.min(self.len);
        let last = self.pop()?;

        if count == 0 {
            // n == 0 removes nothing, put it back
            unsafe { self.data.as_ptr().add(self.len).write(last) };
            self.len += 1;

            return None;
        }

        self.truncate(self.len - (count - 1));

        Some(last)
    }

    /// Drops every element past `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        let tail = self.len - len;
        self.len = len;

        unsafe {
            let tail = slice::from_raw_parts_mut(self.data.as_ptr().add(len), tail);
            ptr::drop_in_place(tail);
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Drops every element and hands the buffer back to the allocator,
    /// leaving an empty array with no capacity.
    pub fn reset(&mut self) {
        self.clear();
        self.free_buffer();
    }

    fn free_buffer(&mut self) {
        if self.cap > 0 {
            // `data` came from this allocator and has not been freed
            unsafe { self.alloc.free(self.data.cast()) };
        }

        self.data = NonNull::dangling();
        self.cap = 0;
    }

    /// Appends clones of every element of `other`.
    pub fn concat(&mut self, other: &[T]) -> Result<(), AllocError>
    where
        T: Clone,
    {
        let new_len = self.len.checked_add(other.len()).ok_or(AllocError::BadRequest)?;
        self.ensure_capacity(new_len)?;

        for value in other {
            unsafe { self.data.as_ptr().add(self.len).write(value.clone()) };
            self.len += 1;
        }

        Ok(())
    }

    /// Appends every element produced by `items`. Elements pushed before an
    /// allocation failure stay in the array.
    pub fn concat_iter<I>(&mut self, items: I) -> Result<(), AllocError>
    where
        I: IntoIterator<Item = T>,
    {
        let items = items.into_iter();
        let (lower, _) = items.size_hint();

        self.ensure_capacity(self.len.saturating_add(lower))?;

        for item in items {
            self.push(item)?;
        }

        Ok(())
    }

    /// An independent copy of every element, in a buffer from `alloc`.
    pub fn copy_in<B: Allocator>(&self, alloc: B) -> Result<GrowableArray<T, B>, AllocError>
    where
        T: Clone,
    {
        self.copy_range_in(0..self.len, alloc)
    }

    /// An independent copy of the elements in `range`, in a buffer from
    /// `alloc`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    pub fn copy_range_in<B: Allocator>(
        &self,
        range: Range<usize>,
        alloc: B,
    ) -> Result<GrowableArray<T, B>, AllocError>
    where
        T: Clone,
    {
        let items = &self.as_slice()[range];
        let mut copy = GrowableArray::with_capacity_in(items.len(), alloc)?;

        copy.concat(items)?;

        Ok(copy)
    }

    /// An independent copy using a clone of this array's allocator.
    pub fn copy(&self) -> Result<Self, AllocError>
    where
        T: Clone,
        A: Clone,
    {
        self.copy_in(self.alloc.clone())
    }

    pub fn copy_range(&self, range: Range<usize>) -> Result<Self, AllocError>
    where
        T: Clone,
        A: Clone,
    {
        self.copy_range_in(range, self.alloc.clone())
    }
}

struct FilterGuard<'a, T, A: Allocator> {
    array: &'a mut GrowableArray<T, A>,
    read: usize,
    write: usize,
    original_len: usize,
}

impl<T, A: Allocator> Drop for FilterGuard<'_, T, A> {
    fn drop(&mut self) {
        let unvisited = self.original_len - self.read;

        unsafe {
            let base = self.array.data.as_ptr();

            if unvisited > 0 && self.read != self.write {
                ptr::copy(base.add(self.read), base.add(self.write), unvisited);
            }
        }

        self.array.len = self.write + unvisited;
    }
}

impl<T, A: Allocator> Drop for GrowableArray<T, A> {
    fn drop(&mut self) {
        self.clear();
        self.free_buffer();
    }
}

impl<T, A: Allocator> Deref for GrowableArray<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> DerefMut for GrowableArray<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a GrowableArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut GrowableArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for GrowableArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<GrowableArray<T, B>>
    for GrowableArray<T, A>
{
    fn eq(&self, other: &GrowableArray<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq, A: Allocator> PartialEq<[T]> for GrowableArray<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, A: Allocator, const N: usize> PartialEq<[T; N]> for GrowableArray<T, A> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::Arena;
    use crate::test::BudgetAllocator;
    use std::cell::Cell;
    use std::rc::Rc;

    fn array_of(items: &[i32]) -> GrowableArray<i32> {
        let mut array = GrowableArray::new();
        array.concat(items).unwrap();
        array
    }

    #[test]
    fn empty_array_has_no_buffer() {
        let array: GrowableArray<u64> = GrowableArray::new();

        assert!(array.is_empty());
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn push_and_pop_items() {
        let mut array = GrowableArray::new();

        for i in 0..36 {
            assert_eq!(array.len(), i);
            array.push(i).unwrap();
        }

        for i in (0..36).rev() {
            assert_eq!(array.pop(), Some(i));
            assert_eq!(array.len(), i);
        }

        assert_eq!(array.pop(), None);
    }

    #[test]
    fn capacity_doubles_from_initial() {
        let mut array = GrowableArray::with_capacity(3).unwrap();
        let mut seen = vec![array.capacity()];

        for i in 0..100 {
            array.push(i).unwrap();
            if *seen.last().unwrap() != array.capacity() {
                seen.push(array.capacity());
            }
        }

        assert_eq!(seen, vec![3, 6, 12, 24, 48, 96, 192]);
    }

    #[test]
    fn ensure_capacity_is_noop_when_covered() {
        let mut array: GrowableArray<u8> = GrowableArray::with_capacity(16).unwrap();
        let ptr = array.as_ptr();

        array.ensure_capacity(10).unwrap();

        assert_eq!(array.capacity(), 16);
        assert_eq!(array.as_ptr(), ptr);
    }

    #[test]
    fn failed_growth_leaves_array_unchanged() {
        let budget = BudgetAllocator::new(4 * 8);
        let mut array = GrowableArray::with_capacity_in(4, &budget).unwrap();

        for i in 0..4u64 {
            array.push(i).unwrap();
        }

        let err = array.push(4).unwrap_err();
        assert_eq!(err, AllocError::OOM { size: 64, align: 8 });
        assert_eq!(array.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(array.capacity(), 4);

        // still usable once memory frees up
        budget.set_budget(usize::MAX);
        array.push(4).unwrap();
        assert_eq!(array.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn capacity_overflow_is_a_bad_request() {
        let mut array: GrowableArray<u64> = GrowableArray::new();

        assert_eq!(array.ensure_capacity(usize::MAX), Err(AllocError::BadRequest));
    }

    #[test]
    fn insert_shifts_tail() {
        let mut array = array_of(&[1, 2, 4]);

        array.insert(2, 3).unwrap();
        array.insert(0, 0).unwrap();

        assert_eq!(array, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn insert_at_or_past_len_fails() {
        let mut array = array_of(&[1, 2]);

        assert_eq!(
            array.insert(2, 3),
            Err(ArrayError::OutOfBounds { index: 2, len: 2 })
        );

        let mut empty: GrowableArray<i32> = GrowableArray::new();
        assert!(empty.insert(0, 1).is_err());
    }

    #[test]
    fn insert_slice_opens_a_gap() {
        let mut array = array_of(&[1, 5, 6]);

        array.insert_slice(1, &[2, 3, 4]).unwrap();

        assert_eq!(array, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn delete_preserves_order() {
        let mut array = array_of(&[10, 20, 30, 40]);

        assert_eq!(array.delete(1), 20);
        assert_eq!(array, [10, 30, 40]);
    }

    #[test]
    fn fast_delete_moves_last() {
        let mut array = array_of(&[10, 20, 30, 40]);

        assert_eq!(array.fast_delete(1), 20);
        assert_eq!(array, [10, 40, 30]);

        assert_eq!(array.fast_delete(2), 30);
        assert_eq!(array, [10, 40]);
    }

    #[test]
    #[should_panic(expected = "delete index (is 4) should be < len (is 4)")]
    fn delete_out_of_bounds_panics() {
        array_of(&[1, 2, 3, 4]).delete(4);
    }

    #[test]
    fn remove_compacts_stably() {
        let mut array = array_of(&[1, 7, 2, 7, 7, 3]);

        assert_eq!(array.remove(&7), 3);
        assert_eq!(array, [1, 2, 3]);
        assert_eq!(array.remove(&7), 0);
        assert_eq!(array, [1, 2, 3]);
    }

    #[test]
    fn filter_drops_removed_elements() {
        let drops = Rc::new(Cell::new(0));

        struct Counted(i32, Rc<Cell<usize>>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.1.set(self.1.get() + 1);
            }
        }

        let mut array = GrowableArray::new();
        for i in 0..10 {
            array.push(Counted(i, drops.clone())).unwrap();
        }

        assert_eq!(array.filter(|c| c.0 % 2 == 0), 5);
        assert_eq!(drops.get(), 5);
        assert_eq!(array.iter().map(|c| c.0).collect::<Vec<_>>(), vec![0, 2, 4, 6, 8]);

        drop(array);
        assert_eq!(drops.get(), 10);
    }

    #[test]
    fn pop_n_shrinks_by_min() {
        let mut array = array_of(&[1, 2, 3, 4, 5]);

        assert_eq!(array.pop_n(2), Some(5));
        assert_eq!(array, [1, 2, 3]);

        assert_eq!(array.pop_n(0), None);
        assert_eq!(array, [1, 2, 3]);

        assert_eq!(array.pop_n(10), Some(3));
        assert!(array.is_empty());
        assert_eq!(array.pop_n(1), None);
    }

    #[test]
    fn concat_iter_grows() {
        let mut array = array_of(&[1]);

        array.concat_iter((2..=100).filter(|n| n % 2 == 0)).unwrap();

        assert_eq!(array.len(), 51);
        assert_eq!(array[50], 100);
    }

    #[test]
    fn copies_are_independent() {
        let array = array_of(&[1, 2, 3, 4, 5]);
        let mut whole = array.copy().unwrap();
        let middle = array.copy_range(1..4).unwrap();

        whole[0] = 100;

        assert_eq!(array, [1, 2, 3, 4, 5]);
        assert_eq!(whole, [100, 2, 3, 4, 5]);
        assert_eq!(middle, [2, 3, 4]);
    }

    #[test]
    fn copy_into_arena() {
        let arena = Arena::new(HeapAllocator, 256).unwrap();
        let array = array_of(&[3, 1, 4, 1, 5]);
        let copy = array.copy_in(&arena).unwrap();

        assert_eq!(copy, array);
        assert!(arena.allocated_bytes() >= 256);
    }

    #[test]
    fn grows_inside_arena() {
        let arena = Arena::new(HeapAllocator, 4096).unwrap();
        let mut array = GrowableArray::new_in(&arena);

        for i in 0..1000u32 {
            array.push(i).unwrap();
        }

        assert!(array.iter().copied().eq(0..1000));
    }

    #[test]
    fn drop_frees_buffer() {
        let budget = BudgetAllocator::new(usize::MAX);

        {
            let mut array = GrowableArray::new_in(&budget);
            for i in 0..100 {
                array.push(i).unwrap();
            }
            assert_eq!(budget.live(), 1);
        }

        assert_eq!(budget.live(), 0);
    }

    #[test]
    fn reset_releases_buffer() {
        let budget = BudgetAllocator::new(usize::MAX);
        let mut array = GrowableArray::new_in(&budget);

        array.concat(&[1, 2, 3]).unwrap();
        assert_eq!(array.allocator().live(), 1);
        array.reset();

        assert_eq!(array.allocator().live(), 0);
        assert_eq!(array.capacity(), 0);
        array.push(4).unwrap();
        assert_eq!(array, [4]);
    }

    #[test]
    fn zero_sized_elements() {
        let mut array = GrowableArray::new();

        for _ in 0..1000 {
            array.push(()).unwrap();
        }

        assert_eq!(array.len(), 1000);
        assert_eq!(array.capacity(), usize::MAX);
        array.delete(0);
        assert_eq!(array.len(), 999);
    }
}
