use crate::allocator::{Allocator, HeapAllocator};
use crate::array::GrowableArray;
use crate::error::AllocError;
use std::cmp::Ordering;
use std::fmt;

/// A binary min-heap over a [`GrowableArray`], ordered by a caller-supplied
/// comparator.
///
/// The element the comparator ranks lowest is always at the top. Elements
/// the comparator calls equal are never swapped, so their relative order is
/// not stable across inserts and removals.
///
/// ```
/// use stowage::Heap;
///
/// let mut heap = Heap::new(|a: &i32, b: &i32| a.cmp(b));
///
/// for n in [5, 3, 8, 1, 9, 2] {
///     heap.insert(n).unwrap();
/// }
///
/// let mut drained = Vec::new();
/// while let Some(n) = heap.remove_top() {
///     drained.push(n);
/// }
///
/// assert_eq!(drained, [1, 2, 3, 5, 8, 9]);
/// ```
pub struct Heap<T, C, A: Allocator = HeapAllocator>
where
    C: Fn(&T, &T) -> Ordering,
{
    array: GrowableArray<T, A>,
    compare: C,
}

impl<T, C> Heap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    pub fn new(compare: C) -> Self {
        Self::new_in(compare, HeapAllocator)
    }
}

impl<T: Ord> Heap<T, fn(&T, &T) -> Ordering> {
    /// A heap ordered by `T`'s own `Ord`, smallest first.
    pub fn new_ord() -> Self {
        Self::new(T::cmp)
    }
}

impl<T, C, A: Allocator> Heap<T, C, A>
where
    C: Fn(&T, &T) -> Ordering,
{
    pub fn new_in(compare: C, alloc: A) -> Self {
        Self {
            array: GrowableArray::new_in(alloc),
            compare,
        }
    }

    /// Takes ownership of `array` and reorders it into a heap. O(n).
    pub fn from_array(array: GrowableArray<T, A>, compare: C) -> Self {
        let mut heap = Self { array, compare };
        let len = heap.array.len();

        for i in (0..len / 2).rev() {
            heap.sift_down(i);
        }

        heap
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn peek(&self) -> Option<&T> {
        self.array.first()
    }

    /// The backing array in heap order.
    pub fn as_slice(&self) -> &[T] {
        self.array.as_slice()
    }

    pub fn into_array(self) -> GrowableArray<T, A> {
        self.array
    }

    /// Adds `value` and restores the heap order. O(log n). Fails only when
    /// the backing array cannot grow.
    pub fn insert(&mut self, value: T) -> Result<(), AllocError> {
        self.array.push(value)?;
        self.sift_up(self.array.len() - 1);

        Ok(())
    }

    /// Removes and returns the top element, or `None` when empty. O(log n).
    pub fn remove_top(&mut self) -> Option<T> {
        if self.array.is_empty() {
            return None;
        }

        let top = self.array.fast_delete(0);
        self.sift_down(0);

        Some(top)
    }

    fn precedes(&self, a: usize, b: usize) -> bool {
        (self.compare)(&self.array[a], &self.array[b]) == Ordering::Less
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;

            if !self.precedes(index, parent) {
                break;
            }

            self.array.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.array.len();

        loop {
            let left = 2 * index + 1;
            let right = left + 1;

            if left >= len {
                break;
            }

            let child = if right < len && self.precedes(right, left) {
                right
            } else {
                left
            };

            if !self.precedes(child, index) {
                break;
            }

            self.array.swap(index, child);
            index = child;
        }
    }
}

impl<T: fmt::Debug, C, A: Allocator> fmt::Debug for Heap<T, C, A>
where
    C: Fn(&T, &T) -> Ordering,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap").field("array", &self.array).finish()
    }
}
