use crate::allocator::{Allocator, HeapAllocator, Request};
use std::cell::Cell;
use std::ptr::NonNull;

/// Heap-backed allocator that refuses requests once `budget` bytes have been
/// handed out, and counts live blocks so tests can check nothing leaks.
///
/// Resizes are charged their full new size.
pub struct BudgetAllocator {
    remaining: Cell<usize>,
    live: Cell<usize>,
}

impl BudgetAllocator {
    pub fn new(budget: usize) -> Self {
        Self {
            remaining: Cell::new(budget),
            live: Cell::new(0),
        }
    }

    pub fn live(&self) -> usize {
        self.live.get()
    }

    pub fn set_budget(&self, budget: usize) {
        self.remaining.set(budget);
    }

    fn charge(&self, size: usize) -> bool {
        match self.remaining.get().checked_sub(size) {
            Some(left) => {
                self.remaining.set(left);
                true
            }
            None => false,
        }
    }
}

unsafe impl Allocator for BudgetAllocator {
    unsafe fn handle(&self, request: Request) -> Option<NonNull<u8>> {
        if let Some(layout) = request.layout() {
            if !self.charge(layout.size()) {
                return None;
            }
        }

        let result = HeapAllocator.handle(request);

        match request {
            Request::Allocate(_) if result.is_some() => self.live.set(self.live.get() + 1),
            Request::Free(Some(_)) => self.live.set(self.live.get() - 1),
            _ => {}
        }

        result
    }
}
