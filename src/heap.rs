//! Binary heaps over indices into an external key array.
//!
//! An [`IndexedHeap`] stores indices only. The keys live in a slice owned by
//! the caller and are passed to every operation that compares; the heap never
//! writes them. An index must not be live twice, and the key of a live index
//! must not change while it sits in the heap.
//!
//! The buffer is 0-based: the children of position `p` are `2p + 1` and
//! `2p + 2`.

use std::fmt;
use std::marker::PhantomData;

/// Ordering of an [`IndexedHeap`].
pub trait HeapOrder {
    /// Whether key `a` belongs strictly closer to the top than key `b`.
    fn precedes(a: f64, b: f64) -> bool;
}

/// Smallest key on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascending;

/// Largest key on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct Descending;

impl HeapOrder for Ascending {
    #[inline]
    fn precedes(a: f64, b: f64) -> bool {
        a < b
    }
}

impl HeapOrder for Descending {
    #[inline]
    fn precedes(a: f64, b: f64) -> bool {
        a > b
    }
}

pub type MinHeap = IndexedHeap<Ascending>;
pub type MaxHeap = IndexedHeap<Descending>;

/// A defect found by [`IndexedHeap::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HeapViolation {
    /// The key at `child` belongs above the key at its `parent`.
    OutOfOrder { parent: usize, child: usize },

    /// A live slot holds an index outside the key array.
    IndexOutOfRange { position: usize, index: usize },

    /// The same index is live in two slots.
    Duplicate { position: usize, index: usize },
}

impl fmt::Display for HeapViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapViolation::OutOfOrder { parent, child } => {
                write!(f, "heap order broken between positions {parent} and {child}")
            }
            HeapViolation::IndexOutOfRange { position, index } => {
                write!(f, "index {index} at position {position} is out of range")
            }
            HeapViolation::Duplicate { position, index } => {
                write!(f, "index {index} at position {position} is already live")
            }
        }
    }
}

impl std::error::Error for HeapViolation {}

#[derive(Debug, Clone)]
pub struct IndexedHeap<O> {
    slots: Vec<usize>,
    len: usize,
    comparisons: u64,
    order: PhantomData<O>,
}

impl<O: HeapOrder> IndexedHeap<O> {
    /// An empty heap able to hold `capacity` indices.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_buffer(vec![0; capacity])
    }

    /// An empty heap reusing `slots` as its buffer. The capacity is the
    /// buffer's length; its contents are ignored.
    pub fn from_buffer(slots: Vec<usize>) -> Self {
        Self {
            slots,
            len: 0,
            comparisons: 0,
            order: PhantomData,
        }
    }

    /// Give the buffer back. The live indices are its first [`len`] slots.
    ///
    /// [`len`]: IndexedHeap::len
    pub fn into_buffer(self) -> Vec<usize> {
        self.slots
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The live indices in heap layout.
    pub fn as_slice(&self) -> &[usize] {
        &self.slots[..self.len]
    }

    /// Key comparisons performed since the heap was created.
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    pub fn top(&self) -> Option<usize> {
        self.as_slice().first().copied()
    }

    pub fn top_key(&self, keys: &[f64]) -> Option<f64> {
        self.top().map(|index| keys[index])
    }

    /// Append `index` without restoring heap order. Call [`build`] before
    /// any other operation.
    ///
    /// [`build`]: IndexedHeap::build
    pub fn push_unordered(&mut self, index: usize) {
        assert!(
            self.len < self.slots.len(),
            "indexed heap is full (capacity {})",
            self.slots.len()
        );
        self.slots[self.len] = index;
        self.len += 1;
    }

    /// Arrange the live region into heap order, bottom-up in O(len).
    pub fn build(&mut self, keys: &[f64]) {
        for position in (0..self.len / 2).rev() {
            self.sift_down(position, keys);
        }
    }

    /// Restore heap order below `position`, assuming both child subtrees
    /// are already heaps.
    pub fn sift_down(&mut self, position: usize, keys: &[f64]) {
        if position >= self.len {
            return;
        }
        let moving = self.slots[position];
        let moving_key = keys[moving];
        let mut hole = position;

        loop {
            let left = 2 * hole + 1;
            if left >= self.len {
                break;
            }
            let right = left + 1;
            let mut child = left;
            let mut child_key = keys[self.slots[left]];
            if right < self.len {
                let right_key = keys[self.slots[right]];
                if self.precedes(right_key, child_key) {
                    child = right;
                    child_key = right_key;
                }
            }
            if !self.precedes(child_key, moving_key) {
                break;
            }
            self.slots[hole] = self.slots[child];
            hole = child;
        }

        self.slots[hole] = moving;
    }

    /// Remove the top index and return it.
    ///
    /// # Panics
    ///
    /// Panics if the heap is empty.
    pub fn delete_top(&mut self, keys: &[f64]) -> usize {
        assert!(self.len > 0, "delete_top on an empty heap");
        let top = self.slots[0];
        self.len -= 1;
        if self.len > 0 {
            self.slots[0] = self.slots[self.len];
            self.sift_down(0, keys);
        }
        top
    }

    /// Add `index` as a leaf and sift it up.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is full.
    pub fn insert(&mut self, index: usize, keys: &[f64]) {
        assert!(
            self.len < self.slots.len(),
            "indexed heap is full (capacity {})",
            self.slots.len()
        );
        let key = keys[index];
        let mut hole = self.len;
        self.len += 1;

        while hole > 0 {
            let parent = (hole - 1) / 2;
            let parent_index = self.slots[parent];
            if !self.precedes(key, keys[parent_index]) {
                break;
            }
            self.slots[hole] = parent_index;
            hole = parent;
        }

        self.slots[hole] = index;
    }

    /// Verify the heap without touching it: every live index lies in
    /// `[0, n)` and is unique, and every position from `from_position` on is
    /// ordered against its children.
    ///
    /// Only meant for tests and debugging. A failure is a logic defect.
    pub fn check(
        &self,
        keys: &[f64],
        n: usize,
        from_position: usize,
    ) -> Result<(), HeapViolation> {
        let live = self.as_slice();
        let mut seen = vec![false; n];

        for (position, &index) in live.iter().enumerate() {
            if index >= n || index >= keys.len() {
                return Err(HeapViolation::IndexOutOfRange { position, index });
            }
            if seen[index] {
                return Err(HeapViolation::Duplicate { position, index });
            }
            seen[index] = true;
        }

        for parent in from_position..live.len() {
            for child in [2 * parent + 1, 2 * parent + 2] {
                if child < live.len() && O::precedes(keys[live[child]], keys[live[parent]]) {
                    return Err(HeapViolation::OutOfOrder { parent, child });
                }
            }
        }

        Ok(())
    }

    #[inline]
    fn precedes(&mut self, a: f64, b: f64) -> bool {
        self.comparisons += 1;
        O::precedes(a, b)
    }
}
