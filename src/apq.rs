/*
Adaptable priority queue: an array-backed binary min-heap whose elements know their own
position, so a caller holding a handle can change a key or remove the element in O(log n).

Elements live in an arena of slots addressed by `Handle`. The heap array stores slot
numbers, and each element stores its index in the heap array. After every swap
`heap[slots[s].index] == s` holds for every live slot `s`.

Slots are never reused, so a handle to a removed element stays dead and every lookup
through it answers `None`.
*/

use std::fmt;

/// Stable reference to an element inserted into an [`Apq`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle(usize);

#[derive(Debug)]
struct Element<K, V> {
    key: K,
    value: V,
    index: usize,
}

#[derive(Debug)]
pub struct Apq<K, V> {
    slots: Vec<Option<Element<K, V>>>,
    heap: Vec<usize>,
}

impl<K, V> Default for Apq<K, V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            heap: Vec::new(),
        }
    }
}

impl<K: PartialOrd + Copy, V> Apq<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            heap: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.live(handle).is_some()
    }

    /// Add `value` with priority `key` and return the handle that tracks it.
    pub fn insert(&mut self, key: K, value: V) -> Handle {
        let slot = self.slots.len();
        let index = self.heap.len();
        self.slots.push(Some(Element { key, value, index }));
        self.heap.push(slot);
        self.sift_up(index);
        Handle(slot)
    }

    /// Handle of the element with the smallest key, without removing it.
    pub fn peek_min(&self) -> Option<Handle> {
        self.heap.first().map(|&slot| Handle(slot))
    }

    /// Smallest key and its value, without removing them.
    pub fn min(&self) -> Option<(K, &V)> {
        let elem = self.live(self.peek_min()?)?;
        Some((elem.key, &elem.value))
    }

    pub fn extract_min(&mut self) -> Option<(K, V)> {
        let root = self.peek_min()?;
        self.remove(root)
    }

    /// Remove the element behind `handle` and return its key and value.
    ///
    /// Returns `None` if the element was already removed.
    pub fn remove(&mut self, handle: Handle) -> Option<(K, V)> {
        let index = self.live(handle)?.index;
        assert_eq!(
            self.heap[index], handle.0,
            "apq: slot {} claims heap index {} held by slot {}",
            handle.0, index, self.heap[index]
        );

        let last = self.heap.len() - 1;
        if index != last {
            self.swap(index, last);
        }
        self.heap.pop();
        let elem = self.slots[handle.0].take()?;

        // The element moved into `index` came from the bottom of the heap; it may
        // belong lower or, when it sat in another subtree, higher.
        if index < self.heap.len() && self.sift_down(index) == index {
            self.sift_up(index);
        }
        Some((elem.key, elem.value))
    }

    /// Change the priority of the element behind `handle`.
    ///
    /// A larger key sinks toward the leaves, a smaller one rises toward the root.
    /// Returns `false` if the handle no longer refers to a queued element.
    pub fn update_key(&mut self, handle: Handle, new_key: K) -> bool {
        let Some(elem) = self.slots.get_mut(handle.0).and_then(Option::as_mut) else {
            return false;
        };
        let old_key = elem.key;
        let index = elem.index;
        elem.key = new_key;

        if new_key > old_key {
            self.sift_down(index);
        } else if new_key < old_key {
            self.sift_up(index);
        }
        true
    }

    pub fn key_of(&self, handle: Handle) -> Option<K> {
        self.live(handle).map(|elem| elem.key)
    }

    pub fn value_of(&self, handle: Handle) -> Option<&V> {
        self.live(handle).map(|elem| &elem.value)
    }

    /// Panics unless the heap property and index coherence hold for every element.
    pub fn assert_valid(&self) {
        for (index, &slot) in self.heap.iter().enumerate() {
            let elem = match self.slots.get(slot).and_then(Option::as_ref) {
                Some(elem) => elem,
                None => panic!("apq: heap index {index} refers to dead slot {slot}"),
            };
            assert_eq!(
                elem.index, index,
                "apq: slot {slot} sits at {index} but records {}",
                elem.index
            );
            if index > 0 {
                let parent = (index - 1) / 2;
                assert!(
                    !(elem.key < self.key_at(parent)),
                    "apq: key at {index} is smaller than its parent at {parent}"
                );
            }
        }
        let live = self.slots.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(live, self.heap.len(), "apq: live slots not all in the heap");
    }

    fn live(&self, handle: Handle) -> Option<&Element<K, V>> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    fn element_at(&self, index: usize) -> &Element<K, V> {
        let slot = self.heap[index];
        match self.slots[slot].as_ref() {
            Some(elem) => elem,
            None => panic!("apq: heap index {index} refers to dead slot {slot}"),
        }
    }

    fn key_at(&self, index: usize) -> K {
        self.element_at(index).key
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        for index in [i, j] {
            let slot = self.heap[index];
            if let Some(elem) = self.slots[slot].as_mut() {
                elem.index = index;
            }
        }
        debug_assert_eq!(self.element_at(i).index, i);
        debug_assert_eq!(self.element_at(j).index, j);
    }

    /// Move the element at `index` toward the root while it beats its parent.
    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.key_at(index) < self.key_at(parent) {
                self.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
        index
    }

    /// Move the element at `index` toward the leaves while a child beats it.
    fn sift_down(&mut self, mut index: usize) -> usize {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right >= len || self.key_at(left) < self.key_at(right) {
                left
            } else {
                right
            };
            if self.key_at(index) > self.key_at(child) {
                self.swap(index, child);
                index = child;
            } else {
                break;
            }
        }
        index
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Apq<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for &slot in &self.heap {
            if let Some(elem) = &self.slots[slot] {
                write!(f, "{} with cost {}, ", elem.value, elem.key)?;
            }
        }
        write!(f, "]")
    }
}
