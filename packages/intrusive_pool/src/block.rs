use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::any::type_name;
use std::ptr::NonNull;

/// One unit of pool growth: a heap-allocated, contiguous array of `N` slots of type `S`.
///
/// The block only owns the memory. It does not initialize the slots and does not drop anything
/// in them - the pool decides what each slot contains and cleans it up before the block is
/// dropped. Dropping the block releases its memory.
///
/// The slots never move for as long as the block exists, even if the `Block` value itself is
/// moved around, because they live in a separate heap allocation.
#[derive(Debug)]
pub(crate) struct Block<S, const N: usize> {
    first_slot_ptr: NonNull<S>,
}

impl<S, const N: usize> Block<S, N> {
    /// Allocates the memory for a new block, with all slots uninitialized.
    ///
    /// If the memory cannot be allocated, this calls [`handle_alloc_error()`].
    ///
    /// # Panics
    ///
    /// Panics if the block would not fit into the address space.
    #[must_use]
    pub(crate) fn new() -> Self {
        const {
            assert!(N > 0, "pool block must have at least one slot");
        };

        const {
            assert!(size_of::<S>() > 0, "pool slots must have non-zero size");
        };

        let layout = Self::layout();

        // SAFETY: The layout is not zero-sized, guarded by the const assertions above.
        let ptr = unsafe { alloc(layout) };

        let Some(first_slot_ptr) = NonNull::new(ptr.cast::<S>()) else {
            handle_alloc_error(layout);
        };

        Self { first_slot_ptr }
    }

    #[must_use]
    fn layout() -> Layout {
        Layout::array::<S>(N).unwrap_or_else(|_| {
            panic!(
                "a block of {N} slots of {} does not fit into the address space",
                type_name::<S>()
            )
        })
    }

    /// Pointer to the slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn slot_ptr(&self, index: usize) -> NonNull<S> {
        assert!(
            index < N,
            "slot {index} is out of bounds in block of {N} slots of {}",
            type_name::<S>()
        );

        // SAFETY: Guarded by the bounds check above, so the pointer stays within the allocation.
        unsafe { self.first_slot_ptr.add(index) }
    }

    /// Pointers to all the slots in the block, in address order.
    ///
    /// The iterator does not borrow the block, so the block may be moved while iterating. The
    /// pointers remain valid for as long as the block is not dropped.
    pub(crate) fn slot_ptrs(&self) -> impl DoubleEndedIterator<Item = NonNull<S>> + use<S, N> {
        let first_slot_ptr = self.first_slot_ptr;

        (0..N).map(move |index| {
            // SAFETY: The range limits us to the `N` slots of the allocation.
            unsafe { first_slot_ptr.add(index) }
        })
    }

    /// Whether the pointer points to the start of one of the slots in this block.
    #[must_use]
    pub(crate) fn contains(&self, ptr: NonNull<S>) -> bool {
        let start = self.first_slot_ptr.addr().get();

        // We only compare addresses, we never turn the difference back into a pointer.
        let Some(offset) = ptr.addr().get().checked_sub(start) else {
            return false;
        };

        let slot_size = size_of::<S>();

        let index = offset
            .checked_div(slot_size)
            .expect("slot size is non-zero, guarded at compile time in the ctor");
        let is_slot_start = offset
            .checked_rem(slot_size)
            .expect("slot size is non-zero, guarded at compile time in the ctor")
            == 0;

        is_slot_start && index < N
    }
}

impl<S, const N: usize> Drop for Block<S, N> {
    fn drop(&mut self) {
        // SAFETY: The layout must match between alloc and dealloc. It does.
        unsafe {
            dealloc(self.first_slot_ptr.as_ptr().cast(), Self::layout());
        }
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(Block<u64, 4>: Send, Sync);

    #[test]
    fn slots_are_contiguous_and_aligned() {
        #[expect(dead_code, reason = "only used for its layout")]
        #[repr(align(32))]
        struct Wide {
            _bytes: [u8; 48],
        }

        let block = Block::<Wide, 5>::new();
        let slots: Vec<_> = block.slot_ptrs().collect();

        assert_eq!(slots.len(), 5);

        for (index, slot) in slots.iter().enumerate() {
            assert_eq!(*slot, block.slot_ptr(index));
            assert_eq!(slot.addr().get() % align_of::<Wide>(), 0);
        }

        for pair in slots.windows(2) {
            let [a, b] = pair else {
                unreachable!("windows(2) yields pairs");
            };

            assert_eq!(
                b.addr().get().wrapping_sub(a.addr().get()),
                size_of::<Wide>()
            );
        }
    }

    #[test]
    fn slot_ptrs_survive_moving_the_block() {
        let block = Block::<u64, 3>::new();
        let before: Vec<_> = block.slot_ptrs().collect();

        let moved = Box::new(block);
        let after: Vec<_> = moved.slot_ptrs().collect();

        assert_eq!(before, after);
    }

    #[test]
    fn slot_ptrs_reverse() {
        let block = Block::<u32, 4>::new();

        let forward: Vec<_> = block.slot_ptrs().collect();
        let mut backward: Vec<_> = block.slot_ptrs().rev().collect();
        backward.reverse();

        assert_eq!(forward, backward);
    }

    #[test]
    fn contains_only_slot_starts_of_own_slots() {
        let block = Block::<u64, 4>::new();
        let other = Block::<u64, 4>::new();

        for slot in block.slot_ptrs() {
            assert!(block.contains(slot));
            assert!(!other.contains(slot));
        }

        let first = block.slot_ptr(0);

        // SAFETY: Still within the first slot, we only compare the address.
        let misaligned = unsafe { first.byte_add(1) };
        assert!(!block.contains(misaligned));

        let past_end =
            NonNull::new(first.as_ptr().wrapping_add(4)).expect("test pointers are not null");
        assert!(!block.contains(past_end));
    }

    #[test]
    #[should_panic]
    fn slot_ptr_out_of_bounds_panics() {
        let block = Block::<u64, 4>::new();
        _ = block.slot_ptr(4);
    }
}
