use std::fmt;
use std::ptr::NonNull;

use crate::{ListHook, SlistHook};

/// An intrusive list of vacant pool slots, threaded through the hooks stored in the slots.
///
/// The list never allocates. It only ever pushes to and pops from the front, so vacant slots
/// are reused in last-in-first-out order.
pub trait FreeList<H>: Default + fmt::Debug {
    /// Whether the list contains no hooks.
    #[must_use]
    fn is_empty(&self) -> bool;

    /// Counts the hooks in the list by walking it.
    #[must_use]
    fn len(&self) -> usize;

    /// Links a hook into the front of the list.
    ///
    /// # Safety
    ///
    /// The hook must be valid for reads and writes, must be unlinked and must stay at the same
    /// address, without being accessed by anyone else, until it is popped from the list or the
    /// list is cleared.
    unsafe fn push_front(&mut self, hook: NonNull<H>);

    /// Unlinks the hook at the front of the list and returns it, or returns `None` if the list
    /// is empty. The returned hook reports itself as unlinked.
    #[must_use]
    fn pop_front(&mut self) -> Option<NonNull<H>>;

    /// Unlinks every hook in the list and drops each in place.
    fn clear(&mut self);
}

/// A singly-linked free list of [`SlistHook`]s.
#[derive(Default)]
pub struct SinglyLinkedList {
    head: Option<NonNull<SlistHook>>,
}

impl FreeList<SlistHook> for SinglyLinkedList {
    fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn len(&self) -> usize {
        let mut count: usize = 0;
        let mut current = self.head;

        while let Some(hook) = current {
            // Cannot overflow because every hook occupies at least one byte of memory.
            count = count.wrapping_add(1);

            // SAFETY: Every hook in the list is valid for reads, guaranteed by `push_front()`.
            let next = unsafe { hook.as_ref() }
                .next()
                .expect("hook in free list must be linked");

            current = if next == hook { None } else { Some(next) };
        }

        count
    }

    unsafe fn push_front(&mut self, mut hook: NonNull<SlistHook>) {
        // SAFETY: The caller guarantees the hook is valid for reads and writes.
        let hook_ref = unsafe { hook.as_mut() };

        debug_assert!(
            hook_ref.next().is_none(),
            "cannot push a hook that is already linked"
        );

        // The last hook links to itself, so a linked hook never has an empty `next`.
        hook_ref.set_next(Some(self.head.unwrap_or(hook)));
        self.head = Some(hook);
    }

    fn pop_front(&mut self) -> Option<NonNull<SlistHook>> {
        let mut hook = self.head?;

        // SAFETY: Every hook in the list is valid for reads and writes and nobody else is
        // accessing it, guaranteed by `push_front()`.
        let hook_ref = unsafe { hook.as_mut() };

        let next = hook_ref.next().expect("hook in free list must be linked");
        self.head = if next == hook { None } else { Some(next) };

        hook_ref.set_next(None);

        Some(hook)
    }

    fn clear(&mut self) {
        while let Some(hook) = self.pop_front() {
            // SAFETY: The hook was valid when pushed and remains so until it leaves the list,
            // which is now. It is unlinked, so dropping it is the last thing that happens to it.
            unsafe {
                hook.drop_in_place();
            }
        }
    }
}

impl fmt::Debug for SinglyLinkedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinglyLinkedList")
            .field("len", &self.len())
            .finish()
    }
}

/// A doubly-linked free list of [`ListHook`]s.
#[derive(Default)]
pub struct DoublyLinkedList {
    head: Option<NonNull<ListHook>>,
}

impl FreeList<ListHook> for DoublyLinkedList {
    fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    fn len(&self) -> usize {
        let mut count: usize = 0;
        let mut current = self.head;

        while let Some(hook) = current {
            // Cannot overflow because every hook occupies at least one byte of memory.
            count = count.wrapping_add(1);

            // SAFETY: Every hook in the list is valid for reads, guaranteed by `push_front()`.
            let next = unsafe { hook.as_ref() }
                .next()
                .expect("hook in free list must be linked");

            current = if next == hook { None } else { Some(next) };
        }

        count
    }

    unsafe fn push_front(&mut self, mut hook: NonNull<ListHook>) {
        {
            // SAFETY: The caller guarantees the hook is valid for reads and writes.
            let hook_ref = unsafe { hook.as_mut() };

            debug_assert!(
                hook_ref.next().is_none() && hook_ref.prev().is_none(),
                "cannot push a hook that is already linked"
            );

            // The first hook links back to itself and the last hook links forward to itself.
            hook_ref.set_links(Some(hook), Some(self.head.unwrap_or(hook)));
        }

        if let Some(mut old_head) = self.head {
            // SAFETY: Every hook in the list is valid for reads and writes, guaranteed by
            // `push_front()`. The old head is not the new hook because the new hook was unlinked.
            unsafe { old_head.as_mut() }.set_prev(Some(hook));
        }

        self.head = Some(hook);
    }

    fn pop_front(&mut self) -> Option<NonNull<ListHook>> {
        let mut hook = self.head?;

        let next = {
            // SAFETY: Every hook in the list is valid for reads and writes and nobody else is
            // accessing it, guaranteed by `push_front()`.
            let hook_ref = unsafe { hook.as_mut() };

            debug_assert_eq!(
                hook_ref.prev(),
                Some(hook),
                "head of free list must link back to itself"
            );

            let next = hook_ref.next().expect("hook in free list must be linked");
            hook_ref.set_links(None, None);
            next
        };

        if next == hook {
            self.head = None;
        } else {
            let mut new_head = next;

            // SAFETY: Every hook in the list is valid for reads and writes, guaranteed by
            // `push_front()`. It is distinct from the popped hook, whose reference has ended.
            unsafe { new_head.as_mut() }.set_prev(Some(new_head));
            self.head = Some(new_head);
        }

        Some(hook)
    }

    fn clear(&mut self) {
        while let Some(hook) = self.pop_front() {
            // SAFETY: The hook was valid when pushed and remains so until it leaves the list,
            // which is now. It is unlinked, so dropping it is the last thing that happens to it.
            unsafe {
                hook.drop_in_place();
            }
        }
    }
}

impl fmt::Debug for DoublyLinkedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoublyLinkedList")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::indexing_slicing,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use std::mem::MaybeUninit;

    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::Hook;

    assert_not_impl_any!(SinglyLinkedList: Send, Sync);
    assert_not_impl_any!(DoublyLinkedList: Send, Sync);

    /// Storage for hooks that does not drop them, so `clear()` can drop them in place.
    fn hook_storage<H: Hook>(count: usize) -> Box<[MaybeUninit<H>]> {
        (0..count).map(|_| MaybeUninit::new(H::unlinked())).collect()
    }

    /// Derives all hook pointers from one borrow of the storage.
    fn hook_ptrs<H>(storage: &mut [MaybeUninit<H>]) -> Vec<NonNull<H>> {
        let base = storage.as_mut_ptr().cast::<H>();

        (0..storage.len())
            .map(|index| NonNull::new(base.wrapping_add(index)).expect("storage is not null"))
            .collect()
    }

    fn lifo_order_impl<H: Hook>() {
        let mut storage = hook_storage::<H>(3);
        let hooks = hook_ptrs(&mut storage);
        let (a, b, c) = (hooks[0], hooks[1], hooks[2]);

        let mut list = <H as Hook>::List::default();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);

        // SAFETY: The hooks are unlinked and the storage outlives the list.
        unsafe {
            list.push_front(a);
        }
        // SAFETY: As above.
        unsafe {
            list.push_front(b);
        }
        // SAFETY: As above.
        unsafe {
            list.push_front(c);
        }

        assert!(!list.is_empty());
        assert_eq!(list.len(), 3);

        // SAFETY: The storage is alive and the list only links the hooks.
        assert!(unsafe { a.as_ref() }.is_linked());

        assert_eq!(list.pop_front(), Some(c));
        assert_eq!(list.pop_front(), Some(b));

        // SAFETY: The hook is no longer in the list.
        assert!(!unsafe { b.as_ref() }.is_linked());

        assert_eq!(list.len(), 1);
        assert_eq!(list.pop_front(), Some(a));
        assert_eq!(list.pop_front(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn lifo_order() {
        lifo_order_impl::<SlistHook>();
        lifo_order_impl::<ListHook>();
    }

    fn interleaved_push_pop_impl<H: Hook>() {
        let mut storage = hook_storage::<H>(4);
        let hooks = hook_ptrs(&mut storage);

        let mut list = <H as Hook>::List::default();

        // SAFETY: The hooks are unlinked and the storage outlives the list.
        unsafe {
            list.push_front(hooks[0]);
        }
        // SAFETY: As above.
        unsafe {
            list.push_front(hooks[1]);
        }

        assert_eq!(list.pop_front(), Some(hooks[1]));

        // SAFETY: As above, hooks[1] was unlinked by the pop.
        unsafe {
            list.push_front(hooks[2]);
        }
        // SAFETY: As above.
        unsafe {
            list.push_front(hooks[3]);
        }
        // SAFETY: As above.
        unsafe {
            list.push_front(hooks[1]);
        }

        assert_eq!(list.len(), 4);
        assert_eq!(list.pop_front(), Some(hooks[1]));
        assert_eq!(list.pop_front(), Some(hooks[3]));
        assert_eq!(list.pop_front(), Some(hooks[2]));
        assert_eq!(list.pop_front(), Some(hooks[0]));
        assert!(list.is_empty());
    }

    #[test]
    fn interleaved_push_pop() {
        interleaved_push_pop_impl::<SlistHook>();
        interleaved_push_pop_impl::<ListHook>();
    }

    fn clear_unlinks_everything_impl<H: Hook>() {
        let mut storage = hook_storage::<H>(5);
        let mut list = <H as Hook>::List::default();

        for hook in hook_ptrs(&mut storage) {
            // SAFETY: The hooks are unlinked and the storage outlives the list.
            unsafe {
                list.push_front(hook);
            }
        }

        assert_eq!(list.len(), 5);

        // The hooks are dropped in place here, which would panic if any were still linked.
        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn clear_unlinks_everything() {
        clear_unlinks_everything_impl::<SlistHook>();
        clear_unlinks_everything_impl::<ListHook>();
    }

    #[test]
    fn debug_output_reports_len() {
        let mut storage = hook_storage::<SlistHook>(2);
        let hooks = hook_ptrs(&mut storage);
        let mut list = SinglyLinkedList::default();

        // SAFETY: The hook is unlinked and the storage outlives the list.
        unsafe {
            list.push_front(hooks[0]);
        }

        assert_eq!(format!("{list:?}"), "SinglyLinkedList { len: 1 }");
        assert_eq!(
            format!("{:?}", DoublyLinkedList::default()),
            "DoublyLinkedList { len: 0 }"
        );

        list.clear();
    }
}
