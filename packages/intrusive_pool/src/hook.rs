use std::fmt;
use std::ptr::NonNull;

use crate::{DoublyLinkedList, FreeList, SinglyLinkedList};

/// Link fields that allow a vacant pool slot to be threaded into a free list.
///
/// A hook is either linked (it is part of a free list and its slot is vacant) or unlinked. The
/// pool relies on the link state to tell vacant slots from occupied ones when it is dropped, so
/// every slot always holds an initialized hook at its hook position.
///
/// # Safety
///
/// [`unlinked()`][Self::unlinked] must return a hook for which [`is_linked()`][Self::is_linked]
/// is `false`. The only way for a hook to become linked must be to be pushed into its
/// [`List`][Self::List], and the hook must become unlinked again when popped from it.
pub unsafe trait Hook: Sized {
    /// The free list discipline that threads through this type of hook.
    type List: FreeList<Self>;

    /// Creates a hook that is not part of any list.
    #[must_use]
    fn unlinked() -> Self;

    /// Whether the hook is currently part of a free list.
    #[must_use]
    fn is_linked(&self) -> bool;
}

/// A single-pointer hook for a singly-linked free list.
///
/// Embed this in an item type (see [`Embedded`][crate::Embedded]) to use it with a
/// [`SlistPool`][crate::SlistPool]. The boxed [`Pool`][crate::Pool] adds one of these next to
/// each item.
///
/// A freshly created hook is always unlinked and only the pool can link it, so any value of an
/// item type carries an unlinked hook.
///
/// # Example
///
/// ```rust
/// use intrusive_pool::{Hook, SlistHook};
///
/// let hook = SlistHook::new();
/// assert!(!hook.is_linked());
/// ```
pub struct SlistHook {
    /// `None` while unlinked. The last hook in a list links to itself.
    next: Option<NonNull<SlistHook>>,
}

impl SlistHook {
    /// Creates an unlinked hook.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: None }
    }

    pub(crate) fn next(&self) -> Option<NonNull<Self>> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<NonNull<Self>>) {
        self.next = next;
    }
}

impl Default for SlistHook {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: `new()` leaves `next` empty and only `SinglyLinkedList` ever fills it in,
// clearing it again when the hook is popped.
unsafe impl Hook for SlistHook {
    type List = SinglyLinkedList;

    fn unlinked() -> Self {
        Self::new()
    }

    fn is_linked(&self) -> bool {
        self.next.is_some()
    }
}

impl Drop for SlistHook {
    fn drop(&mut self) {
        debug_assert!(
            !self.is_linked(),
            "SlistHook dropped while still linked into a free list"
        );
    }
}

impl fmt::Debug for SlistHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlistHook")
            .field("is_linked", &self.is_linked())
            .finish()
    }
}

// SAFETY: The pointer is only dereferenced by the free list that owns a linked hook, under an
// exclusive reference to the pool. An unlinked hook (the only kind users can reach) is inert.
unsafe impl Send for SlistHook {}

// SAFETY: Shared access only reads the link state; see `Send` above.
unsafe impl Sync for SlistHook {}

/// A two-pointer hook for a doubly-linked free list.
///
/// Embed this in an item type (see [`Embedded`][crate::Embedded]) to use it with a
/// [`ListPool`][crate::ListPool]. The hook is two pointers wide and must fit within the
/// alignment of the item type, so item types usually need `#[repr(align(16))]` on 64-bit
/// targets.
pub struct ListHook {
    /// `None` while unlinked. The first hook in a list links back to itself.
    prev: Option<NonNull<ListHook>>,

    /// `None` while unlinked. The last hook in a list links to itself.
    next: Option<NonNull<ListHook>>,
}

impl ListHook {
    /// Creates an unlinked hook.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prev: None,
            next: None,
        }
    }

    pub(crate) fn prev(&self) -> Option<NonNull<Self>> {
        self.prev
    }

    pub(crate) fn next(&self) -> Option<NonNull<Self>> {
        self.next
    }

    pub(crate) fn set_links(&mut self, prev: Option<NonNull<Self>>, next: Option<NonNull<Self>>) {
        self.prev = prev;
        self.next = next;
    }

    pub(crate) fn set_prev(&mut self, prev: Option<NonNull<Self>>) {
        self.prev = prev;
    }
}

impl Default for ListHook {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: `new()` leaves both links empty and only `DoublyLinkedList` ever fills them in,
// clearing them again when the hook is popped.
unsafe impl Hook for ListHook {
    type List = DoublyLinkedList;

    fn unlinked() -> Self {
        Self::new()
    }

    fn is_linked(&self) -> bool {
        self.next.is_some()
    }
}

impl Drop for ListHook {
    fn drop(&mut self) {
        debug_assert!(
            !self.is_linked(),
            "ListHook dropped while still linked into a free list"
        );
    }
}

impl fmt::Debug for ListHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListHook")
            .field("is_linked", &self.is_linked())
            .finish()
    }
}

// SAFETY: Same reasoning as for `SlistHook`.
unsafe impl Send for ListHook {}

// SAFETY: Same reasoning as for `SlistHook`.
unsafe impl Sync for ListHook {}

#[cfg(test)]
mod tests {
    use static_assertions::{assert_eq_size, assert_impl_all};

    use super::*;

    assert_impl_all!(SlistHook: Send, Sync, Default, fmt::Debug);
    assert_impl_all!(ListHook: Send, Sync, Default, fmt::Debug);

    assert_eq_size!(SlistHook, usize);
    assert_eq_size!(ListHook, [usize; 2]);

    #[test]
    fn new_hooks_are_unlinked() {
        assert!(!SlistHook::new().is_linked());
        assert!(!SlistHook::default().is_linked());
        assert!(!<SlistHook as Hook>::unlinked().is_linked());

        assert!(!ListHook::new().is_linked());
        assert!(!ListHook::default().is_linked());
        assert!(!<ListHook as Hook>::unlinked().is_linked());
    }

    #[test]
    fn debug_output_reports_link_state() {
        assert_eq!(
            format!("{:?}", SlistHook::new()),
            "SlistHook { is_linked: false }"
        );
        assert_eq!(
            format!("{:?}", ListHook::new()),
            "ListHook { is_linked: false }"
        );
    }
}
