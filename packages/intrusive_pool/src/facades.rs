use crate::{Boxing, Embedding, ListHook, PoolEngine, SlistHook};

/// A pool of items that embed a [`SlistHook`], with vacant slots kept in a singly-linked free
/// list. Each slot is exactly one `T`, without any overhead.
///
/// `T` must implement [`Embedded<SlistHook>`][crate::Embedded].
///
/// # Example
///
/// ```rust
/// use std::mem::offset_of;
///
/// use intrusive_pool::{Embedded, SlistHook, SlistPool};
///
/// #[derive(Default)]
/// struct Request {
///     hook: SlistHook,
///     id: u64,
/// }
///
/// // SAFETY: The offset is that of a `SlistHook` field of `Request`.
/// unsafe impl Embedded<SlistHook> for Request {
///     const HOOK_OFFSET: usize = offset_of!(Request, hook);
/// }
///
/// let mut pool = SlistPool::<Request, 128>::new();
///
/// let mut request = pool.new_();
///
/// // SAFETY: The pointer came from `new_()` and we hold no other reference to the request.
/// unsafe { request.as_mut() }.id = 7;
///
/// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
/// unsafe { pool.delete_(request) };
/// ```
pub type SlistPool<T, const N: usize> = PoolEngine<Embedding<T, SlistHook>, N>;

/// A pool of items that embed a [`ListHook`], with vacant slots kept in a doubly-linked free
/// list. Each slot is exactly one `T`, without any overhead.
///
/// `T` must implement [`Embedded<ListHook>`][crate::Embedded]. The hook is two pointers wide and
/// must fit within the alignment of `T`, which usually calls for `#[repr(align(16))]`.
///
/// # Example
///
/// ```rust
/// use std::mem::offset_of;
///
/// use intrusive_pool::{Embedded, ListHook, ListPool};
///
/// #[derive(Default)]
/// #[repr(align(16))]
/// struct Timer {
///     deadline_ms: u64,
///     hook: ListHook,
/// }
///
/// // SAFETY: The offset is that of a `ListHook` field of `Timer`.
/// unsafe impl Embedded<ListHook> for Timer {
///     const HOOK_OFFSET: usize = offset_of!(Timer, hook);
/// }
///
/// let mut pool = ListPool::<Timer, 32>::new();
///
/// let timer = pool.new_();
///
/// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
/// unsafe { pool.delete_(timer) };
/// ```
///
/// An item type whose alignment is smaller than the hook is rejected when the pool is built:
///
/// ```compile_fail
/// use std::mem::offset_of;
///
/// use intrusive_pool::{Embedded, ListHook, ListPool};
///
/// #[derive(Default)]
/// struct Narrow {
///     hook: ListHook,
///     value: u64,
/// }
///
/// // SAFETY: The offset is that of a `ListHook` field of `Narrow`.
/// unsafe impl Embedded<ListHook> for Narrow {
///     const HOOK_OFFSET: usize = offset_of!(Narrow, hook);
/// }
///
/// // The 16-byte hook does not fit within the 8-byte alignment of `Narrow`.
/// let mut pool = ListPool::<Narrow, 4>::new();
/// let narrow = pool.new_();
///
/// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
/// unsafe { pool.delete_(narrow) };
/// ```
pub type ListPool<T, const N: usize> = PoolEngine<Embedding<T, ListHook>, N>;

/// A pool of items of any type, each stored in a [`Boxed`][crate::Boxed] slot that adds a
/// [`SlistHook`] next to the item. Vacant slots are kept in a singly-linked free list.
///
/// # Example
///
/// ```rust
/// use intrusive_pool::Pool;
///
/// let mut pool = Pool::<[u8; 64], 16>::new();
///
/// let buffer = pool.new_();
///
/// // SAFETY: The pointer came from `new_()` and nobody is modifying the buffer.
/// assert_eq!(unsafe { buffer.as_ref() }, &[0; 64]);
///
/// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
/// unsafe { pool.delete_(buffer) };
/// ```
pub type Pool<T, const N: usize> = PoolEngine<Boxing<T>, N>;
