//! A block-growing object pool for objects of one type, with the free list of vacant slots
//! threaded through the slots themselves.
//!
//! The pool hands out raw pointers to default-valued objects and takes them back for reuse.
//! Memory is requested from the allocator one block of `N` slots at a time and is only released
//! when the pool itself is dropped, so creating and deleting objects is allocation-free in the
//! steady state.
//!
//! # Key Features
//!
//! - **No per-slot bookkeeping**: Vacant slots are linked into a free list through a hook that
//!   lives inside the slot, so no side tables are needed
//! - **Stable addresses**: Objects never move while they are live
//! - **Most recently freed first**: The slot of the last deleted object is the next one reused
//! - **Cleanup on drop**: Dropping the pool drops every object that is still live, exactly once
//! - **Flexible drop policies**: Optionally treat live objects at pool drop as a bug
//! - **Thread mobility**: The pool can be moved between threads (but not shared without
//!   synchronization)
//!
//! # Pool Types
//!
//! The [`PoolEngine`] is parameterized by a [storage strategy][ValueTraits] that decides where the
//! hook lives. Three ready-made combinations are provided:
//!
//! - [`SlistPool<T, N>`] - `T` embeds a [`SlistHook`]. Slots have no overhead.
//! - [`ListPool<T, N>`] - `T` embeds a [`ListHook`]. Slots have no overhead.
//! - [`Pool<T, N>`] - any `T`, wrapped in a [`Boxed<T>`] slot that adds a [`SlistHook`].
//!
//! # Examples
//!
//! ## Pooling any type
//!
//! ```rust
//! use intrusive_pool::Pool;
//!
//! let mut pool = Pool::<Vec<u32>, 64>::new();
//!
//! let mut numbers = pool.new_();
//!
//! // SAFETY: The pointer came from `new_()` and we hold no other reference to the object.
//! unsafe { numbers.as_mut() }.extend([1, 2, 3]);
//!
//! // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
//! unsafe { pool.delete_(numbers) };
//!
//! // The slot is reused, holding a fresh default value.
//! let numbers = pool.new_();
//!
//! // SAFETY: The pointer came from `new_()` and nobody is modifying the object.
//! assert!(unsafe { numbers.as_ref() }.is_empty());
//! ```
//!
//! ## Embedding the hook
//!
//! ```rust
//! use std::mem::offset_of;
//!
//! use intrusive_pool::{Embedded, SlistHook, SlistPool};
//!
//! #[derive(Default)]
//! struct Connection {
//!     hook: SlistHook,
//!     bytes_sent: u64,
//! }
//!
//! // SAFETY: The offset is that of a `SlistHook` field of `Connection`.
//! unsafe impl Embedded<SlistHook> for Connection {
//!     const HOOK_OFFSET: usize = offset_of!(Connection, hook);
//! }
//!
//! let mut pool = SlistPool::<Connection, 16>::new();
//!
//! let connections: Vec<_> = (0..20).map(|_| pool.new_()).collect();
//! assert_eq!(pool.block_count(), 2);
//!
//! // Objects still live when the pool is dropped are dropped with it.
//! drop(pool);
//! # drop(connections);
//! ```

mod block;
mod builder;
mod drop_policy;
mod engine;
mod facades;
mod free_list;
mod hook;
mod value_traits;

pub(crate) use block::*;
pub use builder::*;
pub use drop_policy::*;
pub use engine::*;
pub use facades::*;
pub use free_list::*;
pub use hook::*;
pub use value_traits::*;
