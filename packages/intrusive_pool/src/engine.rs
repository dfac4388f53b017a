use std::any::type_name;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::{fmt, thread};

use tracing::debug;

use crate::{Block, DropPolicy, FreeList, Hook, PoolBuilder, ValueTraits};

/// An object pool of unbounded size that hands out fixed-type objects from blocks of `N` slots.
///
/// The pool is usually used through one of its facades, which pick the storage strategy `V`:
///
/// * [`SlistPool`][1] - items embed a [`SlistHook`][4], vacant slots form a singly-linked list.
/// * [`ListPool`][2] - items embed a [`ListHook`][5], vacant slots form a doubly-linked list.
/// * [`Pool`][3] - any item type, each slot wraps the item next to a [`SlistHook`][4].
///
/// Objects are created with [`new_()`][Self::new_], which returns a pointer to a default-valued
/// object, and destroyed with [`delete_()`][Self::delete_]. Vacant slots are kept in a free list
/// threaded through the slots themselves, so neither operation allocates unless the pool has
/// to grow by another block. The most recently deleted slot is the first to be reused.
///
/// # Resource usage
///
/// The pool starts without any blocks and grows one block of `N` slots at a time when it runs
/// out of vacant slots. It never shrinks. All blocks are released when the pool is dropped,
/// together with any objects that are still live at that point (see [`DropPolicy`]).
///
/// # Out of band access
///
/// The pool never creates references to live objects, so the pointers returned by `new_()` may
/// be freely dereferenced and turned into shared or exclusive references by the caller. They
/// remain valid until passed to `delete_()` or until the pool is dropped.
///
/// # Thread safety
///
/// The pool is [`Send`] if the item type is, and is not [`Sync`]. Wrap it in a `Mutex` to share
/// it between threads.
///
/// # Example
///
/// ```rust
/// use intrusive_pool::Pool;
///
/// let mut pool = Pool::<String, 16>::new();
///
/// let mut greeting = pool.new_();
///
/// // SAFETY: The pointer came from `new_()` and we hold no other reference to the object.
/// unsafe { greeting.as_mut() }.push_str("Hello, pool!");
///
/// assert_eq!(pool.len(), 1);
/// assert_eq!(pool.capacity(), 16);
///
/// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
/// unsafe { pool.delete_(greeting) };
///
/// assert!(pool.is_empty());
/// ```
///
/// [1]: crate::SlistPool
/// [2]: crate::ListPool
/// [3]: crate::Pool
/// [4]: crate::SlistHook
/// [5]: crate::ListHook
pub struct PoolEngine<V: ValueTraits, const N: usize> {
    /// The block allocated by the first growth. Kept apart from the rest because most pools
    /// never need a second block.
    first_block: Option<Block<V::Storage, N>>,

    /// Every block after the first, in allocation order.
    more_blocks: Vec<Block<V::Storage, N>>,

    /// The hooks of all vacant slots. A slot is vacant if and only if its hook is in this list.
    free_list: <V::Hook as Hook>::List,

    /// Number of live objects.
    len: usize,

    drop_policy: DropPolicy,

    _values: PhantomData<V::Value>,
}

impl<V: ValueTraits, const N: usize> PoolEngine<V, N> {
    pub(crate) fn new_inner(drop_policy: DropPolicy) -> Self {
        const {
            assert!(N > 0, "pool blocks must have at least one slot");
        };

        const {
            assert!(
                size_of::<V::Hook>() <= align_of::<V::Storage>(),
                "the free list hook must fit within the alignment of the slot storage"
            );
        };

        Self {
            first_block: None,
            more_blocks: Vec::new(),
            free_list: <V::Hook as Hook>::List::default(),
            len: 0,
            drop_policy,
            _values: PhantomData,
        }
    }

    /// Creates a new pool with the default configuration.
    ///
    /// The pool does not allocate any memory until the first object is created.
    ///
    /// # Example
    ///
    /// ```rust
    /// use intrusive_pool::Pool;
    ///
    /// let pool = Pool::<u64, 32>::new();
    ///
    /// assert_eq!(pool.capacity(), 0);
    /// assert_eq!(pool.block_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::new_inner(DropPolicy::default())
    }

    /// Starts configuring a new pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use intrusive_pool::{DropPolicy, Pool};
    ///
    /// let pool = Pool::<u64, 32>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    /// ```
    pub fn builder() -> PoolBuilder<V, N> {
        PoolBuilder::new()
    }

    /// The number of live objects in the pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use intrusive_pool::Pool;
    ///
    /// let mut pool = Pool::<u32, 4>::new();
    ///
    /// let a = pool.new_();
    /// let b = pool.new_();
    /// assert_eq!(pool.len(), 2);
    ///
    /// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
    /// unsafe { pool.delete_(a) };
    /// assert_eq!(pool.len(), 1);
    /// # // SAFETY: As above.
    /// # unsafe { pool.delete_(b) };
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the pool has no live objects.
    ///
    /// An empty pool may still be holding blocks of vacant slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of objects the pool can hold without allocating another block, including the
    /// objects that are already live.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.block_count()
            .checked_mul(N)
            .expect("overflow here would mean the pool holds more slots than virtual memory can fit")
    }

    /// The number of blocks the pool has allocated so far.
    #[must_use]
    pub fn block_count(&self) -> usize {
        match self.first_block {
            // Cannot overflow because every block occupies at least one byte of memory.
            Some(_) => self.more_blocks.len().wrapping_add(1),
            None => 0,
        }
    }

    /// Allocates blocks until the pool can hold at least `additional` more objects on top of the
    /// live ones without growing. Does nothing if there is already enough capacity.
    ///
    /// # Example
    ///
    /// ```rust
    /// use intrusive_pool::Pool;
    ///
    /// let mut pool = Pool::<u32, 8>::new();
    ///
    /// pool.reserve(20);
    /// assert_eq!(pool.block_count(), 3);
    /// assert_eq!(pool.capacity(), 24);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the required capacity overflows `usize`.
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    pub fn reserve(&mut self, additional: usize) {
        let required_capacity = self
            .len
            .checked_add(additional)
            .expect("capacity overflow: requested capacity exceeds maximum possible value");

        while self.capacity() < required_capacity {
            self.grow();
        }
    }

    /// Creates a new default-valued object in a vacant slot and returns a pointer to it,
    /// allocating another block of `N` slots first if there are no vacant slots.
    ///
    /// The pointer remains valid until it is passed to [`delete_()`][Self::delete_] or the pool
    /// is dropped. The caller is responsible for not creating conflicting references to the
    /// object.
    ///
    /// If `Default::default()` panics, the pool is left exactly as it was.
    ///
    /// # Example
    ///
    /// ```rust
    /// use intrusive_pool::Pool;
    ///
    /// let mut pool = Pool::<Vec<u8>, 4>::new();
    ///
    /// let bytes = pool.new_();
    ///
    /// // SAFETY: The pointer came from `new_()` and nobody is modifying the object.
    /// assert!(unsafe { bytes.as_ref() }.is_empty());
    ///
    /// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
    /// unsafe { pool.delete_(bytes) };
    /// ```
    #[must_use]
    pub fn new_(&mut self) -> NonNull<V::Value>
    where
        V::Value: Default,
    {
        // Before touching any slot, so a panic here leaves no trace.
        let value = <V::Value as Default>::default();

        if self.free_list.is_empty() {
            self.grow();
        }

        let hook = self
            .free_list
            .pop_front()
            .expect("free list cannot be empty right after growing the pool");

        // SAFETY: Every hook in the free list was obtained from `to_hook()` on one of our slots.
        let storage = unsafe { V::from_hook(hook) };

        // SAFETY: The slot belongs to one of our blocks.
        let value_ptr = unsafe { V::to_value(storage) };

        // Writing the value either overwrites the hook with the unlinked hook the value carries
        // or leaves the hook unlinked next to the value. Unlinked hooks own nothing, so there is
        // nothing to drop before overwriting one.
        //
        // SAFETY: The slot is vacant and nobody else is accessing it.
        unsafe {
            value_ptr.write(value);
        }

        // Cannot overflow because every live object occupies at least one byte of memory.
        self.len = self.len.wrapping_add(1);

        value_ptr
    }

    /// Drops the object and returns its slot to the front of the free list, so the next call to
    /// [`new_()`][Self::new_] reuses it.
    ///
    /// The slot is returned to the free list even if dropping the object panics.
    ///
    /// # Example
    ///
    /// ```rust
    /// use intrusive_pool::Pool;
    ///
    /// let mut pool = Pool::<u32, 4>::new();
    ///
    /// let first = pool.new_();
    ///
    /// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
    /// unsafe { pool.delete_(first) };
    ///
    /// let second = pool.new_();
    /// assert_eq!(first, second);
    /// # // SAFETY: As above.
    /// # unsafe { pool.delete_(second) };
    /// ```
    ///
    /// # Safety
    ///
    /// The pointer must have been returned by `new_()` on this pool and must not have been
    /// passed to `delete_()` since. No references to the object may exist and the pointer must
    /// not be used after this call.
    pub unsafe fn delete_(&mut self, value: NonNull<V::Value>) {
        // SAFETY: The caller guarantees the pointer came from `new_()` on this pool.
        let storage = unsafe { V::to_storage(value) };

        debug_assert!(
            self.owns_slot(storage),
            "pointer passed to delete_() does not belong to this pool of {}",
            type_name::<V::Value>()
        );

        // SAFETY: The slot belongs to one of our blocks.
        let hook = unsafe { V::to_hook(storage) };

        debug_assert!(
            // SAFETY: Every slot always holds an initialized hook at its hook position.
            !unsafe { hook.as_ref() }.is_linked(),
            "pointer passed to delete_() refers to a vacant slot in pool of {}",
            type_name::<V::Value>()
        );

        self.len = self
            .len
            .checked_sub(1)
            .expect("delete_() called on a pool without live objects");

        let free_list = &mut self.free_list;

        // Runs whether or not the destructor panics, so the slot always ends up vacant.
        let _relink = scopeguard::guard(hook, |hook| {
            // SAFETY: The hook position is within a slot we own, whose previous contents have
            // been dropped, so it is valid for writes and holds nothing that needs dropping.
            unsafe {
                hook.write(<V::Hook as Hook>::unlinked());
            }

            // SAFETY: The hook is initialized, unlinked and lives in one of our blocks, which
            // stay in place until the pool is dropped.
            unsafe {
                free_list.push_front(hook);
            }
        });

        // SAFETY: The caller guarantees the object is live and no longer referenced.
        unsafe {
            value.drop_in_place();
        }
    }

    /// Allocates one more block and links all its slots into the free list, lowest address
    /// at the front.
    fn grow(&mut self) {
        let block = Block::<V::Storage, N>::new();
        let slots = block.slot_ptrs();

        // The block is stored before any of its hooks are linked, so that the free list never
        // points into memory the pool does not own.
        match self.first_block {
            None => self.first_block = Some(block),
            Some(_) => self.more_blocks.push(block),
        }

        for storage in slots.rev() {
            // SAFETY: The slot belongs to the block we just allocated.
            let hook = unsafe { V::to_hook(storage) };

            // SAFETY: The slot is freshly allocated and not yet initialized, so it is valid for
            // writes and there is nothing to drop.
            unsafe {
                hook.write(<V::Hook as Hook>::unlinked());
            }

            // SAFETY: The hook is initialized, unlinked and lives in one of our blocks, which
            // stay in place until the pool is dropped.
            unsafe {
                self.free_list.push_front(hook);
            }
        }

        debug!(
            item_type = type_name::<V::Value>(),
            block_size = N,
            blocks = self.block_count(),
            "allocated pool block"
        );

        if cfg!(debug_assertions) {
            self.integrity_check();
        }
    }

    fn blocks(&self) -> impl Iterator<Item = &Block<V::Storage, N>> {
        self.first_block.iter().chain(&self.more_blocks)
    }

    fn owns_slot(&self, storage: NonNull<V::Storage>) -> bool {
        self.blocks().any(|block| block.contains(storage))
    }

    /// Drops the object in the slot if the slot is occupied, leaving vacant slots alone.
    ///
    /// # Safety
    ///
    /// The slot must belong to one of the pool's blocks and nobody may access the object in it
    /// after this call.
    unsafe fn drop_if_occupied(storage: NonNull<V::Storage>) {
        // SAFETY: Forwarding the caller's guarantee that the slot belongs to one of our blocks.
        let hook = unsafe { V::to_hook(storage) };

        // SAFETY: Every slot always holds an initialized hook at its hook position.
        if unsafe { hook.as_ref() }.is_linked() {
            return;
        }

        // SAFETY: An unlinked hook means the slot holds a live object, which the caller
        // guarantees nobody accesses anymore.
        unsafe {
            storage.drop_in_place();
        }
    }

    /// Walks every slot and the free list, verifying that they agree with each other and with
    /// the live object count.
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    pub(crate) fn integrity_check(&self) {
        let mut linked_slots: usize = 0;

        for block in self.blocks() {
            for storage in block.slot_ptrs() {
                // SAFETY: The slot belongs to one of our blocks.
                let hook = unsafe { V::to_hook(storage) };

                // SAFETY: Every slot always holds an initialized hook at its hook position.
                if unsafe { hook.as_ref() }.is_linked() {
                    // Cannot overflow because every slot occupies at least one byte of memory.
                    linked_slots = linked_slots.wrapping_add(1);
                }
            }
        }

        let free_list_len = self.free_list.len();

        assert_eq!(
            linked_slots,
            free_list_len,
            "pool of {} has linked hooks that are not reachable from the free list",
            type_name::<V::Value>()
        );

        assert_eq!(
            self.len.checked_add(free_list_len),
            Some(self.capacity()),
            "pool of {} has {} live objects and {free_list_len} vacant slots but {} slots in total",
            type_name::<V::Value>(),
            self.len,
            self.capacity()
        );
    }
}

impl<V: ValueTraits, const N: usize> Default for PoolEngine<V, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ValueTraits, const N: usize> fmt::Debug for PoolEngine<V, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolEngine")
            .field("item_type", &format_args!("{}", type_name::<V::Value>()))
            .field("block_size", &N)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("blocks", &self.block_count())
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<V: ValueTraits, const N: usize> Drop for PoolEngine<V, N> {
    fn drop(&mut self) {
        let live = self.len;

        {
            let slots = self
                .first_block
                .iter()
                .chain(&self.more_blocks)
                .flat_map(Block::slot_ptrs);

            let free_list = &mut self.free_list;

            // Also runs when an object's destructor panics below, so the remaining objects are
            // still dropped and the vacant hooks still unlinked.
            let mut remaining = scopeguard::guard(slots, |remaining| {
                for storage in remaining {
                    // SAFETY: The slot belongs to one of our blocks and the pool is going away.
                    unsafe {
                        Self::drop_if_occupied(storage);
                    }
                }

                free_list.clear();
            });

            for storage in &mut *remaining {
                // SAFETY: The slot belongs to one of our blocks and the pool is going away.
                unsafe {
                    Self::drop_if_occupied(storage);
                }
            }
        }

        self.len = 0;

        if live > 0 {
            debug!(
                item_type = type_name::<V::Value>(),
                live,
                blocks = self.block_count(),
                "dropped pool with live objects"
            );
        }

        // Release the memory before we check the drop policy, so a panic does not leak it.
        self.first_block = None;
        self.more_blocks.clear();

        if self.drop_policy == DropPolicy::MustNotDropItems && !thread::panicking() {
            assert!(
                live == 0,
                "dropped a pool of {} with {live} live objects, with a policy that says it must be empty when dropped",
                type_name::<V::Value>()
            );
        }
    }
}

// SAFETY: The pool exclusively owns its blocks, the objects in them and the hooks linking the
// vacant slots, so moving the pool to another thread moves all of that along with it. The only
// thing that crosses threads with it is the objects, hence the requirement on `V::Value`.
unsafe impl<V, const N: usize> Send for PoolEngine<V, N>
where
    V: ValueTraits,
    V::Value: Send,
{
}
