use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use crate::{DropPolicy, PoolEngine, ValueTraits};

/// Builder for creating an instance of a pool.
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`PoolEngine::new()`][1] is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use intrusive_pool::{DropPolicy, Pool};
///
/// let pool = Pool::<String, 32>::builder()
///     .drop_policy(DropPolicy::MayDropItems)
///     .build();
/// ```
///
/// [1]: PoolEngine::new
#[must_use]
pub struct PoolBuilder<V, const N: usize> {
    drop_policy: DropPolicy,

    _strategy: PhantomData<fn() -> V>,
}

impl<V, const N: usize> fmt::Debug for PoolBuilder<V, N>
where
    V: ValueTraits,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("item_type", &format_args!("{}", type_name::<V::Value>()))
            .field("block_size", &N)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<V, const N: usize> PoolBuilder<V, N>
where
    V: ValueTraits,
{
    pub(crate) fn new() -> Self {
        Self {
            drop_policy: DropPolicy::default(),
            _strategy: PhantomData,
        }
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how to treat objects that
    /// are still live when the pool is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_pool::{DropPolicy, Pool};
    ///
    /// let pool = Pool::<u64, 8>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    /// ```
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// The pool starts without any blocks. The first block is allocated by the first call to
    /// [`new_()`][PoolEngine::new_] or [`reserve()`][PoolEngine::reserve].
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_pool::Pool;
    ///
    /// let pool = Pool::<u64, 8>::builder().build();
    /// assert_eq!(pool.capacity(), 0);
    /// ```
    #[must_use]
    pub fn build(self) -> PoolEngine<V, N> {
        PoolEngine::new_inner(self.drop_policy)
    }
}
