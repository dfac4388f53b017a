/// Determines what happens to objects that are still live when the pool is dropped.
///
/// By default, the pool drops them.
///
/// # Examples
///
/// ```
/// use intrusive_pool::{DropPolicy, Pool};
///
/// // The drop policy is set at pool creation time.
/// let pool = Pool::<u32, 16>::builder()
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool drops any live objects when it is dropped. This is the default.
    #[default]
    MayDropItems,

    /// The pool panics if it still contains live objects when it is dropped.
    ///
    /// This may be valuable when the pointers handed out by the pool are stored in other data
    /// structures and it is a bug for the pool to go away before every object was returned.
    MustNotDropItems,
}
