use std::marker::PhantomData;
use std::mem::offset_of;
use std::ptr::NonNull;

use crate::{Hook, SlistHook};

/// The storage strategy of a pool: converts between the storage of a slot, the item stored in
/// the slot and the hook that links the slot into the free list while it is vacant.
///
/// Two strategies are provided:
///
/// * [`Embedding`] - the item type embeds its own hook, so a slot is just the item.
/// * [`Boxing`] - each slot wraps the item in a [`Boxed`] that adds a hook next to it.
///
/// All conversions are pointer arithmetic by offsets known at compile time. None of them read
/// or write the memory they point to.
///
/// # Safety
///
/// Implementations must guarantee that:
///
/// * `to_value()` and `to_storage()` are inverse to each other, as are `to_hook()` and
///   `from_hook()`.
/// * The value and the hook both lie entirely within the storage.
/// * After a `Value` is written to the value position of a slot whose hook is unlinked, the hook
///   position still holds an initialized, unlinked hook. Either the value carries its own
///   unlinked hook at that position or the hook lies outside the value.
/// * Dropping the storage of an occupied slot in place drops the value exactly once and
///   otherwise only drops an unlinked hook.
pub unsafe trait ValueTraits {
    /// The item type handed out by the pool.
    type Value;

    /// The type each slot stores.
    type Storage;

    /// The hook that links vacant slots into the free list.
    type Hook: Hook;

    /// Converts a slot pointer to a pointer to the value position within the slot.
    ///
    /// # Safety
    ///
    /// The pointer must point to memory allocated for a `Storage`, initialized or not.
    unsafe fn to_value(storage: NonNull<Self::Storage>) -> NonNull<Self::Value>;

    /// Converts a value pointer back to a pointer to the slot that holds the value.
    ///
    /// # Safety
    ///
    /// The pointer must have been obtained from [`to_value()`][Self::to_value].
    unsafe fn to_storage(value: NonNull<Self::Value>) -> NonNull<Self::Storage>;

    /// Converts a slot pointer to a pointer to the hook position within the slot.
    ///
    /// # Safety
    ///
    /// The pointer must point to memory allocated for a `Storage`, initialized or not.
    unsafe fn to_hook(storage: NonNull<Self::Storage>) -> NonNull<Self::Hook>;

    /// Converts a hook pointer back to a pointer to the slot that holds the hook.
    ///
    /// # Safety
    ///
    /// The pointer must have been obtained from [`to_hook()`][Self::to_hook].
    unsafe fn from_hook(hook: NonNull<Self::Hook>) -> NonNull<Self::Storage>;
}

/// An item type that embeds a free list hook of type `H`, enabling it to be stored in a pool
/// without any per-slot overhead.
///
/// # Example
///
/// ```rust
/// use std::mem::offset_of;
///
/// use intrusive_pool::{Embedded, SlistHook, SlistPool};
///
/// #[derive(Default)]
/// struct Particle {
///     hook: SlistHook,
///     position: [f32; 3],
/// }
///
/// // SAFETY: The offset is that of a `SlistHook` field of `Particle`.
/// unsafe impl Embedded<SlistHook> for Particle {
///     const HOOK_OFFSET: usize = offset_of!(Particle, hook);
/// }
///
/// let mut pool = SlistPool::<Particle, 64>::new();
///
/// let mut particle = pool.new_();
///
/// // SAFETY: The pointer came from `new_()` and we hold no other reference to the particle.
/// unsafe { particle.as_mut() }.position = [1.0, 2.0, 3.0];
///
/// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
/// unsafe { pool.delete_(particle) };
/// ```
///
/// A `HOOK_OFFSET` that places the hook outside of the item type is rejected at compile time:
///
/// ```compile_fail
/// use intrusive_pool::{Embedded, SlistHook, SlistPool};
///
/// #[derive(Default)]
/// struct Misplaced {
///     hook: SlistHook,
///     value: u64,
/// }
///
/// // SAFETY: Not actually safe, the offset points past the end of `Misplaced`.
/// unsafe impl Embedded<SlistHook> for Misplaced {
///     const HOOK_OFFSET: usize = size_of::<Misplaced>();
/// }
///
/// let mut pool = SlistPool::<Misplaced, 4>::new();
/// let misplaced = pool.new_();
///
/// // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
/// unsafe { pool.delete_(misplaced) };
/// ```
///
/// # Safety
///
/// `HOOK_OFFSET` must be the byte offset of a field of type `H` within `Self`.
pub unsafe trait Embedded<H: Hook>: Sized {
    /// Byte offset of the hook field within `Self`, as given by [`offset_of!`].
    const HOOK_OFFSET: usize;
}

/// Storage strategy for item types that embed their own hook (see [`Embedded`]).
///
/// Each slot is exactly one `T`. While the slot is vacant only the hook field of the `T` is
/// initialized. While it is occupied the whole `T` is, including its own (unlinked) hook.
#[derive(Debug)]
pub struct Embedding<T, H> {
    _marker: PhantomData<(fn() -> T, fn() -> H)>,
}

// SAFETY: Value and storage are the same type, so the value conversions are identity. The hook
// conversions move by `HOOK_OFFSET`, which the `Embedded` contract places on a hook field and
// which we check below to lie within `T`. Every `T` value carries an unlinked hook because only
// the free list ever links a hook, so writing a `T` leaves an unlinked hook in place.
unsafe impl<T, H> ValueTraits for Embedding<T, H>
where
    T: Embedded<H>,
    H: Hook,
{
    type Value = T;
    type Storage = T;
    type Hook = H;

    #[inline]
    unsafe fn to_value(storage: NonNull<T>) -> NonNull<T> {
        storage
    }

    #[inline]
    unsafe fn to_storage(value: NonNull<T>) -> NonNull<T> {
        value
    }

    #[inline]
    unsafe fn to_hook(storage: NonNull<T>) -> NonNull<H> {
        const {
            assert!(
                matches!(T::HOOK_OFFSET.checked_add(size_of::<H>()), Some(end) if end <= size_of::<T>()),
                "embedded hook must lie within the item type"
            );
        };

        // SAFETY: The caller guarantees that the pointer points to memory allocated for a `T`,
        // and the assertion above guarantees the hook lies within it.
        unsafe { storage.byte_add(T::HOOK_OFFSET) }.cast()
    }

    #[inline]
    unsafe fn from_hook(hook: NonNull<H>) -> NonNull<T> {
        // SAFETY: The caller guarantees the hook pointer came from `to_hook()`, so moving back
        // by the same offset lands on the start of the same `T`.
        unsafe { hook.byte_sub(T::HOOK_OFFSET) }.cast()
    }
}

/// A pool slot that places a [`SlistHook`] next to an item of any type.
///
/// This is the slot storage of the [`Boxing`] strategy, used by [`Pool`][crate::Pool]. It costs
/// one hook (plus padding to the alignment of `T`) per slot but requires nothing from `T`.
#[derive(Debug)]
#[repr(C)]
pub struct Boxed<T> {
    hook: SlistHook,
    value: T,
}

/// Storage strategy that wraps each item in a [`Boxed`], so any type can be pooled.
#[derive(Debug)]
pub struct Boxing<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Boxing<T> {
    const VALUE_OFFSET: usize = offset_of!(Boxed<T>, value);
    const HOOK_OFFSET: usize = offset_of!(Boxed<T>, hook);
}

// SAFETY: Both conversions pairs project a field of `Boxed<T>` and move back by the offset of the
// same field. The hook and the value are separate fields, so writing a value never touches the
// hook, which stays unlinked. Dropping a `Boxed<T>` drops the value and the unlinked hook.
unsafe impl<T> ValueTraits for Boxing<T> {
    type Value = T;
    type Storage = Boxed<T>;
    type Hook = SlistHook;

    #[inline]
    unsafe fn to_value(storage: NonNull<Boxed<T>>) -> NonNull<T> {
        // SAFETY: The caller guarantees that the pointer points to memory allocated for a
        // `Boxed<T>`. Taking the address of a field does not read the memory.
        let value_ptr = unsafe { &raw mut (*storage.as_ptr()).value };

        // SAFETY: A field of a non-null allocation is not null.
        let value = unsafe { NonNull::new_unchecked(value_ptr) };

        debug_assert_eq!(
            // SAFETY: The value pointer was just obtained from a slot pointer.
            unsafe { Self::to_storage(value) },
            storage,
            "Boxed<T> layout does not round-trip between slot and value"
        );

        value
    }

    #[inline]
    unsafe fn to_storage(value: NonNull<T>) -> NonNull<Boxed<T>> {
        // SAFETY: The caller guarantees the value pointer came from `to_value()`, so it points
        // `VALUE_OFFSET` bytes into a `Boxed<T>`.
        unsafe { value.byte_sub(Self::VALUE_OFFSET) }.cast()
    }

    #[inline]
    unsafe fn to_hook(storage: NonNull<Boxed<T>>) -> NonNull<SlistHook> {
        // SAFETY: The caller guarantees that the pointer points to memory allocated for a
        // `Boxed<T>`. Taking the address of a field does not read the memory.
        let hook_ptr = unsafe { &raw mut (*storage.as_ptr()).hook };

        // SAFETY: A field of a non-null allocation is not null.
        unsafe { NonNull::new_unchecked(hook_ptr) }
    }

    #[inline]
    unsafe fn from_hook(hook: NonNull<SlistHook>) -> NonNull<Boxed<T>> {
        // SAFETY: The caller guarantees the hook pointer came from `to_hook()`, so it points
        // `HOOK_OFFSET` bytes into a `Boxed<T>`.
        unsafe { hook.byte_sub(Self::HOOK_OFFSET) }.cast()
    }
}
