//! Basic usage of the `intrusive_pool` crate:
//!
//! * Creating a pool.
//! * Creating objects.
//! * Modifying objects through the returned pointers.
//! * Deleting objects and reusing their slots.

use intrusive_pool::Pool;

fn main() {
    // Any type with a `Default` implementation can be pooled. Slots are allocated in blocks of 8.
    let mut pool = Pool::<String, 8>::new();

    // Creating an object gives you a pointer to a default-valued object in the pool.
    let mut alice = pool.new_();
    let mut bob = pool.new_();
    let _charlie = pool.new_();

    // SAFETY: The pointer came from `new_()` and we hold no other reference to the object.
    unsafe { alice.as_mut() }.push_str("Alice");
    // SAFETY: As above.
    unsafe { bob.as_mut() }.push_str("Bob");

    println!(
        "Object pool contains {} items, with a capacity of {} in {} block(s)",
        pool.len(),
        pool.capacity(),
        pool.block_count()
    );

    // SAFETY: The pointer came from `new_()` and nobody is modifying the object.
    println!("Created item: {}", unsafe { alice.as_ref() });

    // Deleting an object drops it and puts its slot at the front of the free list.
    // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
    unsafe {
        pool.delete_(bob);
    }

    // So the next object lands exactly where `bob` used to be.
    let dave = pool.new_();
    println!("Slot of deleted item was reused: {}", dave == bob);

    // SAFETY: The pointer came from `new_()` and nobody is modifying the object.
    println!("Reused slot holds a fresh value: {:?}", unsafe { dave.as_ref() });

    // Objects that are still live when the pool is dropped are dropped together with it.
    println!("Dropping pool with {} live items", pool.len());
    drop(pool);

    // The remaining pointers are dangling now and must not be used.
}
