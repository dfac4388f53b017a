//! Pooling types that embed their own free list hook:
//!
//! * Embedding a `SlistHook` to use a `SlistPool`.
//! * Embedding a `ListHook` to use a `ListPool`.
//! * Comparing the slot size against the boxed `Pool`.

use std::mem::offset_of;

use intrusive_pool::{Boxed, Embedded, ListHook, ListPool, SlistHook, SlistPool};

/// A packet buffer that can live in a `SlistPool`.
struct Packet {
    hook: SlistHook,
    len: usize,
    payload: [u8; 48],
}

// `[u8; 48]` does not implement `Default`, so this cannot be derived.
impl Default for Packet {
    fn default() -> Self {
        Self {
            hook: SlistHook::default(),
            len: 0,
            payload: [0; 48],
        }
    }
}

// SAFETY: The offset is that of a `SlistHook` field of `Packet`.
unsafe impl Embedded<SlistHook> for Packet {
    const HOOK_OFFSET: usize = offset_of!(Packet, hook);
}

/// A timer entry that can live in a `ListPool`. The two-pointer hook must fit within the
/// alignment of the type, hence the alignment attribute.
#[derive(Default)]
#[repr(align(16))]
struct Timer {
    deadline_ms: u64,
    hook: ListHook,
}

// SAFETY: The offset is that of a `ListHook` field of `Timer`.
unsafe impl Embedded<ListHook> for Timer {
    const HOOK_OFFSET: usize = offset_of!(Timer, hook);
}

fn main() {
    let mut packets = SlistPool::<Packet, 64>::new();

    let mut packet = packets.new_();

    // SAFETY: The pointer came from `new_()` and we hold no other reference to the object.
    let packet_ref = unsafe { packet.as_mut() };
    for (byte, value) in packet_ref.payload.iter_mut().zip(b"hello") {
        *byte = *value;
        packet_ref.len = packet_ref.len.wrapping_add(1);
    }

    println!(
        "Packet contents: {}",
        String::from_utf8_lossy(packet_ref.payload.get(..packet_ref.len).unwrap_or_default())
    );

    println!(
        "Packet slots take {} bytes, in a boxed pool slot a packet would take {} bytes",
        size_of::<Packet>(),
        size_of::<Boxed<Packet>>()
    );

    // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
    unsafe {
        packets.delete_(packet);
    }

    let mut timers = ListPool::<Timer, 16>::new();

    let deadlines = [250, 100, 400];
    let mut scheduled = Vec::new();

    for deadline_ms in deadlines {
        let mut timer = timers.new_();

        // SAFETY: The pointer came from `new_()` and we hold no other reference to the object.
        unsafe { timer.as_mut() }.deadline_ms = deadline_ms;

        scheduled.push(timer);
    }

    println!(
        "Scheduled {} timers in {} block(s) of capacity {}",
        timers.len(),
        timers.block_count(),
        timers.capacity()
    );

    for timer in scheduled {
        // SAFETY: The pointer came from `new_()` and nobody is modifying the object.
        println!("Firing timer at {} ms", unsafe { timer.as_ref() }.deadline_ms);

        // SAFETY: The pointer came from `new_()` on this pool and is not used after this.
        unsafe {
            timers.delete_(timer);
        }
    }

    println!("All timers fired, pool is empty: {}", timers.is_empty());
}
