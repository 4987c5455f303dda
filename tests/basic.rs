use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};

use ticketbuf::{BufferBuilder, BufferError, ReadBuffer, TicketBuffer};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Single-threaded protocol
// ---------------------------------------------------------------------------

#[test]
fn fill_drain_and_reuse_slot_zero() {
    init_tracing();
    let buffer = TicketBuffer::with_capacity(8);
    for _ in 0..8 {
        assert!(!buffer.record());
    }
    assert_eq!(buffer.recorded(), 8);

    assert_eq!(buffer.drain(), 8);
    assert_eq!(buffer.drained(), 8);
    assert!(buffer.stats().is_idle());

    // Ticket 8 maps back to slot 0, which the drain recycled for it.
    assert!(!buffer.record());
    assert_eq!(buffer.recorded(), 9);
    assert_eq!(buffer.drain(), 1);
    assert_eq!(buffer.drained(), 9);
}

#[test]
fn drain_on_empty_buffer_is_noop() {
    let buffer = TicketBuffer::with_capacity(8);
    assert_eq!(buffer.drain(), 0);
    assert_eq!((buffer.recorded(), buffer.drained()), (0, 0));

    buffer.record();
    buffer.drain();
    assert_eq!(buffer.drain(), 0);
    assert_eq!((buffer.recorded(), buffer.drained()), (1, 1));
}

#[test]
fn full_buffer_returns_drain_hint_until_drained() {
    let buffer = TicketBuffer::with_capacity(16);
    for _ in 0..16 {
        assert!(!buffer.record());
    }
    for _ in 0..10 {
        assert!(buffer.record(), "full buffer must keep hinting");
    }
    assert_eq!(buffer.recorded(), 16);
    assert_eq!(buffer.drained(), 0);

    assert_eq!(buffer.drain(), 16);
    assert!(!buffer.record());
    assert_eq!(buffer.recorded(), 17);
}

#[test]
fn repeated_drains_never_pass_recorded() {
    let buffer = TicketBuffer::with_capacity(4);
    for round in 1..=5u64 {
        for _ in 0..3 {
            buffer.record();
        }
        let mut total = 0;
        for _ in 0..4 {
            total += buffer.drain();
        }
        assert_eq!(total, 3, "round {round}");
        assert_eq!(buffer.drained(), buffer.recorded());
        assert_eq!(buffer.drained(), round * 3);
    }
}

#[test]
fn drain_all_matches_single_pass_when_quiescent() {
    let buffer = TicketBuffer::with_capacity(32);
    for _ in 0..20 {
        buffer.record();
    }
    assert_eq!(buffer.drain_all(), 20);
    assert_eq!(buffer.drain_all(), 0);
}

#[test]
fn capacity_of_one_alternates() {
    let buffer = TicketBuffer::with_capacity(1);
    assert!(!buffer.record());
    assert!(buffer.record());
    assert_eq!(buffer.drain(), 1);
    assert!(!buffer.record());
    assert_eq!(buffer.recorded(), 2);
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn rejects_non_power_of_two_capacity() {
    assert_eq!(
        TicketBuffer::try_with_capacity(10).unwrap_err(),
        BufferError::NotPowerOfTwo(10)
    );
    assert_eq!(
        TicketBuffer::try_with_capacity(0).unwrap_err(),
        BufferError::ZeroCapacity
    );
}

#[test]
#[should_panic(expected = "power of two")]
fn with_capacity_panics_on_bad_capacity() {
    TicketBuffer::with_capacity(100);
}

#[test]
fn builder_and_default_agree() {
    let built = BufferBuilder::new().build();
    let default = TicketBuffer::default();
    assert_eq!(built.capacity(), default.capacity());
    assert_eq!(TicketBuffer::builder().capacity(256).build().capacity(), 256);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn racing_producers_fill_one_slot_per_ticket() {
    const THREADS: usize = 8;
    let buffer = Arc::new(TicketBuffer::with_capacity(64));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let buffer = Arc::clone(&buffer);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                buffer.record()
            })
        })
        .collect();
    // A loser may see the winner's filled slot before the ticket moves on
    // and answer with a drain hint; either way it records nothing.
    for h in handles {
        h.join().unwrap();
    }

    // Every winner filled exactly one slot and advanced the ticket once.
    let recorded = buffer.recorded();
    assert!((1..=THREADS as u64).contains(&recorded));
    assert_eq!(buffer.drain() as u64, recorded);
    assert_eq!(buffer.drained(), recorded);
}

#[test]
fn concurrent_record_and_drain_converge() {
    init_tracing();
    const PRODUCERS: usize = 8;
    const RECORDS: usize = 10_000;
    let buffer = Arc::new(TicketBuffer::with_capacity(32));
    let done = Arc::new(AtomicBool::new(false));
    let hints = Arc::new(AtomicU64::new(0));

    let drainer = {
        let buffer = Arc::clone(&buffer);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            let mut total = 0u64;
            while !done.load(Ordering::Acquire) {
                total += buffer.drain() as u64;
                std::thread::yield_now();
            }
            total
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let buffer = Arc::clone(&buffer);
            let hints = Arc::clone(&hints);
            std::thread::spawn(move || {
                for _ in 0..RECORDS {
                    if buffer.record() {
                        hints.fetch_add(1, Ordering::Relaxed);
                        buffer.drain();
                    }
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }
    done.store(true, Ordering::Release);
    drainer.join().unwrap();

    buffer.drain_all();
    let stats = buffer.stats();
    assert_eq!(stats.drained, stats.recorded, "quiescent buffer must drain fully");
    assert!(stats.recorded > 0);
    assert!(stats.recorded <= (PRODUCERS * RECORDS) as u64);
}

#[test]
fn concurrent_drainers_never_double_count() {
    const DRAINERS: usize = 4;
    let buffer = Arc::new(TicketBuffer::with_capacity(128));
    for _ in 0..100 {
        buffer.record();
    }

    let barrier = Arc::new(Barrier::new(DRAINERS));
    let handles: Vec<_> = (0..DRAINERS)
        .map(|_| {
            let buffer = Arc::clone(&buffer);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                buffer.drain()
            })
        })
        .collect();
    let mut total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    total += buffer.drain();

    assert_eq!(total, 100);
    assert_eq!(buffer.drained(), 100);
}

#[test]
fn shared_through_trait_object() {
    let buffers: Vec<Arc<dyn ReadBuffer>> = vec![
        Arc::new(TicketBuffer::with_capacity(4)),
        Arc::new(TicketBuffer::with_capacity(8)),
    ];
    for b in &buffers {
        while !b.record() {}
        assert!(b.drain() > 0);
        assert!(b.stats().is_idle());
    }
}
