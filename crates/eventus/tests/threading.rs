//! Integration tests for worker-pool dispatch.

#![cfg(feature = "threading")]
#![allow(clippy::arithmetic_side_effects)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use eventus::{Bus, BusConfig, Status, ops};
use eventus_test::{
    CapturingSink, Counter, ModifiableEvent, Notice, Recorder, UserAction, eventually,
};

#[test]
fn test_worker_count_from_config() {
    let bus = Bus::with_config(BusConfig::new().with_workers(3));
    assert_eq!(bus.worker_count(), 3);
    assert!(Bus::new().worker_count() >= 1);
}

#[test]
fn test_publish_threaded_keeps_order_on_one_worker() {
    let bus = Bus::with_workers(1);
    let recorder = Recorder::new();
    let r = recorder.clone();
    bus.subscribe(move |n: &mut Notice| {
        r.record(n.0);
        true
    });

    for name in ["one", "two", "three", "four"] {
        assert_eq!(bus.publish_threaded(Notice(name)), Status::Ok);
    }

    assert!(eventually(|| recorder.len() == 4));
    assert_eq!(recorder.take(), vec!["one", "two", "three", "four"]);
}

#[test]
fn test_publish_threaded_keeps_priority_and_short_circuit() {
    let bus = Bus::with_workers(2);
    let recorder = Recorder::new();
    bus.subscribe_with_priority(recorder.tag::<Counter>("first"), 10);
    bus.subscribe_with_priority(recorder.tag_returning::<Counter>("gate", false), 5);
    bus.subscribe(recorder.tag::<Counter>("blocked"));

    assert_eq!(bus.publish_threaded(Counter), Status::Ok);
    assert!(eventually(|| recorder.len() == 2));
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(recorder.take(), vec!["first", "gate"]);
}

#[test]
fn test_publish_threaded_reports_ok_for_unregistered() {
    let bus = Bus::with_workers(1);
    assert_eq!(bus.publish_threaded(Notice("lost")), Status::Ok);
}

#[test]
fn test_publish_async_invokes_each_subscriber_once() {
    let bus = Bus::with_workers(4);
    let recorder = Recorder::new();
    bus.subscribe_with_priority(recorder.tag::<Counter>("a"), 3);
    bus.subscribe_with_priority(recorder.tag_returning::<Counter>("b", false), 2);
    bus.subscribe_with_priority(recorder.tag::<Counter>("c"), 1);

    assert_eq!(bus.publish_async(Counter), Status::Ok);
    assert!(eventually(|| recorder.len() == 3));
    std::thread::sleep(Duration::from_millis(20));

    // No ordering and no short-circuit between async tasks.
    assert_eq!(recorder.len(), 3);
    for tag in ["a", "b", "c"] {
        assert_eq!(recorder.count(tag), 1);
    }
}

#[test]
fn test_publish_async_single_subscriber_owns_event() {
    let bus = Bus::with_workers(2);
    let total = Arc::new(AtomicUsize::new(0));
    let t = Arc::clone(&total);
    bus.subscribe(move |e: &mut ModifiableEvent| {
        e.value += 1;
        t.fetch_add(usize::try_from(e.value).unwrap_or(0), Ordering::SeqCst);
        true
    });

    assert_eq!(bus.publish_async(ModifiableEvent::new(41)), Status::Ok);
    assert!(eventually(|| total.load(Ordering::SeqCst) == 42));
}

#[test]
fn test_publish_async_reports_lookup_misses() {
    let bus = Bus::with_config(BusConfig::new().with_gc(false).with_workers(1));
    assert_eq!(
        bus.publish_async(Notice("lost")),
        Status::EventTypeNotRegistered
    );

    let id = bus.subscribe(|_: &mut Counter| true);
    assert_eq!(bus.unsubscribe::<Counter>(id), Status::Ok);
    assert_eq!(bus.publish_async(Counter), Status::NoSubscribersForEventType);
}

#[test]
fn test_publish_async_skips_subscriber_removed_before_delivery() {
    let bus = Bus::with_workers(2);
    let recorder = Recorder::new();
    let sink = CapturingSink::new();
    bus.set_logger(sink.clone());

    let target = bus.subscribe(recorder.tag::<Counter>("removed"));
    bus.subscribe(recorder.tag::<Counter>("kept"));

    // The queued tasks need the bus lock, which this callback holds until
    // the removal is done.
    let handle = bus.clone();
    bus.once(move |_: &mut Notice| {
        assert_eq!(handle.publish_async(Counter), Status::Ok);
        assert_eq!(handle.unsubscribe::<Counter>(target), Status::Ok);
        true
    });
    assert_eq!(bus.publish(Notice("submit")), Status::Ok);

    assert!(eventually(|| {
        sink.count("skipped async delivery of {event} to removed {id}") == 1
    }));
    assert!(eventually(|| recorder.len() == 1));
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(recorder.entries(), vec!["kept"]);
}

#[test]
fn test_publish_async_single_subscriber_removed_before_delivery() {
    let bus = Bus::with_workers(1);
    let recorder = Recorder::new();
    let target = bus.subscribe(recorder.tag::<Counter>("removed"));

    let handle = bus.clone();
    bus.once(move |_: &mut Notice| {
        assert_eq!(handle.publish_async(Counter), Status::Ok);
        assert_eq!(handle.unsubscribe::<Counter>(target), Status::Ok);
        true
    });
    assert_eq!(bus.publish(Notice("submit")), Status::Ok);

    // A later task on the single worker proves the skipped one has run.
    let done = Recorder::new();
    bus.subscribe(done.tag::<UserAction>("done"));
    assert_eq!(bus.publish_threaded(UserAction::new("flush")), Status::Ok);
    assert!(eventually(|| done.len() == 1));
    assert!(recorder.is_empty());
}

#[test]
fn test_once_under_concurrent_async_publish() {
    let bus = Bus::with_workers(4);
    let fired = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    bus.once(move |_: &mut Counter| {
        f.fetch_add(1, Ordering::SeqCst);
        true
    });

    for _ in 0..16 {
        let _ = bus.publish_async(Counter);
        let _ = bus.publish_threaded(Counter);
    }

    assert!(eventually(|| fired.load(Ordering::SeqCst) == 1));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(eventually(|| !bus.is_registered::<Counter>()));
}

#[test]
fn test_panicking_subscriber_does_not_stop_pool() {
    let bus = Bus::with_workers(1);
    let recorder = Recorder::new();
    bus.subscribe(|_: &mut Notice| -> bool { panic!("subscriber failure") });
    bus.subscribe(recorder.tag::<Counter>("after-panic"));

    assert_eq!(bus.publish_async(Notice("boom")), Status::Ok);
    assert_eq!(bus.publish_threaded(Counter), Status::Ok);
    assert!(eventually(|| recorder.len() == 1));
}

#[test]
fn test_concurrent_synchronous_publishers() {
    let bus = Bus::with_workers(1);
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    bus.subscribe(move |_: &mut Counter| {
        h.fetch_add(1, Ordering::SeqCst);
        true
    });

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(bus.publish(Counter), Status::Ok);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), 400);
}

#[test]
fn test_multi_variants() {
    let bus = Bus::with_workers(1);
    let recorder = Recorder::new();
    bus.subscribe(recorder.tag::<Counter>("counter"));
    let r = recorder.clone();
    bus.subscribe(move |n: &mut Notice| {
        r.record(n.0);
        true
    });

    assert_eq!(
        bus.publish_threaded_multi((Counter, Notice("threaded"))),
        Status::Ok
    );
    assert!(eventually(|| recorder.len() == 2));
    assert_eq!(recorder.take(), vec!["counter", "threaded"]);

    assert_eq!(
        ops::publish_async_multi(&bus, (Notice("async"), Counter)),
        Status::Ok
    );
    assert!(eventually(|| recorder.len() == 2));
    assert_eq!(recorder.take(), vec!["async", "counter"]);

    assert_eq!(
        bus.publish_async_multi((Counter, 5u64)),
        Status::EventTypeNotRegistered
    );
    assert_eq!(ops::publish_threaded(&bus, Counter), Status::Ok);
    assert_eq!(ops::publish_async(&bus, Counter), Status::Ok);
    assert_eq!(
        ops::publish_threaded_multi(&bus, (Counter, Counter)),
        Status::Ok
    );
    assert!(eventually(|| recorder.len() == 5));
}

#[test]
fn test_drop_bus_with_queued_work() {
    let bus = Bus::with_workers(1);
    bus.subscribe(|_: &mut Counter| {
        std::thread::sleep(Duration::from_millis(5));
        true
    });
    for _ in 0..20 {
        let _ = bus.publish_threaded(Counter);
    }
    drop(bus);
}
