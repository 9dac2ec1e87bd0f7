//! Integration tests for the bus's debug log records.

use eventus::{Bus, BusConfig, EventKey, LogLevel, LogRecord, LogSink, Status};
use eventus_test::{CapturingSink, Counter, Notice, setup_test_logging};

fn bus_with_sink() -> (Bus, CapturingSink) {
    let bus = Bus::with_workers(1);
    let sink = CapturingSink::new();
    bus.set_logger(sink.clone());
    (bus, sink)
}

#[test]
fn test_subscribe_and_unsubscribe_records() {
    let (bus, sink) = bus_with_sink();
    let id = bus.subscribe(|_: &mut Counter| true);
    assert_eq!(bus.unsubscribe::<Counter>(id), Status::Ok);

    let records = sink.records();
    let subscribed = records
        .iter()
        .find(|r| r.message == "subscribed {id} to {event}")
        .unwrap();
    assert_eq!(subscribed.level, LogLevel::Debug);
    assert_eq!(subscribed.id, Some(id));
    assert_eq!(subscribed.event, Some(EventKey::of::<Counter>()));

    assert_eq!(sink.count("unsubscribed {id} from {event}"), 1);
    assert_eq!(sink.count("gc removed empty bucket for {event}"), 1);
}

#[test]
fn test_miss_records_are_warnings() {
    let (bus, sink) = bus_with_sink();
    assert_eq!(bus.publish(Notice("lost")), Status::EventTypeNotRegistered);
    assert_eq!(
        bus.unsubscribe_id(eventus::SubscriberId::new(99)),
        Status::NoSubscriberWithId
    );

    let warnings = sink.at_level(LogLevel::Warning);
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].message, "publish: {event} is not registered");
    assert!(warnings[0].format().contains("Notice"));
    assert_eq!(warnings[1].format(), "unsubscribe: no subscriber with id 99");
    assert_eq!(sink.messages()[1], "unsubscribe: no subscriber with id 99");

    sink.clear();
    assert!(sink.records().is_empty());
    let _ = bus.publish(Notice("after clear"));
    assert_eq!(sink.messages().len(), 1);
}

#[test]
fn test_short_circuit_record_names_subscriber() {
    let (bus, sink) = bus_with_sink();
    let gate = bus.subscribe_with_priority(|_: &mut Counter| false, 1);
    bus.subscribe(|_: &mut Counter| true);

    assert_eq!(bus.publish(Counter), Status::Ok);
    let stopped: Vec<LogRecord> = sink
        .records()
        .into_iter()
        .filter(|r| r.message == "propagation of {event} stopped by {id}")
        .collect();
    assert_eq!(stopped.len(), 1);
    assert_eq!(stopped[0].id, Some(gate));
}

#[test]
fn test_clear_logger_stops_records() {
    let (bus, sink) = bus_with_sink();
    bus.subscribe(|_: &mut Counter| true);
    let before = sink.records().len();

    bus.clear_logger();
    let _ = bus.publish(Notice("quiet"));
    let _ = bus.unsubscribe_all();

    assert_eq!(sink.records().len(), before);
}

#[test]
fn test_closure_sink_replaces_previous() {
    let (bus, sink) = bus_with_sink();
    let second = CapturingSink::new();
    let forward = second.clone();
    bus.set_logger(move |record: &LogRecord| forward.log(record));

    let _ = bus.publish(Counter);
    assert!(sink.records().is_empty());
    assert_eq!(second.records().len(), 1);
}

#[test]
fn test_debug_log_routes_to_tracing() {
    setup_test_logging("eventus=debug");
    let bus = Bus::with_config(BusConfig::new().with_debug_log(true).with_workers(1));

    let id = bus.subscribe(|_: &mut Counter| true);
    assert_eq!(bus.publish(Counter), Status::Ok);
    assert_eq!(bus.publish(Notice("traced miss")), Status::EventTypeNotRegistered);
    assert_eq!(bus.unsubscribe::<Counter>(id), Status::Ok);
}
