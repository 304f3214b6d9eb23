//! Deferred-delivery behavior: queueing, draining, clearing, and the
//! interaction between queued events and queued functions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use relaybus::{Bus, BusConfig, LockPolicy, QueueError};

trait Sink: Send + Sync {
    fn push(&self, value: i32);
}

struct LogSink {
    tag: i32,
    log: Arc<Mutex<Vec<i32>>>,
}

impl Sink for LogSink {
    fn push(&self, value: i32) {
        self.log.lock().unwrap().push(self.tag + value);
    }
}

fn sink(tag: i32, log: &Arc<Mutex<Vec<i32>>>) -> Arc<LogSink> {
    Arc::new(LogSink {
        tag,
        log: Arc::clone(log),
    })
}

fn taken(log: &Arc<Mutex<Vec<i32>>>) -> Vec<i32> {
    std::mem::take(&mut *log.lock().unwrap())
}

#[test]
fn queued_calls_do_not_run_until_drained() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let _conn = bus.connect_at(1, sink(100, &log));

    bus.queue_event(1, |h| h.push(1)).unwrap();
    bus.queue_broadcast(|h| h.push(2)).unwrap();
    assert_eq!(taken(&log), Vec::<i32>::new(), "nothing runs synchronously");

    assert_eq!(bus.execute_queued_events(), 2);
    assert_eq!(taken(&log), vec![101, 102]);
    assert_eq!(bus.execute_queued_events(), 0);
}

#[test]
fn queued_events_and_functions_share_one_fifo() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let _conn = bus.connect_at(1, sink(0, &log));

    bus.queue_event(1, |h| h.push(1)).unwrap();
    {
        let log = Arc::clone(&log);
        bus.queue_function(move || log.lock().unwrap().push(-1)).unwrap();
    }
    bus.queue_event(1, |h| h.push(2)).unwrap();
    {
        let log = Arc::clone(&log);
        bus.queue_function(move || log.lock().unwrap().push(-2)).unwrap();
    }

    assert_eq!(bus.execute_queued_events(), 4);
    assert_eq!(taken(&log), vec![1, -1, 2, -2]);
}

#[test]
fn clear_discards_the_backlog() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let _conn = bus.connect_at(1, sink(0, &log));

    for i in 0..5 {
        bus.queue_event(1, move |h| h.push(i)).unwrap();
    }
    assert_eq!(bus.clear_queued_events(), 5);
    assert_eq!(bus.execute_queued_events(), 0);
    assert_eq!(taken(&log), Vec::<i32>::new());
}

#[test]
fn queued_broadcast_sees_handlers_connected_before_the_drain() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));

    // Queued while nobody is connected; delivery is resolved at drain time.
    bus.queue_broadcast(|h| h.push(7)).unwrap();
    let _conn = bus.connect_at(1, sink(0, &log));

    assert_eq!(bus.execute_queued_events(), 1);
    assert_eq!(taken(&log), vec![7]);
}

#[test]
fn queued_event_against_a_disconnected_handler_noops() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));

    let conn = bus.connect_at(3, sink(0, &log));
    bus.queue_event(3, |h| h.push(9)).unwrap();
    conn.disconnect();

    assert_eq!(bus.execute_queued_events(), 1, "entry still drains");
    assert_eq!(taken(&log), Vec::<i32>::new(), "but invokes nobody");
}

#[test]
fn queueing_toggle_gates_new_work_only() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let _conn = bus.connect_at(1, sink(0, &log));

    bus.queue_event(1, |h| h.push(1)).unwrap();
    bus.allow_function_queuing(false);
    assert!(!bus.is_function_queuing());
    assert_eq!(bus.queue_event(1, |h| h.push(2)), Err(QueueError::Inactive));
    assert_eq!(
        bus.queue_function(|| {}),
        Err(QueueError::Inactive)
    );

    // Work accepted before the toggle still drains.
    assert_eq!(bus.execute_queued_events(), 1);
    assert_eq!(taken(&log), vec![1]);

    bus.allow_function_queuing(true);
    assert_eq!(bus.queue_event(1, |h| h.push(3)), Ok(()));
    assert_eq!(bus.execute_queued_events(), 1);
    assert_eq!(taken(&log), vec![3]);
}

#[test]
fn disabled_queueing_rejects_everything() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default().with_queueing(false));
    assert_eq!(bus.queue_broadcast(|h| h.push(1)), Err(QueueError::Disabled));
    assert_eq!(bus.queue_event(1, |h| h.push(1)), Err(QueueError::Disabled));
    assert_eq!(bus.queue_function(|| {}), Err(QueueError::Disabled));
    assert_eq!(bus.execute_queued_events(), 0);
    assert_eq!(bus.clear_queued_events(), 0);
    assert!(!bus.is_function_queuing());
}

#[test]
fn work_queued_during_a_drain_waits_for_the_next_one() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let _conn = bus.connect_at(1, sink(0, &log));

    {
        let bus = bus.clone();
        let log = Arc::clone(&log);
        bus.clone()
            .queue_function(move || {
                log.lock().unwrap().push(1);
                bus.queue_event(1, |h| h.push(2)).unwrap();
            })
            .unwrap();
    }

    assert_eq!(bus.execute_queued_events(), 1);
    assert_eq!(taken(&log), vec![1]);
    assert_eq!(bus.execute_queued_events(), 1);
    assert_eq!(taken(&log), vec![2]);
}

#[test]
fn producers_queue_from_many_threads() {
    let bus: Bus<dyn Sink, u32> =
        Bus::keyed(BusConfig::default().with_lock(LockPolicy::Mutex));
    let hits = Arc::new(AtomicUsize::new(0));

    struct CountSink(Arc<AtomicUsize>);
    impl Sink for CountSink {
        fn push(&self, _value: i32) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
    let _conn = bus.connect_at(1, Arc::new(CountSink(Arc::clone(&hits))));

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    bus.queue_event(1, |h| h.push(0)).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(bus.execute_queued_events(), 200);
    assert_eq!(hits.load(Ordering::SeqCst), 200);
}

#[test]
fn cached_pointer_queueing_survives_full_disconnection() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));

    let ptr = bus.bind(6);
    let conn = bus.connect_at(6, sink(0, &log));
    ptr.queue_event(|h| h.push(5)).unwrap();
    conn.disconnect();

    // Nobody is connected at drain time: the entry drains as a no-op.
    assert_eq!(bus.execute_queued_events(), 1);
    assert_eq!(taken(&log), Vec::<i32>::new());

    // The pointer pins the address, so a reconnect reaches it again.
    let _c2 = bus.connect_at(6, sink(10, &log));
    ptr.queue_event(|h| h.push(5)).unwrap();
    assert_eq!(bus.execute_queued_events(), 1);
    assert_eq!(taken(&log), vec![15]);
}

#[test]
fn pending_queued_entry_keeps_its_address_pinned() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));

    let ptr = bus.bind(2);
    let conn = bus.connect_at(2, sink(0, &log));
    ptr.queue_event(|h| h.push(1)).unwrap();
    drop(ptr);
    conn.disconnect();

    // The entry itself pins the address until drained; a reconnect before
    // the drain is reached by it.
    let _c2 = bus.connect_at(2, sink(10, &log));
    assert_eq!(bus.execute_queued_events(), 1);
    assert_eq!(taken(&log), vec![11]);
}

#[test]
fn queued_reverse_variants_invert_order_at_drain() {
    let bus: Bus<dyn Sink, u32> = Bus::keyed(BusConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let _c1 = bus.connect_at(1, sink(10, &log));
    let _c2 = bus.connect_at(1, sink(20, &log));

    bus.queue_event(1, |h| h.push(1)).unwrap();
    bus.queue_event_reverse(1, |h| h.push(1)).unwrap();
    bus.queue_broadcast_reverse(|h| h.push(2)).unwrap();

    assert_eq!(bus.execute_queued_events(), 3);
    assert_eq!(taken(&log), vec![11, 21, 21, 11, 22, 12]);
}
