//! Demo: an editor-style notification bus.
//!
//! Two panels subscribe to document events at different document ids; a
//! save pass broadcasts to everyone, and an autosave timer defers its
//! notification until the "main loop" drains the queue.
//!
//! Run with: `cargo run --example editor_events`

use std::sync::Arc;

use relaybus::{Bus, BusConfig, LockPolicy};

trait DocumentEvents: Send + Sync {
    fn on_saved(&self, doc: u32);
}

struct Panel(&'static str);

impl DocumentEvents for Panel {
    fn on_saved(&self, doc: u32) {
        println!("[{}] document {doc} saved", self.0);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trace")),
        )
        .init();

    let bus: Bus<dyn DocumentEvents, u32> =
        Bus::ordered(BusConfig::default().with_lock(LockPolicy::Mutex));

    let _outline = bus.connect_at(1, Arc::new(Panel("outline")));
    let _preview = bus.connect_at(2, Arc::new(Panel("preview")));

    // Addressed: only the outline panel hears about document 1.
    bus.event(&1, |h| h.on_saved(1));

    // Broadcast: every panel, in document-id order.
    bus.broadcast(|h| h.on_saved(99));

    // Deferred: nothing happens until the drain.
    bus.queue_broadcast(|h| h.on_saved(7)).unwrap();
    println!("queued, draining now:");
    let ran = bus.execute_queued_events();
    println!("drained {ran} queued call(s)");
}
