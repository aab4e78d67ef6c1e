//! Integration tests for the realtime core.
//!
//! These tests wire the pieces the way the binary does:
//! 1. One shared InMemoryEventBus
//! 2. TrafficSimulator publishing analytics, cursor and presence events
//! 3. RealtimeService gating traffic on the connection state
//! 4. CollaborationTracker consuming the collaboration events
//!
//! Timer-driven code runs on a paused tokio clock.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pagesmith::adapters::{InMemoryEventBus, ManualClock, SystemClock};
use pagesmith::application::{
    CollaborationTracker, RealtimeConfig, RealtimeService, TrafficSimulator,
    TrafficSimulatorConfig,
};
use pagesmith::domain::analytics::{
    AnalyticsSummary, ApiCallLog, CallOutcome, CallStatus, HttpMethod,
};
use pagesmith::domain::collaboration::CURSOR_TTL;
use pagesmith::domain::events::{
    ConnectionState, Event, EVENT_ANALYTICS_UPDATE, EVENT_API_CALL, EVENT_CURSOR_MOVE,
};
use pagesmith::domain::foundation::{Timestamp, UserId};
use pagesmith::ports::{handler_fn, EventPublisher, EventSubscriber};
use serde_json::json;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    bus: Arc<InMemoryEventBus>,
    realtime: RealtimeService,
    collaboration: Arc<CollaborationTracker>,
}

fn harness(config: TrafficSimulatorConfig) -> Harness {
    let bus = Arc::new(InMemoryEventBus::new());
    let traffic = Arc::new(TrafficSimulator::with_config(
        bus.clone(),
        Arc::new(SystemClock),
        config,
    ));
    let realtime = RealtimeService::new(bus.clone(), traffic, RealtimeConfig::default());
    let collaboration = CollaborationTracker::new_shared(Arc::new(SystemClock), CURSOR_TTL);
    let _subs = collaboration.register(bus.as_ref());
    Harness {
        bus,
        realtime,
        collaboration,
    }
}

fn counter(bus: &InMemoryEventBus, event_type: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let _sub = bus.subscribe(
        event_type,
        handler_fn("counter", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );
    count
}

// =============================================================================
// Event bus scenarios
// =============================================================================

#[test]
fn publish_with_no_subscribers_returns_without_effect() {
    let bus = InMemoryEventBus::new();
    assert_eq!(bus.publish(Event::new("x", json!({"a": 1}))), 0);
    assert!(bus.event_types().is_empty());
}

#[test]
fn two_subscribers_on_tick_each_receive_once() {
    let bus = InMemoryEventBus::new();
    let a = counter(&bus, "tick");
    let b = counter(&bus, "tick");

    bus.emit("tick", json!(null), None);

    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(b.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribe_guarantees_no_further_delivery() {
    let bus = InMemoryEventBus::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let sub = bus.subscribe(
        "tick",
        handler_fn("counter", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );
    bus.unsubscribe(&sub);

    for _ in 0..10 {
        bus.emit("tick", json!(null), None);
    }

    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(bus.subscriber_count("tick"), 0);
}

// =============================================================================
// Connected traffic
// =============================================================================

#[tokio::test(start_paused = true)]
async fn connected_service_streams_traffic_into_collaboration() {
    let h = harness(
        TrafficSimulatorConfig::default()
            .with_seed(17)
            .with_gates(1.0, 1.0, 0.0),
    );
    let updates = counter(&h.bus, EVENT_ANALYTICS_UPDATE);
    let cursor_moves = counter(&h.bus, EVENT_CURSOR_MOVE);

    assert_eq!(h.realtime.connect().await, ConnectionState::Connected);
    tokio::time::sleep(Duration::from_millis(6_500)).await;

    // Analytics ticks at 2s, 4s, 6s; collaboration ticks at 3s, 6s.
    assert_eq!(updates.load(Ordering::SeqCst), 3);
    assert_eq!(cursor_moves.load(Ordering::SeqCst), 2);
    assert!(!h.collaboration.cursors().is_empty());
    assert_eq!(h.realtime.metrics().api_calls, 3);

    h.realtime.disconnect();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(updates.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn user_call_lifecycle_is_visible_on_the_bus() {
    let h = harness(TrafficSimulatorConfig::default().with_seed(8));
    let seen: Arc<Mutex<Vec<ApiCallLog>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = h.bus.subscribe(
        EVENT_API_CALL,
        handler_fn("api_calls", move |event| {
            sink.lock().unwrap().push(event.payload_as().unwrap());
            Ok(())
        }),
    );

    let id = h.realtime.simulate_call("/api/components", HttpMethod::Put);
    tokio::time::sleep(Duration::from_secs(4)).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].id, id);
    assert_eq!(seen[0].status, CallStatus::Pending);
    assert_eq!(seen[1].id, id);
    assert!(seen[1].status.is_terminal());
    assert_eq!(seen[1].method, HttpMethod::Put);
}

#[tokio::test(start_paused = true)]
async fn call_log_keeps_the_most_recent_hundred() {
    let h = harness(TrafficSimulatorConfig::default().with_seed(30));

    let ids: Vec<_> = (0..105)
        .map(|i| h.realtime.simulate_call(&format!("/api/items/{i}"), HttpMethod::Get))
        .collect();

    let log = h.realtime.call_log();
    assert_eq!(log.len(), 100);
    let kept: HashSet<_> = log.iter().map(|e| e.id).collect();
    assert!(ids[..5].iter().all(|id| !kept.contains(id)));
    assert!(ids[5..].iter().all(|id| kept.contains(id)));
    assert_eq!(log[0].id, ids[104]);

    // Completions of evicted entries are discarded quietly.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(h.realtime.metrics().api_calls, 100);
}

// =============================================================================
// Aggregator properties
// =============================================================================

fn entry_strategy() -> impl Strategy<Value = (i64, u8, u64)> {
    // (age in ms, status selector, duration)
    (-5_000i64..7_200_000, 0u8..3, 0u64..3_000)
}

fn build_entry(now: Timestamp, age: i64, status: u8, duration: u64) -> ApiCallLog {
    let user = UserId::new("user-prop").unwrap();
    let timestamp = Timestamp::from_millis(now.as_millis() - age);
    match status {
        0 => ApiCallLog::pending(HttpMethod::Get, "/api/a", user, "10.0.0.1", timestamp),
        1 => ApiCallLog::completed(
            HttpMethod::Get,
            "/api/a",
            user,
            "10.0.0.1",
            timestamp,
            CallOutcome {
                status: CallStatus::Success,
                status_code: 200,
                duration_ms: duration,
            },
        ),
        _ => ApiCallLog::completed(
            HttpMethod::Post,
            "/api/b",
            user,
            "10.0.0.1",
            timestamp,
            CallOutcome {
                status: CallStatus::Error,
                status_code: 500,
                duration_ms: duration,
            },
        ),
    }
}

proptest! {
    #[test]
    fn summary_stays_within_bounds(
        raw in prop::collection::vec(entry_strategy(), 0..120)
    ) {
        let now = Timestamp::from_millis(10_000_000_000);
        let window = Duration::from_secs(3_600);
        let entries: Vec<ApiCallLog> = raw
            .iter()
            .map(|&(age, status, duration)| build_entry(now, age, status, duration))
            .collect();

        let summary = AnalyticsSummary::compute(&entries, now, window);

        let recent = raw
            .iter()
            .filter(|&&(age, _, _)| (0..3_600_000).contains(&age))
            .count();
        prop_assert_eq!(summary.total_calls, recent);
        prop_assert!(summary.success_rate >= 0.0 && summary.success_rate <= 100.0);
        prop_assert!(summary.average_response_time >= 0.0);
        prop_assert!(summary.average_response_time < 3_000.0);
        prop_assert!(summary.error_count + summary.pending_count <= summary.total_calls);
        prop_assert_eq!(
            summary.calls_by_endpoint.values().sum::<usize>(),
            summary.total_calls
        );
        if recent == 0 {
            prop_assert_eq!(summary.success_rate, 0.0);
            prop_assert_eq!(summary.average_response_time, 0.0);
        }
    }
}

#[test]
fn collaboration_cursors_expire_on_a_manual_clock() {
    let bus = Arc::new(InMemoryEventBus::new());
    let clock = Arc::new(ManualClock::at_millis(0));
    let tracker = CollaborationTracker::new_shared(clock.clone(), CURSOR_TTL);
    let _subs = tracker.register(bus.as_ref());

    bus.emit(
        EVENT_CURSOR_MOVE,
        json!({ "userId": "user-chloe", "position": { "x": 3.0, "y": 4.0 } }),
        None,
    );
    assert_eq!(tracker.active_users(), 1);

    clock.advance_millis(31_000);
    assert_eq!(tracker.active_users(), 0);
}
