//! Integration tests: tracker, timeout loop, and bus working together.

use std::sync::Arc;
use std::time::Duration;

use glance_presence::{EventBus, PresenceConfig, PresenceTracker};
use glance_protocol::{ClientId, Status};
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_presence_active_client_never_flaps_offline() {
    let bus = EventBus::default();
    let mut sub = bus.subscribe();
    let tracker = Arc::new(PresenceTracker::new(PresenceConfig::default(), bus));
    let cancel = CancellationToken::new();
    let handle = Arc::clone(&tracker).spawn_timeout_loop(cancel.clone());
    let id = ClientId::new("C1");

    // Heartbeat every minute for twenty minutes; the loop checks every 30s.
    for seq in 1..=20 {
        tracker.heartbeat(&id, "laptop", seq).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    assert_eq!(sub.recv().await.unwrap().status, Status::Online);
    assert!(sub.try_recv().is_none(), "no offline event while active");
    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_presence_two_clients_time_out_independently() {
    let bus = EventBus::new("focus", 16);
    let mut sub = bus.subscribe();
    let tracker = PresenceTracker::new(PresenceConfig::default(), bus);

    tracker.report_window(&ClientId::new("A"), "alpha", "Vim", "linux").await;
    tokio::time::advance(Duration::from_secs(200)).await;
    tracker.report_window(&ClientId::new("B"), "beta", "Word", "windows").await;
    tokio::time::advance(Duration::from_secs(200)).await;

    assert_eq!(tracker.sweep_timeouts().await, 1);

    let events: Vec<_> = std::iter::from_fn(|| sub.try_recv()).collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[2].client, "alpha");
    assert_eq!(events[2].status, Status::Offline);
    assert!(tracker.get(&ClientId::new("B")).await.unwrap().is_online);
}
