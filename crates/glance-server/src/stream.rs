//! The `/events` push stream.
//!
//! Each connected observer gets its own [`Subscription`] to the presence
//! bus, forwarded as server-sent events whose `data` is the JSON-encoded
//! [`PresenceEvent`](glance_protocol::PresenceEvent). Observers only see
//! events published while they are connected.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use futures_util::stream;
use glance_auth::KeyProvider;
use glance_presence::Subscription;
use glance_protocol::Codec;

use crate::server::ServerState;

pub(crate) async fn events<K: KeyProvider>(
    State(state): State<Arc<ServerState<K>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.presence.bus().subscribe();
    tracing::debug!(
        subscribers = state.presence.bus().subscriber_count(),
        "observer connected"
    );
    Sse::new(event_stream(subscription, state.codec)).keep_alive(KeepAlive::default())
}

/// Turns a bus subscription into a stream of SSE frames. Ends when the bus
/// is dropped.
fn event_stream<C: Codec + Copy>(
    subscription: Subscription,
    codec: C,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(subscription, move |mut subscription| async move {
        loop {
            let event = subscription.recv().await?;
            match codec.encode_text(&event) {
                Ok(data) => return Some((Ok(Event::default().data(data)), subscription)),
                Err(e) => tracing::warn!(error = %e, "failed to encode presence event"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use glance_presence::EventBus;
    use glance_protocol::{JsonCodec, PresenceEvent, Status};

    use super::*;

    #[tokio::test]
    async fn test_event_stream_yields_one_frame_per_event_and_ends_with_bus() {
        let bus = EventBus::default();
        let stream = event_stream(bus.subscribe(), JsonCodec);
        bus.publish(PresenceEvent {
            title: "Firefox".into(),
            os: "linux".into(),
            client: "laptop".into(),
            status: Status::Online,
        });
        drop(bus);

        let frames: Vec<_> = stream.collect().await;

        assert_eq!(frames.len(), 1);
    }
}
