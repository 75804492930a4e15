//! Event bus 集成测试

use crossbeam::channel;
use std::sync::Arc;
use std::time::Duration;
use taskloom::runtime::event::{Event, EventListener, EventManager, JsonCodec, EventCodec};
use taskloom::RuntimeError;

struct Forwarder {
    sender: channel::Sender<String>,
}

impl EventListener for Forwarder {
    fn on_event(
        &self,
        event: &Event,
    ) -> bool {
        let text = event
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let _ = self.sender.send(text);
        true
    }
}

#[test]
fn test_push_event_delivers_to_listener_object() {
    let events = EventManager::new().unwrap();
    events.create_event_type("chat").unwrap();
    let (sender, receiver) = channel::unbounded();
    events
        .add_listener("chat", Arc::new(Forwarder { sender }))
        .unwrap();

    events
        .push_event(Event::new("chat").with("text", "hi"))
        .unwrap();
    assert_eq!(
        receiver.recv_timeout(Duration::from_secs(5)).unwrap(),
        "hi"
    );
}

#[test]
fn test_trigger_event_stops_at_first_consumer() {
    let events = EventManager::new().unwrap();
    let ping = events.create_event_type("ping").unwrap();
    let l1 = ping.add_callback(|_| false);
    let l2 = ping.add_callback(|_| true);
    let l3 = ping.add_callback(|_| true);

    assert_eq!(events.trigger_event(&Event::new("ping")), Ok(true));
    assert_eq!(
        (l1.invocations(), l2.invocations(), l3.invocations()),
        (1, 1, 0)
    );
}

#[test]
fn test_filtered_listener() {
    let events = EventManager::new().unwrap();
    let keys = events.create_event_type("key").unwrap();
    keys.add_callback(|_| true)
        .with_filter(|e: &Event| e.get("code").and_then(|v| v.as_int()) != Some(13));

    assert_eq!(
        events.trigger_event(&Event::new("key").with("code", 13)),
        Ok(true)
    );
    assert_eq!(
        events.trigger_event(&Event::new("key").with("code", 1)),
        Ok(false)
    );
}

#[test]
fn test_unknown_event_type() {
    let events = EventManager::new().unwrap();
    assert!(matches!(
        events.push_event(Event::new("ghost")),
        Err(RuntimeError::UnknownEventType { .. })
    ));
}

#[test]
fn test_codec_round_trip_through_the_bus() {
    let events = EventManager::new().unwrap();
    events.create_event_type("wire").unwrap();
    let (sender, receiver) = channel::unbounded();
    events
        .add_callback("wire", move |e| {
            let _ = sender.send(e.clone());
            true
        })
        .unwrap();

    let codec = JsonCodec::new();
    let original = Event::new("wire").with("n", 3).with("ok", true);
    let mut bytes = Vec::new();
    assert!(codec.serialize(&original, &mut bytes));
    let decoded = codec.deserialize(&bytes).unwrap();

    events.push_event(decoded).unwrap();
    let received = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(received, original);
}
