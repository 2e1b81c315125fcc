//! Message classification and listener dispatch integration tests.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use sphinx_socket::{
    json_type, Group, Member, MessageType, SharedListener, SphinxSocketIOMessage,
};

// ---- Registry ----

#[tokio::test]
async fn duplicate_add_is_rejected() {
    let h = common::harness();
    let (listener, _rx) = common::RecordingListener::new();
    assert!(h.manager.add_listener(listener.clone()));
    assert!(!h.manager.add_listener(listener));
}

#[tokio::test]
async fn remove_unknown_listener_returns_false() {
    let h = common::harness();
    let (listener, _rx) = common::RecordingListener::new();
    let listener: SharedListener = listener;
    assert!(!h.manager.remove_listener(&listener));
    assert!(h.manager.add_listener(listener.clone()));
    assert!(h.manager.remove_listener(&listener));
    assert!(!h.manager.remove_listener(&listener));
}

// ---- Classification ----

#[tokio::test]
async fn no_classification_without_listeners() {
    let h = common::harness();
    h.manager.connect(None).await.unwrap();
    let transport = h.factory.last();

    transport.emit_message(common::message_payload(json_type::MESSAGE, 1));
    transport.emit_message("not even json");
    assert_eq!(h.manager.classifier().classified_count(), 0);

    let (listener, mut rx) = common::RecordingListener::new();
    h.manager.add_listener(listener);
    transport.emit_message(common::message_payload(json_type::MESSAGE, 2));
    assert_eq!(h.manager.classifier().classified_count(), 1);
    assert!(common::next_message(&mut rx).await.is_some());
}

#[tokio::test]
async fn known_types_are_delivered_typed() {
    let h = common::harness();
    let (listener, mut rx) = common::RecordingListener::new();
    h.manager.add_listener(listener);
    h.manager.connect(None).await.unwrap();
    let transport = h.factory.last();

    transport.emit_message(common::envelope(
        json_type::INVOICE_PAYMENT,
        serde_json::json!({ "invoice": "lnbc10n1p..." }),
    ));
    transport.emit_message(common::envelope(
        json_type::MEMBER_APPROVE,
        serde_json::json!({ "chat": { "id": 2, "uuid": "tribe" }, "contact": { "id": 3 } }),
    ));
    transport.emit_message(common::message_payload(json_type::BOOST, 7));

    match common::next_message(&mut rx).await.unwrap() {
        SphinxSocketIOMessage::InvoicePayment(dto) => assert_eq!(dto.invoice, "lnbc10n1p..."),
        other => panic!("expected invoice payment, got {}", other.kind_name()),
    }
    match common::next_message(&mut rx).await.unwrap() {
        SphinxSocketIOMessage::Group(Group::Member(Member::Approve(dto))) => {
            assert_eq!(dto.chat.uuid, "tribe");
        }
        other => panic!("expected member approve, got {}", other.kind_name()),
    }
    match common::next_message(&mut rx).await.unwrap() {
        SphinxSocketIOMessage::MessageType(MessageType::Boost(dto)) => assert_eq!(dto.id, 7),
        other => panic!("expected boost, got {}", other.kind_name()),
    }
}

#[tokio::test]
async fn unknown_type_is_delivered_as_message() {
    let h = common::harness();
    let (listener, mut rx) = common::RecordingListener::new();
    h.manager.add_listener(listener);
    h.manager.connect(None).await.unwrap();

    h.factory
        .last()
        .emit_message(common::message_payload("brand_new_event", 11));

    let msg = common::next_message(&mut rx).await.unwrap();
    assert!(matches!(
        msg,
        SphinxSocketIOMessage::MessageType(MessageType::Message(ref dto)) if dto.id == 11
    ));
}

#[tokio::test]
async fn malformed_payload_is_dropped() {
    let h = common::harness();
    let (listener, mut rx) = common::RecordingListener::new();
    h.manager.add_listener(listener);
    h.manager.connect(None).await.unwrap();
    let transport = h.factory.last();

    transport.emit_message("{\"response\": {}}");
    transport.emit_message(common::envelope(json_type::CONTACT, serde_json::json!({})));
    transport.emit_message(common::message_payload(json_type::DELETE, 5));

    let msg = common::next_message(&mut rx).await.unwrap();
    assert_eq!(msg.json_type(), json_type::DELETE);
    assert_eq!(h.manager.classifier().classified_count(), 3);
}

// ---- Delivery ----

#[tokio::test]
async fn deliveries_to_one_listener_keep_arrival_order() {
    let h = common::harness();
    let (listener, mut rx) = common::RecordingListener::new();
    h.manager.add_listener(listener);
    h.manager.connect(None).await.unwrap();
    let transport = h.factory.last();

    for id in 1..=20 {
        transport.emit_message(common::message_payload(json_type::MESSAGE, id));
    }
    for id in 1..=20 {
        let msg = common::next_message(&mut rx).await.unwrap();
        assert_eq!(msg.message_dto().unwrap().id, id);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocked_listener_does_not_stall_others() {
    let h = common::harness();
    let blocking = Arc::new(common::BlockingListener::default());
    let (recording, mut rx) = common::RecordingListener::new();
    h.manager.add_listener(blocking.clone());
    h.manager.add_listener(recording);
    h.manager.connect(None).await.unwrap();
    let transport = h.factory.last();

    for id in 1..=3 {
        transport.emit_message(common::message_payload(json_type::MESSAGE, id));
    }
    for id in 1..=3 {
        let msg = common::next_message(&mut rx).await.expect("delivery not stalled");
        assert_eq!(msg.message_dto().unwrap().id, id);
    }
    // The blocked listener never gets past its first message.
    tokio::time::timeout(common::DELIVERY_TIMEOUT, async {
        while blocking.started.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("blocking listener never started");
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(blocking.started.load(Ordering::SeqCst), 1);

    // Teardown does not wait for the stuck delivery.
    h.network.clear();
    assert!(h.manager.instance_id().is_none());
}

#[tokio::test]
async fn failing_listeners_are_isolated() {
    let h = common::harness();
    h.manager.add_listener(Arc::new(common::FailingListener { panics: true }));
    h.manager.add_listener(Arc::new(common::FailingListener { panics: false }));
    let (recording, mut rx) = common::RecordingListener::new();
    h.manager.add_listener(recording);
    h.manager.connect(None).await.unwrap();
    let transport = h.factory.last();

    transport.emit_message(common::message_payload(json_type::ATTACHMENT, 1));
    transport.emit_message(common::message_payload(json_type::PURCHASE, 2));

    let first = common::next_message(&mut rx).await.unwrap();
    assert_eq!(first.json_type(), json_type::ATTACHMENT);
    let second = common::next_message(&mut rx).await.unwrap();
    assert_eq!(second.json_type(), json_type::PURCHASE);
}

#[tokio::test]
async fn removed_listener_receives_nothing_more() {
    let h = common::harness();
    let (listener, mut rx) = common::RecordingListener::new();
    let listener: SharedListener = listener;
    h.manager.add_listener(listener.clone());
    h.manager.connect(None).await.unwrap();
    let transport = h.factory.last();

    transport.emit_message(common::message_payload(json_type::MESSAGE, 1));
    assert!(common::next_message(&mut rx).await.is_some());

    assert!(h.manager.remove_listener(&listener));
    transport.emit_message(common::message_payload(json_type::MESSAGE, 2));
    common::assert_no_message(&mut rx).await;
}

#[tokio::test]
async fn removed_listener_is_released_without_further_traffic() {
    let h = common::harness();
    let (listener, mut rx) = common::RecordingListener::new();
    let listener: SharedListener = listener;
    h.manager.add_listener(listener.clone());
    h.manager.connect(None).await.unwrap();

    h.factory
        .last()
        .emit_message(common::message_payload(json_type::MESSAGE, 1));
    assert!(common::next_message(&mut rx).await.is_some());
    assert!(Arc::strong_count(&listener) > 1);

    assert!(h.manager.remove_listener(&listener));
    tokio::time::timeout(common::DELIVERY_TIMEOUT, async {
        while Arc::strong_count(&listener) > 1 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("removed listener still held by its worker");
}

#[tokio::test]
async fn messages_after_teardown_are_not_delivered() {
    let h = common::harness();
    let (listener, mut rx) = common::RecordingListener::new();
    h.manager.add_listener(listener);
    h.manager.connect(None).await.unwrap();
    let old = h.factory.last();

    h.network.clear();
    old.emit_message(common::message_payload(json_type::MESSAGE, 1));
    common::assert_no_message(&mut rx).await;

    // Listeners survive the teardown and receive from the next instance.
    h.manager.connect(None).await.unwrap();
    h.factory
        .last()
        .emit_message(common::message_payload(json_type::MESSAGE, 2));
    let msg = common::next_message(&mut rx).await.unwrap();
    assert_eq!(msg.message_dto().unwrap().id, 2);
}
