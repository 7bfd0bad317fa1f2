use concord_types::{
    CounterDelta, CounterOperation, ElementId, Envelope, Error, NodeId, RegisterDelta,
    RegisterOperation, SetDelta, SetOperation, StampedSetOperation, Tag, Timestamp,
};

#[test]
fn counter_operation_uses_camel_case_fields() {
    let node = NodeId::new();
    let op = CounterOperation::new(5, node);
    let json = serde_json::to_value(op).unwrap();
    assert_eq!(json["value"], 5);
    assert_eq!(json["originNode"], node.to_string());
}

#[test]
fn counter_delta_is_tagged() {
    let op = CounterDelta::Decrement(CounterOperation::new(2, NodeId::new()));
    let json = serde_json::to_value(op).unwrap();
    assert_eq!(json["op"], "Decrement");
    assert_eq!(json["data"]["value"], 2);
    let parsed: CounterDelta = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, op);
}

#[test]
fn set_delta_roundtrip() {
    let delta = SetDelta::Remove(SetOperation::new("x".to_string(), Tag::new()));
    let json = serde_json::to_string(&delta).unwrap();
    let parsed: SetDelta<SetOperation<String>> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, delta);
}

#[test]
fn stamped_set_operation_carries_stamp() {
    let op = StampedSetOperation::new(1u32, Tag::new(), Timestamp::new(4));
    let json = serde_json::to_value(&op).unwrap();
    assert_eq!(json["stamp"], 4);
}

#[test]
fn register_operation_uses_element_id_field() {
    let id = ElementId::new();
    let op = RegisterOperation::new(id, serde_json::json!({"title": "a"}), Timestamp::new(1));
    let json = serde_json::to_value(&op).unwrap();
    assert_eq!(json["elementId"], id.to_string());
    assert_eq!(json["patch"]["title"], "a");
}

#[test]
fn register_delta_roundtrip() {
    let delta = RegisterDelta::Assign {
        value: 10i32,
        stamp: Timestamp::new(3),
        writer: NodeId::new(),
    };
    let json = serde_json::to_string(&delta).unwrap();
    let parsed: RegisterDelta<i32, Timestamp> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, delta);
}

#[test]
fn envelopes_get_distinct_ids() {
    let node = NodeId::new();
    let a = Envelope::new(node, CounterOperation::new(1, node));
    let b = Envelope::new(node, CounterOperation::new(1, node));
    assert_ne!(a.id, b.id);
    assert_eq!(a.operation, b.operation);
    assert_eq!(a.origin, node);
}

#[test]
fn envelope_survives_transport_encoding() {
    let node = NodeId::new();
    let envelope = Envelope::new(node, CounterDelta::Decrement(CounterOperation::new(2, node)));
    let bytes = envelope.to_json().unwrap();
    let decoded: Envelope<CounterDelta> = Envelope::from_json(&bytes).unwrap();
    assert_eq!(decoded, envelope);
}

#[test]
fn malformed_envelope_is_a_serialization_error() {
    let result = Envelope::<CounterDelta>::from_json(b"{\"id\": 1}");
    assert!(matches!(result, Err(Error::Serialization(_))));
}
