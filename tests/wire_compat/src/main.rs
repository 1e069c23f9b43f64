fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use livechat_protocol::{InboundFrame, SenderKind, WsEvent, decode_frame};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Decodes a fixture as an event, re-encodes it, and compares the JSON
    /// values (key order independent).
    fn roundtrip_event(name: &str) -> WsEvent {
        let fixture = load_fixture(name);
        let parsed: WsEvent = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_connection_announce() {
        let event = roundtrip_event("connection_announce.json");
        let WsEvent::Connection(data) = event else {
            panic!("expected connection event");
        };
        assert_eq!(data.username.as_deref(), Some("Alice"));
        assert!(data.users.is_none());
    }

    #[test]
    fn fixture_connection_roster() {
        let event = roundtrip_event("connection_roster.json");
        let WsEvent::Connection(data) = event else {
            panic!("expected connection event");
        };
        assert_eq!(data.users.unwrap(), ["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn fixture_message_outbound() {
        let event = roundtrip_event("message_outbound.json");
        let WsEvent::Message(data) = event else {
            panic!("expected message event");
        };
        assert!(data.id.is_none());
        assert_eq!(data.sender, SenderKind::Local);
        assert_eq!(data.timestamp.unwrap().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn fixture_message_inbound() {
        let event = roundtrip_event("message_inbound.json");
        let WsEvent::Message(data) = event else {
            panic!("expected message event");
        };
        assert_eq!(data.id.as_deref(), Some("b1946ac9-2f4e-4d52-9b47-1f0e4a3c6c11"));
        assert_eq!(data.sender, SenderKind::Remote);
        assert_eq!(data.username, "Bob");
    }

    #[test]
    fn fixture_user_list() {
        let event = roundtrip_event("user_list.json");
        assert!(matches!(event, WsEvent::User(ref u) if u.users == ["Alice", "Bob"]));
    }

    #[test]
    fn fixture_error() {
        let event = roundtrip_event("error.json");
        assert!(matches!(event, WsEvent::Error(ref e) if e.message == "Username already taken"));
    }

    #[test]
    fn fixtures_decode_as_text_frames() {
        for name in [
            "connection_announce.json",
            "connection_roster.json",
            "message_outbound.json",
            "message_inbound.json",
            "user_list.json",
            "error.json",
            "message_naive_timestamp.json",
        ] {
            let frame = decode_frame(&read_fixture(name))
                .unwrap_or_else(|e| panic!("failed to decode {name}: {e}"));
            assert!(
                matches!(frame, InboundFrame::Event(_)),
                "{name} decoded as plain text"
            );
        }
    }

    #[test]
    fn epoch_millis_timestamp_is_accepted() {
        let frame = r#"{"type":"message","data":{"text":"t","sender":"other","username":"Bob","timestamp":1740824130250}}"#;
        let InboundFrame::Event(WsEvent::Message(data)) = decode_frame(frame).unwrap() else {
            panic!("expected message event");
        };
        let ts = data.timestamp.unwrap();
        assert_eq!(
            livechat_protocol::timestamp::format(&ts),
            "2025-03-01T10:15:30.250Z"
        );
    }

    #[test]
    fn fixture_message_naive_timestamp() {
        let frame = decode_frame(&read_fixture("message_naive_timestamp.json")).unwrap();
        let InboundFrame::Event(WsEvent::Message(data)) = frame else {
            panic!("expected message event");
        };
        let ts = data.timestamp.expect("timestamp without offset should parse as UTC");
        assert_eq!(
            livechat_protocol::timestamp::format(&ts),
            "2025-03-01T10:15:30.123Z"
        );
    }

    #[test]
    fn unparseable_timestamp_is_dropped() {
        let frame = r#"{"type":"message","data":{"text":"t","username":"Bob","timestamp":"yesterday"}}"#;
        let InboundFrame::Event(WsEvent::Message(data)) = decode_frame(frame).unwrap() else {
            panic!("expected message event");
        };
        assert!(data.timestamp.is_none());
        assert_eq!(data.sender, SenderKind::Remote);
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        assert!(decode_frame(r#"{"type":"typing","data":{"username":"Bob"}}"#).is_err());
    }

    #[test]
    fn non_json_is_plain_text() {
        let frame = decode_frame("echo: hi").unwrap();
        assert_eq!(frame, InboundFrame::PlainText("echo: hi".into()));
    }
}
