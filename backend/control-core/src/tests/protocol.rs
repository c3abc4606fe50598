use crate::error::protocol::ProtocolError;
use crate::protocol::{Message, parse};

fn expect_violation(text: &str) -> String {
    match parse(text) {
        Err(ProtocolError::Violation { message, .. }) => message,
        Ok(message) => panic!("Expected protocol violation for {text:?}, got {message:?}"),
    }
}

/// **VALUE**: Verifies both recognised message shapes parse into typed messages.
///
/// **WHY THIS MATTERS**: These are the only two messages a controller may send.
///
/// **BUG THIS CATCHES**: Would catch field names drifting from `sessionToken` / `url`.
#[test]
fn given_valid_messages_when_parse_then_returns_typed_message() {
    // GIVEN/WHEN
    let hello = parse(r#"{"type":"HELLO","sessionToken":"abc"}"#).expect("HELLO should parse");
    let navigate =
        parse(r#"{"type":"NAVIGATE","url":"https://example.com"}"#).expect("NAVIGATE should parse");

    // THEN
    assert_eq!(
        hello,
        Message::Hello {
            session_token: "abc".to_string()
        }
    );
    assert_eq!(
        navigate,
        Message::Navigate {
            url: "https://example.com".to_string()
        }
    );
}

/// **VALUE**: Verifies a HELLO without `sessionToken` is rejected and extra fields are ignored.
///
/// **WHY THIS MATTERS**: A missing token must never be treated as an empty token, while newer
/// controllers adding fields must keep working.
///
/// **BUG THIS CATCHES**: Would catch a `#[serde(default)]`-style fallback for the token, or a
/// strict parser rejecting unknown fields.
#[test]
fn given_hello_without_token_and_hello_with_extra_field_when_parse_then_rejects_first_accepts_second()
 {
    // GIVEN/WHEN: No token
    let message = expect_violation(r#"{"type":"HELLO"}"#);

    // THEN: Violation names the field
    assert!(message.contains("sessionToken"), "got: {message}");

    // GIVEN/WHEN: Token plus an unknown field
    let parsed = parse(r#"{"type":"HELLO","sessionToken":"x","extra":1}"#);

    // THEN: Parses, extra ignored
    assert_eq!(
        parsed.expect("extra fields should be ignored"),
        Message::Hello {
            session_token: "x".to_string()
        }
    );
}

/// **VALUE**: Verifies the empty token is a valid HELLO at the parser level.
///
/// **WHY THIS MATTERS**: Rejecting empty tokens is the handshake's job, not the parser's.
///
/// **BUG THIS CATCHES**: Would catch the parser conflating "present but empty" with "missing".
#[test]
fn given_empty_session_token_when_parse_then_succeeds() {
    let parsed = parse(r#"{"type":"HELLO","sessionToken":""}"#).expect("empty token is allowed");
    assert_eq!(
        parsed,
        Message::Hello {
            session_token: String::new()
        }
    );
}

/// **VALUE**: Verifies every structurally invalid input becomes a protocol violation.
///
/// **WHY THIS MATTERS**: The session channel is untrusted. Anything that is not exactly one of
/// the recognised shapes must be rejected at the boundary.
///
/// **BUG THIS CATCHES**: Would catch a non-object document, a lowercase type, a non-string
/// field or an unknown type slipping through.
#[test]
fn given_invalid_inputs_when_parse_then_each_is_a_protocol_violation() {
    let cases = [
        "",
        "   ",
        "not json",
        "[]",
        "null",
        "42",
        r#""HELLO""#,
        r#"{}"#,
        r#"{"type":42}"#,
        r#"{"type":"hello","sessionToken":"x"}"#,
        r#"{"type":"HELLO","sessionToken":7}"#,
        r#"{"type":"NAVIGATE"}"#,
        r#"{"type":"NAVIGATE","url":null}"#,
        r#"{"type":"GOODBYE"}"#,
        r#"{"type":"HELLO","sessionToken":"x""#,
    ];

    for text in cases {
        let _ = expect_violation(text);
    }
}

/// **VALUE**: Documents the duplicate-key behaviour: the last occurrence wins.
///
/// **WHY THIS MATTERS**: Duplicate keys are legal JSON text but ambiguous. Pinning the behaviour
/// keeps it from changing silently with a parser swap.
///
/// **BUG THIS CATCHES**: Would catch a switch to first-wins or reject-duplicates without a
/// deliberate decision.
#[test]
fn given_duplicate_keys_when_parse_then_last_occurrence_wins() {
    let parsed = parse(r#"{"type":"HELLO","sessionToken":"first","sessionToken":"second"}"#)
        .expect("duplicates are accepted");

    assert_eq!(
        parsed,
        Message::Hello {
            session_token: "second".to_string()
        }
    );
}

#[test]
fn given_nested_unknown_structures_when_parse_then_they_are_ignored() {
    let parsed =
        parse(r#"{"meta":{"a":[1,2,{"b":null}]},"type":"NAVIGATE","url":"https://n","x":[]}"#)
            .expect("nested extras are ignored");

    assert_eq!(
        parsed,
        Message::Navigate {
            url: "https://n".to_string()
        }
    );
}
