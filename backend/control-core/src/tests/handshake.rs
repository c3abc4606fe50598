use crate::error::protocol::ProtocolError;
use crate::protocol::{Handshake, process_hello_message, validate_hello};

/// **VALUE**: Verifies the trimming table for received tokens.
///
/// **WHY THIS MATTERS**: Controllers often send tokens read from files or pipes with trailing
/// newlines. Only outer whitespace may be forgiven; anything else is a different token.
///
/// **BUG THIS CATCHES**: Would catch trimming being skipped, internal whitespace being stripped,
/// or an all-whitespace token collapsing into a match.
#[test]
fn given_expected_token_when_validate_hello_then_trimmed_matches_accepted_and_others_rejected() {
    // GIVEN
    let expected = "tok";

    // WHEN/THEN: Outer whitespace is forgiven
    for received in ["tok", "  tok", "tok  ", "\t\ntok\n\t", "\r\ntok\r\n"] {
        assert!(
            validate_hello(expected, received).is_ok(),
            "{received:?} should be accepted"
        );
    }

    // WHEN/THEN: Anything else is rejected
    for received in ["tok2", "", "   ", "t ok", "TOK", "\u{00a0}tok"] {
        assert!(
            validate_hello(expected, received).is_err(),
            "{received:?} should be rejected"
        );
    }
}

/// **VALUE**: Verifies internal whitespace is significant on both sides.
///
/// **WHY THIS MATTERS**: Tokens with spaces must compare byte for byte after trimming.
///
/// **BUG THIS CATCHES**: Would catch a whitespace-normalising comparison.
#[test]
fn given_token_with_internal_whitespace_when_validate_hello_then_internal_whitespace_preserved() {
    assert!(validate_hello("a b", "  a b ").is_ok());
    assert!(validate_hello("a b", "ab").is_err());
    assert!(validate_hello("a b", "a  b").is_err());
}

/// **VALUE**: Verifies an empty expected token rejects every input, including the empty one.
///
/// **WHY THIS MATTERS**: A misconfigured host with no token must fail closed.
///
/// **BUG THIS CATCHES**: Would catch `"" == ""` authenticating everyone.
#[test]
fn given_empty_expected_token_when_validate_hello_then_always_fails() {
    for received in ["", " ", "anything"] {
        match validate_hello("", received) {
            Err(ProtocolError::Violation { message, .. }) => {
                assert_eq!(message, "Expected token cannot be empty");
            }
            Ok(()) => panic!("Empty expected token must never validate"),
        }
    }
}

/// The expected token is never trimmed, so padding on the server side is significant.
#[test]
fn given_padded_expected_token_when_validate_hello_then_trimmed_input_does_not_match() {
    assert!(validate_hello(" tok", "tok").is_err());
    assert!(validate_hello(" tok", " tok").is_err());
}

/// **VALUE**: Verifies `process_hello_message` composes parse, type check and validation.
///
/// **WHY THIS MATTERS**: The secure channel hands raw text to this one function; every failure
/// mode must surface as the same protocol violation kind.
///
/// **BUG THIS CATCHES**: Would catch a NAVIGATE being accepted as a handshake, or a parse error
/// escaping as a different error type.
#[test]
fn given_raw_text_when_process_hello_message_then_only_valid_hello_passes() {
    // GIVEN
    let expected = "secret";

    // WHEN/THEN
    assert!(process_hello_message(expected, r#"{"type":"HELLO","sessionToken":" secret\n"}"#).is_ok());

    let navigate = process_hello_message(expected, r#"{"type":"NAVIGATE","url":"https://x"}"#);
    assert!(
        matches!(navigate, Err(ProtocolError::Violation { ref message, .. }) if message.contains("Expected HELLO")),
        "got {navigate:?}"
    );

    assert!(process_hello_message(expected, "{").is_err());
    assert!(process_hello_message(expected, r#"{"type":"HELLO","sessionToken":"wrong"}"#).is_err());
}

#[test]
fn given_handshake_holder_when_validating_then_uses_held_token() {
    let handshake = Handshake::new("held");

    assert!(handshake.validate_hello("held\n").is_ok());
    assert!(handshake.validate_hello("other").is_err());
    assert!(
        handshake
            .process_hello_message(r#"{"type":"HELLO","sessionToken":"held"}"#)
            .is_ok()
    );
    assert!(!format!("{handshake:?}").contains("held"));
}
