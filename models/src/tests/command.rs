use crate::{Command, ControlCommand, ControlCommandType};

/// **VALUE**: Verifies that a queued `OpenPage` becomes a `Navigate` control command.
///
/// **WHY THIS MATTERS**: The UI consumer drains queue commands into the same dispatcher
/// the file channel uses. The URL must land under the payload key the dispatcher reads.
///
/// **BUG THIS CATCHES**: Would catch the id or URL being lost in the conversion.
#[test]
fn given_open_page_when_converted_then_becomes_navigate_with_url_payload() {
    // GIVEN: An OpenPage command
    let command = Command::open_page("cmd-2", "https://y");

    // WHEN: Converting
    let control: ControlCommand = command.into();

    // THEN: Navigate with the same id and url
    assert_eq!(control.command_id(), "cmd-2");
    assert_eq!(control.command_type(), ControlCommandType::Navigate);
    assert_eq!(control.payload_value("url"), Some("https://y"));
}

/// **VALUE**: Verifies that `Shutdown` converts with a generated, non-empty id.
///
/// **WHY THIS MATTERS**: Control commands require a non-empty id; the queue's `Shutdown`
/// has none of its own.
///
/// **BUG THIS CATCHES**: Would catch an empty id slipping past the model invariant.
#[test]
fn given_shutdown_when_converted_then_has_generated_id() {
    // GIVEN/WHEN: Converting two shutdowns
    let first: ControlCommand = Command::Shutdown.into();
    let second: ControlCommand = Command::Shutdown.into();

    // THEN: Non-empty, distinct ids
    assert_eq!(first.command_type(), ControlCommandType::Shutdown);
    assert!(!first.command_id().is_empty());
    assert_ne!(first.command_id(), second.command_id());
    assert_eq!(Command::Shutdown.command_id(), None);
}
