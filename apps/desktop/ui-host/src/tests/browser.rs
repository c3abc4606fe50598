use crate::browser::LoggingBrowser;

use control_core::dispatcher::BrowserControl;
use control_core::error::dispatch::DispatchError;

#[test]
fn given_http_and_https_urls_when_loaded_then_recorded_in_order() {
    let browser = LoggingBrowser::new();

    browser.load_url("https://example.com").unwrap();
    browser.load_url("http://localhost:8080/page").unwrap();

    assert_eq!(
        browser.history(),
        vec!["https://example.com", "http://localhost:8080/page"]
    );
    assert_eq!(
        browser.current_url().as_deref(),
        Some("http://localhost:8080/page")
    );
}

/// **VALUE**: Verifies unloadable URLs fail with a navigation error and leave history alone.
///
/// **WHY THIS MATTERS**: The dispatcher relies on the browser reporting failure so it can
/// log and absorb it.
///
/// **BUG THIS CATCHES**: Would catch `file:` or `javascript:` URLs being accepted.
#[test]
fn given_unloadable_urls_when_loaded_then_navigation_error_and_history_unchanged() {
    // GIVEN
    let browser = LoggingBrowser::new();

    // WHEN / THEN
    for url in ["not a url", "file:///etc/passwd", "javascript:alert(1)"] {
        assert!(
            matches!(browser.load_url(url), Err(DispatchError::Navigation { .. })),
            "{url} should be refused"
        );
    }
    assert!(browser.history().is_empty());
    assert!(browser.current_url().is_none());
}
