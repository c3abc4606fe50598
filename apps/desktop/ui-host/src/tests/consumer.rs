use crate::browser::LoggingBrowser;
use crate::consumer::UiConsumer;

use control_core::dispatcher::{ControlCommandDispatcher, ShutdownLatch, ShutdownSink};
use control_core::queue::CommandQueue;

use models::Command;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn consumer_fixture() -> (
    UiConsumer,
    Arc<CommandQueue>,
    Arc<LoggingBrowser>,
    Arc<ShutdownLatch>,
) {
    let queue = Arc::new(CommandQueue::new());
    let browser = Arc::new(LoggingBrowser::new());
    let latch = Arc::new(ShutdownLatch::new());
    let dispatcher = Arc::new(ControlCommandDispatcher::new(browser.clone(), latch.clone()));
    let consumer = UiConsumer::new(queue.clone(), dispatcher, latch.clone())
        .with_tick(Duration::from_millis(1));
    (consumer, queue, browser, latch)
}

/// **VALUE**: Verifies queued navigations reach the browser in FIFO order.
///
/// **WHY THIS MATTERS**: Controllers rely on the last OpenPage winning.
///
/// **BUG THIS CATCHES**: Would catch draining from the wrong end, or a conversion that
/// loses the url payload.
#[test]
fn given_queued_open_pages_when_drained_then_browser_loads_in_order() {
    // GIVEN
    let (consumer, queue, browser, _latch) = consumer_fixture();
    queue.enqueue(Command::open_page("a", "https://one.example"));
    queue.enqueue(Command::open_page("b", "https://two.example"));

    // WHEN
    let delivered = consumer.drain();

    // THEN
    assert_eq!(delivered, 2);
    assert!(queue.is_empty());
    assert_eq!(
        browser.history(),
        vec!["https://one.example", "https://two.example"]
    );
}

/// **VALUE**: Verifies the consumer stops at a Shutdown and leaves later commands queued.
///
/// **WHY THIS MATTERS**: Nothing should navigate after the host has begun shutting down.
///
/// **BUG THIS CATCHES**: Would catch the loop ignoring the latch until the queue is empty.
#[test]
fn given_shutdown_in_queue_when_run_then_exits_and_later_commands_not_run() {
    // GIVEN
    let (consumer, queue, browser, latch) = consumer_fixture();
    queue.enqueue(Command::open_page("a", "https://one.example"));
    queue.enqueue(Command::Shutdown);
    queue.enqueue(Command::open_page("b", "https://two.example"));

    // WHEN
    consumer.run_until_shutdown();

    // THEN
    assert!(latch.is_shutdown_requested());
    assert_eq!(browser.history(), vec!["https://one.example"]);
    assert_eq!(queue.len(), 1);
}

#[test]
fn given_running_consumer_when_shutdown_enqueued_from_another_thread_then_run_returns() {
    let (consumer, queue, _browser, latch) = consumer_fixture();

    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        queue.enqueue(Command::Shutdown);
    });
    consumer.run_until_shutdown();
    producer.join().unwrap();

    assert!(latch.is_shutdown_requested());
}
