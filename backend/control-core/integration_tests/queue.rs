use control_core::queue::CommandQueue;

use models::Command;

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

const PRODUCERS: usize = 8;
const PER_PRODUCER: usize = 500;

/// **VALUE**: Verifies per-producer order survives concurrent enqueues with a live consumer.
///
/// **WHY THIS MATTERS**: Control sessions run on worker tasks while the UI thread drains. Each
/// controller's commands must come out in the order it sent them.
///
/// **BUG THIS CATCHES**: Would catch lost or duplicated commands under contention, or a
/// reordering between enqueue and dequeue.
#[test]
fn given_concurrent_producers_when_single_consumer_drains_then_each_producer_order_preserved() {
    // GIVEN
    let queue = Arc::new(CommandQueue::new());

    // WHEN: Producers enqueue while the consumer drains
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    queue.enqueue(Command::open_page(format!("{producer}:{seq}"), "https://x"));
                }
            })
        })
        .collect();

    let mut seen = Vec::with_capacity(PRODUCERS * PER_PRODUCER);
    while seen.len() < PRODUCERS * PER_PRODUCER {
        match queue.dequeue() {
            Some(command) => seen.push(command),
            None => thread::yield_now(),
        }
    }
    for producer in producers {
        producer.join().unwrap();
    }

    // THEN: Nothing left, nothing lost, per-producer sequence strictly increasing
    assert!(queue.dequeue().is_none());
    let mut last_seq: HashMap<usize, usize> = HashMap::new();
    for command in &seen {
        let id = command.command_id().expect("OpenPage carries an id");
        let (producer, seq) = id.split_once(':').unwrap();
        let (producer, seq): (usize, usize) = (producer.parse().unwrap(), seq.parse().unwrap());
        if let Some(previous) = last_seq.insert(producer, seq) {
            assert!(seq > previous, "producer {producer} reordered: {previous} then {seq}");
        } else {
            assert_eq!(seq, 0, "producer {producer} lost its first command");
        }
    }
    assert_eq!(last_seq.len(), PRODUCERS);
    assert!(last_seq.values().all(|&seq| seq == PER_PRODUCER - 1));
}
