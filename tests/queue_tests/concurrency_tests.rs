//! Tests for concurrent access
//!
//! These tests verify:
//! - Many producers on separate handles lose no items
//! - Per-producer order is preserved
//! - Consumers racing on the same file never see an item twice
//! - Threads sharing one handle are serialized by the in-process mutex

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use fsqueue::{Config, Queue};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shared.q");
    (temp_dir, path)
}

fn parse(payload: &[u8]) -> (usize, usize) {
    let text = std::str::from_utf8(payload).unwrap();
    let (producer, seq) = text.split_once(':').unwrap();
    (producer.parse().unwrap(), seq.parse().unwrap())
}

// =============================================================================
// Producer Tests
// =============================================================================

#[test]
fn test_concurrent_producers_separate_handles() {
    let (_temp, path) = setup_temp_path();
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 100;

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let path = path.clone();
            thread::spawn(move || {
                let queue = Queue::open(&path).unwrap();
                for seq in 0..PER_PRODUCER {
                    queue.enqueue(format!("{}:{}", p, seq).as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let queue = Queue::open(&path).unwrap();
    assert_eq!(queue.count().unwrap() as usize, PRODUCERS * PER_PRODUCER);
    assert_eq!(queue.verify().unwrap().records as usize, PRODUCERS * PER_PRODUCER);

    // Each producer's items come out in the order it wrote them
    let mut last_seen = vec![None; PRODUCERS];
    while let Some(payload) = queue.dequeue().unwrap() {
        let (p, seq) = parse(&payload);
        if let Some(prev) = last_seen[p] {
            assert!(seq > prev, "producer {} out of order: {} after {}", p, seq, prev);
        }
        last_seen[p] = Some(seq);
    }
    assert!(last_seen.iter().all(|s| *s == Some(PER_PRODUCER - 1)));
}

#[test]
fn test_concurrent_producers_shared_handle() {
    let (_temp, path) = setup_temp_path();
    let queue = Arc::new(Queue::open(&path).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..50 {
                    queue.enqueue(format!("{}:{}", p, seq).as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(queue.count().unwrap(), 200);
    assert_eq!(queue.verify().unwrap().records, 200);
}

// =============================================================================
// Consumer Tests
// =============================================================================

#[test]
fn test_concurrent_consumers_no_duplicates() {
    let (_temp, path) = setup_temp_path();
    // Small threshold so compaction runs while consumers race
    let config = Config::builder().compaction_threshold(512).build();
    let total = 400;

    {
        let queue = Queue::open_with_config(&path, config.clone()).unwrap();
        for i in 0..total {
            queue.enqueue(format!("0:{}", i).as_bytes()).unwrap();
        }
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            let config = config.clone();
            thread::spawn(move || {
                let queue = Queue::open_with_config(&path, config).unwrap();
                let mut got = Vec::new();
                while let Some(payload) = queue.dequeue().unwrap() {
                    got.push(parse(&payload).1);
                }
                got
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for h in handles {
        let got = h.join().unwrap();
        // Each consumer sees a strictly increasing subsequence
        assert!(got.windows(2).all(|w| w[0] < w[1]));
        for seq in got {
            assert!(seen.insert(seq), "item {} dequeued twice", seq);
        }
    }

    assert_eq!(seen.len(), total);
    let queue = Queue::open(&path).unwrap();
    assert!(queue.is_empty().unwrap());
}

#[test]
fn test_producers_and_consumers_together() {
    let (_temp, path) = setup_temp_path();
    let config = Config::builder().compaction_threshold(1024).build();
    const PRODUCERS: usize = 3;
    const PER_PRODUCER: usize = 150;

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let path = path.clone();
            let config = config.clone();
            thread::spawn(move || {
                let queue = Queue::open_with_config(&path, config).unwrap();
                for seq in 0..PER_PRODUCER {
                    queue.enqueue(format!("{}:{}", p, seq).as_bytes()).unwrap();
                }
            })
        })
        .collect();

    let consumer = {
        let path = path.clone();
        let config = config.clone();
        thread::spawn(move || {
            let queue = Queue::open_with_config(&path, config).unwrap();
            let mut got = Vec::new();
            while got.len() < PRODUCERS * PER_PRODUCER {
                if let Some(payload) = queue.bdequeue(10).unwrap() {
                    got.push(parse(&payload));
                } else {
                    break;
                }
            }
            got
        })
    };

    for p in producers {
        p.join().unwrap();
    }
    let got = consumer.join().unwrap();

    assert_eq!(got.len(), PRODUCERS * PER_PRODUCER);
    for p in 0..PRODUCERS {
        let seqs: Vec<usize> = got.iter().filter(|(q, _)| *q == p).map(|(_, s)| *s).collect();
        assert_eq!(seqs, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
}
