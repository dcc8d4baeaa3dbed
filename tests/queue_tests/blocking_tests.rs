//! Tests for Blocking Dequeue
//!
//! These tests verify:
//! - Immediate return when data is present
//! - Timeout on a permanently empty queue
//! - Wake-up when another handle enqueues during the wait
//! - Errors abort the poll loop instead of being retried

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fsqueue::{Config, Queue, QueueError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const POLL: Duration = Duration::from_millis(20);

fn setup_temp_queue() -> (TempDir, PathBuf, Queue) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("blocking.q");
    let config = Config::builder().poll_interval(POLL).build();
    let queue = Queue::open_with_config(&path, config).unwrap();
    (temp_dir, path, queue)
}

// =============================================================================
// Basic Tests
// =============================================================================

#[test]
fn test_bdequeue_returns_immediately_with_data() {
    let (_temp, _path, queue) = setup_temp_queue();
    queue.enqueue(b"ready").unwrap();

    let started = Instant::now();
    let result = queue.bdequeue(5).unwrap();

    assert_eq!(result, Some(b"ready".to_vec()));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_bdequeue_times_out_on_empty_queue() {
    let (_temp, _path, queue) = setup_temp_queue();

    let started = Instant::now();
    let result = queue.bdequeue(1).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(result, None);
    assert!(elapsed >= Duration::from_secs(1), "returned after {:?}", elapsed);
    // One poll interval plus scheduling slack
    assert!(elapsed < Duration::from_secs(1) + POLL + Duration::from_millis(500));
}

#[test]
fn test_dequeue_timeout_subsecond() {
    let (_temp, _path, queue) = setup_temp_queue();

    let started = Instant::now();
    let result = queue.dequeue_timeout(Some(Duration::from_millis(100))).unwrap();

    assert_eq!(result, None);
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[test]
fn test_dequeue_timeout_zero_tries_once() {
    let (_temp, _path, queue) = setup_temp_queue();

    assert_eq!(queue.dequeue_timeout(Some(Duration::ZERO)).unwrap(), None);

    queue.enqueue(b"x").unwrap();
    assert_eq!(
        queue.dequeue_timeout(Some(Duration::ZERO)).unwrap(),
        Some(b"x".to_vec())
    );
}

// =============================================================================
// Wake-up Tests
// =============================================================================

#[test]
fn test_bdequeue_sees_enqueue_from_other_handle() {
    let (_temp, path, queue) = setup_temp_queue();

    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        let other = Queue::open(&path).unwrap();
        other.enqueue(b"late").unwrap();
    });

    let result = queue.bdequeue(5).unwrap();
    producer.join().unwrap();

    assert_eq!(result, Some(b"late".to_vec()));
}

#[test]
fn test_bdequeue_forever_with_shared_handle() {
    let (_temp, _path, queue) = setup_temp_queue();
    let queue = Arc::new(queue);

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.bdequeue(0).unwrap())
    };

    thread::sleep(Duration::from_millis(100));
    queue.enqueue(b"eventually").unwrap();

    assert_eq!(consumer.join().unwrap(), Some(b"eventually".to_vec()));
}

// =============================================================================
// Error Propagation Tests
// =============================================================================

#[test]
fn test_bdequeue_propagates_corruption() {
    let (_temp, path, queue) = setup_temp_queue();
    queue.enqueue(b"payload").unwrap();

    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(12)).unwrap();
    file.write_all(&[0xff; 4]).unwrap();

    // Forever-timeout: an error must end the loop rather than spin
    let err = queue.bdequeue(0).unwrap_err();
    assert!(matches!(err, QueueError::IndexCorrupt { .. }));
}

#[test]
fn test_bdequeue_after_delete_fails_fast() {
    let (_temp, _path, queue) = setup_temp_queue();
    queue.delete().unwrap();

    let started = Instant::now();
    assert!(matches!(queue.bdequeue(0), Err(QueueError::Deleted)));
    assert!(started.elapsed() < Duration::from_secs(1));
}
