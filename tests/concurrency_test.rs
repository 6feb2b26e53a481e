//! Concurrency tests for the chat directory.
//!
//! These tests verify that directory operations stay atomic when many
//! callers race on the same names.

use std::sync::{Arc, Barrier};
use std::thread;

use confab::Directory;

/// Number of callers racing in each test.
const NUM_CALLERS: usize = 16;

/// Test that concurrent room creation has exactly one winner.
#[test]
fn test_concurrent_create_room_single_winner() {
    let directory = Arc::new(Directory::new());
    let barrier = Arc::new(Barrier::new(NUM_CALLERS));

    let handles: Vec<_> = (0..NUM_CALLERS)
        .map(|_| {
            let directory = Arc::clone(&directory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                directory.create_room("x")
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|created| *created)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(directory.room_count(), 1);
}

/// Test that concurrent registration of one username has exactly one winner.
#[test]
fn test_concurrent_add_client_single_winner() {
    let directory = Arc::new(Directory::new());
    let barrier = Arc::new(Barrier::new(NUM_CALLERS));

    let handles: Vec<_> = (0..NUM_CALLERS)
        .map(|_| {
            let directory = Arc::clone(&directory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                directory.add_client("alice").is_some()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|added| *added)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(directory.user_count(), 1);
}

/// Test concurrent posting from tokio tasks.
///
/// Every successful post must land exactly once, and each author's messages
/// must keep their relative order.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_message() {
    const NUM_MESSAGES: usize = 25;

    let directory = Arc::new(Directory::with_rooms(["general"]));
    for i in 0..NUM_CALLERS {
        let username = format!("user{i}");
        directory.add_client(&username).unwrap();
        assert!(directory.join_room(&username, "general"));
    }

    let mut handles = Vec::new();
    for i in 0..NUM_CALLERS {
        let directory = Arc::clone(&directory);
        handles.push(tokio::spawn(async move {
            let username = format!("user{i}");
            for n in 0..NUM_MESSAGES {
                assert!(directory.add_message(&username, "general", &n.to_string()));
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let messages = directory.get_messages("general").unwrap();
    assert_eq!(messages.len(), NUM_CALLERS * NUM_MESSAGES);

    for i in 0..NUM_CALLERS {
        let username = format!("user{i}");
        let bodies: Vec<usize> = messages
            .iter()
            .filter(|m| m.author() == username)
            .map(|m| m.body().parse().unwrap())
            .collect();
        assert_eq!(bodies, (0..NUM_MESSAGES).collect::<Vec<_>>());
    }
}

/// Test that membership stays symmetric under racing joins, leaves and
/// removals.
#[test]
fn test_concurrent_membership_symmetry() {
    const ROUNDS: usize = 200;
    let rooms = ["a", "b", "c", "d"];

    let directory = Arc::new(Directory::with_rooms(rooms));
    let barrier = Arc::new(Barrier::new(NUM_CALLERS));

    let handles: Vec<_> = (0..NUM_CALLERS)
        .map(|i| {
            let directory = Arc::clone(&directory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let username = format!("user{}", i % 4);
                barrier.wait();
                for round in 0..ROUNDS {
                    let room = rooms[(i + round) % rooms.len()];
                    match (i + round) % 7 {
                        0 => {
                            directory.add_client(&username);
                        }
                        1 | 2 => {
                            directory.join_room(&username, room);
                        }
                        3 => {
                            directory.leave_room(&username, room);
                        }
                        4 => {
                            directory.remove_room(room);
                        }
                        5 => {
                            directory.create_room(room);
                        }
                        _ => {
                            directory.remove_client(&username);
                        }
                    }
                    if round % 50 == 0 {
                        directory.snapshot().check_membership_symmetry().unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    directory.snapshot().check_membership_symmetry().unwrap();
}
