#![allow(missing_docs)]

use pagetree::{BTree, Result};
use std::cmp::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;

const NUM_THREADS: usize = 8;
const KEYS_PER_THREAD: u64 = 250;

#[test]
fn concurrent_disjoint_inserts() -> Result<()> {
    let tree: Arc<BTree<u64, u64>> = Arc::new(BTree::new(4)?);
    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let mut handles = vec![];

    for thread_id in 0..NUM_THREADS as u64 {
        let tree = Arc::clone(&tree);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut accepted = 0;
            for i in 0..KEYS_PER_THREAD {
                let key = i * NUM_THREADS as u64 + thread_id;
                if tree.insert(key, key + 1) {
                    accepted += 1;
                }
            }
            accepted
        }));
    }

    let mut total = 0;
    for handle in handles {
        total += handle.join().expect("insert thread panicked");
    }

    let expected = NUM_THREADS as u64 * KEYS_PER_THREAD;
    assert_eq!(total, expected);
    assert_eq!(tree.len() as u64, expected);
    tree.verify()?;
    let keys: Vec<u64> = tree.iter().map(|e| *e.key()).collect();
    assert_eq!(keys, (0..expected).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn concurrent_duplicate_inserts_accept_exactly_once() -> Result<()> {
    let tree: Arc<BTree<u32, usize>> = Arc::new(BTree::new(3)?);
    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let mut handles = vec![];

    for thread_id in 0..NUM_THREADS {
        let tree = Arc::clone(&tree);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            (0..100u32).filter(|&key| tree.insert(key, thread_id)).count()
        }));
    }

    let total: usize = handles
        .into_iter()
        .map(|h| h.join().expect("insert thread panicked"))
        .sum();
    assert_eq!(total, 100);
    assert_eq!(tree.len(), 100);
    assert_eq!(tree.stats_snapshot().duplicate_rejections, 700);
    tree.verify()?;
    Ok(())
}

#[test]
fn readers_and_writers_interleave() -> Result<()> {
    let tree: Arc<BTree<u64, u64>> = Arc::new(BTree::new(3)?);
    tree.insert_many((0..500).map(|k| (k, k)));
    let barrier = Arc::new(Barrier::new(4));
    let mut handles = vec![];

    for writer in 0..2u64 {
        let tree = Arc::clone(&tree);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for key in (writer..500).step_by(2) {
                assert!(tree.remove(&key, &key));
            }
        }));
    }
    for _ in 0..2 {
        let tree = Arc::clone(&tree);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..50 {
                let snapshot = tree.snapshot();
                let keys: Vec<u64> = snapshot.iter().map(|e| *e.key()).collect();
                assert!(keys.windows(2).all(|w| w[0] < w[1]));
                let _ = tree.search(&250);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("worker panicked");
    }
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 1);
    tree.verify()?;
    Ok(())
}

#[test]
fn opposite_order_comparisons_do_not_deadlock() -> Result<()> {
    let left: Arc<BTree<u32, u32>> = Arc::new(BTree::new(3)?);
    let right: Arc<BTree<u32, u32>> = Arc::new(BTree::new(3)?);
    left.insert_many((0..64).map(|k| (k, k)));
    right.insert_many((0..64).map(|k| (k, k)));
    assert!(right.insert(64, 64));

    let barrier = Arc::new(Barrier::new(2));
    let spawn = |a: Arc<BTree<u32, u32>>, b: Arc<BTree<u32, u32>>, expected: Ordering| {
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..200 {
                assert_eq!(a.compare(&b), Some(expected));
            }
        })
    };
    let forward = spawn(Arc::clone(&left), Arc::clone(&right), Ordering::Less);
    let backward = spawn(Arc::clone(&right), Arc::clone(&left), Ordering::Greater);
    forward.join().expect("forward comparison panicked");
    backward.join().expect("backward comparison panicked");
    Ok(())
}
