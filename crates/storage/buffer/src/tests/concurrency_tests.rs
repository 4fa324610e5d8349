use super::pool_of;
use page::page_id::PageId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn many_concurrent_readers_share_one_page() {
    let pool = Arc::new(pool_of(4, 2));
    let page_id = {
        let mut guard = pool.new_page();
        guard[0..3].copy_from_slice(b"xyz");
        guard.page_id()
    };

    let barrier = Arc::new(Barrier::new(10));
    let mut handles = Vec::new();

    for _ in 0..10 {
        let pool = Arc::clone(&pool);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let guard = pool.read_page(page_id);
            assert_eq!(&guard[0..3], b"xyz");
            assert!(pool.get_pin_count(page_id).unwrap() >= 1);
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(pool.get_pin_count(page_id), Some(0));
    assert_eq!(pool.evictable_count(), 1);
}

#[test]
fn concurrent_page_creation_keeps_data_intact() {
    let pool = Arc::new(pool_of(10, 2));
    let mut handles = Vec::new();

    for i in 0..5u8 {
        let pool = Arc::clone(&pool);
        handles.push(thread::spawn(move || {
            let mut guard = pool.new_page();
            guard[0] = i;
            guard.page_id()
        }));
    }

    let page_ids: Vec<(u8, PageId)> = handles
        .into_iter()
        .enumerate()
        .map(|(i, handle)| (i as u8, handle.join().unwrap()))
        .collect();

    pool.flush_all_pages();

    for (expected, page_id) in page_ids {
        let guard = pool.read_page(page_id);
        assert_eq!(guard[0], expected, "data corruption on page {page_id}");
    }
}

#[test]
fn writer_excludes_readers_until_dropped() {
    let pool = Arc::new(pool_of(2, 2));
    let page_id = pool.new_page().page_id();

    let mut writer = pool.write_page(page_id);
    writer[0] = 1;

    let writer_done = Arc::new(AtomicBool::new(false));
    let reader = {
        let pool = Arc::clone(&pool);
        let writer_done = Arc::clone(&writer_done);
        thread::spawn(move || {
            // Blocks until the writer guard drops.
            let guard = pool.read_page(page_id);
            assert!(writer_done.load(Ordering::Acquire));
            guard[0]
        })
    };

    thread::sleep(std::time::Duration::from_millis(50));
    writer[0] = 2;
    writer_done.store(true, Ordering::Release);
    drop(writer);

    assert_eq!(reader.join().unwrap(), 2);
    assert_eq!(pool.get_pin_count(page_id), Some(0));
}

#[test]
fn pin_counts_balance_under_mixed_load() {
    let pool = Arc::new(pool_of(8, 2));
    let mut seed_pages = Vec::new();
    for _ in 0..4 {
        seed_pages.push(pool.new_page().page_id());
    }
    let seed_pages = Arc::new(seed_pages);

    let mut handles = Vec::new();
    for worker in 0..8usize {
        let pool = Arc::clone(&pool);
        let seed_pages = Arc::clone(&seed_pages);
        handles.push(thread::spawn(move || {
            for round in 0..50 {
                let page_id = seed_pages[(worker + round) % seed_pages.len()];
                if (worker + round) % 2 == 0 {
                    let guard = pool.read_page(page_id);
                    let _ = guard[0];
                } else {
                    let mut guard = pool.write_page(page_id);
                    guard[worker] = round as u8;
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Every guard is gone: all pins must be back to zero and every resident
    // page evictable again.
    for &page_id in seed_pages.iter() {
        assert_eq!(pool.get_pin_count(page_id), Some(0));
    }
    assert_eq!(pool.evictable_count(), 4);
}

#[test]
fn eviction_pressure_with_concurrent_fetches_converges() {
    // More pages than frames, hammered from several threads: every fetch
    // must either succeed or report out-of-frames, and the pool must end
    // balanced.
    let pool = Arc::new(pool_of(3, 2));
    let mut seed_pages = Vec::new();
    for i in 0..6u8 {
        let mut guard = pool.new_page();
        guard[0] = i;
        seed_pages.push(guard.page_id());
    }
    let seed_pages = Arc::new(seed_pages);

    let mut handles = Vec::new();
    for worker in 0..4usize {
        let pool = Arc::clone(&pool);
        let seed_pages = Arc::clone(&seed_pages);
        handles.push(thread::spawn(move || {
            for round in 0..100 {
                let index = (worker * 31 + round) % seed_pages.len();
                if let Some(guard) = pool.checked_read_page(seed_pages[index]) {
                    assert_eq!(guard[0], index as u8);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let resident: usize = seed_pages
        .iter()
        .filter(|page_id| pool.get_pin_count(**page_id).is_some())
        .count();
    assert_eq!(resident, 3);
    assert_eq!(pool.evictable_count(), 3);
}
