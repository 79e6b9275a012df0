use std::sync::{Arc, Mutex};
use std::time::Duration;

use silo_core::mocks::{FailingStore, MemoryStore, NoopNotifier};
use silo_core::{Bin, BinManager, Converter, Scheduler, SystemSettings};

fn shared_manager() -> Arc<Mutex<BinManager>> {
    let conv = Converter::try_new(25.0).unwrap();
    let mgr = BinManager::builder()
        .with_notifier(NoopNotifier)
        .with_settings(SystemSettings::default())
        .with_bins(vec![Bin::new(1, "Bin 1", "Wheat H2", 130.0, &conv)])
        .build()
        .unwrap();
    Arc::new(Mutex::new(mgr))
}

#[test]
fn scheduler_flushes_dirty_state_and_joins_on_drop() {
    let manager = shared_manager();
    let store = MemoryStore::default();

    let scheduler = Scheduler::spawn(
        Arc::clone(&manager),
        Box::new(store.clone()),
        Duration::from_millis(5),
        Duration::from_millis(10),
    );

    manager.lock().unwrap().manual_inload(1, 100.0, None).unwrap();
    std::thread::sleep(Duration::from_millis(100));

    assert!(*store.save_count.lock().unwrap() > 0);
    let persisted = store.bins.lock().unwrap().clone();
    assert_eq!(persisted.len(), 1);
    assert!((persisted[0].current_fill_tons - 100.0).abs() < 1e-9);

    drop(scheduler);
    // After the drop both threads are joined; the manager lock is free.
    assert!(manager.lock().unwrap().bins()[0].current_fill_tons > 0.0);
}

#[test]
fn clean_state_is_not_rewritten() {
    let manager = shared_manager();
    let store = MemoryStore::default();

    let scheduler = Scheduler::spawn(
        Arc::clone(&manager),
        Box::new(store.clone()),
        Duration::from_millis(5),
        Duration::from_millis(5),
    );

    // No mutation happened: version never moved, nothing gets saved.
    std::thread::sleep(Duration::from_millis(60));
    drop(scheduler);
    assert_eq!(*store.save_count.lock().unwrap(), 0);
}

#[test]
fn save_failures_do_not_stop_the_scheduler() {
    let manager = shared_manager();

    let scheduler = Scheduler::spawn(
        Arc::clone(&manager),
        Box::new(FailingStore),
        Duration::from_millis(5),
        Duration::from_millis(5),
    );

    manager.lock().unwrap().manual_inload(1, 10.0, None).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    // Ticks kept running and state stayed intact despite failing flushes.
    manager.lock().unwrap().manual_inload(1, 10.0, None).unwrap();
    assert!((manager.lock().unwrap().bins()[0].current_fill_tons - 20.0).abs() < 1e-9);

    drop(scheduler);
}

#[test]
fn rapid_spawn_drop_cycles_leak_no_threads() {
    for _ in 0..10 {
        let manager = shared_manager();
        let scheduler = Scheduler::spawn(
            Arc::clone(&manager),
            Box::new(MemoryStore::default()),
            Duration::from_millis(1),
            Duration::from_millis(2),
        );
        drop(scheduler);
    }
}
