//! Cold-start concurrency tests for the model resource
//!
//! N callers racing the first initialization must trigger exactly one load
//! attempt and all observe its outcome, whether it succeeds or fails.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use recon3d::model::{MockModel, ModelResource, ReconstructionModel};
use recon3d::WorkerError;

const RACERS: usize = 8;
/// Long enough that all racers enter `get_or_init` while the load is running.
const LOAD_TIME: Duration = Duration::from_millis(200);

#[test]
fn concurrent_cold_start_initializes_once() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let resource = Arc::new(ModelResource::new(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(LOAD_TIME);
        Ok(Arc::new(MockModel::new()) as Arc<dyn ReconstructionModel>)
    })));

    let barrier = Arc::new(Barrier::new(RACERS));
    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let resource = Arc::clone(&resource);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                resource.get_or_init().map(|model| model.name().to_string())
            })
        })
        .collect();

    for handle in handles {
        let outcome = handle.join().unwrap();
        assert_eq!(outcome.unwrap(), "mock");
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(resource.is_ready());
}

#[test]
fn concurrent_cold_start_shares_a_failure() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let resource = Arc::new(ModelResource::new(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(LOAD_TIME);
        Err(WorkerError::Initialization {
            reason: "weights corrupt".to_string(),
        })
    })));

    let barrier = Arc::new(Barrier::new(RACERS));
    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let resource = Arc::clone(&resource);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                resource.get_or_init().map(|_| ())
            })
        })
        .collect();

    for handle in handles {
        let err = handle.join().unwrap().unwrap_err();
        assert_eq!(err.error_code(), "INITIALIZATION_ERROR");
        assert!(err.to_string().contains("weights corrupt"));
    }

    // One attempt for the whole window; the failure does not poison the
    // process -- the next caller retries.
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(!resource.is_ready());

    let err = resource.get_or_init().map(|_| ()).unwrap_err();
    assert!(err.to_string().contains("weights corrupt"));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn ready_handle_is_never_reconstructed() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let resource = Arc::new(ModelResource::new(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockModel::new()) as Arc<dyn ReconstructionModel>)
    })));

    let first = resource.get_or_init().unwrap();
    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let resource = Arc::clone(&resource);
            thread::spawn(move || resource.get_or_init().unwrap())
        })
        .collect();

    for handle in handles {
        let model = handle.join().unwrap();
        assert!(Arc::ptr_eq(&first, &model));
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
