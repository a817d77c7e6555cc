//! Allocation-free generation and beat tracking.
//!
//! Once a generation job is built, stepping it must not touch the heap,
//! and neither may polling the beat tracker.
//!
//! Runs under plain `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use std::path::PathBuf;
use sx_engine::{StepStatus, WorkBudget};
use sx_master::{EngineConfig, SynthEngine};

fn load(name: &str) -> SynthEngine {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/songs").join(name);
    SynthEngine::load(&path, EngineConfig::default()).unwrap()
}

#[test]
fn generation_steps_alloc_free() {
    let engine = load("minimal.json");
    let mut job = engine.job();

    assert_no_alloc(|| {
        while job.step(&mut WorkBudget::new(3)) == StepStatus::Pending {}
    });
    assert!(job.is_done());
}

#[test]
fn beat_polling_alloc_free() {
    let engine = load("planet.json");
    let mut tracker = engine.beat_tracker();
    let song = engine.song().clone();

    assert_no_alloc(|| {
        for i in 1..(60 * 30) {
            tracker.poll(&song, i as f64 / 60.0);
        }
    });
}
