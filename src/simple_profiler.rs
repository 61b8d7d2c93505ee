//! Simple profiling guards using thread-local storage
//!
//! This module provides lightweight profiling without changing function signatures.
//! Enable with environment variable: TRON_PROFILE=1

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

thread_local! {
    static EXPAND_TIME: RefCell<u64> = RefCell::new(0);
    static EXPAND_COUNT: RefCell<usize> = RefCell::new(0);

    static EVAL_TIME: RefCell<u64> = RefCell::new(0);
    static EVAL_COUNT: RefCell<usize> = RefCell::new(0);

    static BACKPROP_TIME: RefCell<u64> = RefCell::new(0);
    static BACKPROP_COUNT: RefCell<usize> = RefCell::new(0);
}

// Global aggregators
static GLOBAL_EXPAND_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_EXPAND_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_EVAL_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_EVAL_COUNT: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_BACKPROP_TIME: AtomicU64 = AtomicU64::new(0);
static GLOBAL_BACKPROP_COUNT: AtomicUsize = AtomicUsize::new(0);

static PROFILING_ENABLED: OnceLock<bool> = OnceLock::new();

#[inline]
pub fn is_profiling_enabled() -> bool {
    *PROFILING_ENABLED.get_or_init(|| std::env::var("TRON_PROFILE").is_ok())
}

pub struct ProfileGuard {
    start: Instant,
    category: &'static str,
}

impl ProfileGuard {
    pub fn new(category: &'static str) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;

        match self.category {
            "expand" => {
                EXPAND_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                EXPAND_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            "evaluate" => {
                EVAL_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                EVAL_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            "backprop" => {
                BACKPROP_TIME.with(|t| *t.borrow_mut() += elapsed_ns);
                BACKPROP_COUNT.with(|c| *c.borrow_mut() += 1);
            }
            _ => {}
        }
    }
}

fn drain(time: &'static std::thread::LocalKey<RefCell<u64>>, global: &AtomicU64) {
    time.with(|t| {
        global.fetch_add(*t.borrow(), Ordering::Relaxed);
        *t.borrow_mut() = 0;
    });
}

fn drain_count(count: &'static std::thread::LocalKey<RefCell<usize>>, global: &AtomicUsize) {
    count.with(|c| {
        global.fetch_add(*c.borrow(), Ordering::Relaxed);
        *c.borrow_mut() = 0;
    });
}

/// Folds this thread's counters into the global totals
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    drain(&EXPAND_TIME, &GLOBAL_EXPAND_TIME);
    drain_count(&EXPAND_COUNT, &GLOBAL_EXPAND_COUNT);
    drain(&EVAL_TIME, &GLOBAL_EVAL_TIME);
    drain_count(&EVAL_COUNT, &GLOBAL_EVAL_COUNT);
    drain(&BACKPROP_TIME, &GLOBAL_BACKPROP_TIME);
    drain_count(&BACKPROP_COUNT, &GLOBAL_BACKPROP_COUNT);
}

fn print_line(label: &str, time_ns: u64, count: usize, total_ns: u64) {
    let ms = time_ns as f64 / 1_000_000.0;
    let pct = if total_ns > 0 { 100.0 * time_ns as f64 / total_ns as f64 } else { 0.0 };
    let avg_us = if count > 0 { time_ns as f64 / (count * 1000) as f64 } else { 0.0 };
    eprintln!(
        "  {:<10} {:>10.2}ms ({:>5.1}%) - {} calls, {:.2}µs avg",
        label, ms, pct, count, avg_us
    );
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    print_line(
        "Expand",
        GLOBAL_EXPAND_TIME.load(Ordering::Relaxed),
        GLOBAL_EXPAND_COUNT.load(Ordering::Relaxed),
        total_ns,
    );
    // Evaluation runs inside backprop, so its share overlaps the line below.
    print_line(
        "Evaluate",
        GLOBAL_EVAL_TIME.load(Ordering::Relaxed),
        GLOBAL_EVAL_COUNT.load(Ordering::Relaxed),
        total_ns,
    );
    print_line(
        "Backprop",
        GLOBAL_BACKPROP_TIME.load(Ordering::Relaxed),
        GLOBAL_BACKPROP_COUNT.load(Ordering::Relaxed),
        total_ns,
    );

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

pub fn reset() {
    GLOBAL_EXPAND_TIME.store(0, Ordering::Relaxed);
    GLOBAL_EXPAND_COUNT.store(0, Ordering::Relaxed);
    GLOBAL_EVAL_TIME.store(0, Ordering::Relaxed);
    GLOBAL_EVAL_COUNT.store(0, Ordering::Relaxed);
    GLOBAL_BACKPROP_TIME.store(0, Ordering::Relaxed);
    GLOBAL_BACKPROP_COUNT.store(0, Ordering::Relaxed);
}
