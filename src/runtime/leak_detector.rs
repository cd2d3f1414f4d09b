use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakStats {
    pub objects_created: usize,
    pub objects_freed: usize,
    pub finalizers_run: usize,
    pub resurrections: usize,
    pub finalizers_skipped: usize,
}

impl LeakStats {
    pub fn live_objects(&self) -> usize {
        self.objects_created.saturating_sub(self.objects_freed)
    }
}

static OBJECTS_CREATED: AtomicUsize = AtomicUsize::new(0);
static OBJECTS_FREED: AtomicUsize = AtomicUsize::new(0);
static FINALIZERS_RUN: AtomicUsize = AtomicUsize::new(0);
static RESURRECTIONS: AtomicUsize = AtomicUsize::new(0);
static FINALIZERS_SKIPPED: AtomicUsize = AtomicUsize::new(0);

pub fn record_object_created() {
    OBJECTS_CREATED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_object_freed() {
    OBJECTS_FREED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_finalizer() {
    FINALIZERS_RUN.fetch_add(1, Ordering::Relaxed);
}

pub fn record_resurrection() {
    RESURRECTIONS.fetch_add(1, Ordering::Relaxed);
}

/// A `__Delete` that could not run because no engine was left to run it.
pub fn record_finalizer_skipped() {
    FINALIZERS_SKIPPED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> LeakStats {
    LeakStats {
        objects_created: OBJECTS_CREATED.load(Ordering::Relaxed),
        objects_freed: OBJECTS_FREED.load(Ordering::Relaxed),
        finalizers_run: FINALIZERS_RUN.load(Ordering::Relaxed),
        resurrections: RESURRECTIONS.load(Ordering::Relaxed),
        finalizers_skipped: FINALIZERS_SKIPPED.load(Ordering::Relaxed),
    }
}
