pub trait Clock: Send + Sync + 'static {
    /// Elapsed process time in seconds since the clock was created.
    fn now(&self) -> f64;
}

pub struct SystemClock {
    started: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Ticks by one on every read; keeps history timestamps deterministic in tests.
pub struct MockClock {
    t: std::sync::atomic::AtomicU64,
}

impl MockClock {
    pub fn new(start: u64) -> Self {
        Self {
            t: std::sync::atomic::AtomicU64::new(start),
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> f64 {
        self.t.fetch_add(1, std::sync::atomic::Ordering::Relaxed) as f64
    }
}
