//! crates/tp_store/src/reporter.rs
//! The "reporter" spec §4.3's `Warn` tick policy emits through. Realized as
//! a small trait (SPEC_FULL §4.13) rather than a hardcoded logging backend,
//! so tests can substitute a capturing reporter without pulling one in.

use tp_core::ids::CanonicalTick;

pub trait TickPolicyReporter {
    fn warn_tick_regression(&self, stream_canonical: &str, last_tick: CanonicalTick, new_tick: CanonicalTick);
}

/// Default reporter: emits a `tracing::warn!` event and nothing else.
pub struct TracingReporter;

impl TickPolicyReporter for TracingReporter {
    fn warn_tick_regression(&self, stream_canonical: &str, last_tick: CanonicalTick, new_tick: CanonicalTick) {
        tracing::warn!(
            stream = stream_canonical,
            last_tick = last_tick.get(),
            new_tick = new_tick.get(),
            "tick regression under TickPolicy::Warn"
        );
    }
}

/// A reporter that records every warning instead of emitting it, for tests.
#[derive(Default)]
pub struct CapturingReporter {
    pub warnings: std::sync::Mutex<Vec<(String, i64, i64)>>,
}

impl TickPolicyReporter for CapturingReporter {
    fn warn_tick_regression(&self, stream_canonical: &str, last_tick: CanonicalTick, new_tick: CanonicalTick) {
        self.warnings
            .lock()
            .expect("CapturingReporter lock poisoned")
            .push((stream_canonical.to_string(), last_tick.get(), new_tick.get()));
    }
}
