/*!
 * Adaptive pacing between fallback chunks.
 *
 * Keeps the latencies of the last batch requests and nudges the delay down
 * while the endpoint is fast and up while it is slow.
 */

use std::collections::VecDeque;
use std::time::Duration;
use log::debug;
use parking_lot::Mutex;

/// Number of latencies kept
pub const LATENCY_WINDOW: usize = 20;

const FAST_MEAN_MS: f64 = 500.0;
const SLOW_MEAN_MS: f64 = 2000.0;
const MIN_DELAY_MS: f64 = 50.0;
const MAX_DELAY_MS: f64 = 500.0;
const SPEED_UP: f64 = 0.9;
const SLOW_DOWN: f64 = 1.2;

#[derive(Debug)]
struct PacerState {
    latencies: VecDeque<Duration>,
    delay_ms: f64,
}

/// Latency-driven delay shared by the batches of one job
#[derive(Debug)]
pub struct AdaptivePacer {
    state: Mutex<PacerState>,
}

impl AdaptivePacer {
    /// Create a pacer starting at `initial_delay`
    pub fn new(initial_delay: Duration) -> Self {
        Self {
            state: Mutex::new(PacerState {
                latencies: VecDeque::with_capacity(LATENCY_WINDOW),
                delay_ms: initial_delay.as_millis() as f64,
            }),
        }
    }

    /// Record one request latency and return the adjusted delay
    pub fn record(&self, latency: Duration) -> Duration {
        let mut state = self.state.lock();
        if state.latencies.len() == LATENCY_WINDOW {
            state.latencies.pop_front();
        }
        state.latencies.push_back(latency);

        let total: Duration = state.latencies.iter().sum();
        let mean_ms = total.as_secs_f64() * 1000.0 / state.latencies.len() as f64;

        if mean_ms < FAST_MEAN_MS {
            state.delay_ms = (state.delay_ms * SPEED_UP).max(MIN_DELAY_MS);
        } else if mean_ms > SLOW_MEAN_MS {
            state.delay_ms = (state.delay_ms * SLOW_DOWN).min(MAX_DELAY_MS);
        }

        debug!("Pacer: mean latency {:.0}ms, delay now {:.0}ms", mean_ms, state.delay_ms);
        Duration::from_millis(state.delay_ms.round() as u64)
    }

    /// Current delay
    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(self.state.lock().delay_ms.round() as u64)
    }

    /// Mean of the recorded latencies, if any
    pub fn mean_latency(&self) -> Option<Duration> {
        let state = self.state.lock();
        if state.latencies.is_empty() {
            return None;
        }
        let total: Duration = state.latencies.iter().sum();
        Some(total / state.latencies.len() as u32)
    }

    /// Number of latencies currently held
    pub fn samples(&self) -> usize {
        self.state.lock().latencies.len()
    }
}
