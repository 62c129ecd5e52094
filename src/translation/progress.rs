/*!
 * Result aggregation and progress reporting.
 *
 * `OutputBuffer` holds one slot per input line. Slots start out pending and
 * are written exactly once, either by a batch, the fallback resolver or the
 * verification sweep. `ProgressTracker` turns the slot counts into progress
 * updates for the caller.
 */

use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::lines::SplitDocument;

/// Seconds assumed per round of concurrent batches when estimating
const SECONDS_PER_ROUND: f64 = 1.5;

/// Render a failure marker for a line that could not be translated
pub fn failure_marker(original: &str) -> String {
    format!("[translation failed: {}]", original)
}

/// State of one output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Not written yet
    Pending,
    /// The input line was blank and is passed through
    Blank,
    /// Successful translation
    Translated(String),
    /// Translation failed; keeps the original text
    Failed {
        /// Original line text
        original: String,
    },
}

impl Slot {
    /// Text of this slot in the exported report
    pub fn render(&self) -> String {
        match self {
            Slot::Pending | Slot::Blank => String::new(),
            Slot::Translated(text) => text.clone(),
            Slot::Failed { original } => failure_marker(original),
        }
    }

    /// Whether the slot has not been written
    pub fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }
}

/// Slot tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCounts {
    /// Successfully translated lines
    pub translated: usize,
    /// Lines that failed
    pub failed: usize,
    /// Blank pass-through lines
    pub blank: usize,
    /// Lines not written yet
    pub pending: usize,
    /// All slots
    pub total: usize,
}

impl SlotCounts {
    /// Translatable lines that have been written
    pub fn resolved(&self) -> usize {
        self.translated + self.failed
    }

    /// Percentage of written translatable lines that succeeded; 100 when none were written
    pub fn success_rate(&self) -> f64 {
        let resolved = self.resolved();
        if resolved == 0 {
            100.0
        } else {
            self.translated as f64 / resolved as f64 * 100.0
        }
    }
}

/// Fixed-size, index-addressed result buffer
#[derive(Debug)]
pub struct OutputBuffer {
    slots: Mutex<Vec<Slot>>,
}

impl OutputBuffer {
    /// Create a buffer of `len` pending slots
    pub fn new(len: usize) -> Self {
        Self {
            slots: Mutex::new(vec![Slot::Pending; len]),
        }
    }

    /// Create a buffer for a split document, with blank lines already in place
    pub fn from_document(document: &SplitDocument) -> Self {
        let buffer = Self::new(document.total_lines);
        {
            let mut slots = buffer.slots.lock();
            for &index in &document.blank_indices {
                slots[index] = Slot::Blank;
            }
        }
        buffer
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether the buffer has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Write a translation into a pending slot
    ///
    /// Returns `false` and leaves the slot untouched when it is out of range
    /// or already written.
    pub fn set_translated(&self, index: usize, text: impl Into<String>) -> bool {
        self.write(index, Slot::Translated(text.into()))
    }

    /// Write a failure marker into a pending slot
    pub fn set_failed(&self, index: usize, original: impl Into<String>) -> bool {
        self.write(index, Slot::Failed {
            original: original.into(),
        })
    }

    fn write(&self, index: usize, slot: Slot) -> bool {
        let mut slots = self.slots.lock();
        match slots.get_mut(index) {
            Some(current) if current.is_pending() => {
                *current = slot;
                true
            }
            Some(current) => {
                debug!("Slot {} already holds {:?}; ignoring second write", index, current);
                false
            }
            None => false,
        }
    }

    /// Copy of one slot
    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.slots.lock().get(index).cloned()
    }

    /// Indices of slots still pending, ascending
    pub fn pending_indices(&self) -> Vec<usize> {
        self.slots
            .lock()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_pending())
            .map(|(index, _)| index)
            .collect()
    }

    /// Current tallies
    pub fn counts(&self) -> SlotCounts {
        let slots = self.slots.lock();
        let mut counts = SlotCounts {
            total: slots.len(),
            ..SlotCounts::default()
        };
        for slot in slots.iter() {
            match slot {
                Slot::Pending => counts.pending += 1,
                Slot::Blank => counts.blank += 1,
                Slot::Translated(_) => counts.translated += 1,
                Slot::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    /// Rendered lines in original order
    pub fn render_lines(&self) -> Vec<String> {
        self.slots.lock().iter().map(Slot::render).collect()
    }
}

/// One progress notification
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Translatable lines written so far, failures included
    pub lines_translated: usize,
    /// Translatable lines in the job
    pub total_lines: usize,
    /// Completion percentage, 0 to 100
    pub percentage: u8,
    /// Human-readable status
    pub status_message: String,
    /// Time since the job started
    pub elapsed: Duration,
    /// Projected time to completion, once anything has been written
    pub estimated_remaining: Option<Duration>,
    /// Percentage of written lines that succeeded
    pub success_rate: f64,
}

/// Progress callback type
pub type ProgressCallback = Arc<dyn Fn(&ProgressUpdate) + Send + Sync>;

/// Builds progress updates and forwards them to an optional callback
pub struct ProgressTracker {
    callback: Option<ProgressCallback>,
    started: Instant,
    total_lines: usize,
}

impl ProgressTracker {
    /// Create a tracker for `total_lines` translatable lines, starting the clock now
    pub fn new(callback: Option<ProgressCallback>, total_lines: usize) -> Self {
        Self {
            callback,
            started: Instant::now(),
            total_lines,
        }
    }

    /// Time since the tracker was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Build an update from slot counts
    pub fn snapshot(&self, counts: &SlotCounts, status: impl Into<String>) -> ProgressUpdate {
        let resolved = counts.resolved().min(self.total_lines);
        let elapsed = self.elapsed();
        let percentage = if self.total_lines == 0 {
            100
        } else {
            ((resolved as f64 / self.total_lines as f64) * 100.0).round() as u8
        };
        let estimated_remaining = (resolved > 0).then(|| {
            let per_line = elapsed.as_secs_f64() / resolved as f64;
            Duration::from_secs_f64(per_line * (self.total_lines - resolved) as f64)
        });

        ProgressUpdate {
            lines_translated: resolved,
            total_lines: self.total_lines,
            percentage,
            status_message: status.into(),
            elapsed,
            estimated_remaining,
            success_rate: counts.success_rate(),
        }
    }

    /// Emit an update for the current buffer state
    pub fn report(&self, buffer: &OutputBuffer, status: impl Into<String>) -> ProgressUpdate {
        let update = self.snapshot(&buffer.counts(), status);
        if let Some(callback) = &self.callback {
            callback(&update);
        }
        update
    }

    /// Emit a progress update with the standard status line
    pub fn report_progress(&self, buffer: &OutputBuffer) -> ProgressUpdate {
        let counts = buffer.counts();
        let resolved = counts.resolved().min(self.total_lines);
        let provisional = self.snapshot(&counts, String::new());
        let status = match provisional.estimated_remaining {
            Some(remaining) if resolved < self.total_lines => format!(
                "Translated {}/{} lines, success rate {:.1}%, about {} remaining",
                resolved,
                self.total_lines,
                provisional.success_rate,
                format_time(remaining.as_secs_f64())
            ),
            _ => format!("Translated {}/{} lines, success rate {:.1}%", resolved, self.total_lines, provisional.success_rate),
        };
        self.report(buffer, status)
    }
}

/// Format a number of seconds as seconds, minutes or hours
///
/// Below a minute shows whole seconds; minutes and hours are rounded up.
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds < 60.0 {
        format!("{}s", seconds.round() as u64)
    } else if seconds < 3600.0 {
        format!("{}min", (seconds / 60.0).ceil() as u64)
    } else {
        format!("{}h", (seconds / 3600.0).ceil() as u64)
    }
}

/// Rough duration of a job before it starts
///
/// `ceil(ceil(lines / batch_size) / max_concurrent)` rounds of 1.5 seconds.
pub fn estimate_duration(translatable_lines: usize, batch_size: usize, max_concurrent: usize) -> Duration {
    let batches = translatable_lines.div_ceil(batch_size.max(1));
    let rounds = batches.div_ceil(max_concurrent.max(1));
    Duration::from_secs_f64(rounds as f64 * SECONDS_PER_ROUND)
}
