/*!
 * Batching of line tasks into composite requests.
 *
 * A batch is serialized by joining its task texts with `SEPARATOR`; the model
 * is asked to keep the separators, and its answer is split back into one
 * segment per task. Missing or blank segments are reported as unmatched so
 * the caller can retry those lines one by one.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use super::lines::LineTask;

/// Separator placed between lines of a composite text
pub const SEPARATOR: &str = "\n---\n";

/// Separator as it comes back from the model; tolerates `\r\n` and stray spaces
static SEPARATOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r?\n[ \t]*---[ \t]*\r?\n").unwrap()
});

/// An ordered group of line tasks sent as one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position of this batch in the job
    pub number: usize,
    tasks: Vec<LineTask>,
}

/// Outcome of splitting a composite response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSplit {
    /// Tasks with a non-blank segment, paired with the trimmed segment
    pub resolved: Vec<(LineTask, String)>,
    /// Tasks whose segment is missing or blank
    pub unmatched: Vec<LineTask>,
    /// Segments beyond the number of tasks, which are dropped
    pub extra_segments: usize,
}

impl BatchSplit {
    /// Whether every task got a segment
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }
}

impl Batch {
    /// Create a batch from tasks
    pub fn new(number: usize, tasks: Vec<LineTask>) -> Self {
        Self { number, tasks }
    }

    /// Tasks in this batch
    pub fn tasks(&self) -> &[LineTask] {
        &self.tasks
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the batch has no tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Join task texts into one composite request text
    pub fn compose(&self) -> String {
        self.tasks
            .iter()
            .map(|task| task.text.as_str())
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// Split a composite response back into per-task segments
    pub fn split_response(&self, response: &str) -> BatchSplit {
        let segments: Vec<&str> = SEPARATOR_PATTERN.split(response.trim()).map(str::trim).collect();
        let mut split = BatchSplit {
            extra_segments: segments.len().saturating_sub(self.tasks.len()),
            ..BatchSplit::default()
        };

        for (position, task) in self.tasks.iter().enumerate() {
            match segments.get(position) {
                Some(segment) if !segment.is_empty() => {
                    split.resolved.push((task.clone(), segment.to_string()));
                }
                _ => split.unmatched.push(task.clone()),
            }
        }

        if split.extra_segments > 0 {
            warn!(
                "Batch {} response has {} segment(s) more than its {} line(s); extras dropped",
                self.number + 1,
                split.extra_segments,
                self.tasks.len()
            );
        }

        split
    }
}

/// Group tasks into batches of at most `batch_size`, preserving order
pub fn create_batches(tasks: &[LineTask], batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    tasks
        .chunks(batch_size)
        .enumerate()
        .map(|(number, chunk)| Batch::new(number, chunk.to_vec()))
        .collect()
}
