/*!
 * Line splitting.
 *
 * Turns raw file text into ordered line tasks. Every task remembers the
 * position of its line in the file, so results can be written back in place
 * no matter in which order they arrive.
 */

use crate::errors::TranslationError;
use crate::file_utils::BYTE_ORDER_MARK;

/// One translatable input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTask {
    /// Zero-based position of the line in the file
    pub index: usize,
    /// Trimmed, non-empty line content
    pub text: String,
}

impl LineTask {
    /// Create a new line task
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Result of splitting a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDocument {
    /// Translatable lines in file order
    pub tasks: Vec<LineTask>,
    /// Positions of lines that are empty after trimming
    pub blank_indices: Vec<usize>,
    /// Number of lines in the file, blank ones included
    pub total_lines: usize,
}

impl SplitDocument {
    /// Number of translatable lines
    pub fn translatable_lines(&self) -> usize {
        self.tasks.len()
    }
}

/// Split text on `\n` into line tasks
///
/// Lines are trimmed, which also strips a trailing `\r`. A leading byte-order
/// mark is ignored. Fails with `EmptyInput` when no line has content.
pub fn split_lines(text: &str) -> Result<SplitDocument, TranslationError> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let mut tasks = Vec::new();
    let mut blank_indices = Vec::new();
    let mut total_lines = 0;

    for (index, line) in text.split('\n').enumerate() {
        total_lines += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_indices.push(index);
        } else {
            tasks.push(LineTask::new(index, trimmed));
        }
    }

    if tasks.is_empty() {
        return Err(TranslationError::EmptyInput(format!(
            "{} line(s), none with content",
            total_lines
        )));
    }

    Ok(SplitDocument {
        tasks,
        blank_indices,
        total_lines,
    })
}
