//! Parser feedback (warnings, errors, informational notes).
//!
//! Parsing is generous: a bad block or line is skipped and reported, the
//! rest of the project is still read.

use serde::{Deserialize, Serialize};

/// What a feedback record is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCode {
    /// A `<BLOCK` with no matching `>` before end of text.
    BlockUnterminated,
    /// A `>` line with no open block.
    StrayClose,
    /// A region start with no matching end line.
    RegionUnpaired,
    /// A second named start for a region that is still open.
    RegionDuplicate,
    /// No `TEMPO` line; defaults were used.
    MissingTempo,
    /// A numeric field could not be read.
    BadNumber,
    /// The session holds no track with media.
    NoContentFound,
}

/// Feedback from parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub code: FeedbackCode,
    pub message: String,
    /// 1-based line number, 0 when the issue is not tied to a line.
    pub line: usize,
}

impl Feedback {
    pub fn error(code: FeedbackCode, message: impl Into<String>, line: usize) -> Self {
        Feedback {
            level: FeedbackLevel::Error,
            code,
            message: message.into(),
            line,
        }
    }

    pub fn warning(code: FeedbackCode, message: impl Into<String>, line: usize) -> Self {
        Feedback {
            level: FeedbackLevel::Warning,
            code,
            message: message.into(),
            line,
        }
    }

    pub fn info(code: FeedbackCode, message: impl Into<String>, line: usize) -> Self {
        Feedback {
            level: FeedbackLevel::Info,
            code,
            message: message.into(),
            line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLevel {
    /// Content was dropped
    Error,
    /// Parsed with assumptions
    Warning,
    /// Nothing lost, worth knowing
    Info,
}

/// Collector for feedback during parsing
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    feedback: Vec<Feedback>,
    current_line: usize,
}

impl FeedbackCollector {
    pub fn new() -> Self {
        FeedbackCollector {
            feedback: Vec::new(),
            current_line: 0,
        }
    }

    pub fn set_line(&mut self, line: usize) {
        self.current_line = line;
    }

    pub fn error(&mut self, code: FeedbackCode, message: impl Into<String>) {
        self.feedback
            .push(Feedback::error(code, message, self.current_line));
    }

    pub fn warning(&mut self, code: FeedbackCode, message: impl Into<String>) {
        self.feedback
            .push(Feedback::warning(code, message, self.current_line));
    }

    pub fn info(&mut self, code: FeedbackCode, message: impl Into<String>) {
        self.feedback
            .push(Feedback::info(code, message, self.current_line));
    }

    /// Append feedback produced elsewhere (e.g. by the chunk splitter).
    pub fn extend(&mut self, feedback: impl IntoIterator<Item = Feedback>) {
        self.feedback.extend(feedback);
    }

    pub fn has_errors(&self) -> bool {
        self.feedback
            .iter()
            .any(|f| f.level == FeedbackLevel::Error)
    }

    pub fn into_feedback(self) -> Vec<Feedback> {
        self.feedback
    }

    pub fn feedback(&self) -> &[Feedback] {
        &self.feedback
    }
}

/// Result of parsing with feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult<T> {
    pub value: T,
    pub feedback: Vec<Feedback>,
}

impl<T> ParseResult<T> {
    pub fn new(value: T, feedback: Vec<Feedback>) -> Self {
        ParseResult { value, feedback }
    }

    pub fn ok(value: T) -> Self {
        ParseResult {
            value,
            feedback: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseResult<U> {
        ParseResult {
            value: f(self.value),
            feedback: self.feedback,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.feedback
            .iter()
            .any(|f| f.level == FeedbackLevel::Error)
    }

    pub fn has_code(&self, code: FeedbackCode) -> bool {
        self.feedback.iter().any(|f| f.code == code)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Feedback> {
        self.feedback
            .iter()
            .filter(|f| f.level == FeedbackLevel::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Feedback> {
        self.feedback
            .iter()
            .filter(|f| f.level == FeedbackLevel::Error)
    }
}
