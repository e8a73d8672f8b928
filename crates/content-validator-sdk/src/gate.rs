//! Pre-flight checks on a submission
//!
//! Pure functions only: nothing here touches the network or shared state.

use crate::config::SubmissionLimits;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Text to score plus the word threshold it must meet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub content: String,
    pub min_words: usize,
}

impl SubmissionRequest {
    pub fn new(content: impl Into<String>, min_words: usize) -> Self {
        Self {
            content: content.into(),
            min_words,
        }
    }

    /// Request using the configured default threshold
    pub fn with_default_threshold(content: impl Into<String>, limits: &SubmissionLimits) -> Self {
        Self::new(content, limits.min_words_default)
    }
}

/// Number of whitespace-separated words
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Length in characters, as shown to the user
pub fn char_count(content: &str) -> usize {
    content.chars().count()
}

/// Check a request, reporting the first rule it breaks.
///
/// Order: empty content, too few words, too long, non-positive threshold.
pub fn validate(request: &SubmissionRequest, limits: &SubmissionLimits) -> Result<(), ValidationError> {
    if request.content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }

    let words = word_count(&request.content);
    if words < request.min_words {
        return Err(ValidationError::TooFewWords {
            have: words,
            need: request.min_words,
        });
    }

    let chars = char_count(&request.content);
    if chars > limits.max_chars {
        return Err(ValidationError::TooLong {
            have: chars,
            max: limits.max_chars,
        });
    }

    if request.min_words == 0 {
        return Err(ValidationError::InvalidThreshold);
    }

    Ok(())
}
