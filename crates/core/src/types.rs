//! Domain types for parsed slide documents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One parsed block of a slide document.
///
/// Every non-blank block of the source yields exactly one record, valid or
/// not, so ordinals line up with the blocks a reader sees in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based position of the block in the source document.
    pub ordinal: usize,

    /// The block exactly as it appeared in the source.
    pub raw_text: String,

    /// Parsed content, or the reason the block was rejected.
    pub content: SlideContent,
}

/// Outcome of validating a single block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlideContent {
    /// A `Slide N:` title followed by at least one bullet line.
    Valid {
        title: String,
        bullet_points: Vec<String>,
    },

    /// The block could not be turned into a slide.
    ///
    /// `title` is kept for display only: the block's first line when no
    /// title matched, the trimmed title when bullets were missing.
    Invalid { title: String, reason: InvalidReason },
}

/// Why a block was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// No `Slide <digits>:<title>` line, or the title was blank.
    TitleFormat,
    /// A title was found but no non-empty `-` line followed.
    NoBulletPoints,
}

impl InvalidReason {
    /// Human-readable message for previews and tooltips.
    pub fn message(&self) -> &'static str {
        match self {
            InvalidReason::TitleFormat => "Invalid slide title format",
            InvalidReason::NoBulletPoints => "No bullet points found",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl SlideRecord {
    /// Create a valid record.
    pub fn valid(
        ordinal: usize,
        raw_text: impl Into<String>,
        title: impl Into<String>,
        bullet_points: Vec<String>,
    ) -> Self {
        Self {
            ordinal,
            raw_text: raw_text.into(),
            content: SlideContent::Valid {
                title: title.into(),
                bullet_points,
            },
        }
    }

    /// Create an invalid record.
    pub fn invalid(
        ordinal: usize,
        raw_text: impl Into<String>,
        title: impl Into<String>,
        reason: InvalidReason,
    ) -> Self {
        Self {
            ordinal,
            raw_text: raw_text.into(),
            content: SlideContent::Invalid {
                title: title.into(),
                reason,
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.content, SlideContent::Valid { .. })
    }

    /// Title text; for invalid records this is the diagnostic title.
    pub fn title(&self) -> &str {
        match &self.content {
            SlideContent::Valid { title, .. } | SlideContent::Invalid { title, .. } => title,
        }
    }

    /// Bullet texts, present only on valid records.
    pub fn bullet_points(&self) -> Option<&[String]> {
        match &self.content {
            SlideContent::Valid { bullet_points, .. } => Some(bullet_points),
            SlideContent::Invalid { .. } => None,
        }
    }

    /// Rejection message, present only on invalid records.
    pub fn error_message(&self) -> Option<&'static str> {
        match &self.content {
            SlideContent::Valid { .. } => None,
            SlideContent::Invalid { reason, .. } => Some(reason.message()),
        }
    }
}
