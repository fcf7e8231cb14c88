//! Slide document parser.
//!
//! Turns loosely structured text into [`SlideRecord`]s. The format is:
//!
//! ```text
//! Slide 1: Introduction
//! - Welcome to our presentation
//! - Today's agenda
//!
//! Slide 2: Main Points
//! - First important point
//! ```
//!
//! Blocks are separated by one or more blank lines. Inside a block, the
//! first `Slide <digits>:` line supplies the title and every line starting
//! with `-` (after leading whitespace) is a bullet. Anything else in the
//! block is ignored.

use crate::types::{InvalidReason, SlideRecord};
use regex::Regex;
use std::sync::LazyLock;

/// Matches a title line, capturing the slide number and the title text.
static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*Slide (\d+):(.*)$").unwrap());

/// Matches a bullet line, capturing everything after the dash.
static BULLET_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*-\s*(.*)$").unwrap());

/// Parser for plain-text slide documents.
#[derive(Debug, Clone, Default)]
pub struct SlideParser;

impl SlideParser {
    /// Create a new slide parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a whole document into one record per block, in source order.
    ///
    /// Never fails: malformed blocks become invalid records.
    pub fn parse(&self, text: &str) -> Vec<SlideRecord> {
        let records: Vec<SlideRecord> = split_blocks(text)
            .into_iter()
            .enumerate()
            .map(|(idx, block)| self.parse_block(idx + 1, &block))
            .collect();

        log::debug!(
            "Parsed {} blocks ({} valid)",
            records.len(),
            records.iter().filter(|r| r.is_valid()).count()
        );

        records
    }

    /// Validate a single block.
    pub fn parse_block(&self, ordinal: usize, block: &str) -> SlideRecord {
        let title = block
            .lines()
            .find_map(|line| TITLE_REGEX.captures(line))
            .map(|caps| caps[2].trim().to_string())
            .filter(|title| !title.is_empty());

        let Some(title) = title else {
            let first_line = block.lines().next().unwrap_or_default().trim();
            log::debug!("Block {}: no slide title in {:?}", ordinal, first_line);
            return SlideRecord::invalid(ordinal, block, first_line, InvalidReason::TitleFormat);
        };

        let bullet_points: Vec<String> = block
            .lines()
            .filter_map(|line| BULLET_REGEX.captures(line))
            .map(|caps| caps[1].trim().to_string())
            .filter(|bullet| !bullet.is_empty())
            .collect();

        if bullet_points.is_empty() {
            log::debug!("Block {}: title {:?} has no bullet points", ordinal, title);
            return SlideRecord::invalid(ordinal, block, title, InvalidReason::NoBulletPoints);
        }

        log::debug!(
            "Block {}: slide {:?} with {} bullet points",
            ordinal,
            title,
            bullet_points.len()
        );
        SlideRecord::valid(ordinal, block, title, bullet_points)
    }
}

/// Split text into blocks on runs of blank (whitespace-only) lines.
///
/// Each block keeps its original lines joined with `\n`; blocks never start
/// or end with a blank line.
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
}

/// Parse a document with the default parser.
pub fn parse_slides(text: &str) -> Vec<SlideRecord> {
    SlideParser::new().parse(text)
}
