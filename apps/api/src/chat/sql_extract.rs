//! Best-effort extraction of one `SELECT ... ;` statement from free-form model text.
//!
//! Failure modes, all accepted as-is:
//! - Only the first statement is returned; text after the first `;` is ignored.
//! - A `;` inside a string literal or comment ends the statement early.
//! - Queries that do not lead with `SELECT` (`WITH ...`, `EXPLAIN ...`) are cut
//!   down to the span starting at their first `SELECT`.
//! - The keyword is matched in prose too ("I'll select the rows;").

use std::sync::OnceLock;

use regex::Regex;

/// Outcome of scanning a model reply for a SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlExtraction<'a> {
    /// Text from the first `SELECT` up to and including the next `;`.
    Statement(&'a str),
    /// The reply never mentions `SELECT` (any case).
    NoSelect,
    /// `SELECT` appears but no `;` follows it.
    Unterminated,
}

fn select_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // (?i) case-insensitive, (?s) '.' spans newlines, lazy up to the first ';'
        Regex::new(r"(?is)SELECT.*?;").expect("SELECT pattern is valid")
    })
}

/// True when the reply contains the literal `SELECT`, ignoring case.
pub fn mentions_select(reply: &str) -> bool {
    reply.to_uppercase().contains("SELECT")
}

/// Scans `reply` for the first `SELECT` statement terminated by `;`.
pub fn extract_select_statement(reply: &str) -> SqlExtraction<'_> {
    if !mentions_select(reply) {
        return SqlExtraction::NoSelect;
    }
    match select_pattern().find(reply) {
        Some(m) => SqlExtraction::Statement(m.as_str()),
        None => SqlExtraction::Unterminated,
    }
}
