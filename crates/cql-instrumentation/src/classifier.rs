// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Coarse classification of CQL statements by their leading verb.
//!
//! Classification is total: anything that does not start with a known verb
//! (after whitespace and comments) is [`Operation::Unknown`].

use std::borrow::Cow;
use std::fmt;

/// The leading command of a CQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Batch,
    Use,
    Create,
    Alter,
    Drop,
    Truncate,
    Grant,
    Revoke,
    List,
    Unknown,
}

impl Operation {
    /// Lowercase tag used in metric names. `Unknown` renders as `"other"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Batch => "batch",
            Operation::Use => "use",
            Operation::Create => "create",
            Operation::Alter => "alter",
            Operation::Drop => "drop",
            Operation::Truncate => "truncate",
            Operation::Grant => "grant",
            Operation::Revoke => "revoke",
            Operation::List => "list",
            Operation::Unknown => "other",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Operation::Unknown)
    }

    fn from_keyword(word: &str) -> Option<Self> {
        const KEYWORDS: [(&str, Operation); 12] = [
            ("select", Operation::Select),
            ("insert", Operation::Insert),
            ("update", Operation::Update),
            ("delete", Operation::Delete),
            ("use", Operation::Use),
            ("create", Operation::Create),
            ("alter", Operation::Alter),
            ("drop", Operation::Drop),
            ("truncate", Operation::Truncate),
            ("grant", Operation::Grant),
            ("revoke", Operation::Revoke),
            ("list", Operation::List),
        ];

        KEYWORDS
            .iter()
            .find(|(keyword, _)| word.eq_ignore_ascii_case(keyword))
            .map(|(_, op)| *op)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `query` by its leading verb, ignoring case, leading whitespace
/// and leading comments.
///
/// `BEGIN BATCH`, `BEGIN UNLOGGED BATCH` and `BEGIN COUNTER BATCH` all
/// classify as [`Operation::Batch`].
///
/// # Examples
///
/// ```
/// use cql_instrumentation::classifier::{classify, Operation};
///
/// assert_eq!(classify("SELECT * FROM users"), Operation::Select);
/// assert_eq!(classify("  /* hint */ insert INTO t (k) VALUES (1)"), Operation::Insert);
/// assert_eq!(classify("garbled;;"), Operation::Unknown);
/// ```
pub fn classify(query: &str) -> Operation {
    let (word, rest) = leading_word(skip_ignorable(query));

    if word.eq_ignore_ascii_case("begin") {
        return classify_begin(rest);
    }

    Operation::from_keyword(word).unwrap_or(Operation::Unknown)
}

/// Converts raw statement bytes into text, replacing invalid UTF-8 sequences.
pub fn correctly_encoded(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn classify_begin(rest: &str) -> Operation {
    let (word, rest) = leading_word(skip_ignorable(rest));
    let word = if word.eq_ignore_ascii_case("unlogged") || word.eq_ignore_ascii_case("counter") {
        leading_word(skip_ignorable(rest)).0
    } else {
        word
    };

    if word.eq_ignore_ascii_case("batch") {
        Operation::Batch
    } else {
        Operation::Unknown
    }
}

/// Strips whitespace and `/* */`, `--`, `//` comments from the front of `s`.
/// An unterminated block comment swallows the rest of the input.
fn skip_ignorable(mut s: &str) -> &str {
    loop {
        s = s.trim_start();
        if let Some(rest) = s.strip_prefix("/*") {
            match rest.find("*/") {
                Some(end) => s = &rest[end + 2..],
                None => return "",
            }
        } else if let Some(rest) = s.strip_prefix("--").or_else(|| s.strip_prefix("//")) {
            match rest.find('\n') {
                Some(end) => s = &rest[end + 1..],
                None => return "",
            }
        } else {
            return s;
        }
    }
}

fn leading_word(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    s.split_at(end)
}
