// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Metric names derived from CQL statements.
//!
//! Every instrumented statement produces one primary metric
//! (`Database/CQL/<operation>`) plus rollups. `Datastore/all` is always
//! present; `Datastore/allOther` is added outside tracked (web) transactions
//! so background work does not skew foreground overview graphs.

use derive_more::{Display, Into};
use regex::Regex;
use std::sync::OnceLock;

use crate::classifier::{classify, Operation};

pub const CQL_METRIC_PREFIX: &str = "Database/CQL";
pub const STATEMENT_METRIC_PREFIX: &str = "Database/Cassandra";
pub const DATASTORE_ALL: &str = "Datastore/all";
pub const DATASTORE_ALL_OTHER: &str = "Datastore/allOther";

const OTHER: &str = "other";

/// A `/`-separated metric name such as `Database/CQL/select`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
pub struct MetricName(String);

impl MetricName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MetricName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MetricName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MetricName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Metric names recorded for one call.
///
/// Keeps insertion order for iteration but drops duplicates, and compares
/// as a set: two sets holding the same names in a different order are equal.
#[derive(Debug, Clone, Default)]
pub struct MetricSet {
    names: Vec<MetricName>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full set for an instrumented call: `primary` plus the rollups.
    pub fn for_call(primary: MetricName, in_tracked_context: bool) -> Self {
        let mut metrics = Self::new();
        metrics.insert(primary);
        metrics.extend(rollup_metrics(in_tracked_context));
        metrics
    }

    /// Adds `name`, returning `false` if it was already present.
    pub fn insert(&mut self, name: MetricName) -> bool {
        if self.names.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.as_str() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricName> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl PartialEq for MetricSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.names.iter().all(|n| other.names.contains(n))
    }
}

impl Eq for MetricSet {}

impl Extend<MetricName> for MetricSet {
    fn extend<I: IntoIterator<Item = MetricName>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}

impl FromIterator<MetricName> for MetricSet {
    fn from_iter<I: IntoIterator<Item = MetricName>>(iter: I) -> Self {
        let mut metrics = Self::new();
        metrics.extend(iter);
        metrics
    }
}

impl<'a> FromIterator<&'a str> for MetricSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(MetricName::new).collect()
    }
}

impl IntoIterator for MetricSet {
    type Item = MetricName;
    type IntoIter = std::vec::IntoIter<MetricName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

impl<'a> IntoIterator for &'a MetricSet {
    type Item = &'a MetricName;
    type IntoIter = std::slice::Iter<'a, MetricName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// `Database/CQL/<op>`, with `other` standing in for unknown operations.
pub fn primary_metric(op: Operation) -> MetricName {
    MetricName(format!("{CQL_METRIC_PREFIX}/{}", op.as_str()))
}

/// Primary metric for a raw CQL statement.
pub fn metric_for_cql(query: &str) -> MetricName {
    primary_metric(classify(query))
}

/// Rollups recorded alongside every primary metric.
pub fn rollup_metrics(in_tracked_context: bool) -> MetricSet {
    let mut metrics = MetricSet::new();
    metrics.insert(MetricName::new(DATASTORE_ALL));
    if !in_tracked_context {
        metrics.insert(MetricName::new(DATASTORE_ALL_OTHER));
    }
    metrics
}

/// Metric for the execute-with-consistency path: the leading run of
/// uppercase words, minus a trailing `FROM`. The run may start at the
/// beginning of any line, so leading blank lines are skipped.
///
/// ```
/// use cql_instrumentation::metric::statement_metric;
///
/// assert_eq!(statement_metric("SELECT * FROM users"), "Database/Cassandra/SELECT");
/// assert_eq!(statement_metric("DELETE FROM users WHERE id = 1"), "Database/Cassandra/DELETE");
/// assert_eq!(statement_metric("INSERT INTO users (id) VALUES (1)"), "Database/Cassandra/INSERT INTO");
/// ```
pub fn statement_metric(statement: &str) -> MetricName {
    let words = leading_uppercase()
        .find(statement)
        .map(|m| m.as_str().trim())
        .map(|words| words.strip_suffix(" FROM").unwrap_or(words))
        .filter(|words| !words.is_empty())
        .unwrap_or(OTHER);

    MetricName(format!("{STATEMENT_METRIC_PREFIX}/{words}"))
}

#[allow(clippy::expect_used)]
fn leading_uppercase() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^[A-Z ]*[A-Z]").expect("statement metric pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_metric() {
        assert_eq!(primary_metric(Operation::Select), "Database/CQL/select");
        assert_eq!(primary_metric(Operation::Batch), "Database/CQL/batch");
        assert_eq!(primary_metric(Operation::Unknown), "Database/CQL/other");
    }

    #[test]
    fn test_metric_for_cql() {
        assert_eq!(metric_for_cql("SELECT * FROM users"), "Database/CQL/select");
        assert_eq!(metric_for_cql("garbled;;"), "Database/CQL/other");
    }

    #[test]
    fn test_rollup_metrics_in_tracked_context() {
        let rollups = rollup_metrics(true);
        assert!(rollups.contains(DATASTORE_ALL));
        assert!(!rollups.contains(DATASTORE_ALL_OTHER));
        assert_eq!(rollups.len(), 1);
    }

    #[test]
    fn test_rollup_metrics_outside_tracked_context() {
        let rollups = rollup_metrics(false);
        assert!(rollups.contains(DATASTORE_ALL));
        assert!(rollups.contains(DATASTORE_ALL_OTHER));
        assert_eq!(rollups.len(), 2);
    }

    #[test]
    fn test_for_call_always_has_a_rollup() {
        for tracked in [true, false] {
            let metrics = MetricSet::for_call(metric_for_cql("UPDATE t SET v = 1"), tracked);
            assert!(metrics.contains("Database/CQL/update"));
            assert!(metrics.contains(DATASTORE_ALL));
        }
    }

    #[test]
    fn test_metric_set_compares_as_set() {
        let a: MetricSet = ["Database/CQL/select", "Datastore/all"].into_iter().collect();
        let b: MetricSet = ["Datastore/all", "Database/CQL/select"].into_iter().collect();
        assert_eq!(a, b);

        let c: MetricSet = ["Datastore/all"].into_iter().collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_metric_set_dedups_and_keeps_order() {
        let mut metrics = MetricSet::new();
        assert!(metrics.insert(MetricName::new("b")));
        assert!(metrics.insert(MetricName::new("a")));
        assert!(!metrics.insert(MetricName::new("b")));

        let names: Vec<&str> = metrics.iter().map(MetricName::as_str).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_statement_metric() {
        assert_eq!(statement_metric("SELECT * FROM users"), "Database/Cassandra/SELECT");
        assert_eq!(statement_metric("SELECT name FROM users"), "Database/Cassandra/SELECT");
        assert_eq!(statement_metric("DELETE FROM users"), "Database/Cassandra/DELETE");
        assert_eq!(statement_metric("UPDATE users SET a = 1"), "Database/Cassandra/UPDATE");
        assert_eq!(statement_metric("BEGIN BATCH"), "Database/Cassandra/BEGIN BATCH");
    }

    #[test]
    fn test_statement_metric_matches_at_line_start() {
        assert_eq!(statement_metric("\nSELECT * FROM t"), "Database/Cassandra/SELECT");
        assert_eq!(
            statement_metric("select 1\nDELETE FROM t"),
            "Database/Cassandra/DELETE"
        );
    }

    #[test]
    fn test_statement_metric_without_uppercase_prefix() {
        assert_eq!(statement_metric("select * from users"), "Database/Cassandra/other");
        assert_eq!(statement_metric(""), "Database/Cassandra/other");
        assert_eq!(statement_metric("   "), "Database/Cassandra/other");
    }

    #[test]
    fn test_metric_name_into_string() {
        let name = MetricName::new("Datastore/all");
        assert_eq!(name.to_string(), "Datastore/all");
        let raw: String = name.into();
        assert_eq!(raw, "Datastore/all");
    }
}
