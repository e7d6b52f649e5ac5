//! Read-only Cypher sandbox.
//!
//! Validates a user-supplied query before it ever reaches the store,
//! guaranteeing no write can get through, and enforces hard row and
//! execution-time caps independent of any `LIMIT` clause in the query.
//!
//! Validation is syntactic and fail-closed: when a construct might mutate
//! state (including any `CALL`ed procedure), the query is rejected.

use async_trait::async_trait;
use loreqa_core::{GraphRow, QaError, QaResult};
use neo4rs::Query;
use std::time::Duration;
use tracing::debug;

use crate::client::GraphClient;

/// Verbs and clauses that mutate the store, or can (procedures, imports).
/// Matched as whole word tokens, case-insensitive, comments stripped.
const FORBIDDEN: &[&str] = &[
    "create", "merge", "delete", "detach", "set", "remove", "drop", "foreach", "load", "call",
];

/// Clauses a read query may open with.
const READ_ENTRY: &[&str] = &["match", "optional", "return", "with", "unwind"];

/// Executes validated read-only queries with result and time caps.
pub struct GraphSandbox {
    client: GraphClient,
    max_rows: usize,
    timeout: Duration,
}

impl GraphSandbox {
    pub fn new(client: GraphClient, max_rows: usize, timeout: Duration) -> Self {
        Self {
            client,
            max_rows,
            timeout,
        }
    }

    /// Validate and run a user-supplied Cypher query.
    ///
    /// Fails with [`QaError::RejectedQuery`] when the text is not provably
    /// read-only, and [`QaError::QueryError`] when the store refuses it or
    /// the time budget expires. At most `max_rows` rows are drained from
    /// the result stream regardless of the query's own `LIMIT`.
    pub async fn execute(&self, query_text: &str) -> QaResult<Vec<GraphRow>> {
        validate_read_only(query_text)?;

        let run = async {
            let stream = self
                .client
                .inner()
                .execute(Query::new(query_text.to_string()))
                .await
                .map_err(|e| QaError::QueryError(e.to_string()))?;

            drain(&mut BoltRows(stream), self.max_rows).await
        };

        let rows = with_budget(self.timeout, run).await?;

        debug!(rows = rows.len(), "sandboxed query returned");
        Ok(rows)
    }
}

/// One result row at a time, already converted to the wire row shape.
#[async_trait]
trait RowSource: Send {
    async fn next_row(&mut self) -> QaResult<Option<GraphRow>>;
}

struct BoltRows(neo4rs::DetachedRowStream);

#[async_trait]
impl RowSource for BoltRows {
    async fn next_row(&mut self) -> QaResult<Option<GraphRow>> {
        match self.0.next().await {
            Ok(Some(row)) => Ok(Some(row_to_json(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(QaError::QueryError(e.to_string())),
        }
    }
}

/// Drain at most `max_rows` rows. A stream error propagates; it must not
/// be mistaken for exhaustion and returned as a short result set.
async fn drain(source: &mut dyn RowSource, max_rows: usize) -> QaResult<Vec<GraphRow>> {
    let mut rows = Vec::new();
    while rows.len() < max_rows {
        match source.next_row().await? {
            Some(row) => rows.push(row),
            None => break,
        }
    }
    Ok(rows)
}

/// Enforce the execution-time cap around the whole fetch.
async fn with_budget<F>(budget: Duration, work: F) -> QaResult<Vec<GraphRow>>
where
    F: std::future::Future<Output = QaResult<Vec<GraphRow>>>,
{
    tokio::time::timeout(budget, work)
        .await
        .map_err(|_| QaError::QueryError(format!("query exceeded the {:?} execution budget", budget)))?
}

/// Reject any query that is not provably a read.
///
/// Comments are stripped first so a mutating verb cannot hide behind them;
/// string literals are deliberately NOT stripped, so a literal containing
/// a write verb is rejected too (conservative by design of the boundary).
pub fn validate_read_only(query_text: &str) -> QaResult<()> {
    let stripped = strip_comments(query_text);
    let mut tokens = tokenize(&stripped);

    let Some(first) = tokens.next() else {
        return Err(QaError::RejectedQuery("empty query".to_string()));
    };

    if !READ_ENTRY.contains(&first.as_str()) {
        return Err(QaError::RejectedQuery(format!(
            "query must start with a read clause, got '{}'",
            first
        )));
    }

    for token in std::iter::once(first).chain(tokens) {
        if FORBIDDEN.contains(&token.as_str()) {
            return Err(QaError::RejectedQuery(format!(
                "mutating or unsafe clause '{}' is not allowed",
                token.to_uppercase()
            )));
        }
    }

    Ok(())
}

/// Remove `//` line comments and `/* */` block comments.
fn strip_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                i += 1;
            }
            i = (i + 2).min(chars.len());
            out.push(' ');
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Lowercased identifier tokens, in order.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

/// Convert a result row into the alias -> scalar-or-list shape.
fn row_to_json(row: &neo4rs::Row) -> QaResult<GraphRow> {
    let value: serde_json::Value = row
        .to()
        .map_err(|e| QaError::QueryError(format!("unsupported result shape: {}", e)))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => {
            let mut map = GraphRow::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}
