//! The mock connection surface a replayed database-style package presents
//! in place of a real driver connection (§4.4).
//!
//! Most methods are async RPCs that go through the match service exactly
//! like any other instrumented call; `escape` and `format` are pure local
//! string transforms with no recorded counterpart, since the original
//! driver API implements them synchronously without touching the network.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ReplayResult;
use crate::events::EventSink;

/// A single query/execute parameter value.
pub type BindValue = Value;

#[async_trait]
pub trait MockConnection: Send + Sync {
    async fn query(&self, sql: &str, values: &[BindValue]) -> ReplayResult<EventSink>;
    async fn execute(&self, sql: &str, values: &[BindValue]) -> ReplayResult<EventSink>;

    /// Pool-mode release. The underlying driver treats this as a no-op that
    /// still emits an `end` lifecycle event rather than a real disconnect.
    async fn release(&self) -> ReplayResult<()> {
        self.end().await
    }

    async fn end(&self) -> ReplayResult<()>;
    async fn connect(&self) -> ReplayResult<()>;
    async fn ping(&self) -> ReplayResult<()>;

    async fn begin_transaction(&self) -> ReplayResult<()>;
    async fn commit(&self) -> ReplayResult<()>;
    async fn rollback(&self) -> ReplayResult<()>;

    async fn change_user(&self, user: &str) -> ReplayResult<()>;

    async fn pause(&self) -> ReplayResult<()>;
    async fn resume(&self) -> ReplayResult<()>;

    /// Escape an identifier or value for inline interpolation into SQL
    /// text. Synchronous and local: no call is recorded or replayed.
    fn escape(&self, identifier: &str) -> String {
        escape_identifier(identifier)
    }

    /// Render a parameterized statement with its bound values substituted.
    /// Synchronous and local, like `escape`.
    fn format(&self, sql: &str, values: &[BindValue]) -> String {
        format_statement(sql, values)
    }
}

/// Wraps an identifier in backticks, doubling any embedded backtick —
/// the conventional MySQL-family escaping rule.
pub fn escape_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Substitutes each `?` placeholder in `sql`, in order, with its bound
/// value rendered as a SQL literal.
pub fn format_statement(sql: &str, values: &[BindValue]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut values = values.iter();
    for ch in sql.chars() {
        if ch == '?' {
            match values.next() {
                Some(v) => out.push_str(&render_literal(v)),
                None => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn render_literal(value: &BindValue) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escape_identifier_doubles_embedded_backticks() {
        assert_eq!(escape_identifier("user`name"), "`user``name`");
    }

    #[test]
    fn format_statement_substitutes_placeholders_in_order() {
        let sql = "SELECT * FROM t WHERE id = ? AND name = ?";
        let rendered = format_statement(sql, &[json!(1), json!("o'brien")]);
        assert_eq!(rendered, "SELECT * FROM t WHERE id = 1 AND name = 'o''brien'");
    }

    #[test]
    fn format_statement_leaves_unmatched_placeholders() {
        let rendered = format_statement("? ?", &[json!(1)]);
        assert_eq!(rendered, "1 ?");
    }

    struct NoopConnection;

    #[async_trait]
    impl MockConnection for NoopConnection {
        async fn query(&self, _sql: &str, _values: &[BindValue]) -> ReplayResult<EventSink> {
            let (source, sink) = crate::events::EventSource::channel();
            source.emit_empty_success();
            Ok(sink)
        }
        async fn execute(&self, sql: &str, values: &[BindValue]) -> ReplayResult<EventSink> {
            self.query(sql, values).await
        }
        async fn end(&self) -> ReplayResult<()> {
            Ok(())
        }
        async fn connect(&self) -> ReplayResult<()> {
            Ok(())
        }
        async fn ping(&self) -> ReplayResult<()> {
            Ok(())
        }
        async fn begin_transaction(&self) -> ReplayResult<()> {
            Ok(())
        }
        async fn commit(&self) -> ReplayResult<()> {
            Ok(())
        }
        async fn rollback(&self) -> ReplayResult<()> {
            Ok(())
        }
        async fn change_user(&self, _user: &str) -> ReplayResult<()> {
            Ok(())
        }
        async fn pause(&self) -> ReplayResult<()> {
            Ok(())
        }
        async fn resume(&self) -> ReplayResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn release_defaults_to_end() {
        let conn = NoopConnection;
        assert!(conn.release().await.is_ok());
    }
}
