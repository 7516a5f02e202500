//! Blocking Postgres driver over `tokio-postgres`.
//!
//! [`PgConnection`] owns a current-thread runtime and drives every call to
//! completion on it, so it plugs into the synchronous [`Connection`] contract.
//! Statements use `?` placeholders, which are rewritten to `$1..$n` before they
//! reach the server.

use crate::builder::placeholder_offsets;
use crate::config::ConnectionConfig;
use crate::connection::{Connection, Statement};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use bytes::BytesMut;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::future::Future;
use tokio::runtime::Runtime;
use tokio_postgres::types::{IsNull, ToSql, Type};
use tokio_postgres::{Client, NoTls};

/// Driver name reported by [`PgConnection`].
pub const DRIVER_NAME: &str = "pgsql";

const LASTVAL_SQL: &str = "SELECT lastval()";

/// A Postgres connection usable from synchronous code.
pub struct PgConnection {
    runtime: Runtime,
    client: Client,
}

impl PgConnection {
    /// Connect with the credentials in `config`.
    pub fn connect(config: &ConnectionConfig) -> OrmResult<Self> {
        Self::connect_url(&config.postgres_url())
    }

    /// Connect with a `postgres://` URL or a key-value connection string.
    pub fn connect_url(url: &str) -> OrmResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OrmError::Connection(format!("failed to start runtime: {e}")))?;

        let (client, connection) = runtime
            .block_on(tokio_postgres::connect(url, NoTls))
            .map_err(|e| OrmError::Connection(e.to_string()))?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "recorm.session", error = %e, "postgres connection closed");
            }
        });
        tracing::debug!(target: "recorm.session", driver = DRIVER_NAME, "connected");

        Ok(Self { runtime, client })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// The underlying async client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnection")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl Connection for PgConnection {
    fn driver_name(&self) -> &str {
        DRIVER_NAME
    }

    fn prepare<'a>(&'a self, sql: &str) -> OrmResult<Box<dyn Statement + 'a>> {
        let sql = rewrite_placeholders(sql);
        let statement = self
            .block_on(self.client.prepare(&sql))
            .map_err(OrmError::from_db_error)?;
        Ok(Box::new(PgStatement {
            conn: self,
            statement,
            rows: VecDeque::new(),
        }))
    }

    fn last_insert_id(&self) -> OrmResult<Option<Value>> {
        match self.block_on(self.client.query_one(LASTVAL_SQL, &[])) {
            Ok(row) => Ok(Some(Value::Int(row.try_get::<_, i64>(0)?))),
            // No sequence has been used in this session.
            Err(e) if e.as_db_error().is_some() => Ok(None),
            Err(e) => Err(OrmError::from_db_error(e)),
        }
    }

    fn last_insert_id_sql(&self) -> &str {
        LASTVAL_SQL
    }
}

struct PgStatement<'a> {
    conn: &'a PgConnection,
    statement: tokio_postgres::Statement,
    rows: VecDeque<Row>,
}

impl Statement for PgStatement<'_> {
    fn execute(&mut self, params: &[Value]) -> OrmResult<u64> {
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let client = &self.conn.client;

        if self.statement.columns().is_empty() {
            return self
                .conn
                .block_on(client.execute(&self.statement, &refs))
                .map_err(OrmError::from_db_error);
        }

        let rows = self
            .conn
            .block_on(client.query(&self.statement, &refs))
            .map_err(OrmError::from_db_error)?;
        self.rows = rows.iter().map(decode_row).collect::<OrmResult<_>>()?;
        Ok(self.rows.len() as u64)
    }

    fn fetch_row(&mut self) -> OrmResult<Option<Row>> {
        Ok(self.rows.pop_front())
    }
}

/// Rewrite positional `?` placeholders to `$1..$n`.
///
/// `?` inside quoted literals and identifiers is left alone.
pub fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut copied = 0;
    for (n, offset) in placeholder_offsets(sql).into_iter().enumerate() {
        out.push_str(&sql[copied..offset]);
        out.push('$');
        out.push_str(&(n + 1).to_string());
        copied = offset + 1;
    }
    out.push_str(&sql[copied..]);
    out
}

fn decode_row(row: &tokio_postgres::Row) -> OrmResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_())
            .map_err(|e| OrmError::decode(column.name(), e.to_string()))?;
        out.insert(column.name(), value);
    }
    Ok(out)
}

fn decode_column(
    row: &tokio_postgres::Row,
    idx: usize,
    ty: &Type,
) -> Result<Value, tokio_postgres::Error> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| Value::Int(v.into())),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| Value::Int(v.into())),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        Type::OID => row
            .try_get::<_, Option<u32>>(idx)?
            .map(|v| Value::Int(v.into())),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| Value::Float(v.into())),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::Text)
        }
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Bytes),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)?
            .map(Value::Json),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)?
            .map(|v| Value::Text(v.to_string())),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)?
            .map(|v| Value::Text(v.to_string())),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
            .map(|v| Value::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map(|v| Value::Text(v.to_rfc3339())),
        _ => {
            tracing::warn!(
                target: "recorm.session",
                column = row.columns()[idx].name(),
                pg_type = %ty,
                "unsupported column type decoded as NULL"
            );
            None
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => int_to_sql(*v, ty, out),
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Text(v) => text_to_sql(v, ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::BOOL => (v != 0).to_sql(ty, out),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            v.to_string().to_sql(ty, out)
        }
        _ => v.to_sql(ty, out),
    }
}

fn text_to_sql(v: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => v.trim().parse::<i16>()?.to_sql(ty, out),
        Type::INT4 => v.trim().parse::<i32>()?.to_sql(ty, out),
        Type::INT8 => v.trim().parse::<i64>()?.to_sql(ty, out),
        Type::FLOAT4 => v.trim().parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => v.trim().parse::<f64>()?.to_sql(ty, out),
        Type::BOOL => v.trim().parse::<bool>()?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(v)?.to_sql(ty, out),
        Type::DATE => v.parse::<chrono::NaiveDate>()?.to_sql(ty, out),
        Type::TIMESTAMP => {
            chrono::NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S%.f")?.to_sql(ty, out)
        }
        Type::TIMESTAMPTZ => chrono::DateTime::parse_from_rfc3339(v)?
            .with_timezone(&chrono::Utc)
            .to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_placeholders_in_order() {
        assert_eq!(
            rewrite_placeholders("SELECT * FROM \"user\" WHERE \"a\" = ? AND \"b\" IN (?, ?)"),
            "SELECT * FROM \"user\" WHERE \"a\" = $1 AND \"b\" IN ($2, $3)"
        );
    }

    #[test]
    fn skips_quoted_question_marks() {
        assert_eq!(
            rewrite_placeholders("SELECT '?' AS q, \"what?\" FROM t WHERE x = ?"),
            "SELECT '?' AS q, \"what?\" FROM t WHERE x = $1"
        );
        assert_eq!(
            rewrite_placeholders("SELECT 'it''s ?' WHERE y = ?"),
            "SELECT 'it''s ?' WHERE y = $1"
        );
    }

    #[test]
    fn value_encodes_for_column_type() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Int(7).to_sql(&Type::INT4, &mut buf).unwrap(),
            IsNull::No
        ));
        assert_eq!(&buf[..], &7i32.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap(),
            IsNull::Yes
        ));

        let mut buf = BytesMut::new();
        assert!(Value::Int(70_000).to_sql(&Type::INT2, &mut buf).is_err());
    }
}
