//! Typed positional parameters for named statements, converted from request JSON.

use crate::schema::{FieldDefault, FieldKind};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};
use uuid::Uuid;

/// A value bound to a positional parameter. NULL carries its field kind so the
/// parameter keeps one PostgreSQL type for every execution of a statement.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null(FieldKind),
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl BindValue {
    /// Convert a JSON value to the field's kind. `None` when the shape does not match.
    pub fn coerce(kind: FieldKind, v: &Value) -> Option<Self> {
        if v.is_null() {
            return Some(BindValue::Null(kind));
        }
        match kind {
            FieldKind::Text => v.as_str().map(|s| BindValue::Text(s.to_string())),
            FieldKind::Integer => v.as_i64().map(BindValue::Integer),
            FieldKind::Number => v.as_f64().map(BindValue::Number),
            FieldKind::Boolean => v.as_bool().map(BindValue::Boolean),
            FieldKind::Timestamp | FieldKind::Uuid => v.as_str().and_then(|s| Self::parse_str(kind, s)),
        }
    }

    /// Convert a path or query-string value.
    pub fn parse_str(kind: FieldKind, s: &str) -> Option<Self> {
        match kind {
            FieldKind::Text => Some(BindValue::Text(s.to_string())),
            FieldKind::Integer => s.parse().ok().map(BindValue::Integer),
            FieldKind::Number => s.parse().ok().map(BindValue::Number),
            FieldKind::Boolean => match s.to_ascii_lowercase().as_str() {
                "true" => Some(BindValue::Boolean(true)),
                "false" => Some(BindValue::Boolean(false)),
                _ => None,
            },
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| BindValue::Timestamp(t.with_timezone(&Utc))),
            FieldKind::Uuid => Uuid::parse_str(s).ok().map(BindValue::Uuid),
        }
    }

    pub fn from_default(default: FieldDefault) -> Self {
        match default {
            FieldDefault::Integer(n) => BindValue::Integer(n),
            FieldDefault::Number(n) => BindValue::Number(n),
            FieldDefault::Boolean(b) => BindValue::Boolean(b),
            FieldDefault::Text(s) => BindValue::Text(s.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null(_))
    }

    /// JSON form, matching how rows are rendered (RFC 3339 timestamps, hyphenated UUIDs).
    pub fn to_json(&self) -> Value {
        match self {
            BindValue::Null(_) => Value::Null,
            BindValue::Text(s) => Value::String(s.clone()),
            BindValue::Integer(n) => Value::Number((*n).into()),
            BindValue::Number(n) => serde_json::Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
            BindValue::Boolean(b) => Value::Bool(*b),
            BindValue::Timestamp(t) => Value::String(t.to_rfc3339()),
            BindValue::Uuid(u) => Value::String(u.to_string()),
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            BindValue::Null(kind) => *kind,
            BindValue::Text(_) => FieldKind::Text,
            BindValue::Integer(_) => FieldKind::Integer,
            BindValue::Number(_) => FieldKind::Number,
            BindValue::Boolean(_) => FieldKind::Boolean,
            BindValue::Timestamp(_) => FieldKind::Timestamp,
            BindValue::Uuid(_) => FieldKind::Uuid,
        }
    }
}

fn pg_type(kind: FieldKind) -> PgTypeInfo {
    match kind {
        FieldKind::Text => <String as Type<Postgres>>::type_info(),
        FieldKind::Integer => <i64 as Type<Postgres>>::type_info(),
        FieldKind::Number => <f64 as Type<Postgres>>::type_info(),
        FieldKind::Boolean => <bool as Type<Postgres>>::type_info(),
        FieldKind::Timestamp => <DateTime<Utc> as Type<Postgres>>::type_info(),
        FieldKind::Uuid => <Uuid as Type<Postgres>>::type_info(),
    }
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            BindValue::Null(_) => Ok(IsNull::Yes),
            BindValue::Text(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf),
            BindValue::Integer(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            BindValue::Number(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf),
            BindValue::Boolean(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf),
            BindValue::Timestamp(t) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(t, buf),
            BindValue::Uuid(u) => <Uuid as Encode<Postgres>>::encode_by_ref(u, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(pg_type(self.kind()))
    }
}

impl Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}
