//! Parameter binding and row decoding.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Value, json};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, Column, Row, ValueRef};
use tessera_core::ObjectRecord;
use uuid::Uuid;

/// A JSON value classified by the Postgres type it is bound as.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Param {
    Bool(bool),
    Int(i64),
    Float(f64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Text(String),
    Json(Value),
}

impl Param {
    pub(crate) fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Param::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Param::Int(i),
                None => Param::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::from_text(s),
            Value::Null | Value::Array(_) | Value::Object(_) => Param::Json(value.clone()),
        }
    }

    // Strings shaped like ids and timestamps bind with their own types so they compare
    // against uuid and timestamptz columns without casts.
    fn from_text(s: &str) -> Self {
        if let Ok(id) = Uuid::parse_str(s) {
            return Param::Uuid(id);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Param::Timestamp(ts.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Param::Date(date);
        }
        Param::Text(s.to_string())
    }
}

fn args_add<T>(args: &mut PgArguments, v: T) -> Result<()>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v).map_err(|e| anyhow!(e))
}

/// Bind rendered parameters in order.
pub(crate) fn bind_params(values: &[Value]) -> Result<PgArguments> {
    let mut args = PgArguments::default();
    for value in values {
        match Param::from_value(value) {
            Param::Bool(b) => args_add(&mut args, b)?,
            Param::Int(i) => args_add(&mut args, i)?,
            Param::Float(f) => args_add(&mut args, f)?,
            Param::Uuid(id) => args_add(&mut args, id)?,
            Param::Timestamp(ts) => args_add(&mut args, ts)?,
            Param::Date(date) => args_add(&mut args, date)?,
            Param::Text(s) => args_add(&mut args, s)?,
            Param::Json(v) => args_add(&mut args, sqlx::types::Json(v))?,
        }
    }
    Ok(args)
}

/// Convert a result row into a record keyed by column label.
pub(crate) fn row_to_record(row: &PgRow) -> ObjectRecord {
    let mut record = ObjectRecord::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.insert(column.name().to_string(), column_value(row, index));
    }
    record
}

fn column_value(row: &PgRow, index: usize) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }

    if let Ok(v) = row.try_get::<i64, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<i32, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<i16, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<f64, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<f32, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<bool, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<String, _>(index) {
        json!(v)
    } else if let Ok(v) = row.try_get::<Uuid, _>(index) {
        json!(v.to_string())
    } else if let Ok(v) = row.try_get::<DateTime<Utc>, _>(index) {
        json!(v.to_rfc3339())
    } else if let Ok(v) = row.try_get::<NaiveDateTime, _>(index) {
        json!(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    } else if let Ok(v) = row.try_get::<NaiveDate, _>(index) {
        json!(v.to_string())
    } else if let Ok(v) = row.try_get::<Value, _>(index) {
        v
    } else if let Ok(v) = row.try_get::<Vec<String>, _>(index) {
        json!(v)
    } else {
        tracing::debug!(column = row.column(index).name(), "Unsupported column type, returning null");
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_classification() {
        assert_eq!(Param::from_value(&json!(true)), Param::Bool(true));
        assert_eq!(Param::from_value(&json!(42)), Param::Int(42));
        assert_eq!(Param::from_value(&json!(1.5)), Param::Float(1.5));
        assert_eq!(Param::from_value(&json!("Acme")), Param::Text("Acme".to_string()));
        assert_eq!(
            Param::from_value(&json!({ "a": 1 })),
            Param::Json(json!({ "a": 1 }))
        );
    }

    #[test]
    fn test_typed_strings() {
        let id = "6f1c2f3e-2b0a-4c39-9d4a-0c3c2a1b5e7f";
        assert_eq!(
            Param::from_value(&json!(id)),
            Param::Uuid(Uuid::parse_str(id).unwrap())
        );
        assert!(matches!(
            Param::from_value(&json!("2024-03-01T10:00:00+02:00")),
            Param::Timestamp(ts) if ts.to_rfc3339() == "2024-03-01T08:00:00+00:00"
        ));
        assert_eq!(
            Param::from_value(&json!("2024-03-01")),
            Param::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(
            Param::from_value(&json!("2024-03")),
            Param::Text("2024-03".to_string())
        );
    }

    #[test]
    fn test_bind_params_accepts_every_kind() {
        let values = vec![
            json!(1),
            json!("x"),
            json!(false),
            json!(2.5),
            json!(["a", "b"]),
            json!("6f1c2f3e-2b0a-4c39-9d4a-0c3c2a1b5e7f"),
        ];
        assert!(bind_params(&values).is_ok());
    }
}
