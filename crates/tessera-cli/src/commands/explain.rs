//! `tessera explain` command implementation.
//!
//! Builds a query shape from command-line flags and runs the permission validator over
//! it, exactly as a guarded query builder would before executing.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

use tessera_core::{ObjectRecord, ObjectRecordsPermissions, TesseraConfig};
use tessera_policy::{
    Condition, Join, PermissionsError, QueryOperation, QueryShape, Selection,
    validate_query_is_permitted,
};

#[derive(Args, Debug, Clone)]
pub struct ExplainArgs {
    /// Path to tessera.yaml
    #[arg(long, short, default_value = "tessera.yaml")]
    pub config: PathBuf,

    /// Role whose permission matrix applies
    #[arg(long)]
    pub role: String,

    /// Main object (singular name)
    #[arg(long)]
    pub object: String,

    #[arg(long, value_enum, default_value_t = Operation::Select)]
    pub operation: Operation,

    /// Alias of the main object (defaults to the object name)
    #[arg(long)]
    pub alias: Option<String>,

    /// Selected fields: `field`, `alias.field` or `alias` for all fields
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Relation joins: `[source.]relation[:alias]`
    #[arg(long = "join")]
    pub joins: Vec<String>,

    /// Select every field of the joined objects
    #[arg(long, default_value_t = false)]
    pub select_joined: bool,

    /// Written values: `field=value`, value parsed as JSON when possible
    #[arg(long = "value", value_parser = parse_key_value)]
    pub values: Vec<(String, Value)>,

    /// Fields returned by a write (`*` for all)
    #[arg(long, value_delimiter = ',')]
    pub returning: Vec<String>,

    /// Raw SQL condition
    #[arg(long = "where-raw")]
    pub where_raw: Vec<String>,

    /// Skip permission checks, as a system context would
    #[arg(long, default_value_t = false)]
    pub bypass: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    SoftDelete,
    Restore,
}

impl From<Operation> for QueryOperation {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Select => QueryOperation::Select,
            Operation::Insert => QueryOperation::Insert,
            Operation::Update => QueryOperation::Update,
            Operation::Delete => QueryOperation::Delete,
            Operation::SoftDelete => QueryOperation::SoftDelete,
            Operation::Restore => QueryOperation::Restore,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", s))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Build the query shape described by the flags.
pub fn build_shape(args: &ExplainArgs) -> QueryShape {
    let alias = args.alias.clone().unwrap_or_else(|| args.object.clone());
    let mut shape = QueryShape::select_from(&args.object, &alias)
        .with_operation(args.operation.into());

    shape.selects = args
        .fields
        .iter()
        .map(|f| {
            if f.contains('.') || *f == alias {
                Selection::from(f.as_str())
            } else {
                Selection::Field {
                    alias: alias.clone(),
                    field: f.clone(),
                }
            }
        })
        .collect();

    shape.joins = args
        .joins
        .iter()
        .map(|arg| {
            let (path, join_alias) = match arg.split_once(':') {
                Some((path, join_alias)) => (path.to_string(), Some(join_alias)),
                None => (arg.clone(), None),
            };
            let path = if path.contains('.') {
                path
            } else {
                format!("{}.{}", alias, path)
            };
            let relation = path.rsplit('.').next().unwrap_or_default().to_string();
            let join = Join::relation(&path, join_alias.map(str::to_string).unwrap_or(relation));
            if args.select_joined { join.and_select() } else { join }
        })
        .collect();

    if !args.values.is_empty() {
        let record: ObjectRecord = args.values.iter().cloned().collect();
        shape.values = vec![record];
    }
    shape.returning = args.returning.clone();
    shape.conditions = args.where_raw.iter().map(Condition::raw).collect();
    shape
}

/// Validate the described query against the role's matrix.
pub fn explain(args: &ExplainArgs) -> Result<Result<(), PermissionsError>> {
    let config =
        TesseraConfig::load_with_context(&args.config).context("Failed to load configuration")?;
    let maps = config.metadata_maps()?;
    // A bypassing context does not need a matrix.
    let permissions = if args.bypass && !config.roles.contains_key(&args.role) {
        ObjectRecordsPermissions::new()
    } else {
        config.permissions_for(&args.role, &maps)?
    };

    let shape = build_shape(args);
    tracing::debug!(?shape, role = %args.role, "Explaining query");
    Ok(validate_query_is_permitted(
        &shape,
        &permissions,
        &maps,
        config.join_policy,
        args.bypass,
    ))
}

pub fn run(args: &ExplainArgs) -> Result<()> {
    match explain(args)? {
        Ok(()) if args.bypass => {
            println!("PERMITTED (bypass)");
            Ok(())
        }
        Ok(()) => {
            println!("PERMITTED");
            Ok(())
        }
        Err(e) => {
            println!("DENIED {}: {}", e.code, e.message);
            anyhow::bail!("query denied for role '{}'", args.role)
        }
    }
}
