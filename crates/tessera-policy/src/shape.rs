//! Query shape: the structural description of a query under construction.
//!
//! Query builders accumulate a `QueryShape` as callers chain methods. The validator only
//! ever reads it; it never changes what the builder will execute.

use serde_json::Value;
use std::fmt;
use tessera_core::{Capability, ObjectRecord};

/// The operation family of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperation {
    Select,
    Insert,
    Update,
    Delete,
    SoftDelete,
    Restore,
}

impl QueryOperation {
    /// Capability the main object must grant for this operation.
    pub fn required_capability(self) -> Capability {
        match self {
            QueryOperation::Select => Capability::Read,
            QueryOperation::Insert => Capability::Create,
            QueryOperation::Update => Capability::Update,
            QueryOperation::Delete => Capability::Destroy,
            QueryOperation::SoftDelete | QueryOperation::Restore => Capability::SoftDelete,
        }
    }

    pub fn is_write(self) -> bool {
        !matches!(self, QueryOperation::Select)
    }
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperation::Select => write!(f, "select"),
            QueryOperation::Insert => write!(f, "insert"),
            QueryOperation::Update => write!(f, "update"),
            QueryOperation::Delete => write!(f, "delete"),
            QueryOperation::SoftDelete => write!(f, "soft-delete"),
            QueryOperation::Restore => write!(f, "restore"),
        }
    }
}

/// An object bound to an alias (`company AS c`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    /// Singular object name.
    pub object: String,
    pub alias: String,
}

/// A reference to a field, optionally qualified by alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub alias: Option<String>,
    pub field: String,
}

impl FieldRef {
    pub fn new(alias: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            field: field.into(),
        }
    }

    /// Alias of this reference, or `default` when unqualified.
    pub fn alias_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.alias.as_deref().unwrap_or(default)
    }
}

impl From<&str> for FieldRef {
    /// Parses `alias.field` or a bare `field`.
    fn from(value: &str) -> Self {
        match value.split_once('.') {
            Some((alias, field)) => Self::new(alias, field),
            None => Self {
                alias: None,
                field: value.to_string(),
            },
        }
    }
}

/// A selected column set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every field of the aliased object.
    AllFields { alias: String },
    /// One field of the aliased object.
    Field { alias: String, field: String },
}

impl Selection {
    pub fn alias(&self) -> &str {
        match self {
            Selection::AllFields { alias } | Selection::Field { alias, .. } => alias,
        }
    }
}

impl From<&str> for Selection {
    /// Parses `alias` (all fields) or `alias.field`.
    fn from(value: &str) -> Self {
        match value.split_once('.') {
            Some((alias, field)) => Selection::Field {
                alias: alias.to_string(),
                field: field.to_string(),
            },
            None => Selection::AllFields {
                alias: value.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Inner,
}

/// What a join attaches to the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinTarget {
    /// An object type joined by name; requires an explicit `on` condition.
    Object(String),
    /// A relation declared on an already-aliased object (`p.company`).
    Relation { alias: String, relation: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub target: JoinTarget,
    pub alias: String,
    pub on: Option<Condition>,
    /// Select every field of the joined object alongside the main object.
    pub select: bool,
}

impl Join {
    /// Join a relation of an aliased object, e.g. `Join::relation("person.company", "company")`.
    pub fn relation(path: &str, alias: impl Into<String>) -> Self {
        let (source, relation) = path.split_once('.').unwrap_or(("", path));
        Self {
            kind: JoinKind::Left,
            target: JoinTarget::Relation {
                alias: source.to_string(),
                relation: relation.to_string(),
            },
            alias: alias.into(),
            on: None,
            select: false,
        }
    }

    /// Join an object type by name with an explicit condition.
    pub fn object(object: impl Into<String>, alias: impl Into<String>, on: Condition) -> Self {
        Self {
            kind: JoinKind::Left,
            target: JoinTarget::Object(object.into()),
            alias: alias.into(),
            on: Some(on),
            select: false,
        }
    }

    pub fn inner(mut self) -> Self {
        self.kind = JoinKind::Inner;
        self
    }

    pub fn and_select(mut self) -> Self {
        self.select = true;
        self
    }
}

/// A filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(FieldRef, Value),
    Ne(FieldRef, Value),
    In(FieldRef, Vec<Value>),
    IsNull(FieldRef),
    IsNotNull(FieldRef),
    /// A raw SQL boolean expression.
    Raw(String),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn eq(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Condition::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<FieldRef>, value: impl Into<Value>) -> Self {
        Condition::Ne(field.into(), value.into())
    }

    pub fn is_in(field: impl Into<FieldRef>, values: Vec<Value>) -> Self {
        Condition::In(field.into(), values)
    }

    pub fn is_null(field: impl Into<FieldRef>) -> Self {
        Condition::IsNull(field.into())
    }

    pub fn is_not_null(field: impl Into<FieldRef>) -> Self {
        Condition::IsNotNull(field.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Condition::Raw(sql.into())
    }

    /// Every raw SQL fragment contained in this condition.
    pub fn raw_fragments(&self) -> Vec<&str> {
        let mut fragments = Vec::new();
        self.collect_raw(&mut fragments);
        fragments
    }

    fn collect_raw<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Raw(sql) => out.push(sql),
            Condition::And(inner) | Condition::Or(inner) => {
                for condition in inner {
                    condition.collect_raw(out);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: FieldRef,
    pub order: Order,
}

/// Accumulated description of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryShape {
    pub operation: QueryOperation,
    /// Main target. `None` until the builder is pointed at an object.
    pub main: Option<AliasTarget>,
    /// Explicit selections. Empty means every field of the main alias.
    pub selects: Vec<Selection>,
    pub joins: Vec<Join>,
    /// Conditions, combined with AND.
    pub conditions: Vec<Condition>,
    /// Insert rows, or the single update set.
    pub values: Vec<ObjectRecord>,
    /// Fields returned by a mutation. `*` means every field.
    pub returning: Vec<String>,
    pub order_by: Vec<OrderBy>,
    pub take: Option<u64>,
    pub skip: Option<u64>,
    /// Include soft-deleted rows.
    pub with_deleted: bool,
}

impl QueryShape {
    /// A select over `object` aliased as `alias`.
    pub fn select_from(object: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            operation: QueryOperation::Select,
            main: Some(AliasTarget {
                object: object.into(),
                alias: alias.into(),
            }),
            selects: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            values: Vec::new(),
            returning: Vec::new(),
            order_by: Vec::new(),
            take: None,
            skip: None,
            with_deleted: false,
        }
    }

    /// A shape with no target yet.
    pub fn empty() -> Self {
        Self {
            main: None,
            ..Self::select_from("", "")
        }
    }

    /// Main alias, if any.
    pub fn main_alias(&self) -> Option<&str> {
        self.main.as_ref().map(|m| m.alias.as_str())
    }

    /// The same shape switched to another operation family.
    pub fn with_operation(mut self, operation: QueryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Raw SQL fragments from every condition, including join conditions.
    pub fn raw_fragments(&self) -> Vec<&str> {
        self.conditions
            .iter()
            .chain(self.joins.iter().filter_map(|j| j.on.as_ref()))
            .flat_map(Condition::raw_fragments)
            .collect()
    }
}
