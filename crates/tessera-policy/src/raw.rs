//! Raw SQL condition analysis.
//!
//! Raw conditions can reach other tables through subqueries (`EXISTS (SELECT ...)`,
//! `IN (SELECT ...)`). The analyzer parses a fragment as a `WHERE` expression and reports
//! every table it references so those tables can be permission-checked too.
//!
//! Anything the analyzer cannot attribute to a table is refused outright:
//! - function calls outside [`ALLOWED_FUNCTIONS`] (Postgres can run SQL held in a string,
//!   e.g. `query_to_xml('SELECT ...')` or `dblink(...)`)
//! - table-valued functions and `TABLE(...)` in `FROM`
//! - relation names that are not plain identifiers

use sqlparser::ast::{Expr, ObjectName, ObjectNamePart, Statement, TableFactor, Visit, Visitor};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::fmt;
use std::ops::ControlFlow;

/// Scalar and aggregate functions that may appear in raw conditions. Names are unqualified
/// and compared case-insensitively.
pub const ALLOWED_FUNCTIONS: &[&str] = &[
    "abs",
    "avg",
    "char_length",
    "coalesce",
    "count",
    "current_date",
    "current_timestamp",
    "date_trunc",
    "greatest",
    "least",
    "length",
    "lower",
    "max",
    "min",
    "now",
    "nullif",
    "sum",
    "upper",
];

/// A table named in raw SQL.
///
/// Parts are unquoted and case-folded the way Postgres resolves them: `Workspace.Company`
/// becomes `["workspace", "company"]`, `"Company"` stays `["Company"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    pub parts: Vec<String>,
}

impl TableReference {
    /// Dotted name, comparable with metadata table names (`company`, `workspace.company`).
    pub fn qualified_name(&self) -> String {
        self.parts.join(".")
    }

    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Extracts table references from raw SQL condition fragments.
pub struct SqlAnalyzer {
    dialect: PostgreSqlDialect,
}

impl Clone for SqlAnalyzer {
    fn clone(&self) -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }
}

impl Default for SqlAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlAnalyzer {
    pub fn new() -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }

    /// Tables referenced by a boolean SQL fragment, in order of appearance, deduplicated.
    ///
    /// Fails when the fragment is not exactly one well-formed expression (e.g. it closes
    /// the `WHERE` clause early or smuggles in a second statement), or when it contains a
    /// construct that could read data without naming a table.
    pub fn referenced_tables(&self, fragment: &str) -> Result<Vec<TableReference>, String> {
        let sql = format!("SELECT 1 WHERE {}", fragment);
        let statements = Parser::parse_sql(&self.dialect, &sql).map_err(|e| e.to_string())?;

        let [statement] = statements.as_slice() else {
            return Err(format!(
                "fragment must be a single expression, found {} statements",
                statements.len()
            ));
        };

        collect_tables(statement)
    }
}

fn collect_tables(statement: &Statement) -> Result<Vec<TableReference>, String> {
    let mut visitor = RawSqlVisitor::default();
    match statement.visit(&mut visitor) {
        ControlFlow::Break(reason) => Err(reason),
        ControlFlow::Continue(()) => Ok(visitor.tables),
    }
}

#[derive(Default)]
struct RawSqlVisitor {
    tables: Vec<TableReference>,
}

impl Visitor for RawSqlVisitor {
    type Break = String;

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<String> {
        match table_reference(relation) {
            Ok(table) => {
                if !self.tables.contains(&table) {
                    self.tables.push(table);
                }
                ControlFlow::Continue(())
            }
            Err(reason) => ControlFlow::Break(reason),
        }
    }

    fn pre_visit_table_factor(&mut self, factor: &TableFactor) -> ControlFlow<String> {
        match factor {
            TableFactor::Table { args: None, .. }
            | TableFactor::Derived { .. }
            | TableFactor::NestedJoin { .. } => ControlFlow::Continue(()),
            TableFactor::Table { name, .. } => {
                ControlFlow::Break(format!("table function '{}' is not allowed", name))
            }
            other => ControlFlow::Break(format!("'{}' is not allowed in raw conditions", other)),
        }
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<String> {
        if let Expr::Function(function) = expr {
            if !is_allowed_function(&function.name) {
                return ControlFlow::Break(format!(
                    "function '{}' is not allowed in raw conditions",
                    function.name
                ));
            }
        }
        ControlFlow::Continue(())
    }
}

fn is_allowed_function(name: &ObjectName) -> bool {
    match name.0.as_slice() {
        [ObjectNamePart::Identifier(ident)] => ALLOWED_FUNCTIONS
            .iter()
            .any(|allowed| ident.value.eq_ignore_ascii_case(allowed)),
        _ => false,
    }
}

fn table_reference(name: &ObjectName) -> Result<TableReference, String> {
    let parts = name
        .0
        .iter()
        .map(|part| match part.as_ident() {
            Some(ident) if ident.value.contains('.') => {
                Err(format!("table name '{}' contains a dot", name))
            }
            Some(ident) if ident.quote_style.is_some() => Ok(ident.value.clone()),
            Some(ident) => Ok(ident.value.to_lowercase()),
            None => Err(format!("table name '{}' is not a plain identifier", name)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TableReference { parts })
}
