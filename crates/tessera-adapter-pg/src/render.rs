//! SQL rendering for query shapes.
//!
//! Every value is sent as a `$n` parameter; only identifiers taken from the metadata and
//! raw condition fragments are spliced into the SQL text. Identifiers are quoted and must
//! be plain `[A-Za-z0-9_]` names.

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use serde_json::Value;
use tessera_core::{ObjectMetadata, ObjectMetadataMaps};
use tessera_policy::{
    Condition, FieldRef, Join, JoinKind, JoinTarget, Order, QueryOperation, QueryShape,
    Selection,
};

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// How selected columns are labelled in the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLabels {
    /// Field names; fields of joined aliases are prefixed `alias.`.
    Fields,
    /// `alias_column`, as returned by the `get_raw_*` methods.
    Raw,
}

/// `SELECT` for the shape's main object, its joins and filters.
pub fn render_select(
    shape: &QueryShape,
    metadata: &ObjectMetadataMaps,
    labels: ColumnLabels,
) -> Result<RenderedQuery> {
    let mut r = Renderer::new(shape, metadata)?;
    let from = r.from_clause(&shape.joins)?;
    let columns = r.select_list(shape, labels)?;
    let filter = r.where_clause(shape, true)?;
    let tail = r.order_and_limit(shape)?;
    Ok(r.finish(format!("SELECT {columns} FROM {from}{filter}{tail}")))
}

/// `SELECT COUNT(..)` over the same rows as [`render_select`], ignoring `take`/`skip`.
pub fn render_count(shape: &QueryShape, metadata: &ObjectMetadataMaps) -> Result<RenderedQuery> {
    let mut r = Renderer::new(shape, metadata)?;
    let from = r.from_clause(&shape.joins)?;
    let filter = r.where_clause(shape, true)?;
    let count = if shape.joins.is_empty() {
        "COUNT(*)".to_string()
    } else {
        // Joins can multiply rows.
        format!(
            "COUNT(DISTINCT {}.{})",
            quote_ident(r.main_alias)?,
            quote_ident(r.main.column_for("id"))?
        )
    };
    Ok(r.finish(format!("SELECT {count} AS \"count\" FROM {from}{filter}")))
}

/// `SELECT EXISTS(..)` over the same rows as [`render_select`].
pub fn render_exists(shape: &QueryShape, metadata: &ObjectMetadataMaps) -> Result<RenderedQuery> {
    let mut r = Renderer::new(shape, metadata)?;
    let from = r.from_clause(&shape.joins)?;
    let filter = r.where_clause(shape, true)?;
    Ok(r.finish(format!(
        "SELECT EXISTS (SELECT 1 FROM {from}{filter}) AS \"exists\""
    )))
}

/// `INSERT`, `UPDATE` or `DELETE` for a write shape.
///
/// Soft-delete and restore are updates of the object's soft-delete marker.
pub fn render_write(shape: &QueryShape, metadata: &ObjectMetadataMaps) -> Result<RenderedQuery> {
    if !shape.joins.is_empty() {
        bail!("joins are not supported in {} queries", shape.operation);
    }
    let mut r = Renderer::new(shape, metadata)?;
    let main = r.main;
    let target = format!(
        "{} AS {}",
        table_ident(&main.table_name)?,
        quote_ident(r.main_alias)?
    );

    let sql = match shape.operation {
        QueryOperation::Select => bail!("not a write query"),
        QueryOperation::Insert => {
            let values = r.insert_values(shape)?;
            let returning = r.returning(shape)?;
            format!("INSERT INTO {target} {values}{returning}")
        }
        QueryOperation::Update => {
            let set = r.update_set(shape)?;
            let filter = r.where_clause(shape, false)?;
            let returning = r.returning(shape)?;
            format!("UPDATE {target} SET {set}{filter}{returning}")
        }
        QueryOperation::Delete => {
            let filter = r.where_clause(shape, false)?;
            let returning = r.returning(shape)?;
            format!("DELETE FROM {target}{filter}{returning}")
        }
        QueryOperation::SoftDelete | QueryOperation::Restore => {
            let marker = main.soft_delete_field.as_deref().ok_or_else(|| {
                anyhow!("object '{}' does not support soft deletion", main.name_singular)
            })?;
            let value = if shape.operation == QueryOperation::Restore {
                "NULL"
            } else {
                "now()"
            };
            let column = quote_ident(main.column_for(marker))?;
            let filter = r.where_clause(shape, false)?;
            let returning = r.returning(shape)?;
            format!("UPDATE {target} SET {column} = {value}{filter}{returning}")
        }
    };
    Ok(r.finish(sql))
}

struct Renderer<'a> {
    metadata: &'a ObjectMetadataMaps,
    main_alias: &'a str,
    main: &'a ObjectMetadata,
    aliases: HashMap<&'a str, &'a ObjectMetadata>,
    params: Vec<Value>,
}

impl<'a> Renderer<'a> {
    fn new(shape: &'a QueryShape, metadata: &'a ObjectMetadataMaps) -> Result<Self> {
        let target = shape
            .main
            .as_ref()
            .ok_or_else(|| anyhow!("query has no main object"))?;
        let main = lookup(metadata, &target.object)?;
        let mut aliases = HashMap::new();
        aliases.insert(target.alias.as_str(), main);
        Ok(Self {
            metadata,
            main_alias: &target.alias,
            main,
            aliases,
            params: Vec::new(),
        })
    }

    fn finish(self, sql: String) -> RenderedQuery {
        RenderedQuery {
            sql,
            params: self.params,
        }
    }

    /// `NULL` is rendered inline so it coerces to any column type.
    fn bind(&mut self, value: &Value) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        self.params.push(value.clone());
        format!("${}", self.params.len())
    }

    fn object_for(&self, alias: &str) -> Result<&'a ObjectMetadata> {
        self.aliases
            .get(alias)
            .copied()
            .ok_or_else(|| anyhow!("unknown alias '{}'", alias))
    }

    fn column(&self, field: &FieldRef) -> Result<String> {
        let alias = field.alias_or(self.main_alias);
        let object = self.object_for(alias)?;
        Ok(format!(
            "{}.{}",
            quote_ident(alias)?,
            quote_ident(object.column_for(&field.field))?
        ))
    }

    // -- FROM ---------------------------------------------------------------

    fn from_clause(&mut self, joins: &'a [Join]) -> Result<String> {
        let mut sql = format!(
            "{} AS {}",
            table_ident(&self.main.table_name)?,
            quote_ident(self.main_alias)?
        );
        for join in joins {
            sql.push(' ');
            sql.push_str(&self.join(join)?);
        }
        Ok(sql)
    }

    fn join(&mut self, join: &'a Join) -> Result<String> {
        let mut on = Vec::new();
        let target = match &join.target {
            JoinTarget::Object(name) => lookup(self.metadata, name)?,
            JoinTarget::Relation { alias, relation } => {
                let source = self.object_for(alias)?;
                let rel = source.relation(relation).ok_or_else(|| {
                    anyhow!("relation '{}.{}' not found", source.name_singular, relation)
                })?;
                let target = lookup(self.metadata, &rel.target_object)?;
                on.push(format!(
                    "{}.{} = {}.{}",
                    quote_ident(&join.alias)?,
                    quote_ident(target.column_for(&rel.target_field))?,
                    quote_ident(alias)?,
                    quote_ident(source.column_for(&rel.join_field))?
                ));
                target
            }
        };
        self.aliases.insert(join.alias.as_str(), target);

        if let Some(extra) = &join.on {
            on.push(self.condition(extra)?);
        }
        let on = if on.is_empty() {
            "TRUE".to_string()
        } else {
            on.join(" AND ")
        };
        let kind = match join.kind {
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Inner => "INNER JOIN",
        };
        Ok(format!(
            "{} {} AS {} ON {}",
            kind,
            table_ident(&target.table_name)?,
            quote_ident(&join.alias)?,
            on
        ))
    }

    // -- columns ------------------------------------------------------------

    fn select_list(&self, shape: &QueryShape, labels: ColumnLabels) -> Result<String> {
        let mut columns = Vec::new();
        if shape.selects.is_empty() {
            self.all_columns(self.main_alias, labels, &mut columns)?;
        }
        for selection in &shape.selects {
            match selection {
                Selection::AllFields { alias } => self.all_columns(alias, labels, &mut columns)?,
                Selection::Field { alias, field } => {
                    columns.push(self.labelled(alias, field, labels)?)
                }
            }
        }
        for join in shape.joins.iter().filter(|j| j.select) {
            self.all_columns(&join.alias, labels, &mut columns)?;
        }
        Ok(columns.join(", "))
    }

    fn all_columns(&self, alias: &str, labels: ColumnLabels, out: &mut Vec<String>) -> Result<()> {
        let object = self.object_for(alias)?;
        let fields = object.field_names();
        if fields.is_empty() {
            out.push(format!("{}.*", quote_ident(alias)?));
            return Ok(());
        }
        for field in fields {
            out.push(self.labelled(alias, field, labels)?);
        }
        Ok(())
    }

    fn labelled(&self, alias: &str, field: &str, labels: ColumnLabels) -> Result<String> {
        let column = self.object_for(alias)?.column_for(field);
        let label = match labels {
            ColumnLabels::Fields if alias == self.main_alias => field.to_string(),
            ColumnLabels::Fields => format!("{alias}.{field}"),
            ColumnLabels::Raw => format!("{alias}_{column}"),
        };
        Ok(format!(
            "{}.{} AS {}",
            quote_ident(alias)?,
            quote_ident(column)?,
            quote_label(&label)
        ))
    }

    fn returning(&self, shape: &QueryShape) -> Result<String> {
        if shape.returning.is_empty() {
            return Ok(String::new());
        }
        let mut columns = Vec::new();
        for field in &shape.returning {
            if field == "*" {
                self.all_columns(self.main_alias, ColumnLabels::Fields, &mut columns)?;
            } else {
                columns.push(self.labelled(self.main_alias, field, ColumnLabels::Fields)?);
            }
        }
        Ok(format!(" RETURNING {}", columns.join(", ")))
    }

    // -- filters ------------------------------------------------------------

    fn where_clause(&mut self, shape: &QueryShape, exclude_deleted: bool) -> Result<String> {
        let mut parts = Vec::new();
        for condition in &shape.conditions {
            parts.push(self.condition(condition)?);
        }
        if exclude_deleted && !shape.with_deleted {
            if let Some(marker) = &self.main.soft_delete_field {
                parts.push(format!(
                    "{}.{} IS NULL",
                    quote_ident(self.main_alias)?,
                    quote_ident(self.main.column_for(marker))?
                ));
            }
        }
        if parts.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" WHERE {}", parts.join(" AND ")))
    }

    fn condition(&mut self, condition: &Condition) -> Result<String> {
        Ok(match condition {
            Condition::Eq(field, Value::Null) | Condition::IsNull(field) => {
                format!("{} IS NULL", self.column(field)?)
            }
            Condition::Ne(field, Value::Null) | Condition::IsNotNull(field) => {
                format!("{} IS NOT NULL", self.column(field)?)
            }
            Condition::Eq(field, value) => {
                let column = self.column(field)?;
                format!("{} = {}", column, self.bind(value))
            }
            Condition::Ne(field, value) => {
                let column = self.column(field)?;
                format!("{} <> {}", column, self.bind(value))
            }
            Condition::In(_, values) if values.is_empty() => "FALSE".to_string(),
            Condition::In(field, values) => {
                let column = self.column(field)?;
                let params: Vec<String> = values.iter().map(|v| self.bind(v)).collect();
                format!("{} IN ({})", column, params.join(", "))
            }
            Condition::Raw(sql) => format!("({sql})"),
            Condition::And(inner) => self.group(inner, " AND ", "TRUE")?,
            Condition::Or(inner) => self.group(inner, " OR ", "FALSE")?,
        })
    }

    fn group(&mut self, conditions: &[Condition], op: &str, empty: &str) -> Result<String> {
        if conditions.is_empty() {
            return Ok(empty.to_string());
        }
        let parts = conditions
            .iter()
            .map(|c| self.condition(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({})", parts.join(op)))
    }

    fn order_and_limit(&self, shape: &QueryShape) -> Result<String> {
        let mut sql = String::new();
        if !shape.order_by.is_empty() {
            let terms = shape
                .order_by
                .iter()
                .map(|o| {
                    let direction = match o.order {
                        Order::Asc => "ASC",
                        Order::Desc => "DESC",
                    };
                    Ok(format!("{} {}", self.column(&o.field)?, direction))
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(&format!(" ORDER BY {}", terms.join(", ")));
        }
        if let Some(take) = shape.take {
            sql.push_str(&format!(" LIMIT {take}"));
        }
        if let Some(skip) = shape.skip {
            sql.push_str(&format!(" OFFSET {skip}"));
        }
        Ok(sql)
    }

    // -- writes -------------------------------------------------------------

    fn insert_values(&mut self, shape: &QueryShape) -> Result<String> {
        if shape.values.is_empty() {
            bail!("insert into '{}' has no values", self.main.name_singular);
        }
        let mut fields: Vec<&str> = shape
            .values
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        fields.sort_unstable();
        fields.dedup();

        if fields.is_empty() {
            if shape.values.len() > 1 {
                bail!("multi-row insert without any field values");
            }
            return Ok("DEFAULT VALUES".to_string());
        }

        let columns = fields
            .iter()
            .map(|f| quote_ident(self.main.column_for(f)))
            .collect::<Result<Vec<_>>>()?;
        let mut rows = Vec::with_capacity(shape.values.len());
        for row in &shape.values {
            let cells: Vec<String> = fields
                .iter()
                .map(|f| match row.get(*f) {
                    Some(value) => self.bind(value),
                    None => "DEFAULT".to_string(),
                })
                .collect();
            rows.push(format!("({})", cells.join(", ")));
        }
        Ok(format!("({}) VALUES {}", columns.join(", "), rows.join(", ")))
    }

    fn update_set(&mut self, shape: &QueryShape) -> Result<String> {
        let values = shape
            .values
            .first()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("update of '{}' has no values", self.main.name_singular))?;
        let mut fields: Vec<&String> = values.keys().collect();
        fields.sort_unstable();

        let mut assignments = Vec::with_capacity(fields.len());
        for field in fields {
            let column = quote_ident(self.main.column_for(field))?;
            assignments.push(format!("{} = {}", column, self.bind(&values[field.as_str()])));
        }
        Ok(assignments.join(", "))
    }
}

fn lookup<'a>(metadata: &'a ObjectMetadataMaps, name: &str) -> Result<&'a ObjectMetadata> {
    metadata
        .get_by_name(name)
        .ok_or_else(|| anyhow!("object metadata not found for '{}'", name))
}

fn quote_ident(ident: &str) -> Result<String> {
    if ident.is_empty() {
        return Err(anyhow!("empty identifier"));
    }
    if !ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(anyhow!("invalid identifier '{}'", ident));
    }
    Ok(format!("\"{ident}\""))
}

/// `schema.table` or `table`.
fn table_ident(table: &str) -> Result<String> {
    let parts = table
        .split('.')
        .map(quote_ident)
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("."))
}

fn quote_label(label: &str) -> String {
    format!("\"{}\"", label.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tessera_core::{MetadataDefinition, ObjectRecord};

    fn metadata() -> ObjectMetadataMaps {
        MetadataDefinition::from_yaml(
            r#"
objects:
  - name: company
    table: core.company
    fields:
      - name: id
      - name: name
      - name: annualRevenue
        column_name: annual_revenue
  - name: person
    table: people
    fields:
      - name: id
      - name: name
      - name: companyId
        column_name: company_id
    relations:
      - name: company
        target_object: company
        join_field: companyId
  - name: auditEvent
    soft_delete_field: null
"#,
        )
        .unwrap()
        .build()
        .unwrap()
    }

    fn record(value: Value) -> ObjectRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_select_all_fields_excludes_deleted() {
        let shape = QueryShape::select_from("company", "c");
        let q = render_select(&shape, &metadata(), ColumnLabels::Fields).unwrap();

        assert_eq!(
            q.sql,
            r#"SELECT "c"."annual_revenue" AS "annualRevenue", "c"."id" AS "id", "c"."name" AS "name" FROM "core"."company" AS "c" WHERE "c"."deletedAt" IS NULL"#
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn test_select_with_filters_order_and_paging() {
        let mut shape = QueryShape::select_from("company", "c");
        shape.selects = vec![Selection::from("c.name")];
        shape.conditions = vec![
            Condition::eq("c.name", "Acme"),
            Condition::Or(vec![
                Condition::is_in("c.id", vec![json!(1), json!(2)]),
                Condition::eq("annualRevenue", Value::Null),
            ]),
        ];
        shape.order_by = vec![tessera_policy::OrderBy {
            field: FieldRef::from("c.name"),
            order: Order::Desc,
        }];
        shape.take = Some(10);
        shape.skip = Some(20);
        shape.with_deleted = true;

        let q = render_select(&shape, &metadata(), ColumnLabels::Fields).unwrap();

        assert_eq!(
            q.sql,
            r#"SELECT "c"."name" AS "name" FROM "core"."company" AS "c" WHERE "c"."name" = $1 AND ("c"."id" IN ($2, $3) OR "c"."annual_revenue" IS NULL) ORDER BY "c"."name" DESC LIMIT 10 OFFSET 20"#
        );
        assert_eq!(q.params, vec![json!("Acme"), json!(1), json!(2)]);
    }

    #[test]
    fn test_relation_join() {
        let mut shape = QueryShape::select_from("person", "p");
        shape.selects = vec![Selection::from("p.name"), Selection::from("co.name")];
        shape.joins = vec![Join::relation("p.company", "co").inner()];

        let q = render_select(&shape, &metadata(), ColumnLabels::Fields).unwrap();

        assert_eq!(
            q.sql,
            r#"SELECT "p"."name" AS "name", "co"."name" AS "co.name" FROM "people" AS "p" INNER JOIN "core"."company" AS "co" ON "co"."id" = "p"."company_id" WHERE "p"."deletedAt" IS NULL"#
        );
    }

    #[test]
    fn test_object_join_with_condition_and_raw_labels() {
        let mut shape = QueryShape::select_from("person", "p");
        shape.selects = vec![Selection::from("p.companyId")];
        shape.joins = vec![Join::object(
            "company",
            "co",
            Condition::Raw(r#""co"."id" = "p"."company_id""#.to_string()),
        )];
        shape.with_deleted = true;

        let q = render_select(&shape, &metadata(), ColumnLabels::Raw).unwrap();

        assert_eq!(
            q.sql,
            r#"SELECT "p"."company_id" AS "p_company_id" FROM "people" AS "p" LEFT JOIN "core"."company" AS "co" ON ("co"."id" = "p"."company_id")"#
        );
    }

    #[test]
    fn test_empty_in_renders_false() {
        let mut shape = QueryShape::select_from("company", "c");
        shape.selects = vec![Selection::from("c.id")];
        shape.conditions = vec![Condition::is_in("c.id", vec![])];
        shape.with_deleted = true;

        let q = render_select(&shape, &metadata(), ColumnLabels::Fields).unwrap();
        assert!(q.sql.ends_with("WHERE FALSE"));
    }

    #[test]
    fn test_count_and_exists() {
        let mut shape = QueryShape::select_from("company", "c");
        shape.conditions = vec![Condition::ne("c.name", "Acme")];
        shape.take = Some(5);

        let count = render_count(&shape, &metadata()).unwrap();
        assert_eq!(
            count.sql,
            r#"SELECT COUNT(*) AS "count" FROM "core"."company" AS "c" WHERE "c"."name" <> $1 AND "c"."deletedAt" IS NULL"#
        );

        let exists = render_exists(&shape, &metadata()).unwrap();
        assert_eq!(
            exists.sql,
            r#"SELECT EXISTS (SELECT 1 FROM "core"."company" AS "c" WHERE "c"."name" <> $1 AND "c"."deletedAt" IS NULL) AS "exists""#
        );
        assert_eq!(exists.params, vec![json!("Acme")]);
    }

    #[test]
    fn test_insert_fills_missing_fields_with_default() {
        let mut shape = QueryShape::select_from("company", "c").with_operation(QueryOperation::Insert);
        shape.values = vec![
            record(json!({ "name": "Acme", "annualRevenue": 10 })),
            record(json!({ "name": "Globex" })),
        ];
        shape.returning = vec!["id".to_string()];

        let q = render_write(&shape, &metadata()).unwrap();

        assert_eq!(
            q.sql,
            r#"INSERT INTO "core"."company" AS "c" ("annual_revenue", "name") VALUES ($1, $2), (DEFAULT, $3) RETURNING "c"."id" AS "id""#
        );
        assert_eq!(q.params, vec![json!(10), json!("Acme"), json!("Globex")]);
    }

    #[test]
    fn test_update() {
        let mut shape = QueryShape::select_from("company", "c").with_operation(QueryOperation::Update);
        shape.values = vec![record(json!({ "name": "Acme Corp" }))];
        shape.conditions = vec![Condition::eq("c.id", 1)];

        let q = render_write(&shape, &metadata()).unwrap();

        assert_eq!(
            q.sql,
            r#"UPDATE "core"."company" AS "c" SET "name" = $1 WHERE "c"."id" = $2"#
        );
        assert_eq!(q.params, vec![json!("Acme Corp"), json!(1)]);
    }

    #[test]
    fn test_delete_soft_delete_and_restore() {
        let base = {
            let mut shape = QueryShape::select_from("company", "c");
            shape.conditions = vec![Condition::eq("c.id", 1)];
            shape
        };

        let delete = render_write(&base.clone().with_operation(QueryOperation::Delete), &metadata());
        assert_eq!(
            delete.unwrap().sql,
            r#"DELETE FROM "core"."company" AS "c" WHERE "c"."id" = $1"#
        );

        let soft = render_write(&base.clone().with_operation(QueryOperation::SoftDelete), &metadata());
        assert_eq!(
            soft.unwrap().sql,
            r#"UPDATE "core"."company" AS "c" SET "deletedAt" = now() WHERE "c"."id" = $1"#
        );

        let mut restore = base.with_operation(QueryOperation::Restore);
        restore.returning = vec!["*".to_string()];
        assert_eq!(
            render_write(&restore, &metadata()).unwrap().sql,
            r#"UPDATE "core"."company" AS "c" SET "deletedAt" = NULL WHERE "c"."id" = $1 RETURNING "c"."annual_revenue" AS "annualRevenue", "c"."id" AS "id", "c"."name" AS "name""#
        );
    }

    #[test]
    fn test_rejected_writes() {
        let maps = metadata();

        let no_marker = QueryShape::select_from("auditEvent", "a").with_operation(QueryOperation::SoftDelete);
        assert!(render_write(&no_marker, &maps).is_err());

        let empty_update = QueryShape::select_from("company", "c").with_operation(QueryOperation::Update);
        assert!(render_write(&empty_update, &maps).is_err());

        let empty_insert = QueryShape::select_from("company", "c").with_operation(QueryOperation::Insert);
        assert!(render_write(&empty_insert, &maps).is_err());

        let mut joined = QueryShape::select_from("person", "p").with_operation(QueryOperation::Delete);
        joined.joins = vec![Join::relation("p.company", "co")];
        assert!(render_write(&joined, &maps).is_err());
    }

    #[test]
    fn test_invalid_identifiers_rejected() {
        let mut shape = QueryShape::select_from("company", "c");
        shape.selects = vec![Selection::from(r#"c.name"; DROP TABLE company; --"#)];
        assert!(render_select(&shape, &metadata(), ColumnLabels::Fields).is_err());

        let unknown_alias = QueryShape {
            conditions: vec![Condition::eq("x.id", 1)],
            ..QueryShape::select_from("company", "c")
        };
        assert!(render_select(&unknown_alias, &metadata(), ColumnLabels::Fields).is_err());
    }
}
