//! Statement builders.
//!
//! Every builder returns one [`SqlQuery`] whose values are bound positionally.
//! Table and column identifiers are interpolated as given; only values travel
//! as parameters. Shape checks happen here, before any connection is touched.

use crate::error::{GatewayError, Result};
use crate::sqlite::{FieldMap, Selection, Value};

/// SQL statement with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Vec<Value>,
}

impl SqlQuery {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = Value>) -> Self {
        self.params.extend(params);
        self
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn assignments<'a>(columns: impl Iterator<Item = &'a str>) -> String {
    columns
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_list<S: AsRef<str>>(columns: &[S], purpose: &str) -> Result<String> {
    if columns.is_empty() {
        return Err(GatewayError::Validation(format!(
            "{purpose} needs at least one column"
        )));
    }
    let names: Vec<&str> = columns.iter().map(|column| column.as_ref()).collect();
    Ok(names.join(", "))
}

/// Count of catalog tables named `table_name`
pub fn table_count(table_name: &str) -> SqlQuery {
    SqlQuery::new("SELECT count(name) FROM sqlite_master WHERE type='table' AND name = ?")
        .with_params([Value::from(table_name)])
}

/// Count of rows whose `column` equals `value`
pub fn row_count(table_name: &str, column: &str, value: Value) -> SqlQuery {
    SqlQuery::new(format!("SELECT count(*) FROM {table_name} WHERE {column} = ?"))
        .with_params([value])
}

pub fn insert(table_name: &str, fields: &FieldMap) -> Result<SqlQuery> {
    if fields.is_empty() {
        return Err(GatewayError::Validation(
            "insert needs at least one column".to_string(),
        ));
    }
    let columns = fields.columns().collect::<Vec<_>>().join(", ");
    let statement = format!(
        "INSERT INTO {table_name} ({columns}) VALUES ({})",
        placeholders(fields.len())
    );
    Ok(SqlQuery::new(statement).with_params(fields.values().cloned()))
}

pub fn delete(table_name: &str, primary_key: &FieldMap) -> Result<SqlQuery> {
    let (column, value) = primary_key.single("delete")?;
    Ok(
        SqlQuery::new(format!("DELETE FROM {table_name} WHERE {column} = ?"))
            .with_params([value.clone()]),
    )
}

/// UPDATE binding the SET values first, then the WHERE value
pub fn update(table_name: &str, set_fields: &FieldMap, where_fields: &FieldMap) -> Result<SqlQuery> {
    if set_fields.is_empty() {
        return Err(GatewayError::Validation(
            "update needs at least one column to set".to_string(),
        ));
    }
    let (where_column, where_value) = where_fields.single("update condition")?;
    let statement = format!(
        "UPDATE {table_name} SET {} WHERE {where_column} = ?",
        assignments(set_fields.columns())
    );
    Ok(SqlQuery::new(statement)
        .with_params(set_fields.values().cloned())
        .with_params([where_value.clone()]))
}

pub fn select_all(table_name: &str) -> SqlQuery {
    SqlQuery::new(format!("SELECT * FROM {table_name}"))
}

pub fn select_where(table_name: &str, filter: &FieldMap, selection: &Selection) -> Result<SqlQuery> {
    let (column, value) = filter.single("lookup")?;
    let requested = match selection {
        Selection::All => "*".to_string(),
        Selection::Columns(columns) => column_list(columns, "lookup")?,
    };
    Ok(
        SqlQuery::new(format!("SELECT {requested} FROM {table_name} WHERE {column} = ?"))
            .with_params([value.clone()]),
    )
}

pub fn select_columns<S: AsRef<str>>(table_name: &str, columns: &[S]) -> Result<SqlQuery> {
    let requested = column_list(columns, "column scan")?;
    Ok(SqlQuery::new(format!("SELECT {requested} FROM {table_name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_uses_one_placeholder_per_column() {
        let fields = FieldMap::new()
            .with_value("id", "a")
            .with_value("age", Value::Null);
        let query = insert("t", &fields).unwrap();

        assert_eq!(query.statement, "INSERT INTO t (id, age) VALUES (?, ?)");
        assert_eq!(query.params, vec![Value::from("a"), Value::Null]);
    }

    #[test]
    fn empty_insert_is_rejected() {
        assert!(matches!(
            insert("t", &FieldMap::new()),
            Err(GatewayError::Validation(_))
        ));
    }

    #[test]
    fn delete_binds_the_key_value() {
        let key = FieldMap::new().with_value("id", "x' OR '1'='1");
        let query = delete("t", &key).unwrap();

        assert_eq!(query.statement, "DELETE FROM t WHERE id = ?");
        assert_eq!(query.params, vec![Value::from("x' OR '1'='1")]);
    }

    #[test]
    fn delete_with_two_keys_is_rejected() {
        let key = FieldMap::new().with_value("id", "a").with_value("age", 5);
        assert!(matches!(delete("t", &key), Err(GatewayError::Validation(_))));
    }

    #[test]
    fn update_binds_set_values_before_where_value() {
        let set = FieldMap::new().with_value("age", 6).with_value("name", "b");
        let filter = FieldMap::new().with_value("id", "a");
        let query = update("t", &set, &filter).unwrap();

        assert_eq!(query.statement, "UPDATE t SET age = ?, name = ? WHERE id = ?");
        assert_eq!(
            query.params,
            vec![Value::from(6), Value::from("b"), Value::from("a")]
        );
    }

    #[test]
    fn update_rejects_compound_conditions() {
        let set = FieldMap::new().with_value("age", 6);
        let filter = FieldMap::new().with_value("id", "a").with_value("age", 5);
        assert!(matches!(
            update("t", &set, &filter),
            Err(GatewayError::Validation(_))
        ));
        assert!(matches!(
            update("t", &FieldMap::new(), &FieldMap::new().with_value("id", "a")),
            Err(GatewayError::Validation(_))
        ));
    }

    #[test]
    fn select_where_expands_selection() {
        let filter = FieldMap::new().with_value("id", "a");
        let all = select_where("t", &filter, &Selection::All).unwrap();
        assert_eq!(all.statement, "SELECT * FROM t WHERE id = ?");

        let some = select_where("t", &filter, &Selection::columns(["age", "id"])).unwrap();
        assert_eq!(some.statement, "SELECT age, id FROM t WHERE id = ?");
        assert_eq!(some.params, vec![Value::from("a")]);
    }

    #[test]
    fn select_columns_requires_columns() {
        let query = select_columns("t", &["id", "age"]).unwrap();
        assert_eq!(query.statement, "SELECT id, age FROM t");
        assert!(query.params.is_empty());

        assert!(matches!(
            select_columns::<&str>("t", &[]),
            Err(GatewayError::Validation(_))
        ));
    }

    #[test]
    fn catalog_query_binds_table_name() {
        let query = table_count("rooms");
        assert!(query.statement.contains("sqlite_master"));
        assert_eq!(query.params, vec![Value::from("rooms")]);
    }
}
