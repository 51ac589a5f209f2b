use log::{debug, info, warn};
use rusqlite::{params_from_iter, Connection};

use crate::config::TableSpec;
use crate::error::{GatewayError, Result};
use crate::sqlite::{FieldMap, Row, RowSet, Selection, Value};
use crate::statement::{self, SqlQuery};

/// Applied to every new connection
const CONNECTION_SETTINGS: &str = "PRAGMA foreign_keys = ON;";

/// Single-table access over one owned SQLite connection.
///
/// Call [`TableGateway::initialize_table`] before any read or write. Each
/// operation builds and runs exactly one statement; writes commit before
/// returning.
#[derive(Debug)]
pub struct TableGateway {
    spec: TableSpec,
    connection: Option<Connection>,
    table_exist: bool,
}

impl TableGateway {
    pub const DB_TYPE: &'static str = "sqlite";

    pub fn new(spec: TableSpec) -> Self {
        Self {
            spec,
            connection: None,
            table_exist: false,
        }
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    pub fn table_name(&self) -> &str {
        &self.spec.table_name
    }

    pub fn set_table_name(&mut self, table_name: impl Into<String>) -> Result<()> {
        self.ensure_unlocked("table name")?;
        self.spec.table_name = table_name.into();
        Ok(())
    }

    pub fn set_table_statement(&mut self, creation_statement: impl Into<String>) -> Result<()> {
        self.ensure_unlocked("creation statement")?;
        self.spec.creation_statement = creation_statement.into();
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Whether the last `initialize_table` found or created the table
    pub fn is_table_initialized(&self) -> bool {
        self.table_exist
    }

    fn ensure_unlocked(&self, what: &str) -> Result<()> {
        if self.connection.is_some() {
            return Err(GatewayError::Validation(format!(
                "cannot change the {what} of {} while its connection is open",
                self.spec.table_name
            )));
        }
        Ok(())
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| GatewayError::not_connected(&self.spec.table_name))
    }

    // ---- lifecycle ----

    /// Open the database file, creating it if absent, and apply the session settings
    pub fn create_connection(&mut self) -> Result<()> {
        if self.connection.is_some() {
            debug!(
                "Connection for {} already open, reapplying settings",
                self.spec.table_name
            );
            return self.initialize_settings();
        }

        let path = &self.spec.db_path;
        let connection = Connection::open(path).map_err(|e| {
            GatewayError::connection(format!("failed to open {}", path.display()), e)
        })?;
        info!("Connection created with database {}", path.display());
        self.connection = Some(connection);

        if let Err(e) = self.initialize_settings() {
            self.connection = None;
            return Err(e);
        }
        Ok(())
    }

    /// Enable foreign key enforcement; does nothing without an open connection
    pub fn initialize_settings(&self) -> Result<()> {
        if let Some(connection) = &self.connection {
            connection
                .execute_batch(CONNECTION_SETTINGS)
                .map_err(|e| GatewayError::connection("failed to apply connection settings", e))?;
            debug!("Applied connection settings for {}", self.spec.table_name);
        }
        Ok(())
    }

    /// Release the connection. Closing twice is not an error.
    pub fn close_connection(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            warn!("Connection for {} doesn't exist", self.spec.table_name);
            return Ok(());
        };
        self.table_exist = false;
        connection
            .close()
            .map_err(|(_, e)| GatewayError::connection("failed to close connection", e))?;
        info!("Connection closed for {}", self.spec.table_name);
        Ok(())
    }

    pub fn create_table(&self) -> Result<()> {
        let connection = self.connection()?;
        let statement = &self.spec.creation_statement;
        debug!("{statement}");
        connection
            .execute_batch(statement)
            .map_err(|e| GatewayError::execution(statement, e))?;
        info!("Created table {}", self.spec.table_name);
        Ok(())
    }

    /// Open the connection and create the table if the catalog lacks it
    pub fn initialize_table(&mut self) -> Result<()> {
        self.create_connection()?;
        self.table_exist = self.check_table_exist()?;
        if !self.table_exist {
            self.create_table()?;
            self.table_exist = true;
        }
        Ok(())
    }

    // ---- existence checks ----

    pub fn check_table_exist(&self) -> Result<bool> {
        let query = statement::table_count(&self.spec.table_name);
        match self.query_count(&query)? {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(GatewayError::Integrity(format!(
                "{n} tables named {} exist in database",
                self.spec.table_name
            ))),
        }
    }

    pub fn check_row_exist(&self, column: &str, value: impl Into<Value>) -> Result<bool> {
        let query = statement::row_count(&self.spec.table_name, column, value.into());
        match self.query_count(&query)? {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(GatewayError::Integrity(format!(
                "{n} rows of {} match on {column}",
                self.spec.table_name
            ))),
        }
    }

    // ---- writes ----

    pub fn insert(&mut self, fields: &FieldMap) -> Result<bool> {
        let query = statement::insert(&self.spec.table_name, fields)?;
        self.execute_write(&query)
    }

    /// Delete the rows matching a single-column key
    pub fn delete(&mut self, primary_key: &FieldMap) -> Result<bool> {
        let query = statement::delete(&self.spec.table_name, primary_key)?;
        self.execute_write(&query)
    }

    /// Update `set_fields` on the rows matching the single-column `where_fields`
    pub fn modify_existing_value(
        &mut self,
        set_fields: &FieldMap,
        where_fields: &FieldMap,
    ) -> Result<bool> {
        let query = statement::update(&self.spec.table_name, set_fields, where_fields)?;
        self.execute_write(&query)
    }

    // ---- reads ----

    pub fn get_all_data(&self) -> Result<RowSet> {
        self.query_rows(&statement::select_all(&self.spec.table_name))
    }

    /// Rows whose `key` column equals `value`; may be empty or hold several rows
    pub fn get_specific_data_row(
        &self,
        key: &str,
        value: impl Into<Value>,
        selection: &Selection,
    ) -> Result<Vec<Row>> {
        let filter = FieldMap::new().with_value(key, value);
        let query = statement::select_where(&self.spec.table_name, &filter, selection)?;
        Ok(self.query_rows(&query)?.rows)
    }

    /// Every row, restricted to `columns`
    pub fn get_specific_data_col<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<Row>> {
        let query = statement::select_columns(&self.spec.table_name, columns)?;
        Ok(self.query_rows(&query)?.rows)
    }

    // ---- execution ----

    fn execute_write(&mut self, query: &SqlQuery) -> Result<bool> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| GatewayError::not_connected(&self.spec.table_name))?;
        let statement = query.statement.as_str();
        let fail = |e: rusqlite::Error| GatewayError::execution(statement, e);

        debug!("{statement}");
        let tx = connection.transaction().map_err(fail)?;
        let changed = tx
            .execute(statement, params_from_iter(query.params.iter()))
            .map_err(fail)?;
        tx.commit().map_err(fail)?;
        debug!("{changed} row(s) affected in {}", self.spec.table_name);
        Ok(true)
    }

    fn query_count(&self, query: &SqlQuery) -> Result<i64> {
        let connection = self.connection()?;
        debug!("{}", query.statement);
        connection
            .query_row(
                &query.statement,
                params_from_iter(query.params.iter()),
                |row| row.get(0),
            )
            .map_err(|e| GatewayError::execution(&query.statement, e))
    }

    fn query_rows(&self, query: &SqlQuery) -> Result<RowSet> {
        let connection = self.connection()?;
        let statement = query.statement.as_str();
        let fail = |e: rusqlite::Error| GatewayError::execution(statement, e);

        debug!("{statement}");
        let mut stmt = connection.prepare(statement).map_err(fail)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let rows = stmt
            .query_map(params_from_iter(query.params.iter()), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Row>>()
            })
            .map_err(fail)?
            .collect::<rusqlite::Result<Vec<Row>>>()
            .map_err(fail)?;
        Ok(RowSet { rows, columns })
    }
}

/// Table-specific entry points a concrete table type provides on top of the gateway.
///
/// `delete_row` and `modify_primary_key` key on [`DataTable::PRIMARY_KEY`];
/// override them when a table identifies rows differently.
pub trait DataTable {
    /// Full row payload accepted by `insert_data`
    type Record;
    /// Primary key value type
    type Key: Into<Value>;

    const PRIMARY_KEY: &'static str;

    fn gateway(&mut self) -> &mut TableGateway;

    fn insert_data(&mut self, record: Self::Record) -> Result<bool>;

    fn delete_row(&mut self, key: Self::Key) -> Result<bool> {
        let primary_key = FieldMap::new().with_value(Self::PRIMARY_KEY, key);
        self.gateway().delete(&primary_key)
    }

    fn modify_primary_key(&mut self, target: Self::Key, new_key: Self::Key) -> Result<bool> {
        let set_fields = FieldMap::new().with_value(Self::PRIMARY_KEY, new_key);
        let where_fields = FieldMap::new().with_value(Self::PRIMARY_KEY, target);
        self.gateway().modify_existing_value(&set_fields, &where_fields)
    }
}
