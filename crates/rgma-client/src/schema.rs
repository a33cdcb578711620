// crates/rgma-client/src/schema.rs
// ============================================================================
// Module: Schema Helper
// Description: Table, index, view and authorization management for one VDB.
// Purpose: Wrap the stateless schema service calls in typed methods.
// Dependencies: rgma-core
// ============================================================================

//! ## Overview
//! Every [`Schema`] call names the VDB and allows the server to forward the
//! request to the VDB's master schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rgma_core::CallError;
use rgma_core::ColumnDefinition;
use rgma_core::Index;
use rgma_core::RgmaError;
use rgma_core::RgmaType;
use rgma_core::TableDefinition;
use rgma_core::Tuple;
use rgma_core::TupleSet;

use crate::context::ClientContext;
use crate::service::Params;
use crate::service::ServiceCaller;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service hosting schemas.
pub const SCHEMA_SERVICE: &str = "SchemaServlet";

/// Columns of a `getTableDefinition` row.
mod definition_column {
    /// Table or view name.
    pub(super) const TABLE_NAME: usize = 0;
    /// Column name.
    pub(super) const COLUMN_NAME: usize = 1;
    /// SQL type name.
    pub(super) const TYPE: usize = 2;
    /// Declared width.
    pub(super) const SIZE: usize = 3;
    /// NOT NULL flag.
    pub(super) const NOT_NULL: usize = 4;
    /// Primary key flag.
    pub(super) const PRIMARY_KEY: usize = 5;
    /// Underlying table for a view.
    pub(super) const VIEW_FOR: usize = 6;
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Schema of one virtual database.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Caller bound to the schema service.
    caller: ServiceCaller,
    /// VDB name.
    vdb_name: String,
}

impl Schema {
    /// Binds to the schema of `vdb_name`.
    #[must_use]
    pub fn new(context: &ClientContext, vdb_name: &str) -> Self {
        Self {
            caller: ServiceCaller::new(context.clone(), SCHEMA_SERVICE),
            vdb_name: vdb_name.to_string(),
        }
    }

    /// Returns the VDB name.
    #[must_use]
    pub fn vdb_name(&self) -> &str {
        &self.vdb_name
    }

    /// Creates a table with the given authorization rules.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the statement.
    pub fn create_table(&self, statement: &str, authz_rules: &[&str]) -> Result<(), RgmaError> {
        self.call(
            "createTable",
            Params::new().with("createTableStatement", statement).with_list("tableAuthz", authz_rules),
        )
        .map(drop)
    }

    /// Drops a table.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the request.
    pub fn drop_table(&self, table_name: &str) -> Result<(), RgmaError> {
        self.call("dropTable", Params::new().with("tableName", table_name)).map(drop)
    }

    /// Creates an index.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the statement.
    pub fn create_index(&self, statement: &str) -> Result<(), RgmaError> {
        self.call("createIndex", Params::new().with("createIndexStatement", statement)).map(drop)
    }

    /// Drops an index from a table.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the request.
    pub fn drop_index(&self, table_name: &str, index_name: &str) -> Result<(), RgmaError> {
        self.call(
            "dropIndex",
            Params::new().with("tableName", table_name).with("indexName", index_name),
        )
        .map(drop)
    }

    /// Creates a view with the given authorization rules.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the statement.
    pub fn create_view(&self, statement: &str, authz_rules: &[&str]) -> Result<(), RgmaError> {
        self.call(
            "createView",
            Params::new().with("createViewStatement", statement).with_list("viewAuthz", authz_rules),
        )
        .map(drop)
    }

    /// Drops a view.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the request.
    pub fn drop_view(&self, view_name: &str) -> Result<(), RgmaError> {
        self.call("dropView", Params::new().with("viewName", view_name)).map(drop)
    }

    /// Lists every table and view.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the call fails or a row is malformed.
    pub fn get_all_tables(&self) -> Result<Vec<String>, RgmaError> {
        let set = self.call("getAllTables", Params::new())?;
        first_column(&set)
    }

    /// Returns the definition of a table or view.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the call fails, no rows are returned, or a
    /// row is malformed.
    pub fn get_table_definition(&self, table_name: &str) -> Result<TableDefinition, RgmaError> {
        let set = self.call("getTableDefinition", Params::new().with("tableName", table_name))?;
        let first = set.first_row()?;
        let view_for = if first.is_null(definition_column::VIEW_FOR)? {
            None
        } else {
            Some(first.get_string(definition_column::VIEW_FOR)?.to_string())
        };
        let columns = set.rows().iter().map(column_definition).collect::<Result<Vec<_>, _>>()?;
        Ok(TableDefinition {
            table_name: first.get_string(definition_column::TABLE_NAME)?.to_string(),
            view_for,
            columns,
        })
    }

    /// Returns the indexes on a table, columns grouped per index in the order
    /// first seen.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the call fails or a row is malformed.
    pub fn get_table_indexes(&self, table_name: &str) -> Result<Vec<Index>, RgmaError> {
        let set = self.call("getTableIndexes", Params::new().with("tableName", table_name))?;
        let mut indexes: Vec<Index> = Vec::new();
        for row in set.rows() {
            let name = row.get_string(0)?;
            let column = row.get_string(1)?.to_string();
            match indexes.iter_mut().find(|index| index.name == name) {
                Some(index) => index.columns.push(column),
                None => indexes.push(Index {
                    name: name.to_string(),
                    columns: vec![column],
                }),
            }
        }
        Ok(indexes)
    }

    /// Replaces the authorization rules of a table or view.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the server rejects the rules.
    pub fn set_authorization_rules(
        &self,
        table_name: &str,
        authz_rules: &[&str],
    ) -> Result<(), RgmaError> {
        self.call(
            "setAuthorizationRules",
            Params::new().with("tableName", table_name).with_list("tableAuthz", authz_rules),
        )
        .map(drop)
    }

    /// Returns the authorization rules of a table or view.
    ///
    /// # Errors
    ///
    /// Returns [`RgmaError`] when the call fails or a row is malformed.
    pub fn get_authorization_rules(&self, table_name: &str) -> Result<Vec<String>, RgmaError> {
        let set = self.call("getAuthorizationRules", Params::new().with("tableName", table_name))?;
        first_column(&set)
    }

    /// Calls a schema command with the VDB qualifier.
    fn call(&self, command: &str, params: Params) -> Result<TupleSet, RgmaError> {
        let params = params.with("vdbName", &self.vdb_name).with("canForward", "true");
        self.caller.call(command, &params).map_err(CallError::into_public)
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Collects column 0 of every row.
fn first_column(set: &TupleSet) -> Result<Vec<String>, RgmaError> {
    set.rows().iter().map(|row| row.get_string(0).map(str::to_string)).collect()
}

/// Builds a column definition from a `getTableDefinition` row.
fn column_definition(row: &Tuple) -> Result<ColumnDefinition, RgmaError> {
    let type_text = row.get_string(definition_column::TYPE)?;
    let column_type = match type_text.trim().parse::<i32>() {
        Ok(code) => RgmaType::from_code(code)
            .ok_or_else(|| RgmaError::permanent(format!("Unknown column type code {code}")))?,
        Err(_) => RgmaType::from_name(type_text)?,
    };
    Ok(ColumnDefinition {
        name: row.get_string(definition_column::COLUMN_NAME)?.to_string(),
        column_type,
        size: row.get_int(definition_column::SIZE)?,
        not_null: row.get_bool(definition_column::NOT_NULL)?,
        primary_key: row.get_bool(definition_column::PRIMARY_KEY)?,
    })
}
