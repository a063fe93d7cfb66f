// SQLite Warehouse Staging Writer
//
// Stages sheet rows as JSON documents into per-table `<name>_staging`
// tables. The table name arrives as the whitelist proof type, so the
// identifier interpolation below can never carry attacker input. The
// connection descriptor's database field is treated as a filesystem
// path to the warehouse database file.

use async_trait::async_trait;
use inventa_core::domain::ConnectionDescriptor;
use inventa_core::error::Result;
use inventa_core::port::sheet_reader::Sheet;
use inventa_core::port::WarehouseWriter;
use inventa_core::security::{Credential, TableName};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::str::FromStr;
use tracing::debug;

use crate::connection::map_sqlx_error;

pub struct SqliteWarehouse;

impl SqliteWarehouse {
    pub fn new() -> Self {
        Self
    }

    async fn open(&self, connection: &ConnectionDescriptor) -> Result<SqliteConnection> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", connection.database))
            .map_err(map_sqlx_error)?
            .create_if_missing(true);
        SqliteConnection::connect_with(&options)
            .await
            .map_err(map_sqlx_error)
    }
}

impl Default for SqliteWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WarehouseWriter for SqliteWarehouse {
    async fn load_rows(
        &self,
        connection: &ConnectionDescriptor,
        _credential: Option<&Credential>,
        table: TableName,
        batch_label: &str,
        sheet: &Sheet,
    ) -> Result<u64> {
        // Connection per call; dropped (and thus released) on every
        // exit path, including the error returns below.
        let mut conn = self.open(connection).await?;

        let staging = format!("{}_staging", table.as_str());
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS \"{staging}\" ( \
             staging_id  INTEGER PRIMARY KEY AUTOINCREMENT, \
             batch_label TEXT NOT NULL, \
             row_json    TEXT NOT NULL)"
        ))
        .execute(&mut conn)
        .await
        .map_err(map_sqlx_error)?;

        let mut tx = conn.begin().await.map_err(map_sqlx_error)?;
        let insert = format!("INSERT INTO \"{staging}\" (batch_label, row_json) VALUES (?, ?)");
        let mut loaded = 0u64;
        for row in &sheet.rows {
            let mut object = Map::new();
            for (header, value) in sheet.headers.iter().zip(row) {
                object.insert(header.clone(), Value::String(value.clone()));
            }
            sqlx::query(&insert)
                .bind(batch_label)
                .bind(Value::Object(object).to_string())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            loaded += 1;
        }
        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(table = table.as_str(), batch_label, rows = loaded, "Staged sheet rows");
        Ok(loaded)
    }
}
