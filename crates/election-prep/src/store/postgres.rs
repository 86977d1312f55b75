//! PostgreSQL sink using Diesel.

use super::{INSERT_BATCH_SIZE, STANDARD_STRINGS_SQL, create_table_sql, drop_table_sql, insert_batch_sqls};
use crate::config::DatabaseConfig;
use crate::error::Result;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_query;
use polars::prelude::DataFrame;
use tracing::debug;

/// One open connection plus the table it replaces.
pub struct PostgresSink {
    conn: PgConnection,
    table: String,
}

impl PostgresSink {
    /// Open a connection to the configured server.
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let conn = PgConnection::establish(&config.database_url())?;
        debug!("Connected to {}", config.redacted_url());
        Ok(Self {
            conn,
            table: config.table.clone(),
        })
    }

    /// Drop, recreate and fill the table inside one transaction.
    ///
    /// Returns the number of rows inserted.
    pub fn replace_table(&mut self, df: &DataFrame) -> Result<usize> {
        let drop_sql = drop_table_sql(&self.table);
        let create_sql = create_table_sql(&self.table, df);
        let inserts = insert_batch_sqls(&self.table, df, INSERT_BATCH_SIZE)?;

        self.conn.transaction::<_, diesel::result::Error, _>(|conn| {
            sql_query(STANDARD_STRINGS_SQL).execute(conn)?;
            sql_query(drop_sql).execute(conn)?;
            sql_query(create_sql).execute(conn)?;
            for (i, statement) in inserts.iter().enumerate() {
                sql_query(statement.as_str()).execute(conn)?;
                debug!("Inserted batch {}/{}", i + 1, inserts.len());
            }
            Ok(())
        })?;

        Ok(df.height())
    }
}
