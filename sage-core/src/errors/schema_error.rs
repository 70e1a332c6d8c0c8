/// Schema artifact and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("artifact not found: {path}")]
    ArtifactNotFound { path: String },

    #[error("artifact {path} failed to parse: {reason}")]
    ArtifactMalformed { path: String, reason: String },

    #[error("invalid table name `{name}`: expected database_name.table_name")]
    InvalidTableName { name: String },

    #[error("unknown database `{database}`")]
    UnknownDatabase { database: String },

    #[error("unknown table `{table}`")]
    UnknownTable { table: String },

    #[error("table `{table}` has no column `{column}`")]
    UnknownColumn { table: String, column: String },
}
