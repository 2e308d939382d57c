use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query execution error: {0}")]
    Query(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("match not found: {0}")]
    MatchNotFound(String),

    #[error("card definition not found: {0}")]
    DefinitionNotFound(i64),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}
