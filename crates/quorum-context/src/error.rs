use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Feed(#[from] rss::Error),

    #[error("Corrupt journal row: {0}")]
    Corrupt(String),

    #[error("Context source not available: {0}")]
    Unavailable(String),
}
