use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a valid token document", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("not a valid token document")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize tokens")]
    Serialize(#[source] serde_json::Error),
    #[error("invalid expression {input:?}: {message}")]
    Expression { input: String, message: String },
    #[error("token {token} references {{{reference}}}, which does not exist")]
    MissingReference { token: String, reference: String },
    #[error("circular reference: {}", chain.join(" -> "))]
    CircularReference { chain: Vec<String> },
    #[error("token {token}: {reason}")]
    InvalidValue { token: String, reason: String },
    #[error("unknown theme {0:?}, expected \"light\" or \"dark\"")]
    UnknownTheme(String),
}
