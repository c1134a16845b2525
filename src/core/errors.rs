use thiserror::Error;

#[derive(Error, Debug)]
pub enum KneeboardError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Checklist not found: {0}")]
    ChecklistNotFound(String),

    #[error("Checklist has no sections: {0}")]
    EmptyChecklist(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("KneeboardError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for KneeboardError {
    fn from(error: std::io::Error) -> Self {
        KneeboardError::Io(Box::new(error))
    }
}
