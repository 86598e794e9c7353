use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabularError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("parse error: {0}")]
    Parse(String),
}
