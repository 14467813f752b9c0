#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown ABI '{name}', expected one of: {expected}")]
    UnknownAbi { name: String, expected: String },

    #[error("Unknown guest call: {0}")]
    UnknownCall(String),

    #[error("Invalid machine state at line {line}: {message}")]
    InvalidState { line: usize, message: String },

    #[error("Register index {0} out of range")]
    RegisterOutOfRange(usize),

    #[error("Invalid value '{0}', expected a decimal or 0x-prefixed hex number")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, Error>;
