use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum ConfigReason {
    #[error("invalid language configuration")]
    Invalid,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for ConfigReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Invalid => 3001,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type ConfigError = StructError<ConfigReason>;
pub type ConfigResult<T> = Result<T, ConfigError>;
