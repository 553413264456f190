//! Process exit codes for swc
//!
//! Scripts depend on these values; changing one is a breaking change.

use sw_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Unclassified failure, including unexpected server responses
    GeneralError = 1,

    /// Bad arguments, malformed path or invalid profile configuration
    UsageError = 2,

    /// No response received from the cluster
    NetworkError = 3,

    /// Identity service rejected the credentials or the token expired
    AuthError = 4,

    /// Container, object or profile is missing
    NotFound = 5,

    /// Container already exists or is not empty
    Conflict = 6,

    /// Ctrl+C
    Interrupted = 130,
}

impl ExitCode {
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Map a library error onto the exit code scripts will see
    pub const fn from_error(error: &Error) -> Self {
        match error.exit_code() {
            2 => Self::UsageError,
            3 => Self::NetworkError,
            4 => Self::AuthError,
            5 => Self::NotFound,
            6 => Self::Conflict,
            _ => Self::GeneralError,
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(error: &Error) -> Self {
        Self::from_error(error)
    }
}
