//! Error taxonomy for repository operations.
//!
//! Orchestration code returns `anyhow::Result`; these variants travel inside
//! `anyhow::Error` and can be recovered with `downcast_ref::<RepoError>()`.

/// Errors raised by version parsing, listing parsing, the external tool and
/// release tree lookups.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoError {
    /// A version string could not be turned into a comparison key.
    MalformedVersion { input: String, reason: String },
    /// A listing line did not have exactly four `|`-separated fields.
    MalformedRecord { line: String, fields: usize },
    /// The external tool exited non-zero, timed out or produced unreadable output.
    ExternalTool {
        command: String,
        exit_code: Option<i32>,
        message: String,
    },
    /// No catalog is tracked for this codename/arch pair.
    UnknownRepository { codename: String, arch: String },
}

impl RepoError {
    pub(crate) fn malformed_version(input: &str, reason: impl Into<String>) -> Self {
        RepoError::MalformedVersion {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_repository(codename: &str, arch: &str) -> Self {
        RepoError::UnknownRepository {
            codename: codename.to_string(),
            arch: arch.to_string(),
        }
    }
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::MalformedVersion { input, reason } => {
                write!(f, "Malformed version '{}': {}", input, reason)
            }
            RepoError::MalformedRecord { line, fields } => {
                write!(
                    f,
                    "Malformed listing record '{}': expected 4 fields, found {}",
                    line, fields
                )
            }
            RepoError::ExternalTool {
                command,
                exit_code: Some(code),
                message,
            } => {
                write!(f, "'{}' exited with status {}: {}", command, code, message)
            }
            RepoError::ExternalTool {
                command,
                exit_code: None,
                message,
            } => {
                write!(f, "'{}' failed: {}", command, message)
            }
            RepoError::UnknownRepository { codename, arch } => {
                write!(f, "No repository tracked for {}/{}", codename, arch)
            }
        }
    }
}

impl std::error::Error for RepoError {}
