//! The core's error taxonomy (spec.md §7).

use camino::Utf8PathBuf;
use thiserror::Error;

/// Kinds of errors the core can raise while generating or executing a
/// build plan.
///
/// `Configuration` is the only variant that is non-fatal at the per-target
/// level: the orchestrator logs it and continues with other targets,
/// surfacing a hard failure only if every target failed. Every other
/// variant aborts the current generation immediately.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error for target {target}: {message}")]
    Configuration { target: String, message: String },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch executor {executor}: {source}")]
    ExecutorLaunch {
        executor: String,
        #[source]
        source: std::io::Error,
    },

    #[error("executor exited with status {0}")]
    ExecutorFailed(std::process::ExitStatus),

    #[error("no executor found in PATH (tried ninja, llbuild)")]
    ExecutorNotFound,

    #[error("duplicate output {path} across invocations in target {target}")]
    DuplicateOutput { target: String, path: Utf8PathBuf },

    #[error("failed to determine current working directory: {0}")]
    CurrentDirectory(#[source] std::io::Error),

    #[error("no targets succeeded during generation")]
    NoTargetsSucceeded,
}

pub type CoreResult<T> = Result<T, CoreError>;
