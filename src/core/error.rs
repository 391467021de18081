use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the loader.
/// Every module returns `Result<T, LoaderError>`.
#[derive(Debug, Error)]
pub enum LoaderError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Manifest ────────────────────────────────────────
    #[error("manifest.json not found in {0}")]
    ManifestMissing(String),

    #[error("Invalid manifest in {package}: {reason}")]
    ManifestInvalid { package: String, reason: String },

    // ── Natives ─────────────────────────────────────────
    #[error("Failed to create native dir {path:?}: {source}")]
    NativeStagingFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Code loading ────────────────────────────────────
    #[error("Entry point '{entry}' not found: {reason}")]
    EntryNotFound { entry: String, reason: String },

    #[error("Cannot open library {path:?}: {source}")]
    LibraryLoad {
        path: PathBuf,
        source: libloading::Error,
    },

    /// Wraps a failure raised while the entry point itself was running.
    #[error("Invocation of '{entry}' failed")]
    Invocation {
        entry: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LoaderResult<T> = Result<T, LoaderError>;

impl From<std::io::Error> for LoaderError {
    fn from(source: std::io::Error) -> Self {
        LoaderError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LoaderError {
    /// Attach a path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoaderError::Io {
            path: path.into(),
            source,
        }
    }

    /// The message that gets reported for a failed load.
    ///
    /// One level of `Invocation` wrapping is peeled off so the report names
    /// what went wrong inside the entry point instead of the wrapper, then the
    /// remaining source chain is followed to its deepest cause.
    pub fn reported_cause(&self) -> String {
        let start: &(dyn std::error::Error + 'static) = match self {
            LoaderError::Invocation { source, .. } => source.as_ref(),
            other => other,
        };

        let mut deepest = start;
        let mut depth = 0;
        while let Some(next) = deepest.source() {
            deepest = next;
            depth += 1;
        }

        if depth == 0 {
            start.to_string()
        } else {
            format!("{start}: caused by {deepest}")
        }
    }
}

/// Error raised by an entry point that panicked instead of returning.
#[derive(Debug, Error)]
#[error("entry point panicked: {0}")]
pub struct EntryPanic(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_cause_unwraps_one_invocation_level() {
        let err = LoaderError::Invocation {
            entry: "com.example.Hello".into(),
            source: Box::new(EntryPanic("boom".into())),
        };
        assert_eq!(err.reported_cause(), "entry point panicked: boom");
    }

    #[test]
    fn reported_cause_follows_source_chain() {
        let err = LoaderError::NativeStagingFailed {
            path: PathBuf::from("/cache/natives/a.ncm"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let report = err.reported_cause();
        assert!(report.starts_with("Failed to create native dir"));
        assert!(report.ends_with("caused by denied"));
    }

    #[test]
    fn reported_cause_without_source_is_the_message() {
        let err = LoaderError::ManifestMissing("a.ncm".into());
        assert_eq!(err.reported_cause(), "manifest.json not found in a.ncm");
    }
}
