//! A stateful conversion session: select a PDF, convert it, save the result.
//!
//! The session owns everything between those steps (the resolved input, its
//! temp files, the finished document) so nothing lives in process-wide state.
//! Any failure is logged, reported to the progress callback and returns the
//! session to [`SessionState::Idle`].

use crate::config::ConversionConfig;
use crate::convert;
use crate::error::DarkModeError;
use crate::output::ConversionOutput;
use crate::pipeline::input::{self, ResolvedInput};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Where a [`ConversionSession`] currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing selected.
    Idle,
    /// A validated input is waiting to be converted.
    Ready,
    /// A converted document is available.
    Converted,
}

enum State {
    Idle,
    Ready(ResolvedInput),
    Converted {
        input: ResolvedInput,
        output: ConversionOutput,
    },
}

/// Select → convert → save, one document at a time.
///
/// ```rust,no_run
/// use pdf_darkmode::{ConversionConfig, ConversionSession};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = ConversionSession::new(ConversionConfig::default());
/// session.select("report.pdf").await?;
/// session.convert().await?;
/// let saved = session.save_to(".").await?; // ./dark-mode-report.pdf
/// # Ok(())
/// # }
/// ```
pub struct ConversionSession {
    config: ConversionConfig,
    state: State,
}

impl ConversionSession {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            state: State::Idle,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        match self.state {
            State::Idle => SessionState::Idle,
            State::Ready(_) => SessionState::Ready,
            State::Converted { .. } => SessionState::Converted,
        }
    }

    /// Name of the selected file, if any.
    pub fn selected_name(&self) -> Option<&str> {
        match &self.state {
            State::Idle => None,
            State::Ready(input) | State::Converted { input, .. } => Some(input.file_name()),
        }
    }

    /// The converted document, once [`convert`](Self::convert) has succeeded.
    pub fn output(&self) -> Option<&ConversionOutput> {
        match &self.state {
            State::Converted { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Resolve and validate a path or URL, replacing any previous selection.
    pub async fn select(&mut self, input_str: &str) -> Result<(), DarkModeError> {
        self.reset();
        let resolved = input::resolve_input(input_str, &self.config).await;
        self.accept(resolved)
    }

    /// Select a PDF held in memory.
    pub fn select_bytes(&mut self, bytes: &[u8], file_name: &str) -> Result<(), DarkModeError> {
        self.reset();
        let resolved = input::resolve_bytes(bytes, file_name, &self.config);
        self.accept(resolved)
    }

    /// Convert the selected document.
    ///
    /// Converting again after a successful run re-converts the same input.
    pub async fn convert(&mut self) -> Result<&ConversionOutput, DarkModeError> {
        let input = match std::mem::replace(&mut self.state, State::Idle) {
            State::Ready(input) | State::Converted { input, .. } => input,
            State::Idle => return Err(DarkModeError::InvalidState("No PDF selected")),
        };

        match convert::convert_resolved(&input, &self.config).await {
            Ok(output) => {
                info!(
                    "Session converted '{}' → '{}'",
                    input.file_name(),
                    output.file_name
                );
                self.state = State::Converted { input, output };
                self.output()
                    .ok_or(DarkModeError::InvalidState("conversion output missing"))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Write the converted document into `dir` as `dark-mode-<name>`.
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, DarkModeError> {
        let output = self
            .output()
            .ok_or(DarkModeError::InvalidState("Nothing converted yet"))?;
        let path = dir.as_ref().join(&output.file_name);
        convert::write_atomic(&path, &output.pdf).await?;
        info!("Saved {} bytes to {}", output.pdf.len(), path.display());
        Ok(path)
    }

    /// Drop the selection and any converted output, removing temp files.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    fn accept(&mut self, resolved: Result<ResolvedInput, DarkModeError>) -> Result<(), DarkModeError> {
        let resolved = match resolved.and_then(|r| r.validate(&self.config).map(|_| r)) {
            Ok(r) => r,
            Err(e) => return Err(self.fail(e)),
        };
        info!(
            "Selected '{}' ({} bytes)",
            resolved.file_name(),
            resolved.size_bytes()
        );
        self.state = State::Ready(resolved);
        Ok(())
    }

    fn fail(&mut self, e: DarkModeError) -> DarkModeError {
        error!("Conversion failed: {}", e);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_conversion_failed(&e.to_string());
        }
        self.reset();
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ConversionProgressCallback, ProgressCallback};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingCallback {
        failures: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for RecordingCallback {
        fn on_conversion_failed(&self, error: &str) {
            self.failures.lock().unwrap().push(error.to_string());
        }
    }

    const TINY_PDF: &[u8] = b"%PDF-1.4\n%%EOF\n";

    #[test]
    fn select_bytes_moves_to_ready() {
        let mut session = ConversionSession::new(ConversionConfig::default());
        assert_eq!(session.state(), SessionState::Idle);

        session.select_bytes(TINY_PDF, "a.pdf").unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.selected_name(), Some("a.pdf"));
        assert!(session.output().is_none());
    }

    #[test]
    fn rejected_selection_resets_and_notifies() {
        let cb = Arc::new(RecordingCallback::default());
        let config = ConversionConfig::builder()
            .progress_callback(cb.clone() as ProgressCallback)
            .build()
            .unwrap();
        let mut session = ConversionSession::new(config);

        session.select_bytes(TINY_PDF, "a.pdf").unwrap();
        let err = session
            .select_bytes(b"plain text, not a pdf", "notes.txt")
            .unwrap_err();

        assert!(matches!(err, DarkModeError::InvalidMediaType { .. }));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.selected_name(), None);
        let failures = cb.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("notes.txt"));
    }

    #[test]
    fn convert_without_selection_is_an_error() {
        let mut session = ConversionSession::new(ConversionConfig::default());
        let err = tokio_test::block_on(session.convert()).unwrap_err();
        assert!(matches!(err, DarkModeError::InvalidState(_)));
    }

    #[tokio::test]
    async fn save_before_convert_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ConversionSession::new(ConversionConfig::default());
        session.select_bytes(TINY_PDF, "a.pdf").unwrap();
        assert!(session.save_to(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn select_missing_file_stays_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ConversionSession::new(ConversionConfig::default());
        let missing = dir.path().join("nope.pdf");
        let err = session.select(&missing.to_string_lossy()).await.unwrap_err();
        assert!(matches!(err, DarkModeError::FileNotFound { .. }));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn reset_clears_selection() {
        let mut session = ConversionSession::new(ConversionConfig::default());
        session.select_bytes(TINY_PDF, "a.pdf").unwrap();
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
    }
}
