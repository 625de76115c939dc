use crate::client::{CompletionBackend, CompletionRequest, Mode};
use crate::config::ColorPalette;
use crate::error::{Error, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

const EXIT_COMMAND: &str = "exit";

/// Line-oriented loop that feeds each line of user input to the completion
/// backend in Continuation mode.
///
/// Interactive input is never chunked: each line is sent whole, so the
/// chunk-size argument does not apply here. Line read and network call are
/// strictly sequential.
pub struct InteractiveSession<B> {
    backend: B,
    model: String,
    temperature: f32,
    colors: ColorPalette,
}

impl<B: CompletionBackend> InteractiveSession<B> {
    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the temperature is outside [0, 2].
    pub fn new(backend: B, model: String, temperature: f32, colors: ColorPalette) -> Result<Self> {
        CompletionRequest::new("", &model, temperature, Mode::Continuation)?;

        Ok(Self {
            backend,
            model,
            temperature,
            colors,
        })
    }

    /// Runs the read-eval-print loop until "exit" or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the line editor fails or a completion call fails.
    pub fn run(&self) -> Result<()> {
        println!(
            "{}",
            self.colors.paint(
                "info",
                "Interactive mode: type your input and press Enter. Type 'exit' to quit.",
            )
        );

        let mut editor = DefaultEditor::new().map_err(|e| Error::session(e.to_string()))?;

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if !self.handle_line(line.trim())? {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    debug!("Input closed, leaving interactive mode");
                    break;
                }
                Err(e) => return Err(Error::session(e.to_string())),
            }
        }

        Ok(())
    }

    /// Handles one trimmed input line. Returns false when the loop should
    /// terminate.
    fn handle_line(&self, line: &str) -> Result<bool> {
        if line.eq_ignore_ascii_case(EXIT_COMMAND) {
            return Ok(false);
        }

        let request =
            CompletionRequest::new(line, &self.model, self.temperature, Mode::Continuation)?;
        let response = self.backend.complete(&request)?;

        println!(
            "{}",
            self.colors.paint("assistant", &format!("AI: {response}"))
        );

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        calls: AtomicUsize,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CompletionBackend for CountingBackend {
        fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.mode, Mode::Continuation);
            Ok(format!("reply to {}", request.text))
        }
    }

    fn test_session() -> InteractiveSession<CountingBackend> {
        InteractiveSession::new(
            CountingBackend::new(),
            "test-model".to_string(),
            0.5,
            ColorPalette::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_exit_terminates_without_completion_calls() {
        let session = test_session();
        assert!(!session.handle_line("exit").unwrap());
        assert_eq!(session.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_exit_is_case_insensitive() {
        let session = test_session();
        assert!(!session.handle_line("EXIT").unwrap());
        assert!(!session.handle_line("Exit").unwrap());
        assert_eq!(session.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_line_is_sent_whole() {
        let session = test_session();
        let long_line = "word ".repeat(2000);

        // No chunking in interactive mode, however long the line is.
        assert!(session.handle_line(long_line.trim()).unwrap());
        assert_eq!(session.backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_each_line_is_one_call() {
        let session = test_session();
        assert!(session.handle_line("first").unwrap());
        assert!(session.handle_line("second").unwrap());
        assert_eq!(session.backend.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_bad_temperature_rejected() {
        let result = InteractiveSession::new(
            CountingBackend::new(),
            "m".to_string(),
            -1.0,
            ColorPalette::default(),
        );
        assert!(result.is_err());
    }
}
