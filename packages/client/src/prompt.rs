//! Line input backed by rustyline.
//!
//! rustyline blocks, so lines are read on a dedicated thread and handed to
//! the async side over a channel. The thread is not joined: a pending
//! `readline` must not keep the process alive after the client quits.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::error::ClientError;

const QUIT_COMMAND: &str = ":q";

/// Whether `line` asks the client to quit
pub fn is_quit(line: &str) -> bool {
    line.trim() == QUIT_COMMAND
}

/// Ask for a single line, e.g. the client name.
pub async fn read_line(prompt: &'static str) -> Result<String, ClientError> {
    let line = tokio::task::spawn_blocking(move || {
        let mut editor = DefaultEditor::new()?;
        editor.readline(prompt)
    })
    .await??;
    Ok(line.trim().to_string())
}

/// Lines typed by the user, until end of input or Ctrl+C
pub struct LineReader {
    lines: mpsc::Receiver<String>,
}

impl LineReader {
    pub fn spawn(prompt: &str) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let prompt = prompt.to_string();
        std::thread::spawn(move || read_lines(&prompt, tx));
        Self { lines: rx }
    }

    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }
}

fn read_lines(prompt: &str, lines: mpsc::Sender<String>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            tracing::error!("Failed to start line editor: {}", e);
            return;
        }
    };

    loop {
        match editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty()
                    && let Err(e) = editor.add_history_entry(line.as_str())
                {
                    tracing::debug!("Failed to record history: {}", e);
                }
                if lines.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                tracing::error!("Failed to read line: {}", e);
                break;
            }
        }
    }
}
