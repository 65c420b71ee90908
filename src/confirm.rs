//! ConfirmationGate - interactive approval for side effects
//!
//! Guards every tool action that touches a path outside the working
//! directory and every externally visible side effect (shell execution,
//! changing directory). The gate is the only isolation boundary: it does
//! not restrict what an approved action does.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Source of yes/no answers for the gate
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Present `message` and wait for an answer; anything but "yes" is `false`
    async fn ask(&self, message: &str) -> bool;
}

/// Interactive yes/no gate, bypassed when auto-approve is set
#[derive(Clone)]
pub struct ConfirmationGate {
    auto_approve: bool,
    prompter: Arc<dyn Prompter>,
    // One open prompt at a time
    prompt_lock: Arc<Mutex<()>>,
}

impl ConfirmationGate {
    /// Gate that prompts on the controlling terminal unless `auto_approve` is set
    pub fn new(auto_approve: bool) -> Self {
        Self::with_prompter(auto_approve, Arc::new(TerminalPrompter))
    }

    /// Gate that approves everything without prompting
    pub fn auto_approve() -> Self {
        Self::new(true)
    }

    /// Gate backed by a custom prompter
    pub fn with_prompter(auto_approve: bool, prompter: Arc<dyn Prompter>) -> Self {
        debug!(%auto_approve, "ConfirmationGate::with_prompter: called");
        Self {
            auto_approve,
            prompter,
            prompt_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Whether prompting is bypassed
    pub fn is_auto_approve(&self) -> bool {
        self.auto_approve
    }

    /// Ask for approval of the described action
    pub async fn confirm(&self, description: &str) -> bool {
        if self.auto_approve {
            debug!(%description, "ConfirmationGate::confirm: auto-approved");
            return true;
        }

        let _guard = self.prompt_lock.lock().await;
        let approved = self.prompter.ask(description).await;
        debug!(%description, %approved, "ConfirmationGate::confirm: answered");
        approved
    }
}

impl std::fmt::Debug for ConfirmationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationGate")
            .field("auto_approve", &self.auto_approve)
            .finish()
    }
}

/// Prompts on the terminal and reads a single key
///
/// Falls back to reading a whole line when stdin is not a terminal.
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn ask(&self, message: &str) -> bool {
        let message = message.to_string();
        match tokio::task::spawn_blocking(move || prompt_blocking(&message)).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(%e, "TerminalPrompter::ask: prompt task failed, treating as denial");
                false
            }
        }
    }
}

fn prompt_blocking(message: &str) -> bool {
    let mut stdout = io::stdout();
    print!("{} (y/n): ", message.yellow());
    if stdout.flush().is_err() {
        return false;
    }

    let answer = match terminal::enable_raw_mode() {
        Ok(()) => {
            let key = read_single_key();
            if let Err(e) = terminal::disable_raw_mode() {
                warn!(%e, "prompt_blocking: failed to leave raw mode");
            }
            key
        }
        Err(e) => {
            debug!(%e, "prompt_blocking: no raw mode, reading a line");
            read_line_answer()
        }
    };

    // Clear the prompt line
    print!("\r\x1b[2K");
    let _ = stdout.flush();
    answer
}

fn read_single_key() -> bool {
    loop {
        match event::read() {
            Ok(Event::Key(KeyEvent {
                code, modifiers, kind, ..
            })) if kind == KeyEventKind::Press => {
                if modifiers.contains(KeyModifiers::CONTROL) {
                    return false;
                }
                return is_affirmative_key(code);
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(%e, "read_single_key: terminal read failed");
                return false;
            }
        }
    }
}

fn read_line_answer() -> bool {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => is_affirmative(&line),
    }
}

fn is_affirmative_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('y') | KeyCode::Char('Y'))
}

/// Whether a typed answer counts as approval
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Prompter with canned answers that records every question
    #[derive(Default)]
    pub struct ScriptedPrompter {
        answers: std::sync::Mutex<VecDeque<bool>>,
        pub asked: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: impl IntoIterator<Item = bool>) -> Arc<Self> {
            Arc::new(Self {
                answers: std::sync::Mutex::new(answers.into_iter().collect()),
                asked: std::sync::Mutex::new(Vec::new()),
            })
        }

        pub fn questions(&self) -> Vec<String> {
            self.asked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Prompter for ScriptedPrompter {
        async fn ask(&self, message: &str) -> bool {
            self.asked.lock().unwrap().push(message.to_string());
            self.answers.lock().unwrap().pop_front().unwrap_or(false)
        }
    }
}
