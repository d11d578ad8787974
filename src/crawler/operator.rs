//! Operator acknowledgment of fatal page failures
//!
//! When a page exhausts its retries without stalling, the crawler stops and asks
//! an `OperatorPrompt` whether to move on to the next page or abort the unit.

use crate::address::ContentAddress;
use std::io::{BufRead, Write};

/// The operator's answer to a fatal page failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    /// Give up on this page and continue with the next one
    Continue,
    /// End the unit (and with it, the session)
    Abort,
}

/// What the operator is told about a failed page
#[derive(Debug, Clone, Copy)]
pub struct FatalPageNotice<'a> {
    pub unit: &'a ContentAddress,
    pub page: u32,
    pub total_pages: u32,
    pub attempts: u32,
}

/// Decides how a fatal page failure is handled
pub trait OperatorPrompt {
    fn acknowledge(&mut self, notice: &FatalPageNotice<'_>) -> Acknowledgment;
}

/// Non-interactive policy: every fatal page failure aborts the unit
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortOnFatal;

impl OperatorPrompt for AbortOnFatal {
    fn acknowledge(&mut self, _notice: &FatalPageNotice<'_>) -> Acknowledgment {
        Acknowledgment::Abort
    }
}

/// Interactive policy: pauses on the console until the operator answers
///
/// `c`/`continue` skips the page; anything else (including end of input) aborts.
pub struct ConsolePrompt<I, O> {
    input: I,
    output: O,
}

impl ConsolePrompt<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompt on stderr, answer on stdin
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<I: BufRead, O: Write> ConsolePrompt<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }
}

impl<I: BufRead, O: Write> OperatorPrompt for ConsolePrompt<I, O> {
    fn acknowledge(&mut self, notice: &FatalPageNotice<'_>) -> Acknowledgment {
        let written = write!(
            self.output,
            "Page {}/{} of {} failed after {} attempts. [c]ontinue with the next page or [a]bort? ",
            notice.page, notice.total_pages, notice.unit, notice.attempts
        )
        .and_then(|_| self.output.flush());
        if let Err(e) = written {
            tracing::warn!("Could not write operator prompt: {}", e);
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => Acknowledgment::Abort,
            Ok(_) => match answer.trim().to_lowercase().as_str() {
                "c" | "continue" => Acknowledgment::Continue,
                _ => Acknowledgment::Abort,
            },
        }
    }
}
