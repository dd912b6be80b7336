//! Path-tagged validation messages collected during decode and encode.
//!
//! A [`Transaction`] is the single sink for everything that is wrong with an
//! archive but not wrong enough to stop processing. Warnings leave the
//! transaction successful; errors flip it to [`TransactionState::Failure`].
//! Either way the codec keeps going so one pass surfaces every problem.

use std::fmt;

use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One report entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Hierarchical location, e.g. `MDL0 course/materials/road`.
    pub path: String,
    pub severity: Severity,
    pub text: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.path, self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Success,
    Failure,
}

/// Aggregate report for one decode or encode call.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub state: TransactionState,
    messages: Vec<Message>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: &str, severity: Severity, text: impl Into<String>) {
        let text = text.into();
        match severity {
            Severity::Warning => warn!(path, "{text}"),
            Severity::Error => {
                error!(path, "{text}");
                self.state = TransactionState::Failure;
            }
        }
        self.messages.push(Message { path: path.to_string(), severity, text });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.severity == Severity::Error)
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        self.state == TransactionState::Failure
    }

    /// True when nothing at all was reported.
    pub fn is_clean(&self) -> bool {
        self.messages.is_empty()
    }

    /// Fold another transaction's messages into this one.
    pub fn merge(&mut self, other: Transaction) {
        if other.is_failure() {
            self.state = TransactionState::Failure;
        }
        self.messages.extend(other.messages);
    }
}

/// A location inside a transaction. Sub-objects get child contexts via
/// [`IoContext::sublet`].
pub struct IoContext<'t> {
    path: String,
    transaction: &'t mut Transaction,
}

impl<'t> IoContext<'t> {
    pub fn new(path: impl Into<String>, transaction: &'t mut Transaction) -> Self {
        Self { path: path.into(), transaction }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Child context for a named sub-object.
    pub fn sublet(&mut self, name: &str) -> IoContext<'_> {
        IoContext {
            path: format!("{}/{}", self.path, name),
            transaction: &mut *self.transaction,
        }
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.transaction.push(&self.path, Severity::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.transaction.push(&self.path, Severity::Error, text);
    }

    /// Warn with `text` unless `ok` holds.
    pub fn request(&mut self, ok: bool, text: impl Into<String>) {
        if !ok {
            self.warn(text);
        }
    }

    pub fn transaction(&self) -> &Transaction {
        self.transaction
    }
}
