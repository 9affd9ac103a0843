use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::message::Message;

/// Classification of a parse or completion failure.
///
/// Kinds double as the keys of the error-customization map: install an
/// [`ErrorHook`] for a kind to replace the stock message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An option or flag appeared more than once.
    DuplicateOption,
    /// A required parser never consumed anything.
    MissingRequired,
    /// A value parser rejected a token.
    InvalidValue,
    /// No parser recognized the token.
    UnmatchedToken,
    /// An option-shaped token appeared after the `--` terminator.
    OptionsTerminated,
    /// A repeated parser's count fell outside its bounds.
    ArityViolation,
    /// A token was expected but the buffer was empty.
    EndOfInput,
    /// A discriminator value matched no declared branch.
    InvalidDiscriminator,
}

/// A failed parse or completion step.
///
/// `consumed` counts the tokens the parser inspected before failing; it is
/// zero when the parser simply did not recognize the buffer head.  Record and
/// alternation combinators rank competing failures by it, so the most
/// specific one surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Failure classification.
    pub kind: ErrorKind,
    /// Structured description.
    pub message: Message,
    /// Tokens inspected before failing.
    pub consumed: usize,
}

/// Context handed to a custom error hook.
pub struct ErrorContext<'c> {
    /// The offending token, when one exists.
    pub token: Option<&'c str>,
    /// Names the failing parser declares.
    pub expected: &'c [String],
    /// Fuzzy matched "did you mean" candidates, nearest first.
    pub suggestions: &'c [String],
}

/// A caller supplied replacement message for one failure kind.
pub enum ErrorHook {
    /// Use the message as-is.
    Fixed(Message),
    /// Compute the message from the failure context.
    Compute(Box<dyn Fn(&ErrorContext<'_>) -> Message>),
}

impl ErrorHook {
    /// Hook computing the message from the failure context.
    pub fn from_fn(hook: impl Fn(&ErrorContext<'_>) -> Message + 'static) -> Self {
        ErrorHook::Compute(Box::new(hook))
    }
}

impl fmt::Debug for ErrorHook {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorHook::Fixed(message) => write!(f, "Fixed({message:?})"),
            ErrorHook::Compute(_) => write!(f, "Compute(..)"),
        }
    }
}

impl From<Message> for ErrorHook {
    fn from(message: Message) -> Self {
        ErrorHook::Fixed(message)
    }
}

impl From<&str> for ErrorHook {
    fn from(text: &str) -> Self {
        ErrorHook::Fixed(Message::from(text))
    }
}

/// Per-parser error message overrides, keyed by failure kind.
#[derive(Debug, Default)]
pub struct ErrorOverrides {
    hooks: HashMap<ErrorKind, ErrorHook>,
}

impl ErrorOverrides {
    pub(crate) fn insert(&mut self, kind: ErrorKind, hook: ErrorHook) {
        self.hooks.insert(kind, hook);
    }

    /// Build the message for `kind`, preferring an installed hook.
    pub(crate) fn build(
        &self,
        kind: ErrorKind,
        context: &ErrorContext<'_>,
        stock: impl FnOnce() -> Message,
    ) -> Message {
        match self.hooks.get(&kind) {
            Some(ErrorHook::Fixed(message)) => message.clone(),
            Some(ErrorHook::Compute(hook)) => hook(context),
            None => stock(),
        }
    }
}

/// Terminal error returned from the invocation boundary.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error: {message}")]
pub struct ParseError {
    /// Structured description of what failed.
    pub message: Message,
    /// Offset of the failing token within the original buffer.
    pub offset: usize,
}
