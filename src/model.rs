use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by the awaiting twins of parser operations.
///
/// The engine is runtime agnostic; nothing here spawns or blocks.
pub type BoxFuture<'f, T> = Pin<Box<dyn Future<Output = T> + 'f>>;

/// Execution capability of a parser: whether its token conversions may await.
///
/// Composing parsers joins their modes ([`Mode::join`]), so one awaited child
/// makes the whole composition `Async`.  The mode is declared data, never
/// observed behaviour, which keeps it computable without running any parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Conversions return immediately.
    Sync,
    /// Conversions may await external lookups.
    Async,
}

impl Mode {
    /// Combine with `other`; `Async` propagates.
    pub fn join(self, other: Mode) -> Mode {
        match (self, other) {
            (Mode::Sync, Mode::Sync) => Mode::Sync,
            _ => Mode::Async,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Ordering weight resolving which parser claims an ambiguous next token.
///
/// When several parsers could legally consume the buffer head, candidates are
/// tried in descending priority; equal priorities fall back to declaration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(i8);

impl Priority {
    /// Constants never claim tokens.
    pub const CONSTANT: Priority = Priority(0);
    /// Pass-through collectors only take what nothing else claims.
    pub const PASS_THROUGH: Priority = Priority(2);
    /// Positional arguments lose ties to options and commands.
    pub const ARGUMENT: Priority = Priority(5);
    /// Flags and valued options.
    pub const OPTION: Priority = Priority(10);
    /// Subcommands claim their name before anything else runs.
    pub const COMMAND: Priority = Priority(15);

    /// A custom weight for caller-defined parsers.
    pub const fn new(weight: i8) -> Priority {
        Priority(weight)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
