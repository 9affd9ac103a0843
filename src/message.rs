use std::fmt;

/// A single typed unit within a [`Message`].
///
/// Terms carry no formatting; a renderer decides how to quote, colour, or
/// wrap each kind.  [`Message`]'s `Display` implementation is the plain
/// fallback used by [`ParseError`](crate::ParseError).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Plain prose.
    Text(String),
    /// A single option name, rendered as declared (`--verbose`, `-v`, `/V`).
    OptionName(String),
    /// A set of option names.
    OptionNames(Vec<String>),
    /// A placeholder such as `FILE` or `PORT`.
    Metavar(String),
    /// A literal token or value.
    Value(String),
    /// A set of literal values.
    Values(Vec<String>),
    /// An environment variable name, used by value-binding adapters.
    EnvVar(String),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Text(text) => write!(f, "{text}"),
            Term::OptionName(name) | Term::Value(name) | Term::EnvVar(name) => {
                write!(f, "`{name}`")
            }
            Term::Metavar(metavar) => write!(f, "{metavar}"),
            Term::OptionNames(names) | Term::Values(names) => {
                for (index, name) in names.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "`{name}`")?;
                }
                Ok(())
            }
        }
    }
}

/// A structured, formatting free description: an ordered sequence of [`Term`]s.
///
/// Every error the engine propagates is a `Message`, never a raw string, so
/// presentation (colours, quoting, localization) stays outside the core.
///
/// ### Example
/// ```
/// use argot::Message;
///
/// let message = Message::new()
///     .text("cannot convert")
///     .value("5x")
///     .text("to u32");
/// assert_eq!(message.to_string(), "cannot convert `5x` to u32");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    terms: Vec<Term>,
}

impl Message {
    /// An empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append plain prose.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.terms.push(Term::Text(text.into()));
        self
    }

    /// Append a single option name.
    pub fn option_name(mut self, name: impl Into<String>) -> Self {
        self.terms.push(Term::OptionName(name.into()));
        self
    }

    /// Append a set of option names.
    pub fn option_names(mut self, names: Vec<String>) -> Self {
        self.terms.push(Term::OptionNames(names));
        self
    }

    /// Append a metavariable.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.terms.push(Term::Metavar(metavar.into()));
        self
    }

    /// Append a literal value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.terms.push(Term::Value(value.into()));
        self
    }

    /// Append a set of literal values.
    pub fn values(mut self, values: Vec<String>) -> Self {
        self.terms.push(Term::Values(values));
        self
    }

    /// Append an environment variable name.
    pub fn env_var(mut self, name: impl Into<String>) -> Self {
        self.terms.push(Term::EnvVar(name.into()));
        self
    }

    /// Append an already-built term.
    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    /// Append every term of `other`.
    pub fn extend(mut self, other: Message) -> Self {
        self.terms.extend(other.terms);
        self
    }

    /// The ordered terms, for external renderers.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Whether any terms exist.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::new().text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::new().text(text)
    }
}

impl From<Term> for Message {
    fn from(term: Term) -> Self {
        Message { terms: vec![term] }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, term) in self.terms.iter().enumerate() {
            if index > 0 && !glues_left(term) {
                write!(f, " ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

// Punctuation-leading text reads as a continuation of the previous term.
fn glues_left(term: &Term) -> bool {
    match term {
        Term::Text(text) => text.starts_with([',', '.', ';', ':', '?', ')', '!']),
        _ => false,
    }
}
