use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::message::Message;
use crate::model::{BoxFuture, Mode};
use crate::suggest::Suggestion;

/// Converts a single token into a typed value, and a value back into a token.
///
/// Option and argument parsers delegate the text-to-type step to a
/// `ValueParser`; everything above this trait deals in whole tokens only.
///
/// There is an implicit (non-compile time) requirement on implementations:
/// > [`ValueParser::parse`] must invert [`ValueParser::format`].
///
/// This requirement is what lets a recorded default value round-trip through
/// the help document, and lets completion replay a formatted value verbatim.
///
/// Implementations that can only convert asynchronously should override
/// [`ValueParser::parse_async`] (and [`ValueParser::mode`] to return
/// [`Mode::Async`]); the engine never invokes the blocking [`ValueParser::parse`]
/// on a tree whose mode is async.
pub trait ValueParser {
    /// The conversion target.
    type Value;

    /// Whether conversion may suspend.
    fn mode(&self) -> Mode {
        Mode::Sync
    }

    /// Placeholder naming the value in usage lines, when this parser has an
    /// opinion (ex: a closed choice set renders as `{a|b}`).
    fn metavar(&self) -> Option<String> {
        None
    }

    /// Convert one token.
    fn parse(&self, token: &str) -> Result<Self::Value, Message>;

    /// Render a value in the form [`ValueParser::parse`] accepts.
    fn format(&self, value: &Self::Value) -> String;

    /// Completion candidates for a partially typed value.
    fn suggest(&self, prefix: &str) -> Vec<Suggestion> {
        let _ = prefix;
        Vec::new()
    }

    /// The closed set of accepted spellings, when one exists.
    fn choices(&self) -> Option<Vec<String>> {
        None
    }

    /// Non-blocking twin of [`ValueParser::parse`].
    fn parse_async<'f>(&'f self, token: &'f str) -> BoxFuture<'f, Result<Self::Value, Message>>
    where
        Self::Value: 'f,
    {
        Box::pin(std::future::ready(self.parse(token)))
    }

    /// Non-blocking twin of [`ValueParser::suggest`].
    fn suggest_async<'f>(&'f self, prefix: &'f str) -> BoxFuture<'f, Vec<Suggestion>> {
        Box::pin(std::future::ready(self.suggest(prefix)))
    }
}

/// A [`ValueParser`] backed by the type's `FromStr` implementation.
///
/// There is an implicit (non-compile time) requirement for the type `T`:
/// > The implementation of `std::str::FromStr` must invert `std::fmt::Display`.
///
/// Most types naturally adhere; rust's `bool` is one:
/// ```
/// # use std::str::FromStr;
/// assert_eq!(bool::from_str("true").unwrap().to_string(), "true");
/// assert_eq!(bool::from_str("false").unwrap().to_string(), "false");
/// ```
pub struct FromStrValue<T> {
    phantom: PhantomData<T>,
}

/// Value parser converting via `T::from_str`.
///
/// ### Example
/// ```
/// use argot::{from_str, ValueParser};
///
/// let port = from_str::<u16>();
/// assert_eq!(port.parse("8080"), Ok(8080));
/// assert!(port.parse("eight").is_err());
/// assert_eq!(port.format(&8080), "8080");
/// ```
pub fn from_str<T: FromStr + Display>() -> FromStrValue<T> {
    FromStrValue {
        phantom: PhantomData,
    }
}

/// Value parser passing the token through untouched.
pub fn string() -> FromStrValue<String> {
    from_str::<String>()
}

impl<T: FromStr + Display> ValueParser for FromStrValue<T> {
    type Value = T;

    fn parse(&self, token: &str) -> Result<T, Message> {
        T::from_str(token).map_err(|_| {
            Message::new()
                .text("cannot convert")
                .value(token)
                .text(format!("to {}", std::any::type_name::<T>()))
        })
    }

    fn format(&self, value: &T) -> String {
        value.to_string()
    }
}

/// A [`ValueParser`] accepting a closed set of spellings.
///
/// The parsed value is the matched spelling itself; pair with
/// [`Parser::map`](crate::Parser::map) to reach a richer type.
pub struct ChoicesValue {
    spellings: Vec<String>,
}

/// Value parser accepting exactly the given spellings.
///
/// ### Example
/// ```
/// use argot::{choices, ValueParser};
///
/// let level = choices(["debug", "info", "warn"]);
/// assert_eq!(level.parse("info"), Ok("info".to_string()));
/// assert!(level.parse("verbose").is_err());
/// assert_eq!(level.metavar(), Some("{debug|info|warn}".to_string()));
/// ```
pub fn choices<I, S>(spellings: I) -> ChoicesValue
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ChoicesValue {
        spellings: spellings.into_iter().map(Into::into).collect(),
    }
}

impl ValueParser for ChoicesValue {
    type Value = String;

    fn metavar(&self) -> Option<String> {
        Some(format!("{{{}}}", self.spellings.join("|")))
    }

    fn parse(&self, token: &str) -> Result<String, Message> {
        if self.spellings.iter().any(|spelling| spelling == token) {
            Ok(token.to_string())
        } else {
            Err(Message::new()
                .text("expected one of")
                .values(self.spellings.clone())
                .text(", got")
                .value(token))
        }
    }

    fn format(&self, value: &String) -> String {
        value.clone()
    }

    fn suggest(&self, prefix: &str) -> Vec<Suggestion> {
        self.spellings
            .iter()
            .filter(|spelling| spelling.starts_with(prefix))
            .map(Suggestion::literal)
            .collect()
    }

    fn choices(&self) -> Option<Vec<String>> {
        Some(self.spellings.clone())
    }
}
