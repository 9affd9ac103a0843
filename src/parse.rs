#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::construct::BoxedParser;
use crate::error::{ErrorKind, Failure, ParseError};
use crate::message::Message;
use crate::model::{BoxFuture, Mode, Priority};
use crate::modifier::{Map, Multiple, Optional, WithDefault};
use crate::suggest::{self, Suggestion};
use crate::usage::{DocFragments, DocState, UsageTerm};

/// The engine threads into each [`Parser::parse`] call and rebuilds on every step.
///
/// A context is an immutable value: parsers never mutate one in place, they
/// consume it and hand back a replacement.  The `state` field belongs to the
/// parser under execution; combinators nest their children's states inside
/// their own and re-wrap on the way out.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseContext<S> {
    buffer: Vec<String>,
    state: S,
    options_terminated: bool,
    // Priority of the innermost parser that claimed this step's token.
    claimant: Option<Priority>,
}

impl<S> ParseContext<S> {
    /// Fresh context over `buffer`, options not yet terminated.
    pub fn new(buffer: Vec<String>, state: S) -> Self {
        Self {
            buffer,
            state,
            options_terminated: false,
            claimant: None,
        }
    }

    /// The remaining unconsumed tokens, front first.
    pub fn buffer(&self) -> &[String] {
        &self.buffer
    }

    /// The front token, if any remain.
    pub fn head(&self) -> Option<&str> {
        self.buffer.first().map(String::as_str)
    }

    /// The accumulator owned by the executing parser.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Whether a bare `--` has switched off option recognition.
    pub fn options_terminated(&self) -> bool {
        self.options_terminated
    }

    /// Replace the state, rewrapping the same buffer.
    pub fn map_state<T>(self, wrap: impl FnOnce(S) -> T) -> ParseContext<T> {
        ParseContext {
            buffer: self.buffer,
            state: wrap(self.state),
            options_terminated: self.options_terminated,
            claimant: self.claimant,
        }
    }

    /// Sibling context carrying `state`, cloning the buffer.
    ///
    /// Combinators use this to offer the current buffer to a child without
    /// giving up their own context.
    pub fn with_state<T>(&self, state: T) -> ParseContext<T> {
        ParseContext {
            buffer: self.buffer.clone(),
            state,
            options_terminated: self.options_terminated,
            claimant: None,
        }
    }

    /// Surrender the state.
    pub fn into_state(self) -> S {
        self.state
    }

    /// Drop `count` tokens from the front.
    ///
    /// ### Panics
    /// When `count` exceeds the remaining buffer.
    pub fn advance(mut self, count: usize) -> Self {
        self.buffer.drain(..count);
        self
    }

    /// Replace the front token, leaving the rest alone.
    ///
    /// Short-flag bundles shrink through here: consuming `-v` out of `-vqf`
    /// rewrites the head to `-qf`.
    ///
    /// ### Panics
    /// When the buffer is empty.
    pub fn rewrite_head(mut self, token: String) -> Self {
        self.buffer[0] = token;
        self
    }

    /// Consume the front token as the `--` terminator and switch off option
    /// recognition for the rest of the buffer.
    ///
    /// The terminator belongs to no parser, so any claim is discarded.
    pub fn accept_terminator(mut self) -> Self {
        self.buffer.drain(..1);
        self.options_terminated = true;
        self.claimant = None;
        self
    }

    /// Tag the step with the priority of the parser that claimed its token.
    pub(crate) fn claimed_by(mut self, priority: Priority) -> Self {
        self.claimant = Some(priority);
        self
    }

    pub(crate) fn claimant(&self) -> Option<Priority> {
        self.claimant
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, S, bool) {
        (self.buffer, self.state, self.options_terminated)
    }

    pub(crate) fn from_parts(buffer: Vec<String>, state: S, options_terminated: bool) -> Self {
        Self {
            buffer,
            state,
            options_terminated,
            claimant: None,
        }
    }
}

/// Result of one [`Parser::parse`] step.
pub type Outcome<S> = Result<ParseContext<S>, Failure>;

/// A resumable, backtrackable argument parser.
///
/// A parser consumes a prefix of the context buffer one step at a time,
/// accumulating into its [`Parser::State`]; once the driver runs out of
/// tokens, [`Parser::complete`] turns the accumulated state into the final
/// [`Parser::Value`].
///
/// Failure is cheap and routine: combinators offer the same buffer to several
/// children and expect the wrong ones to decline with a `consumed` count of
/// zero.  A failure with nonzero `consumed` means the parser recognized the
/// tokens but found them malformed, which alternation treats as terminal for
/// that candidate.
///
/// Implementations whose value conversion suspends must override
/// [`Parser::mode`] and the `*_async` twins; everything else stays shared.
pub trait Parser {
    /// Accumulator threaded between successive `parse` steps.
    type State: Clone;
    /// Final value produced by `complete`.
    type Value;

    /// Static tie-break weight when several parsers could consume the same
    /// token.
    fn priority(&self) -> Priority;

    /// Whether any step of this parser may suspend.
    fn mode(&self) -> Mode {
        Mode::Sync
    }

    /// Static shape description, consumed by usage rendering and the fuzzy
    /// candidate pool.
    fn usage(&self) -> Vec<UsageTerm>;

    /// The accumulator before any tokens are consumed.
    fn initial_state(&self) -> Self::State;

    /// Attempt to consume a prefix of the buffer.
    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State>;

    /// Finalize the accumulated state into a value.
    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure>;

    /// Completion candidates for `prefix` at the position `context` stopped
    /// at.  Implementations must restrict themselves to what is valid right
    /// there (ex: only value candidates while an option awaits its value).
    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        let _ = (context, prefix);
        Vec::new()
    }

    /// Documentation fragments for this parser; `default` is a rendering of
    /// the value substituted when nothing is parsed, injected by wrappers
    /// like [`WithDefault`].
    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments;

    /// Non-blocking twin of [`Parser::parse`].
    fn parse_async<'f>(
        &'f self,
        context: ParseContext<Self::State>,
    ) -> BoxFuture<'f, Outcome<Self::State>>
    where
        Self::State: 'f,
    {
        Box::pin(std::future::ready(self.parse(context)))
    }

    /// Non-blocking twin of [`Parser::suggest`].
    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        Box::pin(std::future::ready(self.suggest(context, prefix)))
    }

    /// Transform the completed value with a pure function.
    fn map<F, U>(self, transform: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Value) -> U,
    {
        Map::new(self, transform)
    }

    /// Substitute `None` when this parser never consumed anything.
    fn optional(self) -> Optional<Self>
    where
        Self: Sized,
    {
        Optional::new(self)
    }

    /// Substitute `value` when this parser never consumed anything.
    fn with_default(self, value: Self::Value) -> WithDefault<Self>
    where
        Self: Sized,
        Self::Value: Clone + 'static,
    {
        WithDefault::new(self, Box::new(move || value.clone()))
    }

    /// Substitute `factory()` when this parser never consumed anything.
    fn with_default_from(self, factory: impl Fn() -> Self::Value + 'static) -> WithDefault<Self>
    where
        Self: Sized,
    {
        WithDefault::new(self, Box::new(factory))
    }

    /// Accumulate a sequence by parsing repeatedly.
    fn multiple(self) -> Multiple<Self>
    where
        Self: Sized,
    {
        Multiple::new(self)
    }

    /// Erase the concrete type, keeping only the value type.
    fn boxed(self) -> BoxedParser<Self::Value>
    where
        Self: Sized + 'static,
        Self::State: 'static,
        Self::Value: 'static,
    {
        BoxedParser::new(self)
    }
}

fn shape<S>(context: &ParseContext<S>) -> (usize, Option<String>) {
    (
        context.buffer().len(),
        context.head().map(str::to_string),
    )
}

fn stalled(head: Option<String>) -> Message {
    let mut message = Message::new().text("unexpected token");
    if let Some(token) = head {
        message = message.value(token);
    }
    message
}

/// Run `parser` over `arguments` to a final value.
///
/// Rejects a tree whose [`Parser::mode`] is [`Mode::Async`]; drive those
/// through [`parse_async`] instead.
///
/// ### Example
/// ```
/// use argot::{flag, from_str, object, option, parse, Parser};
///
/// let parser = object((
///     flag(["--verbose", "-v"]).with_default(false),
///     option(["--port", "-p"], from_str::<u16>()),
/// ));
///
/// let (verbose, port) = parse(&parser, ["-v", "--port=8080"]).unwrap();
/// assert!(verbose);
/// assert_eq!(port, 8080);
/// ```
pub fn parse<P, I, T>(parser: &P, arguments: I) -> Result<P::Value, ParseError>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    if parser.mode() == Mode::Async {
        return Err(ParseError {
            message: Message::from("parser requires asynchronous execution"),
            offset: 0,
        });
    }

    let buffer: Vec<String> = arguments.into_iter().map(Into::into).collect();
    let total = buffer.len();
    let mut context = ParseContext::new(buffer, parser.initial_state());

    while !context.buffer().is_empty() {
        let before = shape(&context);
        #[cfg(feature = "tracing_debug")]
        {
            debug!("step: buffer={:?}", context.buffer());
        }

        match parser.parse(context) {
            Ok(next) => {
                if shape(&next) == before {
                    return Err(ParseError {
                        message: stalled(before.1),
                        offset: total - before.0,
                    });
                }
                context = next;
            }
            Err(failure) => {
                return Err(ParseError {
                    offset: total - before.0 + failure.consumed.saturating_sub(1),
                    message: failure.message,
                });
            }
        }
    }

    parser
        .complete(context.into_state())
        .map_err(|failure| ParseError {
            message: failure.message,
            offset: total,
        })
}

/// [`parse`] for trees containing async value parsers.
///
/// Runs sync trees unchanged; awaits each suspension point in the same
/// left-to-right order the sync driver would visit it.
pub async fn parse_async<P, I, T>(parser: &P, arguments: I) -> Result<P::Value, ParseError>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let buffer: Vec<String> = arguments.into_iter().map(Into::into).collect();
    let total = buffer.len();
    let mut context = ParseContext::new(buffer, parser.initial_state());

    while !context.buffer().is_empty() {
        let before = shape(&context);

        match parser.parse_async(context).await {
            Ok(next) => {
                if shape(&next) == before {
                    return Err(ParseError {
                        message: stalled(before.1),
                        offset: total - before.0,
                    });
                }
                context = next;
            }
            Err(failure) => {
                return Err(ParseError {
                    offset: total - before.0 + failure.consumed.saturating_sub(1),
                    message: failure.message,
                });
            }
        }
    }

    parser
        .complete(context.into_state())
        .map_err(|failure| ParseError {
            message: failure.message,
            offset: total,
        })
}

/// Completion candidates for the last token of `arguments`.
///
/// The final element is the in-progress prefix under the cursor, possibly
/// empty; everything before it is replayed through the same consumption
/// algorithm as [`parse`], and whichever parsers are active at that position
/// contribute candidates.
///
/// ### Example
/// ```
/// use argot::{choices, object, option, suggest};
///
/// let parser = object((option(["--remote"], choices(["origin", "upstream"])),));
///
/// let proposals = suggest(&parser, ["--remote", "up"]);
/// assert_eq!(proposals.len(), 1);
/// assert_eq!(proposals[0].text(), Some("upstream"));
/// ```
pub fn suggest<P, I, T>(parser: &P, arguments: I) -> Vec<Suggestion>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    if parser.mode() == Mode::Async {
        return Vec::new();
    }

    let mut buffer: Vec<String> = arguments.into_iter().map(Into::into).collect();
    let prefix = buffer.pop().unwrap_or_default();
    let mut context = ParseContext::new(buffer, parser.initial_state());

    while !context.buffer().is_empty() {
        let before = shape(&context);
        match parser.parse(context.clone()) {
            Ok(next) => {
                if shape(&next) == before {
                    break;
                }
                context = next;
            }
            Err(_) => break,
        }
    }

    suggest::dedup(parser.suggest(&context, &prefix))
}

/// [`suggest`] for trees containing async value parsers.
pub async fn suggest_async<P, I, T>(parser: &P, arguments: I) -> Vec<Suggestion>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut buffer: Vec<String> = arguments.into_iter().map(Into::into).collect();
    let prefix = buffer.pop().unwrap_or_default();
    let mut context = ParseContext::new(buffer, parser.initial_state());

    while !context.buffer().is_empty() {
        let before = shape(&context);
        match parser.parse_async(context.clone()).await {
            Ok(next) => {
                if shape(&next) == before {
                    break;
                }
                context = next;
            }
            Err(_) => break,
        }
    }

    suggest::dedup(parser.suggest_async(&context, &prefix).await)
}

/// How far a parser got when driven until it could no longer make progress.
pub(crate) struct Exhaustion<S> {
    pub(crate) context: ParseContext<S>,
    pub(crate) consumed: usize,
    pub(crate) failure: Option<Failure>,
    pub(crate) hard: bool,
}

impl<S> Exhaustion<S> {
    /// Tokens consumed outright plus tokens inspected by the stopping
    /// failure.  Alternation ranks branches by this.
    pub(crate) fn reach(&self) -> usize {
        self.consumed
            + self
                .failure
                .as_ref()
                .map(|failure| failure.consumed)
                .unwrap_or(0)
    }
}

/// Drive `parser` until it declines, fails hard, or empties the buffer.
///
/// A stopping failure with zero `consumed` leaves the branch quiescent
/// (`hard == false`): it parsed as far as it could and stopped cleanly.
pub(crate) fn run_to_exhaustion<P: Parser>(
    parser: &P,
    mut context: ParseContext<P::State>,
) -> Exhaustion<P::State> {
    let start = context.buffer().len();
    let mut failure = None;
    let mut hard = false;

    while !context.buffer().is_empty() {
        let before = shape(&context);
        match parser.parse(context.clone()) {
            Ok(next) => {
                if shape(&next) == before {
                    break;
                }
                context = next;
            }
            Err(stop) => {
                hard = stop.consumed > 0;
                failure = Some(stop);
                break;
            }
        }
    }

    Exhaustion {
        consumed: start - context.buffer().len(),
        context,
        failure,
        hard,
    }
}

/// [`run_to_exhaustion`] through the async twins.
pub(crate) async fn run_to_exhaustion_async<P: Parser>(
    parser: &P,
    mut context: ParseContext<P::State>,
) -> Exhaustion<P::State> {
    let start = context.buffer().len();
    let mut failure = None;
    let mut hard = false;

    while !context.buffer().is_empty() {
        let before = shape(&context);
        match parser.parse_async(context.clone()).await {
            Ok(next) => {
                if shape(&next) == before {
                    break;
                }
                context = next;
            }
            Err(stop) => {
                hard = stop.consumed > 0;
                failure = Some(stop);
                break;
            }
        }
    }

    Exhaustion {
        consumed: start - context.buffer().len(),
        context,
        failure,
        hard,
    }
}

pub(crate) fn end_of_input(expected: Message) -> Failure {
    Failure {
        kind: ErrorKind::EndOfInput,
        message: expected,
        consumed: 0,
    }
}


#[cfg(test)]
mod tests {
    use super::test_parsers::{Grab, Pairs};
    use super::*;
    use crate::test::assert_contains;
    use crate::usage::DocEntry;

    /// Returns its context untouched; the driver must refuse to spin.
    struct Stall;

    impl Parser for Stall {
        type State = ();
        type Value = ();

        fn priority(&self) -> Priority {
            Priority::CONSTANT
        }

        fn usage(&self) -> Vec<UsageTerm> {
            Vec::new()
        }

        fn initial_state(&self) -> Self::State {}

        fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
            Ok(context)
        }

        fn complete(&self, _state: Self::State) -> Result<Self::Value, Failure> {
            Ok(())
        }

        fn doc_fragments(
            &self,
            _availability: DocState<'_, Self::State>,
            _default: Option<Message>,
        ) -> DocFragments {
            DocFragments::default()
        }
    }

    /// Consumes nothing and cannot complete.
    struct Starved;

    impl Parser for Starved {
        type State = ();
        type Value = ();

        fn priority(&self) -> Priority {
            Priority::CONSTANT
        }

        fn usage(&self) -> Vec<UsageTerm> {
            Vec::new()
        }

        fn initial_state(&self) -> Self::State {}

        fn parse(&self, _context: ParseContext<Self::State>) -> Outcome<Self::State> {
            Err(Failure {
                kind: ErrorKind::UnmatchedToken,
                message: Message::from("unexpected token"),
                consumed: 0,
            })
        }

        fn complete(&self, _state: Self::State) -> Result<Self::Value, Failure> {
            Err(Failure {
                kind: ErrorKind::MissingRequired,
                message: Message::from("missing required input"),
                consumed: 0,
            })
        }

        fn doc_fragments(
            &self,
            _availability: DocState<'_, Self::State>,
            _default: Option<Message>,
        ) -> DocFragments {
            DocFragments::default()
        }
    }

    struct AsyncMarker;

    impl Parser for AsyncMarker {
        type State = ();
        type Value = ();

        fn priority(&self) -> Priority {
            Priority::CONSTANT
        }

        fn mode(&self) -> Mode {
            Mode::Async
        }

        fn usage(&self) -> Vec<UsageTerm> {
            Vec::new()
        }

        fn initial_state(&self) -> Self::State {}

        fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
            Ok(context.advance(1))
        }

        fn complete(&self, _state: Self::State) -> Result<Self::Value, Failure> {
            Ok(())
        }

        fn doc_fragments(
            &self,
            _availability: DocState<'_, Self::State>,
            _default: Option<Message>,
        ) -> DocFragments {
            DocFragments::default()
        }
    }

    #[test]
    fn context_rebuild() {
        // Setup
        let context = ParseContext::new(vec!["a".to_string(), "b".to_string()], 0u8);

        // Execute
        let context = context.advance(1).map_state(|count| count + 1);

        // Verify
        assert_eq!(context.buffer(), &["b".to_string()]);
        assert_eq!(context.state(), &1);
        assert!(!context.options_terminated());
    }

    #[test]
    fn context_terminator() {
        // Setup
        let context = ParseContext::new(vec!["--".to_string(), "x".to_string()], ());

        // Execute
        let context = context.accept_terminator();

        // Verify
        assert_eq!(context.buffer(), &["x".to_string()]);
        assert!(context.options_terminated());
    }

    #[test]
    fn context_rewrite_head() {
        // Setup
        let context = ParseContext::new(vec!["-vqf".to_string()], ());

        // Execute
        let context = context.rewrite_head("-qf".to_string());

        // Verify
        assert_eq!(context.buffer(), &["-qf".to_string()]);
    }

    #[test]
    fn parse_consumes_everything() {
        // Setup
        let parser = Grab;

        // Execute
        let result = parse(&parser, ["a", "b", "c"]);

        // Verify
        assert_eq!(
            result.unwrap(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn parse_empty_buffer_completes() {
        // Setup
        let parser = Grab;

        // Execute
        let result = parse(&parser, Vec::<String>::new());

        // Verify
        assert_eq!(result.unwrap(), Vec::<String>::new());
    }

    #[test]
    fn parse_failure_offset() {
        // Setup
        let parser = Pairs;

        // Execute
        let result = parse(&parser, ["k1", "v1", "k2"]);

        // Verify
        let error = result.unwrap_err();
        assert_eq!(error.offset, 2);
        assert_eq!(error.to_string(), "Parse error: no value for `k2`");
    }

    #[test]
    fn parse_stall_guard() {
        // Setup
        let parser = Stall;

        // Execute
        let result = parse(&parser, ["x"]);

        // Verify
        let error = result.unwrap_err();
        assert_eq!(error.offset, 0);
        assert_contains!(error.to_string(), "unexpected token");
    }

    #[test]
    fn parse_completion_failure_offset() {
        // Setup
        let parser = Starved;

        // Execute
        let result = parse(&parser, Vec::<String>::new());

        // Verify
        let error = result.unwrap_err();
        assert_eq!(error.offset, 0);
        assert_contains!(error.to_string(), "missing required input");
    }

    #[test]
    fn parse_rejects_async_tree() {
        // Setup
        let parser = AsyncMarker;

        // Execute
        let result = parse(&parser, ["x"]);

        // Verify
        let error = result.unwrap_err();
        assert_contains!(error.to_string(), "requires asynchronous execution");
    }

    #[tokio::test]
    async fn parse_async_runs_async_tree() {
        // Setup
        let parser = AsyncMarker;

        // Execute
        let result = parse_async(&parser, ["x"]).await;

        // Verify
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn parse_async_runs_sync_tree() {
        // Setup
        let parser = Grab;

        // Execute
        let result = parse_async(&parser, ["a", "b"]).await;

        // Verify
        assert_eq!(result.unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn suggest_replays_all_but_last() {
        // Setup
        let parser = Grab;

        // Execute
        let suggestions = suggest(&parser, ["a", "b", "pre"]);

        // Verify
        assert_eq!(suggestions, vec![Suggestion::literal("grabbed:2")]);
    }

    #[test]
    fn suggest_empty_arguments() {
        // Setup
        let parser = Grab;

        // Execute
        let suggestions = suggest(&parser, Vec::<String>::new());

        // Verify
        assert_eq!(suggestions, vec![Suggestion::literal("grabbed:0")]);
    }

    #[test]
    fn suggest_stops_at_failure() {
        // Setup
        let parser = Pairs;

        // Execute: the replayed "k2" strands, leaving the pair parser mid-entry.
        let suggestions = suggest(&parser, ["k1", "v1", "k2", ""]);

        // Verify: default suggest yields nothing, but no panic and no spin.
        assert!(suggestions.is_empty());
    }

    #[test]
    fn exhaustion_quiescent() {
        // Setup
        let parser = Grab;
        let context = ParseContext::new(
            vec!["a".to_string(), "b".to_string()],
            parser.initial_state(),
        );

        // Execute
        let exhaustion = run_to_exhaustion(&parser, context);

        // Verify
        assert_eq!(exhaustion.consumed, 2);
        assert_eq!(exhaustion.reach(), 2);
        assert!(!exhaustion.hard);
        assert!(exhaustion.failure.is_none());
    }

    #[test]
    fn exhaustion_hard_failure() {
        // Setup
        let parser = Pairs;
        let context = ParseContext::new(
            vec!["k1".to_string(), "v1".to_string(), "k2".to_string()],
            parser.initial_state(),
        );

        // Execute
        let exhaustion = run_to_exhaustion(&parser, context);

        // Verify
        assert_eq!(exhaustion.consumed, 2);
        assert_eq!(exhaustion.reach(), 3);
        assert!(exhaustion.hard);
    }

    #[test]
    fn grab_documents_default() {
        // Setup
        let parser = Grab;

        // Execute
        let fragments = parser.doc_fragments(
            DocState::Unavailable,
            Some(Message::from("none")),
        );

        // Verify
        let entries: Vec<DocEntry> = fragments.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].default.as_ref().map(|d| d.to_string()), Some("none".to_string()));
    }
}
