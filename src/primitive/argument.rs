use crate::error::{ErrorContext, ErrorHook, ErrorKind, ErrorOverrides, Failure};
use crate::message::Message;
use crate::model::{BoxFuture, Mode, Priority};
use crate::parse::{end_of_input, Outcome, ParseContext, Parser};
use crate::suggest::Suggestion;
use crate::token::{classify, is_dash_shaped, TokenShape};
use crate::usage::{DocEntry, DocFragments, DocState, UsageTerm};
use crate::value::ValueParser;

use super::{decline, decline_with};

/// A positional argument capturing one plain token.
///
/// Option-shaped tokens are declined until the `--` terminator flips the
/// buffer into plain text; slash tokens (`/path/to/file`, `/V`) are plain
/// unless some sibling declares them, so filesystem paths parse here
/// without ceremony.
pub struct Argument<V: ValueParser> {
    metavar: String,
    value: V,
    help: Option<Message>,
    overrides: ErrorOverrides,
}

/// What to do with the head token, decided before any value conversion.
enum Claim {
    Terminator,
    Text(String),
    Fail(Failure),
}

/// A positional argument displayed as `metavar`, converting through `value`.
///
/// ### Example
/// ```
/// use argot::{argument, from_str, parse};
///
/// let count = argument("COUNT", from_str::<u32>());
/// assert_eq!(parse(&count, ["7"]).unwrap(), 7);
/// ```
pub fn argument<V: ValueParser>(metavar: impl Into<String>, value: V) -> Argument<V> {
    Argument {
        metavar: metavar.into(),
        value,
        help: None,
        overrides: ErrorOverrides::default(),
    }
}

impl<V: ValueParser> Argument<V> {
    /// Describe this argument for help documents and completion annotations.
    pub fn help(mut self, text: impl Into<Message>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Replace the stock message for one failure kind.
    pub fn error(mut self, kind: ErrorKind, hook: impl Into<ErrorHook>) -> Self {
        self.overrides.insert(kind, hook.into());
        self
    }

    fn fail(
        &self,
        kind: ErrorKind,
        token: &str,
        consumed: usize,
        stock: impl FnOnce() -> Message,
    ) -> Failure {
        let expected = vec![self.metavar.clone()];
        let context = ErrorContext {
            token: Some(token),
            expected: &expected,
            suggestions: &[],
        };
        Failure {
            kind,
            message: self.overrides.build(kind, &context, stock),
            consumed,
        }
    }

    fn resolve(&self, context: &ParseContext<Option<V::Value>>) -> Claim {
        let head = match context.head() {
            Some(head) => head.to_string(),
            None => {
                return Claim::Fail(end_of_input(
                    Message::new().text("expected").metavar(self.metavar.as_str()),
                ))
            }
        };

        // A filled scalar slot steps aside; the next claimant may be a
        // sibling, or nobody, in which case the composite reports the token.
        if context.state().is_some() {
            return Claim::Fail(decline(&head));
        }

        if !context.options_terminated() {
            if let TokenShape::Terminator = classify(&head) {
                return Claim::Terminator;
            }
            if is_dash_shaped(&head) {
                return Claim::Fail(decline(&head));
            }
        }

        Claim::Text(head)
    }

    fn invalid_value(&self, text: &str, inner: Message) -> Failure {
        self.fail(ErrorKind::InvalidValue, text, 1, || {
            Message::new()
                .text("invalid value for")
                .metavar(self.metavar.as_str())
                .text(":")
                .extend(inner)
        })
    }
}

impl<V> Parser for Argument<V>
where
    V: ValueParser,
    V::Value: Clone,
{
    type State = Option<V::Value>;
    type Value = V::Value;

    fn priority(&self) -> Priority {
        Priority::ARGUMENT
    }

    fn mode(&self) -> Mode {
        self.value.mode()
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::Argument {
            metavar: self.metavar.clone(),
        }]
    }

    fn initial_state(&self) -> Self::State {
        None
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        match self.resolve(&context) {
            Claim::Terminator => Ok(context.accept_terminator()),
            Claim::Fail(failure) => Err(failure),
            Claim::Text(text) => match self.value.parse(&text) {
                Ok(value) => Ok(context
                    .map_state(|_| Some(value))
                    .advance(1)
                    .claimed_by(self.priority())),
                Err(inner) => Err(self.invalid_value(&text, inner)),
            },
        }
    }

    fn parse_async<'f>(
        &'f self,
        context: ParseContext<Self::State>,
    ) -> BoxFuture<'f, Outcome<Self::State>>
    where
        Self::State: 'f,
    {
        Box::pin(async move {
            match self.resolve(&context) {
                Claim::Terminator => Ok(context.accept_terminator()),
                Claim::Fail(failure) => Err(failure),
                Claim::Text(text) => match self.value.parse_async(&text).await {
                    Ok(value) => Ok(context
                        .map_state(|_| Some(value))
                        .advance(1)
                        .claimed_by(self.priority())),
                    Err(inner) => Err(self.invalid_value(&text, inner)),
                },
            }
        })
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        match state {
            Some(value) => Ok(value),
            None => Err(self.fail(ErrorKind::MissingRequired, "", 0, || {
                Message::new()
                    .text("missing required argument")
                    .metavar(self.metavar.as_str())
            })),
        }
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        if !context.buffer().is_empty() || context.state().is_some() {
            return Vec::new();
        }
        self.value.suggest(prefix)
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        Box::pin(async move {
            if !context.buffer().is_empty() || context.state().is_some() {
                return Vec::new();
            }
            self.value.suggest_async(prefix).await
        })
    }

    fn doc_fragments(
        &self,
        _availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        DocFragments::entry(DocEntry {
            term: UsageTerm::Argument {
                metavar: self.metavar.clone(),
            },
            description: self.help.clone(),
            default,
            choices: self
                .value
                .choices()
                .map(|spellings| Message::new().values(spellings)),
        })
    }
}

/// A parser that consumes nothing and completes to a fixed value.
pub struct Constant<T: Clone> {
    value: T,
    overrides: ErrorOverrides,
}

/// Inject `value` into a composite without touching the buffer.
///
/// ### Example
/// ```
/// use argot::{constant, flag, object, parse, Parser};
///
/// let parser = object((flag(["--verbose"]).with_default(false), constant("v2")));
/// let (verbose, version) = parse(&parser, ["--verbose"]).unwrap();
/// assert!(verbose);
/// assert_eq!(version, "v2");
/// ```
pub fn constant<T: Clone>(value: T) -> Constant<T> {
    Constant {
        value,
        overrides: ErrorOverrides::default(),
    }
}

impl<T: Clone> Constant<T> {
    /// Replace the stock message for one failure kind.
    pub fn error(mut self, kind: ErrorKind, hook: impl Into<ErrorHook>) -> Self {
        self.overrides.insert(kind, hook.into());
        self
    }
}

impl<T: Clone> Parser for Constant<T> {
    type State = ();
    type Value = T;

    fn priority(&self) -> Priority {
        Priority::CONSTANT
    }

    fn usage(&self) -> Vec<UsageTerm> {
        Vec::new()
    }

    fn initial_state(&self) -> Self::State {}

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        match context.head() {
            Some(head) => Err(decline_with(&self.overrides, head)),
            None => Err(end_of_input(Message::from("nothing to parse"))),
        }
    }

    fn complete(&self, _state: Self::State) -> Result<Self::Value, Failure> {
        Ok(self.value.clone())
    }

    fn doc_fragments(
        &self,
        _availability: DocState<'_, Self::State>,
        _default: Option<Message>,
    ) -> DocFragments {
        DocFragments::default()
    }
}

/// Which token shapes a [`PassThrough`] collector may capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    /// Only self-contained option tokens carrying an attached value
    /// (`--define=KEY=VALUE`).
    EqualsOnly,
    /// Option tokens in either spelling; a bare option token pulls the
    /// following plain token along as its value.
    NextToken,
    /// Every token nothing else claimed, before and after the `--`
    /// terminator.
    Greedy,
}

/// A lowest-priority collector for tokens destined elsewhere.
///
/// Pass-throughs exist to forward unrecognized options, or everything after
/// `--`, to some wrapped program.  Dash-shaped tokens are the capture
/// target; slash-shaped tokens stay with positionals under the non-greedy
/// formats, since nothing distinguishes `/V` from a path here.
pub struct PassThrough {
    format: CaptureFormat,
    help: Option<Message>,
    overrides: ErrorOverrides,
}

/// The tokens nobody else claimed, raw and in order.
///
/// Completion never fails: an empty collection is an empty `Vec`.
///
/// ### Example
/// ```
/// use argot::{parse, pass_through, CaptureFormat};
///
/// let extras = pass_through(CaptureFormat::Greedy);
/// let collected = parse(&extras, ["run", "--", "--not-an-option"]).unwrap();
/// assert_eq!(collected, vec!["run".to_string(), "--not-an-option".to_string()]);
/// ```
pub fn pass_through(format: CaptureFormat) -> PassThrough {
    PassThrough {
        format,
        help: None,
        overrides: ErrorOverrides::default(),
    }
}

impl PassThrough {
    /// Describe this collector for help documents.
    pub fn help(mut self, text: impl Into<Message>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Replace the stock message for one failure kind.
    pub fn error(mut self, kind: ErrorKind, hook: impl Into<ErrorHook>) -> Self {
        self.overrides.insert(kind, hook.into());
        self
    }

    fn capture(&self, context: ParseContext<Vec<String>>, count: usize) -> ParseContext<Vec<String>> {
        let taken: Vec<String> = context.buffer()[..count].to_vec();
        context
            .map_state(|mut collected| {
                collected.extend(taken);
                collected
            })
            .advance(count)
            .claimed_by(self.priority())
    }
}

impl Parser for PassThrough {
    type State = Vec<String>;
    type Value = Vec<String>;

    fn priority(&self) -> Priority {
        Priority::PASS_THROUGH
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::PassThrough]
    }

    fn initial_state(&self) -> Self::State {
        Vec::new()
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        let head = match context.head() {
            Some(head) => head.to_string(),
            None => return Err(end_of_input(Message::from("nothing left to collect"))),
        };

        if context.options_terminated() {
            return match self.format {
                CaptureFormat::Greedy => Ok(self.capture(context, 1)),
                _ => Err(decline_with(&self.overrides, &head)),
            };
        }

        match classify(&head) {
            TokenShape::Terminator => Ok(context.accept_terminator()),
            TokenShape::Long { value, .. } | TokenShape::Short { value, .. } => {
                match (self.format, value.is_some()) {
                    (CaptureFormat::EqualsOnly, true) => Ok(self.capture(context, 1)),
                    (CaptureFormat::EqualsOnly, false) => Err(decline_with(&self.overrides, &head)),
                    (CaptureFormat::NextToken, true) => Ok(self.capture(context, 1)),
                    (CaptureFormat::NextToken, false) => {
                        // Pull the value token along, unless the next token
                        // looks like another option.
                        let paired = matches!(
                            context.buffer().get(1).map(|next| classify(next)),
                            Some(TokenShape::Plain)
                        );
                        Ok(self.capture(context, if paired { 2 } else { 1 }))
                    }
                    (CaptureFormat::Greedy, _) => Ok(self.capture(context, 1)),
                }
            }
            TokenShape::Slash { .. } | TokenShape::Plain => match self.format {
                CaptureFormat::Greedy => Ok(self.capture(context, 1)),
                _ => Err(decline_with(&self.overrides, &head)),
            },
        }
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        Ok(state)
    }

    fn doc_fragments(
        &self,
        _availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        DocFragments::entry(DocEntry {
            term: UsageTerm::PassThrough,
            description: self.help.clone(),
            default,
            choices: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::assert_contains;
    use crate::value::{choices, from_str, string};
    use rstest::rstest;

    fn context<S>(tokens: &[&str], state: S) -> ParseContext<S> {
        ParseContext::new(tokens.iter().map(|token| token.to_string()).collect(), state)
    }

    #[rstest]
    #[case("7", Some(7))]
    #[case("0", Some(0))]
    fn argument_captures(#[case] token: &str, #[case] expected: Option<u32>) {
        // Setup
        let parser = argument("COUNT", from_str::<u32>());

        // Execute
        let next = parser.parse(context(&[token], None)).unwrap();

        // Verify
        assert_eq!(next.state(), &expected);
        assert!(next.buffer().is_empty());
    }

    #[rstest]
    #[case("--verbose")]
    #[case("-v")]
    fn argument_declines_options(#[case] token: &str) {
        // Setup
        let parser = argument("FILE", string());

        // Execute
        let failure = parser.parse(context(&[token], None)).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::UnmatchedToken);
        assert_eq!(failure.consumed, 0);
    }

    #[test]
    fn argument_captures_slash_path() {
        // Setup
        let parser = argument("FILE", string());

        // Execute
        let next = parser.parse(context(&["/etc/hosts"], None)).unwrap();

        // Verify
        assert_eq!(next.state(), &Some("/etc/hosts".to_string()));
    }

    #[test]
    fn argument_declines_once_filled() {
        // Setup
        let parser = argument("FILE", string());

        // Execute
        let failure = parser
            .parse(context(&["second"], Some("first".to_string())))
            .unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::UnmatchedToken);
        assert_eq!(failure.consumed, 0);
    }

    #[test]
    fn argument_invalid_value() {
        // Setup
        let parser = argument("COUNT", from_str::<u32>());

        // Execute
        let failure = parser.parse(context(&["many"], None)).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::InvalidValue);
        assert_eq!(failure.consumed, 1);
        assert_contains!(failure.message.to_string(), "invalid value for COUNT");
    }

    #[test]
    fn argument_missing_required() {
        // Setup
        let parser = argument("FILE", string());

        // Execute
        let failure = parser.complete(None).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::MissingRequired);
        assert_eq!(failure.message.to_string(), "missing required argument FILE");
    }

    #[test]
    fn argument_takes_option_shape_after_terminator() {
        // Setup
        let parser = argument("PATTERN", string());
        let terminated = parser.parse(context(&["--", "--weird"], None)).unwrap();
        assert!(terminated.options_terminated());

        // Execute
        let next = parser.parse(terminated).unwrap();

        // Verify
        assert_eq!(next.state(), &Some("--weird".to_string()));
    }

    #[test]
    fn argument_custom_error() {
        // Setup
        let parser = argument("FILE", string())
            .error(ErrorKind::MissingRequired, "name the input file");

        // Execute
        let failure = parser.complete(None).unwrap_err();

        // Verify
        assert_eq!(failure.message.to_string(), "name the input file");
    }

    #[test]
    fn argument_suggests_values() {
        // Setup
        let parser = argument("LEVEL", choices(["debug", "info"]));

        // Execute
        let suggestions = parser.suggest(&context(&[], None), "d");

        // Verify
        assert_eq!(suggestions, vec![Suggestion::literal("debug")]);
    }

    #[test]
    fn argument_no_suggestions_mid_claim() {
        // Setup: a non-empty buffer means some option owns the cursor.
        let parser = argument("LEVEL", choices(["debug", "info"]));

        // Execute & verify
        assert!(parser.suggest(&context(&["--remote"], None), "").is_empty());
    }

    #[test]
    fn argument_documents_itself() {
        // Setup
        let parser = argument("LEVEL", choices(["debug", "info"])).help("how loud to be");

        // Execute
        let entries = parser
            .doc_fragments(DocState::Unavailable, None)
            .into_entries();

        // Verify
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].term,
            UsageTerm::Argument {
                metavar: "LEVEL".to_string()
            }
        );
        assert_eq!(
            entries[0].choices.as_ref().map(|c| c.to_string()),
            Some("`debug`, `info`".to_string())
        );
    }

    struct UpperAsync;

    impl ValueParser for UpperAsync {
        type Value = String;

        fn mode(&self) -> Mode {
            Mode::Async
        }

        fn parse(&self, _token: &str) -> Result<String, Message> {
            Err(Message::from("requires asynchronous execution"))
        }

        fn parse_async<'f>(&'f self, token: &'f str) -> BoxFuture<'f, Result<String, Message>>
        where
            Self::Value: 'f,
        {
            Box::pin(async move { Ok(token.to_uppercase()) })
        }

        fn format(&self, value: &String) -> String {
            value.clone()
        }
    }

    #[tokio::test]
    async fn argument_parse_async_delegates() {
        // Setup
        let parser = argument("NAME", UpperAsync);
        assert_eq!(parser.mode(), Mode::Async);

        // Execute
        let next = parser.parse_async(context(&["deploy"], None)).await.unwrap();

        // Verify
        assert_eq!(next.state(), &Some("DEPLOY".to_string()));
    }

    #[test]
    fn constant_never_claims() {
        // Setup
        let parser = constant(42u8);

        // Execute
        let failure = parser.parse(context(&["anything"], ())).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::UnmatchedToken);
        assert_eq!(failure.consumed, 0);
    }

    #[test]
    fn constant_completes() {
        // Setup
        let parser = constant("fixed");

        // Execute & verify
        assert_eq!(parser.complete(()).unwrap(), "fixed");
    }

    #[test]
    fn constant_custom_error() {
        // Setup
        let parser =
            constant(42u8).error(ErrorKind::UnmatchedToken, "this tool takes no arguments");

        // Execute
        let failure = parser.parse(context(&["stray"], ())).unwrap_err();

        // Verify
        assert_eq!(failure.message.to_string(), "this tool takes no arguments");
    }

    #[rstest]
    #[case("--define=a=1", true)]
    #[case("-D=1", true)]
    #[case("--define", false)]
    #[case("plain", false)]
    fn pass_through_equals_only(#[case] token: &str, #[case] captured: bool) {
        // Setup
        let parser = pass_through(CaptureFormat::EqualsOnly);

        // Execute
        let outcome = parser.parse(context(&[token], Vec::new()));

        // Verify
        if captured {
            assert_eq!(outcome.unwrap().state(), &vec![token.to_string()]);
        } else {
            assert_eq!(outcome.unwrap_err().consumed, 0);
        }
    }

    #[test]
    fn pass_through_next_token_pairs() {
        // Setup
        let parser = pass_through(CaptureFormat::NextToken);

        // Execute
        let next = parser
            .parse(context(&["--unknown", "value", "rest"], Vec::new()))
            .unwrap();

        // Verify
        assert_eq!(
            next.state(),
            &vec!["--unknown".to_string(), "value".to_string()]
        );
        assert_eq!(next.buffer(), &["rest".to_string()]);
    }

    #[test]
    fn pass_through_next_token_stops_before_option() {
        // Setup
        let parser = pass_through(CaptureFormat::NextToken);

        // Execute
        let next = parser
            .parse(context(&["--one", "--two"], Vec::new()))
            .unwrap();

        // Verify
        assert_eq!(next.state(), &vec!["--one".to_string()]);
        assert_eq!(next.buffer(), &["--two".to_string()]);
    }

    #[test]
    fn pass_through_next_token_declines_plain() {
        // Setup
        let parser = pass_through(CaptureFormat::NextToken);

        // Execute
        let failure = parser.parse(context(&["plain"], Vec::new())).unwrap_err();

        // Verify
        assert_eq!(failure.consumed, 0);
    }

    #[test]
    fn pass_through_greedy_spans_terminator() {
        // Setup
        let parser = pass_through(CaptureFormat::Greedy);
        let mut current = context(&["a", "--", "--b"], Vec::new());

        // Execute
        for _ in 0..3 {
            current = parser.parse(current).unwrap();
        }

        // Verify: the terminator itself is consumed, not collected.
        assert_eq!(current.state(), &vec!["a".to_string(), "--b".to_string()]);
        assert!(current.options_terminated());
        assert!(current.buffer().is_empty());
    }

    #[test]
    fn pass_through_non_greedy_stops_after_terminator() {
        // Setup
        let parser = pass_through(CaptureFormat::EqualsOnly);
        let terminated = parser.parse(context(&["--", "--a=1"], Vec::new())).unwrap();

        // Execute
        let failure = parser.parse(terminated).unwrap_err();

        // Verify
        assert_eq!(failure.consumed, 0);
    }

    #[test]
    fn pass_through_completes_empty() {
        // Setup
        let parser = pass_through(CaptureFormat::Greedy);

        // Execute & verify
        assert_eq!(parser.complete(Vec::new()).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn pass_through_custom_error() {
        // Setup
        let parser = pass_through(CaptureFormat::EqualsOnly)
            .error(ErrorKind::UnmatchedToken, "expected KEY=VALUE definitions");

        // Execute
        let failure = parser.parse(context(&["plain"], Vec::new())).unwrap_err();

        // Verify
        assert_eq!(failure.message.to_string(), "expected KEY=VALUE definitions");
    }
}
