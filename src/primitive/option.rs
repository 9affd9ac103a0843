use crate::error::{ErrorContext, ErrorHook, ErrorKind, ErrorOverrides, Failure};
use crate::message::Message;
use crate::model::{BoxFuture, Mode, Priority};
use crate::parse::{end_of_input, Outcome, ParseContext, Parser};
use crate::suggest::Suggestion;
use crate::token::{classify, OptionName};
use crate::usage::{DocEntry, DocFragments, DocState, UsageTerm};
use crate::value::ValueParser;

use super::{
    decline, match_names, name_strings, name_suggestions, terminated_refusal, NameMatch,
};

/// A boolean option taking no value (`--verbose`, `-v`, `/V`).
///
/// A flag is required: completion fails when it never appeared.  Use
/// [`Parser::with_default`] to make absence mean `false`, or
/// [`Parser::optional`] to observe absence as `None`.
pub struct Flag {
    names: Vec<OptionName>,
    help: Option<Message>,
    overrides: ErrorOverrides,
}

/// A flag answering to any of `names`.
///
/// ### Panics
/// When `names` is empty or a name is malformed (see
/// [`OptionName::declare`]).
///
/// ### Example
/// ```
/// use argot::{flag, parse, Parser};
///
/// let verbose = flag(["--verbose", "-v"]).with_default(false);
/// assert!(parse(&verbose, ["-v"]).unwrap());
/// assert!(!parse(&verbose, Vec::<String>::new()).unwrap());
/// ```
pub fn flag<I, S>(names: I) -> Flag
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<OptionName> = names
        .into_iter()
        .map(|raw| OptionName::declare(raw.as_ref()))
        .collect();
    assert!(!names.is_empty(), "a flag needs at least one name");
    Flag {
        names,
        help: None,
        overrides: ErrorOverrides::default(),
    }
}

impl Flag {
    /// Describe this flag for help documents and completion annotations.
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
        let expected = name_strings(&self.names);
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

    fn terminated_failure(&self, head: &str) -> Failure {
        match match_names(&self.names, &classify(head)) {
            NameMatch::Hit { .. } => {
                let stock = terminated_refusal(head);
                self.fail(ErrorKind::OptionsTerminated, head, 0, || stock.message)
            }
            _ => decline(head),
        }
    }
}

impl Parser for Flag {
    type State = bool;
    type Value = bool;

    fn priority(&self) -> Priority {
        Priority::OPTION
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::Option {
            names: self.names.clone(),
            metavar: None,
        }]
    }

    fn initial_state(&self) -> Self::State {
        false
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        let head = match context.head() {
            Some(head) => head.to_string(),
            None => return Err(end_of_input(Message::from("expected an option"))),
        };

        if context.options_terminated() {
            return Err(self.terminated_failure(&head));
        }

        match match_names(&self.names, &classify(&head)) {
            NameMatch::Terminator => Ok(context.accept_terminator()),
            NameMatch::Other | NameMatch::Plain => Err(decline(&head)),
            NameMatch::Hit {
                name,
                attached,
                remainder,
            } => {
                if *context.state() {
                    return Err(self.fail(ErrorKind::DuplicateOption, &head, 1, || {
                        Message::new()
                            .text("option")
                            .option_name(name.to_string())
                            .text("appears more than once")
                    }));
                }

                match (attached, remainder) {
                    (Some(_), None) => {
                        Err(self.fail(ErrorKind::InvalidValue, &head, 1, || {
                            Message::new()
                                .text("option")
                                .option_name(name.to_string())
                                .text("does not take a value")
                        }))
                    }
                    (attached, Some(rest)) => {
                        // The attached value belongs to the last bundle
                        // member; keep it riding along.
                        let rewritten = match attached {
                            Some(value) => format!("-{rest}={value}"),
                            None => format!("-{rest}"),
                        };
                        Ok(context
                            .map_state(|_| true)
                            .rewrite_head(rewritten)
                            .claimed_by(self.priority()))
                    }
                    (None, None) => Ok(context
                        .map_state(|_| true)
                        .advance(1)
                        .claimed_by(self.priority())),
                }
            }
        }
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        if state {
            Ok(true)
        } else {
            Err(self.fail(ErrorKind::MissingRequired, "", 0, || {
                Message::new()
                    .text("missing required option")
                    .option_names(name_strings(&self.names))
            }))
        }
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        if !context.buffer().is_empty() || context.options_terminated() || *context.state() {
            return Vec::new();
        }
        name_suggestions(&self.names, self.help.as_ref(), prefix)
    }

    fn doc_fragments(
        &self,
        _availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        DocFragments::entry(DocEntry {
            term: UsageTerm::Option {
                names: self.names.clone(),
                metavar: None,
            },
            description: self.help.clone(),
            default,
            choices: None,
        })
    }
}

/// A value-taking option (`--port 8080`, `--port=8080`, `-p 8080`,
/// `/Port:8080`).
///
/// The value text is handed to a [`ValueParser`]; everything about token
/// shapes stays here.
pub struct OptionParser<V: ValueParser> {
    names: Vec<OptionName>,
    value: V,
    metavar: Option<String>,
    help: Option<Message>,
    overrides: ErrorOverrides,
}

/// What to do with the head token, decided before any value conversion.
///
/// Resolution is shared between the blocking and async parse paths so the
/// two can never drift apart.
enum Claim {
    Terminator,
    Value { text: String, consumed: usize },
    Fail(Failure),
}

/// An option answering to any of `names`, converting through `value`.
///
/// ### Panics
/// When `names` is empty or a name is malformed (see
/// [`OptionName::declare`]).
///
/// ### Example
/// ```
/// use argot::{from_str, option, parse};
///
/// let port = option(["--port", "-p"], from_str::<u16>());
/// assert_eq!(parse(&port, ["--port", "8080"]).unwrap(), 8080);
/// assert_eq!(parse(&port, ["-p=443"]).unwrap(), 443);
/// ```
pub fn option<I, S, V>(names: I, value: V) -> OptionParser<V>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    V: ValueParser,
{
    let names: Vec<OptionName> = names
        .into_iter()
        .map(|raw| OptionName::declare(raw.as_ref()))
        .collect();
    assert!(!names.is_empty(), "an option needs at least one name");
    OptionParser {
        names,
        value,
        metavar: None,
        help: None,
        overrides: ErrorOverrides::default(),
    }
}

impl<V: ValueParser> OptionParser<V> {
    /// Describe this option for help documents and completion annotations.
    pub fn help(mut self, text: impl Into<Message>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Override the value placeholder shown in usage lines.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
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
        let expected = name_strings(&self.names);
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

    fn primary_name(&self) -> String {
        self.names[0].to_string()
    }

    fn resolved_metavar(&self) -> String {
        if let Some(custom) = &self.metavar {
            return custom.clone();
        }
        if let Some(opinion) = self.value.metavar() {
            return opinion;
        }
        for name in &self.names {
            if let OptionName::Long(long) = name {
                return long.to_uppercase().replace('-', "_");
            }
        }
        match &self.names[0] {
            OptionName::Short(short) => short.to_uppercase().to_string(),
            OptionName::Dos(dos) => dos.to_uppercase(),
            OptionName::Long(_) => unreachable!("internal error - long name not resolved"),
        }
    }

    fn resolve(&self, context: &ParseContext<Option<V::Value>>) -> Claim {
        let head = match context.head() {
            Some(head) => head.to_string(),
            None => return Claim::Fail(end_of_input(Message::from("expected an option"))),
        };

        if context.options_terminated() {
            return Claim::Fail(match match_names(&self.names, &classify(&head)) {
                NameMatch::Hit { .. } => {
                    let stock = terminated_refusal(&head);
                    self.fail(ErrorKind::OptionsTerminated, &head, 0, || stock.message)
                }
                _ => decline(&head),
            });
        }

        match match_names(&self.names, &classify(&head)) {
            NameMatch::Terminator => Claim::Terminator,
            NameMatch::Other | NameMatch::Plain => Claim::Fail(decline(&head)),
            NameMatch::Hit {
                remainder: Some(_), ..
            } => {
                // A value-taking option cannot sit mid-bundle.
                Claim::Fail(decline(&head))
            }
            NameMatch::Hit {
                name,
                attached,
                remainder: None,
            } => {
                if context.state().is_some() {
                    return Claim::Fail(self.fail(ErrorKind::DuplicateOption, &head, 1, || {
                        Message::new()
                            .text("option")
                            .option_name(name.to_string())
                            .text("appears more than once")
                    }));
                }

                match attached {
                    Some(text) => Claim::Value { text, consumed: 1 },
                    None => match context.buffer().get(1) {
                        Some(next) => Claim::Value {
                            text: next.clone(),
                            consumed: 2,
                        },
                        None => Claim::Fail(self.fail(ErrorKind::EndOfInput, &head, 1, || {
                            Message::new()
                                .text("option")
                                .option_name(name.to_string())
                                .text("requires a value")
                        })),
                    },
                }
            }
        }
    }

    fn invalid_value(&self, consumed: usize, text: &str, inner: Message) -> Failure {
        self.fail(ErrorKind::InvalidValue, text, consumed, || {
            Message::new()
                .text("invalid value for")
                .option_name(self.primary_name())
                .text(":")
                .extend(inner)
        })
    }
}

impl<V> Parser for OptionParser<V>
where
    V: ValueParser,
    V::Value: Clone,
{
    type State = Option<V::Value>;
    type Value = V::Value;

    fn priority(&self) -> Priority {
        Priority::OPTION
    }

    fn mode(&self) -> Mode {
        self.value.mode()
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::Option {
            names: self.names.clone(),
            metavar: Some(self.resolved_metavar()),
        }]
    }

    fn initial_state(&self) -> Self::State {
        None
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        match self.resolve(&context) {
            Claim::Terminator => Ok(context.accept_terminator()),
            Claim::Fail(failure) => Err(failure),
            Claim::Value { text, consumed } => match self.value.parse(&text) {
                Ok(value) => Ok(context
                    .map_state(|_| Some(value))
                    .advance(consumed)
                    .claimed_by(self.priority())),
                Err(inner) => Err(self.invalid_value(consumed, &text, inner)),
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
                Claim::Value { text, consumed } => match self.value.parse_async(&text).await {
                    Ok(value) => Ok(context
                        .map_state(|_| Some(value))
                        .advance(consumed)
                        .claimed_by(self.priority())),
                    Err(inner) => Err(self.invalid_value(consumed, &text, inner)),
                },
            }
        })
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        match state {
            Some(value) => Ok(value),
            None => Err(self.fail(ErrorKind::MissingRequired, "", 0, || {
                Message::new()
                    .text("missing required option")
                    .option_names(name_strings(&self.names))
            })),
        }
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        if context.options_terminated() {
            return Vec::new();
        }

        let buffer = context.buffer();
        if buffer.is_empty() {
            if context.state().is_some() {
                return Vec::new();
            }
            let mut suggestions = name_suggestions(&self.names, self.help.as_ref(), prefix);
            for name in &self.names {
                let lead = format!("{name}=");
                if let Some(rest) = prefix.strip_prefix(lead.as_str()) {
                    suggestions.extend(self.value.suggest(rest).into_iter().map(
                        |suggestion| match suggestion {
                            Suggestion::Literal { text, note } => Suggestion::Literal {
                                text: format!("{lead}{text}"),
                                note,
                            },
                            file => file,
                        },
                    ));
                }
            }
            return suggestions;
        }

        // A stranded name token means the cursor sits in our value slot;
        // nothing but value candidates may leak out of it.
        if buffer.len() == 1 {
            if let NameMatch::Hit {
                attached: None,
                remainder: None,
                ..
            } = match_names(&self.names, &classify(&buffer[0]))
            {
                return self.value.suggest(prefix);
            }
        }

        Vec::new()
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        Box::pin(async move {
            if context.options_terminated() {
                return Vec::new();
            }

            let buffer = context.buffer();
            if buffer.is_empty() {
                if context.state().is_some() {
                    return Vec::new();
                }
                let mut suggestions = name_suggestions(&self.names, self.help.as_ref(), prefix);
                for name in &self.names {
                    let lead = format!("{name}=");
                    if let Some(rest) = prefix.strip_prefix(lead.as_str()) {
                        suggestions.extend(self.value.suggest_async(rest).await.into_iter().map(
                            |suggestion| match suggestion {
                                Suggestion::Literal { text, note } => Suggestion::Literal {
                                    text: format!("{lead}{text}"),
                                    note,
                                },
                                file => file,
                            },
                        ));
                    }
                }
                return suggestions;
            }

            if buffer.len() == 1 {
                if let NameMatch::Hit {
                    attached: None,
                    remainder: None,
                    ..
                } = match_names(&self.names, &classify(&buffer[0]))
                {
                    return self.value.suggest_async(prefix).await;
                }
            }

            Vec::new()
        })
    }

    fn doc_fragments(
        &self,
        _availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        DocFragments::entry(DocEntry {
            term: UsageTerm::Option {
                names: self.names.clone(),
                metavar: Some(self.resolved_metavar()),
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
    #[case("--verbose")]
    #[case("-v")]
    #[case("/V")]
    fn flag_matches(#[case] token: &str) {
        // Setup
        let parser = flag(["--verbose", "-v", "/V"]);

        // Execute
        let next = parser.parse(context(&[token], false)).unwrap();

        // Verify
        assert!(next.state());
        assert!(next.buffer().is_empty());
    }

    #[test]
    fn flag_declines_stranger() {
        // Setup
        let parser = flag(["--verbose"]);

        // Execute
        let failure = parser.parse(context(&["--quiet"], false)).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::UnmatchedToken);
        assert_eq!(failure.consumed, 0);
    }

    #[test]
    fn flag_duplicate() {
        // Setup
        let parser = flag(["--verbose", "-v"]);

        // Execute
        let failure = parser.parse(context(&["-v"], true)).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::DuplicateOption);
        assert_eq!(failure.consumed, 1);
        assert_eq!(
            failure.message.to_string(),
            "option `-v` appears more than once"
        );
    }

    #[test]
    fn flag_refuses_attached_value() {
        // Setup
        let parser = flag(["--verbose"]);

        // Execute
        let failure = parser.parse(context(&["--verbose=yes"], false)).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::InvalidValue);
        assert_contains!(failure.message.to_string(), "does not take a value");
    }

    #[test]
    fn flag_unbundles() {
        // Setup
        let parser = flag(["-v"]);

        // Execute
        let next = parser.parse(context(&["-vqf"], false)).unwrap();

        // Verify
        assert!(next.state());
        assert_eq!(next.buffer(), &["-qf".to_string()]);
    }

    #[test]
    fn flag_unbundles_keeping_attached_value() {
        // Setup
        let parser = flag(["-v"]);

        // Execute
        let next = parser.parse(context(&["-vp=8080"], false)).unwrap();

        // Verify
        assert_eq!(next.buffer(), &["-p=8080".to_string()]);
    }

    #[test]
    fn flag_eats_terminator() {
        // Setup
        let parser = flag(["-v"]);

        // Execute
        let next = parser.parse(context(&["--", "-v"], false)).unwrap();

        // Verify
        assert!(!next.state());
        assert!(next.options_terminated());
        assert_eq!(next.buffer(), &["-v".to_string()]);
    }

    #[test]
    fn flag_refuses_own_name_after_terminator() {
        // Setup
        let parser = flag(["-v"]);
        let terminated = parser
            .parse(context(&["--", "-v"], false))
            .unwrap();

        // Execute
        let failure = parser.parse(terminated).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::OptionsTerminated);
        assert_eq!(failure.consumed, 0);
        assert_contains!(failure.message.to_string(), "cannot appear after");
    }

    #[test]
    fn flag_missing_required() {
        // Setup
        let parser = flag(["--verbose", "-v"]);

        // Execute
        let failure = parser.complete(false).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::MissingRequired);
        assert_eq!(
            failure.message.to_string(),
            "missing required option `--verbose`, `-v`"
        );
    }

    #[test]
    fn flag_custom_error() {
        // Setup
        let parser = flag(["--force"]).error(ErrorKind::MissingRequired, "say --force to proceed");

        // Execute
        let failure = parser.complete(false).unwrap_err();

        // Verify
        assert_eq!(failure.message.to_string(), "say --force to proceed");
    }

    #[test]
    fn flag_suggests_names() {
        // Setup
        let parser = flag(["--verbose", "-v"]).help("print more");

        // Execute
        let suggestions = parser.suggest(&context(&[], false), "--v");

        // Verify
        assert_eq!(
            suggestions,
            vec![Suggestion::noted("--verbose", "print more")]
        );
    }

    #[test]
    fn flag_no_suggestions_once_set() {
        // Setup
        let parser = flag(["--verbose"]);

        // Execute & verify
        assert!(parser.suggest(&context(&[], true), "--v").is_empty());
    }

    #[rstest]
    #[case(&["--port", "8080"], 8080)]
    #[case(&["--port=8080"], 8080)]
    #[case(&["-p", "443"], 443)]
    #[case(&["-p=443"], 443)]
    fn option_captures(#[case] tokens: &[&str], #[case] expected: u16) {
        // Setup
        let parser = option(["--port", "-p"], from_str::<u16>());

        // Execute
        let next = parser.parse(context(tokens, None)).unwrap();

        // Verify
        assert_eq!(next.state(), &Some(expected));
        assert!(next.buffer().is_empty());
    }

    #[test]
    fn option_dos_colon_value() {
        // Setup
        let parser = option(["/Out"], string());

        // Execute
        let next = parser.parse(context(&["/Out:report.txt"], None)).unwrap();

        // Verify
        assert_eq!(next.state(), &Some("report.txt".to_string()));
    }

    #[test]
    fn option_missing_value() {
        // Setup
        let parser = option(["--port"], from_str::<u16>());

        // Execute
        let failure = parser.parse(context(&["--port"], None)).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::EndOfInput);
        assert_eq!(failure.consumed, 1);
        assert_contains!(failure.message.to_string(), "requires a value");
    }

    #[test]
    fn option_invalid_value() {
        // Setup
        let parser = option(["--port"], from_str::<u16>());

        // Execute
        let failure = parser
            .parse(context(&["--port", "eight"], None))
            .unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::InvalidValue);
        assert_eq!(failure.consumed, 2);
        assert_contains!(failure.message.to_string(), "invalid value for `--port`");
        assert_contains!(failure.message.to_string(), "cannot convert `eight`");
    }

    #[test]
    fn option_duplicate() {
        // Setup
        let parser = option(["--port"], from_str::<u16>());

        // Execute
        let failure = parser
            .parse(context(&["--port", "9"], Some(8080)))
            .unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::DuplicateOption);
    }

    #[test]
    fn option_declines_mid_bundle() {
        // Setup
        let parser = option(["-f"], string());

        // Execute
        let failure = parser.parse(context(&["-fab"], None)).unwrap_err();

        // Verify
        assert_eq!(failure.kind, ErrorKind::UnmatchedToken);
        assert_eq!(failure.consumed, 0);
    }

    #[test]
    fn option_value_slot_suggestions() {
        // Setup
        let parser = option(["--remote"], choices(["origin", "upstream"]));

        // Execute: the replayed name token strands in the buffer.
        let suggestions = parser.suggest(&context(&["--remote"], None), "");

        // Verify
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].text(), Some("origin"));
        assert_eq!(suggestions[1].text(), Some("upstream"));
    }

    #[test]
    fn option_equals_form_suggestions() {
        // Setup
        let parser = option(["--level"], choices(["debug", "info"]));

        // Execute
        let suggestions = parser.suggest(&context(&[], None), "--level=d");

        // Verify
        assert_eq!(suggestions, vec![Suggestion::literal("--level=debug")]);
    }

    #[test]
    fn option_name_suggestions() {
        // Setup
        let parser = option(["--port", "-p"], from_str::<u16>());

        // Execute
        let suggestions = parser.suggest(&context(&[], None), "--p");

        // Verify
        assert_eq!(suggestions, vec![Suggestion::literal("--port")]);
    }

    #[rstest]
    #[case(None, "MAX_COUNT")]
    #[case(Some("N"), "N")]
    fn option_metavar_resolution(#[case] custom: Option<&str>, #[case] expected: &str) {
        // Setup
        let mut parser = option(["--max-count", "-m"], from_str::<u32>());
        if let Some(metavar) = custom {
            parser = parser.metavar(metavar);
        }

        // Execute
        let usage = parser.usage();

        // Verify
        assert_matches!(
            &usage[0],
            UsageTerm::Option { metavar: Some(m), .. } if m == expected
        );
    }

    #[test]
    fn option_choices_metavar_wins() {
        // Setup
        let parser = option(["--level"], choices(["debug", "info"]));

        // Execute
        let usage = parser.usage();

        // Verify
        assert_matches!(
            &usage[0],
            UsageTerm::Option { metavar: Some(m), .. } if m == "{debug|info}"
        );
    }

    #[test]
    fn option_documents_choices() {
        // Setup
        let parser = option(["--level"], choices(["debug", "info"])).help("log level");

        // Execute
        let entries = parser
            .doc_fragments(DocState::Unavailable, None)
            .into_entries();

        // Verify
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].choices.as_ref().map(|c| c.to_string()),
            Some("`debug`, `info`".to_string())
        );
    }

    struct SlowDouble;

    impl ValueParser for SlowDouble {
        type Value = u32;

        fn mode(&self) -> Mode {
            Mode::Async
        }

        fn parse(&self, _token: &str) -> Result<u32, Message> {
            Err(Message::from("requires asynchronous execution"))
        }

        fn parse_async<'f>(&'f self, token: &'f str) -> BoxFuture<'f, Result<u32, Message>>
        where
            Self::Value: 'f,
        {
            Box::pin(async move {
                let number: u32 = token
                    .parse()
                    .map_err(|_| Message::new().text("cannot convert").value(token))?;
                Ok(number * 2)
            })
        }

        fn format(&self, value: &u32) -> String {
            (value / 2).to_string()
        }
    }

    #[test]
    fn option_mode_follows_value_parser() {
        // Setup
        let parser = option(["--n"], SlowDouble);

        // Execute & verify
        assert_eq!(parser.mode(), Mode::Async);
    }

    #[tokio::test]
    async fn option_parse_async_delegates() {
        // Setup
        let parser = option(["--n"], SlowDouble);

        // Execute
        let next = parser
            .parse_async(context(&["--n", "21"], None))
            .await
            .unwrap();

        // Verify
        assert_eq!(next.state(), &Some(42));
    }
}
