//! Combinators that assemble leaf parsers into records, sequences,
//! alternatives, and branching trees.
//!
//! The two workhorses live here.  [`object`] builds an unordered record:
//! every token step is offered to the children in priority order, so options
//! and positionals interleave freely.  [`tuple`] builds an ordered sequence
//! with a cursor that only moves forward.  The submodules add alternatives
//! ([`or`], [`longest_match`]), concatenation ([`merge`], [`concat`]), and
//! runtime branching ([`conditional`]).

mod alt;
mod branch;
mod compose;

pub use alt::{longest_match, or, AltState, LongestMatch, Or};
pub use branch::{
    conditional, group, BoxedParser, BoxedState, Conditional, ConditionalState, Group,
};
pub use compose::{concat, merge, Concat, Merge, TupleConcat};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::error::{ErrorContext, ErrorHook, ErrorKind, ErrorOverrides, Failure};
use crate::fuzzy;
use crate::message::Message;
use crate::model::{BoxFuture, Mode, Priority};
use crate::parse::{end_of_input, Outcome, ParseContext, Parser};
use crate::primitive::decline;
use crate::suggest::Suggestion;
use crate::usage::{literal_names, DocFragments, DocState, UsageTerm};

/// Keep the more specific of two refusals for the same token.
///
/// More consumption wins outright.  At equal consumption a kinded refusal
/// (such as an after-terminator complaint) beats the generic unmatched one.
pub(crate) fn merge_refusals(best: Option<Failure>, failure: Failure) -> Option<Failure> {
    Some(match best {
        None => failure,
        Some(current) => {
            if failure.consumed > current.consumed {
                failure
            } else if failure.consumed == current.consumed
                && current.kind == ErrorKind::UnmatchedToken
                && failure.kind != ErrorKind::UnmatchedToken
            {
                failure
            } else {
                current
            }
        }
    })
}

/// Final failure once every candidate has refused the head token.
///
/// A specific refusal passes through as-is; the generic case becomes an
/// unmatched-token failure with fuzzy name suggestions drawn from the
/// composite's usage shape.
pub(crate) fn unmatched(
    overrides: &ErrorOverrides,
    usage: &[UsageTerm],
    token: &str,
    best: Option<Failure>,
) -> Failure {
    if let Some(best) = best {
        if best.consumed > 0 || best.kind != ErrorKind::UnmatchedToken {
            return best;
        }
    }
    let names = literal_names(usage);
    let ranked = fuzzy::rank(token, &names);
    let context = ErrorContext {
        token: Some(token),
        expected: &names,
        suggestions: &ranked,
    };
    let message = overrides.build(ErrorKind::UnmatchedToken, &context, || {
        let mut message = Message::new().text("unexpected token").value(token);
        if !ranked.is_empty() {
            message = message
                .text(", did you mean")
                .values(ranked.clone())
                .text("?");
        }
        message
    });
    Failure {
        kind: ErrorKind::UnmatchedToken,
        message,
        consumed: 0,
    }
}

/// An unordered record of parsers, completing to a tuple of their values.
///
/// Ordering among children is by [`Parser::priority`], with declaration
/// order breaking ties, so a record behaves the same no matter how the
/// caller interleaves options, positionals, and subcommands.
pub struct Object<T> {
    children: T,
    description: Option<Message>,
    overrides: ErrorOverrides,
}

impl<T> Object<T> {
    /// Attach a description, surfaced through documentation export.
    pub fn help(mut self, text: impl Into<Message>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Override the stock message for failures of `kind` raised at this
    /// record's boundary.
    pub fn error(mut self, kind: ErrorKind, hook: impl Into<ErrorHook>) -> Self {
        self.overrides.insert(kind, hook.into());
        self
    }
}

/// Combine parsers into an unordered record.
///
/// ```
/// use argot::{flag, from_str, object, option, parse, Parser};
///
/// let parser = object((
///     flag(["--verbose", "-v"]).with_default(false),
///     option(["--port", "-p"], from_str::<u16>()),
/// ));
///
/// let (verbose, port) = parse(&parser, ["-p", "8080", "--verbose"]).unwrap();
/// assert!(verbose);
/// assert_eq!(port, 8080);
/// ```
pub fn object<T>(children: T) -> Object<T> {
    Object {
        children,
        description: None,
        overrides: ErrorOverrides::default(),
    }
}

/// An ordered sequence of parsers, completing to a tuple of their values.
///
/// The cursor advances only when an earlier child stops accepting tokens,
/// and never moves backwards.  A child's routine refusal lets later
/// children try the token without abandoning the earlier slot; the cursor
/// itself moves only on acceptance.
pub struct Tuple<T> {
    children: T,
}

/// Combine parsers into an ordered sequence.
///
/// ```
/// use argot::{argument, parse, string, tuple};
///
/// let parser = tuple((argument("SRC", string()), argument("DST", string())));
///
/// let (src, dst) = parse(&parser, ["a.txt", "b.txt"]).unwrap();
/// assert_eq!(src, "a.txt");
/// assert_eq!(dst, "b.txt");
/// ```
pub fn tuple<T>(children: T) -> Tuple<T> {
    Tuple { children }
}

macro_rules! impl_composites {
    ($(($P:ident, $idx:tt)),+) => {
        impl<$($P: Parser),+> Parser for Object<($($P,)+)> {
            type State = ($($P::State,)+);
            type Value = ($($P::Value,)+);

            fn priority(&self) -> Priority {
                let mut priority = Priority::CONSTANT;
                $(priority = priority.max(self.children.$idx.priority());)+
                priority
            }

            fn mode(&self) -> Mode {
                let mut mode = Mode::Sync;
                $(mode = mode.join(self.children.$idx.mode());)+
                mode
            }

            fn usage(&self) -> Vec<UsageTerm> {
                let mut terms = Vec::new();
                $(terms.extend(self.children.$idx.usage());)+
                terms
            }

            fn initial_state(&self) -> Self::State {
                ($(self.children.$idx.initial_state(),)+)
            }

            fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
                let head = match context.head() {
                    Some(head) => head.to_string(),
                    None => return Err(end_of_input(Message::from("nothing left to parse"))),
                };
                let terminated = context.options_terminated();
                let (buffer, state, _) = context.into_parts();

                let mut candidates = vec![$((self.children.$idx.priority(), $idx),)+];
                candidates.sort_by(|a, b| b.0.cmp(&a.0));

                let mut best: Option<Failure> = None;
                for (priority, index) in candidates {
                    let outcome = match index {
                        $($idx => {
                            let attempt = ParseContext::from_parts(
                                buffer.clone(),
                                state.$idx.clone(),
                                terminated,
                            );
                            // A successful step carries the claiming child's
                            // declared priority; an enclosing merge arbitrates
                            // on exactly the key this record routed by.
                            self.children.$idx.parse(attempt).map(|next| {
                                next.map_state(|child| {
                                    let mut updated = state.clone();
                                    updated.$idx = child;
                                    updated
                                })
                                .claimed_by(priority)
                            })
                        })+
                        _ => unreachable!("internal error - record child index out of range"),
                    };
                    match outcome {
                        Ok(next) => {
                            #[cfg(feature = "tracing_debug")]
                            {
                                debug!("record child {index} claimed: buffer={:?}", next.buffer());
                            }
                            return Ok(next);
                        }
                        Err(failure) => best = merge_refusals(best, failure),
                    }
                }
                Err(unmatched(&self.overrides, &self.usage(), &head, best))
            }

            fn parse_async<'f>(
                &'f self,
                context: ParseContext<Self::State>,
            ) -> BoxFuture<'f, Outcome<Self::State>>
            where
                Self::State: 'f,
            {
                Box::pin(async move {
                    let head = match context.head() {
                        Some(head) => head.to_string(),
                        None => {
                            return Err(end_of_input(Message::from("nothing left to parse")))
                        }
                    };
                    let terminated = context.options_terminated();
                    let (buffer, state, _) = context.into_parts();

                    let mut candidates = vec![$((self.children.$idx.priority(), $idx),)+];
                    candidates.sort_by(|a, b| b.0.cmp(&a.0));

                    let mut best: Option<Failure> = None;
                    for (priority, index) in candidates {
                        let outcome = match index {
                            $($idx => {
                                let attempt = ParseContext::from_parts(
                                    buffer.clone(),
                                    state.$idx.clone(),
                                    terminated,
                                );
                                self.children.$idx.parse_async(attempt).await.map(|next| {
                                    next.map_state(|child| {
                                        let mut updated = state.clone();
                                        updated.$idx = child;
                                        updated
                                    })
                                    .claimed_by(priority)
                                })
                            })+
                            _ => unreachable!("internal error - record child index out of range"),
                        };
                        match outcome {
                            Ok(next) => return Ok(next),
                            Err(failure) => best = merge_refusals(best, failure),
                        }
                    }
                    Err(unmatched(&self.overrides, &self.usage(), &head, best))
                })
            }

            fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
                Ok(($(self.children.$idx.complete(state.$idx)?,)+))
            }

            fn suggest(
                &self,
                context: &ParseContext<Self::State>,
                prefix: &str,
            ) -> Vec<Suggestion> {
                let mut candidates = vec![$((self.children.$idx.priority(), $idx),)+];
                candidates.sort_by(|a, b| b.0.cmp(&a.0));

                let mut suggestions = Vec::new();
                for (_, index) in candidates {
                    match index {
                        $($idx => {
                            let view = context.with_state(context.state().$idx.clone());
                            suggestions.extend(self.children.$idx.suggest(&view, prefix));
                        })+
                        _ => unreachable!("internal error - record child index out of range"),
                    }
                }
                suggestions
            }

            fn suggest_async<'f>(
                &'f self,
                context: &'f ParseContext<Self::State>,
                prefix: &'f str,
            ) -> BoxFuture<'f, Vec<Suggestion>> {
                Box::pin(async move {
                    let mut candidates = vec![$((self.children.$idx.priority(), $idx),)+];
                    candidates.sort_by(|a, b| b.0.cmp(&a.0));

                    let mut suggestions = Vec::new();
                    for (_, index) in candidates {
                        match index {
                            $($idx => {
                                let view = context.with_state(context.state().$idx.clone());
                                suggestions.extend(
                                    self.children.$idx.suggest_async(&view, prefix).await,
                                );
                            })+
                            _ => unreachable!("internal error - record child index out of range"),
                        }
                    }
                    suggestions
                })
            }

            fn doc_fragments(
                &self,
                availability: DocState<'_, Self::State>,
                _default: Option<Message>,
            ) -> DocFragments {
                let mut docs = DocFragments::default();
                $(
                    let child = match availability {
                        DocState::Available(state) => DocState::Available(&state.$idx),
                        DocState::Unavailable => DocState::Unavailable,
                    };
                    docs.merge(self.children.$idx.doc_fragments(child, None));
                )+
                if self.description.is_some() {
                    docs.description = self.description.clone();
                }
                docs
            }
        }

        impl<$($P: Parser),+> Parser for Tuple<($($P,)+)> {
            type State = (usize, ($($P::State,)+));
            type Value = ($($P::Value,)+);

            fn priority(&self) -> Priority {
                let mut priority = Priority::CONSTANT;
                $(priority = priority.max(self.children.$idx.priority());)+
                priority
            }

            fn mode(&self) -> Mode {
                let mut mode = Mode::Sync;
                $(mode = mode.join(self.children.$idx.mode());)+
                mode
            }

            fn usage(&self) -> Vec<UsageTerm> {
                let mut terms = Vec::new();
                $(terms.extend(self.children.$idx.usage());)+
                terms
            }

            fn initial_state(&self) -> Self::State {
                (0, ($(self.children.$idx.initial_state(),)+))
            }

            fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
                let head = match context.head() {
                    Some(head) => head.to_string(),
                    None => return Err(end_of_input(Message::from("nothing left to parse"))),
                };
                let terminated = context.options_terminated();
                let (buffer, state, _) = context.into_parts();
                let (cursor, children) = state;
                let arity = [$($idx),+].len();

                let mut index = cursor;
                while index < arity {
                    let outcome = match index {
                        $($idx => {
                            let attempt = ParseContext::from_parts(
                                buffer.clone(),
                                children.$idx.clone(),
                                terminated,
                            );
                            // A sequence stays one opaque claimant from the
                            // outside; the step reports its whole priority.
                            self.children.$idx.parse(attempt).map(|next| {
                                next.map_state(|child| {
                                    let mut updated = children.clone();
                                    updated.$idx = child;
                                    (index, updated)
                                })
                                .claimed_by(self.priority())
                            })
                        })+
                        _ => unreachable!("internal error - sequence child index out of range"),
                    };
                    match outcome {
                        Ok(next) => return Ok(next),
                        // A routine pass-over tries the next slot without
                        // committing the cursor; the earlier slot stays
                        // live for future steps.
                        Err(failure) if failure.consumed == 0 => index += 1,
                        Err(failure) => return Err(failure),
                    }
                }
                Err(decline(&head))
            }

            fn parse_async<'f>(
                &'f self,
                context: ParseContext<Self::State>,
            ) -> BoxFuture<'f, Outcome<Self::State>>
            where
                Self::State: 'f,
            {
                Box::pin(async move {
                    let head = match context.head() {
                        Some(head) => head.to_string(),
                        None => {
                            return Err(end_of_input(Message::from("nothing left to parse")))
                        }
                    };
                    let terminated = context.options_terminated();
                    let (buffer, state, _) = context.into_parts();
                    let (cursor, children) = state;
                    let arity = [$($idx),+].len();

                    let mut index = cursor;
                    while index < arity {
                        let outcome = match index {
                            $($idx => {
                                let attempt = ParseContext::from_parts(
                                    buffer.clone(),
                                    children.$idx.clone(),
                                    terminated,
                                );
                                self.children.$idx.parse_async(attempt).await.map(|next| {
                                    next.map_state(|child| {
                                        let mut updated = children.clone();
                                        updated.$idx = child;
                                        (index, updated)
                                    })
                                    .claimed_by(self.priority())
                                })
                            })+
                            _ => unreachable!(
                                "internal error - sequence child index out of range"
                            ),
                        };
                        match outcome {
                            Ok(next) => return Ok(next),
                            Err(failure) if failure.consumed == 0 => index += 1,
                            Err(failure) => return Err(failure),
                        }
                    }
                    Err(decline(&head))
                })
            }

            fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
                let (_, children) = state;
                Ok(($(self.children.$idx.complete(children.$idx)?,)+))
            }

            fn suggest(
                &self,
                context: &ParseContext<Self::State>,
                prefix: &str,
            ) -> Vec<Suggestion> {
                let (cursor, children) = context.state();
                let arity = [$($idx),+].len();

                let mut suggestions = Vec::new();
                let mut index = *cursor;
                while index < arity {
                    // Later slots only matter if every slot before them
                    // could close out right now.
                    let closeable = match index {
                        $($idx => {
                            let view = context.with_state(children.$idx.clone());
                            suggestions.extend(self.children.$idx.suggest(&view, prefix));
                            self.children.$idx.complete(children.$idx.clone()).is_ok()
                        })+
                        _ => unreachable!("internal error - sequence child index out of range"),
                    };
                    if !closeable {
                        break;
                    }
                    index += 1;
                }
                suggestions
            }

            fn suggest_async<'f>(
                &'f self,
                context: &'f ParseContext<Self::State>,
                prefix: &'f str,
            ) -> BoxFuture<'f, Vec<Suggestion>> {
                Box::pin(async move {
                    let (cursor, children) = context.state();
                    let arity = [$($idx),+].len();

                    let mut suggestions = Vec::new();
                    let mut index = *cursor;
                    while index < arity {
                        let closeable = match index {
                            $($idx => {
                                let view = context.with_state(children.$idx.clone());
                                suggestions.extend(
                                    self.children.$idx.suggest_async(&view, prefix).await,
                                );
                                self.children.$idx.complete(children.$idx.clone()).is_ok()
                            })+
                            _ => unreachable!(
                                "internal error - sequence child index out of range"
                            ),
                        };
                        if !closeable {
                            break;
                        }
                        index += 1;
                    }
                    suggestions
                })
            }

            fn doc_fragments(
                &self,
                availability: DocState<'_, Self::State>,
                _default: Option<Message>,
            ) -> DocFragments {
                let mut docs = DocFragments::default();
                $(
                    let child = match availability {
                        DocState::Available((_, children)) => {
                            DocState::Available(&children.$idx)
                        }
                        DocState::Unavailable => DocState::Unavailable,
                    };
                    docs.merge(self.children.$idx.doc_fragments(child, None));
                )+
                docs
            }
        }
    };
}

impl_composites!((P0, 0));
impl_composites!((P0, 0), (P1, 1));
impl_composites!((P0, 0), (P1, 1), (P2, 2));
impl_composites!((P0, 0), (P1, 1), (P2, 2), (P3, 3));
impl_composites!((P0, 0), (P1, 1), (P2, 2), (P3, 3), (P4, 4));
impl_composites!((P0, 0), (P1, 1), (P2, 2), (P3, 3), (P4, 4), (P5, 5));
impl_composites!((P0, 0), (P1, 1), (P2, 2), (P3, 3), (P4, 4), (P5, 5), (P6, 6));
impl_composites!(
    (P0, 0),
    (P1, 1),
    (P2, 2),
    (P3, 3),
    (P4, 4),
    (P5, 5),
    (P6, 6),
    (P7, 7)
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse, parse_async};
    use crate::primitive::{argument, command, constant, flag, option};
    use crate::test::assert_contains;
    use crate::value::{choices, from_str, string};
    use rand::seq::SliceRandom;

    fn context<S>(tokens: &[&str], state: S) -> ParseContext<S> {
        ParseContext::new(tokens.iter().map(|token| token.to_string()).collect(), state)
    }

    #[test]
    fn object_routes_by_priority() {
        // Setup
        let parser = object((
            command("run", flag(["--fast"]).with_default(false)),
            option(["--port"], from_str::<u16>()).with_default(0),
            argument("FILE", string()),
        ));

        // Execute
        let (fast, port, file) =
            parse(&parser, ["data.txt", "--port", "9", "run", "--fast"]).unwrap();

        // Verify
        assert!(fast);
        assert_eq!(port, 9);
        assert_eq!(file, "data.txt");
    }

    #[test]
    fn object_declaration_order_does_not_change_routing() {
        // Setup
        let parser = object((
            argument("FILE", string()),
            option(["--port"], from_str::<u16>()).with_default(0),
            command("run", flag(["--fast"]).with_default(false)),
        ));

        // Execute
        let (file, port, fast) =
            parse(&parser, ["data.txt", "--port", "9", "run", "--fast"]).unwrap();

        // Verify
        assert!(fast);
        assert_eq!(port, 9);
        assert_eq!(file, "data.txt");
    }

    #[test]
    fn object_order_insensitive_for_options() {
        // Setup
        let parser = object((
            flag(["--force"]).with_default(false),
            option(["--port"], from_str::<u16>()).with_default(0),
            option(["--level"], string()).with_default("info".to_string()),
        ));
        let mut pieces = vec![
            vec!["--force".to_string()],
            vec!["--port".to_string(), "9".to_string()],
            vec!["--level".to_string(), "debug".to_string()],
        ];

        // Execute & verify: every interleaving parses to the same record.
        let mut generator = rand::thread_rng();
        for _ in 0..10 {
            pieces.shuffle(&mut generator);
            let buffer: Vec<String> = pieces.iter().flatten().cloned().collect();
            assert_eq!(
                parse(&parser, buffer).unwrap(),
                (true, 9, "debug".to_string())
            );
        }
    }

    #[test]
    fn object_ties_break_by_declaration() {
        // Setup
        let parser = object((
            flag(["-a"]).with_default(false),
            flag(["-a"]).with_default(false),
        ));

        // Execute & verify
        assert_eq!(parse(&parser, ["-a"]).unwrap(), (true, false));
    }

    #[test]
    fn object_unmatched_token_suggests_names() {
        // Setup: `--forc` sits within distance of both names, nearest first.
        let parser = object((
            flag(["--force"]),
            option(["--port"], from_str::<u16>()).with_default(0),
        ));

        // Execute
        let error = parse(&parser, ["--forc"]).unwrap_err();

        // Verify
        assert_contains!(error.to_string(), "unexpected token `--forc`");
        assert_contains!(error.to_string(), "did you mean `--force`, `--port`?");
    }

    #[test]
    fn object_unmatched_token_skips_distant_names() {
        // Setup
        let parser = object((
            flag(["--force"]),
            flag(["--verbose"]).with_default(false),
        ));

        // Execute
        let error = parse(&parser, ["--forc"]).unwrap_err();

        // Verify
        assert_contains!(error.to_string(), "did you mean `--force`?");
        assert!(!error.to_string().contains("--verbose"));
    }

    #[test]
    fn object_custom_unmatched_message() {
        // Setup
        let parser = object((flag(["--force"]),))
            .error(ErrorKind::UnmatchedToken, "no such setting");

        // Execute
        let error = parse(&parser, ["--nope"]).unwrap_err();

        // Verify
        assert_contains!(error.to_string(), "no such setting");
    }

    #[test]
    fn object_prefers_specific_failure() {
        // Setup
        let parser = object((
            flag(["--force"]).with_default(false),
            option(["--port"], from_str::<u16>()),
        ));

        // Execute
        let error = parse(&parser, ["--port", "eight"]).unwrap_err();

        // Verify
        assert_contains!(error.to_string(), "invalid value for `--port`");
    }

    #[test]
    fn object_keeps_terminated_refusal() {
        // Setup
        let parser = object((flag(["--force"]),));

        // Execute
        let error = parse(&parser, ["--", "--force"]).unwrap_err();

        // Verify
        assert_contains!(error.to_string(), "cannot appear after");
    }

    #[test]
    fn object_completes_in_declaration_order() {
        // Setup
        let parser = object((argument("SRC", string()), argument("DST", string())));

        // Execute
        let error = parse(&parser, Vec::<String>::new()).unwrap_err();

        // Verify: the first unfinished child reports.
        assert_contains!(error.to_string(), "missing required argument SRC");
    }

    #[test]
    fn object_completes_without_tokens() {
        // Setup
        let parser = object((constant("v2"), flag(["--wide"]).with_default(false)));

        // Execute & verify
        assert_eq!(parse(&parser, Vec::<String>::new()).unwrap(), ("v2", false));
    }

    #[test]
    fn object_suggests_by_priority() {
        // Setup
        let parser = object((
            argument("WORD", choices(["pub"])),
            command("push", constant(())),
            command("pull", constant(())),
        ));

        // Execute
        let suggestions = parser.suggest(&context(&[], parser.initial_state()), "pu");

        // Verify: commands outrank the positional's value pool.
        assert_eq!(
            suggestions,
            vec![
                Suggestion::literal("push"),
                Suggestion::literal("pull"),
                Suggestion::literal("pub"),
            ]
        );
    }

    #[test]
    fn object_docs_merge_children() {
        // Setup
        let parser = object((
            flag(["--force"]).help("Skip safety checks"),
            argument("REMOTE", string()).help("Repository to push to"),
        ))
        .help("Push options");

        // Execute
        let docs = parser.doc_fragments(DocState::Unavailable, None);

        // Verify
        assert_eq!(
            docs.description.as_ref().map(|d| d.to_string()),
            Some("Push options".to_string())
        );
        let entries = docs.into_entries();
        assert_eq!(entries.len(), 2);
        assert_matches!(&entries[0].term, UsageTerm::Option { .. });
        assert_matches!(&entries[1].term, UsageTerm::Argument { .. });
    }

    #[test]
    fn object_wide_arity() {
        // Setup
        let parser = object((
            flag(["-a"]).with_default(false),
            flag(["-b"]).with_default(false),
            flag(["-c"]).with_default(false),
            flag(["-d"]).with_default(false),
            flag(["-e"]).with_default(false),
        ));

        // Execute & verify
        assert_eq!(
            parse(&parser, ["-c", "-a"]).unwrap(),
            (true, false, true, false, false)
        );
    }

    #[test]
    fn tuple_sequences_in_order() {
        // Setup
        let parser = tuple((argument("SRC", string()), argument("DST", string())));

        // Execute & verify
        assert_eq!(
            parse(&parser, ["a.txt", "b.txt"]).unwrap(),
            ("a.txt".to_string(), "b.txt".to_string())
        );
    }

    #[test]
    fn tuple_slot_survives_interleaved_option() {
        // Setup: the option token passes over the sequence without
        // abandoning the DST slot.
        let parser = object((
            tuple((argument("SRC", string()), argument("DST", string()))),
            flag(["--force"]).with_default(false),
        ));

        // Execute
        let ((src, dst), force) = parse(&parser, ["a.txt", "--force", "b.txt"]).unwrap();

        // Verify
        assert!(force);
        assert_eq!(src, "a.txt");
        assert_eq!(dst, "b.txt");
    }

    #[test]
    fn tuple_hard_failure_propagates() {
        // Setup
        let parser = tuple((argument("COUNT", from_str::<u8>()), argument("NAME", string())));

        // Execute
        let error = parse(&parser, ["300", "x"]).unwrap_err();

        // Verify
        assert_contains!(error.to_string(), "invalid value for COUNT");
    }

    #[test]
    fn tuple_completes_unvisited_slots() {
        // Setup
        let parser = tuple((argument("NAME", string()).optional(), constant(1)));

        // Execute & verify
        assert_eq!(parse(&parser, Vec::<String>::new()).unwrap(), (None, 1));
    }

    #[test]
    fn tuple_suggest_cascades_past_closeable_slots() {
        // Setup
        let parser = tuple((
            argument("FIRST", choices(["alpha"])).optional(),
            argument("SECOND", choices(["beta"])),
        ));

        // Execute
        let suggestions = parser.suggest(&context(&[], parser.initial_state()), "");

        // Verify
        assert_eq!(
            suggestions,
            vec![Suggestion::literal("alpha"), Suggestion::literal("beta")]
        );
    }

    #[test]
    fn tuple_suggest_stops_at_required_slot() {
        // Setup
        let parser = tuple((
            argument("FIRST", choices(["alpha"])),
            argument("SECOND", choices(["beta"])),
        ));

        // Execute
        let suggestions = parser.suggest(&context(&[], parser.initial_state()), "");

        // Verify
        assert_eq!(suggestions, vec![Suggestion::literal("alpha")]);
    }

    #[test]
    fn composite_priority_is_maximum_of_children() {
        // Setup & execute & verify
        assert_eq!(
            object((flag(["-v"]), argument("FILE", string()))).priority(),
            Priority::OPTION
        );
        assert_eq!(
            tuple((argument("FILE", string()), constant(0))).priority(),
            Priority::ARGUMENT
        );
    }

    #[test]
    fn composite_mode_stays_sync_for_sync_children() {
        // Setup & execute & verify
        assert_eq!(
            object((flag(["-v"]), argument("FILE", string()))).mode(),
            Mode::Sync
        );
    }

    #[tokio::test]
    async fn object_parse_async_matches_sync() {
        // Setup
        let parser = object((
            flag(["--force"]).with_default(false),
            argument("FILE", string()),
        ));

        // Execute
        let record = parse_async(&parser, ["--force", "a.txt"]).await.unwrap();

        // Verify
        assert_eq!(record, (true, "a.txt".to_string()));
    }

    #[tokio::test]
    async fn tuple_parse_async_matches_sync() {
        // Setup
        let parser = tuple((argument("SRC", string()), argument("DST", string())));

        // Execute
        let record = parse_async(&parser, ["a", "b"]).await.unwrap();

        // Verify
        assert_eq!(record, ("a".to_string(), "b".to_string()));
    }
}
