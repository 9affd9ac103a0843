//! Alternation between two parsers of the same value type.
//!
//! [`or`] commits to whichever branch accepts a token first.  That is cheap
//! but greedy: `or(flag(..), tuple(..))` locks in as soon as one side
//! claims.  [`longest_match`] instead speculates both branches over the
//! remaining tokens and commits to the one that gets further, which is what
//! git-style verb pairs (`stash` / `stash pop`) need.

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::error::{ErrorHook, ErrorKind, ErrorOverrides, Failure};
use crate::message::Message;
use crate::model::{BoxFuture, Mode, Priority};
use crate::parse::{
    end_of_input, run_to_exhaustion, run_to_exhaustion_async, Exhaustion, Outcome, ParseContext,
    Parser,
};
use crate::suggest::Suggestion;
use crate::token::{classify, TokenShape};
use crate::usage::{DocFragments, DocState, UsageTerm};

use super::{merge_refusals, unmatched};

/// Which branch an alternation has committed to, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum AltState<A, B> {
    /// Neither branch has accepted a token yet.
    Undecided,
    /// The first branch owns the rest of the invocation.
    First(A),
    /// The second branch owns the rest of the invocation.
    Second(B),
}

/// First-acceptance alternation; see [`or`].
pub struct Or<A, B> {
    first: A,
    second: B,
    overrides: ErrorOverrides,
}

impl<A, B> Or<A, B> {
    /// Override the stock message for failures of `kind` raised while both
    /// branches are still in play.
    pub fn error(mut self, kind: ErrorKind, hook: impl Into<ErrorHook>) -> Self {
        self.overrides.insert(kind, hook.into());
        self
    }
}

/// Accept exactly one of two shapes, committing to whichever claims a token
/// first (the first branch gets the first try).
///
/// Once a branch commits, the other never runs again; completing with
/// neither committed falls back to the first branch's own completion.
///
/// ```
/// use argot::{argument, choices, option, or, parse};
///
/// let parser = or(
///     option(["--color"], choices(["red", "green"])),
///     argument("COLOR", choices(["red", "green"])),
/// );
///
/// assert_eq!(parse(&parser, ["--color", "red"]).unwrap(), "red");
/// assert_eq!(parse(&parser, ["green"]).unwrap(), "green");
/// ```
pub fn or<A, B>(first: A, second: B) -> Or<A, B>
where
    A: Parser,
    B: Parser<Value = A::Value>,
{
    Or {
        first,
        second,
        overrides: ErrorOverrides::default(),
    }
}

impl<A, B> Parser for Or<A, B>
where
    A: Parser,
    B: Parser<Value = A::Value>,
{
    type State = AltState<A::State, B::State>;
    type Value = A::Value;

    fn priority(&self) -> Priority {
        self.first.priority().max(self.second.priority())
    }

    fn mode(&self) -> Mode {
        self.first.mode().join(self.second.mode())
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::Exclusive(vec![
            self.first.usage(),
            self.second.usage(),
        ])]
    }

    fn initial_state(&self) -> Self::State {
        AltState::Undecided
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        match context.state().clone() {
            AltState::Undecided => {
                let head = match context.head() {
                    Some(head) => head.to_string(),
                    None => return Err(end_of_input(Message::from("nothing left to parse"))),
                };
                // A bare terminator belongs to neither branch; accepting it
                // at this level keeps the alternation undecided.
                if !context.options_terminated() {
                    if let TokenShape::Terminator = classify(&head) {
                        return Ok(context.accept_terminator());
                    }
                }
                // Whichever branch claims, the step reports the
                // alternation's whole priority; the branches are not
                // children of any enclosing record.
                let first_failure = match self
                    .first
                    .parse(context.with_state(self.first.initial_state()))
                {
                    Ok(next) => {
                        return Ok(next.map_state(AltState::First).claimed_by(self.priority()))
                    }
                    Err(failure) => failure,
                };
                let second_failure = match self
                    .second
                    .parse(context.with_state(self.second.initial_state()))
                {
                    Ok(next) => {
                        return Ok(next.map_state(AltState::Second).claimed_by(self.priority()))
                    }
                    Err(failure) => failure,
                };
                let best = merge_refusals(Some(first_failure), second_failure);
                Err(unmatched(&self.overrides, &self.usage(), &head, best))
            }
            AltState::First(state) => self
                .first
                .parse(context.with_state(state))
                .map(|next| next.map_state(AltState::First).claimed_by(self.priority())),
            AltState::Second(state) => self
                .second
                .parse(context.with_state(state))
                .map(|next| next.map_state(AltState::Second).claimed_by(self.priority())),
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
            match context.state().clone() {
                AltState::Undecided => {
                    let head = match context.head() {
                        Some(head) => head.to_string(),
                        None => {
                            return Err(end_of_input(Message::from("nothing left to parse")))
                        }
                    };
                    if !context.options_terminated() {
                        if let TokenShape::Terminator = classify(&head) {
                            return Ok(context.accept_terminator());
                        }
                    }
                    let attempt = context.with_state(self.first.initial_state());
                    let first_failure = match self.first.parse_async(attempt).await {
                        Ok(next) => {
                            return Ok(
                                next.map_state(AltState::First).claimed_by(self.priority())
                            )
                        }
                        Err(failure) => failure,
                    };
                    let attempt = context.with_state(self.second.initial_state());
                    let second_failure = match self.second.parse_async(attempt).await {
                        Ok(next) => {
                            return Ok(
                                next.map_state(AltState::Second).claimed_by(self.priority())
                            )
                        }
                        Err(failure) => failure,
                    };
                    let best = merge_refusals(Some(first_failure), second_failure);
                    Err(unmatched(&self.overrides, &self.usage(), &head, best))
                }
                AltState::First(state) => self
                    .first
                    .parse_async(context.with_state(state))
                    .await
                    .map(|next| next.map_state(AltState::First).claimed_by(self.priority())),
                AltState::Second(state) => self
                    .second
                    .parse_async(context.with_state(state))
                    .await
                    .map(|next| next.map_state(AltState::Second).claimed_by(self.priority())),
            }
        })
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        match state {
            AltState::Undecided => match self.first.complete(self.first.initial_state()) {
                Ok(value) => Ok(value),
                Err(first_failure) => {
                    match self.second.complete(self.second.initial_state()) {
                        Ok(value) => Ok(value),
                        Err(_) => Err(first_failure),
                    }
                }
            },
            AltState::First(state) => self.first.complete(state),
            AltState::Second(state) => self.second.complete(state),
        }
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        match context.state() {
            AltState::Undecided => {
                let mut suggestions = self
                    .first
                    .suggest(&context.with_state(self.first.initial_state()), prefix);
                suggestions.extend(
                    self.second
                        .suggest(&context.with_state(self.second.initial_state()), prefix),
                );
                suggestions
            }
            AltState::First(state) => self
                .first
                .suggest(&context.with_state(state.clone()), prefix),
            AltState::Second(state) => self
                .second
                .suggest(&context.with_state(state.clone()), prefix),
        }
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        Box::pin(async move {
            match context.state() {
                AltState::Undecided => {
                    let view = context.with_state(self.first.initial_state());
                    let mut suggestions = self.first.suggest_async(&view, prefix).await;
                    let view = context.with_state(self.second.initial_state());
                    suggestions.extend(self.second.suggest_async(&view, prefix).await);
                    suggestions
                }
                AltState::First(state) => {
                    let view = context.with_state(state.clone());
                    self.first.suggest_async(&view, prefix).await
                }
                AltState::Second(state) => {
                    let view = context.with_state(state.clone());
                    self.second.suggest_async(&view, prefix).await
                }
            }
        })
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        let (first_availability, second_availability) = match availability {
            DocState::Available(AltState::First(state)) => {
                (DocState::Available(state), DocState::Unavailable)
            }
            DocState::Available(AltState::Second(state)) => {
                (DocState::Unavailable, DocState::Available(state))
            }
            _ => (DocState::Unavailable, DocState::Unavailable),
        };
        let mut docs = self.first.doc_fragments(first_availability, default.clone());
        docs.merge(self.second.doc_fragments(second_availability, default));
        docs
    }
}

/// Exhaustive-lookahead alternation; see [`longest_match`].
pub struct LongestMatch<A, B> {
    first: A,
    second: B,
    overrides: ErrorOverrides,
}

impl<A, B> LongestMatch<A, B> {
    /// Override the stock message for failures of `kind` raised while both
    /// branches are still in play.
    pub fn error(mut self, kind: ErrorKind, hook: impl Into<ErrorHook>) -> Self {
        self.overrides.insert(kind, hook.into());
        self
    }
}

/// Accept exactly one of two shapes, committing to whichever parses further
/// through the remaining tokens (ties go to the first branch).
///
/// Both branches are speculated to exhaustion before anything commits, so
/// overlapping prefixes resolve correctly:
///
/// ```
/// use argot::{command, constant, longest_match, parse};
///
/// let parser = longest_match(
///     command("stash", constant("stash")),
///     command("stash", command("pop", constant("stash-pop"))),
/// );
///
/// assert_eq!(parse(&parser, ["stash"]).unwrap(), "stash");
/// assert_eq!(parse(&parser, ["stash", "pop"]).unwrap(), "stash-pop");
/// ```
pub fn longest_match<A, B>(first: A, second: B) -> LongestMatch<A, B>
where
    A: Parser,
    B: Parser<Value = A::Value>,
{
    LongestMatch {
        first,
        second,
        overrides: ErrorOverrides::default(),
    }
}

impl<A, B> LongestMatch<A, B>
where
    A: Parser,
    B: Parser<Value = A::Value>,
{
    /// Commit to the further-reaching viable run, or report the
    /// further-reaching failure.
    fn choose(
        &self,
        head: &str,
        first_run: Exhaustion<A::State>,
        second_run: Exhaustion<B::State>,
    ) -> Outcome<AltState<A::State, B::State>> {
        let first_viable = !first_run.hard && first_run.consumed > 0;
        let second_viable = !second_run.hard && second_run.consumed > 0;
        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "ranking runs: first consumed={} viable={first_viable}, second consumed={} viable={second_viable}",
                first_run.consumed, second_run.consumed,
            );
        }

        if first_viable && (!second_viable || first_run.consumed >= second_run.consumed) {
            return Ok(first_run
                .context
                .map_state(AltState::First)
                .claimed_by(self.priority()));
        }
        if second_viable {
            return Ok(second_run
                .context
                .map_state(AltState::Second)
                .claimed_by(self.priority()));
        }

        let first_reach = first_run.reach();
        let second_reach = second_run.reach();
        let mut best = None;
        if let Some(mut failure) = first_run.failure {
            failure.consumed = first_reach;
            best = merge_refusals(best, failure);
        }
        if let Some(mut failure) = second_run.failure {
            failure.consumed = second_reach;
            best = merge_refusals(best, failure);
        }
        Err(unmatched(&self.overrides, &self.usage(), head, best))
    }
}

impl<A, B> Parser for LongestMatch<A, B>
where
    A: Parser,
    B: Parser<Value = A::Value>,
{
    type State = AltState<A::State, B::State>;
    type Value = A::Value;

    fn priority(&self) -> Priority {
        self.first.priority().max(self.second.priority())
    }

    fn mode(&self) -> Mode {
        self.first.mode().join(self.second.mode())
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::Exclusive(vec![
            self.first.usage(),
            self.second.usage(),
        ])]
    }

    fn initial_state(&self) -> Self::State {
        AltState::Undecided
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        match context.state().clone() {
            AltState::Undecided => {
                let head = match context.head() {
                    Some(head) => head.to_string(),
                    None => return Err(end_of_input(Message::from("nothing left to parse"))),
                };
                let first_run = run_to_exhaustion(
                    &self.first,
                    context.with_state(self.first.initial_state()),
                );
                let second_run = run_to_exhaustion(
                    &self.second,
                    context.with_state(self.second.initial_state()),
                );
                self.choose(&head, first_run, second_run)
            }
            AltState::First(state) => self
                .first
                .parse(context.with_state(state))
                .map(|next| next.map_state(AltState::First).claimed_by(self.priority())),
            AltState::Second(state) => self
                .second
                .parse(context.with_state(state))
                .map(|next| next.map_state(AltState::Second).claimed_by(self.priority())),
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
            match context.state().clone() {
                AltState::Undecided => {
                    let head = match context.head() {
                        Some(head) => head.to_string(),
                        None => {
                            return Err(end_of_input(Message::from("nothing left to parse")))
                        }
                    };
                    let first_run = run_to_exhaustion_async(
                        &self.first,
                        context.with_state(self.first.initial_state()),
                    )
                    .await;
                    let second_run = run_to_exhaustion_async(
                        &self.second,
                        context.with_state(self.second.initial_state()),
                    )
                    .await;
                    self.choose(&head, first_run, second_run)
                }
                AltState::First(state) => self
                    .first
                    .parse_async(context.with_state(state))
                    .await
                    .map(|next| next.map_state(AltState::First).claimed_by(self.priority())),
                AltState::Second(state) => self
                    .second
                    .parse_async(context.with_state(state))
                    .await
                    .map(|next| next.map_state(AltState::Second).claimed_by(self.priority())),
            }
        })
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        match state {
            AltState::Undecided => match self.first.complete(self.first.initial_state()) {
                Ok(value) => Ok(value),
                Err(first_failure) => {
                    match self.second.complete(self.second.initial_state()) {
                        Ok(value) => Ok(value),
                        Err(_) => Err(first_failure),
                    }
                }
            },
            AltState::First(state) => self.first.complete(state),
            AltState::Second(state) => self.second.complete(state),
        }
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        match context.state() {
            AltState::Undecided => {
                let mut suggestions = self
                    .first
                    .suggest(&context.with_state(self.first.initial_state()), prefix);
                suggestions.extend(
                    self.second
                        .suggest(&context.with_state(self.second.initial_state()), prefix),
                );
                suggestions
            }
            AltState::First(state) => self
                .first
                .suggest(&context.with_state(state.clone()), prefix),
            AltState::Second(state) => self
                .second
                .suggest(&context.with_state(state.clone()), prefix),
        }
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        Box::pin(async move {
            match context.state() {
                AltState::Undecided => {
                    let view = context.with_state(self.first.initial_state());
                    let mut suggestions = self.first.suggest_async(&view, prefix).await;
                    let view = context.with_state(self.second.initial_state());
                    suggestions.extend(self.second.suggest_async(&view, prefix).await);
                    suggestions
                }
                AltState::First(state) => {
                    let view = context.with_state(state.clone());
                    self.first.suggest_async(&view, prefix).await
                }
                AltState::Second(state) => {
                    let view = context.with_state(state.clone());
                    self.second.suggest_async(&view, prefix).await
                }
            }
        })
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        let (first_availability, second_availability) = match availability {
            DocState::Available(AltState::First(state)) => {
                (DocState::Available(state), DocState::Unavailable)
            }
            DocState::Available(AltState::Second(state)) => {
                (DocState::Unavailable, DocState::Available(state))
            }
            _ => (DocState::Unavailable, DocState::Unavailable),
        };
        let mut docs = self.first.doc_fragments(first_availability, default.clone());
        docs.merge(self.second.doc_fragments(second_availability, default));
        docs
    }
}

/// Fold [`or`] over any number of branches, right associated.
///
/// `or!(a, b, c)` reads as `or(a, or(b, c))`, so earlier branches keep the
/// first claim on each token.
#[macro_export]
macro_rules! or {
    ($only:expr $(,)?) => {
        $only
    };
    ($first:expr, $($rest:expr),+ $(,)?) => {
        $crate::or($first, $crate::or!($($rest),+))
    };
}

/// Fold [`longest_match`] over any number of branches, right associated.
///
/// `longest_match!(a, b, c)` reads as `longest_match(a, longest_match(b, c))`.
#[macro_export]
macro_rules! longest_match {
    ($only:expr $(,)?) => {
        $only
    };
    ($first:expr, $($rest:expr),+ $(,)?) => {
        $crate::longest_match($first, $crate::longest_match!($($rest),+))
    };
}
