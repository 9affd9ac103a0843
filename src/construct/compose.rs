//! Concatenating two record parsers into one flat record.
//!
//! [`merge`] interleaves two records as if their children had been declared
//! in a single [`object`](super::object); [`concat`] runs them as a
//! front-to-back sequence.  Either way the value tuples concatenate, via
//! [`TupleConcat`], so downstream code sees one flat tuple.

use crate::error::{ErrorHook, ErrorKind, ErrorOverrides, Failure};
use crate::message::Message;
use crate::model::{BoxFuture, Mode, Priority};
use crate::parse::{end_of_input, Outcome, ParseContext, Parser};
use crate::primitive::decline;
use crate::suggest::Suggestion;
use crate::usage::{DocFragments, DocState, UsageTerm};

use super::{merge_refusals, unmatched};

/// Tuple-level concatenation: `(A, B)` + `(C,)` is `(A, B, C)`.
pub trait TupleConcat<B> {
    /// The concatenated tuple type.
    type Output;

    /// Concatenate, preserving element order.
    fn concat_tuples(self, other: B) -> Self::Output;
}

macro_rules! impl_tuple_concat {
    (($($a:ident),+), ($($b:ident),+)) => {
        impl<$($a,)+ $($b,)+> TupleConcat<($($b,)+)> for ($($a,)+) {
            type Output = ($($a,)+ $($b,)+);

            #[allow(non_snake_case)]
            fn concat_tuples(self, other: ($($b,)+)) -> Self::Output {
                let ($($a,)+) = self;
                let ($($b,)+) = other;
                ($($a,)+ $($b,)+)
            }
        }
    };
}

macro_rules! impl_tuple_concat_against {
    (($($a:ident),+)) => {
        impl_tuple_concat!(($($a),+), (B1));
        impl_tuple_concat!(($($a),+), (B1, B2));
        impl_tuple_concat!(($($a),+), (B1, B2, B3));
        impl_tuple_concat!(($($a),+), (B1, B2, B3, B4));
        impl_tuple_concat!(($($a),+), (B1, B2, B3, B4, B5));
        impl_tuple_concat!(($($a),+), (B1, B2, B3, B4, B5, B6));
    };
}

impl_tuple_concat_against!((A1));
impl_tuple_concat_against!((A1, A2));
impl_tuple_concat_against!((A1, A2, A3));
impl_tuple_concat_against!((A1, A2, A3, A4));
impl_tuple_concat_against!((A1, A2, A3, A4, A5));
impl_tuple_concat_against!((A1, A2, A3, A4, A5, A6));

/// Interleaving concatenation of two records; see [`merge`].
pub struct Merge<A, B> {
    first: A,
    second: B,
    overrides: ErrorOverrides,
}

impl<A, B> Merge<A, B> {
    /// Override the stock message for failures of `kind` raised at this
    /// record's boundary.
    pub fn error(mut self, kind: ErrorKind, hook: impl Into<ErrorHook>) -> Self {
        self.overrides.insert(kind, hook.into());
        self
    }
}

/// Combine two record parsers into one record, interleaving freely.
///
/// Tokens route between the halves by priority, exactly as if all children
/// had been declared in a single [`object`](super::object); the completed
/// value is the two tuples concatenated.  This is the tool for sharing a
/// block of common options across several commands.
///
/// ```
/// use argot::{flag, from_str, merge, object, option, parse, string, Parser};
///
/// let connection = object((
///     option(["--host"], string()),
///     option(["--port"], from_str::<u16>()),
/// ));
/// let behavior = object((flag(["--verbose"]).with_default(false),));
///
/// let parser = merge(connection, behavior);
/// let (host, port, verbose) =
///     parse(&parser, ["--port", "80", "--verbose", "--host", "db"]).unwrap();
/// assert_eq!(host, "db");
/// assert_eq!(port, 80);
/// assert!(verbose);
/// ```
pub fn merge<A, B>(first: A, second: B) -> Merge<A, B>
where
    A: Parser,
    B: Parser,
    A::Value: TupleConcat<B::Value>,
{
    Merge {
        first,
        second,
        overrides: ErrorOverrides::default(),
    }
}

impl<A, B> Parser for Merge<A, B>
where
    A: Parser,
    B: Parser,
    A::Value: TupleConcat<B::Value>,
{
    type State = (A::State, B::State);
    type Value = <A::Value as TupleConcat<B::Value>>::Output;

    fn priority(&self) -> Priority {
        self.first.priority().max(self.second.priority())
    }

    fn mode(&self) -> Mode {
        self.first.mode().join(self.second.mode())
    }

    fn usage(&self) -> Vec<UsageTerm> {
        let mut terms = self.first.usage();
        terms.extend(self.second.usage());
        terms
    }

    fn initial_state(&self) -> Self::State {
        (self.first.initial_state(), self.second.initial_state())
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        let head = match context.head() {
            Some(head) => head.to_string(),
            None => return Err(end_of_input(Message::from("nothing left to parse"))),
        };
        let terminated = context.options_terminated();
        let (buffer, state, _) = context.into_parts();

        // Both halves speculate on the same head; the step commits to the
        // half whose claiming child carries the higher priority, first half
        // on ties.  Arbitrating per child keeps routing identical to a
        // single record holding all children.
        let first_attempt = ParseContext::from_parts(buffer.clone(), state.0.clone(), terminated);
        let first_outcome = self.first.parse(first_attempt).map(|next| {
            let claim = next.claimant().unwrap_or_else(|| self.first.priority());
            (claim, next.map_state(|child| (child, state.1.clone())))
        });
        let second_attempt = ParseContext::from_parts(buffer.clone(), state.1.clone(), terminated);
        let second_outcome = self.second.parse(second_attempt).map(|next| {
            let claim = next.claimant().unwrap_or_else(|| self.second.priority());
            (claim, next.map_state(|child| (state.0.clone(), child)))
        });

        match (first_outcome, second_outcome) {
            (Ok((first_claim, next)), Ok((second_claim, contender))) => {
                if second_claim > first_claim {
                    Ok(contender)
                } else {
                    Ok(next)
                }
            }
            (Ok((_, next)), Err(_)) | (Err(_), Ok((_, next))) => Ok(next),
            (Err(first_failure), Err(second_failure)) => {
                let best = merge_refusals(Some(first_failure), second_failure);
                Err(unmatched(&self.overrides, &self.usage(), &head, best))
            }
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
            let head = match context.head() {
                Some(head) => head.to_string(),
                None => return Err(end_of_input(Message::from("nothing left to parse"))),
            };
            let terminated = context.options_terminated();
            let (buffer, state, _) = context.into_parts();

            let first_attempt =
                ParseContext::from_parts(buffer.clone(), state.0.clone(), terminated);
            let first_outcome = self.first.parse_async(first_attempt).await.map(|next| {
                let claim = next.claimant().unwrap_or_else(|| self.first.priority());
                (claim, next.map_state(|child| (child, state.1.clone())))
            });
            let second_attempt =
                ParseContext::from_parts(buffer.clone(), state.1.clone(), terminated);
            let second_outcome = self.second.parse_async(second_attempt).await.map(|next| {
                let claim = next.claimant().unwrap_or_else(|| self.second.priority());
                (claim, next.map_state(|child| (state.0.clone(), child)))
            });

            match (first_outcome, second_outcome) {
                (Ok((first_claim, next)), Ok((second_claim, contender))) => {
                    if second_claim > first_claim {
                        Ok(contender)
                    } else {
                        Ok(next)
                    }
                }
                (Ok((_, next)), Err(_)) | (Err(_), Ok((_, next))) => Ok(next),
                (Err(first_failure), Err(second_failure)) => {
                    let best = merge_refusals(Some(first_failure), second_failure);
                    Err(unmatched(&self.overrides, &self.usage(), &head, best))
                }
            }
        })
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        let first = self.first.complete(state.0)?;
        let second = self.second.complete(state.1)?;
        Ok(first.concat_tuples(second))
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        let mut candidates = vec![(self.first.priority(), 0), (self.second.priority(), 1)];
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        let mut suggestions = Vec::new();
        for (_, index) in candidates {
            match index {
                0 => {
                    let view = context.with_state(context.state().0.clone());
                    suggestions.extend(self.first.suggest(&view, prefix));
                }
                1 => {
                    let view = context.with_state(context.state().1.clone());
                    suggestions.extend(self.second.suggest(&view, prefix));
                }
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
            let mut candidates = vec![(self.first.priority(), 0), (self.second.priority(), 1)];
            candidates.sort_by(|a, b| b.0.cmp(&a.0));

            let mut suggestions = Vec::new();
            for (_, index) in candidates {
                match index {
                    0 => {
                        let view = context.with_state(context.state().0.clone());
                        suggestions.extend(self.first.suggest_async(&view, prefix).await);
                    }
                    1 => {
                        let view = context.with_state(context.state().1.clone());
                        suggestions.extend(self.second.suggest_async(&view, prefix).await);
                    }
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
        let (first_availability, second_availability) = match availability {
            DocState::Available(state) => {
                (DocState::Available(&state.0), DocState::Available(&state.1))
            }
            DocState::Unavailable => (DocState::Unavailable, DocState::Unavailable),
        };
        let mut docs = self.first.doc_fragments(first_availability, None);
        docs.merge(self.second.doc_fragments(second_availability, None));
        docs
    }
}

/// Front-to-back concatenation of two records; see [`concat`].
pub struct Concat<A, B> {
    first: A,
    second: B,
}

/// Combine two record parsers into one sequence: the first half must
/// finish claiming tokens before the second half starts.
///
/// The completed value is the two tuples concatenated, as with
/// [`merge`], but ordering is enforced rather than interleaved.
///
/// ```
/// use argot::{argument, concat, parse, string, tuple};
///
/// let sources = tuple((argument("SRC", string()),));
/// let target = tuple((argument("DST", string()),));
///
/// let parser = concat(sources, target);
/// let (src, dst) = parse(&parser, ["a.txt", "b.txt"]).unwrap();
/// assert_eq!(src, "a.txt");
/// assert_eq!(dst, "b.txt");
/// ```
pub fn concat<A, B>(first: A, second: B) -> Concat<A, B>
where
    A: Parser,
    B: Parser,
    A::Value: TupleConcat<B::Value>,
{
    Concat { first, second }
}

impl<A, B> Parser for Concat<A, B>
where
    A: Parser,
    B: Parser,
    A::Value: TupleConcat<B::Value>,
{
    type State = (usize, (A::State, B::State));
    type Value = <A::Value as TupleConcat<B::Value>>::Output;

    fn priority(&self) -> Priority {
        self.first.priority().max(self.second.priority())
    }

    fn mode(&self) -> Mode {
        self.first.mode().join(self.second.mode())
    }

    fn usage(&self) -> Vec<UsageTerm> {
        let mut terms = self.first.usage();
        terms.extend(self.second.usage());
        terms
    }

    fn initial_state(&self) -> Self::State {
        (0, (self.first.initial_state(), self.second.initial_state()))
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        let head = match context.head() {
            Some(head) => head.to_string(),
            None => return Err(end_of_input(Message::from("nothing left to parse"))),
        };
        let terminated = context.options_terminated();
        let (buffer, state, _) = context.into_parts();
        let (cursor, (first_state, second_state)) = state;

        let mut index = cursor;
        while index < 2 {
            let outcome = match index {
                0 => {
                    let attempt =
                        ParseContext::from_parts(buffer.clone(), first_state.clone(), terminated);
                    self.first.parse(attempt).map(|next| {
                        next.map_state(|child| (index, (child, second_state.clone())))
                            .claimed_by(self.priority())
                    })
                }
                1 => {
                    let attempt =
                        ParseContext::from_parts(buffer.clone(), second_state.clone(), terminated);
                    self.second.parse(attempt).map(|next| {
                        next.map_state(|child| (index, (first_state.clone(), child)))
                            .claimed_by(self.priority())
                    })
                }
                _ => unreachable!("internal error - sequence child index out of range"),
            };
            match outcome {
                Ok(next) => return Ok(next),
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
                None => return Err(end_of_input(Message::from("nothing left to parse"))),
            };
            let terminated = context.options_terminated();
            let (buffer, state, _) = context.into_parts();
            let (cursor, (first_state, second_state)) = state;

            let mut index = cursor;
            while index < 2 {
                let outcome = match index {
                    0 => {
                        let attempt = ParseContext::from_parts(
                            buffer.clone(),
                            first_state.clone(),
                            terminated,
                        );
                        self.first.parse_async(attempt).await.map(|next| {
                            next.map_state(|child| (index, (child, second_state.clone())))
                                .claimed_by(self.priority())
                        })
                    }
                    1 => {
                        let attempt = ParseContext::from_parts(
                            buffer.clone(),
                            second_state.clone(),
                            terminated,
                        );
                        self.second.parse_async(attempt).await.map(|next| {
                            next.map_state(|child| (index, (first_state.clone(), child)))
                                .claimed_by(self.priority())
                        })
                    }
                    _ => unreachable!("internal error - sequence child index out of range"),
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
        let (_, (first_state, second_state)) = state;
        let first = self.first.complete(first_state)?;
        let second = self.second.complete(second_state)?;
        Ok(first.concat_tuples(second))
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        let (cursor, (first_state, second_state)) = context.state();
        let mut suggestions = Vec::new();
        if *cursor == 0 {
            let view = context.with_state(first_state.clone());
            suggestions.extend(self.first.suggest(&view, prefix));
            if self.first.complete(first_state.clone()).is_err() {
                return suggestions;
            }
        }
        let view = context.with_state(second_state.clone());
        suggestions.extend(self.second.suggest(&view, prefix));
        suggestions
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        Box::pin(async move {
            let (cursor, (first_state, second_state)) = context.state();
            let mut suggestions = Vec::new();
            if *cursor == 0 {
                let view = context.with_state(first_state.clone());
                suggestions.extend(self.first.suggest_async(&view, prefix).await);
                if self.first.complete(first_state.clone()).is_err() {
                    return suggestions;
                }
            }
            let view = context.with_state(second_state.clone());
            suggestions.extend(self.second.suggest_async(&view, prefix).await);
            suggestions
        })
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        _default: Option<Message>,
    ) -> DocFragments {
        let (first_availability, second_availability) = match availability {
            DocState::Available((_, children)) => (
                DocState::Available(&children.0),
                DocState::Available(&children.1),
            ),
            DocState::Unavailable => (DocState::Unavailable, DocState::Unavailable),
        };
        let mut docs = self.first.doc_fragments(first_availability, None);
        docs.merge(self.second.doc_fragments(second_availability, None));
        docs
    }
}
