//! Wrappers that adjust what a parser completes to without touching how it
//! consumes tokens.
//!
//! Construct these through the [`Parser`] adapter methods ([`Parser::map`],
//! [`Parser::optional`], [`Parser::with_default`], [`Parser::multiple`])
//! rather than directly.

use crate::error::{ErrorKind, Failure};
use crate::message::Message;
use crate::model::{BoxFuture, Mode, Priority};
use crate::parse::{end_of_input, Outcome, ParseContext, Parser};
use crate::primitive::decline;
use crate::suggest::Suggestion;
use crate::usage::{usage_line, DocFragments, DocState, UsageTerm};

/// Transforms the completed value with a pure function.
///
/// Everything observable at parse time (priority, mode, suggestions, usage)
/// is the inner parser's.
pub struct Map<P, F> {
    inner: P,
    transform: F,
}

impl<P, F> Map<P, F> {
    pub(crate) fn new(inner: P, transform: F) -> Self {
        Map { inner, transform }
    }
}

impl<P, F, U> Parser for Map<P, F>
where
    P: Parser,
    F: Fn(P::Value) -> U,
{
    type State = P::State;
    type Value = U;

    fn priority(&self) -> Priority {
        self.inner.priority()
    }

    fn mode(&self) -> Mode {
        self.inner.mode()
    }

    fn usage(&self) -> Vec<UsageTerm> {
        self.inner.usage()
    }

    fn initial_state(&self) -> Self::State {
        self.inner.initial_state()
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        self.inner.parse(context)
    }

    fn parse_async<'f>(
        &'f self,
        context: ParseContext<Self::State>,
    ) -> BoxFuture<'f, Outcome<Self::State>>
    where
        Self::State: 'f,
    {
        self.inner.parse_async(context)
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        self.inner.complete(state).map(&self.transform)
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        self.inner.suggest(context, prefix)
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        self.inner.suggest_async(context, prefix)
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        self.inner.doc_fragments(availability, default)
    }
}

/// Observes absence as `None` instead of a missing-required failure.
///
/// Only the never-parsed case is masked.  A parse-time failure (malformed
/// value, duplicate) and a nonzero arity shortfall stay errors.
pub struct Optional<P> {
    inner: P,
}

impl<P> Optional<P> {
    pub(crate) fn new(inner: P) -> Self {
        Optional { inner }
    }
}

impl<P: Parser> Parser for Optional<P> {
    type State = P::State;
    type Value = Option<P::Value>;

    fn priority(&self) -> Priority {
        self.inner.priority()
    }

    fn mode(&self) -> Mode {
        self.inner.mode()
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::Optional(self.inner.usage())]
    }

    fn initial_state(&self) -> Self::State {
        self.inner.initial_state()
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        self.inner.parse(context)
    }

    fn parse_async<'f>(
        &'f self,
        context: ParseContext<Self::State>,
    ) -> BoxFuture<'f, Outcome<Self::State>>
    where
        Self::State: 'f,
    {
        self.inner.parse_async(context)
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        match self.inner.complete(state) {
            Ok(value) => Ok(Some(value)),
            Err(failure) if failure.kind == ErrorKind::MissingRequired => Ok(None),
            Err(failure) => Err(failure),
        }
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        self.inner.suggest(context, prefix)
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        self.inner.suggest_async(context, prefix)
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        self.inner.doc_fragments(availability, default)
    }
}

/// Substitutes a factory-made value when the inner parser never consumed
/// anything.
pub struct WithDefault<P: Parser> {
    inner: P,
    factory: Box<dyn Fn() -> P::Value>,
    message: Option<Message>,
}

impl<P: Parser> WithDefault<P> {
    pub(crate) fn new(inner: P, factory: Box<dyn Fn() -> P::Value>) -> Self {
        WithDefault {
            inner,
            factory,
            message: None,
        }
    }

    /// How to render the default in help documents.
    ///
    /// Nothing is rendered otherwise; the factory value itself never needs
    /// to be displayable.
    pub fn default_message(mut self, text: impl Into<Message>) -> Self {
        self.message = Some(text.into());
        self
    }
}

impl<P: Parser> Parser for WithDefault<P> {
    type State = P::State;
    type Value = P::Value;

    fn priority(&self) -> Priority {
        self.inner.priority()
    }

    fn mode(&self) -> Mode {
        self.inner.mode()
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::Optional(self.inner.usage())]
    }

    fn initial_state(&self) -> Self::State {
        self.inner.initial_state()
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        self.inner.parse(context)
    }

    fn parse_async<'f>(
        &'f self,
        context: ParseContext<Self::State>,
    ) -> BoxFuture<'f, Outcome<Self::State>>
    where
        Self::State: 'f,
    {
        self.inner.parse_async(context)
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        match self.inner.complete(state) {
            Ok(value) => Ok(value),
            Err(failure) if failure.kind == ErrorKind::MissingRequired => Ok((self.factory)()),
            Err(failure) => Err(failure),
        }
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        self.inner.suggest(context, prefix)
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        self.inner.suggest_async(context, prefix)
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        self.inner
            .doc_fragments(availability, self.message.clone().or(default))
    }
}

/// Accumulator for [`Multiple`]: closed-out values plus the entry still
/// being parsed, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipleState<S, V> {
    values: Vec<V>,
    current: Option<S>,
}

/// Runs the inner parser repeatedly, collecting every completed occurrence.
///
/// An occurrence closes out when the inner parser stops accepting tokens
/// and a fresh instance can take over; `-v -v -v` through a repeated flag
/// closes each occurrence on the duplicate refusal.  Without
/// [`Multiple::at_least`], absence completes to an empty `Vec`.
pub struct Multiple<P> {
    inner: P,
    min: usize,
    max: Option<usize>,
}

impl<P: Parser> Multiple<P> {
    pub(crate) fn new(inner: P) -> Self {
        Multiple {
            inner,
            min: 0,
            max: None,
        }
    }

    /// Require at least `min` occurrences at completion.
    ///
    /// A count of zero reports a missing-required failure, so
    /// [`Parser::optional`] still composes; a nonzero shortfall reports an
    /// arity violation.
    pub fn at_least(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    /// Stop claiming tokens after `max` occurrences.
    pub fn at_most(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    fn at_capacity(&self, count: usize) -> bool {
        self.max.map(|max| count >= max).unwrap_or(false)
    }

    fn shape(&self) -> String {
        usage_line(&self.inner.usage())
    }

    fn arity_failure(&self, count: usize) -> Option<Failure> {
        if count < self.min {
            if count == 0 {
                return Some(Failure {
                    kind: ErrorKind::MissingRequired,
                    message: Message::new().text("missing required").metavar(self.shape()),
                    consumed: 0,
                });
            }
            return Some(Failure {
                kind: ErrorKind::ArityViolation,
                message: Message::new()
                    .text("too few occurrences of")
                    .metavar(self.shape())
                    .text(format!(": expected at least {}, found {count}", self.min)),
                consumed: 0,
            });
        }
        if let Some(max) = self.max {
            if count > max {
                return Some(Failure {
                    kind: ErrorKind::ArityViolation,
                    message: Message::new()
                        .text("too many occurrences of")
                        .metavar(self.shape())
                        .text(format!(": expected at most {max}, found {count}")),
                    consumed: 0,
                });
            }
        }
        None
    }

    /// Rewrap an inner outcome; a terminator eaten by an untouched fresh
    /// instance leaves no entry in progress.
    fn wrap(
        next: ParseContext<P::State>,
        values: Vec<P::Value>,
        fresh: bool,
        was_terminated: bool,
    ) -> ParseContext<MultipleState<P::State, P::Value>> {
        let flipped = !was_terminated && next.options_terminated();
        next.map_state(|inner| MultipleState {
            values,
            current: if fresh && flipped { None } else { Some(inner) },
        })
    }
}

impl<P> Parser for Multiple<P>
where
    P: Parser,
    P::Value: Clone,
{
    type State = MultipleState<P::State, P::Value>;
    type Value = Vec<P::Value>;

    fn priority(&self) -> Priority {
        self.inner.priority()
    }

    fn mode(&self) -> Mode {
        self.inner.mode()
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::Repeated {
            terms: self.inner.usage(),
            min: self.min,
        }]
    }

    fn initial_state(&self) -> Self::State {
        MultipleState {
            values: Vec::new(),
            current: None,
        }
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        let head = match context.head() {
            Some(head) => head.to_string(),
            None => return Err(end_of_input(Message::from("nothing left to repeat"))),
        };
        let terminated = context.options_terminated();
        let (buffer, state, _) = context.into_parts();
        let MultipleState {
            mut values,
            current,
        } = state;

        if let Some(current_state) = current {
            let attempt =
                ParseContext::from_parts(buffer.clone(), current_state.clone(), terminated);
            return match self.inner.parse(attempt) {
                Ok(next) => Ok(Self::wrap(next, values, false, terminated)),
                Err(first) => {
                    // The entry in progress refused the token.  Close it out
                    // and retry with a fresh instance, unless that would
                    // overrun the cap.
                    if self.at_capacity(values.len() + 1) {
                        return Err(first);
                    }
                    match self.inner.complete(current_state) {
                        Ok(closed) => values.push(closed),
                        Err(_) => return Err(first),
                    }
                    let retry =
                        ParseContext::from_parts(buffer, self.inner.initial_state(), terminated);
                    match self.inner.parse(retry) {
                        Ok(next) => Ok(Self::wrap(next, values, true, terminated)),
                        Err(second) => Err(if second.consumed > first.consumed {
                            second
                        } else {
                            first
                        }),
                    }
                }
            };
        }

        if self.at_capacity(values.len()) {
            return Err(decline(&head));
        }
        let attempt = ParseContext::from_parts(buffer, self.inner.initial_state(), terminated);
        self.inner
            .parse(attempt)
            .map(|next| Self::wrap(next, values, true, terminated))
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
                None => return Err(end_of_input(Message::from("nothing left to repeat"))),
            };
            let terminated = context.options_terminated();
            let (buffer, state, _) = context.into_parts();
            let MultipleState {
                mut values,
                current,
            } = state;

            if let Some(current_state) = current {
                let attempt =
                    ParseContext::from_parts(buffer.clone(), current_state.clone(), terminated);
                return match self.inner.parse_async(attempt).await {
                    Ok(next) => Ok(Self::wrap(next, values, false, terminated)),
                    Err(first) => {
                        if self.at_capacity(values.len() + 1) {
                            return Err(first);
                        }
                        match self.inner.complete(current_state) {
                            Ok(closed) => values.push(closed),
                            Err(_) => return Err(first),
                        }
                        let retry = ParseContext::from_parts(
                            buffer,
                            self.inner.initial_state(),
                            terminated,
                        );
                        match self.inner.parse_async(retry).await {
                            Ok(next) => Ok(Self::wrap(next, values, true, terminated)),
                            Err(second) => Err(if second.consumed > first.consumed {
                                second
                            } else {
                                first
                            }),
                        }
                    }
                };
            }

            if self.at_capacity(values.len()) {
                return Err(decline(&head));
            }
            let attempt = ParseContext::from_parts(buffer, self.inner.initial_state(), terminated);
            self.inner
                .parse_async(attempt)
                .await
                .map(|next| Self::wrap(next, values, true, terminated))
        })
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        let MultipleState {
            mut values,
            current,
        } = state;
        if let Some(current_state) = current {
            values.push(self.inner.complete(current_state)?);
        }
        if let Some(failure) = self.arity_failure(values.len()) {
            return Err(failure);
        }
        Ok(values)
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        let MultipleState { values, current } = context.state();
        let mut suggestions = Vec::new();
        match current {
            Some(current_state) => {
                suggestions.extend(
                    self.inner
                        .suggest(&context.with_state(current_state.clone()), prefix),
                );
                // Once the entry in progress could close, the next one's
                // leading candidates are valid too.
                if !self.at_capacity(values.len() + 1)
                    && self.inner.complete(current_state.clone()).is_ok()
                {
                    suggestions.extend(
                        self.inner
                            .suggest(&context.with_state(self.inner.initial_state()), prefix),
                    );
                }
            }
            None => {
                if !self.at_capacity(values.len()) {
                    suggestions.extend(
                        self.inner
                            .suggest(&context.with_state(self.inner.initial_state()), prefix),
                    );
                }
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
            let MultipleState { values, current } = context.state();
            let mut suggestions = Vec::new();
            match current {
                Some(current_state) => {
                    let view = context.with_state(current_state.clone());
                    suggestions.extend(self.inner.suggest_async(&view, prefix).await);
                    if !self.at_capacity(values.len() + 1)
                        && self.inner.complete(current_state.clone()).is_ok()
                    {
                        let fresh = context.with_state(self.inner.initial_state());
                        suggestions.extend(self.inner.suggest_async(&fresh, prefix).await);
                    }
                }
                None => {
                    if !self.at_capacity(values.len()) {
                        let fresh = context.with_state(self.inner.initial_state());
                        suggestions.extend(self.inner.suggest_async(&fresh, prefix).await);
                    }
                }
            }
            suggestions
        })
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        let inner_availability = match availability {
            DocState::Available(state) => match &state.current {
                Some(current) => DocState::Available(current),
                None => DocState::Unavailable,
            },
            DocState::Unavailable => DocState::Unavailable,
        };
        self.inner.doc_fragments(inner_availability, default)
    }
}
