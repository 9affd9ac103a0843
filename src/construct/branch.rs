//! Runtime branching on an earlier parse result.
//!
//! [`conditional`] parses a discriminator value first, then hands the rest
//! of the invocation to the branch registered under that value.  Branches
//! keep their own state types behind [`BoxedParser`], so a `json` branch
//! and a `yaml` branch only have to agree on the completed value type.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::{ErrorContext, ErrorHook, ErrorKind, ErrorOverrides, Failure};
use crate::fuzzy;
use crate::message::Message;
use crate::model::{BoxFuture, Mode, Priority};
use crate::parse::{end_of_input, Outcome, ParseContext, Parser};
use crate::suggest::Suggestion;
use crate::usage::{DocFragment, DocFragments, DocState, UsageTerm};

/// Type-erased parser state.
///
/// Shared by clone: accumulator states are small and cloned on every step
/// anyway, so branches pay one allocation per transition.
pub struct BoxedState(Rc<dyn Any>);

impl BoxedState {
    fn new<S: Clone + 'static>(state: S) -> Self {
        BoxedState(Rc::new(state))
    }

    fn unwrap<S: Clone + 'static>(self) -> S {
        match self.0.downcast::<S>() {
            Ok(state) => Rc::try_unwrap(state).unwrap_or_else(|shared| (*shared).clone()),
            Err(_) => unreachable!("internal error - boxed parser state type mismatch"),
        }
    }

    fn peek<S: 'static>(&self) -> &S {
        match self.0.downcast_ref::<S>() {
            Some(state) => state,
            None => unreachable!("internal error - boxed parser state type mismatch"),
        }
    }
}

impl Clone for BoxedState {
    fn clone(&self) -> Self {
        BoxedState(Rc::clone(&self.0))
    }
}

impl fmt::Debug for BoxedState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BoxedState(..)")
    }
}

/// Object-safe mirror of [`Parser`] over [`BoxedState`].
trait ErasedParser<V> {
    fn priority(&self) -> Priority;
    fn mode(&self) -> Mode;
    fn usage(&self) -> Vec<UsageTerm>;
    fn initial_state(&self) -> BoxedState;
    fn parse(&self, context: ParseContext<BoxedState>) -> Outcome<BoxedState>;
    fn parse_async<'f>(
        &'f self,
        context: ParseContext<BoxedState>,
    ) -> BoxFuture<'f, Outcome<BoxedState>>;
    fn complete(&self, state: BoxedState) -> Result<V, Failure>;
    fn suggest(&self, context: &ParseContext<BoxedState>, prefix: &str) -> Vec<Suggestion>;
    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<BoxedState>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>>;
    fn doc_fragments(
        &self,
        availability: DocState<'_, BoxedState>,
        default: Option<Message>,
    ) -> DocFragments;
}

struct Erased<P>(P);

impl<P> ErasedParser<P::Value> for Erased<P>
where
    P: Parser + 'static,
    P::State: 'static,
{
    fn priority(&self) -> Priority {
        self.0.priority()
    }

    fn mode(&self) -> Mode {
        self.0.mode()
    }

    fn usage(&self) -> Vec<UsageTerm> {
        self.0.usage()
    }

    fn initial_state(&self) -> BoxedState {
        BoxedState::new(self.0.initial_state())
    }

    fn parse(&self, context: ParseContext<BoxedState>) -> Outcome<BoxedState> {
        let (buffer, state, terminated) = context.into_parts();
        let context = ParseContext::from_parts(buffer, state.unwrap::<P::State>(), terminated);
        self.0.parse(context).map(|next| next.map_state(BoxedState::new))
    }

    fn parse_async<'f>(
        &'f self,
        context: ParseContext<BoxedState>,
    ) -> BoxFuture<'f, Outcome<BoxedState>> {
        let (buffer, state, terminated) = context.into_parts();
        let context = ParseContext::from_parts(buffer, state.unwrap::<P::State>(), terminated);
        Box::pin(async move {
            self.0
                .parse_async(context)
                .await
                .map(|next| next.map_state(BoxedState::new))
        })
    }

    fn complete(&self, state: BoxedState) -> Result<P::Value, Failure> {
        self.0.complete(state.unwrap::<P::State>())
    }

    fn suggest(&self, context: &ParseContext<BoxedState>, prefix: &str) -> Vec<Suggestion> {
        let view = context.with_state(context.state().peek::<P::State>().clone());
        self.0.suggest(&view, prefix)
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<BoxedState>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        let view = context.with_state(context.state().peek::<P::State>().clone());
        Box::pin(async move { self.0.suggest_async(&view, prefix).await })
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, BoxedState>,
        default: Option<Message>,
    ) -> DocFragments {
        let availability = match availability {
            DocState::Available(state) => DocState::Available(state.peek::<P::State>()),
            DocState::Unavailable => DocState::Unavailable,
        };
        self.0.doc_fragments(availability, default)
    }
}

/// A heap-allocated parser with its state type erased.
///
/// Built through [`Parser::boxed`].  Cloning shares the underlying parser.
pub struct BoxedParser<V> {
    inner: Rc<dyn ErasedParser<V>>,
}

impl<V> Clone for BoxedParser<V> {
    fn clone(&self) -> Self {
        BoxedParser {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: 'static> BoxedParser<V> {
    pub(crate) fn new<P>(parser: P) -> Self
    where
        P: Parser<Value = V> + 'static,
        P::State: 'static,
    {
        BoxedParser {
            inner: Rc::new(Erased(parser)),
        }
    }
}

impl<V: 'static> Parser for BoxedParser<V> {
    type State = BoxedState;
    type Value = V;

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
        self.inner.complete(state)
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

/// Accumulator for [`Conditional`]: discriminator progress, plus the chosen
/// branch once one resolves.
#[derive(Debug, Clone)]
pub struct ConditionalState<D, K> {
    discriminator: D,
    chosen: Option<(K, usize, BoxedState)>,
}

/// Value-directed branching; see [`conditional`].
pub struct Conditional<D: Parser, V> {
    discriminator: D,
    branches: Vec<(D::Value, BoxedParser<V>)>,
    fallback: Option<usize>,
    overrides: ErrorOverrides,
}

impl<D, V> Conditional<D, V>
where
    D: Parser,
    D::Value: Clone + PartialEq + fmt::Display,
{
    /// Register the branch to take when the discriminator produces `key`.
    ///
    /// Declaration order is also the documentation order.
    pub fn branch(mut self, key: impl Into<D::Value>, parser: BoxedParser<V>) -> Self {
        self.branches.push((key.into(), parser));
        self
    }

    /// Designate the branch taken when no discriminator token ever shows
    /// up.  With a fallback declared, branch tokens may even precede the
    /// discriminator.
    ///
    /// Panics if `key` does not name a declared branch.
    pub fn fallback(mut self, key: impl Into<D::Value>) -> Self {
        let key = key.into();
        match self.lookup(&key) {
            Some(index) => {
                self.fallback = Some(index);
                self
            }
            None => panic!("fallback key `{key}` does not name a declared branch"),
        }
    }

    /// Override the stock message for failures of `kind` raised while
    /// resolving the branch.
    pub fn error(mut self, kind: ErrorKind, hook: impl Into<ErrorHook>) -> Self {
        self.overrides.insert(kind, hook.into());
        self
    }

    fn lookup(&self, key: &D::Value) -> Option<usize> {
        self.branches
            .iter()
            .position(|(candidate, _)| candidate == key)
    }

    fn unknown_branch(&self, key: D::Value, consumed: usize) -> Failure {
        let expected: Vec<String> = self
            .branches
            .iter()
            .map(|(candidate, _)| candidate.to_string())
            .collect();
        let token = key.to_string();
        let ranked = fuzzy::rank(&token, &expected);
        let context = ErrorContext {
            token: Some(&token),
            expected: &expected,
            suggestions: &ranked,
        };
        let message = self
            .overrides
            .build(ErrorKind::InvalidDiscriminator, &context, || {
                Message::new()
                    .text("unknown branch")
                    .value(token.as_str())
                    .text(", expected one of")
                    .values(expected.clone())
            });
        Failure {
            kind: ErrorKind::InvalidDiscriminator,
            message,
            consumed,
        }
    }
}

/// Parse a discriminator value, then delegate the rest of the invocation
/// to the branch registered under it.
///
/// Once a branch resolves, the discriminator never runs again; its value
/// rides along in the completed `(key, value)` pair.  Branches erase their
/// state with [`Parser::boxed`], so they only need a common value type.
///
/// ```
/// use argot::{argument, choices, conditional, flag, parse, Parser};
///
/// let parser = conditional(argument("FORMAT", choices(["json", "yaml"])))
///     .branch("json", flag(["--pretty"]).with_default(false).boxed())
///     .branch("yaml", flag(["--canonical"]).with_default(false).boxed());
///
/// let (format, styled) = parse(&parser, ["json", "--pretty"]).unwrap();
/// assert_eq!(format, "json");
/// assert!(styled);
/// ```
pub fn conditional<D, V>(discriminator: D) -> Conditional<D, V>
where
    D: Parser,
    D::Value: Clone + PartialEq + fmt::Display,
{
    Conditional {
        discriminator,
        branches: Vec::new(),
        fallback: None,
        overrides: ErrorOverrides::default(),
    }
}

impl<D, V> Parser for Conditional<D, V>
where
    D: Parser,
    D::Value: Clone + PartialEq + fmt::Display,
    V: 'static,
{
    type State = ConditionalState<D::State, D::Value>;
    type Value = (D::Value, V);

    fn priority(&self) -> Priority {
        let mut priority = self.discriminator.priority();
        for (_, parser) in &self.branches {
            priority = priority.max(parser.priority());
        }
        priority
    }

    fn mode(&self) -> Mode {
        let mut mode = self.discriminator.mode();
        for (_, parser) in &self.branches {
            mode = mode.join(parser.mode());
        }
        mode
    }

    fn usage(&self) -> Vec<UsageTerm> {
        let mut terms = self.discriminator.usage();
        terms.push(UsageTerm::Exclusive(
            self.branches
                .iter()
                .map(|(_, parser)| parser.usage())
                .collect(),
        ));
        terms
    }

    fn initial_state(&self) -> Self::State {
        ConditionalState {
            discriminator: self.discriminator.initial_state(),
            chosen: None,
        }
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        if context.head().is_none() {
            return Err(end_of_input(Message::from("nothing left to parse")));
        }
        let terminated = context.options_terminated();
        let (buffer, state, _) = context.into_parts();
        let ConditionalState {
            discriminator,
            chosen,
        } = state;

        if let Some((key, index, branch_state)) = chosen {
            let attempt = ParseContext::from_parts(buffer, branch_state, terminated);
            return self.branches[index].1.parse(attempt).map(|next| {
                next.map_state(|branch_state| ConditionalState {
                    discriminator,
                    chosen: Some((key, index, branch_state)),
                })
                .claimed_by(self.priority())
            });
        }

        let attempt = ParseContext::from_parts(buffer.clone(), discriminator.clone(), terminated);
        match self.discriminator.parse(attempt) {
            Ok(next) => {
                let consumed = buffer.len() - next.buffer().len();
                // Resolve eagerly: a complete discriminator locks the
                // branch and retires itself.
                match self.discriminator.complete(next.state().clone()) {
                    Ok(key) => {
                        let index = match self.lookup(&key) {
                            Some(index) => index,
                            None => return Err(self.unknown_branch(key, consumed)),
                        };
                        let branch_state = self.branches[index].1.initial_state();
                        Ok(next
                            .map_state(|discriminator| ConditionalState {
                                discriminator,
                                chosen: Some((key, index, branch_state)),
                            })
                            .claimed_by(self.priority()))
                    }
                    Err(_) => Ok(next
                        .map_state(|discriminator| ConditionalState {
                            discriminator,
                            chosen: None,
                        })
                        .claimed_by(self.priority())),
                }
            }
            Err(failure) => {
                // With a fallback declared, branch tokens may arrive before
                // the discriminator decides anything.  Speculative: a branch
                // refusal discards the commitment.
                if failure.consumed == 0 {
                    if let Some(index) = self.fallback {
                        let key = self.branches[index].0.clone();
                        let branch_state = self.branches[index].1.initial_state();
                        let attempt = ParseContext::from_parts(buffer, branch_state, terminated);
                        if let Ok(next) = self.branches[index].1.parse(attempt) {
                            return Ok(next
                                .map_state(|branch_state| ConditionalState {
                                    discriminator,
                                    chosen: Some((key, index, branch_state)),
                                })
                                .claimed_by(self.priority()));
                        }
                    }
                }
                Err(failure)
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
            if context.head().is_none() {
                return Err(end_of_input(Message::from("nothing left to parse")));
            }
            let terminated = context.options_terminated();
            let (buffer, state, _) = context.into_parts();
            let ConditionalState {
                discriminator,
                chosen,
            } = state;

            if let Some((key, index, branch_state)) = chosen {
                let attempt = ParseContext::from_parts(buffer, branch_state, terminated);
                return self.branches[index].1.parse_async(attempt).await.map(|next| {
                    next.map_state(|branch_state| ConditionalState {
                        discriminator,
                        chosen: Some((key, index, branch_state)),
                    })
                    .claimed_by(self.priority())
                });
            }

            let attempt =
                ParseContext::from_parts(buffer.clone(), discriminator.clone(), terminated);
            match self.discriminator.parse_async(attempt).await {
                Ok(next) => {
                    let consumed = buffer.len() - next.buffer().len();
                    match self.discriminator.complete(next.state().clone()) {
                        Ok(key) => {
                            let index = match self.lookup(&key) {
                                Some(index) => index,
                                None => return Err(self.unknown_branch(key, consumed)),
                            };
                            let branch_state = self.branches[index].1.initial_state();
                            Ok(next
                                .map_state(|discriminator| ConditionalState {
                                    discriminator,
                                    chosen: Some((key, index, branch_state)),
                                })
                                .claimed_by(self.priority()))
                        }
                        Err(_) => Ok(next
                            .map_state(|discriminator| ConditionalState {
                                discriminator,
                                chosen: None,
                            })
                            .claimed_by(self.priority())),
                    }
                }
                Err(failure) => {
                    if failure.consumed == 0 {
                        if let Some(index) = self.fallback {
                            let key = self.branches[index].0.clone();
                            let branch_state = self.branches[index].1.initial_state();
                            let attempt =
                                ParseContext::from_parts(buffer, branch_state, terminated);
                            if let Ok(next) = self.branches[index].1.parse_async(attempt).await {
                                return Ok(next
                                    .map_state(|branch_state| ConditionalState {
                                        discriminator,
                                        chosen: Some((key, index, branch_state)),
                                    })
                                    .claimed_by(self.priority()));
                            }
                        }
                    }
                    Err(failure)
                }
            }
        })
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        let ConditionalState {
            discriminator,
            chosen,
        } = state;
        if let Some((key, index, branch_state)) = chosen {
            let value = self.branches[index].1.complete(branch_state)?;
            return Ok((key, value));
        }
        match self.discriminator.complete(discriminator) {
            Ok(key) => {
                let index = match self.lookup(&key) {
                    Some(index) => index,
                    None => return Err(self.unknown_branch(key, 0)),
                };
                let value = self.branches[index]
                    .1
                    .complete(self.branches[index].1.initial_state())?;
                Ok((key, value))
            }
            Err(failure) => {
                if let Some(index) = self.fallback {
                    let key = self.branches[index].0.clone();
                    let value = self.branches[index]
                        .1
                        .complete(self.branches[index].1.initial_state())?;
                    return Ok((key, value));
                }
                Err(failure)
            }
        }
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        let ConditionalState {
            discriminator,
            chosen,
        } = context.state();
        match chosen {
            Some((_, index, branch_state)) => {
                let view = context.with_state(branch_state.clone());
                self.branches[*index].1.suggest(&view, prefix)
            }
            None => {
                let view = context.with_state(discriminator.clone());
                self.discriminator.suggest(&view, prefix)
            }
        }
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        Box::pin(async move {
            let ConditionalState {
                discriminator,
                chosen,
            } = context.state();
            match chosen {
                Some((_, index, branch_state)) => {
                    let view = context.with_state(branch_state.clone());
                    self.branches[*index].1.suggest_async(&view, prefix).await
                }
                None => {
                    let view = context.with_state(discriminator.clone());
                    self.discriminator.suggest_async(&view, prefix).await
                }
            }
        })
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        let (discriminator_availability, chosen) = match availability {
            DocState::Available(state) => (
                DocState::Available(&state.discriminator),
                state.chosen.as_ref(),
            ),
            DocState::Unavailable => (DocState::Unavailable, None),
        };
        let mut docs = self
            .discriminator
            .doc_fragments(discriminator_availability, default);
        for (index, (key, parser)) in self.branches.iter().enumerate() {
            let branch_availability = match chosen {
                Some((_, chosen_index, branch_state)) if *chosen_index == index => {
                    DocState::Available(branch_state)
                }
                _ => DocState::Unavailable,
            };
            docs.fragments.push(DocFragment::Section {
                title: key.to_string(),
                entries: parser
                    .doc_fragments(branch_availability, None)
                    .into_entries(),
            });
        }
        docs
    }
}

/// Transparent wrapper that titles its subtree's documentation.
pub struct Group<P> {
    title: String,
    inner: P,
}

/// Title a subtree's documentation without changing how it parses.
///
/// ```
/// use argot::{group, object, option, string, Parser};
/// use argot::{DocFragment, DocState};
///
/// let parser = group("Connection", object((option(["--host"], string()),)));
///
/// let docs = parser.doc_fragments(DocState::Unavailable, None);
/// assert!(matches!(&docs.fragments[0], DocFragment::Section { title, .. } if title == "Connection"));
/// ```
pub fn group<P>(title: impl Into<String>, inner: P) -> Group<P> {
    Group {
        title: title.into(),
        inner,
    }
}

impl<P: Parser> Parser for Group<P> {
    type State = P::State;
    type Value = P::Value;

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
        self.inner.complete(state)
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
        let inner = self.inner.doc_fragments(availability, default);
        let description = inner.description.clone();
        DocFragments {
            fragments: vec![DocFragment::Section {
                title: self.title.clone(),
                entries: inner.into_entries(),
            }],
            description,
        }
    }
}
