use crate::error::{ErrorContext, ErrorHook, ErrorKind, ErrorOverrides, Failure};
use crate::message::Message;
use crate::model::{BoxFuture, Mode, Priority};
use crate::parse::{end_of_input, Outcome, ParseContext, Parser};
use crate::suggest::Suggestion;
use crate::token::{classify, TokenShape};
use crate::usage::{DocEntry, DocFragment, DocFragments, DocState, UsageTerm};

use super::decline;

/// Progress of a [`Command`]: waiting for its name, or inside its subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandState<S> {
    /// The leading name has not appeared yet.
    Pending,
    /// The name matched; every further token belongs to the inner parser.
    Entered(S),
}

/// A subcommand: a literal leading token that hands the rest of the buffer
/// to an inner parser.
///
/// Commands claim at the highest priority, so a bare word is a command
/// before it is a positional argument.  After the `--` terminator a command
/// name is plain text and no longer matches.
pub struct Command<P> {
    name: String,
    inner: P,
    help: Option<Message>,
    overrides: ErrorOverrides,
}

/// A subcommand answering to `name`, parsing its tail with `inner`.
///
/// ### Example
/// ```
/// use argot::{argument, command, parse, string};
///
/// let push = command("push", argument("REMOTE", string()));
/// assert_eq!(parse(&push, ["push", "origin"]).unwrap(), "origin".to_string());
/// ```
pub fn command<P: Parser>(name: impl Into<String>, inner: P) -> Command<P> {
    Command {
        name: name.into(),
        inner,
        help: None,
        overrides: ErrorOverrides::default(),
    }
}

impl<P: Parser> Command<P> {
    /// Describe this command for help documents and completion annotations.
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
        let expected = vec![self.name.clone()];
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

    fn unwrap_entered(state: CommandState<P::State>) -> P::State {
        match state {
            CommandState::Entered(inner) => inner,
            CommandState::Pending => {
                unreachable!("internal error - command state changed mid-step")
            }
        }
    }

    fn enter(&self, context: ParseContext<CommandState<P::State>>) -> Outcome<CommandState<P::State>> {
        let head = match context.head() {
            Some(head) => head.to_string(),
            None => {
                return Err(end_of_input(
                    Message::new().text("expected command").value(&*self.name),
                ))
            }
        };

        if !context.options_terminated() {
            if let TokenShape::Terminator = classify(&head) {
                return Ok(context.accept_terminator());
            }
        } else {
            return Err(decline(&head));
        }

        if head == self.name {
            Ok(context
                .map_state(|_| CommandState::Entered(self.inner.initial_state()))
                .advance(1)
                .claimed_by(self.priority()))
        } else {
            Err(decline(&head))
        }
    }
}

impl<P: Parser> Parser for Command<P> {
    type State = CommandState<P::State>;
    type Value = P::Value;

    fn priority(&self) -> Priority {
        Priority::COMMAND
    }

    fn mode(&self) -> Mode {
        self.inner.mode()
    }

    fn usage(&self) -> Vec<UsageTerm> {
        vec![UsageTerm::Command {
            name: self.name.clone(),
        }]
    }

    fn initial_state(&self) -> Self::State {
        CommandState::Pending
    }

    fn parse(&self, context: ParseContext<Self::State>) -> Outcome<Self::State> {
        if let CommandState::Pending = context.state() {
            return self.enter(context);
        }

        let (buffer, state, terminated) = context.into_parts();
        let inner_context = ParseContext::from_parts(buffer, Self::unwrap_entered(state), terminated);
        // Tokens consumed inside the command still belong to the command
        // from any enclosing record's point of view.
        self.inner
            .parse(inner_context)
            .map(|next| next.map_state(CommandState::Entered).claimed_by(self.priority()))
    }

    fn parse_async<'f>(
        &'f self,
        context: ParseContext<Self::State>,
    ) -> BoxFuture<'f, Outcome<Self::State>>
    where
        Self::State: 'f,
    {
        Box::pin(async move {
            if let CommandState::Pending = context.state() {
                return self.enter(context);
            }

            let (buffer, state, terminated) = context.into_parts();
            let inner_context =
                ParseContext::from_parts(buffer, Self::unwrap_entered(state), terminated);
            self.inner
                .parse_async(inner_context)
                .await
                .map(|next| next.map_state(CommandState::Entered).claimed_by(self.priority()))
        })
    }

    fn complete(&self, state: Self::State) -> Result<Self::Value, Failure> {
        match state {
            CommandState::Pending => Err(self.fail(ErrorKind::MissingRequired, "", 0, || {
                Message::new()
                    .text("missing required command")
                    .value(&*self.name)
            })),
            CommandState::Entered(inner) => self.inner.complete(inner),
        }
    }

    fn suggest(&self, context: &ParseContext<Self::State>, prefix: &str) -> Vec<Suggestion> {
        match context.state() {
            CommandState::Pending => {
                if context.options_terminated()
                    || !context.buffer().is_empty()
                    || !self.name.starts_with(prefix)
                {
                    return Vec::new();
                }
                match &self.help {
                    Some(help) => vec![Suggestion::noted(&*self.name, help.to_string())],
                    None => vec![Suggestion::literal(&*self.name)],
                }
            }
            CommandState::Entered(inner) => self
                .inner
                .suggest(&context.with_state(inner.clone()), prefix),
        }
    }

    fn suggest_async<'f>(
        &'f self,
        context: &'f ParseContext<Self::State>,
        prefix: &'f str,
    ) -> BoxFuture<'f, Vec<Suggestion>> {
        Box::pin(async move {
            match context.state() {
                CommandState::Pending => self.suggest(context, prefix),
                CommandState::Entered(inner) => {
                    let view = context.with_state(inner.clone());
                    self.inner.suggest_async(&view, prefix).await
                }
            }
        })
    }

    fn doc_fragments(
        &self,
        availability: DocState<'_, Self::State>,
        default: Option<Message>,
    ) -> DocFragments {
        let inner_availability = match availability {
            DocState::Available(CommandState::Entered(state)) => DocState::Available(state),
            _ => DocState::Unavailable,
        };
        let inner = self.inner.doc_fragments(inner_availability, None);

        let mut fragments = DocFragments::entry(DocEntry {
            term: UsageTerm::Command {
                name: self.name.clone(),
            },
            description: self.help.clone(),
            default,
            choices: None,
        });
        fragments.fragments.push(DocFragment::Section {
            title: self.name.clone(),
            entries: inner.into_entries(),
        });
        fragments
    }
}
