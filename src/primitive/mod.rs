//! The leaf parsers every tree bottoms out in.

mod argument;
mod command;
mod option;

pub use argument::{argument, constant, pass_through, Argument, CaptureFormat, Constant, PassThrough};
pub use command::{command, Command, CommandState};
pub use option::{flag, option, Flag, OptionParser};

use crate::error::{ErrorContext, ErrorKind, ErrorOverrides, Failure};
use crate::message::Message;
use crate::suggest::Suggestion;
use crate::token::{OptionName, TokenShape};

/// How the head token relates to a declared option-name set.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum NameMatch {
    /// The bare `--` terminator.
    Terminator,
    /// One of ours.
    Hit {
        /// The matched declared name.
        name: OptionName,
        /// An `=`-attached (or DOS `:`-attached) value.
        attached: Option<String>,
        /// The rest of a short bundle once our character is stripped,
        /// ex: matching `-v` against `-vqf` leaves `qf`.
        remainder: Option<String>,
    },
    /// Option-shaped, but not ours.
    Other,
    /// Not option-shaped at all.
    Plain,
}

pub(crate) fn match_names(names: &[OptionName], shape: &TokenShape<'_>) -> NameMatch {
    match shape {
        TokenShape::Terminator => NameMatch::Terminator,
        TokenShape::Long { name, value } => {
            match names
                .iter()
                .find(|declared| matches!(declared, OptionName::Long(long) if long == name))
            {
                Some(declared) => NameMatch::Hit {
                    name: declared.clone(),
                    attached: value.map(str::to_string),
                    remainder: None,
                },
                None => NameMatch::Other,
            }
        }
        TokenShape::Short { cluster, value } => {
            let mut characters = cluster.chars();
            let first = match characters.next() {
                Some(first) => first,
                None => return NameMatch::Plain,
            };
            if !names
                .iter()
                .any(|declared| matches!(declared, OptionName::Short(short) if *short == first))
            {
                return NameMatch::Other;
            }
            let rest = characters.as_str();
            NameMatch::Hit {
                name: OptionName::Short(first),
                attached: value.map(str::to_string),
                remainder: (!rest.is_empty()).then(|| rest.to_string()),
            }
        }
        TokenShape::Slash { name, value } => {
            match names
                .iter()
                .find(|declared| matches!(declared, OptionName::Dos(dos) if dos == name))
            {
                Some(declared) => NameMatch::Hit {
                    name: declared.clone(),
                    attached: value.map(str::to_string),
                    remainder: None,
                },
                None => NameMatch::Other,
            }
        }
        TokenShape::Plain => NameMatch::Plain,
    }
}

/// The routine "not mine, try someone else" refusal.
pub(crate) fn decline(token: &str) -> Failure {
    Failure {
        kind: ErrorKind::UnmatchedToken,
        message: Message::new().text("unexpected token").value(token),
        consumed: 0,
    }
}

/// [`decline`], routed through a primitive's installed error hooks.
///
/// Only matters when the primitive is the root parser; inside a composite
/// the enclosing record swallows the refusal and reports its own.
pub(crate) fn decline_with(overrides: &ErrorOverrides, token: &str) -> Failure {
    let context = ErrorContext {
        token: Some(token),
        expected: &[],
        suggestions: &[],
    };
    Failure {
        kind: ErrorKind::UnmatchedToken,
        message: overrides.build(ErrorKind::UnmatchedToken, &context, || {
            Message::new().text("unexpected token").value(token)
        }),
        consumed: 0,
    }
}

/// Refusal for an option-shaped token naming us after the `--` terminator.
///
/// Zero tokens consumed: a positional may still claim the token as plain
/// text, but if nobody does, this failure names the real mistake.
pub(crate) fn terminated_refusal(token: &str) -> Failure {
    Failure {
        kind: ErrorKind::OptionsTerminated,
        message: Message::new()
            .text("option")
            .option_name(token)
            .text("cannot appear after the")
            .value("--")
            .text("terminator"),
        consumed: 0,
    }
}

pub(crate) fn name_strings(names: &[OptionName]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Option-name completions matching `prefix`, annotated with the help text.
pub(crate) fn name_suggestions(
    names: &[OptionName],
    help: Option<&Message>,
    prefix: &str,
) -> Vec<Suggestion> {
    names
        .iter()
        .map(|name| name.to_string())
        .filter(|name| name.starts_with(prefix))
        .map(|name| match help {
            Some(message) => Suggestion::noted(name, message.to_string()),
            None => Suggestion::literal(name),
        })
        .collect()
}
