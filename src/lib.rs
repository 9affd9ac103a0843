//! `argot` is a composable command line parsing engine for Rust.
//!
//! Most command line crates accept a declarative description of one program
//! and hand back a match table.  `argot` instead treats the parser itself as
//! the unit of composition: every primitive is a value implementing
//! [`Parser`], every combinator takes parsers and returns a parser, and the
//! whole tree is an ordinary value you can pass around, wrap, and reuse.
//! Specifically, `argot` prioritizes the following design concerns:
//! * *Composability first*:
//! A parser for `--port` is useful alone, inside a record, inside a
//! subcommand, or repeated; nothing about it changes when it moves.
//! * *Single pass, resumable*:
//! Tokens are consumed left to right exactly once.  Parsers are stateful and
//! resumable, so a record can interleave options between positionals without
//! lookahead or reordering.
//! * *Deterministic disambiguation*:
//! When several parsers could consume the same token, a static
//! [`Priority`] decides, with declaration order breaking ties.
//! Reordering the fields of a record does not change what parses.
//! * *Completion is parsing*:
//! Shell suggestions come from the same consumption algorithm as parsing,
//! so they are correct by construction for whatever position the cursor is
//! in.  Unrecognized tokens get "did you mean" hints from the same shape
//! data.
//! * *Sync/async parity*:
//! Value conversion may suspend (ex: validating against a registry).  The
//! async driver visits the same steps in the same order as the sync one;
//! purely synchronous trees never pay for the capability.
//!
//! # Usage
//! A small `git remote`-flavored program
//! (also under [the source](https://github.com/argot-rs/argot/tree/main/demos)):
//! ```no_run
#![doc = include_str!("../demos/remote.rs")]
//! ```
//!
//! ```console
//! $ remote add origin git@example.com:demo.git
//! added remote `origin` at git@example.com:demo.git
//!
//! $ remote -v
//! origin	git@example.com:demo.git
//!
//! $ remote remvoe origin
//! Parse error: unexpected token `remvoe`, did you mean `remove`?
//! usage: remote ([--verbose|-v] | (add | remove))
//!
//! $ remote --complete re
//! remove	Stop tracking a remote
//! ```
//!
//! # Composition model
//! A [`Parser`] carries an accumulator ([`Parser::State`]) through repeated
//! [`Parser::parse`] steps, each consuming a prefix of the remaining tokens,
//! until the buffer empties; [`Parser::complete`] then turns the final state
//! into the [`Parser::Value`].  Declining a token is routine, not fatal:
//! combinators offer the same tokens to several children and expect the
//! wrong ones to refuse cheaply.
//!
//! The everyday surface is the [`object`] record, whose value is a tuple of
//! its children's values:
//! ```
//! use argot::{flag, from_str, object, option, parse, Parser};
//!
//! let parser = object((
//!     flag(["--verbose", "-v"]).with_default(false),
//!     option(["--port", "-p"], from_str::<u16>()).with_default(8080),
//! ));
//!
//! let (verbose, port) = parse(&parser, ["-v", "--port", "9000"]).unwrap();
//! assert!(verbose);
//! assert_eq!(port, 9000);
//! ```
//!
//! ### Primitives
//! * [`flag`]: a named no-value option (`--verbose`), completing to `true`.
//! * [`option`]: a named valued option (`--port 80`, `--port=80`), with the
//! token-to-type step delegated to a [`ValueParser`].
//! * [`argument`]: a positional value.
//! * [`constant`]: consumes nothing, completes to a fixed value.
//! * [`command`]: a literal leading word that hands the rest of the buffer
//! to an inner parser.
//! * [`pass_through`]: collects the remaining tokens verbatim for a child
//! process, typically after the `--` terminator.
//!
//! ### Modifiers
//! Adapters on any parser, in the standard-library `Iterator` style:
//! [`Parser::optional`], [`Parser::with_default`], [`Parser::multiple`]
//! (with [`Multiple::at_least`]/[`Multiple::at_most`] arity bounds), and
//! [`Parser::map`].
//!
//! ### Combinators
//! * [`object`]: unordered record, children claim tokens by priority.
//! * [`tuple`]: ordered sequence with a forward-only cursor.
//! * [`or!`]/[`or`]: first-match alternation committing on the first branch
//! to accept a token.
//! * [`longest_match!`]/[`longest_match`]: speculative alternation running
//! each branch to exhaustion and keeping the one that consumed the most.
//! * [`merge`]: combines two records into one flat surface, concatenating
//! their value tuples.
//! * [`concat`]: sequences two parsers, concatenating their value tuples.
//! * [`conditional`]: parses a discriminator value, then branches on it.
//! * [`group`]: titles a subtree's documentation, transparent otherwise.
//!
//! # Errors
//! Failures carry an [`ErrorKind`] and a structured [`Message`]; unmatched
//! tokens get fuzzy "did you mean" hints drawn from the names the composite
//! actually accepts:
//! ```
//! use argot::{object, option, parse, string};
//!
//! let parser = object((option(["--level"], string()),));
//!
//! let error = parse(&parser, ["--levle", "info"]).unwrap_err();
//! assert_eq!(
//!     error.to_string(),
//!     "Parse error: unexpected token `--levle`, did you mean `--level`?"
//! );
//! ```
//! Every such message can be replaced per parser and per kind through the
//! `error` builder methods, either with fixed text or with a hook computed
//! from the failing token (see [`ErrorHook`]).
//!
//! # Completion
//! [`suggest`] replays all but the last token, then asks whichever parsers
//! are active at that position for candidates matching the in-progress
//! prefix:
//! ```
//! use argot::{argument, choices, object, suggest, Suggestion};
//!
//! let parser = object((argument("REMOTE", choices(["origin", "upstream"])),));
//!
//! assert_eq!(suggest(&parser, ["or"]), vec![Suggestion::literal("origin")]);
//! ```
//! Wire it to a shell by exposing the candidates under a hidden flag, as the
//! usage demo above does.
//!
//! # Async
//! A [`ValueParser`] whose conversion suspends overrides
//! [`ValueParser::parse_async`] and reports [`Mode::Async`]; the mode
//! propagates up the tree, and such trees are driven with [`parse_async`]
//! and [`suggest_async`]:
//! ```
//! use argot::{from_str, option, parse_async};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let parser = option(["--port"], from_str::<u16>());
//!
//! let port = parse_async(&parser, ["--port", "8080"]).await.unwrap();
//! assert_eq!(port, 8080);
//! # });
//! ```
//! The sync [`parse`] refuses an async tree up front rather than blocking
//! inside it.
#![deny(missing_docs)]

mod construct;
mod error;
pub mod fuzzy;
mod message;
mod model;
mod modifier;
mod parse;
mod primitive;
mod suggest;
mod token;
mod usage;
mod value;

pub use construct::{
    concat, conditional, group, longest_match, merge, object, or, tuple, AltState, BoxedParser,
    BoxedState, Concat, Conditional, ConditionalState, Group, LongestMatch, Merge, Object, Or,
    Tuple, TupleConcat,
};
pub use error::{ErrorContext, ErrorHook, ErrorKind, Failure, ParseError};
pub use message::{Message, Term};
pub use model::{BoxFuture, Mode, Priority};
pub use modifier::{Map, Multiple, MultipleState, Optional, WithDefault};
pub use parse::{parse, parse_async, suggest, suggest_async, Outcome, ParseContext, Parser};
pub use primitive::{
    argument, command, constant, flag, option, pass_through, Argument, CaptureFormat, Command,
    CommandState, Constant, Flag, OptionParser, PassThrough,
};
pub use suggest::Suggestion;
pub use token::OptionName;
pub use usage::{usage_line, DocEntry, DocFragment, DocFragments, DocState, UsageTerm};
pub use value::{choices, from_str, string, ChoicesValue, FromStrValue, ValueParser};

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

#[cfg(test)]
pub(crate) mod test {
    macro_rules! assert_contains {
        ($base:expr, $sub:expr) => {
            assert!(
                $base.contains($sub),
                "'{b}' does not contain '{s}'",
                b = $base,
                s = $sub,
            );
        };
    }

    pub(crate) use assert_contains;
}
