use std::fmt;

use crate::message::Message;
use crate::token::OptionName;

/// Declarative description of a parser's surface shape.
///
/// Usage terms feed two consumers: usage line rendering (external) and the
/// fuzzy matcher's candidate pool ([`literal_names`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageTerm {
    /// An option or flag with its declared names and optional value placeholder.
    Option {
        /// Declared names, in declaration order.
        names: Vec<OptionName>,
        /// Value placeholder; `None` for flags.
        metavar: Option<String>,
    },
    /// A positional argument.
    Argument {
        /// Value placeholder.
        metavar: String,
    },
    /// A subcommand name.
    Command {
        /// The literal leading token.
        name: String,
    },
    /// A bare literal token, such as a discriminator key.
    Literal {
        /// The literal text.
        value: String,
    },
    /// A pass-through collector.
    PassThrough,
    /// A shape that may be absent.
    Optional(Vec<UsageTerm>),
    /// A shape repeated `min` or more times.
    Repeated {
        /// The repeated shape.
        terms: Vec<UsageTerm>,
        /// Minimum occurrence count.
        min: usize,
    },
    /// Exactly one of several alternative shapes.
    Exclusive(Vec<Vec<UsageTerm>>),
}

impl fmt::Display for UsageTerm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UsageTerm::Option { names, metavar } => {
                for (index, name) in names.iter().enumerate() {
                    if index > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{name}")?;
                }
                if let Some(metavar) = metavar {
                    write!(f, " {metavar}")?;
                }
                Ok(())
            }
            UsageTerm::Argument { metavar } => write!(f, "{metavar}"),
            UsageTerm::Command { name } => write!(f, "{name}"),
            UsageTerm::Literal { value } => write!(f, "{value}"),
            UsageTerm::PassThrough => write!(f, "..."),
            UsageTerm::Optional(terms) => write!(f, "[{}]", usage_line(terms)),
            UsageTerm::Repeated { terms, .. } => write!(f, "{} ...", usage_line(terms)),
            UsageTerm::Exclusive(branches) => {
                write!(f, "(")?;
                for (index, branch) in branches.iter().enumerate() {
                    if index > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", usage_line(branch))?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Render a sequence of usage terms space separated, usage-line style.
pub fn usage_line(terms: &[UsageTerm]) -> String {
    terms
        .iter()
        .map(|term| term.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every literal name (option names, command names, bare literals) reachable
/// in `terms`, in declaration order.  This is the fuzzy matcher's candidate
/// pool.
pub(crate) fn literal_names(terms: &[UsageTerm]) -> Vec<String> {
    let mut names = Vec::new();
    collect_literal_names(terms, &mut names);
    names
}

fn collect_literal_names(terms: &[UsageTerm], into: &mut Vec<String>) {
    for term in terms {
        match term {
            UsageTerm::Option { names, .. } => {
                into.extend(names.iter().map(|name| name.to_string()));
            }
            UsageTerm::Command { name } => into.push(name.clone()),
            UsageTerm::Literal { value } => into.push(value.clone()),
            UsageTerm::Argument { .. } | UsageTerm::PassThrough => {}
            UsageTerm::Optional(inner) => collect_literal_names(inner, into),
            UsageTerm::Repeated { terms, .. } => collect_literal_names(terms, into),
            UsageTerm::Exclusive(branches) => {
                for branch in branches {
                    collect_literal_names(branch, into);
                }
            }
        }
    }
}

/// One documented surface shape, consumed by an external doc renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DocEntry {
    /// The shape being documented.
    pub term: UsageTerm,
    /// Caller supplied description.
    pub description: Option<Message>,
    /// Default-value note, threaded down by `with_default`.
    pub default: Option<Message>,
    /// Closed value set, when the value parser declares one.
    pub choices: Option<Message>,
}

/// A flat entry or a titled section of entries.
#[derive(Debug, Clone, PartialEq)]
pub enum DocFragment {
    /// A single entry.
    Entry(DocEntry),
    /// A titled group of entries.
    Section {
        /// Section title.
        title: String,
        /// Entries within the section.
        entries: Vec<DocEntry>,
    },
}

/// Documentation export for a parser subtree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocFragments {
    /// Ordered fragments.
    pub fragments: Vec<DocFragment>,
    /// Subtree description, when one exists.
    pub description: Option<Message>,
}

impl DocFragments {
    /// Fragments holding a single entry.
    pub fn entry(entry: DocEntry) -> Self {
        DocFragments {
            fragments: vec![DocFragment::Entry(entry)],
            description: None,
        }
    }

    /// Append `other`'s fragments, keeping the first description seen.
    pub fn merge(&mut self, other: DocFragments) {
        self.fragments.extend(other.fragments);
        if self.description.is_none() {
            self.description = other.description;
        }
    }

    /// Flatten into bare entries, discarding section titles.
    pub fn into_entries(self) -> Vec<DocEntry> {
        let mut entries = Vec::new();
        for fragment in self.fragments {
            match fragment {
                DocFragment::Entry(entry) => entries.push(entry),
                DocFragment::Section {
                    entries: mut inner, ..
                } => entries.append(&mut inner),
            }
        }
        entries
    }
}

/// Whether a live accumulator state is available for documentation export.
///
/// A subcommand that was never entered exports its inner documentation with
/// `Unavailable`.
#[derive(Debug, Clone, Copy)]
pub enum DocState<'s, S> {
    /// No invocation state exists.
    Unavailable,
    /// Live state from an in-flight invocation.
    Available(&'s S),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::OptionName;
    use rstest::rstest;

    fn port_option() -> UsageTerm {
        UsageTerm::Option {
            names: vec![
                OptionName::Long("port".to_string()),
                OptionName::Short('p'),
            ],
            metavar: Some("PORT".to_string()),
        }
    }

    #[rstest]
    #[case(port_option(), "--port|-p PORT")]
    #[case(UsageTerm::Argument { metavar: "FILE".to_string() }, "FILE")]
    #[case(UsageTerm::Command { name: "push".to_string() }, "push")]
    #[case(UsageTerm::PassThrough, "...")]
    #[case(UsageTerm::Optional(vec![port_option()]), "[--port|-p PORT]")]
    #[case(
        UsageTerm::Repeated { terms: vec![UsageTerm::Argument { metavar: "TAG".to_string() }], min: 1 },
        "TAG ..."
    )]
    #[case(
        UsageTerm::Exclusive(vec![
            vec![UsageTerm::Command { name: "push".to_string() }],
            vec![UsageTerm::Command { name: "pull".to_string() }],
        ]),
        "(push | pull)"
    )]
    fn render(#[case] term: UsageTerm, #[case] expected: &str) {
        // Execute & verify
        assert_eq!(term.to_string(), expected);
    }

    #[test]
    fn literal_name_pool() {
        // Setup
        let terms = vec![
            UsageTerm::Optional(vec![port_option()]),
            UsageTerm::Argument {
                metavar: "FILE".to_string(),
            },
            UsageTerm::Exclusive(vec![
                vec![UsageTerm::Command {
                    name: "push".to_string(),
                }],
                vec![UsageTerm::Literal {
                    value: "json".to_string(),
                }],
            ]),
        ];

        // Execute
        let names = literal_names(&terms);

        // Verify
        assert_eq!(names, vec!["--port", "-p", "push", "json"]);
    }

    #[test]
    fn merge_fragments() {
        // Setup
        let entry = DocEntry {
            term: UsageTerm::PassThrough,
            description: None,
            default: None,
            choices: None,
        };
        let mut fragments = DocFragments {
            fragments: vec![DocFragment::Entry(entry.clone())],
            description: Some(Message::from("collects the rest")),
        };

        // Execute
        fragments.merge(DocFragments {
            fragments: vec![DocFragment::Section {
                title: "Extras".to_string(),
                entries: vec![entry],
            }],
            description: Some(Message::from("ignored")),
        });

        // Verify
        assert_eq!(fragments.fragments.len(), 2);
        assert_eq!(
            fragments.description,
            Some(Message::from("collects the rest"))
        );
        assert_eq!(fragments.into_entries().len(), 2);
    }
}
