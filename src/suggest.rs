use std::fmt;

/// A single shell-completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    /// Complete to a literal string.
    Literal {
        /// Replacement text for the token under the cursor.
        text: String,
        /// Short annotation shown next to the candidate, when the shell
        /// supports one.
        note: Option<String>,
    },
    /// Defer to the shell's file name completion.
    File {
        /// Glob restricting the completed file names, `*` for any.
        pattern: String,
    },
}

impl Suggestion {
    /// Literal candidate without an annotation.
    pub fn literal(text: impl Into<String>) -> Self {
        Suggestion::Literal {
            text: text.into(),
            note: None,
        }
    }

    /// Literal candidate with an annotation.
    pub fn noted(text: impl Into<String>, note: impl Into<String>) -> Self {
        Suggestion::Literal {
            text: text.into(),
            note: Some(note.into()),
        }
    }

    /// The replacement text, when this candidate carries one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Suggestion::Literal { text, .. } => Some(text),
            Suggestion::File { .. } => None,
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Suggestion::Literal { text, note: None } => write!(f, "{text}"),
            Suggestion::Literal {
                text,
                note: Some(note),
            } => write!(f, "{text}\t{note}"),
            Suggestion::File { pattern } => write!(f, "<file:{pattern}>"),
        }
    }
}

/// Drop repeated candidates, keeping the first occurrence's annotation.
pub(crate) fn dedup(suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut out: Vec<Suggestion> = Vec::with_capacity(suggestions.len());

    for suggestion in suggestions {
        let repeat = match &suggestion {
            Suggestion::Literal { text, .. } => out
                .iter()
                .any(|seen| seen.text().map(|t| t == text).unwrap_or(false)),
            Suggestion::File { pattern } => out.iter().any(|seen| {
                matches!(seen, Suggestion::File { pattern: p } if p == pattern)
            }),
        };

        if !repeat {
            out.push(suggestion);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render() {
        assert_eq!(Suggestion::literal("--verbose").to_string(), "--verbose");
        assert_eq!(
            Suggestion::noted("--verbose", "print more").to_string(),
            "--verbose\tprint more"
        );
        assert_eq!(
            Suggestion::File {
                pattern: "*.toml".to_string()
            }
            .to_string(),
            "<file:*.toml>"
        );
    }

    #[test]
    fn dedup_keeps_first() {
        // Setup
        let suggestions = vec![
            Suggestion::noted("origin", "default remote"),
            Suggestion::literal("upstream"),
            Suggestion::literal("origin"),
        ];

        // Execute
        let unique = dedup(suggestions);

        // Verify
        assert_eq!(
            unique,
            vec![
                Suggestion::noted("origin", "default remote"),
                Suggestion::literal("upstream"),
            ]
        );
    }

    #[test]
    fn dedup_files() {
        // Setup
        let suggestions = vec![
            Suggestion::File {
                pattern: "*".to_string(),
            },
            Suggestion::literal("-"),
            Suggestion::File {
                pattern: "*".to_string(),
            },
        ];

        // Execute
        let unique = dedup(suggestions);

        // Verify
        assert_eq!(unique.len(), 2);
    }
}
