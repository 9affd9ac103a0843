use std::fmt;

/// A declared option name in one of the supported surface styles.
///
/// Names are declared as the user would type them: `--verbose`, `-v`, or the
/// DOS style `/V`.  Rendering via `Display` reproduces the declared form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionName {
    /// GNU style long name (`--verbose`), stored without the dashes.
    Long(String),
    /// Single character short name (`-v`).
    Short(char),
    /// DOS style name (`/V`), stored without the slash.
    Dos(String),
}

impl OptionName {
    /// Interpret a declared name string.
    ///
    /// ### Panics
    /// On a malformed declaration; option names are part of the program text,
    /// so this is a programming error rather than a runtime condition.
    pub fn declare(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix("--") {
            if !name.is_empty() && !name.contains('=') && !name.starts_with('-') {
                return OptionName::Long(name.to_string());
            }
        } else if let Some(name) = raw.strip_prefix('-') {
            let mut characters = name.chars();
            if let (Some(first), None) = (characters.next(), characters.next()) {
                return OptionName::Short(first);
            }
        } else if let Some(name) = raw.strip_prefix('/') {
            if !name.is_empty() && !name.contains([':', '/']) {
                return OptionName::Dos(name.to_string());
            }
        }

        panic!("option names must look like '--name', '-n', or '/Name' (got '{raw}')");
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptionName::Long(name) => write!(f, "--{name}"),
            OptionName::Short(name) => write!(f, "-{name}"),
            OptionName::Dos(name) => write!(f, "/{name}"),
        }
    }
}

/// Shape classification of a single raw token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenShape<'t> {
    /// The bare `--` terminator.
    Terminator,
    /// `--name` or `--name=value`; `name` excludes the dashes.
    Long {
        name: &'t str,
        value: Option<&'t str>,
    },
    /// `-n`, `-n=value`, or a bundle `-abc`; `cluster` excludes the dash.
    Short {
        cluster: &'t str,
        value: Option<&'t str>,
    },
    /// `/Name` or `/Name:value`.  Only a candidate: slash tokens stay plain
    /// unless a declared DOS name matches, so filesystem paths parse as
    /// ordinary arguments.
    Slash {
        name: &'t str,
        value: Option<&'t str>,
    },
    /// Anything else.
    Plain,
}

pub(crate) fn classify(token: &str) -> TokenShape<'_> {
    if token == "--" {
        return TokenShape::Terminator;
    }
    if let Some(rest) = token.strip_prefix("--") {
        let (name, value) = split_value(rest, '=');
        if !name.is_empty() {
            return TokenShape::Long { name, value };
        }
        return TokenShape::Plain;
    }
    if let Some(rest) = token.strip_prefix('-') {
        let (cluster, value) = split_value(rest, '=');
        if !cluster.is_empty() {
            return TokenShape::Short { cluster, value };
        }
        return TokenShape::Plain;
    }
    if let Some(rest) = token.strip_prefix('/') {
        let (name, value) = split_value(rest, ':');
        if !name.is_empty() && !name.contains('/') {
            return TokenShape::Slash { name, value };
        }
    }
    TokenShape::Plain
}

/// Whether the token would be claimed by dash-style option recognition.
pub(crate) fn is_dash_shaped(token: &str) -> bool {
    matches!(
        classify(token),
        TokenShape::Terminator | TokenShape::Long { .. } | TokenShape::Short { .. }
    )
}

fn split_value(text: &str, delimiter: char) -> (&str, Option<&str>) {
    match text.split_once(delimiter) {
        Some((head, tail)) => (head, Some(tail)),
        None => (text, None),
    }
}
