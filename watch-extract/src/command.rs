//! The closed set of extraction commands.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How fetched content is reduced to the value compared across cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Command {
    /// Inner markup of every match, joined by newline.
    #[default]
    Html,
    /// Text content of every match, joined by newline.
    Text,
    /// Number of matching nodes.
    Count,
    /// Arithmetic sum of the integer parsed from each match's text.
    Sum,
    /// The fetched content itself; the query is ignored.
    Raw,
    /// A JSON document, optionally narrowed to the value at a path.
    Json,
}

impl Command {
    /// Returns the lowercase name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Raw => "raw",
            Self::Json => "json",
        }
    }

    /// Returns all available command variants.
    pub fn all() -> &'static [Command] {
        &[
            Self::Html,
            Self::Text,
            Self::Count,
            Self::Sum,
            Self::Raw,
            Self::Json,
        ]
    }

    /// Whether values produced by this command are diffed structurally.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Json)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|command| command.name() == s)
            .ok_or_else(|| ExtractError::UnsupportedCommand(s.to_owned()))
    }
}

impl TryFrom<String> for Command {
    type Error = ExtractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Command> for String {
    fn from(command: Command) -> Self {
        command.name().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_name() {
        for command in Command::all() {
            let parsed: Command = command.name().parse().expect("known name");
            assert_eq!(parsed, *command);
        }
    }

    #[test]
    fn unknown_name_is_unsupported() {
        let err = "foo".parse::<Command>().unwrap_err();
        assert_eq!(err, ExtractError::UnsupportedCommand("foo".into()));
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("HTML".parse::<Command>().is_err());
    }

    #[test]
    fn only_json_is_structured() {
        let structured: Vec<_> = Command::all()
            .iter()
            .filter(|c| c.is_structured())
            .collect();
        assert_eq!(structured, vec![&Command::Json]);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Command::Count).expect("serialize");
        assert_eq!(json, "\"count\"");
        let decoded: Command = serde_json::from_str("\"sum\"").expect("deserialize");
        assert_eq!(decoded, Command::Sum);
        assert!(serde_json::from_str::<Command>("\"foo\"").is_err());
    }

    #[test]
    fn default_is_html() {
        assert_eq!(Command::default(), Command::Html);
    }
}
