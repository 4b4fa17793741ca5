//! Rule language for placing episodes inside a library folder.
//! - `Rule`: closed set of rule kinds with typed arguments.
//! - `book`: loads the rule book (series name -> rules) from XML.
//! - `interpreter`: applies a rule sequence to produce a `TransferPlan`.

pub mod book;
pub mod interpreter;

use std::fmt;

use crate::errors::RuleParseError;

pub use book::RuleBook;
pub use interpreter::{PlanContext, plan_transfer};

/// One placement rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Place into (or create) the "Season <n>" child of the matched folder.
    Season,
    /// Place directly into the matched folder.
    ParentDir,
    /// Place into the named child of the matched folder, when it exists.
    SubDir(String),
    /// Rename the file from a `{{field}}` template plus the container extension.
    FormatTitle(String),
    /// Fold season into the episode number (S01E05 -> episode 15).
    EpisodeOnly,
    /// Append the alternative title to the title.
    AlternativeTitle,
}

impl Rule {
    /// Parse a token sequence into rules. Arguments are taken from the following token.
    pub fn parse_tokens<S: AsRef<str>>(series: &str, tokens: &[S]) -> Result<Vec<Rule>, RuleParseError> {
        let mut rules = Vec::with_capacity(tokens.len());
        let mut iter = tokens.iter().map(AsRef::as_ref);
        while let Some(token) = iter.next() {
            let rule = match token {
                "season" => Rule::Season,
                "parent-dir" => Rule::ParentDir,
                "episode-only" => Rule::EpisodeOnly,
                "alternative-title" => Rule::AlternativeTitle,
                "sub-dir" | "format-title" => {
                    let arg = iter.next().ok_or_else(|| RuleParseError::MissingArgument {
                        series: series.to_string(),
                        rule: token.to_string(),
                    })?;
                    if token == "sub-dir" {
                        Rule::SubDir(arg.to_string())
                    } else {
                        Rule::FormatTitle(arg.to_string())
                    }
                }
                other => {
                    return Err(RuleParseError::UnknownRule {
                        series: series.to_string(),
                        token: other.to_string(),
                    });
                }
            };
            rules.push(rule);
        }
        Ok(rules)
    }

    /// Split a shell-quoted rule string and parse it.
    pub fn parse_str(series: &str, raw: &str) -> Result<Vec<Rule>, RuleParseError> {
        let tokens = shlex::split(raw).ok_or_else(|| RuleParseError::Unquote(series.to_string()))?;
        Self::parse_tokens(series, &tokens)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Season => f.write_str("season"),
            Rule::ParentDir => f.write_str("parent-dir"),
            Rule::SubDir(name) => write!(f, "sub-dir {name:?}"),
            Rule::FormatTitle(tpl) => write!(f, "format-title {tpl:?}"),
            Rule::EpisodeOnly => f.write_str("episode-only"),
            Rule::AlternativeTitle => f.write_str("alternative-title"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_arguments() {
        let rules = Rule::parse_str(
            "Show",
            r#"episode-only format-title "{{ title }} - {{ episode }}" sub-dir 'Season Specials'"#,
        )
        .unwrap();
        assert_eq!(
            rules,
            vec![
                Rule::EpisodeOnly,
                Rule::FormatTitle("{{ title }} - {{ episode }}".into()),
                Rule::SubDir("Season Specials".into()),
            ]
        );
    }

    #[test]
    fn empty_string_is_no_op_sequence() {
        assert!(Rule::parse_str("Show", "   ").unwrap().is_empty());
    }

    #[test]
    fn unknown_token_rejected() {
        let err = Rule::parse_str("That 70s Show", "season invalid-rule").unwrap_err();
        assert_eq!(
            err,
            RuleParseError::UnknownRule {
                series: "That 70s Show".into(),
                token: "invalid-rule".into()
            }
        );
    }

    #[test]
    fn missing_argument_rejected() {
        let err = Rule::parse_str("Show", "parent-dir sub-dir").unwrap_err();
        assert!(matches!(err, RuleParseError::MissingArgument { ref rule, .. } if rule == "sub-dir"));
    }

    #[test]
    fn unbalanced_quote_rejected() {
        let err = Rule::parse_str("Show", r#"format-title "oops"#).unwrap_err();
        assert_eq!(err, RuleParseError::Unquote("Show".into()));
    }
}
