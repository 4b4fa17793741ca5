//! Rule book loading.
//!
//! The rule book is an XML file mapping canonical series names to a shell-quoted rule
//! string:
//!
//! ```xml
//! <rulebook>
//!   <series name="Westworld">season</series>
//!   <series name="One Piece">episode-only parent-dir format-title "{{title}} - {{episode}}"</series>
//!   <series name="Lost"/>
//! </rulebook>
//! ```
//!
//! Every rule string is parsed when the book is loaded, so a typo fails the run up
//! front instead of silently skipping a rule later. An entry without rules is valid
//! and yields the empty sequence.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::Rule;
use crate::config::path_has_symlink_ancestor;
use crate::errors::RuleParseError;
use crate::platform::write_config_secure_new_0600;

#[derive(Debug, Deserialize)]
#[serde(rename = "rulebook")]
#[serde(deny_unknown_fields)]
struct XmlRuleBook {
    #[serde(rename = "series", default)]
    series: Vec<XmlSeries>,
}

#[derive(Debug, Deserialize)]
struct XmlSeries {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "$text", default)]
    rules: String,
}

/// Canonical series names with their parsed rules, in file order.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    entries: Vec<(String, Vec<Rule>)>,
    by_name: HashMap<String, usize>,
}

impl RuleBook {
    /// Read and parse a rule book file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read rule book '{}'", path.display()))?;
        let book = Self::from_xml_str(&contents)
            .with_context(|| format!("parse rule book '{}'", path.display()))?;
        info!(path = %path.display(), series = book.len(), "rule book loaded");
        Ok(book)
    }

    pub fn from_xml_str(xml: &str) -> Result<Self> {
        let parsed: XmlRuleBook = from_xml_str(xml)?;
        let mut book = RuleBook::default();
        for s in parsed.series {
            let name = s.name.trim().to_string();
            let rules = Rule::parse_str(&name, &s.rules)?;
            book.insert(name, rules)?;
        }
        Ok(book)
    }

    /// Add an entry. Names must be unique.
    pub fn insert(&mut self, name: impl Into<String>, rules: Vec<Rule>) -> Result<(), RuleParseError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(RuleParseError::Duplicate(name));
        }
        debug!(series = %name, rules = rules.len(), "rule book entry");
        self.by_name.insert(name.clone(), self.entries.len());
        self.entries.push((name, rules));
        Ok(())
    }

    /// Exact lookup by canonical name.
    pub fn get(&self, name: &str) -> Option<&[Rule]> {
        self.by_name.get(name).map(|&i| self.entries[i].1.as_slice())
    }

    /// Canonical names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write a commented, empty rule book next to a freshly created config.
pub fn create_template_rulebook(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        anyhow::bail!(
            "Refusing to create rule book: ancestor of {} is a symlink",
            path.display()
        );
    }
    let content = "<!--\n  vfo rule book\n\n  One <series> element per library series. The name is matched (fuzzily) against the\n  title guessed from each file name; the text is a shell-quoted rule list applied in order:\n\n    season                    -> into \"Season <n>\" under the series folder (created if missing)\n    parent-dir                -> into the series folder itself\n    sub-dir <name>            -> into the named child folder, if it exists\n    format-title <template>   -> rename using {{title}}, {{season}}, {{episode}}, ... plus the extension\n    episode-only              -> fold the season into the episode number (S01E05 -> 15)\n    alternative-title         -> append the alternative title to the title\n\n  Example:\n    <series name=\"Westworld\">season</series>\n    <series name=\"One Piece\">episode-only parent-dir format-title \"{{title}} - {{episode}}\"</series>\n-->\n<rulebook>\n</rulebook>\n";
    write_config_secure_new_0600(path, content.as_bytes())?;
    info!("Created template rule book at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_order() {
        let xml = r#"
            <rulebook>
              <series name="Westworld">season</series>
              <series name="One Piece">episode-only parent-dir format-title "{{title}} - {{episode}}"</series>
              <series name="Lost"/>
            </rulebook>"#;
        let book = RuleBook::from_xml_str(xml).unwrap();
        assert_eq!(book.names().collect::<Vec<_>>(), vec!["Westworld", "One Piece", "Lost"]);
        assert_eq!(book.get("Westworld").unwrap(), &[Rule::Season]);
        assert_eq!(
            book.get("One Piece").unwrap(),
            &[
                Rule::EpisodeOnly,
                Rule::ParentDir,
                Rule::FormatTitle("{{title}} - {{episode}}".into())
            ]
        );
        assert!(book.get("Lost").unwrap().is_empty());
        assert!(book.get("lost").is_none());
    }

    #[test]
    fn invalid_rule_fails_load() {
        let xml = r#"<rulebook><series name="That 70s Show">invalid-rule</series></rulebook>"#;
        let err = RuleBook::from_xml_str(xml).unwrap_err();
        let parse = err.downcast_ref::<RuleParseError>().unwrap();
        assert!(matches!(parse, RuleParseError::UnknownRule { .. }));
    }

    #[test]
    fn duplicate_names_fail_load() {
        let xml = r#"<rulebook><series name="A">season</series><series name="A"/></rulebook>"#;
        let err = RuleBook::from_xml_str(xml).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RuleParseError>(),
            Some(&RuleParseError::Duplicate("A".into()))
        );
    }

    #[test]
    fn template_parses_as_empty_book() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("rule_book.xml");
        create_template_rulebook(&path).unwrap();
        let book = RuleBook::load(&path).unwrap();
        assert!(book.is_empty());
    }
}
