//! Rule book files are validated completely when loaded.

use assert_fs::TempDir;
use assert_fs::prelude::*;

use vfo::{Rule, RuleBook, RuleParseError};

fn load(xml: &str) -> anyhow::Result<RuleBook> {
    let td = TempDir::new().unwrap();
    td.child("rule_book.xml").write_str(xml).unwrap();
    RuleBook::load(td.child("rule_book.xml").path())
}

fn parse_error(xml: &str) -> RuleParseError {
    let err = load(xml).unwrap_err();
    err.downcast_ref::<RuleParseError>()
        .cloned()
        .unwrap_or_else(|| panic!("expected a rule parse error, got {err:#}"))
}

#[test]
fn loads_typed_rules_with_quoted_arguments() {
    let book = load(
        r#"<rulebook>
  <series name="Doctor Who">sub-dir 'Doctor Who (2005)' season</series>
  <series name="Bleach">alternative-title episode-only parent-dir format-title "{{title}} - {{episode}}"</series>
  <series name="Lost"></series>
</rulebook>"#,
    )
    .unwrap();
    assert_eq!(book.len(), 3);
    assert_eq!(
        book.get("Doctor Who").unwrap(),
        &[Rule::SubDir("Doctor Who (2005)".into()), Rule::Season]
    );
    assert_eq!(book.get("Bleach").unwrap().len(), 4);
    assert!(book.get("Lost").unwrap().is_empty());
}

#[test]
fn unknown_rule_is_rejected() {
    assert_eq!(
        parse_error(r#"<rulebook><series name="Lost">seasons</series></rulebook>"#),
        RuleParseError::UnknownRule {
            series: "Lost".into(),
            token: "seasons".into()
        }
    );
}

#[test]
fn missing_argument_is_rejected() {
    assert!(matches!(
        parse_error(r#"<rulebook><series name="Lost">season sub-dir</series></rulebook>"#),
        RuleParseError::MissingArgument { .. }
    ));
}

#[test]
fn unbalanced_quotes_are_rejected() {
    assert_eq!(
        parse_error(r#"<rulebook><series name="Lost">format-title "{{title}}</series></rulebook>"#),
        RuleParseError::Unquote("Lost".into())
    );
}

#[test]
fn duplicate_series_is_rejected() {
    assert_eq!(
        parse_error(
            r#"<rulebook><series name="Lost">season</series><series name="Lost">parent-dir</series></rulebook>"#
        ),
        RuleParseError::Duplicate("Lost".into())
    );
}

#[test]
fn missing_file_mentions_path() {
    let td = TempDir::new().unwrap();
    let err = RuleBook::load(td.child("nope.xml").path()).unwrap_err();
    assert!(format!("{err:#}").contains("nope.xml"));
}
