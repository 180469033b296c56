use std::collections::HashMap;

use hoist_core::{Error, NoPrompt, Origin, Prompter, Resolver, Variable, VariableSource};

/// Prompter that answers from a fixed list and records what was asked.
struct Scripted {
    answers: Vec<&'static str>,
    asked: Vec<&'static str>,
}

impl Scripted {
    fn new(answers: &[&'static str]) -> Self {
        Self {
            answers: answers.iter().rev().copied().collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for Scripted {
    fn is_interactive(&self) -> bool {
        true
    }

    fn prompt(&mut self, variable: &Variable) -> std::io::Result<String> {
        self.asked.push(variable.key);
        Ok(self.answers.pop().unwrap_or_default().to_owned())
    }
}

fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

const VARS: &[Variable] = &[
    Variable {
        key: "DOMAIN",
        description: "domain",
        default: None,
        required: true,
        secret: false,
    },
    Variable {
        key: "SITE_NAME",
        description: "name",
        default: Some("Lobsters"),
        required: true,
        secret: false,
    },
    Variable {
        key: "DB_PASSWORD",
        description: "db password",
        default: None,
        required: false,
        secret: true,
    },
];

#[test]
fn source_value_wins_over_default() {
    let src = source(&[("DOMAIN", "news.example.com"), ("SITE_NAME", "News")]);
    let inputs = Resolver::new(VARS).resolve(&src, &mut NoPrompt).unwrap();

    assert_eq!(inputs.get("DOMAIN"), Some("news.example.com"));
    assert_eq!(inputs.get("SITE_NAME"), Some("News"));
    assert_eq!(inputs.origin("SITE_NAME"), Some(Origin::Source));
}

#[test]
fn default_used_when_absent() {
    let src = source(&[("DOMAIN", "news.example.com")]);
    let inputs = Resolver::new(VARS).resolve(&src, &mut NoPrompt).unwrap();

    assert_eq!(inputs.get("SITE_NAME"), Some("Lobsters"));
    assert_eq!(inputs.origin("SITE_NAME"), Some(Origin::Default));
}

#[test]
fn optional_without_default_stays_unset() {
    let src = source(&[("DOMAIN", "news.example.com")]);
    let inputs = Resolver::new(VARS).resolve(&src, &mut NoPrompt).unwrap();

    assert_eq!(inputs.get("DB_PASSWORD"), None);
}

#[test]
fn empty_source_value_counts_as_absent() {
    let src = source(&[("DOMAIN", "   ")]);
    let err = Resolver::new(VARS).resolve(&src, &mut NoPrompt).unwrap_err();

    assert!(matches!(err, Error::MissingInput { key: "DOMAIN", .. }));
}

#[test]
fn missing_required_without_terminal_fails() {
    let src = source(&[]);
    let err = Resolver::new(VARS).resolve(&src, &mut NoPrompt).unwrap_err();

    assert!(matches!(err, Error::MissingInput { key: "DOMAIN", .. }));
    assert!(err.to_string().contains("DOMAIN"));
}

#[test]
fn missing_required_is_prompted() {
    let src = source(&[]);
    let mut prompter = Scripted::new(&["54.123.45.67"]);
    let inputs = Resolver::new(VARS).resolve(&src, &mut prompter).unwrap();

    assert_eq!(inputs.get("DOMAIN"), Some("54.123.45.67"));
    assert_eq!(inputs.origin("DOMAIN"), Some(Origin::Prompt));
    // Defaults and optionals are never prompted
    assert_eq!(prompter.asked, vec!["DOMAIN"]);
}

#[test]
fn empty_prompt_answer_is_fatal() {
    let src = source(&[]);
    let mut prompter = Scripted::new(&[""]);
    let err = Resolver::new(VARS).resolve(&src, &mut prompter).unwrap_err();

    assert!(matches!(err, Error::EmptyInput { key: "DOMAIN", .. }));
}

#[test]
fn debug_output_redacts_secret_inputs() {
    let src = source(&[("DOMAIN", "news.example.com"), ("DB_PASSWORD", "hunter2")]);
    let inputs = Resolver::new(VARS).resolve(&src, &mut NoPrompt).unwrap();

    let debug = format!("{inputs:?}");
    assert!(debug.contains("news.example.com"));
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("[REDACTED]"));
}

#[test]
fn hashmap_is_a_source() {
    let src = source(&[("A", "1")]);
    assert_eq!(VariableSource::get(&src, "A"), Some("1".to_owned()));
    assert_eq!(VariableSource::get(&src, "B"), None);
}
