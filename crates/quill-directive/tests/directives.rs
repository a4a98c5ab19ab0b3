//! End-to-end extraction, resolution and chaining.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_directive::{
    CommandRegistry, DirectiveForm, DirectiveParser, Extractor, extract, group,
};
use serde_json::{Value, json};

fn upper(parameter: Value) -> Value {
    match parameter {
        Value::String(s) => Value::String(s.to_uppercase()),
        other => other,
    }
}

fn parser() -> DirectiveParser {
    DirectiveParser::new(CommandRegistry::new().with_fn("upper", upper))
}

#[test]
fn test_no_directives_yields_nothing() {
    assert!(extract("").unwrap().is_empty());
    assert!(extract("plain text with an @email.address and a: colon").unwrap().is_empty());
    assert!(parser().parse("fn main() {}").unwrap().is_empty());
}

#[test]
fn test_block_token() {
    let tokens = extract("@name: body @end-name").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].command_name, "name");
    assert_eq!(tokens[0].content, "body");
    assert_eq!(tokens[0].form, DirectiveForm::Block);
}

#[test]
fn test_line_token() {
    let tokens = extract("@name:: body;").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].command_name, "name");
    assert_eq!(tokens[0].content, "body");
    assert_eq!(tokens[0].form, DirectiveForm::Line);
}

#[test]
fn test_comment_wrappers() {
    let text = "\
/*: @title: Getting started @end-title */
<!--: @summary:: short; -->
//: @note: kept
across lines //: @end-note
";
    let tokens = extract(text).unwrap();
    let found: Vec<(&str, &str)> = tokens
        .iter()
        .map(|t| (t.command_name.as_str(), t.content.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("title", "Getting started"),
            ("note", "kept\nacross lines"),
            ("summary", "short"),
        ]
    );
}

#[test]
fn test_blocks_precede_lines() {
    let tokens = extract("@first:: 1; @second: 2 @end-second @third:: 3;").unwrap();
    let names: Vec<&str> = tokens.iter().map(|t| t.command_name.as_str()).collect();
    assert_eq!(names, vec!["second", "first", "third"]);
}

#[test]
fn test_generic_block_closer() {
    let tokens = extract("@note: any name closes @end-command").unwrap();
    assert_eq!(tokens[0].command_name, "note");
    assert_eq!(tokens[0].content, "any name closes");
}

#[test]
fn test_tab_stripping_option() {
    let text = "@doc:\n\tone\n\ttwo\n@end-doc";
    assert_eq!(extract(text).unwrap()[0].content, "one\ntwo");
    let kept = Extractor::new().with_strip_tabs(false).extract(text).unwrap();
    assert_eq!(kept[0].content, "one\n\ttwo");
}

#[test]
fn test_upper_end_to_end() {
    let directives = parser().parse("// @upper: hello @end-upper").unwrap();
    assert_eq!(directives.len(), 1);
    assert_eq!(directives[0].command(), "upper");
    assert_eq!(directives[0].parameter(), &json!("hello"));
    assert_eq!(directives[0].execute(None), json!("HELLO"));
}

#[test]
fn test_structured_parameter_end_to_end() {
    let directives = parser().parse("@set:: {\"x\":1};").unwrap();
    assert_eq!(directives.len(), 1);
    assert_eq!(directives[0].parameter(), &json!({"x": 1}));
}

#[test]
fn test_multiline_json_block() {
    let text = "/*: @package:\n\t{\n\t\t\"name\": \"quill\",\n\t\t\"private\": true\n\t}\n@end-package */";
    let directives = parser().parse(text).unwrap();
    assert_eq!(directives[0].parameter(), &json!({"name": "quill", "private": true}));
}

#[test]
fn test_unresolved_command_falls_back() {
    let directives = parser().parse("@missing:: value;").unwrap();
    assert!(!directives[0].is_resolved());
    assert_eq!(directives[0].execute(None), json!("value"));
}

#[test]
fn test_late_registration_is_picked_up() {
    let registry = Arc::new(CommandRegistry::new());
    let shared: Arc<CommandRegistry> = Arc::clone(&registry);
    let parser = DirectiveParser::from_shared(shared);
    let directives = parser.parse("@shout:: hey;").unwrap();
    assert_eq!(directives[0].execute(None), json!("hey"));

    registry.register_fn("shout", upper);
    assert_eq!(directives[0].execute(None), json!("HEY"));
}

#[test]
fn test_duplicate_name_grouping() {
    let directives = parser().parse("@foo:: 1; @foo:: 2; @bar:: 3;").unwrap();
    let grouped = group(directives.clone());

    assert_eq!(grouped.get("bar").and_then(|e| e.as_single()), Some(&directives[2]));
    let foo = grouped.get("foo").and_then(|e| e.as_many()).unwrap();
    assert_eq!(foo, &directives[..2]);
    assert_eq!(grouped.get_alias("foo.$0"), Some(&directives[0]));
    assert_eq!(grouped.get_alias("foo.$1"), Some(&directives[1]));

    assert_eq!(group(directives.clone()), group(directives));
}

#[test]
fn test_chain_terminates_on_self_reproduction() {
    let registry = CommandRegistry::new().with_fn("echo", |_| json!("@echo:: again;"));
    let parser = DirectiveParser::new(registry);
    let directive = parser.parse("@echo: @echo:: start; @end-echo").unwrap().remove(0);

    let mut state = quill_directive::ChainState::new();
    let result = directive.chain_with(None, &mut state).unwrap();
    assert_eq!(result, json!("@echo:: again;"));
    assert_eq!(state.tracked_name(), Some("echo"));
}

#[test]
fn test_change_and_rebuild() {
    let text = "title: @upper: draft @end-upper";
    let directive = parser().parse(text).unwrap().remove(0);

    let changed = directive.change("final");
    assert_eq!(changed.consume(), "title: @upper: final @end-upper");

    let rebuilt = changed.rebuild().unwrap().unwrap();
    assert_eq!(rebuilt.parameter(), &json!("final"));
    assert_eq!(rebuilt.execute(None), json!("FINAL"));
    assert_eq!(directive.raw(), text);
}

#[test]
fn test_collapse_everything() {
    let parser = parser();
    let mut text = "a /*: @upper: x @end-upper */ b @upper:: y; c".to_owned();

    while let Some(directive) = parser.parse(&text).unwrap().into_iter().next() {
        text = directive.collapse().consume().to_owned();
    }
    assert_eq!(text, "a  b  c");
}

#[test]
fn test_change_tab_indented_block() {
    let text = "/*:\n\t@upper:\n\t\tline one\n\t\tline two\n\t@end-upper\n*/";
    let directive = parser().parse(text).unwrap().remove(0);

    let changed = directive.change("edited");
    assert_ne!(changed.consume(), text);
    let rebuilt = changed.rebuild().unwrap().unwrap();
    assert_eq!(rebuilt.content(), "edited");
    assert_eq!(rebuilt.execute(None), json!("EDITED"));
}
