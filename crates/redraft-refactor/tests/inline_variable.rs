use pretty_assertions::assert_eq;
use redraft_refactor::{
    apply_text_edits, inline_variable, InlineVariableError, Notice, Selection, WorkspaceEdit,
};

fn extract_caret(input: &str) -> (String, usize) {
    let marker = "/*caret*/";
    let idx = input.find(marker).expect("caret marker not found");
    let mut out = input.to_string();
    out.replace_range(idx..idx + marker.len(), "");
    (out, idx)
}

fn run(input: &str) -> (String, Vec<Notice>) {
    let (src, caret) = extract_caret(input);
    let outcome = inline_variable("main.ts", &src, Selection::cursor(caret)).unwrap();
    let updated = apply_text_edits(&src, &outcome.edit.edits).unwrap();
    (updated, outcome.notices)
}

fn run_err(input: &str) -> InlineVariableError {
    let (src, caret) = extract_caret(input);
    inline_variable("main.ts", &src, Selection::cursor(caret)).unwrap_err()
}

#[test]
fn inlines_every_reference_and_removes_the_declaration() {
    let (updated, notices) = run(r#"const /*caret*/firstName = "Jane";
console.log(firstName);
greet(firstName);
"#);
    assert_eq!(
        updated,
        r#"console.log("Jane");
greet("Jane");
"#
    );
    assert_eq!(notices, vec![]);
}

#[test]
fn rerunning_on_the_output_finds_nothing() {
    let (updated, _) = run(r#"const /*caret*/firstName = "Jane";
console.log(firstName);
"#);
    assert!(!updated.contains("firstName"));
    let err = inline_variable("main.ts", &updated, Selection::cursor(0)).unwrap_err();
    assert_eq!(err, InlineVariableError::DidNotFindInlinableCode);
}

#[test]
fn shadowed_references_are_left_alone() {
    let (updated, _) = run(r#"const /*caret*/name = "outer";
function greet() {
  const name = "inner";
  console.log(name);
}
console.log(name);
"#);
    assert_eq!(
        updated,
        r#"function greet() {
  const name = "inner";
  console.log(name);
}
console.log("outer");
"#
    );
}

#[test]
fn reassigned_variable_is_rejected() {
    let err = run_err(r#"let /*caret*/count = 1;
count = 2;
console.log(count);
"#);
    assert_eq!(err, InlineVariableError::RedeclaredVariable);
}

#[test]
fn destructured_property_round_trip() {
    let (updated, _) = run(r#"const { /*caret*/name, age } = person;
console.log(name);
"#);
    assert_eq!(
        updated,
        r#"const { age } = person;
console.log(person.name);
"#
    );
}

#[test]
fn rest_sibling_keeps_the_residual_binding() {
    let (updated, _) = run(r#"const { /*caret*/name, ...others } = person;
console.log(name);
console.log(others);
"#);
    assert_eq!(
        updated,
        r#"const { ...others } = person;
console.log(person.name);
console.log(others);
"#
    );
}

#[test]
fn last_array_element_takes_its_delimiter_along() {
    let (updated, _) = run(r#"const [first, /*caret*/second] = items;
console.log(second);
"#);
    assert_eq!(
        updated,
        r#"const [first] = items;
console.log(items[1]);
"#
    );
}

#[test]
fn array_element_with_later_siblings_leaves_a_hole() {
    let (updated, _) = run(r#"const [/*caret*/first, second] = items;
console.log(first);
"#);
    assert_eq!(
        updated,
        r#"const [, second] = items;
console.log(items[0]);
"#
    );
}

#[test]
fn exported_declaration_is_kept_and_reported_once() {
    let (updated, notices) = run(r#"export const /*caret*/greeting = "Hello";
console.log(greeting);
console.log(greeting);
"#);
    assert_eq!(
        updated,
        r#"export const greeting = "Hello";
console.log("Hello");
console.log("Hello");
"#
    );
    assert_eq!(
        notices,
        vec![Notice::KeptExportedDeclaration {
            name: "greeting".to_string()
        }]
    );
}

#[test]
fn export_list_counts_as_exported() {
    let (updated, notices) = run(r#"const /*caret*/limit = 10;
check(limit);
export { limit };
"#);
    assert_eq!(
        updated,
        r#"const limit = 10;
check(10);
export { limit };
"#
    );
    assert_eq!(notices.len(), 1);
}

#[test]
fn unary_operand_is_parenthesized() {
    let (updated, _) = run(r#"const /*caret*/isValid = input === expected;
if (!isValid) {
  console.log("nope");
}
"#);
    assert_eq!(
        updated,
        r#"if (!(input === expected)) {
  console.log("nope");
}
"#
    );
}

#[test]
fn shorthand_property_is_written_out() {
    let (updated, _) = run(r#"const /*caret*/name = getName();
console.log({ name });
"#);
    assert_eq!(
        updated,
        r#"console.log({ name: getName() });
"#
    );
}

#[test]
fn sibling_declarator_survives() {
    let (updated, _) = run(r#"let /*caret*/a = 1, b = a + 2;
console.log(b);
"#);
    assert_eq!(
        updated,
        r#"let b = 1 + 2;
console.log(b);
"#
    );
}

#[test]
fn renamed_property_inlines_the_key() {
    let (updated, _) = run(r#"const { user: /*caret*/userName } = session;
console.log(userName);
"#);
    assert_eq!(
        updated,
        r#"console.log(session.user);
"#
    );
}

#[test]
fn nested_pattern_chains_every_segment() {
    let (updated, _) = run(r#"const { user: { /*caret*/name } } = session;
console.log(name);
"#);
    assert_eq!(
        updated,
        r#"console.log(session.user.name);
"#
    );
}

#[test]
fn member_expression_init_becomes_a_path() {
    let (updated, _) = run(r#"const { /*caret*/id } = response.data;
console.log(id);
"#);
    assert_eq!(
        updated,
        r#"console.log(response.data.id);
"#
    );
}

#[test]
fn type_alias_inlines_into_annotations() {
    let (updated, _) = run(r#"type /*caret*/Id = string | number;
function find(id: Id): Id {
  return id;
}
"#);
    assert_eq!(
        updated,
        r#"function find(id: string | number): string | number {
  return id;
}
"#
    );
}

#[test]
fn declaration_without_references_is_an_error() {
    let err = run_err(r#"const /*caret*/unused = 1;
console.log("hi");
"#);
    assert_eq!(err, InlineVariableError::DidNotFindInlinableCode);
}

#[test]
fn cursor_outside_any_declaration_is_an_error() {
    let err = run_err(r#"const a = 1;
/*caret*/console.log(a);
"#);
    assert_eq!(err, InlineVariableError::DidNotFindInlinableCode);
}

#[test]
fn declaration_inside_a_function_scope() {
    let (updated, _) = run(r#"function run() {
  const /*caret*/step = 2;
  return step * step;
}
"#);
    assert_eq!(
        updated,
        r#"function run() {
  return 2 * 2;
}
"#
    );
}

#[test]
fn rejection_leaves_no_edits_behind() {
    let (src, caret) = extract_caret(r#"let /*caret*/count = 1;
count = 2;
"#);
    let err = inline_variable("main.ts", &src, Selection::cursor(caret)).unwrap_err();
    assert_eq!(err, InlineVariableError::RedeclaredVariable);
    // The document is untouched: no outcome, so nothing to apply.
    assert_eq!(apply_text_edits(&src, &[]).unwrap(), src);
}

#[test]
fn edits_round_trip_through_json() {
    let (src, caret) = extract_caret("const /*caret*/a = 1;\ncheck(a);\n");
    let outcome = inline_variable("main.ts", &src, Selection::cursor(caret)).unwrap();
    let json = serde_json::to_string(&outcome.edit).unwrap();
    let back: WorkspaceEdit = serde_json::from_str(&json).unwrap();
    assert_eq!(back, outcome.edit);
}
