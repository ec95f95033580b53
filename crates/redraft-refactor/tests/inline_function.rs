use pretty_assertions::assert_eq;
use redraft_refactor::{
    apply_text_edits, inline_function, InlineFunctionError, Notice, Selection,
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
    let outcome = inline_function("main.ts", &src, Selection::cursor(caret)).unwrap();
    let updated = apply_text_edits(&src, &outcome.edit.edits).unwrap();
    (updated, outcome.notices)
}

fn run_err(input: &str) -> InlineFunctionError {
    let (src, caret) = extract_caret(input);
    inline_function("main.ts", &src, Selection::cursor(caret)).unwrap_err()
}

#[test]
fn inlines_a_single_call_site() {
    let (updated, notices) = run(r#"function /*caret*/sayHello() {
  console.log("Hello!");
}
sayHello();
"#);
    assert_eq!(
        updated,
        r#"console.log("Hello!");
"#
    );
    assert_eq!(notices, vec![]);
}

#[test]
fn omitted_argument_falls_back_to_the_default() {
    let (updated, _) = run(r#"function /*caret*/sayHello(name, lastName = "Smith") {
  console.log(name, lastName);
}
sayHello("Jane");
"#);
    assert_eq!(
        updated,
        r#"console.log("Jane", "Smith");
"#
    );
}

#[test]
fn multiple_returns_are_rejected() {
    let err = run_err(r#"function /*caret*/pick(n) {
  if (n > 0) {
    return "positive";
  }
  return "negative";
}
pick(1);
"#);
    assert_eq!(err, InlineFunctionError::MultipleReturns);
}

#[test]
fn early_return_is_rejected() {
    let err = run_err(r#"function /*caret*/guard(n) {
  if (n) {
    return;
  }
  console.log(n);
}
guard(1);
"#);
    assert_eq!(err, InlineFunctionError::MultipleReturns);
}

#[test]
fn return_call_site_keeps_the_return() {
    let (updated, _) = run(r#"function /*caret*/add(a, b) {
  return a + b;
}
function compute() {
  return add(1, 2);
}
"#);
    assert_eq!(
        updated,
        r#"function compute() {
  return 1 + 2;
}
"#
    );
}

#[test]
fn embedded_call_becomes_the_return_expression() {
    let (updated, _) = run(r#"function /*caret*/double(n) {
  return n * 2;
}
const result = double(4);
"#);
    assert_eq!(
        updated,
        r#"const result = 4 * 2;
"#
    );
}

#[test]
fn every_call_site_is_rewritten() {
    let (updated, _) = run(r#"function /*caret*/square(n) {
  return n * n;
}
console.log(square(2));
console.log(square(3));
"#);
    assert_eq!(
        updated,
        r#"console.log(2 * 2);
console.log(3 * 3);
"#
    );
}

#[test]
fn rest_parameter_captures_remaining_arguments() {
    let (updated, _) = run(r#"function /*caret*/logAll(first, ...rest) {
  console.log(first, rest);
}
logAll(1, 2, 3);
"#);
    assert_eq!(
        updated,
        r#"console.log(1, [2, 3]);
"#
    );
}

#[test]
fn object_parameter_unpacks_a_literal_argument() {
    let (updated, _) = run(r#"function /*caret*/show({ name, age }) {
  console.log(name, age);
}
show({ name: "Jane", age: 30 });
"#);
    assert_eq!(
        updated,
        r#"console.log("Jane", 30);
"#
    );
}

#[test]
fn object_parameter_accesses_an_identifier_argument() {
    let (updated, _) = run(r#"function /*caret*/show({ name }) {
  console.log(name);
}
show(user);
"#);
    assert_eq!(
        updated,
        r#"console.log(user.name);
"#
    );
}

#[test]
fn array_parameter_uses_indexed_access() {
    let (updated, _) = run(r#"function /*caret*/firstOf([head]) {
  return head;
}
const x = firstOf(items);
"#);
    assert_eq!(
        updated,
        r#"const x = items[0];
"#
    );
}

#[test]
fn value_reference_becomes_a_function_literal() {
    let (updated, _) = run(r#"function /*caret*/greet() {
  return "Hello";
}
const indirect = greet;
console.log(greet());
"#);
    assert_eq!(
        updated,
        r#"const indirect = function () {
  return "Hello";
};
console.log("Hello");
"#
    );
}

#[test]
fn assigned_function_with_many_statements_is_rejected() {
    let err = run_err(r#"function /*caret*/process() {
  console.log("a");
  console.log("b");
}
const p = process;
"#);
    assert_eq!(err, InlineFunctionError::AssignedFunctionWithManyStatements);
}

#[test]
fn assigned_function_without_return_is_rejected() {
    let err = run_err(r#"function /*caret*/ping() {
  console.log("ping");
}
const p = ping;
"#);
    assert_eq!(err, InlineFunctionError::AssignedFunctionWithoutReturn);
}

#[test]
fn exported_function_is_kept_and_reported_once() {
    let (updated, notices) = run(r#"export function /*caret*/helper() {
  return 1;
}
const x = helper();
"#);
    assert_eq!(
        updated,
        r#"export function helper() {
  return 1;
}
const x = 1;
"#
    );
    assert_eq!(
        notices,
        vec![Notice::KeptExportedDeclaration {
            name: "helper".to_string()
        }]
    );
}

#[test]
fn function_without_references_is_an_error() {
    let err = run_err(r#"function /*caret*/orphan() {
  return 1;
}
console.log("nothing");
"#);
    assert_eq!(err, InlineFunctionError::DidNotFindInlinableCode);
}

#[test]
fn recursive_function_is_an_error() {
    let err = run_err(r#"function /*caret*/countdown(n) {
  return countdown(n - 1);
}
countdown(3);
"#);
    assert_eq!(err, InlineFunctionError::DidNotFindInlinableCode);
}

#[test]
fn shadowing_function_keeps_its_own_call_sites() {
    let (updated, _) = run(r#"function /*caret*/ping() {
  return 1;
}
function wrapper() {
  function ping() {
    return 2;
  }
  return ping();
}
console.log(ping());
"#);
    assert_eq!(
        updated,
        r#"function wrapper() {
  function ping() {
    return 2;
  }
  return ping();
}
console.log(1);
"#
    );
}

#[test]
fn bare_call_splices_a_multi_statement_body() {
    let (updated, _) = run(r#"function /*caret*/setup() {
  const config = load();
  apply(config);
}
setup();
"#);
    assert_eq!(
        updated,
        r#"const config = load();
apply(config);
"#
    );
}

#[test]
fn bare_call_drops_the_final_return_keyword() {
    let (updated, _) = run(r#"function /*caret*/make() {
  prepare();
  return build();
}
make();
"#);
    assert_eq!(
        updated,
        r#"prepare();
build();
"#
    );
}

#[test]
fn spliced_body_is_reindented_for_the_call_site() {
    let (updated, _) = run(r#"function /*caret*/reset(value) {
  store(value);
}
function main() {
  reset(0);
}
"#);
    assert_eq!(
        updated,
        r#"function main() {
  store(0);
}
"#
    );
}

#[test]
fn comments_inside_the_body_travel_with_it() {
    let (updated, _) = run(r#"function /*caret*/touch(path) {
  // best effort
  poke(path);
}
touch("/tmp/x");
"#);
    assert_eq!(
        updated,
        r#"// best effort
poke("/tmp/x");
"#
    );
}
