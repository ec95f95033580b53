//! Inline Function.
//!
//! Splices a function's body into every call site, substituting each
//! parameter occurrence with the argument text (resolving defaults,
//! destructured parameters, and rest elements), then removes the
//! declaration. References in value position get an anonymous function
//! literal instead.

use std::collections::HashMap;

use redraft_syntax::js::{self, ast};
use redraft_types::Span;

use crate::edit::{FileId, Notice, TextEdit, TextRange, WorkspaceEdit};
use crate::scope::{self, IdentifierToReplace};
use crate::selection::{
    indentation_at, line_start, start_of_next_line, statement_deletion_range, Selection,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InlineFunctionError {
    #[error("cursor is not on an inlinable function declaration")]
    DidNotFindInlinableCode,
    #[error("functions with multiple return statements cannot be inlined")]
    MultipleReturns,
    #[error("a function used as a value must reduce to a single return statement")]
    AssignedFunctionWithoutReturn,
    #[error("a function used as a value must not have more than one statement")]
    AssignedFunctionWithManyStatements,
    #[error(transparent)]
    Edit(#[from] crate::edit::EditError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFunctionOutcome {
    pub edit: WorkspaceEdit,
    pub notices: Vec<Notice>,
}

pub fn inline_function(
    file: &str,
    source: &str,
    selection: Selection,
) -> Result<InlineFunctionOutcome, InlineFunctionError> {
    let parsed = js::parse(source);
    let program = parsed.program();
    let exports = scope::exported_names(&program.statements);

    let (scope_stmts, func) = find_function_at(&program.statements, selection)
        .ok_or(InlineFunctionError::DidNotFindInlinableCode)?;

    validate_return_shape(&func.body)?;

    let references = scope::find_references(&func.name.name, scope_stmts, func.name.range);
    if references.is_empty() {
        tracing::debug!(name = func.name.name.as_str(), "function has no references");
        return Err(InlineFunctionError::DidNotFindInlinableCode);
    }
    // A self-reference cannot survive the declaration's removal.
    if references
        .iter()
        .any(|reference| func.range.contains_span(reference.span))
    {
        tracing::debug!(name = func.name.name.as_str(), "function is recursive");
        return Err(InlineFunctionError::DidNotFindInlinableCode);
    }

    let classified: Vec<(IdentifierToReplace, FunctionReference<'_>)> = references
        .iter()
        .map(|reference| (*reference, classify_reference(scope_stmts, reference.span)))
        .collect();

    if classified
        .iter()
        .any(|(_, reference)| matches!(reference, FunctionReference::Value))
    {
        match func.body.statements.as_slice() {
            [] | [ast::Stmt::Return(_)] => {}
            [_] => return Err(InlineFunctionError::AssignedFunctionWithoutReturn),
            _ => return Err(InlineFunctionError::AssignedFunctionWithManyStatements),
        }
    }

    let file_id = FileId::new(file);
    let mut edits: Vec<TextEdit> = Vec::new();

    for (identifier, reference) in &classified {
        match reference {
            FunctionReference::Call { call, statement } => {
                let substitution = call_substitution(source, &func.params, &call.args)
                    .ok_or(InlineFunctionError::DidNotFindInlinableCode)?;
                match statement {
                    CallStatement::Bare(stmt_span) => {
                        let replacement = splice_statements(
                            source,
                            func,
                            &substitution,
                            *stmt_span,
                            ReturnHandling::Drop,
                        );
                        push_statement_edit(&mut edits, &file_id, source, *stmt_span, replacement);
                    }
                    CallStatement::Return(stmt_span) => {
                        let replacement = splice_statements(
                            source,
                            func,
                            &substitution,
                            *stmt_span,
                            ReturnHandling::Keep,
                        );
                        push_statement_edit(&mut edits, &file_id, source, *stmt_span, replacement);
                    }
                    CallStatement::Embedded => {
                        let text = return_expression_text(source, func, &substitution)
                            .ok_or(InlineFunctionError::DidNotFindInlinableCode)?;
                        edits.push(TextEdit::replace(file_id.clone(), call.range.into(), text));
                    }
                }
            }
            FunctionReference::Value => {
                let mut text = function_literal_text(source, func);
                if identifier.in_unary_expression {
                    text = format!("({text})");
                }
                if identifier.shorthand_key {
                    text = format!("{}: {}", func.name.name, text);
                }
                edits.push(TextEdit::replace(file_id.clone(), identifier.span.into(), text));
            }
        }
    }

    let mut notices = Vec::new();
    if func.exported || exports.contains(&func.name.name) {
        tracing::debug!(name = func.name.name.as_str(), "keeping exported declaration in place");
        notices.push(Notice::KeptExportedDeclaration {
            name: func.name.name.clone(),
        });
    } else {
        edits.push(TextEdit::delete(
            file_id,
            statement_deletion_range(source, func.range),
        ));
    }

    let mut edit = WorkspaceEdit::new(edits);
    edit.normalize()?;
    Ok(InlineFunctionOutcome { edit, notices })
}

fn validate_return_shape(body: &ast::Block) -> Result<(), InlineFunctionError> {
    let count = count_returns(&body.statements);
    if count > 1 {
        return Err(InlineFunctionError::MultipleReturns);
    }
    // A single return is only safe when it is the final statement; an early
    // return buried under trailing statements changes control flow.
    if count == 1 && !matches!(body.statements.last(), Some(ast::Stmt::Return(_))) {
        return Err(InlineFunctionError::MultipleReturns);
    }
    Ok(())
}

/// Count return statements, looking through blocks and branches but not
/// into nested functions, which keep their own returns.
fn count_returns(stmts: &[ast::Stmt]) -> usize {
    stmts
        .iter()
        .map(|stmt| match stmt {
            ast::Stmt::Return(_) => 1,
            ast::Stmt::Block(block) => count_returns(&block.statements),
            ast::Stmt::If(stmt) => {
                let mut count = count_returns(std::slice::from_ref(stmt.then_branch.as_ref()));
                if let Some(else_branch) = &stmt.else_branch {
                    count += count_returns(std::slice::from_ref(else_branch.as_ref()));
                }
                count
            }
            _ => 0,
        })
        .sum()
}

fn find_function_at<'a>(
    stmts: &'a [ast::Stmt],
    selection: Selection,
) -> Option<(&'a [ast::Stmt], &'a ast::FuncDecl)> {
    let mut found = None;

    for stmt in stmts {
        if !selection.is_inside(stmt.range()) {
            continue;
        }
        match stmt {
            ast::Stmt::Func(func) => {
                found = Some((stmts, func));
                if let Some(inner) = find_function_at(&func.body.statements, selection) {
                    found = Some(inner);
                }
            }
            ast::Stmt::Block(block) => {
                if let Some(inner) = find_function_at(&block.statements, selection) {
                    found = Some(inner);
                }
            }
            ast::Stmt::If(stmt) => {
                let then_branch = std::slice::from_ref(stmt.then_branch.as_ref());
                if let Some(inner) = find_function_at(then_branch, selection) {
                    found = Some(inner);
                }
                if let Some(else_branch) = &stmt.else_branch {
                    let else_branch = std::slice::from_ref(else_branch.as_ref());
                    if let Some(inner) = find_function_at(else_branch, selection) {
                        found = Some(inner);
                    }
                }
            }
            _ => {}
        }
    }

    found
}

#[derive(Debug)]
enum FunctionReference<'a> {
    Call {
        call: &'a ast::CallExpr,
        statement: CallStatement,
    },
    Value,
}

#[derive(Debug)]
enum CallStatement {
    /// The call is the whole expression statement; the spliced body replaces
    /// the statement and a final `return` drops down to its expression.
    Bare(Span),
    /// `return f(...)`: the spliced body replaces the statement, keeping the
    /// final return.
    Return(Span),
    /// The call sits inside a larger expression; only a single-return body
    /// can replace it.
    Embedded,
}

fn classify_reference<'a>(scope: &'a [ast::Stmt], span: Span) -> FunctionReference<'a> {
    let Some(stmt) = innermost_stmt(scope, span) else {
        return FunctionReference::Value;
    };

    match stmt {
        ast::Stmt::Expr(expr_stmt) => {
            if let ast::Expr::Call(call) = &expr_stmt.expr {
                if call.callee.range() == span {
                    return FunctionReference::Call {
                        call,
                        statement: CallStatement::Bare(expr_stmt.range),
                    };
                }
            }
            embedded_or_value(&expr_stmt.expr, span)
        }
        ast::Stmt::Return(ret) => {
            if let Some(ast::Expr::Call(call)) = &ret.expr {
                if call.callee.range() == span {
                    return FunctionReference::Call {
                        call,
                        statement: CallStatement::Return(ret.range),
                    };
                }
            }
            match &ret.expr {
                Some(expr) => embedded_or_value(expr, span),
                None => FunctionReference::Value,
            }
        }
        ast::Stmt::Var(decl) => {
            for declarator in &decl.declarators {
                if let Some(init) = &declarator.init {
                    if init.range().contains_span(span) {
                        return embedded_or_value(init, span);
                    }
                }
            }
            FunctionReference::Value
        }
        ast::Stmt::If(if_stmt) => embedded_or_value(&if_stmt.condition, span),
        ast::Stmt::Func(func) => {
            for param in &func.params {
                if let Some(default) = &param.default {
                    if default.range().contains_span(span) {
                        return embedded_or_value(default, span);
                    }
                }
            }
            FunctionReference::Value
        }
        _ => FunctionReference::Value,
    }
}

fn embedded_or_value<'a>(expr: &'a ast::Expr, span: Span) -> FunctionReference<'a> {
    match find_call_with_callee(expr, span) {
        Some(call) => FunctionReference::Call {
            call,
            statement: CallStatement::Embedded,
        },
        None => FunctionReference::Value,
    }
}

/// The innermost statement whose range contains `span`.
fn innermost_stmt<'a>(stmts: &'a [ast::Stmt], span: Span) -> Option<&'a ast::Stmt> {
    for stmt in stmts {
        if !stmt.range().contains_span(span) {
            continue;
        }
        let inner = match stmt {
            ast::Stmt::Func(func) => innermost_stmt(&func.body.statements, span),
            ast::Stmt::Block(block) => innermost_stmt(&block.statements, span),
            ast::Stmt::If(if_stmt) => {
                innermost_stmt(std::slice::from_ref(if_stmt.then_branch.as_ref()), span).or_else(
                    || {
                        if_stmt.else_branch.as_ref().and_then(|else_branch| {
                            innermost_stmt(std::slice::from_ref(else_branch.as_ref()), span)
                        })
                    },
                )
            }
            _ => None,
        };
        return Some(inner.unwrap_or(stmt));
    }
    None
}

fn find_call_with_callee<'a>(expr: &'a ast::Expr, span: Span) -> Option<&'a ast::CallExpr> {
    match expr {
        ast::Expr::Call(call) => {
            if call.callee.range() == span {
                return Some(call);
            }
            find_call_with_callee(&call.callee, span)
                .or_else(|| call.args.iter().find_map(|arg| find_call_with_callee(arg, span)))
        }
        ast::Expr::Member(member) => find_call_with_callee(&member.object, span)
            .or_else(|| find_call_with_callee(&member.property, span)),
        ast::Expr::Unary(unary) => find_call_with_callee(&unary.expr, span),
        ast::Expr::Binary(binary) => find_call_with_callee(&binary.lhs, span)
            .or_else(|| find_call_with_callee(&binary.rhs, span)),
        ast::Expr::Assign(assign) => find_call_with_callee(&assign.target, span)
            .or_else(|| find_call_with_callee(&assign.value, span)),
        ast::Expr::Cond(cond) => find_call_with_callee(&cond.test, span)
            .or_else(|| find_call_with_callee(&cond.cons, span))
            .or_else(|| find_call_with_callee(&cond.alt, span)),
        ast::Expr::Object(object) => object.props.iter().find_map(|prop| match prop {
            ast::ObjectLitProp::KeyValue(kv) => find_call_with_callee(&kv.value, span),
            ast::ObjectLitProp::Spread(spread) => find_call_with_callee(&spread.expr, span),
            ast::ObjectLitProp::Shorthand(_) => None,
        }),
        ast::Expr::Array(array) => array
            .elements
            .iter()
            .flatten()
            .find_map(|element| find_call_with_callee(element, span)),
        _ => None,
    }
}

/// A value an argument (or a piece of one) binds to during substitution:
/// either a real argument expression, or synthesized access text.
enum BoundValue<'a> {
    Expr(&'a ast::Expr),
    Text(String),
}

impl BoundValue<'_> {
    fn into_text(self, source: &str) -> String {
        match self {
            BoundValue::Expr(expr) => slice_span(source, expr.range()).trim().to_string(),
            BoundValue::Text(text) => text,
        }
    }

    /// The text to build member/index access on, parenthesized when the
    /// expression would otherwise bind tighter than the access.
    fn access_base(&self, source: &str) -> String {
        match self {
            BoundValue::Expr(expr) => {
                let text = slice_span(source, expr.range()).trim();
                if matches!(
                    expr,
                    ast::Expr::Binary(_)
                        | ast::Expr::Cond(_)
                        | ast::Expr::Assign(_)
                        | ast::Expr::Unary(_)
                ) {
                    format!("({text})")
                } else {
                    text.to_string()
                }
            }
            BoundValue::Text(text) => text.clone(),
        }
    }
}

/// Build the parameter-name -> replacement-text substitution for one call.
/// Returns `None` when an argument cannot be decomposed the way the
/// parameter list requires.
fn call_substitution(
    source: &str,
    params: &[ast::Param],
    args: &[ast::Expr],
) -> Option<HashMap<String, String>> {
    let mut out = HashMap::new();

    for (index, param) in params.iter().enumerate() {
        if param.rest {
            let ast::Pat::Ident(ident) = &param.pat else {
                return None;
            };
            let rest: Vec<String> = args
                .iter()
                .skip(index)
                .map(|arg| slice_span(source, arg.range()).trim().to_string())
                .collect();
            out.insert(ident.name.clone(), format!("[{}]", rest.join(", ")));
            continue;
        }

        let bound = args.get(index).or(param.default.as_ref());
        match (&param.pat, bound) {
            (ast::Pat::Ident(ident), Some(expr)) => {
                out.insert(
                    ident.name.clone(),
                    slice_span(source, expr.range()).trim().to_string(),
                );
            }
            (ast::Pat::Ident(ident), None) => {
                out.insert(ident.name.clone(), "undefined".to_string());
            }
            (pat, Some(expr)) => bind_pattern(source, pat, BoundValue::Expr(expr), &mut out)?,
            (_, None) => return None,
        }
    }

    Some(out)
}

fn bind_pattern(
    source: &str,
    pat: &ast::Pat,
    value: BoundValue<'_>,
    out: &mut HashMap<String, String>,
) -> Option<()> {
    match pat {
        ast::Pat::Ident(ident) => {
            out.insert(ident.name.clone(), value.into_text(source));
            Some(())
        }
        ast::Pat::Object(object) => bind_object_pattern(source, object, value, out),
        ast::Pat::Array(array) => bind_array_pattern(source, array, value, out),
    }
}

enum ParamKey {
    Named(String),
    Literal(String),
}

impl ParamKey {
    fn access(&self, base: &str) -> String {
        match self {
            ParamKey::Named(name) => format!("{base}.{name}"),
            ParamKey::Literal(raw) => format!("{base}[{raw}]"),
        }
    }

    fn matches(&self, key: &ast::PropKey) -> bool {
        match (self, key) {
            (ParamKey::Named(name), ast::PropKey::Ident(ident)) => ident.name == *name,
            (ParamKey::Named(name), ast::PropKey::Lit(lit)) => strip_quotes(&lit.raw) == *name,
            (ParamKey::Literal(raw), ast::PropKey::Lit(lit)) => lit.raw == *raw,
            (ParamKey::Literal(raw), ast::PropKey::Ident(ident)) => {
                strip_quotes(raw) == ident.name
            }
            (_, ast::PropKey::Computed(_)) => false,
        }
    }

    fn matches_name(&self, name: &str) -> bool {
        match self {
            ParamKey::Named(own) => own == name,
            ParamKey::Literal(raw) => strip_quotes(raw) == name,
        }
    }
}

fn strip_quotes(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '\'')
}

fn param_key(key: &ast::PatKey) -> Option<ParamKey> {
    match key {
        ast::PatKey::Ident(ident) => Some(ParamKey::Named(ident.name.clone())),
        ast::PatKey::Lit(lit) => Some(ParamKey::Literal(lit.raw.clone())),
        ast::PatKey::Computed(_) => None,
    }
}

fn bind_object_pattern(
    source: &str,
    object: &ast::ObjectPat,
    value: BoundValue<'_>,
    out: &mut HashMap<String, String>,
) -> Option<()> {
    for prop in &object.props {
        match prop {
            ast::ObjectPatProp::KeyValue(kv) => {
                let key = param_key(&kv.key)?;
                let bound = match &value {
                    BoundValue::Expr(ast::Expr::Object(lit)) => {
                        object_literal_lookup(source, lit, &key)?
                    }
                    other => BoundValue::Text(key.access(&other.access_base(source))),
                };
                bind_pattern(source, &kv.value, bound, out)?;
            }
            ast::ObjectPatProp::Rest(rest) => {
                // The leftover keys are only statically known for a literal
                // argument.
                let BoundValue::Expr(ast::Expr::Object(lit)) = &value else {
                    return None;
                };
                let taken: Vec<ParamKey> = object
                    .props
                    .iter()
                    .filter_map(|p| match p {
                        ast::ObjectPatProp::KeyValue(kv) => param_key(&kv.key),
                        ast::ObjectPatProp::Rest(_) => None,
                    })
                    .collect();
                let mut leftover = Vec::new();
                for lit_prop in &lit.props {
                    match lit_prop {
                        ast::ObjectLitProp::KeyValue(kv) => {
                            if !taken.iter().any(|key| key.matches(&kv.key)) {
                                leftover.push(slice_span(source, kv.range).trim().to_string());
                            }
                        }
                        ast::ObjectLitProp::Shorthand(ident) => {
                            if !taken.iter().any(|key| key.matches_name(&ident.name)) {
                                leftover.push(ident.name.clone());
                            }
                        }
                        // A spread makes the leftover set unknowable.
                        ast::ObjectLitProp::Spread(_) => return None,
                    }
                }
                let text = if leftover.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", leftover.join(", "))
                };
                out.insert(rest.arg.name.clone(), text);
            }
        }
    }
    Some(())
}

/// Resolve a pattern key against an object-literal argument.
fn object_literal_lookup<'a>(
    source: &str,
    lit: &'a ast::ObjectLit,
    key: &ParamKey,
) -> Option<BoundValue<'a>> {
    let has_spread = lit
        .props
        .iter()
        .any(|prop| matches!(prop, ast::ObjectLitProp::Spread(_)));

    for prop in &lit.props {
        match prop {
            ast::ObjectLitProp::KeyValue(kv) => {
                if key.matches(&kv.key) {
                    return Some(BoundValue::Expr(&kv.value));
                }
            }
            ast::ObjectLitProp::Shorthand(ident) => {
                if key.matches_name(&ident.name) {
                    return Some(BoundValue::Text(ident.name.clone()));
                }
            }
            ast::ObjectLitProp::Spread(_) => {}
        }
    }

    if has_spread {
        // The key may come from the spread; there is no static answer.
        let _ = source;
        return None;
    }
    Some(BoundValue::Text("undefined".to_string()))
}

fn bind_array_pattern(
    source: &str,
    array: &ast::ArrayPat,
    value: BoundValue<'_>,
    out: &mut HashMap<String, String>,
) -> Option<()> {
    for (index, element) in array.elements.iter().enumerate() {
        match element {
            ast::ArrayPatElem::Hole(_) => {}
            ast::ArrayPatElem::Pat(pat) => {
                let bound = match &value {
                    BoundValue::Expr(ast::Expr::Array(lit)) => match lit.elements.get(index) {
                        Some(Some(expr)) => BoundValue::Expr(expr),
                        _ => BoundValue::Text("undefined".to_string()),
                    },
                    other => BoundValue::Text(format!("{}[{index}]", other.access_base(source))),
                };
                bind_pattern(source, pat, bound, out)?;
            }
            ast::ArrayPatElem::Rest(rest) => {
                let BoundValue::Expr(ast::Expr::Array(lit)) = &value else {
                    return None;
                };
                let items: Vec<String> = lit
                    .elements
                    .get(index..)
                    .unwrap_or(&[])
                    .iter()
                    .map(|element| match element {
                        Some(expr) => slice_span(source, expr.range()).trim().to_string(),
                        None => "undefined".to_string(),
                    })
                    .collect();
                out.insert(rest.arg.name.clone(), format!("[{}]", items.join(", ")));
            }
        }
    }
    Some(())
}

enum ReturnHandling {
    Keep,
    Drop,
}

/// Render the callee's statements re-indented for the call site, with every
/// parameter occurrence substituted. Comments travel with the sliced text.
fn splice_statements(
    source: &str,
    func: &ast::FuncDecl,
    substitution: &HashMap<String, String>,
    site_span: Span,
    return_handling: ReturnHandling,
) -> String {
    let stmts = &func.body.statements;
    let Some(first) = stmts.first() else {
        return String::new();
    };
    let last = stmts.last().unwrap();

    let site_indent = indentation_at(source, site_span.start);
    let body_indent = indentation_at(source, first.range().start);

    let drop_final_return =
        matches!(return_handling, ReturnHandling::Drop) && matches!(last, ast::Stmt::Return(_));

    // Start right after the `{` line so comments before the first statement
    // travel along; a single-line body starts at the statement itself.
    let brace_line = line_start(source, func.body.range.start);
    let first_line = line_start(source, first.range().start);
    let region_start = if brace_line == first_line {
        first.range().start
    } else {
        start_of_next_line(source, func.body.range.start)
    };
    let region_end = if drop_final_return {
        line_start(source, last.range().start).max(region_start)
    } else {
        last.range().end
    };

    let mut lines = Vec::new();
    for line in source[region_start..region_end].lines() {
        let stripped = line.strip_prefix(body_indent.as_str()).unwrap_or_else(|| line.trim_start());
        if stripped.is_empty() {
            lines.push(String::new());
        } else {
            lines.push(format!("{site_indent}{stripped}"));
        }
    }

    if drop_final_return {
        if let ast::Stmt::Return(ret) = last {
            if let Some(expr) = &ret.expr {
                let text = slice_span(source, expr.range()).trim();
                lines.push(format!("{site_indent}{text};"));
            }
        }
    }

    substitute_idents(&lines.join("\n"), substitution)
}

/// The text a call in expression position is replaced with: the substituted
/// return expression, or `undefined` for an empty body.
fn return_expression_text(
    source: &str,
    func: &ast::FuncDecl,
    substitution: &HashMap<String, String>,
) -> Option<String> {
    match func.body.statements.as_slice() {
        [] => Some("undefined".to_string()),
        [ast::Stmt::Return(ret)] => match &ret.expr {
            Some(expr) => {
                let text = slice_span(source, expr.range()).trim();
                Some(substitute_idents(text, substitution))
            }
            None => Some("undefined".to_string()),
        },
        _ => None,
    }
}

/// The anonymous function literal replacing a reference in value position.
fn function_literal_text(source: &str, func: &ast::FuncDecl) -> String {
    let tail = slice_span(source, Span::new(func.params_range.start, func.body.range.end));
    format!("function {tail}")
}

fn push_statement_edit(
    edits: &mut Vec<TextEdit>,
    file_id: &FileId,
    source: &str,
    stmt_span: Span,
    replacement: String,
) {
    if replacement.is_empty() {
        edits.push(TextEdit::delete(
            file_id.clone(),
            statement_deletion_range(source, stmt_span),
        ));
        return;
    }

    let line = line_start(source, stmt_span.start);
    if source[line..stmt_span.start].trim().is_empty() {
        edits.push(TextEdit::replace(
            file_id.clone(),
            TextRange::new(line, stmt_span.end),
            replacement,
        ));
    } else {
        // The statement shares its line; leave the prefix alone.
        edits.push(TextEdit::replace(
            file_id.clone(),
            TextRange::new(stmt_span.start, stmt_span.end),
            replacement.trim_start().to_string(),
        ));
    }
}

/// Replace whole-word occurrences of mapped identifiers. Skips member
/// accesses (`obj.name`) but not spreads (`...rest`).
fn substitute_idents(text: &str, mapping: &HashMap<String, String>) -> String {
    if mapping.is_empty() || text.is_empty() {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if is_ident_char_byte(bytes[i]) {
            let start = i;
            i += 1;
            while i < bytes.len() && is_ident_char_byte(bytes[i]) {
                i += 1;
            }
            out.push_str(&text[last..start]);
            let ident = &text[start..i];
            let after_member_dot = start > 0
                && bytes[start - 1] == b'.'
                && !(start >= 3 && bytes[start - 2] == b'.' && bytes[start - 3] == b'.');
            match mapping.get(ident) {
                Some(replacement) if !after_member_dot => out.push_str(replacement),
                _ => out.push_str(ident),
            }
            last = i;
            continue;
        }
        i += 1;
    }
    out.push_str(&text[last..]);
    out
}

fn is_ident_char_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

fn slice_span<'a>(text: &'a str, span: Span) -> &'a str {
    text.get(span.start..span.end).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_syntax::js;

    fn substitution_for(source: &str, args_source: &str) -> Option<HashMap<String, String>> {
        let combined = format!("{source}\n{args_source}");
        let parsed = js::parse(&combined);
        let ast::Stmt::Func(func) = &parsed.program().statements[0] else {
            panic!("expected a function declaration");
        };
        let ast::Stmt::Expr(stmt) = &parsed.program().statements[1] else {
            panic!("expected a call statement");
        };
        let ast::Expr::Call(call) = &stmt.expr else {
            panic!("expected a call expression");
        };
        call_substitution(&combined, &func.params, &call.args)
    }

    #[test]
    fn defaults_fill_omitted_arguments() {
        let subst = substitution_for(
            "function f(name, lastName = \"Smith\") {}",
            "f(\"Jane\");",
        )
        .unwrap();
        assert_eq!(subst["name"], "\"Jane\"");
        assert_eq!(subst["lastName"], "\"Smith\"");
    }

    #[test]
    fn missing_argument_without_default_becomes_undefined() {
        let subst = substitution_for("function f(a, b) {}", "f(1);").unwrap();
        assert_eq!(subst["a"], "1");
        assert_eq!(subst["b"], "undefined");
    }

    #[test]
    fn rest_parameter_collects_remaining_arguments() {
        let subst = substitution_for("function f(first, ...rest) {}", "f(1, 2, 3);").unwrap();
        assert_eq!(subst["first"], "1");
        assert_eq!(subst["rest"], "[2, 3]");
    }

    #[test]
    fn object_pattern_against_literal_argument() {
        let subst = substitution_for(
            "function f({ name, age }) {}",
            "f({ name: \"Jane\", age: 30 });",
        )
        .unwrap();
        assert_eq!(subst["name"], "\"Jane\"");
        assert_eq!(subst["age"], "30");
    }

    #[test]
    fn object_pattern_against_identifier_argument() {
        let subst = substitution_for("function f({ name }) {}", "f(user);").unwrap();
        assert_eq!(subst["name"], "user.name");
    }

    #[test]
    fn object_rest_collects_leftover_literal_keys() {
        let subst = substitution_for(
            "function f({ name, ...meta }) {}",
            "f({ name: \"Jane\", age: 30, role: \"admin\" });",
        )
        .unwrap();
        assert_eq!(subst["name"], "\"Jane\"");
        assert_eq!(subst["meta"], "{ age: 30, role: \"admin\" }");
    }

    #[test]
    fn object_rest_needs_a_literal_argument() {
        assert!(substitution_for("function f({ name, ...meta }) {}", "f(user);").is_none());
    }

    #[test]
    fn array_pattern_uses_indexed_access() {
        let subst = substitution_for("function f([head, second]) {}", "f(items);").unwrap();
        assert_eq!(subst["head"], "items[0]");
        assert_eq!(subst["second"], "items[1]");
    }

    #[test]
    fn nested_array_pattern_against_literal() {
        let subst = substitution_for(
            "function f([first, [inner]]) {}",
            "f([a, [b]]);",
        )
        .unwrap();
        assert_eq!(subst["first"], "a");
        assert_eq!(subst["inner"], "b");
    }

    #[test]
    fn array_rest_collects_remaining_literal_elements() {
        let subst = substitution_for("function f([head, ...tail]) {}", "f([1, 2, 3]);").unwrap();
        assert_eq!(subst["head"], "1");
        assert_eq!(subst["tail"], "[2, 3]");
    }

    #[test]
    fn substitution_skips_member_access_names() {
        let mut mapping = HashMap::new();
        mapping.insert("name".to_string(), "user".to_string());
        assert_eq!(
            substitute_idents("console.log(name, obj.name)", &mapping),
            "console.log(user, obj.name)"
        );
    }
}
