//! Scope-aware reference resolution.
//!
//! A binding is identified by its name plus the statement list it was
//! declared in. Resolution walks that statement list and every nested scope
//! that does not redeclare the name; a nested function or block introducing
//! the same name shadows the outer binding and its whole subtree is skipped.

use redraft_syntax::js::ast;
use redraft_types::Span;

use std::collections::HashSet;

/// One reference occurrence, with the syntactic context needed to produce a
/// valid replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IdentifierToReplace {
    pub span: Span,
    /// The reference is the direct operand of a unary operator; the
    /// replacement must be parenthesized to keep precedence intact.
    pub in_unary_expression: bool,
    /// The reference is a shorthand object property (`{ name }`); the
    /// replacement must be written out as `name: <value>`.
    pub shorthand_key: bool,
}

/// Find every reference to `name` inside `scope`, excluding the declaration
/// site itself (`exclude`, the binding pattern's span) and anything shadowed
/// by a nested redeclaration.
pub(crate) fn find_references(
    name: &str,
    scope: &[ast::Stmt],
    exclude: Span,
) -> Vec<IdentifierToReplace> {
    let mut out = Vec::new();
    walk_stmts(name, scope, exclude, &mut out);
    out
}

fn walk_stmts(name: &str, stmts: &[ast::Stmt], exclude: Span, out: &mut Vec<IdentifierToReplace>) {
    for stmt in stmts {
        walk_stmt(name, stmt, exclude, out);
    }
}

fn walk_stmt(name: &str, stmt: &ast::Stmt, exclude: Span, out: &mut Vec<IdentifierToReplace>) {
    match stmt {
        ast::Stmt::Var(decl) => {
            for declarator in &decl.declarators {
                // The pattern side is a binding position, never a reference.
                if let Some(init) = &declarator.init {
                    walk_expr(name, init, exclude, false, out);
                }
            }
        }
        ast::Stmt::Func(func) => {
            // The declaration-position name is not a reference, and a
            // parameter with the binding's name shadows the whole function.
            if params_bind(&func.params, name) {
                return;
            }
            for param in &func.params {
                if let Some(default) = &param.default {
                    walk_expr(name, default, exclude, false, out);
                }
            }
            if !redeclares(&func.body.statements, name) {
                walk_stmts(name, &func.body.statements, exclude, out);
            }
        }
        ast::Stmt::Block(block) => {
            if !redeclares(&block.statements, name) {
                walk_stmts(name, &block.statements, exclude, out);
            }
        }
        ast::Stmt::If(stmt) => {
            walk_expr(name, &stmt.condition, exclude, false, out);
            walk_stmt(name, &stmt.then_branch, exclude, out);
            if let Some(else_branch) = &stmt.else_branch {
                walk_stmt(name, else_branch, exclude, out);
            }
        }
        ast::Stmt::Return(stmt) => {
            if let Some(expr) = &stmt.expr {
                walk_expr(name, expr, exclude, false, out);
            }
        }
        ast::Stmt::Expr(stmt) => walk_expr(name, &stmt.expr, exclude, false, out),
        // Export lists name bindings but rewriting them would not produce
        // valid code; the export check handles these separately.
        ast::Stmt::ExportNames(_) | ast::Stmt::TypeAlias(_) | ast::Stmt::Empty(_) => {}
    }
}

fn walk_expr(
    name: &str,
    expr: &ast::Expr,
    exclude: Span,
    in_unary: bool,
    out: &mut Vec<IdentifierToReplace>,
) {
    match expr {
        ast::Expr::Ident(ident) => {
            if ident.name == name && !exclude.contains_span(ident.range) {
                out.push(IdentifierToReplace {
                    span: ident.range,
                    in_unary_expression: in_unary,
                    shorthand_key: false,
                });
            }
        }
        ast::Expr::Member(member) => {
            walk_expr(name, &member.object, exclude, false, out);
            // A non-computed property is a name, not a reference.
            if member.computed {
                walk_expr(name, &member.property, exclude, false, out);
            }
        }
        ast::Expr::Call(call) => {
            walk_expr(name, &call.callee, exclude, false, out);
            for arg in &call.args {
                walk_expr(name, arg, exclude, false, out);
            }
        }
        ast::Expr::Unary(unary) => walk_expr(name, &unary.expr, exclude, true, out),
        ast::Expr::Binary(binary) => {
            walk_expr(name, &binary.lhs, exclude, false, out);
            walk_expr(name, &binary.rhs, exclude, false, out);
        }
        ast::Expr::Assign(assign) => {
            walk_expr(name, &assign.target, exclude, false, out);
            walk_expr(name, &assign.value, exclude, false, out);
        }
        ast::Expr::Cond(cond) => {
            walk_expr(name, &cond.test, exclude, false, out);
            walk_expr(name, &cond.cons, exclude, false, out);
            walk_expr(name, &cond.alt, exclude, false, out);
        }
        ast::Expr::Object(object) => {
            for prop in &object.props {
                match prop {
                    ast::ObjectLitProp::KeyValue(kv) => {
                        if let ast::PropKey::Computed(key) = &kv.key {
                            walk_expr(name, key, exclude, false, out);
                        }
                        walk_expr(name, &kv.value, exclude, false, out);
                    }
                    ast::ObjectLitProp::Shorthand(ident) => {
                        if ident.name == name && !exclude.contains_span(ident.range) {
                            out.push(IdentifierToReplace {
                                span: ident.range,
                                in_unary_expression: false,
                                shorthand_key: true,
                            });
                        }
                    }
                    ast::ObjectLitProp::Spread(spread) => {
                        walk_expr(name, &spread.expr, exclude, false, out);
                    }
                }
            }
        }
        ast::Expr::Array(array) => {
            for element in array.elements.iter().flatten() {
                walk_expr(name, element, exclude, false, out);
            }
        }
        ast::Expr::Lit(_) | ast::Expr::This(_) | ast::Expr::Missing(_) => {}
    }
}

/// Whether a statement list redeclares `name` at its top level, starting a
/// new binding that shadows the outer one.
fn redeclares(stmts: &[ast::Stmt], name: &str) -> bool {
    stmts.iter().any(|stmt| match stmt {
        ast::Stmt::Var(decl) => decl
            .declarators
            .iter()
            .any(|declarator| pattern_binds(&declarator.id, name)),
        ast::Stmt::Func(func) => func.name.name == name,
        _ => false,
    })
}

fn params_bind(params: &[ast::Param], name: &str) -> bool {
    params.iter().any(|param| pattern_binds(&param.pat, name))
}

/// Whether a binding pattern introduces `name`, at any nesting depth.
pub(crate) fn pattern_binds(pat: &ast::Pat, name: &str) -> bool {
    match pat {
        ast::Pat::Ident(ident) => ident.name == name,
        ast::Pat::Object(pat) => pat.props.iter().any(|prop| match prop {
            ast::ObjectPatProp::KeyValue(kv) => pattern_binds(&kv.value, name),
            ast::ObjectPatProp::Rest(rest) => rest.arg.name == name,
        }),
        ast::Pat::Array(pat) => pat.elements.iter().any(|element| match element {
            ast::ArrayPatElem::Hole(_) => false,
            ast::ArrayPatElem::Pat(pat) => pattern_binds(pat, name),
            ast::ArrayPatElem::Rest(rest) => rest.arg.name == name,
        }),
    }
}

/// Whether `name` is the target of an assignment expression anywhere in
/// `scope` (again skipping shadowed subtrees). A reassigned binding cannot
/// be inlined: the value at each reference would depend on position.
pub(crate) fn is_reassigned(name: &str, scope: &[ast::Stmt]) -> bool {
    fn stmt_reassigns(name: &str, stmt: &ast::Stmt) -> bool {
        match stmt {
            ast::Stmt::Var(decl) => decl
                .declarators
                .iter()
                .any(|d| d.init.as_ref().is_some_and(|e| expr_reassigns(name, e))),
            ast::Stmt::Func(func) => {
                !params_bind(&func.params, name)
                    && !redeclares(&func.body.statements, name)
                    && func.body.statements.iter().any(|s| stmt_reassigns(name, s))
            }
            ast::Stmt::Block(block) => {
                !redeclares(&block.statements, name)
                    && block.statements.iter().any(|s| stmt_reassigns(name, s))
            }
            ast::Stmt::If(stmt) => {
                expr_reassigns(name, &stmt.condition)
                    || stmt_reassigns(name, &stmt.then_branch)
                    || stmt
                        .else_branch
                        .as_ref()
                        .is_some_and(|s| stmt_reassigns(name, s))
            }
            ast::Stmt::Return(stmt) => stmt.expr.as_ref().is_some_and(|e| expr_reassigns(name, e)),
            ast::Stmt::Expr(stmt) => expr_reassigns(name, &stmt.expr),
            ast::Stmt::ExportNames(_) | ast::Stmt::TypeAlias(_) | ast::Stmt::Empty(_) => false,
        }
    }

    fn expr_reassigns(name: &str, expr: &ast::Expr) -> bool {
        match expr {
            ast::Expr::Assign(assign) => {
                if matches!(assign.target.as_ref(), ast::Expr::Ident(id) if id.name == name) {
                    return true;
                }
                expr_reassigns(name, &assign.target) || expr_reassigns(name, &assign.value)
            }
            ast::Expr::Member(member) => {
                expr_reassigns(name, &member.object)
                    || (member.computed && expr_reassigns(name, &member.property))
            }
            ast::Expr::Call(call) => {
                expr_reassigns(name, &call.callee)
                    || call.args.iter().any(|a| expr_reassigns(name, a))
            }
            ast::Expr::Unary(unary) => expr_reassigns(name, &unary.expr),
            ast::Expr::Binary(binary) => {
                expr_reassigns(name, &binary.lhs) || expr_reassigns(name, &binary.rhs)
            }
            ast::Expr::Cond(cond) => {
                expr_reassigns(name, &cond.test)
                    || expr_reassigns(name, &cond.cons)
                    || expr_reassigns(name, &cond.alt)
            }
            ast::Expr::Object(object) => object.props.iter().any(|prop| match prop {
                ast::ObjectLitProp::KeyValue(kv) => expr_reassigns(name, &kv.value),
                ast::ObjectLitProp::Shorthand(_) => false,
                ast::ObjectLitProp::Spread(spread) => expr_reassigns(name, &spread.expr),
            }),
            ast::Expr::Array(array) => array
                .elements
                .iter()
                .flatten()
                .any(|e| expr_reassigns(name, e)),
            ast::Expr::Ident(_)
            | ast::Expr::Lit(_)
            | ast::Expr::This(_)
            | ast::Expr::Missing(_) => false,
        }
    }

    scope.iter().any(|stmt| stmt_reassigns(name, stmt))
}

/// Names re-exported from a scope via `export { a, b };` lists.
///
/// Declarations carrying an inline `export` keyword are flagged on the
/// declaration node itself; callers check both.
pub(crate) fn exported_names(stmts: &[ast::Stmt]) -> HashSet<String> {
    let mut out = HashSet::new();
    for stmt in stmts {
        if let ast::Stmt::ExportNames(export) = stmt {
            for name in &export.names {
                out.insert(name.name.clone());
            }
        }
    }
    out
}

/// Type-level analog of [`find_references`]: occurrences of `name` as a
/// type reference in annotations and alias bodies. Context flags do not
/// apply in type positions.
pub(crate) fn find_type_references(
    name: &str,
    scope: &[ast::Stmt],
    exclude: Span,
) -> Vec<IdentifierToReplace> {
    fn walk_stmts(name: &str, stmts: &[ast::Stmt], exclude: Span, out: &mut Vec<IdentifierToReplace>) {
        for stmt in stmts {
            match stmt {
                ast::Stmt::Var(decl) => {
                    for declarator in &decl.declarators {
                        if let Some(ty) = &declarator.ty {
                            walk_type(name, ty, exclude, out);
                        }
                    }
                }
                ast::Stmt::Func(func) => {
                    for param in &func.params {
                        if let Some(ty) = &param.ty {
                            walk_type(name, ty, exclude, out);
                        }
                    }
                    if let Some(ty) = &func.return_ty {
                        walk_type(name, ty, exclude, out);
                    }
                    if !redeclares_type(&func.body.statements, name) {
                        walk_stmts(name, &func.body.statements, exclude, out);
                    }
                }
                ast::Stmt::Block(block) => {
                    if !redeclares_type(&block.statements, name) {
                        walk_stmts(name, &block.statements, exclude, out);
                    }
                }
                ast::Stmt::If(stmt) => {
                    walk_stmts(name, std::slice::from_ref(&stmt.then_branch), exclude, out);
                    if let Some(else_branch) = &stmt.else_branch {
                        walk_stmts(name, std::slice::from_ref(else_branch), exclude, out);
                    }
                }
                ast::Stmt::TypeAlias(alias) => walk_type(name, &alias.ty, exclude, out),
                ast::Stmt::ExportNames(_)
                | ast::Stmt::Expr(_)
                | ast::Stmt::Return(_)
                | ast::Stmt::Empty(_) => {}
            }
        }
    }

    fn walk_type(name: &str, ty: &ast::TypeExpr, exclude: Span, out: &mut Vec<IdentifierToReplace>) {
        match ty {
            ast::TypeExpr::Ref(ty_ref) => {
                if ty_ref.name.name == name
                    && ty_ref.args.is_empty()
                    && !exclude.contains_span(ty_ref.range)
                {
                    out.push(IdentifierToReplace {
                        span: ty_ref.range,
                        in_unary_expression: false,
                        shorthand_key: false,
                    });
                }
                for arg in &ty_ref.args {
                    walk_type(name, arg, exclude, out);
                }
            }
            ast::TypeExpr::Union(union) => {
                for variant in &union.variants {
                    walk_type(name, variant, exclude, out);
                }
            }
        }
    }

    fn redeclares_type(stmts: &[ast::Stmt], name: &str) -> bool {
        stmts
            .iter()
            .any(|stmt| matches!(stmt, ast::Stmt::TypeAlias(alias) if alias.name.name == name))
    }

    let mut out = Vec::new();
    walk_stmts(name, scope, exclude, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_syntax::js;

    fn references(source: &str, name: &str, exclude: Span) -> Vec<IdentifierToReplace> {
        let parse = js::parse(source);
        find_references(name, &parse.program().statements, exclude)
    }

    #[test]
    fn finds_plain_references() {
        let source = "const a = 1;\nuse(a);\nconsole.log(a + 2);\n";
        let refs = references(source, "a", Span::new(6, 7));
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| !r.in_unary_expression && !r.shorthand_key));
    }

    #[test]
    fn skips_shadowed_scopes() {
        let source = "\
const name = 1;
function inner() {
  const name = 2;
  use(name);
}
use(name);
";
        let refs = references(source, "name", Span::new(6, 10));
        assert_eq!(refs.len(), 1);
        let span = refs[0].span;
        assert_eq!(&source[span.start..span.end], "name");
        assert!(span.start > source.find("use(name);\n").unwrap());
    }

    #[test]
    fn skips_member_and_property_keys() {
        let source = "const name = 1;\nuse(obj.name);\nuse({ name: 2 });\nuse(obj[name]);\n";
        let refs = references(source, "name", Span::new(6, 10));
        // Only the computed access counts.
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn flags_unary_operands_and_shorthand_keys() {
        let source = "const ok = true;\nif (!ok) {\n  use({ ok });\n}\n";
        let refs = references(source, "ok", Span::new(6, 8));
        assert_eq!(refs.len(), 2);
        assert!(refs[0].in_unary_expression);
        assert!(refs[1].shorthand_key);
    }

    #[test]
    fn shadowing_by_parameter_skips_defaults_and_body() {
        let source = "const x = 1;\nfunction f(x = 2) {\n  use(x);\n}\nuse(x);\n";
        let refs = references(source, "x", Span::new(6, 7));
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn detects_reassignment_in_nested_scope() {
        let source = "let total = 0;\nfunction bump() {\n  total = total + 1;\n}\n";
        let parse = js::parse(source);
        assert!(is_reassigned("total", &parse.program().statements));
        assert!(!is_reassigned("missing", &parse.program().statements));
    }

    #[test]
    fn reassignment_in_shadowed_scope_does_not_count() {
        let source = "let count = 0;\nfunction f() {\n  let count = 1;\n  count = 2;\n}\n";
        let parse = js::parse(source);
        assert!(!is_reassigned("count", &parse.program().statements));
    }

    #[test]
    fn collects_export_list_names() {
        let source = "const a = 1;\nexport { a, b };\n";
        let parse = js::parse(source);
        let names = exported_names(&parse.program().statements);
        assert!(names.contains("a"));
        assert!(names.contains("b"));
        assert!(!names.contains("c"));
    }

    #[test]
    fn finds_type_references_in_annotations() {
        let source = "type Id = string;\nfunction f(id: Id): Id {\n  return id;\n}\nlet x: Array<Id>;\n";
        let parse = js::parse(source);
        let refs = find_type_references("Id", &parse.program().statements, Span::new(0, 17));
        assert_eq!(refs.len(), 3);
    }
}
