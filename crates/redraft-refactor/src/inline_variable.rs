//! Inline Variable.
//!
//! Replaces every reference to a binding with its initializer text and
//! deletes the declaration (or just the matched pattern element). Works on
//! plain declarators, object/array destructuring patterns, and type aliases.

use redraft_syntax::js::{self, ast};
use redraft_types::Span;

use crate::edit::{FileId, Notice, TextEdit, WorkspaceEdit};
use crate::inlinable::{self, DecomposeContext, InlinableCode};
use crate::scope;
use crate::selection::{statement_deletion_range, Selection};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InlineVariableError {
    #[error("cursor is not on an inlinable variable declaration")]
    DidNotFindInlinableCode,
    #[error("variables that are reassigned after declaration cannot be inlined")]
    RedeclaredVariable,
    #[error(transparent)]
    Edit(#[from] crate::edit::EditError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineVariableOutcome {
    pub edit: WorkspaceEdit,
    pub notices: Vec<Notice>,
}

pub fn inline_variable(
    file: &str,
    source: &str,
    selection: Selection,
) -> Result<InlineVariableOutcome, InlineVariableError> {
    let parsed = js::parse(source);
    let program = parsed.program();
    let exports = scope::exported_names(&program.statements);

    let target = find_declaration_at(&program.statements, selection)
        .ok_or(InlineVariableError::DidNotFindInlinableCode)?;

    let inlinable = match &target {
        DeclarationAt::Var {
            scope: scope_stmts,
            stmt,
            declarator,
        } => {
            let (removal, whole_statement) = declarator_removal(stmt, declarator);
            let ctx = DecomposeContext {
                source,
                scope: scope_stmts,
                exports: &exports,
                declaration_exported: stmt.exported,
                exclude: declarator.id.range(),
            };
            let child = inlinable::find_inlinable_code(&ctx, selection, declarator)
                .ok_or(InlineVariableError::DidNotFindInlinableCode)?;
            InlinableCode::wrap_top_level(child, removal, whole_statement)
        }
        DeclarationAt::TypeAlias {
            scope: scope_stmts,
            alias,
        } => {
            let ctx = DecomposeContext {
                source,
                scope: scope_stmts,
                exports: &exports,
                declaration_exported: alias.exported,
                exclude: alias.range,
            };
            let leaf = inlinable::type_alias_leaf(&ctx, alias);
            InlinableCode::wrap_top_level(leaf, alias.range, true)
        }
    };

    if inlinable.is_redeclared() {
        tracing::debug!(name = inlinable.name(), "binding is reassigned, refusing to inline");
        return Err(InlineVariableError::RedeclaredVariable);
    }

    let mut notices = Vec::new();
    if inlinable.is_exported() {
        notices.push(Notice::KeptExportedDeclaration {
            name: inlinable.name().to_string(),
        });
    }

    if !inlinable.has_identifiers_to_update() {
        tracing::debug!(name = inlinable.name(), "no references to rewrite");
        return Err(InlineVariableError::DidNotFindInlinableCode);
    }

    let file_id = FileId::new(file);
    let value_span = inlinable.value_span();
    let value_text = &source[value_span.start..value_span.end];

    let mut edits: Vec<TextEdit> = inlinable
        .update_identifiers_with(value_text)
        .into_iter()
        .map(|replacement| {
            TextEdit::replace(file_id.clone(), replacement.span.into(), replacement.text)
        })
        .collect();

    if inlinable.is_exported() {
        tracing::debug!(name = inlinable.name(), "keeping exported declaration in place");
    } else {
        let removal = inlinable.code_to_remove();
        let range = if inlinable.should_extend_selection_to_declaration() {
            statement_deletion_range(source, removal)
        } else {
            removal.into()
        };
        edits.push(TextEdit::delete(file_id, range));
    }

    let mut edit = WorkspaceEdit::new(edits);
    edit.normalize()?;
    Ok(InlineVariableOutcome { edit, notices })
}

enum DeclarationAt<'a> {
    Var {
        scope: &'a [ast::Stmt],
        stmt: &'a ast::VarDeclStmt,
        declarator: &'a ast::Declarator,
    },
    TypeAlias {
        scope: &'a [ast::Stmt],
        alias: &'a ast::TypeAliasDecl,
    },
}

/// Find the declaration the selection sits in, together with the statement
/// list forming its scope. Deeper matches win.
fn find_declaration_at<'a>(
    stmts: &'a [ast::Stmt],
    selection: Selection,
) -> Option<DeclarationAt<'a>> {
    let mut found = None;

    for stmt in stmts {
        if !selection.is_inside(stmt.range()) {
            continue;
        }
        match stmt {
            ast::Stmt::Var(decl) => {
                if let Some(declarator) = pick_declarator(decl, selection) {
                    if declarator.init.is_some() {
                        found = Some(DeclarationAt::Var {
                            scope: stmts,
                            stmt: decl,
                            declarator,
                        });
                    }
                }
            }
            ast::Stmt::TypeAlias(alias) => {
                found = Some(DeclarationAt::TypeAlias { scope: stmts, alias });
            }
            ast::Stmt::Func(func) => {
                if let Some(inner) = find_declaration_at(&func.body.statements, selection) {
                    found = Some(inner);
                }
            }
            ast::Stmt::Block(block) => {
                if let Some(inner) = find_declaration_at(&block.statements, selection) {
                    found = Some(inner);
                }
            }
            ast::Stmt::If(stmt) => {
                let then_branch = std::slice::from_ref(stmt.then_branch.as_ref());
                if let Some(inner) = find_declaration_at(then_branch, selection) {
                    found = Some(inner);
                }
                if let Some(else_branch) = &stmt.else_branch {
                    let else_branch = std::slice::from_ref(else_branch.as_ref());
                    if let Some(inner) = find_declaration_at(else_branch, selection) {
                        found = Some(inner);
                    }
                }
            }
            _ => {}
        }
    }

    found
}

fn pick_declarator<'a>(
    decl: &'a ast::VarDeclStmt,
    selection: Selection,
) -> Option<&'a ast::Declarator> {
    decl.declarators
        .iter()
        .find(|declarator| selection.is_inside(declarator.range))
        .or_else(|| {
            // Cursor on the `const` keyword: unambiguous only for a single
            // declarator.
            (decl.declarators.len() == 1).then(|| &decl.declarators[0])
        })
}

/// What to delete for this declarator: the whole statement when it is the
/// only one, otherwise the declarator plus its adjacent delimiter.
fn declarator_removal(stmt: &ast::VarDeclStmt, declarator: &ast::Declarator) -> (Span, bool) {
    if stmt.declarators.len() == 1 {
        return (stmt.range, true);
    }

    let index = stmt
        .declarators
        .iter()
        .position(|d| d.range == declarator.range)
        .unwrap_or(0);
    if let Some(next) = stmt.declarators.get(index + 1) {
        (Span::new(declarator.range.start, next.range.start), false)
    } else {
        let prev = &stmt.declarators[index - 1];
        (Span::new(prev.range.end, declarator.range.end), false)
    }
}
