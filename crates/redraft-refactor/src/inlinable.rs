//! The inlinable-code abstraction and the pattern decomposer.
//!
//! [`InlinableCode`] is a closed set of shapes a binding can take: a plain
//! identifier, a type alias, or an element nested somewhere inside a
//! destructuring pattern. Pattern variants own their child and delegate the
//! derived attributes to it, overriding only what their own shape changes:
//! the range to delete (sibling and rest elements decide which delimiter
//! goes) and the qualified name a bare reference must be rewritten to.

use std::collections::HashSet;

use redraft_syntax::js::ast;
use redraft_types::Span;

use crate::scope::{self, IdentifierToReplace};
use crate::selection::Selection;

/// One reference rewrite: replace `span` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Replacement {
    pub span: Span,
    pub text: String,
}

#[derive(Debug)]
pub(crate) enum InlinableCode {
    Identifier(InlinableIdentifier),
    TypeAlias(InlinableTypeAlias),
    ObjectPatternElement(Box<ObjectPatternElement>),
    ArrayPatternElement(Box<ArrayPatternElement>),
    TopLevelPattern(Box<TopLevelPattern>),
}

#[derive(Debug)]
pub(crate) struct InlinableIdentifier {
    pub name: String,
    pub value_span: Span,
    pub redeclared: bool,
    pub exported: bool,
    pub references: Vec<IdentifierToReplace>,
}

#[derive(Debug)]
pub(crate) struct InlinableTypeAlias {
    pub name: String,
    pub value_span: Span,
    pub exported: bool,
    pub references: Vec<IdentifierToReplace>,
}

/// A matched property inside an object pattern.
#[derive(Debug)]
pub(crate) struct ObjectPatternElement {
    pub child: InlinableCode,
    /// Qualified path to the destructured value, e.g. `session.user`.
    pub base: String,
    pub property: Span,
    pub prev_sibling: Option<Span>,
    pub next_sibling: Option<Span>,
    pub has_rest_sibling: bool,
    pub has_siblings: bool,
}

/// A matched element inside an array pattern. Elements are positional, so
/// removing one that still has later siblings must leave a hole behind.
#[derive(Debug)]
pub(crate) struct ArrayPatternElement {
    pub child: InlinableCode,
    pub base: String,
    pub index: usize,
    pub element: Span,
    pub prev_sibling: Option<Span>,
    pub next_sibling: Option<Span>,
    /// Non-hole elements other than this one. Trailing holes alone do not
    /// keep a declaration alive.
    pub has_other_bindings: bool,
}

/// Marks that the matched element came from a standalone pattern declarator,
/// so "extend to declaration" means deleting the whole declaration.
#[derive(Debug)]
pub(crate) struct TopLevelPattern {
    pub child: InlinableCode,
    pub removal: Span,
    pub whole_statement: bool,
}

impl InlinableCode {
    pub fn wrap_top_level(child: InlinableCode, removal: Span, whole_statement: bool) -> Self {
        InlinableCode::TopLevelPattern(Box::new(TopLevelPattern {
            child,
            removal,
            whole_statement,
        }))
    }

    pub fn name(&self) -> &str {
        match self {
            InlinableCode::Identifier(leaf) => &leaf.name,
            InlinableCode::TypeAlias(leaf) => &leaf.name,
            InlinableCode::ObjectPatternElement(el) => el.child.name(),
            InlinableCode::ArrayPatternElement(el) => el.child.name(),
            InlinableCode::TopLevelPattern(top) => top.child.name(),
        }
    }

    pub fn is_redeclared(&self) -> bool {
        match self {
            InlinableCode::Identifier(leaf) => leaf.redeclared,
            InlinableCode::TypeAlias(_) => false,
            InlinableCode::ObjectPatternElement(el) => el.child.is_redeclared(),
            InlinableCode::ArrayPatternElement(el) => el.child.is_redeclared(),
            InlinableCode::TopLevelPattern(top) => top.child.is_redeclared(),
        }
    }

    pub fn is_exported(&self) -> bool {
        match self {
            InlinableCode::Identifier(leaf) => leaf.exported,
            InlinableCode::TypeAlias(leaf) => leaf.exported,
            InlinableCode::ObjectPatternElement(el) => el.child.is_exported(),
            InlinableCode::ArrayPatternElement(el) => el.child.is_exported(),
            InlinableCode::TopLevelPattern(top) => top.child.is_exported(),
        }
    }

    pub fn has_identifiers_to_update(&self) -> bool {
        match self {
            InlinableCode::Identifier(leaf) => !leaf.references.is_empty(),
            InlinableCode::TypeAlias(leaf) => !leaf.references.is_empty(),
            InlinableCode::ObjectPatternElement(el) => el.child.has_identifiers_to_update(),
            InlinableCode::ArrayPatternElement(el) => el.child.has_identifiers_to_update(),
            InlinableCode::TopLevelPattern(top) => top.child.has_identifiers_to_update(),
        }
    }

    /// Whether deleting this element means deleting the entire declaration.
    /// Leaves always say yes; a pattern wrapper vetoes as soon as a sibling
    /// (or a rest element) still needs the declaration.
    pub fn should_extend_selection_to_declaration(&self) -> bool {
        match self {
            InlinableCode::Identifier(_) | InlinableCode::TypeAlias(_) => true,
            InlinableCode::ObjectPatternElement(el) => {
                el.child.should_extend_selection_to_declaration()
                    && !el.has_siblings
                    && !el.has_rest_sibling
            }
            InlinableCode::ArrayPatternElement(el) => {
                el.child.should_extend_selection_to_declaration() && !el.has_other_bindings
            }
            InlinableCode::TopLevelPattern(top) => {
                top.child.should_extend_selection_to_declaration() && top.whole_statement
            }
        }
    }

    /// The source range holding the value to substitute at each reference.
    pub fn value_span(&self) -> Span {
        match self {
            InlinableCode::Identifier(leaf) => leaf.value_span,
            InlinableCode::TypeAlias(leaf) => leaf.value_span,
            InlinableCode::ObjectPatternElement(el) => el.child.value_span(),
            InlinableCode::ArrayPatternElement(el) => el.child.value_span(),
            InlinableCode::TopLevelPattern(top) => top.child.value_span(),
        }
    }

    /// The range to delete once every reference has been rewritten. When
    /// [`Self::should_extend_selection_to_declaration`] holds, the caller
    /// extends this to full lines.
    pub fn code_to_remove(&self) -> Span {
        match self {
            InlinableCode::Identifier(leaf) => leaf.value_span,
            InlinableCode::TypeAlias(leaf) => leaf.value_span,
            InlinableCode::ObjectPatternElement(el) => {
                if el.child.should_extend_selection_to_declaration() {
                    el.own_removal()
                } else {
                    el.child.code_to_remove()
                }
            }
            InlinableCode::ArrayPatternElement(el) => {
                if el.child.should_extend_selection_to_declaration() {
                    el.own_removal()
                } else {
                    el.child.code_to_remove()
                }
            }
            InlinableCode::TopLevelPattern(top) => {
                if top.child.should_extend_selection_to_declaration() {
                    top.removal
                } else {
                    top.child.code_to_remove()
                }
            }
        }
    }

    /// Map the literal value text to the edit for every reference.
    pub fn update_identifiers_with(&self, value_text: &str) -> Vec<Replacement> {
        match self {
            InlinableCode::Identifier(leaf) => leaf
                .references
                .iter()
                .map(|reference| {
                    let mut text = value_text.to_string();
                    if reference.in_unary_expression {
                        text = format!("({text})");
                    }
                    if reference.shorthand_key {
                        text = format!("{}: {}", leaf.name, text);
                    }
                    Replacement {
                        span: reference.span,
                        text,
                    }
                })
                .collect(),
            InlinableCode::TypeAlias(leaf) => leaf
                .references
                .iter()
                .map(|reference| Replacement {
                    span: reference.span,
                    text: value_text.to_string(),
                })
                .collect(),
            InlinableCode::ObjectPatternElement(el) => {
                // Only the innermost wrapper qualifies: its base already
                // carries every enclosing pattern's path segment.
                if el.child.is_leaf() {
                    el.child
                        .update_identifiers_with(&qualify_key(&el.base, value_text))
                } else {
                    el.child.update_identifiers_with(value_text)
                }
            }
            InlinableCode::ArrayPatternElement(el) => {
                if el.child.is_leaf() {
                    el.child
                        .update_identifiers_with(&format!("{}[{}]", el.base, el.index))
                } else {
                    el.child.update_identifiers_with(value_text)
                }
            }
            InlinableCode::TopLevelPattern(top) => top.child.update_identifiers_with(value_text),
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(
            self,
            InlinableCode::Identifier(_) | InlinableCode::TypeAlias(_)
        )
    }
}

impl ObjectPatternElement {
    fn own_removal(&self) -> Span {
        if let Some(next) = self.next_sibling {
            // Delete the property together with its following delimiter.
            Span::new(self.property.start, next.start)
        } else if let Some(prev) = self.prev_sibling {
            Span::new(prev.end, self.property.end)
        } else {
            self.property
        }
    }
}

impl ArrayPatternElement {
    fn own_removal(&self) -> Span {
        // Positional: an element with later siblings leaves a hole behind,
        // so only the last one takes its leading delimiter along.
        if self.next_sibling.is_some() {
            self.element
        } else if let Some(prev) = self.prev_sibling {
            Span::new(prev.end, self.element.end)
        } else {
            self.element
        }
    }
}

/// Everything the decomposer needs to know about the declaration's context.
pub(crate) struct DecomposeContext<'a> {
    pub source: &'a str,
    pub scope: &'a [ast::Stmt],
    pub exports: &'a HashSet<String>,
    pub declaration_exported: bool,
    /// The declarator's whole binding pattern; occurrences inside it are
    /// binding positions, not references.
    pub exclude: Span,
}

/// Decompose a declarator against the selection. Returns the matched
/// element, without the top-level wrapper (the caller owns the statement
/// geometry needed for that).
pub(crate) fn find_inlinable_code(
    ctx: &DecomposeContext<'_>,
    selection: Selection,
    declarator: &ast::Declarator,
) -> Option<InlinableCode> {
    let init = declarator.init.as_ref()?;

    match &declarator.id {
        ast::Pat::Ident(ident) => Some(identifier_leaf(ctx, ident, init.range())),
        ast::Pat::Object(_) | ast::Pat::Array(_) => {
            let base = render_init_name(ctx.source, init)?;
            decompose_pattern(ctx, selection, &declarator.id, &base)
        }
    }
}

fn decompose_pattern(
    ctx: &DecomposeContext<'_>,
    selection: Selection,
    pat: &ast::Pat,
    base: &str,
) -> Option<InlinableCode> {
    match pat {
        ast::Pat::Ident(ident) => Some(identifier_leaf(ctx, ident, ident.range)),
        ast::Pat::Object(object) => decompose_object_pattern(ctx, selection, object, base),
        ast::Pat::Array(array) => decompose_array_pattern(ctx, selection, array, base),
    }
}

fn decompose_object_pattern(
    ctx: &DecomposeContext<'_>,
    selection: Selection,
    object: &ast::ObjectPat,
    base: &str,
) -> Option<InlinableCode> {
    let mut result = None;

    for (index, prop) in object.props.iter().enumerate() {
        // Rest elements capture what the others leave; they cannot be
        // inlined on their own.
        let ast::ObjectPatProp::KeyValue(kv) = prop else {
            continue;
        };
        if !selection.is_inside(kv.range) {
            continue;
        }

        let child = match &kv.value {
            ast::Pat::Ident(ident) => identifier_leaf(ctx, ident, kv.range),
            nested => {
                let Some(key) = render_pat_key(ctx.source, &kv.key) else {
                    continue;
                };
                let Some(child) = decompose_pattern(ctx, selection, nested, &key.append_to(base))
                else {
                    continue;
                };
                child
            }
        };

        result = Some(InlinableCode::ObjectPatternElement(Box::new(
            ObjectPatternElement {
                child,
                base: base.to_string(),
                property: kv.range,
                prev_sibling: index.checked_sub(1).map(|i| object.props[i].range()),
                next_sibling: object.props.get(index + 1).map(|p| p.range()),
                has_rest_sibling: object
                    .props
                    .iter()
                    .any(|p| matches!(p, ast::ObjectPatProp::Rest(_))),
                has_siblings: object.props.len() > 1,
            },
        )));
    }

    result
}

fn decompose_array_pattern(
    ctx: &DecomposeContext<'_>,
    selection: Selection,
    array: &ast::ArrayPat,
    base: &str,
) -> Option<InlinableCode> {
    let mut result = None;

    for (index, element) in array.elements.iter().enumerate() {
        let ast::ArrayPatElem::Pat(pat) = element else {
            continue;
        };
        if !selection.is_inside(pat.range()) {
            continue;
        }

        let child = match pat {
            ast::Pat::Ident(ident) => identifier_leaf(ctx, ident, pat.range()),
            nested => {
                let Some(child) =
                    decompose_pattern(ctx, selection, nested, &format!("{base}[{index}]"))
                else {
                    continue;
                };
                child
            }
        };

        result = Some(InlinableCode::ArrayPatternElement(Box::new(
            ArrayPatternElement {
                child,
                base: base.to_string(),
                index,
                element: pat.range(),
                prev_sibling: index.checked_sub(1).map(|i| array.elements[i].range()),
                next_sibling: array.elements.get(index + 1).map(|e| e.range()),
                has_other_bindings: array.elements.iter().enumerate().any(|(i, e)| {
                    i != index && !matches!(e, ast::ArrayPatElem::Hole(_))
                }),
            },
        )));
    }

    result
}

pub(crate) fn identifier_leaf(
    ctx: &DecomposeContext<'_>,
    ident: &ast::Ident,
    value_span: Span,
) -> InlinableCode {
    InlinableCode::Identifier(InlinableIdentifier {
        redeclared: scope::is_reassigned(&ident.name, ctx.scope),
        exported: ctx.declaration_exported || ctx.exports.contains(&ident.name),
        references: scope::find_references(&ident.name, ctx.scope, ctx.exclude),
        name: ident.name.clone(),
        value_span,
    })
}

pub(crate) fn type_alias_leaf(
    ctx: &DecomposeContext<'_>,
    alias: &ast::TypeAliasDecl,
) -> InlinableCode {
    InlinableCode::TypeAlias(InlinableTypeAlias {
        exported: ctx.declaration_exported || ctx.exports.contains(&alias.name.name),
        references: scope::find_type_references(&alias.name.name, ctx.scope, ctx.exclude),
        name: alias.name.name.clone(),
        value_span: alias.ty.range(),
    })
}

enum PatKeyName {
    Dotted(String),
    Bracketed(String),
}

impl PatKeyName {
    fn append_to(&self, base: &str) -> String {
        match self {
            PatKeyName::Dotted(key) => format!("{base}.{key}"),
            PatKeyName::Bracketed(key) => format!("{base}[{key}]"),
        }
    }
}

fn render_pat_key(source: &str, key: &ast::PatKey) -> Option<PatKeyName> {
    match key {
        ast::PatKey::Ident(ident) => Some(PatKeyName::Dotted(ident.name.clone())),
        ast::PatKey::Lit(lit) => Some(PatKeyName::Bracketed(lit.raw.clone())),
        // A dynamic key has no stable name to rewrite references with.
        ast::PatKey::Computed(_) => {
            let _ = source;
            None
        }
    }
}

/// Turn a property's source text (`user` or `user: userName` or `"a-b": v`)
/// into the access expression reaching it from `base`.
fn qualify_key(base: &str, value_text: &str) -> String {
    let key = value_text.split(':').next().unwrap_or(value_text).trim();
    let bracketed = key.starts_with('"')
        || key.starts_with('\'')
        || key.chars().next().is_some_and(|c| c.is_ascii_digit());
    if bracketed {
        format!("{base}[{key}]")
    } else {
        format!("{base}.{key}")
    }
}

/// Render the initializer expression as the textual name references get
/// qualified with: an identifier, a member-access chain, or `this`.
/// Anything dynamic cannot be re-qualified and fails decomposition.
pub(crate) fn render_init_name(source: &str, init: &ast::Expr) -> Option<String> {
    match init {
        ast::Expr::Ident(ident) => Some(ident.name.clone()),
        ast::Expr::This(_) => Some("this".to_string()),
        ast::Expr::Member(member) => {
            let object = render_init_name(source, &member.object)?;
            if member.computed {
                match member.property.as_ref() {
                    ast::Expr::Lit(lit) => Some(format!("{object}[{}]", lit.raw)),
                    ast::Expr::Ident(ident) => Some(format!("{object}[{}]", ident.name)),
                    _ => None,
                }
            } else {
                match member.property.as_ref() {
                    ast::Expr::Ident(ident) => Some(format!("{object}.{}", ident.name)),
                    _ => None,
                }
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_syntax::js;

    fn decompose(source: &str, caret: usize) -> Option<(InlinableCode, String)> {
        let parse = js::parse(source);
        let program = parse.program();
        let ast::Stmt::Var(decl) = &program.statements[0] else {
            panic!("expected a variable declaration");
        };
        let declarator = &decl.declarators[0];
        let exports = HashSet::new();
        let ctx = DecomposeContext {
            source,
            scope: &program.statements,
            exports: &exports,
            declaration_exported: decl.exported,
            exclude: declarator.id.range(),
        };
        let inlinable = find_inlinable_code(&ctx, Selection::cursor(caret), declarator)?;
        let value = source[inlinable.value_span().start..inlinable.value_span().end].to_string();
        Some((inlinable, value))
    }

    #[test]
    fn plain_identifier_value_is_the_initializer() {
        let source = "const total = price * 2;\nuse(total);\n";
        let (inlinable, value) = decompose(source, 7).unwrap();
        assert_eq!(value, "price * 2");
        assert!(inlinable.should_extend_selection_to_declaration());
        let edits = inlinable.update_identifiers_with(&value);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].text, "price * 2");
    }

    #[test]
    fn object_pattern_element_is_qualified_with_init_name() {
        let source = "const { name, age } = person;\nuse(name);\n";
        let caret = source.find("name").unwrap();
        let (inlinable, value) = decompose(source, caret).unwrap();
        assert_eq!(value, "name");
        assert!(!inlinable.should_extend_selection_to_declaration());
        let edits = inlinable.update_identifiers_with(&value);
        assert_eq!(edits[0].text, "person.name");
        // `name, ` goes, `age` stays.
        let removal = inlinable.code_to_remove();
        assert_eq!(&source[removal.start..removal.end], "name, ");
    }

    #[test]
    fn renamed_property_uses_the_key_not_the_alias() {
        let source = "const { user: userName } = session;\nuse(userName);\n";
        let caret = source.find("userName").unwrap();
        let (inlinable, value) = decompose(source, caret).unwrap();
        assert_eq!(value, "user: userName");
        let edits = inlinable.update_identifiers_with(&value);
        assert_eq!(edits[0].text, "session.user");
    }

    #[test]
    fn nested_object_pattern_chains_every_segment() {
        let source = "const { user: { name } } = session;\nuse(name);\n";
        let caret = source.find("name").unwrap();
        let (inlinable, value) = decompose(source, caret).unwrap();
        assert_eq!(value, "name");
        let edits = inlinable.update_identifiers_with(&value);
        assert_eq!(edits[0].text, "session.user.name");
        assert!(inlinable.should_extend_selection_to_declaration());
    }

    #[test]
    fn array_pattern_element_uses_positional_access() {
        let source = "const [first, second] = items;\nuse(second);\n";
        let caret = source.find("second").unwrap();
        let (inlinable, value) = decompose(source, caret).unwrap();
        assert_eq!(value, "second");
        let edits = inlinable.update_identifiers_with(&value);
        assert_eq!(edits[0].text, "items[1]");
        // Last element takes its leading delimiter along.
        let removal = inlinable.code_to_remove();
        assert_eq!(&source[removal.start..removal.end], ", second");
    }

    #[test]
    fn array_element_with_later_siblings_leaves_a_hole() {
        let source = "const [first, second] = items;\nuse(first);\n";
        let caret = source.find("first").unwrap();
        let (inlinable, _) = decompose(source, caret).unwrap();
        let removal = inlinable.code_to_remove();
        assert_eq!(&source[removal.start..removal.end], "first");
    }

    #[test]
    fn rest_sibling_blocks_extension_but_not_inlining() {
        let source = "const { name, ...others } = person;\nuse(name);\n";
        let caret = source.find("name").unwrap();
        let (inlinable, value) = decompose(source, caret).unwrap();
        assert!(!inlinable.should_extend_selection_to_declaration());
        let edits = inlinable.update_identifiers_with(&value);
        assert_eq!(edits[0].text, "person.name");
        let removal = inlinable.code_to_remove();
        assert_eq!(&source[removal.start..removal.end], "name, ");
    }

    #[test]
    fn rest_element_itself_is_not_inlinable() {
        let source = "const { name, ...others } = person;\nuse(others);\n";
        let caret = source.find("...others").unwrap() + 4;
        assert!(decompose(source, caret).is_none());
    }

    #[test]
    fn dynamic_init_fails_decomposition() {
        let source = "const { name } = getPerson();\nuse(name);\n";
        let caret = source.find("name").unwrap();
        assert!(decompose(source, caret).is_none());
    }

    #[test]
    fn member_chain_init_renders_as_a_path() {
        let source = "const { id } = response.data;\nuse(id);\n";
        let caret = source.find("id").unwrap();
        let (inlinable, value) = decompose(source, caret).unwrap();
        let edits = inlinable.update_identifiers_with(&value);
        assert_eq!(edits[0].text, "response.data.id");
    }
}
