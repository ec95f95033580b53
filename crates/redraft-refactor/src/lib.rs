//! Refactoring entrypoints for Redraft.
//!
//! The engine currently covers the inlining family of refactorings:
//! - Inline Variable for plain declarators, destructuring patterns, and type
//!   aliases (`inline_variable`)
//! - Inline Function with argument-to-parameter substitution (`inline_function`)
//!
//! Each operation is a pure function over the parsed source: it either
//! returns a normalized [`WorkspaceEdit`] (plus non-fatal [`Notice`]s) or an
//! error kind describing why nothing could be rewritten. Applying the edits
//! to the text buffer is the host's job.

mod edit;
mod inlinable;
mod inline_function;
mod inline_variable;
mod scope;
mod selection;

pub use edit::{
    apply_text_edits, EditError, FileId, Notice, TextEdit, TextRange, WorkspaceEdit,
};
pub use inline_function::{inline_function, InlineFunctionError, InlineFunctionOutcome};
pub use inline_variable::{inline_variable, InlineVariableError, InlineVariableOutcome};
pub use selection::Selection;
