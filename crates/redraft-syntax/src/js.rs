//! Hand-written lexer and recursive-descent parser for the JavaScript/
//! TypeScript subset Redraft operates on.
//!
//! The parser is error-tolerant: it never fails, it produces `Missing`
//! nodes and skips tokens it does not understand. Spans are byte offsets
//! into the parsed text.

use redraft_types::Span;

pub mod ast {
    use redraft_types::Span;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Program {
        pub statements: Vec<Stmt>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Stmt {
        Var(VarDeclStmt),
        Func(FuncDecl),
        TypeAlias(TypeAliasDecl),
        ExportNames(ExportNamesStmt),
        Expr(ExprStmt),
        Return(ReturnStmt),
        If(IfStmt),
        Block(Block),
        Empty(Span),
    }

    impl Stmt {
        pub fn range(&self) -> Span {
            match self {
                Stmt::Var(stmt) => stmt.range,
                Stmt::Func(decl) => decl.range,
                Stmt::TypeAlias(decl) => decl.range,
                Stmt::ExportNames(stmt) => stmt.range,
                Stmt::Expr(stmt) => stmt.range,
                Stmt::Return(stmt) => stmt.range,
                Stmt::If(stmt) => stmt.range,
                Stmt::Block(block) => block.range,
                Stmt::Empty(range) => *range,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum VarKind {
        Const,
        Let,
        Var,
    }

    impl VarKind {
        pub fn as_str(self) -> &'static str {
            match self {
                VarKind::Const => "const",
                VarKind::Let => "let",
                VarKind::Var => "var",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct VarDeclStmt {
        pub kind: VarKind,
        pub declarators: Vec<Declarator>,
        pub exported: bool,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Declarator {
        pub id: Pat,
        pub ty: Option<TypeExpr>,
        pub init: Option<Expr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Pat {
        Ident(Ident),
        Object(ObjectPat),
        Array(ArrayPat),
    }

    impl Pat {
        pub fn range(&self) -> Span {
            match self {
                Pat::Ident(ident) => ident.range,
                Pat::Object(pat) => pat.range,
                Pat::Array(pat) => pat.range,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ObjectPat {
        pub props: Vec<ObjectPatProp>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ObjectPatProp {
        KeyValue(KeyValuePatProp),
        Rest(RestPatProp),
    }

    impl ObjectPatProp {
        pub fn range(&self) -> Span {
            match self {
                ObjectPatProp::KeyValue(prop) => prop.range,
                ObjectPatProp::Rest(prop) => prop.range,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct KeyValuePatProp {
        pub key: PatKey,
        pub value: Pat,
        pub shorthand: bool,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PatKey {
        Ident(Ident),
        Lit(LitExpr),
        Computed(ComputedPatKey),
    }

    impl PatKey {
        pub fn range(&self) -> Span {
            match self {
                PatKey::Ident(ident) => ident.range,
                PatKey::Lit(lit) => lit.range,
                PatKey::Computed(key) => key.range,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ComputedPatKey {
        pub expr: Box<Expr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RestPatProp {
        pub arg: Ident,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ArrayPat {
        pub elements: Vec<ArrayPatElem>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ArrayPatElem {
        /// An elided slot (`[, x]`). The span is empty, anchored where the
        /// element would start.
        Hole(Span),
        Pat(Pat),
        Rest(RestPatElem),
    }

    impl ArrayPatElem {
        pub fn range(&self) -> Span {
            match self {
                ArrayPatElem::Hole(range) => *range,
                ArrayPatElem::Pat(pat) => pat.range(),
                ArrayPatElem::Rest(rest) => rest.range,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RestPatElem {
        pub arg: Ident,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FuncDecl {
        pub name: Ident,
        pub params: Vec<Param>,
        /// Span of the parameter list including both parentheses.
        pub params_range: Span,
        pub return_ty: Option<TypeExpr>,
        pub body: Block,
        pub exported: bool,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Param {
        pub pat: Pat,
        pub ty: Option<TypeExpr>,
        pub default: Option<Expr>,
        pub rest: bool,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Block {
        pub statements: Vec<Stmt>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TypeAliasDecl {
        pub name: Ident,
        pub ty: TypeExpr,
        pub exported: bool,
        pub range: Span,
    }

    /// `export { a, b };`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ExportNamesStmt {
        pub names: Vec<Ident>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ExprStmt {
        pub expr: Expr,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ReturnStmt {
        pub expr: Option<Expr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct IfStmt {
        pub condition: Expr,
        pub then_branch: Box<Stmt>,
        pub else_branch: Option<Box<Stmt>>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TypeExpr {
        Ref(TypeRef),
        Union(UnionType),
    }

    impl TypeExpr {
        pub fn range(&self) -> Span {
            match self {
                TypeExpr::Ref(ty) => ty.range,
                TypeExpr::Union(ty) => ty.range,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TypeRef {
        pub name: Ident,
        pub args: Vec<TypeExpr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct UnionType {
        pub variants: Vec<TypeExpr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Expr {
        Ident(Ident),
        Lit(LitExpr),
        This(Span),
        Member(MemberExpr),
        Call(CallExpr),
        Unary(UnaryExpr),
        Binary(BinaryExpr),
        Assign(AssignExpr),
        Cond(CondExpr),
        Object(ObjectLit),
        Array(ArrayLit),
        Missing(Span),
    }

    impl Expr {
        pub fn range(&self) -> Span {
            match self {
                Expr::Ident(ident) => ident.range,
                Expr::Lit(lit) => lit.range,
                Expr::This(range) => *range,
                Expr::Member(expr) => expr.range,
                Expr::Call(expr) => expr.range,
                Expr::Unary(expr) => expr.range,
                Expr::Binary(expr) => expr.range,
                Expr::Assign(expr) => expr.range,
                Expr::Cond(expr) => expr.range,
                Expr::Object(expr) => expr.range,
                Expr::Array(expr) => expr.range,
                Expr::Missing(range) => *range,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Ident {
        pub name: String,
        pub range: Span,
    }

    /// Numeric, string, boolean, `null` and `undefined` literals, stored as
    /// raw source text.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LitExpr {
        pub raw: String,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MemberExpr {
        pub object: Box<Expr>,
        pub property: Box<Expr>,
        pub computed: bool,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CallExpr {
        pub callee: Box<Expr>,
        pub args: Vec<Expr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum UnaryOp {
        Not,
        Neg,
        Plus,
        Typeof,
        Void,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct UnaryExpr {
        pub op: UnaryOp,
        pub expr: Box<Expr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BinaryOp {
        Or,
        And,
        EqEq,
        NotEq,
        StrictEq,
        StrictNotEq,
        Lt,
        Le,
        Gt,
        Ge,
        Add,
        Sub,
        Mul,
        Div,
        Rem,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct BinaryExpr {
        pub op: BinaryOp,
        pub lhs: Box<Expr>,
        pub rhs: Box<Expr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AssignOp {
        Assign,
        AddAssign,
        SubAssign,
        MulAssign,
        DivAssign,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct AssignExpr {
        pub op: AssignOp,
        pub target: Box<Expr>,
        pub value: Box<Expr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CondExpr {
        pub test: Box<Expr>,
        pub cons: Box<Expr>,
        pub alt: Box<Expr>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ObjectLit {
        pub props: Vec<ObjectLitProp>,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ObjectLitProp {
        KeyValue(KeyValueProp),
        Shorthand(Ident),
        Spread(SpreadProp),
    }

    impl ObjectLitProp {
        pub fn range(&self) -> Span {
            match self {
                ObjectLitProp::KeyValue(prop) => prop.range,
                ObjectLitProp::Shorthand(ident) => ident.range,
                ObjectLitProp::Spread(prop) => prop.range,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct KeyValueProp {
        pub key: PropKey,
        pub value: Expr,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PropKey {
        Ident(Ident),
        Lit(LitExpr),
        Computed(Box<Expr>),
    }

    impl PropKey {
        pub fn range(&self) -> Span {
            match self {
                PropKey::Ident(ident) => ident.range,
                PropKey::Lit(lit) => lit.range,
                PropKey::Computed(expr) => expr.range(),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpreadProp {
        pub expr: Expr,
        pub range: Span,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ArrayLit {
        pub elements: Vec<Option<Expr>>,
        pub range: Span,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    program: ast::Program,
}

impl Parse {
    #[must_use]
    pub fn program(&self) -> &ast::Program {
        &self.program
    }
}

#[must_use]
pub fn parse(text: &str) -> Parse {
    let tokens = Lexer::new(text).collect();
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program(text.len());
    Parse { program }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    text: String,
    range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    Number,
    Str,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    DotDotDot,
    Colon,
    Question,
    Eq,
    EqEq,
    EqEqEq,
    Arrow,
    Bang,
    NotEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    PlusEq,
    Minus,
    MinusEq,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Unknown,
}

fn is_ident_start(c: char) -> bool {
    unicode_ident::is_xid_start(c) || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c) || c == '$'
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer { text, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.bump_char();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
                self.bump_char();
            }

            let rem = self.remaining();
            if rem.starts_with("//") {
                while let Some(c) = self.bump_char() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }

            if rem.starts_with("/*") {
                self.bump_char();
                self.bump_char();
                while !self.remaining().is_empty() && !self.remaining().starts_with("*/") {
                    self.bump_char();
                }
                if self.remaining().starts_with("*/") {
                    self.bump_char();
                    self.bump_char();
                }
                continue;
            }

            break;
        }
    }

    fn lex_identifier(&mut self, first: char) -> String {
        let mut out = String::new();
        out.push(first);
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                out.push(c);
                self.bump_char();
            } else {
                break;
            }
        }
        out
    }

    fn lex_number(&mut self, first: char) -> String {
        let mut out = String::new();
        out.push(first);
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                out.push(c);
                self.bump_char();
            } else {
                break;
            }
        }
        if self.peek_char() == Some('.')
            && self
                .remaining()
                .chars()
                .nth(1)
                .is_some_and(|c| c.is_ascii_digit())
        {
            out.push('.');
            self.bump_char();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    out.push(c);
                    self.bump_char();
                } else {
                    break;
                }
            }
        }
        out
    }

    fn lex_string_literal(&mut self, quote: char) -> String {
        let mut out = String::new();
        out.push(quote);
        while let Some(c) = self.bump_char() {
            out.push(c);
            match c {
                c if c == quote => break,
                '\\' => {
                    if let Some(escaped) = self.bump_char() {
                        out.push(escaped);
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();
        if self.remaining().is_empty() {
            return None;
        }

        let start = self.pos;
        let ch = self.bump_char().unwrap();

        let (kind, text) = match ch {
            '{' => (TokenKind::LBrace, "{".to_string()),
            '}' => (TokenKind::RBrace, "}".to_string()),
            '(' => (TokenKind::LParen, "(".to_string()),
            ')' => (TokenKind::RParen, ")".to_string()),
            '[' => (TokenKind::LBracket, "[".to_string()),
            ']' => (TokenKind::RBracket, "]".to_string()),
            ';' => (TokenKind::Semi, ";".to_string()),
            ',' => (TokenKind::Comma, ",".to_string()),
            ':' => (TokenKind::Colon, ":".to_string()),
            '?' => (TokenKind::Question, "?".to_string()),
            '%' => (TokenKind::Percent, "%".to_string()),
            '.' => {
                if self.remaining().starts_with("..") {
                    self.bump_char();
                    self.bump_char();
                    (TokenKind::DotDotDot, "...".to_string())
                } else {
                    (TokenKind::Dot, ".".to_string())
                }
            }
            '=' => {
                if self.eat_char('=') {
                    if self.eat_char('=') {
                        (TokenKind::EqEqEq, "===".to_string())
                    } else {
                        (TokenKind::EqEq, "==".to_string())
                    }
                } else if self.eat_char('>') {
                    (TokenKind::Arrow, "=>".to_string())
                } else {
                    (TokenKind::Eq, "=".to_string())
                }
            }
            '!' => {
                if self.eat_char('=') {
                    if self.eat_char('=') {
                        (TokenKind::NotEqEq, "!==".to_string())
                    } else {
                        (TokenKind::NotEq, "!=".to_string())
                    }
                } else {
                    (TokenKind::Bang, "!".to_string())
                }
            }
            '<' => {
                if self.eat_char('=') {
                    (TokenKind::Le, "<=".to_string())
                } else {
                    (TokenKind::Lt, "<".to_string())
                }
            }
            '>' => {
                if self.eat_char('=') {
                    (TokenKind::Ge, ">=".to_string())
                } else {
                    (TokenKind::Gt, ">".to_string())
                }
            }
            '+' => {
                if self.eat_char('=') {
                    (TokenKind::PlusEq, "+=".to_string())
                } else {
                    (TokenKind::Plus, "+".to_string())
                }
            }
            '-' => {
                if self.eat_char('=') {
                    (TokenKind::MinusEq, "-=".to_string())
                } else {
                    (TokenKind::Minus, "-".to_string())
                }
            }
            '*' => {
                if self.eat_char('=') {
                    (TokenKind::StarEq, "*=".to_string())
                } else {
                    (TokenKind::Star, "*".to_string())
                }
            }
            '/' => {
                if self.eat_char('=') {
                    (TokenKind::SlashEq, "/=".to_string())
                } else {
                    (TokenKind::Slash, "/".to_string())
                }
            }
            '&' => {
                if self.eat_char('&') {
                    (TokenKind::AmpAmp, "&&".to_string())
                } else {
                    (TokenKind::Amp, "&".to_string())
                }
            }
            '|' => {
                if self.eat_char('|') {
                    (TokenKind::PipePipe, "||".to_string())
                } else {
                    (TokenKind::Pipe, "|".to_string())
                }
            }
            '"' | '\'' => {
                let lit = self.lex_string_literal(ch);
                (TokenKind::Str, lit)
            }
            c if c.is_ascii_digit() => {
                let num = self.lex_number(c);
                (TokenKind::Number, num)
            }
            c if is_ident_start(c) => {
                let ident = self.lex_identifier(c);
                (TokenKind::Ident, ident)
            }
            other => (TokenKind::Unknown, other.to_string()),
        };

        let range = Span::new(start, self.pos);
        Some(Token { kind, text, range })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_n(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|token| token.kind == kind)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek()
            .is_some_and(|token| token.kind == TokenKind::Ident && token.text == keyword)
    }

    fn nth_is_kind(&self, n: usize, kind: TokenKind) -> bool {
        self.peek_n(n).is_some_and(|token| token.kind == kind)
    }

    fn nth_is_keyword(&self, n: usize, keyword: &str) -> bool {
        self.peek_n(n)
            .is_some_and(|token| token.kind == TokenKind::Ident && token.text == keyword)
    }

    fn current_offset(&self) -> usize {
        self.peek()
            .map(|token| token.range.start)
            .or_else(|| self.tokens.last().map(|token| token.range.end))
            .unwrap_or(0)
    }

    fn bump(&mut self) -> Option<Token> {
        if self.is_eof() {
            return None;
        }
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        Some(tok)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_kind(&mut self, kind: TokenKind) -> Token {
        match self.bump() {
            Some(tok) if tok.kind == kind => tok,
            Some(tok) => tok,
            None => Token {
                kind,
                text: String::new(),
                range: Span::empty(self.current_offset()),
            },
        }
    }

    fn expect_ident(&mut self) -> ast::Ident {
        match self.bump() {
            Some(tok) if tok.kind == TokenKind::Ident => ast::Ident {
                name: tok.text,
                range: tok.range,
            },
            Some(tok) => ast::Ident {
                name: String::new(),
                range: Span::empty(tok.range.start),
            },
            None => ast::Ident {
                name: String::new(),
                range: Span::empty(self.current_offset()),
            },
        }
    }

    fn parse_program(&mut self, len: usize) -> ast::Program {
        let mut statements = Vec::new();
        while !self.is_eof() {
            if let Some(stmt) = self.parse_stmt() {
                statements.push(stmt);
            } else {
                self.bump();
            }
        }
        ast::Program {
            statements,
            range: Span::new(0, len),
        }
    }

    fn parse_stmt(&mut self) -> Option<ast::Stmt> {
        let start = self.peek()?.range.start;

        if self.at_kind(TokenKind::Semi) {
            let semi = self.bump().unwrap();
            return Some(ast::Stmt::Empty(semi.range));
        }

        if self.at_kind(TokenKind::LBrace) {
            return Some(ast::Stmt::Block(self.parse_block()));
        }

        if self.at_keyword("export") {
            if self.nth_is_kind(1, TokenKind::LBrace) {
                return Some(self.parse_export_names(start));
            }
            if self.nth_is_keyword(1, "const")
                || self.nth_is_keyword(1, "let")
                || self.nth_is_keyword(1, "var")
            {
                self.bump();
                return Some(self.parse_var_decl(true, start));
            }
            if self.nth_is_keyword(1, "function") {
                self.bump();
                return Some(ast::Stmt::Func(self.parse_func_decl(true, start)));
            }
            if self.nth_is_keyword(1, "type") && self.peek_n(2).is_some_and(|t| t.kind == TokenKind::Ident) {
                self.bump();
                return Some(ast::Stmt::TypeAlias(self.parse_type_alias(true, start)));
            }
            return None;
        }

        if self.at_keyword("const") || self.at_keyword("let") || self.at_keyword("var") {
            return Some(self.parse_var_decl(false, start));
        }

        if self.at_keyword("function") {
            return Some(ast::Stmt::Func(self.parse_func_decl(false, start)));
        }

        if self.at_keyword("type")
            && self.peek_n(1).is_some_and(|t| t.kind == TokenKind::Ident)
            && self.nth_is_kind(2, TokenKind::Eq)
        {
            return Some(ast::Stmt::TypeAlias(self.parse_type_alias(false, start)));
        }

        if self.at_keyword("return") {
            return Some(self.parse_return_stmt(start));
        }

        if self.at_keyword("if") {
            return Some(self.parse_if_stmt(start));
        }

        let before = self.pos;
        let expr = self.parse_expr();
        if self.pos == before {
            return None;
        }
        let end = self.finish_stmt(expr.range().end);
        Some(ast::Stmt::Expr(ast::ExprStmt {
            expr,
            range: Span::new(start, end),
        }))
    }

    /// Consume an optional trailing semicolon and return the statement end.
    fn finish_stmt(&mut self, content_end: usize) -> usize {
        if self.at_kind(TokenKind::Semi) {
            self.bump().unwrap().range.end
        } else {
            content_end
        }
    }

    fn parse_var_decl(&mut self, exported: bool, start: usize) -> ast::Stmt {
        let kw = self.expect_ident();
        let kind = match kw.name.as_str() {
            "let" => ast::VarKind::Let,
            "var" => ast::VarKind::Var,
            _ => ast::VarKind::Const,
        };

        let mut declarators = Vec::new();
        loop {
            declarators.push(self.parse_declarator());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        let content_end = declarators
            .last()
            .map(|d| d.range.end)
            .unwrap_or(kw.range.end);
        let end = self.finish_stmt(content_end);

        ast::Stmt::Var(ast::VarDeclStmt {
            kind,
            declarators,
            exported,
            range: Span::new(start, end),
        })
    }

    fn parse_declarator(&mut self) -> ast::Declarator {
        let id = self.parse_pat();
        let start = id.range().start;
        let mut end = id.range().end;

        let ty = if self.eat(TokenKind::Colon) {
            let ty = self.parse_type();
            end = ty.range().end;
            Some(ty)
        } else {
            None
        };

        let init = if self.eat(TokenKind::Eq) {
            let expr = self.parse_assign_expr();
            end = expr.range().end;
            Some(expr)
        } else {
            None
        };

        ast::Declarator {
            id,
            ty,
            init,
            range: Span::new(start, end),
        }
    }

    fn parse_pat(&mut self) -> ast::Pat {
        if self.at_kind(TokenKind::LBrace) {
            return ast::Pat::Object(self.parse_object_pat());
        }
        if self.at_kind(TokenKind::LBracket) {
            return ast::Pat::Array(self.parse_array_pat());
        }
        ast::Pat::Ident(self.expect_ident())
    }

    fn parse_object_pat(&mut self) -> ast::ObjectPat {
        let lbrace = self.expect_kind(TokenKind::LBrace);
        let mut props = Vec::new();

        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            if self.at_kind(TokenKind::DotDotDot) {
                let dots = self.bump().unwrap();
                let arg = self.expect_ident();
                let range = Span::new(dots.range.start, arg.range.end);
                props.push(ast::ObjectPatProp::Rest(ast::RestPatProp { arg, range }));
            } else {
                props.push(self.parse_object_pat_prop());
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        let rbrace = self.expect_kind(TokenKind::RBrace);
        ast::ObjectPat {
            props,
            range: Span::new(lbrace.range.start, rbrace.range.end),
        }
    }

    fn parse_object_pat_prop(&mut self) -> ast::ObjectPatProp {
        if self.at_kind(TokenKind::LBracket) {
            let lbracket = self.bump().unwrap();
            let expr = self.parse_assign_expr();
            let rbracket = self.expect_kind(TokenKind::RBracket);
            let key_range = Span::new(lbracket.range.start, rbracket.range.end);
            self.expect_kind(TokenKind::Colon);
            let value = self.parse_pat();
            let range = Span::new(key_range.start, value.range().end);
            return ast::ObjectPatProp::KeyValue(ast::KeyValuePatProp {
                key: ast::PatKey::Computed(ast::ComputedPatKey {
                    expr: Box::new(expr),
                    range: key_range,
                }),
                value,
                shorthand: false,
                range,
            });
        }

        if self.at_kind(TokenKind::Str) || self.at_kind(TokenKind::Number) {
            let lit_tok = self.bump().unwrap();
            let key = ast::PatKey::Lit(ast::LitExpr {
                raw: lit_tok.text,
                range: lit_tok.range,
            });
            self.expect_kind(TokenKind::Colon);
            let value = self.parse_pat();
            let range = Span::new(lit_tok.range.start, value.range().end);
            return ast::ObjectPatProp::KeyValue(ast::KeyValuePatProp {
                key,
                value,
                shorthand: false,
                range,
            });
        }

        let ident = self.expect_ident();
        if self.eat(TokenKind::Colon) {
            let value = self.parse_pat();
            let range = Span::new(ident.range.start, value.range().end);
            ast::ObjectPatProp::KeyValue(ast::KeyValuePatProp {
                key: ast::PatKey::Ident(ident),
                value,
                shorthand: false,
                range,
            })
        } else {
            let range = ident.range;
            ast::ObjectPatProp::KeyValue(ast::KeyValuePatProp {
                key: ast::PatKey::Ident(ident.clone()),
                value: ast::Pat::Ident(ident),
                shorthand: true,
                range,
            })
        }
    }

    fn parse_array_pat(&mut self) -> ast::ArrayPat {
        let lbracket = self.expect_kind(TokenKind::LBracket);
        let mut elements = Vec::new();

        while !self.is_eof() && !self.at_kind(TokenKind::RBracket) {
            if self.at_kind(TokenKind::Comma) {
                let comma = self.bump().unwrap();
                elements.push(ast::ArrayPatElem::Hole(Span::empty(comma.range.start)));
                continue;
            }

            if self.at_kind(TokenKind::DotDotDot) {
                let dots = self.bump().unwrap();
                let arg = self.expect_ident();
                let range = Span::new(dots.range.start, arg.range.end);
                elements.push(ast::ArrayPatElem::Rest(ast::RestPatElem { arg, range }));
            } else {
                elements.push(ast::ArrayPatElem::Pat(self.parse_pat()));
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        let rbracket = self.expect_kind(TokenKind::RBracket);
        ast::ArrayPat {
            elements,
            range: Span::new(lbracket.range.start, rbracket.range.end),
        }
    }

    fn parse_func_decl(&mut self, exported: bool, start: usize) -> ast::FuncDecl {
        self.bump();
        let name = self.expect_ident();

        let lparen = self.expect_kind(TokenKind::LParen);
        let mut params = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RParen) {
            params.push(self.parse_param());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let rparen = self.expect_kind(TokenKind::RParen);
        let params_range = Span::new(lparen.range.start, rparen.range.end);

        let return_ty = if self.eat(TokenKind::Colon) {
            Some(self.parse_type())
        } else {
            None
        };

        let body = self.parse_block();
        let range = Span::new(start, body.range.end);
        ast::FuncDecl {
            name,
            params,
            params_range,
            return_ty,
            body,
            exported,
            range,
        }
    }

    fn parse_param(&mut self) -> ast::Param {
        if self.at_kind(TokenKind::DotDotDot) {
            let dots = self.bump().unwrap();
            let arg = self.expect_ident();
            let range = Span::new(dots.range.start, arg.range.end);
            return ast::Param {
                pat: ast::Pat::Ident(arg),
                ty: None,
                default: None,
                rest: true,
                range,
            };
        }

        let pat = self.parse_pat();
        let start = pat.range().start;
        let mut end = pat.range().end;

        let ty = if self.eat(TokenKind::Colon) {
            let ty = self.parse_type();
            end = ty.range().end;
            Some(ty)
        } else {
            None
        };

        let default = if self.eat(TokenKind::Eq) {
            let expr = self.parse_assign_expr();
            end = expr.range().end;
            Some(expr)
        } else {
            None
        };

        ast::Param {
            pat,
            ty,
            default,
            rest: false,
            range: Span::new(start, end),
        }
    }

    fn parse_block(&mut self) -> ast::Block {
        let lbrace = self.expect_kind(TokenKind::LBrace);
        let mut statements = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            if let Some(stmt) = self.parse_stmt() {
                statements.push(stmt);
            } else {
                self.bump();
            }
        }
        let rbrace = self.expect_kind(TokenKind::RBrace);
        ast::Block {
            statements,
            range: Span::new(lbrace.range.start, rbrace.range.end),
        }
    }

    fn parse_type_alias(&mut self, exported: bool, start: usize) -> ast::TypeAliasDecl {
        self.bump();
        let name = self.expect_ident();
        self.expect_kind(TokenKind::Eq);
        let ty = self.parse_type();
        let end = self.finish_stmt(ty.range().end);
        ast::TypeAliasDecl {
            name,
            ty,
            exported,
            range: Span::new(start, end),
        }
    }

    fn parse_export_names(&mut self, start: usize) -> ast::Stmt {
        self.bump();
        self.expect_kind(TokenKind::LBrace);
        let mut names = Vec::new();
        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            names.push(self.expect_ident());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let rbrace = self.expect_kind(TokenKind::RBrace);
        let end = self.finish_stmt(rbrace.range.end);
        ast::Stmt::ExportNames(ast::ExportNamesStmt {
            names,
            range: Span::new(start, end),
        })
    }

    fn parse_return_stmt(&mut self, start: usize) -> ast::Stmt {
        let kw = self.expect_ident();
        let expr = if self.at_kind(TokenKind::Semi) || self.at_kind(TokenKind::RBrace) || self.is_eof()
        {
            None
        } else {
            Some(self.parse_expr())
        };
        let content_end = expr.as_ref().map(|e| e.range().end).unwrap_or(kw.range.end);
        let end = self.finish_stmt(content_end);
        ast::Stmt::Return(ast::ReturnStmt {
            expr,
            range: Span::new(start, end),
        })
    }

    fn parse_if_stmt(&mut self, start: usize) -> ast::Stmt {
        self.bump();
        self.expect_kind(TokenKind::LParen);
        let condition = self.parse_expr();
        self.expect_kind(TokenKind::RParen);

        let then_branch = self
            .parse_stmt()
            .unwrap_or_else(|| ast::Stmt::Empty(Span::empty(self.current_offset())));
        let mut end = then_branch.range().end;

        let else_branch = if self.at_keyword("else") {
            self.bump();
            let stmt = self
                .parse_stmt()
                .unwrap_or_else(|| ast::Stmt::Empty(Span::empty(self.current_offset())));
            end = stmt.range().end;
            Some(Box::new(stmt))
        } else {
            None
        };

        ast::Stmt::If(ast::IfStmt {
            condition,
            then_branch: Box::new(then_branch),
            else_branch,
            range: Span::new(start, end),
        })
    }

    fn parse_expr(&mut self) -> ast::Expr {
        self.parse_assign_expr()
    }

    fn parse_assign_expr(&mut self) -> ast::Expr {
        let lhs = self.parse_cond_expr();

        let op = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Eq) => ast::AssignOp::Assign,
            Some(TokenKind::PlusEq) => ast::AssignOp::AddAssign,
            Some(TokenKind::MinusEq) => ast::AssignOp::SubAssign,
            Some(TokenKind::StarEq) => ast::AssignOp::MulAssign,
            Some(TokenKind::SlashEq) => ast::AssignOp::DivAssign,
            _ => return lhs,
        };
        self.bump();

        let value = self.parse_assign_expr();
        let range = Span::new(lhs.range().start, value.range().end);
        ast::Expr::Assign(ast::AssignExpr {
            op,
            target: Box::new(lhs),
            value: Box::new(value),
            range,
        })
    }

    fn parse_cond_expr(&mut self) -> ast::Expr {
        let test = self.parse_binary_expr(0);
        if !self.eat(TokenKind::Question) {
            return test;
        }
        let cons = self.parse_assign_expr();
        self.expect_kind(TokenKind::Colon);
        let alt = self.parse_assign_expr();
        let range = Span::new(test.range().start, alt.range().end);
        ast::Expr::Cond(ast::CondExpr {
            test: Box::new(test),
            cons: Box::new(cons),
            alt: Box::new(alt),
            range,
        })
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> ast::Expr {
        let mut lhs = self.parse_unary_expr();

        loop {
            let (op, prec) = match self.peek().map(|t| t.kind) {
                Some(TokenKind::PipePipe) => (ast::BinaryOp::Or, 1),
                Some(TokenKind::AmpAmp) => (ast::BinaryOp::And, 2),
                Some(TokenKind::EqEq) => (ast::BinaryOp::EqEq, 3),
                Some(TokenKind::NotEq) => (ast::BinaryOp::NotEq, 3),
                Some(TokenKind::EqEqEq) => (ast::BinaryOp::StrictEq, 3),
                Some(TokenKind::NotEqEq) => (ast::BinaryOp::StrictNotEq, 3),
                Some(TokenKind::Lt) => (ast::BinaryOp::Lt, 4),
                Some(TokenKind::Le) => (ast::BinaryOp::Le, 4),
                Some(TokenKind::Gt) => (ast::BinaryOp::Gt, 4),
                Some(TokenKind::Ge) => (ast::BinaryOp::Ge, 4),
                Some(TokenKind::Plus) => (ast::BinaryOp::Add, 5),
                Some(TokenKind::Minus) => (ast::BinaryOp::Sub, 5),
                Some(TokenKind::Star) => (ast::BinaryOp::Mul, 6),
                Some(TokenKind::Slash) => (ast::BinaryOp::Div, 6),
                Some(TokenKind::Percent) => (ast::BinaryOp::Rem, 6),
                _ => break,
            };
            if prec < min_prec {
                break;
            }
            self.bump();

            let rhs = self.parse_binary_expr(prec + 1);
            let range = Span::new(lhs.range().start, rhs.range().end);
            lhs = ast::Expr::Binary(ast::BinaryExpr {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                range,
            });
        }

        lhs
    }

    fn parse_unary_expr(&mut self) -> ast::Expr {
        let op = match self.peek() {
            Some(tok) if tok.kind == TokenKind::Bang => Some(ast::UnaryOp::Not),
            Some(tok) if tok.kind == TokenKind::Minus => Some(ast::UnaryOp::Neg),
            Some(tok) if tok.kind == TokenKind::Plus => Some(ast::UnaryOp::Plus),
            Some(tok) if tok.kind == TokenKind::Ident && tok.text == "typeof" => {
                Some(ast::UnaryOp::Typeof)
            }
            Some(tok) if tok.kind == TokenKind::Ident && tok.text == "void" => {
                Some(ast::UnaryOp::Void)
            }
            _ => None,
        };

        let Some(op) = op else {
            return self.parse_postfix_expr();
        };

        let op_tok = self.bump().unwrap();
        let expr = self.parse_unary_expr();
        let range = Span::new(op_tok.range.start, expr.range().end);
        ast::Expr::Unary(ast::UnaryExpr {
            op,
            expr: Box::new(expr),
            range,
        })
    }

    fn parse_postfix_expr(&mut self) -> ast::Expr {
        let mut expr = self.parse_primary_expr();

        loop {
            if self.at_kind(TokenKind::Dot) && self.nth_is_kind(1, TokenKind::Ident) {
                self.bump();
                let ident = self.expect_ident();
                let range = Span::new(expr.range().start, ident.range.end);
                expr = ast::Expr::Member(ast::MemberExpr {
                    object: Box::new(expr),
                    property: Box::new(ast::Expr::Ident(ident)),
                    computed: false,
                    range,
                });
                continue;
            }

            if self.at_kind(TokenKind::LBracket) {
                self.bump();
                let index = self.parse_expr();
                let rbracket = self.expect_kind(TokenKind::RBracket);
                let range = Span::new(expr.range().start, rbracket.range.end);
                expr = ast::Expr::Member(ast::MemberExpr {
                    object: Box::new(expr),
                    property: Box::new(index),
                    computed: true,
                    range,
                });
                continue;
            }

            if self.at_kind(TokenKind::LParen) {
                self.bump();
                let mut args = Vec::new();
                while !self.is_eof() && !self.at_kind(TokenKind::RParen) {
                    args.push(self.parse_assign_expr());
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                let rparen = self.expect_kind(TokenKind::RParen);
                let range = Span::new(expr.range().start, rparen.range.end);
                expr = ast::Expr::Call(ast::CallExpr {
                    callee: Box::new(expr),
                    args,
                    range,
                });
                continue;
            }

            break;
        }

        expr
    }

    fn parse_primary_expr(&mut self) -> ast::Expr {
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Number || tok.kind == TokenKind::Str => {
                let tok = self.bump().unwrap();
                ast::Expr::Lit(ast::LitExpr {
                    raw: tok.text,
                    range: tok.range,
                })
            }
            Some(tok) if tok.kind == TokenKind::Ident => {
                if tok.text == "this" {
                    let tok = self.bump().unwrap();
                    ast::Expr::This(tok.range)
                } else if matches!(tok.text.as_str(), "true" | "false" | "null" | "undefined") {
                    let tok = self.bump().unwrap();
                    ast::Expr::Lit(ast::LitExpr {
                        raw: tok.text,
                        range: tok.range,
                    })
                } else {
                    let ident = self.expect_ident();
                    ast::Expr::Ident(ident)
                }
            }
            Some(tok) if tok.kind == TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expr();
                self.expect_kind(TokenKind::RParen);
                expr
            }
            Some(tok) if tok.kind == TokenKind::LBrace => self.parse_object_lit(),
            Some(tok) if tok.kind == TokenKind::LBracket => self.parse_array_lit(),
            _ => ast::Expr::Missing(Span::empty(self.current_offset())),
        }
    }

    fn parse_object_lit(&mut self) -> ast::Expr {
        let lbrace = self.expect_kind(TokenKind::LBrace);
        let mut props = Vec::new();

        while !self.is_eof() && !self.at_kind(TokenKind::RBrace) {
            if self.at_kind(TokenKind::DotDotDot) {
                let dots = self.bump().unwrap();
                let expr = self.parse_assign_expr();
                let range = Span::new(dots.range.start, expr.range().end);
                props.push(ast::ObjectLitProp::Spread(ast::SpreadProp { expr, range }));
            } else if self.at_kind(TokenKind::LBracket) {
                self.bump();
                let key = self.parse_assign_expr();
                self.expect_kind(TokenKind::RBracket);
                self.expect_kind(TokenKind::Colon);
                let value = self.parse_assign_expr();
                let range = Span::new(key.range().start, value.range().end);
                props.push(ast::ObjectLitProp::KeyValue(ast::KeyValueProp {
                    key: ast::PropKey::Computed(Box::new(key)),
                    value,
                    range,
                }));
            } else if self.at_kind(TokenKind::Str) || self.at_kind(TokenKind::Number) {
                let tok = self.bump().unwrap();
                let key = ast::PropKey::Lit(ast::LitExpr {
                    raw: tok.text,
                    range: tok.range,
                });
                self.expect_kind(TokenKind::Colon);
                let value = self.parse_assign_expr();
                let range = Span::new(tok.range.start, value.range().end);
                props.push(ast::ObjectLitProp::KeyValue(ast::KeyValueProp {
                    key,
                    value,
                    range,
                }));
            } else {
                let ident = self.expect_ident();
                if self.eat(TokenKind::Colon) {
                    let value = self.parse_assign_expr();
                    let range = Span::new(ident.range.start, value.range().end);
                    props.push(ast::ObjectLitProp::KeyValue(ast::KeyValueProp {
                        key: ast::PropKey::Ident(ident),
                        value,
                        range,
                    }));
                } else {
                    props.push(ast::ObjectLitProp::Shorthand(ident));
                }
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        let rbrace = self.expect_kind(TokenKind::RBrace);
        ast::Expr::Object(ast::ObjectLit {
            props,
            range: Span::new(lbrace.range.start, rbrace.range.end),
        })
    }

    fn parse_array_lit(&mut self) -> ast::Expr {
        let lbracket = self.expect_kind(TokenKind::LBracket);
        let mut elements = Vec::new();

        while !self.is_eof() && !self.at_kind(TokenKind::RBracket) {
            if self.at_kind(TokenKind::Comma) {
                elements.push(None);
                self.bump();
                continue;
            }

            // Spread elements are folded into their inner expression.
            self.eat(TokenKind::DotDotDot);
            elements.push(Some(self.parse_assign_expr()));

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        let rbracket = self.expect_kind(TokenKind::RBracket);
        ast::Expr::Array(ast::ArrayLit {
            elements,
            range: Span::new(lbracket.range.start, rbracket.range.end),
        })
    }

    fn parse_type(&mut self) -> ast::TypeExpr {
        let first = self.parse_type_primary();
        if !self.at_kind(TokenKind::Pipe) {
            return first;
        }

        let start = first.range().start;
        let mut end = first.range().end;
        let mut variants = vec![first];
        while self.eat(TokenKind::Pipe) {
            let variant = self.parse_type_primary();
            end = variant.range().end;
            variants.push(variant);
        }

        ast::TypeExpr::Union(ast::UnionType {
            variants,
            range: Span::new(start, end),
        })
    }

    fn parse_type_primary(&mut self) -> ast::TypeExpr {
        let name = self.expect_ident();
        let start = name.range.start;
        let mut end = name.range.end;

        let mut args = Vec::new();
        if self.at_kind(TokenKind::Lt) {
            self.bump();
            while !self.is_eof() && !self.at_kind(TokenKind::Gt) {
                args.push(self.parse_type());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            let gt = self.expect_kind(TokenKind::Gt);
            end = gt.range.end;
        }

        ast::TypeExpr::Ref(ast::TypeRef {
            name,
            args,
            range: Span::new(start, end),
        })
    }
}
