use std::rc::Rc;

use super::{
    expr::{Expression, Identifier, Literal},
    stmt::{FnDecl, Statement},
    token::{Keyword, Token, TokenKind},
    ExprParser,
};
use crate::{
    error::{Error, ErrorKind, PResult},
    stack::ensure_sufficient_stack,
};

/// Upper bound on parameters of a declaration and arguments of a call.
pub(crate) const MAX_ARGS: usize = 255;

/// Upper bound on how deeply statements and expressions may nest. Every
/// later pass over the tree recurses at most this deep.
pub(crate) const MAX_NESTING: usize = 1024;

/// Parses a whole program. The first error aborts parsing; no partial program
/// is returned.
pub fn parse(tokens: Vec<Token<'_>>) -> PResult<Vec<Statement>> {
    Parser::new(tokens).parse_program()
}

pub struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    current: usize,
    /// Number of function bodies enclosing the cursor.
    fn_depth: usize,
    /// Nesting level of the node being parsed.
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(mut tokens: Vec<Token<'src>>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::eof(line));
        }

        Self {
            tokens,
            current: 0,
            fn_depth: 0,
            depth: 0,
        }
    }

    pub fn parse_program(&mut self) -> PResult<Vec<Statement>> {
        let mut statements = vec![];

        while !self.at(TokenKind::Eof) {
            statements.push(self.parse_declaration()?);
        }

        log::debug!("parsed {} top-level statements", statements.len());
        Ok(statements)
    }

    /// Parses the whole input as one expression with nothing after it.
    pub fn parse_standalone_expr(&mut self) -> PResult<Expression> {
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Eof, "Expect end of expression.")?;
        Ok(expr)
    }

    fn parse_declaration(&mut self) -> PResult<Statement> {
        match self.peek().kind {
            TokenKind::Kw(Keyword::Var) => {
                self.bump();
                self.parse_var_decl()
            }
            TokenKind::Kw(Keyword::Fun) => {
                self.bump();
                let decl = self.parse_fn_decl()?;
                Ok(Statement::FnDecl(Rc::new(decl)))
            }
            _ => self.parse_stmt(),
        }
    }

    fn parse_var_decl(&mut self) -> PResult<Statement> {
        let name = self.parse_id("Expect variable name.")?;
        let init = if self.eat_if(TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Statement::VarDecl { name, init })
    }

    fn parse_fn_decl(&mut self) -> PResult<FnDecl> {
        let name = self.parse_id("Expect function name.")?;
        self.expect(TokenKind::LParen, "Expect '(' after function name.")?;
        let params = self.parse_rep(TokenKind::RParen, |p| {
            p.parse_id("Expect parameter name.")
        })?;
        self.expect(TokenKind::RParen, "Expect ')' after parameters.")?;
        self.expect(TokenKind::LCurly, "Expect '{' before function body.")?;

        self.fn_depth += 1;
        let body = ensure_sufficient_stack(|| self.nested(Self::parse_block));
        self.fn_depth -= 1;

        Ok(FnDecl {
            name,
            params,
            body: body?,
        })
    }

    fn parse_stmt(&mut self) -> PResult<Statement> {
        ensure_sufficient_stack(|| self.nested(Self::parse_stmt_inner))
    }

    fn parse_stmt_inner(&mut self) -> PResult<Statement> {
        match self.peek().kind {
            TokenKind::Kw(Keyword::Print) => {
                let line = self.bump().line;
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, "Expect ';' after value.")?;
                Ok(Statement::Print { value, line })
            }
            TokenKind::Kw(Keyword::If) => {
                self.bump();
                self.parse_if_stmt()
            }
            TokenKind::Kw(Keyword::While) => {
                self.bump();
                self.parse_while_stmt()
            }
            TokenKind::Kw(Keyword::For) => {
                self.bump();
                self.parse_for_stmt()
            }
            TokenKind::Kw(Keyword::Return) => self.parse_return_stmt(),
            TokenKind::LCurly => {
                self.bump();
                Ok(Statement::Block(self.parse_block()?))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, "Expect ';' after expression.")?;
                Ok(Statement::Expression(expr))
            }
        }
    }

    fn parse_if_stmt(&mut self) -> PResult<Statement> {
        self.expect(TokenKind::LParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen, "Expect ')' after if condition.")?;

        // The nested parse consumes any `else` first, so it binds to the
        // nearest `if`.
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat_if(TokenKind::Kw(Keyword::Else)) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while_stmt(&mut self) -> PResult<Statement> {
        self.expect(TokenKind::LParen, "Expect '(' after 'while'.")?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen, "Expect ')' after condition.")?;
        let body = Box::new(self.parse_stmt()?);

        Ok(Statement::While { condition, body })
    }

    /// `for` has no node of its own; it is rewritten into a `while` loop
    /// wrapped in blocks.
    fn parse_for_stmt(&mut self) -> PResult<Statement> {
        self.expect(TokenKind::LParen, "Expect '(' after 'for'.")?;

        let init = match self.peek().kind {
            TokenKind::Semicolon => {
                self.bump();
                None
            }
            TokenKind::Kw(Keyword::Var) => {
                self.bump();
                Some(self.parse_var_decl()?)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, "Expect ';' after expression.")?;
                Some(Statement::Expression(expr))
            }
        };

        let condition = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RParen, "Expect ')' after for clauses.")?;

        let mut body = self.parse_stmt()?;

        if let Some(increment) = increment {
            body = Statement::Block(vec![body, Statement::Expression(increment)]);
        }

        body = Statement::While {
            condition: condition.unwrap_or(Expression::Literal(Literal::Boolean(true))),
            body: Box::new(body),
        };

        if let Some(init) = init {
            body = Statement::Block(vec![init, body]);
        }

        Ok(body)
    }

    fn parse_return_stmt(&mut self) -> PResult<Statement> {
        let keyword = self.bump();
        if self.fn_depth == 0 {
            return Err(Self::error_at(&keyword, ErrorKind::ReturnOutsideFunction));
        }

        let value = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after return value.")?;

        Ok(Statement::Return {
            value,
            line: keyword.line,
        })
    }

    /// Parses declarations up to and including the closing `}`. The opening
    /// `{` must already be consumed.
    fn parse_block(&mut self) -> PResult<Vec<Statement>> {
        let mut statements = vec![];

        while !self.at(TokenKind::RCurly) && !self.at(TokenKind::Eof) {
            statements.push(self.parse_declaration()?);
        }
        self.expect(TokenKind::RCurly, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn parse_id(&mut self, msg: &str) -> PResult<Identifier> {
        let token = self.expect(TokenKind::Identifier, msg)?;
        Ok(Identifier::new(token.lexeme, token.line))
    }

    /// Parses a comma separated list that ends before `closing`, which is left
    /// for the caller to consume.
    pub(super) fn parse_rep<T, F>(&mut self, closing: TokenKind, mut producer: F) -> PResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> PResult<T>,
    {
        let mut result = vec![];

        if self.at(closing) {
            return Ok(result);
        }

        loop {
            if result.len() >= MAX_ARGS {
                return Err(Self::error_at(
                    self.peek(),
                    ErrorKind::TooManyArguments(MAX_ARGS),
                ));
            }
            result.push(producer(self)?);

            if !self.eat_if(TokenKind::Comma) {
                break;
            }
        }

        Ok(result)
    }

    /// Runs `f` one nesting level deeper.
    pub(super) fn nested<T, F>(&mut self, f: F) -> PResult<T>
    where
        F: FnOnce(&mut Self) -> PResult<T>,
    {
        self.restoring_depth(|p| {
            p.descend()?;
            f(p)
        })
    }

    /// Runs `f` and resets the nesting level afterwards, for loops that
    /// descend once per iteration.
    pub(super) fn restoring_depth<T, F>(&mut self, f: F) -> PResult<T>
    where
        F: FnOnce(&mut Self) -> PResult<T>,
    {
        let depth = self.depth;
        let result = f(self);
        self.depth = depth;
        result
    }

    pub(super) fn descend(&mut self) -> PResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(Self::error_at(
                self.peek(),
                ErrorKind::TooDeeplyNested(MAX_NESTING),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    #[inline]
    pub(super) fn peek(&self) -> &Token<'src> {
        // `new` guarantees a trailing `Eof` and the cursor never moves past it.
        &self.tokens[self.current]
    }

    #[inline]
    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(super) fn bump(&mut self) -> Token<'src> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }

    pub(super) fn eat_if(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            return true;
        }
        false
    }

    pub(super) fn expect(&mut self, expected: TokenKind, msg: &str) -> PResult<Token<'src>> {
        if self.at(expected) {
            return Ok(self.bump());
        }
        Err(Self::error_at(
            self.peek(),
            ErrorKind::UnexpectedToken(msg.into()),
        ))
    }

    pub(super) fn error_at(token: &Token<'_>, kind: ErrorKind) -> Error {
        Error::new(kind, token.line).with_context(token.location())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{parse, MAX_NESTING};
    use crate::{
        error::{Error, ErrorKind},
        syntax::{
            expr::{Expression, Identifier, Literal},
            lexer::scan,
            stmt::Statement,
        },
    };

    fn parse_str(src: &str) -> Result<Vec<Statement>, Error> {
        parse(scan(src).unwrap())
    }

    fn render(src: &str) -> Vec<String> {
        parse_str(src)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn parse_var_stmt() {
        let program = parse_str("var a = 42;").unwrap();
        let expected = vec![Statement::VarDecl {
            name: Identifier::new("a", 1),
            init: Some(Expression::Literal(Literal::Number(42.0))),
        }];

        assert_eq!(program, expected);
    }

    #[test]
    fn var_without_initializer() {
        assert_eq!(render("var a;"), vec!["(var a)"]);
    }

    #[test]
    fn dangling_else_binds_to_nearest_if() {
        assert_eq!(
            render("if (a) if (b) print 1; else print 2;"),
            vec!["(if a (if b (print 1) (print 2)))"]
        );
    }

    #[test]
    fn for_desugars_to_while() {
        assert_eq!(
            render("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i 0) (while (< i 3) (block (print i) (; (= i (+ i 1))))))"]
        );
        assert_eq!(render("for (;;) x;"), vec!["(while true (; x))"]);
    }

    #[test]
    fn function_declaration() {
        assert_eq!(
            render("fun add(a, b) { return a + b; }"),
            vec!["(fun add (a b) (return (+ a b)))"]
        );
    }

    #[test]
    fn missing_semicolon_reports_line() {
        let err = parse_str("print 1;\nprint 2").unwrap_err();

        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedToken("Expect ';' after value.".into())
        );
        assert_eq!(err.line, 2);
        assert_eq!(err.context.as_deref(), Some("at end"));
    }

    #[test]
    fn unclosed_block() {
        let err = parse_str("{ var a = 1;").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedToken("Expect '}' after block.".into())
        );
    }

    #[test]
    fn return_at_top_level_is_rejected() {
        let err = parse_str("{ return 1; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReturnOutsideFunction);
        assert_eq!(err.context.as_deref(), Some("at 'return'"));
    }

    #[test]
    fn too_many_parameters() {
        let params: Vec<String> = (0..256).map(|i| format!("p{i}")).collect();
        let src = format!("fun f({}) {{}}", params.join(", "));

        let err = parse_str(&src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TooManyArguments(255));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let blocks = format!("{}print 1;{}", "{".repeat(100_000), "}".repeat(100_000));
        let err = parse_str(&blocks).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TooDeeplyNested(MAX_NESTING));

        let ifs = format!("{}print 1;", "if (true) ".repeat(100_000));
        assert_eq!(
            parse_str(&ifs).unwrap_err().kind,
            ErrorKind::TooDeeplyNested(MAX_NESTING)
        );

        let mut funs = String::new();
        for i in 0..100_000 {
            funs.push_str(&format!("fun f{i}() {{"));
        }
        funs.push_str(&"}".repeat(100_000));
        assert_eq!(
            parse_str(&funs).unwrap_err().kind,
            ErrorKind::TooDeeplyNested(MAX_NESTING)
        );
    }

    #[test]
    fn nesting_below_the_limit_parses() {
        let depth = MAX_NESTING / 2;
        let src = format!("{}print 1;{}", "{".repeat(depth), "}".repeat(depth));
        assert_eq!(parse_str(&src).unwrap().len(), 1);
    }
}
