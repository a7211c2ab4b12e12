use crate::ast::{AssignOp, AssignTarget, BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::token::{Token, TokenKind};

/// Operator precedence levels (higher = binds tighter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Assignment,     // = += -= *= /= %=
    Ternary,        // ?:
    Or,             // ||
    And,            // &&
    Equality,       // == !=
    Comparison,     // < > <= >=
    Additive,       // + - .
    Multiplicative, // * / %
}

impl Precedence {
    fn next(self) -> Precedence {
        match self {
            Precedence::Assignment => Precedence::Ternary,
            Precedence::Ternary => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Multiplicative,
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            eof: Token::new(TokenKind::Eof, 0, 0),
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, msg: &str) -> Result<Token, String> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(format!(
                "{} at line {}, column {} (found {:?})",
                msg,
                self.current().line,
                self.current().column,
                self.current().kind
            ))
        }
    }

    fn error_here(&self, msg: &str) -> String {
        format!(
            "{} at line {}, column {}",
            msg,
            self.current().line,
            self.current().column
        )
    }

    fn consume_identifier(&mut self, what: &str) -> Result<String, String> {
        match self.current().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here(&format!("Expected {}", what))),
        }
    }

    pub fn parse(&mut self) -> Result<Program, String> {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    // ==================== Statements ====================

    fn parse_statement(&mut self) -> Result<Stmt, String> {
        match self.current().kind {
            TokenKind::Var | TokenKind::Const => self.parse_var_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Function => self.parse_function(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Echo => self.parse_echo(),
            TokenKind::LeftBrace => self.parse_block().map(Stmt::Block),
            _ => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after expression")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, String> {
        self.consume(TokenKind::LeftBrace, "Expected '{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.check(&TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RightBrace, "Expected '}' after block")?;
        Ok(statements)
    }

    /// A loop or conditional body: a block yields its statements, any other
    /// single statement becomes a one-element body.
    fn parse_branch(&mut self) -> Result<Vec<Stmt>, String> {
        if self.check(&TokenKind::LeftBrace) {
            self.parse_block()
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, String> {
        let is_const = matches!(self.advance().kind, TokenKind::Const);
        let name = self.consume_identifier("variable name")?;
        let init = if self.matches(&TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after declaration")?;
        Ok(Stmt::VarDecl {
            name,
            init,
            is_const,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, String> {
        self.advance(); // 'if'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;
        let then_branch = self.parse_branch()?;
        let else_branch = if self.matches(&TokenKind::Else) {
            Some(self.parse_branch()?)
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, String> {
        self.advance(); // 'while'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;
        let body = self.parse_branch()?;
        Ok(Stmt::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<Stmt, String> {
        self.advance(); // 'for'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let init = if self.matches(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::Var) || self.check(&TokenKind::Const) {
            Some(Box::new(self.parse_var_decl()?))
        } else {
            let expr = self.parse_expression()?;
            self.consume(TokenKind::Semicolon, "Expected ';' after for initializer")?;
            Some(Box::new(Stmt::Expression(expr)))
        };

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after for condition")?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::RightParen, "Expected ')' after for clauses")?;

        let body = self.parse_branch()?;
        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_foreach(&mut self) -> Result<Stmt, String> {
        self.advance(); // 'foreach'
        self.consume(TokenKind::LeftParen, "Expected '(' after 'foreach'")?;
        let array = self.parse_expression()?;
        // 'as' is contextual: an ordinary identifier everywhere else
        match self.current().kind.clone() {
            TokenKind::Identifier(word) if word == "as" => {
                self.advance();
            }
            _ => return Err(self.error_here("Expected 'as' in foreach")),
        }
        let value = self.consume_identifier("loop variable name")?;
        self.consume(TokenKind::RightParen, "Expected ')' after foreach")?;
        let body = self.parse_branch()?;
        Ok(Stmt::Foreach { array, value, body })
    }

    fn parse_function(&mut self) -> Result<Stmt, String> {
        self.advance(); // 'function'
        let name = self.consume_identifier("function name")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.consume_identifier("parameter name")?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        let body = self.parse_block()?;
        Ok(Stmt::Function { name, params, body })
    }

    fn parse_return(&mut self) -> Result<Stmt, String> {
        self.advance(); // 'return'
        let expr = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after return")?;
        Ok(Stmt::Return(expr))
    }

    fn parse_echo(&mut self) -> Result<Stmt, String> {
        self.advance(); // 'echo'
        let mut exprs = vec![self.parse_expression()?];
        while self.matches(&TokenKind::Comma) {
            exprs.push(self.parse_expression()?);
        }
        self.consume(TokenKind::Semicolon, "Expected ';' after echo")?;
        Ok(Stmt::Echo(exprs))
    }

    // ==================== Expressions ====================

    fn parse_expression(&mut self) -> Result<Expr, String> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, String> {
        let expr = self.parse_ternary()?;

        let op = match self.current().kind {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::PlusAssign => Some(AssignOp::AddAssign),
            TokenKind::MinusAssign => Some(AssignOp::SubAssign),
            TokenKind::MulAssign => Some(AssignOp::MulAssign),
            TokenKind::DivAssign => Some(AssignOp::DivAssign),
            TokenKind::ModAssign => Some(AssignOp::ModAssign),
            _ => None,
        };

        match op {
            Some(op) => {
                let line = self.current().line;
                let column = self.current().column;
                self.advance();
                let target = Self::as_assign_target(expr).ok_or(format!(
                    "Invalid assignment target at line {}, column {}",
                    line, column
                ))?;
                // Right-associative
                let value = self.parse_assignment()?;
                Ok(Expr::Assign {
                    target,
                    op,
                    value: Box::new(value),
                })
            }
            None => Ok(expr),
        }
    }

    fn as_assign_target(expr: Expr) -> Option<AssignTarget> {
        match expr {
            Expr::Variable(name) => Some(AssignTarget::Name(name)),
            Expr::Index { array, index } => match *array {
                Expr::Variable(name) => Some(AssignTarget::Index { name, index }),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_ternary(&mut self) -> Result<Expr, String> {
        let condition = self.parse_precedence(Precedence::Or)?;
        if self.matches(&TokenKind::QuestionMark) {
            let then_expr = self.parse_expression()?;
            self.consume(TokenKind::Colon, "Expected ':' in ternary expression")?;
            let else_expr = self.parse_expression()?;
            Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            })
        } else {
            Ok(condition)
        }
    }

    fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, Precedence)> {
        match kind {
            TokenKind::Or => Some((BinaryOp::Or, Precedence::Or)),
            TokenKind::And => Some((BinaryOp::And, Precedence::And)),
            TokenKind::Equal => Some((BinaryOp::Equal, Precedence::Equality)),
            TokenKind::NotEqual => Some((BinaryOp::NotEqual, Precedence::Equality)),
            TokenKind::LessThan => Some((BinaryOp::LessThan, Precedence::Comparison)),
            TokenKind::GreaterThan => Some((BinaryOp::GreaterThan, Precedence::Comparison)),
            TokenKind::LessEqual => Some((BinaryOp::LessEqual, Precedence::Comparison)),
            TokenKind::GreaterEqual => Some((BinaryOp::GreaterEqual, Precedence::Comparison)),
            TokenKind::Plus => Some((BinaryOp::Add, Precedence::Additive)),
            TokenKind::Minus => Some((BinaryOp::Sub, Precedence::Additive)),
            TokenKind::Dot => Some((BinaryOp::Concat, Precedence::Additive)),
            TokenKind::Mul => Some((BinaryOp::Mul, Precedence::Multiplicative)),
            TokenKind::Div => Some((BinaryOp::Div, Precedence::Multiplicative)),
            TokenKind::Mod => Some((BinaryOp::Mod, Precedence::Multiplicative)),
            _ => None,
        }
    }

    /// Precedence climbing over the binary operators. All binary operators
    /// are left-associative.
    fn parse_precedence(&mut self, min: Precedence) -> Result<Expr, String> {
        let mut left = self.parse_unary()?;

        while let Some((op, prec)) = Self::binary_op(&self.current().kind) {
            if prec < min {
                break;
            }
            self.advance();
            let right = self.parse_precedence(prec.next())?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        let op = match self.current().kind {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Increment => Some(UnaryOp::PreInc),
            TokenKind::Decrement => Some(UnaryOp::PreDec),
            _ => None,
        };

        match op {
            Some(op) => {
                let line = self.current().line;
                let column = self.current().column;
                self.advance();
                let expr = self.parse_unary()?;
                if matches!(op, UnaryOp::PreInc | UnaryOp::PreDec)
                    && !matches!(expr, Expr::Variable(_))
                {
                    return Err(format!(
                        "'++'/'--' needs a variable at line {}, column {}",
                        line, column
                    ));
                }
                Ok(Expr::Unary {
                    op,
                    expr: Box::new(expr),
                })
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current().kind {
                TokenKind::LeftParen => {
                    let line = self.current().line;
                    let column = self.current().column;
                    self.advance();
                    let name = match expr {
                        Expr::Variable(name) => name,
                        _ => {
                            return Err(format!(
                                "Only named functions can be called at line {}, column {}",
                                line, column
                            ))
                        }
                    };
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RightParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.matches(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
                    expr = Expr::FunctionCall { name, args };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::RightBracket, "Expected ']' after index")?;
                    expr = Expr::Index {
                        array: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Increment | TokenKind::Decrement => {
                    let op = if self.check(&TokenKind::Increment) {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    if !matches!(expr, Expr::Variable(_)) {
                        return Err(self.error_here("'++'/'--' needs a variable"));
                    }
                    self.advance();
                    expr = Expr::Unary {
                        op,
                        expr: Box::new(expr),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Integer(n))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::Float(f))
            }
            TokenKind::String(raw) => {
                self.advance();
                Ok(Expr::String(Self::resolve_escapes(&raw)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Variable(name))
            }
            // Builtin keywords usable in call position
            TokenKind::Print => {
                self.advance();
                Ok(Expr::Variable("print".to_string()))
            }
            TokenKind::SleepMs => {
                self.advance();
                Ok(Expr::Variable("sleep_ms".to_string()))
            }
            TokenKind::Millis => {
                self.advance();
                Ok(Expr::Variable("millis".to_string()))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RightBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RightBracket, "Expected ']' after array literal")?;
                Ok(Expr::ArrayLiteral(elements))
            }
            _ => Err(format!(
                "Unexpected token {:?} at line {}, column {}",
                token.kind, token.line, token.column
            )),
        }
    }

    /// Resolve backslash escapes stored verbatim by the lexer.
    fn resolve_escapes(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some(other) => out.push(other),
                    None => out.push('\\'),
                }
            } else {
                out.push(ch);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Result<Program, String> {
        let tokens = Lexer::new(source).tokenize()?;
        Parser::new(tokens).parse()
    }

    #[test]
    fn precedence_mul_over_add() {
        let program = parse("1 + 2 * 3;").expect("parse failed");
        match &program.statements[0] {
            Stmt::Expression(Expr::Binary { op, right, .. }) => {
                assert_eq!(*op, BinaryOp::Add);
                assert!(matches!(**right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn concat_binds_like_additive() {
        let program = parse("\"a\" . 1 + 2;").expect("parse failed");
        // Left-associative: ("a" . 1) + 2
        match &program.statements[0] {
            Stmt::Expression(Expr::Binary { op, left, .. }) => {
                assert_eq!(*op, BinaryOp::Add);
                assert!(matches!(**left, Expr::Binary { op: BinaryOp::Concat, .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parse("a = b = 1;").expect("parse failed");
        match &program.statements[0] {
            Stmt::Expression(Expr::Assign { value, .. }) => {
                assert!(matches!(**value, Expr::Assign { .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn indexed_assignment_target() {
        let program = parse("a[0] = 1;").expect("parse failed");
        match &program.statements[0] {
            Stmt::Expression(Expr::Assign { target, .. }) => {
                assert!(matches!(target, AssignTarget::Index { .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn function_definition_and_call() {
        let program = parse("function add(a, b) { return a + b; } print(add(2, 3));")
            .expect("parse failed");
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(
            program.statements[0],
            Stmt::Function { ref params, .. } if params.len() == 2
        ));
    }

    #[test]
    fn for_loop_with_declaration() {
        let program = parse("for (var i = 0; i < 5; i = i + 1) { }").expect("parse failed");
        match &program.statements[0] {
            Stmt::For { init, condition, update, .. } => {
                assert!(matches!(init.as_deref(), Some(Stmt::VarDecl { .. })));
                assert!(condition.is_some());
                assert!(update.is_some());
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn foreach_uses_contextual_as() {
        let program = parse("foreach (xs as x) { print(x); }").expect("parse failed");
        assert!(matches!(
            program.statements[0],
            Stmt::Foreach { ref value, .. } if value == "x"
        ));
        // "as" stays a plain identifier outside foreach
        assert!(parse("var as = 1;").is_ok());
    }

    #[test]
    fn escapes_resolved_in_string_literals() {
        let program = parse(r#"print("a\tb\n");"#).expect("parse failed");
        match &program.statements[0] {
            Stmt::Expression(Expr::FunctionCall { args, .. }) => {
                assert!(matches!(args[0], Expr::String(ref s) if s == "a\tb\n"));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn missing_semicolon_reports_position() {
        let err = parse("print(1)").unwrap_err();
        assert!(err.contains("Expected ';'"));
        assert!(err.contains("line 1"));
    }

    #[test]
    fn ternary_parses() {
        let program = parse("a = 1 < 2 ? \"y\" : \"n\";").expect("parse failed");
        match &program.statements[0] {
            Stmt::Expression(Expr::Assign { value, .. }) => {
                assert!(matches!(**value, Expr::Ternary { .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }
}
