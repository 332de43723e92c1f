use std::rc::Rc;

use crate::prelude::*;

pub struct Parser {
    scanner: Scanner,
    current: Token,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self { scanner: Scanner::new(source), current: Token::new(TokenType::EOF, "", None, 1, 0) }
    }

    /// Parses a whole program. The first error aborts parsing, there is no resync.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        self.advance()?;

        let mut statements = vec![];
        loop {
            self.skip_line_feeds()?;
            if self.is_at_end() {
                break;
            }

            match self.statement()? {
                Some(stmt) => statements.push(stmt),
                None => return Err(self.expression_error("Expect statement")),
            }
        }

        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Option<Stmt>, ParseError> {
        self.skip_line_feeds()?;

        let stmt = match self.current.token_type {
            TokenType::Import => self.import_statement()?,
            TokenType::Func => Stmt::Function(Rc::new(self.function_declaration()?)),
            TokenType::Return => self.return_statement()?,
            TokenType::Break => {
                self.advance()?;
                self.consume_terminator()?;
                Stmt::Break
            }
            TokenType::Continue => {
                self.advance()?;
                self.consume_terminator()?;
                Stmt::Continue
            }
            TokenType::If => self.if_statement()?,
            TokenType::For => self.for_statement()?,
            TokenType::While => self.while_statement()?,
            TokenType::Var | TokenType::Const => Stmt::Var(Rc::new(self.var_declaration()?)),
            TokenType::Class => Stmt::Class(Rc::new(self.class_declaration()?)),
            TokenType::LeftBrace => {
                let block = self.block()?;
                self.consume_terminator()?;
                Stmt::Block(block)
            }
            _ => return self.expression_statement(),
        };

        Ok(Some(stmt))
    }

    fn expression_statement(&mut self) -> Result<Option<Stmt>, ParseError> {
        match self.expression()? {
            Some(expr) => {
                self.consume_terminator()?;
                Ok(Some(Stmt::Expression { expr }))
            }
            None => Ok(None),
        }
    }

    fn import_statement(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?;
        let name = self.consume(TokenType::Identifier, "Expect module name after 'import'")?;
        self.consume_terminator()?;

        Ok(Stmt::Import { name: name.lexeme })
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?;
        let value = self.expression()?;
        self.consume_terminator()?;

        Ok(Stmt::Return { value })
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?;
        let condition = self.required_expression("Expect condition after 'if'")?;
        let then_branch = self.block()?;

        let else_branch = if self.match_tt(&[TokenType::Else])? {
            if self.check(TokenType::If) {
                // The nested if consumes the terminator
                Some(Box::new(self.if_statement()?))
            } else {
                let block = self.block()?;
                self.consume_terminator()?;
                Some(Box::new(Stmt::Block(block)))
            }
        } else {
            self.consume_terminator()?;
            None
        };

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?;
        let index = self.consume(TokenType::Identifier, "Expect index name after 'for'")?;
        self.consume(TokenType::In, "Expect 'in' after index name")?;
        let start = self.required_expression("Expect range start after 'in'")?;
        self.consume(TokenType::To, "Expect 'to' after range start")?;
        let end = self.required_expression("Expect range end after 'to'")?;

        let step = if self.match_tt(&[TokenType::Step])? {
            Some(self.required_expression("Expect step after 'step'")?)
        } else {
            None
        };

        let body = self.block()?;
        self.consume_terminator()?;

        Ok(Stmt::For { index: index.lexeme, start, end, step, body })
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.advance()?;
        let condition = self.required_expression("Expect condition after 'while'")?;
        let body = self.block()?;
        self.consume_terminator()?;

        Ok(Stmt::While { condition, body })
    }

    fn var_declaration(&mut self) -> Result<VarDecl, ParseError> {
        let is_constant = self.advance()?.token_type == TokenType::Const;
        let name = self.consume(TokenType::Identifier, "Expect variable name")?;

        let type_path =
            if self.match_tt(&[TokenType::Colon])? { Some(self.type_path()?) } else { None };

        let initializer = if self.match_tt(&[TokenType::Equal])? {
            Some(self.required_expression("Expect initializer after '='")?)
        } else if is_constant {
            return Err(self.expression_error("Expect initializer for constant"));
        } else {
            None
        };

        self.consume_terminator()?;

        Ok(VarDecl { name: name.lexeme, type_path, is_constant, initializer })
    }

    fn function_declaration(&mut self) -> Result<FunctionDecl, ParseError> {
        self.advance()?;
        let prototype = self.prototype()?;
        let body = self.block()?;
        self.consume_terminator()?;

        Ok(FunctionDecl { prototype, body: Rc::new(body) })
    }

    fn prototype(&mut self) -> Result<PrototypeDecl, ParseError> {
        if !self.check(TokenType::Identifier) {
            return Err(self.prototype_error("Expect function name"));
        }
        let name = self.advance()?.lexeme;

        if !self.match_tt(&[TokenType::LeftParen])? {
            return Err(self.prototype_error("Expect '(' after function name"));
        }

        let mut params = vec![];
        while !self.check(TokenType::RightParen) {
            params.push(self.parameter()?);
            // Commas between parameters are optional
            self.match_tt(&[TokenType::Comma])?;
        }
        self.advance()?;

        let return_type =
            if self.match_tt(&[TokenType::Arrow])? { Some(self.type_path()?) } else { None };

        Ok(PrototypeDecl { name, params, return_type })
    }

    fn parameter(&mut self) -> Result<ParamDecl, ParseError> {
        let is_anonymous = self.match_tt(&[TokenType::Hash])?;

        if !self.check(TokenType::Identifier) {
            return Err(self.prototype_error("Expect parameter name"));
        }
        let name = self.advance()?.lexeme;

        if !self.match_tt(&[TokenType::Colon])? {
            return Err(self.prototype_error("Expect ':' after parameter name"));
        }
        let type_path = self.type_path()?;

        Ok(ParamDecl { name, type_path, is_anonymous })
    }

    fn class_declaration(&mut self) -> Result<ClassDecl, ParseError> {
        self.advance()?;
        let name = self.consume(TokenType::Identifier, "Expect class name")?;
        let superclass =
            if self.match_tt(&[TokenType::Colon])? { Some(self.type_path()?) } else { None };

        let mut class = ClassDecl { name: name.lexeme, superclass, ..Default::default() };

        self.consume(TokenType::LeftBrace, "Expect '{' before class body")?;
        loop {
            self.skip_line_feeds()?;

            match self.current.token_type {
                TokenType::RightBrace => break,
                TokenType::Var | TokenType::Const => {
                    class.instance_properties.push(Rc::new(self.var_declaration()?))
                }
                TokenType::Func => class.instance_methods.push(Rc::new(self.function_declaration()?)),
                TokenType::Class => class.inner_classes.push(Rc::new(self.class_declaration()?)),
                TokenType::Static => {
                    self.advance()?;
                    match self.current.token_type {
                        TokenType::Var | TokenType::Const => {
                            class.static_properties.push(Rc::new(self.var_declaration()?))
                        }
                        TokenType::Func => {
                            class.static_methods.push(Rc::new(self.function_declaration()?))
                        }
                        _ => return Err(self.expression_error("Expect property or method after 'static'")),
                    }
                }
                _ => return Err(self.expression_error("Expect class member or '}'")),
            }
        }
        self.advance()?;
        self.consume_terminator()?;

        Ok(class)
    }

    fn type_path(&mut self) -> Result<TypePath, ParseError> {
        let mut path = vec![self.consume(TokenType::Identifier, "Expect type name")?.lexeme];
        while self.match_tt(&[TokenType::Dot])? {
            path.push(self.consume(TokenType::Identifier, "Expect type name after '.'")?.lexeme);
        }

        Ok(TypePath(path))
    }

    fn block(&mut self) -> Result<Block, ParseError> {
        self.consume(TokenType::LeftBrace, "Expect '{' before block")?;

        let mut statements = vec![];
        loop {
            self.skip_line_feeds()?;
            if self.check(TokenType::RightBrace) {
                break;
            }

            match self.statement()? {
                Some(stmt) => statements.push(stmt),
                None => return Err(self.expression_error("Expect '}' after block")),
            }
        }
        self.advance()?;

        Ok(Block { statements })
    }

    fn required_expression(&mut self, message: &str) -> Result<Expr, ParseError> {
        match self.expression()? {
            Some(expr) => Ok(expr),
            None => Err(self.expression_error(message)),
        }
    }

    /// Returns `None` when the current token cannot start an expression.
    fn expression(&mut self) -> Result<Option<Expr>, ParseError> {
        match self.unary()? {
            Some(lhs) => Ok(Some(self.binary_rhs(0, lhs)?)),
            None => Ok(None),
        }
    }

    fn binary_rhs(&mut self, min_precedence: i32, mut lhs: Expr) -> Result<Expr, ParseError> {
        loop {
            let precedence = get_precedence(self.current.token_type);
            if precedence < min_precedence {
                return Ok(lhs);
            }

            let operator = self.advance()?.token_type;
            let mut rhs = match self.unary()? {
                Some(rhs) => rhs,
                None => return Err(self.expression_error("Expect expression after operator")),
            };

            // Let a tighter operator on the right take rhs first
            if precedence < get_precedence(self.current.token_type) {
                rhs = self.binary_rhs(precedence + 1, rhs)?;
            }

            lhs = Expr::Binary { left: Box::new(lhs), operator, right: Box::new(rhs) };
        }
    }

    fn unary(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.check_any(&[TokenType::Tilde, TokenType::Bang, TokenType::Plus, TokenType::Minus]) {
            let operator = self.advance()?.token_type;
            return match self.unary()? {
                Some(operand) => Ok(Some(Expr::Unary { operator, operand: Box::new(operand) })),
                None => Err(self.expression_error("Expect operand after unary operator")),
            };
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Option<Expr>, ParseError> {
        let expr = match self.current.token_type {
            TokenType::Identifier => {
                let name = self.advance()?.lexeme;
                if self.check(TokenType::LeftParen) {
                    Expr::Call(self.call(name)?)
                } else {
                    Expr::Identifier(name)
                }
            }
            TokenType::Integer | TokenType::Real | TokenType::StringLiteral | TokenType::Boolean => {
                match self.advance()?.literal {
                    Some(Literal::Integer(n)) => Expr::Integer(n),
                    Some(Literal::Real(n)) => Expr::Real(n),
                    Some(Literal::String(s)) => Expr::String(s),
                    Some(Literal::Boolean(b)) => Expr::Boolean(b),
                    None => return Err(self.expression_error("Expect literal value")),
                }
            }
            TokenType::Nil => {
                self.advance()?;
                Expr::Nil
            }
            TokenType::Super => {
                self.advance()?;
                Expr::Super
            }
            TokenType::LeftParen => {
                self.advance()?;
                let expr = self.required_expression("Expect expression after '('")?;
                self.consume(TokenType::RightParen, "Expect ')' after expression")?;
                expr
            }
            _ => return Ok(None),
        };

        Ok(Some(expr))
    }

    fn call(&mut self, name: String) -> Result<Call, ParseError> {
        self.advance()?;

        let mut arguments = vec![];
        while !self.check(TokenType::RightParen) {
            let value = self.required_expression("Expect argument")?;
            let argument = match value {
                Expr::Identifier(label) if self.check(TokenType::Colon) => {
                    self.advance()?;
                    let value = self.required_expression("Expect argument after label")?;
                    Argument { label: Some(label), value }
                }
                value => Argument { label: None, value },
            };
            arguments.push(argument);

            if !self.match_tt(&[TokenType::Comma])? {
                break;
            }
        }
        self.consume(TokenType::RightParen, "Expect ')' after arguments")?;

        Ok(Call { name, arguments })
    }

    /// A statement ends at a line feed or at the end of input. A closing brace
    /// also ends it but is left for the enclosing block.
    fn consume_terminator(&mut self) -> Result<(), ParseError> {
        match self.current.token_type {
            TokenType::LineFeed => {
                self.advance()?;
                Ok(())
            }
            TokenType::EOF | TokenType::RightBrace => Ok(()),
            _ => Err(self.expression_error("Expect line feed after statement")),
        }
    }

    fn skip_line_feeds(&mut self) -> Result<(), ParseError> {
        while self.check(TokenType::LineFeed) {
            self.advance()?;
        }
        Ok(())
    }

    fn match_tt(&mut self, types: &[TokenType]) -> Result<bool, ParseError> {
        if self.check_any(types) {
            self.advance()?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Consumes the current token if it has the given type, otherwise fails with `message`.
    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<Token, ParseError> {
        if self.check(token_type) {
            return self.advance();
        }

        Err(self.expression_error(message))
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.current.token_type == token_type
    }

    fn check_any(&self, types: &[TokenType]) -> bool {
        types.contains(&self.current.token_type)
    }

    /// Moves to the next token and returns the one just left behind.
    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.scanner.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn is_at_end(&self) -> bool {
        self.current.token_type == TokenType::EOF
    }

    fn expression_error(&self, message: &str) -> ParseError {
        ParseError::Expression {
            line: self.current.line,
            found: self.current.to_string(),
            message: message.to_owned(),
        }
    }

    fn prototype_error(&self, message: &str) -> ParseError {
        ParseError::Prototype {
            line: self.current.line,
            found: self.current.to_string(),
            message: message.to_owned(),
        }
    }
}

fn get_precedence(token_type: TokenType) -> i32 {
    match token_type {
        TokenType::Equal => 10,
        TokenType::AndAnd | TokenType::OrOr => 20,
        TokenType::EqualEqual | TokenType::BangEqual => 30,
        TokenType::Less | TokenType::Greater | TokenType::LessEqual | TokenType::GreaterEqual => 40,
        TokenType::Plus | TokenType::Minus => 50,
        TokenType::Star | TokenType::Slash | TokenType::Percent => 60,
        TokenType::Dot => 70,
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).parse().expect("failed to parse the source")
    }

    fn parse_expr(source: &str) -> Expr {
        match parse(source).statements.pop() {
            Some(Stmt::Expression { expr }) => expr,
            other => panic!("not an expression statement: {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter() {
        let expr = parse_expr("1 + 2 * 3");
        let Expr::Binary { left, operator, right } = expr else { panic!("not binary") };
        assert_eq!(operator, TokenType::Plus);
        assert!(matches!(*left, Expr::Integer(1)));
        assert!(matches!(*right, Expr::Binary { operator: TokenType::Star, .. }));
    }

    #[test]
    fn member_access_is_left_associative() {
        let expr = parse_expr("a.b.c()");
        let Expr::Binary { left, operator, right } = expr else { panic!("not binary") };
        assert_eq!(operator, TokenType::Dot);
        assert!(matches!(*left, Expr::Binary { operator: TokenType::Dot, .. }));
        assert!(matches!(*right, Expr::Call(ref call) if call.name == "c"));
    }

    #[test]
    fn assignment_is_lowest() {
        let expr = parse_expr("self.v = v + 1");
        let Expr::Binary { left, operator, .. } = expr else { panic!("not binary") };
        assert_eq!(operator, TokenType::Equal);
        assert!(matches!(*left, Expr::Binary { operator: TokenType::Dot, .. }));
    }

    #[test]
    fn labeled_and_positional_arguments() {
        let Expr::Call(call) = parse_expr("insert(5, at: 2)") else { panic!("not a call") };
        assert_eq!(call.labels(), vec!["", "at"]);
    }

    #[test]
    fn prototype_and_anonymous_parameters() {
        let program = parse("func add(#a: Int, #b: Int) -> Int {\n return a + b\n}\n");
        let Some(Stmt::Function(function)) = program.statements.first() else {
            panic!("not a function")
        };
        assert_eq!(function.prototype.name, "add");
        assert!(function.prototype.params.iter().all(|p| p.is_anonymous));
        assert_eq!(function.prototype.return_type, Some(TypePath::simple("Int")));
        assert_eq!(function.body.statements.len(), 1);
    }

    #[test]
    fn class_members_are_partitioned() {
        let source = r#"
class Shape: Base.Thing {
    var sides: Int = 0
    static const unit: Int = 1
    func area() -> Real {
        return 0.0
    }
    static func make() -> Shape {
        return Shape()
    }
    class Corner {
    }
}
"#;
        let program = parse(source);
        let Some(Stmt::Class(class)) = program.statements.first() else { panic!("not a class") };
        assert_eq!(class.superclass, Some(TypePath(vec!["Base".to_owned(), "Thing".to_owned()])));
        assert_eq!(class.instance_properties.len(), 1);
        assert_eq!(class.static_properties.len(), 1);
        assert!(class.static_properties[0].is_constant);
        assert_eq!(class.instance_methods.len(), 1);
        assert_eq!(class.static_methods.len(), 1);
        assert_eq!(class.inner_classes.len(), 1);
    }

    #[test]
    fn for_loop_with_step() {
        let program = parse("for i in 0 to 6 step 2 {\n}\n");
        assert!(matches!(
            program.statements.first(),
            Some(Stmt::For { step: Some(Expr::Integer(2)), .. })
        ));
    }

    #[test]
    fn else_if_chain() {
        let program = parse("if a {\n} else if b {\n} else {\n}\n");
        let Some(Stmt::If { else_branch: Some(else_branch), .. }) = program.statements.first() else {
            panic!("not an if")
        };
        assert!(matches!(**else_branch, Stmt::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn statements_on_one_line_are_rejected() {
        let result = Parser::new("a = 1 b = 2\n").parse();
        assert!(matches!(result, Err(ParseError::Expression { line: 1, .. })));
    }

    #[test]
    fn unclosed_block_is_rejected() {
        assert!(Parser::new("while true {\n a = 1\n").parse().is_err());
    }

    #[test]
    fn missing_parameter_type_is_a_prototype_error() {
        let result = Parser::new("func f(a) {\n}\n").parse();
        assert!(matches!(result, Err(ParseError::Prototype { .. })));
    }

    #[test]
    fn constant_needs_an_initializer() {
        assert!(Parser::new("const a: Int\n").parse().is_err());
    }

    #[test]
    fn lex_errors_surface() {
        assert!(matches!(Parser::new("a | b").parse(), Err(ParseError::Lex(_))));
    }
}
