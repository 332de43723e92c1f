use super::InterpreterResult;
use crate::prelude::*;

impl Interpreter {
    /// Evaluates `expr` in `scope`. Identifiers and calls are resolved from
    /// `lookup`, which only differs from `scope` on the right of a module access.
    pub fn evaluate_expr(&mut self, expr: &Expr, scope: &ScopeRef, lookup: &ScopeRef) -> InterpreterResult {
        match expr {
            Expr::Integer(n) => Ok(Symbol::variable(Variable::constant(Object::Integer(*n)))),
            Expr::Real(n) => Ok(Symbol::variable(Variable::constant(Object::Real(*n)))),
            Expr::String(s) => Ok(Symbol::variable(Variable::constant(Object::String(s.clone())))),
            Expr::Boolean(b) => Ok(Symbol::variable(Variable::constant(Object::Boolean(*b)))),
            Expr::Nil => Ok(Symbol::variable(Variable::nil(Type::nil()))),
            Expr::Identifier(name) => {
                let symbol = lookup.borrow().lookup(name);
                symbol.ok_or_else(|| RuntimeError::UnresolvedIdentifier(name.clone()))
            }
            Expr::Unary { operator, operand } => self.evaluate_unary(*operator, operand, scope, lookup),
            Expr::Binary { left, operator: TokenType::Dot, right } => {
                self.evaluate_member(left, right, scope, lookup)
            }
            Expr::Binary { left, operator: TokenType::Equal, right } => {
                self.evaluate_assignment(left, right, scope, lookup)
            }
            Expr::Binary { left, operator, right } => {
                self.evaluate_binary(left, *operator, right, scope, lookup)
            }
            Expr::Call(call) => self.evaluate_call(call, scope, lookup),
            Expr::Super => self.evaluate_super(scope),
            Expr::Native { parameters, function } => self.evaluate_native(parameters, function, scope),
        }
    }

    /// Evaluates `expr` and requires a variable, e.g. an operand or an argument.
    pub(super) fn evaluate_variable(
        &mut self,
        expr: &Expr,
        scope: &ScopeRef,
        lookup: &ScopeRef,
    ) -> Result<Shared<Variable>, RuntimeError> {
        match self.evaluate_expr(expr, scope, lookup)? {
            Symbol::Variable(variable) => Ok(variable),
            other => Err(RuntimeError::ExpressionEvaluation(format!(
                "expected a value but found a {}",
                other.kind()
            ))),
        }
    }

    fn evaluate_unary(
        &mut self,
        operator: TokenType,
        operand: &Expr,
        scope: &ScopeRef,
        lookup: &ScopeRef,
    ) -> InterpreterResult {
        let operand = self.evaluate_variable(operand, scope, lookup)?;
        let operand = operand.borrow();
        let value = operand.value().ok_or(RuntimeError::UndefinedVariable)?;

        let result = match (operator, value) {
            (TokenType::Tilde, Object::Integer(n)) => Object::Integer(!n),
            (TokenType::Bang, Object::Boolean(b)) => Object::Boolean(!b),
            (TokenType::Plus, Object::Integer(n)) => Object::Integer(*n),
            (TokenType::Plus, Object::Real(n)) => Object::Real(*n),
            (TokenType::Minus, Object::Integer(n)) => Object::Integer(n.wrapping_neg()),
            (TokenType::Minus, Object::Real(n)) => Object::Real(-n),
            _ => {
                return Err(RuntimeError::UnsupportedOperandType {
                    operator: operator.to_string(),
                    operand: operand.ty.to_string(),
                })
            }
        };

        Ok(Symbol::variable(Variable::constant(result)))
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: TokenType,
        right: &Expr,
        scope: &ScopeRef,
        lookup: &ScopeRef,
    ) -> InterpreterResult {
        let left = self.evaluate_variable(left, scope, lookup)?;
        let right = self.evaluate_variable(right, scope, lookup)?;
        let left = left.borrow();
        let right = right.borrow();

        if matches!(operator, TokenType::EqualEqual | TokenType::BangEqual) {
            return evaluate_equality(operator, &left, &right);
        }

        if left.ty != right.ty {
            return Err(RuntimeError::BinaryOperatorTypeMismatch {
                operator: operator.to_string(),
                left: left.ty.to_string(),
                right: right.ty.to_string(),
            });
        }

        let (Some(l), Some(r)) = (left.value(), right.value()) else {
            return Err(RuntimeError::UndefinedVariable);
        };

        use Object::*;
        let result = match (operator, l, r) {
            (TokenType::Plus, Integer(a), Integer(b)) => Integer(a.wrapping_add(*b)),
            (TokenType::Plus, Real(a), Real(b)) => Real(a + b),
            (TokenType::Plus, String(a), String(b)) => String(format!("{a}{b}")),
            (TokenType::Minus, Integer(a), Integer(b)) => Integer(a.wrapping_sub(*b)),
            (TokenType::Minus, Real(a), Real(b)) => Real(a - b),
            (TokenType::Star, Integer(a), Integer(b)) => Integer(a.wrapping_mul(*b)),
            (TokenType::Star, Real(a), Real(b)) => Real(a * b),
            (TokenType::Slash | TokenType::Percent, Integer(_), Integer(0)) => {
                return Err(RuntimeError::ZeroDivision)
            }
            (TokenType::Slash, Integer(a), Integer(b)) => Integer(a.wrapping_div(*b)),
            (TokenType::Slash, Real(_), Real(b)) if *b == 0.0 => return Err(RuntimeError::ZeroDivision),
            (TokenType::Slash, Real(a), Real(b)) => Real(a / b),
            (TokenType::Percent, Integer(a), Integer(b)) => Integer(a.wrapping_rem(*b)),
            (TokenType::Less, Integer(a), Integer(b)) => Boolean(a < b),
            (TokenType::Less, Real(a), Real(b)) => Boolean(a < b),
            (TokenType::Less, String(a), String(b)) => Boolean(a < b),
            (TokenType::LessEqual, Integer(a), Integer(b)) => Boolean(a <= b),
            (TokenType::LessEqual, Real(a), Real(b)) => Boolean(a <= b),
            (TokenType::LessEqual, String(a), String(b)) => Boolean(a <= b),
            (TokenType::Greater, Integer(a), Integer(b)) => Boolean(a > b),
            (TokenType::Greater, Real(a), Real(b)) => Boolean(a > b),
            (TokenType::Greater, String(a), String(b)) => Boolean(a > b),
            (TokenType::GreaterEqual, Integer(a), Integer(b)) => Boolean(a >= b),
            (TokenType::GreaterEqual, Real(a), Real(b)) => Boolean(a >= b),
            (TokenType::GreaterEqual, String(a), String(b)) => Boolean(a >= b),
            // Both sides are always evaluated
            (TokenType::AndAnd, Boolean(a), Boolean(b)) => Boolean(*a && *b),
            (TokenType::OrOr, Boolean(a), Boolean(b)) => Boolean(*a || *b),
            _ => {
                return Err(RuntimeError::UnsupportedOperandType {
                    operator: operator.to_string(),
                    operand: left.ty.to_string(),
                })
            }
        };

        Ok(Symbol::variable(Variable::constant(result)))
    }

    fn evaluate_assignment(
        &mut self,
        left: &Expr,
        right: &Expr,
        scope: &ScopeRef,
        lookup: &ScopeRef,
    ) -> InterpreterResult {
        let target = self.evaluate_variable(left, scope, lookup)?;
        let source = self.evaluate_variable(right, scope, lookup)?;

        let value = {
            let target = target.borrow();
            let source = source.borrow();
            if target.is_constant {
                return Err(RuntimeError::ForbiddenAssignment);
            }
            if !target.ty.accepts(&source) {
                return Err(RuntimeError::ExpressionTypeMismatch {
                    expected: target.ty.to_string(),
                    found: source.ty.to_string(),
                });
            }
            source.value().cloned()
        };

        target.borrow_mut().set_value(value);
        Ok(Symbol::Null)
    }
}

fn evaluate_equality(operator: TokenType, left: &Variable, right: &Variable) -> InterpreterResult {
    let equal = if left.ty != right.ty {
        // Comparing with nil checks for presence
        if left.ty.is_nil() {
            right.value().is_none()
        } else if right.ty.is_nil() {
            left.value().is_none()
        } else {
            return Err(RuntimeError::ExpressionTypeMismatch {
                expected: left.ty.to_string(),
                found: right.ty.to_string(),
            });
        }
    } else {
        match (left.value(), right.value()) {
            (Some(l), Some(r)) => l == r,
            (None, None) => true,
            _ => false,
        }
    };

    let result = if operator == TokenType::EqualEqual { equal } else { !equal };
    Ok(Symbol::variable(Variable::constant(Object::Boolean(result))))
}
