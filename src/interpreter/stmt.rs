use std::collections::HashSet;
use std::rc::Rc;

use log::debug;

use crate::prelude::*;

impl Interpreter {
    /// Runs `statements` in order, stopping at the first return, break or continue.
    pub fn execute_statements(&mut self, statements: &[Stmt], scope: &ScopeRef) -> Result<(), RuntimeError> {
        for statement in statements {
            self.execute(statement, scope)?;
            if scope.borrow().has_signal() {
                break;
            }
        }
        Ok(())
    }

    /// Runs `block` in a child of `parent`, then hands its signals to `parent`.
    pub fn execute_block(&mut self, block: &Block, parent: &ScopeRef) -> Result<(), RuntimeError> {
        let scope = Scope::new(Some(parent.clone())).as_shared();
        let result = self.execute_statements(&block.statements, &scope);
        scope.borrow_mut().propagate_signals(&mut parent.borrow_mut());
        result
    }

    fn execute(&mut self, statement: &Stmt, scope: &ScopeRef) -> Result<(), RuntimeError> {
        match statement {
            Stmt::Expression { expr } => {
                self.evaluate_expr(expr, scope, scope)?;
            }
            Stmt::Block(block) => self.execute_block(block, scope)?,
            Stmt::If { condition, then_branch, else_branch } => {
                if self.evaluate_condition(condition, scope)? {
                    self.execute_block(then_branch, scope)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, scope)?;
                }
            }
            Stmt::For { index, start, end, step, body } => {
                self.execute_for(index, start, end, step.as_ref(), body, scope)?
            }
            Stmt::While { condition, body } => self.execute_while(condition, body, scope)?,
            Stmt::Var(decl) => self.declare_variable(decl, scope)?,
            Stmt::Function(decl) => self.declare_function(decl, scope, None)?,
            Stmt::Class(decl) => self.declare_class(decl, scope)?,
            Stmt::Return { value } => {
                let returned = match value {
                    Some(value) => self.evaluate_variable(value, scope, scope)?,
                    None => Variable::void().as_shared(),
                };
                scope.borrow_mut().returned = Some(returned);
            }
            Stmt::Break => scope.borrow_mut().break_requested = true,
            Stmt::Continue => scope.borrow_mut().continue_requested = true,
            Stmt::Import { name } => {
                debug!("importing {name}");
                self.import_module(name, scope)?;
            }
        }
        Ok(())
    }

    fn evaluate_condition(&mut self, condition: &Expr, scope: &ScopeRef) -> Result<bool, RuntimeError> {
        let condition = self.evaluate_variable(condition, scope, scope)?;
        let condition = condition.borrow();
        match condition.value() {
            Some(Object::Boolean(b)) => Ok(*b),
            Some(_) => Err(RuntimeError::ExpressionEvaluation(format!(
                "condition must be of type 'Bool', found '{}'",
                condition.ty
            ))),
            None => Err(RuntimeError::UndefinedVariable),
        }
    }

    fn evaluate_integer(&mut self, expr: &Expr, scope: &ScopeRef) -> Result<i64, RuntimeError> {
        let value = self.evaluate_variable(expr, scope, scope)?;
        let value = value.borrow();
        match value.value() {
            Some(Object::Integer(n)) => Ok(*n),
            Some(_) => Err(RuntimeError::ExpressionTypeMismatch {
                expected: Type::INT.to_owned(),
                found: value.ty.to_string(),
            }),
            None => Err(RuntimeError::UndefinedVariable),
        }
    }

    fn execute_for(
        &mut self,
        index: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &Block,
        scope: &ScopeRef,
    ) -> Result<(), RuntimeError> {
        let start = self.evaluate_integer(start, scope)?;
        let end = self.evaluate_integer(end, scope)?;
        let step = match step {
            Some(step) => self.evaluate_integer(step, scope)?,
            None => 1,
        };
        if step == 0 {
            return Err(RuntimeError::ExpressionEvaluation("for loop step cannot be zero".to_owned()));
        }

        // One index variable for the whole loop, only its value changes
        let loop_scope = Scope::new(Some(scope.clone())).as_shared();
        let counter = Variable::new(Type::int(), true, Some(Object::Integer(start))).as_shared();
        loop_scope.borrow_mut().define(index, Symbol::Variable(counter.clone()));

        let mut current = start;
        while (step > 0 && current < end) || (step < 0 && current > end) {
            counter.borrow_mut().set_value(Some(Object::Integer(current)));
            self.execute_block(body, &loop_scope)?;
            if consume_loop_signals(&loop_scope) {
                break;
            }

            match current.checked_add(step) {
                Some(next) => current = next,
                None => break,
            }
        }

        forward_return(&loop_scope, scope);
        Ok(())
    }

    fn execute_while(&mut self, condition: &Expr, body: &Block, scope: &ScopeRef) -> Result<(), RuntimeError> {
        let loop_scope = Scope::new(Some(scope.clone())).as_shared();

        while self.evaluate_condition(condition, &loop_scope)? {
            self.execute_block(body, &loop_scope)?;
            if consume_loop_signals(&loop_scope) {
                break;
            }
        }

        forward_return(&loop_scope, scope);
        Ok(())
    }

    pub(super) fn declare_variable(&mut self, decl: &VarDecl, scope: &ScopeRef) -> Result<(), RuntimeError> {
        if scope.borrow().contains_local(&decl.name) {
            return Err(RuntimeError::InvalidRedeclaration(decl.name.clone()));
        }

        let declared = match &decl.type_path {
            Some(path) => Some(self.resolve_type(path, scope)?),
            None => None,
        };

        let variable = match (&decl.initializer, declared) {
            (Some(initializer), declared) => {
                let source = self.evaluate_variable(initializer, scope, scope)?;
                let source = source.borrow();
                let ty = match declared {
                    Some(ty) if !ty.accepts(&source) => {
                        return Err(RuntimeError::ExpressionTypeMismatch {
                            expected: ty.to_string(),
                            found: source.ty.to_string(),
                        })
                    }
                    Some(ty) => ty.bound_for(&source),
                    // Nothing to infer the type from
                    None if source.ty.is_nil() || source.ty.is_void() => {
                        return Err(RuntimeError::UndefinedType(decl.name.clone()))
                    }
                    None => source.ty.clone(),
                };
                Variable::declared(ty, decl.is_constant, source.value().cloned())
            }
            (None, Some(ty)) => Variable::new(ty, decl.is_constant, None),
            (None, None) => return Err(RuntimeError::UndefinedType(decl.name.clone())),
        };

        scope.borrow_mut().define(&decl.name, Symbol::variable(variable));
        Ok(())
    }

    fn resolve_type(&self, path: &TypePath, scope: &ScopeRef) -> Result<Type, RuntimeError> {
        if let [name] = path.0.as_slice() {
            if let Some(ty) = Type::basic(name) {
                return Ok(ty);
            }
        }

        match self.resolve_path(path, scope) {
            Some(Symbol::Class(class)) => Ok(class.ty.clone()),
            _ => Err(RuntimeError::UndefinedType(path.to_string())),
        }
    }

    /// Follows a dotted path through classes and modules, starting from `scope`.
    fn resolve_path(&self, path: &TypePath, scope: &ScopeRef) -> Option<Symbol> {
        let (first, rest) = path.0.split_first()?;
        let mut symbol = scope.borrow().lookup(first)?;

        for name in rest {
            symbol = match symbol {
                Symbol::Class(class) => class.get_class_member(name)?,
                Symbol::Module(module) => {
                    let member = module.scope.borrow().get_local(name);
                    member?
                }
                _ => return None,
            };
        }

        Some(symbol)
    }

    fn resolve_prototype(
        &self,
        decl: &PrototypeDecl,
        scope: &ScopeRef,
        receiver: Option<&Type>,
    ) -> Result<Prototype, RuntimeError> {
        let mut params = vec![];
        if let Some(receiver) = receiver {
            params.push(Param::named("self", receiver.clone()));
        }

        for param in &decl.params {
            let ty = self.resolve_type(&param.type_path, scope)?;
            params.push(Param { name: param.name.clone(), ty, is_anonymous: param.is_anonymous });
        }

        let return_type = match &decl.return_type {
            Some(path) => self.resolve_type(path, scope)?,
            None => Type::void(),
        };

        Ok(Prototype::new(&decl.name, params, return_type))
    }

    /// Methods get `self` typed with `receiver` as their first parameter.
    fn declare_function(
        &mut self,
        decl: &FunctionDecl,
        scope: &ScopeRef,
        receiver: Option<&Type>,
    ) -> Result<(), RuntimeError> {
        let prototype = self.resolve_prototype(&decl.prototype, scope, receiver)?;
        let signature = prototype.signature();

        if scope.borrow().contains_local(&signature) {
            return Err(RuntimeError::FunctionAlreadyDeclared(signature));
        }

        let closure = Closure::new(prototype, decl.body.clone(), scope);
        scope.borrow_mut().define(&signature, Symbol::Closure(Rc::new(closure)));
        Ok(())
    }

    fn declare_class(&mut self, decl: &ClassDecl, scope: &ScopeRef) -> Result<(), RuntimeError> {
        if scope.borrow().contains_local(&decl.name) {
            return Err(RuntimeError::ClassAlreadyDeclared(decl.name.clone()));
        }

        let mut names = HashSet::new();
        for property in &decl.instance_properties {
            if !names.insert(property.name.as_str()) {
                return Err(RuntimeError::ClassMemberAlreadyDeclared(property.name.clone()));
            }
        }

        let class_scope = Scope::named(&decl.name, Some(scope.clone())).as_shared();
        let ty = Type::new(class_scope.borrow().named_chain().join("."));
        debug!("declaring class {ty}");

        // Members may refer to the class before it is complete
        let forward = Class::new(&decl.name, ty.clone(), None, vec![], class_scope.clone());
        scope.borrow_mut().define(&decl.name, Symbol::Class(Rc::new(forward)));

        let superclass = match &decl.superclass {
            Some(path) => match self.resolve_path(path, scope) {
                Some(Symbol::Class(superclass)) if superclass.ty != ty => Some(superclass),
                _ => return Err(RuntimeError::UnresolvedIdentifier(path.to_string())),
            },
            None => None,
        };

        if let Some(superclass) = &superclass {
            for property in &decl.instance_properties {
                if superclass.has_instance_property(&property.name) {
                    return Err(RuntimeError::ClassMemberAlreadyDeclaredInSuperclass(property.name.clone()));
                }
            }
            for property in &decl.static_properties {
                if superclass.get_class_member(&property.name).is_some() {
                    return Err(RuntimeError::ClassMemberAlreadyDeclaredInSuperclass(property.name.clone()));
                }
            }
        }

        let super_symbol = match &superclass {
            Some(superclass) => Symbol::Class(superclass.clone()),
            None => Symbol::Null,
        };
        class_scope.borrow_mut().define("super", super_symbol);

        for property in &decl.static_properties {
            self.declare_variable(property, &class_scope)?;
        }
        for method in &decl.static_methods {
            self.declare_function(method, &class_scope, None)?;
        }
        for method in &decl.instance_methods {
            self.declare_function(method, &class_scope, Some(&ty))?;
        }
        for inner in &decl.inner_classes {
            self.declare_class(inner, &class_scope)?;
        }

        let class = Class::new(&decl.name, ty, superclass, decl.instance_properties.clone(), class_scope);
        scope.borrow_mut().define(&decl.name, Symbol::Class(Rc::new(class)));
        Ok(())
    }
}

/// Clears break and continue after an iteration. Returns whether the loop has to stop.
fn consume_loop_signals(scope: &ScopeRef) -> bool {
    let mut scope = scope.borrow_mut();
    scope.continue_requested = false;
    if scope.break_requested {
        scope.break_requested = false;
        return true;
    }
    scope.returned.is_some()
}

fn forward_return(loop_scope: &ScopeRef, scope: &ScopeRef) {
    let returned = loop_scope.borrow_mut().returned.take();
    if returned.is_some() {
        scope.borrow_mut().returned = returned;
    }
}
