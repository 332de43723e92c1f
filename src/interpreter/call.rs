use std::rc::Rc;

use log::debug;

use super::InterpreterResult;
use crate::native::NativeFunction;
use crate::prelude::*;

impl Interpreter {
    pub(super) fn evaluate_member(
        &mut self,
        left: &Expr,
        right: &Expr,
        scope: &ScopeRef,
        lookup: &ScopeRef,
    ) -> InterpreterResult {
        match self.evaluate_expr(left, scope, lookup)? {
            Symbol::Module(module) => match right {
                Expr::Identifier(_) => self.evaluate_expr(right, scope, &module.scope),
                Expr::Call(call) => self.evaluate_call(call, scope, &module.scope),
                _ => Err(RuntimeError::AccessorMember),
            },
            Symbol::Class(class) => self.evaluate_class_member(&class, right, scope),
            Symbol::Variable(owner) => {
                let value = owner.borrow().value().cloned();
                match value {
                    Some(Object::Instance(instance)) => {
                        let is_super = matches!(left, Expr::Super);
                        self.evaluate_instance_member(&owner, instance, is_super, right, scope)
                    }
                    Some(_) => Err(RuntimeError::AccessorOwner),
                    None => Err(RuntimeError::UndefinedVariable),
                }
            }
            Symbol::Closure(_) | Symbol::Null => Err(RuntimeError::AccessorOwner),
        }
    }

    fn evaluate_class_member(
        &mut self,
        class: &Rc<Class>,
        member: &Expr,
        scope: &ScopeRef,
    ) -> InterpreterResult {
        match member {
            Expr::Identifier(name) => match class.get_class_member(name) {
                Some(symbol @ (Symbol::Variable(_) | Symbol::Class(_))) => Ok(symbol),
                _ => Err(RuntimeError::ClassMemberNotDeclared(name.clone())),
            },
            Expr::Call(call) => {
                let signature = signature(&call.name, call.labels());
                if let Some(Symbol::Closure(closure)) = class.get_class_member(&signature) {
                    let arguments = self.evaluate_arguments(&call.arguments, scope)?;
                    return closure.call(self, arguments);
                }

                // Otherwise it constructs an inner class
                if let Some(Symbol::Class(inner)) = class.get_class_member(&call.name) {
                    return self.construct(&inner, &call.arguments, scope);
                }

                Err(RuntimeError::ClassMemberNotDeclared(signature))
            }
            _ => Err(RuntimeError::AccessorMember),
        }
    }

    fn evaluate_instance_member(
        &mut self,
        owner: &Shared<Variable>,
        instance: Rc<Instance>,
        is_super: bool,
        member: &Expr,
        scope: &ScopeRef,
    ) -> InterpreterResult {
        let declared = owner.borrow().ty.clone();

        // Typed with an ancestor: only what the ancestor declares is visible
        let ancestor = if declared != instance.class.ty && !declared.is_any() {
            let ancestor = instance.class.get_superclass(&declared).ok_or_else(|| {
                RuntimeError::ExpressionTypeMismatch {
                    expected: declared.to_string(),
                    found: instance.class.ty.to_string(),
                }
            })?;
            Some(ancestor)
        } else {
            None
        };

        match member {
            Expr::Identifier(name) => {
                if let Some(ancestor) = &ancestor {
                    if !ancestor.has_instance_property(name) && ancestor.get_class_member(name).is_none() {
                        return Err(RuntimeError::ClassMemberNotDeclared(name.clone()));
                    }
                }

                let property = instance.scope.borrow().get_local(name);
                if let Some(property) = property {
                    return Ok(property);
                }

                match instance.class.get_class_member(name) {
                    Some(symbol @ Symbol::Variable(_)) => Ok(symbol),
                    _ => Err(RuntimeError::InstancePropertyNotFound(name.clone())),
                }
            }
            Expr::Call(call) => {
                let mut labels = vec!["self"];
                labels.extend(call.labels());
                let signature = signature(&call.name, labels);

                let inspected = match ancestor {
                    Some(ancestor) => {
                        if !matches!(ancestor.get_class_member(&signature), Some(Symbol::Closure(_))) {
                            return Err(RuntimeError::ClassMemberNotDeclared(signature));
                        }
                        // Dispatch stays dynamic unless the call goes through super
                        if is_super {
                            ancestor
                        } else {
                            instance.class.clone()
                        }
                    }
                    None => instance.class.clone(),
                };

                let Some(Symbol::Closure(method)) = inspected.get_class_member(&signature) else {
                    return Err(RuntimeError::FunctionNotDeclared(signature));
                };

                let this = Variable::new(instance.class.ty.clone(), true, Some(Object::Instance(instance)));
                let mut arguments = vec![this.as_shared()];
                arguments.extend(self.evaluate_arguments(&call.arguments, scope)?);
                method.call(self, arguments)
            }
            _ => Err(RuntimeError::AccessorMember),
        }
    }

    pub(super) fn evaluate_call(&mut self, call: &Call, scope: &ScopeRef, lookup: &ScopeRef) -> InterpreterResult {
        let signature = signature(&call.name, call.labels());

        let function = lookup.borrow().lookup(&signature);
        if let Some(Symbol::Closure(closure)) = function {
            let arguments = self.evaluate_arguments(&call.arguments, scope)?;
            return closure.call(self, arguments);
        }

        let class = lookup.borrow().lookup(&call.name);
        if let Some(Symbol::Class(class)) = class {
            return self.construct(&class, &call.arguments, scope);
        }

        Err(RuntimeError::FunctionNotDeclared(signature))
    }

    /// Builds the property scope base class first, then runs the initializer
    /// matching the argument labels.
    pub(super) fn construct(
        &mut self,
        class: &Rc<Class>,
        arguments: &[Argument],
        scope: &ScopeRef,
    ) -> InterpreterResult {
        debug!("constructing an instance of {class}");

        let instance_scope = Scope::new(Some(class.scope.clone())).as_shared();
        for property in class.hierarchy_properties() {
            self.declare_variable(&property, &instance_scope)?;
        }

        let instance = Rc::new(Instance::new(class.clone(), instance_scope));
        let this = Variable::new(class.ty.clone(), true, Some(Object::Instance(instance))).as_shared();

        let mut labels = vec!["self"];
        labels.extend(arguments.iter().map(|a| a.label.as_deref().unwrap_or("")));
        let signature = signature("init", labels);

        match class.get_class_member(&signature) {
            Some(Symbol::Closure(initializer)) => {
                let mut values = vec![this.clone()];
                values.extend(self.evaluate_arguments(arguments, scope)?);
                initializer.call(self, values)?;
            }
            // No initializer is fine as long as nothing was passed to it
            _ if arguments.is_empty() => {}
            _ => return Err(RuntimeError::FunctionNotDeclared(signature)),
        }

        Ok(Symbol::Variable(this))
    }

    pub(super) fn evaluate_super(&self, scope: &ScopeRef) -> InterpreterResult {
        let this = scope.borrow().lookup("self");
        let superclass = scope.borrow().lookup("super");

        let instance = match this {
            Some(Symbol::Variable(this)) => {
                let value = this.borrow().value().cloned();
                value.and_then(|v| v.instance().cloned())
            }
            _ => None,
        };

        match (superclass, instance) {
            // Instance method: self, seen as the superclass
            (Some(Symbol::Class(superclass)), Some(instance)) => {
                let this = Variable::new(superclass.ty.clone(), true, Some(Object::Instance(instance)));
                Ok(Symbol::variable(this))
            }
            // Static method: the superclass itself
            (Some(Symbol::Class(superclass)), None) => Ok(Symbol::Class(superclass)),
            (Some(_), _) => Err(RuntimeError::SuperInRootClassMember),
            (None, _) => Err(RuntimeError::SuperOutsideClassMember),
        }
    }

    pub(super) fn evaluate_native(
        &mut self,
        parameters: &[String],
        function: &NativeFunction,
        scope: &ScopeRef,
    ) -> InterpreterResult {
        let mut arguments = vec![];
        for name in parameters {
            let parameter = scope.borrow().lookup(name);
            match parameter {
                Some(Symbol::Variable(variable)) => arguments.push(variable),
                _ => return Err(RuntimeError::NativeParameter(name.clone())),
            }
        }

        let result = function.call(self, &arguments)?;
        Ok(Symbol::variable(result.unwrap_or_else(Variable::void)))
    }

    fn evaluate_arguments(
        &mut self,
        arguments: &[Argument],
        scope: &ScopeRef,
    ) -> Result<Vec<Shared<Variable>>, RuntimeError> {
        arguments.iter().map(|a| self.evaluate_variable(&a.value, scope, scope)).collect()
    }
}
