use std::cell::RefCell;
use std::fmt::Display;
use std::rc::{Rc, Weak};

use log::trace;

use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub is_anonymous: bool,
}

impl Param {
    pub fn named(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty, is_anonymous: false }
    }

    pub fn anonymous(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty, is_anonymous: true }
    }

    /// What a call site has to write for this parameter.
    pub fn label(&self) -> &str {
        if self.is_anonymous {
            ""
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
}

impl Prototype {
    pub fn new(name: impl Into<String>, params: Vec<Param>, return_type: Type) -> Self {
        Self { name: name.into(), params, return_type }
    }

    pub fn signature(&self) -> String {
        signature(&self.name, self.params.iter().map(|p| p.label()))
    }
}

/// Function identity: the name plus the ordered parameter labels, e.g.
/// `insert(:at:)`. Parameter types play no part.
pub fn signature<'a>(name: &str, labels: impl IntoIterator<Item = &'a str>) -> String {
    let mut signature = format!("{name}(");
    for label in labels {
        signature.push_str(label);
        signature.push(':');
    }
    signature.push(')');
    signature
}

pub struct Closure {
    pub prototype: Prototype,
    body: Rc<Block>,
    declaration_scope: Weak<RefCell<Scope>>,
}

impl Closure {
    pub fn new(prototype: Prototype, body: Rc<Block>, declaration_scope: &ScopeRef) -> Self {
        Self { prototype, body, declaration_scope: Rc::downgrade(declaration_scope) }
    }

    /// Runs the body in a fresh parameter scope whose parent is the scope the
    /// closure was declared in. `arguments` are already evaluated by the caller.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Shared<Variable>>,
    ) -> Result<Symbol, RuntimeError> {
        let name = self.prototype.signature();
        trace!("calling {name}");

        if arguments.len() != self.prototype.params.len() {
            return Err(RuntimeError::WrongArgumentCount {
                function: name,
                expected: self.prototype.params.len(),
                found: arguments.len(),
            });
        }

        let parent =
            self.declaration_scope.upgrade().ok_or_else(|| RuntimeError::DanglingClosure(name.clone()))?;
        let mut params_scope = Scope::new(Some(parent));

        for (param, argument) in self.prototype.params.iter().zip(arguments) {
            let argument = argument.borrow();
            if !param.ty.accepts(&argument) {
                return Err(RuntimeError::WrongArgumentType {
                    parameter: param.name.clone(),
                    expected: param.ty.to_string(),
                    found: argument.ty.to_string(),
                });
            }

            let bound = Variable::new(param.ty.bound_for(&argument), true, argument.value().cloned());
            params_scope.define(&param.name, Symbol::variable(bound));
        }

        let params_scope = params_scope.as_shared();
        interpreter.execute_block(&self.body, &params_scope)?;
        let returned = params_scope.borrow_mut().returned.take();

        let return_type = &self.prototype.return_type;
        if return_type.is_void() {
            if let Some(returned) = returned {
                if !returned.borrow().ty.is_void() {
                    return Err(RuntimeError::ShouldReturnNothing(name));
                }
            }
            return Ok(Symbol::variable(Variable::void()));
        }

        let returned = returned.ok_or_else(|| RuntimeError::MissingReturnValue(name.clone()))?;
        let returned = returned.borrow();
        if !return_type.accepts(&returned) {
            return Err(RuntimeError::WrongReturnType {
                function: name,
                expected: return_type.to_string(),
                found: returned.ty.to_string(),
            });
        }

        let result = Variable::new(return_type.bound_for(&returned), true, returned.value().cloned());
        Ok(Symbol::variable(result))
    }
}

impl Display for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<func {}>", self.prototype.signature())
    }
}

impl std::fmt::Debug for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closure").field("prototype", &self.prototype).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_uses_labels_only() {
        let prototype = Prototype::new(
            "insert",
            vec![Param::anonymous("element", Type::any()), Param::named("at", Type::int())],
            Type::void(),
        );
        assert_eq!(prototype.signature(), "insert(:at:)");
        assert_eq!(signature("insert", ["", "at"]), prototype.signature());
        assert_eq!(signature("count", []), "count()");
    }
}
