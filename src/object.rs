use std::fmt::Display;
use std::rc::Rc;

use crate::prelude::*;

/// A runtime value held by a `Variable`.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    String(String),
    Instance(Rc<Instance>),
    /// Native storage behind the built-in `Array` class.
    Array(Shared<Vec<Object>>),
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(left), Self::Integer(right)) => left == right,
            (Self::Real(left), Self::Real(right)) => left == right,
            (Self::Boolean(left), Self::Boolean(right)) => left == right,
            (Self::String(left), Self::String(right)) => left == right,
            (Self::Instance(left), Self::Instance(right)) => Rc::ptr_eq(left, right),
            (Self::Array(left), Self::Array(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl Object {
    pub fn integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn real(&self) -> Option<f64> {
        match self {
            Self::Real(n) => Some(*n),
            _ => None,
        }
    }

    pub fn string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn instance(&self) -> Option<&Rc<Instance>> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(n) => write!(f, "{}", format_real(*n)),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Instance(instance) => write!(f, "{instance}"),
            Self::Array(elements) => {
                let elements: Vec<String> = elements.borrow().iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elements.join(", "))
            }
        }
    }
}

/// Reals always show a fractional part, so `1.0` never reads as an integer.
pub fn format_real(n: f64) -> String {
    let text = n.to_string();
    if n.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub ty: Type,
    pub is_constant: bool,
    value: Option<Object>,
}

impl Variable {
    /// A variable that does not count as a reference to an instance it holds.
    /// Used for temporaries, literals and bound parameters.
    pub fn new(ty: Type, is_constant: bool, value: Option<Object>) -> Self {
        Self { ty, is_constant, value }
    }

    /// A variable created by a declaration. Storing an instance counts.
    pub fn declared(ty: Type, is_constant: bool, value: Option<Object>) -> Self {
        if let Some(Object::Instance(instance)) = &value {
            instance.retain();
        }
        Self::new(ty, is_constant, value)
    }

    pub fn void() -> Self {
        Self::new(Type::void(), true, None)
    }

    pub fn nil(ty: Type) -> Self {
        Self::new(ty, true, None)
    }

    pub fn constant(object: Object) -> Self {
        Self::new(Type::of(&object), true, Some(object))
    }

    pub fn as_shared(self) -> Shared<Variable> {
        Rc::new(std::cell::RefCell::new(self))
    }

    pub fn value(&self) -> Option<&Object> {
        self.value.as_ref()
    }

    /// Replaces the value. The new instance is retained before the old one is
    /// released, so `a = a` never empties the instance.
    pub fn set_value(&mut self, value: Option<Object>) {
        if let Some(Object::Instance(instance)) = &value {
            instance.retain();
        }

        let old = std::mem::replace(&mut self.value, value);
        if let Some(Object::Instance(instance)) = old {
            instance.release();
        }
    }
}

/// Anything a scope can hold under a name, and anything an expression evaluates to.
#[derive(Debug, Clone)]
pub enum Symbol {
    Variable(Shared<Variable>),
    Class(Rc<Class>),
    Module(Rc<Module>),
    Closure(Rc<Closure>),
    /// `super` in a root class scope, and the result of expressions without one.
    Null,
}

impl Symbol {
    pub fn variable(variable: Variable) -> Self {
        Symbol::Variable(variable.as_shared())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Symbol::Variable(_) => "variable",
            Symbol::Class(_) => "class",
            Symbol::Module(_) => "module",
            Symbol::Closure(_) => "function",
            Symbol::Null => "nothing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Scope;

    fn make_instance() -> Rc<Instance> {
        let scope = Scope::named("A", None).as_shared();
        let class = Rc::new(Class::new("A", Type::new("A"), None, vec![], scope.clone()));
        let instance_scope = Scope::new(Some(scope)).as_shared();
        instance_scope
            .borrow_mut()
            .define("v", Symbol::variable(Variable::new(Type::int(), false, Some(Object::Integer(1)))));
        Rc::new(Instance::new(class, instance_scope))
    }

    #[test]
    fn reals_keep_their_fraction() {
        assert_eq!(format_real(1.0), "1.0");
        assert_eq!(format_real(0.25), "0.25");
        assert_eq!(format_real(-3.0), "-3.0");
    }

    #[test]
    fn last_release_clears_the_properties() {
        let instance = make_instance();
        let mut first =
            Variable::declared(Type::new("A"), false, Some(Object::Instance(instance.clone())));
        let mut second =
            Variable::declared(Type::new("A"), false, Some(Object::Instance(instance.clone())));
        assert_eq!(instance.ref_count(), 2);

        first.set_value(None);
        assert_eq!(instance.ref_count(), 1);
        assert!(instance.scope.borrow().get_local("v").is_some());

        second.set_value(None);
        assert_eq!(instance.ref_count(), 0);
        assert!(instance.scope.borrow().get_local("v").is_none());
    }

    #[test]
    fn self_assignment_keeps_the_instance() {
        let instance = make_instance();
        let mut variable =
            Variable::declared(Type::new("A"), false, Some(Object::Instance(instance.clone())));
        variable.set_value(Some(Object::Instance(instance.clone())));
        assert_eq!(instance.ref_count(), 1);
        assert!(instance.scope.borrow().get_local("v").is_some());
    }

    #[test]
    fn temporaries_do_not_count() {
        let instance = make_instance();
        let _temporary = Variable::new(Type::new("A"), true, Some(Object::Instance(instance.clone())));
        assert_eq!(instance.ref_count(), 0);
    }
}
