use std::fmt::Display;

use crate::object::{Object, Variable};

/// Nominal type identity. Two types are equal iff their qualified names are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    name: String,
}

impl Type {
    pub const VOID: &'static str = "Void";
    pub const INT: &'static str = "Int";
    pub const REAL: &'static str = "Real";
    pub const BOOL: &'static str = "Bool";
    pub const STRING: &'static str = "String";
    pub const ANY: &'static str = "Any";
    pub const NIL: &'static str = "Nil";

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn void() -> Self {
        Self::new(Self::VOID)
    }

    pub fn int() -> Self {
        Self::new(Self::INT)
    }

    pub fn real() -> Self {
        Self::new(Self::REAL)
    }

    pub fn bool() -> Self {
        Self::new(Self::BOOL)
    }

    pub fn string() -> Self {
        Self::new(Self::STRING)
    }

    pub fn any() -> Self {
        Self::new(Self::ANY)
    }

    pub fn nil() -> Self {
        Self::new(Self::NIL)
    }

    /// The type a script can name without declaring it. `Nil` is not one of them.
    pub fn basic(name: &str) -> Option<Self> {
        match name {
            Self::VOID | Self::INT | Self::REAL | Self::BOOL | Self::STRING | Self::ANY => {
                Some(Self::new(name))
            }
            _ => None,
        }
    }

    /// Runtime type of a bare value, used when a value crosses the native bridge.
    pub fn of(object: &Object) -> Self {
        match object {
            Object::Integer(_) => Self::int(),
            Object::Real(_) => Self::real(),
            Object::Boolean(_) => Self::bool(),
            Object::String(_) => Self::string(),
            Object::Instance(instance) => instance.class.ty.clone(),
            Object::Array(_) => Self::any(),
        }
    }

    /// Whether `source` may be stored where this type is declared. Besides an
    /// exact match, an instance fits the types of its ancestors.
    pub fn accepts(&self, source: &Variable) -> bool {
        if self.is_any() || self == &source.ty || source.ty.is_nil() {
            return true;
        }

        matches!(source.value(), Some(Object::Instance(instance)) if instance.class.is_subclass_of(self))
    }

    /// The type a binding gets when `source` is stored into a slot declared
    /// with this type. `Any` takes on the type of what it receives.
    pub fn bound_for(&self, source: &Variable) -> Type {
        if self.is_any() && !source.ty.is_nil() {
            source.ty.clone()
        } else {
            self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_any(&self) -> bool {
        self.name == Self::ANY
    }

    pub fn is_nil(&self) -> bool {
        self.name == Self::NIL
    }

    pub fn is_void(&self) -> bool {
        self.name == Self::VOID
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
