use std::cell::Cell;
use std::fmt::Display;
use std::rc::Rc;

use crate::prelude::*;

pub struct Class {
    pub name: String,
    pub ty: Type,
    pub superclass: Option<Rc<Class>>,
    instance_properties: Vec<Rc<VarDecl>>,
    /// Static members, methods and inner classes.
    pub scope: ScopeRef,
}

impl Class {
    pub fn new(
        name: impl AsRef<str>,
        ty: Type,
        superclass: Option<Rc<Class>>,
        instance_properties: Vec<Rc<VarDecl>>,
        scope: ScopeRef,
    ) -> Self {
        Self { name: name.as_ref().to_owned(), ty, superclass, instance_properties, scope }
    }

    /// Searches the class scope, then the superclass chain.
    pub fn get_class_member(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.scope.borrow().get_local(name) {
            return Some(symbol);
        }

        self.superclass.as_ref().and_then(|superclass| superclass.get_class_member(name))
    }

    pub fn has_instance_property(&self, name: &str) -> bool {
        self.instance_properties.iter().any(|p| p.name == name)
            || self.superclass.as_ref().map_or(false, |s| s.has_instance_property(name))
    }

    /// The ancestor whose type is `ty`, this class excluded.
    pub fn get_superclass(&self, ty: &Type) -> Option<Rc<Class>> {
        let superclass = self.superclass.as_ref()?;
        if &superclass.ty == ty {
            return Some(superclass.clone());
        }

        superclass.get_superclass(ty)
    }

    /// Whether an instance of this class can be stored where `ty` is expected.
    pub fn is_subclass_of(&self, ty: &Type) -> bool {
        &self.ty == ty || self.get_superclass(ty).is_some()
    }

    /// Instance property declarations, most-base class first.
    pub fn hierarchy_properties(&self) -> Vec<Rc<VarDecl>> {
        let mut properties = match &self.superclass {
            Some(superclass) => superclass.hierarchy_properties(),
            None => vec![],
        };
        properties.extend(self.instance_properties.iter().cloned());
        properties
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ty)
    }
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("ty", &self.ty)
            .field("superclass", &self.superclass.as_ref().map(|s| &s.ty))
            .finish()
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    /// Properties. Its parent is the class scope.
    pub scope: ScopeRef,
    ref_count: Cell<i64>,
}

impl Instance {
    pub fn new(class: Rc<Class>, scope: ScopeRef) -> Self {
        Self { class, scope, ref_count: Cell::new(0) }
    }

    pub fn ref_count(&self) -> i64 {
        self.ref_count.get()
    }

    pub fn retain(&self) {
        self.ref_count.set(self.ref_count.get() + 1);
    }

    /// Once nothing refers to the instance its properties are dropped.
    pub fn release(&self) {
        let count = self.ref_count.get() - 1;
        self.ref_count.set(count);
        if count <= 0 {
            self.scope.borrow_mut().clear();
        }
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instance", self.class)
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.ty)
            .field("ref_count", &self.ref_count.get())
            .finish()
    }
}
