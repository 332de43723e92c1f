use std::cell::RefCell;
use std::rc::Rc;

use crate::native::{argument, argument_value, define_native, NativeFunction};
use crate::prelude::*;

pub const ARRAY_CLASS: &str = "Array";

// Not a valid identifier, so scripts can't reach it
const STORAGE: &str = "__array__";

/// Declares the built-in `Array` class in `scope`.
pub fn define_array_class(scope: &ScopeRef) {
    let class_scope = Scope::named(ARRAY_CLASS, None).as_shared();
    let ty = Type::new(ARRAY_CLASS);
    class_scope.borrow_mut().define("super", Symbol::Null);

    let storage = VarDecl {
        name: STORAGE.to_owned(),
        type_path: Some(TypePath::simple(Type::ANY)),
        is_constant: false,
        initializer: None,
    };

    let method = |name: &str, mut params: Vec<Param>, return_type: Type, function: NativeFunction| {
        params.insert(0, Param::named("self", ty.clone()));
        define_native(&class_scope, Prototype::new(name, params, return_type), function);
    };

    method(
        "init",
        vec![],
        Type::void(),
        NativeFunction::new(|_, arguments| {
            let property = storage_property(arguments)?;
            let elements = Object::Array(Rc::new(RefCell::new(vec![])));
            property.borrow_mut().set_value(Some(elements));
            Ok(None)
        }),
    );

    method(
        "append",
        vec![Param::anonymous("element", Type::any())],
        Type::void(),
        NativeFunction::new(|_, arguments| {
            let element = argument_value(arguments, 1)?;
            elements(arguments)?.borrow_mut().push(element);
            Ok(None)
        }),
    );

    method(
        "element",
        vec![Param::named("at", Type::int())],
        Type::any(),
        NativeFunction::new(|_, arguments| {
            let elements = elements(arguments)?;
            let elements = elements.borrow();
            let index = index_argument(arguments, 1, elements.len())?;
            Ok(Some(Variable::constant(elements[index].clone())))
        }),
    );

    method(
        "setElement",
        vec![Param::anonymous("element", Type::any()), Param::named("at", Type::int())],
        Type::void(),
        NativeFunction::new(|_, arguments| {
            let element = argument_value(arguments, 1)?;
            let elements = elements(arguments)?;
            let mut elements = elements.borrow_mut();
            let index = index_argument(arguments, 2, elements.len())?;
            elements[index] = element;
            Ok(None)
        }),
    );

    method(
        "insert",
        vec![Param::anonymous("element", Type::any()), Param::named("at", Type::int())],
        Type::void(),
        NativeFunction::new(|_, arguments| {
            let element = argument_value(arguments, 1)?;
            let elements = elements(arguments)?;
            let mut elements = elements.borrow_mut();
            // Inserting right after the last element is allowed
            let index = index_argument(arguments, 2, elements.len() + 1)?;
            elements.insert(index, element);
            Ok(None)
        }),
    );

    method(
        "remove",
        vec![Param::named("at", Type::int())],
        Type::void(),
        NativeFunction::new(|_, arguments| {
            let elements = elements(arguments)?;
            let mut elements = elements.borrow_mut();
            let index = index_argument(arguments, 1, elements.len())?;
            elements.remove(index);
            Ok(None)
        }),
    );

    method(
        "first",
        vec![],
        Type::any(),
        NativeFunction::new(|_, arguments| {
            let first = elements(arguments)?.borrow().first().cloned();
            Ok(Some(element_or_nil(first)))
        }),
    );

    method(
        "last",
        vec![],
        Type::any(),
        NativeFunction::new(|_, arguments| {
            let last = elements(arguments)?.borrow().last().cloned();
            Ok(Some(element_or_nil(last)))
        }),
    );

    method(
        "isEmpty",
        vec![],
        Type::bool(),
        NativeFunction::new(|_, arguments| {
            let is_empty = elements(arguments)?.borrow().is_empty();
            Ok(Some(Variable::constant(Object::Boolean(is_empty))))
        }),
    );

    method(
        "count",
        vec![],
        Type::int(),
        NativeFunction::new(|_, arguments| {
            let count = elements(arguments)?.borrow().len();
            Ok(Some(Variable::constant(Object::Integer(count as i64))))
        }),
    );

    let class = Class::new(ARRAY_CLASS, ty, None, vec![Rc::new(storage)], class_scope);
    scope.borrow_mut().define(ARRAY_CLASS, Symbol::Class(Rc::new(class)));
}

/// The storage property of the instance bound to `self`.
fn storage_property(arguments: &[Shared<Variable>]) -> Result<Shared<Variable>, RuntimeError> {
    let this = argument_value(arguments, 0)?;
    let instance = this.instance().ok_or(RuntimeError::AccessorOwner)?;
    let property = instance.scope.borrow().get_local(STORAGE);

    match property {
        Some(Symbol::Variable(property)) => Ok(property),
        _ => Err(RuntimeError::InstancePropertyNotFound(STORAGE.to_owned())),
    }
}

fn elements(arguments: &[Shared<Variable>]) -> Result<Shared<Vec<Object>>, RuntimeError> {
    let property = storage_property(arguments)?;
    let value = property.borrow().value().cloned();

    match value {
        Some(Object::Array(elements)) => Ok(elements),
        _ => Err(RuntimeError::InstancePropertyNotFound(STORAGE.to_owned())),
    }
}

fn index_argument(
    arguments: &[Shared<Variable>],
    index: usize,
    count: usize,
) -> Result<usize, RuntimeError> {
    let value = argument(arguments, index)?;
    let value = value.borrow().value().and_then(Object::integer).ok_or(RuntimeError::UndefinedVariable)?;

    match usize::try_from(value) {
        Ok(i) if i < count => Ok(i),
        _ => Err(RuntimeError::IndexOutOfRange { index: value, count }),
    }
}

fn element_or_nil(element: Option<Object>) -> Variable {
    match element {
        Some(element) => Variable::constant(element),
        None => Variable::nil(Type::nil()),
    }
}
