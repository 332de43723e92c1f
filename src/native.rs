use std::rc::Rc;

use log::debug;

use crate::prelude::*;

type NativeFn = dyn Fn(&Interpreter, &[Shared<Variable>]) -> Result<Option<Variable>, RuntimeError>;

/// A host function callable from scripts. It receives the bound parameters in
/// prototype order and returns `None` for void.
#[derive(Clone)]
pub struct NativeFunction(Rc<NativeFn>);

impl NativeFunction {
    pub fn new(
        function: impl Fn(&Interpreter, &[Shared<Variable>]) -> Result<Option<Variable>, RuntimeError>
            + 'static,
    ) -> Self {
        Self(Rc::new(function))
    }

    pub fn call(
        &self,
        interpreter: &Interpreter,
        arguments: &[Shared<Variable>],
    ) -> Result<Option<Variable>, RuntimeError> {
        (self.0)(interpreter, arguments)
    }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn>")
    }
}

/// Declares `prototype` in `scope` as an ordinary closure whose body is a
/// single `return <native call>`.
pub fn define_native(scope: &ScopeRef, prototype: Prototype, function: NativeFunction) {
    let parameters = prototype.params.iter().map(|p| p.name.clone()).collect();
    let body = Block {
        statements: vec![Stmt::Return { value: Some(Expr::Native { parameters, function }) }],
    };

    let signature = prototype.signature();
    let closure = Closure::new(prototype, Rc::new(body), scope);
    scope.borrow_mut().define(&signature, Symbol::Closure(Rc::new(closure)));
}

pub fn argument(arguments: &[Shared<Variable>], index: usize) -> Result<Shared<Variable>, RuntimeError> {
    arguments.get(index).cloned().ok_or_else(|| RuntimeError::NativeParameter(format!("#{index}")))
}

/// The value of an argument, nil being an error.
pub fn argument_value(arguments: &[Shared<Variable>], index: usize) -> Result<Object, RuntimeError> {
    let argument = argument(arguments, index)?;
    let value = argument.borrow().value().cloned();
    value.ok_or(RuntimeError::UndefinedVariable)
}

fn real_argument(arguments: &[Shared<Variable>], index: usize) -> Result<f64, RuntimeError> {
    let value = argument_value(arguments, index)?;
    value.real().ok_or_else(|| RuntimeError::ExpressionTypeMismatch {
        expected: Type::REAL.to_owned(),
        found: Type::of(&value).to_string(),
    })
}

/// Modules implemented by the host. `None` if `name` is not one of them.
pub fn native_module(name: &str) -> Option<Module> {
    let scope = Scope::named(name, None).as_shared();
    match name {
        "Sys" => define_sys(&scope),
        "Math" => define_math(&scope),
        _ => return None,
    }

    debug!("registered native module {name}");
    Some(Module::new(name, scope))
}

fn define_sys(scope: &ScopeRef) {
    define_native(
        scope,
        Prototype::new("print", vec![Param::anonymous("text", Type::string())], Type::void()),
        NativeFunction::new(|interpreter, arguments| {
            let text = argument_value(arguments, 0)?;
            interpreter.post(Message::new(MessageKind::Stdout, "print", text.to_string()));
            Ok(None)
        }),
    );

    define_native(
        scope,
        Prototype::new("string", vec![Param::anonymous("value", Type::any())], Type::string()),
        NativeFunction::new(|_, arguments| {
            let value = argument(arguments, 0)?;
            let text = match value.borrow().value() {
                Some(object) => object.to_string(),
                None => "nil".to_owned(),
            };
            Ok(Some(Variable::constant(Object::String(text))))
        }),
    );
}

const UNARY_MATH: &[(&str, fn(f64) -> f64)] = &[
    ("acos", f64::acos),
    ("asin", f64::asin),
    ("atan", f64::atan),
    ("cos", f64::cos),
    ("sin", f64::sin),
    ("tan", f64::tan),
    ("acosh", f64::acosh),
    ("asinh", f64::asinh),
    ("atanh", f64::atanh),
    ("cosh", f64::cosh),
    ("sinh", f64::sinh),
    ("tanh", f64::tanh),
    ("exp", f64::exp),
    ("log", f64::ln),
    ("log10", f64::log10),
    ("fabs", f64::abs),
    ("sqrt", f64::sqrt),
    ("ceil", f64::ceil),
    ("floor", f64::floor),
    ("round", f64::round),
];

const BINARY_MATH: &[(&str, fn(f64, f64) -> f64)] =
    &[("atan2", f64::atan2), ("hypot", f64::hypot), ("pow", f64::powf)];

fn define_math(scope: &ScopeRef) {
    for &(name, function) in UNARY_MATH {
        define_native(
            scope,
            Prototype::new(name, vec![Param::anonymous("x", Type::real())], Type::real()),
            NativeFunction::new(move |_, arguments| {
                let x = real_argument(arguments, 0)?;
                Ok(Some(Variable::constant(Object::Real(function(x)))))
            }),
        );
    }

    for &(name, function) in BINARY_MATH {
        let params = vec![Param::anonymous("x", Type::real()), Param::anonymous("y", Type::real())];
        define_native(
            scope,
            Prototype::new(name, params, Type::real()),
            NativeFunction::new(move |_, arguments| {
                let x = real_argument(arguments, 0)?;
                let y = real_argument(arguments, 1)?;
                Ok(Some(Variable::constant(Object::Real(function(x, y)))))
            }),
        );
    }
}
