use std::fmt::Display;
use std::rc::Rc;

use crate::native::NativeFunction;
use crate::prelude::*;

#[derive(Debug, Clone)]
pub enum Expr {
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
    Nil,
    Identifier(String),
    Unary {
        operator: TokenType,
        operand: Box<Expr>,
    },
    /// Assignment and member access (`.`) are binary operators as well.
    Binary {
        left: Box<Expr>,
        operator: TokenType,
        right: Box<Expr>,
    },
    Call(Call),
    Super,
    /// Forwards the named, already bound parameters to a host function.
    Native {
        parameters: Vec<String>,
        function: NativeFunction,
    },
}

#[derive(Debug, Clone)]
pub struct Call {
    pub name: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub label: Option<String>,
    pub value: Expr,
}

impl Call {
    /// The labels a call site contributes to the signature, positional ones as "".
    pub fn labels(&self) -> Vec<&str> {
        self.arguments.iter().map(|a| a.label.as_deref().unwrap_or("")).collect()
    }
}

/// A dotted chain of identifiers naming a type, e.g. `Outer.Inner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePath(pub Vec<String>);

impl TypePath {
    pub fn simple(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }
}

impl Display for TypePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression { expr: Expr },
    Block(Block),
    If { condition: Expr, then_branch: Block, else_branch: Option<Box<Stmt>> },
    For { index: String, start: Expr, end: Expr, step: Option<Expr>, body: Block },
    While { condition: Expr, body: Block },
    Var(Rc<VarDecl>),
    Function(Rc<FunctionDecl>),
    Class(Rc<ClassDecl>),
    Return { value: Option<Expr> },
    Break,
    Continue,
    Import { name: String },
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub type_path: Option<TypePath>,
    pub is_constant: bool,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub type_path: TypePath,
    /// `#`-marked parameters are called positionally.
    pub is_anonymous: bool,
}

#[derive(Debug, Clone)]
pub struct PrototypeDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub return_type: Option<TypePath>,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub prototype: PrototypeDecl,
    pub body: Rc<Block>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<TypePath>,
    pub instance_properties: Vec<Rc<VarDecl>>,
    pub instance_methods: Vec<Rc<FunctionDecl>>,
    pub static_properties: Vec<Rc<VarDecl>>,
    pub static_methods: Vec<Rc<FunctionDecl>>,
    pub inner_classes: Vec<Rc<ClassDecl>>,
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
