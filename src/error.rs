use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("[line {line}] Illegal content '{content}' at position {position}")]
    IllegalContent { content: char, line: usize, position: usize },
    #[error("[line {line}] Unexpected end of input at position {position}")]
    UnexpectedEof { line: usize, position: usize },
    #[error("[line {line}] Unknown error at position {position}")]
    UnknownError { line: usize, position: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("[line {line}] Error at {found}: {message}")]
    Expression { line: usize, found: String, message: String },
    #[error("[line {line}] Error in prototype at {found}: {message}")]
    Prototype { line: usize, found: String, message: String },
    #[error(transparent)]
    Lex(#[from] LexError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// A name is declared twice in the same scope.
    #[error("Invalid redeclaration of '{0}'")]
    InvalidRedeclaration(String),
    #[error("Unresolved identifier '{0}'")]
    UnresolvedIdentifier(String),
    #[error("Cannot assign to a constant")]
    ForbiddenAssignment,
    #[error("Class '{0}' is already declared")]
    ClassAlreadyDeclared(String),
    #[error("Function '{0}' is already declared")]
    FunctionAlreadyDeclared(String),
    /// No closure matches the call signature and no class has the bare name.
    #[error("Function '{0}' is not declared")]
    FunctionNotDeclared(String),
    /// A member is not visible on the class, or on the ancestor a variable is typed with.
    #[error("Class member '{0}' is not declared")]
    ClassMemberNotDeclared(String),
    #[error("Class member '{0}' is already declared")]
    ClassMemberAlreadyDeclared(String),
    #[error("Class member '{0}' is already declared in a superclass")]
    ClassMemberAlreadyDeclaredInSuperclass(String),
    #[error("Binary operator '{operator}' cannot be applied to operands of type '{left}' and '{right}'")]
    BinaryOperatorTypeMismatch { operator: String, left: String, right: String },
    #[error("Operator '{operator}' cannot be applied to a value of type '{operand}'")]
    UnsupportedOperandType { operator: String, operand: String },
    #[error("Cannot use a value of type '{found}' where '{expected}' is expected")]
    ExpressionTypeMismatch { expected: String, found: String },
    #[error("Parameter '{parameter}' expects a value of type '{expected}' but got '{found}'")]
    WrongArgumentType { parameter: String, expected: String, found: String },
    #[error("Function '{function}' expects {expected} arguments but got {found}")]
    WrongArgumentCount { function: String, expected: usize, found: usize },
    #[error("Function '{function}' should return '{expected}' but returned '{found}'")]
    WrongReturnType { function: String, expected: String, found: String },
    #[error("Function '{0}' is missing a returned expression")]
    MissingReturnValue(String),
    #[error("Function '{0}' should return nothing")]
    ShouldReturnNothing(String),
    #[error("Division by zero")]
    ZeroDivision,
    /// A value was required but the variable holds nil.
    #[error("Use of a variable without a value")]
    UndefinedVariable,
    #[error("Undefined type '{0}'")]
    UndefinedType(String),
    #[error("Expression evaluation error: {0}")]
    ExpressionEvaluation(String),
    #[error("Only instances, classes and modules have members")]
    AccessorOwner,
    #[error("Member access expects an identifier or a call")]
    AccessorMember,
    #[error("Instance property '{0}' not found")]
    InstancePropertyNotFound(String),
    #[error("'super' used outside of a class member")]
    SuperOutsideClassMember,
    #[error("'super' used in a member of a root class")]
    SuperInRootClassMember,
    #[error("Native function parameter '{0}' is not bound")]
    NativeParameter(String),
    #[error("Module '{0}' not found")]
    ModuleNotFound(String),
    #[error("Module '{name}' failed to load: {message}")]
    ModuleLoad { name: String, message: String },
    #[error("Module '{0}' imports itself")]
    CircularImport(String),
    #[error("Index {index} is out of range for an array of {count} elements")]
    IndexOutOfRange { index: i64, count: usize },
    #[error("Declaration scope of '{0}' no longer exists")]
    DanglingClosure(String),
}

/// Everything `run` can fail with.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(ParseError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Lex(e) => Error::Lex(e),
            e => Error::Parse(e),
        }
    }
}
