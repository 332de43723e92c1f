#![allow(clippy::new_without_default)]

mod array;
mod ast;
mod class;
mod environment;
mod error;
mod func;
mod interpreter;
mod messenger;
mod module;
mod native;
mod object;
mod parser;
mod printer;
mod scanner;
mod token;
mod types;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::class::*;
    pub use crate::environment::*;
    pub use crate::error::*;
    pub use crate::func::*;
    pub use crate::interpreter::*;
    pub use crate::messenger::*;
    pub use crate::module::*;
    pub use crate::object::*;
    pub use crate::parser::*;
    pub use crate::printer::AstPrinter;
    pub use crate::scanner::*;
    pub use crate::token::*;
    pub use crate::types::*;
    pub use crate::Shared;
}

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub use error::Error;
pub use interpreter::Config;
pub use messenger::{Message, MessageKind};
use prelude::Interpreter;

pub type Shared<T> = Rc<RefCell<T>>;

/// Embedding entry point: owns one interpreter and its module cache.
pub struct Hop {
    interpreter: Interpreter,
}

impl Hop {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self { interpreter: Interpreter::new(config) }
    }

    /// Sources for `import` statements naming neither a cached nor a native module.
    pub fn with_module_resolver(self, resolver: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self { interpreter: self.interpreter.with_module_resolver(resolver) }
    }

    pub fn subscribe(&mut self, kind: MessageKind, handler: impl Fn(&Message) + 'static) {
        self.interpreter.subscribe(kind, handler);
    }

    pub fn run(&mut self, source: &str) -> Result<(), Error> {
        self.interpreter.run(source)
    }

    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<(), anyhow::Error> {
        let content = std::fs::read_to_string(path)?;
        self.run(&content)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ErrorReporter {
    pub had_error: bool,
    pub had_runtime_error: bool,
}

impl ErrorReporter {
    pub fn report(&mut self, error: &Error) {
        eprintln!("{error}");
        match error {
            Error::Lex(_) | Error::Parse(_) => self.had_error = true,
            Error::Runtime(_) => self.had_runtime_error = true,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.had_error {
            65
        } else if self.had_runtime_error {
            70
        } else {
            0
        }
    }
}
