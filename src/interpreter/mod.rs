mod call;
mod expr;
mod stmt;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, info};

use crate::array::define_array_class;
use crate::native::native_module;
use crate::prelude::*;
use crate::printer::AstPrinter;

pub type InterpreterResult = Result<Symbol, RuntimeError>;
pub type ModuleResolver = Box<dyn Fn(&str) -> Option<String>>;

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Post the parsed program as a `Debug` message before running it.
    pub debug: bool,
}

impl Config {
    pub fn with_debug(self, debug: bool) -> Self {
        Self { debug, ..self }
    }
}

pub struct Interpreter {
    config: Config,
    messenger: Messenger,
    module_resolver: Option<ModuleResolver>,
    modules: HashMap<String, Rc<Module>>,
    // Modules whose source is being evaluated right now
    loading: HashSet<String>,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            messenger: Messenger::new(),
            module_resolver: None,
            modules: HashMap::new(),
            loading: HashSet::new(),
        }
    }

    pub fn with_module_resolver(
        mut self,
        resolver: impl Fn(&str) -> Option<String> + 'static,
    ) -> Self {
        self.module_resolver = Some(Box::new(resolver));
        self
    }

    pub fn subscribe(&mut self, kind: MessageKind, handler: impl Fn(&Message) + 'static) {
        self.messenger.subscribe(kind, handler);
    }

    pub fn post(&self, message: Message) {
        self.messenger.post(message);
    }

    /// Lexes, parses and runs `source` against a fresh root scope.
    pub fn run(&mut self, source: &str) -> Result<(), Error> {
        let program = Parser::new(source).parse()?;
        self.interpret(&program)?;
        Ok(())
    }

    pub fn interpret(&mut self, program: &Program) -> Result<(), RuntimeError> {
        info!("running a program of {} statements", program.statements.len());

        if self.config.debug {
            self.post(Message::new(
                MessageKind::Debug,
                "program",
                AstPrinter::program_to_string(program),
            ));
        }

        let root = Scope::new(None).as_shared();
        define_array_class(&root);

        let result = self.execute_statements(&program.statements, &root);
        root.borrow_mut().clear();
        result
    }

    fn import_module(&mut self, name: &str, scope: &ScopeRef) -> Result<(), RuntimeError> {
        let module = match self.modules.get(name).cloned() {
            Some(module) => module,
            None => {
                let module = Rc::new(self.load_module(name)?);
                self.modules.insert(name.to_owned(), module.clone());
                module
            }
        };

        scope.borrow_mut().define(name, Symbol::Module(module));
        Ok(())
    }

    fn load_module(&mut self, name: &str) -> Result<Module, RuntimeError> {
        if let Some(module) = native_module(name) {
            return Ok(module);
        }

        let source = self
            .module_resolver
            .as_ref()
            .and_then(|resolve| resolve(name))
            .ok_or_else(|| RuntimeError::ModuleNotFound(name.to_owned()))?;

        if !self.loading.insert(name.to_owned()) {
            return Err(RuntimeError::CircularImport(name.to_owned()));
        }

        debug!("evaluating module {name}");
        let result = self.evaluate_module(name, &source);
        self.loading.remove(name);
        result
    }

    fn evaluate_module(&mut self, name: &str, source: &str) -> Result<Module, RuntimeError> {
        let program = Parser::new(source)
            .parse()
            .map_err(|e| RuntimeError::ModuleLoad { name: name.to_owned(), message: e.to_string() })?;

        let scope = Scope::named(name, None).as_shared();
        define_array_class(&scope);
        self.execute_statements(&program.statements, &scope)?;

        Ok(Module::new(name, scope))
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        for module in self.modules.values() {
            module.scope.borrow_mut().clear();
        }
    }
}
