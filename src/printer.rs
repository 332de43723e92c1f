use std::fmt::Write;

use crate::object::format_real;
use crate::prelude::*;

/// Renders syntax trees back to source. Expressions come out fully
/// parenthesized so the text parses to the same tree.
pub struct AstPrinter;

impl AstPrinter {
    pub fn to_string(expr: &Expr) -> String {
        match expr {
            Expr::Integer(n) => n.to_string(),
            Expr::Real(n) => format_real(*n),
            // Escapes are kept verbatim by the scanner
            Expr::String(s) => format!("\"{s}\""),
            Expr::Boolean(b) => b.to_string(),
            Expr::Nil => "nil".to_owned(),
            Expr::Identifier(name) => name.clone(),
            Expr::Unary { operator, operand } => format!("({operator}{})", Self::to_string(operand)),
            Expr::Binary { left, operator: TokenType::Dot, right } => {
                format!("{}.{}", Self::to_string(left), Self::to_string(right))
            }
            Expr::Binary { left, operator, right } => {
                format!("({} {operator} {})", Self::to_string(left), Self::to_string(right))
            }
            Expr::Call(call) => {
                let arguments: Vec<String> = call
                    .arguments
                    .iter()
                    .map(|a| match &a.label {
                        Some(label) => format!("{label}: {}", Self::to_string(&a.value)),
                        None => Self::to_string(&a.value),
                    })
                    .collect();
                format!("{}({})", call.name, arguments.join(", "))
            }
            Expr::Super => "super".to_owned(),
            Expr::Native { .. } => "<native>".to_owned(),
        }
    }

    pub fn program_to_string(program: &Program) -> String {
        let mut out = String::new();
        for statement in &program.statements {
            Self::write_stmt(&mut out, statement, 0);
        }
        out
    }

    fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
        let indent = "    ".repeat(depth);
        match stmt {
            Stmt::Expression { expr } => {
                let _ = writeln!(out, "{indent}{}", Self::to_string(expr));
            }
            Stmt::Block(block) => {
                let _ = write!(out, "{indent}");
                Self::write_block(out, block, depth);
                out.push('\n');
            }
            Stmt::If { .. } => {
                let _ = write!(out, "{indent}");
                Self::write_if(out, stmt, depth);
                out.push('\n');
            }
            Stmt::For { index, start, end, step, body } => {
                let _ = write!(
                    out,
                    "{indent}for {index} in {} to {}",
                    Self::to_string(start),
                    Self::to_string(end)
                );
                if let Some(step) = step {
                    let _ = write!(out, " step {}", Self::to_string(step));
                }
                out.push(' ');
                Self::write_block(out, body, depth);
                out.push('\n');
            }
            Stmt::While { condition, body } => {
                let _ = write!(out, "{indent}while {} ", Self::to_string(condition));
                Self::write_block(out, body, depth);
                out.push('\n');
            }
            Stmt::Var(decl) => {
                let _ = writeln!(out, "{indent}{}", Self::var_to_string(decl));
            }
            Stmt::Function(decl) => {
                let _ = write!(out, "{indent}");
                Self::write_function(out, decl, depth);
            }
            Stmt::Class(decl) => Self::write_class(out, decl, depth),
            Stmt::Return { value: Some(value) } => {
                let _ = writeln!(out, "{indent}return {}", Self::to_string(value));
            }
            Stmt::Return { value: None } => {
                let _ = writeln!(out, "{indent}return");
            }
            Stmt::Break => {
                let _ = writeln!(out, "{indent}break");
            }
            Stmt::Continue => {
                let _ = writeln!(out, "{indent}continue");
            }
            Stmt::Import { name } => {
                let _ = writeln!(out, "{indent}import {name}");
            }
        }
    }

    /// Writes `{ ... }` without a trailing line feed.
    fn write_block(out: &mut String, block: &Block, depth: usize) {
        out.push_str("{\n");
        for statement in &block.statements {
            Self::write_stmt(out, statement, depth + 1);
        }
        let _ = write!(out, "{}}}", "    ".repeat(depth));
    }

    fn write_if(out: &mut String, stmt: &Stmt, depth: usize) {
        let Stmt::If { condition, then_branch, else_branch } = stmt else { return };

        let _ = write!(out, "if {} ", Self::to_string(condition));
        Self::write_block(out, then_branch, depth);
        match else_branch.as_deref() {
            Some(nested @ Stmt::If { .. }) => {
                out.push_str(" else ");
                Self::write_if(out, nested, depth);
            }
            Some(Stmt::Block(block)) => {
                out.push_str(" else ");
                Self::write_block(out, block, depth);
            }
            _ => {}
        }
    }

    fn var_to_string(decl: &VarDecl) -> String {
        let mut text = format!("{} {}", if decl.is_constant { "const" } else { "var" }, decl.name);
        if let Some(path) = &decl.type_path {
            let _ = write!(text, ": {path}");
        }
        if let Some(initializer) = &decl.initializer {
            let _ = write!(text, " = {}", Self::to_string(initializer));
        }
        text
    }

    fn write_function(out: &mut String, decl: &FunctionDecl, depth: usize) {
        let prototype = &decl.prototype;
        let params: Vec<String> = prototype
            .params
            .iter()
            .map(|p| format!("{}{}: {}", if p.is_anonymous { "#" } else { "" }, p.name, p.type_path))
            .collect();

        let _ = write!(out, "func {}({})", prototype.name, params.join(", "));
        if let Some(return_type) = &prototype.return_type {
            let _ = write!(out, " -> {return_type}");
        }
        out.push(' ');
        Self::write_block(out, &decl.body, depth);
        out.push('\n');
    }

    fn write_class(out: &mut String, decl: &ClassDecl, depth: usize) {
        let indent = "    ".repeat(depth);
        let member_indent = "    ".repeat(depth + 1);

        let _ = write!(out, "{indent}class {}", decl.name);
        if let Some(superclass) = &decl.superclass {
            let _ = write!(out, ": {superclass}");
        }
        out.push_str(" {\n");

        for property in &decl.static_properties {
            let _ = writeln!(out, "{member_indent}static {}", Self::var_to_string(property));
        }
        for property in &decl.instance_properties {
            let _ = writeln!(out, "{member_indent}{}", Self::var_to_string(property));
        }
        for method in &decl.static_methods {
            let _ = write!(out, "{member_indent}static ");
            Self::write_function(out, method, depth + 1);
        }
        for method in &decl.instance_methods {
            let _ = write!(out, "{member_indent}");
            Self::write_function(out, method, depth + 1);
        }
        for inner in &decl.inner_classes {
            Self::write_class(out, inner, depth + 1);
        }

        let _ = writeln!(out, "{indent}}}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).parse().expect("failed to parse the source")
    }

    fn first_expr(program: &Program) -> &Expr {
        match program.statements.first() {
            Some(Stmt::Expression { expr }) => expr,
            other => panic!("not an expression statement: {other:?}"),
        }
    }

    #[test]
    fn print_an_ast() {
        // This is '-123 * (45.5)'
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary { operator: TokenType::Minus, operand: Box::new(Expr::Integer(123)) }),
            operator: TokenType::Star,
            right: Box::new(Expr::Real(45.5)),
        };

        assert_eq!(AstPrinter::to_string(&expr), "((-123) * 45.5)");
    }

    #[test]
    fn calls_and_members() {
        let program = parse("list.insert(\"a\", at: 1 + 2)\n");
        assert_eq!(AstPrinter::to_string(first_expr(&program)), "list.insert(\"a\", at: (1 + 2))");
    }

    #[test]
    fn printed_expressions_parse_back() {
        let sources = ["1 + 2 * 3 - 4", "!(a == b) && c <= 2.5", "self.v = v % 3", "Sys.print(x: 1.0)"];
        for source in sources {
            let printed = AstPrinter::to_string(first_expr(&parse(source)));
            let reprinted = AstPrinter::to_string(first_expr(&parse(&printed)));
            assert_eq!(printed, reprinted);
        }
    }

    #[test]
    fn printed_program_parses_back() {
        let source = r#"
import Sys
class Point: Base {
    static const origin: Int = 0
    var x: Int = 1
    func move(#by: Int) -> Int {
        for i in 0 to 3 step 1 {
            if i == by {
                break
            } else if i > 2 {
                continue
            } else {
                x = x + 1
            }
        }
        return x
    }
}
"#;
        let printed = AstPrinter::program_to_string(&parse(source));
        let reprinted = AstPrinter::program_to_string(&parse(&printed));
        assert_eq!(printed, reprinted);
        assert!(printed.contains("    func move(#by: Int) -> Int {\n"));
    }
}
