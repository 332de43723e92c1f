use std::cell::RefCell;
use std::rc::Rc;

use hop::prelude::*;
use hop::Hop;

fn make_expression(source: &str) -> Expr {
    let stmt = Parser::new(source)
        .parse()
        .expect("failed to parse the source")
        .statements
        .pop()
        .expect("no statement was created");

    match stmt {
        Stmt::Expression { expr } => expr,
        _ => panic!("statement is not an expression"),
    }
}

fn evaluate(source: &str) -> Result<Option<Object>, RuntimeError> {
    let expr = make_expression(source);
    let mut interpreter = Interpreter::new(Config::default());
    let scope = Scope::new(None).as_shared();

    match interpreter.evaluate_expr(&expr, &scope, &scope)? {
        Symbol::Variable(variable) => {
            let value = variable.borrow().value().cloned();
            Ok(value)
        }
        _ => Ok(None),
    }
}

/// Runs `source` and returns what it printed, line by line.
fn run(source: &str) -> (Vec<String>, Result<(), Error>) {
    let output = Rc::new(RefCell::new(vec![]));

    let mut hop = Hop::new();
    let sink = output.clone();
    hop.subscribe(MessageKind::Stdout, move |m| sink.borrow_mut().push(m.data.clone()));
    let result = hop.run(source);

    let lines = output.borrow().clone();
    (lines, result)
}

fn run_ok(source: &str) -> Vec<String> {
    let (lines, result) = run(source);
    assert_eq!(result, Ok(()));
    lines
}

fn run_err(source: &str) -> RuntimeError {
    match run(source).1 {
        Err(Error::Runtime(e)) => e,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

macro_rules! assert_literal {
    ($source:literal, $expected:expr, $lit_type:path) => {
        let res = evaluate($source);
        assert_eq!(res, Ok(Some($lit_type($expected))));
    };
}

macro_rules! assert_integer {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, $expected, Object::Integer);
    };
}

macro_rules! assert_real {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, $expected, Object::Real);
    };
}

macro_rules! assert_string {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, $expected.to_owned(), Object::String);
    };
}

macro_rules! assert_boolean {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, $expected, Object::Boolean);
    };
}

macro_rules! assert_error {
    ($source:literal, $pattern:pat) => {
        let res = evaluate($source);
        assert!(matches!(res, Err($pattern)), "got {res:?}");
    };
}

#[test]
fn unary_operators() {
    assert_integer!("-3", -3);
    assert_real!("-3.5", -3.5);
    assert_integer!("~0", -1);
    assert_boolean!("!true", false);
    assert_error!("!1", RuntimeError::UnsupportedOperandType { .. });
}

#[test]
fn integer_arithmetic() {
    assert_integer!("10 + 20", 30);
    assert_integer!("10 - 20", -10);
    assert_integer!("2 + 3 * 4", 14);
    assert_integer!("(2 + 3) * 4", 20);
    assert_integer!("7 / 2", 3);
    assert_integer!("7 % 3", 1);
}

#[test]
fn real_arithmetic() {
    assert_real!("1.5 + 1.0", 2.5);
    assert_real!("10.0 / 4.0", 2.5);
}

#[test]
fn string_concatenation() {
    assert_string!(r#""Hello " + "World!""#, "Hello World!");
}

#[test]
fn comparisons() {
    assert_boolean!("1 < 2", true);
    assert_boolean!("2.0 >= 2.5", false);
    assert_boolean!(r#""a" < "b""#, true);
    assert_boolean!("1 == 1", true);
    assert_boolean!("1 != 1", false);
    assert_boolean!("true && false || true", true);
}

#[test]
fn logical_operators_evaluate_both_sides() {
    let lines = run_ok(
        r#"
import Sys
func side() -> Bool {
    Sys.print("evaluated")
    return true
}
var a = false && side()
var b = true || side()
Sys.print(Sys.string(a))
Sys.print(Sys.string(b))
"#,
    );
    assert_eq!(lines, vec!["evaluated", "evaluated", "false", "true"]);
}

#[test]
fn mixed_operand_types_are_rejected() {
    assert_error!("1 + 1.0", RuntimeError::BinaryOperatorTypeMismatch { .. });
    assert_error!(r#""a" + 1"#, RuntimeError::BinaryOperatorTypeMismatch { .. });
    assert_error!("1 == true", RuntimeError::ExpressionTypeMismatch { .. });
    assert_error!("1.0 % 2.0", RuntimeError::UnsupportedOperandType { .. });
}

#[test]
fn division_by_zero() {
    assert_error!("5 / 0", RuntimeError::ZeroDivision);
    assert_error!("5 % 0", RuntimeError::ZeroDivision);
    assert_error!("5.0 / 0.0", RuntimeError::ZeroDivision);
}

#[test]
fn integer_overflow_wraps() {
    assert_integer!("9223372036854775807 + 1", i64::MIN);
}

#[test]
fn nil_comparisons() {
    assert_boolean!("nil == nil", true);
    assert_boolean!("1 == nil", false);
}

#[test]
fn unknown_identifier() {
    assert_error!("a + 1", RuntimeError::UnresolvedIdentifier(_));
}

#[test]
fn for_loop_is_half_open() {
    let lines = run_ok(
        r#"
import Sys
for i in 0 to 6 step 2 {
    Sys.print(Sys.string(i))
}
for i in 3 to 0 step -1 {
    Sys.print(Sys.string(i))
}
"#,
    );
    assert_eq!(lines, vec!["0", "2", "4", "3", "2", "1"]);
}

#[test]
fn break_and_continue() {
    let lines = run_ok(
        r#"
import Sys
var i = 0
while i < 10 {
    i = i + 1
    if i % 2 == 0 {
        continue
    }
    if i > 5 {
        break
    }
    Sys.print(Sys.string(i))
}
"#,
    );
    assert_eq!(lines, vec!["1", "3", "5"]);
}

#[test]
fn return_leaves_nested_loops() {
    let lines = run_ok(
        r#"
import Sys
func find(#target: Int) -> Int {
    for i in 0 to 10 {
        for j in 0 to 10 {
            if i * j == target {
                return i * 100 + j
            }
        }
    }
    return -1
}
Sys.print(Sys.string(find(12)))
"#,
    );
    assert_eq!(lines, vec!["206"]);
}

#[test]
fn functions_resolve_free_names_lexically() {
    let lines = run_ok(
        r#"
import Sys
var x = "outer"
func show() {
    Sys.print(x)
}
func caller() {
    var x = "inner"
    show()
}
caller()
"#,
    );
    assert_eq!(lines, vec!["outer"]);
}

#[test]
fn labels_select_the_overload() {
    let lines = run_ok(
        r#"
import Sys
func describe(#n: Int) -> String {
    return "positional"
}
func describe(n: Int) -> String {
    return "labeled"
}
Sys.print(describe(1))
Sys.print(describe(n: 1))
"#,
    );
    assert_eq!(lines, vec!["positional", "labeled"]);
}

#[test]
fn recursion() {
    let lines = run_ok(
        r#"
import Sys
func fib(#n: Int) -> Int {
    if n < 2 {
        return n
    }
    return fib(n - 1) + fib(n - 2)
}
Sys.print(Sys.string(fib(15)))
"#,
    );
    assert_eq!(lines, vec!["610"]);
}

#[test]
fn redeclaration_and_shadowing() {
    assert!(matches!(run_err("var a = 1\nvar a = 2\n"), RuntimeError::InvalidRedeclaration(_)));

    let lines = run_ok(
        r#"
import Sys
var a = 1
if true {
    var a = 2
    Sys.print(Sys.string(a))
}
Sys.print(Sys.string(a))
"#,
    );
    assert_eq!(lines, vec!["2", "1"]);
}

#[test]
fn constants_and_parameters_cannot_be_assigned() {
    assert_eq!(run_err("const a = 1\na = 2\n"), RuntimeError::ForbiddenAssignment);
    assert_eq!(run_err("func f(#a: Int) {\n a = 2\n}\nf(1)\n"), RuntimeError::ForbiddenAssignment);
}

#[test]
fn declarations_need_a_type() {
    assert!(matches!(run_err("var a\n"), RuntimeError::UndefinedType(_)));
    assert!(matches!(run_err("var a = nil\n"), RuntimeError::UndefinedType(_)));
    assert!(matches!(run_err("var a: Int = 1.0\n"), RuntimeError::ExpressionTypeMismatch { .. }));
    assert!(matches!(run_err("var a: Nope\n"), RuntimeError::UndefinedType(_)));
}

#[test]
fn function_type_checks() {
    assert!(matches!(
        run_err("func f(#a: Int) {\n}\nf(1.0)\n"),
        RuntimeError::WrongArgumentType { .. }
    ));
    assert!(matches!(
        run_err("func f() -> Int {\n return \"a\"\n}\nf()\n"),
        RuntimeError::WrongReturnType { .. }
    ));
    assert!(matches!(run_err("func f() -> Int {\n}\nf()\n"), RuntimeError::MissingReturnValue(_)));
    assert!(matches!(run_err("func f() {\n return 1\n}\nf()\n"), RuntimeError::ShouldReturnNothing(_)));
    assert!(matches!(run_err("f()\n"), RuntimeError::FunctionNotDeclared(_)));
}

#[test]
fn inherited_property_through_method() {
    let lines = run_ok(
        r#"
import Sys
class A { var v: Int = 1 }
class B: A {
    func get() -> Int {
        return self.v
    }
}
var b = B()
Sys.print(Sys.string(b.get()))
"#,
    );
    assert_eq!(lines, vec!["1"]);
}

#[test]
fn initializer_and_properties() {
    let lines = run_ok(
        r#"
import Sys
class Point {
    var x: Int = 0
    var y: Int = 0
    func init(x: Int, y: Int) {
        self.x = x
        self.y = y
    }
    func sum() -> Int {
        return self.x + self.y
    }
}
var p = Point(x: 3, y: 4)
Sys.print(Sys.string(p.sum()))
p.x = 10
Sys.print(Sys.string(p.sum()))
"#,
    );
    assert_eq!(lines, vec!["7", "14"]);
}

#[test]
fn construction_without_initializer() {
    assert!(run("class A {\n}\nvar a = A()\n").1.is_ok());
    assert!(matches!(run_err("class A {\n}\nvar a = A(1)\n"), RuntimeError::FunctionNotDeclared(_)));
}

#[test]
fn dispatch_is_dynamic_but_visibility_follows_the_declared_type() {
    let source = r#"
import Sys
class Animal {
    func name() -> String {
        return "animal"
    }
}
class Dog: Animal {
    func name() -> String {
        return "dog"
    }
    func bark() -> String {
        return "woof"
    }
}
var pet: Animal = Dog()
Sys.print(pet.name())
"#;
    assert_eq!(run_ok(source), vec!["dog"]);

    let failing = format!("{source}Sys.print(pet.bark())\n");
    assert!(matches!(run_err(&failing), RuntimeError::ClassMemberNotDeclared(_)));
}

#[test]
fn super_calls_the_ancestor() {
    let lines = run_ok(
        r#"
import Sys
class A {
    func hello() -> String {
        return "A"
    }
    static func kind() -> String {
        return "static A"
    }
}
class B: A {
    func hello() -> String {
        return super.hello() + "B"
    }
    static func kind() -> String {
        return super.kind() + " then B"
    }
}
Sys.print(B().hello())
Sys.print(B.kind())
"#,
    );
    assert_eq!(lines, vec!["AB", "static A then B"]);
}

#[test]
fn misplaced_super() {
    assert_eq!(
        run_err("class A {\n func f() {\n super.f()\n }\n}\nA().f()\n"),
        RuntimeError::SuperInRootClassMember
    );
    assert_eq!(run_err("super.f()\n"), RuntimeError::SuperOutsideClassMember);
}

#[test]
fn class_declaration_errors() {
    assert!(matches!(run_err("class A {\n}\nclass A {\n}\n"), RuntimeError::ClassAlreadyDeclared(_)));
    assert!(matches!(
        run_err("class A {\n var v: Int = 1\n var v: Int = 2\n}\n"),
        RuntimeError::ClassMemberAlreadyDeclared(_)
    ));
    assert!(matches!(
        run_err("class A {\n var v: Int = 1\n}\nclass B: A {\n var v: Int = 2\n}\n"),
        RuntimeError::ClassMemberAlreadyDeclaredInSuperclass(_)
    ));
    assert!(matches!(run_err("class B: Missing {\n}\n"), RuntimeError::UnresolvedIdentifier(_)));
}

#[test]
fn static_members_and_inner_classes() {
    let lines = run_ok(
        r#"
import Sys
class Outer {
    static var count: Int = 2
    class Inner {
        var v: Int = 5
    }
    static func twice(#n: Int) -> Int {
        return n * 2
    }
}
Outer.count = Outer.count + 1
Sys.print(Sys.string(Outer.twice(Outer.count)))
var inner: Outer.Inner = Outer.Inner()
Sys.print(Sys.string(inner.v))
"#,
    );
    assert_eq!(lines, vec!["6", "5"]);
}

#[test]
fn members_can_name_their_own_class() {
    let lines = run_ok(
        r#"
import Sys
class Point {
    var x: Int = 1
    static func origin() -> Point {
        return Point()
    }
    func same(other: Point) -> Bool {
        return self == other
    }
}
var p: Point = Point.origin()
var q: Point = p
Sys.print(Sys.string(p.same(other: q)))
Sys.print(Sys.string(p.x))
"#,
    );
    assert_eq!(lines, vec!["true", "1"]);
}

#[test]
fn nil_is_accepted_for_class_typed_parameters() {
    let lines = run_ok(
        r#"
import Sys
class Node {
    var v: Int = 1
}
func missing(#n: Node) -> Bool {
    return n == nil
}
Sys.print(Sys.string(missing(nil)))
Sys.print(Sys.string(missing(Node())))
"#,
    );
    assert_eq!(lines, vec!["true", "false"]);
}

#[test]
fn undeclared_static_members_are_reported() {
    let source = "class Counter {\n static var total: Int = 0\n}\nCounter.nope\n";
    assert_eq!(run_err(source), RuntimeError::ClassMemberNotDeclared("nope".to_owned()));
}

#[test]
fn the_last_reference_clears_the_instance() {
    let source = r#"
import Sys
class A { var v: Int = 1 }
var a: A = A()
var b: A = a
func probe(#x: A) {
    a = nil
    Sys.print(Sys.string(x.v))
    b = nil
    Sys.print(Sys.string(x.v))
}
probe(b)
"#;
    let (lines, result) = run(source);
    assert_eq!(lines, vec!["1"]);
    assert!(matches!(result, Err(Error::Runtime(RuntimeError::InstancePropertyNotFound(_)))));
}

#[test]
fn arrays() {
    let lines = run_ok(
        r#"
import Sys
var list = Array()
list.append(1)
list.append("two")
list.insert(0, at: 0)
Sys.print(Sys.string(list.count()))
Sys.print(Sys.string(list.element(at: 2)))
list.setElement(3, at: 2)
list.remove(at: 0)
Sys.print(Sys.string(list.first()))
Sys.print(Sys.string(list.last()))
Sys.print(Sys.string(list.isEmpty()))
"#,
    );
    assert_eq!(lines, vec!["3", "two", "1", "3", "false"]);

    assert!(matches!(
        run_err("var list = Array()\nlist.element(at: 0)\n"),
        RuntimeError::IndexOutOfRange { index: 0, count: 0 }
    ));
}

#[test]
fn math_module() {
    let lines = run_ok(
        r#"
import Sys
import Math
Sys.print(Sys.string(Math.sqrt(16.0)))
Sys.print(Sys.string(Math.pow(2.0, 10.0)))
"#,
    );
    assert_eq!(lines, vec!["4.0", "1024.0"]);
}

#[test]
fn user_modules_are_resolved_and_cached() {
    let loads = Rc::new(RefCell::new(0));
    let counter = loads.clone();

    let mut hop = Hop::new().with_module_resolver(move |name| {
        *counter.borrow_mut() += 1;
        match name {
            "Geometry" => Some("class Square {\n var side: Int = 2\n}\nfunc area(#s: Int) -> Int {\n return s * s\n}\n".to_owned()),
            _ => None,
        }
    });

    let output = Rc::new(RefCell::new(vec![]));
    let sink = output.clone();
    hop.subscribe(MessageKind::Stdout, move |m| sink.borrow_mut().push(m.data.clone()));

    let source = r#"
import Sys
import Geometry
var square: Geometry.Square = Geometry.Square()
Sys.print(Sys.string(Geometry.area(square.side)))
"#;
    assert_eq!(hop.run(source), Ok(()));
    assert_eq!(hop.run(source), Ok(()));
    assert_eq!(*output.borrow(), vec!["4", "4"]);
    assert_eq!(*loads.borrow(), 1);

    assert_eq!(
        hop.run("import Missing\n"),
        Err(Error::Runtime(RuntimeError::ModuleNotFound("Missing".to_owned())))
    );
}

#[test]
fn unparseable_modules_fail_to_load() {
    let mut hop = Hop::new().with_module_resolver(|name| match name {
        "Broken" => Some("var = 1\n".to_owned()),
        _ => None,
    });

    assert!(matches!(
        hop.run("import Broken\n"),
        Err(Error::Runtime(RuntimeError::ModuleLoad { name, .. })) if name == "Broken"
    ));
}

#[test]
fn circular_imports_are_rejected() {
    let mut hop = Hop::new().with_module_resolver(|name| match name {
        "A" => Some("import B\n".to_owned()),
        "B" => Some("import A\n".to_owned()),
        _ => None,
    });

    assert!(matches!(hop.run("import A\n"), Err(Error::Runtime(RuntimeError::CircularImport(_)))));
}

#[test]
fn debug_mode_posts_the_program() {
    let program = Rc::new(RefCell::new(String::new()));
    let sink = program.clone();

    let mut hop = Hop::with_config(Config::default().with_debug(true));
    hop.subscribe(MessageKind::Debug, move |m| sink.borrow_mut().push_str(&m.data));
    assert_eq!(hop.run("var a = 1 + 2\n"), Ok(()));
    assert_eq!(*program.borrow(), "var a = (1 + 2)\n");
}

#[test]
fn lex_and_parse_errors_surface() {
    assert!(matches!(run("var a = 1 & 2\n").1, Err(Error::Lex(_))));
    assert!(matches!(run("var = 1\n").1, Err(Error::Parse(_))));
}
