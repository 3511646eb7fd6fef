//! Integration tests for the engine using `Unit` as the entry point.
//!
//! Every program is assembled with the `apex_ast` builders, compiled through
//! the full pipeline and run with `Unit::invoke` or `Unit::fire_trigger`.

use std::rc::Rc;

use apex::{
    BindEvaluator, Context, EngineConfig, QueryError, QueryRequest, QueryRunner, RuntimeError,
    SchemaMap, Unit, UnitError, Value,
};
use apex_ast::build::*;
use apex_ast::{BinaryOp, NodeRef, TriggerEvent, TriggerOperation, TriggerTiming, UnaryOp};
use apex_core::Modifiers;
use pretty_assertions::assert_eq;

const PUB: Modifiers = Modifiers::PUBLIC;

fn public_static() -> Modifiers {
    Modifiers::PUBLIC | Modifiers::STATIC
}

/// Build a unit from `decls` against `ctx`.
fn build_with(ctx: &Context, decls: Vec<NodeRef>) -> Unit {
    let mut unit = ctx.create_unit();
    unit.add_declarations(decls).unwrap();
    unit.build().unwrap_or_else(|e| panic!("build failed: {e}"));
    unit
}

fn build(decls: Vec<NodeRef>) -> Unit {
    build_with(&Context::with_default_modules().unwrap(), decls)
}

/// `Main.run()` returning `returns`, with `body` as its statements.
fn main_class(returns: &str, body: Vec<NodeRef>) -> NodeRef {
    ClassBuilder::new("Main")
        .method(static_method("run", returns, body))
        .build()
}

/// Run `body` as `Main.run()` next to `decls`.
fn run_with(
    decls: Vec<NodeRef>,
    returns: &str,
    body: Vec<NodeRef>,
) -> (Unit, Result<Value, UnitError>) {
    let mut decls = decls;
    decls.push(main_class(returns, body));
    let mut unit = build(decls);
    let result = unit.invoke("Main.run", &[]);
    (unit, result)
}

fn run(returns: &str, body: Vec<NodeRef>) -> Value {
    run_with(vec![], returns, body)
        .1
        .unwrap_or_else(|e| panic!("run failed: {e}"))
}

fn uncaught(result: Result<Value, UnitError>) -> (String, String) {
    match result {
        Err(UnitError::Apex(apex::ApexError::Runtime(RuntimeError::UncaughtException {
            class,
            message,
        }))) => (class, message),
        other => panic!("expected an uncaught exception, got {other:?}"),
    }
}

fn debug(expr: NodeRef) -> NodeRef {
    expr_stmt(call("System.debug", vec![expr]))
}

fn add(left: NodeRef, right: NodeRef) -> NodeRef {
    binary(BinaryOp::Add, left, right)
}

// =============================================================================
// Expressions
// =============================================================================

#[test]
fn test_integer_arithmetic() {
    // 1 + 2 * 3 - 10 / 4
    let expr = binary(
        BinaryOp::Sub,
        add(int(1), binary(BinaryOp::Mul, int(2), int(3))),
        binary(BinaryOp::Div, int(10), int(4)),
    );
    assert_eq!(run("Integer", vec![ret(Some(expr))]).as_integer(), Some(5));
}

#[test]
fn test_double_slots_widen_integers() {
    let result = run(
        "Double",
        vec![
            local("Double", "d", Some(int(5))),
            ret(Some(binary(BinaryOp::Div, name("d"), int(2)))),
        ],
    );
    assert!(matches!(result, Value::Double(d) if d == 2.5));
}

#[test]
fn test_string_concatenation_is_left_to_right() {
    let left = add(add(string("n="), int(1)), int(2));
    let right = add(add(int(1), int(2)), string("x"));
    let result = run("String", vec![ret(Some(add(left, right)))]);
    assert_eq!(result.as_str(), Some("n=123x"));
}

#[test]
fn test_string_equality_ignores_case() {
    let result = run(
        "Boolean",
        vec![ret(Some(binary(BinaryOp::Equal, string("Hello"), string("hELLO"))))],
    );
    assert_eq!(result.as_bool(), Some(true));

    let upper = run(
        "String",
        vec![ret(Some(call_on(string("abc"), "toUpperCase", vec![])))],
    );
    assert_eq!(upper.as_str(), Some("ABC"));
}

#[test]
fn test_increment_and_compound_assignment() {
    let result = run(
        "Integer",
        vec![
            local("Integer", "i", Some(int(5))),
            local("Integer", "old", Some(unary(UnaryOp::PostInc, name("i")))),
            expr_stmt(compound(BinaryOp::Mul, name("i"), int(10))),
            ret(Some(add(name("i"), name("old")))),
        ],
    );
    assert_eq!(result.as_integer(), Some(65));
}

#[test]
fn test_ternary_and_instanceof() {
    let result = run(
        "String",
        vec![
            local("Object", "o", Some(int(5))),
            ret(Some(ternary(
                instance_of(name("o"), "Integer"),
                string("int"),
                string("other"),
            ))),
        ],
    );
    assert_eq!(result.as_str(), Some("int"));
}

#[test]
fn test_failed_cast_raises_type_exception() {
    let (_, result) = run_with(
        vec![],
        "Integer",
        vec![
            local("Object", "o", Some(string("x"))),
            ret(Some(cast("Integer", name("o")))),
        ],
    );
    assert_eq!(
        uncaught(result),
        (
            "System.TypeException".to_string(),
            "Invalid conversion from runtime type String to Integer".to_string()
        )
    );
}

// =============================================================================
// Control Flow
// =============================================================================

#[test]
fn test_while_loop_with_break_and_continue() {
    // Sum the odd numbers below 10, stopping at 7.
    let result = run(
        "Integer",
        vec![
            local("Integer", "i", Some(int(0))),
            local("Integer", "sum", Some(int(0))),
            while_(
                boolean(true),
                block(vec![
                    expr_stmt(unary(UnaryOp::PreInc, name("i"))),
                    if_(binary(BinaryOp::Equal, name("i"), int(7)), brk(), None),
                    if_(
                        binary(BinaryOp::Equal, binary(BinaryOp::Mod, name("i"), int(2)), int(0)),
                        cont(),
                        None,
                    ),
                    expr_stmt(compound(BinaryOp::Add, name("sum"), name("i"))),
                ]),
            ),
            ret(Some(name("sum"))),
        ],
    );
    assert_eq!(result.as_integer(), Some(1 + 3 + 5));
}

#[test]
fn test_enhanced_for_over_list_literal() {
    let result = run(
        "Integer",
        vec![
            local(
                "List<Integer>",
                "xs",
                Some(new_collection("List<Integer>", vec![int(1), int(2), int(3)])),
            ),
            expr_stmt(call("xs.add", vec![int(4)])),
            expr_stmt(assign(index(name("xs"), int(0)), int(10))),
            local("Integer", "total", Some(int(0))),
            for_each(
                "Integer",
                "x",
                name("xs"),
                expr_stmt(compound(BinaryOp::Add, name("total"), name("x"))),
            ),
            ret(Some(name("total"))),
        ],
    );
    assert_eq!(result.as_integer(), Some(19));
}

#[test]
fn test_try_catch_finally_order() {
    let (unit, result) = run_with(
        vec![],
        "void",
        vec![try_(
            block(vec![
                debug(string("try")),
                expr_stmt(binary(BinaryOp::Div, int(1), int(0))),
                debug(string("unreachable")),
            ]),
            vec![catch(
                "MathException",
                "e",
                block(vec![debug(add(string("catch: "), call("e.getMessage", vec![])))]),
            )],
            Some(block(vec![debug(string("finally"))])),
        )],
    );
    result.unwrap();
    assert_eq!(unit.debug_output(), &["try", "catch: Divide by 0", "finally"]);
}

#[test]
fn test_finally_runs_while_exception_propagates() {
    let thrower = ClassBuilder::new("Thrower")
        .method(static_method(
            "go",
            "void",
            vec![try_(
                block(vec![throw(new_object("MathException", vec![string("inner")]))]),
                vec![],
                Some(block(vec![debug(string("finally"))])),
            )],
        ))
        .build();
    let (unit, result) = run_with(
        vec![thrower],
        "String",
        vec![try_(
            block(vec![expr_stmt(call("Thrower.go", vec![])), ret(Some(string("no")))]),
            vec![catch(
                "Exception",
                "e",
                block(vec![ret(Some(call("e.getMessage", vec![])))]),
            )],
            None,
        )],
    );
    assert_eq!(result.unwrap().as_str(), Some("inner"));
    assert_eq!(unit.debug_output(), &["finally"]);
}

/// `for (Integer i = 0; i < limit; i++) { try { jump } finally { n++; } }`
fn counted_finally_loop(limit: i64, jump: NodeRef) -> NodeRef {
    for_(
        vec![local("Integer", "i", Some(int(0)))],
        Some(binary(BinaryOp::Less, name("i"), int(limit))),
        vec![unary(UnaryOp::PostInc, name("i"))],
        block(vec![
            try_(
                block(vec![jump, expr_stmt(compound(BinaryOp::Add, name("n"), int(100)))]),
                vec![],
                Some(block(vec![expr_stmt(unary(UnaryOp::PostInc, name("n")))])),
            ),
        ]),
    )
}

#[test]
fn test_finally_runs_on_continue_and_break() {
    let result = run(
        "Integer",
        vec![
            local("Integer", "n", Some(int(0))),
            // Three continues, each through finally.
            counted_finally_loop(3, cont()),
            // One break, through finally once.
            counted_finally_loop(5, brk()),
            ret(Some(name("n"))),
        ],
    );
    assert_eq!(result.as_integer(), Some(4));
}

#[test]
fn test_abrupt_finally_replaces_the_raised_exception() {
    let result = run(
        "String",
        vec![try_(
            block(vec![throw(new_object("MathException", vec![string("lost")]))]),
            vec![],
            Some(block(vec![ret(Some(string("finally wins")))])),
        )],
    );
    assert_eq!(result.as_str(), Some("finally wins"));

    let result = run(
        "Integer",
        vec![
            while_(
                boolean(true),
                block(vec![try_(
                    block(vec![throw(new_object("MathException", vec![string("lost")]))]),
                    vec![],
                    Some(block(vec![brk()])),
                )]),
            ),
            ret(Some(int(7))),
        ],
    );
    assert_eq!(result.as_integer(), Some(7));
}

// =============================================================================
// Exceptions
// =============================================================================

fn custom_exception() -> NodeRef {
    ClassBuilder::new("InvoiceException")
        .modifiers(PUB)
        .extends("Exception")
        .build()
}

#[test]
fn test_user_exception_is_caught_by_type() {
    let (_, result) = run_with(
        vec![custom_exception()],
        "String",
        vec![try_(
            block(vec![throw(new_object("InvoiceException", vec![string("boom")]))]),
            vec![
                catch("MathException", "e", block(vec![ret(Some(string("math")))])),
                catch(
                    "InvoiceException",
                    "e",
                    block(vec![ret(Some(add(
                        add(call("e.getTypeName", vec![]), string(": ")),
                        call("e.getMessage", vec![]),
                    )))]),
                ),
            ],
            None,
        )],
    );
    assert_eq!(result.unwrap().as_str(), Some("InvoiceException: boom"));
}

#[test]
fn test_uncaught_exceptions_reach_the_host() {
    let (_, result) = run_with(
        vec![custom_exception()],
        "void",
        vec![throw(new_object("InvoiceException", vec![string("late")]))],
    );
    assert_eq!(
        uncaught(result),
        ("InvoiceException".to_string(), "late".to_string())
    );

    let (_, result) = run_with(
        vec![],
        "Integer",
        vec![ret(Some(binary(BinaryOp::Mod, int(1), int(0))))],
    );
    assert_eq!(
        uncaught(result),
        ("System.MathException".to_string(), "Divide by 0".to_string())
    );
}

#[test]
fn test_null_dereference_raises() {
    let (_, result) = run_with(
        vec![],
        "Integer",
        vec![
            local("String", "s", None),
            ret(Some(call("s.length", vec![]))),
        ],
    );
    assert_eq!(
        uncaught(result),
        (
            "System.NullPointerException".to_string(),
            "Attempt to de-reference a null object".to_string()
        )
    );
}

#[test]
fn test_list_index_out_of_bounds() {
    let (_, result) = run_with(
        vec![],
        "Integer",
        vec![
            local("List<Integer>", "xs", Some(new_collection("List<Integer>", vec![int(1)]))),
            ret(Some(index(name("xs"), int(3)))),
        ],
    );
    let (class, _) = uncaught(result);
    assert_eq!(class, "System.ListException");
}

#[test]
fn test_failed_assertion() {
    let (_, result) = run_with(
        vec![],
        "void",
        vec![expr_stmt(call("System.assertEquals", vec![int(1), int(2)]))],
    );
    let (class, _) = uncaught(result);
    assert_eq!(class, "System.AssertException");
}

// =============================================================================
// Object-Oriented Programming
// =============================================================================

fn animals() -> Vec<NodeRef> {
    let animal = ClassBuilder::new("Animal")
        .modifiers(PUB | Modifiers::VIRTUAL)
        .field(PUB, "String", "name", None)
        .constructor(
            MethodBuilder::new("Animal")
                .modifiers(PUB)
                .param("String", "name")
                .body(vec![expr_stmt(assign(name("this.name"), name("name")))]),
        )
        .method(
            MethodBuilder::new("speak")
                .modifiers(PUB | Modifiers::VIRTUAL)
                .returns("String")
                .body(vec![ret(Some(add(name("name"), string(" makes a sound"))))]),
        )
        .method(
            MethodBuilder::new("describe")
                .modifiers(PUB)
                .returns("String")
                .body(vec![ret(Some(call("speak", vec![])))]),
        )
        .build();
    let dog = ClassBuilder::new("Dog")
        .modifiers(PUB)
        .extends("Animal")
        .constructor(
            MethodBuilder::new("Dog")
                .modifiers(PUB)
                .param("String", "name")
                .body(vec![expr_stmt(call("super", vec![name("name")]))]),
        )
        .method(
            MethodBuilder::new("speak")
                .modifiers(PUB | Modifiers::OVERRIDE)
                .returns("String")
                .body(vec![ret(Some(add(name("name"), string(" barks"))))]),
        )
        .method(
            MethodBuilder::new("parent")
                .modifiers(PUB)
                .returns("String")
                .body(vec![ret(Some(call("super.speak", vec![])))]),
        )
        .build();
    vec![animal, dog]
}

#[test]
fn test_virtual_dispatch_through_superclass_method() {
    let (_, result) = run_with(
        animals(),
        "String",
        vec![
            local("Animal", "a", Some(new_object("Dog", vec![string("Rex")]))),
            ret(Some(call("a.describe", vec![]))),
        ],
    );
    assert_eq!(result.unwrap().as_str(), Some("Rex barks"));
}

#[test]
fn test_super_call_is_not_dispatched() {
    let (_, result) = run_with(
        animals(),
        "String",
        vec![
            local("Dog", "d", Some(new_object("Dog", vec![string("Rex")]))),
            ret(Some(call("d.parent", vec![]))),
        ],
    );
    assert_eq!(result.unwrap().as_str(), Some("Rex makes a sound"));
}

#[test]
fn test_constructor_chaining_and_initializers() {
    let point = ClassBuilder::new("Point")
        .modifiers(PUB)
        .field(PUB, "Integer", "x", Some(int(1)))
        .field(PUB, "Integer", "y", None)
        .constructor(MethodBuilder::new("Point").modifiers(PUB).body(vec![
            expr_stmt(call("this", vec![int(5)])),
            expr_stmt(assign(name("y"), add(name("y"), int(1)))),
        ]))
        .constructor(
            MethodBuilder::new("Point")
                .modifiers(PUB)
                .param("Integer", "y")
                .body(vec![expr_stmt(assign(
                    name("this.y"),
                    binary(BinaryOp::Mul, name("y"), int(10)),
                ))]),
        )
        .build();
    let (unit, result) = run_with(
        vec![point],
        "Point",
        vec![ret(Some(new_object("Point", vec![])))],
    );
    let point = result.unwrap();
    assert_eq!(unit.inspect(&point), "Point:[x=1, y=51]");
}

#[test]
fn test_superclass_initializers_run_first() {
    let base = ClassBuilder::new("Base")
        .modifiers(PUB | Modifiers::VIRTUAL)
        .field(PUB, "Integer", "a", Some(int(1)))
        .build();
    let derived = ClassBuilder::new("Derived")
        .modifiers(PUB)
        .extends("Base")
        .field(PUB, "Integer", "b", Some(add(name("a"), int(1))))
        .build();
    let (_, result) = run_with(
        vec![base, derived],
        "Integer",
        vec![ret(Some(field(new_object("Derived", vec![]), "b")))],
    );
    assert_eq!(result.unwrap().as_integer(), Some(2));
}

#[test]
fn test_abstract_class_cannot_be_instantiated() {
    let shape = ClassBuilder::new("Shape")
        .modifiers(PUB | Modifiers::ABSTRACT)
        .build();
    let (_, result) = run_with(
        vec![shape],
        "Object",
        vec![ret(Some(new_object("Shape", vec![])))],
    );
    let err = result.unwrap_err();
    assert!(
        matches!(
            err.as_runtime(),
            Some(RuntimeError::AbstractInstantiation { class, .. }) if class == "Shape"
        ),
        "{err}"
    );
}

#[test]
fn test_overload_selection_uses_argument_types() {
    let fmt = ClassBuilder::new("Fmt")
        .method(
            static_method("show", "String", vec![ret(Some(string("int")))])
                .param("Integer", "i"),
        )
        .method(
            static_method("show", "String", vec![ret(Some(string("double")))])
                .param("Double", "d"),
        )
        .method(
            static_method("show", "String", vec![ret(Some(string("object")))])
                .param("Object", "o"),
        )
        .method(static_method(
            "all",
            "String",
            vec![ret(Some(add(
                add(call("show", vec![int(1)]), call("show", vec![double(2.5)])),
                call("show", vec![string("x")]),
            )))],
        ))
        .build();
    let mut unit = build(vec![fmt]);
    let result = unit.invoke("Fmt.all", &[]).unwrap();
    assert_eq!(result.as_str(), Some("intdoubleobject"));

    // Host arguments select overloads the same way.
    let result = unit.invoke("Fmt.show", &[Value::from(2.0)]).unwrap();
    assert_eq!(result.as_str(), Some("double"));
}

// =============================================================================
// Statics and Properties
// =============================================================================

#[test]
fn test_static_initializers_see_earlier_statics() {
    let config = ClassBuilder::new("Config")
        .field(public_static(), "Integer", "base", Some(int(2)))
        .field(
            public_static(),
            "Integer",
            "scaled",
            Some(binary(BinaryOp::Mul, name("base"), int(3))),
        )
        .build();
    let (_, result) = run_with(vec![config], "Integer", vec![ret(Some(name("Config.scaled")))]);
    assert_eq!(result.unwrap().as_integer(), Some(6));
}

#[test]
fn test_failed_static_initializer_raises_on_every_access() {
    let config = ClassBuilder::new("Cfg")
        .field(
            public_static(),
            "Integer",
            "x",
            Some(binary(BinaryOp::Div, int(1), int(0))),
        )
        .field(public_static(), "Integer", "y", Some(int(5)))
        .build();
    let (mut unit, result) = run_with(vec![config], "Integer", vec![ret(Some(name("Cfg.y")))]);
    let expected = ("System.MathException".to_string(), "Divide by 0".to_string());
    assert_eq!(uncaught(result), expected);
    assert_eq!(uncaught(unit.invoke("Main.run", &[])), expected);
}

fn thermometer() -> NodeRef {
    ClassBuilder::new("Thermometer")
        .modifiers(PUB)
        .property(PUB, "Integer", "celsius", Accessor::Auto, Accessor::Auto)
        .property(
            PUB,
            "Integer",
            "fahrenheit",
            Accessor::Body(vec![ret(Some(add(
                binary(BinaryOp::Div, binary(BinaryOp::Mul, name("celsius"), int(9)), int(5)),
                int(32),
            )))]),
            Accessor::Body(vec![expr_stmt(assign(
                name("celsius"),
                binary(
                    BinaryOp::Div,
                    binary(BinaryOp::Mul, binary(BinaryOp::Sub, name("value"), int(32)), int(5)),
                    int(9),
                ),
            ))]),
        )
        .property(
            PUB,
            "Integer",
            "readings",
            Accessor::Body(vec![ret(Some(ternary(
                binary(BinaryOp::Equal, name("readings"), null()),
                int(0),
                name("readings"),
            )))]),
            Accessor::Auto,
        )
        .build()
}

#[test]
fn test_property_accessors_run_on_access() {
    let (_, result) = run_with(
        vec![thermometer()],
        "Integer",
        vec![
            local("Thermometer", "t", Some(new_object("Thermometer", vec![]))),
            expr_stmt(assign(name("t.fahrenheit"), int(212))),
            ret(Some(add(name("t.celsius"), name("t.fahrenheit")))),
        ],
    );
    assert_eq!(result.unwrap().as_integer(), Some(100 + 212));
}

#[test]
fn test_property_getter_reads_its_own_slot() {
    let (_, result) = run_with(
        vec![thermometer()],
        "Integer",
        vec![
            local("Thermometer", "t", Some(new_object("Thermometer", vec![]))),
            local("Integer", "before", Some(name("t.readings"))),
            expr_stmt(assign(name("t.readings"), int(4))),
            ret(Some(add(name("before"), name("t.readings")))),
        ],
    );
    assert_eq!(result.unwrap().as_integer(), Some(4));
}

// =============================================================================
// Collections and Output
// =============================================================================

#[test]
fn test_map_operations() {
    let result = run(
        "Integer",
        vec![
            local(
                "Map<String, Integer>",
                "m",
                Some(new_map("Map<String, Integer>", vec![(string("a"), int(1))])),
            ),
            expr_stmt(call("m.put", vec![string("b"), int(2)])),
            ret(Some(add(
                add(call("m.get", vec![string("a")]), index(name("m"), string("b"))),
                call("m.size", vec![]),
            ))),
        ],
    );
    assert_eq!(result.as_integer(), Some(5));
}

#[test]
fn test_debug_output_renders_values() {
    let pair = ClassBuilder::new("Pair")
        .modifiers(PUB)
        .field(PUB, "Integer", "x", Some(int(1)))
        .field(PUB, "String", "label", Some(string("n")))
        .build();
    let (mut unit, result) = run_with(
        vec![pair],
        "void",
        vec![
            debug(new_object("Pair", vec![])),
            debug(double(2.0)),
            debug(new_collection("List<Integer>", vec![int(1), int(2)])),
            debug(new_map("Map<String, Integer>", vec![(string("k"), int(3))])),
            debug(null()),
        ],
    );
    result.unwrap();
    assert_eq!(
        unit.take_debug_output(),
        vec!["Pair:[x=1, label=n]", "2.0", "(1, 2)", "{k=3}", "null"]
    );
    assert!(unit.debug_output().is_empty());
}

// =============================================================================
// Triggers
// =============================================================================

fn accounts_context() -> Context {
    let mut ctx = Context::with_default_modules().unwrap();
    ctx.load_schema(&SchemaMap::new().with_object("Account", &[("Name", "String")]))
        .unwrap();
    ctx
}

fn account(unit: &Unit, name: &str) -> Value {
    let store = unit.store();
    let hash = store.lookup_namespace("Schema", "account").unwrap();
    let record = Value::new_object(store.data_type(hash).unwrap());
    record
        .as_object()
        .unwrap()
        .borrow_mut()
        .fields
        .insert("Name", Value::from(name));
    record
}

#[test]
fn test_trigger_sees_context_and_resets_it() {
    let ctx = accounts_context();
    let before_insert = TriggerEvent::new(TriggerTiming::Before, TriggerOperation::Insert);
    let trig = trigger(
        "AccountTrigger",
        "Account",
        vec![before_insert],
        vec![
            for_each("Account", "a", name("Trigger.new"), debug(name("a.Name"))),
            debug(name("Trigger.isBefore")),
            debug(name("Trigger.size")),
            debug(name("Trigger.old")),
        ],
    );
    let outside = ClassBuilder::new("Outside")
        .method(static_method("executing", "Boolean", vec![ret(Some(name("Trigger.isExecuting")))]))
        .build();
    let mut unit = build_with(&ctx, vec![trig, outside]);

    let records = vec![account(&unit, "Acme"), account(&unit, "Globex")];
    let fired = unit
        .fire_trigger("Account", before_insert, records, Vec::new())
        .unwrap();
    assert_eq!(fired, 1);
    assert_eq!(unit.debug_output(), &["Acme", "Globex", "true", "2", "null"]);

    assert!(unit.invoke("Outside.executing", &[]).unwrap().is_null());

    let after_insert = TriggerEvent::new(TriggerTiming::After, TriggerOperation::Insert);
    assert_eq!(
        unit.fire_trigger("Account", after_insert, Vec::new(), Vec::new())
            .unwrap(),
        0
    );
}

// =============================================================================
// Embedded Queries
// =============================================================================

/// Answers every query with one record named after the `who` bind.
struct EchoRunner;

impl QueryRunner for EchoRunner {
    fn run(
        &self,
        request: &QueryRequest<'_>,
        binds: &mut dyn BindEvaluator,
    ) -> Result<Vec<Value>, QueryError> {
        assert_eq!(request.binds, vec!["who"]);
        let who = binds.evaluate("who")?;
        Ok(vec![request.record(&[("Name", who)])])
    }
}

struct FailingRunner;

impl QueryRunner for FailingRunner {
    fn run(
        &self,
        _: &QueryRequest<'_>,
        _: &mut dyn BindEvaluator,
    ) -> Result<Vec<Value>, QueryError> {
        Err(QueryError::Failed("sObject type is not supported".into()))
    }
}

fn query_main() -> NodeRef {
    main_class(
        "String",
        vec![
            local("String", "prefix", Some(string("Ac"))),
            try_(
                block(vec![
                    local(
                        "List<Account>",
                        "found",
                        Some(soql(
                            "SELECT Name FROM Account WHERE Name = :who",
                            "Account",
                            vec![(":who", add(name("prefix"), string("me")))],
                        )),
                    ),
                    ret(Some(field(call("found.get", vec![int(0)]), "Name"))),
                ]),
                vec![catch(
                    "QueryException",
                    "e",
                    block(vec![ret(Some(call("e.getMessage", vec![])))]),
                )],
                None,
            ),
        ],
    )
}

#[test]
fn test_query_binds_are_evaluated_by_the_runner() {
    let mut ctx = accounts_context();
    ctx.set_query_runner(Rc::new(EchoRunner));
    let mut unit = build_with(&ctx, vec![query_main()]);
    assert_eq!(unit.invoke("Main.run", &[]).unwrap().as_str(), Some("Acme"));
}

#[test]
fn test_query_failures_raise_query_exception() {
    let ctx = accounts_context();
    let mut unit = build_with(&ctx, vec![query_main()]);
    assert_eq!(
        unit.invoke("Main.run", &[]).unwrap().as_str(),
        Some("No query runner is configured")
    );

    let mut unit = build_with(&ctx, vec![query_main()]);
    unit.set_query_runner(Rc::new(FailingRunner));
    assert_eq!(
        unit.invoke("Main.run", &[]).unwrap().as_str(),
        Some("sObject type is not supported")
    );
}

// =============================================================================
// Compilation and Limits
// =============================================================================

#[test]
fn test_unknown_names_fail_the_build() {
    let ctx = Context::with_default_modules().unwrap();
    let mut unit = ctx.create_unit();
    unit.add_declaration(main_class(
        "Integer",
        vec![ret(Some(add(name("ghost"), call("nowhere", vec![]))))],
    ))
    .unwrap();
    let err = unit.build().unwrap_err();
    let UnitError::Apex(err) = err else {
        panic!("expected diagnostics, got {err:?}");
    };
    assert_eq!(err.diagnostics().map(|d| d.len()), Some(2));
    assert!(!ctx.is_sealed());
}

/// Messages of a failed build.
fn build_errors(decls: Vec<NodeRef>) -> Vec<String> {
    let ctx = Context::with_default_modules().unwrap();
    let mut unit = ctx.create_unit();
    unit.add_declarations(decls).unwrap();
    let Err(UnitError::Apex(err)) = unit.build() else {
        panic!("expected the build to fail");
    };
    err.diagnostics()
        .map(|d| d.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

#[test]
fn test_wrong_arity_fails_the_build() {
    let main = ClassBuilder::new("Main")
        .method(static_method("one", "Integer", vec![ret(Some(name("x")))]).param("Integer", "x"))
        .method(static_method("run", "Integer", vec![ret(Some(call("one", vec![int(1), int(2)])))]))
        .build();
    let errors = build_errors(vec![main]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(
        errors[0].contains("no overload of `one` accepts (Integer, Integer)"),
        "{}",
        errors[0]
    );
}

#[test]
fn test_ambiguous_null_argument_fails_the_build() {
    let main = ClassBuilder::new("Main")
        .method(static_method("f", "String", vec![ret(Some(string("s")))]).param("String", "s"))
        .method(static_method("f", "String", vec![ret(Some(string("i")))]).param("Integer", "i"))
        .method(static_method("run", "String", vec![ret(Some(call("f", vec![null()])))]))
        .build();
    let errors = build_errors(vec![main]);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("is ambiguous"), "{}", errors[0]);
}

#[test]
fn test_call_depth_limit() {
    let ctx = Context::with_config(EngineConfig::default().with_max_call_depth(32)).unwrap();
    let recurse = ClassBuilder::new("Deep")
        .method(
            static_method(
                "down",
                "Integer",
                vec![ret(Some(call("down", vec![add(name("n"), int(1))])))],
            )
            .param("Integer", "n"),
        )
        .build();
    let mut unit = build_with(&ctx, vec![recurse]);
    let err = unit.invoke("Deep.down", &[Value::from(0i64)]).unwrap_err();
    assert_eq!(
        err.as_runtime(),
        Some(&RuntimeError::CallDepthExceeded { limit: 32 })
    );
}

#[test]
fn test_step_limit() {
    let ctx = Context::with_config(EngineConfig::default().with_max_steps(1_000)).unwrap();
    let mut unit = build_with(
        &ctx,
        vec![main_class("void", vec![while_(boolean(true), block(vec![]))])],
    );
    let err = unit.invoke("Main.run", &[]).unwrap_err();
    assert_eq!(
        err.as_runtime(),
        Some(&RuntimeError::StepLimitExceeded { limit: 1_000 })
    );
}
