use crate::objects::Object;
use crate::virtual_machine::{InterpretResult, Vm};
use std::rc::Rc;

/// Interprets a source string on a fresh machine.
fn run(src: &str) -> (Vm, InterpretResult) {
    let mut vm = Vm::new();
    let result = vm.interpret(src);
    (vm, result)
}

/// Interprets a source string that is expected to succeed. A well-typed
/// program has a net stack effect of zero, so the stack must be empty
/// afterwards.
fn run_ok(src: &str) -> Vm {
    let (vm, result) = run(src);

    assert_eq!(result, InterpretResult::Ok);
    assert!(vm.stack.is_empty(), "a clean program leaves the stack empty");

    vm
}

/// Gets a global variable out of the machine after interpretation.
fn global(vm: &Vm, name: &str) -> Object {
    match vm.globals.get(name) {
        Some(obj) => obj.clone(),
        None => panic!("Global '{}' was not defined.", name),
    }
}

fn global_number(vm: &Vm, name: &str) -> f64 {
    match global(vm, name) {
        Object::Number(n) => n,
        other => panic!("Global '{}' is a {}, not a number.", name, other.type_name()),
    }
}

fn global_bool(vm: &Vm, name: &str) -> bool {
    match global(vm, name) {
        Object::Bool(b) => b,
        other => panic!("Global '{}' is a {}, not a bool.", name, other.type_name()),
    }
}

fn global_string(vm: &Vm, name: &str) -> Rc<str> {
    match global(vm, name) {
        Object::String(s) => s,
        other => panic!("Global '{}' is a {}, not a string.", name, other.type_name()),
    }
}

#[test]
fn arithmetic_respects_precedence() {
    let vm = run_ok("var r = 1 + 2 * 3;");
    assert_eq!(global_number(&vm, "r"), 7.0);

    let vm = run_ok("var r = (1 + 2) * 3;");
    assert_eq!(global_number(&vm, "r"), 9.0);

    let vm = run_ok("var r = -4 / 2 - 1;");
    assert_eq!(global_number(&vm, "r"), -3.0);
}

#[test]
fn strings_concatenate_and_share_one_allocation() {
    let vm = run_ok(
        "var a = \"foo\";\n\
         var b = \"bar\";\n\
         var c = a + b;\n\
         var d = \"foo\" + \"bar\";",
    );

    let c = global_string(&vm, "c");
    let d = global_string(&vm, "d");

    assert_eq!(&*c, "foobar");
    // Equal content means one interned heap object.
    assert!(Rc::ptr_eq(&c, &d));
}

#[test]
fn string_literals_are_interned() {
    let vm = run_ok("var x = \"same\"; var y = \"same\";");

    let x = global_string(&vm, "x");
    let y = global_string(&vm, "y");

    assert!(Rc::ptr_eq(&x, &y));
}

#[test]
fn for_loop_accumulates() {
    let vm = run_ok("var x = 0; for (var i = 0; i < 5; i = i + 1) x = x + i;");
    assert_eq!(global_number(&vm, "x"), 10.0);
}

#[test]
fn for_loop_clauses_are_optional() {
    // No initializer and no increment: the condition alone drives
    // the loop.
    let vm = run_ok(
        "var i = 0;\n\
         for (; i < 3;) {\n\
             i = i + 1;\n\
         }",
    );
    assert_eq!(global_number(&vm, "i"), 3.0);

    // No condition: vacuously true, so the body must leave the loop by
    // returning out of the enclosing function.
    let vm = run_ok(
        "var n = 0;\n\
         fun bump() {\n\
             for (var i = 0; ; i = i + 1) {\n\
                 if (i == 4) return n;\n\
                 n = n + 1;\n\
             }\n\
         }\n\
         var r = bump();",
    );
    assert_eq!(global_number(&vm, "n"), 4.0);
    assert_eq!(global_number(&vm, "r"), 4.0);
}

#[test]
fn while_loop_runs_to_completion() {
    let vm = run_ok("var n = 1; while (n < 100) n = n * 2;");
    assert_eq!(global_number(&vm, "n"), 128.0);
}

#[test]
fn if_else_picks_the_right_branch() {
    let vm = run_ok("var r = \"x\"; if (1 > 2) r = \"then\"; else r = \"else\";");
    assert_eq!(&*global_string(&vm, "r"), "else");

    let vm = run_ok("var r = \"x\"; if (1 < 2) r = \"then\"; else r = \"else\";");
    assert_eq!(&*global_string(&vm, "r"), "then");
}

#[test]
fn only_nil_and_false_are_falsey_in_conditions() {
    let vm = run_ok(
        "var r = 0;\n\
         if (nil) r = r + 1;\n\
         if (false) r = r + 1;\n\
         if (0) r = r + 2;\n\
         if (\"\") r = r + 4;",
    );

    // `0` and the empty string are truthy.
    assert_eq!(global_number(&vm, "r"), 6.0);
}

#[test]
fn logical_operators_short_circuit_to_values() {
    let vm = run_ok(
        "var a = nil or \"y\";\n\
         var b = false and 1;\n\
         var c = 1 and 2;\n\
         var d = \"q\" or 1;\n\
         var e = false or nil;",
    );

    // The operators yield one of their operand values, not a boolean.
    assert_eq!(&*global_string(&vm, "a"), "y");
    assert!(matches!(global(&vm, "b"), Object::Bool(false)));
    assert_eq!(global_number(&vm, "c"), 2.0);
    assert_eq!(&*global_string(&vm, "d"), "q");
    assert!(matches!(global(&vm, "e"), Object::Nil));
}

#[test]
fn comparison_and_equality_laws_hold() {
    let vm = run_ok(
        "var lt = 1 < 2;\n\
         var le = 2 <= 2;\n\
         var gt = 1 > 2;\n\
         var ge = 1 >= 2;\n\
         var eq = 1 == 1;\n\
         var ne = 1 != 1;\n\
         var dual = (1 == 2) == !(1 != 2);\n\
         var nil_eq = nil == nil;\n\
         var mixed = 1 == \"1\";\n\
         var str_eq = \"a\" + \"b\" == \"ab\";",
    );

    assert!(global_bool(&vm, "lt"));
    assert!(global_bool(&vm, "le"));
    assert!(!global_bool(&vm, "gt"));
    assert!(!global_bool(&vm, "ge"));
    assert!(global_bool(&vm, "eq"));
    assert!(!global_bool(&vm, "ne"));
    assert!(global_bool(&vm, "dual"));
    assert!(global_bool(&vm, "nil_eq"));
    assert!(!global_bool(&vm, "mixed"));
    assert!(global_bool(&vm, "str_eq"));
}

#[test]
fn block_scopes_shadow_and_restore() {
    let vm = run_ok(
        "var r = \"\";\n\
         var a = \"outer\";\n\
         {\n\
             var a = \"inner\";\n\
             r = r + a;\n\
         }\n\
         r = r + a;",
    );

    assert_eq!(&*global_string(&vm, "r"), "innerouter");
}

#[test]
fn functions_take_arguments_and_return_values() {
    let vm = run_ok("fun add(a, b) { return a + b; } var r = add(1, 2);");
    assert_eq!(global_number(&vm, "r"), 3.0);

    // A function without a `return` yields nil.
    let vm = run_ok("fun noop() {} var r = noop();");
    assert!(matches!(global(&vm, "r"), Object::Nil));
}

#[test]
fn recursion_reaches_the_base_case() {
    let vm = run_ok(
        "fun fib(n) {\n\
             if (n < 2) return n;\n\
             return fib(n - 1) + fib(n - 2);\n\
         }\n\
         var r = fib(10);",
    );

    assert_eq!(global_number(&vm, "r"), 55.0);
}

#[test]
fn closures_capture_function_locals() {
    let vm = run_ok(
        "fun make(x) {\n\
             fun get() {\n\
                 return x;\n\
             }\n\
             return get;\n\
         }\n\
         var g = make(42);\n\
         var r = g();",
    );

    assert_eq!(global_number(&vm, "r"), 42.0);
}

#[test]
fn counter_closure_keeps_private_state() {
    let vm = run_ok(
        "fun counter() {\n\
             var n = 0;\n\
             fun inc() {\n\
                 n = n + 1;\n\
                 return n;\n\
             }\n\
             return inc;\n\
         }\n\
         var c = counter();\n\
         var r1 = c();\n\
         var r2 = c();\n\
         var r3 = c();",
    );

    assert_eq!(global_number(&vm, "r1"), 1.0);
    assert_eq!(global_number(&vm, "r2"), 2.0);
    assert_eq!(global_number(&vm, "r3"), 3.0);

    // Two counters never share state.
    let vm = run_ok(
        "fun counter() {\n\
             var n = 0;\n\
             fun inc() {\n\
                 n = n + 1;\n\
                 return n;\n\
             }\n\
             return inc;\n\
         }\n\
         var c1 = counter();\n\
         var c2 = counter();\n\
         c1();\n\
         var r1 = c1();\n\
         var r2 = c2();",
    );

    assert_eq!(global_number(&vm, "r1"), 2.0);
    assert_eq!(global_number(&vm, "r2"), 1.0);
}

#[test]
fn captures_thread_through_nested_closures() {
    let vm = run_ok(
        "fun outer() {\n\
             var x = \"deep\";\n\
             fun middle() {\n\
                 fun inner() {\n\
                     return x;\n\
                 }\n\
                 return inner;\n\
             }\n\
             return middle;\n\
         }\n\
         var r = outer()()();",
    );

    // `inner` reaches `x` through `middle`'s capture, two frames up
    // from where it runs.
    assert_eq!(&*global_string(&vm, "r"), "deep");
}

#[test]
fn closed_upvalue_sees_the_last_write_before_close() {
    let vm = run_ok(
        "var get;\n\
         {\n\
             var a = 1;\n\
             fun g() {\n\
                 return a;\n\
             }\n\
             get = g;\n\
             a = 99;\n\
         }\n\
         var r = get();",
    );

    assert_eq!(global_number(&vm, "r"), 99.0);
}

#[test]
fn sibling_closures_share_one_upvalue_cell() {
    let vm = run_ok(
        "var set;\n\
         var get;\n\
         {\n\
             var a = 1;\n\
             fun s(v) {\n\
                 a = v;\n\
             }\n\
             fun g() {\n\
                 return a;\n\
             }\n\
             set = s;\n\
             get = g;\n\
         }\n\
         set(5);\n\
         var r = get();",
    );

    // Writing through one closure after the variable left scope is
    // visible through the other: both captured the same cell.
    assert_eq!(global_number(&vm, "r"), 5.0);
}

#[test]
fn distinct_block_locals_get_distinct_cells() {
    let vm = run_ok(
        "var g1;\n\
         var g2;\n\
         {\n\
             var a = 1;\n\
             var b = 2;\n\
             fun fa() {\n\
                 return a;\n\
             }\n\
             fun fb() {\n\
                 return b;\n\
             }\n\
             g1 = fa;\n\
             g2 = fb;\n\
         }\n\
         var r1 = g1();\n\
         var r2 = g2();",
    );

    assert_eq!(global_number(&vm, "r1"), 1.0);
    assert_eq!(global_number(&vm, "r2"), 2.0);
}

#[test]
fn long_constant_loads_run_end_to_end() {
    let mut src = String::from("var total = 0.5");
    for i in 1..300 {
        src += &format!(" + {}.5", i);
    }
    src += ";";

    let vm = run_ok(&src);

    // sum of i + 0.5 for i in 0..300
    assert_eq!(global_number(&vm, "total"), 45_000.0);
}

#[test]
fn globals_persist_across_interpret_calls() {
    let mut vm = Vm::new();

    assert_eq!(vm.interpret("var a = 1;"), InterpretResult::Ok);
    assert_eq!(vm.interpret("var b = a + 1;"), InterpretResult::Ok);

    assert_eq!(global_number(&vm, "b"), 2.0);
}

#[test]
fn compile_errors_are_reported_as_such() {
    let (_, result) = run("1 +;");
    assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn unary_type_error_aborts_the_program() {
    let (vm, result) = run("print -true;");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert!(vm.stack.is_empty(), "the stack is reset after a runtime error");
}

#[test]
fn binary_type_errors_abort_the_program() {
    let (_, result) = run("var r = 1 + \"a\";");
    assert_eq!(result, InterpretResult::RuntimeError);

    let (_, result) = run("var r = \"a\" < \"b\";");
    assert_eq!(result, InterpretResult::RuntimeError);

    let (_, result) = run("var r = 1 + nil;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn undefined_globals_are_runtime_errors() {
    let (_, result) = run("print missing;");
    assert_eq!(result, InterpretResult::RuntimeError);

    let (_, result) = run("missing = 1;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn only_functions_are_callable() {
    let (_, result) = run("var a = 1; a();");
    assert_eq!(result, InterpretResult::RuntimeError);

    let (_, result) = run("\"not a function\"();");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn arity_is_checked_at_call_time() {
    let (_, result) = run("fun f(a) {} f();");
    assert_eq!(result, InterpretResult::RuntimeError);

    let (_, result) = run("fun f() {} f(1);");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn runaway_recursion_overflows_the_frame_stack() {
    let (_, result) = run("fun f() { f(); } f();");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn clock_native_reports_elapsed_seconds() {
    let vm = run_ok("var t = clock();");

    let t = global_number(&vm, "t");
    assert!(t >= 0.0);
    assert!(t < 60.0, "a fresh machine cannot be minutes old");
}

#[test]
fn read_number_rejects_bad_arguments_without_reading() {
    // A non-string prompt and a bad argument count both yield 0 without
    // touching stdin.
    let vm = run_ok("var n = read_number(1); var m = read_number(1, 2);");

    assert_eq!(global_number(&vm, "n"), 0.0);
    assert_eq!(global_number(&vm, "m"), 0.0);
}

#[test]
fn functions_and_natives_print_their_forms() {
    let vm = run_ok("fun foo() {} var f = foo;");

    assert_eq!(format!("{}", global(&vm, "f")), "<fn foo>");
    assert_eq!(format!("{}", global(&vm, "clock")), "<native fn>");
}

#[test]
fn uninitialized_variables_default_to_nil() {
    let vm = run_ok("var u;");
    assert!(matches!(global(&vm, "u"), Object::Nil));
}
