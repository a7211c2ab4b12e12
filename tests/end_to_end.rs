//! Whole-pipeline tests: compile source, serialize the container, load it
//! into a fresh VM and run, asserting on captured output.

use microphp::{compile_source, Vm};

/// Compile and run, returning (run result, captured stdout).
fn run(source: &str) -> (Result<(), String>, String) {
    let module = compile_source(source).expect("compile failed");
    let mut vm = Vm::new(Vec::new());
    vm.load_bytecode(&module.to_bytes()).expect("load failed");
    let result = vm.run().map(|_| ()).map_err(|e| e.to_string());
    let output = String::from_utf8(vm.into_output()).expect("stdout not utf-8");
    (result, output)
}

fn run_ok(source: &str) -> String {
    let (result, output) = run(source);
    result.expect("run failed");
    output
}

fn run_err(source: &str) -> (String, String) {
    let (result, output) = run(source);
    (result.expect_err("run unexpectedly succeeded"), output)
}

// ==================== The specified scenarios ====================

#[test]
fn prints_a_sum() {
    assert_eq!(run_ok("print(1+2);"), "3\n");
}

#[test]
fn for_loop_accumulates() {
    assert_eq!(
        run_ok("var x = 0; for (var i=0; i<5; i=i+1) { x = x + i; } print(x);"),
        "10\n"
    );
}

#[test]
fn user_function_call() {
    assert_eq!(
        run_ok("function add(a,b){ return a+b; } print(add(2,3));"),
        "5\n"
    );
}

#[test]
fn array_literal_indexing() {
    assert_eq!(run_ok("var a = [10,20,30]; print(a[1]);"), "20\n");
}

#[test]
fn division_by_zero_halts_cleanly() {
    let (error, output) = run_err("print(1/0);");
    assert_eq!(error, "division by zero");
    assert_eq!(output, "");
}

#[test]
fn bad_magic_leaves_vm_unloaded() {
    let mut vm = Vm::new(Vec::new());
    let err = vm
        .load_bytecode(b"XYZ\0\x01\x00\x00\x00")
        .expect_err("load unexpectedly succeeded");
    assert_eq!(err.to_string(), "invalid magic");
    assert_eq!(vm.last_error(), Some("invalid magic"));

    let err = vm.run().expect_err("run unexpectedly succeeded");
    assert_eq!(err.to_string(), "no module loaded");
    assert_eq!(vm.last_error(), Some("no module loaded"));
}

// ==================== Language semantics ====================

#[test]
fn echo_behaves_like_print() {
    assert_eq!(run_ok("echo 1+2;"), "3\n");
    assert_eq!(run_ok("echo \"a\", \"b\";"), "ab\n");
}

#[test]
fn while_loop() {
    assert_eq!(
        run_ok("var n = 3; while (n > 0) { print(n); n = n - 1; }"),
        "3\n2\n1\n"
    );
}

#[test]
fn foreach_visits_in_order() {
    assert_eq!(
        run_ok("foreach ([10, 20, 30] as v) { print(v); }"),
        "10\n20\n30\n"
    );
}

#[test]
fn foreach_over_variable() {
    assert_eq!(
        run_ok("var xs = [1, 2]; var sum = 0; foreach (xs as x) { sum = sum + x; } print(sum);"),
        "3\n"
    );
}

#[test]
fn ternary_expression() {
    assert_eq!(run_ok("print(1 < 2 ? \"yes\" : \"no\");"), "yes\n");
    assert_eq!(run_ok("print(1 > 2 ? \"yes\" : \"no\");"), "no\n");
}

#[test]
fn short_circuit_skips_right_side() {
    // boom() would divide by zero if evaluated
    assert_eq!(
        run_ok("function boom(){ return 1/0; } print(false && boom());"),
        "false\n"
    );
    assert_eq!(
        run_ok("function boom(){ return 1/0; } print(true || boom());"),
        "true\n"
    );
    assert_eq!(run_ok("print(1 && 2);"), "true\n");
    assert_eq!(run_ok("print(0 || \"\");"), "false\n");
}

#[test]
fn string_concat_coerces() {
    assert_eq!(run_ok("print(\"x\" . 1 . 2.5);"), "x12.5\n");
    assert_eq!(run_ok("print(\"v=\" . true . null . 7);"), "v=17\n");
}

#[test]
fn numeric_strings_coerce_in_arithmetic() {
    assert_eq!(run_ok("print(\"2\" * 3);"), "6\n");
    assert_eq!(run_ok("print(\"1.5\" + 1);"), "2.5\n");
}

#[test]
fn integer_division_truncates_and_floats_widen() {
    assert_eq!(run_ok("print(7 / 2);"), "3\n");
    assert_eq!(run_ok("print(7.0 / 2);"), "3.5\n");
    assert_eq!(run_ok("print(7 % 3);"), "1\n");
}

#[test]
fn compound_assignment() {
    assert_eq!(run_ok("var x = 10; x += 5; x *= 2; x -= 6; print(x);"), "24\n");
    assert_eq!(run_ok("var x = 7; x /= 2; print(x);"), "3\n");
    assert_eq!(run_ok("var x = 7; x %= 4; print(x);"), "3\n");
}

#[test]
fn pre_and_post_increment() {
    assert_eq!(run_ok("var i = 5; print(i++); print(i);"), "5\n6\n");
    assert_eq!(run_ok("var i = 5; print(++i); print(i);"), "6\n6\n");
    assert_eq!(run_ok("var i = 5; print(--i); print(i--); print(i);"), "4\n4\n3\n");
}

#[test]
fn increment_on_globals() {
    assert_eq!(run_ok("g = 1; print(g++); print(++g); print(g);"), "1\n3\n3\n");
}

#[test]
fn indexed_assignment() {
    assert_eq!(run_ok("var a = [1, 2]; a[0] = 9; print(a[0]);"), "9\n");
    // index == size appends
    assert_eq!(run_ok("var a = [1, 2]; a[2] = 7; print(a[2]);"), "7\n");
    assert_eq!(run_ok("var a = [1, 2]; a[1] += 3; print(a[1]);"), "5\n");
    assert_eq!(run_ok("var a = [1, 2]; print(a[0] = 42);"), "42\n");
}

#[test]
fn nested_index_reads() {
    assert_eq!(run_ok("var m = [[1, 2], [3, 4]]; print(m[1][0]);"), "3\n");
}

#[test]
fn recursion() {
    assert_eq!(
        run_ok("function fib(n) { return n < 2 ? n : fib(n-1) + fib(n-2); } print(fib(10));"),
        "55\n"
    );
}

#[test]
fn functions_can_be_called_before_definition() {
    assert_eq!(run_ok("print(add(2,3)); function add(a,b){ return a+b; }"), "5\n");
}

#[test]
fn globals_are_visible_inside_functions() {
    assert_eq!(
        run_ok("x = 5; function f() { return x + 1; } print(f());"),
        "6\n"
    );
}

#[test]
fn locals_shadow_globals() {
    assert_eq!(
        run_ok("x = 5; function f() { var x = 1; return x; } print(f()); print(x);"),
        "1\n5\n"
    );
}

#[test]
fn bare_return_yields_null() {
    assert_eq!(run_ok("function f() { return; } print(f());"), "NULL\n");
    assert_eq!(run_ok("function f() { } print(f());"), "NULL\n");
}

#[test]
fn print_canonical_forms() {
    assert_eq!(run_ok("print(true); print(false); print(null);"), "true\nfalse\nNULL\n");
    assert_eq!(run_ok("print([1,2,3]);"), "Array(3)\n");
    assert_eq!(run_ok("print(2.0); print(-0.25);"), "2\n-0.25\n");
}

// ==================== Builtins ====================

#[test]
fn count_and_strlen_builtins() {
    assert_eq!(run_ok("print(count([1,2,3]));"), "3\n");
    assert_eq!(run_ok("print(strlen(\"hello\"));"), "5\n");
}

#[test]
fn array_push_builtin_returns_extended_array() {
    assert_eq!(
        run_ok("var a = [1]; a = array_push(a, 2, 3); print(count(a)); print(a[2]);"),
        "3\n3\n"
    );
}

#[test]
fn millis_is_an_integer() {
    assert_eq!(run_ok("print(millis() >= 0);"), "true\n");
}

#[test]
fn rand_within_bounds() {
    assert_eq!(
        run_ok("var r = rand(2, 4); print(r >= 2 && r <= 4);"),
        "true\n"
    );
}

#[test]
fn custom_builtin_through_the_registry() {
    let module = compile_source("print(answer());").expect("compile failed");
    let mut vm = Vm::new(Vec::new());
    vm.register_builtin("answer", |_out, _args| {
        Ok(microphp::runtime::Value::Integer(42))
    });
    vm.load_bytecode(&module.to_bytes()).expect("load failed");
    vm.run().expect("run failed");
    assert_eq!(String::from_utf8(vm.into_output()).expect("utf8"), "42\n");
}

#[test]
fn builtin_errors_unwind_like_runtime_errors() {
    let (error, output) = run_err("print(count(1));");
    assert!(error.contains("count() expects an array"));
    assert_eq!(output, "");
}

// ==================== Runtime errors ====================

#[test]
fn arity_mismatch() {
    let (error, _) = run_err("function add(a,b){ return a+b; } print(add(1));");
    assert_eq!(error, "add() expects 2 arguments, 1 given");
}

#[test]
fn unknown_function() {
    let (error, _) = run_err("nope();");
    assert_eq!(error, "call to unknown function 'nope'");
}

#[test]
fn array_index_out_of_bounds() {
    let (error, _) = run_err("var a = [1]; print(a[5]);");
    assert_eq!(error, "array index 5 out of bounds (size 1)");
}

#[test]
fn indexing_a_non_array_is_a_type_error() {
    let (error, _) = run_err("var x = 1; print(x[0]);");
    assert!(error.contains("is not an array"));
}

#[test]
fn non_numeric_arithmetic_is_a_type_error() {
    let (error, _) = run_err("print(\"abc\" + 1);");
    assert!(error.contains("Non-numeric string"));
    let (error, _) = run_err("print([1] + 1);");
    assert!(error.contains("arithmetic"));
}

#[test]
fn deep_recursion_overflows_cleanly() {
    let (error, _) = run_err("function f(n) { return f(n + 1); } f(0);");
    assert_eq!(error, "call stack overflow");
}

#[test]
fn runtime_error_is_recorded_in_last_error() {
    let module = compile_source("print(1/0);").expect("compile failed");
    let mut vm = Vm::new(Vec::new());
    vm.load_bytecode(&module.to_bytes()).expect("load failed");
    assert!(vm.run().is_err());
    assert_eq!(vm.last_error(), Some("division by zero"));
    // The stack was torn down cleanly
    assert!(vm.stack().is_empty());
}

// ==================== Embedding behaviors ====================

#[test]
fn reset_retains_module_and_reruns() {
    let module = compile_source("print(\"tick\");").expect("compile failed");
    let mut vm = Vm::new(Vec::new());
    vm.load_bytecode(&module.to_bytes()).expect("load failed");
    vm.run().expect("first run failed");
    vm.reset();
    assert_eq!(vm.last_error(), None);
    vm.run().expect("second run failed");
    assert_eq!(String::from_utf8(vm.into_output()).expect("utf8"), "tick\ntick\n");
}

#[test]
fn cancellation_unwinds_with_typed_error() {
    let module = compile_source("while (true) { }").expect("compile failed");
    let mut vm = Vm::new(Vec::new());
    vm.load_bytecode(&module.to_bytes()).expect("load failed");
    vm.cancel_handle().store(true, std::sync::atomic::Ordering::Relaxed);
    let err = vm.run().expect_err("run unexpectedly succeeded");
    assert_eq!(err.to_string(), "cancelled");
    assert_eq!(vm.last_error(), Some("cancelled"));
}

#[test]
fn same_module_runs_deterministically() {
    let source = "var a = [3, 1, 2]; var s = 0; foreach (a as v) { s = s * 10 + v; } print(s);";
    let first = run_ok(source);
    let second = run_ok(source);
    assert_eq!(first, second);
    assert_eq!(first, "312\n");
}
