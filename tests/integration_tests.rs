use lox::{Config, ErrorKind, Interpreter, Phase, Value};

fn assert_native(args: &[Value]) -> Result<Value, String> {
    if args[0].is_truthy() {
        Ok(Value::Nil)
    } else {
        Err("assertion failed".into())
    }
}

fn assert_eq_native(args: &[Value]) -> Result<Value, String> {
    if args[0] == args[1] {
        Ok(Value::Nil)
    } else {
        Err(format!("{} != {}", args[0], args[1]))
    }
}

fn interpreter() -> Interpreter<Vec<u8>> {
    let mut interpreter = Interpreter::new(Vec::new());
    interpreter.define_native("assert", 1, assert_native);
    interpreter.define_native("assert_eq", 2, assert_eq_native);
    interpreter
}

/// Runs `source` and returns everything it printed. Panics on any error.
fn interpret(source: &str) -> String {
    let mut interpreter = interpreter();
    if let Err(errors) = interpreter.eval(source) {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        panic!("{}", messages.join("\n"));
    }
    String::from_utf8(interpreter.into_output()).unwrap()
}

#[test]
#[should_panic]
fn smoke_assert() {
    interpret(
        r#"
        assert(false);"#,
    );
}

#[test]
#[should_panic]
fn smoke_assert_eq() {
    interpret(
        r#"
        assert_eq(1, 2);"#,
    );
}

#[test]
fn variables() {
    interpret(
        r#"
        var x = 1;
        assert_eq(x, 1);
        var y = x + 1;
        assert_eq(y, 2);
        assert_eq(y, x + 1);
        x = 10;
        assert_eq(x, 10);
        var z;
        assert_eq(z, nil);"#,
    );
}

#[test]
fn comments() {
    interpret(
        r#"
        var x = 1; // a comment
        // another one
        assert_eq(x, 1);"#,
    );
}

#[test]
fn print_output() {
    let output = interpret(
        r#"
        print "one";
        print 1 + 1;
        print 3 / 2;
        print nil;
        print !true;"#,
    );
    assert_eq!(output, "one\n2\n1.5\nnil\nfalse\n");
}

#[test]
fn multiline_string() {
    let output = interpret("var s = \"a\nb\";\nprint s;");
    assert_eq!(output, "a\nb\n");
}

mod control_flow {
    use super::*;

    #[test]
    fn if_else() {
        interpret(
            r#"
            var result;
            if (1 < 2) result = "then"; else result = "else";
            assert_eq(result, "then");
            if (nil) result = "then"; else result = "else";
            assert_eq(result, "else");"#,
        );
    }

    #[test]
    fn while_loop() {
        interpret(
            r#"
            var sum = 0;
            var i = 1;
            while (i <= 10) {
                sum = sum + i;
                i = i + 1;
            }
            assert_eq(sum, 55);"#,
        );
    }

    #[test]
    fn for_loop() {
        let output = interpret(
            r#"
            var a = 0;
            var temp;
            for (var b = 1; a < 50; b = temp + b) {
                print a;
                temp = a;
                a = b;
            }"#,
        );
        assert_eq!(output, "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n");
    }

    #[test]
    fn for_loop_without_clauses() {
        interpret(
            r#"
            fun firstOver(limit) {
                var i = 0;
                for (;;) {
                    if (i * i > limit) return i;
                    i = i + 1;
                }
            }
            assert_eq(firstOver(50), 8);"#,
        );
    }
}

mod functions {
    use super::*;

    #[test]
    fn functions() {
        interpret(
            r#"
            fun foo() {
                return 1;
            }
            assert_eq(foo(), 1);"#,
        );
    }

    #[test]
    fn functions_with_params() {
        interpret(
            r#"
            fun double(x) {
                var result = x * 2;
                return result;
            }
            assert_eq(double(10), 20);
            assert_eq(double(-2), -4);"#,
        );
    }

    #[test]
    fn functions_implicit_return() {
        interpret(
            r#"
            fun foo() { }
            assert_eq(foo(), nil);"#,
        );
    }

    #[test]
    fn higher_order_function() {
        interpret(
            r#"
            fun twice(f, v) {
                return f(f(v));
            }
            fun double(x) {
                return x * 2;
            }

            assert_eq(twice(double, 10), 40);
            assert_eq(twice(double, -2), -8);"#,
        );
    }

    #[test]
    fn closures() {
        interpret(
            r#"
            fun createAdder(x) {
                fun adder(y) {
                    return x + y;
                }
                return adder;
            }
            var addTwo = createAdder(2);
            assert_eq(addTwo(1), 3);"#,
        );
        interpret(
            r#"
            fun compose(f, g) {
                fun func(x) {
                    return f(g(x));
                }
                return func;
            }
            fun addOne(x) { return x + 1; }
            fun addTwo(x) { return x + 2; }
            assert_eq(compose(addOne, addTwo)(2), 5);"#,
        );
    }

    #[test]
    fn closure_sees_later_assignments() {
        interpret(
            r#"
            var x = "before";
            fun show() { return x; }
            x = "after";
            assert_eq(show(), "after");"#,
        );
    }

    #[test]
    fn function_identity() {
        interpret(
            r#"
            fun a() {}
            fun b() {}
            var alias = a;
            assert_eq(a, alias);
            assert(a != b);"#,
        );
    }

    #[test]
    fn recursion() {
        interpret(
            r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            assert_eq(fib(10), 55);"#,
        );
    }
}

mod errors {
    use super::*;

    fn errors(source: &str) -> Vec<lox::Error> {
        interpreter().eval(source).unwrap_err()
    }

    #[test]
    fn scan_errors_are_all_reported() {
        let errors = errors("var a = @;\nvar b = #;");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.phase() == Phase::Scan));
        assert_eq!(errors[0].to_string(), "[line 1] scan error: Unexpected character '@'.");
        assert_eq!(errors[1].line, 2);
    }

    #[test]
    fn parse_error_runs_nothing() {
        let mut interpreter = interpreter();
        let errors = interpreter.eval("print 1;\nprint 2").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].phase(), Phase::Parse);
        assert_eq!(errors[0].line, 2);
        assert!(interpreter.output().is_empty());
    }

    #[test]
    fn runtime_error_location() {
        let errors = errors("var a = 1;\n\nvar b = a + \"x\";");
        assert_eq!(errors[0].kind, ErrorKind::InvalidAddOperands);
        assert_eq!(errors[0].line, 3);
    }

    #[test]
    fn top_level_return() {
        let errors = errors("return 1;");
        assert_eq!(errors[0].kind, ErrorKind::ReturnOutsideFunction);
        assert_eq!(errors[0].phase(), Phase::Parse);
    }

    #[test]
    fn unbounded_recursion() {
        let mut interpreter = Interpreter::with_config(Vec::new(), Config { max_call_depth: 100 });
        let errors = interpreter
            .eval("fun loop() { loop(); } loop();")
            .unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::StackOverflow(100));
    }

    #[test]
    fn deeply_nested_source_is_rejected() {
        let n = 100_000;
        let sources = [
            format!("print {}1;", "-".repeat(n)),
            format!("var a = 1; {}print a;{}", "{".repeat(n), "}".repeat(n)),
            format!("print 1{};", " + 1".repeat(n)),
        ];

        for source in &sources {
            let errors = errors(source);
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0].kind, ErrorKind::TooDeeplyNested(_)));
            assert_eq!(errors[0].phase(), Phase::Parse);
        }
    }

    #[test]
    fn moderate_nesting_runs() {
        let output = interpret(&format!(
            "var a = 1; {}print a + {}1;{}",
            "{".repeat(300),
            "-".repeat(300),
            "}".repeat(300)
        ));
        assert_eq!(output, "2\n");
    }
}

#[test]
fn session_keeps_state() {
    let mut interpreter = interpreter();
    interpreter.eval("var count = 0;").unwrap();
    interpreter
        .eval("fun bump() { count = count + 1; return count; }")
        .unwrap();
    interpreter.eval("bump(); bump();").unwrap();

    assert_eq!(interpreter.eval_expr_str("count"), Ok(Value::Number(2.0)));
    assert_eq!(interpreter.eval_expr_str("bump()"), Ok(Value::Number(3.0)));
}
