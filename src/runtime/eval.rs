use std::{cell::RefCell, io::Write, mem, rc::Rc};

use super::{
    builtin,
    env::Environment,
    value::{Callable, NativeFn, NativeFnPtr, UserFn, Value},
};
use crate::{
    config::Config,
    error::{Error, ErrorKind, PResult},
    stack::ensure_sufficient_stack,
    syntax::{self, BinaryOp, Expression, LogicalOp, Parser, Statement, UnaryOp},
};

/// How a statement finished executing.
#[derive(Debug)]
enum Flow {
    Normal,
    /// A `return` unwinding to the innermost function call.
    Return { value: Value, line: usize },
}

/// Tree-walking evaluator. `print` output goes to `W`.
///
/// One interpreter keeps its globals between calls to [`Interpreter::eval`],
/// which is what lets a REPL build on earlier lines.
pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    env: Rc<RefCell<Environment>>,
    out: W,
    config: Config,
    depth: usize,
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        Self::with_config(out, Config::default())
    }

    pub fn with_config(out: W, config: Config) -> Self {
        let globals = Environment::new().into_shared();
        let mut interpreter = Self {
            env: Rc::clone(&globals),
            globals,
            out,
            config,
            depth: 0,
        };

        for &(name, arity, func) in builtin::GLOBALS {
            interpreter.define_native(name, arity, func);
        }
        interpreter
    }

    /// Registers a host function as a global.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFnPtr) {
        let native = NativeFn {
            name: name.to_owned(),
            arity,
            func,
        };
        self.globals
            .borrow_mut()
            .define(name, Value::Callable(Callable::Native(Rc::new(native))));
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Scans, parses and runs `src`.
    pub fn eval(&mut self, src: &str) -> Result<(), Vec<Error>> {
        let tokens = syntax::scan(src)?;
        let program = syntax::parse(tokens).map_err(|e| vec![e])?;
        self.interpret(&program).map_err(|e| vec![e])
    }

    /// Evaluates `src` as a single expression and returns its value.
    pub fn eval_expr_str(&mut self, src: &str) -> Result<Value, Vec<Error>> {
        let tokens = syntax::scan(src)?;
        let expr = Parser::new(tokens)
            .parse_standalone_expr()
            .map_err(|e| vec![e])?;
        self.evaluate(&expr).map_err(|e| vec![e])
    }

    /// Runs `program` statement by statement. The first runtime error stops
    /// the run; the statements after it are not executed.
    pub fn interpret(&mut self, program: &[Statement]) -> PResult<()> {
        log::debug!("interpreting {} statements", program.len());

        for stmt in program {
            if let Flow::Return { line, .. } = self.execute(stmt)? {
                return Err(Error::new(ErrorKind::ReturnOutsideFunction, line));
            }
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Statement) -> PResult<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Statement) -> PResult<Flow> {
        match stmt {
            Statement::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Statement::Print { value, line } => {
                let value = self.evaluate(value)?;
                writeln!(self.out, "{value}")
                    .map_err(|e| Error::new(ErrorKind::Output(e.to_string()), *line))?;
            }
            Statement::VarDecl { name, init } => {
                let value = match init {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                self.env.borrow_mut().define(&name.name, value);
            }
            Statement::Block(statements) => {
                let env = Environment::with_enclosing(Rc::clone(&self.env)).into_shared();
                return self.execute_block(statements, env);
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                }
                if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }
            Statement::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ Flow::Return { .. } = self.execute(body)? {
                        return Ok(flow);
                    }
                }
            }
            Statement::FnDecl(decl) => {
                log::debug!("defining function `{}`", decl.name.name);
                let function = UserFn {
                    decl: Rc::clone(decl),
                    closure: Rc::clone(&self.env),
                };
                self.env.borrow_mut().define(
                    &decl.name.name,
                    Value::Callable(Callable::User(Rc::new(function))),
                );
            }
            Statement::Return { value, line } => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return { value, line: *line });
            }
        }

        Ok(Flow::Normal)
    }

    /// Runs `statements` with `env` as the current scope. The previous scope is
    /// restored on every exit path, including errors and returns.
    fn execute_block(
        &mut self,
        statements: &[Statement],
        env: Rc<RefCell<Environment>>,
    ) -> PResult<Flow> {
        let previous = mem::replace(&mut self.env, env);
        let result = self.execute_all(statements);
        self.env = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Statement]) -> PResult<Flow> {
        for stmt in statements {
            if let flow @ Flow::Return { .. } = self.execute(stmt)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn evaluate(&mut self, expr: &Expression) -> PResult<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expression) -> PResult<Value> {
        match expr {
            Expression::Literal(literal) => Ok(literal.into()),
            Expression::Grouping(inner) => self.evaluate(inner),
            Expression::Unary { op, operand, line } => {
                let operand = self.evaluate(operand)?;
                match (*op, operand) {
                    (UnaryOp::Not, value) => Ok(Value::Boolean(!value.is_truthy())),
                    (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnaryOp::Negate, _) => Err(Error::new(
                        ErrorKind::OperandMustBeNumber(op.symbol()),
                        *line,
                    )),
                }
            }
            Expression::Binary { lhs, op, rhs, line } => {
                let lhs = self.evaluate(lhs)?;
                let rhs = self.evaluate(rhs)?;
                binary(*op, lhs, rhs).map_err(|kind| Error::new(kind, *line))
            }
            Expression::Logical { lhs, op, rhs } => {
                let lhs = self.evaluate(lhs)?;
                let decided = match op {
                    LogicalOp::Or => lhs.is_truthy(),
                    LogicalOp::And => !lhs.is_truthy(),
                };
                if decided {
                    return Ok(lhs);
                }
                self.evaluate(rhs)
            }
            Expression::Variable(id) => {
                let value = self.env.borrow().get(&id.name);
                value.map_err(|kind| Error::new(kind, id.line))
            }
            Expression::Assignment { target, value } => {
                let value = self.evaluate(value)?;
                self.env
                    .borrow_mut()
                    .assign(&target.name, value.clone())
                    .map_err(|kind| Error::new(kind, target.line))?;
                Ok(value)
            }
            Expression::Call { callee, args, line } => {
                let callee = self.evaluate(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<PResult<Vec<_>>>()?;
                self.call(callee, args, *line)
            }
        }
    }

    fn call(&mut self, callee: Value, args: Vec<Value>, line: usize) -> PResult<Value> {
        let callable = match callee {
            Value::Callable(callable) => callable,
            other => {
                return Err(Error::new(
                    ErrorKind::NotCallable(other.type_name()),
                    line,
                ))
            }
        };

        if args.len() != callable.arity() {
            return Err(Error::new(
                ErrorKind::ArityMismatch {
                    expected: callable.arity(),
                    found: args.len(),
                },
                line,
            ));
        }

        log::trace!("calling {callable} with {} argument(s)", args.len());

        match callable {
            Callable::Native(native) => (native.func)(&args).map_err(|message| {
                Error::new(
                    ErrorKind::NativeFailure {
                        name: native.name.clone(),
                        message,
                    },
                    line,
                )
            }),
            Callable::User(function) => self.call_user_fn(&function, args, line),
        }
    }

    fn call_user_fn(&mut self, function: &UserFn, args: Vec<Value>, line: usize) -> PResult<Value> {
        let limit = self.config.max_call_depth;
        if self.depth >= limit {
            return Err(Error::new(ErrorKind::StackOverflow(limit), line));
        }

        // Parameters live in a fresh frame chained to the closure, not to the
        // caller's scope.
        let mut env = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, arg) in function.decl.params.iter().zip(args) {
            env.define(&param.name, arg);
        }

        self.depth += 1;
        let flow = self.execute_block(&function.decl.body, env.into_shared());
        self.depth -= 1;

        match flow? {
            Flow::Return { value, .. } => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ErrorKind> {
    let value = match (op, lhs, rhs) {
        (BinaryOp::Equal, lhs, rhs) => Value::Boolean(lhs == rhs),
        (BinaryOp::NotEqual, lhs, rhs) => Value::Boolean(lhs != rhs),
        (BinaryOp::Add, Value::String(a), Value::String(b)) => {
            Value::String(format!("{a}{b}").into())
        }
        (op, Value::Number(a), Value::Number(b)) => arithmetic(op, a, b),
        (BinaryOp::Add, _, _) => return Err(ErrorKind::InvalidAddOperands),
        (op, _, _) => return Err(ErrorKind::OperandsMustBeNumbers(op.symbol())),
    };
    Ok(value)
}

/// Division follows IEEE 754, so dividing by zero yields an infinity or NaN.
fn arithmetic(op: BinaryOp, a: f64, b: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Subtract => Value::Number(a - b),
        BinaryOp::Multiply => Value::Number(a * b),
        BinaryOp::Divide => Value::Number(a / b),
        BinaryOp::Equal => Value::Boolean(a == b),
        BinaryOp::NotEqual => Value::Boolean(a != b),
        BinaryOp::Greater => Value::Boolean(a > b),
        BinaryOp::GreaterEqual => Value::Boolean(a >= b),
        BinaryOp::Less => Value::Boolean(a < b),
        BinaryOp::LessEqual => Value::Boolean(a <= b),
    }
}
