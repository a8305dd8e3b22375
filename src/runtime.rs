mod builtin;
mod env;
mod eval;
mod value;

pub use env::Environment;
pub use eval::Interpreter;
pub use value::{Callable, NativeFn, NativeFnPtr, UserFn, Value};
