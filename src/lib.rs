//! A tree-walking interpreter for the Lox language.
//!
//! Source text goes through [`syntax::scan`] and [`syntax::parse`] and the
//! resulting program is run by a [`runtime::Interpreter`].

pub mod config;
pub mod error;
pub mod runtime;
pub mod syntax;

mod stack;

pub use config::Config;
pub use error::{Error, ErrorKind, Phase};
pub use runtime::{Interpreter, Value};
