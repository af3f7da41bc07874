// ABOUTME: Library module exposing the pipeline and its components

pub mod ast;
pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod infer;
pub mod lexer;
pub mod parser;
pub mod subst;
pub mod types;
pub mod value;

use crate::error::Fault;
use crate::value::Value;

/// Run one program through the whole pipeline: lex, parse, typecheck,
/// evaluate. The first fault aborts and fixes the diagnostic category.
pub fn interpret(source: &str) -> Result<Value, Fault> {
    let program = parser::parse(source)?;
    infer::typecheck(&program, &builtins::initial_type_env())?;
    let mut store = eval::Store::new();
    let value = eval::eval(&program, &builtins::initial_env(), &mut store)?;
    Ok(value)
}
