//! The built-in library: `fst`, `snd`, `hd`, `tl`, `succ`, `pred`,
//! `iszero`.
//!
//! Built-ins are first-class function values dispatched by case at
//! application sites. They print as `fun` like any other function.

use crate::env::Env;
use crate::error::RuntimeError;
use crate::infer::TypeEnv;
use crate::types::Type;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Fst,
    Snd,
    Hd,
    Tl,
    Succ,
    Pred,
    IsZero,
}

impl Builtin {
    pub const ALL: [Builtin; 7] = [
        Builtin::Fst,
        Builtin::Snd,
        Builtin::Hd,
        Builtin::Tl,
        Builtin::Succ,
        Builtin::Pred,
        Builtin::IsZero,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Fst => "fst",
            Builtin::Snd => "snd",
            Builtin::Hd => "hd",
            Builtin::Tl => "tl",
            Builtin::Succ => "succ",
            Builtin::Pred => "pred",
            Builtin::IsZero => "iszero",
        }
    }

    /// Apply the built-in to an already-evaluated argument.
    pub fn apply(self, arg: Value) -> Result<Value, RuntimeError> {
        match (self, arg) {
            (Builtin::Fst, Value::Pair(first, _)) => Ok(first.as_ref().clone()),
            (Builtin::Snd, Value::Pair(_, second)) => Ok(second.as_ref().clone()),

            (Builtin::Hd, Value::Cons(head, _)) => Ok(head.as_ref().clone()),
            (Builtin::Hd, Value::Nil) => Err(RuntimeError::EmptyList { op: "hd" }),
            (Builtin::Tl, Value::Cons(_, tail)) => Ok(tail.as_ref().clone()),
            (Builtin::Tl, Value::Nil) => Err(RuntimeError::EmptyList { op: "tl" }),

            (Builtin::Succ, Value::Int(n)) => Ok(Value::Int(n + 1)),
            (Builtin::Pred, Value::Int(n)) => Ok(Value::Int(n - 1)),
            (Builtin::IsZero, Value::Int(n)) => Ok(Value::Bool(n == 0)),

            (b, other) => Err(RuntimeError::ValueMismatch {
                expected: match b {
                    Builtin::Fst | Builtin::Snd => "pair",
                    Builtin::Hd | Builtin::Tl => "list",
                    Builtin::Succ | Builtin::Pred | Builtin::IsZero => "int",
                },
                actual: other.type_name(),
            }),
        }
    }
}

/// The runtime environment every program starts from.
pub fn initial_env() -> Env {
    let mut env = Env::empty();
    for builtin in Builtin::ALL {
        env = env.extend(builtin.name(), Value::Builtin(builtin));
    }
    env
}

/// The type environment every program starts from. The pair and list
/// accessors share one pair of equality-capable variables; with no
/// generalisation each accessor is usable at a single element type per
/// program.
pub fn initial_type_env() -> TypeEnv {
    let a = Type::fresh_var(true);
    let b = Type::fresh_var(true);

    TypeEnv::Empty
        .extend(
            "fst",
            Type::arrow(Type::pair(a.clone(), b.clone()), a.clone()),
        )
        .extend(
            "snd",
            Type::arrow(Type::pair(a.clone(), b.clone()), b.clone()),
        )
        .extend("hd", Type::arrow(Type::list(a.clone()), a.clone()))
        .extend("tl", Type::arrow(Type::list(a.clone()), Type::list(a)))
        .extend("iszero", Type::arrow(Type::Int, Type::Bool))
        .extend("pred", Type::arrow(Type::Int, Type::Int))
        .extend("succ", Type::arrow(Type::Int, Type::Int))
}
