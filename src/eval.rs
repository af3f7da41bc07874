// ABOUTME: The shared store, address counter, and big-step evaluator

use crate::ast::Expr;
use crate::env::Env;
use crate::error::RuntimeError;
use crate::value::{Closure, RecClosure, Value};
use std::collections::HashMap;
use std::rc::Rc;

/// The mutable half of the evaluation state: cells addressed by a
/// strictly increasing counter. `ref` is the only allocator and
/// nothing is ever collected.
#[derive(Debug, Default)]
pub struct Store {
    cells: HashMap<usize, Value>,
    next: usize,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Claim the next address. The counter advances immediately, so
    /// allocations are numbered in the order they start.
    pub fn alloc(&mut self) -> usize {
        let addr = self.next;
        self.next += 1;
        addr
    }

    pub fn put(&mut self, addr: usize, value: Value) {
        self.cells.insert(addr, value);
    }

    pub fn get(&self, addr: usize) -> Option<&Value> {
        self.cells.get(&addr)
    }
}

/// Big-step call-by-value evaluation. The environment is threaded
/// functionally; the store and its counter are shared for the whole
/// run.
pub fn eval(expr: &Expr, env: &Env, store: &mut Store) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Unit => Ok(Value::Unit),
        Expr::Nil => Ok(Value::Nil),

        Expr::Name(x) => match env.get(x) {
            // A recursive binding unfolds on every access: re-enter the
            // rec rule under the environment captured at the binding.
            Some(Value::Rec(rec)) => {
                let inner = rec.env.extend(rec.name.clone(), Value::Rec(rec.clone()));
                eval(&rec.body, &inner, store)
            }
            Some(v) => Ok(v),
            None => Err(RuntimeError::Undefined(x.clone())),
        },

        Expr::Add(l, r) => int_binary(l, r, env, store, |a, b| Ok(a + b)),
        Expr::Sub(l, r) => int_binary(l, r, env, store, |a, b| Ok(a - b)),
        Expr::Mul(l, r) => int_binary(l, r, env, store, |a, b| Ok(a * b)),
        // Quotient truncates toward zero; remainder keeps the sign of
        // the dividend.
        Expr::Div(l, r) => int_binary(l, r, env, store, |a, b| {
            a.checked_div(b).ok_or(RuntimeError::DivisionByZero)
        }),
        Expr::Mod(l, r) => int_binary(l, r, env, store, |a, b| {
            a.checked_rem(b).ok_or(RuntimeError::DivisionByZero)
        }),

        Expr::Eq(l, r) => {
            let v1 = eval(l, env, store)?;
            let v2 = eval(r, env, store)?;
            Ok(Value::Bool(v1 == v2))
        }
        Expr::Neq(l, r) => {
            let v1 = eval(l, env, store)?;
            let v2 = eval(r, env, store)?;
            Ok(Value::Bool(v1 != v2))
        }

        Expr::Less(l, r) => int_compare(l, r, env, store, |a, b| a < b),
        Expr::LessEq(l, r) => int_compare(l, r, env, store, |a, b| a <= b),
        Expr::Greater(l, r) => int_compare(l, r, env, store, |a, b| a > b),
        Expr::GreaterEq(l, r) => int_compare(l, r, env, store, |a, b| a >= b),

        Expr::AndAlso(l, r) => {
            if !as_bool(eval(l, env, store)?)? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(as_bool(eval(r, env, store)?)?))
        }
        Expr::OrElse(l, r) => {
            if as_bool(eval(l, env, store)?)? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(as_bool(eval(r, env, store)?)?))
        }

        Expr::Pair(l, r) => {
            let v1 = eval(l, env, store)?;
            let v2 = eval(r, env, store)?;
            Ok(Value::Pair(Rc::new(v1), Rc::new(v2)))
        }
        Expr::Cons(l, r) => {
            let v1 = eval(l, env, store)?;
            let v2 = eval(r, env, store)?;
            Ok(Value::Cons(Rc::new(v1), Rc::new(v2)))
        }

        Expr::Seq(l, r) => {
            eval(l, env, store)?;
            eval(r, env, store)
        }

        Expr::Assign(l, r) => {
            let addr = as_ref(eval(l, env, store)?)?;
            let v = eval(r, env, store)?;
            store.put(addr, v);
            Ok(Value::Unit)
        }

        Expr::App(f, x) => {
            let callee = eval(f, env, store)?;
            let arg = eval(x, env, store)?;
            match callee {
                Value::Builtin(builtin) => builtin.apply(arg),
                Value::Fun(closure) => {
                    let inner = closure.env.extend(closure.param.clone(), arg);
                    eval(&closure.body, &inner, store)
                }
                _ => Err(RuntimeError::NotCallable),
            }
        }

        Expr::Neg(e) => Ok(Value::Int(-as_int(eval(e, env, store)?)?)),
        Expr::Not(e) => Ok(Value::Bool(!as_bool(eval(e, env, store)?)?)),

        // The address is claimed before the operand runs, so nested
        // allocations are numbered in the order they start.
        Expr::Ref(e) => {
            let addr = store.alloc();
            let v = eval(e, env, store)?;
            store.put(addr, v);
            Ok(Value::Ref(addr))
        }

        Expr::Deref(e) => {
            let addr = as_ref(eval(e, env, store)?)?;
            store
                .get(addr)
                .cloned()
                .ok_or(RuntimeError::DanglingRef(addr))
        }

        Expr::Group(e) => eval(e, env, store),

        Expr::Cond(c, a, b) => {
            if as_bool(eval(c, env, store)?)? {
                eval(a, env, store)
            } else {
                eval(b, env, store)
            }
        }

        Expr::Loop(c, body) => {
            while as_bool(eval(c, env, store)?)? {
                eval(body, env, store)?;
            }
            Ok(Value::Unit)
        }

        Expr::Let(x, e1, e2) => {
            let v1 = eval(e1, env, store)?;
            let inner = env.extend(x.clone(), v1);
            eval(e2, &inner, store)
        }

        Expr::Fn(x, body) => Ok(Value::Fun(Rc::new(Closure {
            env: env.clone(),
            param: x.clone(),
            body: body.clone(),
        }))),

        Expr::Rec(x, body) => {
            let rec = Rc::new(RecClosure {
                env: env.clone(),
                name: x.clone(),
                body: body.clone(),
            });
            let inner = env.extend(x.clone(), Value::Rec(rec));
            eval(body, &inner, store)
        }
    }
}

fn int_binary(
    l: &Expr,
    r: &Expr,
    env: &Env,
    store: &mut Store,
    op: fn(i64, i64) -> Result<i64, RuntimeError>,
) -> Result<Value, RuntimeError> {
    let a = as_int(eval(l, env, store)?)?;
    let b = as_int(eval(r, env, store)?)?;
    Ok(Value::Int(op(a, b)?))
}

fn int_compare(
    l: &Expr,
    r: &Expr,
    env: &Env,
    store: &mut Store,
    op: fn(i64, i64) -> bool,
) -> Result<Value, RuntimeError> {
    let a = as_int(eval(l, env, store)?)?;
    let b = as_int(eval(r, env, store)?)?;
    Ok(Value::Bool(op(a, b)))
}

fn as_int(v: Value) -> Result<i64, RuntimeError> {
    match v {
        Value::Int(n) => Ok(n),
        other => Err(RuntimeError::ValueMismatch {
            expected: "int",
            actual: other.type_name(),
        }),
    }
}

fn as_bool(v: Value) -> Result<bool, RuntimeError> {
    match v {
        Value::Bool(b) => Ok(b),
        other => Err(RuntimeError::ValueMismatch {
            expected: "bool",
            actual: other.type_name(),
        }),
    }
}

fn as_ref(v: Value) -> Result<usize, RuntimeError> {
    match v {
        Value::Ref(addr) => Ok(addr),
        other => Err(RuntimeError::ValueMismatch {
            expected: "ref",
            actual: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::initial_env;
    use crate::parser::parse;

    fn run(src: &str) -> Result<Value, RuntimeError> {
        let expr = parse(src).expect("test program should parse");
        let mut store = Store::new();
        eval(&expr, &initial_env(), &mut store)
    }

    #[test]
    fn arithmetic() {
        assert_eq!(run("1 + 2 * 3"), Ok(Value::Int(7)));
        assert_eq!(run("10 - 3 - 4"), Ok(Value::Int(3)));
        assert_eq!(run("~5 + 2"), Ok(Value::Int(-3)));
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(run("7 / 2"), Ok(Value::Int(3)));
        assert_eq!(run("~7 / 2"), Ok(Value::Int(-3)));
        assert_eq!(run("7 / ~2"), Ok(Value::Int(-3)));
        assert_eq!(run("~7 / ~2"), Ok(Value::Int(3)));
    }

    #[test]
    fn remainder_takes_the_dividend_sign() {
        assert_eq!(run("7 % 2"), Ok(Value::Int(1)));
        assert_eq!(run("~7 % 2"), Ok(Value::Int(-1)));
        assert_eq!(run("7 % ~2"), Ok(Value::Int(1)));
    }

    #[test]
    fn division_by_zero_faults() {
        assert_eq!(run("1 / 0"), Err(RuntimeError::DivisionByZero));
        assert_eq!(run("1 % 0"), Err(RuntimeError::DivisionByZero));
    }

    #[test]
    fn comparisons_and_equality() {
        assert_eq!(run("1 < 2"), Ok(Value::Bool(true)));
        assert_eq!(run("2 <= 1"), Ok(Value::Bool(false)));
        assert_eq!(run("(1, 2) = (1, 2)"), Ok(Value::Bool(true)));
        assert_eq!(run("(1 :: nil) <> (2 :: nil)"), Ok(Value::Bool(true)));
    }

    #[test]
    fn short_circuit_skips_the_right_operand() {
        // The right operand would fault if it ran.
        assert_eq!(run("false andalso iszero (hd nil)"), Ok(Value::Bool(false)));
        assert_eq!(run("true orelse iszero (hd nil)"), Ok(Value::Bool(true)));

        assert_eq!(
            run("true andalso iszero (hd nil)"),
            Err(RuntimeError::EmptyList { op: "hd" })
        );
    }

    #[test]
    fn references_read_back_their_last_write() {
        assert_eq!(run("let x = ref 0 in x := 5 ; !x end"), Ok(Value::Int(5)));
        assert_eq!(run("!(ref 42)"), Ok(Value::Int(42)));
    }

    #[test]
    fn addresses_are_claimed_in_start_order() {
        // The outer ref claims its address before its operand runs.
        let v = run("(ref 0, ref ref 1)").unwrap();
        assert_eq!(v.to_string(), "pair@ref@0@ref@1");
    }

    #[test]
    fn while_loop_accumulates_through_the_store() {
        let src = "let i = ref 0 in \
                   let s = ref 0 in \
                   (while !i < 5 do (s := !s + !i ; i := !i + 1)) ; !s \
                   end end";
        assert_eq!(run(src), Ok(Value::Int(10)));
    }

    #[test]
    fn closures_capture_their_definition_environment() {
        let src = "let x = 1 in \
                   let f = fn y => x + y in \
                   let x = 10 in f 5 end \
                   end end";
        assert_eq!(run(src), Ok(Value::Int(6)));
    }

    #[test]
    fn recursion_unfolds_on_lookup() {
        let src = "let fact = rec f => fn n => if n = 0 then 1 else n * f (n - 1) \
                   in fact 5 end";
        assert_eq!(run(src), Ok(Value::Int(120)));

        let fib = "let fib = rec f => fn n => if n < 2 then n else f (n - 1) + f (n - 2) \
                   in fib 10 end";
        assert_eq!(run(fib), Ok(Value::Int(55)));
    }

    #[test]
    fn a_rec_result_is_a_plain_function_value() {
        assert!(matches!(run("rec f => fn x => f x"), Ok(Value::Fun(_))));
    }

    #[test]
    fn builtins_evaluate_through_application() {
        assert_eq!(run("fst (10, 20)"), Ok(Value::Int(10)));
        assert_eq!(run("snd (10, 20)"), Ok(Value::Int(20)));
        assert_eq!(run("hd (1 :: 2 :: nil)"), Ok(Value::Int(1)));
        assert_eq!(run("hd (tl (1 :: 2 :: nil))"), Ok(Value::Int(2)));
        assert_eq!(run("succ 4"), Ok(Value::Int(5)));
        assert_eq!(run("pred 4"), Ok(Value::Int(3)));
        assert_eq!(run("iszero 0"), Ok(Value::Bool(true)));
        assert_eq!(
            run("hd nil"),
            Err(RuntimeError::EmptyList { op: "hd" })
        );
    }

    #[test]
    fn applying_a_non_function_faults() {
        let expr = parse("1 2").unwrap();
        let mut store = Store::new();
        assert_eq!(
            eval(&expr, &Env::empty(), &mut store),
            Err(RuntimeError::NotCallable)
        );
    }

    #[test]
    fn unbound_names_fault_at_runtime_without_typechecking() {
        let expr = parse("mystery").unwrap();
        let mut store = Store::new();
        assert_eq!(
            eval(&expr, &Env::empty(), &mut store),
            Err(RuntimeError::Undefined("mystery".to_string()))
        );
    }

    #[test]
    fn store_addresses_increase_monotonically() {
        let mut store = Store::new();
        assert_eq!(store.alloc(), 0);
        assert_eq!(store.alloc(), 1);
        assert_eq!(store.alloc(), 2);
        assert_eq!(store.get(7), None);
    }
}
