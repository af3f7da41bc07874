// ABOUTME: Type environments and the unification-based inference walker

use crate::ast::Expr;
use crate::error::TypeError;
use crate::subst::Subst;
use crate::types::Type;
use std::rc::Rc;

/// Ordered name-to-type bindings with last-binding-wins lookup. The
/// `Composed` form wraps an environment with a pending substitution
/// that is applied to every type read out of it, so sibling subtrees
/// see earlier unifications without the environment being rebuilt.
#[derive(Debug, Clone)]
pub enum TypeEnv {
    Empty,
    Extended(Rc<TypeEnv>, String, Type),
    Composed(Subst, Rc<TypeEnv>),
}

impl TypeEnv {
    pub fn extend(self, name: impl Into<String>, ty: Type) -> TypeEnv {
        TypeEnv::Extended(Rc::new(self), name.into(), ty)
    }

    pub fn composed(subst: Subst, env: &TypeEnv) -> TypeEnv {
        TypeEnv::Composed(subst, Rc::new(env.clone()))
    }

    pub fn get(&self, name: &str) -> Option<Type> {
        match self {
            TypeEnv::Empty => None,
            TypeEnv::Extended(parent, bound, ty) => {
                if bound == name {
                    Some(ty.clone())
                } else {
                    parent.get(name)
                }
            }
            TypeEnv::Composed(subst, parent) => parent.get(name).map(|ty| subst.apply(&ty)),
        }
    }
}

/// Infer the principal substitution and type of an expression.
pub fn typecheck(expr: &Expr, env: &TypeEnv) -> Result<(Subst, Type), TypeError> {
    match expr {
        Expr::Int(_) => Ok((Subst::Identity, Type::Int)),
        Expr::Bool(_) => Ok((Subst::Identity, Type::Bool)),
        Expr::Unit => Ok((Subst::Identity, Type::Unit)),
        Expr::Nil => Ok((Subst::Identity, Type::list(Type::fresh_var(true)))),

        Expr::Name(x) => match env.get(x) {
            Some(ty) => Ok((Subst::Identity, ty)),
            None => Err(TypeError::Unbound(x.clone())),
        },

        Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r)
        | Expr::Mod(l, r) => check_uniform(l, r, env, &Type::Int, Type::Int),

        Expr::Less(l, r) | Expr::LessEq(l, r) | Expr::Greater(l, r) | Expr::GreaterEq(l, r) => {
            check_uniform(l, r, env, &Type::Int, Type::Bool)
        }

        Expr::AndAlso(l, r) | Expr::OrElse(l, r) => {
            check_uniform(l, r, env, &Type::Bool, Type::Bool)
        }

        Expr::Eq(l, r) | Expr::Neq(l, r) => {
            let (s, t1, t2) = check_pair(l, r, env)?;
            let s = s.compose(t1.unify(&t2)?);
            if !s.apply(&t1).admits_equality() {
                return Err(TypeError::NotEquality);
            }
            Ok((s, Type::Bool))
        }

        Expr::Pair(l, r) => {
            let (s, t1, t2) = check_pair(l, r, env)?;
            Ok((s, Type::pair(t1, t2)))
        }

        Expr::Cons(l, r) => {
            let (s, t1, t2) = check_pair(l, r, env)?;
            let s = s.compose(t2.unify(&Type::list(t1))?);
            let out = s.apply(&t2);
            Ok((s, out))
        }

        Expr::Seq(l, r) => {
            let (s, _, t2) = check_pair(l, r, env)?;
            Ok((s, t2))
        }

        Expr::Assign(l, r) => {
            let (s, t1, t2) = check_pair(l, r, env)?;
            let s = s.compose(t1.unify(&Type::reference(t2))?);
            Ok((s, Type::Unit))
        }

        // Both sides of an application are checked under the original
        // environment; the unification at the call site reconciles them.
        Expr::App(f, x) => {
            let alpha = Type::fresh_var(false);
            let (s1, t_f) = typecheck(f, env)?;
            let (s2, t_x) = typecheck(x, env)?;
            let s = s2.compose(s1);
            let s = Type::arrow(t_x, alpha.clone()).unify(&t_f)?.compose(s);
            let out = s.apply(&alpha);
            Ok((s, out))
        }

        Expr::Neg(e) => check_unary(e, env, &Type::Int, Type::Int),
        Expr::Not(e) => check_unary(e, env, &Type::Bool, Type::Bool),

        Expr::Ref(e) => {
            let (s, t) = typecheck(e, env)?;
            Ok((s, Type::reference(t)))
        }

        Expr::Deref(e) => {
            let (s_e, t) = typecheck(e, env)?;
            let alpha = Type::fresh_var(true);
            let u = t.unify(&Type::reference(alpha.clone()))?;
            let out = u.apply(&alpha);
            Ok((u.compose(s_e), out))
        }

        Expr::Group(e) => typecheck(e, env),

        Expr::Cond(c, a, b) => {
            let (s1, t1) = typecheck(c, env)?;
            let u1 = t1.unify(&Type::Bool)?;
            let env2 = TypeEnv::composed(u1.clone().compose(s1.clone()), env);
            let (s2, t2) = typecheck(a, &env2)?;
            let (s3, t3) = typecheck(b, &TypeEnv::composed(s2.clone(), &env2))?;
            let u2 = t2.unify(&s2.apply(&t3))?;
            let s = u2.compose(s3).compose(s2).compose(u1).compose(s1);
            let out = s.apply(&t2);
            Ok((s, out))
        }

        Expr::Loop(c, b) => {
            let (s1, t1) = typecheck(c, env)?;
            let u1 = t1.unify(&Type::Bool)?;
            let wrapped = TypeEnv::composed(u1.clone().compose(s1.clone()), env);
            let (s2, _) = typecheck(b, &wrapped)?;
            Ok((s2.compose(s1), Type::Unit))
        }

        // Monomorphic binding: the bound name gets the inferred type of
        // its definition with no generalisation.
        Expr::Let(x, e1, e2) => {
            let (s1, t1) = typecheck(e1, env)?;
            let inner = env.clone().extend(x.clone(), t1);
            let (s2, t2) = typecheck(e2, &inner)?;
            let out = s2.apply(&t2);
            Ok((s2.compose(s1), out))
        }

        Expr::Fn(x, body) => {
            let alpha = Type::fresh_var(true);
            let inner = env.clone().extend(x.clone(), alpha.clone());
            let (s, t_body) = typecheck(body, &inner)?;
            let param = s.apply(&alpha);
            Ok((s, Type::arrow(param, t_body)))
        }

        Expr::Rec(x, body) => {
            let alpha = Type::fresh_var(true);
            let inner = env.clone().extend(x.clone(), alpha.clone());
            let (s_body, t_body) = typecheck(body, &inner)?;
            let u = t_body.unify(&s_body.apply(&alpha))?;
            let s = s_body.compose(u);
            let out = s.apply(&t_body);
            Ok((s, out))
        }
    }
}

/// Check two subexpressions left to right, threading the left-hand
/// substitution through the environment seen by the right.
fn check_pair(
    l: &Expr,
    r: &Expr,
    env: &TypeEnv,
) -> Result<(Subst, Type, Type), TypeError> {
    let (s1, t1) = typecheck(l, env)?;
    let (s2, t2) = typecheck(r, &TypeEnv::composed(s1.clone(), env))?;
    Ok((s2.compose(s1), t1, t2))
}

/// Both operands unify with `operand`; the node's type is `result`.
fn check_uniform(
    l: &Expr,
    r: &Expr,
    env: &TypeEnv,
    operand: &Type,
    result: Type,
) -> Result<(Subst, Type), TypeError> {
    let (s, t1, t2) = check_pair(l, r, env)?;
    let s = s.compose(t1.unify(operand)?);
    let s = s.compose(t2.unify(operand)?);
    Ok((s, result))
}

fn check_unary(
    e: &Expr,
    env: &TypeEnv,
    operand: &Type,
    result: Type,
) -> Result<(Subst, Type), TypeError> {
    let (s_e, t) = typecheck(e, env)?;
    let u = t.unify(operand)?;
    Ok((u.compose(s_e), result))
}
