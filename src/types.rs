// ABOUTME: The type language, equality-type predicate, and unification with occurs check

use crate::error::TypeError;
use crate::subst::Subst;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_VAR: AtomicU32 = AtomicU32::new(0);

/// A type variable: a unique identity plus an equality-type attribute.
/// The attribute records whether the variable stands for a type that
/// `=`/`<>` may compare; it is consulted only when equality is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TyVar {
    id: u32,
    equality: bool,
}

impl TyVar {
    pub fn fresh(equality: bool) -> Self {
        TyVar {
            id: NEXT_VAR.fetch_add(1, Ordering::Relaxed),
            equality,
        }
    }

    pub fn admits_equality(&self) -> bool {
        self.equality
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Bool,
    Unit,
    Var(TyVar),
    Arrow(Box<Type>, Box<Type>),
    Pair(Box<Type>, Box<Type>),
    List(Box<Type>),
    Ref(Box<Type>),
}

impl Type {
    pub fn fresh_var(equality: bool) -> Type {
        Type::Var(TyVar::fresh(equality))
    }

    pub fn arrow(from: Type, to: Type) -> Type {
        Type::Arrow(Box::new(from), Box::new(to))
    }

    pub fn pair(first: Type, second: Type) -> Type {
        Type::Pair(Box::new(first), Box::new(second))
    }

    pub fn list(item: Type) -> Type {
        Type::List(Box::new(item))
    }

    pub fn reference(target: Type) -> Type {
        Type::Ref(Box::new(target))
    }

    /// Is `=`/`<>` defined over this type? Arrows and unit are not
    /// comparable; compounds are comparable when their components are;
    /// a variable answers with its attribute.
    pub fn admits_equality(&self) -> bool {
        match self {
            Type::Int | Type::Bool => true,
            Type::Unit => false,
            Type::Var(v) => v.admits_equality(),
            Type::Arrow(_, _) => false,
            Type::Pair(t1, t2) => t1.admits_equality() && t2.admits_equality(),
            Type::List(t) => t.admits_equality(),
            Type::Ref(_) => true,
        }
    }

    /// Does this type mention the given variable anywhere?
    pub fn contains(&self, var: TyVar) -> bool {
        match self {
            Type::Int | Type::Bool | Type::Unit => false,
            Type::Var(v) => *v == var,
            Type::Arrow(t1, t2) | Type::Pair(t1, t2) => t1.contains(var) || t2.contains(var),
            Type::List(t) | Type::Ref(t) => t.contains(var),
        }
    }

    /// Substitute `replacement` for every occurrence of `var`.
    pub fn replace(&self, var: TyVar, replacement: &Type) -> Type {
        match self {
            Type::Int | Type::Bool | Type::Unit => self.clone(),
            Type::Var(v) => {
                if *v == var {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            Type::Arrow(t1, t2) => Type::arrow(
                t1.replace(var, replacement),
                t2.replace(var, replacement),
            ),
            Type::Pair(t1, t2) => Type::pair(
                t1.replace(var, replacement),
                t2.replace(var, replacement),
            ),
            Type::List(t) => Type::list(t.replace(var, replacement)),
            Type::Ref(t) => Type::reference(t.replace(var, replacement)),
        }
    }

    /// Produce the most general unifier of two types, or fail with a
    /// mismatch. Binding a variable to a type containing it is a
    /// circularity fault (the occurs check).
    pub fn unify(&self, other: &Type) -> Result<Subst, TypeError> {
        match (self, other) {
            (Type::Var(a), _) => bind(*a, other),
            (_, Type::Var(b)) => bind(*b, self),

            (Type::Int, Type::Int) | (Type::Bool, Type::Bool) | (Type::Unit, Type::Unit) => {
                Ok(Subst::Identity)
            }

            (Type::Arrow(a1, a2), Type::Arrow(b1, b2))
            | (Type::Pair(a1, a2), Type::Pair(b1, b2)) => {
                let s1 = a1.unify(b1)?;
                let s2 = s1.apply(a2).unify(&s1.apply(b2))?;
                Ok(s2.compose(s1))
            }

            (Type::List(a), Type::List(b)) | (Type::Ref(a), Type::Ref(b)) => a.unify(b),

            _ => Err(TypeError::Mismatch),
        }
    }
}

fn bind(var: TyVar, ty: &Type) -> Result<Subst, TypeError> {
    if let Type::Var(other) = ty {
        if *other == var {
            return Ok(Subst::Identity);
        }
    }
    if ty.contains(var) {
        return Err(TypeError::Circularity);
    }
    Ok(Subst::Replace(var, ty.clone()))
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Unit => write!(f, "unit"),
            Type::Var(v) => write!(f, "t{}", v.id),
            Type::Arrow(t1, t2) => write!(f, "({} -> {})", t1, t2),
            Type::Pair(t1, t2) => write!(f, "({} * {})", t1, t2),
            Type::List(t) => write!(f, "{} list", t),
            Type::Ref(t) => write!(f, "{} ref", t),
        }
    }
}
