// ABOUTME: The substitution algebra threaded through type inference

use crate::types::{TyVar, Type};
use std::rc::Rc;

/// A substitution is identity, a single variable replacement, or a
/// composition of two substitutions. `Compose(f, g)` applies `g` first.
/// Composition with `Identity` on either side is elided; compose nodes
/// share their children so building one is O(1).
#[derive(Debug, Clone, PartialEq)]
pub enum Subst {
    Identity,
    Replace(TyVar, Type),
    Compose(Rc<Subst>, Rc<Subst>),
}

impl Subst {
    /// `self.compose(inner)` applies `inner` first, then `self`.
    pub fn compose(self, inner: Subst) -> Subst {
        match (self, inner) {
            (Subst::Identity, s) => s,
            (s, Subst::Identity) => s,
            (outer, inner) => Subst::Compose(Rc::new(outer), Rc::new(inner)),
        }
    }

    pub fn apply(&self, ty: &Type) -> Type {
        match self {
            Subst::Identity => ty.clone(),
            Subst::Replace(var, replacement) => ty.replace(*var, replacement),
            Subst::Compose(outer, inner) => outer.apply(&inner.apply(ty)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_a_unit_of_composition() {
        let a = TyVar::fresh(true);
        let replace = Subst::Replace(a, Type::Int);

        assert_eq!(Subst::Identity.compose(replace.clone()), replace);
        assert_eq!(replace.clone().compose(Subst::Identity), replace);
        assert_eq!(
            Subst::Identity.compose(Subst::Identity),
            Subst::Identity
        );
    }

    #[test]
    fn replace_substitutes_everywhere() {
        let a = TyVar::fresh(true);
        let s = Subst::Replace(a, Type::Int);
        let t = Type::arrow(Type::Var(a), Type::pair(Type::Var(a), Type::Bool));
        assert_eq!(
            s.apply(&t),
            Type::arrow(Type::Int, Type::pair(Type::Int, Type::Bool))
        );
    }

    #[test]
    fn compose_applies_the_inner_substitution_first() {
        let a = TyVar::fresh(true);
        let b = TyVar::fresh(true);
        // inner: a := b, outer: b := int. Composed, a ends up at int.
        let inner = Subst::Replace(a, Type::Var(b));
        let outer = Subst::Replace(b, Type::Int);
        let both = outer.compose(inner);
        assert_eq!(both.apply(&Type::Var(a)), Type::Int);
        assert_eq!(both.apply(&Type::Var(b)), Type::Int);
    }

    #[test]
    fn applying_twice_equals_applying_once() {
        // Holds when the replacement does not mention the target.
        let a = TyVar::fresh(true);
        let s = Subst::Replace(a, Type::list(Type::Int));
        let t = Type::pair(Type::Var(a), Type::Var(a));
        let once = s.apply(&t);
        assert_eq!(s.apply(&once), once);
    }
}
