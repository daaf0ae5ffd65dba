use crate::{
    error::Error,
    tree::{
        BinaryOp::*,
        Node::{self, *},
        Tree,
        UnaryOp::*,
    },
};

/**
Compute the results of operations on constants and fold those into constant
nodes. Identity operations are replaced with their operands. The unused nodes
after folding are not pruned. Use a pruner for that. Returns true if the nodes
were modified, false otherwise.

Operations on constants that produce NaN are left untouched.
*/
pub fn fold(nodes: &mut [Node]) -> Result<bool, Error> {
    let mut modified = false;
    for index in 0..nodes.len() {
        let folded = match nodes[index] {
            Constant(_) => None,
            Symbol(_) => None,
            Unary(op, input) => match (op, &nodes[input]) {
                (_, Constant(value)) => not_nan(op.apply(*value)),
                (Negate, Binary(Subtract, li, ri)) => Some(Binary(Subtract, *ri, *li)),
                (Negate, Unary(Negate, inner)) // Chains of ops that cancel out.
                    | (Log, Unary(Exp, inner))
                    | (Exp, Unary(Log, inner)) => Some(nodes[*inner]),
                _ => None,
            },
            Binary(op, li, ri) => match (op, &nodes[li], &nodes[ri]) {
                // Constant folding.
                (op, Constant(a), Constant(b)) => not_nan(op.apply(*a, *b)),
                // Identity ops.
                (Add, lhs, Constant(val)) if *val == 0. => Some(*lhs),
                (Add, Constant(val), rhs) if *val == 0. => Some(*rhs),
                (Subtract, lhs, Constant(val)) if *val == 0. => Some(*lhs),
                (Multiply, lhs, Constant(val)) if *val == 1. => Some(*lhs),
                (Multiply, Constant(val), rhs) if *val == 1. => Some(*rhs),
                (Pow, base, Constant(val)) if *val == 1. => Some(*base),
                (Divide, numerator, Constant(val)) if *val == 1. => Some(*numerator),
                // Other ops.
                (Subtract, Constant(val), _rhs) if *val == 0. => Some(Unary(Negate, ri)),
                (Pow, _base, Constant(val)) if *val == 0. => Some(Constant(1.)),
                (Multiply, _lhs, Constant(val)) if *val == 0. => Some(Constant(0.)),
                (Multiply, Constant(val), _rhs) if *val == 0. => Some(Constant(0.)),
                (Multiply, Constant(val), _rhs) if *val == -1. => Some(Unary(Negate, ri)),
                (Multiply, _lhs, Constant(val)) if *val == -1. => Some(Unary(Negate, li)),
                (Divide, Constant(val), _rhs) if *val == 0. => Some(Constant(0.)),
                (Add, _lhs, Unary(Negate, inner)) => Some(Binary(Subtract, li, *inner)),
                (Add, Unary(Negate, inner), _rhs) => Some(Binary(Subtract, ri, *inner)),
                (Subtract, _lhs, Unary(Negate, inner)) => Some(Binary(Add, li, *inner)),
                _ => None,
            },
        };
        if let Some(node) = folded {
            nodes[index] = node;
            modified = true;
        }
    }
    Ok(modified)
}

/// A constant node holding `value`, unless it is NaN. Infinities are kept.
fn not_nan(value: f64) -> Option<Node> {
    if value.is_nan() {
        None
    } else {
        Some(Constant(value))
    }
}

impl Tree {
    /// Computes the results of constant operations, and folds them
    /// into the tree. Identity operations and other expressions whose
    /// values can be inferred without evaluating the tree are also
    /// folded. The resulting tree is checked for validity before it is
    /// returned. The folded tree is not pruned.
    pub fn fold(self) -> Result<Tree, Error> {
        let (mut nodes, dims) = self.take();
        fold(&mut nodes)?;
        Tree::from_nodes(nodes, dims)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        deftree,
        prune::Pruner,
        tree::{Label, MaybeTree},
    };

    /// Fold and prune `tree`, and check it's equivalent to `expected`.
    fn check_fold(tree: MaybeTree, expected: MaybeTree) {
        let mut pruner = Pruner::new();
        let folded = tree.unwrap().fold().unwrap().prune(&mut pruner).unwrap();
        let expected = expected.unwrap();
        assert!(
            folded.equivalent(&expected),
            "{folded} is not equivalent to {expected}"
        );
    }

    #[test]
    fn t_constants() {
        let mut pruner = Pruner::new();
        let tree = deftree!(* 2. 3.).unwrap().fold().unwrap().prune(&mut pruner).unwrap();
        assert_eq!(tree.roots(), &[Constant(6.)]);
        assert_eq!(tree.len(), 1);
        check_fold(
            deftree!(/ (+ x (* 2. 3.)) (log (+ x (/ 2. (- 9. 5.))))),
            deftree!(/ (+ x 6.) (log (+ x 0.5))),
        );
        check_fold(deftree!(sqrt (+ (pow 3 2) 16)), deftree!(5));
    }

    #[test]
    fn t_constants_concat() {
        let tree = deftree!(
            concat
                (/ (+ x (* 2. 3.)) (log (+ x (/ 2. (- 9. 5.)))))
                (* (entry A 0 1) (- 10 (* 3. 3.)))
        )
        .unwrap();
        let expected = deftree!(concat (/ (+ x 6.) (log (+ x 0.5))) (entry A 0 1)).unwrap();
        let mut pruner = Pruner::new();
        let folded = tree.fold().unwrap().prune(&mut pruner).unwrap();
        assert!(folded.equivalent(&expected));
    }

    #[test]
    fn t_nan_is_not_folded() {
        let tree = deftree!(+ x (log (- 1.))).unwrap().fold().unwrap();
        assert!(matches!(tree.roots(), [Binary(Add, ..)]));
    }

    #[test]
    fn t_infinity_is_folded() {
        let tree = deftree!(+ x (/ 1. (- 1. 1.))).unwrap().fold().unwrap();
        let tree = tree.prune(&mut Pruner::new()).unwrap();
        assert_eq!(
            tree.nodes(),
            &[Symbol(Label::scalar('x')), Constant(f64::INFINITY), Binary(Add, 0, 1)]
        );
    }

    #[test]
    fn t_identities() {
        check_fold(deftree!(+ (pow x (+ y 0)) 0), deftree!(pow x y));
        check_fold(deftree!(- (pow (- x 0) (* 1 y)) 0), deftree!(pow x y));
        check_fold(deftree!(pow (pow (pow x 1) (pow y 1)) (pow 1 1)), deftree!(pow x y));
        check_fold(deftree!(pow (/ x 1) (/ y (pow x (* t 0)))), deftree!(pow x y));
        check_fold(deftree!(pow (+ x (* t 0)) (+ y (* 0 t))), deftree!(pow x y));
        check_fold(deftree!(* (entry A 1 1) (/ 0 x)), deftree!(0));
        check_fold(
            deftree!(pow (+ (cos (* x (* 1 (+ 1 (* 0 x)))))
                          (/ 1 (* (sin (- y 0)) 1))) (* (* (+ 2 0) (+ x y)) 1)),
            deftree!(pow (+ (cos x) (/ 1 (sin y))) (* 2 (+ x y))),
        );
    }

    #[test]
    fn t_negations() {
        check_fold(deftree!(- 0 (* x y)), deftree!(- (* x y)));
        check_fold(deftree!(+ x (* (- 1) y)), deftree!(- x y));
        check_fold(deftree!(+ (* y (- 1)) x), deftree!(- x y));
        check_fold(deftree!(- x (- (- y))), deftree!(- x y));
        check_fold(deftree!(- (- y x)), deftree!(- x y));
        check_fold(deftree!(- x (- y)), deftree!(+ x y));
        check_fold(deftree!(log (exp (* 2 x))), deftree!(* 2 x));
    }
}
