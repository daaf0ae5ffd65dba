use crate::{
    polynomial::{Factor, Monomial, Polynomial},
    tree::{BinaryOp::*, MaybeTree, Node, Node::*, Tree, UnaryOp::*},
};

/// Expansions that produce more terms than this keep the subtree as an opaque
/// factor instead.
const MAX_TERMS: usize = 4096;
/// Largest integer exponent that is expanded.
const MAX_DEGREE: u32 = 16;

/// Simplify every root of `tree`. See `Tree::simplify`.
pub fn simplify(tree: MaybeTree) -> MaybeTree {
    tree?.simplify()
}

impl Tree {
    /// Simplify every root of this tree into a canonical sum of products.
    ///
    /// Each root is expanded into a polynomial whose factors are symbols, and
    /// subtrees that can't be expanded, such as `sin(x)`. Like terms are
    /// collected and terms that cancel out are dropped. Each root is then
    /// rebuilt as a sum of terms in ascending order of their monomials, with
    /// the coefficient leading each term and negative coefficients written as
    /// subtractions. Two expressions that expand to the same polynomial produce
    /// structurally identical trees.
    pub fn simplify(self) -> MaybeTree {
        let tree = self.compacted()?;
        let dims = tree.dims();
        let roots = tree.root_indices();
        let (mut nodes, _dims) = tree.take();
        let polys = expand(&nodes);
        let mut rootnodes = Vec::with_capacity(roots.len());
        for ri in roots {
            tracing::trace!(root = ri, terms = polys[ri].len(), "expanded root");
            let built = build_polynomial(&polys[ri], &mut nodes);
            rootnodes.push(nodes[built]);
        }
        nodes.extend(rootnodes);
        let out = Tree::from_nodes(nodes, dims)?.compacted()?;
        tracing::debug!(nodes = out.len(), "simplified");
        Ok(out)
    }
}

/// Expand every node of `nodes` into a polynomial. Nodes that can't be
/// expanded become opaque factors referring to themselves.
fn expand(nodes: &[Node]) -> Vec<Polynomial> {
    let mut polys: Vec<Polynomial> = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        let expanded = match node {
            Constant(value) => Some(Polynomial::constant(*value)),
            Symbol(label) => Some(Polynomial::factor(Factor::Symbol(*label))),
            Unary(Negate, input) => Some(polys[*input].clone().negate()),
            Unary(..) => None,
            Binary(op, lhs, rhs) => {
                let (lpoly, rpoly) = (&polys[*lhs], &polys[*rhs]);
                match op {
                    Add => Some(lpoly.clone().add(rpoly)),
                    Subtract => Some(lpoly.clone().sub(rpoly)),
                    Multiply => lpoly.checked_mul(rpoly, MAX_TERMS),
                    Divide => match rpoly.as_constant() {
                        Some(denom) if denom != 0. => Some(lpoly.clone().scale(1. / denom)),
                        _ => None,
                    },
                    Pow => match rpoly.as_constant() {
                        Some(exp) if exp.fract() == 0. && exp >= 0. && exp <= MAX_DEGREE as f64 => {
                            lpoly.checked_pow(exp as u32, MAX_TERMS)
                        }
                        _ => None,
                    },
                }
            }
        };
        polys.push(match expanded {
            Some(poly) if poly.len() <= MAX_TERMS && poly.is_finite() => poly,
            _ => Polynomial::factor(Factor::Opaque(index)),
        });
    }
    polys
}

fn push_node(nodes: &mut Vec<Node>, node: Node) -> usize {
    nodes.push(node);
    nodes.len() - 1
}

/// Append the nodes of `poly` and return the index of the node representing the
/// whole sum.
fn build_polynomial(poly: &Polynomial, nodes: &mut Vec<Node>) -> usize {
    let mut sum: Option<usize> = None;
    for (mono, coeff) in poly.terms() {
        let term = build_term(mono, coeff.abs(), nodes);
        sum = Some(match (sum, coeff < 0.) {
            (None, false) => term,
            (None, true) => push_node(nodes, Unary(Negate, term)),
            (Some(acc), false) => push_node(nodes, Binary(Add, acc, term)),
            (Some(acc), true) => push_node(nodes, Binary(Subtract, acc, term)),
        });
    }
    match sum {
        Some(index) => index,
        None => push_node(nodes, Constant(0.)),
    }
}

/// Append `coeff * f0^e0 * f1^e1 * ...` as a left associated chain of
/// products. Unit coefficients are omitted.
fn build_term(mono: &Monomial, coeff: f64, nodes: &mut Vec<Node>) -> usize {
    let mut factors: Vec<usize> = Vec::with_capacity(mono.len() + 1);
    if coeff != 1. {
        factors.push(push_node(nodes, Constant(coeff)));
    }
    for (factor, exp) in mono {
        let base = match factor {
            Factor::Symbol(label) => push_node(nodes, Symbol(*label)),
            Factor::Opaque(index) => *index,
        };
        factors.push(if *exp == 1 {
            base
        } else {
            let exp = push_node(nodes, Constant(*exp as f64));
            push_node(nodes, Binary(Pow, base, exp))
        });
    }
    match factors.split_first() {
        Some((first, rest)) => rest.iter().fold(*first, |acc, factor| {
            push_node(nodes, Binary(Multiply, acc, *factor))
        }),
        None => push_node(nodes, Constant(coeff)),
    }
}
