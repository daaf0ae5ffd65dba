use crate::{
    error::Error,
    fold::fold,
    prune::Pruner,
    tree::{BinaryOp::*, Label, MaybeTree, Node, Node::*, Tree, UnaryOp::*},
};

/// Compute the symbolic derivative of `tree` with respect to
/// `params`. Irrespective of the dimensions of the input `tree`, it is
/// flattened into a vector of length, say, 'n'. The symbolic derivative is a
/// Jacobian matrix of dimensions n x params.len().
pub fn symbolic_deriv(tree: MaybeTree, params: &[Label]) -> MaybeTree {
    tree?.symbolic_deriv(params)
}

/// Differentiate `tree` with respect to every entry of `wrt`. See
/// `Tree::derive_by_array`.
pub fn derive_by_array(tree: MaybeTree, wrt: MaybeTree) -> MaybeTree {
    tree?.derive_by_array(&wrt?)
}

impl Tree {
    /// Compute the symbolic derivative of `tree` with respect to
    /// `params`. Irrespective of the dimensions of the input `tree`, it is
    /// flattened into a vector of length, say, 'n'. The symbolic derivative is a
    /// Jacobian matrix of dimensions n x params.len().
    pub fn symbolic_deriv(&self, params: &[Label]) -> MaybeTree {
        let roots = self.root_indices();
        let (mut nodes, _dims) = self.clone().take();
        let mut derivs = Vec::<Node>::new();
        let mut derivmap = Vec::<Option<usize>>::new();
        let mut rootnodes = Vec::<usize>::with_capacity(roots.len() * params.len());
        for param in params {
            compute_symbolic_deriv(
                &nodes[0..self.len()],
                nodes.len(),
                *param,
                &mut derivs,
                &mut derivmap,
            );
            nodes.extend(derivs.drain(..));
            for ri in roots.clone() {
                rootnodes.push(match derivmap[ri] {
                    Some(deriv) => deriv,
                    None => return Err(Error::CannotComputeSymbolicDerivative),
                });
            }
        }
        if rootnodes.is_empty() {
            return Err(Error::InvalidDimensions);
        }
        tracing::trace!(
            nodes = nodes.len(),
            params = params.len(),
            "differentiated before compaction"
        );
        // Every (root, param) pair has its own derivative node, so the roots
        // stay distinct through pruning and folding.
        let mut pruner = Pruner::new();
        pruner.run_from_slice(&mut nodes, &mut rootnodes);
        fold(&mut nodes)?;
        pruner.run_from_slice(&mut nodes, &mut rootnodes);
        tracing::debug!(
            nodes = nodes.len(),
            roots = rootnodes.len(),
            "symbolic derivative"
        );
        return Tree::from_nodes(nodes, (roots.len(), params.len()));
    }

    /// Differentiate this tree with respect to every entry of `wrt`, all of
    /// whose roots must be symbols. If this tree is a scalar, the result has
    /// the same shape as `wrt`, i.e. the gradient. Otherwise the result is the
    /// Jacobian of the flattened tree, as returned by `symbolic_deriv`.
    pub fn derive_by_array(&self, wrt: &Tree) -> MaybeTree {
        let params = wrt
            .roots()
            .iter()
            .map(|node| match node {
                Symbol(label) => Ok(*label),
                _ => Err(Error::NotASymbol),
            })
            .collect::<Result<Vec<Label>, Error>>()?;
        let deriv = self.symbolic_deriv(&params)?;
        if self.num_roots() == 1 {
            let (rows, cols) = wrt.dims();
            deriv.reshape(rows, cols)
        } else {
            Ok(deriv)
        }
    }
}

fn compute_symbolic_deriv(
    nodes: &[Node],
    offset: usize,
    param: Label,
    dst: &mut Vec<Node>,
    derivmap: &mut Vec<Option<usize>>,
) {
    dst.clear();
    derivmap.clear();
    derivmap.resize(nodes.len(), None);
    for ni in 0..nodes.len() {
        let deriv = match &nodes[ni] {
            Constant(_val) => Constant(0.),
            Symbol(label) => Constant(if *label == param { 1. } else { 0. }),
            Unary(op, input) => {
                let inputderiv = match derivmap[*input] {
                    Some(index) => index,
                    // A unary op whose input is not differentiable is not differentiable.
                    None => continue,
                };
                match op {
                    Negate => Unary(Negate, inputderiv),
                    Sqrt => {
                        let sf = push_node(Unary(Sqrt, *input), dst) + offset;
                        let c2 = push_node(Constant(2.), dst) + offset;
                        let sf2 = push_node(Binary(Multiply, sf, c2), dst) + offset;
                        Binary(Divide, inputderiv, sf2)
                    }
                    Sin => {
                        let cosf = push_node(Unary(Cos, *input), dst) + offset;
                        Binary(Multiply, cosf, inputderiv) // Chain rule.
                    }
                    Cos => {
                        let sin = push_node(Unary(Sin, *input), dst) + offset;
                        let negsin = push_node(Unary(Negate, sin), dst) + offset;
                        Binary(Multiply, negsin, inputderiv) // Chain rule.
                    }
                    Log => Binary(Divide, inputderiv, *input),
                    Exp => Binary(Multiply, ni, inputderiv),
                }
            }
            Binary(op, lhs, rhs) => {
                // Both inputs need to be differentiable, otherwise this node is not differentiable.
                let lderiv = match derivmap[*lhs] {
                    Some(val) => val,
                    None => continue,
                };
                let rderiv = match derivmap[*rhs] {
                    Some(val) => val,
                    None => continue,
                };
                match op {
                    Add => Binary(Add, lderiv, rderiv),
                    Subtract => Binary(Subtract, lderiv, rderiv),
                    Multiply => {
                        let lr = push_node(Binary(Multiply, *lhs, rderiv), dst) + offset;
                        let rl = push_node(Binary(Multiply, *rhs, lderiv), dst) + offset;
                        Binary(Add, lr, rl)
                    }
                    Divide => {
                        let lr = push_node(Binary(Multiply, lderiv, *rhs), dst) + offset;
                        let rl = push_node(Binary(Multiply, rderiv, *lhs), dst) + offset;
                        let sub = push_node(Binary(Subtract, lr, rl), dst) + offset;
                        let two = push_node(Constant(2.), dst) + offset;
                        let r2 = push_node(Binary(Pow, *rhs, two), dst) + offset;
                        Binary(Divide, sub, r2)
                    }
                    Pow => match nodes[*rhs] {
                        // Power rule, which unlike the general case below, is
                        // defined for non-positive bases.
                        Constant(exponent) => {
                            let reduced = push_node(Constant(exponent - 1.), dst) + offset;
                            let fpow = push_node(Binary(Pow, *lhs, reduced), dst) + offset;
                            let scaled = push_node(Binary(Multiply, *rhs, fpow), dst) + offset;
                            Binary(Multiply, scaled, lderiv) // Chain rule.
                        }
                        _ => {
                            // d(f^g) = f^g * (g' * log(f) + g * f' / f)
                            let logf = push_node(Unary(Log, *lhs), dst) + offset;
                            let gderiv_logf =
                                push_node(Binary(Multiply, rderiv, logf), dst) + offset;
                            let fderiv_over_f =
                                push_node(Binary(Divide, lderiv, *lhs), dst) + offset;
                            let second_term =
                                push_node(Binary(Multiply, *rhs, fderiv_over_f), dst) + offset;
                            let sum =
                                push_node(Binary(Add, gderiv_logf, second_term), dst) + offset;
                            Binary(Multiply, ni, sum)
                        }
                    },
                }
            }
        };
        derivmap[ni] = Some(offset + dst.len());
        dst.push(deriv);
    }
}

fn push_node(node: Node, dst: &mut Vec<Node>) -> usize {
    let idx = dst.len();
    dst.push(node);
    return idx;
}
