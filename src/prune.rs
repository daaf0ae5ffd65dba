use std::ops::Range;

use crate::tree::{Node, Node::*, is_topological_order};

/// Removes the nodes that are not reachable from the roots, and moves the
/// roots to the end.
///
/// The nodes must be in topological order, i.e. every node appears after its
/// inputs. The surviving nodes keep their relative order, so the output is in
/// topological order too. The buffers are owned by the pruner, so reusing one
/// instance avoids allocations.
#[derive(Default)]
pub struct Pruner {
    live: Vec<bool>,
    index_map: Vec<usize>,
    pruned: Vec<Node>,
}

impl Pruner {
    pub fn new() -> Pruner {
        Pruner {
            live: Vec::new(),
            index_map: Vec::new(),
            pruned: Vec::new(),
        }
    }

    /// Prune `nodes`, with the nodes in `root_indices` as the roots. The range
    /// of the roots after pruning is returned. The roots are at the end of
    /// `nodes`, in the same order as they were in `root_indices`.
    pub fn run_from_range(
        &mut self,
        nodes: &mut Vec<Node>,
        root_indices: Range<usize>,
    ) -> Range<usize> {
        let mut roots: Vec<usize> = root_indices.collect();
        self.run_from_slice(nodes, &mut roots);
        (nodes.len() - roots.len())..nodes.len()
    }

    /// Same as `run_from_range`, except the roots are given as a slice of
    /// indices, that need not be contiguous. The indices in `roots` are updated
    /// to their new positions.
    pub fn run_from_slice(&mut self, nodes: &mut Vec<Node>, roots: &mut [usize]) {
        debug_assert!(is_topological_order(nodes));
        self.live.clear();
        self.live.resize(nodes.len(), false);
        // Only the inputs of the roots are marked. The roots are appended at
        // the end separately, so no node can depend on them.
        for root in roots.iter() {
            mark_inputs(&nodes[*root], &mut self.live);
        }
        for index in (0..nodes.len()).rev() {
            if self.live[index] {
                mark_inputs(&nodes[index], &mut self.live);
            }
        }
        self.index_map.clear();
        self.index_map.resize(nodes.len(), 0);
        self.pruned.clear();
        for (index, node) in nodes.iter().enumerate() {
            if self.live[index] {
                self.index_map[index] = self.pruned.len();
                self.pruned.push(remap(*node, &self.index_map));
            }
        }
        let first_root = self.pruned.len();
        for root in roots.iter() {
            self.pruned.push(remap(nodes[*root], &self.index_map));
        }
        for (i, root) in roots.iter_mut().enumerate() {
            *root = first_root + i;
        }
        std::mem::swap(&mut self.pruned, nodes);
    }
}

fn mark_inputs(node: &Node, live: &mut [bool]) {
    match node {
        Constant(_) | Symbol(_) => {}
        Unary(_, input) => live[*input] = true,
        Binary(_, lhs, rhs) => {
            live[*lhs] = true;
            live[*rhs] = true;
        }
    }
}

fn remap(node: Node, index_map: &[usize]) -> Node {
    match node {
        Constant(_) | Symbol(_) => node,
        Unary(op, input) => Unary(op, index_map[input]),
        Binary(op, lhs, rhs) => Binary(op, index_map[lhs], index_map[rhs]),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::{BinaryOp::*, Label, UnaryOp::*};

    const fn s(c: char) -> Node {
        Symbol(Label::scalar(c))
    }

    #[test]
    fn t_prune_unused() {
        let mut nodes = vec![
            s('a'),                 // 0 - unused
            s('x'),                 // 1
            s('y'),                 // 2
            Binary(Add, 1, 2),      // 3
            Unary(Log, 0),          // 4 - unused
            Binary(Multiply, 3, 3), // 5 - root
        ];
        let mut pruner = Pruner::new();
        let mut roots = [5usize];
        pruner.run_from_slice(&mut nodes, &mut roots);
        assert_eq!(
            nodes,
            vec![s('x'), s('y'), Binary(Add, 0, 1), Binary(Multiply, 2, 2)]
        );
        assert_eq!(roots, [3]);
    }

    #[test]
    fn t_scattered_roots() {
        let mut nodes = vec![
            s('p'),                 // 0
            s('x'),                 // 1
            Binary(Multiply, 0, 1), // 2: p * x
            s('y'),                 // 3
            Binary(Multiply, 0, 3), // 4: p * y
            Binary(Add, 1, 3),      // 5: x + y
            Constant(1.0),          // 6
        ];
        let mut pruner = Pruner::new();
        let mut roots = [5usize, 2];
        pruner.run_from_slice(&mut nodes, &mut roots);
        assert_eq!(
            nodes,
            vec![
                s('p'),
                s('x'),
                s('y'),
                Binary(Add, 1, 2),
                Binary(Multiply, 0, 1)
            ]
        );
        assert_eq!(roots, [3, 4]);
    }

    #[test]
    fn t_root_used_by_another_root() {
        // A root that is also an input of another root is kept once among the
        // other nodes and once more as a root.
        let mut nodes = vec![s('x'), Unary(Sin, 0), Unary(Negate, 1)];
        let mut pruner = Pruner::new();
        let roots = pruner.run_from_range(&mut nodes, 1..3);
        assert_eq!(roots, 2..4);
        assert_eq!(
            nodes,
            vec![s('x'), Unary(Sin, 0), Unary(Sin, 0), Unary(Negate, 1)]
        );
    }

    #[test]
    fn t_reuse() {
        let mut pruner = Pruner::new();
        let mut nodes = vec![s('x'), s('y'), Binary(Add, 0, 1)];
        assert_eq!(pruner.run_from_range(&mut nodes, 2..3), 2..3);
        let mut nodes = vec![s('z'), Constant(2.), Binary(Pow, 0, 1), s('w')];
        assert_eq!(pruner.run_from_range(&mut nodes, 2..3), 2..3);
        assert_eq!(nodes, vec![s('z'), Constant(2.), Binary(Pow, 0, 1)]);
    }
}
