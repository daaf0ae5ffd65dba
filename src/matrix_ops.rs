use crate::{
    BinaryOp::*,
    Error,
    Node::{self, *},
    Tree,
    tree::{MaybeTree, extend_nodes_from_slice},
};

impl Tree {
    /// Matrix product of this tree with `other`. Each entry of the product is a
    /// left associated chain of additions of the pairwise products.
    pub fn matmul(self, other: Tree) -> Result<Tree, Error> {
        let roots_lt = self.root_indices();
        let roots_rt = other.root_indices();
        let (mut lnodes, ldims) = self.take();
        let (rnodes, rdims) = other.take();
        if ldims.1 != rdims.0 {
            return Err(Error::DimensionMismatch(ldims, rdims));
        }
        if ldims.0 == 0 || ldims.1 == 0 || rdims.0 == 0 || rdims.1 == 0 {
            return Err(Error::InvalidDimensions);
        }
        let offset = extend_nodes_from_slice(&mut lnodes, &rnodes);
        let roots_rt = (roots_rt.start + offset)..(roots_rt.end + offset);
        let (lrows, lcols) = ldims;
        let (rrows, rcols) = rdims;
        let (orows, ocols) = (lrows, rcols);
        let mut newroots: Vec<Node> = Vec::with_capacity(ocols * orows);
        for oc in 0..ocols {
            for or in 0..orows {
                let n_before = lnodes.len();
                let rcol_start = oc * rrows;
                let rcol_idx = rcol_start..(rcol_start + rrows);
                let lrow_idx = (0..lcols).map(|c| or + c * lrows);
                lnodes.extend(
                    lrow_idx
                        .zip(rcol_idx)
                        .map(|(li, ri)| Binary(Multiply, li + roots_lt.start, ri + roots_rt.start)),
                );
                let n_after = lnodes.len();
                let prod_range = n_before..n_after;
                // ((p0 + p1) + p2) + ...
                lnodes.extend(
                    std::iter::once(prod_range.start)
                        .chain(n_after..(n_after + prod_range.len().saturating_sub(2)))
                        .zip(prod_range.skip(1))
                        .map(|(l, r)| Binary(Add, l, r)),
                );
                if let Some(last) = lnodes.pop() {
                    newroots.push(last);
                }
            }
        }
        lnodes.append(&mut newroots);
        Tree::from_nodes(lnodes, (orows, ocols))
    }

    pub fn transpose(self) -> Result<Tree, Error> {
        let nroots = self.num_roots();
        let (mut nodes, dims) = self.take();
        let (rows, cols) = dims;
        let ntotal = nodes.len();
        let roots = &mut nodes[(ntotal - nroots)..];
        match (rows, cols) {
            (1, _) | (_, 1) => {} // Vectors keep the same order of roots.
            (r, c) if r == c => {
                for i in 0..rows {
                    for j in (i + 1)..cols {
                        roots.swap(i * cols + j, j * cols + i);
                    }
                }
            }
            _ => {
                let mut newroots = roots.to_vec();
                for i in 0..rows {
                    for j in 0..cols {
                        newroots[i * cols + j] = roots[j * rows + i];
                    }
                }
                roots.copy_from_slice(&newroots);
            }
        }
        Tree::from_nodes(nodes, (cols, rows))
    }

    /// Dot product of two vectors of the same length. Row and column vectors
    /// can be mixed freely. The result is a 1x1 tree.
    pub fn dot_product(self, other: Tree) -> Result<Tree, Error> {
        let ldims = self.dims();
        let rdims = other.dims();
        match (ldims, rdims) {
            ((lr, 1), (rr, 1)) if lr == rr => self.transpose()?.matmul(other),
            ((1, lc), (1, rc)) if lc == rc => self.matmul(other.transpose()?),
            ((lr, 1), (1, rc)) if lr == rc => other.matmul(self),
            ((1, lc), (rr, 1)) if lc == rr => self.matmul(other),
            _ => Err(Error::InvalidDimensions),
        }
    }

    /// Column vector made of the entries at the given (row, column) indices.
    pub fn extract(self, indices: &[(usize, usize)]) -> Result<Tree, Error> {
        let n_roots_new = indices.len();
        if n_roots_new == 0 {
            return Err(Error::InvalidDimensions);
        }
        let n_roots_old = self.num_roots();
        let (mut nodes, dims) = self.take();
        let (rows, cols) = dims;
        let n_keep = nodes.len() - n_roots_old;
        let old_roots = &nodes[n_keep..];
        if let Some((r, c)) = indices.iter().find(|(r, c)| !(*r < rows && *c < cols)) {
            return Err(Error::IndexOutOfBounds(*r, *c));
        }
        let mut new_roots: Vec<Node> = indices
            .iter()
            .map(|(r, c)| old_roots[c * rows + r])
            .collect();
        nodes.truncate(n_keep);
        nodes.append(&mut new_roots);
        Tree::from_nodes(nodes, (n_roots_new, 1))
    }
}

pub fn matmul(lhs: MaybeTree, rhs: MaybeTree) -> MaybeTree {
    lhs?.matmul(rhs?)
}

pub fn transpose(tree: MaybeTree) -> MaybeTree {
    tree?.transpose()
}

pub fn dot_product(lhs: MaybeTree, rhs: MaybeTree) -> MaybeTree {
    lhs?.dot_product(rhs?)
}
