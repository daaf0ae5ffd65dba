#[macro_export]
macro_rules! concat_trees {
    ($tree:tt) => {
        $crate::deftree!($tree)
    };
    ($lhs:tt $($rhs:tt) +) => {
        $crate::Tree::concat($crate::deftree!($lhs), $crate::concat_trees!($($rhs) +))
    };
}

/// Construct a tree from the lisp expresion.
#[macro_export]
macro_rules! deftree {
    () => {}; // empty;
    (($($a:tt)*)) => { // Unwrap redundant parens.
        $crate::deftree!($($a)*)
    };
    ($a:block) => { // Block expressions.
        $a
    };
    // Concat
    (concat $($trees:tt) +) => {
        $crate::concat_trees!($($trees) +)
    };
    // Derivatives.
    (sderiv $tree:tt $params:ident) => {{
        let params: Vec<$crate::Label> = stringify!($params).chars().map($crate::Label::scalar).collect();
        $crate::derivative::symbolic_deriv($crate::deftree!($tree), &params)
    }};
    // Reshape
    (reshape $tree:tt $rows:literal $cols:literal) => {
        $crate::reshape($crate::deftree!($tree), $rows, $cols)
    };
    // Entry of a matrix symbol.
    (entry $name:ident $row:literal $col:literal) => {{
        const NAME: &str = {stringify!($name)};
        const {assert!(NAME.len() == 1, "Matrix symbols can only have a single character as an identifier.")};
        let out: Result<$crate::Tree, $crate::Error> = Ok($crate::Tree::symbol(
            $crate::Label::entry(NAME.chars().next().unwrap(), $row, $col)));
        out
    }};
    // Constants.
    (const $tt:expr) => {{
        let out: Result<$crate::Tree, $crate::Error>  = Ok($crate::Tree::constant({$tt}.into()));
        out
    }};
    // Unary ops with functions names.
    ($unary_op:ident $a:tt) => {
        $crate::$unary_op($crate::deftree!($a))
    };
    // Binary ops with function names.
    ($binary_op:ident $a:tt $b:tt) => {
        $crate::$binary_op($crate::deftree!($a), $crate::deftree!($b))
    };
    // Operators.
    (- $a:tt) => {
        $crate::negate($crate::deftree!($a))
    };
    (- $a:tt $b:tt) => {
        $crate::sub($crate::deftree!($a), $crate::deftree!($b))
    };
    (+ $a:tt $b:tt) => {
        $crate::add($crate::deftree!($a), $crate::deftree!($b))
    };
    (/ $a:tt $b:tt) => {
        $crate::div($crate::deftree!($a), $crate::deftree!($b))
    };
    (* $a:tt $b:tt) => {
        $crate::mul($crate::deftree!($a), $crate::deftree!($b))
    };
    // Constants
    ($a:literal) => {{
        let out: Result<$crate::Tree, $crate::Error> = Ok($crate::Tree::constant(($a) as f64));
        out
    }};
    // Symbols
    ($a:ident) => {{
        const LABEL: &str = {stringify!($a)};
        const {assert!(LABEL.len() == 1, "Symbols can only have a single character as an identifier.")};
        let out: Result<$crate::Tree, $crate::Error> = Ok($crate::Tree::symbol(
            $crate::Label::scalar(LABEL.chars().next().unwrap())));
        out
    }};
}

/// Assert that the floating point numbers are equal within the given epsilon.
#[macro_export]
macro_rules! assert_float_eq {
    ($a:expr, $b:expr, $eps:expr, $debug:expr) => {{
        // Make variables to avoid evaluating experssions multiple times.
        let a = $a;
        let b = $b;
        let eps = $eps;
        let error = f64::abs(a - b);
        if error > eps {
            eprintln!("{:?}", $debug);
        }
        assert!(
            error <= eps,
            "Assertion failed: |({}) - ({})| = {:e} <= {:e}",
            a,
            b,
            error,
            eps
        );
    }};
    ($a:expr, $b:expr, $eps:expr) => {
        $crate::assert_float_eq!($a, $b, $eps, "")
    };
    ($a:expr, $b:expr) => {
        $crate::assert_float_eq!($a, $b, f64::EPSILON)
    };
}

#[cfg(test)]
mod test {
    use crate::tree::{BinaryOp::*, Label, Node::*, UnaryOp::*};

    #[test]
    fn t_symbol_deftree() {
        let tree = deftree!(x).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.roots(), &[Symbol(Label::scalar('x'))]);
    }

    #[test]
    fn t_entry_deftree() {
        let tree = deftree!(* (entry A 0 1) (entry x 1 0)).unwrap();
        assert_eq!(
            tree.nodes(),
            &[
                Symbol(Label::entry('A', 0, 1)),
                Symbol(Label::entry('x', 1, 0)),
                Binary(Multiply, 0, 1)
            ]
        );
    }

    #[test]
    fn t_constant_deftree() {
        let tree = deftree!(2.).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.roots(), &[Constant(2.)]);
        let tree = deftree!(3).unwrap();
        assert_eq!(tree.roots(), &[Constant(3.)]);
    }

    #[test]
    fn t_negate_deftree() {
        let tree = deftree!(-x).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.nodes(),
            &[Symbol(Label::scalar('x')), Unary(Negate, 0)]
        );
    }

    #[test]
    fn t_unary_deftree() {
        for (tree, op) in [
            (deftree!(sqrt x), Sqrt),
            (deftree!(sin x), Sin),
            (deftree!(cos x), Cos),
            (deftree!(log x), Log),
            (deftree!(exp x), Exp),
        ] {
            assert_eq!(
                tree.unwrap().nodes(),
                &[Symbol(Label::scalar('x')), Unary(op, 0)]
            );
        }
    }

    #[test]
    fn t_binary_deftree() {
        for (tree, op) in [
            (deftree!(+ x y), Add),
            (deftree!(- x y), Subtract),
            (deftree!(* x y), Multiply),
            (deftree!(/ x y), Divide),
            (deftree!(pow x y), Pow),
        ] {
            assert_eq!(
                tree.unwrap().nodes(),
                &[
                    Symbol(Label::scalar('x')),
                    Symbol(Label::scalar('y')),
                    Binary(op, 0, 1)
                ]
            );
        }
        let tree = deftree!(+ 2. (-x)).unwrap();
        assert_eq!(
            tree.nodes(),
            &[
                Constant(2.),
                Symbol(Label::scalar('x')),
                Unary(Negate, 1),
                Binary(Add, 0, 2)
            ]
        );
    }

    #[test]
    fn t_concat_deftree() {
        let tree = deftree!(concat a b c d).unwrap();
        assert_eq!(
            tree.nodes(),
            &[
                Symbol(Label::scalar('a')),
                Symbol(Label::scalar('b')),
                Symbol(Label::scalar('c')),
                Symbol(Label::scalar('d'))
            ]
        );
        assert_eq!(tree.dims(), (4, 1));
    }
}
