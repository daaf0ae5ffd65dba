use rand::{Rng, SeedableRng, rngs::StdRng};
use symgrad::{
    Dialect, GradientProblem, MatrixSymbol, add, assert_float_eq, eval::ValueEvaluator, matmul,
    simplify, transpose,
};

fn symbols(size: usize) -> (MatrixSymbol, MatrixSymbol) {
    (
        MatrixSymbol::new('A', size, size).unwrap(),
        MatrixSymbol::new('x', size, 1).unwrap(),
    )
}

#[test]
fn t_gradient_is_symmetrized_product() {
    let problem = GradientProblem::default();
    let grad = problem.gradient().unwrap();
    let (a, x) = symbols(4);
    let expected = simplify(matmul(
        add(Ok(a.tree()), transpose(Ok(a.tree()))),
        Ok(x.tree()),
    ))
    .unwrap();
    assert_eq!(grad.dims(), (4, 1));
    assert!(grad.equivalent(&expected));
    let mut lhs = ValueEvaluator::new(&grad);
    let mut rhs = ValueEvaluator::new(&expected);
    let mut rng = StdRng::seed_from_u64(42);
    let labels: Vec<_> = a.tree().symbols().into_iter().chain(x.tree().symbols()).collect();
    for _ in 0..50 {
        for label in labels.iter() {
            let value = rng.random_range(-10.0..10.0);
            lhs.set_value(*label, value);
            rhs.set_value(*label, value);
        }
        let expected = rhs.run().unwrap().to_vec();
        for (l, r) in lhs.run().unwrap().iter().zip(expected.iter()) {
            assert_float_eq!(*l, *r, 1e-10);
        }
    }
}

#[test]
fn t_quadratic_form_value() {
    let problem = GradientProblem::default();
    let f = problem.quadratic_form().unwrap();
    let (a, x) = symbols(4);
    let mut eval = ValueEvaluator::new(&f);
    let mut rng = StdRng::seed_from_u64(7);
    let avals: Vec<f64> = (0..16).map(|_| rng.random_range(-1.0..1.0)).collect();
    let xvals: Vec<f64> = (0..4).map(|_| rng.random_range(-1.0..1.0)).collect();
    for r in 0..4 {
        for c in 0..4 {
            eval.set_value(a.label(r, c).unwrap(), avals[r * 4 + c]);
        }
        eval.set_value(x.label(r, 0).unwrap(), xvals[r]);
    }
    let mut expected = 0.;
    for r in 0..4 {
        for c in 0..4 {
            expected += xvals[r] * avals[r * 4 + c] * xvals[c];
        }
    }
    assert_float_eq!(eval.run().unwrap()[0], expected, 1e-12);
}

fn balanced(text: &str) -> bool {
    let mut depth = 0i64;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

#[test]
fn t_latex() {
    let report = GradientProblem::default().solve().unwrap();
    for latex in [&report.latex, &report.equation_latex] {
        assert!(latex.contains("A_{"));
        assert!(latex.contains("x_{"));
        assert!(latex.contains("\\begin{bmatrix}"));
        assert!(latex.ends_with("\\end{bmatrix}"));
        assert!(balanced(latex));
    }
    assert!(report.equation_latex.starts_with("g = "));
    assert_eq!(report.equation_latex, format!("g = {}", report.latex));
}

#[test]
fn t_text() {
    let report = GradientProblem::default().solve().unwrap();
    assert!(report.text.starts_with("[[2*A[0, 0]*x[0, 0] + "));
    assert_eq!(report.text.matches("], [").count(), 3);
}

fn parameter_names(code: &str, routine: &str) -> Vec<String> {
    let start = code.find(&format!("{routine}(")).unwrap() + routine.len() + 1;
    let end = start + code[start..].find(')').unwrap();
    code[start..end]
        .split(", ")
        .map(|param| {
            param
                .split(':')
                .next()
                .unwrap()
                .trim_start_matches("const double *")
                .trim_start_matches("double *")
                .to_string()
        })
        .collect()
}

#[test]
fn t_rust_signature() {
    let report = GradientProblem::default().solve().unwrap();
    assert!(report.code.starts_with("// Code generated by symgrad"));
    assert!(report.code.contains("This file is part of 'linalg_kernels'."));
    assert!(report.code.contains(
        "pub fn quad_and_grad(A: &[f64; 16], x: &[f64; 4], g: &mut [f64; 4]) -> f64 {"
    ));
    assert_eq!(parameter_names(&report.code, "quad_and_grad"), ["A", "x", "g"]);
    for i in 0..4 {
        assert!(report.code.contains(&format!("    g[{i}] = ")));
    }
    // No blank lines unless asked for.
    assert!(!report.code.contains("\n\n"));
}

#[test]
fn t_c_signature() {
    let problem = GradientProblem {
        dialect: Dialect::C,
        ..Default::default()
    };
    let report = problem.solve().unwrap();
    assert!(report.code.starts_with("/*"));
    assert_eq!(parameter_names(&report.code, "quad_and_grad"), ["A", "x", "g"]);
    assert!(report.code.contains("#include <math.h>"));
}

#[test]
fn t_deterministic() {
    let first = GradientProblem::default().solve().unwrap();
    let second = GradientProblem::default().solve().unwrap();
    assert_eq!(first.text, second.text);
    assert_eq!(first.latex, second.latex);
    assert_eq!(first.equation_latex, second.equation_latex);
    assert_eq!(first.code, second.code);
}
