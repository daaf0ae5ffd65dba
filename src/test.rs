use crate::{
    assert_float_eq,
    eval::ValueEvaluator,
    tree::{Label, Tree},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Helper for sampling multiple variables at once.
pub(crate) struct Sampler {
    samples_per_var: usize,
    var_samples: Vec<f64>,
    sample: Vec<f64>,
    counter: Vec<usize>,
    done: bool,
}

impl Sampler {
    /// Sample every variable in `vardata`, given as (label, lower, upper),
    /// `samples_per_var` times. `next` walks through all combinations.
    pub fn new<L>(vardata: &[(L, f64, f64)], samples_per_var: usize, seed: u64) -> Sampler {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut var_samples = Vec::with_capacity(vardata.len() * samples_per_var);
        for (_label, lower, upper) in vardata {
            let span = upper - lower;
            for _ in 0..samples_per_var {
                var_samples.push(lower + rng.random::<f64>() * span);
            }
        }
        Sampler {
            samples_per_var,
            var_samples,
            sample: vec![f64::NAN; vardata.len()],
            counter: vec![0; vardata.len()],
            done: false,
        }
    }

    pub fn next(&mut self) -> Option<&[f64]> {
        if self.done {
            return None;
        }
        for (i, c) in self.counter.iter().enumerate() {
            self.sample[i] = self.var_samples[i * self.samples_per_var + *c];
        }
        for c in self.counter.iter_mut() {
            *c += 1;
            if *c < self.samples_per_var {
                break;
            } else {
                *c = 0;
            }
        }
        if self.counter.iter().all(|c| *c == 0) {
            self.done = true;
        }
        Some(&self.sample)
    }
}

/// Evaluate `tree` at randomly sampled values of its variables, and check the
/// results are within `eps` of the values written by `expectedfn` for the same
/// sample. Each entry of `vardata` is (label, lower bound, upper bound).
pub fn check_value_eval<L, F>(
    tree: Tree,
    mut expectedfn: F,
    vardata: &[(L, f64, f64)],
    samples_per_var: usize,
    eps: f64,
) where
    L: Into<Label> + Copy,
    F: FnMut(&[f64], &mut [f64]),
{
    let mut eval = ValueEvaluator::new(&tree);
    let mut sampler = Sampler::new(vardata, samples_per_var, 42);
    let mut expected = vec![f64::NAN; tree.num_roots()];
    let symbols: Vec<Label> = vardata.iter().map(|(label, ..)| (*label).into()).collect();
    while let Some(sample) = sampler.next() {
        for (&label, &value) in symbols.iter().zip(sample.iter()) {
            eval.set_value(label, value);
        }
        let results = eval.run().unwrap();
        assert_eq!(results.len(), expected.len());
        expected.fill(f64::NAN);
        expectedfn(sample, &mut expected);
        for (lhs, rhs) in expected.iter().zip(results.iter()) {
            assert_float_eq!(lhs, rhs, eps, sample);
        }
    }
}

/// Compare `tree1` and `tree2` by evaluating both at the same samples. Each
/// entry of `vardata` is (label, min, max) for a variable of the trees. Every
/// variable is sampled `samples_per_var` times and the trees are compared at
/// all combinations of the samples, so keep the number of variables small.
pub fn compare_trees<L>(
    tree1: &Tree,
    tree2: &Tree,
    vardata: &[(L, f64, f64)],
    samples_per_var: usize,
    eps: f64,
) where
    L: Into<Label> + Copy,
{
    assert_eq!(tree1.dims(), tree2.dims(), "Trees must have the same dimensions");
    let mut eval2 = ValueEvaluator::new(tree2);
    let symbols: Vec<Label> = vardata.iter().map(|(label, ..)| (*label).into()).collect();
    check_value_eval(
        tree1.clone(),
        |sample, expected| {
            for (&label, &value) in symbols.iter().zip(sample.iter()) {
                eval2.set_value(label, value);
            }
            expected.copy_from_slice(eval2.run().unwrap());
        },
        vardata,
        samples_per_var,
        eps,
    );
}

/// Partial derivatives of every root of `tree` with respect to `param`, at the
/// point given by `values`, approximated with central differences of step
/// `eps`.
pub fn central_difference(
    tree: &Tree,
    values: &[(Label, f64)],
    param: Label,
    eps: f64,
) -> Vec<f64> {
    let mut eval = ValueEvaluator::new(tree);
    let mut at = |offset: f64| {
        for (label, value) in values {
            let value = if *label == param { value + offset } else { *value };
            eval.set_value(*label, value);
        }
        eval.run().unwrap().to_vec()
    };
    let right = at(eps);
    let left = at(-eps);
    right
        .iter()
        .zip(left.iter())
        .map(|(r, l)| (r - l) / (2. * eps))
        .collect()
}
