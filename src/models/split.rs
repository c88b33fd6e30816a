//! Stratified train/test split

use crate::types::prediction::Label;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Split row indices into (train, test), keeping each label's share of the
/// test split close to `test_size`. The same seed yields the same split.
///
/// Every class keeps at least one training row; a class with a single row
/// never reaches the test split.
pub fn stratified_split(labels: &[Label], test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let test_size = test_size.clamp(0.0, 1.0);
    let mut by_class: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for indices in by_class.values_mut() {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let n_test = ((n as f64 * test_size).round() as usize).min(n.saturating_sub(1));
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(integral: usize, parcial: usize) -> Vec<Label> {
        let mut v = vec![Label::Integral; integral];
        v.extend(vec![Label::Parcial; parcial]);
        v
    }

    #[test]
    fn test_proportions_per_class() {
        let y = labels(50, 150);
        let (train, test) = stratified_split(&y, 0.2, 42);

        assert_eq!(train.len() + test.len(), 200);
        let test_integral = test.iter().filter(|&&i| y[i] == Label::Integral).count();
        assert_eq!(test_integral, 10);
        assert_eq!(test.len() - test_integral, 30);
    }

    #[test]
    fn test_disjoint_and_deterministic() {
        let y = labels(17, 23);
        let (train, test) = stratified_split(&y, 0.2, 42);
        assert!(test.iter().all(|i| !train.contains(i)));
        assert_eq!(stratified_split(&y, 0.2, 42), (train.clone(), test.clone()));
        assert_ne!(stratified_split(&y, 0.2, 7).1, test);
    }

    #[test]
    fn test_tiny_class_stays_in_train() {
        let y = labels(1, 10);
        let (train, test) = stratified_split(&y, 0.5, 42);
        assert!(train.contains(&0));
        assert!(!test.contains(&0));
    }

    #[test]
    fn test_empty_input() {
        let (train, test) = stratified_split(&[], 0.2, 42);
        assert!(train.is_empty() && test.is_empty());
    }
}
