//! Seeded random row selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_error::{StrataResult, strata_bail};

use crate::{Frame, Series};

/// Choose `round(frac * len)` distinct row positions, in ascending order.
pub fn sample_positions(len: usize, frac: f64, seed: u64) -> StrataResult<Vec<usize>> {
    if !(0.0..=1.0).contains(&frac) {
        strata_bail!("sample fraction must be between 0 and 1, got {}", frac);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let amount = ((len as f64) * frac).round() as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions = rand::seq::index::sample(&mut rng, len, amount.min(len)).into_vec();
    positions.sort_unstable();
    Ok(positions)
}

/// Assign every row to one of `fracs.len()` splits, with probabilities proportional to `fracs`.
pub fn random_split_positions(len: usize, fracs: &[f64], seed: u64) -> StrataResult<Vec<Vec<usize>>> {
    let total: f64 = fracs.iter().sum();
    if fracs.is_empty() || fracs.iter().any(|f| *f < 0.0) || total <= 0.0 {
        strata_bail!("split fractions must be non-negative with a positive sum");
    }
    let cumulative: Vec<f64> = fracs
        .iter()
        .scan(0.0, |acc, f| {
            *acc += f / total;
            Some(*acc)
        })
        .collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut splits = vec![Vec::new(); fracs.len()];
    for row in 0..len {
        let draw: f64 = rng.random();
        let split = cumulative
            .iter()
            .position(|c| draw < *c)
            .unwrap_or(fracs.len() - 1);
        splits[split].push(row);
    }
    Ok(splits)
}

impl Frame {
    pub fn sample(&self, frac: f64, seed: u64) -> StrataResult<Frame> {
        self.take(&sample_positions(self.len(), frac, seed)?)
    }

    pub fn random_split(&self, fracs: &[f64], seed: u64) -> StrataResult<Vec<Frame>> {
        random_split_positions(self.len(), fracs, seed)?
            .iter()
            .map(|rows| self.take(rows))
            .collect()
    }
}

impl Series {
    pub fn sample(&self, frac: f64, seed: u64) -> StrataResult<Series> {
        self.take(&sample_positions(self.len(), frac, seed)?)
    }

    pub fn random_split(&self, fracs: &[f64], seed: u64) -> StrataResult<Vec<Series>> {
        random_split_positions(self.len(), fracs, seed)?
            .iter()
            .map(|rows| self.take(rows))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn seeded_sampling_is_deterministic() {
        let a = sample_positions(100, 0.3, 42).unwrap();
        assert_eq!(a.len(), 30);
        assert_eq!(a, sample_positions(100, 0.3, 42).unwrap());
        assert!(a.windows(2).all(|w| w[0] < w[1]));
        assert!(sample_positions(10, 1.5, 0).is_err());
    }

    #[test]
    fn splits_cover_every_row() {
        let splits = random_split_positions(50, &[0.5, 0.5], 7).unwrap();
        assert_eq!(splits.iter().map(Vec::len).sum::<usize>(), 50);
        assert_eq!(splits, random_split_positions(50, &[0.5, 0.5], 7).unwrap());
        assert!(random_split_positions(5, &[], 7).is_err());
    }
}
