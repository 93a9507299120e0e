//! Seeded sampling primitives.
//!
//! Every probabilistic decision in generation goes through these helpers so
//! that a campaign replays exactly from its seed. The random source is always
//! passed in by the caller and never held globally.

use crate::{Error, Result};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Anything that carries a selection weight
pub trait Weighted {
    fn weight(&self) -> f64;
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn weight(&self) -> f64 {
        (**self).weight()
    }
}

/// Bernoulli trial.
///
/// Saturated probabilities (`<= 0` or `>= 1`) are decided without touching
/// `rng`; otherwise exactly one uniform `f64` is drawn.
pub fn bernoulli<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> bool {
    if probability <= 0.0 {
        return false;
    }
    if probability >= 1.0 {
        return true;
    }
    rng.gen::<f64>() < probability
}

/// Pick one option with probability proportional to its entry in `weight_of`.
pub fn weighted_select<'a, T, R>(
    options: &'a [T],
    weight_of: &HashMap<T, f64>,
    rng: &mut R,
) -> Result<&'a T>
where
    T: Eq + Hash + Debug,
    R: Rng + ?Sized,
{
    if options.is_empty() {
        return Err(Error::EmptyInput("weighted_select called with no options".to_string()));
    }

    let weights = options
        .iter()
        .map(|option| {
            weight_of
                .get(option)
                .copied()
                .ok_or_else(|| Error::MissingWeight(format!("{:?}", option)))
        })
        .collect::<Result<Vec<f64>>>()?;

    draw(options, &weights, rng)
}

/// Pick one item with probability proportional to its own [`Weighted::weight`].
pub fn choose_weighted<'a, T, R>(options: &'a [T], rng: &mut R) -> Result<&'a T>
where
    T: Weighted,
    R: Rng + ?Sized,
{
    if options.is_empty() {
        return Err(Error::EmptyInput("choose_weighted called with no options".to_string()));
    }
    let weights: Vec<f64> = options.iter().map(Weighted::weight).collect();
    draw(options, &weights, rng)
}

fn draw<'a, T, R: Rng + ?Sized>(options: &'a [T], weights: &[f64], rng: &mut R) -> Result<&'a T> {
    let dist = WeightedIndex::new(weights).map_err(|e| match e {
        WeightedError::NoItem => Error::EmptyInput("no weighted items".to_string()),
        other => Error::InvalidWeight(other.to_string()),
    })?;
    Ok(&options[dist.sample(rng)])
}
