//! Seeded random sampling and splitting, one independent stream per partition.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_error::{StrataResult, strata_bail};
use strata_frame::sample::{random_split_positions, sample_positions};
use strata_graph::{Arg, Task, TaskFn, Tokenizer};

use crate::collection::Collection;
use crate::datum::{Datum, arg};
use crate::naming::{build_graph, deterministic_name};

/// One seed per partition, drawn from `seed`.
fn partition_seeds(seed: u64, npartitions: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..npartitions).map(|_| rng.random::<u64>()).collect()
}

/// A fraction `frac` of each partition's rows. Without a seed a fresh one is drawn, so the
/// result and its name differ between calls.
pub fn sample(collection: &Collection, frac: f64, seed: Option<u64>) -> StrataResult<Collection> {
    if !(0.0..=1.0).contains(&frac) {
        strata_bail!("sample fraction must be between 0 and 1, got {}", frac);
    }
    let seed = seed.unwrap_or_else(rand::random);
    let name = deterministic_name(
        "sample",
        Tokenizer::new("sample")
            .arg(collection.name().as_ref())
            .option("frac", &frac.to_bits())
            .option("seed", &seed),
    );
    let tasks = partition_seeds(seed, collection.npartitions())
        .into_iter()
        .enumerate()
        .map(|(i, seed)| {
            let func = TaskFn::new("sample", move |args: Vec<Datum>| {
                let part = arg(&args, 0, "sample")?;
                part.take(&sample_positions(part.len()?, frac, seed)?)
            });
            Task::Call(func, vec![Arg::Key(collection.key(i))])
        })
        .collect();
    Ok(Collection::derive(
        &[collection],
        name.clone(),
        build_graph(&name, tasks),
        collection.divisions().clone(),
    ))
}

/// Split the rows into `fracs.len()` collections, each row landing in exactly one of them.
///
/// All outputs share the divisions of the input and one split task per partition.
pub fn random_split(collection: &Collection, fracs: &[f64], seed: Option<u64>) -> StrataResult<Vec<Collection>> {
    let total: f64 = fracs.iter().sum();
    if fracs.is_empty() || fracs.iter().any(|f| *f < 0.0) || total <= 0.0 {
        strata_bail!("split fractions must be non-negative with a positive sum");
    }
    let seed = seed.unwrap_or_else(rand::random);
    let fracs: Arc<[f64]> = fracs.into();
    let bits: Vec<u64> = fracs.iter().map(|f| f.to_bits()).collect();
    let split_name = deterministic_name(
        "split",
        Tokenizer::new("random-split")
            .arg(collection.name().as_ref())
            .option("fracs", &bits)
            .option("seed", &seed),
    );
    let split_tasks = partition_seeds(seed, collection.npartitions())
        .into_iter()
        .enumerate()
        .map(|(i, seed)| {
            let fracs = fracs.clone();
            let func = TaskFn::new("split", move |args: Vec<Datum>| {
                let part = arg(&args, 0, "split")?;
                let pieces: Vec<Datum> = random_split_positions(part.len()?, &fracs, seed)?
                    .iter()
                    .map(|rows| part.take(rows))
                    .collect::<StrataResult<_>>()?;
                Ok(Datum::List(pieces.into()))
            });
            Task::Call(func, vec![Arg::Key(collection.key(i))])
        })
        .collect();
    let splits = Collection::derive(
        &[collection],
        split_name.clone(),
        build_graph(&split_name, split_tasks),
        collection.divisions().clone(),
    );
    log::debug!(
        "random split of {} into {} pieces",
        collection.name(),
        fracs.len()
    );

    Ok((0..fracs.len())
        .map(|k| {
            let name = deterministic_name(
                "split-pick",
                Tokenizer::new("split-pick").arg(split_name.as_ref()).option("k", &k),
            );
            let pick = TaskFn::new("split-pick", move |args: Vec<Datum>| {
                match arg(&args, 0, "split-pick")?.as_list()?.get(k) {
                    Some(piece) => Ok(piece.clone()),
                    None => strata_bail!(ComputeError: "split has no piece {}", k),
                }
            });
            let tasks = splits
                .keys()
                .into_iter()
                .map(|key| Task::Call(pick.clone(), vec![Arg::Key(key)]))
                .collect();
            Collection::derive(
                &[&splits],
                name.clone(),
                build_graph(&name, tasks),
                splits.divisions().clone(),
            )
        })
        .collect())
}

#[cfg(test)]
mod test {
    use strata_frame::{Column, Frame};

    use super::*;
    use crate::config::ComputeOptions;
    use crate::divisions::Divisions;

    fn frame_parts() -> Collection {
        let part = |values: Vec<i64>| {
            Datum::Frame(Frame::from_columns([("a", Column::from(values))]).unwrap())
        };
        Collection::from_partitions(
            "frames".into(),
            vec![part((0..10).collect()), part((10..30).collect())],
            Divisions::unknown(2),
        )
        .unwrap()
    }

    #[test]
    fn seeded_sample_is_stable() {
        let input = frame_parts();
        let a = sample(&input, 0.5, Some(42)).unwrap();
        let b = sample(&input, 0.5, Some(42)).unwrap();
        assert_eq!(a.name(), b.name());
        let options = ComputeOptions::sync();
        let rows = a.compute_concat(&options).unwrap();
        assert_eq!(rows, b.compute_concat(&options).unwrap());
        assert_eq!(rows.len().unwrap(), 15);
        assert_ne!(a.name(), sample(&input, 0.5, Some(7)).unwrap().name());
    }

    #[test]
    fn split_covers_every_row_once() {
        let pieces = random_split(&frame_parts(), &[0.3, 0.7], Some(3)).unwrap();
        assert_eq!(pieces.len(), 2);
        let options = ComputeOptions::sync();
        let total: usize = pieces
            .iter()
            .map(|p| p.compute_concat(&options).unwrap().len().unwrap())
            .sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn invalid_fractions() {
        assert!(sample(&frame_parts(), 1.5, None).unwrap_err().is_invalid_argument());
        assert!(random_split(&frame_parts(), &[], None).unwrap_err().is_invalid_argument());
    }
}
