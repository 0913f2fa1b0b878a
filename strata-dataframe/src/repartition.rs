//! Moving rows onto new divisions by splitting and merging partitions.
//!
//! The plan depends only on the two division lists. Output partition `j` takes the rows labelled
//! in `[new[j], new[j+1])` from every input partition, the last output its upper boundary too, and
//! concatenates them in input order. An input partition may hold its own upper boundary, so a
//! row labelled with an inner output boundary is always moved to the partition starting there.
//! An input partition with exactly the range and closedness of an output partition is passed
//! through as it is.

use std::sync::Arc;

use itertools::Itertools;
use strata_error::{StrataResult, strata_bail};
use strata_graph::{Arg, Key, Task, TaskFn, Tokenizer};
use strata_scalar::Scalar;

use crate::collection::Collection;
use crate::datum::{Datum, arg};
use crate::divisions::{Divisions, validate, validate_target};
use crate::naming::deterministic_name;

/// A label range of one input partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub input: usize,
    pub lower: Scalar,
    pub upper: Scalar,
    pub include_upper: bool,
    /// The piece is the entire input partition.
    pub whole: bool,
}

/// The pieces making up each output partition, in order.
pub type RepartitionPlan = Vec<Vec<Piece>>;

/// Plan the move from divisions `old` to `new`.
///
/// Without `force`, `new` must span exactly the range of `old`. With `force` the range may grow,
/// adding empty partitions, or shrink, dropping rows outside it.
pub fn plan_repartition(old: &[Scalar], new: &[Scalar], force: bool) -> StrataResult<RepartitionPlan> {
    validate(old)?;
    validate_target(new)?;
    let (Some(old_first), Some(old_last), Some(new_first), Some(new_last)) =
        (old.first(), old.last(), new.first(), new.last())
    else {
        strata_bail!("divisions must not be empty");
    };
    if !force {
        if new_first != old_first {
            strata_bail!(
                "left side of the new division must equal the existing division: {} != {}",
                new_first,
                old_first
            );
        }
        if new_last != old_last {
            strata_bail!(
                "right side of the new division must equal the existing division: {} != {}",
                new_last,
                old_last
            );
        }
    }

    let nin = old.len() - 1;
    let nout = new.len() - 1;
    let mut plan: RepartitionPlan = vec![Vec::new(); nout];
    for (input, (lo, hi)) in old.iter().tuple_windows().enumerate() {
        let last_input = input + 1 == nin;
        for (output, (start, end)) in new.iter().tuple_windows().enumerate() {
            let last_output = output + 1 == nout;
            if lo == start && hi == end && last_input == last_output {
                // same range, same closedness: the partition passes through untouched
                plan[output].push(Piece {
                    input,
                    lower: lo.clone(),
                    upper: hi.clone(),
                    include_upper: true,
                    whole: true,
                });
                break;
            }
            let lower = lo.max(start);
            let (upper, include_upper) = if hi < end {
                (hi, true)
            } else {
                (end, last_output)
            };
            if lower > upper || (lower == upper && !include_upper) {
                continue;
            }
            plan[output].push(Piece {
                input,
                lower: lower.clone(),
                upper: upper.clone(),
                include_upper,
                whole: lower == lo && upper == hi && include_upper,
            });
        }
    }
    Ok(plan)
}

/// Rewrite `collection` onto `divisions`.
///
/// Output partitions identical to an input partition alias its key, single slices become
/// `repartition-split` tasks and everything else is a `repartition-merge` of split pieces.
pub fn repartition(collection: &Collection, divisions: &[Scalar], force: bool) -> StrataResult<Collection> {
    let old = collection.divisions().require_known("repartition")?;
    if old == divisions {
        return Ok(collection.clone());
    }
    let plan = plan_repartition(old, divisions, force)?;

    let name = deterministic_name(
        "repartition",
        Tokenizer::new("repartition")
            .arg(collection.name().as_ref())
            .option("divisions", divisions)
            .option("force", &force),
    );
    let split_name: Arc<str> = name.replacen("repartition-", "repartition-split-", 1).into();

    let split_fn = TaskFn::new("repartition-split", |args: Vec<Datum>| {
        let part = arg(&args, 0, "repartition-split")?;
        let bounds = arg(&args, 1, "repartition-split")?.as_list()?;
        let [lower, upper, include_upper] = bounds else {
            strata_bail!(ComputeError: "repartition-split expects three bounds");
        };
        part.loc_range(
            Some(lower.as_scalar()?),
            Some(upper.as_scalar()?),
            include_upper.as_scalar()?.is_truthy(),
        )
    });
    let merge_fn = TaskFn::new("repartition-merge", |args: Vec<Datum>| {
        Datum::concat(arg(&args, 0, "repartition-merge")?.as_list()?)
    });
    let empty_fn = TaskFn::new("repartition-empty", |args: Vec<Datum>| {
        arg(&args, 0, "repartition-empty")?.head(0)
    });

    let slice = |piece: &Piece| {
        Task::Call(
            split_fn.clone(),
            vec![
                Arg::Key(collection.key(piece.input)),
                Arg::List(vec![
                    Arg::Literal(Datum::Scalar(piece.lower.clone())),
                    Arg::Literal(Datum::Scalar(piece.upper.clone())),
                    Arg::Literal(Datum::Scalar(Scalar::Bool(piece.include_upper))),
                ]),
            ],
        )
    };

    let mut tasks: Vec<(Key, Task<Datum>)> = Vec::new();
    let mut splits = 0;
    let mut aliased = 0;
    for (j, pieces) in plan.iter().enumerate() {
        let key = Key::new(name.clone(), j);
        let task = match pieces.as_slice() {
            [] => {
                let nearest = (collection.npartitions() - 1).min(j);
                Task::Call(empty_fn.clone(), vec![Arg::Key(collection.key(nearest))])
            }
            [piece] if piece.whole => {
                aliased += 1;
                Task::Alias(collection.key(piece.input))
            }
            [piece] => slice(piece),
            many => {
                let parts = many
                    .iter()
                    .map(|piece| {
                        if piece.whole {
                            return Arg::Key(collection.key(piece.input));
                        }
                        let split_key = Key::new(split_name.clone(), splits);
                        splits += 1;
                        tasks.push((split_key.clone(), slice(piece)));
                        Arg::Key(split_key)
                    })
                    .collect();
                Task::Call(merge_fn.clone(), vec![Arg::List(parts)])
            }
        };
        tasks.push((key, task));
    }
    log::debug!(
        "repartition {} from {} to {} partitions: {} split pieces, {} passed through",
        collection.name(),
        old.len() - 1,
        divisions.len() - 1,
        splits,
        aliased
    );
    Ok(Collection::derive(
        &[collection],
        name,
        tasks,
        Divisions::try_known(divisions.to_vec())?,
    ))
}
