//! Functions applied to matching partitions of aligned collections.

use std::sync::Arc;

use itertools::Itertools;
use strata_dtype::{FieldName, FieldNames};
use strata_error::{StrataResult, strata_bail};
use strata_graph::{Arg, Task, TaskFn, Tokenizer, function_identity};
use strata_scalar::Scalar;

use crate::align::align_collections;
use crate::collection::{Collection, Partitioned};
use crate::datum::Datum;
use crate::frame::DataFrame;
use crate::naming::{build_graph, deterministic_name};
use crate::series::Series;

/// Run `f` on partition `i` of every input, for each `i`. Inputs are aligned first and the
/// result has the aligned divisions.
pub(crate) fn partitionwise<F>(
    label: &str,
    tokenizer: Tokenizer,
    inputs: &[&Collection],
    f: F,
) -> StrataResult<Collection>
where
    F: Fn(&[Datum]) -> StrataResult<Datum> + Send + Sync + 'static,
{
    let Some(first) = inputs.first() else {
        strata_bail!("{} needs at least one input", label);
    };
    let aligned = if inputs.len() == 1 {
        vec![(*first).clone()]
    } else {
        align_collections(inputs)?
    };
    let aligned = aligned.iter().collect_vec();
    let name = deterministic_name(
        label,
        aligned.iter().fold(tokenizer, |t, c| t.arg(c.name().as_ref())),
    );
    let func = TaskFn::new(label, move |args: Vec<Datum>| f(&args));
    let tasks = (0..aligned[0].npartitions())
        .map(|i| Task::Call(func.clone(), aligned.iter().map(|c| Arg::Key(c.key(i))).collect()))
        .collect();
    Ok(Collection::derive(
        &aligned,
        name.clone(),
        build_graph(&name, tasks),
        aligned[0].divisions().clone(),
    ))
}

/// A user function mapped over partitions, with the metadata of its result given up front.
///
/// ```
/// use strata_dataframe::{MapPartitions, Partitioned, from_frame};
/// use strata_frame::{Column, Frame};
///
/// let local = Frame::from_columns([("a", Column::from(vec![1i64, 2, 3, 4]))]).unwrap();
/// let frame = from_frame(&local, 2).unwrap();
/// let doubled = MapPartitions::new(&frame)
///     .with_token("double")
///     .frame(frame.columns().clone(), |parts| parts[0].as_frame()?.map_columns(|c| {
///         c.map(|v| v.binary(&2.into(), strata_scalar::BinaryOperator::Mul))
///     }).map(Into::into))
///     .unwrap();
/// assert_eq!(doubled.npartitions(), 2);
/// assert!(doubled.root_name().starts_with("double-"));
/// ```
#[derive(Clone)]
pub struct MapPartitions {
    inputs: Vec<Collection>,
    args: Vec<Scalar>,
    token: Option<String>,
}

impl MapPartitions {
    pub fn new<P: Partitioned>(input: &P) -> Self {
        Self {
            inputs: vec![input.collection().clone()],
            args: Vec::new(),
            token: None,
        }
    }

    /// Another collection whose matching partition is passed after the previous ones.
    pub fn with_input<P: Partitioned>(mut self, input: &P) -> Self {
        self.inputs.push(input.collection().clone());
        self
    }

    /// A literal passed after the partitions.
    pub fn with_arg<S: Into<Scalar>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Name the result by `token` instead of the function's identity.
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    fn build<F>(&self, f: F) -> StrataResult<Collection>
    where
        F: Fn(&[Datum]) -> StrataResult<Datum> + Send + Sync + 'static,
    {
        let (label, tokenizer) = match &self.token {
            Some(token) => (token.clone(), Tokenizer::new(token)),
            None => (
                "map-partitions".to_string(),
                Tokenizer::new("map-partitions").arg(&function_identity(&f)),
            ),
        };
        let tokenizer = tokenizer.option("args", &self.args);
        let args: Arc<[Scalar]> = self.args.clone().into();
        let inputs = self.inputs.iter().collect_vec();
        partitionwise(&label, tokenizer, &inputs, move |parts: &[Datum]| {
            let mut all = parts.to_vec();
            all.extend(args.iter().cloned().map(Datum::Scalar));
            f(&all)
        })
    }

    /// Each partition becomes a frame with `columns`.
    pub fn frame<F>(&self, columns: FieldNames, f: F) -> StrataResult<DataFrame>
    where
        F: Fn(&[Datum]) -> StrataResult<Datum> + Send + Sync + 'static,
    {
        Ok(DataFrame::from_collection(self.build(f)?, columns))
    }

    /// Each partition becomes a series named `name`.
    pub fn series<F>(&self, name: Option<FieldName>, f: F) -> StrataResult<Series>
    where
        F: Fn(&[Datum]) -> StrataResult<Datum> + Send + Sync + 'static,
    {
        Ok(Series::from_collection(self.build(f)?, name))
    }
}
