use std::sync::Arc;

use itertools::Itertools;
use strata_error::{StrataResult, strata_bail};
use strata_frame::{Column, Frame};
use strata_graph::TaskValue;
use strata_scalar::Scalar;

/// The value of one task: a partition or an intermediate result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datum {
    Frame(Frame),
    Series(strata_frame::Series),
    Index(strata_frame::Index),
    Scalar(Scalar),
    List(Arc<[Datum]>),
}

impl TaskValue for Datum {
    fn from_list(values: Vec<Self>) -> Self {
        Datum::List(values.into())
    }
}

impl Datum {
    pub fn kind(&self) -> &'static str {
        match self {
            Datum::Frame(_) => "frame",
            Datum::Series(_) => "series",
            Datum::Index(_) => "index",
            Datum::Scalar(_) => "scalar",
            Datum::List(_) => "list",
        }
    }

    pub fn as_frame(&self) -> StrataResult<&Frame> {
        match self {
            Datum::Frame(f) => Ok(f),
            other => strata_bail!(ComputeError: "expected a frame, found a {}", other.kind()),
        }
    }

    pub fn as_series(&self) -> StrataResult<&strata_frame::Series> {
        match self {
            Datum::Series(s) => Ok(s),
            other => strata_bail!(ComputeError: "expected a series, found a {}", other.kind()),
        }
    }

    pub fn as_index(&self) -> StrataResult<&strata_frame::Index> {
        match self {
            Datum::Index(i) => Ok(i),
            other => strata_bail!(ComputeError: "expected an index, found a {}", other.kind()),
        }
    }

    pub fn as_scalar(&self) -> StrataResult<&Scalar> {
        match self {
            Datum::Scalar(s) => Ok(s),
            other => strata_bail!(ComputeError: "expected a scalar, found a {}", other.kind()),
        }
    }

    pub fn as_list(&self) -> StrataResult<&[Datum]> {
        match self {
            Datum::List(l) => Ok(l),
            other => strata_bail!(ComputeError: "expected a list, found a {}", other.kind()),
        }
    }

    /// The row labels of a partition.
    pub fn index(&self) -> StrataResult<&strata_frame::Index> {
        match self {
            Datum::Frame(f) => Ok(f.index()),
            Datum::Series(s) => Ok(s.index()),
            Datum::Index(i) => Ok(i),
            other => strata_bail!(ComputeError: "a {} has no index", other.kind()),
        }
    }

    pub fn len(&self) -> StrataResult<usize> {
        match self {
            Datum::List(l) => Ok(l.len()),
            Datum::Scalar(_) => Ok(1),
            other => Ok(other.index()?.len()),
        }
    }

    pub fn is_empty(&self) -> StrataResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn take(&self, positions: &[usize]) -> StrataResult<Datum> {
        Ok(match self {
            Datum::Frame(f) => Datum::Frame(f.take(positions)?),
            Datum::Series(s) => Datum::Series(s.take(positions)?),
            Datum::Index(i) => Datum::Index(i.take(positions)?),
            other => strata_bail!(ComputeError: "cannot take rows of a {}", other.kind()),
        })
    }

    pub fn head(&self, n: usize) -> StrataResult<Datum> {
        let len = self.len()?;
        self.take(&(0..n.min(len)).collect_vec())
    }

    pub fn tail(&self, n: usize) -> StrataResult<Datum> {
        let len = self.len()?;
        self.take(&(len.saturating_sub(n)..len).collect_vec())
    }

    /// Rows labelled within `[lower, upper]`, the upper end exclusive unless `include_upper`.
    pub fn loc_range(
        &self,
        lower: Option<&Scalar>,
        upper: Option<&Scalar>,
        include_upper: bool,
    ) -> StrataResult<Datum> {
        self.take(&self.index()?.positions_between(lower, upper, include_upper))
    }

    pub fn loc_label(&self, label: &Scalar) -> StrataResult<Datum> {
        self.take(&self.index()?.positions_of(label))
    }

    /// The rows selected by a boolean series aligned on labels.
    pub fn filter_by(&self, mask: &strata_frame::Series) -> StrataResult<Datum> {
        Ok(match self {
            Datum::Frame(f) => Datum::Frame(f.filter_by(mask)?),
            Datum::Series(s) => Datum::Series(s.filter_by(mask)?),
            other => strata_bail!(ComputeError: "cannot filter a {}", other.kind()),
        })
    }

    pub fn sort_index(&self) -> StrataResult<Datum> {
        Ok(match self {
            Datum::Frame(f) => Datum::Frame(f.sort_index()?),
            Datum::Series(s) => Datum::Series(s.sort_index()?),
            Datum::Index(i) => {
                let order = strata_frame::align::sort_permutation(i);
                Datum::Index(i.take(&order)?)
            }
            other => strata_bail!(ComputeError: "cannot sort a {}", other.kind()),
        })
    }

    /// Stack partitions of the same kind end to end.
    ///
    /// Scalars stack into a series, lists are flattened.
    pub fn concat(parts: &[Datum]) -> StrataResult<Datum> {
        let Some(first) = parts.first() else {
            strata_bail!(ComputeError: "cannot concatenate zero partitions");
        };
        Ok(match first {
            Datum::Frame(_) => Datum::Frame(Frame::concat(
                parts.iter().map(Datum::as_frame).try_collect::<_, Vec<_>, _>()?,
            )?),
            Datum::Series(_) => Datum::Series(strata_frame::Series::concat(
                parts.iter().map(Datum::as_series).try_collect::<_, Vec<_>, _>()?,
            )?),
            Datum::Index(_) => Datum::Index(strata_frame::Index::concat(
                parts.iter().map(Datum::as_index).try_collect::<_, Vec<_>, _>()?,
            )),
            Datum::Scalar(_) => {
                let values: Vec<Scalar> = parts
                    .iter()
                    .map(|p| p.as_scalar().cloned())
                    .try_collect()?;
                Datum::Series(strata_frame::Series::new(None, Column::new(values)))
            }
            Datum::List(_) => {
                let flat: Vec<Datum> = parts
                    .iter()
                    .map(|p| p.as_list().map(|l| l.to_vec()))
                    .flatten_ok()
                    .try_collect()?;
                Datum::List(flat.into())
            }
        })
    }
}

impl From<Frame> for Datum {
    fn from(value: Frame) -> Self {
        Datum::Frame(value)
    }
}

impl From<strata_frame::Series> for Datum {
    fn from(value: strata_frame::Series) -> Self {
        Datum::Series(value)
    }
}

impl From<strata_frame::Index> for Datum {
    fn from(value: strata_frame::Index) -> Self {
        Datum::Index(value)
    }
}

impl From<Scalar> for Datum {
    fn from(value: Scalar) -> Self {
        Datum::Scalar(value)
    }
}

/// A local value a lazy collection computes to.
pub trait FromDatum: Sized {
    fn from_datum(datum: Datum) -> StrataResult<Self>;
}

impl FromDatum for Frame {
    fn from_datum(datum: Datum) -> StrataResult<Self> {
        match datum {
            Datum::Frame(f) => Ok(f),
            other => strata_bail!(ComputeError: "expected a frame, found a {}", other.kind()),
        }
    }
}

impl FromDatum for strata_frame::Series {
    fn from_datum(datum: Datum) -> StrataResult<Self> {
        match datum {
            Datum::Series(s) => Ok(s),
            other => strata_bail!(ComputeError: "expected a series, found a {}", other.kind()),
        }
    }
}

impl FromDatum for strata_frame::Index {
    fn from_datum(datum: Datum) -> StrataResult<Self> {
        match datum {
            Datum::Index(i) => Ok(i),
            other => strata_bail!(ComputeError: "expected an index, found a {}", other.kind()),
        }
    }
}

impl FromDatum for Scalar {
    fn from_datum(datum: Datum) -> StrataResult<Self> {
        match datum {
            Datum::Scalar(s) => Ok(s),
            other => strata_bail!(ComputeError: "expected a scalar, found a {}", other.kind()),
        }
    }
}

/// The argument at `position`, or a shape error naming the task.
pub(crate) fn arg<'a>(args: &'a [Datum], position: usize, task: &str) -> StrataResult<&'a Datum> {
    match args.get(position) {
        Some(a) => Ok(a),
        None => strata_bail!(
            ComputeError: "task {} expected at least {} arguments, got {}",
            task,
            position + 1,
            args.len()
        ),
    }
}
