//! Division lists: the boundary labels delimiting the row ranges of partitions.
//!
//! A collection with `n` partitions has `n + 1` divisions. Partition `i` covers labels in
//! `[divisions[i], divisions[i + 1])`, the last partition also includes its upper boundary.
//! Divisions of a collection whose index order is unknown are [`Divisions::Unknown`], and then no
//! label based operation may rely on them.

use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::sync::Arc;

use itertools::Itertools;
use strata_dtype::DType;
use strata_error::{StrataResult, strata_bail};
use strata_frame::compute::{SearchSortedSide, search_sorted};
use strata_scalar::{LabelBound, Scalar};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Divisions {
    /// `npartitions + 1` sorted boundaries.
    Known(Arc<[Scalar]>),
    /// Only the partition count is known.
    Unknown(usize),
}

impl Divisions {
    /// Validated known divisions.
    pub fn try_known(values: Vec<Scalar>) -> StrataResult<Self> {
        validate(&values)?;
        Ok(Divisions::Known(values.into()))
    }

    pub fn unknown(npartitions: usize) -> Self {
        Divisions::Unknown(npartitions)
    }

    /// Divisions from a list where `None` stands for an unknown boundary.
    ///
    /// A list may be entirely known or entirely unknown, never a mix.
    pub fn from_options(values: Vec<Option<Scalar>>) -> StrataResult<Self> {
        if values.len() < 2 {
            strata_bail!("divisions need at least two boundaries, got {}", values.len());
        }
        if values.iter().all(Option::is_none) {
            return Ok(Divisions::Unknown(values.len() - 1));
        }
        match values.into_iter().collect::<Option<Vec<_>>>() {
            Some(known) => Self::try_known(known),
            None => strata_bail!("divisions must be either all known or all unknown"),
        }
    }

    /// `None` for every unknown boundary.
    pub fn to_options(&self) -> Vec<Option<Scalar>> {
        match self {
            Divisions::Known(values) => values.iter().cloned().map(Some).collect(),
            Divisions::Unknown(n) => vec![None; n + 1],
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Divisions::Known(_))
    }

    pub fn npartitions(&self) -> usize {
        match self {
            Divisions::Known(values) => values.len() - 1,
            Divisions::Unknown(n) => *n,
        }
    }

    pub fn values(&self) -> Option<&[Scalar]> {
        match self {
            Divisions::Known(values) => Some(values),
            Divisions::Unknown(_) => None,
        }
    }

    /// The boundaries, or an error naming the operation that needs them.
    pub fn require_known(&self, operation: &str) -> StrataResult<&[Scalar]> {
        match self {
            Divisions::Known(values) => Ok(values),
            Divisions::Unknown(_) => strata_bail!(
                "{} requires known divisions, call set_index or repartition first",
                operation
            ),
        }
    }

    /// The type of the boundary labels, `Null` when unknown.
    pub fn dtype(&self) -> DType {
        self.values()
            .and_then(|v| v.iter().find(|s| s.is_valid()))
            .map(Scalar::dtype)
            .unwrap_or(DType::Null)
    }

    /// The divisions of partitions `range` alone.
    pub fn slice(&self, range: Range<usize>) -> Divisions {
        match self {
            Divisions::Known(values) => Divisions::Known(values[range.start..=range.end].into()),
            Divisions::Unknown(_) => Divisions::Unknown(range.len()),
        }
    }
}

impl Display for Divisions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Divisions::Known(values) => write!(f, "[{}]", values.iter().join(", ")),
            Divisions::Unknown(n) => write!(f, "[{}]", (0..=*n).map(|_| "None").join(", ")),
        }
    }
}

/// Whether every boundary is known.
pub fn known(divisions: &[Option<Scalar>]) -> bool {
    divisions.iter().all(Option::is_some)
}

/// Check that `divisions` has at least two comparable, non-null, non-decreasing boundaries.
pub fn validate(divisions: &[Scalar]) -> StrataResult<()> {
    if divisions.len() < 2 {
        strata_bail!("divisions need at least two boundaries, got {}", divisions.len());
    }
    if divisions.iter().any(Scalar::is_null) {
        strata_bail!("divisions must not contain nulls: [{}]", divisions.iter().join(", "));
    }
    for (a, b) in divisions.iter().tuple_windows() {
        if !a.is_comparable_with(b) {
            strata_bail!("divisions {} and {} are not comparable", a, b);
        }
        if a > b {
            strata_bail!("divisions must be sorted: [{}]", divisions.iter().join(", "));
        }
    }
    Ok(())
}

/// [`validate`], and additionally every boundary but the last must be unique.
///
/// A repartition target may end on a repeated boundary, e.g. `[0, 5, 9, 9]`, but no two output
/// partitions may otherwise start at the same label.
pub fn validate_target(divisions: &[Scalar]) -> StrataResult<()> {
    validate(divisions)?;
    let body = &divisions[..divisions.len() - 1];
    if body.iter().tuple_windows().any(|(a, b)| a == b) {
        strata_bail!(
            "new divisions must be unique, except for the last element: [{}]",
            divisions.iter().join(", ")
        );
    }
    Ok(())
}

/// The partition that owns `label`, clamped to the first and last partition.
///
/// A label equal to an inner boundary belongs to the partition starting there.
pub fn partition_of(divisions: &[Scalar], label: &Scalar) -> usize {
    let last = divisions.len().saturating_sub(2);
    search_sorted(divisions, label, SearchSortedSide::Right)
        .saturating_sub(1)
        .min(last)
}

/// Every partition `i` with `divisions[i] <= label <= divisions[i + 1]`.
///
/// Both the partition ending at a repeated boundary and the one starting at it are candidates,
/// since rows labelled with that boundary may sit in either.
pub fn candidate_partitions(divisions: &[Scalar], label: &Scalar) -> Range<usize> {
    let npartitions = divisions.len().saturating_sub(1);
    let start = search_sorted(divisions, label, SearchSortedSide::Left).saturating_sub(1);
    let end = search_sorted(divisions, label, SearchSortedSide::Right).min(npartitions);
    start.min(end)..end
}

/// Whether `label` lies within the outer boundaries.
pub fn contains(divisions: &[Scalar], label: &Scalar) -> bool {
    match (divisions.first(), divisions.last()) {
        (Some(first), Some(last)) => first <= label && label <= last,
        _ => false,
    }
}

/// Coerce a loc key to the type of the divisions, falling back to the key itself.
pub fn coerce_key(key: &Scalar, divisions: &Divisions, bound: Option<LabelBound>) -> Scalar {
    match divisions.dtype() {
        DType::Null => key.clone(),
        dtype => key.coerce_label(dtype, bound).unwrap_or_else(|_| key.clone()),
    }
}
