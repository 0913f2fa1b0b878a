use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::Scalar;

impl Scalar {
    /// Values of different ranks order by rank, numbers share a rank.
    fn rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::Int(_) | Scalar::Float(_) => 2,
            Scalar::Utf8(_) => 3,
            Scalar::Timestamp(_) => 4,
            Scalar::Duration(_) => 5,
            Scalar::Tuple(_) => 6,
        }
    }

    /// Whether two values can be ordered against each other meaningfully.
    ///
    /// Nulls are comparable with everything, numbers with numbers.
    pub fn is_comparable_with(&self, other: &Scalar) -> bool {
        self.is_null() || other.is_null() || self.rank() == other.rank()
    }
}

fn cmp_int_float(i: i64, f: f64) -> Ordering {
    (i as f64).partial_cmp(&f).unwrap_or(Ordering::Equal)
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => Ordering::Equal,
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Float(a), Scalar::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Scalar::Int(a), Scalar::Float(b)) => cmp_int_float(*a, *b),
            (Scalar::Float(a), Scalar::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Scalar::Utf8(a), Scalar::Utf8(b)) => a.cmp(b),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a.cmp(b),
            (Scalar::Duration(a), Scalar::Duration(b)) => a.cmp(b),
            (Scalar::Tuple(a), Scalar::Tuple(b)) => a.iter().cmp(b.iter()),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Bool(b) => b.hash(state),
            Scalar::Int(i) => i.hash(state),
            Scalar::Float(f) => {
                // Integral floats must hash like the equal integer.
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    #[allow(clippy::cast_possible_truncation)]
                    let i = *f as i64;
                    i.hash(state)
                } else {
                    f.to_bits().hash(state)
                }
            }
            Scalar::Utf8(s) => s.hash(state),
            Scalar::Timestamp(t) => t.hash(state),
            Scalar::Duration(d) => d.hash(state),
            Scalar::Tuple(t) => t.hash(state),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use rstest::rstest;

    use crate::Scalar;

    #[rstest]
    #[case(Scalar::Null, Scalar::from(false))]
    #[case(Scalar::from(true), Scalar::from(-5))]
    #[case(Scalar::from(1), Scalar::from(1.5))]
    #[case(Scalar::from(1.5), Scalar::from(2))]
    #[case(Scalar::from(100), Scalar::from("a"))]
    #[case(Scalar::from("a"), Scalar::from("b"))]
    #[case(
        Scalar::tuple([1.into(), "a".into()]),
        Scalar::tuple([1.into(), "b".into()])
    )]
    fn total_order(#[case] lo: Scalar, #[case] hi: Scalar) {
        assert!(lo < hi);
        assert!(hi > lo);
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(Scalar::from(1), Scalar::from(1.0));
        let set: HashSet<Scalar> = [Scalar::from(1), Scalar::from(1.0), Scalar::from(-0.0)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn comparability() {
        assert!(Scalar::from(1).is_comparable_with(&Scalar::from(2.5)));
        assert!(!Scalar::from(1).is_comparable_with(&Scalar::from("1")));
        assert!(Scalar::Null.is_comparable_with(&Scalar::from("1")));
    }
}
