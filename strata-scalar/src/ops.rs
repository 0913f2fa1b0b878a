use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use jiff::SignedDuration;
use strata_error::{StrataResult, strata_bail, strata_err};

use crate::Scalar;

/// Binary element-wise operations on two scalars, or on columns of scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    /// True division, integers divide to floats.
    Div,
    /// Division rounding towards negative infinity.
    FloorDiv,
    /// Remainder with the sign of the divisor.
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Xor,
}

impl BinaryOperator {
    /// A short stable name, used as the prefix of task names.
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Sub => "sub",
            BinaryOperator::Mul => "mul",
            BinaryOperator::Div => "truediv",
            BinaryOperator::FloorDiv => "floordiv",
            BinaryOperator::Mod => "mod",
            BinaryOperator::Pow => "pow",
            BinaryOperator::Eq => "eq",
            BinaryOperator::NotEq => "ne",
            BinaryOperator::Lt => "lt",
            BinaryOperator::Lte => "le",
            BinaryOperator::Gt => "gt",
            BinaryOperator::Gte => "ge",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::Lt
                | BinaryOperator::Lte
                | BinaryOperator::Gt
                | BinaryOperator::Gte
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Xor
        )
    }

    /// The operator with its operands flipped, if one exists: `a op b == b op.swap() a`.
    pub fn swap(self) -> Option<Self> {
        Some(match self {
            BinaryOperator::Lt => BinaryOperator::Gt,
            BinaryOperator::Lte => BinaryOperator::Gte,
            BinaryOperator::Gt => BinaryOperator::Lt,
            BinaryOperator::Gte => BinaryOperator::Lte,
            BinaryOperator::Add
            | BinaryOperator::Mul
            | BinaryOperator::Eq
            | BinaryOperator::NotEq
            | BinaryOperator::And
            | BinaryOperator::Or
            | BinaryOperator::Xor => self,
            BinaryOperator::Sub
            | BinaryOperator::Div
            | BinaryOperator::FloorDiv
            | BinaryOperator::Mod
            | BinaryOperator::Pow => return None,
        })
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::FloorDiv => "//",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Lte => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Gte => ">=",
            BinaryOperator::And => "&",
            BinaryOperator::Or => "|",
            BinaryOperator::Xor => "^",
        };
        Display::fmt(display, f)
    }
}

/// Unary element-wise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Neg,
    Not,
    Abs,
}

impl UnaryOperator {
    pub fn name(&self) -> &'static str {
        match self {
            UnaryOperator::Neg => "neg",
            UnaryOperator::Not => "invert",
            UnaryOperator::Abs => "abs",
        }
    }
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self.name(), f)
    }
}

fn duration_from_nanos(nanos: i128) -> StrataResult<SignedDuration> {
    i64::try_from(nanos)
        .map(SignedDuration::from_nanos)
        .map_err(|_| strata_err!(ComputeError: "duration of {} nanoseconds overflows", nanos))
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

fn float_floor_mod(a: f64, b: f64) -> f64 {
    a - b * (a / b).floor()
}

impl Scalar {
    /// Apply `op` to `self` and `other`.
    ///
    /// Arithmetic involving a null yields null. Comparisons involving a null are false, except
    /// `!=` which is true. Logical operators follow three-valued logic.
    pub fn binary(&self, other: &Scalar, op: BinaryOperator) -> StrataResult<Scalar> {
        if op.is_comparison() {
            return self.compare(other, op).map(Scalar::Bool);
        }
        if op.is_logical() {
            return self.logical(other, op);
        }
        if self.is_null() || other.is_null() {
            return Ok(Scalar::Null);
        }
        self.arithmetic(other, op)
    }

    fn compare(&self, other: &Scalar, op: BinaryOperator) -> StrataResult<bool> {
        if self.is_null() || other.is_null() {
            return Ok(op == BinaryOperator::NotEq);
        }
        if !self.is_comparable_with(other) {
            return match op {
                BinaryOperator::Eq => Ok(false),
                BinaryOperator::NotEq => Ok(true),
                _ => strata_bail!(
                    TypeMismatch: "'{}' not supported between {} and {}",
                    op,
                    self.dtype(),
                    other.dtype()
                ),
            };
        }
        let ord = self.cmp(other);
        Ok(match op {
            BinaryOperator::Eq => ord == Ordering::Equal,
            BinaryOperator::NotEq => ord != Ordering::Equal,
            BinaryOperator::Lt => ord == Ordering::Less,
            BinaryOperator::Lte => ord != Ordering::Greater,
            BinaryOperator::Gt => ord == Ordering::Greater,
            _ => ord != Ordering::Less,
        })
    }

    fn logical(&self, other: &Scalar, op: BinaryOperator) -> StrataResult<Scalar> {
        if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
            if !matches!((self, other), (Scalar::Bool(_), Scalar::Bool(_))) {
                return Ok(Scalar::Int(match op {
                    BinaryOperator::And => a & b,
                    BinaryOperator::Or => a | b,
                    _ => a ^ b,
                }));
            }
        }
        let as_logical = |s: &Scalar| -> StrataResult<Option<bool>> {
            match s {
                Scalar::Null => Ok(None),
                Scalar::Bool(b) => Ok(Some(*b)),
                other => strata_bail!(
                    TypeMismatch: "'{}' not supported for {}",
                    op,
                    other.dtype()
                ),
            }
        };
        let (a, b) = (as_logical(self)?, as_logical(other)?);
        Ok(Scalar::from(match op {
            BinaryOperator::And => match (a, b) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            BinaryOperator::Or => match (a, b) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            _ => a.zip(b).map(|(a, b)| a ^ b),
        }))
    }

    fn arithmetic(&self, other: &Scalar, op: BinaryOperator) -> StrataResult<Scalar> {
        use BinaryOperator::*;
        use Scalar::*;

        match (self, other) {
            (Int(_) | Bool(_), Int(_) | Bool(_)) => {
                let (a, b) = (self.as_i64().unwrap_or(0), other.as_i64().unwrap_or(0));
                Ok(match op {
                    Add => Int(a.wrapping_add(b)),
                    Sub => Int(a.wrapping_sub(b)),
                    Mul => Int(a.wrapping_mul(b)),
                    Div => Scalar::float(a as f64 / b as f64),
                    FloorDiv if b == 0 => Null,
                    FloorDiv => Int(floor_div(a, b)),
                    Mod if b == 0 => Null,
                    Mod => Int(floor_mod(a, b)),
                    Pow => match u32::try_from(b) {
                        Ok(exp) => Int(a.wrapping_pow(exp)),
                        Err(_) => Scalar::float((a as f64).powf(b as f64)),
                    },
                    _ => strata_bail!("{} is not an arithmetic operator", op),
                })
            }
            (Int(_) | Bool(_) | Float(_), Int(_) | Bool(_) | Float(_)) => {
                let (a, b) = (self.as_f64().unwrap_or(0.0), other.as_f64().unwrap_or(0.0));
                Ok(Scalar::float(match op {
                    Add => a + b,
                    Sub => a - b,
                    Mul => a * b,
                    Div => a / b,
                    FloorDiv => (a / b).floor(),
                    Mod => float_floor_mod(a, b),
                    Pow => a.powf(b),
                    _ => strata_bail!("{} is not an arithmetic operator", op),
                }))
            }
            (Utf8(a), Utf8(b)) if op == Add => Ok(Scalar::from(format!("{a}{b}"))),
            (Utf8(a), Int(n)) if op == Mul => {
                Ok(Scalar::from(a.repeat(usize::try_from(*n).unwrap_or(0))))
            }
            (Timestamp(a), Timestamp(b)) if op == Sub => {
                duration_from_nanos(a.as_nanosecond() - b.as_nanosecond()).map(Duration)
            }
            (Timestamp(t), Duration(d)) if matches!(op, Add | Sub) => {
                let delta = d.as_nanos();
                let nanos = if op == Add {
                    t.as_nanosecond() + delta
                } else {
                    t.as_nanosecond() - delta
                };
                Ok(Timestamp(jiff::Timestamp::from_nanosecond(nanos)?))
            }
            (Duration(d), Timestamp(_)) if op == Add => other.arithmetic(&Duration(*d), Add),
            (Duration(a), Duration(b)) => match op {
                Add => duration_from_nanos(a.as_nanos() + b.as_nanos()).map(Duration),
                Sub => duration_from_nanos(a.as_nanos() - b.as_nanos()).map(Duration),
                Div => Ok(Scalar::float(a.as_nanos() as f64 / b.as_nanos() as f64)),
                FloorDiv | Mod => {
                    let (a, b) = (a.as_nanos(), b.as_nanos());
                    if b == 0 {
                        return Ok(Null);
                    }
                    let q = a.div_euclid(b) - i128::from(b < 0 && a.rem_euclid(b) != 0);
                    if op == FloorDiv {
                        Ok(i64::try_from(q).map(Int).unwrap_or(Null))
                    } else {
                        duration_from_nanos(a - q * b).map(Duration)
                    }
                }
                _ => self.unsupported(other, op),
            },
            (Duration(d), Int(_) | Float(_)) if matches!(op, Mul | Div | FloorDiv) => {
                let factor = other.as_f64().unwrap_or(0.0);
                let nanos = d.as_nanos() as f64;
                let scaled = match op {
                    Mul => nanos * factor,
                    Div => nanos / factor,
                    _ => (nanos / factor).floor(),
                };
                if !scaled.is_finite() {
                    return Ok(Null);
                }
                #[allow(clippy::cast_possible_truncation)]
                let scaled = scaled as i128;
                duration_from_nanos(scaled).map(Duration)
            }
            (Int(_) | Float(_), Duration(_)) if op == Mul => other.arithmetic(self, Mul),
            _ => self.unsupported(other, op),
        }
    }

    fn unsupported(&self, other: &Scalar, op: BinaryOperator) -> StrataResult<Scalar> {
        strata_bail!(
            TypeMismatch: "unsupported operand types for {}: {} and {}",
            op,
            self.dtype(),
            other.dtype()
        )
    }

    /// Apply a unary operator. Nulls stay null.
    pub fn unary(&self, op: UnaryOperator) -> StrataResult<Scalar> {
        Ok(match (self, op) {
            (Scalar::Null, _) => Scalar::Null,
            (Scalar::Bool(b), UnaryOperator::Not) => Scalar::Bool(!b),
            (Scalar::Int(i), UnaryOperator::Not) => Scalar::Int(!i),
            (Scalar::Int(i), UnaryOperator::Neg) => Scalar::Int(i.wrapping_neg()),
            (Scalar::Int(i), UnaryOperator::Abs) => Scalar::Int(i.wrapping_abs()),
            (Scalar::Bool(b), UnaryOperator::Neg) => Scalar::Int(-i64::from(*b)),
            (Scalar::Bool(b), UnaryOperator::Abs) => Scalar::Int(i64::from(*b)),
            (Scalar::Float(f), UnaryOperator::Neg) => Scalar::Float(-f),
            (Scalar::Float(f), UnaryOperator::Abs) => Scalar::Float(f.abs()),
            (Scalar::Duration(d), UnaryOperator::Neg) => {
                Scalar::Duration(d.checked_neg().unwrap_or(SignedDuration::MAX))
            }
            (Scalar::Duration(d), UnaryOperator::Abs) => {
                Scalar::Duration(duration_from_nanos(d.as_nanos().abs())?)
            }
            (other, op) => strata_bail!(
                TypeMismatch: "bad operand type for unary {}: {}",
                op,
                other.dtype()
            ),
        })
    }

    /// The smaller of two values, ignoring nulls.
    pub fn min_valid(self, other: Scalar) -> Scalar {
        match (self.is_null(), other.is_null()) {
            (true, _) => other,
            (_, true) => self,
            _ => std::cmp::min(self, other),
        }
    }

    /// The larger of two values, ignoring nulls.
    pub fn max_valid(self, other: Scalar) -> Scalar {
        match (self.is_null(), other.is_null()) {
            (true, _) => other,
            (_, true) => self,
            _ => std::cmp::max(self, other),
        }
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::BinaryOperator::*;
    use super::*;

    #[rstest]
    #[case(Scalar::from(7), Scalar::from(2), Add, Scalar::from(9))]
    #[case(Scalar::from(7), Scalar::from(2), Div, Scalar::from(3.5))]
    #[case(Scalar::from(-7), Scalar::from(2), FloorDiv, Scalar::from(-4))]
    #[case(Scalar::from(-7), Scalar::from(2), Mod, Scalar::from(1))]
    #[case(Scalar::from(7), Scalar::from(0), FloorDiv, Scalar::Null)]
    #[case(Scalar::from(0), Scalar::from(0), Div, Scalar::Null)]
    #[case(Scalar::from(2), Scalar::from(0.5), Mul, Scalar::from(1.0))]
    #[case(Scalar::from(2), Scalar::from(10), Pow, Scalar::from(1024))]
    #[case(Scalar::from(1), Scalar::Null, Add, Scalar::Null)]
    #[case(Scalar::from("a"), Scalar::from("b"), Add, Scalar::from("ab"))]
    fn arithmetic(
        #[case] a: Scalar,
        #[case] b: Scalar,
        #[case] op: BinaryOperator,
        #[case] expected: Scalar,
    ) {
        assert_eq!(a.binary(&b, op).unwrap(), expected);
    }

    #[rstest]
    #[case(Scalar::from(1), Scalar::from(2.0), Lt, true)]
    #[case(Scalar::from(1), Scalar::Null, Eq, false)]
    #[case(Scalar::from(1), Scalar::Null, NotEq, true)]
    #[case(Scalar::from(1), Scalar::from("1"), Eq, false)]
    #[case(Scalar::from("b"), Scalar::from("a"), Gte, true)]
    fn comparison(
        #[case] a: Scalar,
        #[case] b: Scalar,
        #[case] op: BinaryOperator,
        #[case] expected: bool,
    ) {
        assert_eq!(a.binary(&b, op).unwrap(), Scalar::from(expected));
    }

    #[test]
    fn ordering_across_types_fails() {
        let err = Scalar::from(1).binary(&Scalar::from("1"), Lt).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn three_valued_logic() {
        let t = Scalar::from(true);
        let f = Scalar::from(false);
        assert_eq!(Scalar::Null.binary(&f, And).unwrap(), f);
        assert_eq!(Scalar::Null.binary(&t, And).unwrap(), Scalar::Null);
        assert_eq!(Scalar::Null.binary(&t, Or).unwrap(), t);
    }

    #[test]
    fn temporal_arithmetic() {
        let a = Scalar::timestamp_nanos(1_000);
        let b = Scalar::timestamp_nanos(400);
        let d = a.binary(&b, Sub).unwrap();
        assert_eq!(d, Scalar::Duration(SignedDuration::from_nanos(600)));
        assert_eq!(b.binary(&d, Add).unwrap(), a);
        assert_eq!(
            d.binary(&Scalar::from(2), Mul).unwrap(),
            Scalar::Duration(SignedDuration::from_nanos(1_200))
        );
        assert!(a.binary(&b, Add).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn unary() {
        assert_eq!(Scalar::from(-3).unary(UnaryOperator::Abs).unwrap(), 3.into());
        assert_eq!(Scalar::from(true).unary(UnaryOperator::Not).unwrap(), false.into());
        assert!(Scalar::from("x").unary(UnaryOperator::Neg).is_err());
    }

    #[test]
    fn min_max_skip_nulls() {
        assert_eq!(Scalar::Null.min_valid(3.into()), 3.into());
        assert_eq!(Scalar::from(2).max_valid(3.into()), 3.into());
    }
}
