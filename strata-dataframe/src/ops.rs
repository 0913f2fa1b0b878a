//! Named operator methods for the lazy frame and series types.

use paste::paste;
use strata_error::StrataResult;
use strata_scalar::{BinaryOperator, Scalar};

use crate::frame::DataFrame;
use crate::series::Series;

/// `$name`, `$name_scalar` and the reflected `r$name` for arithmetic operators.
macro_rules! arithmetic_methods {
    ($T:ty; $($name:ident => $op:ident),* $(,)?) => {
        paste! {
            impl $T {
                $(
                    #[doc = "Elementwise `" $name "` of two collections, aligned first."]
                    pub fn $name(&self, other: &Self) -> StrataResult<Self> {
                        self.binary(other, BinaryOperator::$op)
                    }

                    #[doc = "Elementwise `" $name "` with a scalar on the right."]
                    pub fn [<$name _scalar>]<S: Into<Scalar>>(&self, other: S) -> StrataResult<Self> {
                        self.binary_scalar(&other.into(), BinaryOperator::$op)
                    }

                    #[doc = "Elementwise `" $name "` with a scalar on the left."]
                    pub fn [<r $name>]<S: Into<Scalar>>(&self, other: S) -> StrataResult<Self> {
                        self.rbinary_scalar(&other.into(), BinaryOperator::$op)
                    }
                )*
            }
        }
    };
}

/// `$name` and `$name_scalar` for comparison and logical operators.
macro_rules! comparison_methods {
    ($T:ty; $($name:ident => $op:ident),* $(,)?) => {
        paste! {
            impl $T {
                $(
                    #[doc = "Elementwise `" $name "` of two collections, aligned first."]
                    pub fn $name(&self, other: &Self) -> StrataResult<Self> {
                        self.binary(other, BinaryOperator::$op)
                    }

                    #[doc = "Elementwise `" $name "` against a scalar."]
                    pub fn [<$name _scalar>]<S: Into<Scalar>>(&self, other: S) -> StrataResult<Self> {
                        self.binary_scalar(&other.into(), BinaryOperator::$op)
                    }
                )*
            }
        }
    };
}

macro_rules! operator_methods {
    ($($T:ty),*) => {
        $(
            arithmetic_methods!($T;
                add => Add,
                sub => Sub,
                mul => Mul,
                truediv => Div,
                floordiv => FloorDiv,
                modulo => Mod,
                pow => Pow,
            );
            comparison_methods!($T;
                eq => Eq,
                ne => NotEq,
                lt => Lt,
                le => Lte,
                gt => Gt,
                ge => Gte,
                and => And,
                or => Or,
                xor => Xor,
            );
        )*
    };
}

operator_methods!(DataFrame, Series);
