//! Built-in element-wise reductions for [`ReduceOp`].

use crate::payload::Scalar;
use crate::types::ReduceOp;

/// Types a [`ReduceOp`] can combine.
///
/// Scalars combine directly; vectors and arrays combine element by element.
/// Integer `Sum`/`Prod` wrap on overflow so every rank computes the same bits.
pub trait Reducible: Sized {
    fn reduce(a: Self, b: Self, op: ReduceOp) -> Self;
}

impl ReduceOp {
    /// Combine two values with this operation.
    pub fn apply<T: Reducible>(self, a: T, b: T) -> T {
        T::reduce(a, b, self)
    }
}

macro_rules! impl_reducible {
    (int: $($ty:ty),*) => {
        $(
            impl Reducible for $ty {
                #[inline]
                fn reduce(a: Self, b: Self, op: ReduceOp) -> Self {
                    match op {
                        ReduceOp::Sum => a.wrapping_add(b),
                        ReduceOp::Prod => a.wrapping_mul(b),
                        ReduceOp::Min => a.min(b),
                        ReduceOp::Max => a.max(b),
                    }
                }
            }
        )*
    };
    (float: $($ty:ty),*) => {
        $(
            impl Reducible for $ty {
                #[inline]
                fn reduce(a: Self, b: Self, op: ReduceOp) -> Self {
                    match op {
                        ReduceOp::Sum => a + b,
                        ReduceOp::Prod => a * b,
                        ReduceOp::Min => a.min(b),
                        ReduceOp::Max => a.max(b),
                    }
                }
            }
        )*
    };
}

impl_reducible!(int: i8, i16, i32, i64, u8, u16, u32, u64);
impl_reducible!(float: f32, f64);

impl Reducible for bool {
    /// `Sum`/`Max` act as logical OR, `Prod`/`Min` as logical AND.
    fn reduce(a: Self, b: Self, op: ReduceOp) -> Self {
        match op {
            ReduceOp::Sum | ReduceOp::Max => a || b,
            ReduceOp::Prod | ReduceOp::Min => a && b,
        }
    }
}

impl<S: Scalar + Reducible> Reducible for Vec<S> {
    // Shapes are checked against the wire length before combining, so the
    // zip never truncates inside a collective.
    fn reduce(mut a: Self, b: Self, op: ReduceOp) -> Self {
        for (x, y) in a.iter_mut().zip(b) {
            *x = S::reduce(*x, y, op);
        }
        a
    }
}

impl<S: Scalar + Reducible, const N: usize> Reducible for [S; N] {
    fn reduce(mut a: Self, b: Self, op: ReduceOp) -> Self {
        for (x, y) in a.iter_mut().zip(b) {
            *x = S::reduce(*x, y, op);
        }
        a
    }
}
