//! Encoding contract for values carried by collectives.
//!
//! Every payload has a fixed little-endian layout: scalars are their
//! `to_le_bytes`, vectors and arrays are their elements back to back, `()`
//! is empty. The layout carries no header, so a receiver learns the element
//! count from the byte length alone.

use crate::error::{CohortError, Result};

/// Fixed-size element that can appear inside a payload.
pub trait Scalar: Copy + Send + 'static {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Decode one element from the first `SIZE` bytes of `bytes`.
    fn read_le(bytes: &[u8]) -> Result<Self>;
    fn write_le(self, out: &mut Vec<u8>);
}

/// A value that can travel through a [`Channel`](crate::transport::Channel).
pub trait Payload: Sized {
    /// Append the encoded form to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Decode from exactly the bytes produced by `encode` on a peer.
    fn decode(bytes: &[u8]) -> Result<Self>;

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

macro_rules! impl_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn read_le(bytes: &[u8]) -> Result<Self> {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    Ok(<$ty>::from_le_bytes(raw))
                }

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }

            impl Payload for $ty {
                fn encode(&self, out: &mut Vec<u8>) {
                    self.write_le(out);
                }

                fn decode(bytes: &[u8]) -> Result<Self> {
                    if bytes.len() != <$ty as Scalar>::SIZE {
                        return Err(CohortError::BufferSizeMismatch {
                            expected: <$ty as Scalar>::SIZE,
                            actual: bytes.len(),
                        });
                    }
                    <$ty as Scalar>::read_le(bytes)
                }
            }
        )*
    };
}

impl_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    fn read_le(bytes: &[u8]) -> Result<Self> {
        match bytes[0] {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(CohortError::DecodeFailed(format!("invalid bool byte {b:#04x}"))),
        }
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }
}

impl Payload for bool {
    fn encode(&self, out: &mut Vec<u8>) {
        self.write_le(out);
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 1 {
            return Err(CohortError::BufferSizeMismatch {
                expected: 1,
                actual: bytes.len(),
            });
        }
        <bool as Scalar>::read_le(bytes)
    }
}

impl Payload for () {
    fn encode(&self, _out: &mut Vec<u8>) {}

    fn decode(bytes: &[u8]) -> Result<Self> {
        if !bytes.is_empty() {
            return Err(CohortError::BufferSizeMismatch {
                expected: 0,
                actual: bytes.len(),
            });
        }
        Ok(())
    }
}

impl<S: Scalar> Payload for Vec<S> {
    fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(self.len() * S::SIZE);
        for &x in self {
            x.write_le(out);
        }
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        if S::SIZE == 0 || bytes.len() % S::SIZE != 0 {
            return Err(CohortError::DecodeFailed(format!(
                "{} bytes is not a whole number of {}-byte elements",
                bytes.len(),
                S::SIZE
            )));
        }
        bytes.chunks_exact(S::SIZE).map(S::read_le).collect()
    }
}

impl<S: Scalar, const N: usize> Payload for [S; N] {
    fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(N * S::SIZE);
        for &x in self {
            x.write_le(out);
        }
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != N * S::SIZE {
            return Err(CohortError::BufferSizeMismatch {
                expected: N * S::SIZE,
                actual: bytes.len(),
            });
        }
        let elems = bytes
            .chunks_exact(S::SIZE)
            .map(S::read_le)
            .collect::<Result<Vec<S>>>()?;
        elems.try_into().map_err(|v: Vec<S>| {
            CohortError::DecodeFailed(format!("expected {N} elements, decoded {}", v.len()))
        })
    }
}
