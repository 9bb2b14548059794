//! Endian-aware primitive reads for signature and attribute blobs.
//!
//! The [`CilIO`] trait gives every fixed-size primitive a uniform little-endian decode so the
//! [`crate::file::parser::Parser`] can offer a single generic `read_le::<T>()` entry point.
//! Blobs in .NET metadata are always little-endian.
//!
//! # Supported Types
//! - **Unsigned integers**: `u8`, `u16`, `u32`, `u64`
//! - **Signed integers**: `i8`, `i16`, `i32`, `i64`
//! - **Floating point**: `f32`, `f64`

use crate::Result;

/// Trait for fixed-size primitives that can be decoded from a little-endian byte slice.
///
/// # Examples
///
/// ```rust
/// use symgraph::file::io::read_le_at;
///
/// let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
/// let mut offset = 0;
/// let first: u16 = read_le_at(&data, &mut offset)?;
/// let second: u32 = read_le_at(&data, &mut offset)?;
/// assert_eq!((first, second, offset), (1, 2, 6));
/// # Ok::<(), symgraph::Error>(())
/// ```
pub trait CilIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_cil_io {
    ($($ty:ty => $size:expr),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; $size];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_cil_io! {
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
    f32 => 4,
    f64 => 8,
}

/// Reads a `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Reads a `T` at `offset` and advances the offset past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let end = offset
        .checked_add(type_len)
        .ok_or_else(|| out_of_bounds_error!())?;
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Appends `value` in the ECMA-335 II.23.2 compressed unsigned form.
///
/// Values above `0x1FFF_FFFF` cannot be represented; they are clamped to the maximum.
#[allow(clippy::cast_possible_truncation)]
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) {
    if value < 0x80 {
        buffer.push(value as u8);
    } else if value < 0x4000 {
        buffer.push(0x80 | (value >> 8) as u8);
        buffer.push(value as u8);
    } else {
        let value = value.min(0x1FFF_FFFF);
        buffer.push(0xC0 | (value >> 24) as u8);
        buffer.push((value >> 16) as u8);
        buffer.push((value >> 8) as u8);
        buffer.push(value as u8);
    }
}

/// Appends `value` in the ECMA-335 II.23.2 compressed signed form.
#[allow(clippy::cast_sign_loss)]
pub fn write_compressed_int(value: i32, buffer: &mut Vec<u8>) {
    let value_bits = if (-64..64).contains(&value) {
        6
    } else if (-8192..8192).contains(&value) {
        13
    } else {
        28
    };

    let mask = (1_u32 << (value_bits + 1)) - 1;
    let rotated = (((value as u32) << 1) & mask) | u32::from(value < 0);
    write_compressed_uint(rotated, buffer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_widths() {
        assert_eq!(read_le::<u8>(&TEST_BUFFER).unwrap(), 0x01);
        assert_eq!(read_le::<i8>(&TEST_BUFFER).unwrap(), 0x01);
        assert_eq!(read_le::<u16>(&TEST_BUFFER).unwrap(), 0x0201);
        assert_eq!(read_le::<u32>(&TEST_BUFFER).unwrap(), 0x0403_0201);
        assert_eq!(read_le::<u64>(&TEST_BUFFER).unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn read_le_float() {
        let bytes = 1.5f64.to_le_bytes();
        assert_eq!(read_le::<f64>(&bytes).unwrap(), 1.5);

        let bytes = (-2.25f32).to_le_bytes();
        assert_eq!(read_le::<f32>(&bytes).unwrap(), -2.25);
    }

    #[test]
    fn read_le_at_advances() {
        let mut offset = 2;
        let value: u16 = read_le_at(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(value, 0x0403);
        assert_eq!(offset, 4);
    }

    #[test]
    fn compressed_writes_read_back() {
        let mut buffer = Vec::new();
        write_compressed_uint(0x7F, &mut buffer);
        write_compressed_uint(0x2E57, &mut buffer);
        write_compressed_uint(0x4000, &mut buffer);
        assert_eq!(buffer, vec![0x7F, 0xAE, 0x57, 0xC0, 0x00, 0x40, 0x00]);

        let mut buffer = Vec::new();
        write_compressed_int(3, &mut buffer);
        write_compressed_int(-3, &mut buffer);
        write_compressed_int(-8192, &mut buffer);
        assert_eq!(buffer, vec![0x06, 0x7B, 0x80, 0x01]);
    }

    #[test]
    fn read_le_at_out_of_bounds() {
        let mut offset = 6;
        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(result, Err(Error::OutOfBounds { .. })));
        assert_eq!(offset, 6);
    }
}
