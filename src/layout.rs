//! Types with a fully-determined memory layout, and their zero-copy access
//! to byte buffers.
//!
//! # Fixed-Layout Types
//!
//! The main type of interest here is [`FixedLayout`], which is an `unsafe`
//! trait that marks a type as safe to write to or read from a byte buffer
//! directly.  Most importantly, this means that the type must accept any bit
//! pattern without causing undefined behavior, have a consistent binary
//! representation across all platforms (i.e., is usually little-endian), and
//! have no compiler-chosen padding.  Types like `bool` or tagged unions do
//! not qualify: they have bit patterns that must not be materialized, or a
//! payload size that is not statically fixed.
//!
//! Many of the basic types here are auto-generated versions of the typical
//! primitives ([`U16`], [`U32`], etc.).  The difference is that they are (1)
//! always explicitly little-endian on all platforms, and (2) not guaranteed
//! to be aligned.  In practice, the endian conversion will be optimized to a
//! no-op on modern platforms (x86_64, arm, etc...) because they are
//! little-endian themselves.
//!
//! # Access Functions
//!
//! [`FixedLayout`] provides two families of operations:
//!
//! - Cursor-based streaming access (`read`, `view`, `view_mut`,
//!   `view_slice`, `view_slice_mut`, `write`, `write_slice`).  These take a
//!   buffer and a `&mut usize` cursor, which is advanced past the bytes
//!   consumed.  Checked versions bounds-check the access (and, for in-place
//!   views, check alignment) and return a [`ViewErr`] on failure; the
//!   `_u`-suffixed versions are `unsafe` and omit those checks.
//! - Whole-buffer reinterpretation (`from_bytes`, `from_bytes_mut`,
//!   `as_bytes`).  Reading requires the buffer's length to match the type's
//!   size exactly; a record is never assembled from a truncated or oversized
//!   buffer.  Writing out (`as_bytes`) cannot fail.
//!
//! None of these functions copy or transform buffer contents, except for the
//! `read`/`write` families, which copy exactly `size_of::<T>()` bytes and
//! nothing else.
use crate::view::ViewErr;
use core::{
  mem::{align_of, size_of},
  ptr::{copy_nonoverlapping, read_unaligned, write_unaligned},
  slice::{from_raw_parts, from_raw_parts_mut},
};

/// Bounds check that returns [`ViewErr::OutOfBounds`] on failure.
#[inline(always)]
pub(crate) fn bounds_check<T>(buffer: &T, to: usize) -> Result<(), ViewErr>
where
  T: AsRef<[u8]> + ?Sized,
{
  if to > buffer.as_ref().len() {
    let err = ViewErr::OutOfBounds {
      index:  to,
      length: buffer.as_ref().len(),
    };
    Err(err!(trace, err))
  } else {
    Ok(())
  }
}

/// Alignment check for referencing a `T` at the address `addr`.
///
/// Returns [`ViewErr::Unaligned`] if `addr` is not a multiple of
/// `align_of::<T>()`.  For the little-endian types generated in this module
/// this always succeeds, as their alignment is 1.
#[inline(always)]
pub(crate) fn align_check<T>(addr: usize) -> Result<(), ViewErr> {
  if addr % align_of::<T>() == 0 {
    Ok(())
  } else {
    let err = ViewErr::Unaligned {
      needed: align_of::<T>(),
      addr,
    };
    Err(err!(trace, err))
  }
}

/// Rounds `n` up to the next multiple of 8 bytes.
#[inline(always)]
pub(crate) fn round_to_word(n: usize) -> usize {
  (n + 7) & !7
}

/// Indicates a type can be written to and read from a byte buffer directly.
///
/// # Safety
///
/// Implementations guarantee all of the following:
///
/// - Every bit pattern of `size_of::<Self>()` bytes is a valid instance of
///   the type.  (This rules out `bool`, `char`, references, and enums.)
/// - The type has no implicit padding: `repr(C)` with explicit padding
///   fields, `repr(transparent)` over another `FixedLayout` type, or a
///   fixed-size array of such types.
/// - The byte representation is identical on all platforms.  Multi-byte
///   numeric fields must be stored as explicit little-endian byte arrays
///   (e.g., [`U32`]), never as native-endian primitives.
///
/// Given those guarantees, the provided methods can reference instances of
/// the type in place inside a byte buffer without copying a single byte.
///
/// # Examples
///
/// A record with a fully specified 8-byte layout, reinterpreted both ways:
///
/// ```
/// use loupe::layout::{FixedLayout, U16, U32};
///
/// #[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// #[repr(C)]
/// struct Record {
///   id:        U32,
///   value:     U16,
///   is_active: u8,
///   padding:   u8,
/// }
///
/// // SAFETY: Every field is itself `FixedLayout`, the field order is
/// // `repr(C)`, and the one padding byte is an explicit field.
/// unsafe impl FixedLayout for Record {}
///
/// let record = Record {
///   id:        1.into(),
///   value:     2.into(),
///   is_active: 1,
///   padding:   0,
/// };
///
/// // Record -> bytes always succeeds and copies nothing.
/// let bytes = record.as_bytes();
/// assert_eq!(bytes, &[1, 0, 0, 0, 2, 0, 1, 0]);
///
/// // Bytes -> record succeeds only for a buffer of exactly 8 bytes.
/// let restored = Record::from_bytes(bytes).unwrap();
/// assert_eq!(*restored, record);
/// assert!(Record::from_bytes(&bytes[..7]).is_err());
/// ```
pub unsafe trait FixedLayout: Copy + Send + Sync {
  /// Reads a copy of `Self` from `source[cursor]`.
  #[inline(always)]
  fn read<T>(source: &T, cursor: &mut usize) -> Result<Self, ViewErr>
  where
    T: AsRef<[u8]> + ?Sized,
  {
    bounds_check(source, *cursor + size_of::<Self>())?;
    unsafe { Ok(Self::read_u(source, cursor)) }
  }

  /// Reads a copy of `Self` from `source[cursor]`, with no bounds check.
  #[inline(always)]
  unsafe fn read_u<T>(source: &T, cursor: &mut usize) -> Self
  where
    T: AsRef<[u8]> + ?Sized,
  {
    let ptr = source.as_ref().as_ptr().add(*cursor) as *const Self;
    *cursor += size_of::<Self>();
    read_unaligned(ptr)
  }

  /// Returns a zero-copy reference to an object at `source[cursor]`.
  ///
  /// In addition to the bounds check, this confirms that the address of the
  /// referenced bytes satisfies the alignment of `Self`.
  #[inline(always)]
  fn view<'a, T>(source: &'a T, cursor: &mut usize) -> Result<&'a Self, ViewErr>
  where
    T: AsRef<[u8]> + ?Sized,
  {
    bounds_check(source, *cursor + size_of::<Self>())?;
    align_check::<Self>(source.as_ref().as_ptr() as usize + *cursor)?;
    unsafe { Ok(Self::view_u(source, cursor)) }
  }

  /// An unsafe version of [`FixedLayout::view()`] without the bounds and
  /// alignment checks.
  #[inline(always)]
  unsafe fn view_u<'a, T>(source: &'a T, cursor: &mut usize) -> &'a Self
  where
    T: AsRef<[u8]> + ?Sized,
  {
    let ptr = source.as_ref().as_ptr().add(*cursor) as *const Self;
    *cursor += size_of::<Self>();
    &*ptr
  }

  /// Returns a zero-copy mutable reference to an object at `source[cursor]`.
  #[inline(always)]
  fn view_mut<'a, T>(
    source: &'a mut T,
    cursor: &mut usize,
  ) -> Result<&'a mut Self, ViewErr>
  where
    T: AsMut<[u8]> + AsRef<[u8]> + ?Sized,
  {
    bounds_check(source, *cursor + size_of::<Self>())?;
    align_check::<Self>(source.as_ref().as_ptr() as usize + *cursor)?;
    unsafe { Ok(Self::view_mut_u(source, cursor)) }
  }

  /// An unsafe version of [`FixedLayout::view_mut()`] without the bounds and
  /// alignment checks.
  #[inline(always)]
  unsafe fn view_mut_u<'a, T>(
    source: &'a mut T,
    cursor: &mut usize,
  ) -> &'a mut Self
  where
    T: AsMut<[u8]> + ?Sized,
  {
    let ptr = source.as_mut().as_mut_ptr().add(*cursor) as *mut Self;
    *cursor += size_of::<Self>();
    &mut *ptr
  }

  /// Returns a zero-copy reference to a slice of `len` objects starting at
  /// `source[cursor]`.
  fn view_slice<'a, T>(
    source: &'a T,
    cursor: &mut usize,
    len: usize,
  ) -> Result<&'a [Self], ViewErr>
  where
    T: AsRef<[u8]> + ?Sized,
  {
    bounds_check(source, *cursor + size_of::<Self>() * len)?;
    align_check::<Self>(source.as_ref().as_ptr() as usize + *cursor)?;
    unsafe { Ok(Self::view_slice_u(source, cursor, len)) }
  }

  /// An unsafe version of [`FixedLayout::view_slice()`] without the bounds
  /// and alignment checks.
  unsafe fn view_slice_u<'a, T>(
    source: &'a T,
    cursor: &mut usize,
    len: usize,
  ) -> &'a [Self]
  where
    T: AsRef<[u8]> + ?Sized,
  {
    let ptr = source.as_ref().as_ptr().add(*cursor) as *const Self;
    *cursor += size_of::<Self>() * len;
    from_raw_parts(ptr, len)
  }

  /// Returns a zero-copy mutable reference to a slice of `len` objects
  /// starting at `source[cursor]`.
  fn view_slice_mut<'a, T>(
    source: &'a mut T,
    cursor: &mut usize,
    len: usize,
  ) -> Result<&'a mut [Self], ViewErr>
  where
    T: AsMut<[u8]> + AsRef<[u8]> + ?Sized,
  {
    bounds_check(source, *cursor + size_of::<Self>() * len)?;
    align_check::<Self>(source.as_ref().as_ptr() as usize + *cursor)?;
    unsafe { Ok(Self::view_slice_mut_u(source, cursor, len)) }
  }

  /// An unsafe version of [`FixedLayout::view_slice_mut()`] without the
  /// bounds and alignment checks.
  unsafe fn view_slice_mut_u<'a, T>(
    source: &'a mut T,
    cursor: &mut usize,
    len: usize,
  ) -> &'a mut [Self]
  where
    T: AsMut<[u8]> + ?Sized,
  {
    let ptr = source.as_mut().as_mut_ptr().add(*cursor) as *mut Self;
    *cursor += size_of::<Self>() * len;
    from_raw_parts_mut(ptr, len)
  }

  /// Writes a copy of the object at `target[cursor]`.
  #[inline(always)]
  fn write<T>(&self, target: &mut T, cursor: &mut usize) -> Result<(), ViewErr>
  where
    T: AsMut<[u8]> + AsRef<[u8]> + ?Sized,
  {
    bounds_check(target, *cursor + size_of::<Self>())?;
    unsafe { Self::write_u(self, target, cursor) }
    Ok(())
  }

  /// Writes a copy of the object at `target[cursor]`, without bounds
  /// checking.
  #[inline(always)]
  unsafe fn write_u<T>(&self, target: &mut T, cursor: &mut usize)
  where
    T: AsMut<[u8]> + ?Sized,
  {
    let dst_ptr = target.as_mut().as_mut_ptr().add(*cursor) as *mut Self;
    write_unaligned::<Self>(dst_ptr, *self);
    *cursor += size_of::<Self>()
  }

  /// Writes copies of a slice of objects to `target[cursor]`.
  #[inline(always)]
  fn write_slice<T>(
    source: &[Self],
    target: &mut T,
    cursor: &mut usize,
  ) -> Result<(), ViewErr>
  where
    T: AsMut<[u8]> + AsRef<[u8]> + ?Sized,
    Self: Sized,
  {
    bounds_check(target, *cursor + size_of::<Self>() * source.len())?;
    unsafe { Self::write_slice_u(source, target, cursor) }
    Ok(())
  }

  /// Writes copies of a slice of objects to `target[cursor]`, skipping
  /// bounds checking.
  ///
  /// Because the in-memory representation of a `FixedLayout` type is already
  /// its byte representation, this is a single byte copy regardless of the
  /// platform's endianness.
  #[inline(always)]
  unsafe fn write_slice_u<T>(source: &[Self], target: &mut T, cursor: &mut usize)
  where
    T: AsMut<[u8]> + ?Sized,
    Self: Sized,
  {
    let bytes = size_of::<Self>() * source.len();
    let src = source.as_ptr() as *const u8;
    let dst = target.as_mut().as_mut_ptr().add(*cursor);
    copy_nonoverlapping(src, dst, bytes);
    *cursor += bytes
  }

  /// Reinterprets an entire byte buffer as a reference to `Self`.
  ///
  /// The buffer's length must be exactly `size_of::<Self>()`, and its
  /// address must satisfy the alignment of `Self`.  A buffer that is too
  /// short yields [`ViewErr::SizeMismatch`], never a partially-assembled
  /// instance.
  #[inline]
  fn from_bytes(bytes: &[u8]) -> Result<&Self, ViewErr> {
    if bytes.len() != size_of::<Self>() {
      let err = ViewErr::SizeMismatch {
        expected: size_of::<Self>(),
        observed: bytes.len(),
      };
      return Err(err!(trace, err));
    }
    align_check::<Self>(bytes.as_ptr() as usize)?;
    // SAFETY: Length and alignment were just checked, and `FixedLayout`
    // accepts any bit pattern.
    unsafe { Ok(&*(bytes.as_ptr() as *const Self)) }
  }

  /// Reinterprets an entire byte buffer as a mutable reference to `Self`.
  ///
  /// The same length and alignment rules as [`FixedLayout::from_bytes()`]
  /// apply.
  #[inline]
  fn from_bytes_mut(bytes: &mut [u8]) -> Result<&mut Self, ViewErr> {
    if bytes.len() != size_of::<Self>() {
      let err = ViewErr::SizeMismatch {
        expected: size_of::<Self>(),
        observed: bytes.len(),
      };
      return Err(err!(trace, err));
    }
    align_check::<Self>(bytes.as_ptr() as usize)?;
    // SAFETY: Length and alignment were just checked, and `FixedLayout`
    // accepts any bit pattern.
    unsafe { Ok(&mut *(bytes.as_mut_ptr() as *mut Self)) }
  }

  /// Views the instance in place as raw bytes.
  ///
  /// This cannot fail: the result is a read-only view of exactly
  /// `size_of::<Self>()` bytes, with nothing copied.
  #[inline(always)]
  fn as_bytes(&self) -> &[u8] {
    // SAFETY: `FixedLayout` guarantees every byte of `Self` is an explicit
    // part of its representation, including padding fields.
    unsafe { from_raw_parts(self as *const Self as *const u8, size_of::<Self>()) }
  }
}

unsafe impl FixedLayout for u8 {}

unsafe impl FixedLayout for i8 {}

/// Fixed-size arrays of fixed-layout types have no padding, length metadata,
/// or platform-dependent representation themselves.
unsafe impl<T: FixedLayout, const N: usize> FixedLayout for [T; N] {}

gen_le_prim!(
  u16,
  U16,
  u16::from_le_bytes,
  u16::to_le_bytes,
  Ord::cmp,
  conv_usize
);
gen_le_prim!(
  u32,
  U32,
  u32::from_le_bytes,
  u32::to_le_bytes,
  Ord::cmp,
  conv_usize
);
gen_le_prim!(
  u64,
  U64,
  u64::from_le_bytes,
  u64::to_le_bytes,
  Ord::cmp,
  conv_usize
);
gen_le_prim!(i16, I16, i16::from_le_bytes, i16::to_le_bytes, Ord::cmp);
gen_le_prim!(i32, I32, i32::from_le_bytes, i32::to_le_bytes, Ord::cmp);
gen_le_prim!(i64, I64, i64::from_le_bytes, i64::to_le_bytes, Ord::cmp);
gen_le_prim!(f32, F32, f32::from_le_bytes, f32::to_le_bytes, f32::total_cmp);
gen_le_prim!(f64, F64, f64::from_le_bytes, f64::to_le_bytes, f64::total_cmp);

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::init_test_logger;

  #[test]
  fn le_prim_conversions() {
    init_test_logger();

    let a = U32::from(0xDEAD_BEEF);
    assert_eq!(a.get(), 0xDEAD_BEEF);
    assert_eq!(a.bytes(), &[0xEF, 0xBE, 0xAD, 0xDE]);
    assert_eq!(u32::from(a), 0xDEAD_BEEF);
    assert_eq!(a, 0xDEAD_BEEFu32);

    let b = U32::try_from(12usize).unwrap();
    assert!(b < a);
    assert!(U16::try_from(usize::MAX).is_err());

    let c = I16::from(-2);
    assert_eq!(c.get(), -2);
    assert_eq!(I16::default().get(), 0);

    let d = F64::from(core::f64::consts::E);
    assert_eq!(d.get(), core::f64::consts::E);
  }

  #[test]
  fn cursor_write_then_read() {
    init_test_logger();
    let mut buf = [0u8; 16];

    let cursor = &mut 0;
    U64::from(0xF00D_DEAD_BEEF_F00D).write(&mut buf, cursor).unwrap();
    U16::from(0xBEEF).write(&mut buf, cursor).unwrap();
    0xAAu8.write(&mut buf, cursor).unwrap();
    assert_eq!(*cursor, 11);

    // Writing past the end is refused and leaves the cursor alone.
    let err = U64::from(1).write(&mut buf, cursor);
    assert_eq!(
      err,
      Err(ViewErr::OutOfBounds {
        index:  19,
        length: 16
      })
    );
    assert_eq!(*cursor, 11);

    let cursor = &mut 0;
    assert_eq!(U64::read(&buf, cursor).unwrap().get(), 0xF00D_DEAD_BEEF_F00D);
    assert_eq!(U16::read(&buf, cursor).unwrap().get(), 0xBEEF);
    assert_eq!(u8::read(&buf, cursor).unwrap(), 0xAA);
  }

  #[test]
  fn view_in_place() {
    init_test_logger();
    let mut buf = [0u8; 8];
    let cursor = &mut 0;
    U32::from(7).write(&mut buf, cursor).unwrap();
    U32::from(9).write(&mut buf, cursor).unwrap();

    // Shared views reference the buffer's own storage.
    let cursor = &mut 0;
    let first = U32::view(&buf, cursor).unwrap();
    assert_eq!(first.get(), 7);
    assert_eq!(first as *const U32 as usize, buf.as_ptr() as usize);
    let second = U32::view(&buf, cursor).unwrap();
    assert_eq!(second.get(), 9);
    assert!(U32::view(&buf, cursor).is_err());

    // An exclusive view writes through to the underlying bytes.
    let cursor = &mut 4;
    *U32::view_mut(&mut buf, cursor).unwrap() = U32::from(10);
    assert_eq!(&buf[4..], &[10, 0, 0, 0]);
  }

  #[test]
  fn slice_views() {
    init_test_logger();
    let mut buf = [0u8; 12];
    let values = [U16::from(1), U16::from(2), U16::from(3)];
    let cursor = &mut 0;
    U16::write_slice(&values[..], &mut buf, cursor).unwrap();
    assert_eq!(*cursor, 6);

    let cursor = &mut 0;
    let viewed = U16::view_slice(&buf, cursor, 3).unwrap();
    assert_eq!(viewed, &values[..]);
    assert_eq!(viewed.as_ptr() as usize, buf.as_ptr() as usize);
    assert!(U16::view_slice(&buf, cursor, 4).is_err());
  }

  #[test]
  fn arrays_are_fixed_layout() {
    init_test_logger();
    let buf = [1u8, 0, 2, 0, 3, 0];
    let arr = <[U16; 3]>::from_bytes(&buf).unwrap();
    assert_eq!(arr[0].get(), 1);
    assert_eq!(arr[2].get(), 3);
    assert_eq!(arr.as_bytes(), &buf[..]);
  }

  #[test]
  fn word_rounding() {
    assert_eq!(round_to_word(0), 0);
    assert_eq!(round_to_word(1), 8);
    assert_eq!(round_to_word(8), 8);
    assert_eq!(round_to_word(9), 16);
  }
}
