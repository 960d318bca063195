use crate::{
  layout::round_to_word,
  util::debug::HexDump,
  view::{View, ViewErr, ViewMut},
};
use alloc::alloc::{alloc, alloc_zeroed, dealloc, realloc, Layout};
use core::{
  fmt::{Debug, Formatter},
  ptr::{copy_nonoverlapping, NonNull},
  slice::{from_raw_parts, from_raw_parts_mut},
};

/// A growable byte buffer that is the sole owner of its storage.
///
/// `ByteBuf` is responsible for creating and managing the heap allocation
/// that views and fixed-layout records point into.  Its base address is
/// always aligned to [`ByteBuf::ALIGN`] (one 8-byte word), so any
/// fixed-layout type with an alignment of 8 bytes or fewer can be viewed in
/// place at a suitably aligned offset.
///
/// All reading and writing of the contents goes through views: any number of
/// concurrent read-only [`View`]s via [`ByteBuf::view()`], or exactly one
/// exclusive [`ViewMut`] via [`ByteBuf::view_mut()`].  Growth requires
/// `&mut self`, so no view can be live across a reallocation; a view
/// observing freed storage is unrepresentable.
///
/// # Examples
///
/// ```
/// use loupe::ByteBuf;
///
/// let mut buf = ByteBuf::from_slice(b"grow").unwrap();
/// buf.extend_from_slice(b"able").unwrap();
/// assert_eq!(buf.as_slice(), b"growable");
/// assert_eq!(buf.as_slice().as_ptr() as usize % ByteBuf::ALIGN, 0);
/// ```
pub struct ByteBuf {
  ptr: NonNull<u8>,
  len: usize,
  cap: usize,
}

/* === IMPORTANT: SAFETY ===

Unsafe code in this type relies on a few invariants which must be
maintained:

- `ptr` is dangling iff `cap == 0`; otherwise it was returned by the global
  allocator for a `Layout` of size `cap` and alignment `ALIGN`.
- `len <= cap` at all times, and `cap` is a multiple of `ALIGN`.
- The first `len` bytes are always initialized.
- The allocation is never shared: `ByteBuf` hands out references only
  through `&self`/`&mut self` methods, so the borrow checker serializes all
  access to it.
*/
impl ByteBuf {
  /// The guaranteed alignment of the buffer's base address.
  pub const ALIGN: usize = 8;

  /// Creates a new, empty buffer.  No allocation is made until bytes are
  /// added.
  pub fn new() -> ByteBuf {
    ByteBuf {
      ptr: Self::dangling(),
      len: 0,
      cap: 0,
    }
  }

  /// Creates an empty buffer with room for at least `capacity` bytes.
  pub fn with_capacity(capacity: usize) -> Result<ByteBuf, ViewErr> {
    let mut buf = ByteBuf::new();
    buf.reserve(capacity)?;
    Ok(buf)
  }

  /// Creates a buffer containing a copy of the provided bytes.
  ///
  /// This is the one operation in this crate that duplicates data by
  /// design; everything else borrows.
  pub fn from_slice(bytes: &[u8]) -> Result<ByteBuf, ViewErr> {
    let mut buf = ByteBuf::with_capacity(bytes.len())?;
    // SAFETY: The reservation above guarantees `cap >= bytes.len()`, and a
    // fresh allocation cannot overlap `bytes`.
    unsafe {
      copy_nonoverlapping(bytes.as_ptr(), buf.ptr.as_ptr(), bytes.len());
    }
    buf.len = bytes.len();
    Ok(buf)
  }

  /// Creates a buffer of `len` zeroed bytes.
  pub fn zeroed(len: usize) -> Result<ByteBuf, ViewErr> {
    if len == 0 {
      return Ok(ByteBuf::new());
    }
    let cap = round_to_word(len);
    let layout = Self::layout(cap)?;
    // SAFETY: `layout` has non-zero size.
    let ptr = unsafe { alloc_zeroed(layout) };
    let ptr = NonNull::new(ptr)
      .ok_or_else(|| err!(error, ViewErr::AllocationFailed))?;
    Ok(ByteBuf { ptr, len, cap })
  }

  /// Returns the number of bytes in the buffer.
  #[inline(always)]
  pub fn len(&self) -> usize {
    self.len
  }

  /// Returns `true` iff the buffer contains no bytes.
  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Returns the number of bytes the buffer can hold without reallocating.
  #[inline(always)]
  pub fn capacity(&self) -> usize {
    self.cap
  }

  /// Returns the buffer's contents.
  #[inline(always)]
  pub fn as_slice(&self) -> &[u8] {
    // SAFETY: The first `len` bytes are always initialized.
    unsafe { from_raw_parts(self.ptr.as_ptr(), self.len) }
  }

  /// Returns the buffer's contents for writing.
  #[inline(always)]
  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    // SAFETY: The first `len` bytes are always initialized, and `&mut self`
    // guarantees exclusive access.
    unsafe { from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
  }

  /// Returns a read-only view of the buffer's contents.
  ///
  /// Any number of these may exist at once; see [`View`].
  #[inline(always)]
  pub fn view(&self) -> View<'_> {
    View::new(self.as_slice())
  }

  /// Returns the exclusive read-write view of the buffer's contents.
  ///
  /// While the result is live, no other view of this buffer can be created;
  /// see [`ViewMut`].
  #[inline(always)]
  pub fn view_mut(&mut self) -> ViewMut<'_> {
    ViewMut::new(self.as_mut_slice())
  }

  /// Reserves capacity for at least `additional` more bytes.
  pub fn reserve(&mut self, additional: usize) -> Result<(), ViewErr> {
    let needed = self
      .len
      .checked_add(additional)
      .filter(|needed| *needed <= (isize::MAX as usize) - Self::ALIGN)
      .ok_or_else(|| err!(error, ViewErr::AllocOverflow(self.len)))?;
    if needed <= self.cap {
      return Ok(());
    }

    // Doubling growth, with the result rounded to a whole word.
    let doubled = self
      .cap
      .saturating_mul(2)
      .min((isize::MAX as usize) - Self::ALIGN);
    let new_cap = round_to_word(needed.max(doubled).max(Self::ALIGN));
    let new_layout = Self::layout(new_cap)?;

    let ptr = if self.cap == 0 {
      // SAFETY: `new_layout` has non-zero size.
      unsafe { alloc(new_layout) }
    } else {
      // SAFETY: `ptr` was allocated with this same alignment and size
      // `cap`, and `new_cap` is non-zero and under `isize::MAX`.
      unsafe {
        let old_layout =
          Layout::from_size_align_unchecked(self.cap, Self::ALIGN);
        realloc(self.ptr.as_ptr(), old_layout, new_cap)
      }
    };

    self.ptr = NonNull::new(ptr)
      .ok_or_else(|| err!(error, ViewErr::AllocationFailed))?;
    self.cap = new_cap;
    Ok(())
  }

  /// Appends a single byte.
  #[inline(always)]
  pub fn push(&mut self, byte: u8) -> Result<(), ViewErr> {
    self.extend_from_slice(core::slice::from_ref(&byte))
  }

  /// Appends a copy of `bytes` to the buffer.
  pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), ViewErr> {
    self.reserve(bytes.len())?;
    // SAFETY: The reservation above guarantees room for `bytes.len()` more
    // bytes past `len`, and our allocation cannot overlap `bytes`.
    unsafe {
      copy_nonoverlapping(
        bytes.as_ptr(),
        self.ptr.as_ptr().add(self.len),
        bytes.len(),
      );
    }
    self.len += bytes.len();
    Ok(())
  }

  /// Appends zero bytes until the buffer's length is a multiple of one
  /// 8-byte word.
  ///
  /// Useful when laying out fixed-layout records back to back: a record
  /// whose alignment divides [`ByteBuf::ALIGN`] can then be viewed in place
  /// at the padded offset.
  pub fn pad_to_word(&mut self) -> Result<(), ViewErr> {
    const ZEROS: [u8; 8] = [0; 8];
    let padded = round_to_word(self.len);
    self.extend_from_slice(&ZEROS[..padded - self.len])
  }

  /// Shortens the buffer to `len` bytes.  Has no effect if the buffer is
  /// already shorter.
  pub fn truncate(&mut self, len: usize) {
    if len < self.len {
      self.len = len;
    }
  }

  /// Removes all bytes from the buffer, keeping its allocation.
  pub fn clear(&mut self) {
    self.len = 0;
  }

  /// Creates a second buffer with the same contents.
  pub fn try_clone(&self) -> Result<ByteBuf, ViewErr> {
    ByteBuf::from_slice(self.as_slice())
  }

  fn dangling() -> NonNull<u8> {
    // SAFETY: `ALIGN` is non-zero, and a well-aligned dangling pointer is
    // the canonical representation of "no allocation".
    unsafe { NonNull::new_unchecked(Self::ALIGN as *mut u8) }
  }

  fn layout(cap: usize) -> Result<Layout, ViewErr> {
    Layout::from_size_align(cap, Self::ALIGN)
      .map_err(|_| err!(error, ViewErr::AllocOverflow(cap)))
  }
}

impl Drop for ByteBuf {
  fn drop(&mut self) {
    if self.cap != 0 {
      // SAFETY: `cap != 0` means `ptr` came from the global allocator with
      // exactly this layout, and it has not been freed before.
      unsafe {
        let layout =
          Layout::from_size_align_unchecked(self.cap, Self::ALIGN);
        dealloc(self.ptr.as_ptr(), layout);
      }
    }
  }
}

impl Default for ByteBuf {
  fn default() -> Self {
    ByteBuf::new()
  }
}

impl AsRef<[u8]> for ByteBuf {
  fn as_ref(&self) -> &[u8] {
    self.as_slice()
  }
}

impl AsMut<[u8]> for ByteBuf {
  fn as_mut(&mut self) -> &mut [u8] {
    self.as_mut_slice()
  }
}

impl PartialEq for ByteBuf {
  fn eq(&self, other: &Self) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl Eq for ByteBuf {}

impl Debug for ByteBuf {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    let mut d = f.debug_struct("ByteBuf");
    d.field("address", &self.ptr.as_ptr());
    d.field("length", &self.len);
    d.field("capacity", &self.cap);
    d.field("content", &HexDump(self.as_slice()));
    d.finish()
  }
}

// SAFETY: `ByteBuf` is the sole owner of its allocation, and all access to
// the contents is serialized through `&self`/`&mut self`.
unsafe impl Send for ByteBuf {}
unsafe impl Sync for ByteBuf {}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::init_test_logger;

  #[test]
  fn empty_buffers_do_not_allocate() {
    init_test_logger();
    let buf = ByteBuf::new();
    assert_eq!(buf.len(), 0);
    assert_eq!(buf.capacity(), 0);
    assert!(buf.is_empty());
    assert!(buf.as_slice().is_empty());
  }

  #[test]
  fn growth_keeps_alignment_and_content() {
    init_test_logger();
    let mut buf = ByteBuf::new();
    for chunk in 0u8..100 {
      buf.extend_from_slice(&[chunk; 7]).unwrap();
      assert_eq!(buf.as_slice().as_ptr() as usize % ByteBuf::ALIGN, 0);
    }
    assert_eq!(buf.len(), 700);
    assert!(buf.capacity() >= 700);
    assert_eq!(buf.capacity() % ByteBuf::ALIGN, 0);
    assert_eq!(&buf.as_slice()[0..7], &[0; 7]);
    assert_eq!(&buf.as_slice()[693..], &[99; 7]);
  }

  #[test]
  fn push_truncate_clear() {
    init_test_logger();
    let mut buf = ByteBuf::from_slice(b"01234567").unwrap();
    buf.push(b'8').unwrap();
    assert_eq!(buf.as_slice(), b"012345678");

    buf.truncate(4);
    assert_eq!(buf.as_slice(), b"0123");
    buf.truncate(100);
    assert_eq!(buf.len(), 4);

    let cap = buf.capacity();
    buf.clear();
    assert_eq!(buf.len(), 0);
    assert_eq!(buf.capacity(), cap);
  }

  #[test]
  fn pad_to_word() {
    init_test_logger();
    let mut buf = ByteBuf::from_slice(b"012").unwrap();
    buf.pad_to_word().unwrap();
    assert_eq!(buf.as_slice(), b"012\0\0\0\0\0");

    // Padding an already-aligned length adds nothing.
    buf.pad_to_word().unwrap();
    assert_eq!(buf.len(), 8);
  }

  #[test]
  fn zeroed_and_clone() {
    init_test_logger();
    let zeroed = ByteBuf::zeroed(12).unwrap();
    assert_eq!(zeroed.as_slice(), &[0u8; 12]);

    let copy = zeroed.try_clone().unwrap();
    assert_eq!(copy, zeroed);
    assert_ne!(copy.as_slice().as_ptr(), zeroed.as_slice().as_ptr());
  }
}
