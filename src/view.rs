use crate::util::debug::ShortHexDump;
use core::{
  cmp::Ordering,
  fmt::{Debug, Display, Formatter},
  ops::Range,
};

/// A read-only view of bytes owned elsewhere.
///
/// A `View` is a reference plus the compiler's proof that the referenced
/// bytes outlive it; creating one duplicates nothing.  Any number of `View`s
/// of the same region may exist at once, and all of them observe identical
/// content for as long as no exclusive [`ViewMut`] intervenes.
///
/// ```
/// use loupe::View;
///
/// let owner = *b"zero copy";
/// let a = View::new(&owner[..]);
/// let b = a;
/// let c = a.subview(0..4).unwrap();
/// assert_eq!(a.bytes(), b.bytes());
/// assert_eq!(c.bytes(), b"zero");
/// assert_eq!(c.bytes().as_ptr(), owner.as_ptr());
/// ```
///
/// A view cannot outlive the owning value it was taken from; this is
/// rejected before the program runs:
///
/// ```compile_fail
/// use loupe::View;
///
/// let escaped;
/// {
///   let owner = *b"short lived";
///   escaped = View::new(&owner[..]);
/// } // `owner` is destroyed here...
/// escaped.len(); // ...so `escaped` must not still be usable.
/// ```
#[derive(Clone, Copy)]
pub struct View<'a> {
  bytes: &'a [u8],
}

impl<'a> View<'a> {
  /// Creates a view of the referenced bytes.  No data is copied.
  #[inline(always)]
  pub fn new(bytes: &'a [u8]) -> View<'a> {
    View { bytes }
  }

  /// Returns the viewed bytes.
  ///
  /// The returned slice borrows from the underlying owner, not from this
  /// `View`, so it remains usable after the `View` itself is gone.
  #[inline(always)]
  pub fn bytes(&self) -> &'a [u8] {
    self.bytes
  }

  /// Returns the number of bytes viewed.
  #[inline(always)]
  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  /// Returns `true` iff the view is empty.
  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  /// Returns a narrower view of the same storage, without copying.
  pub fn subview(&self, range: Range<usize>) -> Result<View<'a>, ViewErr> {
    let err = ViewErr::OutOfBounds {
      index:  range.end,
      length: self.bytes.len(),
    };
    match self.bytes.get(range) {
      Some(bytes) => Ok(View { bytes }),
      None => Err(err!(trace, err)),
    }
  }

  /// Splits the view in two at `mid`, without copying.
  pub fn split_at(&self, mid: usize) -> Result<(View<'a>, View<'a>), ViewErr> {
    if mid > self.bytes.len() {
      let err = ViewErr::OutOfBounds {
        index:  mid,
        length: self.bytes.len(),
      };
      return Err(err!(trace, err));
    }
    let (head, tail) = self.bytes.split_at(mid);
    Ok((View { bytes: head }, View { bytes: tail }))
  }
}

impl<'a> AsRef<[u8]> for View<'a> {
  fn as_ref(&self) -> &[u8] {
    self.bytes
  }
}

impl<'a> PartialEq for View<'a> {
  fn eq(&self, other: &Self) -> bool {
    self.bytes == other.bytes
  }
}

impl<'a> Eq for View<'a> {}

impl<'a> PartialOrd for View<'a> {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl<'a> Ord for View<'a> {
  fn cmp(&self, other: &Self) -> Ordering {
    self.bytes.cmp(other.bytes)
  }
}

impl<'a> Debug for View<'a> {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    let mut d = f.debug_struct("View");
    d.field("address", &self.bytes.as_ptr());
    d.field("length", &self.bytes.len());
    d.field("bytes", &ShortHexDump(self.bytes, 8));
    d.finish()
  }
}

/// An exclusive read-write view of bytes owned elsewhere.
///
/// While a `ViewMut` exists, no other view of the same owner can be created,
/// read-only or otherwise.  This is the many-readers-or-one-writer rule, and
/// it is enforced when the view is constructed, not when it is used: the
/// program below is rejected at compile time, with no runtime check
/// involved.
///
/// ```compile_fail
/// use loupe::ByteBuf;
///
/// let mut buf = ByteBuf::from_slice(b"exclusive").unwrap();
/// let reader = buf.view();
/// let writer = buf.view_mut(); // second view while `reader` is live
/// reader.len();
/// ```
///
/// Releasing the exclusive view (by letting it go out of scope) makes the
/// owner observable again:
///
/// ```
/// use loupe::ByteBuf;
///
/// let mut buf = ByteBuf::from_slice(b"exclusive").unwrap();
/// {
///   let mut writer = buf.view_mut();
///   writer.fill(0);
/// }
/// assert_eq!(buf.view().bytes(), &[0; 9]);
/// ```
pub struct ViewMut<'a> {
  bytes: &'a mut [u8],
}

impl<'a> ViewMut<'a> {
  /// Creates an exclusive view of the referenced bytes.  No data is copied.
  #[inline(always)]
  pub fn new(bytes: &'a mut [u8]) -> ViewMut<'a> {
    ViewMut { bytes }
  }

  /// Returns the viewed bytes.
  #[inline(always)]
  pub fn bytes(&self) -> &[u8] {
    self.bytes
  }

  /// Returns the viewed bytes for writing.
  #[inline(always)]
  pub fn bytes_mut(&mut self) -> &mut [u8] {
    self.bytes
  }

  /// Returns the number of bytes viewed.
  #[inline(always)]
  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  /// Returns `true` iff the view is empty.
  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  /// Sets every viewed byte to `value`.
  pub fn fill(&mut self, value: u8) {
    self.bytes.fill(value)
  }

  /// Copies `source` into the viewed bytes starting at `offset`.
  pub fn write_at(&mut self, offset: usize, source: &[u8]) -> Result<(), ViewErr> {
    let end = offset + source.len();
    if end > self.bytes.len() {
      let err = ViewErr::OutOfBounds {
        index:  end,
        length: self.bytes.len(),
      };
      return Err(err!(trace, err));
    }
    self.bytes[offset..end].copy_from_slice(source);
    Ok(())
  }

  /// Returns a narrower exclusive view of the same storage.
  ///
  /// The result reborrows from `self`, so the wider view is unusable until
  /// the narrower one is released.
  pub fn subview_mut(
    &mut self,
    range: Range<usize>,
  ) -> Result<ViewMut<'_>, ViewErr> {
    let err = ViewErr::OutOfBounds {
      index:  range.end,
      length: self.bytes.len(),
    };
    match self.bytes.get_mut(range) {
      Some(bytes) => Ok(ViewMut { bytes }),
      None => Err(err!(trace, err)),
    }
  }

  /// Reborrows the exclusive view for a shorter scope.
  pub fn reborrow(&mut self) -> ViewMut<'_> {
    ViewMut { bytes: self.bytes }
  }

  /// Converts this exclusive view into a read-only view of the same bytes.
  ///
  /// This consumes the `ViewMut`; exclusivity ends and shared views become
  /// possible again.
  pub fn downgrade(self) -> View<'a> {
    View { bytes: self.bytes }
  }
}

impl<'a> AsRef<[u8]> for ViewMut<'a> {
  fn as_ref(&self) -> &[u8] {
    self.bytes
  }
}

impl<'a> AsMut<[u8]> for ViewMut<'a> {
  fn as_mut(&mut self) -> &mut [u8] {
    self.bytes
  }
}

impl<'a> Debug for ViewMut<'a> {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    let mut d = f.debug_struct("ViewMut");
    d.field("address", &self.bytes.as_ptr());
    d.field("length", &self.bytes.len());
    d.field("bytes", &ShortHexDump(self.bytes, 8));
    d.finish()
  }
}

/// Returns whichever view covers fewer bytes.
///
/// Both arguments unify to a single lifetime `'a`, so the result is valid
/// only for the intersection of the two sources' scopes — the shorter of the
/// two.  Keeping the result alive past the shorter-lived owner is rejected
/// at compile time:
///
/// ```compile_fail
/// use loupe::{shorter, View};
///
/// let durable = *b"lives a long time";
/// let result;
/// {
///   let fleeting = *b"gone soon";
///   result = shorter(View::new(&durable[..]), View::new(&fleeting[..]));
/// } // `fleeting` is destroyed here, and `result` might refer to it.
/// result.len();
/// ```
pub fn shorter<'a>(a: View<'a>, b: View<'a>) -> View<'a> {
  if a.len() <= b.len() {
    a
  } else {
    b
  }
}

/// Various errors associated with zero-copy access to byte buffers.
//
// Note:  Kept `Copy` and field-only, as these values are returned from the
// innermost codec paths and travel up through many `?`s.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewErr {
  /// An access would extend past the end of the underlying buffer.
  OutOfBounds {
    index:  usize,
    length: usize,
  },

  /// A whole-buffer reinterpretation was attempted on a buffer whose length
  /// does not equal the target type's size.
  SizeMismatch {
    expected: usize,
    observed: usize,
  },

  /// The address of a would-be in-place view does not satisfy the target
  /// type's alignment.
  Unaligned {
    needed: usize,
    addr:   usize,
  },

  /// The allocator failed to provide a buffer.
  AllocationFailed,

  /// A buffer would have grown past the maximum representable capacity.
  AllocOverflow(usize),

  /// An internal error occurred.
  ///
  /// This is likely a condition that should be impossible, and an error was
  /// returned rather than a fail-fast assert failure panic.
  InternalError,
}

impl Display for ViewErr {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    Debug::fmt(self, f)
  }
}

#[cfg(feature = "std")]
impl std::error::Error for ViewErr {}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::init_test_logger;

  #[test]
  fn shared_views_observe_same_content() {
    init_test_logger();
    let owner = *b"0123456789abcdef";

    let a = View::new(&owner[..]);
    let b = View::new(&owner[..]);
    let c = a;
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.bytes().as_ptr(), b.bytes().as_ptr());
    assert_eq!(a.len(), 16);
  }

  #[test]
  fn subview_and_split() {
    init_test_logger();
    let owner = *b"0123456789abcdef";
    let view = View::new(&owner[..]);

    let sub = view.subview(4..8).unwrap();
    assert_eq!(sub.bytes(), b"4567");
    assert_eq!(sub.bytes().as_ptr() as usize, owner.as_ptr() as usize + 4);
    assert_eq!(
      view.subview(4..17),
      Err(ViewErr::OutOfBounds {
        index:  17,
        length: 16
      })
    );

    let (head, tail) = view.split_at(10).unwrap();
    assert_eq!(head.len(), 10);
    assert_eq!(tail.bytes(), b"abcdef");
    assert!(view.split_at(17).is_err());
  }

  #[test]
  fn exclusive_view_writes() {
    init_test_logger();
    let mut owner = *b"0123456789abcdef";

    let mut write = ViewMut::new(&mut owner[..]);
    write.write_at(10, b"ABCDEF").unwrap();
    assert_eq!(
      write.write_at(12, b"toolong"),
      Err(ViewErr::OutOfBounds {
        index:  19,
        length: 16
      })
    );

    {
      let mut sub = write.subview_mut(0..4).unwrap();
      sub.fill(b'x');
    }
    assert!(write.subview_mut(9..17).is_err());

    let read = write.downgrade();
    assert_eq!(read.bytes(), b"xxxx456789ABCDEF");
  }

  #[test]
  fn shorter_picks_fewer_bytes() {
    init_test_logger();
    let long = *b"0123456789abcdef";
    let short = *b"0123";

    let result = shorter(View::new(&long[..]), View::new(&short[..]));
    assert_eq!(result.len(), 4);
    assert_eq!(result.bytes().as_ptr(), short.as_ptr());
  }
}
