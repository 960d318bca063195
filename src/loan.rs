//! A byte string that is either borrowed or owned, copying only when forced.
//!
//! [`Loan`] is the bridge between the view types, which never allocate, and
//! [`ByteBuf`], which always owns.  Code that usually reads borrowed data
//! but occasionally must keep or modify it can accept a `Loan` and defer the
//! copy to the moment it is actually required — often never.
use crate::{
  buf::ByteBuf,
  util::debug::ShortHexDump,
  view::{View, ViewErr},
};
use core::fmt::{Debug, Formatter};

/// A byte string tagged as exactly one of borrowed or owned.
///
/// Construction never copies: wrapping a reference yields
/// [`Loan::Borrowed`] with no allocation, and wrapping a [`ByteBuf`]
/// transfers ownership into [`Loan::Owned`].  Read access never changes the
/// variant.  The only transition is `Borrowed` into `Owned`, at the point a
/// caller demands mutation or indefinite ownership; an owned loan never
/// becomes borrowed again.
///
/// The variants are public so that matches on a `Loan` are exhaustive by
/// construction; there is no third state to forget.
///
/// # Examples
///
/// ```
/// use loupe::loan::Loan;
///
/// let summary = *b"borrowed until written";
///
/// let mut loan = Loan::from(&summary[..]);
/// assert!(loan.is_borrowed());
/// assert_eq!(loan.bytes().as_ptr(), summary.as_ptr()); // no copy was made
///
/// // Requesting mutation forces the one copy.
/// loan.to_mut().unwrap().extend_from_slice(b", now owned").unwrap();
/// assert!(loan.is_owned());
/// ```
pub enum Loan<'a> {
  /// A view of bytes owned elsewhere; no allocation was made.
  Borrowed(&'a [u8]),

  /// Sole ownership of the bytes.
  Owned(ByteBuf),
}

impl<'a> Loan<'a> {
  /// Wraps existing bytes without copying them.
  #[inline(always)]
  pub fn borrowed(bytes: &'a [u8]) -> Loan<'a> {
    Loan::Borrowed(bytes)
  }

  /// Takes ownership of an existing buffer without copying it.
  #[inline(always)]
  pub fn owned(buf: ByteBuf) -> Loan<'a> {
    Loan::Owned(buf)
  }

  /// Returns the loaned bytes, regardless of variant.  Never copies and
  /// never changes the variant.
  #[inline(always)]
  pub fn bytes(&self) -> &[u8] {
    match self {
      Loan::Borrowed(bytes) => bytes,
      Loan::Owned(buf) => buf.as_slice(),
    }
  }

  /// Returns a read-only view of the loaned bytes.
  #[inline(always)]
  pub fn view(&self) -> View<'_> {
    View::new(self.bytes())
  }

  /// Returns the number of loaned bytes.
  #[inline(always)]
  pub fn len(&self) -> usize {
    self.bytes().len()
  }

  /// Returns `true` iff the loan is empty.
  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.bytes().is_empty()
  }

  /// Returns `true` iff this is the [`Loan::Borrowed`] variant.
  #[inline(always)]
  pub fn is_borrowed(&self) -> bool {
    matches!(self, Loan::Borrowed(_))
  }

  /// Returns `true` iff this is the [`Loan::Owned`] variant.
  #[inline(always)]
  pub fn is_owned(&self) -> bool {
    matches!(self, Loan::Owned(_))
  }

  /// Returns an exclusive handle to an owned copy of the bytes, cloning on
  /// demand.
  ///
  /// A borrowed loan is duplicated into an owned buffer here, at the point
  /// mutation was requested; an already-owned loan returns its existing
  /// buffer untouched.
  pub fn to_mut(&mut self) -> Result<&mut ByteBuf, ViewErr> {
    if let Loan::Borrowed(bytes) = *self {
      *self = Loan::Owned(ByteBuf::from_slice(bytes)?);
    }
    match self {
      Loan::Owned(buf) => Ok(buf),
      // The borrowed variant was replaced immediately above.
      Loan::Borrowed(_) => Err(err!(error, ViewErr::InternalError)),
    }
  }

  /// Converts the loan into a buffer it owns indefinitely.
  ///
  /// Idempotent with respect to duplication: only a borrowed loan is
  /// copied, and an owned loan passes its buffer through as-is, preserving
  /// the allocation.
  pub fn into_owned(self) -> Result<ByteBuf, ViewErr> {
    match self {
      Loan::Borrowed(bytes) => ByteBuf::from_slice(bytes),
      Loan::Owned(buf) => Ok(buf),
    }
  }
}

impl<'a> From<&'a [u8]> for Loan<'a> {
  fn from(bytes: &'a [u8]) -> Self {
    Loan::Borrowed(bytes)
  }
}

impl From<ByteBuf> for Loan<'_> {
  fn from(buf: ByteBuf) -> Self {
    Loan::Owned(buf)
  }
}

impl<'a> AsRef<[u8]> for Loan<'a> {
  fn as_ref(&self) -> &[u8] {
    self.bytes()
  }
}

impl<'a> PartialEq for Loan<'a> {
  /// Loans compare by content; a borrowed and an owned loan over equal
  /// bytes are equal.
  fn eq(&self, other: &Self) -> bool {
    self.bytes() == other.bytes()
  }
}

impl<'a> Eq for Loan<'a> {}

impl<'a> Debug for Loan<'a> {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    let variant = match self {
      Loan::Borrowed(_) => "Borrowed",
      Loan::Owned(_) => "Owned",
    };
    let mut d = f.debug_struct("Loan");
    d.field("variant", &variant);
    d.field("length", &self.len());
    d.field("bytes", &ShortHexDump(self.bytes(), 8));
    d.finish()
  }
}
