/// A macro wrapper for returning a [`Result::Err`] that allows logging of
/// errors.
///
/// Specifically, in debug build mode with the `log` feature enabled, before
/// an `Err` is returned a call is made to [`log`] at the given level that
/// describes the error, followed (with the `backtrace` feature) by the stack
/// backtrace at the same level.
///
/// Usage:  `err!(trace, U) -> U`   .
macro_rules! err {
  ($level:ident, $error:expr) => {{
    // If testing, log the error at the requested level
    let error = $error;

    #[cfg(all(debug_assertions, feature = "log"))]
    {
      ::log::$level!("{}:{}: {:?}", file!(), line!(), &error);
      #[cfg(feature = "backtrace")]
      {
        let bt = ::backtrace::Backtrace::new();
        ::log::$level!("{:?}", bt);
      }
    }

    error
  }};
}

/// Generates a little-endian, unaligned version of a primitive type.
///
/// # Requirements
///
/// - The conversion between the native and generated type must be the same on
///   all platforms (i.e., always little-endian).
/// - The type must have a complete ordering for comparisons.  If the native
///   type implements `Ord`, you can just use `Ord::cmp` for `cmp_fn`; floats
///   should use their total ordering.
///
/// # Parameters
///
/// - `native_prim`: The corresponding native primitive type (e.g., `u32`)
/// - `le_prim`: The desired name for the generated type.
/// - `from_bytes`: An expression or function to read the native type from
///                 a byte array
/// - `to_bytes`: An expression or function to convert the native type to a
///               byte array.
/// - `cmp_fn`: An expression or function to compare two references to the
///             native type.
macro_rules! gen_le_prim {
  ($native_prim:ident,
    $le_prim:ident,
    $from_bytes:expr,
    $to_bytes:expr,
    $cmp_fn:expr,
    conv_usize
  ) => {
    gen_le_prim!($native_prim, $le_prim, $from_bytes, $to_bytes, $cmp_fn);

    impl TryFrom<usize> for $le_prim {
      type Error = <$native_prim as TryFrom<usize>>::Error;

      fn try_from(value: usize) -> Result<Self, Self::Error> {
        Ok($le_prim::from($native_prim::try_from(value)?))
      }
    }
  };

  ($native_prim:ident,
    $le_prim:ident,
    $from_bytes:expr,
    $to_bytes:expr,
    $cmp_fn:expr
  ) => {
    /// A little-endian, alignment-free version of the corresponding primitive
    /// type.
    #[repr(transparent)]
    #[derive(Copy, Clone)]
    pub struct $le_prim([u8; size_of::<$native_prim>()]);

    unsafe impl $crate::layout::FixedLayout for $le_prim {}

    impl $le_prim {
      /// Creates an instance of the primitive from an array of bytes.
      ///
      /// Note that the bytes must be in little-endian order.
      pub fn from_bytes(bytes: [u8; size_of::<$native_prim>()]) -> $le_prim {
        $le_prim(bytes)
      }

      /// Gets the associated native primitive
      pub fn get(&self) -> $native_prim {
        ($from_bytes)(self.0)
      }

      /// Retrieves the raw bytes of the type.
      pub fn bytes(&self) -> &[u8; size_of::<$native_prim>()] {
        &self.0
      }
    }

    impl core::convert::From<$native_prim> for $le_prim {
      fn from(src: $native_prim) -> Self {
        $le_prim(($to_bytes)(src))
      }
    }

    impl core::convert::From<$le_prim> for $native_prim {
      fn from(src: $le_prim) -> Self {
        ($from_bytes)(src.0)
      }
    }

    impl core::cmp::Eq for $le_prim {}

    impl core::cmp::PartialEq for $le_prim {
      fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
      }
    }

    impl core::cmp::PartialEq<$native_prim> for $le_prim {
      fn eq(&self, other: &$native_prim) -> bool {
        let a = self.get();
        $cmp_fn(&a, other).is_eq()
      }
    }

    impl core::cmp::PartialOrd for $le_prim {
      fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
      }
    }

    impl core::cmp::Ord for $le_prim {
      fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        let a = ($from_bytes)(self.0);
        let b = ($from_bytes)(other.0);
        $cmp_fn(&a, &b)
      }
    }

    impl core::fmt::Debug for $le_prim {
      fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let a = $native_prim::from(*self);
        core::fmt::Debug::fmt(&a, f)
      }
    }

    impl core::fmt::Display for $le_prim {
      fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let a = $native_prim::from(*self);
        core::fmt::Display::fmt(&a, f)
      }
    }

    impl Default for $le_prim {
      fn default() -> Self {
        $native_prim::default().into()
      }
    }
  };
}
