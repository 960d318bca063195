//! Zero-copy access to byte buffers.
//!
//! This crate packages four small, independent disciplines for working with
//! bytes without duplicating them:
//!
//! - Borrow views: [`View`] and [`ViewMut`], read-shared or write-exclusive
//!   handles into storage owned elsewhere, with the
//!   many-readers-or-one-writer rule enforced at compile time.
//! - Lifetime-bounded validity: every view is provably outlived by its
//!   owner; see [`shorter`] for how two owners' scopes intersect.
//! - Borrowed-or-owned bytes: [`loan::Loan`], which copies only at the
//!   moment mutation or indefinite ownership is demanded.
//! - Fixed-layout reinterpretation: [`layout::FixedLayout`], in-place
//!   traffic between byte buffers and records whose layout is fully
//!   specified.
#![no_std]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

/// Internal Macros
#[macro_use]
mod macros;

#[cfg(feature = "alloc")]
mod buf;
pub mod layout;
#[cfg(feature = "alloc")]
pub mod loan;
mod util;
mod view;

#[cfg(feature = "alloc")]
pub use self::buf::ByteBuf;
pub use self::view::*;
