//! Misc non-public utility code for the loupe crate itself.
pub(crate) mod debug;


#[cfg(test)]
pub(crate) use self::test::*;
