//! Shared utilities.

pub mod hash;

#[cfg(test)]
pub(crate) mod testutil;
