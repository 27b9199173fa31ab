//! Shared text helpers.

pub mod extract;
