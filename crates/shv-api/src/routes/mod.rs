//! Route modules.

pub mod verify;
