//! Common, shared types.

pub mod health;
pub mod layers;
pub mod messages;
pub mod state;
pub mod tunables;

#[cfg(test)]
pub mod test_utils;
