//! Game mechanics for Abyss Walker.
//!
//! A single d20 skill check and the random sources that drive it. The
//! random source is a trait so that tests and replays can script every
//! roll.

pub mod check;
pub mod random;

pub use check::{CheckResolver, CheckResult, modifier_for};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
