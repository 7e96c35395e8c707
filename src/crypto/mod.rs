pub mod secure_rng;

#[cfg(test)]
mod secure_rng_tests;

pub use secure_rng::{secure_random_bytes, RandomSource, SystemRandomSource};
