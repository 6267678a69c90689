//! XML navigation helpers for the decoder.

mod utils;

pub use utils::*;
