pub mod error;
pub mod logging;
pub mod mission;
pub mod orbital;
pub mod sim;
pub mod steps;
pub mod vehicle;
mod gnc_mod;

// The gnc module: expose gnc_mod as `gnc` publicly
pub mod gnc {
    pub use crate::gnc_mod::*;
}

pub use error::{MissionError, Result};

#[cfg(test)]
mod testing;
