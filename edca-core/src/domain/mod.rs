//! Domain types for the EDCA signal engine

pub mod bar;
pub mod plan;

pub use bar::{closes, Bar};
pub use plan::FundPlan;
