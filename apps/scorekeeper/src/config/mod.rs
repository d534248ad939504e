pub mod settings;

pub use settings::{PenaltyType, Settings};
