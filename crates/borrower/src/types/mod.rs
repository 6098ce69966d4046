pub mod aave;
pub mod fraction;
pub mod price;
pub mod units;
pub mod workflow;

pub use aave::*;
pub use fraction::SafetyFactor;
pub use price::*;
pub use workflow::*;
