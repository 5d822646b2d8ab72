pub mod hazards;
pub mod places;
pub mod session;
