mod hazard;
mod location;
mod place;
mod position;
mod route;

pub use hazard::{hazards_along_route, Hazard, HazardReceipt, HazardReport, HazardType};
pub use location::GeoPoint;
pub use place::{Place, PlaceSuggestion};
pub use position::PositionSample;
pub use route::{Route, TravelMode};
