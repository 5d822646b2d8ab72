pub mod google_maps;
pub mod hazards;

pub use google_maps::GoogleMaps;
pub use hazards::SafeRouteHazards;
