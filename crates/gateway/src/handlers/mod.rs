//! HTTP handlers, one module per resource.

pub mod booking_handler;
pub mod health_handler;
pub mod profile_handler;
pub mod vehicle_handler;
pub mod verification_handler;

pub use booking_handler::booking_routes;
pub use health_handler::health_routes;
pub use profile_handler::profile_routes;
pub use vehicle_handler::vehicle_routes;
pub use verification_handler::verification_routes;
