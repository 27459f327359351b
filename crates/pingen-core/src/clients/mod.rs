//! Client modules for the Pingen services

pub mod jsonapi;
pub mod pingen;
pub mod traits;

// Re-export client types
pub use jsonapi::ApiResponse;
pub use pingen::{upload_timeout, PingenClient};
pub use traits::{PingenApi, UploadSlot};
