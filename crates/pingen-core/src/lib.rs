//! Pingen Core Library
//!
//! Configuration layering, access-token management and the JSON:API client
//! behind the `pingen-cli` binary, plus the letter create/send workflows.

pub mod clients;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod paths;
pub mod token;
pub mod types;
pub mod workflow;

// Re-export main types for easy access
pub use config::{ConfigStore, PingenConfig, Settings};
pub use error::{PingenError, Result};

pub use clients::{ApiResponse, PingenApi, PingenClient, UploadSlot};
pub use envelope::Envelope;
pub use token::{Persistence, TokenGrant, TokenManager};
pub use types::{AddressPosition, DeliveryProduct, Environment, ListParams, PrintMode, PrintSpectrum};
pub use workflow::{
    CreateLetterRequest, LetterOutcome, LetterWorkflow, SendLetterRequest,
};
