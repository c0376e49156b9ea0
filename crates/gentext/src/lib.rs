mod client;
mod error;
pub mod models;

pub use client::GentextClient;
pub use error::GentextError;
pub use models::{GenerationRequest, GenerationResponse};

pub type Result<T> = std::result::Result<T, GentextError>;
