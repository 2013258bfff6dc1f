//! Service layer for business logic
//!
//! The HTTP handlers and the CLI share these; every service receives its
//! `CodeStore` through the constructor.

pub mod code_registry;
pub mod owner_directory;
pub mod renderer;
pub mod resolution;

pub use code_registry::{CodeRegistry, CreateQrCodeRequest, RegistryOptions};
pub use owner_directory::{CallerIdentity, OwnerClaims, OwnerDirectory, authorize, require_caller};
pub use renderer::QrRenderer;
pub use resolution::{FallbackReason, Resolution, ResolutionEngine, ResolutionOptions};
