// Request pipeline: every application request is sent through the same
// behaviours (logging, unhandled error logging, authorization, validation,
// performance) before and around its handler.

pub mod context;
pub mod error;
pub mod events;
pub mod sender;
pub mod traits;
pub mod validation;

pub use context::*;
pub use error::*;
pub use events::*;
pub use sender::*;
pub use traits::*;
pub use validation::*;
