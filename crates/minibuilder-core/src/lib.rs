pub mod blueprint;
pub mod config;
pub mod extract;
pub mod fields;
pub mod selection;
pub mod session;
pub mod summary;
pub mod verification;

// Re-export main types for convenience
pub use blueprint::{Blueprint, Feature, Role};
pub use config::Config;
pub use extract::{ExtractClient, ExtractError};
pub use fields::{FieldKey, FieldValues};
pub use selection::Selection;
pub use session::{Effect, ErrorKind, Event, ExtractRequest, Phase, Session, SubmitError};
pub use summary::{summarize, RequirementsSummary};
pub use verification::{CodeChallenge, StaticToken, VerificationToken, Verifier};
