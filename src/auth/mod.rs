mod credential;
mod validate;

pub use credential::{Cookies, Credential};
pub use validate::{validate_against, AuthOutcome, AuthReason, AUTH_TIMEOUT};
