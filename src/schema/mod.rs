mod introspection;
mod mutations;
mod session;

pub use introspection::*;
pub use mutations::*;
pub use session::*;
