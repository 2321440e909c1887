pub mod error;
pub mod post;

pub use error::{ContextError, OutboundError};
pub use post::Post;
