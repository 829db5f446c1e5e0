pub mod cors;
pub mod owner;

pub use cors::create_cors;
pub use owner::{OwnerMiddleware, owner_from_request};
