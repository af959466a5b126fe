pub mod error;
pub mod filter;
pub mod import;
pub mod notification;
pub mod post;
pub mod user;

pub use error::DomainError;
pub use filter::{PostFilter, PostQuery};
pub use notification::EmailMessage;
pub use post::Post;
pub use user::User;
