pub mod import;
pub mod notification;
pub mod post_query;
pub mod post_service;
pub mod report;
pub mod user_service;

pub use import::ImportService;
pub use post_query::PostQueryService;
pub use post_service::PostService;
pub use user_service::UserService;
