//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod bulk;
pub mod health;
pub mod links;
pub mod redirect;

pub use bulk::bulk_import_handler;
pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, link_info_handler, revalidate_link_handler,
};
pub use redirect::redirect_handler;
