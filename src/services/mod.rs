//! Operations behind the HTTP handlers. Reads take a `&dyn Store`; writes
//! take the whole [`AppState`](crate::state::AppState) because they also
//! revalidate the frontend.

pub mod contact;
pub mod content;
pub mod projects;
pub mod site_config;
