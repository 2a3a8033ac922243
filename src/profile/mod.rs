mod dto;
mod handlers;

pub(crate) use handlers::targets_for;
pub use handlers::routes;
