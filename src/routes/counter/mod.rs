mod handler;
mod model;

pub use handler::{get_count, increment_count};
pub use model::CountResponse;
