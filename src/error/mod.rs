mod extract;
mod types;

pub use extract::{ExtractError, ExtractResult};
pub use types::{AppError, AppResult};
