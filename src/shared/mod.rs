pub mod config;
pub mod error;
pub mod utils;
pub mod validation;

pub use config::{AppConfig, BackendConfig, CacheConfig};
pub use error::{AppError, Result};
pub use utils::{check_is_liked, convert_file_to_url, time_ago, time_ago_at};
pub use validation::{Validate, ValidationErrors};
