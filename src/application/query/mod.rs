pub mod keys;
pub mod pagination;
pub mod state;
pub mod store;

pub use keys::{QueryFilter, QueryKey, QueryTag};
pub use pagination::{InfinitePosts, PostPage};
pub use state::{CacheEvent, QueryResult, QuerySnapshot, QueryStatus};
pub use store::QueryStore;
