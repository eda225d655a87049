pub mod ports;
pub mod query;
pub mod services;

pub use query::{QueryKey, QueryResult, QuerySnapshot, QueryStore};
pub use services::{SocialClient, SocialMutations, SocialQueries};
