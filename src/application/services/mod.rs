pub mod social_client;
pub mod social_mutations;
pub mod social_queries;

pub use social_client::SocialClient;
pub use social_mutations::SocialMutations;
pub use social_queries::SocialQueries;
