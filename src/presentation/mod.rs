pub mod views;

pub use views::{HomeFeedView, LikedPostsView, PageView, PostCard, SavedPostsView};
