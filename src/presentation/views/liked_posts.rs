use super::{PageView, PostCard};
use crate::application::query::QuerySnapshot;
use crate::domain::entities::User;
use chrono::{DateTime, Utc};

pub const NO_LIKED_POSTS: &str = "No liked posts";

/// プロフィールの「いいねした投稿」タブ
pub struct LikedPostsView;

impl LikedPostsView {
    pub fn render(current_user: &QuerySnapshot<Option<User>>) -> PageView {
        Self::render_at(current_user, Utc::now())
    }

    pub fn render_at(current_user: &QuerySnapshot<Option<User>>, now: DateTime<Utc>) -> PageView {
        let Some(Some(user)) = &current_user.data else {
            return PageView::Loading;
        };
        if user.liked.is_empty() {
            return PageView::Empty {
                message: NO_LIKED_POSTS.to_string(),
            };
        }
        PageView::Grid {
            posts: user
                .liked
                .iter()
                .map(|post| PostCard::from_post(post, Some(&user.id), now))
                .collect(),
            show_stats: false,
        }
    }
}
