use super::{PageView, PostCard};
use crate::application::query::QuerySnapshot;
use crate::domain::entities::{Post, User};
use chrono::{DateTime, Utc};

pub const NO_AVAILABLE_POSTS: &str = "No available posts";

/// 保存した投稿の一覧画面
pub struct SavedPostsView;

impl SavedPostsView {
    pub fn render(current_user: &QuerySnapshot<Option<User>>) -> PageView {
        Self::render_at(current_user, Utc::now())
    }

    pub fn render_at(current_user: &QuerySnapshot<Option<User>>, now: DateTime<Utc>) -> PageView {
        let Some(Some(user)) = &current_user.data else {
            return PageView::Loading;
        };

        let posts = saved_posts(user);
        if posts.is_empty() {
            return PageView::Empty {
                message: NO_AVAILABLE_POSTS.to_string(),
            };
        }
        PageView::Grid {
            posts: posts
                .iter()
                .map(|post| PostCard::from_post(post, Some(&user.id), now))
                .collect(),
            show_stats: false,
        }
    }
}

/// 保存記録を投稿に展開する。作者画像は閲覧ユーザーのものに差し替え、新しい保存から並べる
pub fn saved_posts(user: &User) -> Vec<Post> {
    user.saves
        .iter()
        .rev()
        .map(|save| {
            let mut post = save.post.clone();
            post.creator.image_url = user.image_url.clone();
            post
        })
        .collect()
}
