use super::{PageView, PostCard};
use crate::application::query::QuerySnapshot;
use crate::domain::entities::Post;
use crate::domain::value_objects::UserId;
use chrono::{DateTime, Utc};

/// ホーム画面（最新投稿のフィード）
pub struct HomeFeedView;

impl HomeFeedView {
    pub fn render(snapshot: &QuerySnapshot<Vec<Post>>, viewer: Option<&UserId>) -> PageView {
        Self::render_at(snapshot, viewer, Utc::now())
    }

    pub fn render_at(
        snapshot: &QuerySnapshot<Vec<Post>>,
        viewer: Option<&UserId>,
        now: DateTime<Utc>,
    ) -> PageView {
        // 再取得中・失敗時でも前回のデータがあればそれを出す
        match (&snapshot.data, &snapshot.error) {
            (Some(posts), _) => PageView::Grid {
                posts: posts
                    .iter()
                    .map(|post| PostCard::from_post(post, viewer, now))
                    .collect(),
                show_stats: true,
            },
            (None, Some(err)) => PageView::Failed {
                message: err.user_message(),
            },
            (None, None) => PageView::Loading,
        }
    }
}
