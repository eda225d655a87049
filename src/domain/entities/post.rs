use crate::domain::value_objects::{PostId, UserId};
use crate::shared::utils::check_is_liked;
use crate::shared::validation::PostForm;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 投稿に埋め込まれる作成者の要約
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Creator {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub creator: Creator,
    pub caption: String,
    pub image_url: String,
    pub image_id: String,
    pub location: String,
    pub tags: Vec<String>,
    /// いいねしたユーザー ID（いいねした順）
    pub likes: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(creator: Creator, caption: String) -> Self {
        Self {
            id: PostId::random(),
            creator,
            caption,
            image_url: String::new(),
            image_id: String::new(),
            location: String::new(),
            tags: Vec::new(),
            likes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_liked_by(&self, user_id: &UserId) -> bool {
        check_is_liked(&self.likes, user_id.as_str())
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// `user_id` のいいねを反転させた後のいいね一覧
    pub fn toggled_likes(&self, user_id: &UserId) -> Vec<UserId> {
        if self.is_liked_by(user_id) {
            self.likes.iter().filter(|id| *id != user_id).cloned().collect()
        } else {
            let mut likes = self.likes.clone();
            likes.push(user_id.clone());
            likes
        }
    }

    pub fn apply_update(&mut self, update: &UpdatePost) {
        self.caption = update.caption.clone();
        self.location = update.location.clone();
        self.tags = update.tags.clone();
        if let Some(image) = &update.image {
            self.image_url = image.image_url.clone();
            self.image_id = image.image_id.clone();
        }
    }
}

/// アップロード済み画像への参照（アップロード自体はこのクレートの外）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    pub image_id: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPost {
    pub creator: UserId,
    pub caption: String,
    pub image: ImageRef,
    pub location: String,
    pub tags: Vec<String>,
}

impl NewPost {
    pub fn from_form(creator: UserId, form: &PostForm, image: ImageRef) -> Self {
        Self {
            creator,
            caption: form.caption.clone(),
            image,
            location: form.location.clone(),
            tags: form.tag_list(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdatePost {
    pub post_id: PostId,
    pub caption: String,
    /// 画像を差し替える場合のみ `Some`
    pub image: Option<ImageRef>,
    pub location: String,
    pub tags: Vec<String>,
}

impl UpdatePost {
    pub fn from_form(post_id: PostId, form: &PostForm, image: Option<ImageRef>) -> Self {
        Self {
            post_id,
            caption: form.caption.clone(),
            image,
            location: form.location.clone(),
            tags: form.tag_list(),
        }
    }
}
