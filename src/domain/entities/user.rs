use super::post::{Creator, Post};
use super::save::Save;
use crate::domain::value_objects::{PostId, SaveId, UserId};
use crate::shared::validation::{ProfileForm, SignupForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub bio: String,
    /// いいねした投稿
    pub liked: Vec<Post>,
    /// 保存した投稿（保存した順）
    pub saves: Vec<Save>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, username: String, email: String) -> Self {
        Self {
            id: UserId::random(),
            name,
            username,
            email,
            image_url: String::new(),
            bio: String::new(),
            liked: Vec::new(),
            saves: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn creator(&self) -> Creator {
        Creator {
            id: self.id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            image_url: self.image_url.clone(),
        }
    }

    /// 指定した投稿の保存記録 ID（未保存なら `None`）
    pub fn saved_record_for(&self, post_id: &PostId) -> Option<&SaveId> {
        self.saves
            .iter()
            .find(|save| &save.post.id == post_id)
            .map(|save| &save.id)
    }

    pub fn has_saved(&self, post_id: &PostId) -> bool {
        self.saved_record_for(post_id).is_some()
    }

    pub fn apply_update(&mut self, update: &UpdateUser) {
        self.name = update.name.clone();
        self.bio = update.bio.clone();
        if let Some(image_url) = &update.image_url {
            self.image_url = image_url.clone();
        }
    }
}

/// サインアップ時の入力
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl From<SignupForm> for NewUser {
    fn from(form: SignupForm) -> Self {
        Self {
            name: form.name,
            username: form.username,
            email: form.email,
            password: form.password,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateUser {
    pub user_id: UserId,
    pub name: String,
    pub bio: String,
    /// アバターを差し替える場合のみ `Some`
    pub image_url: Option<String>,
}

impl UpdateUser {
    pub fn from_form(user_id: UserId, form: &ProfileForm, image_url: Option<String>) -> Self {
        Self {
            user_id,
            name: form.name.clone(),
            bio: form.bio.clone(),
            image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignInCredentials {
    pub email: String,
    pub password: String,
}

/// サインイン後のセッション
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}
