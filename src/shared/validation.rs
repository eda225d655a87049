//! フォーム入力のバリデーション。
//!
//! 各フォームは `validator` の derive で規則を宣言し、結果をフィールド順の違反リストに直す。
//! どんな入力に対しても `Ok(())` か違反リストを返し、失敗した入力がバックエンドへ届くことはない。

use super::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use validator::ValidationError;

pub const CAPTION_MAX_CHARS: usize = 2200;
pub const LOCATION_MAX_CHARS: usize = 1000;

const INVALID_EMAIL: &str = "Invalid email";

// local 部はドット区切りのセグメント、ドメインは英数字とハイフンのラベル + 2 文字以上の英字 TLD
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_'+-]+(?:\.[A-Za-z0-9_'+-]+)*@(?:[A-Za-z0-9][A-Za-z0-9-]*\.)+[A-Za-z]{2,}$",
    )
    .expect("hardcoded email regex is invalid")
});

/// 1 フィールド分の違反
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// `validator` の結果を `fields` の順に並べ直す。メッセージが無い違反はコードを使う
    fn collect(
        result: Result<(), validator::ValidationErrors>,
        fields: &[&str],
    ) -> Result<(), ValidationErrors> {
        let Err(errors) = result else {
            return Ok(());
        };
        let by_field = errors.field_errors();
        let violations = fields
            .iter()
            .filter_map(|field| by_field.get(*field).map(|errs| (*field, errs)))
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| FieldViolation {
                    field: field.to_string(),
                    message: err
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                })
            })
            .collect();
        Err(ValidationErrors { violations })
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// 指定フィールドの最初の違反メッセージ
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.violations
            .iter()
            .find(|v| v.field == field)
            .map(|v| v.message.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.message_for(field).is_some()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, validator::Validate)]
pub struct SignupForm {
    #[validate(length(min = 2, message = "The name should be at least 2 characters!"))]
    pub name: String,
    #[validate(length(min = 2, message = "Username should be at least 2 characters!"))]
    pub username: String,
    #[validate(custom(function = "email_syntax"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password should be at least 8 characters!"))]
    pub password: String,
}

impl Validate for SignupForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::collect(
            validator::Validate::validate(self),
            &["name", "username", "email", "password"],
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, validator::Validate)]
pub struct SigninForm {
    #[validate(custom(function = "email_syntax"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password should be at least 8 characters!"))]
    pub password: String,
}

impl Validate for SigninForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::collect(validator::Validate::validate(self), &["email", "password"])
    }
}

/// 投稿作成・編集フォーム
#[derive(Debug, Clone, Default, Serialize, Deserialize, validator::Validate)]
pub struct PostForm {
    #[validate(
        length(min = 5, message = "Minimum 5 characters."),
        custom(function = "caption_within_limit")
    )]
    pub caption: String,
    #[validate(
        length(min = 1, message = "This field is required"),
        custom(function = "location_within_limit")
    )]
    pub location: String,
    /// カンマ区切りのタグ
    pub tags: String,
}

impl PostForm {
    /// "art, expression" → ["art", "expression"]
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(|tag| tag.split_whitespace().collect::<String>())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

impl Validate for PostForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::collect(validator::Validate::validate(self), &["caption", "location"])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, validator::Validate)]
pub struct ProfileForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub name: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub username: String,
    #[validate(custom(function = "email_syntax"))]
    pub email: String,
    pub bio: String,
}

impl Validate for ProfileForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::collect(
            validator::Validate::validate(self),
            &["name", "username", "email"],
        )
    }
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn email_syntax(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(violation("email", INVALID_EMAIL))
    }
}

// validator の length は最小と最大でメッセージを分けられないので、上限は別に見る
fn caption_within_limit(caption: &str) -> Result<(), ValidationError> {
    if caption.chars().count() > CAPTION_MAX_CHARS {
        return Err(violation("length", "Maximum 2,200 characters."));
    }
    Ok(())
}

fn location_within_limit(location: &str) -> Result<(), ValidationError> {
    if location.chars().count() > LOCATION_MAX_CHARS {
        return Err(violation("length", "Maximum 1000 characters."));
    }
    Ok(())
}

/// メールアドレスの構文チェック
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}
