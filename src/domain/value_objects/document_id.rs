use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// 既存の識別子文字列から生成する。空文字は受け付けない。
            pub fn new(value: impl Into<String>) -> Result<Self, String> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(format!("{} cannot be empty", stringify!($name)));
                }
                Ok(Self(value))
            }

            /// 新しい識別子を採番する。
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4().simple().to_string())
            }

            /// 任意パラメータを受け取り、未指定・空文字なら `None` を返す。
            pub fn from_optional(value: Option<&str>) -> Option<Self> {
                value.and_then(|v| Self::new(v).ok())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

document_id!(
    /// User ドキュメントの識別子
    UserId
);
document_id!(
    /// Post ドキュメントの識別子
    PostId
);
document_id!(
    /// Save（ブックマーク）ドキュメントの識別子
    SaveId
);
