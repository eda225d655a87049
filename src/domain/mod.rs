pub mod entities;
pub mod value_objects;

pub use entities::{Post, Save, User};
pub use value_objects::{PageCursor, PostId, SaveId, UserId};
