pub mod post;
pub mod save;
pub mod user;

pub use post::{Creator, ImageRef, NewPost, Post, UpdatePost};
pub use save::Save;
pub use user::{NewUser, Session, SignInCredentials, UpdateUser, User};
