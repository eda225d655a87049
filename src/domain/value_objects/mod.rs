pub mod document_id;
pub mod page_cursor;

pub use document_id::{PostId, SaveId, UserId};
pub use page_cursor::PageCursor;
