pub mod actions;
pub mod emoji;
pub mod hotkeys;
pub mod html;
pub mod memo;
pub mod navigation;
pub mod timestamp;
pub mod widgets;

pub use actions::{ActionContext, ConversationActions, Navigator};
