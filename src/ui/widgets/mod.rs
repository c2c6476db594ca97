pub mod conversation;
pub mod menu;

pub use conversation::{ConversationItem, ConversationView, ItemLayout, RenderSettings};
pub use menu::{build_menu, MenuAction, MenuItem, MenuPopup};
