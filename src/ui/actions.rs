use crate::conversation::Status;

/// Everything a conversation item asks of the outside world.
///
/// All calls are fire-and-forget: the item never inspects a result and
/// never mutates its own props in response. Visible changes arrive later
/// as new props from the store.
pub trait ConversationActions {
    fn move_up(&mut self, conversation_id: &str);
    fn move_down(&mut self, conversation_id: &str);
    fn mark_read(&mut self, conversation_id: &str);
    fn delete(&mut self, conversation_id: &str);
    fn mute(&mut self, status: &Status);
    fn toggle_hidden(&mut self, status: &Status);
    fn reply(&mut self, status: &Status, navigator: Option<&mut dyn Navigator>);
}

/// Route navigation capability. Absent when the item is hosted outside a
/// routable context.
pub trait Navigator {
    fn push(&mut self, path: &str);
}

/// Collaborators handed to an item for the duration of one event.
pub struct ActionContext<'a> {
    pub actions: &'a mut dyn ConversationActions,
    pub navigator: Option<&'a mut dyn Navigator>,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        actions: &'a mut dyn ConversationActions,
        navigator: Option<&'a mut dyn Navigator>,
    ) -> Self {
        Self { actions, navigator }
    }

    /// Reborrows the navigator for a single call.
    pub fn navigator(&mut self) -> Option<&mut dyn Navigator> {
        match self.navigator {
            Some(ref mut nav) => Some(&mut **nav),
            None => None,
        }
    }

    /// Borrows both collaborators at once, for calls that take the navigator
    /// as an argument.
    pub fn split(&mut self) -> (&mut dyn ConversationActions, Option<&mut dyn Navigator>) {
        let navigator: Option<&mut dyn Navigator> = match self.navigator {
            Some(ref mut nav) => Some(&mut **nav),
            None => None,
        };
        (&mut *self.actions, navigator)
    }
}
