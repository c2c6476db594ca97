use crate::ui::html::{CustomEmoji, Inline};

/// Pointer transition over a region of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hover {
    Enter,
    Leave,
}

/// A rendered region that may contain custom emoji. Implementors only ever
/// expose emoji they own, which keeps the swap inside one item.
pub trait EmojiSubtree {
    fn for_each_custom_emoji(&mut self, f: &mut dyn FnMut(&mut CustomEmoji));
}

impl EmojiSubtree for [Inline] {
    fn for_each_custom_emoji(&mut self, f: &mut dyn FnMut(&mut CustomEmoji)) {
        for run in self.iter_mut() {
            if let Inline::Emoji(emoji) = run {
                f(emoji);
            }
        }
    }
}

impl EmojiSubtree for Vec<Inline> {
    fn for_each_custom_emoji(&mut self, f: &mut dyn FnMut(&mut CustomEmoji)) {
        self.as_mut_slice().for_each_custom_emoji(f);
    }
}

/// Swaps custom emoji between their animated and static variants: animated
/// on enter, static on leave. A no-op when autoplay is on, since emoji are
/// already animated then. Returns how many sources changed.
pub fn toggle_custom_emoji<S>(subtree: &mut S, hover: Hover, autoplay: bool) -> usize
where
    S: EmojiSubtree + ?Sized,
{
    if autoplay {
        return 0;
    }

    let mut changed = 0;
    subtree.for_each_custom_emoji(&mut |emoji: &mut CustomEmoji| {
        let target = match hover {
            Hover::Enter => emoji.original.as_ref(),
            Hover::Leave => emoji.static_src.as_ref(),
        };
        if let Some(target) = target {
            if emoji.src != *target {
                emoji.src = target.clone();
                changed += 1;
            }
        }
    });
    changed
}
