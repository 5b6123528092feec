/// Number of tag bits. Bit 0 is "tag 1", etc.
pub const TAG_COUNT: u32 = 9;
pub const ALL_TAGS: u16 = (1 << TAG_COUNT) - 1;

/// Process-wide tag selection. See the discussion of tag scope in the design
/// notes: tags are a cross-cutting visibility filter, independent of the
/// per-output workspace a window happens to live on.
pub struct TagManager {
    selected: u16,
    previous: u16,
}

impl Default for TagManager {
    fn default() -> Self {
        Self {
            selected: 1,
            previous: 1,
        }
    }
}

impl TagManager {
    pub fn selected(&self) -> u16 {
        self.selected
    }

    /// Selects exactly `tags`. No-op if `tags` is zero or already selected.
    pub fn view(&mut self, tags: u16) {
        if tags == 0 || tags == self.selected {
            return;
        }
        self.previous = self.selected;
        self.selected = tags;
    }

    /// Toggles `tag` in the current selection; never allows an empty selection.
    pub fn toggle_view(&mut self, tag: u16) {
        let new_tags = self.selected ^ tag;
        let new_tags = if new_tags == 0 { tag } else { new_tags };
        self.view(new_tags);
    }

    pub fn view_all(&mut self) {
        self.view(ALL_TAGS);
    }

    pub fn view_previous(&mut self) {
        let prev = self.previous;
        self.view(prev);
    }

    pub fn is_visible(&self, window_tags: u16, sticky: bool) -> bool {
        sticky || (window_tags & self.selected) != 0
    }
}

/// Coerces a zero bitmask to tag 1, per the "a window with zero bits is
/// invalid" invariant.
pub fn coerce_tags(tags: u16) -> u16 {
    if tags == 0 {
        1
    } else {
        tags
    }
}

pub fn toggle_window_tag(current: u16, tag: u16) -> u16 {
    let new_tags = current ^ tag;
    coerce_tags(if new_tags == 0 { tag } else { new_tags })
}

pub fn tag_mask_from_number(n: u32) -> u16 {
    if n < 1 || n > TAG_COUNT {
        0
    } else {
        1 << (n - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_noop_on_same_or_zero() {
        let mut tm = TagManager::default();
        tm.view(1);
        assert_eq!(tm.selected(), 1);
        tm.view(0);
        assert_eq!(tm.selected(), 1);
    }

    #[test]
    fn view_then_view_is_idempotent() {
        let mut tm = TagManager::default();
        tm.view(0b101);
        let after_first = tm.selected();
        tm.view(0b101);
        assert_eq!(tm.selected(), after_first);
    }

    #[test]
    fn view_a_b_previous_returns_to_a() {
        let mut tm = TagManager::default();
        tm.view(0b001);
        tm.view(0b010);
        tm.view_previous();
        assert_eq!(tm.selected(), 0b001);
    }

    #[test]
    fn tag_toggle_scenario() {
        let mut tm = TagManager::default();
        tm.view(0b000000001);
        tm.toggle_view(0b100000000);
        assert_eq!(tm.selected(), 0b100000001);
        tm.toggle_view(0b100000000);
        assert_eq!(tm.selected(), 0b000000001);
        tm.toggle_view(0b000000001);
        assert_eq!(tm.selected(), 0b000000001);
    }

    #[test]
    fn zero_tags_coerced_to_one() {
        assert_eq!(coerce_tags(0), 1);
        assert_eq!(coerce_tags(0b10), 0b10);
    }

    #[test]
    fn set_tags_idempotent() {
        let t = coerce_tags(0b101);
        assert_eq!(coerce_tags(t), t);
    }

    #[test]
    fn sticky_window_always_visible() {
        let tm = TagManager::default();
        assert!(tm.is_visible(0b10, true));
        assert!(!tm.is_visible(0b10, false));
    }
}
