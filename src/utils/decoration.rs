use smithay::utils::{Logical, Point, Rectangle};

pub const TITLE_BAR_HEIGHT: i32 = 30;
const BUTTON_SIZE: i32 = 18;
const BUTTON_MARGIN: i32 = 6;
const BUTTON_SPACING: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleButton {
    Close,
    Maximize,
    Minimize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ButtonHoverState {
    pub close: bool,
    pub maximize: bool,
    pub minimize: bool,
}

impl ButtonHoverState {
    pub fn any(&self) -> bool {
        self.close || self.maximize || self.minimize
    }
}

/// Title bar + border geometry for one window's full rectangle. Fullscreen
/// windows get no decoration at all; callers should not call this for them.
pub struct Decoration {
    pub title_bar: Rectangle<i32, Logical>,
    pub border_width: i32,
    pub buttons: [(TitleButton, Rectangle<i32, Logical>); 3],
}

impl Decoration {
    /// `full` is the window's outer (tiling-engine) rectangle. The border
    /// wraps the whole thing — title bar and content alike — so the title
    /// bar is itself inset `border_width` from `full` on each side, sitting
    /// flush above the content rectangle.
    pub fn for_window(full: Rectangle<i32, Logical>, border_width: i32) -> Self {
        let title_bar = Rectangle::new(
            (full.loc.x + border_width, full.loc.y + border_width).into(),
            (full.size.w - 2 * border_width, TITLE_BAR_HEIGHT).into(),
        );

        let button_y = (TITLE_BAR_HEIGHT - BUTTON_SIZE) / 2;
        let close_x = title_bar.size.w - BUTTON_MARGIN - BUTTON_SIZE;
        let maximize_x = close_x - BUTTON_SIZE - BUTTON_SPACING;
        let minimize_x = maximize_x - BUTTON_SIZE - BUTTON_SPACING;

        let button_rect = |x: i32| {
            Rectangle::new(
                (title_bar.loc.x + x, title_bar.loc.y + button_y).into(),
                (BUTTON_SIZE, BUTTON_SIZE).into(),
            )
        };

        Decoration {
            title_bar,
            border_width,
            buttons: [
                (TitleButton::Close, button_rect(close_x)),
                (TitleButton::Maximize, button_rect(maximize_x)),
                (TitleButton::Minimize, button_rect(minimize_x)),
            ],
        }
    }

    /// Content rectangle: the client's drawable area, inset for the border
    /// on every edge (`2×border_width` off each axis) plus the title bar
    /// riding inside the top border band.
    pub fn content_rect(full: Rectangle<i32, Logical>, border_width: i32) -> Rectangle<i32, Logical> {
        Rectangle::new(
            (
                full.loc.x + border_width,
                full.loc.y + border_width + TITLE_BAR_HEIGHT,
            )
                .into(),
            (
                full.size.w - 2 * border_width,
                full.size.h - 2 * border_width - TITLE_BAR_HEIGHT,
            )
                .into(),
        )
    }

    /// Inverse of [`Self::content_rect`]: recovers the outer (title bar +
    /// border) rectangle a mapped window's content geometry sits inside.
    pub fn full_rect_from_content(
        content: Rectangle<i32, Logical>,
        border_width: i32,
    ) -> Rectangle<i32, Logical> {
        Rectangle::new(
            (
                content.loc.x - border_width,
                content.loc.y - border_width - TITLE_BAR_HEIGHT,
            )
                .into(),
            (
                content.size.w + 2 * border_width,
                content.size.h + 2 * border_width + TITLE_BAR_HEIGHT,
            )
                .into(),
        )
    }

    pub fn button_at(&self, point: Point<i32, Logical>) -> Option<TitleButton> {
        self.buttons
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(btn, _)| *btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_are_right_anchored_in_order() {
        let full = Rectangle::new((0, 0).into(), (800, 600).into());
        let deco = Decoration::for_window(full, 2);
        let (close_btn, close_rect) = deco.buttons[0];
        let (maximize_btn, maximize_rect) = deco.buttons[1];
        let (minimize_btn, minimize_rect) = deco.buttons[2];
        assert_eq!(close_btn, TitleButton::Close);
        assert_eq!(maximize_btn, TitleButton::Maximize);
        assert_eq!(minimize_btn, TitleButton::Minimize);
        assert!(close_rect.loc.x > maximize_rect.loc.x);
        assert!(maximize_rect.loc.x > minimize_rect.loc.x);
    }

    #[test]
    fn content_rect_excludes_title_and_border() {
        let full = Rectangle::new((0, 0).into(), (800, 600).into());
        let content = Decoration::content_rect(full, 2);
        assert_eq!(content.loc, (2, 2 + TITLE_BAR_HEIGHT).into());
        assert_eq!(content.size.w, 800 - 2 * 2);
        assert_eq!(content.size.h, 600 - 2 * 2 - TITLE_BAR_HEIGHT);
    }

    #[test]
    fn content_rect_reduces_each_axis_by_border_on_both_sides() {
        let full = Rectangle::new((5, 5).into(), (420, 330).into());
        let border = 4;
        let content = Decoration::content_rect(full, border);
        assert_eq!(content.size.w, full.size.w - 2 * border);
        assert_eq!(content.size.h, full.size.h - 2 * border - TITLE_BAR_HEIGHT);
    }

    #[test]
    fn full_rect_from_content_inverts_content_rect() {
        let full = Rectangle::new((10, 10).into(), (800, 600).into());
        let content = Decoration::content_rect(full, 2);
        assert_eq!(Decoration::full_rect_from_content(content, 2), full);
    }

    #[test]
    fn hit_test_button_region() {
        let full = Rectangle::new((0, 0).into(), (800, 600).into());
        let deco = Decoration::for_window(full, 2);
        let (_, close_rect) = deco.buttons[0];
        let inside = close_rect.loc + Point::from((2, 2));
        assert_eq!(deco.button_at(inside), Some(TitleButton::Close));
        assert_eq!(deco.button_at((0, 0).into()), None);
    }
}
