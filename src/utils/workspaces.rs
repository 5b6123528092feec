use std::cell::RefCell;

use smithay::{
    desktop::{layer_map_for_output, space::SpaceElement, Space, Window},
    output::Output,
    utils::{Logical, Point, Rectangle},
};

use crate::utils::{
    action::Direction,
    focus::{self, FocusManager},
    layout::{LayoutCache, LayoutKind},
    tags::coerce_tags,
};

pub const MIN_WINDOW_SIZE: (i32, i32) = (320, 240);

#[derive(PartialEq, Clone)]
pub enum WindowMode {
    Tiled,
    Floating,
    Grabed(Rectangle<i32, Logical>),
    Maximized(Rectangle<i32, Logical>),
    Fullscreen(Rectangle<i32, Logical>),
}

pub struct WindowUserData {
    pub mode: WindowMode,
    pub tags: u16,
    pub sticky: bool,
    pub hover: crate::utils::decoration::ButtonHoverState,
}

impl Default for WindowUserData {
    fn default() -> Self {
        Self {
            mode: WindowMode::Tiled,
            tags: 1,
            sticky: false,
            hover: crate::utils::decoration::ButtonHoverState::default(),
        }
    }
}

pub struct Workspace {
    pub full_geo: Option<Rectangle<i32, Logical>>,
    pub space: Space<Window>,
    pub layout_kind: LayoutKind,
    pub layout_cache: LayoutCache,
    pub master_ratio: f32,
    pub master_count: u32,
    pub persistent_layout: bool,
    pub active_window: Option<Window>,
    pub prev_window: Option<Window>,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            full_geo: None,
            space: Space::default(),
            layout_kind: LayoutKind::default(),
            layout_cache: LayoutCache::default(),
            master_ratio: 0.5,
            master_count: 1,
            persistent_layout: false,
            active_window: None,
            prev_window: None,
        }
    }

    pub fn cycle_layout(&mut self) {
        self.layout_kind = self.layout_kind.cycle_next();
    }

    pub fn adjust_master_ratio(&mut self, delta: f32) {
        self.master_ratio = (self.master_ratio + delta).clamp(0.1, 0.9);
    }

    pub fn adjust_master_count(&mut self, delta: i32) {
        let next = self.master_count as i32 + delta;
        self.master_count = next.clamp(1, 10) as u32;
    }
}

pub struct Workspaces {
    pub workspaces: Vec<Workspace>,
    pub active_workspace: usize,
    pub prev_workspace: usize,
}

impl Workspaces {
    pub fn new(w: u8) -> Self {
        let w = w.max(1).min(10);
        Self {
            workspaces: (0..w).map(|_| Workspace::new()).collect(),
            active_workspace: 0,
            prev_workspace: 0,
        }
    }

    pub fn set_active_window(&mut self, window: Option<Window>) {
        self.get_current_mut().active_window = window
    }

    pub fn get_active_window(&self) -> Option<Window> {
        self.get_current().active_window.clone()
    }

    pub fn get_current_mut(&mut self) -> &mut Workspace {
        &mut self.workspaces[self.active_workspace]
    }

    pub fn get_current(&self) -> &Workspace {
        &self.workspaces[self.active_workspace]
    }

    pub fn active_ws(&self) -> usize {
        self.active_workspace
    }

    pub fn is_ws_empty(&self, workspace: usize) -> bool {
        self.workspaces[workspace].space.elements().len() == 0
    }

    pub fn set_active_workspace(&mut self, workspace: usize) {
        if workspace >= self.workspaces.len() {
            return;
        }
        self.prev_workspace = self.active_workspace;
        self.active_workspace = workspace;
        if !self.workspaces[workspace].persistent_layout {
            let (kind, ratio, count) = {
                let prev = &self.workspaces[self.prev_workspace];
                (prev.layout_kind, prev.master_ratio, prev.master_count)
            };
            let ws = &mut self.workspaces[workspace];
            ws.layout_kind = kind;
            ws.master_ratio = ratio;
            ws.master_count = count;
        }
    }

    pub fn move_window_to_ws(&mut self, ws_index: usize) {
        if self.active_workspace == ws_index {
            return;
        }
        let active = match self.get_active_window() {
            Some(index) => index,
            None => return,
        };

        let ws = self.get_current_mut();
        let loc = ws.space.element_location(&active);
        ws.space.unmap_elem(&active);
        self.set_active_workspace(ws_index);
        self.insert_window(active.clone());
        if let Some(loc) = loc {
            self.get_current_mut()
                .space
                .map_element(active.clone(), loc, false);
        }
    }

    pub fn remove_window(&mut self, window: &Window) {
        let ws = self.get_current_mut();
        ws.space.unmap_elem(window);
        if ws.active_window.as_ref() == Some(window) {
            ws.active_window = None;
        }
    }

    pub fn insert_window(&mut self, window: Window) {
        enforce_min_size(&window);
        let ws = self.get_current_mut();
        ws.active_window = Some(window.clone());
        ws.space.map_element(window, (0, 0), true);
    }

    pub fn change_focus(&mut self, direction: &Direction, loc: &mut Point<f64, Logical>) {
        let ws = self.get_current();
        let focused = self.get_active_window();
        if let Some((window, _)) = best_window(direction, &ws.space, focused) {
            *loc = window_center(&ws.space, &window).unwrap();
        }
    }

    pub fn move_window(&mut self, direction: &Direction, loc: &mut Point<f64, Logical>) {
        let ws = self.get_current();
        let Some(focused) = self.get_active_window() else {
            return;
        };

        let Some((best, _)) = best_window(direction, &ws.space, Some(focused.clone())) else {
            return;
        };

        if best == focused {
            return;
        }

        let focused_pos = match ws.space.element_location(&focused) {
            Some(pos) => pos,
            None => return,
        };
        let best_pos = match ws.space.element_location(&best) {
            Some(w) => w,
            None => return,
        };
        *loc = window_center(&ws.space, &best).unwrap();
        let ws = self.get_current_mut();
        ws.space.map_element(focused, best_pos, false);
        ws.space.map_element(best, focused_pos, false);
    }
}

fn enforce_min_size(window: &Window) {
    let geo = window.geometry();
    if geo.size.w < MIN_WINDOW_SIZE.0 || geo.size.h < MIN_WINDOW_SIZE.1 {
        if let Some(toplevel) = window.toplevel() {
            toplevel.with_pending_state(|state| {
                let w = state.size.map(|s| s.w).unwrap_or(geo.size.w).max(MIN_WINDOW_SIZE.0);
                let h = state.size.map(|s| s.h).unwrap_or(geo.size.h).max(MIN_WINDOW_SIZE.1);
                state.size = Some((w, h).into());
            });
        }
    }
}

pub fn window_data(window: &Window) -> Option<std::cell::Ref<'_, WindowUserData>> {
    window
        .user_data()
        .get::<RefCell<WindowUserData>>()
        .map(|d| d.borrow())
}

pub fn window_tags(window: &Window) -> u16 {
    window
        .user_data()
        .get::<RefCell<WindowUserData>>()
        .map(|d| d.borrow().tags)
        .unwrap_or(1)
}

pub fn set_window_tags(window: &Window, tags: u16) {
    if let Some(data) = window.user_data().get::<RefCell<WindowUserData>>() {
        data.borrow_mut().tags = coerce_tags(tags);
    }
}

pub fn toggle_window_sticky(window: &Window) -> bool {
    if let Some(data) = window.user_data().get::<RefCell<WindowUserData>>() {
        let mut d = data.borrow_mut();
        d.sticky = !d.sticky;
        return d.sticky;
    }
    false
}

pub fn is_window_visible(window: &Window, selected_tags: u16) -> bool {
    window
        .user_data()
        .get::<RefCell<WindowUserData>>()
        .map(|d| {
            let d = d.borrow();
            d.sticky || (d.tags & selected_tags) != 0
        })
        .unwrap_or(true)
}

pub fn is_fullscreen<'a, I>(elements: I) -> Option<&'a Window>
where
    I: Iterator<Item = &'a Window>,
{
    for element in elements {
        let Some(data) = element.user_data().get::<RefCell<WindowUserData>>() else {
            continue;
        };
        if matches!(data.borrow().mode, WindowMode::Fullscreen(_)) {
            return Some(element);
        }
    }
    None
}

pub fn window_center(space: &Space<Window>, window: &Window) -> Option<Point<f64, Logical>> {
    let geo = space.element_geometry(window)?;

    Some(Point::from((
        (geo.loc.x + geo.size.w / 2) as f64,
        (geo.loc.y + geo.size.h / 2) as f64,
    )))
}

/// Directional focus/move candidate search: nearest window whose center lies
/// in the half-plane of `direction`, minimizing angular deviation from the
/// cardinal axis, then Euclidean distance. Delegates to the focus manager's
/// pure geometry helper so both the `Alt+hjkl` focus-move action and the
/// focus manager's own directional-focus action agree on the same math.
pub fn best_window(
    direction: &Direction,
    space: &Space<Window>,
    focused: Option<Window>,
) -> Option<(Window, i32)> {
    let focused = focused?;
    let focused_center = window_center(space, &focused)?;

    let dir = match direction {
        Direction::Left => focus::Direction::Left,
        Direction::Right => focus::Direction::Right,
        Direction::Top => focus::Direction::Up,
        Direction::Down => focus::Direction::Down,
    };

    let candidates: Vec<(&Window, Point<f64, Logical>)> = space
        .elements()
        .filter(|w| *w != &focused)
        .filter_map(|w| window_center(space, w).map(|c| (w, c)))
        .collect();

    let best = FocusManager::directional(focused_center, dir, candidates.into_iter())?;
    let distance = window_center(space, best).map(|c| {
        let dx = (c.x - focused_center.x) as i32;
        let dy = (c.y - focused_center.y) as i32;
        dx.abs() + dy.abs()
    })?;
    Some((best.clone(), distance))
}

pub fn place_on_center(space: &mut Space<Window>, window: &Window) {
    let output = match space.outputs().next().cloned() {
        Some(o) => o,
        None => return,
    };

    let output_geo = match space.output_geometry(&output) {
        Some(g) => g,
        None => return,
    };

    let layer_map = layer_map_for_output(&output);
    let zone = layer_map.non_exclusive_zone();
    let area = Rectangle::new(output_geo.loc + zone.loc, zone.size);

    if let Some(toplevel) = window.toplevel() {
        toplevel.with_pending_state(|state| {
            state.bounds = Some(area.size);
        });
    }

    let window_geo = window.geometry();
    let x = area.loc.x + (area.size.w - window_geo.size.w) / 2;
    let y = area.loc.y + (area.size.h - window_geo.size.h) / 2;

    let location = Point::from((x, y));

    space.map_element(window.clone(), location, false);
}

pub fn output_usable_area(space: &Space<Window>, output: &Output) -> Option<Rectangle<i32, Logical>> {
    let geo = space.output_geometry(output)?;
    let map = layer_map_for_output(output);
    let zone = map.non_exclusive_zone();
    Some(Rectangle::new(geo.loc + zone.loc, zone.size))
}
