use std::cell::RefCell;
use std::process::Command;

use serde::{Deserialize, Serialize};
use smithay::backend::session::Session;
use smithay::desktop::WindowSurface;
use smithay::input::keyboard::XkbConfig;
use smithay::input::pointer::{Focus, GrabStartData};
use smithay::reexports::wayland_protocols::xdg::shell::server::xdg_toplevel::ResizeEdge;
use smithay::utils::{Logical, Point};
use smithay::wayland::seat::WaylandFocus;
use smithay::wayland::shell::xdg::XdgShellHandler;
#[cfg(feature = "xwayland")]
use smithay::xwayland::XwmHandler;

use crate::state::State;
use crate::utils::config::Config;
use crate::utils::grab::MovePointerGrab;
use crate::utils::layout::LayoutKind;
use crate::utils::tags::{coerce_tags, tag_mask_from_number, toggle_window_tag};
use crate::utils::workspaces::{is_fullscreen, place_on_center, WindowMode, WindowUserData};
use crate::SERIAL_COUNTER;

/// Delay between steps of a macro binding, per the keybinding engine's macro spec.
pub const MACRO_STEP_DELAY_MS: u64 = 50;
/// Hard cap on macro step count, mirroring the reference implementation's bound.
pub const MAX_MACRO_STEPS: usize = 16;

#[derive(PartialEq, Serialize, Deserialize, Clone)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Exec { command: String },
    KillActive,
    Workspace { index: usize },
    MoveToWorkspace { index: usize },
    Exit,
    Fullscreen,
    MoveFocus { direction: Direction },
    MoveWindow { direction: Direction },
    VTSwitch(i32),
    SwitchLayout,
    ReloadConfig,
    FloatingWindow,
    MoveWindowMouse,
    ResizeWindowMouse,
    Sticky,
    Maximize,
    LayoutCycle,
    LayoutSet { kind: LayoutKind },
    MasterRatio { increase: bool },
    MasterCount { increase: bool },
    Gaps { increase: bool },
    TagView { tag_number: u32 },
    TagToggleView { tag_number: u32 },
    TagViewAll,
    TagViewPrevious,
    WindowTag { tag_number: u32 },
    WindowTagToggle { tag_number: u32 },
    FocusNext,
    FocusPrev,
    FocusUrgent,
    Macro { steps: Vec<Action> },
}

#[derive(PartialEq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Top,
    Down,
}

impl Action {
    pub fn execute(&self, state: &mut State) {
        let pointer = state.seat.get_pointer().unwrap();
        let serial = SERIAL_COUNTER.next_serial();
        if pointer.is_grabbed() {
            pointer.unset_grab(state, serial, 0);
            match self {
                Action::MoveWindowMouse | Action::ResizeWindowMouse => return,
                _ => {}
            }
        }
        match self {
            Action::VTSwitch(vt) => {
                if let Err(err) = state.backend_data.session.change_vt(*vt) {
                    tracing::error!("Error changing vt: {}", err)
                }
            }
            Action::Exit => {
                state.loop_signal.stop();
            }
            Action::Exec { command } => {
                tracing::debug!("Spawning '{command}'");
                Command::new("/bin/sh")
                    .arg("-c")
                    .arg(command)
                    .env(
                        "WAYLAND_DISPLAY",
                        state.socket_name.to_string_lossy().into_owned().clone(),
                    )
                    .spawn()
                    .map_err(|e| tracing::info!("Failed to spawn '{command}': {e}"))
                    .ok();
            }
            Action::KillActive => {
                let active = match state.workspaces.get_active_window() {
                    Some(w) => w,
                    None => return,
                };
                match active.underlying_surface() {
                    WindowSurface::Wayland(xdg) => {
                        xdg.send_close();
                    }
                    #[cfg(feature = "xwayland")]
                    WindowSurface::X11(x11) => {
                        x11.close();
                    }
                }
            }
            Action::FloatingWindow => {
                let active = match state.workspaces.get_active_window() {
                    Some(w) => w,
                    None => return,
                };

                let mut user_data = active
                    .user_data()
                    .get::<RefCell<WindowUserData>>()
                    .unwrap()
                    .borrow_mut();
                let ws = state.workspaces.get_current_mut();
                match user_data.mode {
                    WindowMode::Tiled => {
                        user_data.mode = WindowMode::Floating;
                        place_on_center(&mut ws.space, &active);
                    }
                    WindowMode::Floating => {
                        user_data.mode = WindowMode::Tiled;
                    }
                    WindowMode::Fullscreen(_) | WindowMode::Grabed(_) | WindowMode::Maximized(_) => {}
                }
                drop(user_data);
                state.refresh_layout();
            }
            Action::ReloadConfig => state.config = Config::get_config().unwrap_or_default(),
            Action::SwitchLayout => {
                let keyboard = state.seat.get_keyboard().unwrap();
                let current_pos = state
                    .config
                    .keyboard
                    .layouts
                    .iter()
                    .position(|l| *l == state.current_layout)
                    .unwrap_or(0);
                let layout = state
                    .config
                    .keyboard
                    .layouts
                    .get(current_pos + 1)
                    .map_or("us".to_string(), |v| v.to_string());

                state.current_layout = layout.clone();
                let xkb_config = XkbConfig {
                    layout: &layout,
                    ..Default::default()
                };
                let _ = keyboard.set_xkb_config(state, xkb_config);
            }
            Action::Workspace { index } => {
                state.workspaces.set_active_workspace(*index - 1);
                state.refresh_layout();
                state.set_keyboard_focus_auto();
            }
            Action::MoveToWorkspace { index } => {
                state.workspaces.move_window_to_ws(*index - 1);
                state.refresh_layout();
                state.set_keyboard_focus_auto();
            }
            Action::MoveWindow { direction } => {
                state
                    .workspaces
                    .move_window(direction, &mut state.pointer_location);
                state.refresh_layout();
                state.set_keyboard_focus_auto();
            }
            Action::MoveFocus { direction } => {
                state
                    .workspaces
                    .change_focus(direction, &mut state.pointer_location);
                state.set_keyboard_focus_auto();
            }
            Action::Fullscreen => {
                let active_window = match &state.workspaces.get_current().active_window {
                    Some(active) => active,
                    None => return,
                };
                let elements = state.workspaces.get_current().space.elements();
                if let Some(fullscreen) = is_fullscreen(elements) {
                    //if fullscreen == acitve_window {
                    //    state.unfullscreen_request(acitve_window.toplevel().unwrap().clone());
                    //}
                    match fullscreen.underlying_surface() {
                        WindowSurface::Wayland(xdg) => {
                            XdgShellHandler::unfullscreen_request(state, xdg.clone());
                        }
                        #[cfg(feature = "xwayland")]
                        WindowSurface::X11(x11) => {
                            let xwm_id = state.xwm.as_ref().unwrap().id();
                            XwmHandler::unfullscreen_request(state, xwm_id, x11.clone());
                        }
                    }
                } else {
                    match active_window.underlying_surface() {
                        WindowSurface::Wayland(xdg) => {
                            XdgShellHandler::fullscreen_request(state, xdg.clone(), None);
                        }
                        #[cfg(feature = "xwayland")]
                        WindowSurface::X11(x11) => {
                            let xwm_id = state.xwm.as_ref().unwrap().id();
                            XwmHandler::fullscreen_request(state, xwm_id, x11.clone());
                        }
                    }
                }
            }
            Action::MoveWindowMouse => {
                let surface = match state.surface_under() {
                    Some(surface) => surface,
                    None => return,
                };
                let ws = state.workspaces.get_current_mut();
                let window = ws
                    .space
                    .elements()
                    .find(|element| {
                        element
                            .wl_surface()
                            .map(|s| &*s == &surface.0)
                            .unwrap_or(false)
                    })
                    .unwrap()
                    .clone();
                tracing::info!("start reposition");
                let start_data = GrabStartData {
                    focus: Some(surface),
                    button: 272,
                    location: state.pointer_location,
                };
                let window_geo = match ws.space.element_geometry(&window) {
                    Some(l) => l,
                    None => return,
                };

                let pointer_pos = start_data.location;

                let start_loc: Point<i32, Logical> = (
                    pointer_pos.x as i32 - (window_geo.size.w as i32 / 2),
                    pointer_pos.y as i32 - (window_geo.size.h as i32 / 2),
                )
                    .into();

                window
                    .user_data()
                    .get::<RefCell<WindowUserData>>()
                    .unwrap()
                    .borrow_mut()
                    .mode = WindowMode::Floating;

                ws.space.map_element(window.clone(), start_loc, false);
                let grab = MovePointerGrab {
                    start_data,
                    window,
                    start_loc,
                };

                pointer.set_grab(state, grab, serial, Focus::Clear);
                state.refresh_layout();
            }
            Action::ResizeWindowMouse => {
                let surface = match state.surface_under() {
                    Some(surface) => surface,
                    None => return,
                };
                let ws = state.workspaces.get_current_mut();
                let window = match ws.space.elements().find(|element| {
                    element.wl_surface().map(|s| &*s == &surface.0).unwrap_or(false)
                }) {
                    Some(w) => w.clone(),
                    None => return,
                };
                let start_geo = match ws.space.element_geometry(&window) {
                    Some(g) => g,
                    None => return,
                };

                let start_data = GrabStartData {
                    focus: Some(surface),
                    button: 273,
                    location: state.pointer_location,
                };

                // Pick the resize edge from which quadrant of the window the
                // pointer sits in at grab time.
                let rel_x = start_data.location.x - start_geo.loc.x as f64;
                let rel_y = start_data.location.y - start_geo.loc.y as f64;
                let right = rel_x > start_geo.size.w as f64 / 2.0;
                let bottom = rel_y > start_geo.size.h as f64 / 2.0;
                let edges = match (right, bottom) {
                    (true, true) => ResizeEdge::BottomRight,
                    (true, false) => ResizeEdge::TopRight,
                    (false, true) => ResizeEdge::BottomLeft,
                    (false, false) => ResizeEdge::TopLeft,
                };

                window
                    .user_data()
                    .get::<RefCell<WindowUserData>>()
                    .unwrap()
                    .borrow_mut()
                    .mode = WindowMode::Floating;

                let grab = crate::utils::grab::ResizePointerGrub {
                    start_data,
                    window: window.clone(),
                    edges,
                    start_geo,
                    last_window_size: start_geo.size,
                };

                pointer.set_grab(state, grab, serial, Focus::Clear);
                state.refresh_layout();
            }
            Action::Sticky => {
                let Some(active) = state.workspaces.get_active_window() else {
                    return;
                };
                crate::utils::workspaces::toggle_window_sticky(&active);
                state.refresh_layout();
            }
            Action::Maximize => {
                let Some(active) = state.workspaces.get_active_window() else {
                    return;
                };
                toggle_maximize(state, &active);
            }
            Action::LayoutCycle => {
                state.workspaces.get_current_mut().cycle_layout();
                state.refresh_layout();
            }
            Action::LayoutSet { kind } => {
                state.workspaces.get_current_mut().layout_kind = *kind;
                state.refresh_layout();
            }
            Action::MasterRatio { increase } => {
                let delta = if *increase { 0.05 } else { -0.05 };
                state.workspaces.get_current_mut().adjust_master_ratio(delta);
                state.refresh_layout();
            }
            Action::MasterCount { increase } => {
                let delta = if *increase { 1 } else { -1 };
                state.workspaces.get_current_mut().adjust_master_count(delta);
                state.refresh_layout();
            }
            Action::Gaps { increase } => {
                let delta = if *increase { 1 } else { -1 };
                state.config.border.gap = (state.config.border.gap + delta).max(0);
                state.refresh_layout();
            }
            Action::TagView { tag_number } => {
                state.tags.view(tag_mask_from_number(*tag_number));
                state.refresh_layout();
            }
            Action::TagToggleView { tag_number } => {
                state.tags.toggle_view(tag_mask_from_number(*tag_number));
                state.refresh_layout();
            }
            Action::TagViewAll => {
                state.tags.view_all();
                state.refresh_layout();
            }
            Action::TagViewPrevious => {
                state.tags.view_previous();
                state.refresh_layout();
            }
            Action::WindowTag { tag_number } => {
                if let Some(active) = state.workspaces.get_active_window() {
                    crate::utils::workspaces::set_window_tags(
                        &active,
                        coerce_tags(tag_mask_from_number(*tag_number)),
                    );
                    state.refresh_layout();
                }
            }
            Action::WindowTagToggle { tag_number } => {
                if let Some(active) = state.workspaces.get_active_window() {
                    let current = crate::utils::workspaces::window_tags(&active);
                    let new_tags = toggle_window_tag(current, tag_mask_from_number(*tag_number));
                    crate::utils::workspaces::set_window_tags(&active, new_tags);
                    state.refresh_layout();
                }
            }
            Action::FocusNext => {
                state.focus.cycle(true);
                if let Some(w) = state.focus.cycle_preview().cloned() {
                    state.set_keyboard_focus(w.wl_surface().map(|s| s.as_ref().clone()));
                }
                state.focus.cycle_commit();
            }
            Action::FocusPrev => {
                state.focus.cycle(false);
                if let Some(w) = state.focus.cycle_preview().cloned() {
                    state.set_keyboard_focus(w.wl_surface().map(|s| s.as_ref().clone()));
                }
                state.focus.cycle_commit();
            }
            Action::FocusUrgent => {
                if let Some(w) = state.focus.first_urgent().cloned() {
                    state.focus.clear_urgent(&w);
                    state.set_keyboard_focus(w.wl_surface().map(|s| s.as_ref().clone()));
                    state.focus.focus(Some(w));
                }
            }
            Action::Macro { steps } => {
                for step in steps.iter().take(MAX_MACRO_STEPS) {
                    step.execute(state);
                }
            }
        };
    }
}

/// Toggles `window` between tiled/floating and a maximized state covering
/// the output's usable area, restoring its pre-maximize geometry on undo.
/// Shared by the `Maximize` keybinding and the title-bar maximize button.
pub fn toggle_maximize(state: &mut State, window: &smithay::desktop::Window) {
    let ws = state.workspaces.get_current_mut();
    let mut user_data = window
        .user_data()
        .get::<RefCell<WindowUserData>>()
        .unwrap()
        .borrow_mut();
    match user_data.mode {
        WindowMode::Maximized(saved) => {
            user_data.mode = WindowMode::Tiled;
            drop(user_data);
            ws.space.map_element(window.clone(), saved.loc, false);
        }
        _ => {
            let Some(current) = ws.space.element_geometry(window) else {
                return;
            };
            user_data.mode = WindowMode::Maximized(current);
            drop(user_data);
            if let Some(output) = ws.space.outputs().next().cloned() {
                if let Some(area) = crate::utils::workspaces::output_usable_area(&ws.space, &output) {
                    ws.space.map_element(window.clone(), area.loc, false);
                    if let Some(toplevel) = window.toplevel() {
                        toplevel.with_pending_state(|s| s.size = Some(area.size));
                        toplevel.send_configure();
                    }
                }
            }
        }
    }
}
