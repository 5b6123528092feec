use smithay::{
    desktop::Window,
    input::pointer::{
        AxisFrame, ButtonEvent, Focus, GestureHoldBeginEvent, GestureHoldEndEvent,
        GesturePinchBeginEvent, GesturePinchEndEvent, GesturePinchUpdateEvent,
        GestureSwipeBeginEvent, GestureSwipeEndEvent, GestureSwipeUpdateEvent, GrabStartData,
        MotionEvent, PointerGrab, PointerInnerHandle, RelativeMotionEvent,
    },
    reexports::{
        wayland_protocols::xdg::shell::server::xdg_toplevel::{self, ResizeEdge},
        wayland_server::protocol::wl_surface::WlSurface,
    },
    utils::{IsAlive, Logical, Point, Rectangle, Serial, Size},
};

use crate::state::State;
use crate::utils::snapping::{snap_position, SnapConfig};

pub struct MovePointerGrab {
    pub start_data: GrabStartData<State>,
    pub window: Window,
    pub start_loc: Point<i32, Logical>,
}

impl PointerGrab<State> for MovePointerGrab {
    fn motion(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        _focus: Option<(WlSurface, Point<f64, Logical>)>,
        event: &MotionEvent,
    ) {
        // While the grab is active, no client has pointer focus
        handle.motion(data, None, event);

        let ws = data.workspaces.get_current_mut();

        let delta = event.location - self.start_data.location;
        let new_location = self.start_loc.to_f64() + delta;
        let proposed = new_location.to_i32_round();

        let window_size = self.window.geometry().size;
        let output = ws.space.outputs().next().cloned();
        let snapped = match output.and_then(|o| ws.space.output_geometry(&o)) {
            Some(output_geo) => {
                let others: Vec<Rectangle<i32, Logical>> = ws
                    .space
                    .elements()
                    .filter(|w| *w != &self.window)
                    .filter_map(|w| ws.space.element_geometry(w))
                    .collect();
                snap_position(
                    &SnapConfig::default(),
                    (window_size.w, window_size.h),
                    proposed,
                    &others,
                    output_geo,
                )
            }
            None => proposed,
        };

        ws.space.map_element(self.window.clone(), snapped, false);
    }

    fn relative_motion(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        focus: Option<(WlSurface, Point<f64, Logical>)>,
        event: &RelativeMotionEvent,
    ) {
        handle.relative_motion(data, focus, event);
    }

    fn button(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &ButtonEvent,
    ) {
        handle.button(data, event);

        handle.unset_grab(self, data, event.serial, event.time, true);
    }

    fn axis(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        details: AxisFrame,
    ) {
        handle.axis(data, details)
    }

    fn frame(&mut self, data: &mut State, handle: &mut PointerInnerHandle<'_, State>) {
        handle.frame(data);
    }

    fn gesture_swipe_begin(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureSwipeBeginEvent,
    ) {
        handle.gesture_swipe_begin(data, event)
    }

    fn gesture_swipe_update(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureSwipeUpdateEvent,
    ) {
        handle.gesture_swipe_update(data, event)
    }

    fn gesture_swipe_end(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureSwipeEndEvent,
    ) {
        handle.gesture_swipe_end(data, event)
    }

    fn gesture_pinch_begin(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GesturePinchBeginEvent,
    ) {
        handle.gesture_pinch_begin(data, event)
    }

    fn gesture_pinch_update(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GesturePinchUpdateEvent,
    ) {
        handle.gesture_pinch_update(data, event)
    }

    fn gesture_pinch_end(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GesturePinchEndEvent,
    ) {
        handle.gesture_pinch_end(data, event)
    }

    fn gesture_hold_begin(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureHoldBeginEvent,
    ) {
        handle.gesture_hold_begin(data, event)
    }

    fn gesture_hold_end(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureHoldEndEvent,
    ) {
        handle.gesture_hold_end(data, event)
    }

    fn start_data(&self) -> &GrabStartData<State> {
        &self.start_data
    }

    fn unset(&mut self, _data: &mut State) {}
}

pub struct ResizePointerGrub {
    pub start_data: GrabStartData<State>,
    pub window: Window,
    pub edges: ResizeEdge,
    pub start_geo: Rectangle<i32, Logical>,
    pub last_window_size: Size<i32, Logical>,
}

impl PointerGrab<State> for ResizePointerGrub {
    fn motion(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        _focus: Option<(WlSurface, Point<f64, Logical>)>,
        event: &MotionEvent,
    ) {
        // While the grab is active, no client has pointer focus
        handle.motion(data, None, event);

        // It is impossible to get `min_size` and `max_size` of dead toplevel, so we return early.
        if !self.window.alive() {
            handle.unset_grab(self, data, event.serial, event.time, true);
            return;
        }

        let delta = event.location - self.start_data.location;

        let mut new_size = self.start_geo.size;
        let mut new_loc = self.start_geo.loc;

        match self.edges {
            ResizeEdge::Left => {
                let dx = delta.x as i32;
                new_size.w -= dx;
                new_loc.x += dx;
            }
            ResizeEdge::Top => {
                let dy = delta.y as i32;
                new_size.h -= dy;
                new_loc.y += dy;
            }
            ResizeEdge::Right => {
                new_size.w += delta.x as i32;
            }
            ResizeEdge::Bottom => {
                new_size.h += delta.y as i32;
            }
            ResizeEdge::TopRight => {
                let dy = delta.y as i32;
                new_size.h -= dy;
                new_loc.y += dy;
                new_size.w += delta.x as i32;
            }
            ResizeEdge::TopLeft => {
                let dy = delta.y as i32;
                new_size.h -= dy;
                new_loc.y += dy;
                let dx = delta.x as i32;
                new_size.w -= dx;
                new_loc.x += dx;
            }
            ResizeEdge::BottomLeft => {
                new_size.h += delta.y as i32;
                let dx = delta.x as i32;
                new_size.w -= dx;
                new_loc.x += dx;
            }
            ResizeEdge::BottomRight => {
                new_size.h += delta.y as i32;
                new_size.w += delta.x as i32;
            }
            _ => {}
        }

        // Minimum window size, per the workspace insertion invariant.
        new_size.w = new_size.w.max(crate::utils::workspaces::MIN_WINDOW_SIZE.0);
        new_size.h = new_size.h.max(crate::utils::workspaces::MIN_WINDOW_SIZE.1);
        let ws = data.workspaces.get_current_mut();

        match self.edges {
            ResizeEdge::Left | ResizeEdge::Top | ResizeEdge::TopLeft | ResizeEdge::BottomLeft => {
                ws.space.map_element(self.window.clone(), new_loc, false);
            }
            _ => {}
        }

        // Send configure to client
        self.window.toplevel().unwrap().with_pending_state(|state| {
            state.states.set(xdg_toplevel::State::Resizing);
            state.size = Some(new_size);
        });

        self.window.toplevel().unwrap().send_configure();

        self.last_window_size = new_size;
    }

    fn relative_motion(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        focus: Option<(WlSurface, Point<f64, Logical>)>,
        event: &RelativeMotionEvent,
    ) {
        handle.relative_motion(data, focus, event);
    }

    fn button(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &ButtonEvent,
    ) {
        handle.button(data, event);
        if handle.current_pressed().is_empty() {
            // No more buttons are pressed, release the grab.
            handle.unset_grab(self, data, event.serial, event.time, true);
            if !self.window.alive() {
                return;
            }
        }
    }

    fn axis(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        details: AxisFrame,
    ) {
        handle.axis(data, details)
    }

    fn frame(&mut self, data: &mut State, handle: &mut PointerInnerHandle<'_, State>) {
        handle.frame(data);
    }

    fn gesture_swipe_begin(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureSwipeBeginEvent,
    ) {
        handle.gesture_swipe_begin(data, event)
    }

    fn gesture_swipe_update(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureSwipeUpdateEvent,
    ) {
        handle.gesture_swipe_update(data, event)
    }

    fn gesture_swipe_end(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureSwipeEndEvent,
    ) {
        handle.gesture_swipe_end(data, event)
    }

    fn gesture_pinch_begin(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GesturePinchBeginEvent,
    ) {
        handle.gesture_pinch_begin(data, event)
    }

    fn gesture_pinch_update(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GesturePinchUpdateEvent,
    ) {
        handle.gesture_pinch_update(data, event)
    }

    fn gesture_pinch_end(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GesturePinchEndEvent,
    ) {
        handle.gesture_pinch_end(data, event)
    }

    fn gesture_hold_begin(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureHoldBeginEvent,
    ) {
        handle.gesture_hold_begin(data, event)
    }

    fn gesture_hold_end(
        &mut self,
        data: &mut State,
        handle: &mut PointerInnerHandle<'_, State>,
        event: &GestureHoldEndEvent,
    ) {
        handle.gesture_hold_end(data, event)
    }

    fn start_data(&self) -> &GrabStartData<State> {
        &self.start_data
    }

    fn unset(&mut self, _data: &mut State) {}
}
