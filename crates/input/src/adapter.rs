use crate::event::{DragEvent, InputEvent, Key, PinchEvent, WheelEvent};
use crate::hub::{EventHub, Subscription};
use glam::Vec2;
use solidview_common::{ButtonState, SurfaceId};
use solidview_kernel::{InputState, ViewerAction};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::Sender;

/// Maps normalized input events to viewer store actions.
///
/// Keeps a mirror of the pointer and modifier state it has dispatched, so the
/// decision for each drag sample uses the state including that sample.
#[derive(Debug, Clone)]
pub struct GestureAdapter {
    target: Option<SurfaceId>,
    modifier_key: Key,
    inputs: InputState,
}

impl GestureAdapter {
    pub fn new(modifier_key: Key) -> Self {
        Self {
            target: None,
            modifier_key,
            inputs: InputState::default(),
        }
    }

    /// Scope pointer events to `target`. Until a target is set, only key
    /// events are handled.
    pub fn with_target(mut self, target: SurfaceId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn set_target(&mut self, target: Option<SurfaceId>) {
        self.target = target;
    }

    pub fn target(&self) -> Option<SurfaceId> {
        self.target
    }

    pub fn inputs(&self) -> InputState {
        self.inputs
    }

    /// Actions produced by one event, in dispatch order.
    pub fn handle(&mut self, event: &InputEvent) -> Vec<ViewerAction> {
        if let Some(target) = event.target() {
            if self.target != Some(target) {
                return Vec::new();
            }
        }
        match event {
            InputEvent::Drag(drag) => self.on_drag(drag),
            InputEvent::Pinch(pinch) => on_pinch(pinch),
            InputEvent::Wheel(wheel) => on_wheel(wheel),
            InputEvent::KeyDown(key) => self.on_key(*key, ButtonState::Down),
            InputEvent::KeyUp(key) => self.on_key(*key, ButtonState::Up),
        }
    }

    fn on_drag(&mut self, drag: &DragEvent) -> Vec<ViewerAction> {
        let mut actions = Vec::with_capacity(2);
        let pointer = ButtonState::from_pressed(drag.down);
        if pointer != self.inputs.pointer {
            self.inputs.pointer = pointer;
            actions.push(ViewerAction::SetInputs(self.inputs));
        }
        if !pointer.is_down() {
            return actions;
        }

        let modifier = self.inputs.modifier.is_down();
        if modifier || drag.touches == 3 {
            actions.push(ViewerAction::SetPanDelta(Vec2::new(
                -drag.delta.x,
                drag.delta.y,
            )));
        } else if drag.touches == 1 {
            actions.push(ViewerAction::SetRotateDelta(Vec2::new(
                drag.delta.x,
                -drag.delta.y,
            )));
        }
        actions
    }

    fn on_key(&mut self, key: Key, state: ButtonState) -> Vec<ViewerAction> {
        if key != self.modifier_key || self.inputs.modifier == state {
            return Vec::new();
        }
        tracing::debug!(?key, ?state, "modifier changed");
        self.inputs.modifier = state;
        vec![ViewerAction::SetInputs(self.inputs)]
    }

    /// Subscribe to `hub` and forward every produced action to `dispatch`.
    ///
    /// Pointer events and key events get separate listeners; both are released
    /// when the returned binding drops.
    pub fn bind(self, hub: &EventHub, dispatch: Sender<ViewerAction>) -> GestureBinding {
        let adapter = Rc::new(RefCell::new(self));

        let pointer_listener = {
            let adapter = adapter.clone();
            let dispatch = dispatch.clone();
            hub.subscribe(move |event| {
                if !event.is_key() {
                    forward(adapter.borrow_mut().handle(event), &dispatch);
                }
            })
        };
        let key_listener = {
            let adapter = adapter.clone();
            hub.subscribe(move |event| {
                if event.is_key() {
                    forward(adapter.borrow_mut().handle(event), &dispatch);
                }
            })
        };

        GestureBinding {
            adapter,
            _subscriptions: vec![pointer_listener, key_listener],
        }
    }
}

fn on_pinch(pinch: &PinchEvent) -> Vec<ViewerAction> {
    if pinch.touches != 2 {
        return Vec::new();
    }
    vec![ViewerAction::SetZoomDelta(-pinch.delta.x)]
}

fn on_wheel(wheel: &WheelEvent) -> Vec<ViewerAction> {
    vec![ViewerAction::SetZoomDelta(wheel.delta.y)]
}

fn forward(actions: Vec<ViewerAction>, dispatch: &Sender<ViewerAction>) {
    for action in actions {
        if dispatch.send(action).is_err() {
            tracing::trace!("viewer gone, dropping input");
            return;
        }
    }
}

/// Live gesture subscriptions of one viewer. Dropping it detaches them all.
pub struct GestureBinding {
    adapter: Rc<RefCell<GestureAdapter>>,
    _subscriptions: Vec<Subscription>,
}

impl GestureBinding {
    pub fn set_target(&self, target: Option<SurfaceId>) {
        self.adapter.borrow_mut().set_target(target);
    }

    pub fn inputs(&self) -> InputState {
        self.adapter.borrow().inputs()
    }
}
