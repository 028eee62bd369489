use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::controller::{InputEvent, PointerButton, PointerInput, TouchPhase};

/// Pixels per wheel "line" when the platform reports line deltas
const LINE_HEIGHT_PX: f32 = 100.0;

/// Adapter that bridges Winit events to planner input
#[derive(Debug, Clone, Default)]
pub struct WinitInputAdapter {
    cursor: Vec2,
    pressed: HashSet<PointerButton>,
    touches: HashSet<u64>,
}

impl WinitInputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one window event; unrelated events map to `None`
    pub fn process_event(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(InputEvent::Pointer(PointerInput::Move { position: self.cursor }))
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = Self::mouse_button(*button)?;
                let position = self.cursor;
                match state {
                    ElementState::Pressed => {
                        self.pressed.insert(button);
                        Some(InputEvent::Pointer(PointerInput::Down { position, button }))
                    }
                    ElementState::Released => {
                        self.pressed.remove(&button);
                        Some(InputEvent::Pointer(PointerInput::Up { position, button }))
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Pointer(PointerInput::Wheel {
                position: self.cursor,
                delta_y: Self::wheel_delta_y(*delta),
            })),
            WindowEvent::Touch(touch) => {
                let phase = Self::touch_phase(touch.phase);
                match phase {
                    TouchPhase::Start => {
                        self.touches.insert(touch.id);
                    }
                    TouchPhase::End | TouchPhase::Cancel => {
                        self.touches.remove(&touch.id);
                    }
                    TouchPhase::Move => {}
                }
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                Some(InputEvent::Pointer(PointerInput::Touch {
                    phase,
                    position,
                    touch_count: self.touches.len(),
                }))
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return None;
                }
                match event.physical_key {
                    PhysicalKey::Code(code) => Self::key_command(code),
                    PhysicalKey::Unidentified(_) => None,
                }
            }
            WindowEvent::Resized(size) => Some(InputEvent::Resized {
                width: size.width,
                height: size.height,
            }),
            _ => None,
        }
    }

    pub fn is_down(&self, button: PointerButton) -> bool {
        self.pressed.contains(&button)
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    fn mouse_button(button: MouseButton) -> Option<PointerButton> {
        match button {
            MouseButton::Left => Some(PointerButton::Primary),
            MouseButton::Middle => Some(PointerButton::Middle),
            MouseButton::Right => Some(PointerButton::Secondary),
            _ => None,
        }
    }

    /// Winit reports "scroll up" as positive; planner input uses page-down positive
    fn wheel_delta_y(delta: MouseScrollDelta) -> f32 {
        match delta {
            MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT_PX,
            MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
        }
    }

    fn touch_phase(phase: winit::event::TouchPhase) -> TouchPhase {
        match phase {
            winit::event::TouchPhase::Started => TouchPhase::Start,
            winit::event::TouchPhase::Moved => TouchPhase::Move,
            winit::event::TouchPhase::Ended => TouchPhase::End,
            winit::event::TouchPhase::Cancelled => TouchPhase::Cancel,
        }
    }

    fn key_command(code: KeyCode) -> Option<InputEvent> {
        match code {
            KeyCode::Delete | KeyCode::Backspace => Some(InputEvent::DeleteSelection),
            KeyCode::KeyC => Some(InputEvent::ToggleCameraView),
            _ => None,
        }
    }
}
