use glam::Vec2;

/// Pointer button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Touch lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Unified pointer input in screen pixels (origin top-left).
/// Mouse and touch both feed the same interaction state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down { position: Vec2, button: PointerButton },
    Move { position: Vec2 },
    Up { position: Vec2, button: PointerButton },
    /// Positive `delta_y` scrolls toward the user (page down)
    Wheel { position: Vec2, delta_y: f32 },
    /// `touch_count` is the number of fingers on the surface after this event
    Touch { phase: TouchPhase, position: Vec2, touch_count: usize },
}

impl PointerInput {
    /// Collapses single-finger touch into mouse-equivalent input.
    /// Multi-finger gestures return `None`; they belong to the camera.
    pub fn unify(self) -> Option<PointerInput> {
        match self {
            PointerInput::Touch { phase, position, touch_count } => match phase {
                TouchPhase::Start if touch_count == 1 => Some(PointerInput::Down {
                    position,
                    button: PointerButton::Primary,
                }),
                TouchPhase::Move if touch_count == 1 => Some(PointerInput::Move { position }),
                TouchPhase::End | TouchPhase::Cancel => Some(PointerInput::Up {
                    position,
                    button: PointerButton::Primary,
                }),
                _ => None,
            },
            other => Some(other),
        }
    }

    pub fn position(&self) -> Vec2 {
        match *self {
            PointerInput::Down { position, .. }
            | PointerInput::Move { position }
            | PointerInput::Up { position, .. }
            | PointerInput::Wheel { position, .. }
            | PointerInput::Touch { position, .. } => position,
        }
    }
}

/// Everything a host can feed the planner from its event loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pointer(PointerInput),
    DeleteSelection,
    ToggleCameraView,
    Resized { width: u32, height: u32 },
}
