//! Keyboard and mouse input model and the static key binding tables.
//!
//! Key bindings are declared as `(KeyCode, Action)` tables and resolved
//! with a linear lookup. Two tables exist: [`STAGE_KEYMAP`] for actions a
//! selected stage consumes (parameter cursor and tuning) and
//! [`HOST_KEYMAP`] for the host loop's defaults, consulted only when the
//! pipeline reports a key as unconsumed.

use std::fmt;

/// A raw keycode as delivered by the windowing layer.
///
/// Printable keys use their ASCII value. Arrow keys use the X11 keysym
/// values that extended key polling reports on Linux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub i32);

impl KeyCode {
    /// Left arrow.
    pub const LEFT: Self = Self(0xFF51);
    /// Up arrow.
    pub const UP: Self = Self(0xFF52);
    /// Right arrow.
    pub const RIGHT: Self = Self(0xFF53);
    /// Down arrow.
    pub const DOWN: Self = Self(0xFF54);
    /// Escape.
    pub const ESCAPE: Self = Self(27);
    /// Space bar.
    pub const SPACE: Self = Self(32);
    /// Tab.
    pub const TAB: Self = Self(9);

    /// Keycode of a printable ASCII character.
    ///
    /// Non-ASCII characters map to their Unicode scalar value.
    #[must_use]
    pub fn from_char(c: char) -> Self {
        Self(i32::try_from(u32::from(c)).unwrap_or(i32::MAX))
    }

    /// The printable character for this code, if it is printable ASCII.
    #[must_use]
    pub fn as_char(self) -> Option<char> {
        u8::try_from(self.0)
            .ok()
            .filter(u8::is_ascii_graphic)
            .map(char::from)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            Some(c) => write!(f, "{} ('{c}')", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// What happened to the mouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    /// Pointer moved.
    Move,
    /// Left button pressed.
    LeftDown,
    /// Left button released.
    LeftUp,
    /// Middle button pressed.
    MiddleDown,
    /// Middle button released.
    MiddleUp,
    /// Right button pressed.
    RightDown,
    /// Right button released.
    RightUp,
}

/// Buttons and modifiers held during a mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseFlags(u8);

impl MouseFlags {
    /// No buttons or modifiers.
    pub const NONE: Self = Self(0);
    /// Left button held.
    pub const LEFT: Self = Self(1);
    /// Right button held.
    pub const RIGHT: Self = Self(1 << 1);
    /// Middle button held.
    pub const MIDDLE: Self = Self(1 << 2);
    /// Control held.
    pub const CTRL: Self = Self(1 << 3);
    /// Shift held.
    pub const SHIFT: Self = Self(1 << 4);

    /// Returns `true` if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A single mouse event in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// What happened.
    pub kind: MouseKind,
    /// Horizontal position; may be negative when dragging outside.
    pub x: i32,
    /// Vertical position; may be negative when dragging outside.
    pub y: i32,
    /// Buttons and modifiers held.
    pub flags: MouseFlags,
}

impl MouseEvent {
    /// Create a mouse event.
    #[must_use]
    pub const fn new(kind: MouseKind, x: i32, y: i32, flags: MouseFlags) -> Self {
        Self { kind, x, y, flags }
    }
}

/// One raw input event from the host's input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press.
    Key(KeyCode),
    /// A mouse event.
    Mouse(MouseEvent),
}

/// Actions the selected stage performs on its parameter cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    /// Move the cursor to the previous parameter.
    CursorPrev,
    /// Move the cursor to the next parameter.
    CursorNext,
    /// Step the parameter under the cursor down.
    Decrease,
    /// Step the parameter under the cursor up.
    Increase,
}

/// Default host-loop actions for keys the pipeline did not consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    /// Select the next stage (wrapping through the output selection).
    NextStage,
    /// Select the previous stage (wrapping through the output selection).
    PrevStage,
    /// Select the pipeline output.
    SelectLast,
    /// Select a stage by position.
    SelectStage(usize),
    /// Pause or resume playback.
    TogglePause,
    /// Advance one frame.
    StepForward,
    /// Go back one frame.
    StepBack,
    /// Save the current preview.
    Snapshot,
    /// Show or hide the help overlay.
    ToggleHelp,
    /// Stop the host loop.
    Quit,
}

/// Keys consumed by the selected stage.
pub const STAGE_KEYMAP: &[(KeyCode, StageAction)] = &[
    (KeyCode::UP, StageAction::CursorPrev),
    (KeyCode(b'w' as i32), StageAction::CursorPrev),
    (KeyCode::DOWN, StageAction::CursorNext),
    (KeyCode(b's' as i32), StageAction::CursorNext),
    (KeyCode::LEFT, StageAction::Decrease),
    (KeyCode(b'a' as i32), StageAction::Decrease),
    (KeyCode::RIGHT, StageAction::Increase),
    (KeyCode(b'd' as i32), StageAction::Increase),
];

/// Host defaults for keys the pipeline leaves unconsumed.
pub const HOST_KEYMAP: &[(KeyCode, HostAction)] = &[
    (KeyCode::TAB, HostAction::NextStage),
    (KeyCode(b'n' as i32), HostAction::NextStage),
    (KeyCode(b'p' as i32), HostAction::PrevStage),
    (KeyCode(b'l' as i32), HostAction::SelectLast),
    (KeyCode(b'0' as i32), HostAction::SelectStage(0)),
    (KeyCode(b'1' as i32), HostAction::SelectStage(1)),
    (KeyCode(b'2' as i32), HostAction::SelectStage(2)),
    (KeyCode(b'3' as i32), HostAction::SelectStage(3)),
    (KeyCode(b'4' as i32), HostAction::SelectStage(4)),
    (KeyCode(b'5' as i32), HostAction::SelectStage(5)),
    (KeyCode(b'6' as i32), HostAction::SelectStage(6)),
    (KeyCode(b'7' as i32), HostAction::SelectStage(7)),
    (KeyCode(b'8' as i32), HostAction::SelectStage(8)),
    (KeyCode(b'9' as i32), HostAction::SelectStage(9)),
    (KeyCode::SPACE, HostAction::TogglePause),
    (KeyCode(b'.' as i32), HostAction::StepForward),
    (KeyCode(b',' as i32), HostAction::StepBack),
    (KeyCode(b'c' as i32), HostAction::Snapshot),
    (KeyCode(b'h' as i32), HostAction::ToggleHelp),
    (KeyCode(b'q' as i32), HostAction::Quit),
    (KeyCode::ESCAPE, HostAction::Quit),
];

/// Look up the stage action bound to a key.
#[must_use]
pub fn stage_action(code: KeyCode) -> Option<StageAction> {
    lookup(STAGE_KEYMAP, code)
}

/// Look up the host action bound to a key.
#[must_use]
pub fn host_action(code: KeyCode) -> Option<HostAction> {
    lookup(HOST_KEYMAP, code)
}

fn lookup<A: Copy>(table: &[(KeyCode, A)], code: KeyCode) -> Option<A> {
    table
        .iter()
        .find_map(|&(key, action)| (key == code).then_some(action))
}
