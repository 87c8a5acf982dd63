//! Key handling and the detection loop's state machine.

use std::time::Duration;

/// Poll interval between frames of a streaming source.
pub const STREAM_KEY_WAIT: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Quit,
    Pause,
    Snapshot,
}

impl KeyCommand {
    /// Maps a raw key code (as returned by `highgui::wait_key`) to a command.
    pub fn from_key(code: i32) -> Option<Self> {
        if code < 0 {
            return None;
        }
        let ch = char::from_u32((code & 0xFF) as u32)?.to_ascii_lowercase();
        match ch {
            'q' => Some(KeyCommand::Quit),
            's' => Some(KeyCommand::Pause),
            'p' => Some(KeyCommand::Snapshot),
            _ => None,
        }
    }
}

/// How long the viewer blocks for a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWait {
    Forever,
    Timeout(Duration),
}

impl KeyWait {
    pub fn for_source(streaming: bool) -> Self {
        if streaming {
            KeyWait::Timeout(STREAM_KEY_WAIT)
        } else {
            KeyWait::Forever
        }
    }

    /// Delay argument for `highgui::wait_key`; zero blocks indefinitely.
    pub fn as_millis(self) -> i32 {
        match self {
            KeyWait::Forever => 0,
            KeyWait::Timeout(d) => (d.as_millis() as i32).max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
    Draining,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    Key(KeyCommand),
    /// Any key press while paused that is not a quit.
    Resumed,
    EndOfStream,
    DeviceLost,
    /// Capture, writer and window have been let go.
    Released,
}

impl LoopState {
    pub fn on(self, event: LoopEvent) -> LoopState {
        use LoopEvent::*;
        use LoopState::*;

        match (self, event) {
            (Running, Key(KeyCommand::Quit)) => Draining,
            (Running, Key(KeyCommand::Pause)) => Paused,
            (Running, Key(KeyCommand::Snapshot)) => Running,
            (Running, EndOfStream | DeviceLost) => Draining,

            (Paused, Key(KeyCommand::Quit)) => Draining,
            (Paused, Resumed) => Running,
            (Paused, EndOfStream | DeviceLost) => Draining,

            (Draining, Released) => Stopped,

            (state, _) => state,
        }
    }

    /// Only a running loop fetches another frame; pausing is handled inside the
    /// iteration that saw the key.
    pub fn accepts_frames(self) -> bool {
        self == LoopState::Running
    }
}
