//! Shared audio types
//!
//! Plain data passed between the engine thread, its callers, and the UI.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport state reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "Stopped"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
        }
    }
}

/// Stream details for the currently routed track
#[derive(Debug, Clone)]
pub struct TrackInfo {
    pub codec_name: String,
    pub channels: u16,
    pub sample_rate: u32,
    pub duration: Option<Duration>,
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = match self.channels {
            1 => "Mono",
            _ => "Stereo",
        };
        write!(f, "{}", self.codec_name)?;
        write!(f, " · {} Hz", self.sample_rate)?;
        write!(f, " · {}", channels)?;
        if let Some(duration) = self.duration {
            let secs = duration.as_secs();
            write!(f, " · {}:{:02}", secs / 60, secs % 60)?;
        }
        Ok(())
    }
}

/// Readers the engine accepts: seekable and movable across threads
pub trait ReadSeek: std::io::Read + std::io::Seek + Send + Sync {}
impl<T: std::io::Read + std::io::Seek + Send + Sync> ReadSeek for T {}

/// Requests handled on the engine thread
pub enum AudioCommand {
    /// Route a new track from the given reader, replacing the current one
    Play {
        reader: Box<dyn ReadSeek>,
        format_hint: Option<String>,
    },
    /// Pause playback
    Pause,
    /// Resume playback
    Resume,
    /// Change the playback volume (0.0..=2.0)
    SetVolume(f32),
    /// Jump to a position in the current track
    Seek(Duration),
    /// Exit the engine loop
    Shutdown,
}

impl fmt::Debug for AudioCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCommand::Play { format_hint, .. } => f
                .debug_struct("Play")
                .field("format_hint", format_hint)
                .finish(),
            AudioCommand::Pause => write!(f, "Pause"),
            AudioCommand::Resume => write!(f, "Resume"),
            AudioCommand::SetVolume(v) => write!(f, "SetVolume({})", v),
            AudioCommand::Seek(pos) => write!(f, "Seek({:?})", pos),
            AudioCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Notifications flowing back from the engine thread
#[derive(Debug, Clone)]
pub enum AudioEvent {
    /// A new route went live with the given stream details
    Playing(TrackInfo),
    /// Playback paused
    Paused,
    /// Playback resumed
    Resumed,
    /// The current track ran out of samples
    Finished,
    /// An error occurred
    Error(String),
}

/// Playback position and state, polled by the UI
#[derive(Debug, Clone, Default)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub position: Duration,
    pub duration: Option<Duration>,
}

/// Shared handle to the engine's playback status
pub type SharedStatus = Arc<Mutex<PlayerStatus>>;

/// Create a new shared status handle
pub fn new_shared_status() -> SharedStatus {
    Arc::new(Mutex::new(PlayerStatus::default()))
}
