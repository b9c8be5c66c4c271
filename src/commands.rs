use tracing::debug;

use crate::playback::PlaybackState;
use crate::queue::PhotoQueue;

/// A decoded remote-control command. The transport is assumed to have already
/// debounced key repeats; each token maps to exactly one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Play,
    Pause,
    PlayPauseToggle,
    Prev,
    Next,
    Stop,
}

impl Token {
    /// Map a LIRC key name to a token. Unknown names are ignored.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "KEY_PLAY" => Some(Self::Play),
            "KEY_PAUSE" => Some(Self::Pause),
            "KEY_PLAYPAUSE" => Some(Self::PlayPauseToggle),
            "KEY_LEFT" | "KEY_REWIND" => Some(Self::Prev),
            "KEY_RIGHT" | "KEY_FORWARD" => Some(Self::Next),
            "KEY_STOP" | "KEY_EXIT" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Remote-input collaborator. Non-blocking; returns the most recent pending
/// token, if any.
pub trait RemoteSource: Send {
    fn poll(&mut self) -> Option<Token>;
}

/// Result of dispatching one token.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Transient on-screen label to show, if any.
    pub label: Option<&'static str>,
    /// The loop should terminate.
    pub stop: bool,
}

/// Apply one token to the playback state and queue.
///
/// `Prev` takes two backward steps: the cursor leads the displayed slide by
/// one (slides advance after loading), so one step back would merely replay
/// the slide already on screen. Both steps clamp at the first photo.
pub fn dispatch(token: Token, playback: &mut PlaybackState, queue: &mut PhotoQueue) -> Dispatch {
    debug!(?token, "dispatching remote command");
    match token {
        Token::Play => {
            playback.paused = false;
            Dispatch {
                label: Some("PLAY"),
                stop: false,
            }
        }
        Token::Pause => {
            playback.paused = true;
            Dispatch {
                label: Some("PAUSE"),
                stop: false,
            }
        }
        Token::PlayPauseToggle => {
            playback.paused = !playback.paused;
            Dispatch {
                label: Some(if playback.paused { "PAUSE" } else { "PLAY" }),
                stop: false,
            }
        }
        Token::Prev => {
            queue.advance_backward();
            queue.advance_backward();
            playback.force_change();
            Dispatch {
                label: Some("PREVIOUS"),
                stop: false,
            }
        }
        Token::Next => {
            // The cursor already points at the next undisplayed photo, so
            // skipping ahead only needs the delay timer bypassed.
            playback.force_change();
            Dispatch {
                label: Some("NEXT"),
                stop: false,
            }
        }
        Token::Stop => Dispatch {
            label: None,
            stop: true,
        },
    }
}
