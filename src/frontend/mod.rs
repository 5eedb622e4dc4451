//! What the session needs from a screen and keyboard.
//!
//! The session never draws anything itself. Each frame it composes a
//! [`Scene`] (which sprites go where, in relative screen coordinates) and
//! hands it to a [`Frontend`], which also reports input events.

mod sprite;
mod terminal;

pub use sprite::{centered_origin, ResourceError, SpriteArt, SpriteColor, SpriteSheet};
pub use terminal::{ScreenGuard, TerminalFrontend};

use crate::choreography::Position;
use crate::session::SessionState;

/// Input events the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown,
    KeyUp,
    /// The drawing surface changed size.
    Resize { width: u16, height: u16 },
    /// Window closed, Ctrl+C or a termination signal.
    Quit,
}

/// The things that can be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sprite {
    /// "Follow the green dot with your eyes."
    Instruction,
    /// "Press any key to start."
    Start,
    /// "Press any key to quit."
    QuitPrompt,
    /// Shown when the capture stopped early.
    Interrupted,
    /// Mr. Point.
    Target,
}

/// A sprite centered on a relative screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub sprite: Sprite,
    pub at: Position,
}

impl Placement {
    pub const fn new(sprite: Sprite, x: f64, y: f64) -> Self {
        Self {
            sprite,
            at: Position::new(x, y),
        }
    }
}

/// Everything drawn in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub state: SessionState,
    pub placements: Vec<Placement>,
}

impl Scene {
    /// Lay out the frame for a session in `state`.
    pub fn compose(state: SessionState, target: Position, capture_failed: bool) -> Self {
        let placements = match state {
            SessionState::Idle => vec![
                Placement::new(Sprite::Instruction, 0.5, 0.33),
                Placement::new(Sprite::Start, 0.5, 0.66),
                Placement {
                    sprite: Sprite::Target,
                    at: target,
                },
            ],
            SessionState::Recording => vec![Placement {
                sprite: Sprite::Target,
                at: target,
            }],
            SessionState::Done if capture_failed => vec![
                Placement::new(Sprite::QuitPrompt, 0.5, 0.5),
                Placement::new(Sprite::Interrupted, 0.5, 0.66),
            ],
            SessionState::Done => vec![Placement::new(Sprite::QuitPrompt, 0.5, 0.5)],
            SessionState::Quit => Vec::new(),
        };
        Self { state, placements }
    }
}

/// UI layer errors once the main loop runs.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no resource loaded for {0:?}")]
    MissingSprite(Sprite),
}

/// A screen plus the input that goes with it.
pub trait Frontend {
    /// Next pending input event, without blocking.
    fn poll_event(&mut self) -> Result<Option<InputEvent>, FrontendError>;

    /// Draw a frame and present it, pacing the caller to the frame rate.
    fn render(&mut self, scene: &Scene) -> Result<(), FrontendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choreography::RESTING_POSITION;

    fn sprites(scene: &Scene) -> Vec<Sprite> {
        scene.placements.iter().map(|p| p.sprite).collect()
    }

    #[test]
    fn test_idle_scene() {
        let scene = Scene::compose(SessionState::Idle, RESTING_POSITION, false);
        assert_eq!(
            sprites(&scene),
            vec![Sprite::Instruction, Sprite::Start, Sprite::Target]
        );
        assert_eq!(scene.placements[0].at, Position::new(0.5, 0.33));
        assert_eq!(scene.placements[1].at, Position::new(0.5, 0.66));
        assert_eq!(scene.placements[2].at, RESTING_POSITION);
    }

    #[test]
    fn test_recording_scene_is_target_only() {
        let at = Position::new(0.7, 0.01);
        let scene = Scene::compose(SessionState::Recording, at, false);
        assert_eq!(scene.placements, vec![Placement { sprite: Sprite::Target, at }]);
    }

    #[test]
    fn test_done_scene() {
        let scene = Scene::compose(SessionState::Done, RESTING_POSITION, false);
        assert_eq!(sprites(&scene), vec![Sprite::QuitPrompt]);
        assert_eq!(scene.placements[0].at, Position::new(0.5, 0.5));

        let scene = Scene::compose(SessionState::Done, RESTING_POSITION, true);
        assert_eq!(sprites(&scene), vec![Sprite::QuitPrompt, Sprite::Interrupted]);
    }

    #[test]
    fn test_quit_scene_is_empty() {
        assert!(Scene::compose(SessionState::Quit, RESTING_POSITION, false)
            .placements
            .is_empty());
    }
}
