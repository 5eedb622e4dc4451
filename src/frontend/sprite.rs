//! Renderable resources: text lines and the target's text-art image.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::choreography::Position;

use super::Sprite;

/// Colors a sprite can be drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteColor {
    White,
    Green,
}

/// Errors creating renderable resources.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("text is empty")]
    EmptyText,

    #[error("text {0:?} contains control characters")]
    ControlCharacter(String),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image '{}' has nothing to draw", .0.display())]
    EmptyImage(PathBuf),
}

/// A block of characters drawn as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteArt {
    lines: Vec<String>,
    width: u16,
    color: SpriteColor,
}

impl SpriteArt {
    /// Render a single line of text.
    pub fn text(text: &str, color: SpriteColor) -> Result<Self, ResourceError> {
        if text.trim().is_empty() {
            return Err(ResourceError::EmptyText);
        }
        if text.chars().any(char::is_control) {
            return Err(ResourceError::ControlCharacter(text.to_string()));
        }
        Ok(Self::from_lines(vec![text.to_string()], color))
    }

    /// Load a text-art image from a file.
    ///
    /// Leading and trailing blank lines are dropped; tabs are not allowed.
    pub fn load(path: &Path, color: SpriteColor) -> Result<Self, ResourceError> {
        let content = std::fs::read_to_string(path).map_err(|e| ResourceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, color).map_err(|e| match e {
            ResourceError::EmptyText => ResourceError::EmptyImage(path.to_path_buf()),
            other => other,
        })
    }

    fn parse(content: &str, color: SpriteColor) -> Result<Self, ResourceError> {
        let lines: Vec<&str> = content.lines().map(str::trim_end).collect();
        let first = lines.iter().position(|l| !l.is_empty());
        let last = lines.iter().rposition(|l| !l.is_empty());
        let (Some(first), Some(last)) = (first, last) else {
            return Err(ResourceError::EmptyText);
        };

        let lines: Vec<String> = lines[first..=last].iter().map(|l| l.to_string()).collect();
        if let Some(bad) = lines.iter().find(|l| l.chars().any(char::is_control)) {
            return Err(ResourceError::ControlCharacter(bad.clone()));
        }
        Ok(Self::from_lines(lines, color))
    }

    fn from_lines(lines: Vec<String>, color: SpriteColor) -> Self {
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        Self {
            lines,
            width: u16::try_from(width).unwrap_or(u16::MAX),
            color,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn color(&self) -> SpriteColor {
        self.color
    }

    /// Width and height in cells.
    pub fn size(&self) -> (u16, u16) {
        let height = u16::try_from(self.lines.len()).unwrap_or(u16::MAX);
        (self.width, height)
    }
}

/// The resources a frontend draws scenes with.
#[derive(Debug, Clone, Default)]
pub struct SpriteSheet {
    sprites: HashMap<Sprite, SpriteArt>,
}

impl SpriteSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sprite: Sprite, art: SpriteArt) {
        self.sprites.insert(sprite, art);
    }

    pub fn get(&self, sprite: Sprite) -> Option<&SpriteArt> {
        self.sprites.get(&sprite)
    }
}

/// Top-left cell of a `size` sprite centered on `at` within a `surface`.
///
/// May be negative or past the surface edge; drawing clips.
pub fn centered_origin(at: Position, size: (u16, u16), surface: (u16, u16)) -> (i32, i32) {
    let x = at.x * f64::from(surface.0) - f64::from(size.0) * 0.5;
    let y = at.y * f64::from(surface.1) - f64::from(size.1) * 0.5;
    (x.floor() as i32, y.floor() as i32)
}
