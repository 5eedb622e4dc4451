//! Full-screen terminal frontend.
//!
//! Draws scenes on the alternate screen with crossterm and turns keyboard
//! events into session input. Terminal state is restored on drop and on
//! panic.

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, BeginSynchronizedUpdate,
    Clear, ClearType, EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use std::io::{self, Stdout, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::signal;

use super::sprite::{centered_origin, SpriteArt, SpriteColor, SpriteSheet};
use super::{Frontend, FrontendError, InputEvent, Scene};

/// Static flag to track if the terminal is in raw mode (for panic handler)
static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Whether keyboard enhancement flags were pushed (for panic handler)
static KEYBOARD_ENHANCED: AtomicBool = AtomicBool::new(false);

/// Guard that ensures the terminal is restored to normal mode on drop.
///
/// Raw mode and the alternate screen are entered in two steps so a failure
/// in either can be told apart.
pub struct ScreenGuard {
    raw: bool,
    screen: bool,
    keyboard_enhanced: bool,
}

impl ScreenGuard {
    /// Enter raw mode and return a guard that will restore it on drop.
    pub fn enter_raw_mode() -> io::Result<Self> {
        install_panic_hook();

        enable_raw_mode()?;
        TERMINAL_ACTIVE.store(true, Ordering::SeqCst);

        Ok(Self {
            raw: true,
            screen: false,
            keyboard_enhanced: false,
        })
    }

    /// Switch to the alternate screen, hide the cursor and ask for key
    /// release events where the terminal supports them.
    fn enter_screen(&mut self, out: &mut Stdout) -> io::Result<()> {
        execute!(out, EnterAlternateScreen, Hide)?;
        self.screen = true;

        if supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
            KEYBOARD_ENHANCED.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Restore the terminal now instead of on drop.
    ///
    /// Every restore step runs even if an earlier one fails; the first error
    /// is returned.
    pub fn exit(&mut self) -> io::Result<()> {
        let mut out = io::stdout();
        let mut result = Ok(());
        if self.keyboard_enhanced {
            self.keyboard_enhanced = false;
            KEYBOARD_ENHANCED.store(false, Ordering::SeqCst);
            keep_first_error(&mut result, execute!(out, PopKeyboardEnhancementFlags));
        }
        if self.screen {
            self.screen = false;
            keep_first_error(&mut result, execute!(out, Show, LeaveAlternateScreen));
        }
        if self.raw {
            self.raw = false;
            TERMINAL_ACTIVE.store(false, Ordering::SeqCst);
            keep_first_error(&mut result, disable_raw_mode());
        }
        result
    }
}

fn keep_first_error(result: &mut io::Result<()>, step: io::Result<()>) {
    if result.is_ok() {
        *result = step;
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        // Best-effort cleanup - ignore errors during drop
        let _ = self.exit();
    }
}

/// Install a panic hook that restores terminal state before panicking.
fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if TERMINAL_ACTIVE.load(Ordering::SeqCst) {
            if KEYBOARD_ENHANCED.swap(false, Ordering::SeqCst) {
                let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
            }
            let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
            TERMINAL_ACTIVE.store(false, Ordering::SeqCst);
        }

        original_hook(panic_info);
    }));
}

/// The visible part of one sprite line drawn with its first character at
/// column `x` on row `y`: start column, row and text.
fn clip_line(line: &str, x: i32, y: i32, surface: (u16, u16)) -> Option<(u16, u16, String)> {
    let (width, height) = (i32::from(surface.0), i32::from(surface.1));
    if y < 0 || y >= height || x >= width {
        return None;
    }

    let skip = usize::try_from(-x).unwrap_or(0);
    let start = x.max(0);
    let room = usize::try_from(width - start).unwrap_or(0);
    let visible: String = line.chars().skip(skip).take(room).collect();
    if visible.is_empty() {
        return None;
    }
    Some((start as u16, y as u16, visible))
}

fn terminal_color(color: SpriteColor) -> Color {
    match color {
        SpriteColor::White => Color::White,
        SpriteColor::Green => Color::Green,
    }
}

/// Whether key releases arrive as events: always on Windows consoles,
/// elsewhere only with keyboard enhancement.
fn reports_release(keyboard_enhanced: bool) -> bool {
    keyboard_enhanced || cfg!(windows)
}

/// Map a key event to session input.
///
/// Terminals that cannot report key releases only send presses; those stand
/// in for key-ups so the session still advances, and a stray release is
/// dropped so one keystroke never counts twice.
fn translate_key(key: KeyEvent, reports_release: bool) -> Option<InputEvent> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.kind == KeyEventKind::Press).then_some(InputEvent::Quit);
    }
    match (key.kind, reports_release) {
        (KeyEventKind::Release, true) => Some(InputEvent::KeyUp),
        (KeyEventKind::Release, false) => None,
        (KeyEventKind::Press, false) => Some(InputEvent::KeyUp),
        (KeyEventKind::Press | KeyEventKind::Repeat, _) => Some(InputEvent::KeyDown),
    }
}

/// How long to wait for input before the next frame is due.
fn frame_wait(last_present: Option<Instant>, now: Instant, interval: Duration) -> Duration {
    match last_present {
        Some(last) => interval.saturating_sub(now.saturating_duration_since(last)),
        None => Duration::ZERO,
    }
}

/// Frontend drawing on the terminal's alternate screen.
pub struct TerminalFrontend {
    guard: ScreenGuard,
    reports_release: bool,
    out: Stdout,
    sprites: SpriteSheet,
    size: (u16, u16),
    frame_interval: Duration,
    last_present: Option<Instant>,
}

impl TerminalFrontend {
    /// Take over the screen.
    ///
    /// `guard` must come from [`ScreenGuard::enter_raw_mode`]; it is released
    /// with the frontend.
    pub fn open(mut guard: ScreenGuard, frame_interval: Duration) -> io::Result<Self> {
        let mut out = io::stdout();
        guard.enter_screen(&mut out)?;
        let size = crossterm::terminal::size()?;
        if size.0 == 0 || size.1 == 0 {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "terminal reports an empty screen",
            ));
        }
        log::info!(
            "Terminal frontend {}x{} cells, key releases {}",
            size.0,
            size.1,
            if reports_release(guard.keyboard_enhanced) { "reported" } else { "emulated" }
        );

        Ok(Self {
            reports_release: reports_release(guard.keyboard_enhanced),
            guard,
            out,
            sprites: SpriteSheet::new(),
            size,
            frame_interval,
            last_present: None,
        })
    }

    /// Screen size in cells.
    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn set_sprites(&mut self, sprites: SpriteSheet) {
        self.sprites = sprites;
    }

    /// Give the terminal back before the process prints anything else.
    pub fn close(mut self) -> io::Result<()> {
        self.guard.exit()
    }

    fn draw(&mut self, art: &SpriteArt, origin: (i32, i32)) -> io::Result<()> {
        let color = terminal_color(art.color());
        for (row, line) in art.lines().iter().enumerate() {
            let y = origin.1.saturating_add(row as i32);
            if let Some((col, row, text)) = clip_line(line, origin.0, y, self.size) {
                queue!(
                    self.out,
                    MoveTo(col, row),
                    SetForegroundColor(color),
                    Print(text),
                    ResetColor
                )?;
            }
        }
        Ok(())
    }

    /// Wait out the rest of the frame in the event poll. Input cuts the wait
    /// short and is drained at the start of the next frame.
    fn pace(&mut self) -> io::Result<()> {
        let wait = frame_wait(self.last_present, Instant::now(), self.frame_interval);
        if !wait.is_zero() {
            event::poll(wait)?;
        }
        self.last_present = Some(Instant::now());
        Ok(())
    }
}

impl Frontend for TerminalFrontend {
    fn poll_event(&mut self) -> Result<Option<InputEvent>, FrontendError> {
        if signal::quit_requested() {
            return Ok(Some(InputEvent::Quit));
        }

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(input) = translate_key(key, self.reports_release) {
                        return Ok(Some(input));
                    }
                }
                Event::Resize(width, height) => {
                    self.size = (width, height);
                    return Ok(Some(InputEvent::Resize { width, height }));
                }
                // Ignore other events (mouse, focus, paste).
                _ => {}
            }
        }
        Ok(None)
    }

    fn render(&mut self, scene: &Scene) -> Result<(), FrontendError> {
        queue!(self.out, BeginSynchronizedUpdate, Clear(ClearType::All))?;

        for placement in &scene.placements {
            let art = self
                .sprites
                .get(placement.sprite)
                .cloned()
                .ok_or(FrontendError::MissingSprite(placement.sprite))?;
            let origin = centered_origin(placement.at, art.size(), self.size);
            self.draw(&art, origin)?;
        }

        queue!(self.out, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.pace()?;
        Ok(())
    }
}
