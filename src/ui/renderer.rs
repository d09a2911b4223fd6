//! Terminal renderer using crossterm
//!
//! Draws the screen buffer to the console. Rendering reads the buffer and
//! never mutates it.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use tracing::{debug, warn};

use crate::core::term::{Color, ScreenBuffer};

/// Terminal renderer
pub struct Renderer {
    /// Whether the terminal has been initialized
    initialized: bool,
    /// Whether keyboard enhancement flags were pushed
    enhanced_keys: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            initialized: false,
            enhanced_keys: false,
        }
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;

        // Needed to tell Shift+Enter apart from Enter
        match terminal::supports_keyboard_enhancement() {
            Ok(true) => {
                execute!(
                    stdout,
                    PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
                )?;
                self.enhanced_keys = true;
            }
            Ok(false) => warn!("Keyboard enhancement not supported; Shift+Enter may read as Enter"),
            Err(e) => warn!("Keyboard enhancement query failed: {}", e),
        }

        stdout.flush()?;
        self.initialized = true;
        debug!("Renderer initialized (enhanced keys: {})", self.enhanced_keys);
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();

        if self.enhanced_keys {
            let _ = execute!(stdout, PopKeyboardEnhancementFlags);
            self.enhanced_keys = false;
        }

        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, Show);
        let _ = execute!(stdout, EnableLineWrap);
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = stdout.flush();

        // Disable raw mode - this is the most important part
        terminal::disable_raw_mode()?;

        Ok(())
    }

    /// Render the screen buffer
    pub fn render(&mut self, screen: &ScreenBuffer, cursor_visible: bool) -> io::Result<()> {
        let stdout = io::stdout();
        let mut stdout = io::BufWriter::with_capacity(65536, stdout.lock());
        render_to(&mut stdout, screen, cursor_visible)?;
        stdout.flush()
    }

    /// Get terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Write one full frame of `screen` to `out`
pub fn render_to<W: Write>(out: &mut W, screen: &ScreenBuffer, cursor_visible: bool) -> io::Result<()> {
    // Begin synchronized update (reduces flicker)
    write!(out, "\x1b[?2026h")?;
    queue!(out, Hide)?;

    let cursor = screen.cursor;
    // A cursor parked past the last column is drawn on the last column
    let cursor_col = cursor.col.min(screen.cols().saturating_sub(1));

    let mut current_fg: Option<Color> = None;
    let mut line_buffer = String::with_capacity(screen.cols() as usize);

    for (row_idx, row) in screen.iter_rows().enumerate() {
        let row_idx = row_idx as u16;
        queue!(out, MoveTo(0, row_idx))?;

        for (col_idx, cell) in row.cells.iter().enumerate() {
            let at_cursor = cursor_visible && row_idx == cursor.row && col_idx as u16 == cursor_col;

            if current_fg != Some(cell.fg) || at_cursor {
                if !line_buffer.is_empty() {
                    queue!(out, Print(&line_buffer))?;
                    line_buffer.clear();
                }
                if current_fg != Some(cell.fg) {
                    queue!(out, SetForegroundColor(cell.fg.to_crossterm()))?;
                    current_fg = Some(cell.fg);
                }
            }

            if at_cursor {
                queue!(
                    out,
                    SetAttribute(Attribute::Reverse),
                    Print(cell.display_char()),
                    SetAttribute(Attribute::NoReverse)
                )?;
            } else {
                line_buffer.push(cell.display_char());
            }
        }

        if !line_buffer.is_empty() {
            queue!(out, Print(&line_buffer))?;
            line_buffer.clear();
        }
    }

    queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;

    // End synchronized update
    write!(out, "\x1b[?2026l")?;
    Ok(())
}

/// Cursor blink timer
pub struct CursorBlink {
    interval: Duration,
    last_flip: Instant,
    visible: bool,
}

impl CursorBlink {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_flip: now,
            visible: true,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Advance to `now`. Returns true when visibility flipped.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.interval.is_zero() || now.duration_since(self.last_flip) < self.interval {
            return false;
        }
        self.visible = !self.visible;
        self.last_flip = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(screen: &ScreenBuffer, cursor_visible: bool) -> String {
        let mut out = Vec::new();
        render_to(&mut out, screen, cursor_visible).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_frame_contains_text() {
        let mut screen = ScreenBuffer::new(20, 3);
        screen.put_str("hello");

        let out = frame(&screen, false);
        assert!(out.starts_with("\x1b[?2026h"));
        assert!(out.ends_with("\x1b[?2026l"));
        assert!(out.contains("hello"));
        // White foreground as RGB
        assert!(out.contains("38;2;255;255;255"));
    }

    #[test]
    fn test_color_changes_emitted_once_per_run() {
        let mut screen = ScreenBuffer::new(10, 1);
        screen.fg = Color::ansi(1);
        screen.put_str("ab");

        let out = frame(&screen, false);
        let red = Color::ansi(1);
        let red_seq = format!("38;2;{};{};{}", red.r, red.g, red.b);
        assert_eq!(out.matches(&red_seq).count(), 1);
        assert!(out.contains("ab"));
    }

    #[test]
    fn test_cursor_drawn_reversed() {
        let mut screen = ScreenBuffer::new(10, 2);
        screen.put_str("ab");

        let shown = frame(&screen, true);
        assert!(shown.contains("\x1b[7m \x1b[27m"));

        let hidden = frame(&screen, false);
        assert!(!hidden.contains("\x1b[7m"));
    }

    #[test]
    fn test_pending_wrap_cursor_clamped() {
        let mut screen = ScreenBuffer::new(8, 2);
        screen.put_str("abcdefg");
        screen.put_byte(b'\t');
        assert_eq!(screen.cursor.col, 8);

        // Drawn on the last column, which the tab blanked
        let out = frame(&screen, true);
        assert!(out.contains("abcdefg\x1b[7m \x1b[27m"));
    }

    #[test]
    fn test_blink_toggles_on_interval() {
        let start = Instant::now();
        let mut blink = CursorBlink::new(Duration::from_millis(500), start);
        assert!(blink.visible());

        assert!(!blink.tick(start + Duration::from_millis(200)));
        assert!(blink.visible());

        assert!(blink.tick(start + Duration::from_millis(500)));
        assert!(!blink.visible());

        assert!(!blink.tick(start + Duration::from_millis(900)));
        assert!(blink.tick(start + Duration::from_millis(1000)));
        assert!(blink.visible());
    }

    #[test]
    fn test_zero_interval_never_blinks() {
        let start = Instant::now();
        let mut blink = CursorBlink::new(Duration::ZERO, start);
        assert!(!blink.tick(start + Duration::from_secs(5)));
        assert!(blink.visible());
    }
}
