//! Right-to-left marquee over a [`TextSurface`].

use embedded_hal_async::delay::DelayNs;
use log::warn;

use crate::{cancel::CancelToken, display::TextSurface, message::DisplayMessage};

/// First column drawn: just past the right edge of a 32-column panel.
pub const START_COLUMN: i32 = 33;
/// Horizontal advance of one glyph cell.
pub const GLYPH_WIDTH: i32 = 8;
pub const FRAME_INTERVAL_MS: u32 = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScrollConfig {
    pub start_column: i32,
    pub glyph_width: i32,
    pub frame_interval_ms: u32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollConfig {
    pub const fn new() -> Self {
        Self {
            start_column: START_COLUMN,
            glyph_width: GLYPH_WIDTH,
            frame_interval_ms: FRAME_INTERVAL_MS,
        }
    }

    pub const fn with_start_column(mut self, start_column: i32) -> Self {
        self.start_column = start_column;
        self
    }

    pub const fn with_glyph_width(mut self, glyph_width: i32) -> Self {
        self.glyph_width = glyph_width;
        self
    }

    pub const fn with_frame_interval_ms(mut self, frame_interval_ms: u32) -> Self {
        self.frame_interval_ms = frame_interval_ms;
        self
    }

    /// Offset at which the whole message has left the panel on the left.
    ///
    /// Never greater than `start_column`, so every pass renders at least once.
    pub fn end_column(&self, glyph_count: usize) -> i32 {
        let glyphs = i32::try_from(glyph_count).unwrap_or(i32::MAX);
        glyphs
            .saturating_mul(self.glyph_width)
            .saturating_neg()
            .min(self.start_column)
    }
}

/// How a scroll run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScrollExit {
    Cancelled,
    Faulted,
}

/// Offsets of one pass, from `start_column` down to `end_column` inclusive.
#[derive(Clone, Debug)]
pub struct ScrollOffsets {
    next: i32,
    end: i32,
    exhausted: bool,
}

impl ScrollOffsets {
    pub fn new(config: ScrollConfig, glyph_count: usize) -> Self {
        Self {
            next: config.start_column,
            end: config.end_column(glyph_count),
            exhausted: false,
        }
    }
}

impl Iterator for ScrollOffsets {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.exhausted {
            return None;
        }

        let current = self.next;
        if current <= self.end {
            self.exhausted = true;
        } else {
            self.next -= 1;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            return (0, Some(0));
        }
        let remaining = (self.next - self.end) as usize + 1;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ScrollOffsets {}

/// Clears the surface, draws `text` at `offset`, and presents the frame.
pub fn render_frame<S>(surface: &mut S, text: &str, offset: i32) -> Result<(), S::Error>
where
    S: TextSurface,
{
    surface.clear()?;
    surface.draw_text(text, offset)?;
    surface.present()
}

/// Scrolls `message` in passes until `cancel` is observed or the surface fails.
///
/// The flag is polled right before and right after each frame, so a cancelled
/// run never renders another frame and exits within one frame interval.
pub async fn run<S, D>(
    surface: &mut S,
    delay: &mut D,
    message: &DisplayMessage,
    cancel: &CancelToken,
    config: ScrollConfig,
) -> ScrollExit
where
    S: TextSurface,
    D: DelayNs,
{
    loop {
        for offset in ScrollOffsets::new(config, message.glyph_count()) {
            if cancel.is_cancelled() {
                return ScrollExit::Cancelled;
            }

            if let Err(err) = render_frame(surface, message.text(), offset) {
                warn!("scroll: frame at offset {} failed: {:?}", offset, err);
                return ScrollExit::Faulted;
            }

            if cancel.is_cancelled() {
                return ScrollExit::Cancelled;
            }

            delay.delay_ms(config.frame_interval_ms).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::test_support::{CountingDelay, RecordingSurface};

    #[test]
    fn offsets_start_at_margin_and_reach_full_width() {
        let offsets: Vec<i32> = ScrollOffsets::new(ScrollConfig::default(), 3).collect();

        assert_eq!(offsets.first(), Some(&33));
        assert_eq!(offsets.last(), Some(&-24));
        assert_eq!(offsets.len(), 33 + 24 + 1);
        assert!(offsets.windows(2).all(|pair| pair[1] == pair[0] - 1));
    }

    #[test]
    fn size_hint_matches_pass_length() {
        let mut offsets = ScrollOffsets::new(ScrollConfig::default(), 1);
        assert_eq!(offsets.len(), 42);
        offsets.next();
        assert_eq!(offsets.len(), 41);
    }

    #[test]
    fn misconfigured_start_still_renders_one_frame_per_pass() {
        let config = ScrollConfig::default().with_start_column(-100);
        let offsets: Vec<i32> = ScrollOffsets::new(config, 2).collect();
        assert_eq!(offsets, [-100]);
    }

    #[test]
    fn cancelled_before_first_frame_renders_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let message = DisplayMessage::try_from_str("hola").unwrap();
        let mut surface = RecordingSurface::default();
        let mut delay = CountingDelay::default();

        let exit = block_on(run(
            &mut surface,
            &mut delay,
            &message,
            &cancel,
            ScrollConfig::default(),
        ));

        assert_eq!(exit, ScrollExit::Cancelled);
        assert!(surface.frames.is_empty());
        assert_eq!(delay.elapsed_ms, 0);
    }

    #[test]
    fn cancellation_during_sleep_stops_before_next_frame() {
        let cancel = CancelToken::new();
        let message = DisplayMessage::try_from_str("hi").unwrap();
        let mut surface = RecordingSurface::default();
        let mut delay = CountingDelay::cancelling_after(5, &cancel);

        let exit = block_on(run(
            &mut surface,
            &mut delay,
            &message,
            &cancel,
            ScrollConfig::default(),
        ));

        assert_eq!(exit, ScrollExit::Cancelled);
        let offsets: Vec<i32> = surface.frames.iter().map(|frame| frame.offset).collect();
        assert_eq!(offsets, [33, 32, 31, 30, 29]);
        // No sleep after the flag was seen: at most one interval past the request.
        assert_eq!(delay.elapsed_ms, 5 * u64::from(FRAME_INTERVAL_MS));
    }

    #[test]
    fn pass_restarts_from_margin_after_leaving_the_panel() {
        let cancel = CancelToken::new();
        let message = DisplayMessage::default();
        let mut surface = RecordingSurface::default();
        let mut delay = CountingDelay::cancelling_after(44, &cancel);

        block_on(run(
            &mut surface,
            &mut delay,
            &message,
            &cancel,
            ScrollConfig::default(),
        ));

        let offsets: Vec<i32> = surface.frames.iter().map(|frame| frame.offset).collect();
        assert_eq!(offsets.len(), 44);
        assert_eq!(offsets[41], -8);
        assert_eq!(offsets[42], 33);
        assert_eq!(offsets[43], 32);
    }

    #[test]
    fn every_frame_is_cleared_drawn_and_presented() {
        let cancel = CancelToken::new();
        let message = DisplayMessage::try_from_str("abc").unwrap();
        let mut surface = RecordingSurface::default();
        let mut delay = CountingDelay::cancelling_after(3, &cancel);

        block_on(run(
            &mut surface,
            &mut delay,
            &message,
            &cancel,
            ScrollConfig::default(),
        ));

        assert_eq!(surface.clears, 3);
        assert!(surface.frames.iter().all(|frame| frame.text == "abc"));
    }

    #[test]
    fn surface_fault_ends_the_run() {
        let cancel = CancelToken::new();
        let message = DisplayMessage::try_from_str("x").unwrap();
        let mut surface = RecordingSurface::failing_after(2);
        let mut delay = CountingDelay::default();

        let exit = block_on(run(
            &mut surface,
            &mut delay,
            &message,
            &cancel,
            ScrollConfig::default(),
        ));

        assert_eq!(exit, ScrollExit::Faulted);
        assert_eq!(surface.frames.len(), 2);
    }
}
