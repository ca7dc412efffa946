//! Host doubles for the display and the frame timer.

use embassy_futures::yield_now;
use embedded_hal_async::delay::DelayNs;

use crate::{cancel::CancelToken, display::TextSurface};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub text: String,
    pub offset: i32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SurfaceFault;

/// Records every presented frame.
#[derive(Default)]
pub struct RecordingSurface {
    pub frames: Vec<Frame>,
    pub clears: usize,
    pending: Option<Frame>,
    fail_after: Option<usize>,
}

impl RecordingSurface {
    /// Presents `frames` frames successfully, then fails.
    pub fn failing_after(frames: usize) -> Self {
        Self {
            fail_after: Some(frames),
            ..Self::default()
        }
    }
}

impl TextSurface for RecordingSurface {
    type Error = SurfaceFault;

    fn clear(&mut self) -> Result<(), SurfaceFault> {
        self.clears += 1;
        self.pending = None;
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x_offset: i32) -> Result<(), SurfaceFault> {
        self.pending = Some(Frame {
            text: text.into(),
            offset: x_offset,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), SurfaceFault> {
        if self.fail_after == Some(self.frames.len()) {
            return Err(SurfaceFault);
        }
        if let Some(frame) = self.pending.take() {
            self.frames.push(frame);
        }
        Ok(())
    }
}

/// Timer double: accounts for requested sleep and yields once per call so
/// joined futures get polled.
#[derive(Default)]
pub struct CountingDelay<'a> {
    pub calls: usize,
    pub elapsed_ms: u64,
    cancel_at: Option<(usize, &'a CancelToken)>,
}

impl<'a> CountingDelay<'a> {
    /// Raises `cancel` while sleeping after the `calls`-th frame.
    pub fn cancelling_after(calls: usize, cancel: &'a CancelToken) -> Self {
        Self {
            cancel_at: Some((calls, cancel)),
            ..Self::default()
        }
    }
}

impl DelayNs for CountingDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns / 1_000_000).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.delay_ms(us / 1_000).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.elapsed_ms += u64::from(ms);
        if let Some((at, cancel)) = self.cancel_at
            && self.calls == at
        {
            cancel.cancel();
        }
        yield_now().await;
    }
}
