//! Shared message cell and the scroll restart handoff.
//!
//! The request loop produces messages, a single long-lived worker consumes
//! them. A replacement cancels the active run and waits for it to report
//! completion before the next run is launched, so two runs never share the
//! display.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex, signal::Signal};
use embedded_hal_async::delay::DelayNs;
use log::{debug, info};

use crate::{
    cancel::CancelToken,
    display::TextSurface,
    message::{CapacityError, DisplayMessage},
    scroll::{self, ScrollConfig, ScrollExit},
};

/// Result of submitting text from the form.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    /// Same text as the current message; scrolling was left alone.
    Unchanged,
    /// Message replaced and a fresh scroll run launched.
    Replaced,
}

pub struct MessageStore<M: RawMutex> {
    current: Mutex<M, DisplayMessage>,
    cancel: CancelToken,
    running: AtomicBool,
    launch: Signal<M, DisplayMessage>,
    finished: Signal<M, ScrollExit>,
}

impl<M: RawMutex> MessageStore<M> {
    pub fn new(initial: DisplayMessage) -> Self {
        Self {
            current: Mutex::new(initial),
            cancel: CancelToken::new(),
            running: AtomicBool::new(false),
            launch: Signal::new(),
            finished: Signal::new(),
        }
    }

    /// Copy of the message visible right now.
    pub async fn current(&self) -> DisplayMessage {
        self.current.lock().await.clone()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Whether a launched run has not reported completion yet.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Launches the first run with the current message.
    pub async fn start(&self) {
        let current = self.current.lock().await;
        self.launch_run(current.clone());
    }

    /// Replaces the message and restarts scrolling if `text` differs.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, CapacityError> {
        let mut current = self.current.lock().await;
        if current.text() == text {
            return Ok(SubmitOutcome::Unchanged);
        }

        let next = DisplayMessage::try_from_str(text)?;

        self.cancel.cancel();
        if self.is_running() {
            let exit = self.finished.wait().await;
            debug!("store: previous scroll run joined ({:?})", exit);
        }
        self.cancel.reset();

        *current = next;
        self.launch_run(current.clone());
        Ok(SubmitOutcome::Replaced)
    }

    /// Waits for the next launch request.
    pub async fn next_launch(&self) -> DisplayMessage {
        self.launch.wait().await
    }

    /// Reports that the active run has exited.
    pub fn finish(&self, exit: ScrollExit) {
        self.running.store(false, Ordering::Release);
        self.finished.signal(exit);
    }

    /// Worker step: waits for a launch, scrolls until cancelled or faulted,
    /// then reports completion.
    pub async fn serve_one<S, D>(
        &self,
        surface: &mut S,
        delay: &mut D,
        config: ScrollConfig,
    ) -> ScrollExit
    where
        S: TextSurface,
        D: DelayNs,
    {
        let message = self.next_launch().await;
        info!(
            "scroll: run started glyphs={} text={}",
            message.glyph_count(),
            message.text()
        );

        let exit = scroll::run(surface, delay, &message, &self.cancel, config).await;
        info!("scroll: run ended ({:?})", exit);

        self.finish(exit);
        exit
    }

    fn launch_run(&self, message: DisplayMessage) {
        self.finished.reset();
        self.running.store(true, Ordering::Release);
        self.launch.signal(message);
    }
}
