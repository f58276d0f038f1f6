use std::collections::VecDeque;
use std::time::Duration;

use super::BoothIo;

/// Scripted button: each poll pops the next outcome, and an empty script
/// means "no press". A poll without a press sleeps for the full timeout.
#[derive(Default)]
pub struct MockIo {
    pub pressed_at_boot: bool,
    pub script: VecDeque<bool>,
    pub indicator: bool,
    pub indicator_history: Vec<bool>,
    pub polls: u32,
    pub discards: u32,
}

impl MockIo {
    pub fn with_presses(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl BoothIo for MockIo {
    fn trigger_pressed(&self) -> bool {
        self.pressed_at_boot
    }

    async fn wait_for_press(&mut self, timeout: Duration) -> bool {
        self.polls += 1;
        if self.script.pop_front().unwrap_or(false) {
            return true;
        }
        tokio::time::sleep(timeout).await;
        false
    }

    fn discard_pending(&mut self) {
        self.discards += 1;
    }

    fn set_indicator(&mut self, on: bool) {
        self.indicator = on;
        self.indicator_history.push(on);
    }
}
