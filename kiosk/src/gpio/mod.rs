#[cfg(test)]
pub mod mock;

use std::time::Duration;

use photobooth_common::config::GpioConfig;
use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::KioskError;

/// Digital I/O of the booth: one active-low trigger button and one
/// indicator light.
pub trait BoothIo {
    /// Current level of the trigger, `true` when held down.
    fn trigger_pressed(&self) -> bool;

    /// Wait up to `timeout` for a falling edge on the trigger. Returns
    /// `false` when the timeout elapses first.
    async fn wait_for_press(&mut self, timeout: Duration) -> bool;

    /// Forget edges that arrived while nobody was waiting for them.
    fn discard_pending(&mut self);

    fn set_indicator(&mut self, on: bool);
}

/// GPIO on a Raspberry Pi through `rppal`.
///
/// Falling edges are delivered by rppal's interrupt thread into a channel, so
/// waiting for a press is a plain async timeout. Both pins are reset to
/// their previous state when this value is dropped.
pub struct RppalIo {
    trigger: InputPin,
    indicator: OutputPin,
    presses: mpsc::UnboundedReceiver<()>,
}

impl RppalIo {
    pub fn new(config: &GpioConfig) -> Result<Self, KioskError> {
        let gpio = Gpio::new()?;
        let mut trigger = gpio.get(config.trigger_pin)?.into_input_pullup();
        let indicator = gpio.get(config.indicator_pin)?.into_output_low();

        let (tx, presses) = mpsc::unbounded_channel();
        trigger.set_async_interrupt(Trigger::FallingEdge, None, move |_event| {
            let _ = tx.send(());
        })?;

        info!(
            trigger_pin = config.trigger_pin,
            indicator_pin = config.indicator_pin,
            "gpio ready"
        );
        Ok(Self {
            trigger,
            indicator,
            presses,
        })
    }
}

impl BoothIo for RppalIo {
    fn trigger_pressed(&self) -> bool {
        self.trigger.is_low()
    }

    async fn wait_for_press(&mut self, timeout: Duration) -> bool {
        let edge = async {
            match self.presses.recv().await {
                Some(()) => (),
                // Interrupt torn down: behave as if the button is never pressed.
                None => std::future::pending().await,
            }
        };
        tokio::time::timeout(timeout, edge).await.is_ok()
    }

    fn discard_pending(&mut self) {
        let mut stale = 0;
        while self.presses.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!(stale, "discarded button edges from during the session");
        }
    }

    fn set_indicator(&mut self, on: bool) {
        if on {
            self.indicator.set_high();
        } else {
            self.indicator.set_low();
        }
    }
}
