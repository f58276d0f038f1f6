/// What the attract screen should do on this idle tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blink {
    On,
    Off,
}

/// Counts idle polls without a button press. After `period` ticks the
/// attract screen switches on, after `2 * period` it switches off and the
/// count starts over.
#[derive(Debug)]
pub struct Blinker {
    period: u32,
    ticks: u32,
}

impl Blinker {
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
            ticks: 0,
        }
    }

    pub fn tick(&mut self) -> Option<Blink> {
        self.ticks += 1;
        if self.ticks == self.period {
            Some(Blink::On)
        } else if self.ticks == 2 * self.period {
            self.ticks = 0;
            Some(Blink::Off)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
    }
}
