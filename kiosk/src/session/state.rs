use std::path::{Path, PathBuf};
use std::time::Duration;

use photobooth_common::config::BoothConfig;
use photobooth_common::photo::{current_stem, SHOTS_PER_SESSION};
use tracing::{debug, info, warn};

use crate::assets::Assets;
use crate::camera::CameraDevice;
use crate::capture::take_photo;
use crate::error::KioskError;
use crate::gpio::BoothIo;
use crate::overlay::{self, Overlay};
use crate::storage::resolve_output_dir;

use super::blink::{Blink, Blinker};
use super::Session;

/// Stacking layers. The live preview sits at layer 2.
const INTRO_LAYER: i32 = 3;
const INTRO_BLINK_LAYER: i32 = 4;
const SCREEN_LAYER: i32 = 3;
const DONE_LAYER: i32 = 4;
const PLAYBACK_LAYER: i32 = 3 + SHOTS_PER_SESSION as i32;

/// The idle overlay pair. `blinking` sits on top and has its alpha toggled.
#[derive(Debug)]
pub struct AttractScreen {
    pub steady: Overlay,
    pub blinking: Overlay,
}

impl AttractScreen {
    fn release<C: CameraDevice>(self, camera: &mut C) -> Result<(), KioskError> {
        overlay::hide(camera, Some(self.steady))?;
        overlay::hide(camera, Some(self.blinking))
    }
}

#[derive(Debug)]
pub enum BoothState {
    /// Attract screen up, polling the button.
    Idle,
    /// Taking shot `shot` (1-based) of the session.
    Capturing { session: Session, shot: u32 },
    /// All shots taken, showing them back.
    Playback { session: Session },
}

#[derive(Debug, Clone)]
pub struct KioskSettings {
    pub assets: Assets,
    pub media_root: PathBuf,
    pub fallback: PathBuf,
    pub poll_timeout: Duration,
    pub blink_ticks: u32,
    pub countdown: u32,
    pub screen_time: Duration,
}

impl KioskSettings {
    pub fn from_config(booth: &BoothConfig, program_dir: &Path) -> Self {
        Self {
            assets: Assets::new(booth.assets_path(program_dir)),
            media_root: PathBuf::from(&booth.media_root),
            fallback: booth.fallback_path(program_dir),
            poll_timeout: Duration::from_millis(booth.poll_timeout_ms),
            blink_ticks: booth.blink_ticks,
            countdown: booth.countdown_secs,
            screen_time: Duration::from_secs(booth.screen_secs),
        }
    }
}

/// Owns the camera and the booth I/O for the life of the process and drives
/// the idle → capturing → playback → idle cycle one step at a time.
///
/// Overlays that outlive a single await are held here rather than in
/// `state`, which is empty while a step is in flight. That keeps them
/// reachable from `shutdown` when a step is cancelled or fails.
pub struct Kiosk<C, G> {
    camera: C,
    io: G,
    settings: KioskSettings,
    state: Option<BoothState>, // Option so we can take() during transitions
    attract: Option<AttractScreen>,
    showing: Option<Overlay>,
    blinker: Blinker,
    sessions_completed: u64,
}

impl<C: CameraDevice, G: BoothIo> Kiosk<C, G> {
    pub fn new(camera: C, io: G, settings: KioskSettings) -> Self {
        let blinker = Blinker::new(settings.blink_ticks);
        Self {
            camera,
            io,
            settings,
            state: None,
            attract: None,
            showing: None,
            blinker,
            sessions_completed: 0,
        }
    }

    /// Refuse to start with the button held down, otherwise start the
    /// preview and put up the attract screen.
    pub async fn start(&mut self) -> Result<(), KioskError> {
        if self.io.trigger_pressed() {
            info!("exiting - the button was pressed during startup");
            return Err(KioskError::Startup(
                "trigger button held down during startup".into(),
            ));
        }
        self.camera.start_preview().await?;
        self.raise_attract()?;
        self.io.discard_pending();
        self.state = Some(BoothState::Idle);
        info!("main program started");
        Ok(())
    }

    /// Start, then step forever. Only returns on a fault.
    pub async fn run(&mut self) -> Result<(), KioskError> {
        self.start().await?;
        loop {
            self.step().await?;
        }
    }

    /// Advance the state machine by one transition. An idle step is one
    /// bounded button poll; a capturing step is one whole shot.
    pub async fn step(&mut self) -> Result<(), KioskError> {
        let Some(state) = self.state.take() else {
            return self.start().await;
        };
        let next = match state {
            BoothState::Idle => self.handle_idle().await?,
            BoothState::Capturing { session, shot } => self.handle_capturing(session, shot).await?,
            BoothState::Playback { session } => self.handle_playback(session).await?,
        };
        self.state = Some(next);
        Ok(())
    }

    /// Best-effort teardown for every exit path: take down every overlay,
    /// switch the light off and stop the preview. Safe to call after `run`
    /// was dropped mid-step.
    pub async fn shutdown(&mut self) {
        self.state = None;
        if let Some(attract) = self.attract.take() {
            if let Err(e) = attract.release(&mut self.camera) {
                warn!(error = %e, "failed to remove attract screen");
            }
        }
        if let Err(e) = overlay::hide(&mut self.camera, self.showing.take()) {
            warn!(error = %e, "failed to remove playback photo");
        }
        // A cancelled flash leaves its overlay on the device with no handle.
        match self.camera.clear_overlays() {
            Ok(0) => {}
            Ok(count) => warn!(count, "removed overlays left by an interrupted step"),
            Err(e) => warn!(error = %e, "failed to clear overlays"),
        }
        self.io.set_indicator(false);
        if let Err(e) = self.camera.stop_preview().await {
            warn!(error = %e, "failed to stop preview");
        }
        info!(sessions = self.sessions_completed, "kiosk shut down");
    }

    fn raise_attract(&mut self) -> Result<(), KioskError> {
        let steady = overlay::show_held(&mut self.camera, &self.settings.assets.intro(1), INTRO_LAYER)?;
        let blinking = match overlay::show_held(
            &mut self.camera,
            &self.settings.assets.intro(2),
            INTRO_BLINK_LAYER,
        ) {
            Ok(o) => o,
            Err(e) => {
                overlay::hide(&mut self.camera, Some(steady))?;
                return Err(e);
            }
        };
        self.attract = Some(AttractScreen { steady, blinking });
        Ok(())
    }

    async fn handle_idle(&mut self) -> Result<BoothState, KioskError> {
        if !self.io.wait_for_press(self.settings.poll_timeout).await {
            let blink = self.blinker.tick();
            if let (Some(blink), Some(attract)) = (blink, &self.attract) {
                let on = blink == Blink::On;
                overlay::set_alpha(&mut self.camera, &attract.blinking, if on { 255 } else { 0 })?;
                self.io.set_indicator(on);
            }
            return Ok(BoothState::Idle);
        }

        info!("IDLE→CAPTURING: button is pressed");
        if let Some(attract) = self.attract.take() {
            attract.release(&mut self.camera)?;
        }
        self.blinker.reset();
        self.io.set_indicator(false);

        let dir = resolve_output_dir(&self.settings.media_root, &self.settings.fallback)?;
        let session = Session::new(dir, current_stem());
        debug!(dir = %session.dir.display(), stem = session.stem, "session started");
        Ok(BoothState::Capturing { session, shot: 1 })
    }

    async fn handle_capturing(
        &mut self,
        session: Session,
        shot: u32,
    ) -> Result<BoothState, KioskError> {
        overlay::flash(
            &mut self.camera,
            &self.settings.assets.get_ready(shot),
            SCREEN_LAYER,
            self.settings.screen_time,
        )
        .await?;
        take_photo(&mut self.camera, &session, shot, self.settings.countdown).await?;

        if shot < SHOTS_PER_SESSION {
            return Ok(BoothState::Capturing {
                session,
                shot: shot + 1,
            });
        }
        info!(stem = session.stem, "CAPTURING→PLAYBACK: all shots taken");
        Ok(BoothState::Playback { session })
    }

    async fn handle_playback(&mut self, session: Session) -> Result<BoothState, KioskError> {
        let hold = self.settings.screen_time;
        overlay::flash(&mut self.camera, &self.settings.assets.processing(), SCREEN_LAYER, hold)
            .await?;

        // Each photo goes up before the previous one comes down, so the
        // screen never shows a blank frame between them.
        for path in session.photo_paths() {
            let current = overlay::show_held(&mut self.camera, &path, PLAYBACK_LAYER)?;
            let previous = self.showing.replace(current);
            overlay::hide(&mut self.camera, previous)?;
            tokio::time::sleep(hold).await;
        }
        overlay::hide(&mut self.camera, self.showing.take())?;

        overlay::flash(&mut self.camera, &self.settings.assets.all_done(), DONE_LAYER, hold).await?;

        self.sessions_completed += 1;
        self.raise_attract()?;
        self.io.discard_pending();
        info!(
            sessions = self.sessions_completed,
            "PLAYBACK→IDLE: session finished"
        );
        Ok(BoothState::Idle)
    }
}

#[cfg(test)]
impl<C, G> Kiosk<C, G> {
    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    pub fn io(&self) -> &G {
        &self.io
    }

    pub fn state(&self) -> Option<&BoothState> {
        self.state.as_ref()
    }

    pub fn attract(&self) -> Option<&AttractScreen> {
        self.attract.as_ref()
    }

    pub fn sessions_completed(&self) -> u64 {
        self.sessions_completed
    }
}
