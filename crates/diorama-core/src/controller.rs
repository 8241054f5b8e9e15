// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene lifecycle controller.
//!
//! Owns the render surface, camera rig and scene graph for one activation and
//! coordinates the single asset load against the frame loop. All entry points
//! run on the host's one thread; nothing here blocks or spawns.

use core::fmt;

use diorama_scene::{
    AssetLoader, CameraRig, FrameHandle, FrameScheduler, Light, LoadError, LoadRequest,
    LoadTicket, RenderSurface, ResizeSubscription, SceneGraph, SceneNode, SurfaceError,
    ViewportHost, ViewportSize,
};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::settings::{LoopPolicy, SceneSettings};

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, never activated.
    Idle,
    /// Building surface, camera and lights.
    Initializing,
    /// Asset requested; frame loop not running yet.
    Loading,
    /// Frame loop running.
    Running,
    /// Deactivated, or activation aborted. Terminal until the next `activate`.
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Loading => "loading",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Outcome of the activation's asset load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    /// Request issued, no result yet.
    Pending,
    /// Model attached to the scene.
    Loaded,
    /// Load failed; the scene shows lights only.
    Failed(LoadError),
}

/// Errors surfaced to the host.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// `activate` called while an activation is in progress.
    #[error("controller already active ({0})")]
    AlreadyActive(Phase),
    /// The render surface could not be created; nothing was set up.
    #[error("render surface initialization failed: {0}")]
    SurfaceInit(#[source] SurfaceError),
    /// The host refused the resize subscription; activation was rolled back.
    #[error("viewport host error: {0}")]
    Host(#[from] diorama_scene::HostError),
    /// The surface failed while rendering or resizing. Not recoverable.
    #[error("render surface failed: {0}")]
    Surface(#[source] SurfaceError),
}

/// Notification delivered by the host environment.
#[derive(Debug)]
pub enum HostEvent {
    /// The display is about to draw; `timestamp_ms` is the scheduler's clock.
    Frame {
        /// Handle returned by `request_frame`.
        handle: FrameHandle,
        /// Scheduler timestamp in milliseconds.
        timestamp_ms: f64,
    },
    /// The viewport changed size.
    Resized(ViewportSize),
    /// The asset finished loading.
    AssetLoaded {
        /// Ticket from the originating request.
        ticket: LoadTicket,
        /// Decoded model.
        node: SceneNode,
    },
    /// The asset could not be loaded.
    AssetLoadFailed {
        /// Ticket from the originating request.
        ticket: LoadTicket,
        /// Why it failed.
        error: LoadError,
    },
}

/// State owned by one activation.
struct Session<H: ViewportHost> {
    host: H,
    surface: Option<H::Surface>,
    camera: CameraRig,
    scene: SceneGraph,
    resize: Option<ResizeSubscription>,
    frame: Option<FrameHandle>,
    asset: AssetStatus,
}

/// Coordinates surface, camera, scene graph, asset load and frame loop.
///
/// The host calls [`activate`](Self::activate) and
/// [`deactivate`](Self::deactivate) at the matching points of its own
/// lifecycle and forwards scheduler, resize and loader callbacks, either
/// directly or through [`handle`](Self::handle).
///
/// # Liveness
///
/// Every callback checks the liveness flag and the activation number carried
/// by its ticket or handle. Results arriving after `deactivate`, or belonging
/// to an earlier activation, are dropped without touching the scene.
pub struct SceneController<H, F, L>
where
    H: ViewportHost,
    F: FrameScheduler,
    L: AssetLoader,
{
    settings: SceneSettings,
    scheduler: F,
    loader: L,
    phase: Phase,
    live: bool,
    activation: u64,
    frames_submitted: u64,
    session: Option<Session<H>>,
}

impl<H, F, L> SceneController<H, F, L>
where
    H: ViewportHost,
    F: FrameScheduler,
    L: AssetLoader,
{
    /// Create an idle controller.
    pub fn new(settings: SceneSettings, scheduler: F, loader: L) -> Self {
        Self {
            settings,
            scheduler,
            loader,
            phase: Phase::Idle,
            live: false,
            activation: 0,
            frames_submitted: 0,
            session: None,
        }
    }

    /// Build surface, camera and lights for `host`, then request the asset.
    ///
    /// On failure nothing is left behind: no surface, no subscription, no
    /// load request, and the phase is [`Phase::Stopped`].
    pub fn activate(&mut self, mut host: H) -> Result<(), ControllerError> {
        if matches!(
            self.phase,
            Phase::Initializing | Phase::Loading | Phase::Running
        ) {
            return Err(ControllerError::AlreadyActive(self.phase));
        }
        self.phase = Phase::Initializing;
        self.session = None;

        let size = host.size();
        info!(width = size.width, height = size.height, "activating scene");

        let mut surface = match Self::create_surface(&mut host, size) {
            Ok(surface) => surface,
            Err(err) => {
                error!(%err, "render surface initialization failed");
                self.phase = Phase::Stopped;
                return Err(ControllerError::SurfaceInit(err));
            }
        };
        let resize = match host.subscribe_resize() {
            Ok(sub) => sub,
            Err(err) => {
                error!(%err, "resize subscription failed; releasing surface");
                surface.dispose();
                self.phase = Phase::Stopped;
                return Err(err.into());
            }
        };

        let camera = self.settings.camera.rig(size);
        let mut scene = SceneGraph::new();
        scene.add_light(Light::Ambient(self.settings.ambient_light()));
        scene.add_light(Light::Directional(self.settings.directional_light()));

        self.activation += 1;
        self.live = true;
        self.frames_submitted = 0;
        self.session = Some(Session {
            host,
            surface: Some(surface),
            camera,
            scene,
            resize: Some(resize),
            frame: None,
            asset: AssetStatus::Pending,
        });
        self.phase = Phase::Loading;

        if self.settings.loop_policy == LoopPolicy::Immediate {
            self.start_loop();
        }

        let request = LoadRequest {
            ticket: LoadTicket::new(self.activation),
            source: self.settings.asset_source(),
        };
        debug!(asset = request.source.as_str(), activation = self.activation, "requesting asset");
        self.loader.load(request);
        Ok(())
    }

    fn create_surface(host: &mut H, size: ViewportSize) -> Result<H::Surface, SurfaceError> {
        if size.is_empty() {
            return Err(SurfaceError::ZeroSize {
                width: size.width,
                height: size.height,
            });
        }
        host.create_surface(size)
    }

    /// Attach the loaded model with the configured transform and start the loop.
    ///
    /// Ignored after `deactivate`, for tickets from another activation, and
    /// once the load has already resolved.
    pub fn on_asset_loaded(&mut self, ticket: LoadTicket, mut node: SceneNode) {
        if !self.accepts(ticket) {
            debug!(activation = ticket.activation(), "discarding late asset result");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.asset != AssetStatus::Pending {
            warn!("asset already resolved; ignoring duplicate result");
            return;
        }
        node.transform = self.settings.model.transform();
        let meshes = node.mesh_count();
        session.scene.insert_node(node);
        session.asset = AssetStatus::Loaded;
        info!(meshes, "model attached");
        self.start_loop();
    }

    /// Record a failed load. The viewport stays live with lights only.
    ///
    /// No retry. When the frame loop is not running a single still frame is
    /// presented so the lit, empty scene is visible; only a surface failure
    /// while doing so is returned.
    pub fn on_asset_load_failed(
        &mut self,
        ticket: LoadTicket,
        error: LoadError,
    ) -> Result<(), ControllerError> {
        if !self.accepts(ticket) {
            debug!(activation = ticket.activation(), "discarding late asset failure");
            return Ok(());
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.asset != AssetStatus::Pending {
            warn!("asset already resolved; ignoring duplicate failure");
            return Ok(());
        }
        error!(%error, "failed to load the model");
        session.asset = AssetStatus::Failed(error);
        self.present_still()
    }

    /// Render one frame and schedule the next.
    ///
    /// Only the currently pending `handle` is honored; stale or cancelled
    /// handles are ignored. A render failure halts the loop and is returned.
    pub fn tick(&mut self, handle: FrameHandle, timestamp_ms: f64) -> Result<(), ControllerError> {
        if !self.live {
            debug!(?handle, "frame after deactivate; ignoring");
            return Ok(());
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.frame != Some(handle) {
            debug!(?handle, "stale frame handle; ignoring");
            return Ok(());
        }
        session.frame = None;
        let Some(surface) = session.surface.as_mut() else {
            return Ok(());
        };
        if let Err(err) = surface.render(&session.scene, &session.camera) {
            error!(%err, "frame submission failed; frame loop halted");
            return Err(ControllerError::Surface(err));
        }
        self.frames_submitted += 1;
        session.frame = Some(self.scheduler.request_frame());
        trace!(frame = self.frames_submitted, timestamp_ms, "frame submitted");
        Ok(())
    }

    /// Resize the surface and camera; effective from the next frame.
    ///
    /// Collapsed sizes are ignored. Never renders while the loop runs.
    pub fn on_viewport_resized(&mut self, width: u32, height: u32) -> Result<(), ControllerError> {
        if !self.live {
            return Ok(());
        }
        let size = ViewportSize::new(width, height);
        if size.is_empty() {
            debug!(width, height, "viewport collapsed; keeping previous size");
            return Ok(());
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if let Some(surface) = session.surface.as_mut() {
            surface.resize(size).map_err(|err| {
                error!(%err, width, height, "surface resize failed");
                ControllerError::Surface(err)
            })?;
        }
        session.camera.set_viewport(size);
        debug!(width, height, aspect = session.camera.aspect, "viewport resized");
        self.present_still()
    }

    /// Tear down the activation. Safe to call any number of times.
    ///
    /// Cancels the pending frame, releases the resize subscription, abandons
    /// an unresolved load and disposes the surface exactly once.
    pub fn deactivate(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        self.phase = Phase::Stopped;
        let activation = self.activation;
        if let Some(session) = self.session.as_mut() {
            if let Some(handle) = session.frame.take() {
                self.scheduler.cancel_frame(handle);
            }
            if let Some(sub) = session.resize.take() {
                session.host.unsubscribe_resize(sub);
            }
            if session.asset == AssetStatus::Pending {
                debug!(activation, "abandoning in-flight asset load");
                self.loader.abandon(LoadTicket::new(activation));
            }
            if let Some(mut surface) = session.surface.take() {
                surface.dispose();
            }
        }
        info!(activation, frames = self.frames_submitted, "scene deactivated");
    }

    /// Route a host notification to the matching entry point.
    pub fn handle(&mut self, event: HostEvent) -> Result<(), ControllerError> {
        match event {
            HostEvent::Frame {
                handle,
                timestamp_ms,
            } => self.tick(handle, timestamp_ms),
            HostEvent::Resized(size) => self.on_viewport_resized(size.width, size.height),
            HostEvent::AssetLoaded { ticket, node } => {
                self.on_asset_loaded(ticket, node);
                Ok(())
            }
            HostEvent::AssetLoadFailed { ticket, error } => {
                self.on_asset_load_failed(ticket, error)
            }
        }
    }

    fn accepts(&self, ticket: LoadTicket) -> bool {
        self.live && ticket.activation() == self.activation
    }

    fn start_loop(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.frame.is_none() {
            session.frame = Some(self.scheduler.request_frame());
        }
        self.phase = Phase::Running;
    }

    /// Draw a single frame when the loop is stopped and the load has failed.
    fn present_still(&mut self) -> Result<(), ControllerError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.frame.is_some() || !matches!(session.asset, AssetStatus::Failed(_)) {
            return Ok(());
        }
        let Some(surface) = session.surface.as_mut() else {
            return Ok(());
        };
        surface
            .render(&session.scene, &session.camera)
            .map_err(|err| {
                error!(%err, "still frame submission failed");
                ControllerError::Surface(err)
            })?;
        self.frames_submitted += 1;
        Ok(())
    }

    // ─── Observers ──────────────────────────────────────────────────────────

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Liveness flag: true between a successful `activate` and `deactivate`.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// True while a frame notification is pending.
    pub fn is_looping(&self) -> bool {
        self.frame_handle().is_some()
    }

    /// Pending frame handle, if the loop is running.
    pub fn frame_handle(&self) -> Option<FrameHandle> {
        self.session.as_ref().and_then(|s| s.frame)
    }

    /// Frames submitted to the surface during the current activation.
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    /// Number of activations so far.
    pub fn activation(&self) -> u64 {
        self.activation
    }

    /// Camera of the current (or last) activation.
    pub fn camera(&self) -> Option<&CameraRig> {
        self.session.as_ref().map(|s| &s.camera)
    }

    /// Scene graph of the current (or last) activation.
    pub fn scene(&self) -> Option<&SceneGraph> {
        self.session.as_ref().map(|s| &s.scene)
    }

    /// Render surface; `None` once disposed.
    pub fn surface(&self) -> Option<&H::Surface> {
        self.session.as_ref().and_then(|s| s.surface.as_ref())
    }

    /// Viewport host of the current (or last) activation.
    pub fn host(&self) -> Option<&H> {
        self.session.as_ref().map(|s| &s.host)
    }

    /// Load outcome of the current (or last) activation.
    pub fn asset_status(&self) -> Option<&AssetStatus> {
        self.session.as_ref().map(|s| &s.asset)
    }

    /// Settings this controller was built with.
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }
}

impl<H, F, L> Drop for SceneController<H, F, L>
where
    H: ViewportHost,
    F: FrameScheduler,
    L: AssetLoader,
{
    fn drop(&mut self) {
        self.deactivate();
    }
}
