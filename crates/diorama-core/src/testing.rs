// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless port adapters for driving a [`SceneController`] in tests.
//!
//! Each adapter is a cheap clonable handle over shared state, so a test keeps
//! one clone for inspection while the controller owns the other. No GPU, no
//! clock: frames fire only when the test calls [`ManualScheduler::fire`], and
//! loads resolve only when the test delivers a result.

use std::cell::RefCell;
use std::rc::Rc;

use diorama_scene::{
    AssetLoader, CameraRig, FrameHandle, FrameScheduler, HostError, LoadRequest, LoadTicket, Mesh,
    RenderSurface, ResizeSubscription, SceneGraph, SceneNode, SurfaceError, ViewportHost,
    ViewportSize,
};

use crate::controller::{ControllerError, SceneController};

/// What a mock surface saw for one submitted frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    /// Surface size at submission.
    pub size: ViewportSize,
    /// Camera aspect at submission.
    pub aspect: f32,
    /// Top-level scene nodes at submission.
    pub nodes: usize,
    /// Light sources at submission.
    pub lights: usize,
}

#[derive(Debug, Default)]
struct SurfaceState {
    size: ViewportSize,
    renders: Vec<RenderRecord>,
    resizes: Vec<ViewportSize>,
    dispose_calls: u32,
    fail_render: Option<SurfaceError>,
    fail_resize: Option<SurfaceError>,
}

/// Render surface that records frames instead of drawing them.
#[derive(Debug, Clone, Default)]
pub struct MockSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl MockSurface {
    fn with_size(size: ViewportSize) -> Self {
        let surface = Self::default();
        surface.state.borrow_mut().size = size;
        surface
    }

    /// Frames submitted so far.
    pub fn render_count(&self) -> usize {
        self.state.borrow().renders.len()
    }

    /// Per-frame records in submission order.
    pub fn renders(&self) -> Vec<RenderRecord> {
        self.state.borrow().renders.clone()
    }

    /// Sizes passed to `resize`, in order.
    pub fn resizes(&self) -> Vec<ViewportSize> {
        self.state.borrow().resizes.clone()
    }

    /// Number of `dispose` calls.
    pub fn dispose_calls(&self) -> u32 {
        self.state.borrow().dispose_calls
    }

    /// True once disposed.
    pub fn is_disposed(&self) -> bool {
        self.dispose_calls() > 0
    }

    /// Make the next `render` fail with `err`.
    pub fn fail_next_render(&self, err: SurfaceError) {
        self.state.borrow_mut().fail_render = Some(err);
    }

    /// Make the next `resize` fail with `err`.
    pub fn fail_next_resize(&self, err: SurfaceError) {
        self.state.borrow_mut().fail_resize = Some(err);
    }
}

impl RenderSurface for MockSurface {
    fn size(&self) -> ViewportSize {
        self.state.borrow().size
    }

    fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        if state.dispose_calls > 0 {
            return Err(SurfaceError::Disposed);
        }
        if let Some(err) = state.fail_resize.take() {
            return Err(err);
        }
        state.size = size;
        state.resizes.push(size);
        Ok(())
    }

    fn render(&mut self, scene: &SceneGraph, camera: &CameraRig) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        if state.dispose_calls > 0 {
            return Err(SurfaceError::Disposed);
        }
        if let Some(err) = state.fail_render.take() {
            return Err(err);
        }
        let frame = RenderRecord {
            size: state.size,
            aspect: camera.aspect,
            nodes: scene.nodes().len(),
            lights: scene.lights().len(),
        };
        state.renders.push(frame);
        Ok(())
    }

    fn dispose(&mut self) {
        self.state.borrow_mut().dispose_calls += 1;
    }
}

#[derive(Debug, Default)]
struct ViewportState {
    size: ViewportSize,
    surface: MockSurface,
    surfaces_created: u32,
    fail_surface: Option<SurfaceError>,
    fail_subscribe: Option<HostError>,
    next_subscription: u64,
    active: Vec<ResizeSubscription>,
}

/// Viewport host with a settable size and an inspectable surface.
#[derive(Debug, Clone, Default)]
pub struct MockViewport {
    state: Rc<RefCell<ViewportState>>,
}

impl MockViewport {
    /// Viewport of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let viewport = Self::default();
        viewport.state.borrow_mut().size = ViewportSize::new(width, height);
        viewport
    }

    /// Change the host-side size; the caller delivers the resize event.
    pub fn set_size(&self, width: u32, height: u32) -> ViewportSize {
        let size = ViewportSize::new(width, height);
        self.state.borrow_mut().size = size;
        size
    }

    /// Most recently created surface.
    pub fn surface(&self) -> MockSurface {
        self.state.borrow().surface.clone()
    }

    /// Number of surfaces created.
    pub fn surfaces_created(&self) -> u32 {
        self.state.borrow().surfaces_created
    }

    /// Resize subscriptions not yet released.
    pub fn active_subscriptions(&self) -> usize {
        self.state.borrow().active.len()
    }

    /// Make the next `create_surface` fail with `err`.
    pub fn fail_surface_with(&self, err: SurfaceError) {
        self.state.borrow_mut().fail_surface = Some(err);
    }

    /// Make the next `subscribe_resize` fail with `err`.
    pub fn fail_subscribe_with(&self, err: HostError) {
        self.state.borrow_mut().fail_subscribe = Some(err);
    }
}

impl ViewportHost for MockViewport {
    type Surface = MockSurface;

    fn size(&self) -> ViewportSize {
        self.state.borrow().size
    }

    fn create_surface(&mut self, size: ViewportSize) -> Result<MockSurface, SurfaceError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_surface.take() {
            return Err(err);
        }
        let surface = MockSurface::with_size(size);
        state.surface = surface.clone();
        state.surfaces_created += 1;
        Ok(surface)
    }

    fn subscribe_resize(&mut self) -> Result<ResizeSubscription, HostError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_subscribe.take() {
            return Err(err);
        }
        state.next_subscription += 1;
        let sub = ResizeSubscription(state.next_subscription);
        state.active.push(sub);
        Ok(sub)
    }

    fn unsubscribe_resize(&mut self, subscription: ResizeSubscription) {
        self.state.borrow_mut().active.retain(|s| *s != subscription);
    }
}

#[derive(Debug, Default)]
struct SchedulerState {
    next: u64,
    pending: Vec<FrameHandle>,
    cancelled: Vec<FrameHandle>,
    requested: u64,
}

/// Frame scheduler driven by the test instead of a display.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl ManualScheduler {
    /// Pop the oldest pending frame, as the display would when it fires.
    pub fn fire(&self) -> Option<FrameHandle> {
        let mut state = self.state.borrow_mut();
        if state.pending.is_empty() {
            None
        } else {
            Some(state.pending.remove(0))
        }
    }

    /// Frames requested and neither fired nor cancelled.
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Handles cancelled so far.
    pub fn cancelled(&self) -> Vec<FrameHandle> {
        self.state.borrow().cancelled.clone()
    }

    /// Total `request_frame` calls.
    pub fn requested(&self) -> u64 {
        self.state.borrow().requested
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        state.next += 1;
        state.requested += 1;
        let handle = FrameHandle(state.next);
        state.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(pos) = state.pending.iter().position(|h| *h == handle) {
            state.pending.remove(pos);
            state.cancelled.push(handle);
        }
    }
}

#[derive(Debug, Default)]
struct LoaderState {
    requests: Vec<LoadRequest>,
    abandoned: Vec<LoadTicket>,
}

/// Asset loader that records requests; the test delivers results.
#[derive(Debug, Clone, Default)]
pub struct ManualLoader {
    state: Rc<RefCell<LoaderState>>,
}

impl ManualLoader {
    /// Requests received, oldest first.
    pub fn requests(&self) -> Vec<LoadRequest> {
        self.state.borrow().requests.clone()
    }

    /// Ticket of the most recent request.
    pub fn last_ticket(&self) -> Option<LoadTicket> {
        self.state.borrow().requests.last().map(|r| r.ticket)
    }

    /// Tickets the controller abandoned.
    pub fn abandoned(&self) -> Vec<LoadTicket> {
        self.state.borrow().abandoned.clone()
    }
}

impl AssetLoader for ManualLoader {
    fn load(&mut self, request: LoadRequest) {
        self.state.borrow_mut().requests.push(request);
    }

    fn abandon(&mut self, ticket: LoadTicket) {
        self.state.borrow_mut().abandoned.push(ticket);
    }
}

/// Single-triangle model, standing in for a decoded asset.
pub fn triangle_node() -> SceneNode {
    SceneNode {
        name: Some(String::from("triangle")),
        meshes: vec![Mesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: Vec::new(),
            indices: vec![0, 1, 2],
            material: Default::default(),
        }],
        ..SceneNode::default()
    }
}

/// Fire up to `frames` pending frames, 16 ms apart. Returns how many fired.
#[allow(clippy::cast_precision_loss)]
pub fn pump_frames<H, L>(
    controller: &mut SceneController<H, ManualScheduler, L>,
    display: &ManualScheduler,
    frames: usize,
) -> Result<usize, ControllerError>
where
    H: ViewportHost,
    L: AssetLoader,
{
    let mut fired = 0;
    while fired < frames {
        let Some(handle) = display.fire() else {
            break;
        };
        controller.tick(handle, fired as f64 * 16.0)?;
        fired += 1;
    }
    Ok(fired)
}
