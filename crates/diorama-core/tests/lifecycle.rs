// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Activation, load, frame loop and teardown driven through headless adapters.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use approx::assert_relative_eq;
use core::f32::consts::PI;
use diorama_core::testing::{pump_frames, triangle_node, ManualLoader, ManualScheduler, MockViewport};
use diorama_core::{AssetStatus, ControllerError, LoopPolicy, Phase, SceneController, SceneSettings};
use diorama_scene::{
    HostError, Light, LoadError, RenderSurface, SurfaceError, Transform, ViewportHost,
    ViewportSize,
};
use glam::{EulerRot, Vec3};

type Controller = SceneController<MockViewport, ManualScheduler, ManualLoader>;

struct Rig {
    ctrl: Controller,
    display: ManualScheduler,
    loader: ManualLoader,
}

fn rig(policy: LoopPolicy) -> Rig {
    let display = ManualScheduler::default();
    let loader = ManualLoader::default();
    let settings = SceneSettings {
        loop_policy: policy,
        ..SceneSettings::default()
    };
    Rig {
        ctrl: SceneController::new(settings, display.clone(), loader.clone()),
        display,
        loader,
    }
}

fn fetch_error() -> LoadError {
    LoadError::Fetch {
        url: "./assets/model/gaming_room.glb".into(),
        reason: "404 Not Found".into(),
    }
}

// =============================================================================
// Full lifecycle
// =============================================================================

#[test]
fn load_render_resize_teardown() {
    let Rig {
        mut ctrl,
        display,
        loader,
    } = rig(LoopPolicy::AfterLoad);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");
    let surface = viewport.surface();

    ctrl.on_asset_loaded(loader.last_ticket().expect("ticket"), triangle_node());
    assert_eq!(ctrl.phase(), Phase::Running);
    assert_eq!(pump_frames(&mut ctrl, &display, 3).expect("frames"), 3);

    let size = viewport.set_size(1200, 400);
    ctrl.on_viewport_resized(size.width, size.height)
        .expect("resize");
    assert_eq!(surface.render_count(), 3, "resize must not render while looping");
    assert_eq!(pump_frames(&mut ctrl, &display, 1).expect("frame"), 1);

    let renders = surface.renders();
    assert_eq!(renders.len(), 4);
    for early in &renders[..3] {
        assert_eq!(early.aspect, 800.0 / 600.0);
        assert_eq!(early.size, ViewportSize::new(800, 600));
    }
    assert_eq!(renders[3].aspect, 3.0);
    assert_eq!(renders[3].size, ViewportSize::new(1200, 400));
    assert_eq!(renders[3].nodes, 1);
    assert_eq!(renders[3].lights, 2);

    let pending = ctrl.frame_handle().expect("loop running");
    ctrl.deactivate();
    assert_eq!(ctrl.phase(), Phase::Stopped);
    assert!(!ctrl.is_live());
    assert_eq!(ctrl.frame_handle(), None);
    assert_eq!(display.pending_count(), 0);
    assert_eq!(display.cancelled(), vec![pending]);
    assert_eq!(viewport.active_subscriptions(), 0);
    assert_eq!(surface.dispose_calls(), 1);
    assert!(ctrl.surface().is_none());
    assert!(loader.abandoned().is_empty(), "resolved load is not abandoned");
}

#[test]
fn same_aspect_resize_still_resizes_surface() {
    let Rig {
        mut ctrl,
        display,
        loader,
    } = rig(LoopPolicy::AfterLoad);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");
    let surface = viewport.surface();

    ctrl.on_asset_loaded(loader.last_ticket().expect("ticket"), triangle_node());
    assert_eq!(pump_frames(&mut ctrl, &display, 3).expect("frames"), 3);
    let size = viewport.set_size(400, 300);
    ctrl.on_viewport_resized(size.width, size.height)
        .expect("resize");
    assert_eq!(pump_frames(&mut ctrl, &display, 1).expect("frame"), 1);

    let renders = surface.renders();
    assert_eq!(renders.len(), 4);
    assert!(renders[..3]
        .iter()
        .all(|r| r.size == ViewportSize::new(800, 600)));
    assert_eq!(renders[3].size, ViewportSize::new(400, 300));
    assert_relative_eq!(renders[3].aspect, 400.0 / 300.0);
    assert_eq!(surface.resizes(), vec![ViewportSize::new(400, 300)]);

    ctrl.deactivate();
    assert_eq!(ctrl.frame_handle(), None);
    assert_eq!(ctrl.phase(), Phase::Stopped);
    assert_eq!(surface.dispose_calls(), 1);
}

#[test]
fn loaded_model_gets_fixed_transform_and_two_lights() {
    let Rig {
        mut ctrl, loader, ..
    } = rig(LoopPolicy::AfterLoad);
    ctrl.activate(MockViewport::new(640, 480)).expect("activate");
    ctrl.on_asset_loaded(loader.last_ticket().expect("ticket"), triangle_node());

    let expected = Transform::from_scale_position_euler(
        Vec3::new(4.0, 3.9, 4.0),
        Vec3::new(0.0, -5.0, 0.0),
        Vec3::new(0.0, -PI / 3.5, 0.0),
    );
    let scene = ctrl.scene().expect("scene");
    assert_eq!(scene.nodes().len(), 1);
    let placed = scene.nodes()[0].transform;
    assert_eq!(placed.scale, Vec3::new(4.0, 3.9, 4.0));
    assert_eq!(placed.translation, Vec3::new(0.0, -5.0, 0.0));
    assert!(placed.rotation.abs_diff_eq(expected.rotation, 1e-6));
    let (_, yaw, _) = placed.rotation.to_euler(EulerRot::XYZ);
    assert_relative_eq!(yaw, -PI / 3.5, epsilon = 1e-6);

    assert_eq!(scene.lights().len(), 2);
    let Light::Ambient(ambient) = scene.lights()[0] else {
        panic!("first light is ambient");
    };
    assert_eq!(ambient.color, [1.0, 1.0, 1.0]);
    assert_relative_eq!(ambient.intensity, 2.5);
    let Light::Directional(sun) = scene.lights()[1] else {
        panic!("second light is directional");
    };
    assert_eq!(sun.color, [1.0, 1.0, 1.0]);
    assert_relative_eq!(sun.intensity, 1.0);
    let dir = Vec3::new(-0.5, -1.0, -0.5).normalize();
    assert_relative_eq!(sun.direction().x, dir.x, epsilon = 1e-6);
    assert_relative_eq!(sun.direction().y, dir.y, epsilon = 1e-6);
    assert_relative_eq!(sun.direction().z, dir.z, epsilon = 1e-6);
    assert_eq!(scene.nodes()[0].name.as_deref(), Some("triangle"));
    assert_eq!(ctrl.asset_status(), Some(&AssetStatus::Loaded));
}

#[test]
fn duplicate_load_result_is_ignored() {
    let Rig {
        mut ctrl, loader, ..
    } = rig(LoopPolicy::AfterLoad);
    ctrl.activate(MockViewport::new(640, 480)).expect("activate");
    let ticket = loader.last_ticket().expect("ticket");
    ctrl.on_asset_loaded(ticket, triangle_node());
    ctrl.on_asset_loaded(ticket, triangle_node());
    ctrl.on_asset_load_failed(ticket, fetch_error())
        .expect("ignored");

    assert_eq!(ctrl.scene().map(|s| s.nodes().len()), Some(1));
    assert_eq!(ctrl.asset_status(), Some(&AssetStatus::Loaded));
}

// =============================================================================
// Liveness
// =============================================================================

#[test]
fn deactivate_before_load_resolves_discards_result() {
    let Rig {
        mut ctrl,
        display,
        loader,
    } = rig(LoopPolicy::AfterLoad);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");
    let ticket = loader.last_ticket().expect("ticket");

    ctrl.deactivate();
    assert_eq!(loader.abandoned(), vec![ticket]);

    ctrl.on_asset_loaded(ticket, triangle_node());
    assert_eq!(ctrl.scene().map(|s| s.nodes().len()), Some(0));
    assert_eq!(display.requested(), 0, "late result must not start the loop");
    assert_eq!(ctrl.phase(), Phase::Stopped);

    ctrl.on_asset_load_failed(ticket, fetch_error())
        .expect("late failure is ignored");
    assert_eq!(viewport.surface().render_count(), 0);
}

#[test]
fn deactivate_is_idempotent() {
    let Rig { mut ctrl, .. } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");
    ctrl.deactivate();
    ctrl.deactivate();
    assert_eq!(viewport.surface().dispose_calls(), 1);
    assert_eq!(viewport.active_subscriptions(), 0);
}

#[test]
fn deactivate_without_activate_is_noop() {
    let Rig {
        mut ctrl,
        display,
        loader,
    } = rig(LoopPolicy::AfterLoad);
    ctrl.deactivate();
    assert_eq!(ctrl.phase(), Phase::Idle);
    assert!(display.cancelled().is_empty());
    assert!(loader.abandoned().is_empty());
}

#[test]
fn frame_after_deactivate_does_not_render() {
    let Rig {
        mut ctrl, display, ..
    } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");
    let handle = ctrl.frame_handle().expect("pending");

    ctrl.deactivate();
    assert!(display.fire().is_none());
    ctrl.tick(handle, 16.0).expect("ignored");
    assert_eq!(viewport.surface().render_count(), 0);
}

#[test]
fn stale_frame_handle_is_ignored() {
    let Rig {
        mut ctrl, display, ..
    } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");

    let first = display.fire().expect("pending");
    ctrl.tick(first, 0.0).expect("frame");
    ctrl.tick(first, 1.0).expect("stale");
    assert_eq!(viewport.surface().render_count(), 1);
    assert_eq!(display.pending_count(), 1, "exactly one frame outstanding");
}

#[test]
fn dropping_controller_tears_down() {
    let Rig { mut ctrl, .. } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");
    drop(ctrl);
    assert_eq!(viewport.surface().dispose_calls(), 1);
    assert_eq!(viewport.active_subscriptions(), 0);
}

// =============================================================================
// Re-activation
// =============================================================================

#[test]
fn activate_twice_is_rejected() {
    let Rig { mut ctrl, .. } = rig(LoopPolicy::AfterLoad);
    ctrl.activate(MockViewport::new(800, 600)).expect("activate");
    let second = MockViewport::new(800, 600);
    let err = ctrl.activate(second.clone()).expect_err("already active");
    assert!(matches!(err, ControllerError::AlreadyActive(Phase::Loading)));
    assert_eq!(second.surfaces_created(), 0);
}

#[test]
fn reactivation_discards_previous_tickets_and_frames() {
    let Rig {
        mut ctrl,
        display,
        loader,
    } = rig(LoopPolicy::Immediate);
    let first = MockViewport::new(800, 600);
    ctrl.activate(first.clone()).expect("activate");
    let old_ticket = loader.last_ticket().expect("ticket");
    let old_frame = ctrl.frame_handle().expect("pending");
    ctrl.deactivate();

    let second = MockViewport::new(400, 400);
    ctrl.activate(second.clone()).expect("reactivate");
    assert_eq!(ctrl.activation(), 2);
    assert_eq!(ctrl.frames_submitted(), 0);
    assert_ne!(loader.last_ticket(), Some(old_ticket));

    ctrl.on_asset_loaded(old_ticket, triangle_node());
    assert_eq!(ctrl.scene().map(|s| s.nodes().len()), Some(0));
    ctrl.tick(old_frame, 0.0).expect("stale");
    assert_eq!(second.surface().render_count(), 0);

    assert_eq!(pump_frames(&mut ctrl, &display, 2).expect("frames"), 2);
    assert_eq!(second.surface().render_count(), 2);
    assert_eq!(first.surface().render_count(), 0);
    assert_eq!(ctrl.camera().map(|c| c.aspect), Some(1.0));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn load_failure_after_load_policy_shows_lit_empty_scene() {
    let Rig {
        mut ctrl,
        display,
        loader,
    } = rig(LoopPolicy::AfterLoad);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");

    ctrl.on_asset_load_failed(loader.last_ticket().expect("ticket"), fetch_error())
        .expect("still frame");
    assert!(ctrl.is_live());
    assert_eq!(ctrl.phase(), Phase::Loading);
    assert!(!ctrl.is_looping());
    assert_eq!(display.requested(), 0);
    assert!(matches!(
        ctrl.asset_status(),
        Some(AssetStatus::Failed(LoadError::Fetch { .. }))
    ));

    let surface = viewport.surface();
    assert_eq!(surface.render_count(), 1);
    assert_eq!(surface.renders()[0].nodes, 0);
    assert_eq!(surface.renders()[0].lights, 2);

    ctrl.on_viewport_resized(1000, 500).expect("resize");
    assert_eq!(surface.render_count(), 2, "resize repaints the still frame");
    assert_eq!(surface.renders()[1].aspect, 2.0);
}

#[test]
fn load_failure_immediate_policy_keeps_looping() {
    let Rig {
        mut ctrl,
        display,
        loader,
    } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");

    ctrl.on_asset_load_failed(loader.last_ticket().expect("ticket"), LoadError::Decode("bad magic".into()))
        .expect("failure");
    assert_eq!(ctrl.phase(), Phase::Running);
    assert_eq!(viewport.surface().render_count(), 0, "loop draws, not the failure path");
    assert_eq!(pump_frames(&mut ctrl, &display, 2).expect("frames"), 2);
    assert_eq!(viewport.surface().render_count(), 2);
}

#[test]
fn surface_init_failure_leaves_nothing_behind() {
    let Rig {
        mut ctrl,
        display,
        loader,
    } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    viewport.fail_surface_with(SurfaceError::Unavailable("no webgpu".into()));

    let err = ctrl.activate(viewport.clone()).expect_err("surface");
    assert!(matches!(
        err,
        ControllerError::SurfaceInit(SurfaceError::Unavailable(_))
    ));
    assert_eq!(ctrl.phase(), Phase::Stopped);
    assert!(!ctrl.is_live());
    assert!(loader.requests().is_empty());
    assert_eq!(display.requested(), 0);
    assert_eq!(viewport.active_subscriptions(), 0);
}

#[test]
fn zero_sized_viewport_cannot_activate() {
    let Rig { mut ctrl, loader, .. } = rig(LoopPolicy::AfterLoad);
    let err = ctrl
        .activate(MockViewport::new(0, 600))
        .expect_err("zero size");
    assert!(matches!(
        err,
        ControllerError::SurfaceInit(SurfaceError::ZeroSize {
            width: 0,
            height: 600
        })
    ));
    assert!(loader.requests().is_empty());
}

#[test]
fn subscribe_failure_rolls_back_surface() {
    let Rig { mut ctrl, loader, .. } = rig(LoopPolicy::AfterLoad);
    let viewport = MockViewport::new(800, 600);
    viewport.fail_subscribe_with(HostError::Subscribe("observer unsupported".into()));

    let err = ctrl.activate(viewport.clone()).expect_err("subscribe");
    assert!(matches!(err, ControllerError::Host(HostError::Subscribe(_))));
    assert_eq!(viewport.surface().dispose_calls(), 1);
    assert_eq!(ctrl.phase(), Phase::Stopped);
    assert!(loader.requests().is_empty());

    ctrl.activate(viewport.clone()).expect("retry succeeds");
    assert_eq!(viewport.surfaces_created(), 2);
}

#[test]
fn render_failure_halts_loop() {
    let Rig {
        mut ctrl, display, ..
    } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");
    viewport.surface().fail_next_render(SurfaceError::OutOfMemory);

    let err = pump_frames(&mut ctrl, &display, 1).expect_err("render");
    assert!(matches!(err, ControllerError::Surface(SurfaceError::OutOfMemory)));
    assert!(!ctrl.is_looping());
    assert_eq!(display.pending_count(), 0);

    ctrl.deactivate();
    assert_eq!(viewport.surface().dispose_calls(), 1);
}

#[test]
fn resize_failure_is_reported() {
    let Rig { mut ctrl, .. } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");
    viewport
        .surface()
        .fail_next_resize(SurfaceError::Device("lost".into()));

    let err = ctrl.on_viewport_resized(400, 400).expect_err("resize");
    assert!(matches!(err, ControllerError::Surface(SurfaceError::Device(_))));
    assert_eq!(ctrl.camera().map(|c| c.aspect), Some(800.0 / 600.0));
}

// =============================================================================
// Resize
// =============================================================================

#[test]
fn collapsed_resize_keeps_previous_size() {
    let Rig { mut ctrl, .. } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");

    ctrl.on_viewport_resized(0, 600).expect("ignored");
    ctrl.on_viewport_resized(800, 0).expect("ignored");
    assert_eq!(ctrl.camera().map(|c| c.aspect), Some(800.0 / 600.0));
    assert!(viewport.surface().resizes().is_empty());
    assert_eq!(viewport.surface().size(), ViewportSize::new(800, 600));
}

#[test]
fn resize_after_deactivate_is_ignored() {
    let Rig { mut ctrl, .. } = rig(LoopPolicy::Immediate);
    let viewport = MockViewport::new(800, 600);
    ctrl.activate(viewport.clone()).expect("activate");
    ctrl.deactivate();
    ctrl.on_viewport_resized(100, 100).expect("ignored");
    assert!(viewport.surface().resizes().is_empty());
}

#[test]
fn host_reports_its_own_size() {
    let viewport = MockViewport::new(320, 200);
    let size = viewport.set_size(640, 400);
    assert_eq!(viewport.size(), size);
}
