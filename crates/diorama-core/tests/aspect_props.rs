// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Camera aspect and surface size follow the viewport through any resize sequence.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use diorama_core::testing::{pump_frames, ManualLoader, ManualScheduler, MockViewport};
use diorama_core::{LoopPolicy, SceneController, SceneSettings};
use diorama_scene::{RenderSurface, ViewportSize};
use proptest::prelude::*;

fn immediate() -> SceneSettings {
    SceneSettings {
        loop_policy: LoopPolicy::Immediate,
        ..SceneSettings::default()
    }
}

proptest! {
    #[test]
    fn aspect_matches_viewport_at_activation(width in 1u32..8192, height in 1u32..8192) {
        let mut ctrl: SceneController<MockViewport, _, _> =
            SceneController::new(immediate(), ManualScheduler::default(), ManualLoader::default());
        ctrl.activate(MockViewport::new(width, height)).expect("activate");
        let aspect = ctrl.camera().map(|c| c.aspect);
        prop_assert_eq!(aspect, Some(width as f32 / height as f32));
    }

    #[test]
    fn aspect_tracks_last_non_empty_resize(
        sizes in prop::collection::vec((0u32..4096, 0u32..4096), 1..32)
    ) {
        let display = ManualScheduler::default();
        let mut ctrl: SceneController<MockViewport, _, _> =
            SceneController::new(immediate(), display.clone(), ManualLoader::default());
        let viewport = MockViewport::new(800, 600);
        ctrl.activate(viewport.clone()).expect("activate");

        let mut expected = 800.0_f32 / 600.0;
        let mut expected_size = ViewportSize::new(800, 600);
        for (i, &(w, h)) in sizes.iter().enumerate() {
            ctrl.on_viewport_resized(w, h).expect("resize");
            if w > 0 && h > 0 {
                expected = w as f32 / h as f32;
                expected_size = ViewportSize::new(w, h);
            }
            if i % 3 == 0 {
                pump_frames(&mut ctrl, &display, 1).expect("frame");
            }
        }
        pump_frames(&mut ctrl, &display, 1).expect("frame");

        let renders = viewport.surface().renders();
        let last = renders.last().expect("at least one frame");
        prop_assert_eq!(last.aspect, expected);
        prop_assert_eq!(last.size, expected_size);
        prop_assert_eq!(viewport.surface().size(), expected_size);
        prop_assert_eq!(display.pending_count(), 1);
        prop_assert_eq!(ctrl.frames_submitted() as usize, renders.len());
    }
}
