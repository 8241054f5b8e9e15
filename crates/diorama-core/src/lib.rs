// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene lifecycle controller for Diorama viewports.
//! Keeps GPU, browser and decoder adapters thin and framework-agnostic.

pub mod controller;
pub mod settings;
pub mod testing;

pub use controller::{AssetStatus, ControllerError, HostEvent, Phase, SceneController};
pub use settings::{ConfigError, LoopPolicy, SceneSettings};
