// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `tracing` output routed to the browser console.

use tracing::Level;
use tracing_web::MakeWebConsoleWriter;

/// Install the console subscriber. Later calls are no-ops.
///
/// Each event goes to the `console` method matching its level.
pub(crate) fn init() {
    let max_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(MakeWebConsoleWriter::new())
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_max_level(max_level)
        .try_init();
}
