// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use diorama_core::HostEvent;
use diorama_scene::{LoadError, LoadTicket, SceneNode};

/// Event to deliver for a finished fetch, or `None` when the controller
/// abandoned the request itself.
///
/// An abort the controller did not ask for (the browser cancelling the fetch,
/// say) is still a failed load and must reach the controller.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn load_outcome(
    ticket: LoadTicket,
    result: Result<SceneNode, LoadError>,
    abandoned: bool,
) -> Option<HostEvent> {
    if abandoned {
        return None;
    }
    Some(match result {
        Ok(node) => HostEvent::AssetLoaded { ticket, node },
        Err(error) => HostEvent::AssetLoadFailed { ticket, error },
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]
    use super::*;

    #[test]
    fn abandoned_request_delivers_nothing() {
        let ticket = LoadTicket::new(1);
        assert!(load_outcome(ticket, Ok(SceneNode::default()), true).is_none());
        assert!(load_outcome(ticket, Err(LoadError::Aborted), true).is_none());
    }

    #[test]
    fn foreign_abort_is_reported_as_failure() {
        let ticket = LoadTicket::new(3);
        match load_outcome(ticket, Err(LoadError::Aborted), false) {
            Some(HostEvent::AssetLoadFailed { ticket: t, error }) => {
                assert_eq!(t, ticket);
                assert_eq!(error, LoadError::Aborted);
            }
            other => panic!("expected a failure event, got {other:?}"),
        }
    }

    #[test]
    fn success_carries_the_node() {
        let ticket = LoadTicket::new(2);
        let node = SceneNode::named("model");
        match load_outcome(ticket, Ok(node), false) {
            Some(HostEvent::AssetLoaded { ticket: t, node }) => {
                assert_eq!(t, ticket);
                assert_eq!(node.name.as_deref(), Some("model"));
            }
            other => panic!("expected a loaded event, got {other:?}"),
        }
    }
}
