// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `fetch`-based asset loader.

use std::rc::Rc;

use diorama_core::HostEvent;
use diorama_gltf::decode_glb;
use diorama_scene::{AssetLoader, LoadError, LoadRequest, LoadTicket, SceneNode};
use tracing::{debug, info, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, AbortSignal, RequestInit, Response, Window};

use crate::dispatch::{js_error_string, Dispatcher};
use crate::outcome::load_outcome;

/// Fetches and decodes `.glb` assets. One request in flight at a time.
pub(crate) struct FetchLoader {
    window: Window,
    dispatch: Rc<Dispatcher>,
    inflight: Option<(LoadTicket, AbortController)>,
}

impl FetchLoader {
    pub fn new(window: Window, dispatch: Rc<Dispatcher>) -> Self {
        Self {
            window,
            dispatch,
            inflight: None,
        }
    }
}

impl AssetLoader for FetchLoader {
    fn load(&mut self, request: LoadRequest) {
        let LoadRequest { ticket, source } = request;
        let url = source.as_str().to_owned();

        let abort = match AbortController::new() {
            Ok(abort) => abort,
            Err(err) => {
                let error = fetch_failure(&url, &err);
                let dispatch = Rc::clone(&self.dispatch);
                wasm_bindgen_futures::spawn_local(async move {
                    dispatch.deliver(HostEvent::AssetLoadFailed { ticket, error });
                });
                return;
            }
        };
        let signal = abort.signal();
        if let Some((_, previous)) = self.inflight.replace((ticket, abort)) {
            previous.abort();
        }

        let window = self.window.clone();
        let dispatch = Rc::clone(&self.dispatch);
        info!(%url, "fetching asset");
        wasm_bindgen_futures::spawn_local(async move {
            let result = fetch_and_decode(&window, &url, &signal).await;
            match load_outcome(ticket, result, signal.aborted()) {
                Some(event) => dispatch.deliver(event),
                None => debug!(%url, "load abandoned; result dropped"),
            }
        });
    }

    fn abandon(&mut self, ticket: LoadTicket) {
        if self.inflight.as_ref().is_some_and(|(t, _)| *t == ticket) {
            if let Some((_, abort)) = self.inflight.take() {
                abort.abort();
            }
        }
    }
}

async fn fetch_and_decode(
    window: &Window,
    url: &str,
    signal: &AbortSignal,
) -> Result<SceneNode, LoadError> {
    let init = RequestInit::new();
    init.set_method("GET");
    init.set_signal(Some(signal));

    let fetched = JsFuture::from(window.fetch_with_str_and_init(url, &init))
        .await
        .map_err(|err| fetch_failure(url, &err))?;
    let response: Response = fetched
        .dyn_into()
        .map_err(|err| fetch_failure(url, &err))?;
    if !response.ok() {
        return Err(LoadError::Fetch {
            url: url.to_owned(),
            reason: format!("HTTP {} {}", response.status(), response.status_text()),
        });
    }

    let body = response
        .array_buffer()
        .map_err(|err| fetch_failure(url, &err))?;
    let body = JsFuture::from(body)
        .await
        .map_err(|err| fetch_failure(url, &err))?;
    let bytes = js_sys::Uint8Array::new(&body).to_vec();
    debug!(%url, bytes = bytes.len(), "asset downloaded");

    decode_glb(&bytes).map_err(|err| {
        warn!(%url, %err, "asset failed to decode");
        LoadError::from(err)
    })
}

fn fetch_failure(url: &str, err: &JsValue) -> LoadError {
    if is_abort(err) {
        return LoadError::Aborted;
    }
    LoadError::Fetch {
        url: url.to_owned(),
        reason: js_error_string(err),
    }
}

fn is_abort(err: &JsValue) -> bool {
    err.dyn_ref::<web_sys::DomException>()
        .is_some_and(|exception| exception.name() == "AbortError")
}
