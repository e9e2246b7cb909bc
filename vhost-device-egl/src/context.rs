// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

use std::{
    fmt, mem, ptr,
    sync::{Arc, Mutex},
};

use log::trace;

use crate::{
    backend::{BackendContext, ClientApi, ClientContext},
    config::Config,
    display::Display,
    protocol::*,
    resource::{acquire, gen_handle, HostHandle, Resource},
    surface::Surface,
};

#[derive(Default)]
struct BoundSurfaces {
    draw: Option<Arc<Surface>>,
    read: Option<Arc<Surface>>,
}

/// A rendering context. Fields drop in declaration order, so the backend
/// context is torn down before the client context that sits on top of it.
pub struct Context {
    handle: HostHandle,
    // Looked up through the process state, a context never keeps its
    // display alive.
    display: HostHandle,
    surfaces: Mutex<BoundSurfaces>,
    config: Arc<Config>,
    backend: Box<dyn BackendContext>,
    client: Box<dyn ClientContext>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("handle", &self.handle)
            .field("config", &self.config.handle())
            .field("client_api", &self.client.client_api())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates the backend context for `config`, optionally sharing objects
    /// with `share`. On failure the client context is handed back to the
    /// caller.
    pub fn create(
        dpy: &Display,
        config: &Arc<Config>,
        client: Box<dyn ClientContext>,
        share: Option<&Context>,
    ) -> Result<Self, Box<dyn ClientContext>> {
        let Some(backend) = dpy.backend().create_context(
            config.native(),
            client.client_api(),
            share.map(|ctx| ctx.backend.as_ref()),
        ) else {
            return Err(client);
        };

        let handle = gen_handle();
        trace!("Context {handle} created ({:?})", client.client_api());
        Ok(Self {
            handle,
            display: dpy.handle(),
            surfaces: Mutex::new(BoundSurfaces::default()),
            config: config.clone(),
            backend,
            client,
        })
    }

    /// Handle of the display the context was created on.
    pub const fn display_handle(&self) -> HostHandle {
        self.display
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn backend(&self) -> &dyn BackendContext {
        self.backend.as_ref()
    }

    pub fn client(&self) -> &dyn ClientContext {
        self.client.as_ref()
    }

    pub fn draw(&self) -> Option<Arc<Surface>> {
        acquire(self.surfaces.lock().unwrap().draw.as_ref())
    }

    pub fn read(&self) -> Option<Arc<Surface>> {
        acquire(self.surfaces.lock().unwrap().read.as_ref())
    }

    /// Rebinds the draw and read surfaces. The previous surfaces are released
    /// after the lock is dropped, so their destroy step never runs under it.
    pub fn update_surfaces(&self, draw: Option<&Arc<Surface>>, read: Option<&Arc<Surface>>) {
        let draw = acquire(draw);
        let read = acquire(read);

        let (old_draw, old_read) = {
            let mut bound = self.surfaces.lock().unwrap();
            (
                mem::replace(&mut bound.draw, draw),
                mem::replace(&mut bound.read, read),
            )
        };

        drop(old_draw);
        drop(old_read);
    }

    pub fn uses_surface(&self, surface: &Surface) -> bool {
        let bound = self.surfaces.lock().unwrap();
        let used = bound
            .draw
            .iter()
            .chain(bound.read.iter())
            .any(|sfc| ptr::eq(sfc.as_ref(), surface));
        used
    }

    /// `eglQueryContext`.
    pub fn query(&self, attribute: i32) -> EglResult<i32> {
        let api = self.client.client_api();
        let value = match attribute {
            EGL_CONFIG_ID => self.config.config_id(),
            EGL_CONTEXT_CLIENT_TYPE => match api {
                ClientApi::Gles1 | ClientApi::Gles2 => EGL_OPENGL_ES_API,
                ClientApi::OpenGl => EGL_OPENGL_API,
                ClientApi::OpenVg => EGL_OPENVG_API,
            },
            EGL_CONTEXT_CLIENT_VERSION => match api {
                ClientApi::Gles1 => 1,
                ClientApi::Gles2 => 2,
                ClientApi::OpenGl | ClientApi::OpenVg => 0,
            },
            EGL_RENDER_BUFFER => self
                .surfaces
                .lock()
                .unwrap()
                .draw
                .as_ref()
                .map_or(EGL_NONE, |sfc| sfc.kind().render_buffer()),
            _ => return Err(EglError::BadAttribute),
        };
        Ok(value)
    }
}

impl Resource for Context {
    fn handle(&self) -> HostHandle {
        self.handle
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let bound = self.surfaces.get_mut().unwrap();
        debug_assert!(
            bound.draw.is_none() && bound.read.is_none(),
            "context {} destroyed while surfaces are still bound",
            self.handle
        );
        trace!("Context {} destroyed", self.handle);
    }
}
