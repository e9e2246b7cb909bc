// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

//! A guest EGL display and the registries of everything created on it.
//!
//! All registries sit behind one mutex. Objects removed from a registry are
//! always released after that mutex is dropped, so destroy steps (which may
//! call into the backend) never run with the display locked.

use std::sync::{Arc, Mutex};

use log::{debug, trace};

use crate::{
    backend::{BackendDisplay, ClientContext, EglBackend},
    config::{self, Config, ConfigCriteria},
    context::Context,
    image::{BufferId, Image},
    resource::{HostHandle, Registry, Resource},
    surface::{Surface, SurfaceKind},
};

/// Guest side identifier passed to `eglGetDisplay`.
pub type DisplayId = u64;

#[derive(Default)]
struct DisplayInner {
    initialized: bool,
    configs: Registry<Config>,
    contexts: Registry<Context>,
    surfaces: Registry<Surface>,
    images: Registry<Image>,
}

pub struct Display {
    display_id: DisplayId,
    handle: HostHandle,
    inner: Mutex<DisplayInner>,
    backend: Arc<dyn BackendDisplay>,
}

impl Display {
    pub fn create(backend: &dyn EglBackend, display_id: DisplayId) -> Option<Self> {
        let backend_dpy = backend.create_display()?;
        let handle = crate::resource::gen_handle();
        trace!("Display {handle} created for display id {display_id:#x}");
        Some(Self {
            display_id,
            handle,
            inner: Mutex::new(DisplayInner::default()),
            backend: backend_dpy,
        })
    }

    pub const fn display_id(&self) -> DisplayId {
        self.display_id
    }

    pub const fn handle(&self) -> HostHandle {
        self.handle
    }

    pub fn backend(&self) -> &Arc<dyn BackendDisplay> {
        &self.backend
    }

    /// Enumerates and registers the configs. Does nothing if the display is
    /// already initialized.
    pub fn initialize(&self, renderable_type: i32) {
        let mut inner = self.inner.lock().unwrap();
        if inner.initialized {
            return;
        }

        for cfg in config::enumerate(&self.backend, renderable_type) {
            inner.configs.add(&cfg);
        }
        inner.initialized = true;
        debug!(
            "Display {} initialized with {} configs",
            self.handle,
            inner.configs.len()
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().unwrap().initialized
    }

    /// Drops the display's references to every object created on it. Objects
    /// still referenced elsewhere, like a thread's current context, live on
    /// until that reference goes away.
    pub fn terminate(&self) {
        let mut released: Registry<dyn Resource> = Registry::new();
        {
            let mut inner = self.inner.lock().unwrap();
            inner.images.move_all_erased(&mut released);
            inner.surfaces.move_all_erased(&mut released);
            inner.contexts.move_all_erased(&mut released);
            inner.configs.move_all_erased(&mut released);
            inner.initialized = false;
        }
        trace!("Display {} terminated, releasing {:?}", self.handle, released);
        released.cleanup();
    }

    pub fn config_count(&self) -> usize {
        self.inner.lock().unwrap().configs.len()
    }

    pub fn config_handles(&self, max: usize) -> Vec<HostHandle> {
        self.inner.lock().unwrap().configs.handles(max)
    }

    /// Returns the number of configs matching `criteria` and, unless
    /// `count_only` is set, the handles of the first `max` of them in
    /// selection order.
    pub fn choose_configs(
        &self,
        criteria: &ConfigCriteria,
        max: usize,
        count_only: bool,
    ) -> (usize, Vec<HostHandle>) {
        let inner = self.inner.lock().unwrap();
        let chosen = inner.configs.iter().filter(|cfg| cfg.is_chosen_by(criteria));
        if count_only {
            (chosen.count(), Vec::new())
        } else {
            let handles: Vec<_> = chosen.take(max).map(|cfg| cfg.handle()).collect();
            (handles.len(), handles)
        }
    }

    pub fn acquire_config(&self, handle: HostHandle) -> Option<Arc<Config>> {
        self.inner.lock().unwrap().configs.acquire(handle)
    }

    pub fn acquire_config_by_id(&self, config_id: i32) -> Option<Arc<Config>> {
        self.inner
            .lock()
            .unwrap()
            .configs
            .find(|cfg| cfg.config_id() == config_id)
    }

    /// Creates a context and registers it. On failure the client context is
    /// handed back.
    pub fn create_context(
        &self,
        config: &Arc<Config>,
        client: Box<dyn ClientContext>,
        share: Option<&Context>,
    ) -> Result<Arc<Context>, Box<dyn ClientContext>> {
        let ctx = Arc::new(Context::create(self, config, client, share)?);
        self.add_context(&ctx);
        Ok(ctx)
    }

    pub fn add_context(&self, ctx: &Arc<Context>) {
        self.inner.lock().unwrap().contexts.add(ctx);
    }

    pub fn acquire_context(&self, handle: HostHandle) -> Option<Arc<Context>> {
        self.inner.lock().unwrap().contexts.acquire(handle)
    }

    pub fn remove_context(&self, handle: HostHandle) -> bool {
        let removed = self.inner.lock().unwrap().contexts.remove(handle);
        removed.is_some()
    }

    pub fn create_surface(
        &self,
        config: &Arc<Config>,
        kind: SurfaceKind,
        width: u32,
        height: u32,
    ) -> Option<Arc<Surface>> {
        let backend_sfc = self
            .backend
            .create_surface(config.native(), &kind, width, height)?;
        let sfc = Arc::new(Surface::new(config, backend_sfc, kind));
        self.add_surface(&sfc);
        Some(sfc)
    }

    pub fn add_surface(&self, sfc: &Arc<Surface>) {
        self.inner.lock().unwrap().surfaces.add(sfc);
    }

    pub fn acquire_surface(&self, handle: HostHandle) -> Option<Arc<Surface>> {
        self.inner.lock().unwrap().surfaces.acquire(handle)
    }

    pub fn remove_surface(&self, handle: HostHandle) -> bool {
        let removed = self.inner.lock().unwrap().surfaces.remove(handle);
        removed.is_some()
    }

    pub fn create_image(&self, buffer_id: BufferId) -> Option<Arc<Image>> {
        let image = Arc::new(Image::create(self.backend.as_ref(), buffer_id)?);
        self.add_image(&image);
        Some(image)
    }

    pub fn add_image(&self, image: &Arc<Image>) {
        self.inner.lock().unwrap().images.add(image);
    }

    pub fn acquire_image(&self, handle: HostHandle) -> Option<Arc<Image>> {
        self.inner.lock().unwrap().images.acquire(handle)
    }

    pub fn remove_image(&self, handle: HostHandle) -> bool {
        let removed = self.inner.lock().unwrap().images.remove(handle);
        removed.is_some()
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.terminate();
        trace!("Display {} destroyed", self.handle);
    }
}
