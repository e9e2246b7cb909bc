// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

//! A counting fake backend. Every destroy step bumps a counter, and the calls
//! whose order matters are appended to an event log.

use std::sync::{Arc, Mutex};

use crate::{
    backend::{
        BackendContext, BackendDisplay, BackendImage, BackendSurface, ClientApi, ClientContext,
        ClientImage, ClientInterface, EglBackend,
    },
    config::{Config, NativeConfig},
    image::BufferId,
    protocol::{EGL_HEIGHT, EGL_OPENGL_ES2_BIT, EGL_OPENGL_ES_BIT, EGL_WIDTH},
    surface::SurfaceKind,
};

type DestroyHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct FakeState {
    natives: Vec<NativeConfig>,

    fail_display: bool,
    fail_context: bool,
    fail_surface: bool,
    fail_image: bool,
    fail_client_context: bool,
    fail_make_current: bool,
    fail_release_current: bool,
    fail_tex_image: bool,

    displays_created: usize,
    displays_destroyed: usize,
    config_enum_calls: usize,
    configs_cleaned: usize,
    contexts_destroyed: usize,
    client_contexts_destroyed: usize,
    surfaces_destroyed: usize,
    images_destroyed: usize,

    events: Vec<&'static str>,
    destroy_hook: Option<DestroyHook>,
}

/// An RGBA8888 config with the given depth and stencil sizes.
pub fn rgba8888(config_id: i32, depth_size: i32, stencil_size: i32) -> NativeConfig {
    NativeConfig {
        red_size: 8,
        green_size: 8,
        blue_size: 8,
        alpha_size: 8,
        buffer_size: 32,
        config_id,
        depth_size,
        stencil_size,
        max_pbuffer_width: 4096,
        max_pbuffer_height: 4096,
        max_pbuffer_size: 4096 * 4096,
        max_swap_interval: 1,
        min_swap_interval: 1,
        driver_data: u64::try_from(config_id).unwrap_or_default(),
        ..Default::default()
    }
}

fn default_natives() -> Vec<NativeConfig> {
    vec![
        rgba8888(1, 24, 8),
        rgba8888(2, 24, 0),
        NativeConfig {
            buffer_size: 16,
            red_size: 5,
            green_size: 6,
            blue_size: 5,
            config_id: 3,
            depth_size: 16,
            ..Default::default()
        },
        rgba8888(4, 16, 0),
        rgba8888(5, 0, 0),
        NativeConfig {
            samples_per_pixel: 4,
            ..rgba8888(6, 24, 8)
        },
    ]
}

/// Cheap to clone, all clones share the same counters and switches.
#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                natives: default_natives(),
                ..Default::default()
            })),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    fn record(&self, event: &'static str) {
        self.with_state(|s| s.events.push(event));
    }

    // The hook runs with the state unlocked, it may call back into the fake.
    fn destroyed(&self, f: impl FnOnce(&mut FakeState)) {
        let hook = self.with_state(|s| {
            f(s);
            s.destroy_hook.clone()
        });
        if let Some(hook) = hook {
            hook();
        }
    }

    /// A backend display that is not tied to any `Display`.
    pub fn display(&self) -> Arc<dyn BackendDisplay> {
        Arc::new(FakeDisplay { fake: self.clone() })
    }

    /// A standalone config built from the first RGBA8888 native config.
    pub fn first_config(&self) -> Arc<Config> {
        let native = self
            .with_state(|s| s.natives.iter().find(|n| n.is_rgba8888()).cloned())
            .expect("no RGBA8888 native config");
        Arc::new(Config::new(
            &self.display(),
            native,
            EGL_OPENGL_ES_BIT | EGL_OPENGL_ES2_BIT,
        ))
    }

    pub fn set_native_configs(&self, natives: Vec<NativeConfig>) {
        self.with_state(|s| s.natives = natives);
    }

    pub fn native_config_count(&self) -> usize {
        self.with_state(|s| s.natives.len())
    }

    pub fn set_destroy_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.with_state(|s| s.destroy_hook = Some(Arc::new(hook)));
    }

    pub fn fail_display_creation(&self, fail: bool) {
        self.with_state(|s| s.fail_display = fail);
    }

    pub fn fail_context_creation(&self, fail: bool) {
        self.with_state(|s| s.fail_context = fail);
    }

    pub fn fail_surface_creation(&self, fail: bool) {
        self.with_state(|s| s.fail_surface = fail);
    }

    pub fn fail_image_creation(&self, fail: bool) {
        self.with_state(|s| s.fail_image = fail);
    }

    pub fn fail_client_context_creation(&self, fail: bool) {
        self.with_state(|s| s.fail_client_context = fail);
    }

    pub fn fail_make_current(&self, fail: bool) {
        self.with_state(|s| s.fail_make_current = fail);
    }

    pub fn fail_release_current(&self, fail: bool) {
        self.with_state(|s| s.fail_release_current = fail);
    }

    pub fn fail_tex_image(&self, fail: bool) {
        self.with_state(|s| s.fail_tex_image = fail);
    }

    pub fn displays_created(&self) -> usize {
        self.with_state(|s| s.displays_created)
    }

    pub fn displays_destroyed(&self) -> usize {
        self.with_state(|s| s.displays_destroyed)
    }

    pub fn config_enum_calls(&self) -> usize {
        self.with_state(|s| s.config_enum_calls)
    }

    pub fn configs_cleaned(&self) -> usize {
        self.with_state(|s| s.configs_cleaned)
    }

    pub fn contexts_destroyed(&self) -> usize {
        self.with_state(|s| s.contexts_destroyed)
    }

    pub fn client_contexts_destroyed(&self) -> usize {
        self.with_state(|s| s.client_contexts_destroyed)
    }

    pub fn surfaces_destroyed(&self) -> usize {
        self.with_state(|s| s.surfaces_destroyed)
    }

    pub fn images_destroyed(&self) -> usize {
        self.with_state(|s| s.images_destroyed)
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.with_state(|s| s.events.clone())
    }

    pub fn clear_events(&self) {
        self.with_state(|s| s.events.clear());
    }
}

impl EglBackend for FakeBackend {
    fn create_display(&self) -> Option<Arc<dyn BackendDisplay>> {
        let created = self.with_state(|s| {
            if s.fail_display {
                return false;
            }
            s.displays_created += 1;
            true
        });
        created.then(|| self.display())
    }

    fn make_current(
        &self,
        _dpy: &dyn BackendDisplay,
        _ctx: &dyn BackendContext,
        _draw: &dyn BackendSurface,
        _read: &dyn BackendSurface,
    ) -> bool {
        self.record("make_current");
        !self.with_state(|s| s.fail_make_current)
    }

    fn release_current(&self, force: bool) -> bool {
        self.record(if force {
            "release_current(force)"
        } else {
            "release_current"
        });
        !self.with_state(|s| s.fail_release_current)
    }
}

pub struct FakeDisplay {
    fake: FakeBackend,
}

impl BackendDisplay for FakeDisplay {
    fn config_enum(&self) -> Vec<NativeConfig> {
        self.fake.with_state(|s| {
            s.config_enum_calls += 1;
            s.natives.clone()
        })
    }

    fn config_cleanup(&self, _cfg: &NativeConfig) {
        self.fake.destroyed(|s| s.configs_cleaned += 1);
    }

    fn create_context(
        &self,
        _cfg: &NativeConfig,
        _client_api: ClientApi,
        _share: Option<&dyn BackendContext>,
    ) -> Option<Box<dyn BackendContext>> {
        if self.fake.with_state(|s| s.fail_context) {
            return None;
        }
        Some(Box::new(FakeContext {
            fake: self.fake.clone(),
        }))
    }

    fn create_surface(
        &self,
        _cfg: &NativeConfig,
        _kind: &SurfaceKind,
        width: u32,
        height: u32,
    ) -> Option<Box<dyn BackendSurface>> {
        if self.fake.with_state(|s| s.fail_surface) {
            return None;
        }
        Some(Box::new(FakeSurface::new(&self.fake, width, height)))
    }

    fn create_image(&self, _buffer_id: BufferId) -> Option<Box<dyn BackendImage>> {
        if self.fake.with_state(|s| s.fail_image) {
            return None;
        }
        Some(Box::new(FakeImage {
            fake: self.fake.clone(),
            client: Arc::new(FakeClientImage),
        }))
    }
}

impl Drop for FakeDisplay {
    fn drop(&mut self) {
        self.fake.destroyed(|s| s.displays_destroyed += 1);
    }
}

pub struct FakeContext {
    fake: FakeBackend,
}

impl BackendContext for FakeContext {}

impl Drop for FakeContext {
    fn drop(&mut self) {
        self.fake.destroyed(|s| {
            s.contexts_destroyed += 1;
            s.events.push("context destroyed");
        });
    }
}

pub struct FakeSurface {
    fake: FakeBackend,
    width: u32,
    height: u32,
}

impl FakeSurface {
    pub fn new(fake: &FakeBackend, width: u32, height: u32) -> Self {
        Self {
            fake: fake.clone(),
            width,
            height,
        }
    }
}

impl BackendSurface for FakeSurface {
    fn query(&self, attribute: i32) -> Option<i32> {
        match attribute {
            EGL_WIDTH => i32::try_from(self.width).ok(),
            EGL_HEIGHT => i32::try_from(self.height).ok(),
            _ => None,
        }
    }

    fn bind_tex_image(&self) -> bool {
        self.fake.record("bind_tex_image");
        !self.fake.with_state(|s| s.fail_tex_image)
    }

    fn release_tex_image(&self) -> bool {
        self.fake.record("release_tex_image");
        !self.fake.with_state(|s| s.fail_tex_image)
    }
}

impl Drop for FakeSurface {
    fn drop(&mut self) {
        self.fake.destroyed(|s| {
            s.surfaces_destroyed += 1;
            s.events.push("surface destroyed");
        });
    }
}

pub struct FakeClientImage;

impl ClientImage for FakeClientImage {}

pub struct FakeImage {
    fake: FakeBackend,
    client: Arc<FakeClientImage>,
}

impl BackendImage for FakeImage {
    fn client_image(&self) -> Option<Arc<dyn ClientImage>> {
        Some(self.client.clone())
    }
}

impl Drop for FakeImage {
    fn drop(&mut self) {
        self.fake.destroyed(|s| {
            s.images_destroyed += 1;
            s.events.push("image destroyed");
        });
    }
}

pub struct FakeClientContext {
    fake: FakeBackend,
    api: ClientApi,
}

impl FakeClientContext {
    pub fn new(fake: &FakeBackend, api: ClientApi) -> Self {
        Self {
            fake: fake.clone(),
            api,
        }
    }
}

impl ClientContext for FakeClientContext {
    fn client_api(&self) -> ClientApi {
        self.api
    }

    fn flush(&self) {
        self.fake.record("flush");
    }

    fn activate(&self) {
        self.fake.record("activate");
    }

    fn deactivate(&self) {
        self.fake.record("deactivate");
    }
}

impl Drop for FakeClientContext {
    fn drop(&mut self) {
        self.fake.destroyed(|s| {
            s.client_contexts_destroyed += 1;
            s.events.push("client context destroyed");
        });
    }
}

pub struct FakeClientInterface {
    fake: FakeBackend,
    api: ClientApi,
}

impl FakeClientInterface {
    pub fn new(fake: &FakeBackend, api: ClientApi) -> Self {
        Self {
            fake: fake.clone(),
            api,
        }
    }
}

impl ClientInterface for FakeClientInterface {
    fn create_context(&self, _share: Option<&dyn ClientContext>) -> Option<Box<dyn ClientContext>> {
        if self.fake.with_state(|s| s.fail_client_context) {
            return None;
        }
        Some(Box::new(FakeClientContext::new(&self.fake, self.api)))
    }
}
