// Null backend
// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

use std::sync::Arc;

use log::trace;

use super::{
    BackendContext, BackendDisplay, BackendImage, BackendSurface, ClientApi, ClientContext,
    ClientImage, ClientInterface, EglBackend,
};
use crate::{
    config::NativeConfig,
    image::BufferId,
    protocol::{EGL_HEIGHT, EGL_WIDTH},
    surface::SurfaceKind,
};

const MAX_PBUFFER_DIM: i32 = 4096;

/// A backend that creates every object it is asked for and renders nothing.
/// It advertises a fixed set of configs so the config machinery can be
/// exercised without a host GPU.
pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        trace!("NullBackend created");
        Self
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EglBackend for NullBackend {
    fn create_display(&self) -> Option<Arc<dyn BackendDisplay>> {
        trace!("NullBackend::create_display");
        Some(Arc::new(NullDisplay))
    }

    fn make_current(
        &self,
        _dpy: &dyn BackendDisplay,
        _ctx: &dyn BackendContext,
        _draw: &dyn BackendSurface,
        _read: &dyn BackendSurface,
    ) -> bool {
        trace!("NullBackend::make_current - no-op");
        true
    }

    fn release_current(&self, force: bool) -> bool {
        trace!("NullBackend::release_current(force: {force}) - no-op");
        true
    }
}

fn native_config(config_id: i32, rgb: (i32, i32, i32), alpha: i32, ds: (i32, i32)) -> NativeConfig {
    let (red_size, green_size, blue_size) = (rgb.0, rgb.1, rgb.2);
    NativeConfig {
        red_size,
        green_size,
        blue_size,
        alpha_size: alpha,
        buffer_size: red_size + green_size + blue_size + alpha,
        config_id,
        depth_size: ds.0,
        stencil_size: ds.1,
        max_pbuffer_width: MAX_PBUFFER_DIM,
        max_pbuffer_height: MAX_PBUFFER_DIM,
        max_pbuffer_size: MAX_PBUFFER_DIM * MAX_PBUFFER_DIM,
        max_swap_interval: 1,
        min_swap_interval: 1,
        driver_data: u64::try_from(config_id).unwrap_or_default(),
        ..Default::default()
    }
}

pub struct NullDisplay;

impl BackendDisplay for NullDisplay {
    fn config_enum(&self) -> Vec<NativeConfig> {
        let mut configs = Vec::new();
        let mut id = 1;
        for ds in [(0, 0), (16, 0), (24, 0), (24, 8)] {
            configs.push(native_config(id, (8, 8, 8), 8, ds));
            configs.push(native_config(id + 1, (5, 6, 5), 0, ds));
            id += 2;
        }
        trace!("NullDisplay::config_enum - {} configs", configs.len());
        configs
    }

    fn config_cleanup(&self, _cfg: &NativeConfig) {}

    fn create_context(
        &self,
        _cfg: &NativeConfig,
        client_api: ClientApi,
        _share: Option<&dyn BackendContext>,
    ) -> Option<Box<dyn BackendContext>> {
        trace!("NullDisplay::create_context({client_api:?})");
        Some(Box::new(NullContext))
    }

    fn create_surface(
        &self,
        _cfg: &NativeConfig,
        kind: &SurfaceKind,
        width: u32,
        height: u32,
    ) -> Option<Box<dyn BackendSurface>> {
        trace!("NullDisplay::create_surface({kind:?}, {width}x{height})");
        Some(Box::new(NullSurface { width, height }))
    }

    fn create_image(&self, buffer_id: BufferId) -> Option<Box<dyn BackendImage>> {
        trace!("NullDisplay::create_image({buffer_id})");
        Some(Box::new(NullImage {
            client: Arc::new(NullClientImage),
        }))
    }
}

pub struct NullContext;

impl BackendContext for NullContext {}

pub struct NullSurface {
    width: u32,
    height: u32,
}

impl BackendSurface for NullSurface {
    fn query(&self, attribute: i32) -> Option<i32> {
        match attribute {
            EGL_WIDTH => i32::try_from(self.width).ok(),
            EGL_HEIGHT => i32::try_from(self.height).ok(),
            _ => None,
        }
    }

    fn bind_tex_image(&self) -> bool {
        trace!("NullSurface::bind_tex_image - no-op");
        true
    }

    fn release_tex_image(&self) -> bool {
        trace!("NullSurface::release_tex_image - no-op");
        true
    }
}

pub struct NullClientImage;

impl ClientImage for NullClientImage {}

pub struct NullImage {
    client: Arc<NullClientImage>,
}

impl BackendImage for NullImage {
    fn client_image(&self) -> Option<Arc<dyn ClientImage>> {
        Some(self.client.clone())
    }
}

/// Client API library stand-in, contexts it creates do nothing.
pub struct NullClientInterface {
    api: ClientApi,
}

impl NullClientInterface {
    pub const fn new(api: ClientApi) -> Self {
        Self { api }
    }
}

impl ClientInterface for NullClientInterface {
    fn create_context(&self, _share: Option<&dyn ClientContext>) -> Option<Box<dyn ClientContext>> {
        Some(Box::new(NullClientContext { api: self.api }))
    }
}

pub struct NullClientContext {
    api: ClientApi,
}

impl ClientContext for NullClientContext {
    fn client_api(&self) -> ClientApi {
        self.api
    }

    fn flush(&self) {
        trace!("NullClientContext::flush - no-op");
    }

    fn activate(&self) {}

    fn deactivate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{display::Display, protocol::EGL_OPENGL_ES2_BIT};

    #[test]
    fn test_null_display_configs() {
        let backend = NullBackend::new();
        let dpy = Display::create(&backend, 0).unwrap();
        dpy.initialize(EGL_OPENGL_ES2_BIT);

        // Only the RGBA8888 half of the synthetic set survives.
        assert_eq!(NullDisplay.config_enum().len(), 8);
        assert_eq!(dpy.config_count(), 4);
        let first = dpy.acquire_config(dpy.config_handles(1)[0]).unwrap();
        assert_eq!(first.native().depth_size, 0);
    }

    #[test]
    fn test_null_objects() {
        let backend = NullBackend::new();
        let dpy = backend.create_display().unwrap();
        let natives = dpy.config_enum();

        let sfc = dpy
            .create_surface(&natives[0], &SurfaceKind::Window, 640, 480)
            .unwrap();
        assert_eq!(sfc.query(EGL_WIDTH), Some(640));
        assert_eq!(sfc.query(EGL_HEIGHT), Some(480));
        assert!(sfc.bind_tex_image());
        assert!(sfc.release_tex_image());

        let ctx = dpy
            .create_context(&natives[0], ClientApi::Gles2, None)
            .unwrap();
        assert!(backend.make_current(dpy.as_ref(), ctx.as_ref(), sfc.as_ref(), sfc.as_ref()));
        assert!(backend.release_current(false));

        let image = dpy.create_image(1).unwrap();
        assert!(image.client_image().is_some());

        let client = NullClientInterface::new(ClientApi::OpenVg)
            .create_context(None)
            .unwrap();
        assert_eq!(client.client_api(), ClientApi::OpenVg);
    }
}
