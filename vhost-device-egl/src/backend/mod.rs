// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

//! Capability traits implemented by the native host graphics backend and by
//! the client API libraries (GLES1, GLES2, OpenVG, OpenGL).
//!
//! Backend objects are owned through `Box`/`Arc` and torn down when dropped.

pub mod null;

use std::{fmt, sync::Arc};

use crate::{
    config::NativeConfig,
    image::BufferId,
    protocol::{EGL_OPENGL_BIT, EGL_OPENGL_ES2_BIT, EGL_OPENGL_ES_BIT, EGL_OPENVG_BIT},
    surface::SurfaceKind,
};

/// A client API a context can be created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientApi {
    Gles1,
    Gles2,
    OpenVg,
    OpenGl,
}

impl ClientApi {
    pub const ALL: [Self; 4] = [Self::Gles1, Self::Gles2, Self::OpenVg, Self::OpenGl];

    /// The `EGL_RENDERABLE_TYPE` bit advertising this API.
    pub const fn renderable_bit(self) -> i32 {
        match self {
            Self::Gles1 => EGL_OPENGL_ES_BIT,
            Self::Gles2 => EGL_OPENGL_ES2_BIT,
            Self::OpenVg => EGL_OPENVG_BIT,
            Self::OpenGl => EGL_OPENGL_BIT,
        }
    }
}

/// Entry point of the native backend.
pub trait EglBackend: Send + Sync {
    fn create_display(&self) -> Option<Arc<dyn BackendDisplay>>;

    /// Binds `ctx` with the given surfaces on the calling thread.
    fn make_current(
        &self,
        dpy: &dyn BackendDisplay,
        ctx: &dyn BackendContext,
        draw: &dyn BackendSurface,
        read: &dyn BackendSurface,
    ) -> bool;

    /// Unbinds whatever is current on the calling thread. `force` is set on
    /// thread teardown, where the backend must not fail.
    fn release_current(&self, force: bool) -> bool;
}

/// A native display connection.
pub trait BackendDisplay: Send + Sync {
    /// Lists every native config. Each one is later handed back exactly once,
    /// either to [`BackendDisplay::config_cleanup`] directly when it is
    /// filtered out, or when the `Config` wrapping it is destroyed.
    fn config_enum(&self) -> Vec<NativeConfig>;
    fn config_cleanup(&self, cfg: &NativeConfig);

    fn create_context(
        &self,
        cfg: &NativeConfig,
        client_api: ClientApi,
        share: Option<&dyn BackendContext>,
    ) -> Option<Box<dyn BackendContext>>;

    fn create_surface(
        &self,
        cfg: &NativeConfig,
        kind: &SurfaceKind,
        width: u32,
        height: u32,
    ) -> Option<Box<dyn BackendSurface>>;

    fn create_image(&self, buffer_id: BufferId) -> Option<Box<dyn BackendImage>>;
}

/// A native rendering context. Dropping it destroys the host context.
pub trait BackendContext: Send + Sync {}

/// A native drawable.
pub trait BackendSurface: Send + Sync {
    /// Answers surface attributes the core layer does not compute itself,
    /// such as `EGL_WIDTH` and `EGL_HEIGHT`.
    fn query(&self, attribute: i32) -> Option<i32>;

    /// Binds the color buffer of a texture-capable pbuffer to the texture of
    /// the current context.
    fn bind_tex_image(&self) -> bool;
    fn release_tex_image(&self) -> bool;
}

/// A native image created from an external buffer.
pub trait BackendImage: Send + Sync {
    /// The client API's view of this image, if one was created.
    fn client_image(&self) -> Option<Arc<dyn ClientImage>>;
}

/// A registered client API library.
pub trait ClientInterface: Send + Sync {
    fn create_context(&self, share: Option<&dyn ClientContext>) -> Option<Box<dyn ClientContext>>;
}

/// Client-API state attached to a [`crate::context::Context`].
#[cfg_attr(test, mockall::automock)]
pub trait ClientContext: Send + Sync {
    fn client_api(&self) -> ClientApi;
    /// Called before the context stops being current.
    fn flush(&self);
    fn activate(&self);
    fn deactivate(&self);
}

impl fmt::Debug for dyn ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("client_api", &self.client_api())
            .finish_non_exhaustive()
    }
}

/// A client API texture source backed by an [`crate::image::Image`].
pub trait ClientImage: Send + Sync {}
