// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

//! Host side of the guest EGL entry points.
//!
//! Every operation validates its handles against the process state, reports
//! failures as [`EglError`] and records them as the thread's pending error.

use std::sync::Arc;

use log::{debug, error, trace, warn};

use crate::{
    backend::{ClientApi, ClientImage},
    config::{ConfigCriteria, ConfigSelection},
    context::Context,
    display::{Display, DisplayId},
    image::BufferId,
    process::ProcessState,
    protocol::*,
    resource::{HostHandle, Resource},
    surface::{PbufferAttribs, Surface, SurfaceKind},
    thread::ThreadState,
};

/// Picks the client API of a new context from the bound API and the
/// `eglCreateContext` attribute list.
fn context_client_api(bound_api: i32, attrib_list: &[i32]) -> EglResult<ClientApi> {
    let mut version = 1;

    for pair in attrib_list.chunks(2) {
        let attrib = pair[0];
        if attrib == EGL_NONE {
            break;
        }
        let value = *pair.get(1).ok_or(EglError::BadAttribute)?;

        match attrib {
            EGL_CONTEXT_CLIENT_VERSION if bound_api == EGL_OPENGL_ES_API => version = value,
            _ => return Err(EglError::BadAttribute),
        }
    }

    match bound_api {
        EGL_OPENGL_ES_API => match version {
            1 => Ok(ClientApi::Gles1),
            2 => Ok(ClientApi::Gles2),
            _ => Err(EglError::BadAttribute),
        },
        EGL_OPENVG_API => Ok(ClientApi::OpenVg),
        EGL_OPENGL_API => Ok(ClientApi::OpenGl),
        _ => Err(EglError::BadMatch),
    }
}

fn window_attribs(attrib_list: &[i32]) -> EglResult<()> {
    for pair in attrib_list.chunks(2) {
        let attrib = pair[0];
        if attrib == EGL_NONE {
            break;
        }
        match (attrib, pair.get(1)) {
            (EGL_RENDER_BUFFER, Some(&(EGL_BACK_BUFFER | EGL_SINGLE_BUFFER))) => {}
            _ => return Err(EglError::BadAttribute),
        }
    }
    Ok(())
}

fn pixmap_attribs(attrib_list: &[i32]) -> EglResult<()> {
    match attrib_list.first() {
        None | Some(&EGL_NONE) => Ok(()),
        Some(_) => Err(EglError::BadAttribute),
    }
}

/// The EGL calls of one guest thread.
pub struct HostEglCalls {
    // Dropped first, the thread releases its context before the process
    // state goes away.
    ts: ThreadState,
    ps: Arc<ProcessState>,
}

impl HostEglCalls {
    pub fn new(ps: Arc<ProcessState>) -> Self {
        Self {
            ts: ThreadState::new(ps.backend().clone()),
            ps,
        }
    }

    pub fn process(&self) -> &Arc<ProcessState> {
        &self.ps
    }

    pub const fn thread(&self) -> &ThreadState {
        &self.ts
    }

    fn call<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> EglResult<T>) -> EglResult<T> {
        let res = f(self);
        if let Err(e) = &res {
            error!("{name}: {e}");
            self.ts.set_error(*e);
        }
        res
    }

    fn lookup_display(&self, dpy: HostHandle) -> EglResult<Arc<Display>> {
        self.ps.display_by_handle(dpy).ok_or(EglError::BadDisplay)
    }

    fn validate_display(&self, dpy: HostHandle) -> EglResult<Arc<Display>> {
        let display = self.lookup_display(dpy)?;
        if !display.is_initialized() {
            return Err(EglError::NotInitialized);
        }
        Ok(display)
    }

    /// `eglGetError`
    pub fn get_error(&mut self) -> i32 {
        self.ts.take_error()
    }

    /// `eglBindAPI`
    pub fn bind_api(&mut self, api: i32) -> EglResult<()> {
        self.call("bind_api", |this| match api {
            EGL_OPENGL_ES_API | EGL_OPENVG_API | EGL_OPENGL_API => {
                this.ts.set_api(api);
                Ok(())
            }
            _ => Err(EglError::BadParameter),
        })
    }

    /// `eglQueryAPI`
    pub const fn query_api(&self) -> i32 {
        self.ts.api()
    }

    /// `eglGetDisplay`. Returns `None` (`EGL_NO_DISPLAY`) when the backend
    /// cannot open a display, no error is recorded.
    pub fn get_display(&self, display_id: DisplayId) -> Option<HostHandle> {
        let handle = self.ps.find_or_create_display(display_id)?.handle();
        trace!("display id {display_id:#x} -> {handle}");
        Some(handle)
    }

    /// `eglInitialize`, returns the EGL version.
    pub fn initialize(&mut self, dpy: HostHandle) -> EglResult<(i32, i32)> {
        self.call("initialize", |this| {
            let display = this.lookup_display(dpy)?;
            display.initialize(this.ps.renderable_type());
            Ok((EGL_VERSION_MAJOR, EGL_VERSION_MINOR))
        })
    }

    pub fn is_initialized(&mut self, dpy: HostHandle) -> EglResult<bool> {
        self.call("is_initialized", |this| {
            Ok(this.lookup_display(dpy)?.is_initialized())
        })
    }

    /// `eglTerminate`. Objects current on some thread stay alive until they
    /// are released there.
    pub fn terminate(&mut self, dpy: HostHandle) -> EglResult<()> {
        self.call("terminate", |this| {
            this.lookup_display(dpy)?.terminate();
            Ok(())
        })
    }

    /// `eglGetConfigs`. With no output array only the total count is
    /// returned.
    pub fn get_configs(
        &mut self,
        dpy: HostHandle,
        max: Option<usize>,
    ) -> EglResult<(usize, Vec<HostHandle>)> {
        self.call("get_configs", |this| {
            let display = this.validate_display(dpy)?;
            Ok(match max {
                Some(max) => {
                    let handles = display.config_handles(max);
                    (handles.len(), handles)
                }
                None => (display.config_count(), Vec::new()),
            })
        })
    }

    /// `eglChooseConfig`
    pub fn choose_config(
        &mut self,
        dpy: HostHandle,
        attrib_list: &[i32],
        max: Option<usize>,
    ) -> EglResult<(usize, Vec<HostHandle>)> {
        self.call("choose_config", |this| {
            let display = this.validate_display(dpy)?;
            match ConfigCriteria::from_attrib_list(attrib_list)? {
                ConfigSelection::ById(id) => {
                    let cfg = display
                        .acquire_config_by_id(id)
                        .ok_or(EglError::BadAttribute)?;
                    Ok((1, vec![cfg.handle()]))
                }
                ConfigSelection::Match(criteria) => {
                    let chosen =
                        display.choose_configs(&criteria, max.unwrap_or(0), max.is_none());
                    debug!("chosen {} configs", chosen.0);
                    Ok(chosen)
                }
            }
        })
    }

    /// `eglGetConfigAttrib`
    pub fn get_config_attrib(
        &mut self,
        dpy: HostHandle,
        config: HostHandle,
        attribute: i32,
    ) -> EglResult<i32> {
        self.call("get_config_attrib", |this| {
            let cfg = this
                .validate_display(dpy)?
                .acquire_config(config)
                .ok_or(EglError::BadConfig)?;
            cfg.get_attrib(attribute).ok_or(EglError::BadAttribute)
        })
    }

    /// `eglCreateContext`. `share` is `0` for `EGL_NO_CONTEXT`.
    pub fn create_context(
        &mut self,
        dpy: HostHandle,
        config: HostHandle,
        share: HostHandle,
        attrib_list: &[i32],
    ) -> EglResult<HostHandle> {
        self.call("create_context", |this| {
            let api = context_client_api(this.ts.api(), attrib_list)?;
            let display = this.validate_display(dpy)?;
            let cfg = display.acquire_config(config).ok_or(EglError::BadConfig)?;
            let share = match share {
                0 => None,
                handle => Some(
                    display
                        .acquire_context(handle)
                        .ok_or(EglError::BadContext)?,
                ),
            };

            let iface = this
                .ps
                .client_interface(api)
                .ok_or(EglError::BadAttribute)?;
            let client = iface
                .create_context(share.as_ref().map(|ctx| ctx.client()))
                .ok_or(EglError::BadAlloc)?;
            let ctx = display
                .create_context(&cfg, client, share.as_deref())
                .map_err(|_| EglError::BadMatch)?;
            debug!("created context {} for {api:?}", ctx.handle());
            Ok(ctx.handle())
        })
    }

    /// `eglDestroyContext`. A context current on this thread is destroyed
    /// once it is released.
    pub fn destroy_context(&mut self, dpy: HostHandle, ctx: HostHandle) -> EglResult<()> {
        self.call("destroy_context", |this| {
            if this.validate_display(dpy)?.remove_context(ctx) {
                Ok(())
            } else {
                Err(EglError::BadContext)
            }
        })
    }

    /// `eglQueryContext`
    pub fn query_context(
        &mut self,
        dpy: HostHandle,
        ctx: HostHandle,
        attribute: i32,
    ) -> EglResult<i32> {
        self.call("query_context", |this| {
            this.validate_display(dpy)?
                .acquire_context(ctx)
                .ok_or(EglError::BadContext)?
                .query(attribute)
        })
    }

    fn create_surface(
        &self,
        dpy: HostHandle,
        config: HostHandle,
        kind: SurfaceKind,
        size: (u32, u32),
        failure: EglError,
    ) -> EglResult<HostHandle> {
        let display = self.validate_display(dpy)?;
        let cfg = display.acquire_config(config).ok_or(EglError::BadConfig)?;
        if cfg.native().surface_type & kind.type_bit() == 0 {
            return Err(EglError::BadMatch);
        }
        let sfc = display
            .create_surface(&cfg, kind, size.0, size.1)
            .ok_or(failure)?;
        Ok(sfc.handle())
    }

    /// `eglCreateWindowSurface`
    pub fn create_window_surface(
        &mut self,
        dpy: HostHandle,
        config: HostHandle,
        width: u32,
        height: u32,
        attrib_list: &[i32],
    ) -> EglResult<HostHandle> {
        self.call("create_window_surface", |this| {
            window_attribs(attrib_list)?;
            this.create_surface(
                dpy,
                config,
                SurfaceKind::Window,
                (width, height),
                EglError::BadNativeWindow,
            )
        })
    }

    /// `eglCreatePbufferSurface`
    pub fn create_pbuffer_surface(
        &mut self,
        dpy: HostHandle,
        config: HostHandle,
        width: u32,
        height: u32,
        attrib_list: &[i32],
    ) -> EglResult<HostHandle> {
        self.call("create_pbuffer_surface", |this| {
            let attribs = PbufferAttribs::from_attrib_list(attrib_list)?;
            this.create_surface(
                dpy,
                config,
                SurfaceKind::Pbuffer(attribs),
                (width, height),
                EglError::BadAlloc,
            )
        })
    }

    /// `eglCreatePixmapSurface`
    pub fn create_pixmap_surface(
        &mut self,
        dpy: HostHandle,
        config: HostHandle,
        width: u32,
        height: u32,
        attrib_list: &[i32],
    ) -> EglResult<HostHandle> {
        self.call("create_pixmap_surface", |this| {
            pixmap_attribs(attrib_list)?;
            this.create_surface(
                dpy,
                config,
                SurfaceKind::Pixmap,
                (width, height),
                EglError::BadNativePixmap,
            )
        })
    }

    /// `eglDestroySurface`
    pub fn destroy_surface(&mut self, dpy: HostHandle, surface: HostHandle) -> EglResult<()> {
        self.call("destroy_surface", |this| {
            if this.validate_display(dpy)?.remove_surface(surface) {
                Ok(())
            } else {
                Err(EglError::BadSurface)
            }
        })
    }

    /// `eglQuerySurface`, see [`crate::surface::Surface::query`].
    pub fn query_surface(
        &mut self,
        dpy: HostHandle,
        surface: HostHandle,
        attribute: i32,
    ) -> EglResult<Option<i32>> {
        self.call("query_surface", |this| {
            this.validate_display(dpy)?
                .acquire_surface(surface)
                .ok_or(EglError::BadSurface)?
                .query(attribute)
        })
    }

    /// `eglSurfaceAttrib`. Only the handles are checked, the attribute is
    /// accepted and ignored.
    pub fn surface_attrib(
        &mut self,
        dpy: HostHandle,
        surface: HostHandle,
        attribute: i32,
        value: i32,
    ) -> EglResult<()> {
        self.call("surface_attrib", |this| {
            this.validate_display(dpy)?
                .acquire_surface(surface)
                .ok_or(EglError::BadSurface)?;
            trace!("surface {surface}: ignoring attribute {attribute:#x} = {value:#x}");
            Ok(())
        })
    }

    /// Looks up a pbuffer whose color buffer can be bound as a texture.
    fn tex_image_surface(
        &self,
        dpy: HostHandle,
        surface: HostHandle,
        buffer: i32,
    ) -> EglResult<Arc<Surface>> {
        let sfc = self
            .validate_display(dpy)?
            .acquire_surface(surface)
            .ok_or(EglError::BadSurface)?;
        if buffer != EGL_BACK_BUFFER {
            return Err(EglError::BadParameter);
        }
        match sfc.kind() {
            SurfaceKind::Pbuffer(attribs)
                if attribs.tex_format == EGL_NO_TEXTURE
                    || attribs.tex_target == EGL_NO_TEXTURE =>
            {
                Err(EglError::BadMatch)
            }
            SurfaceKind::Pbuffer(_) => Ok(sfc),
            SurfaceKind::Window | SurfaceKind::Pixmap => Err(EglError::BadSurface),
        }
    }

    /// `eglBindTexImage`. Without a current context there is no texture to
    /// bind to and the call succeeds without doing anything.
    pub fn bind_tex_image(
        &mut self,
        dpy: HostHandle,
        surface: HostHandle,
        buffer: i32,
    ) -> EglResult<()> {
        if self.ts.context().is_none() {
            warn!("bind_tex_image: no current context");
            return Ok(());
        }

        self.call("bind_tex_image", |this| {
            let sfc = this.tex_image_surface(dpy, surface, buffer)?;
            if sfc.backend().bind_tex_image() {
                Ok(())
            } else {
                Err(EglError::BadAccess)
            }
        })
    }

    /// `eglReleaseTexImage`
    pub fn release_tex_image(
        &mut self,
        dpy: HostHandle,
        surface: HostHandle,
        buffer: i32,
    ) -> EglResult<()> {
        self.call("release_tex_image", |this| {
            let sfc = this.tex_image_surface(dpy, surface, buffer)?;
            if sfc.backend().release_tex_image() {
                Ok(())
            } else {
                Err(EglError::BadAccess)
            }
        })
    }

    /// `eglCreateImageKHR` for a guest buffer.
    pub fn create_image(&mut self, dpy: HostHandle, buffer_id: BufferId) -> EglResult<HostHandle> {
        self.call("create_image", |this| {
            let image = this
                .validate_display(dpy)?
                .create_image(buffer_id)
                .ok_or(EglError::BadAlloc)?;
            Ok(image.handle())
        })
    }

    /// `eglDestroyImageKHR`
    pub fn destroy_image(&mut self, dpy: HostHandle, image: HostHandle) -> EglResult<()> {
        self.call("destroy_image", |this| {
            if this.validate_display(dpy)?.remove_image(image) {
                Ok(())
            } else {
                Err(EglError::BadParameter)
            }
        })
    }

    /// Looks up `image` on the display of the current context for a client
    /// API that wants to sample from it.
    pub fn acquire_client_image(&self, image: HostHandle) -> Option<Arc<dyn ClientImage>> {
        let ctx = self.ts.context()?;
        self.ps
            .display_by_handle(ctx.display_handle())?
            .acquire_image(image)?
            .client_image()
    }

    /// `eglMakeCurrent`. Handles are `0` for `EGL_NO_CONTEXT` and
    /// `EGL_NO_SURFACE`.
    pub fn make_current(
        &mut self,
        dpy: HostHandle,
        draw: HostHandle,
        read: HostHandle,
        ctx: HostHandle,
    ) -> EglResult<()> {
        self.call("make_current", |this| this.do_make_current(dpy, draw, read, ctx))
    }

    fn do_make_current(
        &mut self,
        dpy: HostHandle,
        draw: HostHandle,
        read: HostHandle,
        ctx: HostHandle,
    ) -> EglResult<()> {
        let no_surface = draw == 0 || read == 0;
        let any_surface = draw != 0 || read != 0;
        if (ctx != 0 && no_surface) || (ctx == 0 && any_surface) {
            return Err(EglError::BadMatch);
        }

        if ctx == 0 {
            if self.ts.context().is_none() {
                return Ok(());
            }
            if dpy != 0 {
                self.lookup_display(dpy)?;
            }
            return if self.release_current_context() {
                Ok(())
            } else {
                Err(EglError::BadAccess)
            };
        }

        let display = self.validate_display(dpy)?;
        let ctx = display.acquire_context(ctx).ok_or(EglError::BadContext)?;
        let draw = display.acquire_surface(draw).ok_or(EglError::BadSurface)?;
        let read = display.acquire_surface(read).ok_or(EglError::BadSurface)?;

        let prev = self.ts.context().cloned();
        let changed = !prev.as_ref().is_some_and(|p| Arc::ptr_eq(p, &ctx));

        if let Some(prev) = &prev {
            prev.client().flush();
            if changed {
                prev.client().deactivate();
            }
        }

        let backend = self.ps.backend();
        if !backend.make_current(
            display.backend().as_ref(),
            ctx.backend(),
            draw.backend(),
            read.backend(),
        ) {
            if let Some(prev) = prev.as_ref().filter(|_| changed) {
                prev.client().activate();
            }
            return Err(EglError::BadAccess);
        }

        ctx.update_surfaces(Some(&draw), Some(&read));
        self.ts.update_context(Some(&ctx));

        if changed {
            ctx.client().activate();
            if let Some(prev) = prev {
                prev.update_surfaces(None, None);
            }
        }
        trace!("context {} is current", ctx.handle());
        Ok(())
    }

    /// Unbinds the current context. Returns false, with the context still
    /// current, when the backend refuses.
    fn release_current_context(&mut self) -> bool {
        let Some(ctx) = self.ts.context().cloned() else {
            return true;
        };

        ctx.client().flush();
        ctx.client().deactivate();
        if !self.ps.backend().release_current(false) {
            ctx.client().activate();
            return false;
        }

        ctx.update_surfaces(None, None);
        self.ts.update_context(None);
        trace!("context {} released", ctx.handle());
        true
    }

    /// `eglReleaseThread`
    pub fn release_thread(&mut self) -> EglResult<()> {
        self.call("release_thread", |this| {
            if !this.release_current_context() {
                return Err(EglError::BadAccess);
            }
            this.ts.reset();
            Ok(())
        })
    }

    /// The context current on this thread, if any.
    pub fn current_context(&self) -> Option<&Arc<Context>> {
        self.ts.context()
    }
}
