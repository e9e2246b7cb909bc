// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

use std::{mem, sync::Arc};

use log::{trace, warn};

use crate::{
    backend::EglBackend,
    context::Context,
    protocol::{EglError, EGL_OPENGL_ES_API, EGL_SUCCESS},
    resource::acquire,
};

/// Per-thread EGL state. Owned by its thread, so it needs no locking.
pub struct ThreadState {
    backend: Arc<dyn EglBackend>,
    api: i32,
    context: Option<Arc<Context>>,
    error: i32,
}

impl ThreadState {
    pub fn new(backend: Arc<dyn EglBackend>) -> Self {
        Self {
            backend,
            api: EGL_OPENGL_ES_API,
            context: None,
            error: EGL_SUCCESS,
        }
    }

    /// The client API bound with `eglBindAPI`.
    pub const fn api(&self) -> i32 {
        self.api
    }

    pub fn set_api(&mut self, api: i32) {
        self.api = api;
    }

    pub fn context(&self) -> Option<&Arc<Context>> {
        self.context.as_ref()
    }

    /// Makes `ctx` the thread's current context. The previous one is released
    /// after the swap.
    pub fn update_context(&mut self, ctx: Option<&Arc<Context>>) {
        let prev = mem::replace(&mut self.context, acquire(ctx));
        drop(prev);
    }

    /// Records `err` unless an earlier error has not been read yet.
    pub fn set_error(&mut self, err: EglError) {
        if self.error == EGL_SUCCESS {
            self.error = err.code();
        }
    }

    /// Returns the pending error code and clears it.
    pub fn take_error(&mut self) -> i32 {
        mem::replace(&mut self.error, EGL_SUCCESS)
    }

    /// Restores the default client API. The current context is left alone.
    pub fn reset(&mut self) {
        self.api = EGL_OPENGL_ES_API;
    }

    /// Thread teardown. Unbinds the current context at the backend, which is
    /// not allowed to fail here, then detaches and releases it.
    pub fn fini(&mut self) {
        let Some(ctx) = self.context.clone() else {
            return;
        };

        trace!("Thread exits with a current context, releasing it");
        if !self.backend.release_current(true) {
            warn!("Backend failed to force-release the current context");
        }
        ctx.update_surfaces(None, None);
        drop(ctx);
        self.update_context(None);
    }
}

impl Drop for ThreadState {
    fn drop(&mut self) {
        self.fini();
    }
}
