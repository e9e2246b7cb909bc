// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

use std::{fmt, sync::Arc};

use log::trace;

use crate::{
    backend::{BackendDisplay, BackendImage, ClientImage},
    resource::{gen_handle, HostHandle, Resource},
};

/// Guest window-system identifier of a shared pixel buffer.
pub type BufferId = u32;

/// An EGLImage created from a guest buffer. Unlike contexts and surfaces it
/// does not reference a config.
pub struct Image {
    handle: HostHandle,
    buffer_id: BufferId,
    // Released before the backend image it was created from.
    client_image: Option<Arc<dyn ClientImage>>,
    backend: Box<dyn BackendImage>,
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("handle", &self.handle)
            .field("buffer_id", &self.buffer_id)
            .finish_non_exhaustive()
    }
}

impl Image {
    pub fn create(backend_dpy: &dyn BackendDisplay, buffer_id: BufferId) -> Option<Self> {
        let backend = backend_dpy.create_image(buffer_id)?;
        let handle = gen_handle();
        trace!("Image {handle} created for buffer {buffer_id}");
        Some(Self {
            handle,
            buffer_id,
            client_image: backend.client_image(),
            backend,
        })
    }

    pub const fn buffer_id(&self) -> BufferId {
        self.buffer_id
    }

    /// Takes a reference on the client API view of this image.
    pub fn client_image(&self) -> Option<Arc<dyn ClientImage>> {
        self.client_image.clone()
    }

    pub fn backend(&self) -> &dyn BackendImage {
        self.backend.as_ref()
    }
}

impl Resource for Image {
    fn handle(&self) -> HostHandle {
        self.handle
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        trace!("Image {} destroyed", self.handle);
    }
}
