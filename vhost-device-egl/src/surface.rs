// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

use std::{fmt, sync::Arc};

use log::trace;

use crate::{
    backend::BackendSurface,
    config::Config,
    protocol::*,
    resource::{gen_handle, HostHandle, Resource},
};

/// Pbuffer creation attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PbufferAttribs {
    pub largest: bool,
    pub tex_format: i32,
    pub tex_target: i32,
    pub tex_mipmap: bool,
}

impl Default for PbufferAttribs {
    fn default() -> Self {
        Self {
            largest: false,
            tex_format: EGL_NO_TEXTURE,
            tex_target: EGL_NO_TEXTURE,
            tex_mipmap: false,
        }
    }
}

impl PbufferAttribs {
    /// Parses an `eglCreatePbufferSurface` attribute list. `EGL_WIDTH` and
    /// `EGL_HEIGHT` are accepted but passed separately by the guest.
    pub fn from_attrib_list(attrib_list: &[i32]) -> EglResult<Self> {
        let mut attribs = Self::default();

        for pair in attrib_list.chunks(2) {
            let attrib = pair[0];
            if attrib == EGL_NONE {
                break;
            }
            let value = *pair.get(1).ok_or(EglError::BadAttribute)?;

            match attrib {
                EGL_LARGEST_PBUFFER => attribs.largest = value != 0,
                EGL_MIPMAP_TEXTURE => attribs.tex_mipmap = value != 0,
                EGL_TEXTURE_FORMAT => match value {
                    EGL_NO_TEXTURE | EGL_TEXTURE_RGB | EGL_TEXTURE_RGBA => {
                        attribs.tex_format = value
                    }
                    _ => return Err(EglError::BadAttribute),
                },
                EGL_TEXTURE_TARGET => match value {
                    EGL_NO_TEXTURE | EGL_TEXTURE_2D => attribs.tex_target = value,
                    _ => return Err(EglError::BadAttribute),
                },
                EGL_WIDTH | EGL_HEIGHT => {}
                _ => return Err(EglError::BadAttribute),
            }
        }

        Ok(attribs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    Window,
    Pixmap,
    Pbuffer(PbufferAttribs),
}

impl SurfaceKind {
    /// The `EGL_SURFACE_TYPE` bit a config needs for this kind.
    pub const fn type_bit(&self) -> i32 {
        match self {
            Self::Window => EGL_WINDOW_BIT,
            Self::Pixmap => EGL_PIXMAP_BIT,
            Self::Pbuffer(_) => EGL_PBUFFER_BIT,
        }
    }

    /// Value of `EGL_RENDER_BUFFER` for surfaces of this kind.
    pub const fn render_buffer(&self) -> i32 {
        match self {
            Self::Window | Self::Pbuffer(_) => EGL_BACK_BUFFER,
            Self::Pixmap => EGL_SINGLE_BUFFER,
        }
    }
}

pub struct Surface {
    handle: HostHandle,
    kind: SurfaceKind,
    backend: Box<dyn BackendSurface>,
    config: Arc<Config>,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .field("config", &self.config.handle())
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Wraps a backend surface created for `config`.
    pub fn new(config: &Arc<Config>, backend: Box<dyn BackendSurface>, kind: SurfaceKind) -> Self {
        let handle = gen_handle();
        trace!("Surface {handle} created ({kind:?})");
        Self {
            handle,
            kind,
            backend,
            config: config.clone(),
        }
    }

    pub const fn kind(&self) -> &SurfaceKind {
        &self.kind
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn backend(&self) -> &dyn BackendSurface {
        self.backend.as_ref()
    }

    /// `eglQuerySurface`. `Ok(None)` means the attribute does not apply to
    /// this kind of surface and nothing is written back to the guest.
    pub fn query(&self, attribute: i32) -> EglResult<Option<i32>> {
        let pbuffer = match &self.kind {
            SurfaceKind::Pbuffer(attribs) => Some(attribs),
            _ => None,
        };

        let value = match attribute {
            EGL_CONFIG_ID => self.config.config_id(),
            EGL_LARGEST_PBUFFER => return Ok(pbuffer.map(|p| i32::from(p.largest))),
            EGL_TEXTURE_FORMAT => return Ok(pbuffer.map(|p| p.tex_format)),
            EGL_TEXTURE_TARGET => return Ok(pbuffer.map(|p| p.tex_target)),
            EGL_MIPMAP_TEXTURE => return Ok(pbuffer.map(|p| i32::from(p.tex_mipmap))),
            EGL_MIPMAP_LEVEL => return Ok(pbuffer.map(|_| 0)),
            EGL_RENDER_BUFFER => self.kind.render_buffer(),
            EGL_HORIZONTAL_RESOLUTION | EGL_VERTICAL_RESOLUTION | EGL_PIXEL_ASPECT_RATIO => {
                EGL_UNKNOWN
            }
            EGL_SWAP_BEHAVIOR => EGL_BUFFER_PRESERVED,
            EGL_MULTISAMPLE_RESOLVE => EGL_MULTISAMPLE_RESOLVE_DEFAULT,
            _ => self
                .backend
                .query(attribute)
                .ok_or(EglError::BadAttribute)?,
        };

        Ok(Some(value))
    }
}

impl Resource for Surface {
    fn handle(&self) -> HostHandle {
        self.handle
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        trace!("Surface {} destroyed", self.handle);
    }
}
