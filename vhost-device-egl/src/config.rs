// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

//! Frame buffer configurations: enumeration from the backend, the EGL 1.4
//! selection order and attribute matching for `eglChooseConfig`.

use std::{cmp::Ordering, fmt, sync::Arc};

use log::{debug, trace};

use crate::{
    backend::BackendDisplay,
    protocol::*,
    resource::{gen_handle, HostHandle, Resource},
};

/// Pixel format description as reported by the backend. The surface type,
/// renderable type, conformant mask, sample buffer count and bind-to-texture
/// flags are overwritten when the config is registered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeConfig {
    pub red_size: i32,
    pub green_size: i32,
    pub blue_size: i32,
    pub alpha_size: i32,
    pub buffer_size: i32,
    pub caveat: i32,
    pub config_id: i32,
    pub frame_buffer_level: i32,
    pub depth_size: i32,
    pub max_pbuffer_width: i32,
    pub max_pbuffer_height: i32,
    pub max_pbuffer_size: i32,
    pub max_swap_interval: i32,
    pub min_swap_interval: i32,
    pub native_visual_id: i32,
    pub native_visual_type: i32,
    pub samples_per_pixel: i32,
    pub stencil_size: i32,
    pub transparent_type: i32,
    pub trans_red_val: i32,
    pub trans_green_val: i32,
    pub trans_blue_val: i32,
    pub surface_type: i32,
    pub native_renderable: i32,
    pub renderable_type: i32,
    pub conformant: i32,
    pub sample_buffers_num: i32,
    pub bind_to_texture_rgb: i32,
    pub bind_to_texture_rgba: i32,
    /// Backend private identifier of the native config.
    pub driver_data: u64,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            red_size: 0,
            green_size: 0,
            blue_size: 0,
            alpha_size: 0,
            buffer_size: 0,
            caveat: EGL_NONE,
            config_id: 0,
            frame_buffer_level: 0,
            depth_size: 0,
            max_pbuffer_width: 0,
            max_pbuffer_height: 0,
            max_pbuffer_size: 0,
            max_swap_interval: 0,
            min_swap_interval: 0,
            native_visual_id: 0,
            native_visual_type: 0,
            samples_per_pixel: 0,
            stencil_size: 0,
            transparent_type: EGL_NONE,
            trans_red_val: 0,
            trans_green_val: 0,
            trans_blue_val: 0,
            surface_type: 0,
            native_renderable: EGL_FALSE,
            renderable_type: 0,
            conformant: 0,
            sample_buffers_num: 0,
            bind_to_texture_rgb: EGL_FALSE,
            bind_to_texture_rgba: EGL_FALSE,
            driver_data: 0,
        }
    }
}

impl NativeConfig {
    /// Only RGBA8888 formats are exposed to the guest.
    pub fn is_rgba8888(&self) -> bool {
        self.buffer_size == 32
            && self.red_size == 8
            && self.green_size == 8
            && self.blue_size == 8
            && self.alpha_size == 8
    }

    /// EGL 1.4 config selection order, first differing key wins.
    pub fn selection_cmp(&self, other: &Self) -> Ordering {
        // Conformant configs first. Two different nonzero masks are equal here.
        (other.conformant != 0)
            .cmp(&(self.conformant != 0))
            // EGL_NONE < EGL_SLOW_CONFIG < EGL_NON_CONFORMANT_CONFIG
            .then(self.caveat.cmp(&other.caveat))
            .then(self.buffer_size.cmp(&other.buffer_size))
            .then(self.sample_buffers_num.cmp(&other.sample_buffers_num))
            .then(self.samples_per_pixel.cmp(&other.samples_per_pixel))
            .then(self.depth_size.cmp(&other.depth_size))
            .then(self.stencil_size.cmp(&other.stencil_size))
            .then(self.native_visual_type.cmp(&other.native_visual_type))
            .then(self.config_id.cmp(&other.config_id))
    }

    fn decorate(&mut self, renderable_type: i32) {
        self.surface_type = EGL_PBUFFER_BIT
            | EGL_PIXMAP_BIT
            | EGL_WINDOW_BIT
            | EGL_SWAP_BEHAVIOR_PRESERVED_BIT
            | EGL_LOCK_SURFACE_BIT_KHR
            | EGL_OPTIMAL_FORMAT_BIT_KHR;
        self.native_renderable = EGL_TRUE;
        self.renderable_type = renderable_type;
        let has_color = self.red_size + self.green_size + self.blue_size + self.alpha_size > 0;
        self.conformant = if has_color && self.caveat != EGL_NON_CONFORMANT_CONFIG {
            renderable_type
        } else {
            0
        };
        self.sample_buffers_num = i32::from(self.samples_per_pixel > 0);
        self.bind_to_texture_rgb = EGL_TRUE;
        self.bind_to_texture_rgba = EGL_TRUE;
    }
}

/// A config registered with a display.
pub struct Config {
    handle: HostHandle,
    native: NativeConfig,
    backend: Arc<dyn BackendDisplay>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("handle", &self.handle)
            .field("native", &self.native)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub(crate) fn new(
        backend: &Arc<dyn BackendDisplay>,
        mut native: NativeConfig,
        renderable_type: i32,
    ) -> Self {
        native.decorate(renderable_type);
        Self {
            handle: gen_handle(),
            native,
            backend: backend.clone(),
        }
    }

    pub const fn native(&self) -> &NativeConfig {
        &self.native
    }

    pub const fn config_id(&self) -> i32 {
        self.native.config_id
    }

    /// Whether this config satisfies every requirement in `criteria`.
    pub fn is_chosen_by(&self, criteria: &ConfigCriteria) -> bool {
        let cfg = &self.native;
        let q = criteria;

        let at_least = |want: i32, have: i32| want == EGL_DONT_CARE || want <= have;
        // Enumerated attributes are compared on their raw token values too,
        // EGL_DONT_CARE never collides with a token.
        let exact = |want: i32, have: i32| want == EGL_DONT_CARE || want == have;
        let mask = |want: i32, have: i32| want == EGL_DONT_CARE || want & have == want;

        at_least(q.red_size, cfg.red_size)
            && at_least(q.green_size, cfg.green_size)
            && at_least(q.blue_size, cfg.blue_size)
            && at_least(q.alpha_size, cfg.alpha_size)
            && at_least(q.buffer_size, cfg.buffer_size)
            && at_least(q.depth_size, cfg.depth_size)
            && at_least(q.stencil_size, cfg.stencil_size)
            && at_least(q.samples_per_pixel, cfg.samples_per_pixel)
            && at_least(q.sample_buffers_num, cfg.sample_buffers_num)
            && exact(q.frame_buffer_level, cfg.frame_buffer_level)
            && exact(q.config_id, cfg.config_id)
            && exact(q.native_visual_type, cfg.native_visual_type)
            && exact(q.max_swap_interval, cfg.max_swap_interval)
            && exact(q.min_swap_interval, cfg.min_swap_interval)
            && exact(q.trans_red_val, cfg.trans_red_val)
            && exact(q.trans_green_val, cfg.trans_green_val)
            && exact(q.trans_blue_val, cfg.trans_blue_val)
            && exact(q.caveat, cfg.caveat)
            && exact(q.native_renderable, cfg.native_renderable)
            && exact(q.transparent_type, cfg.transparent_type)
            && exact(q.bind_to_texture_rgb, cfg.bind_to_texture_rgb)
            && exact(q.bind_to_texture_rgba, cfg.bind_to_texture_rgba)
            && mask(q.surface_type, cfg.surface_type)
            && mask(q.conformant, cfg.conformant)
            && mask(q.renderable_type, cfg.renderable_type)
            && matches!(
                q.match_format_khr,
                EGL_DONT_CARE | EGL_FORMAT_RGBA_8888_EXACT_KHR | EGL_FORMAT_RGBA_8888_KHR
            )
    }

    /// Value of a config attribute for `eglGetConfigAttrib`.
    pub fn get_attrib(&self, attrib: i32) -> Option<i32> {
        let cfg = &self.native;
        let value = match attrib {
            EGL_BUFFER_SIZE => cfg.buffer_size,
            EGL_RED_SIZE => cfg.red_size,
            EGL_GREEN_SIZE => cfg.green_size,
            EGL_BLUE_SIZE => cfg.blue_size,
            EGL_ALPHA_SIZE => cfg.alpha_size,
            EGL_ALPHA_MASK_SIZE => 0,
            EGL_BIND_TO_TEXTURE_RGB => cfg.bind_to_texture_rgb,
            EGL_BIND_TO_TEXTURE_RGBA => cfg.bind_to_texture_rgba,
            EGL_CONFIG_CAVEAT => cfg.caveat,
            EGL_CONFIG_ID => cfg.config_id,
            EGL_DEPTH_SIZE => cfg.depth_size,
            EGL_LEVEL => cfg.frame_buffer_level,
            EGL_MAX_PBUFFER_WIDTH => cfg.max_pbuffer_width,
            EGL_MAX_PBUFFER_HEIGHT => cfg.max_pbuffer_height,
            EGL_MAX_PBUFFER_PIXELS => cfg.max_pbuffer_size,
            EGL_MAX_SWAP_INTERVAL => cfg.max_swap_interval,
            EGL_MIN_SWAP_INTERVAL => cfg.min_swap_interval,
            EGL_NATIVE_RENDERABLE => cfg.native_renderable,
            EGL_NATIVE_VISUAL_ID => cfg.native_visual_id,
            EGL_NATIVE_VISUAL_TYPE => cfg.native_visual_type,
            EGL_RENDERABLE_TYPE => cfg.renderable_type,
            EGL_SAMPLE_BUFFERS => cfg.sample_buffers_num,
            EGL_SAMPLES => cfg.samples_per_pixel,
            EGL_STENCIL_SIZE => cfg.stencil_size,
            EGL_SURFACE_TYPE => cfg.surface_type,
            EGL_TRANSPARENT_TYPE => cfg.transparent_type,
            EGL_TRANSPARENT_RED_VALUE => cfg.trans_red_val,
            EGL_TRANSPARENT_GREEN_VALUE => cfg.trans_green_val,
            EGL_TRANSPARENT_BLUE_VALUE => cfg.trans_blue_val,
            EGL_CONFORMANT => cfg.conformant,
            EGL_COLOR_BUFFER_TYPE => EGL_RGB_BUFFER,
            EGL_MATCH_FORMAT_KHR => EGL_FORMAT_RGBA_8888_EXACT_KHR,
            _ => return None,
        };
        Some(value)
    }
}

impl Resource for Config {
    fn handle(&self) -> HostHandle {
        self.handle
    }
}

impl Drop for Config {
    fn drop(&mut self) {
        trace!("Config {} destroyed", self.handle);
        self.backend.config_cleanup(&self.native);
    }
}

/// Builds the guest visible config list of a display, sorted in selection
/// order. Native configs that are not exposed are returned to the backend
/// right away.
pub(crate) fn enumerate(backend: &Arc<dyn BackendDisplay>, renderable_type: i32) -> Vec<Arc<Config>> {
    let natives = backend.config_enum();
    let total = natives.len();

    let mut configs = Vec::with_capacity(total);
    for native in natives {
        if !native.is_rgba8888() {
            backend.config_cleanup(&native);
            continue;
        }
        configs.push(Config::new(backend, native, renderable_type));
    }
    configs.sort_by(|a, b| a.native.selection_cmp(&b.native));

    debug!("{} of {total} native configs are usable", configs.len());
    configs.into_iter().map(Arc::new).collect()
}

/// What an `eglChooseConfig` attribute list asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSelection {
    /// `EGL_CONFIG_ID` was given, all other attributes are ignored.
    ById(i32),
    Match(ConfigCriteria),
}

/// Matching requirements, `EGL_DONT_CARE` disables a check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigCriteria {
    pub red_size: i32,
    pub green_size: i32,
    pub blue_size: i32,
    pub alpha_size: i32,
    pub buffer_size: i32,
    pub depth_size: i32,
    pub stencil_size: i32,
    pub samples_per_pixel: i32,
    pub sample_buffers_num: i32,
    pub frame_buffer_level: i32,
    pub config_id: i32,
    pub native_visual_type: i32,
    pub max_swap_interval: i32,
    pub min_swap_interval: i32,
    pub trans_red_val: i32,
    pub trans_green_val: i32,
    pub trans_blue_val: i32,
    pub caveat: i32,
    pub native_renderable: i32,
    pub transparent_type: i32,
    pub bind_to_texture_rgb: i32,
    pub bind_to_texture_rgba: i32,
    pub surface_type: i32,
    pub conformant: i32,
    pub renderable_type: i32,
    pub match_format_khr: i32,
}

impl Default for ConfigCriteria {
    /// The EGL 1.4 selection defaults.
    fn default() -> Self {
        Self {
            red_size: 0,
            green_size: 0,
            blue_size: 0,
            alpha_size: 0,
            buffer_size: 0,
            depth_size: 0,
            stencil_size: 0,
            samples_per_pixel: 0,
            sample_buffers_num: 0,
            frame_buffer_level: 0,
            config_id: EGL_DONT_CARE,
            native_visual_type: EGL_DONT_CARE,
            max_swap_interval: EGL_DONT_CARE,
            min_swap_interval: EGL_DONT_CARE,
            trans_red_val: EGL_DONT_CARE,
            trans_green_val: EGL_DONT_CARE,
            trans_blue_val: EGL_DONT_CARE,
            caveat: EGL_DONT_CARE,
            native_renderable: EGL_DONT_CARE,
            transparent_type: EGL_NONE,
            bind_to_texture_rgb: EGL_DONT_CARE,
            bind_to_texture_rgba: EGL_DONT_CARE,
            surface_type: EGL_WINDOW_BIT,
            conformant: 0,
            renderable_type: EGL_OPENGL_ES_BIT,
            match_format_khr: EGL_DONT_CARE,
        }
    }
}

const ALL_API_BITS: i32 = EGL_OPENGL_ES_BIT | EGL_OPENVG_BIT | EGL_OPENGL_ES2_BIT | EGL_OPENGL_BIT;

impl ConfigCriteria {
    /// Criteria that accept every config.
    pub const fn any() -> Self {
        Self {
            red_size: EGL_DONT_CARE,
            green_size: EGL_DONT_CARE,
            blue_size: EGL_DONT_CARE,
            alpha_size: EGL_DONT_CARE,
            buffer_size: EGL_DONT_CARE,
            depth_size: EGL_DONT_CARE,
            stencil_size: EGL_DONT_CARE,
            samples_per_pixel: EGL_DONT_CARE,
            sample_buffers_num: EGL_DONT_CARE,
            frame_buffer_level: EGL_DONT_CARE,
            config_id: EGL_DONT_CARE,
            native_visual_type: EGL_DONT_CARE,
            max_swap_interval: EGL_DONT_CARE,
            min_swap_interval: EGL_DONT_CARE,
            trans_red_val: EGL_DONT_CARE,
            trans_green_val: EGL_DONT_CARE,
            trans_blue_val: EGL_DONT_CARE,
            caveat: EGL_DONT_CARE,
            native_renderable: EGL_DONT_CARE,
            transparent_type: EGL_DONT_CARE,
            bind_to_texture_rgb: EGL_DONT_CARE,
            bind_to_texture_rgba: EGL_DONT_CARE,
            surface_type: EGL_DONT_CARE,
            conformant: EGL_DONT_CARE,
            renderable_type: EGL_DONT_CARE,
            match_format_khr: EGL_DONT_CARE,
        }
    }

    /// Parses an `EGL_NONE` terminated `eglChooseConfig` attribute list on top
    /// of the selection defaults. A list that ends without `EGL_NONE` is
    /// treated as terminated.
    pub fn from_attrib_list(attrib_list: &[i32]) -> EglResult<ConfigSelection> {
        let mut c = Self::default();

        let non_negative = |value: i32| {
            if value < 0 {
                Err(EglError::BadAttribute)
            } else {
                Ok(value)
            }
        };

        for pair in attrib_list.chunks(2) {
            let attrib = pair[0];
            if attrib == EGL_NONE {
                break;
            }
            let value = *pair.get(1).ok_or(EglError::BadAttribute)?;

            match attrib {
                EGL_MAX_PBUFFER_WIDTH
                | EGL_MAX_PBUFFER_HEIGHT
                | EGL_MAX_PBUFFER_PIXELS
                | EGL_NATIVE_VISUAL_ID => {}
                EGL_BIND_TO_TEXTURE_RGB => c.bind_to_texture_rgb = value,
                EGL_BIND_TO_TEXTURE_RGBA => c.bind_to_texture_rgba = value,
                EGL_SURFACE_TYPE => c.surface_type = value,
                EGL_LEVEL => {
                    if value == EGL_DONT_CARE {
                        return Err(EglError::BadAttribute);
                    }
                    c.frame_buffer_level = value;
                }
                EGL_BUFFER_SIZE => c.buffer_size = non_negative(value)?,
                EGL_RED_SIZE => c.red_size = non_negative(value)?,
                EGL_GREEN_SIZE => c.green_size = non_negative(value)?,
                EGL_BLUE_SIZE => c.blue_size = non_negative(value)?,
                EGL_ALPHA_SIZE => c.alpha_size = non_negative(value)?,
                EGL_CONFIG_CAVEAT => match value {
                    EGL_NONE | EGL_SLOW_CONFIG | EGL_NON_CONFORMANT_CONFIG => c.caveat = value,
                    _ => return Err(EglError::BadAttribute),
                },
                EGL_CONFIG_ID => {
                    let id = non_negative(value)?;
                    debug!("requesting config with id = {id}");
                    return Ok(ConfigSelection::ById(id));
                }
                EGL_DEPTH_SIZE => c.depth_size = non_negative(value)?,
                EGL_MAX_SWAP_INTERVAL => c.max_swap_interval = non_negative(value)?,
                EGL_MIN_SWAP_INTERVAL => c.min_swap_interval = non_negative(value)?,
                EGL_CONFORMANT => {
                    if value & !ALL_API_BITS != 0 {
                        return Err(EglError::BadAttribute);
                    }
                    c.conformant = value;
                }
                EGL_NATIVE_RENDERABLE => c.native_renderable = value,
                EGL_RENDERABLE_TYPE => c.renderable_type = value,
                EGL_NATIVE_VISUAL_TYPE => {
                    if !(0..=1).contains(&value) {
                        return Err(EglError::BadAttribute);
                    }
                    c.native_visual_type = value;
                }
                EGL_SAMPLE_BUFFERS => c.sample_buffers_num = non_negative(value)?,
                EGL_SAMPLES => c.samples_per_pixel = non_negative(value)?,
                EGL_STENCIL_SIZE => c.stencil_size = non_negative(value)?,
                EGL_TRANSPARENT_TYPE => match value {
                    EGL_NONE | EGL_TRANSPARENT_RGB => c.transparent_type = value,
                    _ => return Err(EglError::BadAttribute),
                },
                EGL_TRANSPARENT_RED_VALUE => c.trans_red_val = value,
                EGL_TRANSPARENT_GREEN_VALUE => c.trans_green_val = value,
                EGL_TRANSPARENT_BLUE_VALUE => c.trans_blue_val = value,
                EGL_MATCH_FORMAT_KHR => c.match_format_khr = value,
                _ => return Err(EglError::BadAttribute),
            }
        }

        Ok(ConfigSelection::Match(c))
    }
}
