// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

//! EGL tokens exchanged with the guest and the error codes reported back
//! through `eglGetError`.

use thiserror::Error as ThisError;

pub const EGL_FALSE: i32 = 0;
pub const EGL_TRUE: i32 = 1;

pub const EGL_VERSION_MAJOR: i32 = 1;
pub const EGL_VERSION_MINOR: i32 = 4;

pub const EGL_DONT_CARE: i32 = -1;
pub const EGL_UNKNOWN: i32 = -1;

/// Terminates attribute lists, also "no caveat" / "no transparency".
pub const EGL_NONE: i32 = 0x3038;

// Error codes
pub const EGL_SUCCESS: i32 = 0x3000;
pub const EGL_NOT_INITIALIZED: i32 = 0x3001;
pub const EGL_BAD_ACCESS: i32 = 0x3002;
pub const EGL_BAD_ALLOC: i32 = 0x3003;
pub const EGL_BAD_ATTRIBUTE: i32 = 0x3004;
pub const EGL_BAD_CONFIG: i32 = 0x3005;
pub const EGL_BAD_CONTEXT: i32 = 0x3006;
pub const EGL_BAD_CURRENT_SURFACE: i32 = 0x3007;
pub const EGL_BAD_DISPLAY: i32 = 0x3008;
pub const EGL_BAD_MATCH: i32 = 0x3009;
pub const EGL_BAD_NATIVE_PIXMAP: i32 = 0x300A;
pub const EGL_BAD_NATIVE_WINDOW: i32 = 0x300B;
pub const EGL_BAD_PARAMETER: i32 = 0x300C;
pub const EGL_BAD_SURFACE: i32 = 0x300D;

// Config attributes
pub const EGL_BUFFER_SIZE: i32 = 0x3020;
pub const EGL_ALPHA_SIZE: i32 = 0x3021;
pub const EGL_BLUE_SIZE: i32 = 0x3022;
pub const EGL_GREEN_SIZE: i32 = 0x3023;
pub const EGL_RED_SIZE: i32 = 0x3024;
pub const EGL_DEPTH_SIZE: i32 = 0x3025;
pub const EGL_STENCIL_SIZE: i32 = 0x3026;
pub const EGL_CONFIG_CAVEAT: i32 = 0x3027;
pub const EGL_CONFIG_ID: i32 = 0x3028;
pub const EGL_LEVEL: i32 = 0x3029;
pub const EGL_MAX_PBUFFER_HEIGHT: i32 = 0x302A;
pub const EGL_MAX_PBUFFER_PIXELS: i32 = 0x302B;
pub const EGL_MAX_PBUFFER_WIDTH: i32 = 0x302C;
pub const EGL_NATIVE_RENDERABLE: i32 = 0x302D;
pub const EGL_NATIVE_VISUAL_ID: i32 = 0x302E;
pub const EGL_NATIVE_VISUAL_TYPE: i32 = 0x302F;
pub const EGL_SAMPLES: i32 = 0x3031;
pub const EGL_SAMPLE_BUFFERS: i32 = 0x3032;
pub const EGL_SURFACE_TYPE: i32 = 0x3033;
pub const EGL_TRANSPARENT_TYPE: i32 = 0x3034;
pub const EGL_TRANSPARENT_BLUE_VALUE: i32 = 0x3035;
pub const EGL_TRANSPARENT_GREEN_VALUE: i32 = 0x3036;
pub const EGL_TRANSPARENT_RED_VALUE: i32 = 0x3037;
pub const EGL_BIND_TO_TEXTURE_RGB: i32 = 0x3039;
pub const EGL_BIND_TO_TEXTURE_RGBA: i32 = 0x303A;
pub const EGL_MIN_SWAP_INTERVAL: i32 = 0x303B;
pub const EGL_MAX_SWAP_INTERVAL: i32 = 0x303C;
pub const EGL_ALPHA_MASK_SIZE: i32 = 0x303E;
pub const EGL_COLOR_BUFFER_TYPE: i32 = 0x303F;
pub const EGL_RENDERABLE_TYPE: i32 = 0x3040;
pub const EGL_CONFORMANT: i32 = 0x3042;
pub const EGL_MATCH_FORMAT_KHR: i32 = 0x3043;

// Config attribute values
pub const EGL_SLOW_CONFIG: i32 = 0x3050;
pub const EGL_NON_CONFORMANT_CONFIG: i32 = 0x3051;
pub const EGL_TRANSPARENT_RGB: i32 = 0x3052;
pub const EGL_RGB_BUFFER: i32 = 0x308E;
pub const EGL_FORMAT_RGBA_8888_EXACT_KHR: i32 = 0x30C2;
pub const EGL_FORMAT_RGBA_8888_KHR: i32 = 0x30C3;

// EGL_SURFACE_TYPE bits
pub const EGL_PBUFFER_BIT: i32 = 0x0001;
pub const EGL_PIXMAP_BIT: i32 = 0x0002;
pub const EGL_WINDOW_BIT: i32 = 0x0004;
pub const EGL_LOCK_SURFACE_BIT_KHR: i32 = 0x0080;
pub const EGL_OPTIMAL_FORMAT_BIT_KHR: i32 = 0x0100;
pub const EGL_SWAP_BEHAVIOR_PRESERVED_BIT: i32 = 0x0400;

// EGL_RENDERABLE_TYPE / EGL_CONFORMANT bits
pub const EGL_OPENGL_ES_BIT: i32 = 0x0001;
pub const EGL_OPENVG_BIT: i32 = 0x0002;
pub const EGL_OPENGL_ES2_BIT: i32 = 0x0004;
pub const EGL_OPENGL_BIT: i32 = 0x0008;

// Surface attributes
pub const EGL_HEIGHT: i32 = 0x3056;
pub const EGL_WIDTH: i32 = 0x3057;
pub const EGL_LARGEST_PBUFFER: i32 = 0x3058;
pub const EGL_NO_TEXTURE: i32 = 0x305C;
pub const EGL_TEXTURE_RGB: i32 = 0x305D;
pub const EGL_TEXTURE_RGBA: i32 = 0x305E;
pub const EGL_TEXTURE_2D: i32 = 0x305F;
pub const EGL_TEXTURE_FORMAT: i32 = 0x3080;
pub const EGL_TEXTURE_TARGET: i32 = 0x3081;
pub const EGL_MIPMAP_TEXTURE: i32 = 0x3082;
pub const EGL_MIPMAP_LEVEL: i32 = 0x3083;
pub const EGL_BACK_BUFFER: i32 = 0x3084;
pub const EGL_SINGLE_BUFFER: i32 = 0x3085;
pub const EGL_RENDER_BUFFER: i32 = 0x3086;
pub const EGL_HORIZONTAL_RESOLUTION: i32 = 0x3090;
pub const EGL_VERTICAL_RESOLUTION: i32 = 0x3091;
pub const EGL_PIXEL_ASPECT_RATIO: i32 = 0x3092;
pub const EGL_SWAP_BEHAVIOR: i32 = 0x3093;
pub const EGL_BUFFER_PRESERVED: i32 = 0x3094;
pub const EGL_MULTISAMPLE_RESOLVE: i32 = 0x3099;
pub const EGL_MULTISAMPLE_RESOLVE_DEFAULT: i32 = 0x309A;

// Context attributes
pub const EGL_CONTEXT_CLIENT_TYPE: i32 = 0x3097;
pub const EGL_CONTEXT_CLIENT_VERSION: i32 = 0x3098;

// Client APIs accepted by eglBindAPI
pub const EGL_OPENGL_ES_API: i32 = 0x30A0;
pub const EGL_OPENVG_API: i32 = 0x30A1;
pub const EGL_OPENGL_API: i32 = 0x30A2;

/// Errors reported to the guest. Each variant maps to exactly one EGL error
/// code, see [`EglError::code`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, ThisError)]
pub enum EglError {
    #[error("EGL is not initialized for the display")]
    NotInitialized,
    #[error("Resource is bound to another thread or the backend refused access")]
    BadAccess,
    #[error("Backend failed to allocate the resource")]
    BadAlloc,
    #[error("Unrecognized attribute or attribute value")]
    BadAttribute,
    #[error("Not a valid config handle")]
    BadConfig,
    #[error("Not a valid context handle")]
    BadContext,
    #[error("Current surface is no longer valid")]
    BadCurrentSurface,
    #[error("Not a valid display handle")]
    BadDisplay,
    #[error("Arguments are inconsistent")]
    BadMatch,
    #[error("Native pixmap is not valid")]
    BadNativePixmap,
    #[error("Native window is not valid")]
    BadNativeWindow,
    #[error("Invalid parameter")]
    BadParameter,
    #[error("Not a valid surface handle")]
    BadSurface,
}

impl EglError {
    pub const fn code(self) -> i32 {
        match self {
            Self::NotInitialized => EGL_NOT_INITIALIZED,
            Self::BadAccess => EGL_BAD_ACCESS,
            Self::BadAlloc => EGL_BAD_ALLOC,
            Self::BadAttribute => EGL_BAD_ATTRIBUTE,
            Self::BadConfig => EGL_BAD_CONFIG,
            Self::BadContext => EGL_BAD_CONTEXT,
            Self::BadCurrentSurface => EGL_BAD_CURRENT_SURFACE,
            Self::BadDisplay => EGL_BAD_DISPLAY,
            Self::BadMatch => EGL_BAD_MATCH,
            Self::BadNativePixmap => EGL_BAD_NATIVE_PIXMAP,
            Self::BadNativeWindow => EGL_BAD_NATIVE_WINDOW,
            Self::BadParameter => EGL_BAD_PARAMETER,
            Self::BadSurface => EGL_BAD_SURFACE,
        }
    }
}

pub type EglResult<T> = std::result::Result<T, EglError>;
