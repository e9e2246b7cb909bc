// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::new_without_default
)]

// Native backends and client API capabilities
pub mod backend;
pub mod calls;
pub mod config;
pub mod context;
pub mod display;
pub mod image;
pub mod process;
pub mod protocol;
pub mod resource;
pub mod surface;
pub mod thread;
#[cfg(test)]
pub(crate) mod testutils;

use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

use bitflags::bitflags;
use clap::ValueEnum;
use log::info;
use thiserror::Error as ThisError;

use crate::{
    backend::{
        null::{NullBackend, NullClientInterface},
        ClientApi, EglBackend,
    },
    process::ProcessState,
    protocol::{EGL_OPENGL_BIT, EGL_OPENGL_ES2_BIT, EGL_OPENGL_ES_BIT, EGL_OPENVG_BIT},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendMode {
    Null,
}

impl Display for BackendMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
        }
    }
}

bitflags! {
    /// Client APIs made available to guests. The bits are the
    /// `EGL_RENDERABLE_TYPE` bits of each API.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ClientApis: u32 {
        const GLES1 = EGL_OPENGL_ES_BIT as u32;
        const OPENVG = EGL_OPENVG_BIT as u32;
        const GLES2 = EGL_OPENGL_ES2_BIT as u32;
        const OPENGL = EGL_OPENGL_BIT as u32;
    }
}

impl Display for ClientApis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }

        let mut first = true;
        for api in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;

            match api {
                Self::GLES1 => write!(f, "gles1")?,
                Self::OPENVG => write!(f, "openvg")?,
                Self::GLES2 => write!(f, "gles2")?,
                Self::OPENGL => write!(f, "opengl")?,
                _ => panic!("Unknown client API {:#x}", api.bits()),
            }
        }

        Ok(())
    }
}

impl From<ClientApi> for ClientApis {
    fn from(api: ClientApi) -> Self {
        // Every renderable bit has a flag.
        Self::from_bits_retain(api.renderable_bit().unsigned_abs())
    }
}

impl ClientApis {
    pub fn apis(self) -> impl Iterator<Item = ClientApi> {
        ClientApi::ALL
            .into_iter()
            .filter(move |&api| self.contains(api.into()))
    }
}

#[derive(Debug, ThisError)]
pub enum ServerConfigError {
    #[error("At least one client API must be enabled")]
    NoClientApis,
}

#[derive(Debug, Clone)]
/// This structure holds the configuration of an EGL process session
pub struct ServerConfig {
    backend_mode: BackendMode,
    client_apis: ClientApis,
}

impl ServerConfig {
    pub const DEFAULT_CLIENT_APIS: ClientApis = ClientApis::GLES1.union(ClientApis::GLES2);

    pub fn new(
        backend_mode: BackendMode,
        client_apis: Option<ClientApis>,
    ) -> Result<Self, ServerConfigError> {
        let client_apis = client_apis.unwrap_or(Self::DEFAULT_CLIENT_APIS);
        if client_apis.is_empty() {
            return Err(ServerConfigError::NoClientApis);
        }

        Ok(Self {
            backend_mode,
            client_apis,
        })
    }

    pub const fn backend_mode(&self) -> BackendMode {
        self.backend_mode
    }

    pub const fn client_apis(&self) -> ClientApis {
        self.client_apis
    }
}

/// Creates the process session for `config`, with its backend and every
/// enabled client API registered.
pub fn start_process(config: &ServerConfig) -> Arc<ProcessState> {
    info!(
        "Starting {} backend with client APIs: {}",
        config.backend_mode(),
        config.client_apis()
    );
    let backend: Arc<dyn EglBackend> = match config.backend_mode() {
        BackendMode::Null => Arc::new(NullBackend::new()),
    };

    let ps = Arc::new(ProcessState::new(backend));
    for api in config.client_apis().apis() {
        let iface = match config.backend_mode() {
            BackendMode::Null => Arc::new(NullClientInterface::new(api)),
        };
        ps.register_client_interface(api, iface);
    }
    ps
}
