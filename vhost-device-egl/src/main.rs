// Host EGL object model probe
//
// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

use std::process::exit;

use clap::{Parser, ValueEnum};
use log::{error, info};
use thiserror::Error as ThisError;
use vhost_device_egl::{
    calls::HostEglCalls,
    protocol::*,
    resource::HostHandle,
    start_process, BackendMode, ClientApis, ServerConfig, ServerConfigError,
};

#[derive(ValueEnum, Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u32)]
pub enum ClientApiName {
    /// OpenGL ES 1.x
    Gles1 = ClientApis::GLES1.bits(),
    /// OpenVG
    Openvg = ClientApis::OPENVG.bits(),
    /// OpenGL ES 2.0
    Gles2 = ClientApis::GLES2.bits(),
    /// Desktop OpenGL
    Opengl = ClientApis::OPENGL.bits(),
}

impl From<ClientApiName> for ClientApis {
    fn from(name: ClientApiName) -> Self {
        Self::from_bits_retain(name as u32)
    }
}

pub fn client_api_names_into_apis(names: impl IntoIterator<Item = ClientApiName>) -> ClientApis {
    names
        .into_iter()
        .map(ClientApiName::into)
        .fold(ClientApis::empty(), ClientApis::union)
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct EglArgs {
    /// The mode specifies which backend implementation to use
    #[clap(short, long, value_enum, default_value_t = BackendMode::Null)]
    pub backend: BackendMode,

    /// Comma separated list of enabled client APIs
    #[clap(short = 'a', long, value_delimiter = ',')]
    pub client_api: Option<Vec<ClientApiName>>,

    /// Guest display id to open
    #[clap(short, long, default_value_t = 0)]
    pub display_id: u64,

    /// Comma separated KEY=VALUE config requirements, like depth=24,samples=4
    #[clap(long, value_delimiter = ',')]
    pub choose: Option<Vec<String>>,
}

#[derive(Debug, ThisError)]
pub enum ProbeError {
    #[error(transparent)]
    Config(#[from] ServerConfigError),
    #[error("Unknown config attribute {0}")]
    UnknownAttribute(String),
    #[error("Invalid config requirement {0}, expected KEY=VALUE")]
    InvalidRequirement(String),
    #[error("Could not open display {0:#x}")]
    NoDisplay(u64),
    #[error("EGL call failed: {0}")]
    Egl(#[from] EglError),
}

fn attribute_by_name(name: &str) -> Option<i32> {
    Some(match name {
        "buffer" => EGL_BUFFER_SIZE,
        "red" => EGL_RED_SIZE,
        "green" => EGL_GREEN_SIZE,
        "blue" => EGL_BLUE_SIZE,
        "alpha" => EGL_ALPHA_SIZE,
        "depth" => EGL_DEPTH_SIZE,
        "stencil" => EGL_STENCIL_SIZE,
        "samples" => EGL_SAMPLES,
        "sample-buffers" => EGL_SAMPLE_BUFFERS,
        "config-id" => EGL_CONFIG_ID,
        "level" => EGL_LEVEL,
        "caveat" => EGL_CONFIG_CAVEAT,
        "surface-type" => EGL_SURFACE_TYPE,
        "renderable-type" => EGL_RENDERABLE_TYPE,
        "conformant" => EGL_CONFORMANT,
        _ => return None,
    })
}

fn parse_value(value: &str) -> Option<i32> {
    match value.strip_prefix("0x") {
        Some(hex) => i32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Turns `KEY=VALUE` requirements into an `EGL_NONE` terminated attribute
/// list.
pub fn attrib_list_from_requirements(requirements: &[String]) -> Result<Vec<i32>, ProbeError> {
    let mut attrib_list = Vec::with_capacity(requirements.len() * 2 + 1);
    for req in requirements {
        let (key, value) = req
            .split_once('=')
            .ok_or_else(|| ProbeError::InvalidRequirement(req.clone()))?;
        let attrib =
            attribute_by_name(key).ok_or_else(|| ProbeError::UnknownAttribute(key.to_string()))?;
        let value = parse_value(value).ok_or_else(|| ProbeError::InvalidRequirement(req.clone()))?;
        attrib_list.extend([attrib, value]);
    }
    attrib_list.push(EGL_NONE);
    Ok(attrib_list)
}

fn log_config(calls: &mut HostEglCalls, dpy: HostHandle, config: HostHandle) -> Result<(), ProbeError> {
    let mut values = [0; 8];
    let attributes = [
        EGL_CONFIG_ID,
        EGL_RED_SIZE,
        EGL_GREEN_SIZE,
        EGL_BLUE_SIZE,
        EGL_ALPHA_SIZE,
        EGL_DEPTH_SIZE,
        EGL_STENCIL_SIZE,
        EGL_SAMPLES,
    ];
    for (value, attribute) in values.iter_mut().zip(attributes) {
        *value = calls.get_config_attrib(dpy, config, attribute)?;
    }

    let [id, red, green, blue, alpha, depth, stencil, samples] = values;
    info!(
        "config {id}: rgba {red}/{green}/{blue}/{alpha} depth {depth} stencil {stencil} samples {samples}"
    );
    Ok(())
}

/// Opens and initializes the display, lists its configs and tears the
/// session down again. Returns the number of configs listed.
pub fn run(args: EglArgs) -> Result<usize, ProbeError> {
    let client_apis = args.client_api.map(client_api_names_into_apis);
    let config = ServerConfig::new(args.backend, client_apis)?;
    let attrib_list = args
        .choose
        .as_deref()
        .map(attrib_list_from_requirements)
        .transpose()?;

    let ps = start_process(&config);
    let mut calls = HostEglCalls::new(ps.clone());

    let dpy = calls
        .get_display(args.display_id)
        .ok_or(ProbeError::NoDisplay(args.display_id))?;
    let (major, minor) = calls.initialize(dpy)?;
    info!("EGL {major}.{minor} on display {:#x}", args.display_id);

    let (count, configs) = match &attrib_list {
        Some(attrib_list) => calls.choose_config(dpy, attrib_list, Some(usize::MAX))?,
        None => calls.get_configs(dpy, Some(usize::MAX))?,
    };
    info!("{count} configs");
    for config in configs {
        log_config(&mut calls, dpy, config)?;
    }

    calls.terminate(dpy)?;
    drop(calls);
    ps.fini();
    Ok(count)
}

pub fn main() {
    env_logger::init();

    let args = EglArgs::parse();

    if let Err(e) = run(args) {
        error!("{e}");
        exit(1);
    }
}
