// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

use std::{
    collections::HashMap,
    mem,
    sync::{Arc, Mutex},
};

use log::{debug, trace};

use crate::{
    backend::{ClientApi, ClientInterface, EglBackend},
    display::{Display, DisplayId},
    resource::HostHandle,
};

/// State shared by every thread of one guest process.
pub struct ProcessState {
    backend: Arc<dyn EglBackend>,
    displays: Mutex<Vec<Arc<Display>>>,
    client_ifaces: Mutex<HashMap<ClientApi, Arc<dyn ClientInterface>>>,
}

impl ProcessState {
    pub fn new(backend: Arc<dyn EglBackend>) -> Self {
        Self {
            backend,
            displays: Mutex::new(Vec::new()),
            client_ifaces: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn EglBackend> {
        &self.backend
    }

    pub fn register_client_interface(&self, api: ClientApi, iface: Arc<dyn ClientInterface>) {
        debug!("Registering client API {api:?}");
        self.client_ifaces.lock().unwrap().insert(api, iface);
    }

    pub fn client_interface(&self, api: ClientApi) -> Option<Arc<dyn ClientInterface>> {
        self.client_ifaces.lock().unwrap().get(&api).cloned()
    }

    /// `EGL_RENDERABLE_TYPE` bits of every registered client API.
    pub fn renderable_type(&self) -> i32 {
        self.client_ifaces
            .lock()
            .unwrap()
            .keys()
            .fold(0, |bits, api| bits | api.renderable_bit())
    }

    /// Returns the display for `display_id`, creating it on first use.
    pub fn find_or_create_display(&self, display_id: DisplayId) -> Option<Arc<Display>> {
        let mut displays = self.displays.lock().unwrap();
        if let Some(dpy) = displays.iter().find(|dpy| dpy.display_id() == display_id) {
            return Some(dpy.clone());
        }

        let dpy = Arc::new(Display::create(self.backend.as_ref(), display_id)?);
        displays.push(dpy.clone());
        Some(dpy)
    }

    pub fn display_by_handle(&self, handle: HostHandle) -> Option<Arc<Display>> {
        self.displays
            .lock()
            .unwrap()
            .iter()
            .find(|dpy| dpy.handle() == handle)
            .cloned()
    }

    /// Destroys every display, then drops the client API registrations.
    /// Displays still referenced by a caller are destroyed when that
    /// reference goes away.
    pub fn fini(&self) {
        let displays = mem::take(&mut *self.displays.lock().unwrap());
        trace!("Destroying {} displays", displays.len());
        drop(displays);

        self.client_ifaces.lock().unwrap().clear();
    }
}

impl Drop for ProcessState {
    fn drop(&mut self) {
        self.fini();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        protocol::{EGL_OPENGL_BIT, EGL_OPENGL_ES2_BIT, EGL_OPENGL_ES_BIT},
        testutils::{FakeBackend, FakeClientInterface},
    };

    fn process(fake: &FakeBackend) -> ProcessState {
        ProcessState::new(Arc::new(fake.clone()))
    }

    #[test]
    fn test_find_or_create_display() {
        let fake = FakeBackend::new();
        let ps = process(&fake);

        let a = ps.find_or_create_display(0).unwrap();
        let b = ps.find_or_create_display(0).unwrap();
        let c = ps.find_or_create_display(1).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(fake.displays_created(), 2);

        assert!(Arc::ptr_eq(&ps.display_by_handle(c.handle()).unwrap(), &c));
        assert!(ps.display_by_handle(0).is_none());
    }

    #[test]
    fn test_find_or_create_display_failure() {
        let fake = FakeBackend::new();
        let ps = process(&fake);
        fake.fail_display_creation(true);
        assert!(ps.find_or_create_display(3).is_none());

        fake.fail_display_creation(false);
        assert!(ps.find_or_create_display(3).is_some());
    }

    #[test]
    fn test_renderable_type() {
        let fake = FakeBackend::new();
        let ps = process(&fake);
        assert_eq!(ps.renderable_type(), 0);

        for api in [ClientApi::Gles1, ClientApi::Gles2, ClientApi::OpenGl] {
            ps.register_client_interface(api, Arc::new(FakeClientInterface::new(&fake, api)));
        }
        assert_eq!(
            ps.renderable_type(),
            EGL_OPENGL_ES_BIT | EGL_OPENGL_ES2_BIT | EGL_OPENGL_BIT
        );
        assert!(ps.client_interface(ClientApi::OpenVg).is_none());
        assert!(ps.client_interface(ClientApi::Gles2).is_some());
    }

    #[test]
    fn test_fini_destroys_displays_before_interfaces() {
        let fake = FakeBackend::new();
        let ps = process(&fake);
        let iface = Arc::new(FakeClientInterface::new(&fake, ClientApi::Gles2));
        ps.register_client_interface(ClientApi::Gles2, iface.clone());

        let dpy = ps.find_or_create_display(0).unwrap();
        dpy.initialize(ps.renderable_type());
        let handle = dpy.handle();
        drop(dpy);

        // The display sees the interface registrations while it is torn down.
        let ifaces = Arc::downgrade(&iface);
        fake.set_destroy_hook(move || assert_eq!(ifaces.strong_count(), 1));
        drop(iface);

        ps.fini();
        assert_eq!(fake.displays_destroyed(), 1);
        assert_eq!(fake.configs_cleaned(), fake.native_config_count());
        assert!(ps.display_by_handle(handle).is_none());
        assert_eq!(ps.renderable_type(), 0);
    }
}
