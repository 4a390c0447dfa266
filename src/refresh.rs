//! Change notification between views.
//!
//! Every codebook mutation bumps a version on the [RefreshBus]; views poll
//! [RefreshBus::needs_refresh] with their token each frame and reload their
//! snapshot from the store when it reports true. Views are found by token,
//! never by type or name, so a view cannot be skipped because of what it is
//! called.

use uuid::Uuid;

use crate::store::CodebookStore;

/// A view that can rebuild its state from the store.
pub trait Refreshable {
    fn reload_codes(&mut self, store: &dyn CodebookStore);
    fn reload_segments(&mut self, store: &dyn CodebookStore);
}

#[derive(Debug)]
struct Registration {
    token: Uuid,
    name: String,
    seen_version: u64,
}

#[derive(Debug, Default)]
pub struct RefreshBus {
    version: u64,
    registrations: Vec<Registration>,
}

impl RefreshBus {
    /// Register a view under a display name used only for diagnostics.
    /// The returned token is the view's identity on the bus.
    pub fn register(&mut self, name: &str) -> Uuid {
        let token = Uuid::new_v4();
        self.registrations.push(Registration {
            token,
            name: name.to_string(),
            seen_version: self.version,
        });
        token
    }

    pub fn unregister(&mut self, token: Uuid) {
        self.registrations.retain(|r| r.token != token);
    }

    /// Announce that the codebook changed. Every registered view will see
    /// one `needs_refresh` after this.
    pub fn broadcast(&mut self) {
        self.version += 1;
    }

    /// True once per broadcast for each registered token. Unknown tokens
    /// never need a refresh.
    pub fn needs_refresh(&mut self, token: Uuid) -> bool {
        match self.registrations.iter_mut().find(|r| r.token == token) {
            Some(registration) if registration.seen_version < self.version => {
                registration.seen_version = self.version;
                true
            }
            Some(_) => false,
            None => false,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Display names of the registered views, for diagnostics.
    pub fn registered_names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.name.as_str()).collect()
    }
}
