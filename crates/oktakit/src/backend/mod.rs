//! Backend trait and implementations for identity-provider API calls.
//!
//! [`IdpBackend`] is the whole remote surface a reconciler needs: create,
//! read, full-replacement update, delete and the separate status
//! transition. [`http::HttpBackend`] talks to a real org; [`MockBackend`]
//! keeps objects in memory for tests.
//!
//! # Testing
//!
//! ```
//! use oktakit::backend::{IdpBackend, MockBackend};
//! use oktakit::Status;
//!
//! let mock = MockBackend::new().with_next_id("0oa1b2c3");
//! assert!(mock.read("0oa1b2c3").unwrap_err().is_not_found());
//! assert!(mock.set_status("0oa1b2c3", Status::Inactive).is_err());
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{AccountLink, SamlIdentityProvider, Status, defaults};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Remote operations on SAML identity providers.
///
/// Every call blocks until the platform answers. Implementations do not
/// retry; errors are returned as the platform reported them.
pub trait IdpBackend: Send + Sync {
    /// Create an identity provider. The returned object carries the
    /// assigned id and the status the platform gave it.
    fn create(&self, idp: &SamlIdentityProvider) -> Result<SamlIdentityProvider>;

    /// Fetch an identity provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the id does not resolve.
    fn read(&self, id: &str) -> Result<SamlIdentityProvider>;

    /// Replace an identity provider with `idp`.
    fn update(&self, id: &str, idp: &SamlIdentityProvider) -> Result<SamlIdentityProvider>;

    /// Delete an identity provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the id does not resolve.
    fn delete(&self, id: &str) -> Result<()>;

    /// Activate or deactivate an identity provider.
    fn set_status(&self, id: &str, status: Status) -> Result<()>;
}

/// A call recorded by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `create`, with the id handed out (if any).
    Create(Option<String>),
    /// `read` of an id.
    Read(String),
    /// `update` of an id.
    Update(String),
    /// `delete` of an id.
    Delete(String),
    /// `set_status` of an id.
    SetStatus(String, Status),
}

#[derive(Debug)]
struct MockState {
    idps: HashMap<String, SamlIdentityProvider>,
    calls: Vec<MockCall>,
    next_ids: VecDeque<String>,
    counter: u32,
    initial_status: Status,
    reject_create: Option<String>,
    fail_status: Option<String>,
    fail_reads: Option<String>,
    omit_issuer_mode: bool,
    server_defaults: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            idps: HashMap::new(),
            calls: Vec::new(),
            next_ids: VecDeque::new(),
            counter: 0,
            initial_status: defaults::STATUS,
            reject_create: None,
            fail_status: None,
            fail_reads: None,
            omit_issuer_mode: false,
            server_defaults: false,
        }
    }
}

/// In-memory backend for testing without network access.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the code under test uses another.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the id handed out by the next `create`.
    #[must_use]
    pub fn with_next_id(self, id: impl Into<String>) -> Self {
        self.lock().next_ids.push_back(id.into());
        self
    }

    /// Status given to newly created identity providers (default ACTIVE).
    #[must_use]
    pub fn with_initial_status(self, status: Status) -> Self {
        self.lock().initial_status = status;
        self
    }

    /// Fill in account linking and clock skew on writes that leave them
    /// out, as the platform does.
    #[must_use]
    pub fn with_server_defaults(self) -> Self {
        self.lock().server_defaults = true;
        self
    }

    /// Make every `read` fail with a server error.
    pub fn fail_reads(&self, message: impl Into<String>) {
        self.lock().fail_reads = Some(message.into());
    }

    /// Make every `create` fail with a validation error.
    pub fn reject_creates(&self, summary: impl Into<String>) {
        self.lock().reject_create = Some(summary.into());
    }

    /// Make every `set_status` fail with a server error.
    pub fn fail_status_calls(&self, message: impl Into<String>) {
        self.lock().fail_status = Some(message.into());
    }

    /// Drop `issuerMode` from read responses, like orgs that predate it.
    pub fn omit_issuer_mode_on_read(&self, omit: bool) {
        self.lock().omit_issuer_mode = omit;
    }

    /// Store an identity provider directly, bypassing `create`.
    pub fn insert(&self, id: impl Into<String>, mut idp: SamlIdentityProvider) {
        let id = id.into();
        idp.id = Some(id.clone());
        self.lock().idps.insert(id, idp);
    }

    /// Remove an identity provider directly, as if deleted out of band.
    pub fn remove(&self, id: &str) -> Option<SamlIdentityProvider> {
        self.lock().idps.remove(id)
    }

    /// Current stored copy of an identity provider.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SamlIdentityProvider> {
        self.lock().idps.get(id).cloned()
    }

    /// All calls made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Only the `set_status` calls made so far.
    #[must_use]
    pub fn status_calls(&self) -> Vec<(String, Status)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::SetStatus(id, status) => Some((id.clone(), *status)),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl IdpBackend for MockBackend {
    fn create(&self, idp: &SamlIdentityProvider) -> Result<SamlIdentityProvider> {
        let mut state = self.lock();

        if let Some(summary) = state.reject_create.clone() {
            state.calls.push(MockCall::Create(None));
            return Err(Error::Rejected {
                status: 400,
                code: Some("E0000001".to_string()),
                summary,
                causes: vec![],
            });
        }

        let id = match state.next_ids.pop_front() {
            Some(id) => id,
            None => {
                state.counter += 1;
                format!("0oamock{:04}", state.counter)
            }
        };

        let mut stored = idp.clone();
        stored.id = Some(id.clone());
        stored.status = Some(state.initial_status);
        if state.server_defaults {
            fill_server_defaults(&mut stored);
        }
        state.idps.insert(id.clone(), stored.clone());
        state.calls.push(MockCall::Create(Some(id)));

        Ok(stored)
    }

    fn read(&self, id: &str) -> Result<SamlIdentityProvider> {
        let mut state = self.lock();
        state.calls.push(MockCall::Read(id.to_string()));

        if let Some(message) = state.fail_reads.clone() {
            return Err(Error::http(message, Some(500)));
        }

        let mut idp = state
            .idps
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id))?;
        if state.omit_issuer_mode {
            idp.issuer_mode = None;
        }
        Ok(idp)
    }

    fn update(&self, id: &str, idp: &SamlIdentityProvider) -> Result<SamlIdentityProvider> {
        let mut state = self.lock();
        state.calls.push(MockCall::Update(id.to_string()));

        let status = state
            .idps
            .get(id)
            .map(|existing| existing.status)
            .ok_or_else(|| Error::not_found(id))?;

        let mut stored = idp.clone();
        stored.id = Some(id.to_string());
        stored.status = status;
        if state.server_defaults {
            fill_server_defaults(&mut stored);
        }
        state.idps.insert(id.to_string(), stored.clone());

        Ok(stored)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(MockCall::Delete(id.to_string()));

        state
            .idps
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(id))
    }

    fn set_status(&self, id: &str, status: Status) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(MockCall::SetStatus(id.to_string(), status));

        if let Some(message) = state.fail_status.clone() {
            return Err(Error::http(message, Some(500)));
        }

        let idp = state
            .idps
            .get_mut(id)
            .ok_or_else(|| Error::not_found(id))?;
        idp.status = Some(status);
        Ok(())
    }
}

fn fill_server_defaults(idp: &mut SamlIdentityProvider) {
    idp.policy.account_link.get_or_insert(AccountLink {
        action: defaults::ACCOUNT_LINK_ACTION,
        filter: None,
    });
    idp.policy.max_clock_skew.get_or_insert(defaults::MAX_CLOCK_SKEW);
}
