#![allow(dead_code)]

use async_trait::async_trait;
use influx_provisioner::backend::{AdminClient, ClientError, ClientResult, ErrorCode};
use influx_provisioner::config::{DocumentFormat, ProvisioningConfig};
use influx_provisioner::{provision, AppResult, ProvisioningResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// A remote call as seen by the fake service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    CreateSuperuser(String),
    CreateDatabase(String),
    CreateUser(String),
    Grant { user: String, database: String },
}

pub fn grant(user: &str, database: &str) -> Call {
    Call::Grant {
        user: user.to_string(),
        database: database.to_string(),
    }
}

#[derive(Default)]
struct FakeState {
    users: HashMap<String, bool>,
    databases: Vec<String>,
    grants: HashSet<(String, String)>,
    calls: Vec<Call>,
    failures: HashMap<Call, ClientError>,
    close_calls: usize,
}

/// In-memory administrative service with call recording and failure injection
///
/// Clones are separate sessions on the same service: a test hands one clone
/// to `provision` and inspects the service through another afterwards.
#[derive(Clone, Default)]
pub struct FakeAdminClient {
    state: Arc<Mutex<FakeState>>,
    authenticated_as: Option<String>,
    closed: bool,
}

impl FakeAdminClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `call` with `error` instead of executing it
    pub fn fail_on(&self, call: Call, error: ClientError) {
        self.state.lock().unwrap().failures.insert(call, error);
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    pub fn databases(&self) -> Vec<String> {
        self.state.lock().unwrap().databases.clone()
    }

    pub fn is_admin(&self, user: &str) -> bool {
        self.state.lock().unwrap().users.get(user) == Some(&true)
    }

    pub fn has_grant(&self, user: &str, database: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .grants
            .contains(&(user.to_string(), database.to_string()))
    }

    fn begin(&self, call: Call) -> Result<std::sync::MutexGuard<'_, FakeState>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        if self.closed {
            return Err(ClientError::Transport("client is closed".to_string()));
        }
        if let Some(error) = state.failures.get(&call) {
            return Err(error.clone());
        }
        Ok(state)
    }
}

fn require_admin(state: &FakeState, authenticated_as: &Option<String>) -> ClientResult<()> {
    match authenticated_as {
        Some(user) if state.users.get(user) == Some(&true) => Ok(()),
        _ => Err(ClientError::application(
            ErrorCode::PermissionDenied,
            "admin privileges required",
        )),
    }
}

#[async_trait]
impl AdminClient for FakeAdminClient {
    async fn create_superuser(&mut self, user: &str, _password: &str) -> ClientResult<()> {
        let mut state = self.begin(Call::CreateSuperuser(user.to_string()))?;
        if state.users.contains_key(user) {
            return Err(ClientError::AlreadyExists("user already exists".to_string()));
        }
        state.users.insert(user.to_string(), true);
        Ok(())
    }

    fn authenticate_as(&mut self, user: &str, _password: &str) {
        self.authenticated_as = Some(user.to_string());
    }

    async fn create_database(&mut self, name: &str) -> ClientResult<()> {
        let mut state = self.begin(Call::CreateDatabase(name.to_string()))?;
        require_admin(&state, &self.authenticated_as)?;
        if state.databases.iter().any(|db| db == name) {
            return Err(ClientError::AlreadyExists(format!("database {} already exists", name)));
        }
        state.databases.push(name.to_string());
        Ok(())
    }

    async fn create_user(&mut self, user: &str, _password: &str) -> ClientResult<()> {
        let mut state = self.begin(Call::CreateUser(user.to_string()))?;
        require_admin(&state, &self.authenticated_as)?;
        if state.users.contains_key(user) {
            return Err(ClientError::AlreadyExists("user already exists".to_string()));
        }
        state.users.insert(user.to_string(), false);
        Ok(())
    }

    async fn grant_all_privileges(&mut self, user: &str, database: &str) -> ClientResult<()> {
        let mut state = self.begin(grant(user, database))?;
        require_admin(&state, &self.authenticated_as)?;
        if !state.databases.iter().any(|db| db == database) {
            return Err(ClientError::application(
                ErrorCode::NotFound,
                format!("database not found: {}", database),
            ));
        }
        if !state.users.contains_key(user) {
            return Err(ClientError::application(
                ErrorCode::NotFound,
                format!("user not found: {}", user),
            ));
        }
        state.grants.insert((user.to_string(), database.to_string()));
        Ok(())
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().close_calls += 1;
        self.closed = true;
        self.authenticated_as = None;
    }
}

/// Load a JSON document and provision it against `client`, like the binary does
pub async fn load_and_provision(
    document: &str,
    client: FakeAdminClient,
) -> AppResult<ProvisioningResult> {
    let request = ProvisioningConfig::load_from_str(document, DocumentFormat::Json)?;
    Ok(provision(&request, client).await)
}
