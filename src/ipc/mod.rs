//! Request/response surface exposed to the hosted UI.
//!
//! Requests are a tagged union keyed by call name. Arguments are validated
//! here, before they reach the session or relaunch layers.

pub mod server;

use crate::relaunch::RelaunchCoordinator;
use crate::session::{SessionError, SessionManager};
use crate::telemetry::{Telemetry, TelemetryEvent, TelemetryKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use webnest_config::ProfileId;
use webnest_update::UpdateLifecycle;

/// One call from the hosted UI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "call", content = "args", rename_all = "kebab-case")]
pub enum IpcRequest {
    GetAllProfiles,
    GetProfile { id: String },
    /// `id: null` switches to no profile.
    SetActiveProfile { id: Option<String> },
    GetActiveProfile,
    CreateProfile { id: String, name: String },
    DeleteProfile { id: String },
    ClearActiveProfile,
    ClearActiveProfileStorage,
    GetLaunchArgs,
    SetLaunchArgs { args: Vec<String> },
    /// Restart with `args`, or with the captured launch args when absent.
    Relaunch {
        #[serde(default)]
        args: Option<Vec<String>>,
    },
    GetUpdateState,
}

impl IpcRequest {
    pub fn call_name(&self) -> &'static str {
        match self {
            IpcRequest::GetAllProfiles => "get-all-profiles",
            IpcRequest::GetProfile { .. } => "get-profile",
            IpcRequest::SetActiveProfile { .. } => "set-active-profile",
            IpcRequest::GetActiveProfile => "get-active-profile",
            IpcRequest::CreateProfile { .. } => "create-profile",
            IpcRequest::DeleteProfile { .. } => "delete-profile",
            IpcRequest::ClearActiveProfile => "clear-active-profile",
            IpcRequest::ClearActiveProfileStorage => "clear-active-profile-storage",
            IpcRequest::GetLaunchArgs => "get-launch-args",
            IpcRequest::SetLaunchArgs { .. } => "set-launch-args",
            IpcRequest::Relaunch { .. } => "relaunch",
            IpcRequest::GetUpdateState => "get-update-state",
        }
    }
}

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reply envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpcResponse {
    pub seq: Option<u64>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IpcResponse {
    pub fn success(seq: Option<u64>, result: Value) -> Self {
        Self {
            seq,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(seq: Option<u64>, error: impl Into<String>) -> Self {
        Self {
            seq,
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

fn profile_id(raw: &str) -> Result<ProfileId, IpcError> {
    if raw.trim().is_empty() {
        return Err(IpcError::InvalidArgument(
            "profile id must not be empty".to_string(),
        ));
    }
    Ok(ProfileId::new(raw))
}

fn display_name(raw: &str) -> Result<String, IpcError> {
    if raw.trim().is_empty() {
        return Err(IpcError::InvalidArgument(
            "profile name must not be empty".to_string(),
        ));
    }
    Ok(raw.to_string())
}

/// Dispatches validated requests to the owning controllers.
pub struct IpcHandler {
    session: Arc<SessionManager>,
    relaunch: Arc<RelaunchCoordinator>,
    updates: Option<Arc<UpdateLifecycle>>,
    telemetry: Arc<dyn Telemetry>,
}

impl IpcHandler {
    pub fn new(
        session: Arc<SessionManager>,
        relaunch: Arc<RelaunchCoordinator>,
        updates: Option<Arc<UpdateLifecycle>>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            session,
            relaunch,
            updates,
            telemetry,
        }
    }

    pub async fn handle(&self, request: IpcRequest) -> Result<Value, IpcError> {
        let call = request.call_name();
        crate::debug_log!("IPC", "<- {:?}", request);

        let result = self.dispatch(request).await;
        if let Err(IpcError::Session(e)) = &result {
            let kind = match e {
                SessionError::PartitionClear { .. }
                | SessionError::ClearTimeout { .. }
                | SessionError::ClearAborted { .. } => TelemetryKind::StorageClearFailed,
                _ => TelemetryKind::IpcError,
            };
            self.telemetry
                .report(TelemetryEvent::new(kind, format!("{call}: {e}")));
        }
        result
    }

    async fn dispatch(&self, request: IpcRequest) -> Result<Value, IpcError> {
        match request {
            IpcRequest::GetAllProfiles => {
                Ok(serde_json::to_value(self.session.get_all_profiles().await?)?)
            }
            IpcRequest::GetProfile { id } => {
                let id = profile_id(&id)?;
                Ok(serde_json::to_value(self.session.get_profile(&id).await?)?)
            }
            IpcRequest::SetActiveProfile { id } => {
                let id = id.as_deref().map(profile_id).transpose()?;
                self.session.set_active_profile(id).await?;
                Ok(Value::Bool(true))
            }
            IpcRequest::GetActiveProfile => {
                Ok(serde_json::to_value(self.session.get_active_profile())?)
            }
            IpcRequest::CreateProfile { id, name } => {
                let id = profile_id(&id)?;
                let name = display_name(&name)?;
                Ok(serde_json::to_value(
                    self.session.create_profile(id, name).await?,
                )?)
            }
            IpcRequest::DeleteProfile { id } => {
                let id = profile_id(&id)?;
                Ok(Value::Bool(self.session.delete_profile(&id).await?))
            }
            IpcRequest::ClearActiveProfile => {
                self.session.clear_active_profile().await?;
                Ok(Value::Null)
            }
            IpcRequest::ClearActiveProfileStorage => {
                self.session.clear_active_profile_storage().await?;
                Ok(Value::Null)
            }
            IpcRequest::GetLaunchArgs => Ok(serde_json::to_value(self.relaunch.get_launch_args())?),
            IpcRequest::SetLaunchArgs { args } => {
                self.relaunch.set_launch_args(&args);
                Ok(Value::Null)
            }
            IpcRequest::Relaunch { args } => {
                let outcome = match args {
                    Some(args) => self.relaunch.relaunch_with_args(&args),
                    None => self.relaunch.relaunch(),
                };
                Ok(serde_json::to_value(outcome)?)
            }
            IpcRequest::GetUpdateState => Ok(match &self.updates {
                Some(updates) => serde_json::to_value(updates.state())?,
                None => Value::Null,
            }),
        }
    }

    /// Parse one envelope line and produce its reply.
    pub async fn handle_line(&self, line: &str) -> IpcResponse {
        let (seq, request) = match parse_envelope(line) {
            Ok(parsed) => parsed,
            Err((seq, e)) => {
                log::warn!("Rejected IPC message: {e}");
                return IpcResponse::failure(seq, e.to_string());
            }
        };

        match self.handle(request).await {
            Ok(result) => IpcResponse::success(seq, result),
            Err(e) => IpcResponse::failure(seq, e.to_string()),
        }
    }
}

/// Split `{"seq": n, "call": ..., "args": ...}` into its sequence number and
/// request. A parse failure still carries the sequence number when one could
/// be read.
pub fn parse_envelope(line: &str) -> Result<(Option<u64>, IpcRequest), (Option<u64>, IpcError)> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| (None, IpcError::Malformed(e.to_string())))?;
    let Value::Object(mut fields) = value else {
        return Err((
            None,
            IpcError::Malformed("request must be a JSON object".to_string()),
        ));
    };

    let seq = fields.remove("seq").and_then(|s| s.as_u64());
    let request = serde_json::from_value(Value::Object(fields))
        .map_err(|e| (seq, IpcError::Malformed(e.to_string())))?;
    Ok((seq, request))
}
