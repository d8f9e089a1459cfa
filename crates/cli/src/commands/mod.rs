pub mod config;
pub mod demands;
pub mod doctor;
pub mod inbox;
pub mod login;
pub mod quotes;
pub mod stats;
pub mod users;

use std::future::Future;
use std::path::Path;

use gestibank_client::dto::{FileUpload, LoginRequest};
use gestibank_client::{
    HttpBackend, ProcurementBackend, ServiceError, Session, SessionError, WorkflowService,
};
use gestibank_core::config::{AppConfig, AuthConfig, LoadOptions};
use gestibank_core::errors::ApplicationError;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

pub const EXIT_CONFIG: u8 = 2;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::emit(0, CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data: None,
        })
    }

    pub fn success_with(command: &str, reply: Reply) -> Self {
        Self::emit(0, CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: reply.message,
            correlation_id: None,
            data: Some(reply.data),
        })
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::emit(exit_code, CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data: None,
        })
    }

    /// Classifies a service failure through the application error layers.
    pub fn from_service_error(command: &str, error: ServiceError) -> Self {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let interface = ApplicationError::from(error).into_interface(correlation_id.clone());
        let error_class = interface.error_class();
        warn!(
            event_name = "cli.command.failed",
            command,
            error_class,
            correlation_id = %correlation_id,
            error = %interface,
            "command failed"
        );

        Self::emit(exit_code_for(error_class), CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: format!("{} ({})", interface.message(), interface.user_message()),
            correlation_id: Some(correlation_id),
            data: None,
        })
    }

    fn emit(exit_code: u8, payload: CommandOutcome) -> Self {
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// Successful command payload: a human summary plus the structured result.
#[derive(Debug, Clone)]
pub struct Reply {
    pub message: String,
    pub data: Value,
}

impl Reply {
    pub fn new(message: impl Into<String>, data: &impl Serialize) -> Self {
        Self { message: message.into(), data: serde_json::to_value(data).unwrap_or(Value::Null) }
    }
}

/// Appends the actions the session may take, if any, to a show summary.
pub(crate) fn with_actions(summary: String, actions: &[impl std::fmt::Display]) -> String {
    if actions.is_empty() {
        return summary;
    }
    let actions: Vec<String> = actions.iter().map(ToString::to_string).collect();
    format!("{summary}; you can {}", actions.join(", "))
}

pub fn exit_code_for(error_class: &str) -> u8 {
    match error_class {
        "config_validation" => EXIT_CONFIG,
        "bad_request" => 3,
        "conflict" => 4,
        "forbidden" | "unauthorized" => 5,
        "service_unavailable" => 6,
        "not_found" => 7,
        "bad_gateway" => 8,
        _ => 1,
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

pub(crate) fn block_on<Fut>(command: &str, future: Fut) -> CommandResult
where
    Fut: Future<Output = CommandResult>,
{
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(future),
        Err(error) => CommandResult::failure(
            command,
            "runtime",
            format!("failed to initialize async runtime: {error}"),
            1,
        ),
    }
}

/// Loads configuration, opens an authenticated session and runs `action`
/// against the workflow service.
pub(crate) fn with_service<F, Fut>(command: &str, options: LoadOptions, action: F) -> CommandResult
where
    F: FnOnce(WorkflowService<HttpBackend>) -> Fut,
    Fut: Future<Output = Result<Reply, ServiceError>>,
{
    let config = match load_config(command, options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    block_on(command, async move {
        let outcome = match connect(&config).await {
            Ok(service) => action(service).await,
            Err(error) => Err(error),
        };
        match outcome {
            Ok(reply) => CommandResult::success_with(command, reply),
            Err(error) => CommandResult::from_service_error(command, error),
        }
    })
}

pub(crate) async fn connect(
    config: &AppConfig,
) -> Result<WorkflowService<HttpBackend>, ServiceError> {
    let backend = HttpBackend::from_config(&config.api)?;
    let token = match &config.auth.token {
        Some(token) if config.auth.has_token() => token.clone(),
        _ if config.auth.has_credentials() => {
            SecretString::from(exchange_credentials(&backend, &config.auth).await?)
        }
        _ => return Err(SessionError::Missing.into()),
    };

    let session = Session::from_token(token.expose_secret())?;
    Ok(WorkflowService::new(backend.with_token(token), session).with_page_size(config.api.page_size))
}

pub(crate) async fn exchange_credentials(
    backend: &HttpBackend,
    auth: &AuthConfig,
) -> Result<String, ServiceError> {
    let (Some(email), Some(password)) = (&auth.email, &auth.password) else {
        return Err(SessionError::Missing.into());
    };
    let request = LoginRequest {
        email: email.trim().to_string(),
        password: password.expose_secret().to_string(),
    };
    Ok(backend.login(&request).await?)
}

pub(crate) fn read_upload(path: &Path) -> Result<FileUpload, ServiceError> {
    let bytes = std::fs::read(path).map_err(|error| {
        ServiceError::Validation(format!("could not read `{}`: {error}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ServiceError::Validation(format!("`{}` is not a file", path.display())))?;
    Ok(FileUpload::new(file_name, bytes))
}
