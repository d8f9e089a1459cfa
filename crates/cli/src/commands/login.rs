use gestibank_client::{HttpBackend, ServiceError, Session};
use gestibank_core::config::LoadOptions;
use serde::Serialize;
use tracing::info;

use super::{block_on, exchange_credentials, load_config, CommandResult, Reply};

#[derive(Debug, Serialize)]
struct LoginReply {
    token: String,
    email: String,
    role: String,
    user_id: Option<i64>,
}

/// Exchanges the configured email/password for a bearer token.
pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("login", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    if !config.auth.has_credentials() {
        return CommandResult::failure(
            "login",
            "config_validation",
            "login needs GESTIBANK_AUTH_EMAIL and GESTIBANK_AUTH_PASSWORD (or --email)",
            super::EXIT_CONFIG,
        );
    }

    block_on("login", async move {
        let result = async {
            let backend = HttpBackend::from_config(&config.api)?;
            let token = exchange_credentials(&backend, &config.auth).await?;
            let session = Session::from_token(&token)?;
            Ok::<_, ServiceError>((token, session))
        }
        .await;

        match result {
            Ok((token, session)) => {
                info!(
                    event_name = "cli.login.succeeded",
                    role = %session.role,
                    "session token issued"
                );
                let reply = LoginReply {
                    token,
                    email: session.email.clone(),
                    role: session.role.to_string(),
                    user_id: session.user_id.map(|id| id.0),
                };
                CommandResult::success_with(
                    "login",
                    Reply::new(
                        format!(
                            "logged in as {} ({}); export GESTIBANK_AUTH_TOKEN to reuse the session",
                            reply.email, reply.role
                        ),
                        &reply,
                    ),
                )
            }
            Err(error) => CommandResult::from_service_error("login", error),
        }
    })
}
