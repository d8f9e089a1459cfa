use gestibank_client::{HttpBackend, ProcurementBackend, Session};
use gestibank_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool, options: LoadOptions) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            let session = check_session_token(&config);
            let token_ready = session.status == CheckStatus::Pass;
            checks.push(session);
            checks.push(check_backend_connectivity(&config, token_ready));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "session_token",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "backend_connectivity",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    // Skipped checks are not failures once the configuration itself is valid.
    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_session_token(config: &AppConfig) -> DoctorCheck {
    let Some(token) = config.auth.token.as_ref().filter(|_| config.auth.has_token()) else {
        let (status, details) = if config.auth.has_credentials() {
            (CheckStatus::Skipped, "no token; credentials will be exchanged at login".to_string())
        } else {
            (
                CheckStatus::Fail,
                "neither GESTIBANK_AUTH_TOKEN nor email/password are configured".to_string(),
            )
        };
        return DoctorCheck { name: "session_token", status, details };
    };

    match Session::from_token(token.expose_secret()) {
        Ok(session) => {
            let expiry = session
                .expires_at
                .map(|at| format!(", expires {}", at.to_rfc3339()))
                .unwrap_or_default();
            DoctorCheck {
                name: "session_token",
                status: CheckStatus::Pass,
                details: format!("token for {} as {}{expiry}", session.email, session.role),
            }
        }
        Err(error) => {
            DoctorCheck { name: "session_token", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_backend_connectivity(config: &AppConfig, token_ready: bool) -> DoctorCheck {
    let Some(token) = config.auth.token.clone().filter(|_| token_ready) else {
        return DoctorCheck {
            name: "backend_connectivity",
            status: CheckStatus::Skipped,
            details: "skipped because no usable session token is configured".to_string(),
        };
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "backend_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let backend = HttpBackend::from_config(&config.api)
            .map_err(|error| format!("failed to build http client: {error}"))?
            .with_token(token);
        backend
            .my_profile()
            .await
            .map_err(|error| format!("failed to reach backend: {error}"))
    });

    match result {
        Ok(user) => DoctorCheck {
            name: "backend_connectivity",
            status: CheckStatus::Pass,
            details: format!("reached `{}` as {}", config.api.base_url, user.email),
        },
        Err(error) => {
            DoctorCheck { name: "backend_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
