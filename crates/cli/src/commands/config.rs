use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use gestibank_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field<'a> {
    key: &'a str,
    value: String,
    env_keys: &'a [&'a str],
}

pub fn run(options: LoadOptions) -> String {
    let explicit_path = options.config_path.clone();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = [
        Field {
            key: "api.base_url",
            value: config.api.base_url.clone(),
            env_keys: &["GESTIBANK_API_BASE_URL"],
        },
        Field {
            key: "api.timeout_secs",
            value: config.api.timeout_secs.to_string(),
            env_keys: &["GESTIBANK_API_TIMEOUT_SECS"],
        },
        Field {
            key: "api.page_size",
            value: config.api.page_size.to_string(),
            env_keys: &["GESTIBANK_API_PAGE_SIZE"],
        },
        Field {
            key: "auth.token",
            value: redact_token(config.auth.token.as_ref().map(|token| token.expose_secret())),
            env_keys: &["GESTIBANK_AUTH_TOKEN"],
        },
        Field {
            key: "auth.email",
            value: config.auth.email.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["GESTIBANK_AUTH_EMAIL"],
        },
        Field {
            key: "auth.password",
            value: if config.auth.password.is_some() { "<redacted>" } else { "<unset>" }
                .to_string(),
            env_keys: &["GESTIBANK_AUTH_PASSWORD"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["GESTIBANK_LOGGING_LEVEL", "GESTIBANK_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["GESTIBANK_LOGGING_FORMAT", "GESTIBANK_LOG_FORMAT"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn detect_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then_some(path);
    }

    ["gestibank.toml", "config/gestibank.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

// JWTs are three dot-separated segments; the header segment is not secret.
fn redact_token(token: Option<&str>) -> String {
    let Some(token) = token.map(str::trim) else {
        return "<unset>".to_string();
    };
    if token.is_empty() {
        return "<empty>".to_string();
    }

    match token.split_once('.').and_then(|(header, _)| header.get(..8)) {
        Some(prefix) => format!("{prefix}…(redacted)"),
        None => "<redacted>".to_string(),
    }
}
