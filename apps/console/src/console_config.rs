use std::env;
use std::time::Duration;

use opshub_application::HistoryPolicy;
use opshub_core::AppError;
use opshub_domain::UserId;
use opshub_infrastructure::DEFAULT_API_BASE_URL;
use tracing_subscriber::EnvFilter;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub acting_user_id: Option<UserId>,
    pub http_timeout: Duration,
    pub history_policy: HistoryPolicy,
}

impl ConsoleConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_url =
            optional("OPSHUB_API_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        let acting_user_id = optional("OPSHUB_ACTING_USER_ID")
            .map(|value| {
                value.parse::<UserId>().map_err(|error| {
                    AppError::Validation(format!("invalid OPSHUB_ACTING_USER_ID: {error}"))
                })
            })
            .transpose()?;

        let http_timeout_secs = optional("OPSHUB_HTTP_TIMEOUT_SECS")
            .map(|value| {
                value.trim().parse::<u64>().map_err(|error| {
                    AppError::Validation(format!("invalid OPSHUB_HTTP_TIMEOUT_SECS: {error}"))
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .max(1);

        let history_policy = match optional("OPSHUB_HISTORY_POLICY")
            .unwrap_or_else(|| "replace".to_owned())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "replace" => HistoryPolicy::Replace,
            "push" => HistoryPolicy::PushNavigation,
            other => {
                return Err(AppError::Validation(format!(
                    "OPSHUB_HISTORY_POLICY must be either 'replace' or 'push', got '{other}'"
                )));
            }
        };

        Ok(Self {
            api_url,
            acting_user_id,
            http_timeout: Duration::from_secs(http_timeout_secs),
            history_policy,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
