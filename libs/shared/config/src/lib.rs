use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use tracing::warn;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub agent_max_iterations: usize,
    pub agent_turn_timeout: Duration,
    pub session_idle_ttl: Option<Duration>,
    pub clinic_timezone: Tz,
    pub google_calendar_id: String,
    pub google_calendar_access_token: String,
    pub google_calendar_base_url: String,
    pub sendgrid_api_key: String,
    pub email_sender: String,
    pub email_api_base_url: String,
    pub slack_bot_token: String,
    pub slack_channel_id: String,
    pub slack_api_base_url: String,
    pub notify_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 8000,
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            openai_api_key: String::new(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_temperature: 0.7,
            agent_max_iterations: 5,
            agent_turn_timeout: Duration::from_secs(60),
            session_idle_ttl: None,
            clinic_timezone: DEFAULT_TIMEZONE,
            google_calendar_id: String::new(),
            google_calendar_access_token: String::new(),
            google_calendar_base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            sendgrid_api_key: String::new(),
            email_sender: String::new(),
            email_api_base_url: "https://api.sendgrid.com/v3".to_string(),
            slack_bot_token: String::new(),
            slack_channel_id: String::new(),
            slack_api_base_url: "https://slack.com/api".to_string(),
            notify_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            server_port: parse_var("PORT", defaults.server_port),
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, falling back to the in-memory clinic store");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            openai_api_key: env::var("OPENAI_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("OPENAI_API_KEY not set, model calls will fail");
                    String::new()
                }),
            openai_base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_temperature: parse_var("OPENAI_TEMPERATURE", defaults.openai_temperature),
            agent_max_iterations: parse_var("AGENT_MAX_ITERATIONS", defaults.agent_max_iterations),
            agent_turn_timeout: Duration::from_secs(parse_var(
                "AGENT_TURN_TIMEOUT_SECS",
                defaults.agent_turn_timeout.as_secs(),
            )),
            session_idle_ttl: env::var("SESSION_IDLE_TTL_SECS")
                .ok()
                .and_then(|raw| match raw.parse::<u64>() {
                    Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                    _ => {
                        warn!("SESSION_IDLE_TTL_SECS={} is not a positive integer, session pruning disabled", raw);
                        None
                    }
                }),
            clinic_timezone: env::var("CLINIC_TIMEZONE")
                .ok()
                .and_then(|name| match Tz::from_str(&name) {
                    Ok(tz) => Some(tz),
                    Err(_) => {
                        warn!("CLINIC_TIMEZONE={} is not a known IANA zone, using {}", name, DEFAULT_TIMEZONE);
                        None
                    }
                })
                .unwrap_or(DEFAULT_TIMEZONE),
            google_calendar_id: env::var("GOOGLE_CALENDAR_ID").unwrap_or_default(),
            google_calendar_access_token: env::var("GOOGLE_CALENDAR_ACCESS_TOKEN").unwrap_or_default(),
            google_calendar_base_url: env::var("GOOGLE_CALENDAR_BASE_URL")
                .unwrap_or(defaults.google_calendar_base_url),
            sendgrid_api_key: env::var("SENDGRID_API_KEY").unwrap_or_default(),
            email_sender: env::var("EMAIL_SENDER").unwrap_or_default(),
            email_api_base_url: env::var("EMAIL_API_BASE_URL").unwrap_or(defaults.email_api_base_url),
            slack_bot_token: env::var("SLACK_BOT_TOKEN").unwrap_or_default(),
            slack_channel_id: env::var("SLACK_CHANNEL_ID").unwrap_or_default(),
            slack_api_base_url: env::var("SLACK_API_BASE_URL").unwrap_or(defaults.slack_api_base_url),
            notify_timeout: Duration::from_secs(parse_var(
                "NOTIFY_TIMEOUT_SECS",
                defaults.notify_timeout.as_secs(),
            )),
        };

        if !config.is_database_configured() {
            warn!("Supabase not configured - appointments will not survive a restart");
        }
        if !config.is_calendar_configured() {
            warn!("Google Calendar not configured - calendar events will be skipped");
        }
        if !config.is_email_configured() {
            warn!("Email not configured - confirmation emails will be skipped");
        }
        if !config.is_slack_configured() {
            warn!("Slack not configured - summary reports will not be posted");
        }

        config
    }

    pub fn is_database_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn is_model_configured(&self) -> bool {
        !self.openai_api_key.is_empty()
    }

    pub fn is_calendar_configured(&self) -> bool {
        !self.google_calendar_id.is_empty() && !self.google_calendar_access_token.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.sendgrid_api_key.is_empty() && !self.email_sender.is_empty()
    }

    pub fn is_slack_configured(&self) -> bool {
        !self.slack_bot_token.is_empty() && !self.slack_channel_id.is_empty()
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{}={} could not be parsed, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
