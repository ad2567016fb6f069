use std::{env, sync::Arc};

use crate::config::Config;

pub trait ConfigService: Send + Sync {
    fn port(&self) -> u16;
    fn values(&self) -> &Config;
}

pub struct ConfigServiceImpl {
    config: Arc<Config>,
}

impl ConfigServiceImpl {
    fn strip_wrapping_quotes(value: &str) -> &str {
        if value.len() >= 2 {
            let bytes = value.as_bytes();
            let first = bytes[0];
            let last = bytes[value.len() - 1];
            if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
                return &value[1..value.len() - 1];
            }
        }
        value
    }

    fn env_nonempty(key: &str) -> Option<String> {
        env::var(key).ok().and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            let normalized = Self::strip_wrapping_quotes(trimmed).trim();
            if normalized.is_empty() {
                None
            } else {
                Some(normalized.to_string())
            }
        })
    }

    fn env_u16(key: &str) -> Option<u16> {
        Self::env_nonempty(key).and_then(|value| value.parse::<u16>().ok())
    }

    fn env_u32(key: &str) -> Option<u32> {
        Self::env_nonempty(key).and_then(|value| value.parse::<u32>().ok())
    }

    fn env_i64(key: &str) -> Option<i64> {
        Self::env_nonempty(key).and_then(|value| value.parse::<i64>().ok())
    }

    fn env_bool(key: &str, default: bool) -> bool {
        Self::env_nonempty(key)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    fn env_lower_nonempty(key: &str) -> Option<String> {
        Self::env_nonempty(key).map(|value| value.to_ascii_lowercase())
    }

    pub fn new() -> Self {
        let port = Self::env_u16("PORT").unwrap_or(5000);
        let db_pool_size = Self::env_u32("DB_POOL_SIZE").unwrap_or(10);

        let jwt_secret = Self::env_nonempty("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET is not set; using an insecure development secret");
            "dev-secret-change-me".to_string()
        });
        let token_ttl_seconds = Self::env_i64("TOKEN_TTL_SECONDS").unwrap_or(60 * 60 * 24);
        let reset_otp_ttl_seconds = Self::env_i64("RESET_OTP_TTL_SECONDS").unwrap_or(60);

        let upload_dir = Self::env_nonempty("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string());

        let email_provider = Self::env_lower_nonempty("EMAIL_PROVIDER");
        let email_from = Self::env_nonempty("EMAIL_FROM");
        let resend_api_key = Self::env_nonempty("RESEND_API_KEY");
        let smtp_host = Self::env_nonempty("SMTP_HOST");
        let smtp_port = Self::env_u16("SMTP_PORT");
        let smtp_username = Self::env_nonempty("SMTP_USERNAME");
        let smtp_password = Self::env_nonempty("SMTP_PASSWORD");
        let smtp_starttls = Self::env_bool("SMTP_STARTTLS", false);

        Self {
            config: Arc::new(Config {
                port,
                db_pool_size,
                jwt_secret,
                token_ttl_seconds,
                reset_otp_ttl_seconds,
                upload_dir,
                email_provider,
                email_from,
                resend_api_key,
                smtp_host,
                smtp_port,
                smtp_username,
                smtp_password,
                smtp_starttls,
            }),
        }
    }
}

impl ConfigService for ConfigServiceImpl {
    fn port(&self) -> u16 {
        self.config.port
    }

    fn values(&self) -> &Config {
        &self.config
    }
}
