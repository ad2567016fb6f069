use lettre::{
    message::{header, Mailbox, Message},
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;

use crate::config::Config;

#[derive(Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

const RESET_SUBJECT: &str = "Your password reset code";

fn build_reset_code_html(code: &str, ttl_seconds: i64) -> String {
    format!(
        concat!(
            "<div style=\"font-family:ui-sans-serif,system-ui,-apple-system,Segoe UI,Roboto,Helvetica,Arial;line-height:1.5\">",
            "<h2 style=\"margin:0 0 12px\">Password reset</h2>",
            "<p style=\"margin:0 0 12px\">Use this code to reset your password:</p>",
            "<p style=\"margin:0 0 12px;font-size:28px;font-weight:700;letter-spacing:6px\">{code}</p>",
            "<p style=\"margin:0 0 12px\">The code expires in {ttl} seconds.</p>",
            "<p style=\"margin:18px 0 0;color:#666;font-size:12px\">If you did not request this, you can ignore this email.</p>",
            "</div>"
        ),
        code = code,
        ttl = ttl_seconds
    )
}

/// Deliver the plaintext reset code. An `Err` here means the provider
/// rejected the send synchronously (or none is configured); the caller
/// surfaces that without touching the already-stored code.
pub async fn try_send_reset_code(
    cfg: &Config,
    to: &str,
    code: &str,
    ttl_seconds: i64,
) -> Result<(), String> {
    let Some(from) = cfg.email_from.as_deref() else {
        return Err("EMAIL_FROM is not configured".to_string());
    };

    let provider = cfg.email_provider.as_deref().unwrap_or("auto");
    match provider {
        "smtp" => {
            let (Some(host), Some(port)) = (cfg.smtp_host.as_deref(), cfg.smtp_port) else {
                return Err("EMAIL_PROVIDER=smtp but SMTP_HOST/SMTP_PORT are missing".to_string());
            };
            send_reset_code_smtp(
                host,
                port,
                cfg.smtp_starttls,
                cfg.smtp_username.as_deref(),
                cfg.smtp_password.as_deref(),
                from,
                to,
                code,
                ttl_seconds,
            )
            .await
        }
        "resend" => {
            let Some(api_key) = cfg.resend_api_key.as_deref() else {
                return Err("EMAIL_PROVIDER=resend but RESEND_API_KEY is missing".to_string());
            };
            send_reset_code_resend(api_key, from, to, code, ttl_seconds).await
        }
        "auto" => {
            if let (Some(host), Some(port)) = (cfg.smtp_host.as_deref(), cfg.smtp_port) {
                return send_reset_code_smtp(
                    host,
                    port,
                    cfg.smtp_starttls,
                    cfg.smtp_username.as_deref(),
                    cfg.smtp_password.as_deref(),
                    from,
                    to,
                    code,
                    ttl_seconds,
                )
                .await;
            }
            if let Some(api_key) = cfg.resend_api_key.as_deref() {
                return send_reset_code_resend(api_key, from, to, code, ttl_seconds).await;
            }
            Err("no email provider configured".to_string())
        }
        other => Err(format!(
            "unsupported EMAIL_PROVIDER={}, expected smtp|resend|auto",
            other
        )),
    }
}

async fn send_reset_code_resend(
    api_key: &str,
    from: &str,
    to: &str,
    code: &str,
    ttl_seconds: i64,
) -> Result<(), String> {
    let client = reqwest::Client::new();
    let html = build_reset_code_html(code, ttl_seconds);

    let payload = ResendEmailRequest {
        from,
        to: vec![to],
        subject: RESET_SUBJECT,
        html: &html,
    };

    let res = client
        .post("https://api.resend.com/emails")
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&payload)
        .send()
        .await
        .map_err(|err| format!("resend request failed: {}", err))?;

    if res.status() == StatusCode::OK || res.status() == StatusCode::CREATED {
        return Ok(());
    }

    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    Err(format!("resend returned {}: {}", status, body))
}

#[allow(clippy::too_many_arguments)]
async fn send_reset_code_smtp(
    host: &str,
    port: u16,
    starttls: bool,
    username: Option<&str>,
    password: Option<&str>,
    from: &str,
    to: &str,
    code: &str,
    ttl_seconds: i64,
) -> Result<(), String> {
    let html = build_reset_code_html(code, ttl_seconds);

    let from: Mailbox = from
        .parse()
        .map_err(|err| format!("invalid EMAIL_FROM: {}", err))?;
    let to: Mailbox = to
        .parse()
        .map_err(|err| format!("invalid recipient email: {}", err))?;

    let msg = Message::builder()
        .from(from)
        .to(to)
        .subject(RESET_SUBJECT)
        .header(header::ContentType::TEXT_HTML)
        .body(html)
        .map_err(|err| format!("build message failed: {}", err))?;

    let mut builder = if starttls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|err| format!("smtp transport init failed: {}", err))?
            .port(port)
            .timeout(Some(Duration::from_secs(10)))
    } else {
        // Mailpit (local/CI) uses plain SMTP by default.
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .timeout(Some(Duration::from_secs(10)))
    };

    if let (Some(username), Some(password)) = (username, password) {
        builder = builder.credentials(lettre::transport::smtp::authentication::Credentials::new(
            username.to_string(),
            password.to_string(),
        ));
    }

    let transport = builder.build();
    transport
        .send(msg)
        .await
        .map_err(|err| format!("smtp send failed: {}", err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_email_body_carries_code_and_ttl() {
        let html = build_reset_code_html("042137", 60);
        assert!(html.contains("042137"));
        assert!(html.contains("60 seconds"));
    }
}
