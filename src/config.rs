#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub db_pool_size: u32,

    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub reset_otp_ttl_seconds: i64,

    pub upload_dir: String,

    // Optional email delivery for reset codes. When nothing is configured the
    // forgot-password call reports the send as failed (the stored OTP stays
    // valid either way).
    pub email_provider: Option<String>,
    pub email_from: Option<String>,
    pub resend_api_key: Option<String>,

    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_starttls: bool,
}
