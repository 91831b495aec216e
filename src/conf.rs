use config::{Config, ConfigError, Environment};
use lazy_static::lazy_static;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub service_name: String,
    pub listen_port: String,
    pub database_url: String,
    pub database_pool_max_connections: u32,
    //email
    pub from_email: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    //ai
    pub ai_endpoint: String,
    pub ai_provider: String,
    pub ai_model: String,
    pub ai_key: String,
    //object storage
    pub s3_endpoint: String,
    #[serde(default = "default_s3_region")]
    pub s3_region: String,
    pub s3_bucket_name: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    //pdf rendering
    #[serde(default = "default_pdftoppm_path")]
    pub pdftoppm_path: String,
    #[serde(default = "default_pdftoppm_timeout_secs")]
    pub pdftoppm_timeout_secs: u64,
}

fn default_s3_region() -> String {
    "us-east-1".into()
}

fn default_pdftoppm_path() -> String {
    "pdftoppm".into()
}

fn default_pdftoppm_timeout_secs() -> u64 {
    30
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .add_source(Environment::default())
            .build()?;
        let mut s: Settings = conf.try_deserialize()?;
        apply_provider_defaults(&mut s);
        Ok(s)
    }
}

fn apply_provider_defaults(s: &mut Settings) {
    match s.ai_provider.as_str() {
        "ollama" => {
            s.ai_key = "ollama".into();
            s.ai_endpoint = "http://localhost:11434/v1".into();
            if s.ai_model.is_empty() {
                s.ai_model = "gemma3:12b".into();
            }
        }
        "openai" => {
            s.ai_endpoint = "https://api.openai.com/v1".into();
            if s.ai_model.is_empty() {
                s.ai_model = "gpt-4o-mini".into();
            }
        }
        "gemini" => {
            s.ai_endpoint = "https://generativelanguage.googleapis.com/v1beta/openai".into();
            if s.ai_model.is_empty() {
                s.ai_model = "gemini-2.5-flash".into();
            }
        }
        _ => {}
    }
}

lazy_static! {
    pub static ref settings: Settings = Settings::new().expect("improperly configured");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_settings() -> Settings {
        Settings {
            service_name: "resumind".into(),
            listen_port: "8000".into(),
            database_url: "postgres://localhost/resumind".into(),
            database_pool_max_connections: 5,
            from_email: "noreply@resumind.dev".into(),
            smtp_user: "user".into(),
            smtp_pass: "pass".into(),
            smtp_server: "smtp.resumind.dev".into(),
            smtp_port: 465,
            ai_endpoint: String::new(),
            ai_provider: String::new(),
            ai_model: String::new(),
            ai_key: String::new(),
            s3_endpoint: "http://localhost:9000".into(),
            s3_region: default_s3_region(),
            s3_bucket_name: "resumind".into(),
            s3_access_key: "minioadmin".into(),
            s3_secret_key: "minioadmin".into(),
            pdftoppm_path: default_pdftoppm_path(),
            pdftoppm_timeout_secs: default_pdftoppm_timeout_secs(),
        }
    }

    #[test]
    fn test_ollama_defaults() {
        let mut s = base_settings();
        s.ai_provider = "ollama".into();
        apply_provider_defaults(&mut s);
        assert_eq!(s.ai_endpoint, "http://localhost:11434/v1");
        assert_eq!(s.ai_model, "gemma3:12b");
        assert_eq!(s.ai_key, "ollama");
    }

    #[test]
    fn test_openai_defaults_keep_configured_model() {
        let mut s = base_settings();
        s.ai_provider = "openai".into();
        s.ai_model = "gpt-4.1".into();
        s.ai_key = "sk-test".into();
        apply_provider_defaults(&mut s);
        assert_eq!(s.ai_endpoint, "https://api.openai.com/v1");
        assert_eq!(s.ai_model, "gpt-4.1");
        assert_eq!(s.ai_key, "sk-test");
    }

    #[test]
    fn test_unknown_provider_left_untouched() {
        let mut s = base_settings();
        s.ai_provider = "vllm".into();
        s.ai_endpoint = "http://gpu-box:8000/v1".into();
        s.ai_model = "qwen2.5".into();
        apply_provider_defaults(&mut s);
        assert_eq!(s.ai_endpoint, "http://gpu-box:8000/v1");
        assert_eq!(s.ai_model, "qwen2.5");
    }
}
