use std::{collections::HashMap, fs};

#[derive(Debug, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub secret_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".into(),
            secret_key: String::new(),
        }
    }
}

/// Settings come from `webhook.toml` in the working directory, overridden by
/// environment variables. The secret key has no default on purpose.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("webhook.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings);

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("bind_addr") {
            settings.bind_addr = v.clone();
        }
        if let Some(v) = file_cfg.get("secret_key") {
            settings.secret_key = v.clone();
        }
    }
}

fn apply_env(settings: &mut Settings) {
    if let Ok(v) = std::env::var("WEBHOOK_BIND") {
        settings.bind_addr = v;
    }
    if let Ok(v) = std::env::var("WEBHOOK_SECRET_KEY") {
        settings.secret_key = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            "bind_addr = \"0.0.0.0:8080\"\nsecret_key = \"s3cret\"\n",
        );
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
        assert_eq!(settings.secret_key, "s3cret");
    }

    #[test]
    fn unknown_keys_and_garbage_are_ignored() {
        let mut settings = Settings::default();
        apply_file(&mut settings, "not valid toml [");
        assert_eq!(settings, Settings::default());

        apply_file(&mut settings, "unrelated = \"value\"");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut settings = Settings::default();
        apply_file(&mut settings, "secret_key = \"from-file\"");

        std::env::set_var("WEBHOOK_SECRET_KEY", "from-env");
        apply_env(&mut settings);
        std::env::remove_var("WEBHOOK_SECRET_KEY");

        assert_eq!(settings.secret_key, "from-env");
    }
}
