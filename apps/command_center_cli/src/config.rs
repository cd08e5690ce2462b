use std::{fs, io::ErrorKind, path::Path};

use anyhow::{bail, Context};
use client_core::{AppConfig, DEFAULT_BASE_URL};
use command_center::{CatalogDefaults, PublicLinks};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "command_center.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub app_id: String,
    pub access_token: Option<String>,
    pub requires_auth: bool,
    /// Origin of the public site; falls back to `base_url`.
    pub public_origin: Option<String>,
    pub defaults: CatalogDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            app_id: String::new(),
            access_token: None,
            requires_auth: true,
            public_origin: None,
            defaults: CatalogDefaults::default(),
        }
    }
}

impl Settings {
    pub fn app_config(&self) -> anyhow::Result<AppConfig> {
        if self.app_id.trim().is_empty() {
            bail!("app_id is not configured; set it in {DEFAULT_CONFIG_FILE} or APP__APP_ID");
        }
        let base_url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url '{}'", self.base_url))?;
        Ok(AppConfig {
            base_url,
            app_id: self.app_id.trim().to_string(),
            access_token: self.access_token.clone(),
            requires_auth: self.requires_auth,
        })
    }

    pub fn public_links(&self) -> anyhow::Result<PublicLinks> {
        let raw = self.public_origin.as_deref().unwrap_or(&self.base_url);
        let origin = Url::parse(raw).with_context(|| format!("invalid public_origin '{raw}'"))?;
        Ok(PublicLinks::new(origin)?)
    }
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_from(path, |key| std::env::var(key).ok())
}

/// Defaults, then the config file, then environment variables.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    let lookup = |keys: &[&str]| keys.iter().rev().find_map(|key| env(*key));

    if let Some(v) = lookup(&["COMMAND_CENTER_BASE_URL", "APP__BASE_URL"]) {
        settings.base_url = v;
    }
    if let Some(v) = lookup(&["COMMAND_CENTER_APP_ID", "APP__APP_ID"]) {
        settings.app_id = v;
    }
    if let Some(v) = lookup(&["COMMAND_CENTER_ACCESS_TOKEN", "APP__ACCESS_TOKEN"]) {
        settings.access_token = Some(v);
    }
    if let Some(v) = lookup(&["APP__PUBLIC_ORIGIN"]) {
        settings.public_origin = Some(v);
    }
    if let Some(v) = lookup(&["APP__REQUIRES_AUTH"]) {
        settings.requires_auth = parse_bool(&v)
            .with_context(|| format!("APP__REQUIRES_AUTH must be a boolean, got '{v}'"))?;
    }

    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let mut table: toml::Table = raw.parse()?;

    if let Some(defaults) = table.remove("defaults") {
        settings.defaults = defaults
            .try_into()
            .context("invalid [defaults] table")?;
    }

    let text = |table: &toml::Table, key: &str| -> anyhow::Result<Option<String>> {
        match table.get(key) {
            None => Ok(None),
            Some(toml::Value::String(v)) => Ok(Some(v.clone())),
            Some(other) => bail!("{key} must be a string, got {}", other.type_str()),
        }
    };

    if let Some(v) = text(&table, "base_url")? {
        settings.base_url = v;
    }
    if let Some(v) = text(&table, "app_id")? {
        settings.app_id = v;
    }
    if let Some(v) = text(&table, "access_token")? {
        settings.access_token = Some(v);
    }
    if let Some(v) = text(&table, "public_origin")? {
        settings.public_origin = Some(v);
    }
    match table.get("requires_auth") {
        None => {}
        Some(toml::Value::Boolean(v)) => settings.requires_auth = *v,
        Some(toml::Value::String(v)) => {
            settings.requires_auth =
                parse_bool(v).with_context(|| format!("requires_auth must be a boolean, got '{v}'"))?
        }
        Some(other) => bail!("requires_auth must be a boolean, got {}", other.type_str()),
    }

    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
