use std::path::PathBuf;
use std::time::Duration;

use color_eyre::{Result, eyre::Context};
use serde::Deserialize;
use url::Url;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Report new products in-process through the logger.
    #[default]
    Log,
    /// POST each new product to `http://localhost:<PORT>/api/products`.
    /// This process serves no such endpoint; an external sink must be
    /// listening there, otherwise every delivery is logged as a failure.
    Http,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(rename = "unifi_home_url", default = "default_home_url")]
    pub home_url: Url,
    #[serde(rename = "store_data_url", default = "default_data_url")]
    pub data_url: Url,
    #[serde(rename = "store_region", default = "default_region")]
    pub region: String,
    #[serde(rename = "store_language", default = "default_language")]
    pub language: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub notifier: NotifierKind,
    #[serde(default = "default_products_file")]
    pub products_file: PathBuf,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub max_cycles: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_home_url() -> Url {
    Url::parse("https://store.ui.com/us/en").expect("default home URL is valid")
}

fn default_data_url() -> Url {
    Url::parse("https://store.ui.com").expect("default data URL is valid")
}

fn default_region() -> String {
    "us".into()
}

fn default_language() -> String {
    "en".into()
}

const fn default_port() -> u16 {
    3001
}

fn default_products_file() -> PathBuf {
    "products.json".into()
}

const fn default_poll_interval_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36".into()
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().wrap_err("failed to load config")
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn sink_url(&self) -> Result<Url> {
        Url::parse(&format!("http://localhost:{}/api/products", self.port))
            .wrap_err("invalid sink URL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config: Config = envy::from_iter(vars(&[])).unwrap();
        assert_eq!(config.home_url.as_str(), "https://store.ui.com/us/en");
        assert_eq!(config.data_url.as_str(), "https://store.ui.com/");
        assert_eq!(config.region, "us");
        assert_eq!(config.language, "en");
        assert_eq!(config.port, 3001);
        assert_eq!(config.notifier, NotifierKind::Log);
        assert_eq!(config.products_file, PathBuf::from("products.json"));
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.max_cycles, None);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config: Config = envy::from_iter(vars(&[
            ("UNIFI_HOME_URL", "https://store.ui.com/ca/en"),
            ("STORE_REGION", "ca"),
            ("PORT", "8080"),
            ("NOTIFIER", "http"),
            ("POLL_INTERVAL_SECS", "5"),
            ("MAX_CYCLES", "1"),
        ]))
        .unwrap();
        assert_eq!(config.home_url.as_str(), "https://store.ui.com/ca/en");
        assert_eq!(config.region, "ca");
        assert_eq!(config.port, 8080);
        assert_eq!(config.notifier, NotifierKind::Http);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.max_cycles, Some(1));
    }

    #[test]
    fn sink_url_targets_local_products_endpoint() {
        let config: Config = envy::from_iter(vars(&[("PORT", "4000")])).unwrap();
        assert_eq!(
            config.sink_url().unwrap().as_str(),
            "http://localhost:4000/api/products"
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(envy::from_iter::<_, Config>(vars(&[("PORT", "not-a-port")])).is_err());
    }
}
