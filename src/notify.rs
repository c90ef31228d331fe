use crate::config::{Config, NotifierKind};
use crate::scraper::Product;

use color_eyre::{Result, eyre::Context};
use log::info;
use reqwest::blocking::Client;
use url::Url;

/// Receives each newly discovered product, one at a time.
pub trait Notifier {
    fn notify(&self, product: &Product) -> Result<()>;
}

/// Reports new products in-process through the logger.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, product: &Product) -> Result<()> {
        info!(
            "New product: {} [{}] ({}) {}",
            product.title,
            product.id,
            product.price_label(),
            product.slug
        );
        Ok(())
    }
}

/// POSTs the full product JSON to a local sink.
pub struct HttpNotifier {
    client: Client,
    url: Url,
}

impl HttpNotifier {
    pub fn new(url: Url) -> Result<Self> {
        let client = Client::builder()
            .build()
            .wrap_err("failed to build notifier client")?;
        Ok(Self { client, url })
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, product: &Product) -> Result<()> {
        info!("POSTing product: {}", product.id);
        self.client
            .post(self.url.clone())
            .json(product)
            .send()?
            .error_for_status()
            .wrap_err_with(|| format!("sink rejected product {}", product.id))?;
        Ok(())
    }
}

/// The notifier picked by configuration.
pub enum Sink {
    Log(LogNotifier),
    Http(HttpNotifier),
}

impl Sink {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(match config.notifier {
            NotifierKind::Log => Self::Log(LogNotifier),
            NotifierKind::Http => Self::Http(HttpNotifier::new(config.sink_url()?)?),
        })
    }
}

impl Notifier for Sink {
    fn notify(&self, product: &Product) -> Result<()> {
        match self {
            Self::Log(n) => n.notify(product),
            Self::Http(n) => n.notify(product),
        }
    }
}
