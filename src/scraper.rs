use std::fmt;

use crate::config::Config;
use color_eyre::{Result, eyre::Context};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum_macros::{Display, VariantArray};
use url::Url;

static BUILD_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://[^/]+/_next/static/([A-Za-z0-9_-]+)/_ssgManifest\.js")
        .expect("build ID pattern is valid")
});

const DEFAULT_CURRENCY: &str = "USD";

/// Storefront sections, in the order every cycle walks them.
#[derive(Display, Debug, VariantArray, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    #[strum(to_string = "Switching")]
    Switching,
    #[strum(to_string = "Cloud Gateways")]
    CloudGateways,
    #[strum(to_string = "WiFi")]
    Wifi,
    #[strum(to_string = "Cameras & NVRs")]
    CamerasNvrs,
    #[strum(to_string = "Door Access")]
    DoorAccess,
    #[strum(to_string = "Cloud Keys & Gateways")]
    CloudKeysGateways,
    #[strum(to_string = "Power Tech")]
    PowerTech,
    #[strum(to_string = "Integrations")]
    Integrations,
    #[strum(to_string = "Accessories, Cables & DACs")]
    AccessoriesCablesDacs,
}

impl Category {
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Switching => "all-switching",
            Self::CloudGateways => "all-unifi-cloud-gateways",
            Self::Wifi => "all-wifi",
            Self::CamerasNvrs => "all-cameras-nvrs",
            Self::DoorAccess => "all-door-access",
            Self::CloudKeysGateways => "all-cloud-keys-gateways",
            Self::PowerTech => "all-power-tech",
            Self::Integrations => "all-integrations",
            Self::AccessoriesCablesDacs => "accessories-cables-dacs",
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn currency_or_usd<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|c| !c.is_empty())
        .unwrap_or_else(default_currency))
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.into()
}

pub type ProductId = String;

/// A catalog entry. Absent optional fields are filled in while parsing, so a
/// `Product` always serializes in its normalized shape.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail: Thumbnail,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variants: Vec<Variant>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Thumbnail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_price: DisplayPrice,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisplayPrice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default = "default_currency", deserialize_with = "currency_or_usd")]
    pub currency: String,
}

impl Default for DisplayPrice {
    fn default() -> Self {
        Self {
            amount: None,
            currency: default_currency(),
        }
    }
}

impl DisplayPrice {
    fn label(&self) -> Option<String> {
        self.amount.map(|amount| format!("{amount} {}", self.currency))
    }
}

impl Product {
    /// Human-readable price summary across all variants.
    pub fn price_label(&self) -> String {
        let prices: Vec<String> = self
            .variants
            .iter()
            .filter_map(|v| v.display_price.label())
            .collect();

        match prices.as_slice() {
            [] => "no price".into(),
            [first, rest @ ..] if rest.iter().all(|p| p == first) => first.clone(),
            many => many.join(", "),
        }
    }
}

/// The storefront HTML carried no `_ssgManifest.js` asset reference.
#[derive(Debug)]
pub struct BuildIdNotFound;

impl fmt::Display for BuildIdNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build ID not found in storefront HTML")
    }
}

impl std::error::Error for BuildIdNotFound {}

/// Finds the first `https://<host>/_next/static/<ID>/_ssgManifest.js`
/// anywhere in the page, markup or inline script alike.
pub fn extract_build_id(html: &str) -> Result<String> {
    BUILD_ID_RE
        .captures(html)
        .map(|c| c[1].to_string())
        .ok_or_else(|| BuildIdNotFound.into())
}

#[derive(Deserialize, Default)]
struct CategoryPage {
    #[serde(rename = "pageProps", default, deserialize_with = "null_as_default")]
    page_props: PageProps,
}

#[derive(Deserialize, Default)]
struct PageProps {
    #[serde(rename = "subCategories", default, deserialize_with = "null_as_default")]
    sub_categories: Vec<SubCategory>,
}

#[derive(Deserialize, Default)]
struct SubCategory {
    #[serde(default, deserialize_with = "null_as_default")]
    products: Vec<Value>,
}

/// Flattens every subcategory's products, preserving listing order. A
/// product that does not fit the model is skipped on its own.
pub fn parse_category(body: &str) -> Result<Vec<Product>> {
    let page: CategoryPage =
        serde_json::from_str(body).wrap_err("unexpected category payload shape")?;
    Ok(page
        .page_props
        .sub_categories
        .into_iter()
        .flat_map(|sc| sc.products)
        .filter_map(|raw| match serde_json::from_value(raw) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!("Skipping malformed product: {e}");
                None
            }
        })
        .collect())
}

/// Read side of the storefront, as seen by the monitor.
pub trait Catalog {
    /// Resolves the current deployment's build ID.
    fn build_id(&self) -> Result<String>;
    fn category_products(&self, build_id: &str, category: Category) -> Result<Vec<Product>>;
}

pub struct StoreClient {
    client: Client,
    home_url: Url,
    data_url: Url,
    region: String,
    language: String,
}

impl StoreClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .wrap_err("failed to build storefront client")?;
        Ok(Self::with_client(client, config))
    }

    fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            home_url: config.home_url.clone(),
            data_url: config.data_url.clone(),
            region: config.region.clone(),
            language: config.language.clone(),
        }
    }

    pub fn category_url(&self, build_id: &str, category: Category) -> Result<Url> {
        let mut url = self.data_url.join(&format!(
            "/_next/data/{build_id}/{}/{}.json",
            self.region, self.language
        ))?;
        url.query_pairs_mut()
            .append_pair("category", category.key())
            .append_pair("store", &self.region)
            .append_pair("language", &self.language);
        Ok(url)
    }

    fn get_text(&self, url: Url) -> Result<String> {
        debug!("GET {url}");
        self.client
            .get(url)
            .send()?
            .error_for_status()?
            .text()
            .map_err(Into::into)
    }
}

impl Catalog for StoreClient {
    fn build_id(&self) -> Result<String> {
        let html = self
            .get_text(self.home_url.clone())
            .wrap_err("failed to fetch storefront home page")?;
        extract_build_id(&html)
    }

    fn category_products(&self, build_id: &str, category: Category) -> Result<Vec<Product>> {
        let body = self
            .get_text(self.category_url(build_id, category)?)
            .wrap_err_with(|| format!("failed to fetch category {}", category.key()))?;
        parse_category(&body)
    }
}
