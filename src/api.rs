use std::env;

use anyhow::{Context, Result};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::pagination::{Page, collect_all, for_each_item};
use crate::report::{DateParam, ReportQuery};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub page_size: u32,
    /// Replaces the public AdSense endpoint, e.g. for a local mock server.
    pub base_url: Option<Url>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let access_token = env::var("ADSENSE_ACCESS_TOKEN")
            .context("Missing env ADSENSE_ACCESS_TOKEN (OAuth2 bearer token with AdSense scope)")?;
        let page_size = match env::var("ADSENSE_PAGE_SIZE") {
            Ok(raw) => parse_page_size(&raw)?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };
        let base_url = match env::var("ADSENSE_BASE_URL") {
            Ok(raw) => Some(
                Url::parse(&raw)
                    .with_context(|| format!("ADSENSE_BASE_URL is not a valid URL: {raw:?}"))?,
            ),
            Err(_) => None,
        };
        Ok(Self {
            access_token,
            page_size,
            base_url,
        })
    }
}

pub fn parse_page_size(raw: &str) -> Result<u32> {
    let size: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("ADSENSE_PAGE_SIZE must be a positive integer, got {raw:?}"))?;
    anyhow::ensure!(size > 0, "ADSENSE_PAGE_SIZE must be a positive integer, got {raw:?}");
    Ok(size)
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub time_zone: Option<TimeZone>,
    pub state: Option<String>,
    pub premium: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TimeZone {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdClient {
    pub name: String,
    #[serde(default)]
    pub reporting_dimension_id: String,
    #[serde(default)]
    pub product_code: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdUnit {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub reporting_dimension_id: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAccountsResponse {
    accounts: Option<Vec<Account>>,
    next_page_token: Option<String>,
}

impl From<ListAccountsResponse> for Page<Account> {
    fn from(r: ListAccountsResponse) -> Self {
        Page::new(r.accounts, r.next_page_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAdClientsResponse {
    ad_clients: Option<Vec<AdClient>>,
    next_page_token: Option<String>,
}

impl From<ListAdClientsResponse> for Page<AdClient> {
    fn from(r: ListAdClientsResponse) -> Self {
        Page::new(r.ad_clients, r.next_page_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAdUnitsResponse {
    ad_units: Option<Vec<AdUnit>>,
    next_page_token: Option<String>,
}

impl From<ListAdUnitsResponse> for Page<AdUnit> {
    fn from(r: ListAdUnitsResponse) -> Self {
        Page::new(r.ad_units, r.next_page_token)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportResult {
    #[serde(default)]
    pub headers: Vec<ReportHeader>,
    #[serde(default)]
    pub rows: Vec<ReportRow>,
    pub total_matched_rows: Option<String>,
    pub start_date: Option<DateParam>,
    pub end_date: Option<DateParam>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReportRow {
    #[serde(default)]
    pub cells: Vec<ReportCell>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReportCell {
    #[serde(default)]
    pub value: String,
}

/// Checks the status of a finished request and decodes its JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(method: &'static str, res: Response) -> Result<T> {
    let url = res.url().to_string();
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        return Err(ApiError::Status {
            method,
            url,
            status,
            body: text,
        }
        .into());
    }
    debug!("{} ok: {} ({} bytes)", method, url, text.len());
    serde_json::from_str(&text).context("Failed to parse JSON response")
}

pub(crate) fn http_client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("adreport/", env!("CARGO_PKG_VERSION")))
        .use_rustls_tls()
        .build()?)
}

pub struct AdSenseClient {
    http: Client,
    base_url: Url,
    config: Config,
}

impl AdSenseClient {
    pub fn new(config: Config) -> Result<Self> {
        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => Url::parse("https://adsense.googleapis.com/")?,
        };
        Ok(Self {
            http: http_client()?,
            base_url,
            config,
        })
    }

    /// Overrides the base URL for API requests. Useful for tests with a mock server.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<T> {
        let url = self.base_url.join(path)?;
        let res = self
            .http
            .get(url)
            .bearer_auth(&self.config.access_token)
            .query(query)
            .send()
            .await?;
        read_json("GET", res).await
    }

    async fn list_page<R, T>(&self, path: &str, page_token: Option<String>) -> Result<Page<T>>
    where
        R: DeserializeOwned + Into<Page<T>>,
    {
        let mut query = vec![("pageSize".to_string(), self.config.page_size.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken".to_string(), token));
        }
        let response: R = self.get(path, &query).await?;
        Ok(response.into())
    }

    async fn list_all<R, T>(&self, path: &str) -> Result<Vec<T>>
    where
        R: DeserializeOwned + Into<Page<T>>,
    {
        collect_all(|token| self.list_page::<R, T>(path, token)).await
    }

    async fn list_each<R, T>(&self, path: &str, on_item: impl FnMut(T)) -> Result<usize>
    where
        R: DeserializeOwned + Into<Page<T>>,
    {
        for_each_item(|token| self.list_page::<R, T>(path, token), on_item).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.list_all::<ListAccountsResponse, _>("v2/accounts").await
    }

    pub async fn for_each_account(&self, on_item: impl FnMut(Account)) -> Result<usize> {
        self.list_each::<ListAccountsResponse, _>("v2/accounts", on_item)
            .await
    }

    /// `account_name` is a resource name such as `accounts/pub-1234`.
    pub async fn list_ad_clients(&self, account_name: &str) -> Result<Vec<AdClient>> {
        let path = format!("v2/{}/adclients", account_name);
        self.list_all::<ListAdClientsResponse, _>(&path).await
    }

    pub async fn for_each_ad_client(
        &self,
        account_name: &str,
        on_item: impl FnMut(AdClient),
    ) -> Result<usize> {
        let path = format!("v2/{}/adclients", account_name);
        self.list_each::<ListAdClientsResponse, _>(&path, on_item)
            .await
    }

    /// `ad_client_name` is a resource name such as `accounts/pub-1234/adclients/ca-pub-1234`.
    pub async fn list_ad_units(&self, ad_client_name: &str) -> Result<Vec<AdUnit>> {
        let path = format!("v2/{}/adunits", ad_client_name);
        self.list_all::<ListAdUnitsResponse, _>(&path).await
    }

    pub async fn for_each_ad_unit(
        &self,
        ad_client_name: &str,
        on_item: impl FnMut(AdUnit),
    ) -> Result<usize> {
        let path = format!("v2/{}/adunits", ad_client_name);
        self.list_each::<ListAdUnitsResponse, _>(&path, on_item)
            .await
    }

    pub async fn generate_report(&self, account_name: &str, query: &ReportQuery) -> Result<ReportResult> {
        let path = format!("v2/{}/reports:generate", account_name);
        self.get(&path, &query.to_query_pairs()).await
    }
}
