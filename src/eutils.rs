use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::error::SheetError;

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

pub const SRA_DB: &str = "sra";

/// NCBI E-utilities access, narrowed to the two calls the samplesheet flow
/// needs: a term search returning opaque UIDs and a full-record fetch for
/// one UID.
pub trait EutilsClient: Send + Sync {
    fn esearch(&self, db: &str, term: &str, retmax: u32) -> Result<Vec<String>, SheetError>;
    fn efetch(&self, db: &str, uid: &str) -> Result<String, SheetError>;
}

#[derive(Clone)]
pub struct EutilsHttpClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EutilsHttpClient {
    /// The API key is passed in explicitly at construction; there is no
    /// environment lookup inside the client.
    pub fn new(api_key: Option<String>) -> Result<Self, SheetError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("seqsheet/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SheetError::EutilsHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| SheetError::EutilsHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: EUTILS_BASE.to_string(),
            api_key,
        })
    }

    fn keyed_query(&self, mut query: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(key) = &self.api_key {
            if !key.trim().is_empty() {
                query.push(("api_key", key.trim().to_string()));
            }
        }
        query
    }
}

#[derive(Debug, Deserialize)]
struct EsearchEnvelope {
    #[serde(default)]
    esearchresult: EsearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

impl EutilsClient for EutilsHttpClient {
    fn esearch(&self, db: &str, term: &str, retmax: u32) -> Result<Vec<String>, SheetError> {
        let url = format!("{}/esearch.fcgi", self.base_url);
        let query = self.keyed_query(vec![
            ("db", db.to_string()),
            ("term", term.to_string()),
            ("retmode", "json".to_string()),
            ("retmax", retmax.to_string()),
        ]);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .map_err(|err| SheetError::EutilsHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "esearch request failed".to_string());
            return Err(SheetError::EutilsStatus { status, message });
        }

        let envelope: EsearchEnvelope = response
            .json()
            .map_err(|err| SheetError::EutilsHttp(err.to_string()))?;
        Ok(envelope.esearchresult.idlist)
    }

    fn efetch(&self, db: &str, uid: &str) -> Result<String, SheetError> {
        let url = format!("{}/efetch.fcgi", self.base_url);
        let query = self.keyed_query(vec![
            ("db", db.to_string()),
            ("id", uid.to_string()),
            ("rettype", "full".to_string()),
            ("retmode", "xml".to_string()),
        ]);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .map_err(|err| SheetError::EutilsHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "efetch request failed".to_string());
            return Err(SheetError::EutilsStatus { status, message });
        }

        response
            .text()
            .map_err(|err| SheetError::EutilsHttp(err.to_string()))
    }
}
