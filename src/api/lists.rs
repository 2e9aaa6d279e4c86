use serde::Deserialize;
use std::fmt;

use crate::error::{BoardError, Result};

/// Which access list to ask the list service for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    White,
    Black,
}

impl ListKind {
    pub fn as_query(&self) -> &'static str {
        match self {
            ListKind::White => "white",
            ListKind::Black => "black",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// Body of `GET /api/sheet?list=...`
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    pub code: u16,
    #[serde(default)]
    pub wallets: Vec<String>,
}

impl ListResponse {
    /// Unwrap the wallets, rejecting any service code other than 200.
    pub fn into_wallets(self) -> Result<Vec<String>> {
        if self.code != 200 {
            return Err(BoardError::ListServiceCode(self.code));
        }
        Ok(self.wallets)
    }
}

/// Fetch one list from the list service.
pub async fn fetch_list(
    client: &reqwest::Client,
    endpoint: &str,
    kind: ListKind,
) -> Result<Vec<String>> {
    let response = client
        .get(endpoint)
        .query(&[("list", kind.as_query())])
        .header("Content-Type", "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(BoardError::HttpStatus {
            status,
            url: response.url().to_string(),
        });
    }

    let body: ListResponse = response.json().await?;
    body.into_wallets()
}
