use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use crate::{config, logging, sheet::SheetWriter, util};

const HOST: &str = "sheets.googleapis.com";

/// Google Sheets v4 values API 的窄封裝。
///
/// 只用到三個操作:讀列數、附加多列、從固定列覆寫多列。
/// 憑證是設定提供的 bearer token,token 的取得與更新不在本程式範圍內。
pub struct GoogleSheet {
    client: Client,
    spreadsheet_id: String,
    sheet_name: String,
    token: String,
}

#[derive(Serialize)]
struct ValueRange<'a> {
    #[serde(rename = "majorDimension")]
    major_dimension: &'a str,
    values: &'a [Vec<String>],
}

#[derive(Deserialize, Debug)]
struct ReadValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize, Debug)]
struct UpdateValuesResponse {
    #[serde(rename = "updatedRange", default)]
    updated_range: String,
}

#[derive(Deserialize, Debug)]
struct AppendValuesResponse {
    #[serde(default)]
    updates: Option<UpdateValuesResponse>,
}

impl GoogleSheet {
    pub fn new(cfg: &config::Sheet) -> Result<Self> {
        let client = util::http::build_client(Duration::from_secs(15), "quote_collector")?;

        Ok(GoogleSheet {
            client,
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            sheet_name: cfg.sheet_name.clone(),
            token: cfg.token.clone(),
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "https://{host}/v4/spreadsheets/{id}/values/{range}",
            host = HOST,
            id = self.spreadsheet_id,
            range = urlencoding::encode(range)
        )
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        let bearer = format!("Bearer {}", self.token);

        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&bearer)
                .map_err(|why| anyhow!("Invalid sheet token because {:?}", why))?,
        );

        Ok(headers)
    }
}

#[async_trait]
impl SheetWriter for GoogleSheet {
    async fn row_count(&self) -> Result<usize> {
        let range = format!("{}!A:A", self.sheet_name);
        let url = self.values_url(&range);
        let res = util::http::get_json::<ReadValuesResponse>(
            &self.client,
            &url,
            Some(self.auth_headers()?),
        )
        .await
        .map_err(|why| anyhow!("Failed to read sheet row count because {:?}", why))?;

        Ok(res.values.len())
    }

    async fn append_rows(&self, rows: &[Vec<String>]) -> Result<()> {
        let range = format!("{}!A1", self.sheet_name);
        let url = format!(
            "{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.values_url(&range)
        );
        let body = ValueRange {
            major_dimension: "ROWS",
            values: rows,
        };
        let res = util::http::post_use_json::<ValueRange, AppendValuesResponse>(
            &self.client,
            &url,
            Some(self.auth_headers()?),
            Some(&body),
        )
        .await
        .map_err(|why| anyhow!("Failed to append rows to sheet because {:?}", why))?;

        if let Some(updates) = res.updates {
            logging::debug_file_async(format!("sheet appended {}", updates.updated_range));
        }

        Ok(())
    }

    async fn write_rows(&self, start_row: usize, rows: &[Vec<String>]) -> Result<()> {
        let range = format!("{}!A{}", self.sheet_name, start_row);
        let url = format!(
            "{}?valueInputOption=USER_ENTERED",
            self.values_url(&range)
        );
        let body = ValueRange {
            major_dimension: "ROWS",
            values: rows,
        };
        let res = util::http::put_use_json::<ValueRange, UpdateValuesResponse>(
            &self.client,
            &url,
            Some(self.auth_headers()?),
            Some(&body),
        )
        .await
        .map_err(|why| anyhow!("Failed to overwrite sheet rows because {:?}", why))?;

        logging::debug_file_async(format!("sheet overwrote {}", res.updated_range));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> GoogleSheet {
        let cfg = config::Sheet {
            spreadsheet_id: "sheet-id".to_string(),
            sheet_name: "Sheet1".to_string(),
            token: "token".to_string(),
            mode: "append".to_string(),
            data_start_row: 2,
        };

        GoogleSheet::new(&cfg).unwrap()
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = sheet().values_url("Sheet1!A:A");

        assert_eq!(
            url,
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/Sheet1%21A%3AA"
        );
    }

    #[test]
    fn test_auth_headers() {
        let headers = sheet().auth_headers().unwrap();

        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer token"
        );
    }

    #[tokio::test]
    #[ignore]
    async fn test_row_count() {
        dotenv::dotenv().ok();

        match GoogleSheet::new(&crate::config::SETTINGS.sheet) {
            Ok(sheet) => match sheet.row_count().await {
                Ok(count) => {
                    dbg!(count);
                }
                Err(why) => {
                    crate::logging::debug_file_async(format!(
                        "Failed to row_count because {:?}",
                        why
                    ));
                }
            },
            Err(why) => {
                crate::logging::debug_file_async(format!(
                    "Failed to build GoogleSheet because {:?}",
                    why
                ));
            }
        }
    }
}
