use anyhow::{anyhow, Result};
use concat_string::concat_string;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    crawler::{self, nse::Quoter, FieldSpec, Profile},
    util,
};

/// 原始部署使用的欄位組合:trade_info 區段的前收、開盤、高低價與 VWAP
static TRADE_INFO: Profile = Profile {
    name: "trade_info",
    section: Some("trade_info"),
    roots: &[&["marketDeptOrderBook", "tradeInfo"], &["priceInfo"]],
    fields: &[
        FieldSpec {
            column: "Prev Close",
            paths: &[&["previousClose"]],
        },
        FieldSpec {
            column: "Open",
            paths: &[&["open"]],
        },
        FieldSpec {
            column: "High",
            paths: &[&["intraDayHighLow", "max"]],
        },
        FieldSpec {
            column: "Low",
            paths: &[&["intraDayHighLow", "min"]],
        },
        FieldSpec {
            // 先取 vwap,缺漏時退回 averagePrice,順序不可對調
            column: "VWAP",
            paths: &[&["vwap"], &["averagePrice"]],
        },
    ],
};

/// 替代的欄位組合:priceInfo 的成交價、漲跌幅與 VWAP
static PRICE_INFO: Profile = Profile {
    name: "price_info",
    section: None,
    roots: &[&["priceInfo"]],
    fields: &[
        FieldSpec {
            column: "LTP",
            paths: &[&["lastPrice"]],
        },
        FieldSpec {
            column: "Change %",
            paths: &[&["pChange"]],
        },
        FieldSpec {
            column: "VWAP",
            paths: &[&["vwap"], &["averagePrice"]],
        },
    ],
};

/// 依名稱取得內建的報價欄位組合
pub fn profile(name: &str) -> Result<&'static Profile> {
    match name {
        "trade_info" => Ok(&TRADE_INFO),
        "price_info" => Ok(&PRICE_INFO),
        _ => Err(anyhow!(
            "Unknown quote profile '{}', expected trade_info or price_info",
            name
        )),
    }
}

impl Quoter {
    /// 抓取單一股票的報價,回傳值與 Profile 的欄位順序對齊。
    ///
    /// 網路失敗、逾時、回應非 JSON 或找不到欄位群都視為整筆失敗;
    /// 個別欄位缺漏則以 None 表示,不影響其餘欄位。
    pub async fn quote(&self, stock_symbol: &str) -> Result<Vec<Option<Decimal>>> {
        let url = quote_url(&self.host, self.profile, stock_symbol);
        let payload = util::http::get_json::<Value>(
            &self.client,
            &url,
            Some(self.headers.clone()),
        )
        .await
        .map_err(|why| anyhow!("Failed to fetch quote({}) because {:?}", stock_symbol, why))?;

        parse_payload(self.profile, stock_symbol, &payload)
    }
}

fn quote_url(host: &str, profile: &Profile, stock_symbol: &str) -> String {
    let mut url = concat_string!(
        "https://",
        host,
        "/api/quote-equity?symbol=",
        urlencoding::encode(stock_symbol)
    );

    if let Some(section) = profile.section {
        url.push_str("&section=");
        url.push_str(section);
    }

    url
}

fn parse_payload(
    profile: &Profile,
    stock_symbol: &str,
    payload: &Value,
) -> Result<Vec<Option<Decimal>>> {
    let group = crawler::locate_group(payload, profile.roots).ok_or_else(|| {
        anyhow!(
            "Failed to locate quote fields for {} because the payload is empty or malformed",
            stock_symbol
        )
    })?;

    Ok(profile
        .fields
        .iter()
        .map(|field| crawler::extract_field(group, field))
        .collect())
}
