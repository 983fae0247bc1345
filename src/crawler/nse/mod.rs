use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{header, Client};

use crate::{config, crawler::Profile, util};

/// 即時報價
pub mod quote;

/// NSE 報價工作階段。
///
/// 連線(含 cookie)與標頭由建構時準備好,輪詢迴圈以參考傳遞使用,
/// 不依賴全域狀態。
pub struct Quoter {
    client: Client,
    headers: header::HeaderMap,
    profile: &'static Profile,
    host: String,
}

impl Quoter {
    /// 依設定建立工作階段並完成暖身
    pub async fn new(cfg: &config::Nse) -> Result<Self> {
        let profile = quote::profile(&cfg.profile)?;
        let client = util::http::build_client(
            Duration::from_secs(cfg.request_timeout_secs),
            &cfg.user_agent,
        )?;
        let headers = build_headers(cfg)?;
        let quoter = Quoter {
            client,
            headers,
            profile,
            host: cfg.host.clone(),
        };

        quoter.warm_up().await?;

        Ok(quoter)
    }

    /// 先造訪首頁讓 cookie store 取得必要的 cookies,
    /// 未帶 cookies 直接呼叫報價 API 會被 NSE 拒絕
    pub async fn warm_up(&self) -> Result<()> {
        let url = format!("https://{}", self.host);

        util::http::get_response(&self.client, &url, Some(self.headers.clone()))
            .await
            .map_err(|why| anyhow!("Failed to warm up NSE session because {:?}", why))?;

        Ok(())
    }

    pub fn profile(&self) -> &'static Profile {
        self.profile
    }
}

fn build_headers(cfg: &config::Nse) -> Result<header::HeaderMap> {
    let mut headers = header::HeaderMap::new();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&cfg.user_agent)
            .map_err(|why| anyhow!("Invalid user_agent header value because {:?}", why))?,
    );
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_str(&cfg.accept)
            .map_err(|why| anyhow!("Invalid accept header value because {:?}", why))?,
    );
    headers.insert(
        header::REFERER,
        header::HeaderValue::from_str(&cfg.referer)
            .map_err(|why| anyhow!("Invalid referer header value because {:?}", why))?,
    );

    Ok(headers)
}
