use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Semaphore;

use crate::logging::Logger;

/// A semaphore for limiting concurrent requests.
///
/// 限制最多 5 個並發請求，避免被目標網站封禁。
static SEMAPHORE: Lazy<Semaphore> = Lazy::new(|| Semaphore::new(5));

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// Builds a reqwest client with the shared connection settings.
///
/// The caller owns the returned client; each outbound session (quote
/// endpoint, sheet API, bot API) constructs its own instance so cookies
/// and timeouts never leak between collaborators.
///
/// # Arguments
///
/// * `timeout`: The per-request timeout applied to every call made with
///   this client.
/// * `user_agent`: The User-Agent header value sent with every request.
///
/// # Returns
///
/// * `Result<Client>`: The configured client, or an error if the client
///   cannot be created.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        // ===== 壓縮 =====
        .brotli(true)
        .gzip(true)
        // ===== 超時設置 =====
        .connect_timeout(Duration::from_secs(8))
        .timeout(timeout)
        // ===== TCP 優化 =====
        .tcp_nodelay(true)
        .tcp_keepalive(Duration::from_secs(60))
        // ===== 連接池 =====
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        // ===== Cookie 和重定向 =====
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(user_agent)
        .build()
        .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
}

/// Performs an HTTP GET request and deserializes the JSON response into the specified type.
pub async fn get_json<RES: DeserializeOwned>(
    client: &Client,
    url: &str,
    headers: Option<header::HeaderMap>,
) -> Result<RES> {
    get_response(client, url, headers)
        .await?
        .json::<RES>()
        .await
        .map_err(|e| anyhow!("Error parsing response JSON: {:?}", e))
}

pub async fn get_response(
    client: &Client,
    url: &str,
    headers: Option<header::HeaderMap>,
) -> Result<Response> {
    send(client, Method::GET, url, headers, None::<fn(_) -> _>).await
}

/// Performs an HTTP POST request with JSON request and response, and specified headers.
///
/// # Type Parameters
///
/// * `REQ`: The request type to serialize as JSON. It must implement `Serialize`.
/// * `RES`: The response type to deserialize from JSON. It must implement `DeserializeOwned`.
///
/// # Returns
///
/// * `Result<RES>`: The deserialized response, or an error if the request fails
///   or the response cannot be deserialized. The error message carries the raw
///   response body so upstream rejections stay diagnosable.
pub async fn post_use_json<REQ, RES>(
    client: &Client,
    url: &str,
    headers: Option<header::HeaderMap>,
    req: Option<&REQ>,
) -> Result<RES>
where
    REQ: Serialize,
    RES: DeserializeOwned,
{
    let res = send(
        client,
        Method::POST,
        url,
        headers,
        Some(|rb: RequestBuilder| {
            if let Some(r) = req {
                rb.json(r)
            } else {
                rb
            }
        }),
    )
    .await?;

    parse_json_body(res).await
}

/// Performs an HTTP PUT request with JSON request and response, and specified headers.
pub async fn put_use_json<REQ, RES>(
    client: &Client,
    url: &str,
    headers: Option<header::HeaderMap>,
    req: Option<&REQ>,
) -> Result<RES>
where
    REQ: Serialize,
    RES: DeserializeOwned,
{
    let res = send(
        client,
        Method::PUT,
        url,
        headers,
        Some(|rb: RequestBuilder| {
            if let Some(r) = req {
                rb.json(r)
            } else {
                rb
            }
        }),
    )
    .await?;

    parse_json_body(res).await
}

async fn parse_json_body<RES: DeserializeOwned>(res: Response) -> Result<RES> {
    let status = res.status();
    let res_body = res
        .text()
        .await
        .map_err(|e| anyhow!("Error reading response body: {}", e))?;

    if !status.is_success() {
        return Err(anyhow!(
            "Request rejected with status {}({})",
            status,
            res_body
        ));
    }

    serde_json::from_str(&res_body)
        .map_err(|e| anyhow!("Error parsing response JSON({}): {:?}", &res_body, e))
}

/// Sends an HTTP request using the specified method, URL, headers, and body.
///
/// 失敗不在這一層重試,該次抓取即視為失敗,由呼叫端決定如何補位。
///
/// # Returns
///
/// * `Result<Response>`: The HTTP response, or an error if the request fails.
async fn send(
    client: &Client,
    method: Method,
    url: &str,
    headers: Option<header::HeaderMap>,
    body: Option<impl FnOnce(RequestBuilder) -> RequestBuilder>,
) -> Result<Response> {
    let visit_log = format!("{method}:{url}");
    let mut rb = client.request(method, url);

    if let Some(h) = headers {
        rb = rb.headers(h);
    }

    if let Some(body_fn) = body {
        rb = body_fn(rb);
    }

    let permit = SEMAPHORE.acquire().await;
    let start = Instant::now();
    let res = rb.send().await;
    let elapsed = start.elapsed().as_millis();
    drop(permit);

    match res {
        Ok(response) => {
            LOGGER.info(format!("{} {} ms", visit_log, elapsed));
            Ok(response)
        }
        Err(why) => {
            LOGGER.error(format!(
                "{} failed because {:?}. {} ms",
                visit_log, why, elapsed
            ));
            Err(anyhow!(
                "Failed to send request to {} because {:?}",
                url,
                why
            ))
        }
    }
}
