mod models;
mod response;

use async_trait::async_trait;
use chrono::Utc;
use http::{HeaderMap, HeaderValue, header::CONTENT_TYPE};
use reqwest::{Client, Method, Url};

pub use self::{
    models::{
        DeviceDetails,
        DeviceHistory,
        DeviceRealTimeData,
        DeviceRequest,
        Dimension,
        HistoryPoint,
        HistoryRequest,
        RealTimeRawVariable,
        ReportRequest,
        ReportVariable,
    },
    response::Response,
};
use crate::prelude::*;

pub const REAL_TIME_PATH: &str = "/op/v0/device/real/query";
pub const REPORT_PATH: &str = "/op/v0/device/report/query";
pub const DEVICE_DETAIL_PATH: &str = "/op/v0/device/detail";
pub const HISTORY_PATH: &str = "/op/v0/device/history/query";

/// Anything that can perform a signed FoxESS Cloud call.
#[async_trait]
pub trait Cloud: Send + Sync {
    /// Perform exactly one call and return the raw response JSON.
    ///
    /// The `errno` envelope is not inspected here, see [`Response`].
    async fn call(
        &self,
        method: Method,
        path: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value>;
}

pub struct Api {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl Api {
    pub fn new(api_key: String, base_url: Url) -> Result<Self> {
        ensure!(!api_key.is_empty(), "FoxESS API key is required");
        let mut headers = HeaderMap::new();
        headers.append(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.append("Lang", HeaderValue::from_static("en"));
        headers.append("Token", HeaderValue::from_str(&api_key)?);
        let client = Client::builder().user_agent("foxbot").default_headers(headers).build()?;
        Ok(Self { client, api_key, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl Cloud for Api {
    #[instrument(skip_all, level = Level::DEBUG, fields(method = %method, path = path))]
    async fn call(
        &self,
        method: Method,
        path: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let timestamp = Utc::now().timestamp_millis();
        let signature = sign(path, &self.api_key, timestamp)?;
        let request = if method == Method::GET {
            let query = serde_qs::to_string(&params)
                .with_context(|| format!("failed to build `{path}` query"))?;
            let url = if query.is_empty() {
                self.url(path)
            } else {
                format!("{}?{query}", self.url(path))
            };
            self.client.get(url)
        } else {
            self.client.request(method, self.url(path)).json(&params)
        };
        let response = request
            .header("Timestamp", timestamp.to_string())
            .header("Signature", signature)
            .send()
            .await
            .with_context(|| format!("failed to call `{path}`"))?
            .error_for_status()
            .with_context(|| format!("`{path}` failed"))?
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("failed to deserialize `{path}` response JSON"))?;
        debug!(%response, "call succeeded");
        Ok(response)
    }
}

/// Build the request signature the way FoxESS Cloud recomputes it.
///
/// Note that `\r\n` are raw literals here, not line breaks.
pub fn sign(path: &str, api_key: &str, timestamp_millis: i64) -> Result<String> {
    ensure!(!api_key.is_empty(), "API key is required to sign a request");
    let digest = md5::compute(format!(r"{path}\r\n{api_key}\r\n{timestamp_millis}").as_bytes());
    Ok(format!("{digest:x}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::*;

    /// Accept a single connection and answer it with the canned response.
    ///
    /// The handle resolves into the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> Result<(Url, JoinHandle<Result<String>>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = Url::parse(&format!("http://{}", listener.local_addr()?))?;
        Ok((base_url, tokio::spawn(respond(listener, status, body))))
    }

    async fn respond(listener: TcpListener, status: &str, body: &str) -> Result<String> {
        let (mut stream, _) = listener.accept().await?;
        let mut request = Vec::new();
        let mut buffer = [0; 4096];
        while !is_complete(&request) {
            let n_read = stream.read(&mut buffer).await?;
            ensure!(n_read != 0, "the connection closed mid-request");
            request.extend_from_slice(&buffer[..n_read]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len(),
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(String::from_utf8(request)?)
    }

    fn is_complete(request: &[u8]) -> bool {
        let request = String::from_utf8_lossy(request);
        let Some((_, body)) = request.split_once("\r\n\r\n") else {
            return false;
        };
        let content_length =
            header(&request, "content-length").and_then(|value| value.parse().ok()).unwrap_or(0);
        body.len() >= content_length
    }

    fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
        request.split("\r\n\r\n").next()?.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then_some(value.trim())
        })
    }

    #[test]
    fn test_sign_ok() -> Result {
        assert_eq!(
            sign(REAL_TIME_PATH, "secret", 1_700_000_000_000)?,
            "188cc4fc2cdbe91531199b0386c947ba",
        );
        Ok(())
    }

    #[test]
    fn test_sign_is_deterministic() -> Result {
        let first = sign(HISTORY_PATH, "key", 1_741_474_800_000)?;
        let second = sign(HISTORY_PATH, "key", 1_741_474_800_000)?;
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        Ok(())
    }

    #[test]
    fn test_sign_depends_on_timestamp() -> Result {
        assert_ne!(sign(REPORT_PATH, "key", 1)?, sign(REPORT_PATH, "key", 2)?);
        Ok(())
    }

    #[test]
    fn test_sign_empty_key_fails() {
        assert!(sign(REAL_TIME_PATH, "", 0).is_err());
        assert!(sign("", "", 1_700_000_000_000).is_err());
    }

    #[test]
    fn test_new_empty_key_fails() -> Result {
        assert!(Api::new(String::new(), Url::parse("https://example.com")?).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_call_get_ok() -> Result {
        // language=JSON
        const BODY: &str = r#"{"errno": 0, "msg": "success", "result": {"status": 1}}"#;

        let (base_url, server) = serve_once("200 OK", BODY).await?;
        let api = Api::new("key".to_owned(), base_url)?;
        let response = api.call(Method::GET, DEVICE_DETAIL_PATH, json!({"sn": "60BH"})).await?;
        assert_eq!(response, serde_json::from_str::<serde_json::Value>(BODY)?);

        let request = server.await??;
        assert_eq!(request.lines().next(), Some("GET /op/v0/device/detail?sn=60BH HTTP/1.1"));
        assert_eq!(header(&request, "token"), Some("key"));
        assert_eq!(header(&request, "lang"), Some("en"));
        let timestamp: i64 = header(&request, "timestamp").context("no timestamp")?.parse()?;
        assert_eq!(
            header(&request, "signature"),
            Some(sign(DEVICE_DETAIL_PATH, "key", timestamp)?.as_str()),
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_call_post_returns_vendor_error_as_is() -> Result {
        // language=JSON
        const BODY: &str = r#"{"errno": 40256, "msg": "illegal signature"}"#;

        let (base_url, server) = serve_once("200 OK", BODY).await?;
        let api = Api::new("key".to_owned(), base_url)?;
        let params = json!({"sn": "60BH", "variables": ["pvPower"]});
        let response = api.call(Method::POST, HISTORY_PATH, params.clone()).await?;
        assert_eq!(response["errno"], 40256);

        let request = server.await??;
        assert_eq!(request.lines().next(), Some("POST /op/v0/device/history/query HTTP/1.1"));
        assert_eq!(header(&request, "content-type"), Some("application/json"));
        assert!(header(&request, "signature").is_some());
        let (_, body) = request.split_once("\r\n\r\n").context("no request body")?;
        assert_eq!(serde_json::from_str::<serde_json::Value>(body)?, params);
        Ok(())
    }

    #[tokio::test]
    async fn test_call_http_error_fails() -> Result {
        let (base_url, server) = serve_once("500 Internal Server Error", "{}").await?;
        let api = Api::new("key".to_owned(), base_url)?;
        assert!(api.call(Method::GET, REAL_TIME_PATH, json!({})).await.is_err());
        server.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_call_non_json_fails() -> Result {
        let (base_url, server) = serve_once("200 OK", "<html>maintenance</html>").await?;
        let api = Api::new("key".to_owned(), base_url)?;
        assert!(api.call(Method::POST, REPORT_PATH, json!({"sn": "60BH"})).await.is_err());
        server.await??;
        Ok(())
    }

    #[test]
    fn test_url_ok() -> Result {
        let api = Api::new("key".to_owned(), Url::parse("https://portal.foxesscloud.us:30004")?)?;
        assert_eq!(
            api.url(DEVICE_DETAIL_PATH),
            "https://portal.foxesscloud.us:30004/op/v0/device/detail",
        );
        Ok(())
    }
}
