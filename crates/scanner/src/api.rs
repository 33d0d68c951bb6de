//! Harbor REST API 추상화
//!
//! [`RegistryApi`] trait은 스캔 오케스트레이션이 사용하는 두 엔드포인트를 추상화합니다.
//! 운영 코드는 [`HttpRegistryClient`]를, 테스트는 `MockRegistryClient`를 사용합니다.
//!
//! ```text
//!   launch_scan / ScanMonitor
//!            │
//!            ▼
//!     ┌─────────────┐
//!     │ RegistryApi │ (trait)
//!     └─────────────┘
//!        │       │
//!        ▼       ▼
//!   ┌────────┐ ┌──────┐
//!   │  Http  │ │ Mock │
//!   └───┬────┘ └──────┘
//!       ▼
//!   Harbor /api/v2.0
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ScannerError;
use crate::reference::ImageReference;
use crate::report::{ACCEPT_VULNERABILITIES_HEADER, ScanOverview, accepted_report_types};

/// Harbor REST API 기본 경로
pub const API_BASE_PATH: &str = "/api/v2.0";

/// Harbor 에러 본문의 한 항목
///
/// 응답에 여러 개가 담길 수 있지만 첫 번째만 사용합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// 기계 판독용 코드 (`FORBIDDEN`, `CONFLICT`, ...)
    #[serde(default)]
    pub code: String,
    /// 사람이 읽는 메시지
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    /// 권한 부족 코드
    pub const FORBIDDEN: &'static str = "FORBIDDEN";
    /// 상태 충돌 코드
    pub const CONFLICT: &'static str = "CONFLICT";
    /// 이미 대기 중인 스캔이 있을 때의 메시지
    pub const SCAN_PENDING_MESSAGE: &'static str = "a previous scan process is Pending";

    /// 권한 부족 여부
    pub fn is_forbidden(&self) -> bool {
        self.code == Self::FORBIDDEN
    }

    /// 같은 아티팩트에 대한 스캔이 이미 대기 중인지 여부
    pub fn is_scan_pending(&self) -> bool {
        self.code == Self::CONFLICT && self.message == Self::SCAN_PENDING_MESSAGE
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default, alias = "Errors")]
    errors: Vec<ApiError>,
}

/// non-2xx 응답 본문을 에러로 변환합니다.
pub(crate) fn decode_error_body(status: u16, body: &[u8]) -> ScannerError {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(res) => match res.errors.into_iter().next() {
            Some(first) => ScannerError::Api(first),
            None => ScannerError::UnexpectedStatus(status),
        },
        Err(_) => ScannerError::UnexpectedStatus(status),
    }
}

/// Harbor API 호출 추상화
///
/// `Send + Sync` 이므로 async 컨텍스트에서 참조로 공유할 수 있습니다.
pub trait RegistryApi: Send + Sync {
    /// 아티팩트 스캔을 요청합니다. 요청/응답 본문은 없습니다.
    fn start_scan(
        &self,
        image: &ImageReference,
    ) -> impl Future<Output = Result<(), ScannerError>> + Send;

    /// 스캔 개요를 포함한 아티팩트 정보를 조회합니다.
    fn scan_overview(
        &self,
        image: &ImageReference,
    ) -> impl Future<Output = Result<ScanOverview, ScannerError>> + Send;
}

/// 정규화된 레지스트리 주소
///
/// `harbor.example.com` 처럼 스킴이 없으면 https로 간주합니다.
/// 경로는 버리고 `scheme://host[:port]`만 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEndpoint {
    origin: String,
    host: String,
}

impl RegistryEndpoint {
    /// 사용자가 입력한 URL을 해석합니다.
    pub fn parse(raw: &str) -> Result<Self, ScannerError> {
        let candidate = if raw.contains("//") {
            raw.to_owned()
        } else {
            format!("https://{raw}")
        };

        let invalid = |reason: String| ScannerError::InvalidEndpoint {
            url: raw.to_owned(),
            reason,
        };

        let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host".to_owned()))?;

        // Url drops a scheme's default port; keep it when it was typed
        let port = if has_explicit_port(&candidate) {
            url.port_or_known_default()
        } else {
            url.port()
        };
        let host = match port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };

        Ok(Self {
            origin: format!("{}://{}", url.scheme(), host),
            host,
        })
    }

    /// `scheme://host[:port]`
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// `host[:port]` (이미지 인자의 접두사 제거에 사용)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// `/api/v2.0` 하위 경로의 전체 URL
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.origin, API_BASE_PATH, path)
    }
}

/// authority 부분이 `:포트`로 끝나는지 확인합니다.
fn has_explicit_port(candidate: &str) -> bool {
    let rest = candidate.split_once("//").map_or(candidate, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    host_port
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

/// reqwest 기반 Harbor 클라이언트 (HTTP Basic 인증)
pub struct HttpRegistryClient {
    client: reqwest::Client,
    endpoint: RegistryEndpoint,
    username: String,
    password: String,
}

impl HttpRegistryClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(
        endpoint: RegistryEndpoint,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ScannerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScannerError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            username: username.into(),
            password: password.into(),
        })
    }

    /// 대상 레지스트리 주소
    pub fn endpoint(&self) -> &RegistryEndpoint {
        &self.endpoint
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ScannerError> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ScannerError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ScannerError::Transport(format!("read error body failed: {e}")))?;
        debug!(status = status.as_u16(), "harbor returned an error response");
        Err(decode_error_body(status.as_u16(), &body))
    }
}

impl RegistryApi for HttpRegistryClient {
    #[instrument(name = "harbor_start_scan", skip(self, image), fields(image = %image))]
    async fn start_scan(&self, image: &ImageReference) -> Result<(), ScannerError> {
        let url = self.endpoint.api_url(&image.scan_path());
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    #[instrument(name = "harbor_scan_overview", skip(self, image), fields(image = %image))]
    async fn scan_overview(&self, image: &ImageReference) -> Result<ScanOverview, ScannerError> {
        let url = format!(
            "{}?with_scan_overview=true",
            self.endpoint.api_url(&image.artifact_path())
        );
        let request = self
            .client
            .get(url)
            .header(ACCEPT_VULNERABILITIES_HEADER, accepted_report_types());

        self.send(request)
            .await?
            .json::<ScanOverview>()
            .await
            .map_err(|e| ScannerError::Decode(e.to_string()))
    }
}

/// 테스트용 Mock Harbor 클라이언트
///
/// 스캔 요청 결과와 폴링 응답 순서를 미리 지정합니다.
/// 응답이 소진되면 `Transport` 에러를 반환합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockRegistryClient {
    launch_error: Option<ApiError>,
    overviews: std::sync::Mutex<std::collections::VecDeque<Result<ScanOverview, ApiError>>>,
    launches: std::sync::atomic::AtomicUsize,
    fetches: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// start_scan이 반환할 API 에러
    pub fn with_launch_error(mut self, error: ApiError) -> Self {
        self.launch_error = Some(error);
        self
    }

    /// scan_overview가 순서대로 반환할 응답
    pub fn with_overviews(self, responses: Vec<Result<ScanOverview, ApiError>>) -> Self {
        if let Ok(mut queue) = self.overviews.lock() {
            queue.extend(responses);
        }
        self
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl RegistryApi for MockRegistryClient {
    async fn start_scan(&self, _image: &ImageReference) -> Result<(), ScannerError> {
        self.launches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.launch_error {
            Some(err) => Err(ScannerError::Api(err.clone())),
            None => Ok(()),
        }
    }

    async fn scan_overview(&self, _image: &ImageReference) -> Result<ScanOverview, ScannerError> {
        self.fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let next = self
            .overviews
            .lock()
            .map_err(|_| ScannerError::Transport("mock poisoned".to_owned()))?
            .pop_front();
        match next {
            Some(Ok(overview)) => Ok(overview),
            Some(Err(err)) => Err(ScannerError::Api(err)),
            None => Err(ScannerError::Transport("no scripted response".to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_first_error_of_many() {
        let body = br#"{"errors":[{"code":"FORBIDDEN","message":"forbidden"},{"code":"OTHER","message":"x"}]}"#;
        match decode_error_body(403, body) {
            ScannerError::Api(err) => {
                assert_eq!(err.code, "FORBIDDEN");
                assert_eq!(err.message, "forbidden");
                assert!(err.is_forbidden());
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_capitalised_errors_key() {
        let body = br#"{"Errors":[{"code":"CONFLICT","message":"a previous scan process is Pending"}]}"#;
        match decode_error_body(409, body) {
            ScannerError::Api(err) => assert!(err.is_scan_pending()),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_body_reports_status() {
        let err = decode_error_body(502, b"<html>Bad Gateway</html>");
        assert!(matches!(err, ScannerError::UnexpectedStatus(502)));
    }

    #[test]
    fn empty_error_list_reports_status() {
        let err = decode_error_body(500, br#"{"errors":[]}"#);
        assert!(matches!(err, ScannerError::UnexpectedStatus(500)));
    }

    #[test]
    fn scan_pending_requires_exact_code_and_message() {
        let pending = ApiError {
            code: "CONFLICT".to_owned(),
            message: "a previous scan process is Pending".to_owned(),
        };
        assert!(pending.is_scan_pending());

        let other_conflict = ApiError {
            code: "CONFLICT".to_owned(),
            message: "a previous scan process is Running".to_owned(),
        };
        assert!(!other_conflict.is_scan_pending());

        let wrong_code = ApiError {
            code: "PRECONDITION".to_owned(),
            message: "a previous scan process is Pending".to_owned(),
        };
        assert!(!wrong_code.is_scan_pending());
    }

    #[test]
    fn api_error_display() {
        let err = ApiError {
            code: "NOT_FOUND".to_owned(),
            message: "not found".to_owned(),
        };
        assert_eq!(err.to_string(), "NOT_FOUND: not found");
    }

    #[test]
    fn endpoint_defaults_to_https_and_drops_path() {
        let endpoint = RegistryEndpoint::parse("harbor.example.com").unwrap();
        assert_eq!(endpoint.origin(), "https://harbor.example.com");
        assert_eq!(endpoint.host(), "harbor.example.com");

        let endpoint = RegistryEndpoint::parse("http://harbor.local:8080/some/path").unwrap();
        assert_eq!(endpoint.origin(), "http://harbor.local:8080");
        assert_eq!(endpoint.host(), "harbor.local:8080");
    }

    #[test]
    fn endpoint_keeps_typed_default_port() {
        let endpoint = RegistryEndpoint::parse("https://harbor.example.com:443").unwrap();
        assert_eq!(endpoint.host(), "harbor.example.com:443");
        assert_eq!(endpoint.origin(), "https://harbor.example.com:443");

        let endpoint = RegistryEndpoint::parse("harbor.example.com:443/").unwrap();
        assert_eq!(endpoint.host(), "harbor.example.com:443");

        let endpoint = RegistryEndpoint::parse("https://[::1]").unwrap();
        assert_eq!(endpoint.host(), "[::1]");
    }

    #[test]
    fn endpoint_builds_api_urls() {
        let endpoint = RegistryEndpoint::parse("https://harbor.example.com/").unwrap();
        assert_eq!(
            endpoint.api_url("/projects/library/repositories/nginx/artifacts/latest/scan"),
            "https://harbor.example.com/api/v2.0/projects/library/repositories/nginx/artifacts/latest/scan"
        );
    }

    #[test]
    fn endpoint_rejects_garbage() {
        assert!(matches!(
            RegistryEndpoint::parse("https://"),
            Err(ScannerError::InvalidEndpoint { .. })
        ));
        assert!(RegistryEndpoint::parse("ht tp://bad host").is_err());
    }

    #[test]
    fn http_client_builds() {
        let endpoint = RegistryEndpoint::parse("harbor.example.com").unwrap();
        let client =
            HttpRegistryClient::new(endpoint, "admin", "secret", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint().host(), "harbor.example.com");
    }

    #[tokio::test]
    async fn mock_replays_scripted_responses() {
        let mock = MockRegistryClient::new().with_overviews(vec![
            Ok(ScanOverview::default()),
            Err(ApiError {
                code: "NOT_FOUND".to_owned(),
                message: "gone".to_owned(),
            }),
        ]);
        let image = ImageReference::parse("library/nginx").unwrap();

        assert!(mock.scan_overview(&image).await.is_ok());
        assert!(matches!(
            mock.scan_overview(&image).await,
            Err(ScannerError::Api(_))
        ));
        assert!(matches!(
            mock.scan_overview(&image).await,
            Err(ScannerError::Transport(_))
        ));
        assert_eq!(mock.fetch_count(), 3);
    }
}
