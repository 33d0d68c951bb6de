//! 스캔 실행 요청
//!
//! 에러 처리는 비대칭입니다.
//! - `CONFLICT: a previous scan process is Pending` → 이미 진행 중이므로 성공으로 취급
//! - `FORBIDDEN` → `/project/<project>/scan` 권한 누락 메시지로 변환
//! - 그 외 → 그대로 전파 (치명적)

use tracing::{debug, info};

use crate::api::RegistryApi;
use crate::error::ScannerError;
use crate::reference::ImageReference;

/// 스캔 요청 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    /// 새 스캔 작업이 시작됨
    Started,
    /// 같은 아티팩트의 스캔이 이미 대기 중
    AlreadyPending,
}

/// 아티팩트 스캔을 시작합니다.
pub async fn launch_scan<A: RegistryApi>(
    api: &A,
    image: &ImageReference,
) -> Result<LaunchStatus, ScannerError> {
    match api.start_scan(image).await {
        Ok(()) => {
            info!(image = %image, "scan requested");
            Ok(LaunchStatus::Started)
        }
        Err(ScannerError::Api(err)) if err.is_scan_pending() => {
            debug!(image = %image, "scan already pending, attaching to it");
            Ok(LaunchStatus::AlreadyPending)
        }
        Err(err) => Err(err.name_missing_permission("create", "scan", image.project())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MockRegistryClient};

    fn image() -> ImageReference {
        ImageReference::parse("library/nginx:1.25.3").unwrap()
    }

    fn api_error(code: &str, message: &str) -> ApiError {
        ApiError {
            code: code.to_owned(),
            message: message.to_owned(),
        }
    }

    #[tokio::test]
    async fn successful_launch_is_started() {
        let api = MockRegistryClient::new();
        let status = launch_scan(&api, &image()).await.unwrap();
        assert_eq!(status, LaunchStatus::Started);
        assert_eq!(api.launch_count(), 1);
    }

    #[tokio::test]
    async fn pending_conflict_is_tolerated() {
        let api = MockRegistryClient::new()
            .with_launch_error(api_error("CONFLICT", "a previous scan process is Pending"));
        let status = launch_scan(&api, &image()).await.unwrap();
        assert_eq!(status, LaunchStatus::AlreadyPending);
    }

    #[tokio::test]
    async fn other_conflicts_are_fatal() {
        let api = MockRegistryClient::new()
            .with_launch_error(api_error("CONFLICT", "artifact is being deleted"));
        let err = launch_scan(&api, &image()).await.unwrap_err();
        assert_eq!(err.to_string(), "CONFLICT: artifact is being deleted");
    }

    #[tokio::test]
    async fn forbidden_names_missing_scan_permission() {
        let api = MockRegistryClient::new().with_launch_error(api_error("FORBIDDEN", "forbidden"));
        let err = launch_scan(&api, &image()).await.unwrap_err();
        match &err {
            ScannerError::Forbidden {
                action,
                resource,
                project,
            } => {
                assert_eq!(*action, "create");
                assert_eq!(*resource, "scan");
                assert_eq!(project, "library");
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
        assert!(err.to_string().contains("/project/library/scan"));
    }

    #[tokio::test]
    async fn other_errors_propagate_unchanged() {
        let api = MockRegistryClient::new()
            .with_launch_error(api_error("NOT_FOUND", "artifact not found"));
        let err = launch_scan(&api, &image()).await.unwrap_err();
        match err {
            ScannerError::Api(api) => assert_eq!(api.code, "NOT_FOUND"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
