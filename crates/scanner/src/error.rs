//! 스캐너 에러 타입
//!
//! [`ScannerError`]는 Harbor API 호출, 스캔 실행, 상태 폴링 중 발생하는 모든 에러를 나타냅니다.
//!
//! # 에러 카테고리
//!
//! - **API 응답**: `Api`, `UnexpectedStatus`, `Forbidden`
//! - **전송 계층**: `Transport`, `Decode`, `InvalidEndpoint`
//! - **입력**: `Image`, `Severity`
//! - **중단**: `Cancelled`

use harbor_scan_core::error::{ImageError, SeverityError};

use crate::api::ApiError;

/// 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// Harbor가 에러 본문과 함께 non-2xx 응답을 반환함
    #[error("{0}")]
    Api(ApiError),

    /// non-2xx 응답이지만 에러 본문을 해석할 수 없음
    #[error("unknown error, status code: {0}")]
    UnexpectedStatus(u16),

    /// 권한 부족. 추가해야 할 RBAC 권한을 명시합니다.
    #[error(
        "FORBIDDEN: missing '{action}' action on '{resource}' resource (/project/{project}/{resource})"
    )]
    Forbidden {
        /// 필요한 액션 (create, read)
        action: &'static str,
        /// 대상 리소스 (scan, artifact)
        resource: &'static str,
        /// 프로젝트명
        project: String,
    },

    /// 연결 실패, 타임아웃 등 HTTP 전송 에러
    #[error("transport error: {0}")]
    Transport(String),

    /// 응답 본문 디코딩 실패
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// 레지스트리 URL 해석 실패
    #[error("invalid registry url '{url}': {reason}")]
    InvalidEndpoint {
        /// 입력된 URL
        url: String,
        /// 실패 사유
        reason: String,
    },

    /// 이미지 참조 파싱 실패
    #[error("invalid image: {0}")]
    Image(#[from] ImageError),

    /// 스캐너가 보고한 심각도를 해석할 수 없음
    #[error("{0}")]
    Severity(#[from] SeverityError),

    /// 폴링 중 취소 요청
    #[error("scan monitoring cancelled")]
    Cancelled,
}

impl ScannerError {
    /// `FORBIDDEN` API 에러를 누락된 권한을 명시하는 에러로 바꿉니다.
    ///
    /// 다른 에러는 그대로 반환합니다.
    pub(crate) fn name_missing_permission(
        self,
        action: &'static str,
        resource: &'static str,
        project: &str,
    ) -> Self {
        match self {
            Self::Api(ref api) if api.is_forbidden() => Self::Forbidden {
                action,
                resource,
                project: project.to_owned(),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: &str, message: &str) -> ScannerError {
        ScannerError::Api(ApiError {
            code: code.to_owned(),
            message: message.to_owned(),
        })
    }

    #[test]
    fn api_error_displays_code_and_message() {
        let err = api_error("NOT_FOUND", "artifact library/nginx:1.0 not found");
        assert_eq!(
            err.to_string(),
            "NOT_FOUND: artifact library/nginx:1.0 not found"
        );
    }

    #[test]
    fn forbidden_is_rewritten_with_resource_path() {
        let err = api_error("FORBIDDEN", "forbidden").name_missing_permission(
            "create",
            "scan",
            "library",
        );
        assert_eq!(
            err.to_string(),
            "FORBIDDEN: missing 'create' action on 'scan' resource (/project/library/scan)"
        );
    }

    #[test]
    fn non_forbidden_passes_through_unchanged() {
        let err = api_error("UNAUTHORIZED", "unauthorized").name_missing_permission(
            "read",
            "artifact",
            "library",
        );
        match err {
            ScannerError::Api(api) => assert_eq!(api.code, "UNAUTHORIZED"),
            other => panic!("expected Api error, got {other:?}"),
        }

        let err = ScannerError::Transport("connection refused".to_owned())
            .name_missing_permission("read", "artifact", "library");
        assert!(matches!(err, ScannerError::Transport(_)));
    }

    #[test]
    fn forbidden_code_is_compared_exactly() {
        let err = api_error("FORBIDDEN_EXTRA", "forbidden").name_missing_permission(
            "read",
            "artifact",
            "library",
        );
        assert!(matches!(err, ScannerError::Api(_)));
    }

    #[test]
    fn unexpected_status_display() {
        assert_eq!(
            ScannerError::UnexpectedStatus(502).to_string(),
            "unknown error, status code: 502"
        );
    }
}
