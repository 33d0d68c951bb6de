//! 에러 타입 -- 도메인별 에러 정의

/// harbor-scan 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum HarborScanError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 이미지 참조 파싱 에러
    #[error("invalid image: {0}")]
    Image(#[from] ImageError),

    /// 심각도 파싱 에러
    #[error("{0}")]
    Severity(#[from] SeverityError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 필수 값 누락 (CLI, 환경변수, 설정 파일 어디에도 없음)
    #[error("missing argument: --{flag}")]
    MissingValue { flag: &'static str },
}

/// 이미지 참조 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    /// 이미지 문법에 맞지 않음
    #[error("'{0}' does not match <project>/<repository>[:tag][@sha256:digest]")]
    InvalidFormat(String),

    /// 프로젝트만 있고 저장소가 없음
    #[error("'{0}' must contain a project and a repository (eg. 'project/repository')")]
    MissingRepository(String),
}

/// 심각도 이름이 다섯 가지 정규 이름 중 하나가 아님
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid severity '{0}'. Possible values: None, Low, Medium, High, Critical")]
pub struct SeverityError(pub String);
