//! 설정 관리 -- harbor-scan.toml 파싱 및 런타임 설정
//!
//! [`HarborScanConfig`]는 한 번 생성되어 각 컴포넌트에 참조로 전달됩니다.
//! 프로세스 전역 가변 상태는 두지 않습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`HARBOR_SCAN_REGISTRY_URL=harbor.example.com` 형식)
//! 3. 설정 파일 (`harbor-scan.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), harbor_scan_core::error::HarborScanError> {
//! use harbor_scan_core::config::HarborScanConfig;
//!
//! let config = HarborScanConfig::load("harbor-scan.toml").await?;
//! let config = HarborScanConfig::parse("[scan]\nseverity = \"High\"")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use crate::error::{ConfigError, HarborScanError};
use crate::types::Severity;

const MAX_POLL_INTERVAL_SECS: u64 = 300;
const MAX_TIMEOUT_SECS: u64 = 300;

/// harbor-scan 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarborScanConfig {
    /// 일반 설정 (로깅)
    #[serde(default)]
    pub general: GeneralConfig,
    /// 레지스트리 접속 설정
    #[serde(default)]
    pub registry: RegistryConfig,
    /// 스캔 정책 설정
    #[serde(default)]
    pub scan: ScanConfig,
}

impl HarborScanConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 검증은 하지 않습니다. CLI 인자까지 병합한 뒤 [`Self::validate`]를 호출하세요.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HarborScanError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// 파일 없이 기본값 + 환경변수로 설정을 구성합니다.
    pub fn from_env() -> Result<Self, HarborScanError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// TOML 파일을 읽고 파싱만 합니다 (환경변수 오버라이드, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HarborScanError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HarborScanError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HarborScanError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, HarborScanError> {
        toml::from_str(toml_str).map_err(|e| {
            HarborScanError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `HARBOR_SCAN_{SECTION}_{FIELD}`
    ///
    /// 숫자 필드에 정수가 아닌 값이 들어 있으면 에러를 반환합니다.
    pub fn apply_env_overrides(&mut self) -> Result<(), HarborScanError> {
        override_string(&mut self.general.log_level, "HARBOR_SCAN_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "HARBOR_SCAN_GENERAL_LOG_FORMAT",
        );

        override_string(&mut self.registry.url, "HARBOR_SCAN_REGISTRY_URL");
        override_string(&mut self.registry.username, "HARBOR_SCAN_REGISTRY_USERNAME");
        override_string(&mut self.registry.password, "HARBOR_SCAN_REGISTRY_PASSWORD");
        override_u64(
            &mut self.registry.timeout_secs,
            "HARBOR_SCAN_REGISTRY_TIMEOUT_SECS",
        )?;

        override_string(&mut self.scan.severity, "HARBOR_SCAN_SCAN_SEVERITY");
        override_u64(
            &mut self.scan.poll_interval_secs,
            "HARBOR_SCAN_SCAN_POLL_INTERVAL_SECS",
        )?;
        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 자격 증명과 URL의 존재 여부는 검사하지 않습니다.
    /// CLI 인자가 병합된 뒤 [`RegistryConfig::require_credentials`]로 확인합니다.
    pub fn validate(&self) -> Result<(), HarborScanError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.registry.timeout_secs == 0 || self.registry.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "registry.timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.scan.poll_interval_secs == 0 || self.scan.poll_interval_secs > MAX_POLL_INTERVAL_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "scan.poll_interval_secs".to_owned(),
                reason: format!("must be 1-{MAX_POLL_INTERVAL_SECS}"),
            }
            .into());
        }

        self.scan.threshold()?;

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 레지스트리 접속 설정
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 레지스트리 URL (스킴 생략 시 https)
    pub url: String,
    /// Basic 인증 사용자명
    pub username: String,
    /// Basic 인증 비밀번호
    #[serde(skip_serializing)]
    pub password: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RegistryConfig {
    /// username, password, url이 모두 채워졌는지 확인합니다.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::MissingValue { flag: "username" });
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingValue { flag: "password" });
        }
        if self.url.is_empty() {
            return Err(ConfigError::MissingValue { flag: "url" });
        }
        Ok(())
    }
}

/// 스캔 정책 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 실행을 실패시키는 최소 심각도 (None, Low, Medium, High, Critical)
    pub severity: String,
    /// 스캔 상태 폴링 주기 (초)
    pub poll_interval_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            severity: "Critical".to_owned(),
            poll_interval_secs: 3,
        }
    }
}

impl ScanConfig {
    /// 설정된 심각도 임계값을 파싱합니다.
    pub fn threshold(&self) -> Result<Severity, HarborScanError> {
        Ok(Severity::parse(&self.severity)?)
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u64(target: &mut u64, env_key: &str) -> Result<(), ConfigError> {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
            field: env_key.to_owned(),
            reason: format!("'{val}' is not a whole number of seconds: {e}"),
        })?;
    }
    Ok(())
}
