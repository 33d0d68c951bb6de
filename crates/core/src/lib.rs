//! harbor-scan 공통 크레이트
//!
//! 스캐너와 CLI가 공유하는 에러 타입, 심각도 타입, 설정을 정의합니다.

pub mod config;
pub mod error;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, HarborScanError, ImageError, SeverityError};

// 설정
pub use config::{GeneralConfig, HarborScanConfig, RegistryConfig, ScanConfig};

// 도메인 타입
pub use types::Severity;
