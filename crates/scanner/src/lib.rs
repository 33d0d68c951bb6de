#![doc = include_str!("../README.md")]
//!
//! # 모듈 구조
//!
//! - [`error`]: 도메인 에러 (`ScannerError`)
//! - [`reference`]: 이미지 참조 파싱 (`ImageReference`)
//! - [`report`]: 스캔 개요 / 리포트 타입 (`ScanOverview`, `ScanReport`)
//! - [`api`]: Harbor REST 게이트웨이 (`RegistryApi` trait, `HttpRegistryClient`)
//! - [`launcher`]: 스캔 요청 (`launch_scan`)
//! - [`monitor`]: 완료 대기 폴링 (`ScanMonitor`)
//! - [`policy`]: 심각도 게이트와 결과 요약 (`SeverityGate`, `ScanSummary`)
//! - [`runner`]: 오케스트레이터 (`ScanRunner`)

pub mod api;
pub mod error;
pub mod launcher;
pub mod monitor;
pub mod policy;
pub mod reference;
pub mod report;
pub mod runner;

// --- Public API Re-exports ---

// 오케스트레이터
pub use runner::{RunOutcome, ScanRunner, ScanRunnerBuilder};

// 에러
pub use error::ScannerError;

// API
pub use api::{ApiError, HttpRegistryClient, RegistryApi, RegistryEndpoint};

// 단계별 구성 요소
pub use launcher::{LaunchStatus, launch_scan};
pub use monitor::{CompletedScan, DEFAULT_POLL_INTERVAL, ScanMonitor, ScanOutcome};
pub use policy::{GateVerdict, ScanSummary, SeverityGate};
pub use reference::{ImageReference, strip_registry_prefix};
pub use report::{ScanOverview, ScanReport, ScanStatus, ScannerInfo, SeverityCounts};
