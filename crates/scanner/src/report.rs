//! Harbor 스캔 개요 / 리포트 타입
//!
//! 아티팩트 조회 응답의 `scan_overview`는 리포트 content-type을 키로 하는 맵입니다.
//! 레지스트리가 여러 스캐너 어댑터 형식을 동시에 지원할 수 있으므로
//! [`ScanOverview::select_report`]가 우선순위에 따라 하나를 고릅니다.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use harbor_scan_core::types::Severity;

/// 리포트 content-type 협상 헤더
pub const ACCEPT_VULNERABILITIES_HEADER: &str = "X-Accept-Vulnerabilities";

/// 범용 취약점 리포트 (우선)
pub const VULNERABILITY_REPORT_V1_1: &str =
    "application/vnd.security.vulnerability.report; version=1.1";

/// Harbor 스캐너 어댑터 리포트
pub const HARBOR_ADAPTER_REPORT_V1_0: &str =
    "application/vnd.scanner.adapter.vuln.report.harbor+json; version=1.0";

/// 선택 우선순위 순서의 지원 content-type
pub const ACCEPTED_REPORT_TYPES: [&str; 2] = [VULNERABILITY_REPORT_V1_1, HARBOR_ADAPTER_REPORT_V1_0];

/// `X-Accept-Vulnerabilities` 헤더 값
pub fn accepted_report_types() -> String {
    ACCEPTED_REPORT_TYPES.join(", ")
}

/// 아티팩트 조회 응답 중 스캔에 필요한 부분
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOverview {
    /// 프로젝트 ID (UI 링크 생성용)
    #[serde(default)]
    pub project_id: i64,
    /// 아티팩트 다이제스트
    #[serde(default)]
    pub digest: String,
    /// content-type -> 리포트
    #[serde(default)]
    pub scan_overview: HashMap<String, ScanReport>,
}

impl ScanOverview {
    /// 지원하는 content-type 중 우선순위가 가장 높은 리포트를 반환합니다.
    pub fn select_report(&self) -> Option<(&'static str, &ScanReport)> {
        ACCEPTED_REPORT_TYPES.iter().find_map(|content_type| {
            self.scan_overview
                .get(*content_type)
                .map(|report| (*content_type, report))
        })
    }

    /// 응답에 포함된 content-type 목록 (정렬됨)
    pub fn content_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.scan_overview.keys().cloned().collect();
        types.sort();
        types
    }
}

/// 스캔 작업 상태
///
/// `Success`와 `Error`만 종료 상태입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScanStatus {
    /// 대기 중
    #[default]
    Pending,
    /// 실행 중
    Running,
    /// 완료
    Success,
    /// 실패
    Error,
    /// 그 외 Harbor 상태 (Scheduled, Stopped, ...)
    Other(String),
}

impl ScanStatus {
    /// 폴링을 멈춰야 하는 상태인지 여부
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ScanStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Success" => Self::Success,
            "Error" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl From<ScanStatus> for String {
    fn from(status: ScanStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 단일 content-type의 스캔 리포트
///
/// 진행 중인 리포트에는 일부 필드가 없으므로 모두 기본값을 허용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanReport {
    pub report_id: String,
    pub start_time: String,
    pub end_time: String,
    pub scan_status: ScanStatus,
    pub complete_percent: u32,
    /// 소요 시간 (초). 서버가 음수를 보내는 경우가 있어 부호를 유지합니다.
    pub duration: i64,
    pub scanner: ScannerInfo,
    /// 가장 높은 심각도 이름. 완료 전에는 비어 있을 수 있습니다.
    pub severity: String,
    pub summary: VulnerabilitySummary,
}

/// 리포트를 생성한 스캐너
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerInfo {
    pub name: String,
    pub vendor: String,
    pub version: String,
}

impl fmt::Display for ScannerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// 취약점 집계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilitySummary {
    pub total: u64,
    pub fixable: u64,
    pub summary: SeverityCounts,
}

/// 심각도별 취약점 수
///
/// Harbor는 `Unknown`, `Negligible` 버킷도 보고합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityCounts {
    #[serde(rename = "Critical")]
    pub critical: u64,
    #[serde(rename = "High")]
    pub high: u64,
    #[serde(rename = "Medium")]
    pub medium: u64,
    #[serde(rename = "Low")]
    pub low: u64,
    #[serde(rename = "Negligible")]
    pub negligible: u64,
    #[serde(rename = "Unknown")]
    pub unknown: u64,
    #[serde(rename = "None")]
    pub none: u64,
}

impl SeverityCounts {
    /// 정규 심각도 버킷의 개수
    pub fn count(&self, severity: Severity) -> u64 {
        match severity {
            Severity::None => self.none,
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }
}
