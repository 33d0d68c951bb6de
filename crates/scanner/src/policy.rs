//! 심각도 정책 판정과 결과 요약
//!
//! 보고된 심각도가 임계값 **이상**이면 정책 위반입니다 (같은 레벨 포함).

use serde::Serialize;

use harbor_scan_core::types::Severity;

use crate::api::RegistryEndpoint;
use crate::error::ScannerError;
use crate::monitor::CompletedScan;
use crate::reference::ImageReference;
use crate::report::{ScannerInfo, SeverityCounts};

/// 정책 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    /// 임계값 미만
    Clean,
    /// 임계값 이상
    Violation,
}

/// 심각도 게이트
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityGate {
    threshold: Severity,
}

impl SeverityGate {
    pub fn new(threshold: Severity) -> Self {
        Self { threshold }
    }

    /// 이 심각도 이상이 보고되면 위반입니다.
    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn evaluate(&self, reported: Severity) -> GateVerdict {
        if reported.reaches(self.threshold) {
            GateVerdict::Violation
        } else {
            GateVerdict::Clean
        }
    }
}

impl Default for SeverityGate {
    fn default() -> Self {
        Self::new(Severity::Critical)
    }
}

/// 완료된 스캔의 출력용 요약
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub image: String,
    pub artifact_url: String,
    pub report_id: String,
    pub content_type: String,
    pub severity: Severity,
    pub threshold: Severity,
    pub verdict: GateVerdict,
    pub total: u64,
    pub fixable: u64,
    pub counts: SeverityCounts,
    pub scanner: ScannerInfo,
    pub duration_secs: i64,
}

impl ScanSummary {
    /// 완료된 스캔에서 요약을 만들고 게이트를 적용합니다.
    ///
    /// # Errors
    ///
    /// 보고된 심각도가 다섯 가지 정규 이름이 아니면 `ScannerError::Severity`.
    pub fn build(
        completed: &CompletedScan,
        image: &ImageReference,
        endpoint: &RegistryEndpoint,
        gate: SeverityGate,
    ) -> Result<Self, ScannerError> {
        let report = &completed.report;
        let severity = Severity::parse(&report.severity)?;

        Ok(Self {
            image: image.to_string(),
            artifact_url: artifact_url(endpoint, completed.project_id, image, &completed.digest),
            report_id: report.report_id.clone(),
            content_type: completed.content_type.to_owned(),
            severity,
            threshold: gate.threshold(),
            verdict: gate.evaluate(severity),
            total: report.summary.total,
            fixable: report.summary.fixable,
            counts: report.summary.summary,
            scanner: report.scanner.clone(),
            duration_secs: report.duration,
        })
    }

    pub fn is_violation(&self) -> bool {
        self.verdict == GateVerdict::Violation
    }
}

/// Harbor UI의 아티팩트 페이지 주소
pub fn artifact_url(
    endpoint: &RegistryEndpoint,
    project_id: i64,
    image: &ImageReference,
    digest: &str,
) -> String {
    format!(
        "{}/harbor/projects/{}/repositories/{}/artifacts/{}",
        endpoint.origin(),
        project_id,
        image.escaped_repository(),
        digest
    )
}
