//! 스캔 실행 오케스트레이터
//!
//! 이미지 인자 하나에 대해 다음 순서로 진행합니다.
//!
//! ```text
//! raw image --> strip_registry_prefix --> ImageReference::parse
//!                                               |
//!                                          launch_scan
//!                                               |
//!                                 ScanMonitor::wait_for_completion
//!                                               |
//!                              ScanSummary::build (Succeeded only)
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::api::{RegistryApi, RegistryEndpoint};
use crate::error::ScannerError;
use crate::launcher::{LaunchStatus, launch_scan};
use crate::monitor::{DEFAULT_POLL_INTERVAL, ScanMonitor, ScanOutcome};
use crate::policy::{ScanSummary, SeverityGate};
use crate::reference::{ImageReference, strip_registry_prefix};

/// 한 번의 실행 결과
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// 스캔이 성공했고 정책 판정까지 마침
    Completed(ScanSummary),
    /// 서버 측에서 스캔이 실패함
    Failed {
        image: ImageReference,
        report_id: String,
    },
    /// 지원하는 형식의 리포트가 없음
    Unrecognized {
        image: ImageReference,
        content_types: Vec<String>,
    },
}

/// 이미지 스캔 실행기
pub struct ScanRunner<A: RegistryApi> {
    api: A,
    endpoint: RegistryEndpoint,
    gate: SeverityGate,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl<A: RegistryApi> ScanRunner<A> {
    /// 빌더를 생성합니다.
    pub fn builder(api: A, endpoint: RegistryEndpoint) -> ScanRunnerBuilder<A> {
        ScanRunnerBuilder {
            api,
            endpoint,
            gate: SeverityGate::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn endpoint(&self) -> &RegistryEndpoint {
        &self.endpoint
    }

    /// 레지스트리 접두사를 제거하고 이미지 참조를 파싱합니다.
    pub fn resolve_image(&self, raw: &str) -> Result<ImageReference, ScannerError> {
        let stripped = strip_registry_prefix(raw, self.endpoint.host());
        Ok(ImageReference::parse(stripped)?)
    }

    /// 스캔을 요청하고 완료될 때까지 기다린 뒤 결과를 판정합니다.
    ///
    /// 정책 위반은 에러가 아니라 [`ScanSummary::is_violation`]으로 표현됩니다.
    #[instrument(name = "scan_run", skip(self))]
    pub async fn run(&self, raw_image: &str) -> Result<RunOutcome, ScannerError> {
        let image = self.resolve_image(raw_image)?;

        if launch_scan(&self.api, &image).await? == LaunchStatus::AlreadyPending {
            info!(image = %image, "attached to pending scan");
        }

        let monitor = ScanMonitor::new(&self.api, self.poll_interval)
            .with_cancellation(self.cancel.clone());

        match monitor.wait_for_completion(&image).await? {
            ScanOutcome::Succeeded(done) => {
                let summary = ScanSummary::build(&done, &image, &self.endpoint, self.gate)?;
                info!(
                    image = %image,
                    severity = %summary.severity,
                    threshold = %summary.threshold,
                    violation = summary.is_violation(),
                    "scan evaluated"
                );
                Ok(RunOutcome::Completed(summary))
            }
            ScanOutcome::Failed(done) => Ok(RunOutcome::Failed {
                image,
                report_id: done.report.report_id,
            }),
            ScanOutcome::Unrecognized { content_types } => Ok(RunOutcome::Unrecognized {
                image,
                content_types,
            }),
        }
    }
}

/// [`ScanRunner`] 빌더
pub struct ScanRunnerBuilder<A: RegistryApi> {
    api: A,
    endpoint: RegistryEndpoint,
    gate: SeverityGate,
    poll_interval: Duration,
    cancel: Option<CancellationToken>,
}

impl<A: RegistryApi> ScanRunnerBuilder<A> {
    /// 심각도 게이트를 설정합니다.
    pub fn gate(mut self, gate: SeverityGate) -> Self {
        self.gate = gate;
        self
    }

    /// 폴링 주기를 설정합니다.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 취소 토큰을 설정합니다.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> ScanRunner<A> {
        ScanRunner {
            api: self.api,
            endpoint: self.endpoint,
            gate: self.gate,
            poll_interval: self.poll_interval,
            cancel: self.cancel.unwrap_or_else(CancellationToken::new),
        }
    }
}
