//! 스캔 상태 폴링 -- 원격 스캔 작업이 끝날 때까지 주기적으로 조회
//!
//! [`ScanMonitor`]는 단일 태스크에서 동작하는 상태 머신입니다.
//!
//! ```text
//! Polling ──(Success)──▶ Succeeded
//!    │  ▲
//!    │  └─(Pending/Running/...)
//!    ├───(Error)────────▶ Failed
//!    └───(no known type)▶ Unrecognized
//! ```
//!
//! 첫 조회는 한 주기 뒤에 일어나며, 이전 조회가 끝나기 전에는 다음 조회를 하지 않습니다.
//! 조회 에러는 재시도 없이 즉시 루프를 종료합니다.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::RegistryApi;
use crate::error::ScannerError;
use crate::reference::ImageReference;
use crate::report::{ScanOverview, ScanReport, ScanStatus};

/// 기본 폴링 주기
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// 종료 상태에 도달한 리포트와 아티팩트 정보
#[derive(Debug, Clone)]
pub struct CompletedScan {
    /// 프로젝트 ID
    pub project_id: i64,
    /// 아티팩트 다이제스트
    pub digest: String,
    /// 선택된 리포트의 content-type
    pub content_type: &'static str,
    /// 리포트 본문
    pub report: ScanReport,
}

/// 폴링 루프의 종료 상태
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// 스캔 성공. 리포트를 출력하고 심각도 정책을 적용합니다.
    Succeeded(CompletedScan),
    /// 서버 측 스캔 실패. 리포트 출력과 정책 판정을 하지 않습니다.
    Failed(CompletedScan),
    /// 지원하는 content-type의 리포트가 없음
    Unrecognized {
        /// 응답에 있던 content-type 목록
        content_types: Vec<String>,
    },
}

/// 한 번의 조회 결과
#[derive(Debug)]
enum PollState {
    InProgress { status: ScanStatus, percent: u32 },
    Done(ScanOutcome),
}

fn evaluate(overview: ScanOverview) -> PollState {
    let Some((content_type, report)) = overview.select_report() else {
        return PollState::Done(ScanOutcome::Unrecognized {
            content_types: overview.content_types(),
        });
    };

    if !report.scan_status.is_terminal() {
        return PollState::InProgress {
            status: report.scan_status.clone(),
            percent: report.complete_percent,
        };
    }

    let completed = CompletedScan {
        project_id: overview.project_id,
        digest: overview.digest.clone(),
        content_type,
        report: report.clone(),
    };

    match completed.report.scan_status {
        ScanStatus::Success => PollState::Done(ScanOutcome::Succeeded(completed)),
        _ => PollState::Done(ScanOutcome::Failed(completed)),
    }
}

/// 스캔 완료 대기자
pub struct ScanMonitor<'a, A: RegistryApi> {
    api: &'a A,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl<'a, A: RegistryApi> ScanMonitor<'a, A> {
    /// 새 모니터를 생성합니다.
    pub fn new(api: &'a A, poll_interval: Duration) -> Self {
        Self {
            api,
            poll_interval,
            cancel: CancellationToken::new(),
        }
    }

    /// 외부 취소 토큰을 연결합니다.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 스캔이 종료 상태에 도달할 때까지 폴링합니다.
    ///
    /// # Errors
    ///
    /// - `ScannerError::Forbidden`: 아티팩트 read 권한 없음
    /// - `ScannerError::Cancelled`: 취소 토큰이 발동됨
    /// - 그 외 조회 에러 (재시도 없음)
    pub async fn wait_for_completion(
        &self,
        image: &ImageReference,
    ) -> Result<ScanOutcome, ScannerError> {
        let mut ticker = time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut polls: u32 = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(image = %image, polls, "scan monitoring cancelled");
                    return Err(ScannerError::Cancelled);
                }
                _ = ticker.tick() => {}
            }

            polls += 1;
            let overview = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(image = %image, polls, "scan monitoring cancelled during fetch");
                    return Err(ScannerError::Cancelled);
                }
                result = self.api.scan_overview(image) => result.map_err(|e| {
                    e.name_missing_permission("read", "artifact", image.project())
                })?,
            };

            match evaluate(overview) {
                PollState::InProgress { status, percent } => {
                    debug!(image = %image, polls, %status, percent, "scan in progress");
                }
                PollState::Done(outcome) => {
                    match &outcome {
                        ScanOutcome::Succeeded(done) => {
                            info!(image = %image, polls, report_id = %done.report.report_id, "scan finished");
                        }
                        ScanOutcome::Failed(done) => {
                            warn!(image = %image, polls, report_id = %done.report.report_id, "scan failed on the server");
                        }
                        ScanOutcome::Unrecognized { content_types } => {
                            warn!(image = %image, polls, ?content_types, "no supported report type in scan overview");
                        }
                    }
                    return Ok(outcome);
                }
            }
        }
    }
}
