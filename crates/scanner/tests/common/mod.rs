//! 통합 테스트용 스크립트 레지스트리

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use harbor_scan_scanner::report::VULNERABILITY_REPORT_V1_1;
use harbor_scan_scanner::{
    ApiError, ImageReference, RegistryApi, ScanOverview, ScanReport, ScanStatus, ScannerError,
};

/// 미리 정해 둔 응답을 순서대로 돌려주는 레지스트리
#[derive(Default)]
pub struct ScriptedRegistry {
    launch_error: Option<ApiError>,
    overviews: Mutex<VecDeque<Result<ScanOverview, ApiError>>>,
    launched: Mutex<Vec<String>>,
    fetches: AtomicUsize,
}

impl ScriptedRegistry {
    pub fn new(overviews: Vec<Result<ScanOverview, ApiError>>) -> Self {
        Self {
            overviews: Mutex::new(overviews.into()),
            ..Self::default()
        }
    }

    pub fn failing_launch(mut self, code: &str, message: &str) -> Self {
        self.launch_error = Some(api_error(code, message));
        self
    }

    /// 스캔 요청된 아티팩트 경로
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl RegistryApi for ScriptedRegistry {
    async fn start_scan(&self, image: &ImageReference) -> Result<(), ScannerError> {
        self.launched.lock().unwrap().push(image.scan_path());
        match &self.launch_error {
            Some(err) => Err(ScannerError::Api(err.clone())),
            None => Ok(()),
        }
    }

    async fn scan_overview(&self, _image: &ImageReference) -> Result<ScanOverview, ScannerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.overviews.lock().unwrap().pop_front() {
            Some(Ok(overview)) => Ok(overview),
            Some(Err(err)) => Err(ScannerError::Api(err)),
            None => panic!("registry script exhausted"),
        }
    }
}

pub fn api_error(code: &str, message: &str) -> ApiError {
    ApiError {
        code: code.to_owned(),
        message: message.to_owned(),
    }
}

/// 범용 리포트 형식의 개요
pub fn overview(status: ScanStatus, severity: &str) -> ScanOverview {
    let mut overview = ScanOverview {
        project_id: 12,
        digest: "sha256:0d8e".to_owned(),
        ..ScanOverview::default()
    };
    overview.scan_overview.insert(
        VULNERABILITY_REPORT_V1_1.to_owned(),
        ScanReport {
            report_id: "report-12".to_owned(),
            scan_status: status,
            severity: severity.to_owned(),
            ..ScanReport::default()
        },
    );
    overview
}
