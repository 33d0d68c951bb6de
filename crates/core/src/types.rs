//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeverityError;

/// 심각도 레벨
///
/// 사용자가 지정한 임계값과 스캐너가 보고한 심각도 모두 이 타입으로 표현됩니다.
/// `Ord` 구현으로 비교가 가능합니다 (`None < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 취약점 없음
    #[default]
    None,
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적
    Critical,
}

impl Severity {
    /// 모든 레벨 (오름차순)
    pub const ALL: [Severity; 5] = [
        Self::None,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Critical,
    ];

    /// 정규 이름에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분합니다. `"critical"`은 거부됩니다.
    pub fn parse(name: &str) -> Result<Self, SeverityError> {
        match name {
            "None" => Ok(Self::None),
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            "Critical" => Ok(Self::Critical),
            other => Err(SeverityError(other.to_owned())),
        }
    }

    /// 0(None) ~ 4(Critical) 서수
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// 정규 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// `self`가 `threshold` 이상이면 true (같은 레벨도 포함).
    pub fn reaches(self, threshold: Severity) -> bool {
        self >= threshold
    }
}

impl FromStr for Severity {
    type Err = SeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
