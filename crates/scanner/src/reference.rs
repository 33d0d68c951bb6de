//! 이미지 참조 파싱
//!
//! 사용자가 입력한 이미지 문자열을 Harbor API 경로에 쓸 수 있는
//! `(project, repository, reference)` 세 요소로 분해합니다.
//!
//! ```text
//! library/nginx                    -> (library, nginx, latest)
//! library/nginx:1.21               -> (library, nginx, 1.21)
//! team/apps/api@sha256:<64 hex>    -> (team, apps/api, sha256:<64 hex>)
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use serde::Serialize;

use harbor_scan_core::error::ImageError;

/// 1~4개 경로 세그먼트, 선택적 태그, 선택적 sha256 다이제스트.
const IMAGE_PATTERN: &str = r"(?i)^(?P<path>[0-9a-z_-]{1,40}(?:/[0-9a-z_-]{1,40}){0,3})(?::(?P<tag>[a-z0-9][a-z0-9._-]{1,38}[a-z0-9]))?(?:@(?P<digest>sha256:[0-9a-f]{64}))?$";

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(IMAGE_PATTERN).expect("image pattern is a valid regex"));

/// 태그와 다이제스트가 모두 없을 때 사용하는 참조
pub const DEFAULT_REFERENCE: &str = "latest";

/// 경로 세그먼트 하나로 쓸 때 인코딩할 문자 (`/` 포함)
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Harbor 아티팩트 좌표
///
/// 실행당 한 번 생성되며 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    project: String,
    repository: String,
    reference: String,
}

impl ImageReference {
    /// 레지스트리 접두사가 제거된 이미지 문자열을 파싱합니다.
    ///
    /// # Errors
    ///
    /// - `ImageError::InvalidFormat`: 문법에 맞지 않음
    /// - `ImageError::MissingRepository`: `/`가 없어 저장소를 알 수 없음
    pub fn parse(image: &str) -> Result<Self, ImageError> {
        let caps = IMAGE_RE
            .captures(image)
            .ok_or_else(|| ImageError::InvalidFormat(image.to_owned()))?;

        let path = caps.name("path").map_or("", |m| m.as_str());
        let (project, repository) = path
            .split_once('/')
            .ok_or_else(|| ImageError::MissingRepository(image.to_owned()))?;

        let reference = caps
            .name("digest")
            .or_else(|| caps.name("tag"))
            .map_or(DEFAULT_REFERENCE, |m| m.as_str());

        Ok(Self {
            project: project.to_owned(),
            repository: repository.to_owned(),
            reference: reference.to_owned(),
        })
    }

    /// 프로젝트명 (첫 번째 경로 세그먼트)
    pub fn project(&self) -> &str {
        &self.project
    }

    /// 저장소명 (나머지 세그먼트, `/` 포함 가능)
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// 태그, 다이제스트, 또는 `latest`
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// 단일 경로 세그먼트로 인코딩된 저장소명 (`a/b` -> `a%2Fb`)
    pub fn escaped_repository(&self) -> Cow<'_, str> {
        utf8_percent_encode(&self.repository, PATH_SEGMENT).into()
    }

    /// `/projects/{p}/repositories/{r}/artifacts/{ref}`
    pub fn artifact_path(&self) -> String {
        format!(
            "/projects/{}/repositories/{}/artifacts/{}",
            self.project,
            self.escaped_repository(),
            self.reference
        )
    }

    /// `/projects/{p}/repositories/{r}/artifacts/{ref}/scan`
    pub fn scan_path(&self) -> String {
        format!("{}/scan", self.artifact_path())
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.reference.starts_with("sha256:") {
            '@'
        } else {
            ':'
        };
        write!(
            f,
            "{}/{}{}{}",
            self.project, self.repository, sep, self.reference
        )
    }
}

/// 이미지 인자 앞의 `http(s)://<host>/` 또는 `<host>/` 접두사를 제거합니다.
///
/// 호스트가 일치하지 않으면 입력을 그대로 반환합니다.
pub fn strip_registry_prefix<'a>(image: &'a str, registry_host: &str) -> &'a str {
    let without_scheme = image
        .strip_prefix("https://")
        .or_else(|| image.strip_prefix("http://"))
        .unwrap_or(image);

    without_scheme
        .strip_prefix(registry_host)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(image)
}
