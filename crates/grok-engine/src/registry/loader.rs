//! 패턴 파일 로더 -- Logstash 형식 패턴 파일을 디스크에서 로드합니다.
//!
//! 파일 형식은 한 줄에 하나의 정의입니다.
//!
//! ```text
//! # 주석
//! REQUEST_ID req-[0-9a-f]{8}
//! APP_LINE %{TIMESTAMP_ISO8601:ts} %{REQUEST_ID:request_id} %{GREEDYDATA:msg}
//! ```
//!
//! 이름과 정규식은 첫 번째 공백 구간으로 구분됩니다.
//! 형식이 잘못된 줄은 경고 로그를 남기고 건너뜁니다.

use std::path::{Path, PathBuf};

use grokline_core::config::is_valid_pattern_name;

use crate::error::GrokEngineError;

/// 패턴 파일 최대 크기
const MAX_PATTERN_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
/// 한 디렉토리에서 로드할 수 있는 최대 정의 수
const MAX_PATTERNS_COUNT: usize = 100_000;

/// 패턴 파일 로더
pub struct PatternLoader;

impl PatternLoader {
    /// 디렉토리의 모든 패턴 파일을 로드합니다.
    ///
    /// 숨김 파일(`.`으로 시작)과 하위 디렉토리는 건너뜁니다.
    /// 파일은 이름 순으로 처리되므로 같은 이름이 여러 파일에 있으면
    /// 이름 순으로 뒤에 오는 파일의 정의가 남습니다.
    /// 개별 파일 로딩 실패는 경고 로그를 남기고 건너뜁니다.
    ///
    /// # Errors
    /// - 디렉토리를 읽을 수 없는 경우
    /// - 정의 수가 `MAX_PATTERNS_COUNT`를 초과하는 경우
    pub async fn load_directory(
        dir: impl AsRef<Path>,
    ) -> Result<Vec<(String, String)>, GrokEngineError> {
        let dir = dir.as_ref();

        let mut entries =
            tokio::fs::read_dir(dir)
                .await
                .map_err(|e| GrokEngineError::PatternLoad {
                    path: dir.display().to_string(),
                    reason: format!("failed to read directory: {e}"),
                })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        while let Some(entry) =
            entries
                .next_entry()
                .await
                .map_err(|e| GrokEngineError::PatternLoad {
                    path: dir.display().to_string(),
                    reason: format!("failed to read directory entry: {e}"),
                })?
        {
            let path = entry.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden {
                continue;
            }
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_file {
                paths.push(path);
            }
        }
        paths.sort();

        let mut patterns = Vec::new();
        for path in &paths {
            match Self::load_file(path).await {
                Ok(mut loaded) => patterns.append(&mut loaded),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load pattern file, skipping"
                    );
                }
            }

            if patterns.len() > MAX_PATTERNS_COUNT {
                return Err(GrokEngineError::PatternLoad {
                    path: dir.display().to_string(),
                    reason: format!("too many patterns: max {MAX_PATTERNS_COUNT}"),
                });
            }
        }

        tracing::info!(
            dir = %dir.display(),
            files = paths.len(),
            count = patterns.len(),
            "loaded custom patterns"
        );

        Ok(patterns)
    }

    /// 단일 패턴 파일을 로드합니다.
    pub async fn load_file(
        path: impl AsRef<Path>,
    ) -> Result<Vec<(String, String)>, GrokEngineError> {
        let path = path.as_ref();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| GrokEngineError::PatternLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_PATTERN_FILE_SIZE {
            return Err(GrokEngineError::PatternLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_PATTERN_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| GrokEngineError::PatternLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        Ok(Self::parse_text(&content, &path.display().to_string()))
    }

    /// 패턴 파일 내용을 (이름, 조각) 목록으로 파싱합니다.
    ///
    /// 빈 줄과 `#` 주석은 무시합니다.
    pub fn parse_text(content: &str, source: &str) -> Vec<(String, String)> {
        let mut patterns = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((name, fragment)) = line.split_once(char::is_whitespace) else {
                tracing::warn!(
                    source,
                    line = idx + 1,
                    "pattern definition has no regex, skipping"
                );
                continue;
            };
            let fragment = fragment.trim_start();

            if !is_valid_pattern_name(name) {
                tracing::warn!(
                    source,
                    line = idx + 1,
                    name,
                    "invalid pattern name, skipping"
                );
                continue;
            }

            patterns.push((name.to_owned(), fragment.to_owned()));
        }

        patterns
    }
}
