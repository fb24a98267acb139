//! 패턴 정의 파일 로더 -- YAML 정의 목록을 디스크에서 로드합니다.
//!
//! 두 가지 형식을 받습니다.
//!
//! ```yaml
//! # 목록
//! - name: app
//!   pattern: "%{TIMESTAMP_ISO8601:ts} %{LOGLEVEL:lvl} %{GREEDYDATA:msg}"
//! ```
//!
//! ```yaml
//! # patterns 키 아래 목록
//! patterns:
//!   - id: 7d0c...
//!     name: nginx
//!     pattern: "%{COMBINEDAPACHELOG}"
//! ```
//!
//! `id`가 없으면 UUID v4가 할당됩니다. 정의 순서가 매칭 우선순위입니다.

use std::path::Path;

use serde::Deserialize;

use crate::error::GrokEngineError;
use crate::types::PatternDefinition;

/// 정의 파일 최대 크기
const MAX_DEFINITION_FILE_SIZE: u64 = 1024 * 1024; // 1MB

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    List(Vec<PatternDefinition>),
    Wrapped { patterns: Vec<PatternDefinition> },
}

/// 패턴 정의 파일 로더
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// 정의 파일 하나를 로드합니다.
    pub async fn load_file(
        path: impl AsRef<Path>,
    ) -> Result<Vec<PatternDefinition>, GrokEngineError> {
        let path = path.as_ref();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| GrokEngineError::PatternLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_DEFINITION_FILE_SIZE {
            return Err(GrokEngineError::PatternLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_DEFINITION_FILE_SIZE})",
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

        let definitions = Self::parse_yaml(&content, &path.display().to_string())?;
        tracing::debug!(
            path = %path.display(),
            count = definitions.len(),
            "loaded pattern definitions"
        );
        Ok(definitions)
    }

    /// YAML 문자열을 정의 목록으로 파싱합니다.
    pub fn parse_yaml(
        yaml_str: &str,
        source: &str,
    ) -> Result<Vec<PatternDefinition>, GrokEngineError> {
        let file: DefinitionFile =
            serde_yaml::from_str(yaml_str).map_err(|e| GrokEngineError::PatternLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        let definitions = match file {
            DefinitionFile::List(list) => list,
            DefinitionFile::Wrapped { patterns } => patterns,
        };

        if definitions.is_empty() {
            return Err(GrokEngineError::PatternLoad {
                path: source.to_owned(),
                reason: "no pattern definitions found".to_owned(),
            });
        }

        Ok(definitions)
    }
}
