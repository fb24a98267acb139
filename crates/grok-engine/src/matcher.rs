//! 매처 -- 컴파일된 패턴 하나를 라인 하나에 적용합니다.
//!
//! 가장 왼쪽의 첫 매칭을 사용하며, 캡처 값은 정규화하거나 trim하지 않습니다.

use indexmap::IndexMap;

use crate::compiler::CompiledPattern;

/// 필드 이름 -> 캡처 값 (필드 스키마 순서 유지)
pub type FieldMap = IndexMap<String, String>;

/// 패턴을 라인에 매칭합니다.
///
/// 매칭되지 않으면 `None`을 반환합니다. 매칭에 참여하지 않은 선택적 그룹의
/// 필드는 맵에 넣지 않습니다. 같은 필드 이름이 여러 번 캡처되면 마지막 값이
/// 남고, 위치는 첫 등장 순서를 따릅니다.
pub fn match_line(pattern: &CompiledPattern, line: &str) -> Option<FieldMap> {
    let regex = pattern.regex();
    let mut locations = regex.capture_locations();
    regex.captures_read(&mut locations, line)?;

    let schema = pattern.fields();
    let mut fields = FieldMap::with_capacity(schema.len());
    for (idx, spec) in schema.iter().enumerate() {
        if let Some((start, end)) = locations.get(idx + 1) {
            fields.insert(spec.name.clone(), line[start..end].to_owned());
        }
    }
    Some(fields)
}
