//! 정규식 조각 내 캡처 그룹 무력화
//!
//! 레지스트리 조각에 들어 있는 `( )`, `(?P<name> )`, `(?<name> )` 그룹을
//! `(?: )`로 바꿉니다. 컴파일된 정규식의 캡처 그룹은 필드 토큰이 만든 것뿐이어야
//! 그룹 번호와 필드 스키마가 1:1로 대응합니다.

use std::borrow::Cow;

/// 조각의 캡처 그룹을 비캡처 그룹으로 바꿉니다.
///
/// 이스케이프(`\(`)와 문자 클래스(`[(]`) 안의 괄호는 그대로 둡니다.
/// 바꿀 것이 없으면 원문을 빌려서 반환합니다.
pub fn neutralize_groups(fragment: &str) -> Cow<'_, str> {
    if !fragment.contains('(') {
        return Cow::Borrowed(fragment);
    }

    let bytes = fragment.as_bytes();
    let mut out = String::with_capacity(fragment.len() + 8);
    let mut changed = false;
    let mut copied = 0;
    let mut i = 0;
    let mut escaped = false;
    let mut class_depth = 0usize;
    // 문자 클래스 시작 직후 위치 (`[]` 또는 `[^]`의 `]`는 리터럴)
    let mut class_start = usize::MAX;

    while i < bytes.len() {
        let b = bytes[i];
        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'[' => {
                class_depth += 1;
                class_start = if bytes.get(i + 1) == Some(&b'^') {
                    i + 2
                } else {
                    i + 1
                };
            }
            b']' if class_depth > 0 && i != class_start => class_depth -= 1,
            b'(' if class_depth == 0 => {
                if let Some(skip) = capture_prefix_len(&bytes[i..]) {
                    out.push_str(&fragment[copied..i]);
                    out.push_str("(?:");
                    i += skip;
                    copied = i;
                    changed = true;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if !changed {
        return Cow::Borrowed(fragment);
    }
    out.push_str(&fragment[copied..]);
    Cow::Owned(out)
}

/// `(`로 시작하는 입력이 캡처 그룹이면 여는 부분의 길이를 반환합니다.
///
/// - `(` 다음이 `?`가 아니면 1
/// - `(?P<name>`, `(?<name>`이면 `>`까지의 길이
/// - 그 외(`(?:`, `(?i)`, `(?<=` 등)는 `None`
fn capture_prefix_len(input: &[u8]) -> Option<usize> {
    match input.get(1) {
        Some(b'?') => {}
        _ => return Some(1),
    }

    let name_start = match (input.get(2), input.get(3)) {
        (Some(b'P'), Some(b'<')) => 4,
        (Some(b'<'), Some(b'=' | b'!')) => return None,
        (Some(b'<'), _) => 3,
        _ => return None,
    };

    input[name_start..]
        .iter()
        .position(|&b| b == b'>')
        .map(|end| name_start + end + 1)
}
