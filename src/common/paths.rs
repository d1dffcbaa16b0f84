//! Output path helpers

/// Replaces characters that would split or escape a path component
///
/// Record strings (matrix types, operations, generators) end up in file and directory
/// names; after this they always name a single entry inside the output tree.
pub fn sanitize_component(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '<' | '>' | '"' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => sanitized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mul", "mul")]
    #[case("a/b", "a_b")]
    #[case("../x", ".._x")]
    #[case("C:\\tmp", "C__tmp")]
    #[case("..", "_")]
    #[case(".", "_")]
    #[case("", "_")]
    fn components_stay_inside_their_directory(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(sanitize_component(name), expected);
    }
}
