use crate::TreeError;

/// Canonical form of a slash-delimited path.
///
/// `"."` and `""` are the root. `.` segments, leading and trailing slashes
/// and repeated slashes are dropped. `..` and NUL bytes are rejected.
///
/// ```
/// use mdgraph_tree::canonicalize_path;
/// assert_eq!(canonicalize_path("./a//b/").unwrap(), "a/b");
/// assert_eq!(canonicalize_path("a/./b").unwrap(), "a/b");
/// assert_eq!(canonicalize_path(".").unwrap(), "");
/// assert!(canonicalize_path("a/../b").is_err());
/// ```
pub fn canonicalize_path(path: &str) -> Result<String, TreeError> {
    Ok(segments(path)?.join("/"))
}

/// Canonical segments of `path`; empty for the root.
pub fn segments(path: &str) -> Result<Vec<&str>, TreeError> {
    let invalid = |reason| TreeError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    if path.contains('\0') {
        return Err(invalid("contains NUL"));
    }
    let mut out = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => return Err(invalid("contains '..'")),
            _ => out.push(part),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms() {
        for (input, expected) in [
            ("", ""),
            (".", ""),
            ("/", ""),
            ("./", ""),
            ("a", "a"),
            ("/a/", "a"),
            ("./a/b", "a/b"),
            ("././a", "a"),
            ("a//b///c", "a/b/c"),
            ("a/./b", "a/b"),
            ("a/b/.", "a/b"),
            ("./a/././/b/", "a/b"),
        ] {
            assert_eq!(canonicalize_path(input).unwrap(), expected, "{input:?}");
        }
    }

    #[test]
    fn rejects_escapes() {
        for input in ["..", "a/..", "./../a", "a/./../b", "a\0b"] {
            assert!(
                matches!(canonicalize_path(input), Err(TreeError::InvalidPath { .. })),
                "{input:?}"
            );
        }
    }
}
