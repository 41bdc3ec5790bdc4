//! Sanitizers for caller-supplied paths and file names.

/// Strip traversal sequences and leading slashes, and collapse repeated
/// separators.
pub fn sanitize_path(path: &str) -> String {
    let without_traversal = path.replace("..", "");
    let mut out = String::with_capacity(without_traversal.len());
    let mut prev_slash = false;
    for c in without_traversal.trim_start_matches('/').chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out.trim().to_string()
}

/// Make a file name safe to embed in a header or a single path segment.
pub fn sanitize_filename(filename: &str) -> String {
    let replaced: String = filename
        .replace("..", "")
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('_'),
            '"' => None,
            c if is_control(c) => None,
            c => Some(c),
        })
        .collect();
    replaced.trim_start_matches('.').trim().to_string()
}

fn is_control(c: char) -> bool {
    matches!(c as u32, 0x00..=0x1f | 0x7f..=0x9f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_traversal_removed() {
        assert_eq!(sanitize_path("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_path("///docs//a///b.md"), "docs/a/b.md");
        assert_eq!(sanitize_path(" docs/readme.md "), "docs/readme.md");
    }

    #[test]
    fn filename_separators_and_controls() {
        assert_eq!(sanitize_filename("a/b\\c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_filename("...hidden"), "hidden");
        assert_eq!(sanitize_filename("evil\u{0}\"name\".png"), "evilname.png");
    }

    proptest::proptest! {
        #[test]
        fn sanitized_paths_never_traverse(raw in "[./a-z\\\\ ]{0,24}") {
            let clean = sanitize_path(&raw);
            proptest::prop_assert!(!clean.contains(".."));
            proptest::prop_assert!(!clean.contains("//"));
        }

        #[test]
        fn sanitized_filenames_are_single_segments(raw in "\\PC{0,24}") {
            let clean = sanitize_filename(&raw);
            proptest::prop_assert!(!clean.contains('/'));
            proptest::prop_assert!(!clean.contains('"'));
        }
    }
}
