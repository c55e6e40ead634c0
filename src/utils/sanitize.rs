/// Strips characters that are unsafe in filenames on common filesystems,
/// along with spaces, so every node name maps to a unique flat file name.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| {
            !matches!(
                c,
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' '
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_unsafe_characters() {
        assert_eq!(
            sanitize_filename("England/LOND-123/2021|x?"),
            "EnglandLOND-1232021x"
        );
        assert_eq!(sanitize_filename("plain_name.1"), "plain_name.1");
    }
}
