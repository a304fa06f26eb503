/// Reduce a client-supplied file name to a safe flat name.
///
/// Path separators and whitespace become `_`, every other character outside
/// ASCII alphanumerics, `.`, `-` and `_` is dropped, and leading dots or
/// underscores are stripped. Returns `None` when nothing usable is left.
pub fn secure_filename(name: &str) -> Option<String> {
    let normalized: String = name
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('_'),
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            _ => None,
        })
        .collect();

    let mut collapsed = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }

    let trimmed = collapsed.trim_start_matches(['.', '_']).trim_end_matches('_');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `true` when `name` is already a flat name `secure_filename` would keep.
pub fn is_secure_filename(name: &str) -> bool {
    secure_filename(name).as_deref() == Some(name)
}

/// Storage name for a fresh upload: `{uuid}_{name}`.
pub fn unique_filename(secure_name: &str) -> String {
    format!("{}_{}", uuid::Uuid::new_v4(), secure_name)
}

pub fn processed_filename(filename: &str) -> String {
    format!("processed_{}", filename)
}

pub fn upload_url(filename: &str) -> String {
    format!("/{}/{}", UPLOADS_AREA, filename)
}

pub fn processed_url(filename: &str) -> String {
    format!("/{}/{}", PROCESSED_AREA, filename)
}

/// Archive area of original uploads, also their URL segment.
pub const UPLOADS_AREA: &str = "uploads";
/// Archive area of rendered artifacts, also their URL segment.
pub const PROCESSED_AREA: &str = "processed";

/// Object key of an archived artifact. Each area has its own key space so a
/// name can never resolve to a file of the other area.
pub fn archive_key(area: &str, filename: &str) -> String {
    format!("{}/{}", area, filename)
}

pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(secure_filename("rust_plate-01.JPG").as_deref(), Some("rust_plate-01.JPG"));
    }

    #[test]
    fn flattens_paths_and_spaces() {
        assert_eq!(secure_filename("../../etc/passwd").as_deref(), Some("etc_passwd"));
        assert_eq!(secure_filename("my photo 1.png").as_deref(), Some("my_photo_1.png"));
        assert_eq!(secure_filename("C:\\Users\\pic.jpg").as_deref(), Some("C_Users_pic.jpg"));
    }

    #[test]
    fn drops_non_ascii_and_hidden_prefixes() {
        assert_eq!(secure_filename("Ärger.jpg").as_deref(), Some("rger.jpg"));
        assert_eq!(secure_filename(".bashrc").as_deref(), Some("bashrc"));
    }

    #[test]
    fn nothing_usable_is_none() {
        assert_eq!(secure_filename(""), None);
        assert_eq!(secure_filename("..."), None);
        assert_eq!(secure_filename("/"), None);
        assert_eq!(secure_filename("日本"), None);
    }

    #[test]
    fn detect_accepts_only_flat_names() {
        assert!(is_secure_filename("abc_def.jpg"));
        assert!(!is_secure_filename("../abc.jpg"));
        assert!(!is_secure_filename("a/b.jpg"));
    }

    #[test]
    fn derived_names_and_urls() {
        let unique = unique_filename("a.jpg");
        assert!(unique.ends_with("_a.jpg"));
        assert_eq!(unique.len(), 36 + 1 + 5);
        assert_eq!(processed_filename("x.png"), "processed_x.png");
        assert_eq!(upload_url("x.png"), "/uploads/x.png");
        assert_eq!(processed_url("x.png"), "/processed/x.png");
    }

    #[test]
    fn archive_keys_are_scoped_by_area() {
        assert_eq!(archive_key(UPLOADS_AREA, "processed_x.png"), "uploads/processed_x.png");
        assert_eq!(archive_key(PROCESSED_AREA, "processed_x.png"), "processed/processed_x.png");
        assert_ne!(
            archive_key(UPLOADS_AREA, "processed_x.png"),
            archive_key(PROCESSED_AREA, "processed_x.png")
        );
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
