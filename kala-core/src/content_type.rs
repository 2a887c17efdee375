/// Content type of an uploaded artwork file.
///
/// Only image types are accepted for upload; anything else maps to
/// `OctetStream` and is rejected by the upload path.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentType {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Svg,
    OctetStream,
}

impl ContentType {
    /// MIME type string sent as the upload's `Content-Type`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Svg => "image/svg+xml",
            Self::OctetStream => "application/octet-stream",
        }
    }

    /// Map a file extension to its content type.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "gif" => Self::Gif,
            "webp" => Self::Webp,
            "bmp" => Self::Bmp,
            "svg" => Self::Svg,
            _ => Self::OctetStream,
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, Self::OctetStream)
    }

    /// Canonical extension used for stored object names.
    pub fn extension(&self) -> &str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Svg => "svg",
            Self::OctetStream => "bin",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension of a file name, if it has one.
pub fn file_extension(file_name: &str) -> Option<&str> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_extension_image() {
        assert_eq!(ContentType::from_extension("jpg"), ContentType::Jpeg);
        assert_eq!(ContentType::from_extension("JPEG"), ContentType::Jpeg);
        assert_eq!(ContentType::from_extension("png"), ContentType::Png);
        assert_eq!(ContentType::from_extension("webp"), ContentType::Webp);
    }

    #[test]
    fn non_image_is_rejected() {
        assert!(!ContentType::from_extension("pdf").is_image());
        assert!(!ContentType::from_extension("").is_image());
        assert!(ContentType::Svg.is_image());
    }

    #[test]
    fn canonical_extension() {
        assert_eq!(ContentType::from_extension("jpeg").extension(), "jpg");
    }

    #[test]
    fn file_extension_parsing() {
        assert_eq!(file_extension("warli.final.PNG"), Some("PNG"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".hidden"), None);
    }
}
