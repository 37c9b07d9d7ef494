//! Downloadable export payload

/// Serialized workbook plus the metadata needed to send it as an attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Download {
    pub fn new(filename: String, content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            filename,
            content_type,
            body,
        }
    }

    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"{}\"",
            self.filename.replace(['"', '\\'], "_")
        )
    }

    /// Response headers for a file-transfer download, lowercase names.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("content-description", "File Transfer".to_string()),
            ("content-type", self.content_type.to_string()),
            ("content-disposition", self.content_disposition()),
            ("content-transfer-encoding", "binary".to_string()),
            ("pragma", "public".to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers() {
        let download = Download::new("report.xlsx".to_string(), "application/x", vec![1, 2]);
        let headers = download.headers();
        assert_eq!(headers.len(), 5);
        assert!(headers.contains(&(
            "content-disposition",
            "attachment; filename=\"report.xlsx\"".to_string()
        )));
        assert!(headers.contains(&("content-transfer-encoding", "binary".to_string())));
        assert!(headers.contains(&("content-type", "application/x".to_string())));
    }

    #[test]
    fn test_disposition_escapes_quotes() {
        let download = Download::new("a\"b.csv".to_string(), "text/csv", Vec::new());
        assert_eq!(download.content_disposition(), "attachment; filename=\"a_b.csv\"");
    }
}
