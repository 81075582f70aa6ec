//! Public URL naming for stored objects.

/// Host serving publicly readable Cloud Storage objects.
const PUBLIC_HOST: &str = "https://storage.googleapis.com";

/// Build the public URL for `bucket/object_name`.
///
/// The object name is inserted as-is. The URL follows the naming convention
/// only; it says nothing about whether the object is actually readable.
pub fn build_url(bucket: &str, object_name: &str) -> String {
    format!("{}/{}/{}", PUBLIC_HOST, bucket, object_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bucket_and_object() {
        assert_eq!(
            build_url("my-bucket", "report.pdf"),
            "https://storage.googleapis.com/my-bucket/report.pdf"
        );
    }

    #[test]
    fn does_not_escape_object_name() {
        assert_eq!(
            build_url("b", "dir/my file?.txt"),
            "https://storage.googleapis.com/b/dir/my file?.txt"
        );
    }
}
