//! Represents the storage bucket every upload is written to.

use std::fmt;

/// Name of the bucket configured for this process.
///
/// Built once by the configuration layer and never mutated afterwards.
/// Handlers receive it by reference through the shared application state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketRef {
    name: String,
}

impl BucketRef {
    /// Returns `None` when the name is empty or only whitespace.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return None;
        }
        Some(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for BucketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_names() {
        assert!(BucketRef::new("").is_none());
        assert!(BucketRef::new("   ").is_none());
    }

    #[test]
    fn keeps_name_verbatim() {
        let bucket = BucketRef::new("my-bucket").unwrap();
        assert_eq!(bucket.name(), "my-bucket");
        assert_eq!(bucket.to_string(), "my-bucket");
    }
}
