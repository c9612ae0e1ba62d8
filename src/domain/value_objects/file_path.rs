use serde::{Deserialize, Serialize};

/// Storage path of an uploaded document: `{owner email}/{filename}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilePath(String);

impl FilePath {
    pub fn for_upload(owner_email: &str, filename: &str) -> Result<Self, String> {
        validate_segment(owner_email, "Owner")?;
        validate_segment(filename, "File name")?;
        Ok(Self(format!("{}/{}", owner_email, filename)))
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let (owner, filename) = raw
            .split_once('/')
            .ok_or_else(|| format!("Not a document path: {}", raw))?;
        Self::for_upload(owner, filename)
    }

    pub fn owner_prefix(owner_email: &str) -> String {
        format!("{}/", owner_email)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn owner(&self) -> &str {
        self.0.split_once('/').map(|(owner, _)| owner).unwrap_or_default()
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.owner() == email
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_segment(segment: &str, label: &str) -> Result<(), String> {
    if segment.trim().is_empty() {
        return Err(format!("{} cannot be empty", label));
    }
    if segment == "." || segment == ".." {
        return Err(format!("{} is not a valid path segment", label));
    }
    if segment.contains(['/', '\\', '\0']) {
        return Err(format!("{} cannot contain path separators", label));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_path_joins_owner_and_name() {
        let path = FilePath::for_upload("ops@example.com", "shifts.pdf").unwrap();
        assert_eq!(path.as_str(), "ops@example.com/shifts.pdf");
        assert_eq!(path.owner(), "ops@example.com");
        assert!(path.is_owned_by("ops@example.com"));
        assert!(!path.is_owned_by("other@example.com"));
    }

    #[test]
    fn test_rejects_traversal_and_separators() {
        assert!(FilePath::for_upload("a@b.c", "").is_err());
        assert!(FilePath::for_upload("a@b.c", "..").is_err());
        assert!(FilePath::for_upload("a@b.c", "dir/x.pdf").is_err());
        assert!(FilePath::for_upload("a@b.c", "..\\x.pdf").is_err());
        assert!(FilePath::parse("no-separator").is_err());
    }

    #[test]
    fn test_parse_round_trips() {
        let path = FilePath::parse("a@b.c/report 2024.pdf").unwrap();
        assert_eq!(path.owner(), "a@b.c");
        assert_eq!(path.as_str(), "a@b.c/report 2024.pdf");
        assert_eq!(FilePath::owner_prefix("a@b.c"), "a@b.c/");
    }
}
