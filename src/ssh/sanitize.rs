//! Remote path validation
//!
//! Staging paths end up unquoted inside `chmod`, `bash` and `rm` command
//! lines, so only plain absolute paths are accepted.

use std::path::Path;

use crate::error::{DeployError, Result};

/// Directory scripts are staged in when no explicit remote path is given
pub const STAGING_DIR: &str = "/tmp";

/// Check that `path` is safe to interpolate into a remote command line
///
/// Accepted paths are absolute and consist only of ASCII letters, digits
/// and `/ . _ - +`.
///
/// # Examples
/// ```
/// use deployfast::ssh::sanitize::validate_remote_path;
///
/// assert!(validate_remote_path("/tmp/provision.sh").is_ok());
/// assert!(validate_remote_path("/tmp/a b.sh").is_err());
/// assert!(validate_remote_path("tmp/provision.sh").is_err());
/// ```
pub fn validate_remote_path(path: &str) -> Result<&str> {
    if !path.starts_with('/') {
        return Err(DeployError::invalid_params(format!(
            "Remote path must be absolute: '{}'",
            path
        )));
    }

    if path.ends_with('/') {
        return Err(DeployError::invalid_params(format!(
            "Remote path must name a file, not a directory: '{}'",
            path
        )));
    }

    if let Some(bad) = path
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+')))
    {
        return Err(DeployError::invalid_params(format!(
            "Remote path contains unsupported character {:?}: '{}'",
            bad, path
        )));
    }

    Ok(path)
}

/// Default staging path for a local script: `/tmp/<file name>`
///
/// # Examples
/// ```
/// use std::path::Path;
/// use deployfast::ssh::sanitize::staging_path_for;
///
/// assert_eq!(staging_path_for(Path::new("templates/provision.sh")).unwrap(), "/tmp/provision.sh");
/// ```
pub fn staging_path_for(local_script: &Path) -> Result<String> {
    let name = local_script
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            DeployError::invalid_params(format!(
                "Script path has no usable file name: {}",
                local_script.display()
            ))
        })?;

    let path = format!("{}/{}", STAGING_DIR, name);
    validate_remote_path(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_remote_path_valid() {
        assert_eq!(validate_remote_path("/tmp/provision.sh").unwrap(), "/tmp/provision.sh");
        assert!(validate_remote_path("/opt/my-app/deploy_v1.2+b.sh").is_ok());
    }

    #[test]
    fn test_validate_remote_path_relative() {
        let err = validate_remote_path("provision.sh").unwrap_err();
        assert!(err.to_string().contains("must be absolute"));
    }

    #[test]
    fn test_validate_remote_path_directory() {
        assert!(validate_remote_path("/tmp/").is_err());
    }

    #[test]
    fn test_validate_remote_path_metacharacters() {
        for path in [
            "/tmp/x.sh; rm -rf /",
            "/tmp/$(id).sh",
            "/tmp/a b.sh",
            "/tmp/`x`.sh",
            "/tmp/x.sh|cat",
            "/tmp/'q'.sh",
        ] {
            let err = validate_remote_path(path).unwrap_err();
            assert!(err.to_string().contains("unsupported character"), "{}", path);
        }
    }

    #[test]
    fn test_staging_path_for() {
        assert_eq!(
            staging_path_for(Path::new("templates/deploy.sh")).unwrap(),
            "/tmp/deploy.sh"
        );
        assert!(staging_path_for(Path::new("templates/my script.sh")).is_err());
        assert!(staging_path_for(Path::new("/")).is_err());
    }
}
