//! Command lines for privileged script execution
//!
//! Scripts are first tried through `sudo` and demoted to a plain `bash`
//! invocation when that fails. The path is inserted verbatim; callers pass
//! paths already checked by [`validate_remote_path`](super::sanitize::validate_remote_path).

/// Run the script as root via sudo
///
/// # Examples
///
/// ```
/// use deployfast::ssh::elevation::sudo_command;
///
/// assert_eq!(sudo_command("/tmp/provision.sh"), "sudo bash /tmp/provision.sh");
/// ```
pub fn sudo_command(script_path: &str) -> String {
    format!("sudo bash {}", script_path)
}

/// Run the script as the login user
pub fn plain_command(script_path: &str) -> String {
    format!("bash {}", script_path)
}

/// Single shell expression that lets the remote shell do the sudo fallback
///
/// # Examples
///
/// ```
/// use deployfast::ssh::elevation::sudo_or_plain_command;
///
/// assert_eq!(
///     sudo_or_plain_command("/tmp/provision.sh"),
///     "sudo bash /tmp/provision.sh || bash /tmp/provision.sh"
/// );
/// ```
pub fn sudo_or_plain_command(script_path: &str) -> String {
    format!("{} || {}", sudo_command(script_path), plain_command(script_path))
}
