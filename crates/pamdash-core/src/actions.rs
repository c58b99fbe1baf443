//! Human-readable descriptions for action codes.

const DESCRIPTIONS: &[(&str, &str)] = &[
    ("DB_CONNECT", "Established connection to database server"),
    ("RUN_QUERY", "Executed SQL query on database"),
    ("BACKUP_DB", "Initiated database backup operation"),
    ("DELETE_TABLE", "Attempted to delete database table (High Risk)"),
    ("SSH_ROUTER", "Established SSH connection to network router"),
    ("PING_HOST", "Performed network connectivity test"),
    ("CHECK_FIREWALL", "Checked firewall port configuration"),
    ("SHUTDOWN_ROUTER", "Attempted router shutdown (Critical Risk)"),
    ("OAUTH_LOGIN_SUCCESS", "Successfully authenticated via OAuth"),
    ("LOGIN_SUCCESS", "Successfully logged into system"),
    (
        "LOGIN_FAILED_WRONG_PASSWORD",
        "Failed login attempt - incorrect password",
    ),
    ("LOGIN_FAILED_NO_USER", "Failed login attempt - user not found"),
    (
        "PORTAL_ACCESS_REVOKED",
        "Portal access terminated due to policy violation",
    ),
    ("START_SERVER", "Started application server"),
    ("DEPLOY_APP", "Deployed application to server"),
    ("GIT_PULL", "Retrieved code from version control"),
    ("CHECK_BILLING", "Accessed cloud billing information"),
    ("PROVISION_VM", "Created new virtual machine instance"),
    ("SCALE_CLUSTER", "Modified cluster scaling configuration"),
    ("UPDATE_IAM", "Modified identity and access management settings"),
    (
        "rm -rf /",
        "Attempted destructive file system operation (Critical Risk)",
    ),
];

const UNKNOWN: &str = "Unknown system action performed";

/// Returns the description for an action code. Matching is exact.
pub fn describe(action: &str) -> &'static str {
    DESCRIPTIONS
        .iter()
        .find(|(code, _)| *code == action)
        .map_or(UNKNOWN, |(_, description)| description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_actions() {
        assert_eq!(describe("GIT_PULL"), "Retrieved code from version control");
        assert_eq!(
            describe("rm -rf /"),
            "Attempted destructive file system operation (Critical Risk)"
        );
    }

    #[test]
    fn test_unknown_action_falls_back() {
        assert_eq!(describe("git_pull"), UNKNOWN);
        assert_eq!(describe(""), UNKNOWN);
    }
}
