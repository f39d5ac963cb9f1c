// ABOUTME: Heuristic triage of deployment errors into coarse failure categories.
// ABOUTME: An ordered keyword table; lossy by nature and never used for control flow.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCategory {
    Credentials,
    Region,
    Tooling,
    Permissions,
    InfrastructureStack,
    ComputeFunction,
    ApiGateway,
    Unknown,
}

/// First matching row wins, so more specific causes come first.
const RULES: &[(FailureCategory, &[&str])] = &[
    (
        FailureCategory::Credentials,
        &[
            "credential",
            "security token",
            "invalidclienttokenid",
            "signaturedoesnotmatch",
            "expiredtoken",
            "access key",
            "serverless_access_key",
        ],
    ),
    (FailureCategory::Region, &["region"]),
    (
        FailureCategory::Tooling,
        &[
            "failed to start",
            "command not found",
            "not recognized as",
            "enoent",
            "cannot find module",
        ],
    ),
    (
        FailureCategory::Permissions,
        &[
            "accessdenied",
            "access denied",
            "not authorized",
            "unauthorizedoperation",
            "forbidden",
            "permission denied",
        ],
    ),
    (
        FailureCategory::InfrastructureStack,
        &["cloudformation", "stack", "rollback_complete", "rollback_failed"],
    ),
    (FailureCategory::ComputeFunction, &["lambda", "function"]),
    (
        FailureCategory::ApiGateway,
        &["api gateway", "apigateway", "execute-api", "rest api", "http api"],
    ),
];

impl FailureCategory {
    /// Classify raw error text. Matching is case-insensitive substring search.
    pub fn classify(text: &str) -> Self {
        let text = text.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(FailureCategory::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::Credentials => "credentials",
            FailureCategory::Region => "region",
            FailureCategory::Tooling => "tooling",
            FailureCategory::Permissions => "permissions",
            FailureCategory::InfrastructureStack => "infrastructure-stack",
            FailureCategory::ComputeFunction => "compute-function",
            FailureCategory::ApiGateway => "api-gateway",
            FailureCategory::Unknown => "unknown",
        }
    }

    /// Where to look first when triaging this kind of failure.
    pub fn hint(&self) -> &'static str {
        match self {
            FailureCategory::Credentials => "check the access key pair or profile",
            FailureCategory::Region => "check AWS_REGION and the region in the module manifest",
            FailureCategory::Tooling => "check that the deployment tool is installed and on PATH",
            FailureCategory::Permissions => "check the IAM permissions of the deploying identity",
            FailureCategory::InfrastructureStack => "inspect the stack events for the failed resource",
            FailureCategory::ComputeFunction => "check function configuration, size and runtime",
            FailureCategory::ApiGateway => "check the HTTP event and API configuration",
            FailureCategory::Unknown => "see the captured tool output",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_category() {
        let cases = [
            (
                "The security token included in the request is invalid.",
                FailureCategory::Credentials,
            ),
            ("Missing credentials in config", FailureCategory::Credentials),
            ("Invalid region: us-nowhere-1", FailureCategory::Region),
            (
                "failed to start serverless: No such file or directory (os error 2)",
                FailureCategory::Tooling,
            ),
            (
                "User: arn:aws:iam::1:user/ci is not authorized to perform: iam:PassRole",
                FailureCategory::Permissions,
            ),
            (
                "Stack orders-dev is in UPDATE_ROLLBACK_FAILED state",
                FailureCategory::InfrastructureStack,
            ),
            (
                "Lambda: Unzipped size must be smaller than 262144000 bytes",
                FailureCategory::ComputeFunction,
            ),
            (
                "ApiGateway: Too Many Requests",
                FailureCategory::ApiGateway,
            ),
            ("something odd happened", FailureCategory::Unknown),
        ];

        for (text, expected) in cases {
            assert_eq!(FailureCategory::classify(text), expected, "text: {text}");
        }
    }

    #[test]
    fn earlier_rows_win() {
        // Mentions both a permission problem and a stack; permissions are listed first.
        let text = "AccessDenied: not allowed to call cloudformation:CreateStack";
        assert_eq!(FailureCategory::classify(text), FailureCategory::Permissions);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(
            FailureCategory::classify("ACCESSDENIED"),
            FailureCategory::Permissions
        );
    }
}
