//! Names of the external tools a distribution can pin.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An external tool known to furyctl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolName {
    Ansible,
    Awscli,
    Bash,
    Furyagent,
    Git,
    Helm,
    Helmfile,
    Jq,
    Kapp,
    Kubectl,
    Kustomize,
    Openvpn,
    Sed,
    Shell,
    Terraform,
    Yq,
}

impl ToolName {
    /// Every known tool, in alphabetical order.
    pub const ALL: [Self; 16] = [
        Self::Ansible,
        Self::Awscli,
        Self::Bash,
        Self::Furyagent,
        Self::Git,
        Self::Helm,
        Self::Helmfile,
        Self::Jq,
        Self::Kapp,
        Self::Kubectl,
        Self::Kustomize,
        Self::Openvpn,
        Self::Sed,
        Self::Shell,
        Self::Terraform,
        Self::Yq,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ansible => "ansible",
            Self::Awscli => "awscli",
            Self::Bash => "bash",
            Self::Furyagent => "furyagent",
            Self::Git => "git",
            Self::Helm => "helm",
            Self::Helmfile => "helmfile",
            Self::Jq => "jq",
            Self::Kapp => "kapp",
            Self::Kubectl => "kubectl",
            Self::Kustomize => "kustomize",
            Self::Openvpn => "openvpn",
            Self::Sed => "sed",
            Self::Shell => "shell",
            Self::Terraform => "terraform",
            Self::Yq => "yq",
        }
    }

    /// Parse a tool name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == lower)
    }
}

impl FromStr for ToolName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::configuration(format!("unknown tool '{s}'")))
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_every_name() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::parse(tool.as_str()), Some(tool));
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ToolName::parse("KubeCtl"), Some(ToolName::Kubectl));
        assert_eq!(ToolName::parse("nope"), None);
        assert!("nope".parse::<ToolName>().is_err());
    }
}
