//! Tool version parsing.
//!
//! Every tool prints its version differently. The [`RULES`] table records,
//! per tool, how to invoke it and how to pull the version out of what it
//! prints: a regex selects the substring, a separator splits it, and the last
//! token is normalized. Installed and expected versions are compared as
//! plain strings after the same normalization; there is no range matching.

use furyctl_core::{Error, Result, ToolName};
use regex::Regex;
use tracing::trace;

/// How to probe one tool and read its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRule {
    pub tool: ToolName,
    /// Arguments passed to the binary to make it print its version.
    pub probe_args: &'static [&'static str],
    /// Selects the version-bearing substring. `None` means presence-only.
    pub pattern: Option<&'static str>,
    /// Splits the selected substring; the last token is the version.
    pub separator: Option<char>,
}

const fn rule(
    tool: ToolName,
    probe_args: &'static [&'static str],
    pattern: &'static str,
    separator: Option<char>,
) -> VersionRule {
    VersionRule {
        tool,
        probe_args,
        pattern: Some(pattern),
        separator,
    }
}

const fn presence_only(tool: ToolName, probe_args: &'static [&'static str]) -> VersionRule {
    VersionRule {
        tool,
        probe_args,
        pattern: None,
        separator: None,
    }
}

/// Version rules, one per [`ToolName`].
pub static RULES: [VersionRule; 16] = [
    rule(
        ToolName::Ansible,
        &["--version"],
        r"ansible (\[core )?v?[0-9]+\.[0-9]+\.[0-9]+\]?",
        Some(' '),
    ),
    rule(ToolName::Awscli, &["--version"], r"aws-cli/[0-9]+\.[0-9]+\.[0-9]+", Some('/')),
    rule(ToolName::Bash, &["--version"], r"version [0-9]+\.[0-9]+\.[0-9]+", Some(' ')),
    rule(ToolName::Furyagent, &["version"], r"v?[0-9]+\.[0-9]+\.[0-9]+", None),
    rule(ToolName::Git, &["--version"], r"git version [0-9]+\.[0-9]+\.[0-9]+", Some(' ')),
    rule(ToolName::Helm, &["version", "--short"], r"v[0-9]+\.[0-9]+\.[0-9]+", None),
    rule(
        ToolName::Helmfile,
        &["--version"],
        r"version v?[0-9]+\.[0-9]+\.[0-9]+",
        Some(' '),
    ),
    rule(ToolName::Jq, &["--version"], r"jq-[0-9]+\.[0-9]+(\.[0-9]+)?", Some('-')),
    rule(ToolName::Kapp, &["version"], r"kapp version v?[0-9]+\.[0-9]+\.[0-9]+", Some(' ')),
    rule(
        ToolName::Kubectl,
        &["version", "--client"],
        r#"(GitVersion:"v[0-9]+\.[0-9]+\.[0-9]+"|Client Version: v[0-9]+\.[0-9]+\.[0-9]+)"#,
        Some(':'),
    ),
    rule(
        ToolName::Kustomize,
        &["version", "--short"],
        r"(kustomize/)?v[0-9]+\.[0-9]+\.[0-9]+",
        Some('/'),
    ),
    rule(ToolName::Openvpn, &["--version"], r"OpenVPN [0-9]+\.[0-9]+\.[0-9]+", Some(' ')),
    presence_only(ToolName::Sed, &["--version"]),
    presence_only(ToolName::Shell, &["-c", "exit 0"]),
    rule(ToolName::Terraform, &["version"], r"Terraform v[0-9]+\.[0-9]+\.[0-9]+", Some(' ')),
    rule(ToolName::Yq, &["--version"], r"version v?[0-9]+\.[0-9]+\.[0-9]+", Some(' ')),
];

/// The rule for `tool`.
#[must_use]
pub fn rule_for(tool: ToolName) -> &'static VersionRule {
    RULES
        .iter()
        .find(|r| r.tool == tool)
        .unwrap_or(&RULES[0])
}

/// Strip a leading `v`, quotes, brackets, trailing punctuation and whitespace.
#[must_use]
pub fn normalize_version(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '[' || c == ']' || c == ',')
        .trim();
    trimmed.strip_prefix('v').unwrap_or(trimmed).to_string()
}

/// Compares a tool's probe output against an expected version.
#[derive(Debug, Clone)]
pub struct VersionChecker {
    tool: ToolName,
    pattern: Option<Regex>,
    separator: Option<char>,
}

impl VersionChecker {
    /// Build the checker for `tool` from its rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule's pattern does not compile.
    pub fn for_tool(tool: ToolName) -> Result<Self> {
        let rule = rule_for(tool);
        let pattern = rule
            .pattern
            .map(Regex::new)
            .transpose()
            .map_err(|e| Error::configuration(format!("invalid version pattern for {tool}: {e}")))?;
        Ok(Self {
            tool,
            pattern,
            separator: rule.separator,
        })
    }

    /// Whether this tool is only checked for presence.
    #[must_use]
    pub fn is_presence_only(&self) -> bool {
        self.pattern.is_none()
    }

    /// Extract the normalized installed version from probe output.
    #[must_use]
    pub fn installed_version(&self, output: &str) -> Option<String> {
        let selected = self.pattern.as_ref()?.find(output)?.as_str();
        let token = match self.separator {
            Some(sep) => selected.rsplit(sep).next().unwrap_or(selected),
            None => selected,
        };
        let version = normalize_version(token);
        (!version.is_empty()).then_some(version)
    }

    /// Check probe output against `expected`.
    ///
    /// An expected version of `*` accepts any installed version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyToolVersion`] when `expected` is empty and
    /// [`Error::WrongToolVersion`] when the versions differ.
    pub fn check(&self, output: &str, expected: &str) -> Result<()> {
        let expected = normalize_version(expected);
        if expected.is_empty() {
            return Err(Error::empty_tool_version(self.tool.as_str()));
        }
        if self.is_presence_only() || expected == "*" {
            return Ok(());
        }

        let installed = self
            .installed_version(output)
            .unwrap_or_else(|| "unknown".to_string());
        trace!(tool = %self.tool, %installed, %expected, "Comparing versions");

        if installed == expected {
            Ok(())
        } else {
            Err(Error::wrong_tool_version(self.tool.as_str(), installed, expected))
        }
    }
}
