//! The distribution manifest (`kfd.yaml`).
//!
//! Only the tool section is interpreted; modules, kubernetes and schema
//! entries are carried as opaque YAML for the layers above this core.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::{ClusterKind, Error, Result, ToolName};

static VERSION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^v?[0-9]+(\.[0-9]+){0,2}([-+][0-9A-Za-z.+-]+)?$").ok());

static SHA256_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{64}$").ok());

/// A pinned tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    /// Pinned version; empty means the tool is not required.
    #[serde(default)]
    pub version: String,
    /// SHA-256 of the binary keyed by `<os>/<arch>`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checksums: BTreeMap<String, String>,
}

impl Tool {
    /// Tool pinned at `version` with no checksums.
    #[must_use]
    pub fn pinned(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            checksums: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonTools {
    pub furyagent: Tool,
    pub kubectl: Tool,
    pub kustomize: Tool,
    pub terraform: Tool,
    pub yq: Tool,
    pub helm: Tool,
    pub helmfile: Tool,
    pub jq: Tool,
    pub kapp: Tool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EksTools {
    pub awscli: Tool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnPremisesTools {
    pub ansible: Tool,
    pub openvpn: Tool,
}

/// The `tools` section of `kfd.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestTools {
    pub common: CommonTools,
    #[serde(default)]
    pub eks: EksTools,
    #[serde(default)]
    pub on_premises: OnPremisesTools,
}

impl ManifestTools {
    fn common(&self) -> [(ToolName, &Tool); 9] {
        let c = &self.common;
        [
            (ToolName::Furyagent, &c.furyagent),
            (ToolName::Kubectl, &c.kubectl),
            (ToolName::Kustomize, &c.kustomize),
            (ToolName::Terraform, &c.terraform),
            (ToolName::Yq, &c.yq),
            (ToolName::Helm, &c.helm),
            (ToolName::Helmfile, &c.helmfile),
            (ToolName::Jq, &c.jq),
            (ToolName::Kapp, &c.kapp),
        ]
    }

    fn eks(&self) -> [(ToolName, &Tool); 1] {
        [(ToolName::Awscli, &self.eks.awscli)]
    }

    fn on_premises(&self) -> [(ToolName, &Tool); 2] {
        [
            (ToolName::Ansible, &self.on_premises.ansible),
            (ToolName::Openvpn, &self.on_premises.openvpn),
        ]
    }

    /// Every tool entry relevant to `kind`, pinned or not.
    ///
    /// `None` selects every section.
    #[must_use]
    pub fn for_kind(&self, kind: Option<ClusterKind>) -> Vec<(ToolName, &Tool)> {
        let mut tools: Vec<(ToolName, &Tool)> = self.common().into_iter().collect();
        match kind {
            Some(ClusterKind::EksCluster) => tools.extend(self.eks()),
            Some(ClusterKind::OnPremises) => tools.extend(self.on_premises()),
            Some(ClusterKind::KfdDistribution) => {}
            None => {
                tools.extend(self.eks());
                tools.extend(self.on_premises());
            }
        }
        tools
    }

    /// Mutable access to a tool entry, for overlays and tests.
    pub fn get_mut(&mut self, name: ToolName) -> Option<&mut Tool> {
        match name {
            ToolName::Furyagent => Some(&mut self.common.furyagent),
            ToolName::Kubectl => Some(&mut self.common.kubectl),
            ToolName::Kustomize => Some(&mut self.common.kustomize),
            ToolName::Terraform => Some(&mut self.common.terraform),
            ToolName::Yq => Some(&mut self.common.yq),
            ToolName::Helm => Some(&mut self.common.helm),
            ToolName::Helmfile => Some(&mut self.common.helmfile),
            ToolName::Jq => Some(&mut self.common.jq),
            ToolName::Kapp => Some(&mut self.common.kapp),
            ToolName::Awscli => Some(&mut self.eks.awscli),
            ToolName::Ansible => Some(&mut self.on_premises.ansible),
            ToolName::Openvpn => Some(&mut self.on_premises.openvpn),
            ToolName::Bash | ToolName::Git | ToolName::Sed | ToolName::Shell => None,
        }
    }
}

/// Parsed `kfd.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionManifest {
    pub version: String,
    #[serde(default)]
    pub modules: serde_yaml::Mapping,
    #[serde(default)]
    pub kubernetes: serde_yaml::Mapping,
    #[serde(default)]
    pub furyctl_schemas: serde_yaml::Mapping,
    pub tools: ManifestTools,
}

impl DistributionManifest {
    /// Read, parse and validate a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::SchemaValidation`] if it does not parse or validate.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))?;
        Self::from_yaml(&content, path)
    }

    /// Parse and validate manifest YAML; `path` is used for messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaValidation`] listing every violation.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::schema_validation(path, vec![e.to_string()]))?;

        let violations = manifest.violations();
        if violations.is_empty() {
            Ok(manifest)
        } else {
            Err(Error::schema_validation(path, violations))
        }
    }

    /// Every constraint the manifest breaks; empty when valid.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.version.trim().is_empty() {
            violations.push("version: must not be empty".to_string());
        } else if !is_version(&self.version) {
            violations.push(format!("version: '{}' is not a version", self.version));
        }

        for (name, tool) in self.tools.for_kind(None) {
            if !tool.version.is_empty() && !is_version(&tool.version) {
                violations.push(format!(
                    "tools.{name}.version: '{}' is not a version",
                    tool.version
                ));
            }
            for (platform, sum) in &tool.checksums {
                if crate::Platform::parse(platform).is_none() || !platform.contains('/') {
                    violations.push(format!(
                        "tools.{name}.checksums: '{platform}' is not an <os>/<arch> key"
                    ));
                }
                if !is_sha256(sum) {
                    violations.push(format!(
                        "tools.{name}.checksums.{platform}: not a sha256 hex digest"
                    ));
                }
            }
        }

        violations
    }

    /// The `(tool, pin)` pairs relevant to a cluster kind.
    #[must_use]
    pub fn tools(&self, kind: Option<ClusterKind>) -> Vec<(ToolName, &Tool)> {
        self.tools.for_kind(kind)
    }
}

fn is_version(s: &str) -> bool {
    VERSION_RE.as_ref().is_some_and(|re| re.is_match(s))
}

fn is_sha256(s: &str) -> bool {
    SHA256_RE.as_ref().is_some_and(|re| re.is_match(s))
}
