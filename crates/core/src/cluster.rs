//! The subset of `furyctl.yaml` read by the distribution core.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Cluster kinds with a dedicated tool section in `kfd.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterKind {
    EksCluster,
    KfdDistribution,
    OnPremises,
}

impl ClusterKind {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "EKSCluster" => Some(Self::EksCluster),
            "KFDDistribution" => Some(Self::KfdDistribution),
            "OnPremises" => Some(Self::OnPremises),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EksCluster => "EKSCluster",
            Self::KfdDistribution => "KFDDistribution",
            Self::OnPremises => "OnPremises",
        }
    }
}

impl std::fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimalSpec {
    #[serde(default)]
    pub distribution_version: String,
    /// Opaque to this core; forwarded to the runners.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_configuration: Option<serde_yaml::Value>,
}

/// `{apiVersion, kind, metadata.name, spec.distributionVersion, spec.toolsConfiguration}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimalClusterConfig {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: MinimalSpec,
}

impl MinimalClusterConfig {
    /// Read and parse a cluster configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::ConfigParse`] if it is not valid YAML or lacks a required field.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))?;
        Self::from_yaml(&content, path)
    }

    /// Parse a cluster configuration from YAML text; `path` is used for messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] on malformed YAML or missing fields.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::config_parse(path, e.to_string()))?;

        let missing: Vec<&str> = [
            ("apiVersion", config.api_version.is_empty()),
            ("kind", config.kind.is_empty()),
            ("metadata.name", config.metadata.name.is_empty()),
            (
                "spec.distributionVersion",
                config.spec.distribution_version.is_empty(),
            ),
        ]
        .into_iter()
        .filter_map(|(field, empty)| empty.then_some(field))
        .collect();

        if !missing.is_empty() {
            return Err(Error::config_parse(
                path,
                format!("missing required field(s): {}", missing.join(", ")),
            ));
        }

        Ok(config)
    }

    /// The cluster kind, if it is one with a dedicated tool section.
    #[must_use]
    pub fn cluster_kind(&self) -> Option<ClusterKind> {
        ClusterKind::parse(&self.kind)
    }

    #[must_use]
    pub fn distribution_version(&self) -> &str {
        &self.spec.distribution_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r"
apiVersion: kfd.sighup.io/v1alpha2
kind: EKSCluster
metadata:
  name: awesome-cluster
spec:
  distributionVersion: v1.25.8
  toolsConfiguration:
    terraform:
      state:
        s3:
          bucketName: my-bucket
";

    #[test]
    fn test_parse_valid_config() {
        let config = MinimalClusterConfig::from_yaml(VALID, Path::new("furyctl.yaml")).unwrap();
        assert_eq!(config.api_version, "kfd.sighup.io/v1alpha2");
        assert_eq!(config.cluster_kind(), Some(ClusterKind::EksCluster));
        assert_eq!(config.metadata.name, "awesome-cluster");
        assert_eq!(config.distribution_version(), "v1.25.8");
        assert!(config.spec.tools_configuration.is_some());
    }

    #[test]
    fn test_malformed_yaml_is_descriptive() {
        let err = MinimalClusterConfig::from_yaml("kind: [unclosed", Path::new("/tmp/furyctl.yaml"))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(err.to_string().contains("/tmp/furyctl.yaml"));
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let err = MinimalClusterConfig::from_yaml("kind: OnPremises\n", Path::new("furyctl.yaml"))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("apiVersion"));
        assert!(msg.contains("metadata.name"));
        assert!(msg.contains("spec.distributionVersion"));
        assert!(!msg.contains("kind,"));
    }

    #[test]
    fn test_unknown_kind_has_no_cluster_kind() {
        let config = MinimalClusterConfig {
            kind: "Something".into(),
            ..Default::default()
        };
        assert_eq!(config.cluster_kind(), None);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("furyctl.yaml");
        std::fs::write(&path, VALID).unwrap();
        let config = MinimalClusterConfig::from_file(&path).unwrap();
        assert_eq!(config.kind, "EKSCluster");

        let err = MinimalClusterConfig::from_file(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
