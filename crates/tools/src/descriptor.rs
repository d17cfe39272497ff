//! Per-tool download and install behaviour.

use furyctl_core::{Arch, Error, ExecContext, Os, Platform, Result, ToolName};
use semver::Version;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::version::{VersionChecker, normalize_version, rule_for};

/// First terraform release with native darwin/arm64 builds.
const TERRAFORM_DARWIN_ARM64_SINCE: Version = Version::new(1, 0, 2);

/// A tool pinned at one version for one platform.
///
/// Descriptors are cheap and stateless; create one per validation or
/// download with [`ToolFactory`](crate::ToolFactory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    name: ToolName,
    version: String,
    platform: Platform,
    bin_root: PathBuf,
}

impl ToolDescriptor {
    /// Create a descriptor. `version` may carry a leading `v`.
    #[must_use]
    pub fn new(name: ToolName, version: &str, platform: Platform, bin_root: impl Into<PathBuf>) -> Self {
        Self {
            name,
            version: normalize_version(version),
            platform,
            bin_root: bin_root.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> ToolName {
        self.name
    }

    /// Pinned version without a leading `v`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether furyctl installs this tool itself.
    ///
    /// Operator-installed tools (ansible, bash, git, openvpn, sed, shell) are
    /// looked up on `PATH`. The AWS CLI ships as an installer package on
    /// macOS, so it is only downloadable on Linux.
    #[must_use]
    pub fn supports_download(&self) -> bool {
        match self.name {
            ToolName::Ansible
            | ToolName::Bash
            | ToolName::Git
            | ToolName::Openvpn
            | ToolName::Sed
            | ToolName::Shell => false,
            ToolName::Awscli => self.platform.os == Os::Linux,
            _ => true,
        }
    }

    /// Name of the executable.
    #[must_use]
    pub fn binary_name(&self) -> &'static str {
        match self.name {
            ToolName::Awscli => "aws",
            ToolName::Shell => "sh",
            other => other.as_str(),
        }
    }

    /// `<binRoot>/<tool>/<version>`.
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.bin_root.join(self.name.as_str()).join(&self.version)
    }

    /// Where the executable is invoked from.
    ///
    /// Downloadable tools live under [`install_dir`](Self::install_dir);
    /// the rest are resolved on `PATH` by bare name.
    #[must_use]
    pub fn binary_path(&self) -> PathBuf {
        if self.supports_download() {
            self.install_dir().join(self.binary_name())
        } else {
            PathBuf::from(self.binary_name())
        }
    }

    /// Platform of the artifact actually downloaded.
    ///
    /// Several tools only publish amd64 builds for the versions furyctl
    /// pins; those rely on Rosetta on Apple silicon.
    #[must_use]
    pub fn artifact_platform(&self) -> Platform {
        let amd64 = Platform::new(self.platform.os, Arch::Amd64);
        match self.name {
            ToolName::Kubectl | ToolName::Jq | ToolName::Awscli | ToolName::Git => amd64,
            ToolName::Terraform if self.platform.os == Os::Darwin => {
                let native = Version::parse(&self.version)
                    .is_ok_and(|v| v >= TERRAFORM_DARWIN_ARM64_SINCE);
                if native { self.platform } else { amd64 }
            }
            _ => self.platform,
        }
    }

    /// Release URL for this tool, version and platform.
    ///
    /// Empty for tools that cannot be downloaded.
    #[must_use]
    pub fn src_path(&self) -> String {
        if !self.supports_download() {
            return String::new();
        }

        let v = &self.version;
        let platform = self.artifact_platform();
        let os = platform.os.as_str();
        let arch = platform.arch.as_str();

        match self.name {
            ToolName::Kubectl => format!("https://dl.k8s.io/release/v{v}/bin/{os}/{arch}/kubectl"),
            ToolName::Terraform => format!(
                "https://releases.hashicorp.com/terraform/{v}/terraform_{v}_{os}_{arch}.zip"
            ),
            ToolName::Helm => format!("https://get.helm.sh/helm-v{v}-{os}-{arch}.tar.gz"),
            ToolName::Kustomize => format!(
                "https://github.com/kubernetes-sigs/kustomize/releases/download/kustomize%2Fv{v}/kustomize_v{v}_{os}_{arch}.tar.gz"
            ),
            ToolName::Furyagent => format!(
                "https://github.com/sighupio/furyagent/releases/download/v{v}/furyagent-{os}-{arch}"
            ),
            ToolName::Yq => format!(
                "https://github.com/mikefarah/yq/releases/download/v{v}/yq_{os}_{arch}"
            ),
            ToolName::Helmfile => format!(
                "https://github.com/helmfile/helmfile/releases/download/v{v}/helmfile_{v}_{os}_{arch}.tar.gz"
            ),
            ToolName::Jq => format!(
                "https://github.com/stedolan/jq/releases/download/jq-{v}/{}",
                self.jq_asset()
            ),
            ToolName::Kapp => format!(
                "https://github.com/carvel-dev/kapp/releases/download/v{v}/kapp-{os}-{arch}"
            ),
            ToolName::Awscli => format!("https://awscli.amazonaws.com/awscli-exe-linux-x86_64-{v}.zip"),
            ToolName::Ansible
            | ToolName::Bash
            | ToolName::Git
            | ToolName::Openvpn
            | ToolName::Sed
            | ToolName::Shell => String::new(),
        }
    }

    fn jq_asset(&self) -> &'static str {
        match self.platform.os {
            Os::Darwin => "jq-osx-amd64",
            Os::Linux => "jq-linux64",
        }
    }

    /// Normalize what the download produced in `base` into `<base>/<binary>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the expected artifact is missing or cannot be moved.
    pub fn rename(&self, base: &Path) -> Result<()> {
        let platform = self.artifact_platform();
        let os = platform.os.as_str();
        let arch = platform.arch.as_str();
        let target = base.join(self.binary_name());

        match self.name {
            ToolName::Helm => {
                let dir = base.join(format!("{os}-{arch}"));
                move_file(&dir.join("helm"), &target)?;
                std::fs::remove_dir_all(&dir).map_err(|e| Error::io(e, &dir, "remove"))
            }
            ToolName::Furyagent => move_file(&base.join(format!("furyagent-{os}-{arch}")), &target),
            ToolName::Yq => move_file(&base.join(format!("yq_{os}_{arch}")), &target),
            ToolName::Kapp => move_file(&base.join(format!("kapp-{os}-{arch}")), &target),
            ToolName::Jq => move_file(&base.join(self.jq_asset()), &target),
            ToolName::Awscli => {
                // The installer zip unpacks to aws/{install,dist/...}; the
                // executable needs its sibling libraries from dist.
                let bundle = base.join(".aws-bundle");
                move_file(&target, &bundle)?;
                let dist = bundle.join("dist");
                for entry in std::fs::read_dir(&dist).map_err(|e| Error::io(e, &dist, "read"))? {
                    let entry = entry.map_err(|e| Error::io(e, &dist, "read"))?;
                    move_file(&entry.path(), &base.join(entry.file_name()))?;
                }
                std::fs::remove_dir_all(&bundle).map_err(|e| Error::io(e, &bundle, "remove"))
            }
            _ => Ok(()),
        }
    }

    /// Probe the installed binary and compare its version with the pin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBinary`] or [`Error::ProbeTimeout`] when the
    /// binary cannot be run, and [`Error::WrongToolVersion`] or
    /// [`Error::EmptyToolVersion`] from the version comparison.
    pub async fn check_bin_version(&self, exec: &ExecContext) -> Result<()> {
        self.check_bin_version_against(exec, &self.version).await
    }

    /// Like [`check_bin_version`](Self::check_bin_version) with an explicit
    /// expectation; `*` only checks that the binary runs.
    ///
    /// # Errors
    ///
    /// See [`check_bin_version`](Self::check_bin_version).
    pub async fn check_bin_version_against(&self, exec: &ExecContext, expected: &str) -> Result<()> {
        let checker = VersionChecker::for_tool(self.name)?;
        if normalize_version(expected).is_empty() {
            return Err(Error::empty_tool_version(self.name.as_str()));
        }

        let binary = self.binary_path();
        let output = exec
            .probe(self.name.as_str(), &binary, rule_for(self.name).probe_args)
            .await?;
        debug!(tool = %self.name, binary = %binary.display(), "Probed tool");
        checker.check(&output.combined(), expected)
    }
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "expected download artifact"),
            from,
            "rename",
        ));
    }
    std::fs::rename(from, to).map_err(|e| Error::io(e, from, "rename"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> Platform {
        Platform::new(Os::Linux, Arch::Amd64)
    }

    fn darwin_arm() -> Platform {
        Platform::new(Os::Darwin, Arch::Arm64)
    }

    #[test]
    fn test_binary_path_layout() {
        let kubectl = ToolDescriptor::new(ToolName::Kubectl, "v1.25.8", linux(), "/bin-root");
        assert_eq!(
            kubectl.binary_path(),
            PathBuf::from("/bin-root/kubectl/1.25.8/kubectl")
        );

        let aws = ToolDescriptor::new(ToolName::Awscli, "2.8.12", linux(), "/bin-root");
        assert_eq!(aws.binary_path(), PathBuf::from("/bin-root/awscli/2.8.12/aws"));

        let git = ToolDescriptor::new(ToolName::Git, "*", linux(), "/bin-root");
        assert_eq!(git.binary_path(), PathBuf::from("git"));
    }

    #[test]
    fn test_src_paths() {
        let cases = [
            (ToolName::Kubectl, "1.25.8", "https://dl.k8s.io/release/v1.25.8/bin/linux/amd64/kubectl"),
            (
                ToolName::Terraform,
                "1.4.6",
                "https://releases.hashicorp.com/terraform/1.4.6/terraform_1.4.6_linux_amd64.zip",
            ),
            (ToolName::Helm, "3.12.3", "https://get.helm.sh/helm-v3.12.3-linux-amd64.tar.gz"),
            (
                ToolName::Kustomize,
                "3.10.0",
                "https://github.com/kubernetes-sigs/kustomize/releases/download/kustomize%2Fv3.10.0/kustomize_v3.10.0_linux_amd64.tar.gz",
            ),
            (
                ToolName::Jq,
                "1.6",
                "https://github.com/stedolan/jq/releases/download/jq-1.6/jq-linux64",
            ),
            (
                ToolName::Awscli,
                "2.8.12",
                "https://awscli.amazonaws.com/awscli-exe-linux-x86_64-2.8.12.zip",
            ),
        ];
        for (tool, version, url) in cases {
            assert_eq!(ToolDescriptor::new(tool, version, linux(), "/b").src_path(), url);
        }
    }

    #[test]
    fn test_operator_installed_tools_have_no_src_path() {
        for tool in [
            ToolName::Ansible,
            ToolName::Bash,
            ToolName::Git,
            ToolName::Openvpn,
            ToolName::Sed,
            ToolName::Shell,
        ] {
            let d = ToolDescriptor::new(tool, "1.0.0", linux(), "/b");
            assert!(!d.supports_download());
            assert_eq!(d.src_path(), "");
        }
    }

    #[test]
    fn test_arch_quirks_on_apple_silicon() {
        let kubectl = ToolDescriptor::new(ToolName::Kubectl, "1.25.8", darwin_arm(), "/b");
        assert!(kubectl.src_path().contains("/darwin/amd64/"));

        let old_tf = ToolDescriptor::new(ToolName::Terraform, "0.15.4", darwin_arm(), "/b");
        assert!(old_tf.src_path().ends_with("terraform_0.15.4_darwin_amd64.zip"));

        let boundary = ToolDescriptor::new(ToolName::Terraform, "1.0.2", darwin_arm(), "/b");
        assert!(boundary.src_path().ends_with("terraform_1.0.2_darwin_arm64.zip"));

        let helm = ToolDescriptor::new(ToolName::Helm, "3.12.3", darwin_arm(), "/b");
        assert!(helm.src_path().ends_with("helm-v3.12.3-darwin-arm64.tar.gz"));

        let aws = ToolDescriptor::new(ToolName::Awscli, "2.8.12", darwin_arm(), "/b");
        assert!(!aws.supports_download());
        assert_eq!(aws.src_path(), "");
    }

    #[test]
    fn test_terraform_linux_always_native() {
        let tf = ToolDescriptor::new(
            ToolName::Terraform,
            "0.15.4",
            Platform::new(Os::Linux, Arch::Arm64),
            "/b",
        );
        assert!(tf.src_path().ends_with("terraform_0.15.4_linux_arm64.zip"));
    }

    #[test]
    fn test_rename_helm_layout() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("linux-amd64");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("helm"), "bin").unwrap();
        std::fs::write(nested.join("LICENSE"), "MIT").unwrap();

        let helm = ToolDescriptor::new(ToolName::Helm, "3.12.3", linux(), dir.path());
        helm.rename(dir.path()).unwrap();

        assert!(dir.path().join("helm").is_file());
        assert!(!nested.exists());
    }

    #[test]
    fn test_rename_single_binary_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("yq_linux_amd64"), "bin").unwrap();
        ToolDescriptor::new(ToolName::Yq, "4.34.1", linux(), dir.path())
            .rename(dir.path())
            .unwrap();
        assert!(dir.path().join("yq").is_file());

        std::fs::write(dir.path().join("jq-linux64"), "bin").unwrap();
        ToolDescriptor::new(ToolName::Jq, "1.6", linux(), dir.path())
            .rename(dir.path())
            .unwrap();
        assert!(dir.path().join("jq").is_file());
    }

    #[test]
    fn test_rename_awscli_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("aws/dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("aws"), "bin").unwrap();
        std::fs::write(dist.join("libpython.so"), "lib").unwrap();
        std::fs::write(dir.path().join("aws/install"), "sh").unwrap();

        ToolDescriptor::new(ToolName::Awscli, "2.8.12", linux(), dir.path())
            .rename(dir.path())
            .unwrap();

        assert!(dir.path().join("aws").is_file());
        assert!(dir.path().join("libpython.so").is_file());
        assert!(!dir.path().join(".aws-bundle").exists());
    }

    #[test]
    fn test_rename_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = ToolDescriptor::new(ToolName::Kapp, "0.58.0", linux(), dir.path())
            .rename(dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_rename_noop_for_named_binaries() {
        let dir = tempfile::tempdir().unwrap();
        ToolDescriptor::new(ToolName::Kubectl, "1.25.8", linux(), dir.path())
            .rename(dir.path())
            .unwrap();
    }
}
