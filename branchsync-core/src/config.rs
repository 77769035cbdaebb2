//! Configuration file loading and resolution.
//!
//! # Layout
//!
//! ```text
//! ~/.branchsync/
//!   config.yaml   (default location; override with --config)
//! ```
//!
//! Values come from the YAML file first and are then overridden field by field
//! by command-line [`Overrides`]. [`Settings::resolve`] validates the merged
//! result; every failure there is a [`ConfigError`] raised before any gateway
//! is contacted.
//!
//! As in the rest of the workspace, functions that touch the home directory
//! come in two forms: `fn_at(home, …)` for tests and `fn(…)` which derives the
//! home from `dirs::home_dir()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::naming::NamingConvention;

/// Template rendered when none is configured. Embedded in the renderer.
pub const DEFAULT_TEMPLATE: &str = "job.xml.tera";

/// HTTP timeout applied to CI server calls when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// 1. File shape
// ---------------------------------------------------------------------------

/// On-disk configuration. Every field is optional so that partial files can
/// be completed from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub jenkins: JenkinsSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_path: Option<PathBuf>,
    pub template: TemplateSection,
    pub naming: NamingSection,
    pub preview: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JenkinsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_suffix: Option<String>,
}

/// Command-line values. `Some` wins over the file; `preview = true` wins over
/// a file that leaves preview off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub jenkins_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub repository_path: Option<PathBuf>,
    pub template_name: Option<String>,
    pub template_dir: Option<PathBuf>,
    pub job_prefix: Option<String>,
    pub job_suffix: Option<String>,
    pub view_prefix: Option<String>,
    pub view_suffix: Option<String>,
    pub preview: bool,
}

// ---------------------------------------------------------------------------
// 2. Paths + load
// ---------------------------------------------------------------------------

/// `<home>/.branchsync/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".branchsync").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

/// Parse a config file. Relative `repository_path` and `template.dir` are
/// resolved against the file's directory.
pub fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound { path: path.to_path_buf() });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let mut file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    if let Some(base) = path.parent() {
        file.rebase(base);
    }
    Ok(file)
}

/// Load the explicit config file if given, else the default one under `home`.
///
/// A missing explicit file is an error; a missing default file yields an empty
/// [`ConfigFile`] so that everything can come from the command line.
pub fn load_at(home: &Path, explicit: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    match explicit {
        Some(path) => load_file(path),
        None => {
            let path = config_path_at(home);
            if path.exists() {
                load_file(&path)
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

/// `load_at` convenience wrapper. The home directory is only required when no
/// explicit path is given.
pub fn load(explicit: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    match explicit {
        Some(path) => load_file(path),
        None => load_at(&home()?, None),
    }
}

impl ConfigFile {
    /// Apply command-line values on top of the file's.
    pub fn merge(mut self, overrides: Overrides) -> ConfigFile {
        fn pick<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        pick(&mut self.jenkins.url, overrides.jenkins_url);
        pick(&mut self.jenkins.username, overrides.username);
        pick(&mut self.jenkins.password, overrides.password);
        pick(&mut self.jenkins.timeout_secs, overrides.timeout_secs);
        pick(&mut self.repository_path, overrides.repository_path);
        pick(&mut self.template.name, overrides.template_name);
        pick(&mut self.template.dir, overrides.template_dir);
        pick(&mut self.naming.job_prefix, overrides.job_prefix);
        pick(&mut self.naming.job_suffix, overrides.job_suffix);
        pick(&mut self.naming.view_prefix, overrides.view_prefix);
        pick(&mut self.naming.view_suffix, overrides.view_suffix);
        self.preview |= overrides.preview;
        self
    }

    fn rebase(&mut self, base: &Path) {
        if let Some(repo) = self.repository_path.as_mut() {
            if repo.is_relative() {
                *repo = base.join(&*repo);
            }
        }
        if let Some(dir) = self.template.dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Starter configuration with placeholder values.
    pub fn starter() -> Self {
        ConfigFile {
            jenkins: JenkinsSection {
                url: Some("http://localhost:8080".to_string()),
                username: Some("admin".to_string()),
                password: None,
                timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            },
            repository_path: Some(PathBuf::from(".")),
            template: TemplateSection {
                name: Some(DEFAULT_TEMPLATE.to_string()),
                dir: None,
            },
            naming: NamingSection {
                job_prefix: Some("branch-".to_string()),
                job_suffix: Some("-build".to_string()),
                view_prefix: Some("branch-".to_string()),
                view_suffix: Some(String::new()),
            },
            preview: false,
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Starter file
// ---------------------------------------------------------------------------

/// Write [`ConfigFile::starter`] to `path`.
///
/// Refuses to overwrite an existing file unless `force` is set. Returns the
/// path written.
pub fn write_starter(path: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::Invalid {
            field: "config",
            reason: format!("{} already exists (use --force to overwrite)", path.display()),
        });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let yaml = serde_yaml::to_string(&ConfigFile::starter())?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(path.to_path_buf())
}

// ---------------------------------------------------------------------------
// 4. Resolution
// ---------------------------------------------------------------------------

/// CI server coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsSettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

/// Fully resolved, validated settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub jenkins: JenkinsSettings,
    pub repository_path: PathBuf,
    pub template_name: String,
    pub template_dir: Option<PathBuf>,
    pub naming: NamingConvention,
    pub preview: bool,
}

impl Settings {
    /// Merge `overrides` on top of `file` and validate.
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Settings, ConfigError> {
        Settings::validate(file.merge(overrides))
    }

    /// Validate an already merged file.
    pub fn validate(file: ConfigFile) -> Result<Settings, ConfigError> {
        let url = file
            .jenkins
            .url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::Missing { field: "jenkins.url" })?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "jenkins.url",
                reason: format!("expected an http(s) URL, got '{url}'"),
            });
        }

        let timeout_secs = file.jenkins.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "jenkins.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        let username = file.jenkins.username.filter(|u| !u.is_empty());
        let password = file.jenkins.password;
        if password.is_some() && username.is_none() {
            return Err(ConfigError::Missing { field: "jenkins.username" });
        }

        let repository_path = file
            .repository_path
            .ok_or(ConfigError::Missing { field: "repository_path" })?;

        let template_name = file
            .template
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        let template_dir = file.template.dir;

        let naming = NamingConvention::new(
            file.naming.job_prefix.unwrap_or_default(),
            file.naming.job_suffix.unwrap_or_default(),
            file.naming.view_prefix.unwrap_or_default(),
            file.naming.view_suffix.unwrap_or_default(),
        );
        if naming.job_prefix.is_empty() && naming.job_suffix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "naming.job_prefix",
                reason: "job prefix and suffix are both empty; every job would be managed"
                    .to_string(),
            });
        }
        if !naming.view_suffix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "naming.view_suffix",
                reason: format!(
                    "new views are named view_prefix + branch, so views created here would \
                     never match '{}' and would be re-created on the next run; leave it empty",
                    naming.view_suffix
                ),
            });
        }
        if naming.view_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "naming.view_prefix",
                reason: "view prefix is empty; every view would be managed".to_string(),
            });
        }

        Ok(Settings {
            jenkins: JenkinsSettings {
                url,
                username,
                password,
                timeout: Duration::from_secs(timeout_secs),
            },
            repository_path,
            template_name,
            template_dir,
            naming,
            preview: file.preview,
        })
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io { path: path.into(), source }
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn minimal_file() -> ConfigFile {
        ConfigFile {
            jenkins: JenkinsSection {
                url: Some("http://ci.local:8080/".to_string()),
                ..Default::default()
            },
            repository_path: Some(PathBuf::from("/code/app")),
            naming: NamingSection {
                job_prefix: Some("ci-".to_string()),
                job_suffix: Some("-job".to_string()),
                view_prefix: Some("ci-".to_string()),
                view_suffix: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn config_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        assert!(config_path_at(home.path()).ends_with(".branchsync/config.yaml"));
    }

    #[test]
    fn resolve_applies_defaults_and_trims_url() {
        let settings = Settings::resolve(minimal_file(), Overrides::default()).expect("resolve");
        assert_eq!(settings.jenkins.url, "http://ci.local:8080");
        assert_eq!(settings.jenkins.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(settings.template_name, DEFAULT_TEMPLATE);
        assert!(!settings.preview);
    }

    #[test]
    fn command_line_wins_over_file() {
        let overrides = Overrides {
            jenkins_url: Some("https://other:9090".to_string()),
            job_prefix: Some("pr-".to_string()),
            preview: true,
            ..Default::default()
        };
        let settings = Settings::resolve(minimal_file(), overrides).expect("resolve");
        assert_eq!(settings.jenkins.url, "https://other:9090");
        assert_eq!(settings.naming.job_prefix, "pr-");
        assert_eq!(settings.naming.job_suffix, "-job");
        assert!(settings.preview);
    }

    #[test]
    fn missing_url_is_reported() {
        let mut file = minimal_file();
        file.jenkins.url = None;
        let err = Settings::resolve(file, Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "jenkins.url" }), "got: {err}");
    }

    #[test]
    fn empty_job_convention_is_rejected() {
        let mut file = minimal_file();
        file.naming.job_prefix = None;
        file.naming.job_suffix = Some(String::new());
        let err = Settings::resolve(file, Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "naming.job_prefix", .. }));
    }

    #[test]
    fn view_suffix_must_stay_empty() {
        let mut file = minimal_file();
        file.naming.view_suffix = Some("-dash".to_string());
        let err = Settings::resolve(file, Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "naming.view_suffix", .. }));
        assert!(err.to_string().contains("-dash"), "got: {err}");

        let mut file = minimal_file();
        file.naming.view_suffix = Some(String::new());
        Settings::resolve(file, Overrides::default()).expect("empty suffix is fine");
    }

    #[test]
    fn empty_view_prefix_is_rejected() {
        let mut file = minimal_file();
        file.naming.view_prefix = Some(String::new());
        let err = Settings::resolve(file, Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "naming.view_prefix", .. }));
    }

    #[test]
    fn password_without_username_is_rejected() {
        let mut file = minimal_file();
        file.jenkins.password = Some("secret".to_string());
        let err = Settings::resolve(file, Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "jenkins.username" }));
    }

    #[test]
    fn missing_default_file_yields_empty_config() {
        let home = TempDir::new().expect("tempdir");
        let file = load_at(home.path(), None).expect("load");
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let home = TempDir::new().expect("tempdir");
        let path = home.path().join("nope.yaml");
        let err = load_at(home.path(), Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn relative_paths_are_rebased_on_file_dir() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("branchsync.yaml");
        std::fs::write(&path, "repository_path: repo\ntemplate:\n  dir: templates\n")
            .expect("write");
        let file = load_file(&path).expect("load");
        assert_eq!(file.repository_path, Some(dir.path().join("repo")));
        assert_eq!(file.template.dir, Some(dir.path().join("templates")));
    }

    #[test]
    fn starter_roundtrips_and_resolves() {
        let home = TempDir::new().expect("tempdir");
        let path = config_path_at(home.path());
        write_starter(&path, false).expect("write");
        let file = load_file(&path).expect("load");
        Settings::resolve(file, Overrides::default()).expect("starter config is valid");
        assert!(!path.with_extension("yaml.tmp").exists());
    }

    #[test]
    fn starter_refuses_overwrite_without_force() {
        let home = TempDir::new().expect("tempdir");
        let path = config_path_at(home.path());
        write_starter(&path, false).expect("first write");
        assert!(write_starter(&path, false).is_err());
        write_starter(&path, true).expect("forced write");
    }
}
