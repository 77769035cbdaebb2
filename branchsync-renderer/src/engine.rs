//! Tera rendering engine: [`TemplateEngine`] and the [`DescriptorRenderer`]
//! seam the reconciler renders through.
//!
//! # Template lookup
//!
//! | Source                     | Name                                   |
//! |----------------------------|----------------------------------------|
//! | Embedded                   | `job.xml.tera`                         |
//! | `template.dir` (recursive) | path relative to the dir, lowercased   |
//!
//! Files in the template dir override embedded templates of the same name.

use std::collections::BTreeMap;
use std::path::Path;

use tera::Tera;

use branchsync_core::types::{BranchName, Descriptor};

use crate::context::JobContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[("job.xml.tera", include_str!("templates/job.xml.tera"))];

// ---------------------------------------------------------------------------
// Renderer seam
// ---------------------------------------------------------------------------

/// Turns (template, repository URL, branch) into an opaque job descriptor.
pub trait DescriptorRenderer {
    fn render(
        &self,
        template: &str,
        repo_url: &str,
        branch: &BranchName,
    ) -> Result<Descriptor, RenderError>;
}

impl<T: DescriptorRenderer + ?Sized> DescriptorRenderer for &T {
    fn render(
        &self,
        template: &str,
        repo_url: &str,
        branch: &BranchName,
    ) -> Result<Descriptor, RenderError> {
        (**self).render(template, repo_url, branch)
    }
}

// ---------------------------------------------------------------------------
// Template sources
// ---------------------------------------------------------------------------

/// Lookup key for a template: `/`-separated and lowercased, so names differing
/// only in case or path separator resolve to the same template.
fn template_key(name: &str) -> String {
    name.replace('\\', "/").to_lowercase()
}

/// Template bodies by lookup key. Inserting an existing key replaces it, which
/// is how a user directory shadows the embedded job template.
#[derive(Default)]
struct TemplateSources(BTreeMap<String, String>);

impl TemplateSources {
    fn embedded() -> Self {
        let mut sources = TemplateSources::default();
        for (name, body) in TPLS {
            sources.insert(name, (*body).to_string());
        }
        sources
    }

    fn insert(&mut self, name: &str, body: String) {
        self.0.insert(template_key(name), body);
    }

    /// Add every `.tera` file below `root`, keyed by its path relative to
    /// `root`. Files are visited in sorted path order.
    fn overlay_dir(&mut self, root: &Path) -> Result<(), RenderError> {
        let io = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| RenderError::Io { path, source }
        };
        if !root.is_dir() {
            return Err(io(root)(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "template directory not found",
            )));
        }

        let mut pending = vec![root.to_path_buf()];
        let mut found = Vec::new();
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir).map_err(io(&dir))? {
                let path = entry.map_err(io(&dir))?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|ext| ext == "tera") {
                    found.push(path);
                }
            }
        }
        found.sort();

        for path in found {
            let body = std::fs::read_to_string(&path).map_err(io(&path))?;
            let rel = path.strip_prefix(root).unwrap_or(&path);
            self.insert(&rel.to_string_lossy(), body);
        }
        Ok(())
    }

    /// Compile everything. Output escaping is left to the templates.
    fn compile(self) -> Result<Tera, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(self.0)?;
        Ok(tera)
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine with the embedded job template plus optional user
/// templates. Build once per run and reuse for every branch.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load embedded templates plus every `.tera` file under
    /// `user_template_dir`. A configured directory that does not exist is an
    /// error.
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let mut sources = TemplateSources::embedded();
        if let Some(dir) = user_template_dir {
            sources.overlay_dir(dir)?;
        }
        Ok(TemplateEngine { tera: sources.compile()? })
    }

    /// Names of every loadable template, sorted.
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.tera.get_template_names().map(str::to_string).collect();
        names.sort();
        names
    }

    pub fn has_template(&self, template: &str) -> bool {
        let key = template_key(template);
        self.tera.get_template_names().any(|n| n == key)
    }

    /// Render `template` with an explicit context.
    pub fn render_context(&self, template: &str, ctx: &JobContext) -> Result<String, RenderError> {
        if !self.has_template(template) {
            return Err(RenderError::UnknownTemplate { name: template.to_string() });
        }
        let rendered = self.tera.render(&template_key(template), &ctx.to_tera_context()?)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

impl DescriptorRenderer for TemplateEngine {
    fn render(
        &self,
        template: &str,
        repo_url: &str,
        branch: &BranchName,
    ) -> Result<Descriptor, RenderError> {
        let ctx = JobContext::new(repo_url, branch.as_str());
        Ok(Descriptor(self.render_context(template, &ctx)?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_new_succeeds() {
        TemplateEngine::new(None).expect("TemplateEngine::new() must not fail");
    }

    #[test]
    fn embedded_template_is_listed() {
        let engine = TemplateEngine::new(None).unwrap();
        assert_eq!(engine.template_names(), vec!["job.xml.tera".to_string()]);
    }

    #[test]
    fn default_template_embeds_repo_and_branch() {
        let engine = TemplateEngine::new(None).unwrap();
        let descriptor = engine
            .render("job.xml.tera", "git@github.com:acme/app.git", &BranchName::from("release-1"))
            .unwrap();
        let xml = descriptor.as_str();
        assert!(xml.contains("<url>git@github.com:acme/app.git</url>"), "{xml}");
        assert!(xml.contains("<name>refs/heads/release-1</name>"), "{xml}");
    }

    #[test]
    fn default_template_escapes_markup() {
        let engine = TemplateEngine::new(None).unwrap();
        let descriptor = engine
            .render("job.xml.tera", "https://host/repo?a=1&b=2", &BranchName::from("x<y"))
            .unwrap();
        assert!(descriptor.as_str().contains("a=1&amp;b=2"));
        assert!(descriptor.as_str().contains("refs/heads/x&lt;y"));
    }

    #[test]
    fn template_name_lookup_is_case_insensitive() {
        let engine = TemplateEngine::new(None).unwrap();
        engine
            .render("JOB.xml.tera", "r", &BranchName::from("main"))
            .expect("normalised lookup");
    }

    #[test]
    fn unknown_template_is_reported() {
        let engine = TemplateEngine::new(None).unwrap();
        let err = engine.render("nope.tera", "r", &BranchName::from("main")).unwrap_err();
        assert!(matches!(err, RenderError::UnknownTemplate { .. }), "got: {err}");
    }

    #[test]
    fn missing_template_dir_is_an_error() {
        let err = TemplateEngine::new(Some(Path::new("/definitely/not/here"))).err();
        assert!(matches!(err, Some(RenderError::Io { .. })));
    }

    #[test]
    fn template_keys_are_normalised() {
        assert_eq!(template_key("Pipelines\\Job.XML.tera"), "pipelines/job.xml.tera");
        assert_eq!(template_key("job.xml.tera"), "job.xml.tera");
    }

    #[test]
    fn user_dir_skips_non_template_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "not a template").unwrap();
        std::fs::write(dir.path().join("extra.tera"), "{{ git_branch }}").unwrap();
        let engine = TemplateEngine::new(Some(dir.path())).unwrap();
        assert_eq!(engine.template_names(), vec!["extra.tera", "job.xml.tera"]);
    }

    #[test]
    fn no_crlf_in_rendered_output() {
        let engine = TemplateEngine::new(None).unwrap();
        let descriptor = engine.render("job.xml.tera", "r", &BranchName::from("main")).unwrap();
        assert!(!descriptor.as_str().contains('\r'));
    }
}
