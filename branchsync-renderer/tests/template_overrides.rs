use std::fs;

use branchsync_core::types::BranchName;
use branchsync_renderer::{DescriptorRenderer, JobContext, RenderError, TemplateEngine};
use tempfile::TempDir;

#[test]
fn user_template_dir_adds_templates() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir_all(dir.path().join("pipelines")).expect("mkdir");
    fs::write(
        dir.path().join("pipelines").join("Pipeline.xml.tera"),
        "<flow repo=\"{{ git_repo }}\" branch=\"{{ git_branch }}\"/>",
    )
    .expect("write");
    fs::write(dir.path().join("README.md"), "not a template").expect("write");

    let engine = TemplateEngine::new(Some(dir.path())).expect("engine");
    assert_eq!(
        engine.template_names(),
        vec!["job.xml.tera".to_string(), "pipelines/pipeline.xml.tera".to_string()]
    );

    let descriptor = engine
        .render("pipelines/Pipeline.xml.tera", "git@host:app.git", &BranchName::from("main"))
        .expect("render");
    assert_eq!(descriptor.as_str(), "<flow repo=\"git@host:app.git\" branch=\"main\"/>");
}

#[test]
fn user_template_overrides_embedded_default() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("job.xml.tera"), "custom {{ git_branch }}\r\n").expect("write");

    let engine = TemplateEngine::new(Some(dir.path())).expect("engine");
    let rendered = engine
        .render_context("job.xml.tera", &JobContext::new("r", "dev"))
        .expect("render");
    assert_eq!(rendered, "custom dev\n");
}

#[test]
fn syntax_error_in_user_template_fails_engine_construction() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("broken.tera"), "{% if %}").expect("write");

    let err = TemplateEngine::new(Some(dir.path())).err().expect("must fail");
    assert!(matches!(err, RenderError::Tera(_)), "got: {err}");
}

#[test]
fn undefined_variable_is_a_render_error() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("needs-more.tera"), "{{ credentials_id }}").expect("write");

    let engine = TemplateEngine::new(Some(dir.path())).expect("engine");
    let err = engine
        .render("needs-more.tera", "r", &BranchName::from("main"))
        .unwrap_err();
    assert!(matches!(err, RenderError::Tera(_)), "got: {err}");
}
