//! Render orchestration.
//!
//! Drives one template through Compile → Execute → shell assembly, measuring
//! per-stage timings and translating failures through the source map. The
//! per-path cache keeps the last successful markup so an edit that breaks
//! the template degrades the preview to stale-but-rendered, never blank.

pub mod cache;
pub mod page_config;
pub mod remap;
pub mod result;
pub mod shell;

use std::{
    path::Path,
    sync::Arc,
    time::Instant,
};

use crate::{
    compiler::{self, Bundle},
    config::Config,
    log, sandbox,
};

use cache::{Applied, DocPhase, RenderCache, Ticket};
use page_config::PageConfigStore;
use remap::StackRemapper;
use result::{RenderError, RenderedDocument, Timing};

/// Shared rendering front end used by the dev server and the CLI.
///
/// The page config store is shared with the reload hub, which feeds it
/// layout reports from open previews.
pub struct Renderer {
    config: Arc<Config>,
    cache: RenderCache,
    pages: Arc<PageConfigStore>,
}

impl Renderer {
    pub fn new(config: Arc<Config>, pages: Arc<PageConfigStore>) -> Self {
        Self {
            config,
            cache: RenderCache::new(),
            pages,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn pages(&self) -> &PageConfigStore {
        &self.pages
    }

    /// Render one template to markup.
    ///
    /// `props` overrides the template's declared preview props when given.
    pub fn render_document(
        &self,
        template: &Path,
        props: Option<serde_json::Value>,
    ) -> Result<RenderedDocument, RenderError> {
        let total = Instant::now();
        let ticket = self.cache.begin(template);

        let compile_start = Instant::now();
        let bundle = match compiler::compile(&self.config, template) {
            Ok(bundle) => bundle,
            Err(err) => {
                self.cache.fail(&ticket);
                log!("render"; "compile failed: {}", template.display());
                return Err(RenderError::compile(&err));
            }
        };
        let file_read = ms(compile_start);

        self.render_compiled(&bundle, props, ticket, total, file_read)
    }

    /// Render a bundle compiled elsewhere; `publish` reuses its build output.
    pub fn render_bundle(
        &self,
        bundle: &Bundle,
        props: Option<serde_json::Value>,
    ) -> Result<RenderedDocument, RenderError> {
        let total = Instant::now();
        let ticket = self.cache.begin(&bundle.template);
        self.render_compiled(bundle, props, ticket, total, 0)
    }

    /// The Execute → Render tail of the pipeline.
    fn render_compiled(
        &self,
        bundle: &Bundle,
        props: Option<serde_json::Value>,
        ticket: Ticket,
        total: Instant,
        file_read: u64,
    ) -> Result<RenderedDocument, RenderError> {
        let template = &bundle.template;

        self.cache.advance(&ticket, DocPhase::Executing);
        let exec_start = Instant::now();
        let output = match sandbox::execute(&self.config, bundle, props.as_ref()) {
            Ok(output) => output,
            Err(err) => {
                self.cache.fail(&ticket);
                let remapper = StackRemapper::new(bundle);
                log!("render"; "render failed: {}", template.display());
                return Err(err.map_object(|obj| remapper.remap_object(obj)));
            }
        };
        let exec_wall = ms(exec_start);

        self.cache.advance(&ticket, DocPhase::Rendering);
        match self.cache.complete(&ticket, &output.markup) {
            Applied::Fresh => {}
            Applied::Unchanged => {
                crate::debug!("render"; "unchanged markup: {}", template.display());
            }
            Applied::Stale => {
                crate::debug!("render"; "discarded stale render: {}", template.display());
            }
        }

        Ok(RenderedDocument {
            markup: output.markup,
            react_markup: output.react_markup,
            preview_props: output.preview_props,
            timing: Some(Timing {
                total: ms(total),
                component_load: exec_wall.saturating_sub(output.render_ms),
                rendering: output.render_ms,
                file_read,
            }),
        })
    }

    /// The full preview page for a template, rendering on demand.
    ///
    /// On failure the last successful markup is served instead when one
    /// exists; only a template that has never rendered propagates the error.
    pub fn preview_shell(
        &self,
        template: &Path,
        relative: &str,
        ws_port: u16,
    ) -> Result<String, RenderError> {
        let markup = match self.render_document(template, None) {
            Ok(doc) => doc.markup,
            Err(err) => match self.cache.last_good(template) {
                Some(markup) => {
                    log!("render"; "serving last good markup for {relative}");
                    markup
                }
                None => return Err(err),
            },
        };

        let title = template
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative.to_owned());

        Ok(shell::assemble(&title, &markup, ws_port, relative))
    }
}

#[inline]
fn ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    /// A documents root with a props-driven template and a local render
    /// package. The template returns a plain node object so the fixture
    /// needs no JSX runtime installed.
    fn fixture() -> (tempfile::TempDir, Arc<Config>, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = crate::utils::path::normalize_path(dir.path());

        let pkg = root.join("node_modules/@docforge/render");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("index.js"),
            "module.exports = {\n  renderAsync: async (node) => `<${node.tag}>${node.text}</${node.tag}>`,\n};\n",
        )
        .unwrap();

        let template = root.join("Badge.tsx");
        fs::write(
            &template,
            "export const previewProps = { name: \"Jane\" };\n\n\
             type Props = { name: string };\n\n\
             export default function Badge(props: Props) {\n\
               return { tag: \"p\", text: props.name };\n\
             }\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.root = root.clone();
        config.documents = root;

        (dir, Arc::new(config), template)
    }

    fn tooling_available(config: &Config) -> bool {
        config.esbuild_bin().is_ok() && config.node_bin().is_ok()
    }

    #[test]
    fn preview_props_fill_in_and_overrides_win() {
        let (_dir, config, template) = fixture();
        if !tooling_available(&config) {
            eprintln!("skipping: esbuild/node not available");
            return;
        }
        let renderer = Renderer::new(config, Arc::new(PageConfigStore::new()));

        // No props on the request: the template's declared preview props fill in
        let doc = renderer.render_document(&template, None).unwrap();
        assert!(doc.markup.contains("<p>Jane</p>"), "markup: {}", doc.markup);
        assert_eq!(doc.preview_props.as_ref().unwrap()["name"], "Jane");
        assert!(doc.timing.is_some());

        // Explicit props replace the preview props entirely
        let doc = renderer
            .render_document(&template, Some(serde_json::json!({ "name": "Bob" })))
            .unwrap();
        assert!(doc.markup.contains("<p>Bob</p>"), "markup: {}", doc.markup);
        assert!(!doc.markup.contains("Jane"));
    }

    #[test]
    fn render_bundle_reuses_compiled_output() {
        let (_dir, config, template) = fixture();
        if !tooling_available(&config) {
            eprintln!("skipping: esbuild/node not available");
            return;
        }
        let renderer = Renderer::new(Arc::clone(&config), Arc::new(PageConfigStore::new()));

        let bundle = compiler::compile(&config, &template).unwrap();
        let doc = renderer.render_bundle(&bundle, None).unwrap();
        assert!(doc.markup.contains("<p>Jane</p>"));
        assert_eq!(renderer.cache().last_good(&bundle.template).unwrap(), doc.markup);
    }
}
