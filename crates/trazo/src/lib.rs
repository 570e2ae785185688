//! Trazo - compiles textual diagram descriptions into rendered images.
//!
//! Three notations are understood: an infrastructure DSL, an ER DSL and
//! plain JSON. Every source goes through the same pipeline:
//!
//! 1. [`trazo_parser::parse`] builds a notation-specific AST;
//! 2. [`trazo_parser::lower`] turns it into the unified [`graph::Graph`];
//! 3. [`layout::layout`] places nodes and routes edges;
//! 4. [`render::build_scene`] draws the result, which is then encoded as
//!    SVG, PNG or PDF.
//!
//! [`Compiler`] runs the pipeline, caches successful results by content
//! digest and supports cooperative cancellation.

pub mod config;
pub mod layout;
pub mod render;

mod cache;
mod cancel;
mod digest;
mod error;

pub use trazo_core::{Notation, SourceDocument, color, geometry, graph};
pub use trazo_parser::Position;

pub use cancel::CancellationToken;
pub use digest::content_digest;
pub use error::{ErrorKind, TrazoError};
pub use render::OutputFormat;

use std::sync::Arc;

use log::{debug, error, info, trace};

use cache::DiagramCache;
use config::AppConfig;
use layout::LayoutResult;
use render::{RenderError, Scene};

/// Message shown in place of internal failures at the request boundary.
const INTERNAL_MESSAGE: &str = "internal error while rendering the diagram";

/// The result of a successful compilation.
///
/// Holds the layout and the scene so that other encodings can be produced
/// without laying the diagram out again.
#[derive(Debug)]
pub struct CompiledDiagram {
    notation: Notation,
    content_digest: String,
    layout: LayoutResult,
    scene: Scene,
    svg: Vec<u8>,
    node_count: usize,
    edge_count: usize,
}

impl CompiledDiagram {
    pub fn notation(&self) -> Notation {
        self.notation
    }

    /// Lowercase hex SHA-256 of the source, see [`content_digest`].
    pub fn content_digest(&self) -> &str {
        &self.content_digest
    }

    pub fn layout(&self) -> &LayoutResult {
        &self.layout
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The SVG encoding, produced during compilation.
    pub fn svg(&self) -> &[u8] {
        &self.svg
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Serializes the diagram in `format`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if PNG rasterization or PDF serialization fails.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, RenderError> {
        match format {
            OutputFormat::Svg => Ok(self.svg.clone()),
            other => render::encode(&self.scene, other),
        }
    }
}

/// A compilation request as received at the service boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub source_text: String,
    pub notation: Notation,
    pub format: OutputFormat,
}

impl CompileRequest {
    /// Creates a request for an SVG image.
    pub fn new(notation: Notation, source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            notation,
            format: OutputFormat::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// Encoded image and summary of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub image_bytes: Vec<u8>,
    pub content_digest: String,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Description of a failed compilation, safe to show to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub error_kind: ErrorKind,
    pub message: String,
    pub position: Option<Position>,
}

impl From<&TrazoError> for CompileFailure {
    fn from(err: &TrazoError) -> Self {
        let error_kind = err.kind();
        let message = match error_kind {
            ErrorKind::Internal => {
                error!(err:% = err; "Internal compilation failure");
                INTERNAL_MESSAGE.to_string()
            }
            _ => err.to_string(),
        };
        Self {
            error_kind,
            message,
            position: err.position(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileResponse {
    Success(CompileOutput),
    Failure(CompileFailure),
}

/// Runs the compilation pipeline.
///
/// A compiler is `Send + Sync` and is meant to be shared: the only state it
/// mutates is its result cache.
///
/// # Examples
///
/// ```rust
/// use trazo::{Compiler, Notation, SourceDocument, config::AppConfig};
///
/// let compiler = Compiler::new(AppConfig::default());
/// let doc = SourceDocument::new(Notation::Data, r#"{"name": "trazo", "tags": ["a", "b"]}"#);
///
/// let diagram = compiler.compile(&doc).expect("valid JSON compiles");
/// assert!(diagram.node_count() > 1);
/// assert!(!diagram.svg().is_empty());
/// ```
pub struct Compiler {
    config: AppConfig,
    cache: Option<DiagramCache>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Compiler {
    /// Create a compiler with the given configuration.
    ///
    /// A cache capacity of zero disables caching.
    pub fn new(config: AppConfig) -> Self {
        let cache = DiagramCache::new(config.cache().capacity());
        Self { config, cache }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Compiles `doc` into a diagram.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile_with_cancel`].
    pub fn compile(&self, doc: &SourceDocument) -> Result<Arc<CompiledDiagram>, TrazoError> {
        self.compile_with_cancel(doc, &CancellationToken::new())
    }

    /// Compiles `doc`, giving up as soon as `cancel` fires.
    ///
    /// A repeat compile of the same notation and text returns the cached
    /// diagram. Failed and cancelled compilations are never cached.
    ///
    /// # Errors
    ///
    /// - [`TrazoError::Empty`] for blank input or a diagram without nodes
    /// - [`TrazoError::Syntax`] / [`TrazoError::Semantic`] for source errors
    /// - [`TrazoError::TooLarge`] when the node limit is exceeded
    /// - [`TrazoError::Cancelled`] when `cancel` fires
    /// - other variants for internal layout or rendering failures
    pub fn compile_with_cancel(
        &self,
        doc: &SourceDocument,
        cancel: &CancellationToken,
    ) -> Result<Arc<CompiledDiagram>, TrazoError> {
        let notation = doc.notation();
        if doc.is_blank() {
            debug!(notation = notation.as_str(); "Blank source");
            return Err(TrazoError::Empty);
        }
        check_cancelled(cancel)?;

        let digest = content_digest(doc);
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(notation, &digest)) {
            debug!(notation = notation.as_str(), digest = digest.as_str(); "Serving cached diagram");
            return Ok(hit);
        }

        info!(notation = notation.as_str(), bytes = doc.text().len(); "Parsing source");
        let ast = trazo_parser::parse(doc)
            .map_err(|err| TrazoError::new_syntax_error(err, doc.text()))?;
        check_cancelled(cancel)?;

        let graph = trazo_parser::lower(ast)
            .map_err(|err| TrazoError::new_semantic_error(err, doc.text()))?;
        info!(nodes = graph.node_count(), edges = graph.edge_count(); "Graph built");
        trace!(graph:? = graph; "Lowered graph");
        check_cancelled(cancel)?;

        if graph.node_count() == 0 {
            return Err(TrazoError::Empty);
        }
        let limit = self.config.limits().max_nodes();
        if graph.node_count() > limit {
            return Err(TrazoError::TooLarge {
                nodes: graph.node_count(),
                limit,
            });
        }

        let layout = layout::layout(&graph, self.config.layout(), cancel)?;
        check_cancelled(cancel)?;

        let scene = render::build_scene(&graph, &layout, self.config.style())?;
        let svg = render::encode(&scene, OutputFormat::Svg)?;
        check_cancelled(cancel)?;

        let diagram = Arc::new(CompiledDiagram {
            notation,
            content_digest: digest,
            layout,
            scene,
            svg,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
        });
        if let Some(cache) = &self.cache {
            cache.insert(Arc::clone(&diagram));
        }
        info!(digest = diagram.content_digest(), bytes = diagram.svg().len(); "Diagram compiled");
        Ok(diagram)
    }

    /// The cached diagram for `doc`, if any.
    pub fn cached(&self, doc: &SourceDocument) -> Option<Arc<CompiledDiagram>> {
        let digest = content_digest(doc);
        self.cache.as_ref()?.get(doc.notation(), &digest)
    }

    /// Number of cached diagrams.
    pub fn cache_len(&self) -> u64 {
        self.cache.as_ref().map_or(0, DiagramCache::len)
    }

    /// Handles a request at the service boundary.
    ///
    /// Internal failures are logged in full and reported with a generic
    /// message.
    pub fn respond(&self, request: &CompileRequest) -> CompileResponse {
        let doc = SourceDocument::new(request.notation, request.source_text.as_str());
        let result = self
            .compile(&doc)
            .and_then(|diagram| Ok((diagram.encode(request.format)?, diagram)));

        match result {
            Ok((image_bytes, diagram)) => CompileResponse::Success(CompileOutput {
                image_bytes,
                content_digest: diagram.content_digest().to_string(),
                node_count: diagram.node_count(),
                edge_count: diagram.edge_count(),
            }),
            Err(err) => CompileResponse::Failure(CompileFailure::from(&err)),
        }
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), TrazoError> {
    if cancel.is_cancelled() {
        debug!("Compilation cancelled");
        return Err(TrazoError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_compiler_is_send_sync() {
        assert_send_sync::<Compiler>();
        assert_send_sync::<CompiledDiagram>();
    }

    #[test]
    fn test_respond_success() {
        let compiler = Compiler::default();
        let request = CompileRequest::new(Notation::Infra, "a = EC2(\"a\")\nb = RDS(\"b\")\na >> b\n");
        let CompileResponse::Success(output) = compiler.respond(&request) else {
            panic!("expected success");
        };
        assert_eq!(output.node_count, 2);
        assert_eq!(output.edge_count, 1);
        assert_eq!(output.content_digest.len(), 64);
        assert!(String::from_utf8(output.image_bytes).unwrap().contains("<svg"));
    }

    #[test]
    fn test_respond_empty() {
        let compiler = Compiler::default();
        let CompileResponse::Failure(failure) = compiler.respond(&CompileRequest::new(Notation::Er, "  \n\t")) else {
            panic!("expected failure");
        };
        assert_eq!(failure.error_kind, ErrorKind::Empty);
        assert_eq!(failure.position, None);
    }

    #[test]
    fn test_internal_message_is_redacted() {
        let err = TrazoError::Layout("node 3 was placed at a non-finite position".to_string());
        let failure = CompileFailure::from(&err);
        assert_eq!(failure.error_kind, ErrorKind::Internal);
        assert_eq!(failure.message, INTERNAL_MESSAGE);
    }

    #[test]
    fn test_source_errors_keep_message() {
        let compiler = Compiler::default();
        let CompileResponse::Failure(failure) = compiler.respond(&CompileRequest::new(Notation::Data, "{\"a\": }")) else {
            panic!("expected failure");
        };
        assert_eq!(failure.error_kind, ErrorKind::Syntax);
        assert_ne!(failure.message, INTERNAL_MESSAGE);
        assert_eq!(failure.position.map(|p| p.line), Some(1));
    }
}
