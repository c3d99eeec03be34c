//! The build coordinator: per-output processor chains, renderer
//! dispatch, and aggregation into a single [`BuildResult`].
//!
//! The coordinator never panics or propagates: every failure is captured
//! as a [`BuildError`] and remaining outputs continue. `success` is true
//! iff no errors were recorded.

pub mod output;
pub mod processors;

use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::config::{Config, ResolverSpec};
use crate::error::{ErrorCode, TinctureError};
use crate::render::{FileTree, PermutationView, RenderContext, Renderer, builtin_renderers};
use crate::resolver::modifiers::ModifierInputs;
use crate::resolver::reference::DocumentCache;
use crate::resolver::{ResolverDocument, TokenResolver};
use crate::support::{refs, suggest};
use crate::tokens::TokenMap;
use crate::warnings::{TinctureWarning, WarningSink};
use self::output::{FilterSpec, OutputConfig, Preset, TransformSpec};
use self::processors::{Filter, Preprocessor, Transform, apply_chain};

/// Severity of a build diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A failure captured at the per-output boundary.
#[derive(Debug)]
pub struct BuildError {
    pub code: ErrorCode,
    pub message: String,
    pub severity: Severity,
    /// The output descriptor this error belongs to, when attributable.
    pub output: Option<String>,
}

impl BuildError {
    fn from_error(error: &TinctureError, output: Option<&str>) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            severity: Severity::Error,
            output: output.map(str::to_string),
        }
    }
}

/// One rendered artifact.
#[derive(Debug)]
pub struct BuildOutput {
    /// The descriptor this artifact belongs to.
    pub name: String,
    /// Relative file path within the build directory.
    pub file: String,
    /// Absolute destination, when written to disk.
    pub path: Option<PathBuf>,
    pub content: Option<String>,
    /// The renderer that produced it.
    pub platform: String,
}

/// The aggregated result of one build.
#[derive(Debug)]
pub struct BuildResult {
    pub success: bool,
    pub outputs: Vec<BuildOutput>,
    pub errors: Vec<BuildError>,
    pub warnings: Vec<TinctureWarning>,
}

/// Orchestrates C1–C8 for one build configuration.
///
/// All caches and registries live on the instance and are dropped when
/// [`BuildCoordinator::build`] returns; nothing is shared across builds.
pub struct BuildCoordinator {
    config: Config,
    base_dir: PathBuf,
    dry_run: bool,
    renderers: IndexMap<String, Rc<dyn Renderer>>,
    custom_filters: IndexMap<String, Rc<dyn Filter>>,
    custom_transforms: IndexMap<String, Rc<dyn Transform>>,
    custom_preprocessors: IndexMap<String, Rc<dyn Preprocessor>>,
    cache: DocumentCache,
}

impl BuildCoordinator {
    pub fn new(config: Config, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
            dry_run: false,
            renderers: builtin_renderers(),
            custom_filters: IndexMap::new(),
            custom_transforms: IndexMap::new(),
            custom_preprocessors: IndexMap::new(),
            cache: DocumentCache::new(),
        }
    }

    /// Plan and render, but skip all disk writes.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Register a user renderer; it shadows a built-in of the same name.
    pub fn register_renderer(&mut self, renderer: Rc<dyn Renderer>) {
        self.renderers
            .insert(renderer.name().to_string(), renderer);
    }

    pub fn register_filter(&mut self, filter: Rc<dyn Filter>) {
        self.custom_filters.insert(filter.name().to_string(), filter);
    }

    pub fn register_transform(&mut self, transform: Rc<dyn Transform>) {
        self.custom_transforms
            .insert(transform.name().to_string(), transform);
    }

    pub fn register_preprocessor(&mut self, preprocessor: Rc<dyn Preprocessor>) {
        self.custom_preprocessors
            .insert(preprocessor.name().to_string(), preprocessor);
    }

    /// Run the build. Never returns an error: failures are aggregated
    /// into the result.
    pub fn build(self) -> BuildResult {
        let mut sink = WarningSink::new(self.config.validation.mode);
        let mut outputs = Vec::new();
        let mut errors = Vec::new();

        if let Err(error) = self.run(&mut outputs, &mut errors, &mut sink) {
            errors.push(BuildError::from_error(&error, None));
        }

        BuildResult {
            success: errors.is_empty(),
            outputs,
            errors,
            warnings: sink.into_warnings(),
        }
    }

    fn run(
        &self,
        outputs: &mut Vec<BuildOutput>,
        errors: &mut Vec<BuildError>,
        sink: &mut WarningSink,
    ) -> Result<(), TinctureError> {
        let resolver = self.token_resolver(Vec::new())?;
        let views = self.resolve_views(&resolver, sink)?;
        tracing::info!(
            permutations = views.len(),
            outputs = self.config.outputs.len(),
            "starting build"
        );

        for descriptor in &self.config.outputs {
            match self.run_output(descriptor, resolver.document(), &views, sink) {
                Ok(rendered) => outputs.extend(rendered),
                Err(error) => {
                    tracing::warn!(output = %descriptor.name, %error, "output failed");
                    errors.push(BuildError::from_error(&error, Some(&descriptor.name)));
                }
            }
        }

        if let Some(build_path) = &self.config.build_path {
            if !self.dry_run {
                self.write_outputs(build_path.clone(), outputs, errors);
            }
        }
        Ok(())
    }

    fn token_resolver(
        &self,
        preprocessors: Vec<Rc<dyn Preprocessor>>,
    ) -> Result<TokenResolver, TinctureError> {
        let mut resolver = match &self.config.resolver {
            ResolverSpec::Path(path) => {
                let full = if path.is_absolute() {
                    path.clone()
                } else {
                    self.base_dir.join(path)
                };
                TokenResolver::from_file(&full, self.cache.clone())?
            }
            ResolverSpec::Inline(value) => {
                let document = ResolverDocument::from_value(value)?;
                TokenResolver::new(document, self.base_dir.clone(), self.cache.clone())?
            }
        };
        resolver.set_preprocessors(preprocessors);
        Ok(resolver)
    }

    fn resolve_views(
        &self,
        resolver: &TokenResolver,
        sink: &mut WarningSink,
    ) -> Result<Vec<PermutationView>, TinctureError> {
        let permutations = resolver.resolve_all_permutations(sink)?;
        Ok(permutations
            .into_iter()
            .map(|permutation| {
                let is_base = permutation.is_base(resolver.document());
                PermutationView {
                    modifier_inputs: permutation.modifier_inputs,
                    tokens: permutation.tokens,
                    is_base,
                }
            })
            .collect())
    }

    #[allow(clippy::too_many_lines)]
    fn run_output(
        &self,
        descriptor: &OutputConfig,
        document: &ResolverDocument,
        views: &[PermutationView],
        sink: &mut WarningSink,
    ) -> Result<Vec<BuildOutput>, TinctureError> {
        let renderer =
            self.renderers
                .get(&descriptor.renderer)
                .ok_or_else(|| TinctureError::Configuration {
                    message: format!(
                        "output '{}' names unknown renderer '{}'",
                        descriptor.name, descriptor.renderer
                    ),
                })?;
        let filters = self.resolve_filters(&descriptor.filters)?;
        let transforms = self.resolve_transforms(&descriptor.transforms)?;
        let preprocessors = self.resolve_preprocessors(&descriptor.preprocessors)?;

        // Preprocessors rewrite raw documents, so their outputs need a
        // separate resolution pass (cache still shared).
        let preprocessed;
        let views: &[PermutationView] = if preprocessors.is_empty() {
            views
        } else {
            let resolver = self.token_resolver(preprocessors)?;
            preprocessed = self.resolve_views(&resolver, sink)?;
            preprocessed.as_slice()
        };

        let processed: Vec<PermutationView> = views
            .iter()
            .map(|view| {
                let tokens = self.prepare_tokens(descriptor, &view.tokens)?;
                Ok(PermutationView {
                    modifier_inputs: view.modifier_inputs.clone(),
                    tokens: apply_chain(&tokens, &filters, &transforms, sink),
                    is_base: view.is_base,
                })
            })
            .collect::<Result<_, TinctureError>>()?;

        let mut rendered = Vec::new();
        match descriptor.preset {
            Preset::Bundle => {
                let inputs = ModifierInputs::new();
                let file = descriptor
                    .resolve_file_name(&inputs, || renderer.default_file(&inputs));
                let files = self.invoke(renderer, descriptor, document, &processed, &file)?;
                push_rendered(&mut rendered, descriptor, renderer.name(), files);
            }
            Preset::Standalone => {
                for view in &processed {
                    let file = descriptor.resolve_file_name(&view.modifier_inputs, || {
                        renderer.default_file(&view.modifier_inputs)
                    });
                    let slice = std::slice::from_ref(view);
                    let files = self.invoke(renderer, descriptor, document, slice, &file)?;
                    push_rendered(&mut rendered, descriptor, renderer.name(), files);
                }
            }
            Preset::Modifier => {
                let base = processed
                    .iter()
                    .find(|view| view.is_base)
                    .ok_or_else(|| TinctureError::BasePermutation {
                        message: format!(
                            "output '{}' requires the base permutation",
                            descriptor.name
                        ),
                    })?;
                for view in processed.iter().filter(|view| !view.is_base) {
                    let file = descriptor.resolve_file_name(&view.modifier_inputs, || {
                        renderer.default_file(&view.modifier_inputs)
                    });
                    let pair = vec![base.clone(), view.clone()];
                    let files = self.invoke(renderer, descriptor, document, &pair, &file)?;
                    push_rendered(&mut rendered, descriptor, renderer.name(), files);
                }
            }
        }
        Ok(rendered)
    }

    fn invoke(
        &self,
        renderer: &Rc<dyn Renderer>,
        descriptor: &OutputConfig,
        document: &ResolverDocument,
        permutations: &[PermutationView],
        file: &str,
    ) -> Result<FileTree, TinctureError> {
        let context = RenderContext {
            descriptor,
            document,
            permutations,
            file,
            options: &descriptor.options,
        };
        renderer.format(&context)
    }

    /// Apply the descriptor's reference policy to a resolved map.
    ///
    /// With `preserveReferences`, alias tokens get their `{…}` value
    /// back so renderers can emit indirections. Without it, any alias
    /// still unresolved at this point is a hard error.
    fn prepare_tokens(
        &self,
        descriptor: &OutputConfig,
        tokens: &TokenMap,
    ) -> Result<TokenMap, TinctureError> {
        if descriptor.preserve_references {
            let mut restored = tokens.clone();
            let names: Vec<String> = restored.names().iter().map(|n| (*n).to_string()).collect();
            for name in names {
                if let Some(token) = restored.get_mut(&name) {
                    if token.is_alias {
                        token.value = token.original_value.clone();
                    }
                }
            }
            return Ok(restored);
        }

        for token in tokens.iter() {
            if let Some(target) = refs::alias_target(&token.value) {
                let candidates = tokens.names();
                return Err(TinctureError::TokenReference {
                    token: token.name.clone(),
                    target: target.to_string(),
                    suggestions: suggest::did_you_mean(target, candidates),
                });
            }
        }
        Ok(tokens.clone())
    }

    fn resolve_filters(
        &self,
        specs: &[FilterSpec],
    ) -> Result<Vec<Rc<dyn Filter>>, TinctureError> {
        specs
            .iter()
            .map(|spec| match spec {
                FilterSpec::Name(name) => match self.custom_filters.get(name) {
                    Some(filter) => Ok(Rc::clone(filter)),
                    None => processors::builtin_filter(name, None),
                },
                FilterSpec::WithArg(entry) => {
                    let (name, argument) =
                        entry.first().ok_or_else(|| TinctureError::Configuration {
                            message: "empty filter entry".to_string(),
                        })?;
                    processors::builtin_filter(name, Some(argument))
                }
            })
            .collect()
    }

    fn resolve_transforms(
        &self,
        specs: &[TransformSpec],
    ) -> Result<Vec<Rc<dyn Transform>>, TinctureError> {
        specs
            .iter()
            .map(|spec| match spec {
                TransformSpec::Name(name) => match self.custom_transforms.get(name) {
                    Some(transform) => Ok(Rc::clone(transform)),
                    None => processors::builtin_transform(name, None),
                },
                TransformSpec::WithOptions(entry) => {
                    let (name, options) =
                        entry.first().ok_or_else(|| TinctureError::Configuration {
                            message: "empty transform entry".to_string(),
                        })?;
                    match self.custom_transforms.get(name) {
                        Some(transform) => Ok(Rc::clone(transform)),
                        None => processors::builtin_transform(name, Some(options)),
                    }
                }
            })
            .collect()
    }

    fn resolve_preprocessors(
        &self,
        names: &[String],
    ) -> Result<Vec<Rc<dyn Preprocessor>>, TinctureError> {
        names
            .iter()
            .map(|name| {
                self.custom_preprocessors.get(name).map(Rc::clone).ok_or_else(|| {
                    TinctureError::Configuration {
                        message: format!("unknown preprocessor '{name}'"),
                    }
                })
            })
            .collect()
    }

    fn write_outputs(
        &self,
        build_path: PathBuf,
        outputs: &mut [BuildOutput],
        errors: &mut Vec<BuildError>,
    ) {
        let root = if build_path.is_absolute() {
            build_path
        } else {
            self.base_dir.join(build_path)
        };
        for output in outputs {
            let Some(content) = &output.content else { continue };
            let destination = root.join(&output.file);
            let result = destination
                .parent()
                .map_or(Ok(()), std::fs::create_dir_all)
                .and_then(|()| std::fs::write(&destination, content));
            match result {
                Ok(()) => {
                    tracing::info!(path = %destination.display(), bytes = content.len(), "wrote output");
                    output.path = Some(destination);
                }
                Err(source) => {
                    let error = TinctureError::FileWrite {
                        path: destination.display().to_string(),
                        source,
                    };
                    errors.push(BuildError::from_error(&error, Some(&output.name)));
                }
            }
        }
    }
}

fn push_rendered(
    rendered: &mut Vec<BuildOutput>,
    descriptor: &OutputConfig,
    platform: &str,
    files: FileTree,
) {
    for (file, content) in files {
        rendered.push(BuildOutput {
            name: descriptor.name.clone(),
            file,
            path: None,
            content: Some(content),
            platform: platform.to_string(),
        });
    }
}
