//! Compiled command templates and callsign patterns.
//!
//! The decoder reads both tables from a [`Registry`]. The built-in one is
//! compiled once per process; tests and embedders can build their own.

use std::sync::OnceLock;

use log::debug;

use crate::{
    callsign::{CallsignPattern, CompiledPattern, compile_patterns, default_patterns},
    catalogue::default_templates,
    errors::Error,
    template::{CommandTemplate, Template},
};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    templates: Vec<Template>,
    patterns: Vec<CompiledPattern>,
}

impl Registry {
    /// No templates and no callsign patterns: nothing decodes.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Callsign patterns, highest priority first.
    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    templates: Vec<CommandTemplate>,
    patterns: Vec<CallsignPattern>,
}

impl RegistryBuilder {
    /// Built-in command catalogue and callsign patterns.
    pub fn with_defaults(self) -> Self {
        self.templates(default_templates())
            .callsign_patterns(default_patterns())
    }

    pub fn template(mut self, template: CommandTemplate) -> Self {
        self.templates.push(template);
        self
    }

    pub fn templates(mut self, templates: impl IntoIterator<Item = CommandTemplate>) -> Self {
        self.templates.extend(templates);
        self
    }

    pub fn callsign_pattern(mut self, pattern: CallsignPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn callsign_patterns(mut self, patterns: impl IntoIterator<Item = CallsignPattern>) -> Self {
        self.patterns.extend(patterns);
        self
    }

    pub fn build(self) -> Result<Registry, Error> {
        let templates = self
            .templates
            .into_iter()
            .map(CommandTemplate::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let patterns = compile_patterns(self.patterns)?;
        debug!(
            "Registry built: {} templates, {} callsign patterns",
            templates.len(),
            patterns.len()
        );
        Ok(Registry {
            templates,
            patterns,
        })
    }
}

static DEFAULT_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The built-in registry. A built-in template that does not compile is a
/// programming error and aborts here.
pub fn default_registry() -> &'static Registry {
    DEFAULT_REGISTRY.get_or_init(|| match Registry::builder().with_defaults().build() {
        Ok(registry) => registry,
        Err(err) => panic!("built-in command catalogue is invalid: {err}"),
    })
}

/// Compile the built-in registry now rather than on the first decode.
pub fn init() {
    default_registry();
}
