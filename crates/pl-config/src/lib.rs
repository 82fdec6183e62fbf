//! TOML configuration for the rule language: parser options and a catalog
//! of declared function signatures.

#[macro_use]
mod log_macros;
mod error;

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use orion_error::prelude::*;
use orion_error::{ErrorOwe, ErrorOweBase};
use serde::Deserialize;

use pl_lang::{
    DeclaredFunction, FunctionDescriptor, FunctionRegistry, ParameterDescriptor, ParserOptions,
    PipelineRuleParser, ValueType,
};

pub use error::{ConfigError, ConfigReason, ConfigResult};

// ---------------------------------------------------------------------------
// Raw TOML structure (intermediate representation)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LangConfigRaw {
    #[serde(default)]
    parser: ParserSection,
    #[serde(default, rename = "function")]
    functions: Vec<FunctionRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FunctionRaw {
    name: String,
    #[serde(default = "any_type")]
    returns: String,
    #[serde(default)]
    params: Vec<ParamRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParamRaw {
    name: String,
    #[serde(rename = "type", default = "any_type")]
    ty: String,
    #[serde(default)]
    optional: bool,
}

fn any_type() -> String {
    "any".to_string()
}

/// `[parser]` section. Every field has a default, so the section may be
/// omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserSection {
    /// Reject rule conditions that are neither logical nor boolean.
    pub strict_conditions: bool,
}

// ---------------------------------------------------------------------------
// LangConfig (resolved, validated)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LangConfig {
    pub parser: ParserSection,
    /// Declared function signatures, in file order.
    pub functions: Vec<FunctionDescriptor>,
}

impl LangConfig {
    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .owe_sys()
            .position(path.display().to_string())?;
        let config: LangConfig = content
            .parse()
            .owe(ConfigReason::Invalid)
            .position(path.display().to_string())?;
        pl_debug!(
            conf,
            file = %path.display(),
            functions = config.functions.len(),
            strict_conditions = config.parser.strict_conditions,
            "loaded language config"
        );
        Ok(config)
    }

    pub fn options(&self) -> ParserOptions {
        ParserOptions {
            strict_conditions: self.parser.strict_conditions,
        }
    }

    /// Register every declared function into `registry`, replacing
    /// functions of the same name.
    pub fn register_into(&self, registry: &mut FunctionRegistry) {
        for descriptor in &self.functions {
            if registry
                .register(Arc::new(DeclaredFunction::new(descriptor.clone())))
                .is_some()
            {
                pl_debug!(conf, function = %descriptor.name, "declared function replaces registered one");
            }
        }
    }

    /// A registry holding only the declared functions.
    pub fn registry(&self) -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        self.register_into(&mut registry);
        registry
    }

    /// A parser over `registry` using the configured options.
    pub fn parser(&self, registry: Arc<FunctionRegistry>) -> PipelineRuleParser {
        PipelineRuleParser::new(registry).with_options(self.options())
    }
}

impl FromStr for LangConfig {
    type Err = anyhow::Error;

    /// Parse a TOML string into a resolved, validated [`LangConfig`].
    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: LangConfigRaw = toml::from_str(toml_str)?;

        let mut seen = HashSet::new();
        let mut functions = Vec::with_capacity(raw.functions.len());
        for function in raw.functions {
            if !seen.insert(function.name.clone()) {
                anyhow::bail!("function `{}` is declared more than once", function.name);
            }
            functions.push(function.resolve()?);
        }

        Ok(LangConfig {
            parser: raw.parser,
            functions,
        })
    }
}

impl FunctionRaw {
    fn resolve(self) -> anyhow::Result<FunctionDescriptor> {
        let name = self.name;
        if name.trim().is_empty() {
            anyhow::bail!("function name must not be empty");
        }
        let returns = ValueType::from_str(&self.returns)
            .map_err(|e| anyhow::anyhow!("function `{name}` return type: {e}"))?;

        let mut descriptor = FunctionDescriptor::new(name.clone(), returns);
        for param in self.params {
            if descriptor.find_param(&param.name).is_some() {
                anyhow::bail!("function `{name}` declares parameter `{}` twice", param.name);
            }
            let ty = ValueType::from_str(&param.ty)
                .map_err(|e| anyhow::anyhow!("function `{name}` parameter `{}`: {e}", param.name))?;
            descriptor = descriptor.param(if param.optional {
                ParameterDescriptor::optional(param.name, ty)
            } else {
                ParameterDescriptor::required(param.name, ty)
            });
        }
        Ok(descriptor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
