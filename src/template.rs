//! A small in-memory template manager.
//!
//! Templates are plain text with `{{ ident }}` placeholders. A placeholder resolves to a
//! registered template function first (called with the request context) and to a render
//! argument second; render arguments are HTML-escaped, function output is inserted as is.
//! Before-parse hooks rewrite the template sources once, when the router is built.

use crate::context::RequestContext;
use crate::helpers;
use crate::Error;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}").unwrap();
}

/// A function callable from templates, e.g. `{{csrfToken}}`.
pub type TemplateFn = Arc<dyn Fn(&RequestContext) -> String + Send + Sync + 'static>;

type BeforeParseHook = Box<dyn Fn(&str, &mut String) + Send + Sync + 'static>;

/// The arguments a controller passes to its template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderArgs(HashMap<String, String>);

impl RenderArgs {
    pub fn new() -> RenderArgs {
        RenderArgs::default()
    }

    pub fn insert<K: Into<String>, V: ToString>(&mut self, key: K, value: V) -> &mut Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Default)]
pub struct TemplateManager {
    sources: HashMap<String, String>,
    compiled: HashMap<String, String>,
    functions: HashMap<String, TemplateFn>,
    before_parse: Vec<BeforeParseHook>,
}

impl TemplateManager {
    pub fn new() -> TemplateManager {
        TemplateManager::default()
    }

    /// Adds a template. Names are case-insensitive.
    pub fn add_template<N: AsRef<str>, S: Into<String>>(&mut self, name: N, source: S) {
        self.sources.insert(name.as_ref().to_lowercase(), source.into());
    }

    pub fn add_function<N, F>(&mut self, name: N, func: F)
    where
        N: Into<String>,
        F: Fn(&RequestContext) -> String + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(func));
    }

    /// Adds a hook which may rewrite a template source (`name`, `source`) before it is compiled.
    pub fn add_hook_before_parse<F>(&mut self, hook: F)
    where
        F: Fn(&str, &mut String) + Send + Sync + 'static,
    {
        self.before_parse.push(Box::new(hook));
    }

    /// Runs the before-parse hooks over every source and makes the results renderable.
    pub fn compile(&mut self) {
        let mut compiled = HashMap::with_capacity(self.sources.len());
        for (name, source) in &self.sources {
            let mut data = source.clone();
            for hook in &self.before_parse {
                hook(name, &mut data);
            }
            compiled.insert(name.clone(), data);
        }
        tracing::debug!(templates = compiled.len(), "Compiled templates");
        self.compiled = compiled;
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.compiled.contains_key(&name.to_lowercase())
    }

    pub fn render(&self, name: &str, args: &RenderArgs, ctx: &RequestContext) -> Result<String, Error> {
        let name = name.to_lowercase();
        let tmpl = self
            .compiled
            .get(&name)
            .ok_or_else(|| Error::TemplateNotFound(name.clone()))?;

        let mut unknown = None;
        let out = PLACEHOLDER.replace_all(tmpl, |caps: &Captures<'_>| {
            let ident = &caps[1];
            if let Some(func) = self.functions.get(ident) {
                func(ctx)
            } else if let Some(val) = args.get(ident) {
                helpers::escape_html(val).into_owned()
            } else {
                unknown.get_or_insert_with(|| ident.to_owned());
                String::new()
            }
        });

        match unknown {
            Some(ident) => Err(Error::TemplateRender {
                name,
                reason: format!("no value for `{}`", ident),
            }),
            None => Ok(out.into_owned()),
        }
    }
}

impl Debug for TemplateManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut templates = self.sources.keys().collect::<Vec<_>>();
        templates.sort();
        let mut functions = self.functions.keys().collect::<Vec<_>>();
        functions.sort();
        f.debug_struct("TemplateManager")
            .field("templates", &templates)
            .field("functions", &functions)
            .field("before_parse_hooks", &self.before_parse.len())
            .finish()
    }
}
