//! Named layouts backed by Tera
//!
//! Every file in the layouts directory becomes a layout named after its
//! stem. A layout may start with front matter naming a parent layout; the
//! rendered child is then passed to the parent as `content`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tera::{Context, Tera};

use crate::error::{FolioError, FolioResult};
use crate::parser::extract_frontmatter;

/// Built-in listing used for index pages
pub const LISTING_TEMPLATE: &str = "__folio/listing";

/// Built-in page shell used when no index layout is configured
pub const SHELL_TEMPLATE: &str = "__folio/shell";

const LISTING_SOURCE: &str = r#"<h1>{{ listing.title | escape }}</h1>
<ul class="post-list">
{% for entry in listing.entries %}  <li><time datetime="{{ entry.date_iso }}">{{ entry.date }}</time> <a href="{{ entry.href }}">{{ entry.title | escape }}</a></li>
{% endfor %}</ul>
"#;

const SHELL_SOURCE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ page.title | escape }} | {{ site.title | escape }}</title>
</head>
<body>
{{ content }}
</body>
</html>
"#;

#[derive(Debug, Default, Deserialize)]
struct LayoutFrontMatter {
    #[serde(default)]
    layout: Option<String>,
}

/// The set of layouts available to a build
#[derive(Debug)]
pub struct LayoutSet {
    tera: Tera,
    /// layout name -> parent layout name
    parents: BTreeMap<String, Option<String>>,
}

impl LayoutSet {
    /// An empty set holding only the built-in templates.
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        let mut set = Self {
            tera,
            parents: BTreeMap::new(),
        };
        for (name, source) in [(LISTING_TEMPLATE, LISTING_SOURCE), (SHELL_TEMPLATE, SHELL_SOURCE)] {
            if let Err(e) = set.tera.add_raw_template(name, source) {
                tracing::error!(template = name, error = %describe(&e), "built-in template failed to parse");
            }
        }
        set
    }

    /// Load every layout file in `dir`. A missing directory yields no layouts.
    pub fn load(dir: &Path) -> FolioResult<Self> {
        let mut set = Self::new();
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "no layouts directory");
            return Ok(set);
        }

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        paths.sort();

        for path in paths {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(true);
            if hidden || !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = fs::read_to_string(&path)?;
            set.add(name, &source)?;
        }

        tracing::debug!(dir = %dir.display(), count = set.parents.len(), "loaded layouts");
        Ok(set)
    }

    /// Add (or replace) a layout from source text.
    pub fn add(&mut self, name: &str, source: &str) -> FolioResult<()> {
        let has_front_matter = source.lines().next().map(|l| l.trim() == "---").unwrap_or(false);
        let (parent, template) = if has_front_matter {
            let extracted = extract_frontmatter(source, Path::new(name))?;
            let fm: LayoutFrontMatter = if extracted.yaml.trim().is_empty() {
                LayoutFrontMatter::default()
            } else {
                serde_yaml_ng::from_str(&extracted.yaml).map_err(|e| FolioError::Template {
                    layout: name.to_string(),
                    document: "layouts".to_string(),
                    message: e.to_string(),
                })?
            };
            (fm.layout, extracted.body)
        } else {
            (None, source.to_string())
        };

        self.tera
            .add_raw_template(name, &template)
            .map_err(|e| FolioError::Template {
                layout: name.to_string(),
                document: "layouts".to_string(),
                message: describe(&e),
            })?;
        self.parents.insert(name.to_string(), parent);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }

    /// Resolve `name` and its ancestors, innermost first.
    pub fn chain(&self, name: &str, document: &str) -> FolioResult<Vec<String>> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = Some(name.to_string());

        while let Some(layout) = current {
            if chain.contains(&layout) {
                chain.push(layout);
                return Err(FolioError::LayoutCycle {
                    document: document.to_string(),
                    chain,
                });
            }
            let parent = self
                .parents
                .get(&layout)
                .ok_or_else(|| FolioError::UndefinedLayout {
                    layout: layout.clone(),
                    document: document.to_string(),
                })?
                .clone();
            chain.push(layout);
            current = parent;
        }

        Ok(chain)
    }

    /// Render `content` through `name` and its ancestors.
    ///
    /// `context` supplies everything except `content`, which is replaced at
    /// each level with the output of the level below.
    pub fn apply(
        &self,
        name: &str,
        content: String,
        context: &Context,
        document: &str,
    ) -> FolioResult<String> {
        let chain = self.chain(name, document)?;
        let mut context = context.clone();
        let mut content = content;
        for layout in &chain {
            context.insert("content", &content);
            content = self.render_template(layout, &context, document)?;
        }
        Ok(content)
    }

    /// Render a single template (built-in or user) without chaining.
    pub fn render_template(
        &self,
        template: &str,
        context: &Context,
        document: &str,
    ) -> FolioResult<String> {
        self.tera
            .render(template, context)
            .map_err(|e| FolioError::Template {
                layout: template.to_string(),
                document: document.to_string(),
                message: describe(&e),
            })
    }
}

impl Default for LayoutSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Tera's top-level message is terse; include the whole source chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
