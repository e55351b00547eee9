//! Common test utilities for folio CLI tests.
//!
//! `SiteFixture` owns a temporary site source directory and runs the
//! `folio` binary against it.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Layout that wraps a post body
pub const POST_LAYOUT: &str = r#"<!DOCTYPE html>
<html>
<head><title>{{ page.title }} | {{ site.title }}</title></head>
<body>
<article>
<h1>{{ page.title }}</h1>
<time datetime="{{ page.date_iso }}">{{ page.date_display }}</time>
{{ content }}
</article>
</body>
</html>
"#;

/// Dated 2015-02-28 in the `clojure` category, with one highlighted block
pub const CLOJURE_POST: &str = r#"---
layout: post
title: Unit testing in Clojure
categories: [clojure]
tags: [testing, tdd]
---
Tests live next to the code.

{% highlight clojure %}
(deftest small
  (is (< 1 2)))
{% endhighlight %}
"#;

pub const RUST_POST: &str = r#"---
layout: post
title: Ownership
date: 2015-03-10 09:30:00
category: rust
---
Borrow *all* the things.
"#;

/// A temporary site source directory
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    /// Empty source directory
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Source with the post layout and two posts
    pub fn blog() -> Self {
        let site = Self::empty();
        site.write("folio.toml", "[site]\ntitle = \"Test Blog\"\n");
        site.write("_layouts/post.html", POST_LAYOUT);
        site.write("_posts/2015-02-28-unit-testing.md", CLOJURE_POST);
        site.write("_posts/2015-03-10-ownership.md", RUST_POST);
        site.write("css/site.css", "body { margin: 0 }\n");
        site
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.dir.path().join(rel)).unwrap();
    }

    /// Path inside the default output directory
    pub fn out(&self, rel: &str) -> PathBuf {
        self.dir.path().join("_site").join(rel)
    }

    pub fn read_out(&self, rel: &str) -> String {
        let path = self.out(rel);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
    }

    /// Run `folio <args> --source <dir>`
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().unwrap()
    }

    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_folio"));
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("FOLIO_OUTPUT")
            .env_remove("FOLIO_BASE_URL")
            .env_remove("FOLIO_PERMALINK")
            .env_remove("FOLIO_PORT")
            .args(args)
            .arg("--source")
            .arg(self.dir.path());
        cmd
    }
}

/// Parse NDJSON stdout into values
pub fn events(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("not JSON: {l}: {e}")))
        .collect()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
