//! Integration tests for `folio clean`.

mod common;

use common::*;

#[test]
fn clean_removes_built_site() {
    let site = SiteFixture::blog();
    assert!(site.run(&["build"]).status.success());
    assert!(site.out("index.html").is_file());

    let output = site.run(&["clean"]);
    assert!(output.status.success(), "{}", stderr(&output));

    assert!(!site.out("index.html").exists());
    assert!(!site.out(".folio-manifest.toml").exists());
    assert!(!site.path().join("_site").exists());
}

#[test]
fn clean_keeps_files_it_did_not_write() {
    let site = SiteFixture::blog();
    assert!(site.run(&["build"]).status.success());
    site.write("_site/CNAME", "blog.example.com\n");

    let output = site.run(&["clean", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));

    assert!(site.out("CNAME").is_file());
    assert!(!site.out("css/site.css").exists());

    let complete = events(&output).pop().unwrap();
    assert_eq!(complete["event"], "complete");
    assert!(complete["removed"].as_u64().unwrap() > 0);
}

#[test]
fn clean_before_any_build_succeeds() {
    let site = SiteFixture::blog();
    let output = site.run(&["clean"]);
    assert!(output.status.success(), "{}", stderr(&output));
}
