//! End-to-end: resolve and deploy a local-path dependency via the binary.

use assert_cmd::Command;
use std::fs;

#[test]
fn installs_a_local_path_dependency() {
    let project = tempfile::tempdir().unwrap();
    let widget = project.path().join("widget");
    fs::create_dir_all(&widget).unwrap();
    fs::write(widget.join("gitsu.json"), r#"{"name":"widget","version":"1.0.0"}"#).unwrap();
    fs::write(widget.join("index.js"), "module.exports = {}").unwrap();

    fs::write(
        project.path().join("gitsu.json"),
        r#"{"name":"app","dependencies":{"widget":"./widget#*"}}"#,
    )
    .unwrap();

    Command::cargo_bin("gitsu")
        .unwrap()
        .arg("--cwd")
        .arg(project.path())
        .arg("--no-interaction")
        .arg("install")
        .assert()
        .success();

    let deployed = project.path().join("gitsu_components").join("widget").join("index.js");
    assert!(deployed.exists());
}
