//! End-to-end CLI coverage via `assert_cmd`, in the style pulled in from
//! the `VOID-TECHNOLOGY-INC-PyBun` example (`njsmith-posy` itself ships no
//! `tests/` directory to imitate here).
use assert_cmd::Command;
use pincalc::cache::{Cache, FsCache};
use pincalc::prelude::*;
use predicates::prelude::*;

fn bin() -> Command {
    Command::cargo_bin("pincalc").unwrap()
}

#[test]
fn help_lists_both_subcommands() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("calc"))
        .stdout(predicate::str::contains("get"));
}

#[test]
fn get_on_empty_cache_reports_nothing_cached() {
    let cache_dir = tempfile::TempDir::new().unwrap();
    bin()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("get")
        .arg("nonexistent-package")
        .assert()
        .success()
        .stdout(predicate::str::contains("no cached metadata"));
}

#[test]
fn get_prints_seeded_record_as_json() {
    let cache_dir = tempfile::TempDir::new().unwrap();
    let cache = FsCache::new(cache_dir.path()).unwrap();
    cache
        .set(&MetadataRecord::new(
            "widget",
            "1.2.3".try_into().unwrap(),
            vec![],
            vec![],
            vec![],
            BTreeMap::new(),
        ))
        .unwrap();

    bin()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("get")
        .arg("widget")
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.3"));
}

#[test]
fn get_with_explicit_version_filters_to_that_record() {
    let cache_dir = tempfile::TempDir::new().unwrap();
    let cache = FsCache::new(cache_dir.path()).unwrap();
    cache
        .set(&MetadataRecord::new("widget", "1.0".try_into().unwrap(), vec![], vec![], vec![], BTreeMap::new()))
        .unwrap();
    cache
        .set(&MetadataRecord::new("widget", "2.0".try_into().unwrap(), vec![], vec![], vec![], BTreeMap::new()))
        .unwrap();

    bin()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("get")
        .arg("widget")
        .arg("1.0")
        .assert()
        .success()
        .stdout(predicate::str::contains("1.0"))
        .stdout(predicate::str::contains("2.0").not());
}

#[test]
fn calc_fails_loudly_when_the_virtualenv_command_does_not_exist() {
    let cache_dir = tempfile::TempDir::new().unwrap();
    let project_dir = tempfile::TempDir::new().unwrap();

    bin()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("calc")
        .arg(project_dir.path())
        .arg("--virtualenv")
        .arg("definitely-not-a-real-virtualenv-binary")
        .assert()
        .failure();
}

#[test]
fn calc_requires_at_least_one_project_path() {
    let cache_dir = tempfile::TempDir::new().unwrap();
    bin()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("calc")
        .assert()
        .failure();
}
