//! Import-graph scanning against real on-disk graphs

use devstack::discovery::SourceScanner;
use devstack::infra::InfraKind;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn entry_without_imports_analyzes_only_itself() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "index.ts", "const a = 1;\nexport default a;\n");

    let result = SourceScanner::new()
        .scan(&dir.path().join("index.ts"))
        .unwrap();

    assert_eq!(result.analyzed_files.len(), 1);
    assert!(result.analyzed_files[0].ends_with("index.ts"));
    assert!(result.primitives.is_empty());
    assert!(result.infrastructure.is_empty());
}

#[test]
fn cyclic_graph_terminates_with_each_file_once() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.ts", "import './b';\n");
    write(dir.path(), "b.ts", "import './c';\n");
    write(dir.path(), "c.ts", "import './a';\n");

    let result = SourceScanner::new().scan(&dir.path().join("a.ts")).unwrap();

    assert_eq!(result.analyzed_files.len(), 3);
    let mut sorted = result.analyzed_files.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 3);
}

#[test]
fn self_import_terminates() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "loop.ts", "import './loop';\ncache('k');\n");

    let result = SourceScanner::new()
        .scan(&dir.path().join("loop.ts"))
        .unwrap();

    assert_eq!(result.analyzed_files.len(), 1);
    assert_eq!(result.primitives.len(), 1);
}

#[test]
fn chain_beyond_depth_bound_is_truncated() {
    let dir = TempDir::new().unwrap();
    // f0 -> f1 -> ... -> f7, bound of 3 keeps f0..=f3
    for i in 0..8 {
        let contents = if i < 7 {
            format!("import './f{}';\n", i + 1)
        } else {
            String::new()
        };
        write(dir.path(), &format!("f{i}.ts"), &contents);
    }

    let result = SourceScanner::with_max_depth(3)
        .scan(&dir.path().join("f0.ts"))
        .unwrap();

    assert_eq!(result.analyzed_files.len(), 4);
    assert!(!result
        .analyzed_files
        .iter()
        .any(|path| path.ends_with("f4.ts")));
}

#[test]
fn every_matching_line_yields_one_primitive() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "jobs.ts",
        "cron('daily', runDaily);\n\
         const x = 1;\n\
         cron('hourly', runHourly);\n\
         cron('weekly', runWeekly);\n",
    );

    let result = SourceScanner::new()
        .scan(&dir.path().join("jobs.ts"))
        .unwrap();

    let crons: Vec<_> = result
        .primitives
        .iter()
        .filter(|p| p.construct == "cron")
        .collect();
    assert_eq!(crons.len(), 3);
    assert_eq!(
        crons.iter().map(|p| p.line).collect::<Vec<_>>(),
        vec![1, 3, 4]
    );
}

#[test]
fn imported_file_constructs_feed_requirements() {
    // Entry imports a file that invokes a cron construct and a cache
    // construct; discovery must report Postgres (durable execution) and
    // Redis, each with the right requested_by
    let dir = TempDir::new().unwrap();
    write(dir.path(), "index.ts", "import './tasks';\n");
    write(
        dir.path(),
        "tasks.ts",
        "cron('nightly', cleanup);\ncache('sessions');\n",
    );

    let result = SourceScanner::new()
        .scan(&dir.path().join("index.ts"))
        .unwrap();

    assert_eq!(result.analyzed_files.len(), 2);

    let postgres = result
        .infrastructure
        .iter()
        .find(|req| req.kind == InfraKind::Postgres)
        .expect("postgres requirement");
    assert!(postgres.requested_by.contains("cron"));
    assert!(postgres
        .reasons
        .iter()
        .any(|reason| reason.contains("run state")));

    let redis = result
        .infrastructure
        .iter()
        .find(|req| req.kind == InfraKind::Redis)
        .expect("redis requirement");
    assert!(redis.requested_by.contains("cache"));
}

#[test]
fn repeated_constructs_deduplicate_in_requirements() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "index.ts",
        "cron('a', x);\ncron('b', y);\nworkflow('w', z);\n",
    );

    let result = SourceScanner::new()
        .scan(&dir.path().join("index.ts"))
        .unwrap();

    // Three primitives, one aggregated Postgres requirement
    assert_eq!(result.primitives.len(), 3);
    assert_eq!(result.infrastructure.len(), 1);
    let req = &result.infrastructure[0];
    assert_eq!(req.kind, InfraKind::Postgres);
    assert_eq!(req.requested_by.len(), 2); // cron, workflow
    assert_eq!(req.reasons.len(), 2); // two distinct documented reasons
}

#[test]
fn package_imports_are_not_followed() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "index.ts",
        "import express from 'express';\nimport { db } from '@scope/db';\nimport './local';\n",
    );
    write(dir.path(), "local.ts", "queue('emails');\n");

    let result = SourceScanner::new()
        .scan(&dir.path().join("index.ts"))
        .unwrap();

    assert_eq!(result.analyzed_files.len(), 2);
    assert_eq!(result.infrastructure.len(), 1);
    assert_eq!(result.infrastructure[0].kind, InfraKind::Redis);
}

#[test]
fn directory_imports_resolve_to_index_files() {
    let dir = TempDir::new().unwrap();
    let routes = dir.path().join("routes");
    fs::create_dir(&routes).unwrap();
    write(dir.path(), "index.ts", "import './routes';\n");
    write(&routes, "index.ts", "api('/users', list);\nauth('jwt');\n");

    let result = SourceScanner::new()
        .scan(&dir.path().join("index.ts"))
        .unwrap();

    assert_eq!(result.analyzed_files.len(), 2);
    let constructs: Vec<&str> = result
        .primitives
        .iter()
        .map(|p| p.construct.as_str())
        .collect();
    assert!(constructs.contains(&"api"));
    assert!(constructs.contains(&"auth"));
    // api implies nothing; auth implies the relational store
    assert_eq!(result.infrastructure.len(), 1);
    assert_eq!(result.infrastructure[0].kind, InfraKind::Postgres);
}

#[test]
fn unreadable_import_is_not_reported_as_analyzed() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "index.ts", "import './blob';\ncron('daily', run);\n");
    // Resolvable target whose contents cannot be read as UTF-8
    fs::write(dir.path().join("blob.ts"), [0xff, 0xfe, 0xfd, 0xfc]).unwrap();

    let result = SourceScanner::new()
        .scan(&dir.path().join("index.ts"))
        .unwrap();

    assert_eq!(result.analyzed_files.len(), 1);
    assert!(result.analyzed_files[0].ends_with("index.ts"));
    assert_eq!(result.primitives.len(), 1);
}

#[test]
fn reported_paths_are_normalized() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "index.ts", "import './tasks';\n");
    write(dir.path(), "tasks.ts", "queue('emails');\n");

    let result = SourceScanner::new()
        .scan(&dir.path().join("index.ts"))
        .unwrap();

    // Import targets are reported in the same canonical spelling as the
    // entrypoint, with no lingering './' segments
    assert_eq!(result.analyzed_files[0], result.entrypoint);
    assert!(result.analyzed_files.iter().all(|path| !path.contains("/./")));
    assert!(result.primitives[0].file.ends_with("tasks.ts"));
    assert!(!result.primitives[0].file.contains("/./"));
}

#[test]
fn discovery_order_is_depth_first_and_deterministic() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "entry.ts", "import './left';\nimport './right';\n");
    write(dir.path(), "left.ts", "import './leaf';\n");
    write(dir.path(), "right.ts", "");
    write(dir.path(), "leaf.ts", "");

    let result = SourceScanner::new()
        .scan(&dir.path().join("entry.ts"))
        .unwrap();

    let names: Vec<&str> = result
        .analyzed_files
        .iter()
        .map(|path| Path::new(path).file_name().unwrap().to_str().unwrap())
        .collect();
    // left's subtree is fully visited before right
    assert_eq!(names, vec!["entry.ts", "left.ts", "leaf.ts", "right.ts"]);
}
