//! Unit tests for ccgen-core

use crate::test_utils::create_repo_with_structure;
use crate::*;
use std::collections::HashSet;

#[test]
fn test_group_id_strips_extension_and_case_folds() {
    let header = SourceFile::from("lib/Foo.h");
    let source = SourceFile::from("lib/foo.cc");

    assert_eq!(header.group_id(), GroupId::from("lib/foo"));
    assert_eq!(header.group_id(), source.group_id());
    assert_eq!(header.base_name(), "Foo");
    assert_eq!(header.extension(), ".h");
}

#[test]
fn test_source_file_classification() {
    let cases = vec![
        ("a.h", true, true),
        ("a.HPP", true, true),
        ("a.cc", false, true),
        ("a.c++", false, true),
        ("asm.S", false, true),
        ("notes.txt", false, false),
        ("Makefile", false, false),
    ];

    for (name, header, cc) in cases {
        let file = SourceFile::from(name);
        assert_eq!(file.is_header(), header, "header check failed for {}", name);
        assert_eq!(file.is_cc_file(), cc, "cc check failed for {}", name);
    }
}

#[test]
fn test_source_file_join_and_relative() {
    let file = SourceFile::new("pkg/sub", "../x.h");
    assert_eq!(file.as_str(), "pkg/x.h");
    assert_eq!(file.dir(), "pkg");
    assert_eq!(file.relative_to("pkg"), "x.h");
    assert_eq!(file.relative_to("other"), "pkg/x.h");
}

#[test]
fn test_partition_sources() {
    let files: Vec<SourceFile> =
        ["a.cc", "a.h", "b.c", "b.hh"].into_iter().map(SourceFile::from).collect();
    let (srcs, hdrs) = partition_sources(&files);

    assert_eq!(srcs, vec![SourceFile::from("a.cc"), SourceFile::from("b.c")]);
    assert_eq!(hdrs, vec![SourceFile::from("a.h"), SourceFile::from("b.hh")]);
}

#[test]
fn test_concat_unique_keeps_first_occurrence() {
    let merged = concat_unique(&["b", "a"], &["a", "c", "b"]);
    assert_eq!(merged, vec!["b", "a", "c"]);
}

#[test]
fn test_label_parse_and_render() {
    let cases = vec![
        ("//pkg:lib", "", "pkg", "lib", "//pkg:lib"),
        ("@zlib//:zlib", "zlib", "", "zlib", "@zlib//:zlib"),
        ("@@fmt//include/fmt:fmt", "fmt", "include/fmt", "fmt", "@fmt//include/fmt"),
        ("//third_party/json", "", "third_party/json", "json", "//third_party/json"),
        ("@abseil", "abseil", "", "abseil", "@abseil//:abseil"),
    ];

    for (input, repo, pkg, name, rendered) in cases {
        let label = Label::parse(input).unwrap();
        assert_eq!(label.repo, repo, "repo of {}", input);
        assert_eq!(label.pkg, pkg, "pkg of {}", input);
        assert_eq!(label.name, name, "name of {}", input);
        assert_eq!(label.to_string(), rendered, "rendering of {}", input);
    }
}

#[test]
fn test_relative_label() {
    let label = Label::parse(":mylib").unwrap();
    assert!(label.relative);
    assert_eq!(label.to_string(), ":mylib");
}

#[test]
fn test_invalid_labels() {
    for input in ["", "pkg:lib", "//pkg:", "//a b:c", ":a:b", "//pkg/:x"] {
        assert!(Label::parse(input).is_err(), "{:?} should not parse", input);
    }
}

#[test]
fn test_label_serialization() {
    let label = Label::new("", "pkg", "lib");
    let json = serde_json::to_string(&label).unwrap();
    assert_eq!(json, "\"//pkg:lib\"");

    let deserialized: Label = serde_json::from_str(&json).unwrap();
    assert_eq!(label, deserialized);
}

#[test]
fn test_label_ordering_and_hashing() {
    let mut labels = vec![Label::new("", "pkg2", "lib2"), Label::new("", "pkg1", "lib1")];
    labels.sort();
    assert_eq!(labels[0].to_string(), "//pkg1:lib1");

    let set: HashSet<Label> = labels.into_iter().collect();
    assert!(set.contains(&Label::new("", "pkg2", "lib2")));
}

#[test]
fn test_dependency_graph_ignores_unknown_groups() {
    let mut graph = DependencyGraph::new();
    graph.add_source(SourceFile::from("a.h"));
    graph.add_source(SourceFile::from("a.cc"));
    graph.add_source(SourceFile::from("b.h"));

    assert_eq!(graph.node_count(), 2);
    assert!(graph.add_dependency(&GroupId::from("b"), SourceFile::from("a.h")));
    assert!(!graph.add_dependency(&GroupId::from("b"), SourceFile::from("missing.h")));
    // Same dependency twice is a single edge.
    assert!(graph.add_dependency(&GroupId::from("b"), SourceFile::from("a.h")));
    assert_eq!(graph.edge_count(), 1);

    let node = graph.node(&GroupId::from("a")).unwrap();
    assert_eq!(node.sources.len(), 2);
    assert_eq!(
        graph.dependencies_of(&GroupId::from("b")).into_iter().collect::<Vec<_>>(),
        vec![GroupId::from("a")]
    );
}

#[test]
fn test_strongly_connected_components_are_sorted() {
    let mut graph = DependencyGraph::new();
    for name in ["r.h", "q.h", "p.h", "s.h"] {
        graph.add_source(SourceFile::from(name));
    }
    graph.add_dependency(&GroupId::from("p"), SourceFile::from("q.h"));
    graph.add_dependency(&GroupId::from("q"), SourceFile::from("r.h"));
    graph.add_dependency(&GroupId::from("r"), SourceFile::from("p.h"));

    let sccs = graph.strongly_connected_components();
    assert_eq!(
        sccs,
        vec![
            vec![GroupId::from("p"), GroupId::from("q"), GroupId::from("r")],
            vec![GroupId::from("s")],
        ]
    );
}

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.generate.grouping, GroupingMode::Directory);
    assert_eq!(config.generate.cycles, CycleMode::Merge);
    assert!(config.index.exclude_internal);
}

#[test]
fn test_config_from_toml() {
    let text = r#"
[generate]
grouping = "unit"
cycles = "warn"
exclude = ["third_party/**"]

[index]
exclude_internal = false
"#;
    let config = Config::from_toml(text, std::path::Path::new("inline")).unwrap();
    assert_eq!(config.generate.grouping, GroupingMode::Unit);
    assert_eq!(config.generate.cycles, CycleMode::Warn);
    assert!(!config.index.exclude_internal);

    let matcher = config.exclude_matcher().unwrap();
    assert!(matcher.is_match("third_party/zlib/zlib.h"));
    assert!(!matcher.is_match("src/main.cc"));
}

#[test]
fn test_config_search_paths() {
    let text = r#"
[[generate.search]]
strip_include_prefix = "include"

[[generate.search]]
strip_include_prefix = "vendor"
include_prefix = "third_party"
"#;
    let config = Config::from_toml(text, std::path::Path::new("inline")).unwrap();
    assert_eq!(
        config.generate.search,
        vec![SearchPath::new("include", ""), SearchPath::new("vendor", "third_party")]
    );
    assert!(Config::default().generate.search.is_empty());
}

#[test]
fn test_search_path_apply() {
    let root = SearchPath::default();
    assert_eq!(root.apply("a/b.h").as_deref(), Some("a/b.h"));

    let stripped = SearchPath::new("include", "");
    assert_eq!(stripped.apply("include/fmt/core.h").as_deref(), Some("fmt/core.h"));
    assert_eq!(stripped.apply("fmt/core.h"), None);
    assert_eq!(stripped.apply("includes/core.h"), None);
    assert_eq!(stripped.apply("include"), None);

    let moved = SearchPath::new("", "third_party/zlib");
    assert_eq!(moved.apply("zlib.h").as_deref(), Some("third_party/zlib/zlib.h"));

    let both = SearchPath::new("vendor", "third_party");
    assert_eq!(both.apply("vendor/png/png.h").as_deref(), Some("third_party/png/png.h"));
}

#[test]
fn test_config_rejects_bad_search_paths() {
    for (text, bad) in [
        ("[[generate.search]]\nstrip_include_prefix = \"/abs\"\n", "/abs"),
        ("[[generate.search]]\ninclude_prefix = \"a/../b\"\n", "a/../b"),
        ("[[generate.search]]\nstrip_include_prefix = \"a/\"\n", "a/"),
    ] {
        let err = Config::from_toml(text, std::path::Path::new("inline")).unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidSearchPath { ref path, .. } if path == bad),
            "{text}: {err}"
        );
    }
}

#[test]
fn test_config_rejects_unknown_mode() {
    let text = "[generate]\ncycles = \"ignore\"\n";
    let err = Config::from_toml(text, std::path::Path::new("inline")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParse { .. }));
}

#[test]
fn test_config_load_or_default() {
    let repo = create_repo_with_structure(&[(CONFIG_FILE, "[generate]\ngrouping = \"unit\"\n")]);
    let config = Config::load_or_default(repo.path()).unwrap();
    assert_eq!(config.generate.grouping, GroupingMode::Unit);

    let empty = create_repo_with_structure(&[]);
    assert_eq!(Config::load_or_default(empty.path()).unwrap(), Config::default());
}
