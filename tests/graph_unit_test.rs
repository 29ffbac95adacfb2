//! Unit tests for FK dependency graph construction.

use db_subsetter::graph::cyclic_tables;
use db_subsetter::{Dependency, DependencyGraph, DependencyOptions, MemorySource, SubsetError};

#[test]
fn null_columns_registers_a_bare_node() {
    let graph = DependencyGraph::build(&[Dependency::table("public", "settings")]).unwrap();

    assert_eq!(graph.len(), 1);
    assert!(graph.contains("public.settings"));
    assert!(graph.edges_from("public.settings").is_empty());
}

#[test]
fn edge_carries_the_column_mapping() {
    let graph = DependencyGraph::build(&[Dependency::foreign_key(
        "public",
        "posts",
        &["poster_id"],
        "users",
        &["id"],
    )])
    .unwrap();

    let edges = graph.edges_from("public.posts");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source_columns, vec!["poster_id"]);
    assert_eq!(edges[0].referenced_table, "public.users");
    assert_eq!(edges[0].referenced_columns, vec!["id"]);
}

#[test]
fn referenced_table_becomes_a_node() {
    let graph = DependencyGraph::build(&[Dependency::foreign_key(
        "public",
        "posts",
        &["poster_id"],
        "users",
        &["id"],
    )])
    .unwrap();

    assert!(graph.contains("public.users"));
    assert!(graph.edges_from("public.users").is_empty());
}

#[test]
fn multiple_edges_between_the_same_pair_stay_distinct() {
    let graph = DependencyGraph::build(&[
        Dependency::foreign_key("public", "messages", &["sender_id"], "users", &["id"]),
        Dependency::foreign_key("public", "messages", &["recipient_id"], "users", &["id"]),
    ])
    .unwrap();

    let edges = graph.edges_from("public.messages");
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].source_columns, vec!["sender_id"]);
    assert_eq!(edges[1].source_columns, vec!["recipient_id"]);
}

#[test]
fn self_referential_edge_is_preserved() {
    let graph = DependencyGraph::build(&[Dependency::foreign_key(
        "public",
        "categories",
        &["parent_id"],
        "categories",
        &["id"],
    )])
    .unwrap();

    assert!(graph.has_self_reference("public.categories"));
    assert_eq!(
        graph.edges_from("public.categories")[0].referenced_table,
        "public.categories"
    );
}

#[test]
fn composite_key_columns_map_positionally() {
    let graph = DependencyGraph::build(&[Dependency::foreign_key(
        "sales",
        "order_items",
        &["order_id", "line_no"],
        "orders",
        &["id", "line_no"],
    )])
    .unwrap();

    let edge = &graph.edges_from("sales.order_items")[0];
    assert_eq!(edge.source_columns, vec!["order_id", "line_no"]);
    assert_eq!(edge.referenced_columns, vec!["id", "line_no"]);
}

#[test]
fn column_count_mismatch_aborts_the_build() {
    let result = DependencyGraph::build(&[
        Dependency::table("public", "users"),
        Dependency::foreign_key("public", "posts", &["a", "b"], "users", &["id"]),
    ]);

    assert!(matches!(
        result,
        Err(SubsetError::MalformedDependency {
            source_columns: 2,
            referenced_columns: 1,
            ..
        })
    ));
}

#[test]
fn missing_referenced_columns_counts_as_mismatch() {
    let mut dep = Dependency::foreign_key("public", "posts", &["poster_id"], "users", &["id"]);
    dep.referenced_columns = None;

    assert!(matches!(
        DependencyGraph::build(&[dep]),
        Err(SubsetError::MalformedDependency { .. })
    ));
}

#[test]
fn columns_without_referenced_table_registers_node_only() {
    let mut dep = Dependency::table("public", "drafts");
    dep.columns = Some(vec!["author_id".to_string()]);

    let graph = DependencyGraph::build(&[dep]).unwrap();
    assert!(graph.contains("public.drafts"));
    assert!(graph.edges_from("public.drafts").is_empty());
}

#[test]
fn referenced_schema_defaults_to_source_schema() {
    let same = Dependency::foreign_key("app", "posts", &["poster_id"], "users", &["id"]);
    assert_eq!(same.qualified_referenced().unwrap(), "app.users");

    let cross = Dependency::foreign_key("app", "posts", &["poster_id"], "users", &["id"])
        .with_referenced_schema("auth");
    assert_eq!(cross.qualified_referenced().unwrap(), "auth.users");
}

#[test]
fn table_names_are_compared_exactly() {
    let graph = DependencyGraph::build(&[
        Dependency::table("public", "Users"),
        Dependency::table("public", "users"),
    ])
    .unwrap();

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.sorted_tables(), vec!["public.Users", "public.users"]);
}

#[test]
fn from_source_honors_excluded_schemas() {
    let source = MemorySource::new()
        .with_dependency(Dependency::table("public", "users"))
        .with_dependency(Dependency::table("audit", "events"))
        .with_dependency(Dependency::foreign_key(
            "audit",
            "events",
            &["user_id"],
            "users",
            &["id"],
        ));

    let graph =
        DependencyGraph::from_source(&source, &DependencyOptions::excluding(["audit"])).unwrap();

    assert!(graph.contains("public.users"));
    assert!(!graph.contains("audit.events"));
}

#[test]
fn cycle_detection_spans_builder_output() {
    let graph = DependencyGraph::build(&[
        Dependency::foreign_key("s", "a", &["b_id"], "b", &["id"]),
        Dependency::foreign_key("s", "b", &["a_id"], "a", &["id"]),
        Dependency::foreign_key("s", "logs", &["a_id"], "a", &["id"]),
    ])
    .unwrap();

    assert_eq!(cyclic_tables(&graph), vec!["s.a", "s.b"]);
}
