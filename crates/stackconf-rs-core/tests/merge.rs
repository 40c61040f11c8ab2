//! Merge pipeline integration tests.

mod common;

use common::{hdfs_advanced, hdfs_catalog, hdfs_stored, settings};
use pretty_assertions::assert_eq;
use stackconf_rs_core::{
    AdvancedConfigs, ConfigCatalog, ConfigMerger, DisplayType, GlobalValue, PropertyDefinition,
    PropertyKey, PropertyOrigin, ResolvedProperty, SiteBagBuilder, StoredConfigs, StoredValue,
    TemplateResolver,
};
use std::collections::HashSet;

fn merged() -> Vec<ResolvedProperty> {
    let catalog = hdfs_catalog();
    let settings = settings();
    ConfigMerger::new(&catalog, &settings).merge(&hdfs_stored(), &hdfs_advanced(), &["HDFS"])
}

fn find<'a>(
    resolved: &'a [ResolvedProperty],
    name: &str,
    filename: &str,
) -> &'a ResolvedProperty {
    let key = PropertyKey::new(name, filename);
    resolved
        .iter()
        .find(|property| property.key == key)
        .unwrap_or_else(|| panic!("missing {key}"))
}

/// Stored values override the catalog default.
#[test]
fn stored_replication_wins_over_default() {
    let catalog = ConfigCatalog::builder()
        .property(
            PropertyDefinition::new("dfs.replication", "hdfs-site.xml", "HDFS")
                .with_display_type(DisplayType::Int)
                .with_default("3"),
        )
        .build();
    let settings = settings();
    let stored = StoredConfigs::new(vec![StoredValue::new("dfs.replication", "hdfs-site.xml", "2")]);
    let resolved = ConfigMerger::new(&catalog, &settings).merge(
        &stored,
        &AdvancedConfigs::default(),
        &["HDFS"],
    );
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].value, "2");
    assert_eq!(resolved[0].saved_value.as_deref(), Some("2"));
    assert_eq!(resolved[0].default_value, "3");
    assert_eq!(resolved[0].origin, PropertyOrigin::Catalog);
}

#[test]
fn unknown_stored_property_becomes_user_property() {
    let resolved = merged();
    let custom = find(&resolved, "my.custom.prop", "custom-site.xml");
    assert!(custom.is_user_property);
    assert_eq!(custom.display_type, DisplayType::Advanced);
    assert!(!custom.is_required);
    assert_eq!(custom.category, "Custom custom-site");
    assert_eq!(custom.origin, PropertyOrigin::User);
    assert_eq!(custom.service_name, "HDFS");
}

#[test]
fn stack_declared_stored_property_is_advanced() {
    let resolved = merged();
    let blocksize = find(&resolved, "dfs.blocksize", "hdfs-site.xml");
    assert_eq!(blocksize.origin, PropertyOrigin::Stack);
    assert!(!blocksize.is_user_property);
    assert!(blocksize.is_required);
    assert_eq!(blocksize.category, "Advanced hdfs-site");
    assert_eq!(blocksize.value, "268435456");
    assert_eq!(blocksize.default_value, "134217728");
    assert_eq!(blocksize.description.as_deref(), Some("Block size"));
}

#[test]
fn int_memory_suffix_is_stripped() {
    let resolved = merged();
    let heap = find(&resolved, "namenode_heapsize", "global.xml");
    assert_eq!(heap.value, "2048");
    assert!(heap.memory_suffix);
    assert_eq!(heap.unit.as_deref(), Some("MB"));
}

#[test]
fn master_hosts_are_unquoted() {
    let resolved = merged();
    let host = find(&resolved, "namenode_host", "global.xml");
    assert_eq!(host.value, "c6401.ambari.apache.org");
}

#[test]
fn catalog_only_properties_follow_surfacing_rules() {
    let resolved = merged();
    let log_dir = find(&resolved, "hdfs_log_dir_prefix", "global.xml");
    assert!(!log_dir.is_required_by_agent);
    assert_eq!(log_dir.value, "/var/log/hadoop");
    assert_eq!(log_dir.saved_value, None);
    let mysql = find(&resolved, "hive_existing_mysql_host", "global.xml");
    assert_eq!(mysql.value, "");
    assert!(
        !resolved.iter().any(|p| p.name() == "user_group"),
        "required MISC default without stored value must be dropped"
    );
}

#[test]
fn catalog_metadata_and_stored_flags_combine() {
    let resolved = merged();
    let name_dir = find(&resolved, "dfs.namenode.name.dir", "hdfs-site.xml");
    assert_eq!(name_dir.value, "/data/nn");
    assert!(name_dir.is_final);
    assert!(!name_dir.is_reconfigurable);
    assert!(!name_dir.is_editable);
    assert_eq!(name_dir.category, "NameNode");
    let replication = find(&resolved, "dfs.replication", "hdfs-site.xml");
    assert_eq!(replication.display_name, "Block replication");
    assert_eq!(
        replication.description.as_deref(),
        Some("Default block replication.")
    );
    assert!(replication.is_editable);
}

#[test]
fn output_is_ordered_and_unique() {
    let resolved = merged();
    let names: Vec<&str> = resolved.iter().map(|p| p.name()).collect();
    assert_eq!(
        names,
        vec![
            "dfs.replication",
            "dfs.namenode.name.dir",
            "namenode_heapsize",
            "namenode_host",
            "hdfs_log_dir_prefix",
            "hive_existing_mysql_host",
            "dfs.blocksize",
            "hdfs_user",
            "my.custom.prop",
            "proxyuser_group",
        ]
    );
    let keys: HashSet<_> = resolved.iter().map(|p| p.key.clone()).collect();
    assert_eq!(keys.len(), resolved.len());
}

#[test]
fn merge_is_deterministic() {
    assert_eq!(merged(), merged());
}

#[test]
fn stack_defaults_fill_unset_stack_properties() {
    let catalog = hdfs_catalog();
    let settings = settings();
    let merger = ConfigMerger::new(&catalog, &settings);
    let advanced = hdfs_advanced();
    let mut resolved = merger.merge(&hdfs_stored(), &advanced, &["HDFS"]);
    let before = resolved.len();
    merger.add_stack_defaults(&mut resolved, &advanced, &["HDFS"]);
    assert_eq!(resolved.len(), before + 1);
    let buffer = find(&resolved, "io.file.buffer.size", "core-site.xml");
    assert_eq!(buffer.origin, PropertyOrigin::Stack);
    assert_eq!(buffer.value, "131072");
    assert_eq!(buffer.saved_value, None);
    assert_eq!(buffer.category, "Advanced core-site");
}

#[test]
fn out_of_scope_services_are_excluded() {
    let catalog = hdfs_catalog();
    let settings = settings();
    let resolved = ConfigMerger::new(&catalog, &settings).merge(
        &hdfs_stored(),
        &hdfs_advanced(),
        &["YARN"],
    );
    assert!(resolved.iter().all(|p| p.service_name != "HDFS"));
}

#[test]
fn pending_edits_keep_their_saved_value() {
    let catalog = hdfs_catalog();
    let settings = settings();
    let stored = StoredConfigs::new(vec![
        StoredValue::new("namenode_heapsize", "global.xml", "4096m").with_saved_value("2048m"),
        StoredValue::new("dfs.namenode.name.dir", "hdfs-site.xml", "/data/nn2")
            .with_saved_value("/data/nn"),
    ]);
    let resolved = ConfigMerger::new(&catalog, &settings).merge(
        &stored,
        &AdvancedConfigs::default(),
        &["HDFS"],
    );

    let heap = find(&resolved, "namenode_heapsize", "global.xml");
    assert_eq!(heap.value, "4096");
    assert_eq!(heap.saved_value.as_deref(), Some("2048"));
    assert!(heap.memory_suffix);
    assert!(heap.is_dirty());

    let name_dir = find(&resolved, "dfs.namenode.name.dir", "hdfs-site.xml");
    assert_eq!(name_dir.value, "/data/nn2");
    assert_eq!(name_dir.saved_value.as_deref(), Some("/data/nn"));
    assert!(name_dir.is_dirty());
}

/// Values a mapping derives are recomputed on save, so they never reach
/// the editable list.
#[test]
fn mapped_values_are_held_out_of_the_editable_list() {
    let catalog = hdfs_catalog();
    let settings = settings();
    let stored = StoredConfigs::new(vec![
        StoredValue::new("fs.defaultFS", "core-site.xml", "hdfs://old:8020"),
        StoredValue::new("namenode_host", "global.xml", "c6401"),
    ]);
    let merger = ConfigMerger::new(&catalog, &settings);
    let resolved = merger.merge(&stored, &AdvancedConfigs::default(), &["HDFS"]);

    assert!(!resolved.iter().any(|p| p.name() == "fs.defaultFS"));
    let mapped: Vec<_> = merger.mapped(&stored).into_iter().map(|v| v.name).collect();
    assert_eq!(mapped, vec!["fs.defaultFS".to_string()]);

    let globals = [GlobalValue::new("namenode_host", "c6401")];
    let derived = TemplateResolver::new(&globals).resolve(catalog.mappings());
    let builder = SiteBagBuilder::new("version2");
    let bags = builder.derived(builder.default_bags(&resolved), &derived);
    let core_site = bags
        .iter()
        .find(|bag| bag.site == "core-site")
        .expect("core-site bag");
    assert_eq!(core_site.property("fs.defaultFS"), Some("hdfs://c6401:8020"));
}
