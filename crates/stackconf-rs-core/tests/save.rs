//! Save path integration tests.

mod common;

use common::{hdfs_advanced, hdfs_catalog, hdfs_stored, settings};
use pretty_assertions::assert_eq;
use stackconf_rs_core::{ConfigMerger, DerivedProperty, SiteBagBuilder};

#[test]
fn default_bags_restore_wire_values() {
    let catalog = hdfs_catalog();
    let settings = settings();
    let resolved =
        ConfigMerger::new(&catalog, &settings).merge(&hdfs_stored(), &hdfs_advanced(), &["HDFS"]);
    let bags = SiteBagBuilder::new("version2").default_bags(&resolved);

    let sites: Vec<&str> = bags.iter().map(|bag| bag.site.as_str()).collect();
    assert_eq!(sites, vec!["custom-site", "global", "hdfs-site"]);
    assert!(bags.iter().all(|bag| bag.tag == "version2"));

    let global = &bags[1];
    assert_eq!(global.property("namenode_heapsize"), Some("2048m"));
    assert_eq!(
        global.property("namenode_host"),
        Some("['c6401.ambari.apache.org']")
    );
    assert_eq!(global.property("hdfs_log_dir_prefix"), None);
    assert_eq!(global.property("hive_existing_mysql_host"), Some(""));

    let hdfs = &bags[2];
    assert_eq!(hdfs.property("dfs.replication"), Some("2"));
    assert!(hdfs.is_final("dfs.namenode.name.dir"));
    assert!(!hdfs.is_final("dfs.replication"));
}

#[test]
fn derived_properties_replace_bag_values() {
    let builder = SiteBagBuilder::new("version3");
    let bags = builder.derived(
        Vec::new(),
        &[
            DerivedProperty {
                name: "fs.defaultFS".to_string(),
                value: "hdfs://nn:8020".to_string(),
                filename: "core-site.xml".to_string(),
            },
            DerivedProperty {
                name: "fs.defaultFS".to_string(),
                value: "hdfs://nn2:8020".to_string(),
                filename: "core-site.xml".to_string(),
            },
        ],
    );
    assert_eq!(bags.len(), 1);
    assert_eq!(bags[0].site, "core-site");
    assert_eq!(bags[0].property("fs.defaultFS"), Some("hdfs://nn2:8020"));
}
