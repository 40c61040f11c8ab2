//! HDFS fixtures in wire and catalog JSON form.

use stackconf_rs_protocol::{ConfigBag, StackConfigItem};

/// Catalog document for a small HDFS stack.
pub const HDFS_CATALOG: &str = r#"{
    "services": [
        {
            "service_name": "HDFS",
            "display_name": "HDFS",
            "categories": [
                { "name": "NameNode", "site_file_names": ["hdfs-site.xml"] },
                { "name": "General", "site_file_names": ["global.xml", "core-site.xml"] }
            ]
        },
        { "service_name": "MISC", "categories": [] }
    ],
    "properties": [
        {
            "name": "dfs.replication",
            "display_name": "Block replication",
            "service_name": "HDFS",
            "filename": "hdfs-site",
            "display_type": "int",
            "default_value": "3"
        },
        {
            "name": "dfs.namenode.name.dir",
            "service_name": "HDFS",
            "filename": "hdfs-site",
            "display_type": "directories",
            "default_value": "/hadoop/hdfs/namenode",
            "is_reconfigurable": false
        },
        {
            "name": "namenode_heapsize",
            "service_name": "HDFS",
            "filename": "global",
            "display_type": "int",
            "default_value": "1024m",
            "unit": "MB"
        },
        {
            "name": "namenode_host",
            "service_name": "HDFS",
            "filename": "global",
            "display_type": "masterHosts",
            "default_value": ""
        },
        {
            "name": "hdfs_log_dir_prefix",
            "service_name": "HDFS",
            "filename": "global",
            "display_type": "directory",
            "default_value": "/var/log/hadoop",
            "is_required_by_agent": false
        },
        {
            "name": "hive_existing_mysql_host",
            "service_name": "HDFS",
            "filename": "global",
            "display_type": "host",
            "default_value": ""
        },
        {
            "name": "user_group",
            "service_name": "MISC",
            "filename": "global",
            "default_value": "hadoop"
        }
    ],
    "mappings": [
        {
            "name": "dfs.namenode.http-address",
            "template_name": ["namenode_host"],
            "value": "<templateName[0]>:50070",
            "filename": "hdfs-site"
        },
        {
            "name": "fs.defaultFS",
            "template_name": ["namenode_host"],
            "value": "hdfs://<templateName[0]>:8020",
            "filename": "core-site"
        },
        {
            "name": "dfs.namenode.https-address",
            "template_name": ["secure_namenode_host"],
            "value": "<templateName[0]>:50470",
            "filename": "hdfs-site"
        },
        {
            "name": "hadoop.proxyuser.<foreignKey[0]>.groups",
            "template_name": ["proxyuser_group"],
            "foreign_key": ["hdfs_user"],
            "value": "<templateName[0]>",
            "filename": "core-site"
        },
        {
            "name": "dfs.namenode.secondary.http-address",
            "template_name": [],
            "foreign_key": ["dfs.namenode.http-address"],
            "value": "<foreignKey[0]>",
            "filename": "hdfs-site"
        }
    ]
}"#;

/// Stack configurations response for HDFS.
pub const HDFS_STACK: &str = r#"{
    "items": [
        { "StackConfigurations": {
            "service_name": "HDFS", "type": "hdfs-site.xml",
            "property_name": "dfs.blocksize", "property_value": "134217728",
            "property_description": "Block size", "property_type": []
        } },
        { "StackConfigurations": {
            "service_name": "HDFS", "type": "hdfs-site.xml",
            "property_name": "dfs.replication", "property_value": "3",
            "property_description": "Default block replication.", "property_type": []
        } },
        { "StackConfigurations": {
            "service_name": "HDFS", "type": "core-site.xml",
            "property_name": "io.file.buffer.size", "property_value": "131072",
            "property_type": []
        } }
    ]
}"#;

/// Stored HDFS bags at `version1`.
pub const HDFS_BAGS: &str = r#"{
    "items": [
        {
            "type": "hdfs-site", "tag": "version1",
            "properties": {
                "dfs.replication": "2",
                "dfs.namenode.name.dir": "/data/nn",
                "dfs.blocksize": "268435456"
            },
            "properties_attributes": { "final": { "dfs.namenode.name.dir": "true" } }
        },
        {
            "type": "global", "tag": "version1",
            "properties": {
                "namenode_heapsize": "2048m",
                "namenode_host": "['c6401.ambari.apache.org']",
                "hdfs_user": "hdfs",
                "proxyuser_group": "users"
            }
        },
        {
            "type": "custom-site", "tag": "version1",
            "properties": { "my.custom.prop": "foo" }
        },
        { "type": "core-site", "tag": "version1" }
    ]
}"#;

/// Stack item with the given coordinates.
pub fn stack_item(service: &str, site: &str, name: &str, value: &str) -> StackConfigItem {
    StackConfigItem {
        service_name: service.to_string(),
        site_type: site.to_string(),
        property_name: name.to_string(),
        property_value: value.to_string(),
        property_description: None,
        property_type: Vec::new(),
        filename: None,
    }
}

/// Override bag for a group: one site, one tag, the given values.
pub fn override_bag(site: &str, tag: &str, values: &[(&str, &str)]) -> ConfigBag {
    values
        .iter()
        .fold(ConfigBag::new(site, tag), |bag, (name, value)| {
            bag.with_property(*name, *value)
        })
}
