//! Wire types for the cluster configuration REST API.
//!
//! Property bags, stack configuration items and the `ConfigSource` seam the
//! merge pipeline pulls them through.

mod bag;
mod source;
mod stack;

pub use bag::{ConfigBag, ConfigBagsResponse, PropertiesAttributes, SiteTag};
pub use source::{ConfigSource, SourceError};
pub use stack::{StackConfigItem, StackConfigurationsEntry, StackConfigurationsResponse};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_config_bags_response() {
        let raw = r#"{
            "items": [
                {
                    "type": "hdfs-site",
                    "tag": "version1",
                    "properties": { "dfs.replication": "2" },
                    "properties_attributes": { "final": { "dfs.replication": "true" } }
                },
                { "type": "core-site", "tag": "version1" }
            ]
        }"#;
        let response = ConfigBagsResponse::from_json_str(raw).expect("decode");
        assert_eq!(response.items.len(), 2);

        let hdfs = &response.items[0];
        assert_eq!(hdfs.site, "hdfs-site");
        assert_eq!(hdfs.property("dfs.replication"), Some("2"));
        assert!(hdfs.is_final("dfs.replication"));
        assert!(!hdfs.is_final("dfs.blocksize"));

        let core = &response.items[1];
        assert!(core.properties.is_none());
        assert!(!core.has_properties());
    }

    #[test]
    fn decodes_stack_configurations_response() {
        let raw = r#"{
            "items": [
                {
                    "StackConfigurations": {
                        "service_name": "HDFS",
                        "type": "hdfs-site.xml",
                        "property_name": "dfs.blocksize",
                        "property_value": "134217728",
                        "property_description": "Block size",
                        "property_type": []
                    }
                }
            ]
        }"#;
        let items = StackConfigurationsResponse::from_json_str(raw)
            .expect("decode")
            .into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].service_name, "HDFS");
        assert_eq!(items[0].site_type, "hdfs-site.xml");
        assert_eq!(items[0].property_description.as_deref(), Some("Block size"));
        assert_eq!(items[0].filename, None);
    }

    #[test]
    fn site_tag_query_joins_pairs() {
        let tags = vec![
            SiteTag::new("hdfs-site", "version1"),
            SiteTag::new("core-site", "version2"),
        ];
        assert_eq!(
            SiteTag::query(&tags),
            "(type=hdfs-site&tag=version1)|(type=core-site&tag=version2)"
        );
    }

    #[test]
    fn bag_builder_serializes_final_attributes() {
        let bag = ConfigBag::new("hdfs-site", "version7")
            .with_property("dfs.replication", "3")
            .with_final("dfs.replication");
        let value = serde_json::to_value(&bag).expect("encode");
        assert_eq!(
            value,
            serde_json::json!({
                "type": "hdfs-site",
                "tag": "version7",
                "properties": { "dfs.replication": "3" },
                "properties_attributes": { "final": { "dfs.replication": "true" } }
            })
        );
    }
}
