#![allow(dead_code)]

use stackconf_rs_core::{
    AdvancedConfigs, AdvancedProperty, ConfigCatalog, MergeSettings, StoredConfigs,
};
use stackconf_rs_protocol::{ConfigBagsResponse, StackConfigurationsResponse};
use stackconf_rs_test_utils::fixtures::{HDFS_BAGS, HDFS_CATALOG, HDFS_STACK};

pub fn settings() -> MergeSettings {
    MergeSettings::default()
}

pub fn hdfs_catalog() -> ConfigCatalog {
    ConfigCatalog::from_json_str(HDFS_CATALOG, &settings()).expect("catalog")
}

pub fn hdfs_stored() -> StoredConfigs {
    let bags = ConfigBagsResponse::from_json_str(HDFS_BAGS).expect("bags").items;
    StoredConfigs::from_bags(&bags, &settings())
}

pub fn hdfs_advanced() -> AdvancedConfigs {
    let settings = settings();
    let items = StackConfigurationsResponse::from_json_str(HDFS_STACK)
        .expect("stack")
        .into_items();
    AdvancedConfigs::new(
        items
            .into_iter()
            .map(|item| AdvancedProperty::from_item(item, &settings))
            .collect(),
    )
}
