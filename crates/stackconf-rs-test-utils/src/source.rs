use async_trait::async_trait;
use parking_lot::Mutex;
use stackconf_rs_protocol::{
    ConfigBag, ConfigBagsResponse, ConfigSource, SiteTag, SourceError, StackConfigItem,
    StackConfigurationsResponse,
};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory source answering from fixed stack items and bags.
#[derive(Clone, Default)]
pub struct StaticConfigSource {
    stack: HashMap<String, Vec<StackConfigItem>>,
    bags: Vec<ConfigBag>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stack configurations response and a bags response.
    pub fn from_json(stack: &str, bags: &str) -> Result<Self, serde_json::Error> {
        let mut source = Self::new();
        for item in StackConfigurationsResponse::from_json_str(stack)?.into_items() {
            source
                .stack
                .entry(item.service_name.clone())
                .or_default()
                .push(item);
        }
        source.bags = ConfigBagsResponse::from_json_str(bags)?.items;
        Ok(source)
    }

    pub fn with_stack_item(mut self, item: StackConfigItem) -> Self {
        self.stack
            .entry(item.service_name.clone())
            .or_default()
            .push(item);
        self
    }

    pub fn with_bag(mut self, bag: ConfigBag) -> Self {
        self.bags.push(bag);
        self
    }

    /// Calls seen so far, e.g. `advanced_configs:HDFS`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ConfigSource for StaticConfigSource {
    async fn advanced_configs(
        &self,
        service_name: &str,
    ) -> Result<Vec<StackConfigItem>, SourceError> {
        self.record(format!("advanced_configs:{service_name}"));
        Ok(self.stack.get(service_name).cloned().unwrap_or_default())
    }

    async fn config_bags(&self, tags: &[SiteTag]) -> Result<Vec<ConfigBag>, SourceError> {
        self.record(format!("config_bags:{}", SiteTag::query(tags)));
        Ok(self
            .bags
            .iter()
            .filter(|bag| tags.contains(&bag.site_tag()))
            .cloned()
            .collect())
    }
}

/// Source whose every call fails with a transport error.
#[derive(Clone, Debug)]
pub struct FailingConfigSource {
    message: String,
}

impl FailingConfigSource {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ConfigSource for FailingConfigSource {
    async fn advanced_configs(
        &self,
        _service_name: &str,
    ) -> Result<Vec<StackConfigItem>, SourceError> {
        Err(SourceError::Transport(self.message.clone()))
    }

    async fn config_bags(&self, _tags: &[SiteTag]) -> Result<Vec<ConfigBag>, SourceError> {
        Err(SourceError::Transport(self.message.clone()))
    }
}
