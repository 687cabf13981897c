use serde::Deserialize;

pub use usage_core::UsageConfigQuery as UsageStatsRequest;

#[derive(Debug, Deserialize, Default)]
pub struct SessionsRequest {
    pub hours_back: Option<u32>,
}
