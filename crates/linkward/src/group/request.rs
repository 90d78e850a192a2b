use std::sync::Arc;

use crate::data::Link;
use crate::group::LinkGroup;

/// A link on its way to the validator, with the group it was routed to.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub link: Link,
    /// `retry_attempts + 1`
    pub max_attempts: u32,
    pub group: Arc<LinkGroup>,
}

impl ValidationRequest {
    pub fn new(link: Link, max_attempts: u32, group: Arc<LinkGroup>) -> Self {
        Self {
            link,
            max_attempts,
            group,
        }
    }

    /// Whether every continuation policy of the group still holds.
    pub fn should_continue(&self) -> bool {
        let stats = self.group.stats();
        self.group
            .continuation_policies()
            .iter()
            .all(|policy| policy.apply(stats).is_valid())
    }
}
