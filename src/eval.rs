use chrono::Utc;

use crate::{
    client::DynamicConfig,
    events::{ExposureEvent, ExposureMetadata, EXPOSURE_EVENT_NAME},
    sharder::Sharder,
    specs::{ConfigSpecs, Experiment, Group, TryParse},
    Error, Result, User,
};

/// Rule ID reported when an experiment is switched off.
pub const DISABLED_RULE_ID: &str = "disabled";
/// Rule ID reported when the user lands outside every group.
pub const DEFAULT_RULE_ID: &str = "default";

impl ConfigSpecs {
    pub fn eval_experiment(
        &self,
        experiment_name: &str,
        user: &User,
        sharder: &impl Sharder,
    ) -> Result<(DynamicConfig, Option<ExposureEvent>)> {
        let experiment = self
            .experiments
            .get(experiment_name)
            .ok_or(Error::ExperimentNotFound)?;

        match experiment {
            TryParse::Parsed(experiment) => Ok(experiment.eval(user, sharder)),
            TryParse::ParseFailed(_) => Err(Error::ConfigurationParseError),
        }
    }
}

impl Experiment {
    pub fn eval(&self, user: &User, sharder: &impl Sharder) -> (DynamicConfig, Option<ExposureEvent>) {
        if !self.enabled {
            return (self.default_config(DISABLED_RULE_ID), None);
        }

        let Some(group) = self.get_matching_group(&user.user_id, sharder) else {
            return (self.default_config(DEFAULT_RULE_ID), None);
        };

        let config = DynamicConfig {
            name: self.name.clone(),
            value: group.value.clone(),
            rule_id: group.name.clone(),
            group_name: Some(group.name.clone()),
        };

        let event = ExposureEvent {
            event_name: EXPOSURE_EVENT_NAME.to_owned(),
            user: user.clone(),
            time: Utc::now().timestamp_millis(),
            metadata: ExposureMetadata {
                config: self.name.clone(),
                rule_id: group.name.clone(),
                group: group.name.clone(),
            },
        };

        (config, Some(event))
    }

    /// Find the group `user_id` falls into.
    ///
    /// A user matches a group when its shard lies in any of the group's ranges. Groups are checked
    /// in order, so the first match wins if ranges overlap.
    pub fn get_matching_group(&self, user_id: &str, sharder: &impl Sharder) -> Option<&Group> {
        if self.total_shards == 0 {
            return None;
        }
        let shard = sharder.get_shard(format!("{}-{}", self.salt, user_id), self.total_shards);
        self.groups
            .iter()
            .find(|group| group.ranges.iter().any(|range| range.contains(shard)))
    }

    fn default_config(&self, rule_id: &str) -> DynamicConfig {
        DynamicConfig {
            name: self.name.clone(),
            value: self.default_value.clone(),
            rule_id: rule_id.to_owned(),
            group_name: None,
        }
    }
}
