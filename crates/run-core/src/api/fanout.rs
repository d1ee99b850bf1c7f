//! Region fan-out: run one listing per region and merge the results.
//!
//! A concrete region selector calls the per-region lister once and hands
//! its result back untouched. The all-regions selector spawns one task per
//! known region, collects every outcome in a single loop and never fails
//! as a whole because some regions did.

use crate::api::region::{self, ALL_REGIONS};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Either one region or every known region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegionSelector {
    Region(String),
    AllRegions,
}

impl RegionSelector {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value == ALL_REGIONS || value.eq_ignore_ascii_case("all") {
            return Ok(RegionSelector::AllRegions);
        }
        let well_formed = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !well_formed {
            return Err(ValidationError::InvalidRegion {
                region: value.to_string(),
            });
        }
        if !region::is_known(value) {
            log::debug!("Region '{}' is not in the known region list", value);
        }
        Ok(RegionSelector::Region(value.to_string()))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RegionSelector::AllRegions)
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegionSelector::Region(region) => region,
            RegionSelector::AllRegions => ALL_REGIONS,
        }
    }
}

impl FromStr for RegionSelector {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RegionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with regions that failed during an all-regions listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionErrorPolicy {
    /// Drop failed regions without a trace.
    Ignore,
    /// Drop failed regions and log them.
    #[default]
    Warn,
    /// Fail the whole listing with the first region error.
    Fail,
}

impl FromStr for RegionErrorPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(RegionErrorPolicy::Ignore),
            "warn" => Ok(RegionErrorPolicy::Warn),
            "fail" => Ok(RegionErrorPolicy::Fail),
            _ => Err(ValidationError::InvalidRegionPolicy {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RegionErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionErrorPolicy::Ignore => "ignore",
            RegionErrorPolicy::Warn => "warn",
            RegionErrorPolicy::Fail => "fail",
        };
        f.write_str(name)
    }
}

/// Why a region contributed nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionError<E> {
    Failed(E),
    TimedOut,
    Aborted(String),
}

impl<E: fmt::Display> fmt::Display for RegionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::Failed(err) => write!(f, "{}", err),
            RegionError::TimedOut => f.write_str("timed out"),
            RegionError::Aborted(reason) => write!(f, "aborted: {}", reason),
        }
    }
}

/// Result of one region's listing attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOutcome<T, E> {
    pub region: String,
    pub items: Vec<T>,
    pub error: Option<RegionError<E>>,
}

impl<T, E> RegionOutcome<T, E> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Every region outcome of one fan-out, in completion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutReport<T, E> {
    pub outcomes: Vec<RegionOutcome<T, E>>,
}

impl<T, E> FanoutReport<T, E> {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &RegionError<E>)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| (o.region.as_str(), e)))
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Items of every successful region; failed regions are dropped.
    pub fn into_items(self) -> Vec<T> {
        self.outcomes
            .into_iter()
            .filter(|o| o.error.is_none())
            .flat_map(|o| o.items)
            .collect()
    }

    /// Split into the merged items and the failed regions.
    pub fn into_parts(self) -> (Vec<T>, Vec<(String, RegionError<E>)>) {
        let mut items = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome.error {
                None => items.extend(outcome.items),
                Some(err) => failures.push((outcome.region, err)),
            }
        }
        (items, failures)
    }
}

/// The set of regions an all-regions selector expands to, plus an
/// optional deadline for the whole fan-out.
#[derive(Debug, Clone)]
pub struct Fanout {
    regions: Vec<String>,
    deadline: Option<Duration>,
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new(region::KNOWN_REGIONS.iter().copied())
    }
}

impl Fanout {
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// List across regions as selected, dropping failed regions.
    pub async fn list<T, E, F, Fut>(
        &self,
        project: &str,
        selector: &RegionSelector,
        per_region: F,
    ) -> Result<Vec<T>, E>
    where
        F: Fn(String, String) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        match selector {
            RegionSelector::Region(region) => per_region(project.to_string(), region.clone()).await,
            RegionSelector::AllRegions => Ok(self.fan_out(project, per_region).await.into_items()),
        }
    }

    /// Run `per_region` for every region concurrently and report each
    /// region's outcome.
    pub async fn fan_out<T, E, F, Fut>(&self, project: &str, per_region: F) -> FanoutReport<T, E>
    where
        F: Fn(String, String) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        let mut pending: HashSet<String> = HashSet::new();

        for region in &self.regions {
            if !pending.insert(region.clone()) {
                continue;
            }
            let call = per_region(project.to_string(), region.clone());
            let region = region.clone();
            tasks.spawn(async move { (region, call.await) });
        }
        log::debug!(
            "Fanning out to {} region(s) for project {}",
            pending.len(),
            project
        );

        let deadline = self.deadline.map(|d| Instant::now() + d);
        let mut outcomes = Vec::with_capacity(pending.len());

        loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        log::warn!(
                            "Region fan-out deadline reached with {} region(s) pending",
                            pending.len()
                        );
                        tasks.abort_all();
                        let mut timed_out: Vec<String> = pending.drain().collect();
                        timed_out.sort();
                        outcomes.extend(timed_out.into_iter().map(|region| RegionOutcome {
                            region,
                            items: Vec::new(),
                            error: Some(RegionError::TimedOut),
                        }));
                        break;
                    }
                },
                None => tasks.join_next().await,
            };

            let Some(joined) = next else { break };
            match joined {
                Ok((region, Ok(items))) => {
                    pending.remove(&region);
                    log::debug!("Region {} returned {} item(s)", region, items.len());
                    outcomes.push(RegionOutcome {
                        region,
                        items,
                        error: None,
                    });
                }
                Ok((region, Err(err))) => {
                    pending.remove(&region);
                    log::debug!("Region {} failed: {}", region, err);
                    outcomes.push(RegionOutcome {
                        region,
                        items: Vec::new(),
                        error: Some(RegionError::Failed(err)),
                    });
                }
                Err(join_error) => {
                    log::warn!("Region task ended abnormally: {}", join_error);
                }
            }
        }

        // Tasks that panicked never reported their region.
        let mut lost: Vec<String> = pending.into_iter().collect();
        lost.sort();
        outcomes.extend(lost.into_iter().map(|region| RegionOutcome {
            region,
            items: Vec::new(),
            error: Some(RegionError::Aborted("task panicked".to_string())),
        }));

        FanoutReport { outcomes }
    }
}

/// [`Fanout::list`] over every known region.
pub async fn list_across_regions<T, E, F, Fut>(
    project: &str,
    selector: &RegionSelector,
    per_region: F,
) -> Result<Vec<T>, E>
where
    F: Fn(String, String) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    Fanout::default().list(project, selector, per_region).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};

    fn two_regions() -> Fanout {
        Fanout::new(["us-central1", "europe-west1"])
    }

    async fn fake_list(project: String, region: String) -> Result<Vec<String>, String> {
        match region.as_str() {
            "us-central1" => Ok(vec![format!("{}/a", project)]),
            _ => Err(format!("{} unavailable", region)),
        }
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!(RegionSelector::parse("-"), Ok(RegionSelector::AllRegions));
        assert_eq!(RegionSelector::parse("all"), Ok(RegionSelector::AllRegions));
        assert_eq!(
            RegionSelector::parse("us-central1"),
            Ok(RegionSelector::Region("us-central1".to_string()))
        );
        assert!(RegionSelector::parse("").is_err());
        assert!(RegionSelector::parse("US Central").is_err());
        assert_eq!(RegionSelector::AllRegions.to_string(), "-");
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("FAIL".parse::<RegionErrorPolicy>(), Ok(RegionErrorPolicy::Fail));
        assert_eq!(RegionErrorPolicy::default(), RegionErrorPolicy::Warn);
        assert!("sometimes".parse::<RegionErrorPolicy>().is_err());
    }

    #[tokio::test]
    async fn test_all_regions_drops_failing_region() {
        let items = two_regions()
            .list("p", &RegionSelector::AllRegions, fake_list)
            .await
            .expect("fan-out never fails as a whole");
        assert_eq!(items, vec!["p/a".to_string()]);
    }

    #[tokio::test]
    async fn test_concrete_region_is_direct_call() {
        let selector = RegionSelector::Region("us-central1".to_string());
        let items = two_regions().list("p", &selector, fake_list).await;
        assert_eq!(items, fake_list("p".to_string(), "us-central1".to_string()).await);

        let selector = RegionSelector::Region("europe-west1".to_string());
        let err = two_regions()
            .list("p", &selector, fake_list)
            .await
            .expect_err("error propagates");
        assert_eq!(err, "europe-west1 unavailable");
    }

    #[tokio::test]
    async fn test_concrete_region_outside_fanout_list_is_still_called() {
        let selector = RegionSelector::Region("us-central1".to_string());
        let items = Fanout::new(Vec::<String>::new())
            .list("p", &selector, fake_list)
            .await
            .expect("direct call");
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_report_exposes_failures() {
        let report = two_regions().fan_out("p", fake_list).await;
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.succeeded_count(), 1);
        let failures: Vec<(&str, String)> = report
            .failures()
            .map(|(region, err)| (region, err.to_string()))
            .collect();
        assert_eq!(
            failures,
            vec![("europe-west1", "europe-west1 unavailable".to_string())]
        );
    }

    #[tokio::test]
    async fn test_every_region_called_once_and_items_kept_in_region_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let fanout = Fanout::new(["r1", "r2", "r3", "r1"]);

        let recorded = Arc::clone(&calls);
        let items = fanout
            .list("p", &RegionSelector::AllRegions, move |_, region| {
                recorded.lock().expect("lock").push(region.clone());
                async move { Ok::<_, String>(vec![format!("{}-1", region), format!("{}-2", region)]) }
            })
            .await
            .expect("all succeed");

        let called: BTreeSet<String> = calls.lock().expect("lock").iter().cloned().collect();
        assert_eq!(calls.lock().expect("lock").len(), 3);
        assert_eq!(called.len(), 3);
        assert_eq!(items.len(), 6);

        // Cross-region order is unspecified; within a region it is kept.
        for region in ["r1", "r2", "r3"] {
            let first = items.iter().position(|i| i == &format!("{}-1", region));
            let second = items.iter().position(|i| i == &format!("{}-2", region));
            assert!(first < second);
        }
    }

    #[tokio::test]
    async fn test_deadline_marks_slow_regions_timed_out() {
        let fanout = Fanout::new(["fast", "slow"]).with_deadline(Duration::from_millis(50));
        let report = fanout
            .fan_out("p", |_, region| async move {
                if region == "slow" {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok::<_, String>(vec![region])
            })
            .await;

        assert_eq!(report.outcomes.len(), 2);
        let slow = report
            .outcomes
            .iter()
            .find(|o| o.region == "slow")
            .expect("slow region reported");
        assert_eq!(slow.error, Some(RegionError::TimedOut));
        assert_eq!(report.into_items(), vec!["fast".to_string()]);
    }

    #[tokio::test]
    async fn test_list_across_known_regions() {
        let items = list_across_regions("p", &RegionSelector::AllRegions, fake_list)
            .await
            .expect("failed regions are dropped");
        assert_eq!(items, vec!["p/a".to_string()]);

        let selector = RegionSelector::Region("europe-west1".to_string());
        let err = list_across_regions("p", &selector, fake_list)
            .await
            .expect_err("concrete region error propagates");
        assert_eq!(err, fake_list("p".to_string(), "europe-west1".to_string()).await.expect_err("fails"));
    }

    #[tokio::test]
    async fn test_into_parts() {
        let (items, failures) = two_regions().fan_out("p", fake_list).await.into_parts();
        assert_eq!(items, vec!["p/a".to_string()]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "europe-west1");
    }
}
