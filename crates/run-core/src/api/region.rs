//! Regions where Cloud Run is available.

/// Selector value meaning "every known region".
pub const ALL_REGIONS: &str = "-";

/// Region used when neither flags, environment, config nor gcloud name one.
pub const DEFAULT_REGION: &str = "us-central1";

/// Published Cloud Run regions.
pub const KNOWN_REGIONS: &[&str] = &[
    "africa-south1",
    "asia-east1",
    "asia-east2",
    "asia-northeast1",
    "asia-northeast2",
    "asia-northeast3",
    "asia-south1",
    "asia-south2",
    "asia-southeast1",
    "asia-southeast2",
    "australia-southeast1",
    "australia-southeast2",
    "europe-central2",
    "europe-north1",
    "europe-north2",
    "europe-southwest1",
    "europe-west1",
    "europe-west2",
    "europe-west3",
    "europe-west4",
    "europe-west6",
    "europe-west8",
    "europe-west9",
    "europe-west10",
    "europe-west12",
    "me-central1",
    "me-central2",
    "me-west1",
    "northamerica-northeast1",
    "northamerica-northeast2",
    "northamerica-south1",
    "southamerica-east1",
    "southamerica-west1",
    "us-central1",
    "us-east1",
    "us-east4",
    "us-east5",
    "us-south1",
    "us-west1",
    "us-west2",
    "us-west3",
    "us-west4",
];

pub fn list() -> Vec<String> {
    KNOWN_REGIONS.iter().map(|r| r.to_string()).collect()
}

pub fn is_known(region: &str) -> bool {
    KNOWN_REGIONS.contains(&region)
}

/// Known regions containing `filter`, case-insensitively.
pub fn filter(filter: &str) -> Vec<&'static str> {
    let needle = filter.to_lowercase();
    KNOWN_REGIONS
        .iter()
        .copied()
        .filter(|r| r.contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_regions_are_unique() {
        let mut sorted = KNOWN_REGIONS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), KNOWN_REGIONS.len());
        assert!(is_known(DEFAULT_REGION));
        assert!(!is_known(ALL_REGIONS));
    }

    #[test]
    fn test_filter() {
        assert_eq!(filter("us-central1"), vec!["us-central1"]);
        assert_eq!(filter("US-CENTRAL1"), vec!["us-central1"]);
        assert!(filter("non-existent-region").is_empty());
        assert_eq!(filter("").len(), KNOWN_REGIONS.len());
    }
}
