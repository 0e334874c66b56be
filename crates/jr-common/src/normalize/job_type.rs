use crate::JobType;

/// Map a recognized work-arrangement label to its enum value.
///
/// Returns `None` for anything that does not name a site arrangement,
/// including schedule labels like "Full-time" that carry no location
/// signal.
pub fn correct_job_type(raw: &str) -> Option<JobType> {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "remote" => Some(JobType::Remote),
        "on site" | "on-site" | "onsite" => Some(JobType::OnSite),
        "hybrid" => Some(JobType::Hybrid),
        _ => None,
    }
}

/// Total version of [`correct_job_type`]: unrecognized labels fall back to
/// the default arrangement so a search never fails on an odd label.
pub fn normalize_job_type(raw: &str) -> JobType {
    correct_job_type(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_site_arrangements() {
        assert_eq!(correct_job_type("Remote"), Some(JobType::Remote));
        assert_eq!(correct_job_type("On-site"), Some(JobType::OnSite));
        assert_eq!(correct_job_type("on site"), Some(JobType::OnSite));
        assert_eq!(correct_job_type("ONSITE"), Some(JobType::OnSite));
        assert_eq!(correct_job_type("Hybrid"), Some(JobType::Hybrid));
    }

    #[test]
    fn schedule_labels_are_not_arrangements() {
        assert_eq!(correct_job_type("Full-time"), None);
        assert_eq!(correct_job_type("Part-time"), None);
        assert_eq!(correct_job_type(""), None);
    }

    #[test]
    fn normalization_falls_back_to_remote() {
        assert_eq!(normalize_job_type("Full-time"), JobType::Remote);
        assert_eq!(normalize_job_type(""), JobType::Remote);
        assert_eq!(normalize_job_type("HYBRID"), JobType::Hybrid);
    }
}
