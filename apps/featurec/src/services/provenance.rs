use chrono::{DateTime, Utc};
use featurec::config::{SOURCE_DATE_EPOCH, TimestampPolicy};
use std::path::Path;

/// Banner timestamp for this run, honoring `SOURCE_DATE_EPOCH`.
pub(crate) fn timestamp(policy: TimestampPolicy) -> Option<DateTime<Utc>> {
    let pinned = std::env::var(SOURCE_DATE_EPOCH).ok();
    let resolved = policy.resolve(Utc::now(), pinned.as_deref());
    tracing::debug!(%policy, pinned = pinned.is_some(), "Resolved banner timestamp");
    resolved
}

/// How the definitions file is named in the banner: its file name, not the full path.
pub(crate) fn definitions_name(path: &Path) -> String {
    path.file_name().unwrap_or(path.as_os_str()).to_string_lossy().into_owned()
}
