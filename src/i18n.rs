use std::collections::HashMap;

use tracing::debug;

/// Message-key based localization with positional substitution, the way the
/// jobs page resolves its display strings. Unknown keys resolve to the key
/// itself so a missing entry never panics the UI.
pub struct Localizer {
    messages: HashMap<&'static str, &'static str>,
}

impl Default for Localizer {
    fn default() -> Self {
        let messages = HashMap::from([
            ("jobs.filtered.jobs", "{0} of {1} jobs showing"),
            ("jobs.nothing.to.show", "No jobs to display"),
            ("jobs.table.job.fail", "Job failed to run"),
            ("jobs.column.id", "Id"),
            ("jobs.column.user", "User"),
            ("jobs.column.start.time", "Start Time"),
            ("jobs.column.end.time", "End Time"),
            ("jobs.column.duration", "Duration"),
        ]);
        Localizer { messages }
    }
}

impl Localizer {
    pub fn t(&self, key: &str) -> String {
        match self.messages.get(key) {
            Some(message) => (*message).to_string(),
            None => {
                debug!("No message for key {key}");
                key.to_string()
            }
        }
    }

    /// Resolve a key and substitute `{0}`, `{1}`, ... with `args`.
    pub fn format(&self, key: &str, args: &[&str]) -> String {
        let mut message = self.t(key);
        for (i, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{i}}}"), arg);
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments_are_substituted_in_order() {
        let l10n = Localizer::default();
        assert_eq!(
            l10n.format("jobs.filtered.jobs", &["3", "30"]),
            "3 of 30 jobs showing"
        );
    }

    #[test]
    fn missing_keys_resolve_to_the_key() {
        let l10n = Localizer::default();
        assert_eq!(l10n.t("jobs.no.such.key"), "jobs.no.such.key");
    }

    #[test]
    fn job_fail_message_is_distinct_from_empty_state() {
        let l10n = Localizer::default();
        assert_ne!(l10n.t("jobs.table.job.fail"), l10n.t("jobs.nothing.to.show"));
    }
}
