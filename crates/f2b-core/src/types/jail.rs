/// Sentinel for a counter that could not be determined
pub const UNDETERMINED: i64 = -1;

/// Failed/banned counters of one jail, as reported by `status <jail>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JailStats {
    /// Failures currently tracked by the filter
    pub failed_current: i64,
    /// Failures seen since the jail started
    pub failed_total: i64,
    /// Addresses currently banned
    pub banned_current: i64,
    /// Bans issued since the jail started
    pub banned_total: i64,
}

impl Default for JailStats {
    fn default() -> Self {
        Self {
            failed_current: UNDETERMINED,
            failed_total: UNDETERMINED,
            banned_current: UNDETERMINED,
            banned_total: UNDETERMINED,
        }
    }
}

impl JailStats {
    /// Returns true if every counter was parsed
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed_current != UNDETERMINED
            && self.failed_total != UNDETERMINED
            && self.banned_current != UNDETERMINED
            && self.banned_total != UNDETERMINED
    }
}
