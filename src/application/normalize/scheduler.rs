//! Fix-up table for Civitai scheduler values.
//!
//! Older nodes persisted the scheduler's display label instead of the enum
//! value the backend expects. The table maps each label to its enum value;
//! values already in enum form pass through unchanged.

const SCHEDULER_FIXES: &[(&str, &str)] = &[
    ("Euler a", "EulerA"),
    ("Euler", "Euler"),
    ("LMS", "LMS"),
    ("LMS Karras", "LMSKarras"),
    ("Heun", "Heun"),
    ("DPM2", "DPM2"),
    ("DPM2 a", "DPM2A"),
    ("DPM2 Karras", "DPM2Karras"),
    ("DPM2 a Karras", "DPM2AKarras"),
    ("DPM++ 2S a", "DPM2SA"),
    ("DPM++ 2S a Karras", "DPM2SAKarras"),
    ("DPM++ 2M", "DPM2M"),
    ("DPM++ 2M Karras", "DPM2MKarras"),
    ("DPM++ SDE", "DPMSDE"),
    ("DPM++ SDE Karras", "DPMSDEKarras"),
    ("DPM fast", "DPMFast"),
    ("DPM adaptive", "DPMAdaptive"),
    ("DDIM", "DDIM"),
    ("PLMS", "PLMS"),
    ("UniPC", "UniPC"),
    ("LCM", "LCM"),
];

/// Map a persisted scheduler value to the backend enum value.
#[must_use]
pub fn fix_scheduler(value: &str) -> &str {
    SCHEDULER_FIXES
        .iter()
        .find(|(label, _)| *label == value)
        .map_or(value, |(_, fixed)| fixed)
}
