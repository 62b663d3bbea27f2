//! Android release ↔ SDK level lookup used to pre-fill profile fields.

/// Release string → API level, oldest first.
pub const ANDROID_RELEASES: &[(&str, u32)] = &[
    ("10", 29),
    ("11", 30),
    ("12", 31),
    ("12L", 32),
    ("13", 33),
    ("14", 34),
    ("15", 35),
    ("16", 36),
];

/// API level for a release string (`"12l"` and `"12L"` both match).
pub fn sdk_for_release(release: &str) -> Option<u32> {
    let release = release.trim();
    ANDROID_RELEASES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(release))
        .map(|&(_, sdk)| sdk)
}

/// Release string for an API level.
pub fn release_for_sdk(sdk: u32) -> Option<&'static str> {
    ANDROID_RELEASES
        .iter()
        .find(|&&(_, level)| level == sdk)
        .map(|&(name, _)| name)
}

/// New SDK_INT value after ANDROID_VERSION changed from `previous_release`
/// to `new_release`.
///
/// The suggestion only replaces `current_sdk` when it is empty or still equal
/// to what `previous_release` would have suggested; a value typed by the user
/// is kept.
pub fn prefill_sdk(
    previous_release: Option<&str>,
    current_sdk: Option<&str>,
    new_release: &str,
) -> Option<String> {
    let previous_suggestion = previous_release.and_then(sdk_for_release).map(|s| s.to_string());
    let current = current_sdk.map(str::trim).filter(|s| !s.is_empty());

    let untouched = current.is_none() || current == previous_suggestion.as_deref();
    if untouched {
        if let Some(sdk) = sdk_for_release(new_release) {
            return Some(sdk.to_string());
        }
    }
    current.map(str::to_string)
}

/// New ANDROID_VERSION value after SDK_INT changed; mirror of [`prefill_sdk`].
pub fn prefill_release(
    previous_sdk: Option<&str>,
    current_release: Option<&str>,
    new_sdk: &str,
) -> Option<String> {
    let previous_suggestion = previous_sdk
        .and_then(|s| s.trim().parse::<u32>().ok())
        .and_then(release_for_sdk);
    let current = current_release.map(str::trim).filter(|s| !s.is_empty());

    let untouched = current.is_none() || current == previous_suggestion;
    if untouched {
        if let Some(release) = new_sdk.trim().parse::<u32>().ok().and_then(release_for_sdk) {
            return Some(release.to_string());
        }
    }
    current.map(str::to_string)
}
