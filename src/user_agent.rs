//! Process-wide User-Agent string.
//!
//! The API operator asks automated clients to identify themselves with a
//! name, version and a way to reach the operator.

const TOOL_NAME: &str = "commons-sampler";
const TOOL_PURPOSE: &str = "educational image sampler";

/// Project URL carried by every User-Agent, so traffic is attributable even
/// without `--contact`.
const PROJECT_UA_URL: &str = "https://github.com/venturai/commons-sampler";

/// Builds the User-Agent sent with every request.
///
/// Always names the project URL; `contact` (an email or URL) is appended
/// when non-blank.
#[must_use]
pub fn build_user_agent(contact: Option<&str>) -> String {
    let version = env!("CARGO_PKG_VERSION");
    match contact.map(str::trim).filter(|c| !c.is_empty()) {
        Some(contact) => {
            format!("{TOOL_NAME}/{version} ({TOOL_PURPOSE}; +{PROJECT_UA_URL}; contact: {contact})")
        }
        None => format!("{TOOL_NAME}/{version} ({TOOL_PURPOSE}; +{PROJECT_UA_URL})"),
    }
}
