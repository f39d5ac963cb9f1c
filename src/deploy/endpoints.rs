// ABOUTME: Extracts externally reachable endpoint URLs from deployment tool output.
// ABOUTME: Understands endpoint sections, provider endpoint URLs, and service information banners.

use regex::Regex;
use std::sync::LazyLock;

static ANY_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s'"<>()\[\]]+"#).expect("valid url regex"));

static PROVIDER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"https://[a-z0-9]+\.(?:execute-api\.[a-z0-9-]+\.amazonaws\.com|lambda-url\.[a-z0-9-]+\.on\.aws)[^\s'"<>()\[\]]*"#,
    )
    .expect("valid provider url regex")
});

static SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*endpoints?\s*:").expect("valid header regex"));

static BANNER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)service information").expect("valid banner regex"));

/// Endpoint URLs found in `output`, de-duplicated in first-seen order.
///
/// Finding nothing is not an error; some modules expose no HTTP surface.
pub fn extract_endpoints(output: &str) -> Vec<String> {
    let mut found = Vec::new();

    from_endpoint_sections(output, &mut found);
    from_service_banner(output, &mut found);
    for m in PROVIDER_URL.find_iter(output) {
        found.push(clean(m.as_str()));
    }

    let mut unique: Vec<String> = Vec::with_capacity(found.len());
    for url in found {
        if !url.is_empty() && !unique.contains(&url) {
            unique.push(url);
        }
    }
    unique
}

/// `endpoints:` / `endpoint:` header, optionally followed by indented lines.
fn from_endpoint_sections(output: &str, found: &mut Vec<String>) {
    let mut in_section = false;

    for line in output.lines() {
        if SECTION_HEADER.is_match(line) {
            in_section = true;
            push_urls(line, found);
            continue;
        }

        if in_section {
            let indented = line.starts_with(' ') || line.starts_with('\t');
            if line.trim().is_empty() || !indented {
                in_section = false;
                continue;
            }
            push_urls(line, found);
        }
    }
}

/// Banner block starting at a "Service Information" line and ending at a blank line.
fn from_service_banner(output: &str, found: &mut Vec<String>) {
    let mut in_banner = false;

    for line in output.lines() {
        if BANNER_HEADER.is_match(line) {
            in_banner = true;
            continue;
        }
        if in_banner {
            if line.trim().is_empty() {
                in_banner = false;
                continue;
            }
            push_urls(line, found);
        }
    }
}

fn push_urls(line: &str, found: &mut Vec<String>) {
    for m in ANY_URL.find_iter(line) {
        found.push(clean(m.as_str()));
    }
}

/// Path templates such as `{proxy+}` stay; a closing brace with no opener
/// belongs to the surrounding text.
fn clean(url: &str) -> String {
    let mut url = url.trim_end_matches(['.', ',', ';', ':']);
    while url.ends_with('}') && url.matches('}').count() > url.matches('{').count() {
        url = url[..url.len() - 1].trim_end_matches(['.', ',', ';', ':']);
    }
    url.to_string()
}
