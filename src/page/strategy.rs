/// Selector set used to find comment containers and pull fields out of them.
///
/// Heuristics like these break whenever the page markup changes, so they are
/// versioned and swapped as a unit instead of being spread through the
/// extractor. Container selectors are unioned, not exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionStrategy {
    pub version: u32,
    pub containers: Vec<String>,
    pub identity: String,
    pub content: String,
}

impl ExtractionStrategy {
    pub fn v1() -> Self {
        Self {
            version: 1,
            containers: [
                r#"div[role="menuitem"]"#,
                "ul li",
                r#"div[class*="x78zum5"][class*="xdt5ytf"] > div > div"#,
                r#"ul[class*="x78zum5"] > div"#,
                r#"section main div[class*="x5yr21d"] div[class*="x78zum5"] > div"#,
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            identity: r#"a[href^="/"]"#.to_string(),
            content: r#"span:not([class*="coreSpriteVerifiedBadge"])"#.to_string(),
        }
    }
}

impl Default for ExtractionStrategy {
    fn default() -> Self {
        Self::v1()
    }
}
