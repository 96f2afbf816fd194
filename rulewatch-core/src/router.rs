//! Owner routing: ordered keyword table, first match wins.

/// Owner assigned when no keyword matches.
pub const UNASSIGNED: &str = "(unassigned)";

#[derive(Debug, Clone)]
struct Rule {
    /// Lowercased once at construction
    needle: String,
    owner: String,
}

/// Case-insensitive substring router over an ordered `(keyword, owner)` table.
///
/// Table order is preserved exactly as given; an earlier keyword beats a later one even
/// when both appear.
#[derive(Debug, Clone, Default)]
pub struct OwnerRouter {
    rules: Vec<Rule>,
    match_summary: bool,
}

impl OwnerRouter {
    pub fn new<I, K, O>(table: I, match_summary: bool) -> Self
    where
        I: IntoIterator<Item = (K, O)>,
        K: AsRef<str>,
        O: Into<String>,
    {
        let rules = table
            .into_iter()
            .filter_map(|(keyword, owner)| {
                let needle = keyword.as_ref().trim().to_lowercase();
                // An empty keyword would match everything.
                (!needle.is_empty()).then(|| Rule {
                    needle,
                    owner: owner.into(),
                })
            })
            .collect();
        Self {
            rules,
            match_summary,
        }
    }

    /// Router built from the routing section of the configuration.
    pub fn from_config(config: &rulewatch_common::RoutingConfig) -> Self {
        Self::new(
            config
                .owners
                .iter()
                .map(|rule| (rule.keyword.as_str(), rule.owner.clone())),
            config.match_summary,
        )
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Owner for a document. `summary` is consulted only when summary matching is enabled.
    pub fn route(&self, title: &str, summary: Option<&str>) -> &str {
        let title = title.to_lowercase();
        let summary = if self.match_summary {
            summary.map(str::to_lowercase)
        } else {
            None
        };

        self.rules
            .iter()
            .find(|rule| {
                title.contains(&rule.needle)
                    || summary
                        .as_deref()
                        .is_some_and(|s| s.contains(&rule.needle))
            })
            .map_or(UNASSIGNED, |rule| rule.owner.as_str())
    }
}
