use graphdiff_common::{Attribute, ComparisonOptions, DiffOptions};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Listed members are skipped
    Exclude,
    /// Only listed members are compared; `inherit` extends a listed path to its descendants
    Include { inherit: bool },
}

/// Name and path list deciding which members take part in a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFilter {
    mode: FilterMode,
    entries: Vec<String>,
}

impl MemberFilter {
    pub fn new<S: AsRef<str>>(options: ComparisonOptions, list: &[S]) -> Self {
        let mode = if options.intersects(
            ComparisonOptions::INCLUDE_LIST | ComparisonOptions::INCLUDE_LIST_NO_INHERITANCE,
        ) {
            FilterMode::Include {
                inherit: !options.contains(ComparisonOptions::INCLUDE_LIST_NO_INHERITANCE),
            }
        } else {
            FilterMode::Exclude
        };
        if matches!(mode, FilterMode::Include { .. })
            && options.contains(ComparisonOptions::EXCLUDE_LIST)
        {
            warn!("Both include-list and exclude-list set; the list is used as an include list");
        }

        let entries = list
            .iter()
            .map(|entry| strip_indices(entry.as_ref().trim()))
            .filter(|entry| !entry.is_empty())
            .collect();

        Self { mode, entries }
    }

    /// Exclude nothing
    pub fn none() -> Self {
        Self {
            mode: FilterMode::Exclude,
            entries: Vec::new(),
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether the member `name` at `path` passes the list
    pub fn allows(&self, name: &str, path: &str) -> bool {
        if name.is_empty() && path.is_empty() {
            return true;
        }
        let path = strip_indices(path);

        match self.mode {
            FilterMode::Exclude => !self
                .entries
                .iter()
                .any(|entry| entry == name || *entry == path),
            FilterMode::Include { inherit } => self
                .entries
                .iter()
                .any(|entry| include_matches(entry, name, &path, inherit)),
        }
    }
}

impl MemberFilter {
    /// Whether the member passes only because a listed path lies below it.
    /// Such a member is walked through but never reported whole.
    pub fn passes_only_on_the_way(&self, name: &str, path: &str) -> bool {
        let FilterMode::Include { inherit } = self.mode else {
            return false;
        };
        if name.is_empty() && path.is_empty() {
            return false;
        }
        let path = strip_indices(path);

        !self
            .entries
            .iter()
            .any(|entry| includes_directly(entry, name, &path, inherit))
            && self.entries.iter().any(|entry| lies_on_the_way(entry, &path))
    }

    /// Position of the first entry that includes the member directly, or the entry count
    pub fn request_rank(&self, name: &str, path: &str) -> usize {
        let FilterMode::Include { inherit } = self.mode else {
            return self.entries.len();
        };
        let path = strip_indices(path);
        self.entries
            .iter()
            .position(|entry| includes_directly(entry, name, &path, inherit))
            .unwrap_or(self.entries.len())
    }
}

impl Default for MemberFilter {
    fn default() -> Self {
        Self::none()
    }
}

fn include_matches(entry: &str, name: &str, path: &str, inherit: bool) -> bool {
    includes_directly(entry, name, path, inherit) || lies_on_the_way(entry, path)
}

/// Listed, or below a listed entry when inheriting
fn includes_directly(entry: &str, name: &str, path: &str, inherit: bool) -> bool {
    if entry == name || entry == path {
        return true;
    }
    if !inherit {
        return false;
    }

    if entry.starts_with('.') {
        return is_ancestor(entry, path);
    }

    // a bare name listed as an ancestor segment
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    segments
        .split_last()
        .map_or(false, |(_, ancestors)| ancestors.contains(&entry))
}

/// `path` is a strict ancestor of a listed dotted path
fn lies_on_the_way(entry: &str, path: &str) -> bool {
    entry.starts_with('.') && is_ancestor(path, entry)
}

fn is_ancestor(ancestor: &str, path: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

/// `.Children[2].Name` -> `.Children.Name`
pub fn strip_indices(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Attribute gate: true when the member or type must be skipped
pub fn ignored_by_attribute(
    attributes: &[Attribute],
    options: ComparisonOptions,
    diff_options: &DiffOptions,
) -> bool {
    !options.contains(ComparisonOptions::DISABLE_IGNORE_ATTRIBUTES)
        && diff_options.is_ignored(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdiff_common::{DiffIgnore, IgnoreAttribute};

    fn include(list: &[&str]) -> MemberFilter {
        MemberFilter::new(ComparisonOptions::ALL | ComparisonOptions::INCLUDE_LIST, list)
    }

    #[test]
    fn test_strip_indices() {
        assert_eq!(strip_indices(".Children[2].Name"), ".Children.Name");
        assert_eq!(strip_indices(".a[0].b[10][3]"), ".a.b");
        assert_eq!(strip_indices(".Plain"), ".Plain");
    }

    #[test]
    fn test_exclude_by_name_or_path() {
        let filter = MemberFilter::new(ComparisonOptions::ALL, &["Name", ".Location.Latitude"]);
        assert!(!filter.allows("Name", ".Name"));
        assert!(!filter.allows("Name", ".Author.Name"));
        assert!(!filter.allows("Latitude", ".Location.Latitude"));
        assert!(filter.allows("Longitude", ".Location.Longitude"));
        assert!(filter.allows("Location", ".Location"));
        assert!(filter.allows("", ""));
    }

    #[test]
    fn test_exclude_matches_without_indices() {
        let filter = MemberFilter::new(ComparisonOptions::ALL, &[".Children.Name"]);
        assert!(!filter.allows("Name", ".Children[3].Name"));
        assert!(filter.allows("Id", ".Children[3].Id"));
    }

    #[test]
    fn test_include_path_and_ancestors() {
        let filter = include(&[".Author.Address.City"]);
        assert!(filter.allows("Author", ".Author"));
        assert!(filter.allows("Address", ".Author.Address"));
        assert!(filter.allows("City", ".Author.Address.City"));
        assert!(!filter.allows("Country", ".Author.Address.Country"));
        assert!(!filter.allows("Title", ".Title"));
        assert!(filter.allows("", ""));
    }

    #[test]
    fn test_passes_only_on_the_way() {
        let filter = include(&[".Author.Address.City", ".Title"]);
        assert!(filter.passes_only_on_the_way("Author", ".Author"));
        assert!(filter.passes_only_on_the_way("Address", ".Author.Address"));
        assert!(!filter.passes_only_on_the_way("City", ".Author.Address.City"));
        assert!(!filter.passes_only_on_the_way("Title", ".Title"));
        assert!(!filter.passes_only_on_the_way("", ""));

        // a listed ancestor is reported whole
        let listed = include(&[".Author", ".Author.Address.City"]);
        assert!(!listed.passes_only_on_the_way("Author", ".Author"));

        let exclude = MemberFilter::new(ComparisonOptions::ALL, &[".Author.Address.City"]);
        assert!(!exclude.passes_only_on_the_way("Author", ".Author"));
    }

    #[test]
    fn test_request_rank_follows_list_order() {
        let filter = include(&[".Author.Address.Country", ".Author.Address.City", "Title"]);
        assert_eq!(filter.request_rank("Country", ".Author.Address.Country"), 0);
        assert_eq!(filter.request_rank("City", ".Author.Address.City"), 1);
        assert_eq!(filter.request_rank("Title", ".Title"), 2);
        assert_eq!(filter.request_rank("Children", ".Children[4]"), 3);
    }

    #[test]
    fn test_exclude_list_flag() {
        let explicit = MemberFilter::new(
            ComparisonOptions::ALL | ComparisonOptions::EXCLUDE_LIST,
            &["Name"],
        );
        assert_eq!(explicit.mode(), FilterMode::Exclude);
        assert_eq!(explicit, MemberFilter::new(ComparisonOptions::ALL, &["Name"]));

        let both = MemberFilter::new(
            ComparisonOptions::ALL | ComparisonOptions::INCLUDE_LIST | ComparisonOptions::EXCLUDE_LIST,
            &["Name"],
        );
        assert_eq!(both.mode(), FilterMode::Include { inherit: true });
    }

    #[test]
    fn test_include_inheritance() {
        let inherit = include(&[".Author"]);
        assert!(inherit.allows("City", ".Author.Address.City"));

        let strict = MemberFilter::new(
            ComparisonOptions::ALL
                | ComparisonOptions::INCLUDE_LIST
                | ComparisonOptions::INCLUDE_LIST_NO_INHERITANCE,
            &[".Author"],
        );
        assert_eq!(strict.mode(), FilterMode::Include { inherit: false });
        assert!(strict.allows("Author", ".Author"));
        assert!(!strict.allows("City", ".Author.Address.City"));
    }

    #[test]
    fn test_include_bare_name() {
        let filter = include(&["Id"]);
        assert!(filter.allows("Id", ".Id"));
        assert!(!filter.allows("Name", ".Name"));

        let parent = include(&["Author"]);
        assert!(parent.allows("Name", ".Author.Name"));
        assert!(!parent.allows("Title", ".Title"));
    }

    #[test]
    fn test_attribute_gate() {
        let diff_options = DiffOptions::new(vec![IgnoreAttribute::of::<DiffIgnore>()]);
        let attributes = [Attribute::of::<DiffIgnore>()];
        assert!(ignored_by_attribute(
            &attributes,
            ComparisonOptions::ALL,
            &diff_options
        ));
        assert!(!ignored_by_attribute(
            &attributes,
            ComparisonOptions::ALL | ComparisonOptions::DISABLE_IGNORE_ATTRIBUTES,
            &diff_options
        ));
    }
}
