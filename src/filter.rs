use crate::config::types::FilterConfig;

// ---------------------------------------------------------------------------
// Changed-file prefix filter
// ---------------------------------------------------------------------------

fn has_prefix(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

impl FilterConfig {
    /// Whether an item with these changed files belongs on the dashboard.
    ///
    /// At least one file must match an include prefix (an empty include
    /// list admits everything) and no file may match an exclude prefix.
    pub fn admits(&self, files: &[String]) -> bool {
        let included =
            self.include.is_empty() || files.iter().any(|f| has_prefix(f, &self.include));
        included && !files.iter().any(|f| has_prefix(f, &self.exclude))
    }

    /// The files worth showing for an admitted item: those under an include
    /// prefix, or all of them when the include list is empty.
    pub fn matching<'a>(&self, files: &'a [String]) -> Vec<&'a str> {
        files
            .iter()
            .filter(|f| self.include.is_empty() || has_prefix(f, &self.include))
            .map(String::as_str)
            .collect()
    }
}
