use super::normalize::{normalize_url, NormalizationPolicy};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Tracks the canonical URLs already admitted to a crawl
///
/// All methods take `&self`; the seen set, canonical map and duplicate
/// counter live behind one mutex so that [`DuplicateIndex::admit`] is a single
/// atomic check-and-insert.
#[derive(Debug)]
pub struct DuplicateIndex {
    policy: NormalizationPolicy,
    state: Mutex<IndexState>,
}

#[derive(Debug, Default)]
struct IndexState {
    seen: HashSet<String>,
    canonical_map: HashMap<String, String>,
    duplicates: usize,
}

impl DuplicateIndex {
    pub fn new(policy: NormalizationPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(IndexState::default()),
        }
    }

    pub fn policy(&self) -> &NormalizationPolicy {
        &self.policy
    }

    fn lock(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true if an equivalent URL was already admitted
    ///
    /// A URL that cannot be normalized is reported as a duplicate so that
    /// malformed links are never queued.
    pub fn is_duplicate(&self, raw: &str) -> bool {
        match normalize_url(raw, &self.policy) {
            Ok(canonical) => self.lock().seen.contains(&canonical),
            Err(_) => true,
        }
    }

    /// Records `raw` if its canonical form is new
    ///
    /// Returns false and bumps the duplicate counter when the canonical form
    /// is already present or the URL cannot be normalized.
    pub fn admit(&self, raw: &str) -> bool {
        let canonical = normalize_url(raw, &self.policy);

        let mut state = self.lock();
        let canonical = match canonical {
            Ok(canonical) => canonical,
            Err(_) => {
                state.duplicates += 1;
                return false;
            }
        };

        if state.seen.contains(&canonical) {
            state.duplicates += 1;
            return false;
        }

        state.seen.insert(canonical.clone());
        state.canonical_map.insert(raw.to_string(), canonical);
        true
    }

    /// The canonical form of `raw`
    ///
    /// Falls back to computing it on the fly, and to the raw string itself
    /// when it cannot be normalized.
    pub fn canonical_of(&self, raw: &str) -> String {
        if let Some(canonical) = self.lock().canonical_map.get(raw) {
            return canonical.clone();
        }

        normalize_url(raw, &self.policy).unwrap_or_else(|_| raw.to_string())
    }

    pub fn duplicate_count(&self) -> usize {
        self.lock().duplicates
    }

    pub fn seen_count(&self) -> usize {
        self.lock().seen.len()
    }

    /// Clears all seen URLs, mappings and the duplicate counter
    pub fn reset(&self) {
        *self.lock() = IndexState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_index() -> DuplicateIndex {
        DuplicateIndex::new(NormalizationPolicy::default())
    }

    #[test]
    fn test_admit_first_then_reject_equivalent() {
        let index = create_index();

        assert!(index.admit("https://example.com/docs/"));
        assert!(!index.admit("https://Example.com/docs/"));
        assert!(!index.admit("https://www.example.com/docs#intro"));

        assert_eq!(index.duplicate_count(), 2);
        assert_eq!(index.seen_count(), 1);
    }

    #[test]
    fn test_is_duplicate_after_admit() {
        let index = create_index();

        assert!(!index.is_duplicate("https://example.com/guide"));
        index.admit("https://example.com/guide/");
        assert!(index.is_duplicate("https://EXAMPLE.com/guide"));

        // Queries never touch the counter
        assert_eq!(index.duplicate_count(), 0);
    }

    #[test]
    fn test_malformed_url_is_duplicate() {
        let index = create_index();

        assert!(index.is_duplicate("not a url"));
        assert!(!index.admit("not a url"));
        assert_eq!(index.duplicate_count(), 1);
        assert_eq!(index.seen_count(), 0);
    }

    #[test]
    fn test_canonical_of() {
        let index = create_index();
        index.admit("https://WWW.example.com/Page/");

        assert_eq!(
            index.canonical_of("https://WWW.example.com/Page/"),
            "https://example.com/page"
        );
        // Unknown but parseable: computed on the fly
        assert_eq!(
            index.canonical_of("https://example.com/Other/"),
            "https://example.com/other"
        );
        // Unparseable: returned unchanged
        assert_eq!(index.canonical_of("::garbage"), "::garbage");
    }

    #[test]
    fn test_reset() {
        let index = create_index();
        index.admit("https://example.com/a");
        index.admit("https://example.com/a");

        index.reset();

        assert_eq!(index.seen_count(), 0);
        assert_eq!(index.duplicate_count(), 0);
        assert!(index.admit("https://example.com/a"));
    }

    #[test]
    fn test_identity_policy_keeps_variants_apart() {
        let index = DuplicateIndex::new(NormalizationPolicy::identity());

        assert!(index.admit("https://example.com/docs/"));
        assert!(index.admit("https://example.com/docs"));
        assert!(!index.admit("https://example.com/docs"));
    }

    #[test]
    fn test_concurrent_admit_succeeds_once() {
        let index = create_index();
        let variants = [
            "https://example.com/docs/",
            "https://Example.com/docs",
            "https://www.example.com/docs#a",
            "https://WWW.EXAMPLE.COM/DOCS/",
        ];

        let admitted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let index = &index;
                    let url = variants[i % variants.len()];
                    scope.spawn(move || index.admit(url) as usize)
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(admitted, 1);
        assert_eq!(index.duplicate_count(), 15);
        assert_eq!(index.seen_count(), 1);
    }
}
