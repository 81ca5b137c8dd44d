//! Matching listed source images to requested page positions

use crate::storage::SourceEntry;

/// One requested page slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub key: String,
    pub ordinal: u32,
}

impl PageRequest {
    pub fn new(key: &str, ordinal: u32) -> Self {
        Self {
            key: key.to_string(),
            ordinal,
        }
    }

    /// Source names for this slot start with `"{key}.{ordinal}"`
    pub fn expected_prefix(&self) -> String {
        format!("{}.{}", self.key, self.ordinal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    pub ordinal: u32,
    pub source: SourceEntry,
}

/// Resolved pages in requested order, plus the slots nothing matched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedPageSet {
    pub pages: Vec<ResolvedPage>,
    pub unresolved: Vec<PageRequest>,
}

impl OrderedPageSet {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }
}

/// Resolve each ordinal to a listed source.
///
/// When several names share the prefix, a name whose prefix is not followed by
/// another digit wins (`doc.1_a` over `doc.10`), then the lexicographically
/// smallest name. Unmatched ordinals are recorded and skipped.
pub fn resolve(key: &str, candidates: &[SourceEntry], ordinals: &[u32]) -> OrderedPageSet {
    let mut set = OrderedPageSet::default();

    for &ordinal in ordinals {
        let request = PageRequest::new(key, ordinal);
        let prefix = request.expected_prefix();

        let best = candidates
            .iter()
            .filter(|c| c.name.starts_with(&prefix))
            .min_by(|a, b| {
                let rank = |c: &SourceEntry| !ends_at_boundary(&c.name, prefix.len());
                rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
            });

        match best {
            Some(source) => {
                tracing::info!("Found '{}' for page {} (id {})", source.name, prefix, source.id);
                set.pages.push(ResolvedPage {
                    ordinal,
                    source: source.clone(),
                });
            }
            None => {
                tracing::warn!("No source image matches '{}'", prefix);
                set.unresolved.push(request);
            }
        }
    }

    set
}

fn ends_at_boundary(name: &str, prefix_len: usize) -> bool {
    !name[prefix_len..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}
