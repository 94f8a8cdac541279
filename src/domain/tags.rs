use serde::{Deserialize, Serialize};

/// One category of the fixed tag taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct TagCategory {
    pub title: &'static str,
    pub words: &'static [&'static str],
}

/// The fixed four-category taxonomy the UI offers for quick prompt building.
pub const TAXONOMY: &[TagCategory] = &[
    TagCategory {
        title: "Mood",
        words: &[
            "happy",
            "joyful",
            "dark",
            "sad",
            "tender",
            "melancholic",
            "energetic",
            "calm",
            "mysterious",
            "romantic",
        ],
    },
    TagCategory {
        title: "Rhythm",
        words: &[
            "faster",
            "slower",
            "upbeat",
            "syncopated",
            "steady",
            "swinging",
            "groovy",
            "laid-back",
        ],
    },
    TagCategory {
        title: "Melody",
        words: &[
            "add notes",
            "remove notes",
            "simplify",
            "ornate",
            "flowing",
            "staccato",
            "arpeggiated",
            "minimalist",
        ],
    },
    TagCategory {
        title: "Genre",
        words: &[
            "rock",
            "classical",
            "jazz",
            "pop",
            "electronic",
            "folk",
            "blues",
            "ambient",
            "orchestral",
        ],
    },
];

/// Insertion-ordered set of selected tag words.
///
/// Membership is the only mutable property. The set does not validate words
/// against [`TAXONOMY`] - callers built on the fixed category lists by
/// construction, and the looseness keeps the model reusable for free-form
/// tag sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    words: Vec<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle membership of `word`: remove it if present, append it
    /// otherwise. Returns whether the word is now a member.
    pub fn toggle(&mut self, word: &str) -> bool {
        if let Some(pos) = self.words.iter().position(|w| w == word) {
            self.words.remove(pos);
            false
        } else {
            self.words.push(word.to_string());
            true
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Selected words in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }
}

/// A transformation description: free text plus selected tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformationRequest {
    pub free_text: String,
    pub tags: TagSet,
}

impl TransformationRequest {
    pub fn new(free_text: impl Into<String>, tags: TagSet) -> Self {
        Self {
            free_text: free_text.into(),
            tags,
        }
    }

    /// The single prompt string sent to the transformation service: trimmed
    /// free text first, then tags in insertion order, comma separated. The
    /// free-text segment is omitted when empty.
    pub fn composed_prompt(&self) -> String {
        let trimmed = self.free_text.trim();
        let mut parts: Vec<&str> = Vec::with_capacity(1 + self.tags.len());
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
        parts.extend(self.tags.iter());
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_shape() {
        let titles: Vec<&str> = TAXONOMY.iter().map(|c| c.title).collect();
        assert_eq!(titles, ["Mood", "Rhythm", "Melody", "Genre"]);
        for category in TAXONOMY {
            assert!(!category.words.is_empty());
        }
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut tags = TagSet::new();
        assert!(tags.toggle("jazz"));
        assert!(tags.contains("jazz"));
        assert!(!tags.toggle("jazz"));
        assert!(!tags.contains("jazz"));
    }

    #[test]
    fn test_toggle_pair_restores_membership_and_order() {
        let mut tags = TagSet::new();
        tags.toggle("happy");
        tags.toggle("jazz");
        tags.toggle("calm");
        let before = tags.clone();

        tags.toggle("steady");
        tags.toggle("steady");
        assert_eq!(tags, before);

        let order: Vec<&str> = tags.iter().collect();
        assert_eq!(order, ["happy", "jazz", "calm"]);
    }

    #[test]
    fn test_composed_prompt_trims_and_joins() {
        let mut tags = TagSet::new();
        tags.toggle("happy");
        tags.toggle("jazz");
        let request = TransformationRequest::new("  hello  ", tags);
        assert_eq!(request.composed_prompt(), "hello, happy, jazz");
    }

    #[test]
    fn test_composed_prompt_tags_only() {
        let mut tags = TagSet::new();
        tags.toggle("happy");
        let request = TransformationRequest::new("", tags);
        assert_eq!(request.composed_prompt(), "happy");
    }

    #[test]
    fn test_composed_prompt_empty() {
        let request = TransformationRequest::new("", TagSet::new());
        assert_eq!(request.composed_prompt(), "");

        let whitespace_only = TransformationRequest::new("   ", TagSet::new());
        assert_eq!(whitespace_only.composed_prompt(), "");
    }
}
