use serde::Serialize;

/// The animal kinds the knowledge base can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Dog,
    Tiger,
    Elephant,
    Cow,
    Leopard,
    Monkey,
    Snake,
}

impl Category {
    /// All categories, in the order their label rules are evaluated.
    pub const ALL: [Category; 7] = [
        Category::Dog,
        Category::Tiger,
        Category::Elephant,
        Category::Cow,
        Category::Leopard,
        Category::Monkey,
        Category::Snake,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Dog => "dog",
            Category::Tiger => "tiger",
            Category::Elephant => "elephant",
            Category::Cow => "cow",
            Category::Leopard => "leopard",
            Category::Monkey => "monkey",
            Category::Snake => "snake",
        }
    }

    /// Substring markers that select this category.
    fn markers(self) -> &'static [&'static str] {
        match self {
            Category::Dog => &[
                "dog",
                "hound",
                "retriever",
                "shepherd",
                "terrier",
                "bulldog",
                "pug",
                "collie",
                "beagle",
            ],
            Category::Tiger => &["tiger", "panthera tigris"],
            Category::Elephant => &["elephant"],
            Category::Cow => &["cow", "ox", "bull", "bison", "zebu"],
            Category::Leopard => &["leopard", "jaguar", "cheetah", "panther"],
            Category::Monkey => &["monkey", "macaque", "baboon", "langur"],
            Category::Snake => &[
                "snake", "viper", "python", "cobra", "boa", "anaconda", "serpent",
            ],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a free-text model label to a known category.
///
/// Rules are tried in [`Category::ALL`] order and the first one with a
/// matching marker wins, so a label such as "bulldog" is a dog even though
/// it also contains "bull".
pub fn resolve_category(label: &str) -> Option<Category> {
    let label = label.to_lowercase();
    Category::ALL.into_iter().find(|category| {
        category
            .markers()
            .iter()
            .any(|marker| label.contains(marker))
    })
}
