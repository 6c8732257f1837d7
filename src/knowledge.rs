use crate::category::Category;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Aggressive,
    Calm,
}

/// Display metadata for one category. Entries are `'static` and never
/// mutated; results copy what they need out of them.
#[derive(Debug, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub name: &'static str,
    pub kind: &'static str,
    pub mood: Mood,
    pub description: &'static str,
    pub safety_tips: &'static [&'static str],
}

static DOG: KnowledgeEntry = KnowledgeEntry {
    name: "Dog",
    kind: "Mammal",
    mood: Mood::Calm,
    description: "Domestic dogs are social, intelligent mammals known for loyalty and companionship. Breeds vary widely in appearance and behavior.",
    safety_tips: &[
        "Approach slowly and let the dog sniff your hand",
        "Avoid direct eye contact if the dog seems anxious",
        "Do not disturb dogs while eating or sleeping",
        "Ask the owner before petting",
    ],
};

static TIGER: KnowledgeEntry = KnowledgeEntry {
    name: "Tiger",
    kind: "Big Cat",
    mood: Mood::Aggressive,
    description: "Tigers are powerful apex predators with distinctive stripes. They prefer dense forests and hunt large prey.",
    safety_tips: &[
        "Maintain at least 100 meters distance",
        "Do not run; back away slowly and stay calm",
        "Make noise to avoid surprising the animal",
        "Report sightings to local authorities",
    ],
};

static ELEPHANT: KnowledgeEntry = KnowledgeEntry {
    name: "Elephant",
    kind: "Herbivore",
    mood: Mood::Calm,
    description: "Elephants are gentle, intelligent herbivores that live in social groups and shape ecosystems by dispersing seeds.",
    safety_tips: &[
        "Keep a large buffer distance, especially around calves",
        "Never feed or provoke",
        "Move slowly and stay downwind if possible",
    ],
};

static COW: KnowledgeEntry = KnowledgeEntry {
    name: "Cow",
    kind: "Herbivore",
    mood: Mood::Calm,
    description: "Cows are domesticated bovines commonly found near farms and villages. Generally calm but protective of calves.",
    safety_tips: &[
        "Do not approach newborn calves",
        "Avoid loud noises and sudden movements",
        "Give space if the animal lowers head or stomps",
    ],
};

static LEOPARD: KnowledgeEntry = KnowledgeEntry {
    name: "Leopard",
    kind: "Big Cat",
    mood: Mood::Aggressive,
    description: "Leopards are agile big cats known for their spotted coats and stealth. Mostly nocturnal and solitary.",
    safety_tips: &[
        "Avoid dense bushes and walking alone at night",
        "Do not run; maintain eye contact and back away",
        "Alert local wildlife authorities on sightings",
    ],
};

static MONKEY: KnowledgeEntry = KnowledgeEntry {
    name: "Monkey",
    kind: "Primate",
    mood: Mood::Calm,
    description: "Monkeys are intelligent primates often living in groups. They can become bold around human food.",
    safety_tips: &[
        "Do not feed; secure food and shiny objects",
        "Avoid direct eye contact and sudden gestures",
        "Keep a safe distance to prevent bites/scratches",
    ],
};

static SNAKE: KnowledgeEntry = KnowledgeEntry {
    name: "Snake",
    kind: "Reptile",
    mood: Mood::Aggressive,
    description: "Snakes are elongated reptiles; some species are venomous. Many avoid confrontation if unprovoked.",
    safety_tips: &[
        "Stay still or back away slowly without sudden moves",
        "Never attempt to handle or corner a snake",
        "Wear boots in tall grass and watch your step",
    ],
};

impl Category {
    pub fn knowledge(self) -> &'static KnowledgeEntry {
        match self {
            Category::Dog => &DOG,
            Category::Tiger => &TIGER,
            Category::Elephant => &ELEPHANT,
            Category::Cow => &COW,
            Category::Leopard => &LEOPARD,
            Category::Monkey => &MONKEY,
            Category::Snake => &SNAKE,
        }
    }
}
