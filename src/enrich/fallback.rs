//! Static answers used when no generator is available

use crate::pillar::Pillar;

pub fn suggestions(pillar: Pillar) -> Vec<String> {
    let items: [&str; 5] = match pillar {
        Pillar::Love => [
            "Creative expression",
            "Learning new skills",
            "Helping others",
            "Nature exploration",
            "Personal growth",
        ],
        Pillar::GoodAt => [
            "Problem solving",
            "Communication",
            "Technical skills",
            "Leadership",
            "Creative thinking",
        ],
        Pillar::WorldNeeds => [
            "Environmental solutions",
            "Mental health support",
            "Education access",
            "Community building",
            "Technological innovation",
        ],
        Pillar::PaidFor => [
            "Consulting services",
            "Product development",
            "Content creation",
            "Teaching/coaching",
            "Project management",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

/// Answer for a pillar key the service does not recognize
pub fn unknown_pillar_suggestions() -> Vec<String> {
    vec!["Enter more details".to_string()]
}

pub fn tips() -> Vec<String> {
    [
        "Focus on projects that align with your passions and strengths to increase job satisfaction and performance.",
        "Develop your core strengths through continuous learning and seek feedback from trusted colleagues.",
        "Look for opportunities to address societal needs in your work to create meaningful impact.",
        "Find ways to monetize your unique skills and interests through side projects or career pivots.",
        "Build a network with people who share your values but bring different skills to the table.",
        "Set aside time each week for reflection on how your work aligns with your ikigai elements.",
        "Create a personal development plan that balances all four aspects of your ikigai.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
