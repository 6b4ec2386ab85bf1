use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StretchCategory {
    Seated,
    Standing,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stretch {
    pub title: &'static str,
    pub description: &'static str,
    pub category: StretchCategory,
}

const fn seated(title: &'static str, description: &'static str) -> Stretch {
    Stretch {
        title,
        description,
        category: StretchCategory::Seated,
    }
}

const fn standing(title: &'static str, description: &'static str) -> Stretch {
    Stretch {
        title,
        description,
        category: StretchCategory::Standing,
    }
}

pub const SEATED_STRETCHES: [Stretch; 7] = [
    seated("Neck rolls", "Slowly roll your head around to loosen the neck muscles."),
    seated("Shoulder shrugs", "Shrug your shoulders up, hold for five seconds, then let go."),
    seated("Overhead reach", "Stretch both arms above your head and reach up tall."),
    seated("Ankle circles", "Lift one foot and slowly circle the ankle, then switch."),
    seated("Forward fold", "Bend forward from the hips and let your back stretch out."),
    seated("Seated twist", "Stay seated and twist your upper body left, then right."),
    seated("Wrist stretch", "Bend the wrist back and gently pull the fingers toward you."),
];

pub const STANDING_STRETCHES: [Stretch; 7] = [
    standing("Achilles stretch", "Step one foot forward and stretch the back leg's heel."),
    standing("Quad stretch", "Hold the top of your foot behind you to stretch the front thigh."),
    standing("Side bend", "Reach one arm overhead and lean your body to the side."),
    standing("Shoulder circles", "Roll your shoulders in big circles, forward then back."),
    standing("Calf stretch", "Lean into a wall with one leg back to stretch the calf."),
    standing("Standing forward bend", "Fold forward from the hips to stretch back and hamstrings."),
    standing("Cross-body arm stretch", "Pull one arm across your chest to stretch the shoulder."),
];

/// Random picks from each catalog for a break suggestion.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StretchSuggestions {
    pub seated: Vec<Stretch>,
    pub standing: Vec<Stretch>,
}

/// Up to `per_category` distinct stretches from each catalog.
pub fn suggest<R: Rng + ?Sized>(rng: &mut R, per_category: usize) -> StretchSuggestions {
    StretchSuggestions {
        seated: SEATED_STRETCHES
            .choose_multiple(rng, per_category)
            .copied()
            .collect(),
        standing: STANDING_STRETCHES
            .choose_multiple(rng, per_category)
            .copied()
            .collect(),
    }
}

/// One stretch from either catalog.
pub fn pick_one<R: Rng + ?Sized>(rng: &mut R) -> Stretch {
    let all: Vec<&Stretch> = SEATED_STRETCHES.iter().chain(STANDING_STRETCHES.iter()).collect();
    all.choose(rng).map(|s| **s).unwrap_or(SEATED_STRETCHES[0])
}
