use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::aspects::NatalAspect;
use crate::natal::NatalPlacement;
use crate::zodiac::ZodiacSign;

/// Placements needed in one sign or house to form a stellium.
pub const STELLIUM_MIN: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Configuration {
    GrandTrine,
    TSquare,
    GrandCross,
    Yod,
    Stellium,
}

impl Configuration {
    pub fn id(&self) -> &'static str {
        match self {
            Configuration::GrandTrine => "grand-trine",
            Configuration::TSquare => "t-square",
            Configuration::GrandCross => "grand-cross",
            Configuration::Yod => "yod",
            Configuration::Stellium => "stellium",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Configuration::GrandTrine => "Grand Trine",
            Configuration::TSquare => "T-Square",
            Configuration::GrandCross => "Grand Cross",
            Configuration::Yod => "Yod",
            Configuration::Stellium => "Stellium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatalConfiguration {
    pub id: String,
    pub profile_id: String,
    pub configuration_id: String,
    pub placement_ids: Vec<String>,
    pub full_name: String,
}

/// Aspect lookup keyed by unordered planet pair.
struct AspectGraph<'a> {
    edges: BTreeMap<(&'a str, &'a str), &'a str>,
    planets: Vec<&'a str>,
}

impl<'a> AspectGraph<'a> {
    fn new(aspects: &'a [NatalAspect]) -> Self {
        let mut edges = BTreeMap::new();
        let mut planets: Vec<&str> = Vec::new();
        for aspect in aspects {
            let (a, b) = (aspect.planet1_id.as_str(), aspect.planet2_id.as_str());
            edges.insert(Self::key(a, b), aspect.aspect_id.as_str());
            for planet in [a, b] {
                if !planets.contains(&planet) {
                    planets.push(planet);
                }
            }
        }
        AspectGraph { edges, planets }
    }

    fn key(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn is(&self, a: &str, b: &str, aspect_id: &str) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.edges.get(&key).map_or(false, |id| *id == aspect_id)
    }
}

/// Every unordered triple of `items`.
fn triples<'a>(items: &[&'a str]) -> Vec<[&'a str; 3]> {
    let mut out = Vec::new();
    for i in 0..items.len() {
        for j in i + 1..items.len() {
            for k in j + 1..items.len() {
                out.push([items[i], items[j], items[k]]);
            }
        }
    }
    out
}

/// Aspect patterns (Grand Trine, T-Square, Grand Cross, Yod) from natal
/// aspects, and stelliums from placements grouped by sign and by house.
///
/// A T-Square that is part of a Grand Cross is only reported as the cross.
pub fn detect_configurations(
    profile_id: &str,
    placements: &[NatalPlacement],
    aspects: &[NatalAspect],
) -> Vec<NatalConfiguration> {
    let graph = AspectGraph::new(aspects);
    let mut found: Vec<(Configuration, Vec<&str>, String)> = Vec::new();

    // Grand Trine: three mutual trines
    for [a, b, c] in triples(&graph.planets) {
        if graph.is(a, b, "trine") && graph.is(b, c, "trine") && graph.is(a, c, "trine") {
            found.push((Configuration::GrandTrine, vec![a, b, c], String::new()));
        }
    }

    // Grand Cross: two oppositions whose ends are all square to each other
    let oppositions: Vec<(&str, &str)> = graph
        .edges
        .iter()
        .filter(|(_, id)| **id == "opposition")
        .map(|((a, b), _)| (*a, *b))
        .collect();
    let mut crosses: Vec<BTreeSet<&str>> = Vec::new();
    for (i, (a, c)) in oppositions.iter().enumerate() {
        for (b, d) in &oppositions[i + 1..] {
            let squares = graph.is(a, b, "square")
                && graph.is(b, c, "square")
                && graph.is(c, d, "square")
                && graph.is(d, a, "square");
            if squares {
                crosses.push([*a, *b, *c, *d].into_iter().collect());
                found.push((Configuration::GrandCross, vec![*a, *b, *c, *d], String::new()));
            }
        }
    }

    // T-Square: an opposition with a planet square to both ends
    for (a, b) in &oppositions {
        for apex in &graph.planets {
            if apex == a || apex == b {
                continue;
            }
            if graph.is(a, apex, "square") && graph.is(b, apex, "square") {
                let in_cross = crosses
                    .iter()
                    .any(|cross| cross.contains(a) && cross.contains(b) && cross.contains(apex));
                if !in_cross {
                    found.push((Configuration::TSquare, vec![*a, *b, *apex], String::new()));
                }
            }
        }
    }

    // Yod: a sextile pair both quincunx the apex
    for (pair, id) in &graph.edges {
        if *id != "sextile" {
            continue;
        }
        let (a, b) = *pair;
        for apex in &graph.planets {
            if *apex == a || *apex == b {
                continue;
            }
            if graph.is(a, apex, "quincunx") && graph.is(b, apex, "quincunx") {
                found.push((Configuration::Yod, vec![a, b, *apex], String::new()));
            }
        }
    }

    // Stellium: by sign, then by house
    let mut by_sign: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    let mut by_house: BTreeMap<u8, Vec<&str>> = BTreeMap::new();
    for placement in placements {
        if let Some(sign) = ZodiacSign::from_id(&placement.sign_id) {
            by_sign.entry(sign.index()).or_default().push(&placement.planet_id);
        }
        if let Some(house) = placement.house_number() {
            by_house.entry(house).or_default().push(&placement.planet_id);
        }
    }
    for (index, planets) in by_sign {
        if planets.len() >= STELLIUM_MIN {
            let sign = ZodiacSign::from_index(index);
            found.push((Configuration::Stellium, planets, format!(" in {}", sign.name())));
        }
    }
    for (house, planets) in by_house {
        if planets.len() >= STELLIUM_MIN {
            found.push((
                Configuration::Stellium,
                planets,
                format!(" in the {} House", ordinal(house)),
            ));
        }
    }

    found
        .into_iter()
        .enumerate()
        .map(|(index, (configuration, planets, qualifier))| NatalConfiguration {
            id: format!("{}-configuration-{}", profile_id, index),
            profile_id: profile_id.to_string(),
            configuration_id: configuration.id().to_string(),
            placement_ids: planets
                .iter()
                .map(|planet| format!("{}-{}", profile_id, planet))
                .collect(),
            full_name: format!(
                "{}{}: {}",
                configuration.name(),
                qualifier,
                planets
                    .iter()
                    .map(|planet| display_name(planet))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
        .collect()
}

fn display_name(planet_id: &str) -> String {
    planet_id
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn ordinal(n: u8) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
