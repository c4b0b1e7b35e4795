use serde::{Deserialize, Serialize};

use crate::ephemeris::{find_position, PlanetaryPosition};
use crate::error::{BlueprintError, Result};
use crate::human_design::{gate_at, GateLine};
use crate::zodiac::Planet;

/// Which chart a sphere reads its planet from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChartSide {
    Natal,
    Design,
}

// ---------------------------
// ## Spheres
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Sphere {
    LifesWork,
    Evolution,
    Radiance,
    Purpose,
    Attraction,
    Iq,
    Eq,
    Sq,
    Core,
    Vocation,
    Culture,
    Pearl,
    Brand,
    Relating,
    Creativity,
    Stability,
}

impl Sphere {
    /// Activation, Venus and Pearl sequences followed by the additional spheres.
    pub const ALL: [Sphere; 16] = [
        Sphere::LifesWork,
        Sphere::Evolution,
        Sphere::Radiance,
        Sphere::Purpose,
        Sphere::Attraction,
        Sphere::Iq,
        Sphere::Eq,
        Sphere::Sq,
        Sphere::Core,
        Sphere::Vocation,
        Sphere::Culture,
        Sphere::Pearl,
        Sphere::Brand,
        Sphere::Relating,
        Sphere::Creativity,
        Sphere::Stability,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Sphere::LifesWork => "Life's Work",
            Sphere::Evolution => "Evolution",
            Sphere::Radiance => "Radiance",
            Sphere::Purpose => "Purpose",
            Sphere::Attraction => "Attraction",
            Sphere::Iq => "IQ",
            Sphere::Eq => "EQ",
            Sphere::Sq => "SQ",
            Sphere::Core => "Core",
            Sphere::Vocation => "Vocation",
            Sphere::Culture => "Culture",
            Sphere::Pearl => "Pearl",
            Sphere::Brand => "Brand",
            Sphere::Relating => "Relating",
            Sphere::Creativity => "Creativity",
            Sphere::Stability => "Stability",
        }
    }

    /// Field name in a serialized Gene Keys profile.
    pub fn key(&self) -> &'static str {
        match self {
            Sphere::LifesWork => "lifesWork",
            Sphere::Evolution => "evolution",
            Sphere::Radiance => "radiance",
            Sphere::Purpose => "purpose",
            Sphere::Attraction => "attraction",
            Sphere::Iq => "iq",
            Sphere::Eq => "eq",
            Sphere::Sq => "sq",
            Sphere::Core => "core",
            Sphere::Vocation => "vocation",
            Sphere::Culture => "culture",
            Sphere::Pearl => "pearl",
            Sphere::Brand => "brand",
            Sphere::Relating => "relating",
            Sphere::Creativity => "creativity",
            Sphere::Stability => "stability",
        }
    }

    pub fn source(&self) -> (ChartSide, Planet) {
        use ChartSide::{Design, Natal};
        match self {
            Sphere::LifesWork | Sphere::Brand => (Natal, Planet::Sun),
            Sphere::Evolution => (Natal, Planet::Earth),
            Sphere::Radiance => (Design, Planet::Sun),
            Sphere::Purpose => (Design, Planet::Earth),
            Sphere::Attraction => (Design, Planet::Moon),
            Sphere::Iq => (Natal, Planet::Venus),
            Sphere::Eq => (Natal, Planet::Mars),
            Sphere::Sq => (Design, Planet::Venus),
            Sphere::Core | Sphere::Vocation => (Design, Planet::Mars),
            Sphere::Culture => (Design, Planet::Jupiter),
            Sphere::Pearl => (Natal, Planet::Jupiter),
            Sphere::Relating => (Natal, Planet::Mercury),
            Sphere::Creativity => (Design, Planet::Uranus),
            Sphere::Stability => (Design, Planet::Saturn),
        }
    }

    /// `Natal Venus`, `Pre-Natal / Design Mars`
    pub fn planetary_source(&self) -> String {
        let (side, planet) = self.source();
        match side {
            ChartSide::Natal => format!("Natal {}", planet.name()),
            ChartSide::Design => format!("Pre-Natal / Design {}", planet.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneKeySphere {
    pub sphere_name: String,
    pub gene_key_id: String,
    pub gene_key_number: u8,
    pub line: u8,
    pub planetary_source: String,
}

pub fn gene_key_id(number: u8) -> String {
    format!("gk-{}", number)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneKeysCoreKey {
    pub gene_key_id: String,
    pub gene_key_number: u8,
    pub line: u8,
    pub sphere_name: String,
}

impl GeneKeysCoreKey {
    fn new(gate_line: GateLine, sphere_name: &str) -> Self {
        GeneKeysCoreKey {
            gene_key_id: gene_key_id(gate_line.gate),
            gene_key_number: gate_line.gate,
            line: gate_line.line,
            sphere_name: sphere_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneKeysCoreIdentity {
    pub sun: GeneKeysCoreKey,
    pub moon: GeneKeysCoreKey,
    pub mercury: GeneKeysCoreKey,
    pub ascendant: GeneKeysCoreKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneKeysProfile {
    pub lifes_work: GeneKeySphere,
    pub evolution: GeneKeySphere,
    pub radiance: GeneKeySphere,
    pub purpose: GeneKeySphere,
    pub attraction: GeneKeySphere,
    pub iq: GeneKeySphere,
    pub eq: GeneKeySphere,
    pub sq: GeneKeySphere,
    pub core: GeneKeySphere,
    pub vocation: GeneKeySphere,
    pub culture: GeneKeySphere,
    pub pearl: GeneKeySphere,
    pub brand: GeneKeySphere,
    pub relating: GeneKeySphere,
    pub creativity: GeneKeySphere,
    pub stability: GeneKeySphere,
    pub core_identity: GeneKeysCoreIdentity,
}

impl GeneKeysProfile {
    pub fn sphere(&self, sphere: Sphere) -> &GeneKeySphere {
        match sphere {
            Sphere::LifesWork => &self.lifes_work,
            Sphere::Evolution => &self.evolution,
            Sphere::Radiance => &self.radiance,
            Sphere::Purpose => &self.purpose,
            Sphere::Attraction => &self.attraction,
            Sphere::Iq => &self.iq,
            Sphere::Eq => &self.eq,
            Sphere::Sq => &self.sq,
            Sphere::Core => &self.core,
            Sphere::Vocation => &self.vocation,
            Sphere::Culture => &self.culture,
            Sphere::Pearl => &self.pearl,
            Sphere::Brand => &self.brand,
            Sphere::Relating => &self.relating,
            Sphere::Creativity => &self.creativity,
            Sphere::Stability => &self.stability,
        }
    }

    pub fn spheres(&self) -> impl Iterator<Item = (Sphere, &GeneKeySphere)> + '_ {
        Sphere::ALL.iter().map(move |s| (*s, self.sphere(*s)))
    }
}

// ---------------------------
// ## Calculation
// ---------------------------

fn gate_of(positions: &[PlanetaryPosition], planet: Planet, side: ChartSide) -> Result<GateLine> {
    find_position(positions, planet)
        .map(|p| gate_at(p.longitude))
        .ok_or_else(|| {
            let chart = match side {
                ChartSide::Natal => "natal",
                ChartSide::Design => "design",
            };
            BlueprintError::InvalidInput(format!("{} chart has no {} position", chart, planet.id()))
        })
}

fn build_sphere(
    sphere: Sphere,
    natal: &[PlanetaryPosition],
    design: &[PlanetaryPosition],
) -> Result<GeneKeySphere> {
    let (side, planet) = sphere.source();
    let positions = match side {
        ChartSide::Natal => natal,
        ChartSide::Design => design,
    };
    let gate_line = gate_of(positions, planet, side)?;
    Ok(GeneKeySphere {
        sphere_name: sphere.name().to_string(),
        gene_key_id: gene_key_id(gate_line.gate),
        gene_key_number: gate_line.gate,
        line: gate_line.line,
        planetary_source: sphere.planetary_source(),
    })
}

/// Gene Keys profile. Gene Key numbers are the Human Design gate numbers
/// of each sphere's source planet.
pub fn calculate_gene_keys_profile(
    natal: &[PlanetaryPosition],
    design: &[PlanetaryPosition],
    ascendant_longitude: f64,
) -> Result<GeneKeysProfile> {
    let sphere = |s: Sphere| build_sphere(s, natal, design);
    let natal_key = |planet: Planet| gate_of(natal, planet, ChartSide::Natal);

    Ok(GeneKeysProfile {
        lifes_work: sphere(Sphere::LifesWork)?,
        evolution: sphere(Sphere::Evolution)?,
        radiance: sphere(Sphere::Radiance)?,
        purpose: sphere(Sphere::Purpose)?,
        attraction: sphere(Sphere::Attraction)?,
        iq: sphere(Sphere::Iq)?,
        eq: sphere(Sphere::Eq)?,
        sq: sphere(Sphere::Sq)?,
        core: sphere(Sphere::Core)?,
        vocation: sphere(Sphere::Vocation)?,
        culture: sphere(Sphere::Culture)?,
        pearl: sphere(Sphere::Pearl)?,
        brand: sphere(Sphere::Brand)?,
        relating: sphere(Sphere::Relating)?,
        creativity: sphere(Sphere::Creativity)?,
        stability: sphere(Sphere::Stability)?,
        core_identity: GeneKeysCoreIdentity {
            sun: GeneKeysCoreKey::new(natal_key(Planet::Sun)?, "Life's Work"),
            moon: GeneKeysCoreKey::new(natal_key(Planet::Moon)?, "Emotional Core"),
            mercury: GeneKeysCoreKey::new(natal_key(Planet::Mercury)?, "Relating"),
            ascendant: GeneKeysCoreKey::new(gate_at(ascendant_longitude), "Aura"),
        },
    })
}
