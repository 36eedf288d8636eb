// ═══════════════════════════════════════════════════════════════════════
// Building catalog - costs, VP, effects (static data)
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;

// ── Effects ────────────────────────────────────────────────────────────

/// What a worker on the building gets to do during activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Automatic production.
    Gain(Resources),
    /// Pick exactly one bundle.
    Choice(&'static [Resources]),
    /// Sell one cube for a fixed price.
    Sell { price: u32 },
    /// Buy non-gold cubes one at a time.
    Buy { max: u8, cost_per: u32 },
    /// Construct from a stock bag.
    Build(StockTier),
    Convert(Converter),
    Lawyer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Converter {
    Church,
    Tailor,
    Bank,
    Alchemist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payment {
    Deniers(u32),
    Cloth(u32),
    /// Non-gold cubes, handed over one at a time.
    Cubes(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reward {
    Prestige(u32),
    Gold(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterTier {
    pub pay: Payment,
    pub gain: Reward,
}

impl Converter {
    /// Small tier first, large tier second.
    pub fn tiers(self) -> [ConverterTier; 2] {
        use Payment::*;
        use Reward::*;
        match self {
            Converter::Church => [
                ConverterTier { pay: Deniers(2), gain: Prestige(3) },
                ConverterTier { pay: Deniers(4), gain: Prestige(5) },
            ],
            Converter::Tailor => [
                ConverterTier { pay: Cloth(1), gain: Prestige(2) },
                ConverterTier { pay: Cloth(3), gain: Prestige(6) },
            ],
            Converter::Bank => [
                ConverterTier { pay: Deniers(2), gain: Gold(1) },
                ConverterTier { pay: Deniers(5), gain: Gold(2) },
            ],
            Converter::Alchemist => [
                ConverterTier { pay: Cubes(2), gain: Gold(1) },
                ConverterTier { pay: Cubes(4), gain: Gold(2) },
            ],
        }
    }
}

// ── Definitions ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingDef {
    pub id: BuildingId,
    pub name: &'static str,
    pub tier: Tier,
    pub cost: Resources,
    pub vp: u32,
    pub favors_on_build: u8,
    pub effect: Option<Effect>,
    /// Paid to a different owner when someone uses the building.
    pub owner_bonus: &'static [Resource],
    pub transformable: bool,
    /// Extra deniers the owner collects every income phase.
    pub income: u32,
}

impl BuildingDef {
    pub fn stock_tier(&self) -> Option<StockTier> {
        match self.tier {
            Tier::Wood => Some(StockTier::Wood),
            Tier::Stone => Some(StockTier::Stone),
            Tier::Prestige => Some(StockTier::Prestige),
            _ => None,
        }
    }

    /// Road buildings a worker may be placed on.
    pub fn accepts_workers(&self) -> bool {
        !matches!(self.tier, Tier::Prestige | Tier::Residential)
    }
}

const fn res(food: u32, wood: u32, stone: u32, cloth: u32, gold: u32) -> Resources {
    Resources { food, wood, stone, cloth, gold }
}

const FARM_BUNDLES: &[Resources] = &[res(2, 0, 0, 0, 0), res(0, 0, 0, 1, 0)];

const fn def(
    id: BuildingId,
    name: &'static str,
    tier: Tier,
    cost: Resources,
    vp: u32,
    effect: Option<Effect>,
) -> BuildingDef {
    BuildingDef {
        id,
        name,
        tier,
        cost,
        vp,
        favors_on_build: 0,
        effect,
        owner_bonus: &[],
        transformable: true,
        income: 0,
    }
}

const fn favors(mut d: BuildingDef, n: u8) -> BuildingDef {
    d.favors_on_build = n;
    d
}

const fn bonus(mut d: BuildingDef, options: &'static [Resource]) -> BuildingDef {
    d.owner_bonus = options;
    d
}

const fn income(mut d: BuildingDef, deniers: u32) -> BuildingDef {
    d.income = deniers;
    d
}

const fn fixed(mut d: BuildingDef) -> BuildingDef {
    d.transformable = false;
    d
}

use BuildingId as B;
use Effect as E;
use Tier as T;

const NONE: Resources = Resources::ZERO;

/// Indexed by `BuildingId as usize`.
static CATALOG: [BuildingDef; 36] = [
    // Neutral
    def(B::NeutralFarm,        "Farm",        T::Neutral, NONE, 0, Some(E::Choice(FARM_BUNDLES))),
    def(B::NeutralSawmill,     "Sawmill",     T::Neutral, NONE, 0, Some(E::Gain(res(0, 1, 0, 0, 0)))),
    def(B::NeutralQuarry,      "Quarry",      T::Neutral, NONE, 0, Some(E::Gain(res(0, 0, 1, 0, 0)))),
    def(B::NeutralCarpenter,   "Carpenter",   T::Neutral, NONE, 0, Some(E::Build(StockTier::Wood))),
    def(B::NeutralMarketplace, "Marketplace", T::Neutral, NONE, 0, Some(E::Sell { price: 4 })),
    def(B::NeutralPeddler,     "Peddler",     T::Neutral, NONE, 0, Some(E::Buy { max: 1, cost_per: 1 })),
    // Basic
    def(B::BasicPeddler,     "Peddler",     T::Basic, NONE, 0, Some(E::Buy { max: 1, cost_per: 1 })),
    def(B::BasicMarketplace, "Marketplace", T::Basic, NONE, 0, Some(E::Sell { price: 4 })),
    def(B::BasicGoldMine,    "Gold Mine",   T::Basic, NONE, 0, Some(E::Gain(res(0, 0, 0, 0, 1)))),
    // Wood
    def(B::WoodFarm,    "Farm",    T::Wood, res(1, 1, 0, 0, 0), 2, Some(E::Choice(FARM_BUNDLES))),
    def(B::WoodSawmill, "Sawmill", T::Wood, res(1, 1, 0, 0, 0), 2, Some(E::Gain(res(0, 2, 0, 0, 0)))),
    def(B::WoodQuarry,  "Quarry",  T::Wood, res(1, 1, 0, 0, 0), 2, Some(E::Gain(res(0, 0, 2, 0, 0)))),
    def(B::WoodMarket,  "Market",  T::Wood, res(0, 2, 0, 0, 0), 2, Some(E::Sell { price: 6 })),
    def(B::WoodPeddler, "Peddler", T::Wood, res(1, 1, 0, 0, 0), 2, Some(E::Buy { max: 2, cost_per: 2 })),
    def(B::Tailor,      "Tailor",  T::Wood, res(0, 1, 0, 1, 0), 3, Some(E::Convert(Converter::Tailor))),
    favors(def(B::Church, "Church", T::Wood, res(0, 1, 2, 0, 0), 4, Some(E::Convert(Converter::Church))), 1),
    fixed(def(B::Lawyer,  "Lawyer", T::Wood, res(0, 0, 1, 1, 0), 3, Some(E::Lawyer))),
    // Stone
    bonus(def(B::StoneFarm,    "Stone Farm",    T::Stone, res(1, 0, 2, 0, 0), 3, Some(E::Gain(res(2, 0, 0, 1, 0)))), &[Resource::Food, Resource::Cloth]),
    bonus(def(B::StoneSawmill, "Stone Sawmill", T::Stone, res(1, 0, 2, 0, 0), 3, Some(E::Gain(res(1, 2, 0, 0, 0)))), &[Resource::Wood, Resource::Food]),
    bonus(def(B::StoneQuarry,  "Stone Quarry",  T::Stone, res(1, 0, 2, 0, 0), 3, Some(E::Gain(res(1, 0, 2, 0, 0)))), &[Resource::Stone, Resource::Food]),
    def(B::StoneMarket,   "Stone Market", T::Stone, res(0, 1, 2, 0, 0), 3, Some(E::Sell { price: 8 })),
    def(B::Mason,         "Mason",        T::Stone, res(0, 1, 2, 0, 0), 3, Some(E::Build(StockTier::Stone))),
    def(B::Architect,     "Architect",    T::Stone, res(0, 0, 3, 0, 0), 4, Some(E::Build(StockTier::Prestige))),
    def(B::Bank,          "Bank",         T::Stone, res(0, 1, 2, 0, 0), 3, Some(E::Convert(Converter::Bank))),
    def(B::Alchemist,     "Alchemist",    T::Stone, res(0, 0, 2, 1, 0), 3, Some(E::Convert(Converter::Alchemist))),
    def(B::StoneGoldMine, "Gold Mine",    T::Stone, res(0, 1, 3, 0, 0), 4, Some(E::Gain(res(0, 0, 0, 0, 1)))),
    // Prestige
    favors(def(B::Statue,     "Statue",     T::Prestige, res(0, 0, 2, 0, 1), 7, None), 1),
    favors(def(B::Theater,    "Theater",    T::Prestige, res(0, 1, 1, 0, 1), 8, None), 1),
    favors(def(B::University, "University", T::Prestige, res(0, 1, 2, 0, 1), 8, None), 1),
    favors(def(B::Monument,   "Monument",   T::Prestige, res(0, 0, 3, 0, 2), 10, None), 2),
    def(B::Granary,    "Granary",    T::Prestige, res(0, 1, 1, 0, 1), 6, None),
    def(B::Weaver,     "Weaver",     T::Prestige, res(0, 0, 1, 1, 1), 6, None),
    def(B::Cathedral,  "Cathedral",  T::Prestige, res(0, 1, 3, 0, 2), 12, None),
    income(def(B::Library, "Library", T::Prestige, res(0, 0, 1, 0, 1), 5, None), 1),
    income(def(B::Hotel,   "Hotel",   T::Prestige, res(0, 1, 1, 0, 1), 5, None), 2),
    // Lawyer output
    income(def(B::Residential, "Residential", T::Residential, NONE, 0, None), 1),
];

pub fn building(id: BuildingId) -> &'static BuildingDef {
    &CATALOG[id as usize]
}

// ── Tier lists ─────────────────────────────────────────────────────────

pub const NEUTRAL_BUILDINGS: [BuildingId; 6] = [
    B::NeutralFarm,
    B::NeutralSawmill,
    B::NeutralQuarry,
    B::NeutralCarpenter,
    B::NeutralMarketplace,
    B::NeutralPeddler,
];

pub const BASIC_BUILDINGS: [BuildingId; 3] = [B::BasicPeddler, B::BasicMarketplace, B::BasicGoldMine];

pub const WOOD_BUILDINGS: [BuildingId; 8] = [
    B::WoodFarm,
    B::WoodSawmill,
    B::WoodQuarry,
    B::WoodMarket,
    B::WoodPeddler,
    B::Tailor,
    B::Church,
    B::Lawyer,
];

pub const STONE_BUILDINGS: [BuildingId; 9] = [
    B::StoneFarm,
    B::StoneSawmill,
    B::StoneQuarry,
    B::StoneMarket,
    B::Mason,
    B::Architect,
    B::Bank,
    B::Alchemist,
    B::StoneGoldMine,
];

pub const PRESTIGE_BUILDINGS: [BuildingId; 9] = [
    B::Statue,
    B::Theater,
    B::University,
    B::Monument,
    B::Granary,
    B::Weaver,
    B::Cathedral,
    B::Library,
    B::Hotel,
];

pub fn stock_list(tier: StockTier) -> &'static [BuildingId] {
    match tier {
        StockTier::Wood => &WOOD_BUILDINGS,
        StockTier::Stone => &STONE_BUILDINGS,
        StockTier::Prestige => &PRESTIGE_BUILDINGS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_indexed_by_id() {
        let all = NEUTRAL_BUILDINGS
            .iter()
            .chain(BASIC_BUILDINGS.iter())
            .chain(WOOD_BUILDINGS.iter())
            .chain(STONE_BUILDINGS.iter())
            .chain(PRESTIGE_BUILDINGS.iter())
            .chain(std::iter::once(&BuildingId::Residential));
        for (i, &id) in all.enumerate() {
            assert_eq!(id as usize, i);
            assert_eq!(building(id).id, id);
        }
    }

    #[test]
    fn test_tiers_match_lists() {
        for id in WOOD_BUILDINGS {
            assert_eq!(building(id).tier, Tier::Wood);
        }
        for id in STONE_BUILDINGS {
            assert_eq!(building(id).tier, Tier::Stone);
        }
        for id in PRESTIGE_BUILDINGS {
            assert_eq!(building(id).tier, Tier::Prestige);
            assert!(building(id).effect.is_none());
        }
    }

    #[test]
    fn test_favor_granting_buildings() {
        let granting: Vec<_> = CATALOG.iter().filter(|d| d.favors_on_build > 0).map(|d| d.id).collect();
        assert_eq!(
            granting,
            vec![B::Church, B::Statue, B::Theater, B::University, B::Monument]
        );
        assert_eq!(building(B::Monument).favors_on_build, 2);
    }

    #[test]
    fn test_only_lawyer_is_fixed() {
        let fixed: Vec<_> = CATALOG.iter().filter(|d| !d.transformable).map(|d| d.id).collect();
        assert_eq!(fixed, vec![B::Lawyer]);
    }

    #[test]
    fn test_owner_bonuses_on_stone_producers() {
        for d in CATALOG.iter().filter(|d| !d.owner_bonus.is_empty()) {
            assert_eq!(d.tier, Tier::Stone);
            assert_eq!(d.owner_bonus.len(), 2);
        }
    }
}
