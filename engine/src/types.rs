// ═══════════════════════════════════════════════════════════════════════
// Core types - resources, players, road, castle, pending interactions
// ═══════════════════════════════════════════════════════════════════════

use crate::error::Rejection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of entries kept in `GameState::log`.
pub const LOG_CAPACITY: usize = 150;

// ── Enums ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerColor {
    Blue,
    Red,
    Green,
    Orange,
    Black,
}

impl PlayerColor {
    pub const ALL: [PlayerColor; 5] = [
        PlayerColor::Blue,
        PlayerColor::Red,
        PlayerColor::Green,
        PlayerColor::Orange,
        PlayerColor::Black,
    ];
}

impl std::fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerColor::Blue => write!(f, "Blue"),
            PlayerColor::Red => write!(f, "Red"),
            PlayerColor::Green => write!(f, "Green"),
            PlayerColor::Orange => write!(f, "Orange"),
            PlayerColor::Black => write!(f, "Black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Food,
    Wood,
    Stone,
    Cloth,
    Gold,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Food,
        Resource::Wood,
        Resource::Stone,
        Resource::Cloth,
        Resource::Gold,
    ];

    /// Everything except gold. Peddlers sell these, the alchemist eats them.
    pub const CUBES: [Resource; 4] = [
        Resource::Food,
        Resource::Wood,
        Resource::Stone,
        Resource::Cloth,
    ];
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Food => write!(f, "food"),
            Resource::Wood => write!(f, "wood"),
            Resource::Stone => write!(f, "stone"),
            Resource::Cloth => write!(f, "cloth"),
            Resource::Gold => write!(f, "gold"),
        }
    }
}

/// The seven phases of a turn, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Income,
    Workers,
    Special,
    Provost,
    Activation,
    Castle,
    EndTurn,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Income => write!(f, "1. Income"),
            Phase::Workers => write!(f, "2. Workers"),
            Phase::Special => write!(f, "3. Special"),
            Phase::Provost => write!(f, "4. Provost"),
            Phase::Activation => write!(f, "5. Activate"),
            Phase::Castle => write!(f, "6. Castle"),
            Phase::EndTurn => write!(f, "7. End Turn"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FavorTrack {
    Prestige,
    Deniers,
    Resources,
    Buildings,
}

impl FavorTrack {
    pub const ALL: [FavorTrack; 4] = [
        FavorTrack::Prestige,
        FavorTrack::Deniers,
        FavorTrack::Resources,
        FavorTrack::Buildings,
    ];
}

impl std::fmt::Display for FavorTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FavorTrack::Prestige => write!(f, "Prestige"),
            FavorTrack::Deniers => write!(f, "Deniers"),
            FavorTrack::Resources => write!(f, "Resources"),
            FavorTrack::Buildings => write!(f, "Buildings"),
        }
    }
}

/// Building category. Decides where a building may stand and what may
/// happen to it (placement, transformation, replacement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Neutral,
    Basic,
    Wood,
    Stone,
    Prestige,
    Residential,
}

/// The three bags of buildings that can still be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockTier {
    Wood,
    Stone,
    Prestige,
}

impl std::fmt::Display for StockTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockTier::Wood => write!(f, "wood"),
            StockTier::Stone => write!(f, "stone"),
            StockTier::Prestige => write!(f, "prestige"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialBuilding {
    Gate,
    TradingPost,
    MerchantsGuild,
    JoustField,
    Stables,
    Inn,
}

impl SpecialBuilding {
    pub const ALL: [SpecialBuilding; 6] = [
        SpecialBuilding::Gate,
        SpecialBuilding::TradingPost,
        SpecialBuilding::MerchantsGuild,
        SpecialBuilding::JoustField,
        SpecialBuilding::Stables,
        SpecialBuilding::Inn,
    ];
}

impl std::fmt::Display for SpecialBuilding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecialBuilding::Gate => write!(f, "Gate"),
            SpecialBuilding::TradingPost => write!(f, "Trading Post"),
            SpecialBuilding::MerchantsGuild => write!(f, "Merchants' Guild"),
            SpecialBuilding::JoustField => write!(f, "Joust Field"),
            SpecialBuilding::Stables => write!(f, "Stables"),
            SpecialBuilding::Inn => write!(f, "Inn"),
        }
    }
}

// ── Building ID ────────────────────────────────────────────────────────
// Compact, copyable building identifier. Index into the static catalog.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingId {
    // Neutral
    NeutralFarm, NeutralSawmill, NeutralQuarry, NeutralCarpenter, NeutralMarketplace, NeutralPeddler,
    // Basic
    BasicPeddler, BasicMarketplace, BasicGoldMine,
    // Wood
    WoodFarm, WoodSawmill, WoodQuarry, WoodMarket, WoodPeddler, Tailor, Church, Lawyer,
    // Stone
    StoneFarm, StoneSawmill, StoneQuarry, StoneMarket, Mason, Architect, Bank, Alchemist, StoneGoldMine,
    // Prestige
    Statue, Theater, University, Monument, Granary, Weaver, Cathedral, Library, Hotel,
    // Produced by the lawyer
    Residential,
}

// ── Resources ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    pub food: u32,
    pub wood: u32,
    pub stone: u32,
    pub cloth: u32,
    pub gold: u32,
}

impl Resources {
    pub const ZERO: Resources = Resources { food: 0, wood: 0, stone: 0, cloth: 0, gold: 0 };

    pub fn get(&self, r: Resource) -> u32 {
        match r {
            Resource::Food => self.food,
            Resource::Wood => self.wood,
            Resource::Stone => self.stone,
            Resource::Cloth => self.cloth,
            Resource::Gold => self.gold,
        }
    }

    pub fn get_mut(&mut self, r: Resource) -> &mut u32 {
        match r {
            Resource::Food => &mut self.food,
            Resource::Wood => &mut self.wood,
            Resource::Stone => &mut self.stone,
            Resource::Cloth => &mut self.cloth,
            Resource::Gold => &mut self.gold,
        }
    }

    /// True if these holdings pay for `cost` in full.
    pub fn covers(&self, cost: &Resources) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) >= cost.get(r))
    }

    pub fn add(&mut self, other: &Resources) {
        for r in Resource::ALL {
            *self.get_mut(r) += other.get(r);
        }
    }

    /// Caller must check `covers` first.
    pub fn subtract(&mut self, cost: &Resources) {
        for r in Resource::ALL {
            let held = self.get_mut(r);
            *held = held.saturating_sub(cost.get(r));
        }
    }

    pub fn total(&self) -> u32 {
        Resource::ALL.iter().map(|&r| self.get(r)).sum()
    }

    pub fn cubes_without_gold(&self) -> u32 {
        Resource::CUBES.iter().map(|&r| self.get(r)).sum()
    }

    /// Non-zero entries in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(move |r| (r, self.get(r)))
            .filter(|&(_, n)| n > 0)
    }
}

impl std::fmt::Display for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.entries().map(|(r, n)| format!("{n} {r}")).collect();
        if parts.is_empty() {
            write!(f, "nothing")
        } else {
            write!(f, "{}", parts.join(" + "))
        }
    }
}

// ── Player ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub total: u32,
    pub placed: u32,
}

impl Pool {
    pub fn available(&self) -> u32 {
        self.total.saturating_sub(self.placed)
    }
}

/// Level reached on each royal favor track (0–5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FavorLevels {
    pub prestige: u8,
    pub deniers: u8,
    pub resources: u8,
    pub buildings: u8,
}

impl FavorLevels {
    pub fn get(&self, track: FavorTrack) -> u8 {
        match track {
            FavorTrack::Prestige => self.prestige,
            FavorTrack::Deniers => self.deniers,
            FavorTrack::Resources => self.resources,
            FavorTrack::Buildings => self.buildings,
        }
    }

    pub fn get_mut(&mut self, track: FavorTrack) -> &mut u8 {
        match track {
            FavorTrack::Prestige => &mut self.prestige,
            FavorTrack::Deniers => &mut self.deniers,
            FavorTrack::Resources => &mut self.resources,
            FavorTrack::Buildings => &mut self.buildings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub color: PlayerColor,
    pub resources: Resources,
    pub deniers: u32,
    pub score: u32,
    pub workers: Pool,
    pub houses: Pool,
    pub favors: FavorLevels,
    pub passed: bool,
    pub pass_order: Option<usize>,
    /// Holds the discounted (right) inn slot: every worker costs 1 denier.
    pub inn_occupant: bool,
    pub turn_order: usize,
}

impl Player {
    /// Lose VP, never dropping below zero.
    pub fn penalize(&mut self, vp: u32) {
        self.score = self.score.saturating_sub(vp);
    }
}

// ── Road ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slot {
    pub building: Option<BuildingId>,
    /// Owner's house marker.
    pub house: Option<PlayerColor>,
    pub worker: Option<PlayerColor>,
}

/// A lawyer paid to transform a building whose slot was still occupied.
/// Applied as soon as the worker leaves the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedTransformation {
    pub target_index: usize,
    pub lawyer: PlayerColor,
    pub old_building: BuildingId,
}

// ── Special buildings ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecialSlots {
    pub gate: Option<PlayerColor>,
    pub trading_post: Option<PlayerColor>,
    pub merchants_guild: Option<PlayerColor>,
    pub joust_field: Option<PlayerColor>,
    /// Filled left to right; entry order decides the new turn order.
    pub stables: [Option<PlayerColor>; 3],
    /// Entered this turn.
    pub inn_left: Option<PlayerColor>,
    /// Discount seat, kept across turns.
    pub inn_right: Option<PlayerColor>,
}

impl SpecialSlots {
    /// Workers of `color` currently sitting on special buildings.
    pub fn workers_of(&self, color: PlayerColor) -> usize {
        [
            self.gate,
            self.trading_post,
            self.merchants_guild,
            self.joust_field,
            self.stables[0],
            self.stables[1],
            self.stables[2],
            self.inn_left,
            self.inn_right,
        ]
        .iter()
        .filter(|&&w| w == Some(color))
        .count()
    }
}

// ── Castle ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionId {
    Dungeon,
    Walls,
    Towers,
}

impl SectionId {
    pub fn capacity(self) -> usize {
        match self {
            SectionId::Dungeon => 6,
            SectionId::Walls => 10,
            SectionId::Towers => 14,
        }
    }

    pub fn vp_per_batch(self) -> u32 {
        match self {
            SectionId::Dungeon => 5,
            SectionId::Walls => 4,
            SectionId::Towers => 3,
        }
    }

    /// Bailiff position that forces a count of this section.
    pub fn trigger(self) -> usize {
        match self {
            SectionId::Dungeon => 10,
            SectionId::Walls => 16,
            SectionId::Towers => 22,
        }
    }

    pub fn next(self) -> Option<SectionId> {
        match self {
            SectionId::Dungeon => Some(SectionId::Walls),
            SectionId::Walls => Some(SectionId::Towers),
            SectionId::Towers => None,
        }
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionId::Dungeon => write!(f, "Dungeon"),
            SectionId::Walls => write!(f, "Walls"),
            SectionId::Towers => write!(f, "Towers"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastleSection {
    pub houses: Vec<Option<PlayerColor>>,
    pub counted: bool,
}

impl CastleSection {
    pub fn new(id: SectionId) -> Self {
        CastleSection { houses: vec![None; id.capacity()], counted: false }
    }

    pub fn has_room(&self) -> bool {
        self.houses.iter().any(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        !self.has_room()
    }

    pub fn houses_of(&self, color: PlayerColor) -> usize {
        self.houses.iter().filter(|&&h| h == Some(color)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Castle {
    pub current: SectionId,
    pub dungeon: CastleSection,
    pub walls: CastleSection,
    pub towers: CastleSection,
    /// Castle workers in placement order.
    pub workers: Vec<PlayerColor>,
}

impl Castle {
    pub fn new() -> Self {
        Castle {
            current: SectionId::Dungeon,
            dungeon: CastleSection::new(SectionId::Dungeon),
            walls: CastleSection::new(SectionId::Walls),
            towers: CastleSection::new(SectionId::Towers),
            workers: Vec::new(),
        }
    }

    pub fn section(&self, id: SectionId) -> &CastleSection {
        match id {
            SectionId::Dungeon => &self.dungeon,
            SectionId::Walls => &self.walls,
            SectionId::Towers => &self.towers,
        }
    }

    pub fn section_mut(&mut self, id: SectionId) -> &mut CastleSection {
        match id {
            SectionId::Dungeon => &mut self.dungeon,
            SectionId::Walls => &mut self.walls,
            SectionId::Towers => &mut self.towers,
        }
    }

    /// Section the next batch lands in: the current one, or the next if
    /// the current one is full. `None` when there is no room anywhere.
    pub fn open_section(&self) -> Option<SectionId> {
        if self.section(self.current).has_room() {
            return Some(self.current);
        }
        self.current.next().filter(|&next| self.section(next).has_room())
    }
}

impl Default for Castle {
    fn default() -> Self {
        Self::new()
    }
}

// ── Building stock ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildingStock {
    pub wood: Vec<BuildingId>,
    pub stone: Vec<BuildingId>,
    pub prestige: Vec<BuildingId>,
}

impl BuildingStock {
    pub fn tier(&self, tier: StockTier) -> &[BuildingId] {
        match tier {
            StockTier::Wood => &self.wood,
            StockTier::Stone => &self.stone,
            StockTier::Prestige => &self.prestige,
        }
    }

    pub fn tier_mut(&mut self, tier: StockTier) -> &mut Vec<BuildingId> {
        match tier {
            StockTier::Wood => &mut self.wood,
            StockTier::Stone => &mut self.stone,
            StockTier::Prestige => &mut self.prestige,
        }
    }

    /// Remove a building from its bag. Returns false if it was not there.
    pub fn take(&mut self, tier: StockTier, id: BuildingId) -> bool {
        let bag = self.tier_mut(tier);
        match bag.iter().position(|&b| b == id) {
            Some(pos) => {
                bag.remove(pos);
                true
            }
            None => false,
        }
    }
}

// ── Pending interaction types ──────────────────────────────────────────

/// Coarse discriminant of `PendingInteraction`, used in rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PendingKind {
    Gate,
    OwnerBonus,
    Inn,
    Favor,
    FavorSubChoice,
    Provost,
    Activation,
    Castle,
}

impl std::fmt::Display for PendingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingKind::Gate => write!(f, "gate"),
            PendingKind::OwnerBonus => write!(f, "owner bonus"),
            PendingKind::Inn => write!(f, "inn"),
            PendingKind::Favor => write!(f, "favor"),
            PendingKind::FavorSubChoice => write!(f, "favor sub-choice"),
            PendingKind::Provost => write!(f, "provost"),
            PendingKind::Activation => write!(f, "activation"),
            PendingKind::Castle => write!(f, "castle"),
        }
    }
}

/// Where the engine picks up once a favor queue has drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavorContinuation {
    /// Joust Field paid out; continue with stables and inn.
    ResumeSpecial,
    /// A building granted favors on construction; walk on down the road.
    ResumeActivation,
    /// Best castle builder rewarded; run the end of turn.
    AfterCastle,
    /// Section counting rewarded; close the turn.
    AfterCount,
}

/// One player's share of a favor batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavorGrant {
    pub player: PlayerColor,
    pub remaining: u8,
    /// Tracks already taken in this batch; each track is usable once.
    pub tracks_used: Vec<FavorTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavorQueue {
    pub grants: Vec<FavorGrant>,
    pub index: usize,
    pub sub_choice: Option<FavorSubChoice>,
    pub resume: FavorContinuation,
}

impl FavorQueue {
    pub fn current(&self) -> Option<&FavorGrant> {
        self.grants.get(self.index)
    }

    pub fn current_mut(&mut self) -> Option<&mut FavorGrant> {
        self.grants.get_mut(self.index)
    }
}

/// Second-level decision after picking a favor track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavorSubChoice {
    /// Take 1..=max_level VP.
    PrestigeLevel { max_level: u8 },
    /// Take level + 2 deniers for a level in 1..=max_level.
    DeniersLevel { max_level: u8 },
    /// Use any resource-track level in 1..=max_level.
    ResourceLevel { max_level: u8 },
    WoodOrStone,
    /// Give one cube for the swap...
    SwapGive,
    /// ...then take two non-gold cubes, one at a time.
    SwapTake { picks: u8 },
    /// Use any building-track level in 2..=max_level, or skip.
    BuildingLevel { max_level: u8 },
    /// Build from a stock bag for one resource less.
    DiscountBuild { tier: StockTier },
    /// Pick the residential a discounted prestige building replaces.
    DiscountPrestigeTarget { building: BuildingId },
    /// Transform a building into a residential for 1 cloth.
    FreeLawyer,
}

/// Answer to a `FavorSubChoice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FavorPick {
    Level(u8),
    Resource(Resource),
    Building(BuildingId),
    Slot(usize),
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProvostKind {
    /// Merchants' Guild: free, up to 3 spaces.
    Guild,
    /// Phase 4: one denier per space.
    Paid,
}

/// Step within a multi-step building activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationStep {
    Choice,
    Sell,
    Buy { remaining: u8 },
    Build,
    PrestigeTarget { building: BuildingId },
    Convert,
    AlchemistCubes { target: u32, picked: u32, gold: u32 },
    Lawyer,
}

impl ActivationStep {
    /// Production and a half-paid alchemist cannot be walked away from.
    pub fn can_skip(self) -> bool {
        !matches!(self, ActivationStep::Choice | ActivationStep::AlchemistCubes { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationPrompt {
    pub road_index: usize,
    pub worker: PlayerColor,
    pub building: BuildingId,
    pub step: ActivationStep,
}

/// Answer to an `ActivationPrompt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationChoice {
    Skip,
    /// Index into a `Choice` effect's bundles.
    Bundle(usize),
    Resource(Resource),
    Building(BuildingId),
    Slot(usize),
    /// Converter tier: 0 = small, 1 = large.
    Tier(usize),
}

/// The single suspension point of the engine. While one is set, only the
/// matching resolver is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingInteraction {
    Gate { player: PlayerColor },
    OwnerBonus { owner: PlayerColor, options: Vec<Resource>, building: BuildingId },
    Inn { player: PlayerColor },
    Favor(FavorQueue),
    Provost { player: PlayerColor, kind: ProvostKind, max_delta: u32 },
    Activation(ActivationPrompt),
    Castle { player: PlayerColor },
}

impl PendingInteraction {
    pub fn kind(&self) -> PendingKind {
        match self {
            PendingInteraction::Gate { .. } => PendingKind::Gate,
            PendingInteraction::OwnerBonus { .. } => PendingKind::OwnerBonus,
            PendingInteraction::Inn { .. } => PendingKind::Inn,
            PendingInteraction::Favor(q) if q.sub_choice.is_some() => PendingKind::FavorSubChoice,
            PendingInteraction::Favor(_) => PendingKind::Favor,
            PendingInteraction::Provost { .. } => PendingKind::Provost,
            PendingInteraction::Activation(_) => PendingKind::Activation,
            PendingInteraction::Castle { .. } => PendingKind::Castle,
        }
    }

    /// Player who has to answer.
    pub fn player(&self) -> Option<PlayerColor> {
        match self {
            PendingInteraction::Gate { player }
            | PendingInteraction::Inn { player }
            | PendingInteraction::Provost { player, .. }
            | PendingInteraction::Castle { player } => Some(*player),
            PendingInteraction::OwnerBonus { owner, .. } => Some(*owner),
            PendingInteraction::Favor(q) => q.current().map(|g| g.player),
            PendingInteraction::Activation(p) => Some(p.worker),
        }
    }
}

// ── Phase bookkeeping ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvostRound {
    pub order: Vec<PlayerColor>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CastleRound {
    /// Index into `Castle::workers` of the worker being resolved.
    pub worker_index: usize,
    pub batches: HashMap<PlayerColor, u32>,
}

// ── Game State ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub turn: u32,
    pub phase: Phase,

    /// Players sorted by turn order.
    pub players: Vec<Player>,
    /// Index into `players` of the player placing a worker.
    pub current_player_index: usize,

    pub road: Vec<Slot>,
    pub castle: Castle,
    pub special: SpecialSlots,
    pub stock: BuildingStock,

    pub bailiff_position: usize,
    pub provost_position: usize,
    /// One seat per player, filled left to right as players pass.
    pub passing_scale: Vec<Option<PlayerColor>>,
    /// Highest favor column reachable (2–5).
    pub favor_columns_available: u8,

    // Phase progress
    pub activation_index: Option<usize>,
    pub provost_round: Option<ProvostRound>,
    pub castle_round: Option<CastleRound>,
    pub delayed_transformations: Vec<DelayedTransformation>,

    // Current pending interaction the game is waiting on
    pub pending: Option<PendingInteraction>,

    pub game_over: bool,
    pub seed: u64,

    /// Newest first.
    pub log: Vec<String>,
}

impl GameState {
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn index_of(&self, color: PlayerColor) -> Result<usize, Rejection> {
        self.players
            .iter()
            .position(|p| p.color == color)
            .ok_or(Rejection::UnknownPlayer(color))
    }

    pub fn player(&self, color: PlayerColor) -> Result<&Player, Rejection> {
        self.players
            .iter()
            .find(|p| p.color == color)
            .ok_or(Rejection::UnknownPlayer(color))
    }

    pub fn player_mut(&mut self, color: PlayerColor) -> Result<&mut Player, Rejection> {
        self.players
            .iter_mut()
            .find(|p| p.color == color)
            .ok_or(Rejection::UnknownPlayer(color))
    }

    /// Player whose turn it is in the workers phase.
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    /// Send one worker of `color` home.
    pub fn return_worker(&mut self, color: PlayerColor) -> Result<(), Rejection> {
        let p = self.player_mut(color)?;
        p.workers.placed = p.workers.placed.saturating_sub(1);
        Ok(())
    }

    /// Append a line to the narrative log (newest first, bounded).
    pub fn log_line(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(turn = self.turn, phase = ?self.phase, "{line}");
        self.log.insert(0, line);
        self.log.truncate(LOG_CAPACITY);
    }

    /// Number of road buildings carrying `color`'s house.
    pub fn owned_buildings(&self, color: PlayerColor, id: BuildingId) -> usize {
        self.road
            .iter()
            .filter(|s| s.house == Some(color) && s.building == Some(id))
            .count()
    }
}
