//! The game aggregate: one owned state object with explicit commands.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::character::PlayerCharacter;
use crate::companion::CompanionProfile;
use crate::error::{CoreError, CoreResult};
use crate::id::{CompanionId, ItemId, NodeId};
use crate::item::{Inventory, InventoryItem, ItemEffect};
use crate::log::{GameLog, LogKind};
use crate::map::{SceneGraph, SceneNode};
use crate::scene::{Choice, Scene};
use crate::turn::{TurnHolder, TurnPhase, TurnState};

/// Which screen the front end shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveScreen {
    /// Narrative and map.
    #[default]
    Main,
    /// Item list.
    Inventory,
    /// Character sheet.
    Status,
    /// Options.
    Settings,
}

impl ActiveScreen {
    /// Parse a screen name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "main" => Some(Self::Main),
            "inventory" | "inv" => Some(Self::Inventory),
            "status" => Some(Self::Status),
            "settings" => Some(Self::Settings),
            _ => None,
        }
    }
}

impl fmt::Display for ActiveScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Inventory => write!(f, "inventory"),
            Self::Status => write!(f, "status"),
            Self::Settings => write!(f, "settings"),
        }
    }
}

/// Result of [`GameAggregate::use_item`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemUse {
    /// The item that was used.
    pub item: InventoryItem,
    /// Whether it was removed from the inventory.
    pub consumed: bool,
    /// Hit points actually restored.
    pub hp_restored: i32,
    /// Mana points actually restored.
    pub mp_restored: i32,
}

/// One line of the party summary handed to narrative requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyMemberStatus {
    /// Display name.
    pub name: String,
    /// `"hp/maxHp"`.
    pub hp: String,
    /// `"(x,y)"`.
    pub position: String,
}

impl fmt::Display for PartyMemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} HP{} {}", self.name, self.hp, self.position)
    }
}

/// The complete state of a session.
///
/// Invariants held by every public constructor and command:
/// the current node exists in the graph, the visited set contains the
/// start node and the current node, inventory and companion ids are
/// unique, and the current scene has at least one choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AggregateRepr")]
pub struct GameAggregate {
    player: PlayerCharacter,
    inventory: Inventory,
    companions: Vec<CompanionProfile>,
    #[serde(rename = "nodes")]
    graph: SceneGraph,
    current_node_id: NodeId,
    visited_nodes: BTreeSet<NodeId>,
    current_scene: Scene,
    #[serde(flatten)]
    turn: TurnState,
    #[serde(rename = "gameLog")]
    log: GameLog,
    active_screen: ActiveScreen,
    #[serde(skip)]
    processing: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregateRepr {
    player: PlayerCharacter,
    inventory: Inventory,
    companions: Vec<CompanionProfile>,
    nodes: SceneGraph,
    current_node_id: NodeId,
    #[serde(default)]
    visited_nodes: BTreeSet<NodeId>,
    current_scene: Scene,
    #[serde(flatten)]
    turn: TurnState,
    #[serde(default)]
    game_log: GameLog,
    #[serde(default)]
    active_screen: ActiveScreen,
}

impl TryFrom<AggregateRepr> for GameAggregate {
    type Error = CoreError;

    fn try_from(r: AggregateRepr) -> CoreResult<Self> {
        if !r.nodes.contains(&r.current_node_id) {
            return Err(CoreError::InvalidState(format!(
                "current node \"{}\" is not on the map",
                r.current_node_id
            )));
        }
        if let Some(dup) = r.inventory.first_duplicate() {
            return Err(CoreError::InvalidState(format!(
                "item \"{dup}\" appears twice in the inventory"
            )));
        }
        check_companion_ids(&r.companions)?;
        if let TurnPhase::Ally(i) = r.turn.phase() {
            if i >= r.companions.len() {
                return Err(CoreError::InvalidState(format!(
                    "ally turn index {i} with {} companions",
                    r.companions.len()
                )));
            }
        }

        let mut visited: BTreeSet<NodeId> = r
            .visited_nodes
            .into_iter()
            .filter(|id| r.nodes.contains(id))
            .collect();
        visited.insert(r.nodes.start().id.clone());
        visited.insert(r.current_node_id.clone());

        Ok(Self {
            player: r.player,
            inventory: r.inventory,
            companions: r.companions,
            graph: r.nodes,
            current_node_id: r.current_node_id,
            visited_nodes: visited,
            current_scene: r.current_scene,
            turn: r.turn,
            log: r.game_log,
            active_screen: r.active_screen,
            processing: false,
        })
    }
}

fn check_companion_ids(companions: &[CompanionProfile]) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for c in companions {
        if !seen.insert(&c.id) {
            return Err(CoreError::InvalidState(format!(
                "companion \"{}\" appears twice in the party",
                c.id
            )));
        }
    }
    Ok(())
}

impl GameAggregate {
    /// Start a session on the graph's start node with an empty log.
    pub fn new(
        player: PlayerCharacter,
        inventory: Inventory,
        companions: Vec<CompanionProfile>,
        graph: SceneGraph,
        opening: Scene,
    ) -> CoreResult<Self> {
        check_companion_ids(&companions)?;
        let start = graph.start().id.clone();
        Ok(Self {
            player,
            inventory,
            companions,
            visited_nodes: BTreeSet::from([start.clone()]),
            current_node_id: start,
            graph,
            current_scene: opening,
            turn: TurnState::new(),
            log: GameLog::new(),
            active_screen: ActiveScreen::Main,
            processing: false,
        })
    }

    // -- Read access --

    /// The player character.
    pub fn player(&self) -> &PlayerCharacter {
        &self.player
    }

    /// The inventory.
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Companions in turn order.
    pub fn companions(&self) -> &[CompanionProfile] {
        &self.companions
    }

    /// Companion at a turn index.
    pub fn companion(&self, index: usize) -> Option<&CompanionProfile> {
        self.companions.get(index)
    }

    /// The scene graph.
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Id of the node the party stands on.
    pub fn current_node_id(&self) -> &NodeId {
        &self.current_node_id
    }

    /// The node the party stands on.
    pub fn current_node(&self) -> &SceneNode {
        self.graph
            .get(&self.current_node_id)
            .unwrap_or_else(|| self.graph.start())
    }

    /// Nodes the party has been to.
    pub fn visited_nodes(&self) -> &BTreeSet<NodeId> {
        &self.visited_nodes
    }

    /// The scene on screen.
    pub fn current_scene(&self) -> &Scene {
        &self.current_scene
    }

    /// Turn record.
    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    /// Current phase.
    pub fn phase(&self) -> TurnPhase {
        self.turn.phase()
    }

    /// The log.
    pub fn log(&self) -> &GameLog {
        &self.log
    }

    /// Active screen.
    pub fn active_screen(&self) -> ActiveScreen {
        self.active_screen
    }

    /// Whether a remote call is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Party summary, player first.
    pub fn party_status(&self) -> Vec<PartyMemberStatus> {
        let mut out = vec![PartyMemberStatus {
            name: self.player.name.clone(),
            hp: self.player.hp.to_string(),
            position: self.player.position.to_string(),
        }];
        out.extend(self.companions.iter().map(|c| PartyMemberStatus {
            name: c.name.clone(),
            hp: c.stats.hp.to_string(),
            position: c.position.to_string(),
        }));
        out
    }

    /// Look up a choice of the current scene.
    pub fn find_choice(&self, id: &str) -> CoreResult<&Choice> {
        self.current_scene
            .choice(id)
            .ok_or_else(|| CoreError::UnknownChoice(id.to_string()))
    }

    // -- Commands --

    /// Append a log entry.
    pub fn append_log(&mut self, kind: LogKind, content: impl Into<String>) {
        self.log.append(kind, content);
    }

    /// Claim the processing flag. Returns false if it was already held.
    pub fn try_begin_processing(&mut self) -> bool {
        if self.processing {
            return false;
        }
        self.processing = true;
        true
    }

    /// Release the processing flag.
    pub fn finish_processing(&mut self) {
        self.processing = false;
    }

    /// Add loot, logging each item, then make `scene` current.
    pub fn commit_scene(&mut self, scene: Scene, loot: Vec<InventoryItem>) {
        for item in loot {
            let line = format!("获得了 {item}");
            if self.inventory.add(item).is_ok() {
                self.log.append(LogKind::Loot, line);
            }
        }
        self.log.append(LogKind::Scene, scene.description.clone());
        self.current_scene = scene;
    }

    /// Use an item. Consumables are removed and their effect applied;
    /// other items stay and only a notice is logged.
    pub fn use_item(&mut self, id: &ItemId) -> CoreResult<ItemUse> {
        let item = self
            .inventory
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownItem(id.clone()))?;

        if !item.is_consumable() {
            self.log
                .append(LogKind::System, format!("{} 现在无法使用", item.name));
            return Ok(ItemUse {
                item,
                consumed: false,
                hp_restored: 0,
                mp_restored: 0,
            });
        }

        self.inventory.remove(id);
        let (mut hp_restored, mut mp_restored) = (0, 0);
        match item.effect {
            Some(ItemEffect::Heal(n)) => {
                let before = self.player.hp.current();
                hp_restored = self.player.hp.adjust(n) - before;
            }
            Some(ItemEffect::RestoreMana(n)) => {
                let before = self.player.mp.current();
                mp_restored = self.player.mp.adjust(n) - before;
            }
            None => {}
        }

        let mut line = format!("使用了 {item}");
        if hp_restored > 0 {
            line.push_str(&format!("，恢复 {hp_restored} 点生命"));
        }
        if mp_restored > 0 {
            line.push_str(&format!("，恢复 {mp_restored} 点法力"));
        }
        self.log.append(LogKind::Loot, line);

        Ok(ItemUse {
            item,
            consumed: true,
            hp_restored,
            mp_restored,
        })
    }

    /// Deal damage to the player. Returns the remaining hit points.
    pub fn damage_player(&mut self, amount: i32) -> i32 {
        let amount = amount.max(0);
        self.player.hp.adjust(-amount)
    }

    /// Move to an adjacent node. Moving to the current node does nothing.
    pub fn move_to_node(&mut self, id: &NodeId) -> CoreResult<()> {
        let Some(target) = self.graph.get(id) else {
            return Err(CoreError::UnknownNode(id.clone()));
        };
        if *id == self.current_node_id {
            return Ok(());
        }
        if !self.graph.is_adjacent(&self.current_node_id, id) {
            return Err(CoreError::NodeNotAdjacent {
                from: self.current_node_id.clone(),
                to: id.clone(),
            });
        }
        let line = format!("移动到 {} {}", target.kind.icon(), target.name);
        self.current_node_id = id.clone();
        self.visited_nodes.insert(id.clone());
        self.log.append(LogKind::System, line);
        Ok(())
    }

    /// Shift a companion's relationship, clamped. Returns the new value.
    pub fn update_relationship(&mut self, id: &CompanionId, delta: i32) -> CoreResult<i32> {
        let companion = self
            .companions
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| CoreError::UnknownCompanion(id.clone()))?;
        Ok(companion.relationship.adjust(delta))
    }

    /// Replace the turn phase. An ally index past the party is rejected.
    pub fn set_phase(&mut self, phase: TurnPhase) -> CoreResult<()> {
        if let TurnPhase::Ally(i) = phase {
            if i >= self.companions.len() {
                return Err(CoreError::InvalidState(format!(
                    "no companion at turn index {i}"
                )));
            }
        }
        self.turn.set_phase(phase);
        Ok(())
    }

    /// Switch screens.
    pub fn set_active_screen(&mut self, screen: ActiveScreen) {
        self.active_screen = screen;
    }

    /// Whether the player holds the turn.
    pub fn is_player_turn(&self) -> bool {
        self.turn.holder() == TurnHolder::Player
    }
}
