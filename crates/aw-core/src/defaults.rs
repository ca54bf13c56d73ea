//! Built-in starting content for a fresh session.

use crate::aggregate::GameAggregate;
use crate::character::{Attributes, PlayerCharacter, Pool, Position, Stat};
use crate::companion::{CompanionProfile, CompanionStats, Relationship};
use crate::id::CompanionId;
use crate::item::{Inventory, InventoryItem, ItemEffect, ItemKind};
use crate::log::LogKind;
use crate::map::{NodeKind, SceneGraph, SceneNode};
use crate::scene::{Choice, ChoiceKind, Scene};

/// Id of the starting healing potion.
pub const HEALING_POTION_ID: &str = "potion_1";

/// Hit points restored by the starting healing potion.
pub const HEALING_POTION_AMOUNT: i32 = 20;

/// Opening narration.
pub const OPENING_TEXT: &str = "你站在一个阴暗的石室中，火把在墙壁上摇曳。前方有两扇门。";

/// The player character of a fresh session.
pub fn player() -> PlayerCharacter {
    PlayerCharacter::new("你", 30, 20, Attributes::new(14, 12, 16)).at(Position::new(2, 2))
}

/// The starting companion.
pub fn companions() -> Vec<CompanionProfile> {
    vec![CompanionProfile {
        id: CompanionId::from("ally1"),
        name: "莱拉".into(),
        class: "战士".into(),
        personality: "谨慎但忠诚，重视荣誉".into(),
        speech_style: "简洁直接，偶尔引用古代格言".into(),
        motivation: "寻找失踪的弟弟".into(),
        stats: CompanionStats {
            hp: Pool::new(25),
            str: 16,
            dex: 12,
            int: 10,
        },
        relationship: Relationship::new(50),
        position: Position::new(3, 3),
    }]
}

/// The starting inventory.
pub fn inventory() -> Inventory {
    [
        InventoryItem::new(HEALING_POTION_ID, "治疗药水", ItemKind::Consumable)
            .with_icon("🧪")
            .with_description("恢复20点生命值")
            .with_effect(ItemEffect::Heal(HEALING_POTION_AMOUNT)),
        InventoryItem::new("sword_1", "生锈的长剑", ItemKind::Weapon)
            .with_icon("🗡️")
            .with_description("剑刃上满是缺口，但还能用"),
        InventoryItem::new("armor_1", "皮甲", ItemKind::Armor)
            .with_icon("🛡️")
            .with_description("破旧但结实"),
        InventoryItem::new("key_1", "锈铁钥匙", ItemKind::Key)
            .with_icon("🗝️")
            .with_description("不知道能打开哪扇门"),
    ]
    .into_iter()
    .collect()
}

/// The dungeon map.
pub fn graph() -> SceneGraph {
    let nodes = vec![
        SceneNode::new("entrance", "地牢入口", NodeKind::Start, 0, 2)
            .connect("corridor")
            .connect("guard_room"),
        SceneNode::new("corridor", "阴暗走廊", NodeKind::Event, 1, 1).connect("spring"),
        SceneNode::new("guard_room", "守卫室", NodeKind::Combat, 1, 3).connect("spring"),
        SceneNode::new("spring", "地下泉水", NodeKind::Safe, 2, 2).connect("throne"),
        SceneNode::new("throne", "深渊王座", NodeKind::Boss, 3, 2),
    ];
    match SceneGraph::new(nodes) {
        Ok(graph) => graph,
        Err(e) => unreachable!("built-in map is valid: {e}"),
    }
}

/// The first scene.
pub fn opening_scene() -> Scene {
    let choices = vec![
        Choice::new("left_door", "推开左边的门", ChoiceKind::Explore).with_check(Stat::Dex, 10),
        Choice::new("right_door", "踹开右边的门", ChoiceKind::Combat).with_check(Stat::Str, 12),
        Choice::new("ask_lyra", "询问莱拉的看法", ChoiceKind::Talk),
    ];
    match Scene::new("opening", "石室", OPENING_TEXT, NodeKind::Event, choices) {
        Ok(scene) => scene,
        Err(e) => unreachable!("built-in scene is valid: {e}"),
    }
}

/// A fresh session with the opening log line.
pub fn new_session() -> GameAggregate {
    let built = GameAggregate::new(player(), inventory(), companions(), graph(), opening_scene());
    let mut game = match built {
        Ok(game) => game,
        Err(e) => unreachable!("built-in party is valid: {e}"),
    };
    game.append_log(LogKind::System, "游戏开始");
    game
}
