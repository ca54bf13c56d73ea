//! The game engine: owns the aggregate and exposes the player commands.
//!
//! Every command validates first and mutates second, so a rejected command
//! leaves the game untouched. After each mutation the engine writes a
//! snapshot; write failures are logged and otherwise ignored.

use std::sync::Arc;

use aw_core::{
    ActiveScreen, Choice, CompanionId, GameAggregate, InventoryItem, ItemId, ItemUse, LogKind,
    NodeId, Stat, TurnPhase, defaults,
};
use aw_mechanics::{CheckResolver, CheckResult, RandomSource, SeededRandom};
use aw_narrative::{
    CompanionAgent, CompanionContext, CompanionDecision, ContentFilter, NarrativeService,
    SceneGenerator, SceneRequest, SceneSource,
};

use crate::config::SessionConfig;
use crate::enemy::{EnemyTurn, QuietEnemy};
use crate::error::{SessionError, SessionResult};
use crate::scheduler::TurnScheduler;
use crate::store::SnapshotStore;

const INVESTIGATE_WORDS: &[&str] = &["调查", "检查"];
const INVESTIGATE_HINT: &str = "需要进行侦查检定...";

/// A check rolled for a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolledCheck {
    /// Attribute rolled.
    pub stat: Stat,
    /// Outcome.
    pub result: CheckResult,
}

/// One companion's turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionTurn {
    /// Who acted.
    pub companion_id: CompanionId,
    /// Display name.
    pub name: String,
    /// What they decided.
    pub decision: CompanionDecision,
}

/// Everything that happened after a choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOutcome {
    /// The chosen option.
    pub choice: Choice,
    /// The check, if the choice required one.
    pub check: Option<RolledCheck>,
    /// Where the new scene came from.
    pub scene_source: SceneSource,
    /// Items added to the inventory.
    pub loot: Vec<InventoryItem>,
    /// Companion turns that followed.
    pub companions: Vec<CompanionTurn>,
}

/// What [`GameEngine::settle`] ran.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettleOutcome {
    /// Companion turns that were still outstanding.
    pub companions: Vec<CompanionTurn>,
    /// Whether the enemy phase resolved.
    pub enemy_acted: bool,
}

/// Owns the game state and runs turns.
pub struct GameEngine {
    config: SessionConfig,
    game: GameAggregate,
    scheduler: TurnScheduler,
    service: Option<Arc<dyn NarrativeService>>,
    scenes: SceneGenerator,
    companions: CompanionAgent,
    rng: Box<dyn RandomSource>,
    enemy: Box<dyn EnemyTurn>,
    store: Option<Box<dyn SnapshotStore>>,
}

impl GameEngine {
    /// An offline engine on a fresh default session.
    pub fn new(config: SessionConfig) -> Self {
        let rng: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededRandom::from_seed(seed)),
            None => Box::new(SeededRandom::from_os()),
        };
        Self {
            game: defaults::new_session(),
            scheduler: TurnScheduler::new(config.enemy_delay),
            service: None,
            scenes: SceneGenerator::offline(),
            companions: CompanionAgent::new(None, ContentFilter::new(config.filter.clone())),
            rng,
            enemy: Box::new(QuietEnemy),
            store: None,
            config,
        }
    }

    /// Use a narrative service for scenes and companion lines.
    pub fn with_service(mut self, service: Arc<dyn NarrativeService>) -> Self {
        self.service = Some(service);
        self.scenes = SceneGenerator::new(self.service.clone());
        self.companions = self.fresh_agent();
        self
    }

    /// Replace the random source.
    pub fn with_random(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Replace the enemy hook.
    pub fn with_enemy(mut self, enemy: impl EnemyTurn + 'static) -> Self {
        self.enemy = Box::new(enemy);
        self
    }

    /// Start from a given state instead of the defaults.
    pub fn with_state(mut self, mut game: GameAggregate) -> Self {
        game.finish_processing();
        self.game = game;
        self.scheduler.clear();
        self
    }

    /// Persist to `store`, resuming its snapshot if it has a valid one.
    /// Otherwise the current state is written out straight away.
    pub fn with_store(mut self, store: impl SnapshotStore + 'static) -> Self {
        let resumed = match store.load(&self.config.save_key) {
            Ok(Some(game)) => {
                tracing::info!(key = %self.config.save_key, "resuming saved session");
                self.game = game;
                self.scheduler.clear();
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(key = %self.config.save_key, error = %e, "discarding unreadable snapshot, starting a new session");
                false
            }
        };
        self.store = Some(Box::new(store));
        if !resumed {
            self.persist();
        }
        self
    }

    // -- Read access --

    /// The game state.
    pub fn game(&self) -> &GameAggregate {
        &self.game
    }

    /// Current turn phase.
    pub fn phase(&self) -> TurnPhase {
        self.game.phase()
    }

    /// The active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a narrative service is attached.
    pub fn is_online(&self) -> bool {
        self.service.is_some()
    }

    /// Whether an enemy self-advance is waiting.
    pub fn is_enemy_pending(&self) -> bool {
        self.scheduler.is_enemy_pending()
    }

    // -- Commands --

    /// Pick a choice of the current scene: roll its check, generate the
    /// next scene, then run the round. Companions act in order, the enemy
    /// acts once its delay has elapsed, and the call returns on the player's
    /// turn.
    pub async fn submit_choice(&mut self, choice_id: &str) -> SessionResult<ChoiceOutcome> {
        self.ensure_player_turn()?;
        let choice = self.game.find_choice(choice_id)?.clone();
        if !self.game.try_begin_processing() {
            return Err(SessionError::Busy);
        }

        self.game
            .append_log(LogKind::Choice, format!("你选择了：{}", choice.text));
        let check = choice.required_check.map(|req| RolledCheck {
            stat: req.stat,
            result: CheckResolver::resolve(
                self.game.player().stats.get(req.stat),
                req.difficulty,
                self.rng.as_mut(),
            ),
        });
        let action_text = match &check {
            Some(c) => {
                self.game.append_log(
                    LogKind::Combat,
                    format!("{}检定 {}", c.stat.label(), c.result),
                );
                format!("{}（{}检定{}）", choice.text, c.stat.label(), c.result.verdict())
            }
            None => choice.text.clone(),
        };

        let request = SceneRequest::new(
            &self.game.current_scene().description,
            action_text,
            self.game.current_node().name.clone(),
            self.party_line(),
        );
        let generated = self.scenes.generate(&request).await;
        let loot = generated.loot.clone();
        self.game.commit_scene(generated.scene, generated.loot);
        self.game.finish_processing();
        self.persist();

        self.scheduler.advance(&mut self.game)?;
        self.persist();
        let companions = self.run_allies(Some(&choice.text)).await?;
        self.run_enemy().await?;

        Ok(ChoiceOutcome {
            choice,
            check,
            scene_source: generated.source,
            loot,
            companions,
        })
    }

    /// Log a free-form player action, then run the round like
    /// [`GameEngine::submit_choice`].
    pub async fn submit_action(&mut self, text: &str) -> SessionResult<Vec<CompanionTurn>> {
        self.ensure_player_turn()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyAction);
        }
        if self.game.is_processing() {
            return Err(SessionError::Busy);
        }

        self.game.append_log(LogKind::Action, format!("你：{text}"));
        if INVESTIGATE_WORDS.iter().any(|w| text.contains(w)) {
            self.game.append_log(LogKind::System, INVESTIGATE_HINT);
        }
        self.scheduler.advance(&mut self.game)?;
        self.persist();
        let companions = self.run_allies(Some(text)).await?;
        self.run_enemy().await?;
        Ok(companions)
    }

    /// Finish a round that was interrupted, as when a snapshot saved
    /// mid-round is resumed. Returns with the player to act; does nothing
    /// on the player's turn.
    pub async fn settle(&mut self) -> SessionResult<SettleOutcome> {
        let companions = if matches!(self.game.phase(), TurnPhase::Ally(_)) {
            self.run_allies(None).await?
        } else {
            Vec::new()
        };
        let enemy_acted = self.run_enemy().await?;
        Ok(SettleOutcome {
            companions,
            enemy_acted,
        })
    }

    /// Use an inventory item.
    pub fn use_item(&mut self, id: &ItemId) -> SessionResult<ItemUse> {
        let used = self.game.use_item(id)?;
        self.persist();
        Ok(used)
    }

    /// Move to an adjacent map node.
    pub fn move_to_scene_node(&mut self, id: &NodeId) -> SessionResult<()> {
        self.game.move_to_node(id)?;
        self.persist();
        Ok(())
    }

    /// Switch screens.
    pub fn set_active_screen(&mut self, screen: ActiveScreen) {
        self.game.set_active_screen(screen);
        self.persist();
    }

    /// Shift a companion's relationship. Returns the clamped value.
    pub fn update_relationship(&mut self, id: &CompanionId, delta: i32) -> SessionResult<i32> {
        let value = self.game.update_relationship(id, delta)?;
        self.persist();
        Ok(value)
    }

    /// Replace the whole session with fresh defaults.
    pub fn reset_session(&mut self) {
        self.game = defaults::new_session();
        self.scheduler.clear();
        self.companions = self.fresh_agent();
        self.persist();
        tracing::info!("session reset");
    }

    // -- Internals --

    fn ensure_player_turn(&self) -> SessionResult<()> {
        if self.game.is_player_turn() {
            Ok(())
        } else {
            Err(SessionError::NotPlayerTurn(self.game.phase()))
        }
    }

    async fn run_allies(&mut self, action: Option<&str>) -> SessionResult<Vec<CompanionTurn>> {
        let mut turns = Vec::new();
        while let TurnPhase::Ally(i) = self.game.phase() {
            let Some(companion) = self.game.companion(i).cloned() else {
                self.scheduler.advance(&mut self.game)?;
                continue;
            };
            let context = CompanionContext::perceive(&self.game, action);

            if !self.game.try_begin_processing() {
                return Err(SessionError::Busy);
            }
            let decision = self
                .companions
                .decide(&companion, &context, self.rng.as_mut())
                .await;
            self.game.finish_processing();

            self.game.append_log(
                LogKind::Dialogue,
                format!("【{}】{}", companion.name, decision.dialogue),
            );
            self.game
                .append_log(LogKind::Action, format!("【思考】{}", decision.thought));
            tracing::debug!(companion = %companion.id, source = ?decision.source, "companion acted");

            self.scheduler.advance(&mut self.game)?;
            self.persist();
            turns.push(CompanionTurn {
                companion_id: companion.id,
                name: companion.name,
                decision,
            });
        }
        Ok(turns)
    }

    /// Wait out the single pending enemy deadline, run the enemy hook and
    /// return the turn to the player. No-op outside the enemy phase.
    async fn run_enemy(&mut self) -> SessionResult<bool> {
        if self.game.phase() != TurnPhase::Enemy {
            return Ok(false);
        }
        let deadline = self.scheduler.enemy_deadline();
        tokio::time::sleep_until(deadline).await;
        self.enemy.act(&mut self.game, self.rng.as_mut());
        self.scheduler.advance(&mut self.game)?;
        self.persist();
        Ok(true)
    }

    fn party_line(&self) -> String {
        self.game
            .party_status()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("，")
    }

    fn fresh_agent(&self) -> CompanionAgent {
        CompanionAgent::new(
            self.service.clone(),
            ContentFilter::new(self.config.filter.clone()),
        )
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.config.save_key, &self.game) {
                tracing::warn!(error = %e, "failed to save snapshot");
            }
        }
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("config", &self.config)
            .field("phase", &self.game.phase())
            .field("online", &self.is_online())
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use aw_core::{CompanionProfile, ItemKind};
    use aw_mechanics::ScriptedRandom;
    use aw_narrative::{MockNarrativeService, ReplyFormat};
    use tokio::time::Instant;

    use crate::enemy::QUIET_ENEMY_LINE;
    use crate::store::MemoryStore;

    fn engine() -> GameEngine {
        GameEngine::new(SessionConfig::default().with_enemy_delay(Duration::ZERO))
            .with_random(ScriptedRandom::fixed(5))
    }

    fn in_phase(phase: TurnPhase) -> GameAggregate {
        let mut game = defaults::new_session();
        game.set_phase(phase).unwrap();
        game
    }

    fn party_of(n: usize) -> GameAggregate {
        let template = defaults::companions().remove(0);
        let names = ["莱拉", "托林", "米娅"];
        let companions: Vec<CompanionProfile> = (0..n)
            .map(|i| {
                let mut c = template.clone();
                c.id = CompanionId::new(format!("ally{i}"));
                c.name = names[i % names.len()].to_string();
                c
            })
            .collect();
        let mut game = GameAggregate::new(
            defaults::player(),
            defaults::inventory(),
            companions,
            defaults::graph(),
            defaults::opening_scene(),
        )
        .unwrap();
        game.append_log(LogKind::System, "游戏开始");
        game
    }

    fn kinds_since(game: &GameAggregate, start: usize) -> Vec<LogKind> {
        game.log().entries()[start..].iter().map(|e| e.kind).collect()
    }

    #[test]
    fn use_item_heals_and_removes_potion() {
        let store = Arc::new(MemoryStore::new());
        let mut game = defaults::new_session();
        game.damage_player(15);
        let mut engine = engine().with_state(game).with_store(store.clone());
        // An empty store keeps the injected state.
        assert_eq!(engine.game().player().hp.current(), 15);

        let potion = ItemId::from(defaults::HEALING_POTION_ID);
        let used = engine.use_item(&potion).unwrap();

        assert!(used.consumed);
        assert_eq!(engine.game().player().hp.current(), 30);
        assert!(!engine.game().inventory().contains(&potion));
        assert_eq!(
            engine.game().log().entries().last().unwrap().kind,
            LogKind::Loot
        );
        let saved = store.load("ttrpg-save").unwrap().unwrap();
        assert_eq!(saved.player().hp.current(), 30);
    }

    #[tokio::test]
    async fn choice_rolls_check_before_scene_and_hands_turn_on() {
        let mut engine = engine();
        let before = engine.game().log().len();

        let outcome = engine.submit_choice("left_door").await.unwrap();

        let check = outcome.check.unwrap();
        assert_eq!(check.stat, Stat::Dex);
        assert_eq!(check.result.roll, 5);
        assert_eq!(check.result.modifier, 1);
        assert!(!check.result.success);
        assert_eq!(outcome.scene_source, SceneSource::Fallback);
        assert_eq!(engine.game().current_scene().title, "黑暗走廊");
        assert_eq!(
            kinds_since(engine.game(), before),
            vec![
                LogKind::Choice,
                LogKind::Combat,
                LogKind::Scene,
                LogKind::Dialogue,
                LogKind::Action,
                LogKind::System
            ]
        );
        assert_eq!(outcome.companions.len(), 1);
        assert_eq!(engine.phase(), TurnPhase::Player);
        assert!(!engine.is_enemy_pending());
        assert!(!engine.game().is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn enemy_turn_fires_on_its_own_after_delay() {
        let mut engine =
            GameEngine::new(SessionConfig::default()).with_random(ScriptedRandom::fixed(5));

        let start = Instant::now();
        engine.submit_choice("ask_lyra").await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert_eq!(engine.phase(), TurnPhase::Player);
        assert!(!engine.is_enemy_pending());
        assert_eq!(
            engine.game().log().entries().last().unwrap().content,
            QUIET_ENEMY_LINE
        );

        // The next round needs nothing from the caller either.
        engine.submit_choice("advance").await.unwrap();
        engine.submit_action("往前走").await.unwrap();
        assert_eq!(engine.phase(), TurnPhase::Player);
    }

    #[tokio::test]
    async fn settle_on_player_turn_does_nothing() {
        let mut engine = engine();
        let settled = engine.settle().await.unwrap();
        assert_eq!(settled, SettleOutcome::default());
    }

    #[tokio::test]
    async fn unknown_choice_is_a_no_op() {
        let mut engine = engine();
        let before = engine.game().clone();
        let err = engine.submit_choice("fly").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(engine.game(), &before);
    }

    #[tokio::test]
    async fn cannot_choose_outside_player_turn() {
        let mut enemy_turn = engine().with_state(in_phase(TurnPhase::Enemy));
        let err = enemy_turn.submit_choice("ask_lyra").await.unwrap_err();
        assert!(matches!(err, SessionError::NotPlayerTurn(TurnPhase::Enemy)));

        let mut ally_turn = engine().with_state(in_phase(TurnPhase::Ally(0)));
        let err = ally_turn.submit_action("走").await.unwrap_err();
        assert!(matches!(err, SessionError::NotPlayerTurn(TurnPhase::Ally(0))));
        assert_eq!(ally_turn.game().log().len(), 1);
    }

    #[tokio::test]
    async fn two_companions_speak_in_order() {
        let mut engine = engine().with_state(party_of(2));
        let turns = engine.submit_action("往前走").await.unwrap();

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].name, "莱拉");
        assert_eq!(turns[1].name, "托林");
        let dialogue: Vec<&str> = engine
            .game()
            .log()
            .entries()
            .iter()
            .filter(|e| e.kind == LogKind::Dialogue)
            .map(|e| e.content.as_str())
            .collect();
        assert!(dialogue[0].starts_with("【莱拉】"));
        assert!(dialogue[1].starts_with("【托林】"));
        assert_eq!(
            engine.game().log().entries().last().unwrap().content,
            QUIET_ENEMY_LINE
        );
        assert_eq!(engine.phase(), TurnPhase::Player);
    }

    #[tokio::test]
    async fn no_companions_go_straight_to_enemy() {
        let mut engine = engine().with_state(party_of(0));
        let before = engine.game().log().len();
        let turns = engine.submit_action("等一等").await.unwrap();
        assert!(turns.is_empty());
        assert_eq!(
            kinds_since(engine.game(), before),
            vec![LogKind::Action, LogKind::System]
        );
        assert_eq!(engine.phase(), TurnPhase::Player);
    }

    #[tokio::test]
    async fn investigating_adds_a_hint() {
        let mut engine = engine();
        let before = engine.game().log().len();
        engine.submit_action("  检查墙壁 ").await.unwrap();
        let entries = &engine.game().log().entries()[before..];
        assert_eq!(entries[0].content, "你：检查墙壁");
        assert_eq!(entries[1].kind, LogKind::System);
        assert_eq!(entries[1].content, INVESTIGATE_HINT);
    }

    #[tokio::test]
    async fn blank_action_is_rejected() {
        let mut engine = engine();
        assert!(matches!(
            engine.submit_action("   ").await,
            Err(SessionError::EmptyAction)
        ));
        assert_eq!(engine.phase(), TurnPhase::Player);
    }

    #[tokio::test]
    async fn remote_scene_adds_loot_before_scene() {
        let mut mock = MockNarrativeService::new();
        mock.expect_complete().returning(|req| {
            Ok(match req.format {
                ReplyFormat::JsonObject => r#"{
                    "title": "宝库",
                    "description": "角落里有一个宝箱。",
                    "choices": [{"id": "open", "text": "打开宝箱", "type": "item"}],
                    "nodeType": "event",
                    "loot": [{"name": "金币袋", "icon": "💰"}]
                }"#
                .to_string(),
                ReplyFormat::Text => "小心机关。".to_string(),
            })
        });
        let mut engine = engine().with_service(Arc::new(mock));
        let before = engine.game().log().len();

        let outcome = engine.submit_choice("ask_lyra").await.unwrap();

        assert_eq!(outcome.scene_source, SceneSource::Remote);
        assert_eq!(outcome.loot.len(), 1);
        assert_eq!(outcome.loot[0].kind, ItemKind::Consumable);
        assert_eq!(engine.game().inventory().len(), 5);
        assert_eq!(
            kinds_since(engine.game(), before)[..3],
            [LogKind::Choice, LogKind::Loot, LogKind::Scene]
        );
        assert_eq!(outcome.companions[0].decision.dialogue, "小心机关。");
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_saved_mid_round_resumes_with_settle() {
        let store = Arc::new(MemoryStore::new());
        store
            .save("ttrpg-save", &in_phase(TurnPhase::Ally(0)))
            .unwrap();

        let mut engine = GameEngine::new(SessionConfig::default())
            .with_random(ScriptedRandom::fixed(5))
            .with_store(store.clone());
        assert_eq!(engine.phase(), TurnPhase::Ally(0));
        assert!(!engine.is_enemy_pending());

        let start = Instant::now();
        let settled = engine.settle().await.unwrap();

        assert_eq!(settled.companions.len(), 1);
        assert!(settled.enemy_acted);
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert_eq!(engine.phase(), TurnPhase::Player);
        let saved = store.load("ttrpg-save").unwrap().unwrap();
        assert_eq!(saved.phase(), TurnPhase::Player);
    }

    #[tokio::test]
    async fn finished_round_is_saved_on_player_turn() {
        let store = Arc::new(MemoryStore::new());
        let mut first = engine().with_store(store.clone());
        first.submit_action("往前走").await.unwrap();
        let log_len = first.game().log().len();
        drop(first);

        let second = engine().with_store(store);
        assert_eq!(second.game().log().len(), log_len);
        assert_eq!(second.phase(), TurnPhase::Player);
    }

    #[test]
    fn unreadable_snapshot_starts_fresh() {
        let store = MemoryStore::new();
        store.insert_raw("ttrpg-save", r#"{"version": 1, "state": {"player": 3}}"#);
        let store = Arc::new(store);
        let engine = engine().with_store(store.clone());
        assert_eq!(engine.game().log().len(), 1);
        assert_eq!(engine.game().current_scene().id, "opening");
        // The fresh session replaces the broken one.
        assert!(store.load("ttrpg-save").unwrap().is_some());
        assert_eq!(engine.phase(), TurnPhase::Player);
    }

    #[test]
    fn relationship_and_screen_commands() {
        let mut engine = engine();
        let id = CompanionId::from("ally1");
        assert_eq!(engine.update_relationship(&id, 10).unwrap(), 60);
        assert_eq!(engine.update_relationship(&id, 150).unwrap(), 100);
        assert!(engine
            .update_relationship(&CompanionId::from("ghost"), 5)
            .unwrap_err()
            .is_validation());

        engine.set_active_screen(ActiveScreen::Inventory);
        assert_eq!(engine.game().active_screen(), ActiveScreen::Inventory);
    }

    #[test]
    fn move_rejects_distant_nodes() {
        let mut engine = engine();
        engine.move_to_scene_node(&NodeId::from("corridor")).unwrap();
        assert_eq!(engine.game().current_node().name, "阴暗走廊");
        let err = engine
            .move_to_scene_node(&NodeId::from("throne"))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(engine.game().current_node_id().as_str(), "corridor");
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = engine().with_store(store.clone());
        engine.submit_choice("ask_lyra").await.unwrap();
        engine.reset_session();

        assert_eq!(engine.phase(), TurnPhase::Player);
        assert!(!engine.is_enemy_pending());
        assert_eq!(engine.game().log().len(), 1);
        let saved = store.load("ttrpg-save").unwrap().unwrap();
        assert_eq!(saved.log().len(), 1);
    }
}
