//! Companion decisions.
//!
//! A companion sees a narrow slice of the game ([`CompanionContext`]),
//! asks the narrative service for one short line in character, runs it
//! through the [`ContentFilter`], and falls back to keyword heuristics when
//! the service is absent or misbehaves. Decisions have no side effects;
//! the caller logs them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use aw_core::{CompanionId, CompanionProfile, GameAggregate, PartyMemberStatus};
use aw_mechanics::RandomSource;
use serde::{Deserialize, Serialize};

use crate::error::{NarrativeError, NarrativeResult};
use crate::filter::{CANNED_LINE, ContentFilter, FilterOutcome};
use crate::service::{CompletionRequest, NarrativeService, ReplyFormat};

/// What every companion can see, regardless of the scene.
pub const VISIBLE_OBJECTS: &[&str] = &["石墙", "火把", "木门", "地上的血迹"];

/// Log entries a companion remembers.
pub const RECENT_EVENT_LIMIT: usize = 3;

const SCENE_SUMMARY_CHARS: usize = 120;
const PERSONA_TEMPERATURE: f32 = 0.2;
const PERSONA_MAX_TOKENS: u32 = 15;
const WORRYING_CHARS: &[char] = &['血', '杀', '敌', '刀'];

/// How a companion feels about the situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    /// Calm.
    Neutral,
    /// On edge.
    Worried,
    /// Eager.
    Excited,
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neutral => write!(f, "neutral"),
            Self::Worried => write!(f, "worried"),
            Self::Excited => write!(f, "excited"),
        }
    }
}

/// Which path produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    /// The service reply, unchanged.
    Remote,
    /// The service reply after filtering, or the canned line.
    Filtered,
    /// Local keyword heuristics.
    Heuristic,
}

/// One companion turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionDecision {
    /// Inner monologue.
    pub thought: String,
    /// Spoken line.
    pub dialogue: String,
    /// What the companion wants to do next.
    pub suggested_action: String,
    /// Mood.
    pub emotion: Emotion,
    /// Origin.
    pub source: DecisionSource,
}

/// The perception-filtered view a companion decides on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionContext {
    /// Start of the current scene.
    pub scene_description: String,
    /// Objects in sight.
    pub visible_objects: Vec<String>,
    /// Last few log lines, oldest first.
    pub recent_events: Vec<String>,
    /// Party summary.
    pub party_status: Vec<PartyMemberStatus>,
    /// What the player just did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_action: Option<String>,
}

impl CompanionContext {
    /// Build the view from the game state.
    pub fn perceive(game: &GameAggregate, player_action: Option<&str>) -> Self {
        let scene = game.current_scene();
        let first = scene.paragraphs().next().unwrap_or_default();
        Self {
            scene_description: first.chars().take(SCENE_SUMMARY_CHARS).collect(),
            visible_objects: VISIBLE_OBJECTS.iter().map(|s| s.to_string()).collect(),
            recent_events: game
                .log()
                .recent(RECENT_EVENT_LIMIT)
                .iter()
                .map(|e| e.content.clone())
                .collect(),
            party_status: game.party_status(),
            player_action: player_action.map(str::to_string),
        }
    }
}

struct CannedDecision {
    thought: &'static str,
    dialogue: &'static str,
    suggested_action: &'static str,
    emotion: Emotion,
}

impl CannedDecision {
    fn to_decision(&self, source: DecisionSource) -> CompanionDecision {
        CompanionDecision {
            thought: self.thought.to_string(),
            dialogue: self.dialogue.to_string(),
            suggested_action: self.suggested_action.to_string(),
            emotion: self.emotion,
            source,
        }
    }
}

const REJECTED: CannedDecision = CannedDecision {
    thought: "强制本地",
    dialogue: CANNED_LINE,
    suggested_action: "警戒",
    emotion: Emotion::Worried,
};

const KEYWORD_FAMILIES: &[(&[&str], CannedDecision)] = &[
    (
        &["血", "危险"],
        CannedDecision {
            thought: "情况不妙",
            dialogue: "这血迹还没干，保持警戒！",
            suggested_action: "侦查埋伏",
            emotion: Emotion::Worried,
        },
    ),
    (
        &["打", "杀"],
        CannedDecision {
            thought: "终于开战",
            dialogue: "我来扛伤害，你输出！",
            suggested_action: "冲锋",
            emotion: Emotion::Excited,
        },
    ),
    (
        &["宝箱", "金"],
        CannedDecision {
            thought: "小心陷阱",
            dialogue: "别急，先让我检查一下机关。",
            suggested_action: "排查陷阱",
            emotion: Emotion::Excited,
        },
    ),
];

/// Player actions longer than this read as a plan and get [`AGREE_TO_PLAN`].
const PLAN_MIN_CHARS: usize = 8;

const AGREE_TO_PLAN: CannedDecision = CannedDecision {
    thought: "听着呢",
    dialogue: "计划听着可行，我跟着你。",
    suggested_action: "协同行动",
    emotion: Emotion::Neutral,
};

const IDLE_POOL: &[CannedDecision] = &[
    CannedDecision {
        thought: "警戒中",
        dialogue: "我盯着背后，你放心走。",
        suggested_action: "殿后",
        emotion: Emotion::Neutral,
    },
    CannedDecision {
        thought: "太安静",
        dialogue: "这里静得可怕，有埋伏？",
        suggested_action: "侦查",
        emotion: Emotion::Worried,
    },
    CannedDecision {
        thought: "等待",
        dialogue: "你说，我听着。",
        suggested_action: "待命",
        emotion: Emotion::Neutral,
    },
];

/// Decides companion turns. Remembers the last idle line per companion so
/// it is not repeated back to back.
#[derive(Clone, Default)]
pub struct CompanionAgent {
    service: Option<Arc<dyn NarrativeService>>,
    filter: ContentFilter,
    last_idle: HashMap<CompanionId, usize>,
}

impl fmt::Debug for CompanionAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompanionAgent")
            .field("online", &self.service.is_some())
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl CompanionAgent {
    /// An agent backed by `service`, or heuristics-only when `None`.
    pub fn new(service: Option<Arc<dyn NarrativeService>>, filter: ContentFilter) -> Self {
        Self {
            service,
            filter,
            last_idle: HashMap::new(),
        }
    }

    /// Heuristics only, default filter.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Decide one turn for `companion`.
    pub async fn decide(
        &mut self,
        companion: &CompanionProfile,
        context: &CompanionContext,
        rng: &mut dyn RandomSource,
    ) -> CompanionDecision {
        if let Some(service) = self.service.clone() {
            match self.remote_decision(service.as_ref(), companion, context).await {
                Ok(decision) => return decision,
                Err(NarrativeError::ContentPolicy(term)) => {
                    tracing::info!(companion = %companion.id, %term, "companion line rejected, using canned line");
                    return REJECTED.to_decision(DecisionSource::Filtered);
                }
                Err(e) => {
                    tracing::warn!(companion = %companion.id, error = %e, "companion service failed, using heuristics");
                }
            }
        }
        self.heuristic(companion, context, rng)
    }

    async fn remote_decision(
        &self,
        service: &dyn NarrativeService,
        companion: &CompanionProfile,
        context: &CompanionContext,
    ) -> NarrativeResult<CompanionDecision> {
        let raw = service
            .complete(CompletionRequest {
                system_prompt: self.persona_prompt(companion, context),
                user_prompt: format!(
                    "玩家：{}\n{}（压低声音）：",
                    context.player_action.as_deref().unwrap_or("……"),
                    companion.name
                ),
                temperature: PERSONA_TEMPERATURE,
                max_tokens: PERSONA_MAX_TOKENS,
                format: ReplyFormat::Text,
            })
            .await?;

        let reply = parse_reply(&raw)?;
        let outcome = self.filter.sanitize(&reply.dialogue);
        let source = if outcome.is_clean() {
            DecisionSource::Remote
        } else {
            DecisionSource::Filtered
        };
        let dialogue = match outcome {
            FilterOutcome::Rejected { term } => {
                return Err(NarrativeError::ContentPolicy(term.unwrap_or_default()));
            }
            other => other.into_text(),
        };
        let emotion = reply.emotion.unwrap_or_else(|| {
            if dialogue.contains(WORRYING_CHARS) {
                Emotion::Worried
            } else {
                Emotion::Neutral
            }
        });

        Ok(CompanionDecision {
            thought: non_empty(reply.thought).unwrap_or_else(|| "观察".to_string()),
            dialogue,
            suggested_action: non_empty(reply.suggested_action)
                .unwrap_or_else(|| "配合".to_string()),
            emotion,
            source,
        })
    }

    fn persona_prompt(&self, companion: &CompanionProfile, context: &CompanionContext) -> String {
        let forbidden: Vec<&str> = self
            .filter
            .config()
            .forbidden_terms
            .iter()
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .collect();
        let party: Vec<String> = context.party_status.iter().map(|p| p.to_string()).collect();
        format!(
            "你是{}{}，正在地牢中。{}。说话简短（10字以内），描述眼前具体事物（血、门、声音）。绝对禁止：{}。\n\n【眼前】{}\n【可见】{}\n【刚才】{}\n【队伍】{}",
            companion.class,
            companion.name,
            companion.personality,
            forbidden.join("、"),
            context.scene_description,
            context.visible_objects.join("、"),
            context.recent_events.join(" / "),
            party.join("；"),
        )
    }

    fn heuristic(
        &mut self,
        companion: &CompanionProfile,
        context: &CompanionContext,
        rng: &mut dyn RandomSource,
    ) -> CompanionDecision {
        let input = context
            .player_action
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        for (keywords, canned) in KEYWORD_FAMILIES {
            if keywords.iter().any(|k| input.contains(k)) {
                return canned.to_decision(DecisionSource::Heuristic);
            }
        }
        if input.chars().count() > PLAN_MIN_CHARS {
            return AGREE_TO_PLAN.to_decision(DecisionSource::Heuristic);
        }

        let pick = match self.last_idle.get(&companion.id) {
            Some(&prev) if IDLE_POOL.len() > 1 => {
                let i = rng.gen_index(IDLE_POOL.len() - 1);
                if i >= prev { i + 1 } else { i }
            }
            _ => rng.gen_index(IDLE_POOL.len()),
        };
        self.last_idle.insert(companion.id.clone(), pick);
        IDLE_POOL
            .get(pick)
            .unwrap_or(&IDLE_POOL[0])
            .to_decision(DecisionSource::Heuristic)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDecision {
    dialogue: String,
    thought: Option<String>,
    suggested_action: Option<String>,
    emotion: Option<Emotion>,
}

fn parse_reply(raw: &str) -> NarrativeResult<WireDecision> {
    let text = raw.trim();
    let reply = if text.starts_with('{') {
        serde_json::from_str::<WireDecision>(text)
            .map_err(|e| NarrativeError::Schema(e.to_string()))?
    } else {
        WireDecision {
            dialogue: text.trim_matches(|c| c == '"' || c == '“' || c == '”').to_string(),
            thought: None,
            suggested_action: None,
            emotion: None,
        }
    };
    if reply.dialogue.trim().is_empty() {
        return Err(NarrativeError::Schema("empty dialogue".to_string()));
    }
    Ok(reply)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}
