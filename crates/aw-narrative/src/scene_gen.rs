//! Scene generation: remote request, strict validation, local fallback.

use std::sync::Arc;

use aw_core::{Choice, ChoiceKind, InventoryItem, ItemId, ItemKind, NodeKind, RequiredCheck, Scene, Stat};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{NarrativeError, NarrativeResult};
use crate::service::{CompletionRequest, NarrativeService, ReplyFormat};

/// Characters of the previous scene sent as context.
pub const PREVIOUS_SCENE_EXCERPT_CHARS: usize = 200;

const DEFAULT_TITLE: &str = "未知区域";
const DEFAULT_DESCRIPTION: &str = "你们在黑暗中前行...";
const DEFAULT_CHOICE_TEXT: &str = "继续前进";

const SCENE_TEMPERATURE: f32 = 0.8;
const SCENE_MAX_TOKENS: u32 = 800;

const GAME_MASTER_PROMPT: &str = r#"你是TRPG游戏主持人，负责生成地牢探险剧情。

【要求】
1. 描述要有感官细节（气味、声音、触觉）
2. 必须包含莱拉（女战士）的反应和对话
3. 提供3-4个具体行动选项，每个选项要有明确的检定类型（combat/explore/talk）
4. 剧情要连贯，有紧张感和进展感
5. 严格返回JSON格式

【输出格式】
{
  "title": "场景标题（简洁，5字以内）",
  "description": "详细描述（150-250字，分段落，用\n换行）",
  "choices": [
    {"id": "选项ID", "text": "选项文本（15字以内）", "type": "combat|explore|talk|item", "requiredCheck": {"stat": "str|dex|int", "difficulty": 10-15}}
  ],
  "nodeType": "combat|event|safe",
  "loot": [{"name": "物品名", "icon": "emoji"}]
}"#;

/// Inputs for one scene request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRequest {
    /// Start of the previous scene description.
    pub previous_scene_excerpt: String,
    /// What the player chose.
    pub player_choice_text: String,
    /// Where the party stands.
    pub location_name: String,
    /// One-line party summary.
    pub party_status_text: String,
}

impl SceneRequest {
    /// Build a request, cutting the previous scene to its excerpt.
    pub fn new(
        previous_scene: &str,
        player_choice_text: impl Into<String>,
        location_name: impl Into<String>,
        party_status_text: impl Into<String>,
    ) -> Self {
        Self {
            previous_scene_excerpt: previous_scene
                .chars()
                .take(PREVIOUS_SCENE_EXCERPT_CHARS)
                .collect(),
            player_choice_text: player_choice_text.into(),
            location_name: location_name.into(),
            party_status_text: party_status_text.into(),
        }
    }

    fn user_prompt(&self) -> String {
        format!(
            "【前情提要】{}...\n\n【玩家行动】{}\n\n【当前位置】{}\n\n【队伍状态】{}\n\n请生成下一个场景内容：",
            self.previous_scene_excerpt,
            self.player_choice_text,
            self.location_name,
            self.party_status_text
        )
    }
}

/// Where a scene came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSource {
    /// Produced by the narrative service.
    Remote,
    /// The built-in fallback.
    Fallback,
}

/// A validated scene plus the loot that comes with it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedScene {
    /// The scene.
    pub scene: Scene,
    /// New items, in reply order.
    pub loot: Vec<InventoryItem>,
    /// Origin.
    pub source: SceneSource,
}

/// Produces the next scene, remote first, falling back locally.
#[derive(Clone, Default)]
pub struct SceneGenerator {
    service: Option<Arc<dyn NarrativeService>>,
}

impl SceneGenerator {
    /// A generator backed by `service`, or offline when `None`.
    pub fn new(service: Option<Arc<dyn NarrativeService>>) -> Self {
        Self { service }
    }

    /// A generator that only ever returns the fallback scene.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Whether a service is attached.
    pub fn is_online(&self) -> bool {
        self.service.is_some()
    }

    /// Generate the next scene. Never fails and never retries.
    pub async fn generate(&self, request: &SceneRequest) -> GeneratedScene {
        let Some(service) = &self.service else {
            return fallback();
        };
        let completion = CompletionRequest {
            system_prompt: GAME_MASTER_PROMPT.to_string(),
            user_prompt: request.user_prompt(),
            temperature: SCENE_TEMPERATURE,
            max_tokens: SCENE_MAX_TOKENS,
            format: ReplyFormat::JsonObject,
        };
        let result = service
            .complete(completion)
            .await
            .and_then(|raw| parse_scene(&raw));
        match result {
            Ok((scene, loot)) => GeneratedScene {
                scene,
                loot,
                source: SceneSource::Remote,
            },
            Err(e) => {
                tracing::warn!(error = %e, "scene generation failed, using fallback scene");
                fallback()
            }
        }
    }
}

impl std::fmt::Debug for SceneGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGenerator")
            .field("online", &self.is_online())
            .finish()
    }
}

fn fallback() -> GeneratedScene {
    GeneratedScene {
        scene: fallback_scene(),
        loot: Vec::new(),
        source: SceneSource::Fallback,
    }
}

/// The fixed scene used whenever generation fails.
pub fn fallback_scene() -> Scene {
    let choices = vec![
        Choice::new("advance", "小心前进", ChoiceKind::Explore),
        Choice::new("search", "搜索墙面", ChoiceKind::Explore),
        Choice::new("rest", "短暂休息", ChoiceKind::Safe),
    ];
    let description = "你们在狭窄的走廊中前行。墙壁上的火把忽明忽暗，远处传来水滴的回声。\n\n莱拉握紧武器：\"保持警惕，我感觉到有什么东西在注视我们。\"";
    match Scene::new("fallback", "黑暗走廊", description, NodeKind::Event, choices) {
        Ok(scene) => scene,
        Err(e) => unreachable!("fallback scene is valid: {e}"),
    }
}

/// Parse and validate a raw reply into a scene and its loot.
pub fn parse_scene(raw: &str) -> NarrativeResult<(Scene, Vec<InventoryItem>)> {
    let json = strip_code_fence(raw);
    let wire: WireScene =
        serde_json::from_str(json).map_err(|e| NarrativeError::Schema(e.to_string()))?;

    let choices: Vec<Choice> = match wire.choices {
        Some(list) if !list.is_empty() => list
            .into_iter()
            .enumerate()
            .map(|(idx, c)| Choice {
                id: non_empty(c.id).unwrap_or_else(|| format!("choice_{idx}")),
                text: non_empty(c.text).unwrap_or_else(|| DEFAULT_CHOICE_TEXT.to_string()),
                kind: c.kind.map(ChoiceKind::from).unwrap_or(ChoiceKind::Explore),
                required_check: c.required_check.map(|r| RequiredCheck {
                    stat: r.stat,
                    difficulty: r.difficulty,
                }),
            })
            .collect(),
        _ => vec![Choice::new("continue", DEFAULT_CHOICE_TEXT, ChoiceKind::Explore)],
    };

    let scene = Scene::new(
        format!("scene_{}", Uuid::new_v4().simple()),
        non_empty(wire.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        non_empty(wire.description).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        wire.node_type.map(NodeKind::from).unwrap_or(NodeKind::Event),
        choices,
    )
    .map_err(|e| NarrativeError::Schema(e.to_string()))?;

    let loot = wire
        .loot
        .unwrap_or_default()
        .into_iter()
        .map(|l| {
            let kind = l
                .kind
                .as_deref()
                .and_then(ItemKind::parse)
                .unwrap_or(ItemKind::Consumable);
            InventoryItem::new(ItemId::generate(), l.name, kind).with_icon(l.icon.unwrap_or_default())
        })
        .collect();

    Ok((scene, loot))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

// -- Wire types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireScene {
    title: Option<String>,
    description: Option<String>,
    choices: Option<Vec<WireChoice>>,
    node_type: Option<WireNodeType>,
    loot: Option<Vec<WireLoot>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChoice {
    id: Option<String>,
    text: Option<String>,
    #[serde(rename = "type")]
    kind: Option<WireChoiceKind>,
    required_check: Option<WireCheck>,
}

#[derive(Debug, Deserialize)]
struct WireCheck {
    stat: Stat,
    difficulty: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireChoiceKind {
    Combat,
    Explore,
    Talk,
    Item,
}

impl From<WireChoiceKind> for ChoiceKind {
    fn from(k: WireChoiceKind) -> Self {
        match k {
            WireChoiceKind::Combat => ChoiceKind::Combat,
            WireChoiceKind::Explore => ChoiceKind::Explore,
            WireChoiceKind::Talk => ChoiceKind::Talk,
            WireChoiceKind::Item => ChoiceKind::Item,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireNodeType {
    Combat,
    Event,
    Safe,
    Boss,
}

impl From<WireNodeType> for NodeKind {
    fn from(k: WireNodeType) -> Self {
        match k {
            WireNodeType::Combat => NodeKind::Combat,
            WireNodeType::Event => NodeKind::Event,
            WireNodeType::Safe => NodeKind::Safe,
            WireNodeType::Boss => NodeKind::Boss,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireLoot {
    name: String,
    icon: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MockNarrativeService;

    fn generator_returning(reply: NarrativeResult<String>) -> SceneGenerator {
        let mut mock = MockNarrativeService::new();
        let mut reply = Some(reply);
        mock.expect_complete()
            .times(1)
            .returning(move |_| reply.take().unwrap_or_else(|| Ok(String::new())));
        SceneGenerator::new(Some(Arc::new(mock)))
    }

    fn request() -> SceneRequest {
        SceneRequest::new("你站在石室中。", "推开左边的门", "地牢入口", "你 HP30/30")
    }

    #[test]
    fn excerpt_is_cut_by_characters() {
        let long: String = "火".repeat(300);
        let req = SceneRequest::new(&long, "a", "b", "c");
        assert_eq!(req.previous_scene_excerpt.chars().count(), 200);
        assert!(req.user_prompt().starts_with("【前情提要】火"));
    }

    #[tokio::test]
    async fn transport_failure_returns_fallback() {
        let generator =
            generator_returning(Err(NarrativeError::Transport("connection refused".into())));
        let out = generator.generate(&request()).await;
        assert_eq!(out.source, SceneSource::Fallback);
        assert_eq!(out.scene.title, "黑暗走廊");
        assert!(!out.scene.choices().is_empty());
        assert!(out
            .scene
            .choices()
            .iter()
            .all(|c| matches!(c.kind, ChoiceKind::Explore | ChoiceKind::Safe)));
        assert!(out.loot.is_empty());
    }

    #[tokio::test]
    async fn offline_generator_returns_fallback() {
        let out = SceneGenerator::offline().generate(&request()).await;
        assert_eq!(out.source, SceneSource::Fallback);
        assert_eq!(out.scene, fallback_scene());
    }

    #[tokio::test]
    async fn valid_reply_is_used_with_loot() {
        let reply = r#"{
            "title": "血迹",
            "description": "地上有拖拽的血迹。\n\n莱拉蹲下查看。",
            "choices": [
                {"id": "follow", "text": "顺着血迹走", "type": "explore", "requiredCheck": {"stat": "int", "difficulty": 12}},
                {"id": "fight", "text": "拔剑", "type": "combat"}
            ],
            "nodeType": "combat",
            "loot": [{"name": "旧匕首", "icon": "🗡️", "type": "weapon"}, {"name": "面包"}]
        }"#;
        let out = generator_returning(Ok(reply.to_string())).generate(&request()).await;
        assert_eq!(out.source, SceneSource::Remote);
        assert_eq!(out.scene.title, "血迹");
        assert_eq!(out.scene.category, NodeKind::Combat);
        assert_eq!(out.scene.paragraphs().count(), 2);
        let follow = out.scene.choice("follow").unwrap();
        assert_eq!(follow.required_check.unwrap().stat, Stat::Int);
        assert_eq!(out.loot.len(), 2);
        assert_eq!(out.loot[0].kind, ItemKind::Weapon);
        assert_eq!(out.loot[1].kind, ItemKind::Consumable);
        assert_ne!(out.loot[0].id, out.loot[1].id);
    }

    #[tokio::test]
    async fn schema_violation_returns_fallback() {
        let reply = r#"{"title": "x", "choices": [{"id": "a", "type": "dance"}]}"#;
        let out = generator_returning(Ok(reply.to_string())).generate(&request()).await;
        assert_eq!(out.source, SceneSource::Fallback);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let (scene, loot) = parse_scene("{}").unwrap();
        assert_eq!(scene.title, DEFAULT_TITLE);
        assert_eq!(scene.description, DEFAULT_DESCRIPTION);
        assert_eq!(scene.category, NodeKind::Event);
        assert_eq!(scene.choices().len(), 1);
        assert_eq!(scene.choices()[0].id, "continue");
        assert!(loot.is_empty());
    }

    #[test]
    fn empty_choices_get_default() {
        let (scene, _) = parse_scene(r#"{"choices": []}"#).unwrap();
        assert_eq!(scene.choices()[0].text, DEFAULT_CHOICE_TEXT);
    }

    #[test]
    fn partial_choices_are_filled_in() {
        let (scene, _) = parse_scene(r#"{"choices": [{}, {"text": "喊话", "type": "talk"}]}"#).unwrap();
        let c = scene.choices();
        assert_eq!(c[0].id, "choice_0");
        assert_eq!(c[0].text, DEFAULT_CHOICE_TEXT);
        assert_eq!(c[0].kind, ChoiceKind::Explore);
        assert_eq!(c[1].id, "choice_1");
        assert_eq!(c[1].kind, ChoiceKind::Talk);
    }

    #[test]
    fn schema_violations() {
        for raw in [
            "not json",
            "[]",
            r#"{"title": 5}"#,
            r#"{"choices": [{"type": "safe"}]}"#,
            r#"{"nodeType": "start"}"#,
            r#"{"choices": [{"requiredCheck": {"stat": "cha", "difficulty": 10}}]}"#,
            r#"{"loot": [{"icon": "💎"}]}"#,
            r#"{"choices": [{"id": "a"}, {"id": "a"}]}"#,
        ] {
            assert!(
                matches!(parse_scene(raw), Err(NarrativeError::Schema(_))),
                "expected schema violation for {raw}"
            );
        }
    }

    #[test]
    fn code_fence_is_stripped() {
        let raw = "```json\n{\"title\": \"泉水\", \"nodeType\": \"safe\"}\n```";
        let (scene, _) = parse_scene(raw).unwrap();
        assert_eq!(scene.title, "泉水");
        assert_eq!(scene.category, NodeKind::Safe);
    }
}
