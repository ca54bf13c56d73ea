//! Scenes and their selectable choices.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::character::Stat;
use crate::error::{CoreError, CoreResult};
use crate::map::NodeKind;

/// The flavour of a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceKind {
    /// Fight.
    Combat,
    /// Look around, move on.
    Explore,
    /// Talk to someone.
    Talk,
    /// Use something.
    Item,
    /// Rest. Only offered by locally built scenes.
    Safe,
}

impl ChoiceKind {
    /// Button icon.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Combat => "⚔️",
            Self::Explore => "🔍",
            Self::Talk => "💬",
            Self::Item => "🎒",
            Self::Safe => "🏕️",
        }
    }
}

impl fmt::Display for ChoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Combat => write!(f, "combat"),
            Self::Explore => write!(f, "explore"),
            Self::Talk => write!(f, "talk"),
            Self::Item => write!(f, "item"),
            Self::Safe => write!(f, "safe"),
        }
    }
}

/// A skill check gating a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredCheck {
    /// Attribute rolled against.
    pub stat: Stat,
    /// Target total.
    pub difficulty: i32,
}

/// A player-selectable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Unique within its scene.
    pub id: String,
    /// Button text.
    pub text: String,
    /// Flavour.
    #[serde(rename = "type")]
    pub kind: ChoiceKind,
    /// Optional skill check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_check: Option<RequiredCheck>,
}

impl Choice {
    /// A choice without a check.
    pub fn new(id: impl Into<String>, text: impl Into<String>, kind: ChoiceKind) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind,
            required_check: None,
        }
    }

    /// Gate the choice behind a check.
    pub fn with_check(mut self, stat: Stat, difficulty: i32) -> Self {
        self.required_check = Some(RequiredCheck { stat, difficulty });
        self
    }
}

/// A narrative unit: a description and at least one choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SceneRepr")]
pub struct Scene {
    /// Scene id.
    pub id: String,
    /// Heading.
    pub title: String,
    /// Free text, may contain blank-line paragraph breaks.
    pub description: String,
    /// Category tag reported by the generator.
    #[serde(rename = "nodeType")]
    pub category: NodeKind,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct SceneRepr {
    id: String,
    title: String,
    description: String,
    #[serde(rename = "nodeType")]
    category: NodeKind,
    choices: Vec<Choice>,
}

impl TryFrom<SceneRepr> for Scene {
    type Error = CoreError;

    fn try_from(r: SceneRepr) -> CoreResult<Self> {
        Scene::new(r.id, r.title, r.description, r.category, r.choices)
    }
}

impl Scene {
    /// Build a scene. Fails if there are no choices or two choices share an id.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: NodeKind,
        choices: Vec<Choice>,
    ) -> CoreResult<Self> {
        let id = id.into();
        if choices.is_empty() {
            return Err(CoreError::EmptyScene(id));
        }
        let mut seen = HashSet::new();
        for c in &choices {
            if !seen.insert(c.id.as_str()) {
                return Err(CoreError::DuplicateChoice(c.id.clone()));
            }
        }
        Ok(Self {
            id,
            title: title.into(),
            description: description.into(),
            category,
            choices,
        })
    }

    /// Choices in display order. Never empty.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Look up a choice by id.
    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }

    /// Description split into non-empty paragraphs.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.description
            .split('\n')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_choices() -> Vec<Choice> {
        vec![
            Choice::new("left", "推开左门", ChoiceKind::Explore).with_check(Stat::Dex, 10),
            Choice::new("talk", "询问莱拉", ChoiceKind::Talk),
        ]
    }

    #[test]
    fn build_and_lookup() {
        let s = Scene::new("s1", "石室", "火把摇曳。", NodeKind::Event, two_choices()).unwrap();
        assert_eq!(s.choices().len(), 2);
        let left = s.choice("left").unwrap();
        assert_eq!(
            left.required_check,
            Some(RequiredCheck {
                stat: Stat::Dex,
                difficulty: 10
            })
        );
        assert!(s.choice("right").is_none());
    }

    #[test]
    fn empty_scene_rejected() {
        let err = Scene::new("s1", "石室", "", NodeKind::Event, vec![]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyScene(_)));
    }

    #[test]
    fn duplicate_choice_rejected() {
        let mut choices = two_choices();
        choices.push(Choice::new("left", "再推一次", ChoiceKind::Explore));
        let err = Scene::new("s1", "石室", "", NodeKind::Event, choices).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateChoice(id) if id == "left"));
    }

    #[test]
    fn paragraphs_skip_blank_lines() {
        let s = Scene::new(
            "s1",
            "走廊",
            "第一段。\n\n第二段。\n",
            NodeKind::Event,
            two_choices(),
        )
        .unwrap();
        let paras: Vec<&str> = s.paragraphs().collect();
        assert_eq!(paras, vec!["第一段。", "第二段。"]);
    }

    #[test]
    fn serde_shape_and_validation() {
        let s = Scene::new("s1", "石室", "d", NodeKind::Safe, two_choices()).unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["nodeType"], "safe");
        assert_eq!(json["choices"][0]["type"], "explore");
        assert_eq!(json["choices"][0]["requiredCheck"]["stat"], "dex");
        assert!(json["choices"][1].get("requiredCheck").is_none());

        let back: Scene = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);

        let empty = r#"{"id":"x","title":"t","description":"d","nodeType":"event","choices":[]}"#;
        assert!(serde_json::from_str::<Scene>(empty).is_err());
    }
}
