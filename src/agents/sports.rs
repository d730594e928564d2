//! Sports recommendation domain

use crate::routing::domain::{AgentDomain, AgentReply, PatternRule, WeightPreset};
use serde_json::json;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SportsAgent {
    Soccer,
    Basketball,
    Baseball,
    Tennis,
}

use SportsAgent::*;

// Seed presets; the leaning agent gets about half of the mass.
const PATTERN_RULES: &[PatternRule<SportsAgent>] = &[
    PatternRule {
        name: "축구",
        keywords: &["축구", "풋살", "킥", "골", "패스"],
        weights: &[(Soccer, 55.0), (Basketball, 15.0), (Baseball, 15.0), (Tennis, 15.0)],
    },
    PatternRule {
        name: "농구",
        keywords: &["농구", "농구장", "슛", "3점", "자유투"],
        weights: &[(Soccer, 15.0), (Basketball, 55.0), (Baseball, 15.0), (Tennis, 15.0)],
    },
    PatternRule {
        name: "야구",
        keywords: &["야구", "배팅", "타격", "캐치볼", "홈런", "투구"],
        weights: &[(Soccer, 15.0), (Basketball, 15.0), (Baseball, 55.0), (Tennis, 15.0)],
    },
    PatternRule {
        name: "테니스",
        keywords: &["테니스", "라켓", "서브", "발리", "레슨"],
        weights: &[(Soccer, 15.0), (Basketball, 15.0), (Baseball, 15.0), (Tennis, 55.0)],
    },
];

const WEIGHT_PRESETS: &[WeightPreset<SportsAgent>] = &[
    WeightPreset {
        name: "soccer_focus",
        weights: &[(Soccer, 1.5), (Basketball, 0.8), (Baseball, 0.8), (Tennis, 0.9)],
    },
    WeightPreset {
        name: "basketball_focus",
        weights: &[(Soccer, 0.8), (Basketball, 1.4), (Baseball, 0.9), (Tennis, 0.9)],
    },
    WeightPreset {
        name: "baseball_focus",
        weights: &[(Soccer, 0.8), (Basketball, 0.9), (Baseball, 1.4), (Tennis, 0.9)],
    },
];

impl AgentDomain for SportsAgent {
    const NAME: &'static str = "sports";
    const TITLE: &'static str = "운동 추천 멀티 에이전트 시스템";
    const ALL: &'static [Self] = &[Soccer, Basketball, Baseball, Tennis];
    const PATTERN_RULES: &'static [PatternRule<Self>] = PATTERN_RULES;
    const WEIGHT_PRESETS: &'static [WeightPreset<Self>] = WEIGHT_PRESETS;
    const SAMPLE_RANGE: (u64, u64) = (50, 200);

    fn id(self) -> &'static str {
        match self {
            Soccer => "축구_에이전트",
            Basketball => "농구_에이전트",
            Baseball => "야구_에이전트",
            Tennis => "테니스_에이전트",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Soccer => "soccer",
            Basketball => "basketball",
            Baseball => "baseball",
            Tennis => "tennis",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Soccer => "🥅",
            Basketball => "🏀",
            Baseball => "⚾",
            Tennis => "🎾",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Soccer => "축구, 풋살, 킥볼 관련 모든 활동",
            Basketball => "농구, 3x3 농구, 슛팅 연습 관련 활동",
            Baseball => "야구, 소프트볼, 타격 연습 관련 활동",
            Tennis => "테니스, 배드민턴, 라켓 스포츠 관련 활동",
        }
    }

    fn decision_keywords(self) -> &'static [&'static str] {
        match self {
            Soccer => &["축구", "풋살", "킥", "골"],
            Basketball => &["농구", "농구장", "슛", "3점"],
            Baseball => &["야구", "배팅", "타격", "홈런"],
            Tennis => &["테니스", "라켓", "서브", "코트"],
        }
    }

    fn respond(self, _query: &str) -> AgentReply {
        let (answer, detail) = match self {
            Soccer => (
                "축구를 추천해드릴게요! 근처 축구장에서 풋살이나 축구 경기는 어떠세요?",
                "축구장 정보, 팀 매칭, 축구 용품 추천 등 축구 관련 모든 정보를 제공합니다.",
            ),
            Basketball => (
                "농구를 추천해드릴게요! 농구장에서 3대3이나 자유투 연습은 어떠세요?",
                "농구장 정보, 팀 구성, 농구 기술 연습법 등 농구 관련 정보를 제공합니다.",
            ),
            Baseball => (
                "야구를 추천해드릴게요! 타격장에서 배팅 연습이나 캐치볼은 어떠세요?",
                "야구장 정보, 팀 가입, 야구 기술 향상법 등 야구 관련 정보를 제공합니다.",
            ),
            Tennis => (
                "테니스를 추천해드릴게요! 테니스장에서 레슨이나 경기는 어떠세요?",
                "테니스장 예약, 레슨 정보, 파트너 매칭 등 테니스 관련 정보를 제공합니다.",
            ),
        };

        AgentReply {
            agent: self.id().to_string(),
            answer: answer.to_string(),
            confidence: 1.0,
            details: json!({ "detail": detail }),
        }
    }
}

impl fmt::Display for SportsAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
