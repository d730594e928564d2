//! Food recommendation domain

use crate::routing::domain::{AgentDomain, AgentReply, PatternRule, WeightPreset};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodAgent {
    Refrigerator,
    Restaurant,
    RecipeSearch,
    HealthConsulting,
}

use FoodAgent::*;

const PATTERN_RULES: &[PatternRule<FoodAgent>] = &[
    PatternRule {
        name: "맛집",
        keywords: &["맛집", "음식점", "외식", "데이트"],
        weights: &[(Refrigerator, 5.0), (Restaurant, 70.0), (RecipeSearch, 10.0), (HealthConsulting, 15.0)],
    },
    PatternRule {
        name: "요리",
        keywords: &["요리", "만들기", "레시피", "조리"],
        weights: &[(Refrigerator, 40.0), (Restaurant, 10.0), (RecipeSearch, 40.0), (HealthConsulting, 10.0)],
    },
    PatternRule {
        name: "다이어트",
        keywords: &["다이어트", "건강", "칼로리", "살"],
        weights: &[(Refrigerator, 15.0), (Restaurant, 10.0), (RecipeSearch, 15.0), (HealthConsulting, 60.0)],
    },
    PatternRule {
        name: "음식 추천",
        keywords: &["음식", "추천", "뭐"],
        weights: &[(Refrigerator, 30.0), (Restaurant, 25.0), (RecipeSearch, 25.0), (HealthConsulting, 20.0)],
    },
];

const WEIGHT_PRESETS: &[WeightPreset<FoodAgent>] = &[
    WeightPreset {
        name: "fridge_focus",
        weights: &[(Refrigerator, 1.4), (Restaurant, 0.8), (RecipeSearch, 0.9), (HealthConsulting, 0.9)],
    },
    WeightPreset {
        name: "restaurant_focus",
        weights: &[(Refrigerator, 0.8), (Restaurant, 1.4), (RecipeSearch, 0.9), (HealthConsulting, 0.9)],
    },
    WeightPreset {
        name: "recipe_focus",
        weights: &[(Refrigerator, 0.9), (Restaurant, 0.8), (RecipeSearch, 1.4), (HealthConsulting, 0.9)],
    },
    WeightPreset {
        name: "health_focus",
        weights: &[(Refrigerator, 0.9), (Restaurant, 0.8), (RecipeSearch, 0.9), (HealthConsulting, 1.4)],
    },
];

const FRIDGE_RECIPES: &[&str] = &[
    "계란과 양파로 오믈렛 만들기: 계란 2개를 풀고 양파를 볶아서 함께 요리하세요.",
    "감자와 베이컨 볶음: 감자를 얇게 썰어 베이컨과 함께 볶으면 맛있어요.",
    "토마토 스크램블 에그: 토마토와 계란을 함께 볶아 간단한 요리를 만드세요.",
    "양배추 볶음밥: 남은 밥과 양배추로 간단한 볶음밥을 만들어보세요.",
    "치즈 토스트: 식빵에 치즈를 올려 구워서 간단한 간식을 만드세요.",
];

// (name, cuisine, price, rating)
const RESTAURANTS: &[(&str, &str, &str, f32)] = &[
    ("맛있는 한식당", "한식", "중간", 4.5),
    ("이탈리아 파스타", "이탈리안", "높음", 4.7),
    ("동네 치킨집", "치킨", "낮음", 4.2),
    ("스시 마스터", "일식", "높음", 4.8),
    ("중국집 맛가", "중식", "중간", 4.3),
];

// (name, ingredients, time)
const RECIPES: &[(&str, &[&str], &str)] = &[
    ("김치볶음밥", &["밥 1공기", "김치 100g", "돼지고기 50g", "계란 1개", "파 적당량"], "15분"),
    ("스파게티 카르보나라", &["스파게티 200g", "베이컨 100g", "계란 2개", "파마산 치즈", "마늘"], "20분"),
    ("된장찌개", &["된장 2큰술", "두부 150g", "양파 1/2개", "애호박 1/3개", "대파 1대"], "25분"),
];

// (food, benefits, calories)
const HEALTH_FOODS: &[(&str, &str, &str)] = &[
    ("퀴노아 샐러드", "고단백, 글루텐프리, 풍부한 식이섬유", "약 200kcal"),
    ("연어 스테이크", "오메가3 풍부, 고단백 저칼로리", "약 250kcal"),
    ("아보카도 토스트", "건강한 지방, 식이섬유 풍부", "약 300kcal"),
    ("그릭 요거트 베리볼", "프로바이오틱스, 저당, 고단백", "약 150kcal"),
];

impl AgentDomain for FoodAgent {
    const NAME: &'static str = "food";
    const TITLE: &'static str = "음식 추천 멀티 에이전트 시스템";
    const ALL: &'static [Self] = &[Refrigerator, Restaurant, RecipeSearch, HealthConsulting];
    const PATTERN_RULES: &'static [PatternRule<Self>] = PATTERN_RULES;
    const WEIGHT_PRESETS: &'static [WeightPreset<Self>] = WEIGHT_PRESETS;
    const SAMPLE_RANGE: (u64, u64) = (80, 150);

    fn id(self) -> &'static str {
        match self {
            Refrigerator => "냉장고_재료_에이전트",
            Restaurant => "음식점_추천_에이전트",
            RecipeSearch => "레시피_검색_에이전트",
            HealthConsulting => "건강식_컨설팅_에이전트",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Refrigerator => "refrigerator",
            Restaurant => "restaurant",
            RecipeSearch => "recipe",
            HealthConsulting => "health",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Refrigerator => "🧊",
            Restaurant => "🍽️",
            RecipeSearch => "📖",
            HealthConsulting => "🥗",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Refrigerator => "집에 있는 냉장고 재료로 만들 수 있는 요리 추천",
            Restaurant => "외식 장소와 맛집 추천",
            RecipeSearch => "상세한 요리법과 조리 과정 제공",
            HealthConsulting => "다이어트와 건강 목적의 음식 추천",
        }
    }

    fn decision_keywords(self) -> &'static [&'static str] {
        match self {
            Refrigerator => &["냉장고", "재료", "집에서"],
            Restaurant => &["음식점", "식당", "외식"],
            RecipeSearch => &["레시피", "요리법", "만드는법"],
            HealthConsulting => &["건강", "다이어트", "영양"],
        }
    }

    fn respond(self, _query: &str) -> AgentReply {
        let mut rng = rand::thread_rng();

        match self {
            Refrigerator => {
                let recipe = FRIDGE_RECIPES.choose(&mut rng).copied().unwrap_or_default();
                AgentReply {
                    agent: self.id().to_string(),
                    answer: format!("냉장고에 있는 재료로 다음 요리를 추천드립니다: {}", recipe),
                    confidence: 0.85,
                    details: json!({
                        "ingredients_needed": ["기본 재료들", "조미료"],
                        "cooking_time": format!("{}분", rng.gen_range(10..=30)),
                    }),
                }
            }
            Restaurant => {
                let (name, cuisine, price, rating) =
                    RESTAURANTS.choose(&mut rng).copied().unwrap_or(RESTAURANTS[0]);
                AgentReply {
                    agent: self.id().to_string(),
                    answer: format!(
                        "{}을 추천드립니다. {} 음식점으로 가격대는 {}이고 평점은 {}점입니다.",
                        name, cuisine, price, rating
                    ),
                    confidence: 0.78,
                    details: json!({
                        "restaurant_info": { "name": name, "cuisine": cuisine, "price": price, "rating": rating },
                        "location": "근처",
                    }),
                }
            }
            RecipeSearch => {
                let (name, ingredients, time) = RECIPES.choose(&mut rng).copied().unwrap_or(RECIPES[0]);
                AgentReply {
                    agent: self.id().to_string(),
                    answer: format!("{} 레시피를 찾아드렸습니다. 조리시간: {}", name, time),
                    confidence: 0.92,
                    details: json!({
                        "recipe": { "name": name, "ingredients": ingredients, "time": time },
                        "difficulty": "중간",
                    }),
                }
            }
            HealthConsulting => {
                let (food, benefits, calories) =
                    HEALTH_FOODS.choose(&mut rng).copied().unwrap_or(HEALTH_FOODS[0]);
                AgentReply {
                    agent: self.id().to_string(),
                    answer: format!(
                        "건강을 위해 {}을 추천드립니다. {} 효과가 있고 칼로리는 {}입니다.",
                        food, benefits, calories
                    ),
                    confidence: 0.88,
                    details: json!({
                        "health_info": { "food": food, "benefits": benefits, "calories": calories },
                        "recommendation_type": "건강식",
                    }),
                }
            }
        }
    }
}

impl fmt::Display for FoodAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
