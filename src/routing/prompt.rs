//! Supervisor prompt rendering
//!
//! Deterministic template: the same query, distribution and sample size
//! always render the same text.

use super::distribution::Distribution;
use super::domain::AgentDomain;
use crate::config::OutputMode;
use crate::core::llm::JsonSchemaFormat;
use serde_json::json;
use std::fmt::Write;

/// Label the free-text contract asks the model to emit
pub const SELECTION_LABEL: &str = "선택된 에이전트";
pub const REASON_LABEL: &str = "이유";
pub const CONFIDENCE_LABEL: &str = "확신도";

pub fn build_prompt<A: AgentDomain>(
    query: &str,
    normalized: &Distribution<A>,
    sample_size: u64,
    mode: OutputMode,
) -> String {
    let percentages = normalized.to_percentages();
    let count = A::ALL.len();
    let mut prompt = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(prompt, "당신은 {}의 SUPERVISOR입니다.\n", A::TITLE);
    let _ = writeln!(prompt, "사용자 질문: \"{}\"\n", query);
    let _ = writeln!(prompt, "다음 {}개의 전문 에이전트 중 정확히 하나를 선택해야 합니다:\n", count);
    for agent in A::ALL {
        let _ = writeln!(prompt, "{} {} - {}", agent.icon(), agent.id(), agent.description());
    }

    let _ = writeln!(prompt, "\n=== 과거 사용자 패턴 데이터 (총 {}회) ===", sample_size);
    for (agent, percentage) in percentages.iter() {
        let _ = writeln!(prompt, "{}: {:.1}%", agent.id(), percentage);
    }

    prompt.push_str(
        "\n=== 판단 기준 ===\n\
         1. 사용자 질문의 키워드 관련성이 가장 중요하며, 과거 패턴 데이터보다 우선합니다.\n\
         2. 퍼센트가 높다고 해서 우선순위가 자동으로 높아지는 것은 아닙니다.\n\
         3. 퍼센트는 100번 중 해당 에이전트가 선택된 횟수입니다. 40%이면 100번 중 40번 선택되었다는 의미이고, 0%이면 한 번도 선택되지 않았다는 의미입니다.\n\
         4. 에이전트가 나열된 순서는 우선순위가 아닙니다.\n\
         5. 분포가 균등하다고 첫번째 에이전트를 선택하지 마세요. 분포가 균등하면 주사위를 던지는 것처럼 스스로 확률에 맡기세요.\n",
    );

    if normalized.is_near_uniform(0.01) {
        prompt.push_str("(현재 분포는 거의 균등합니다.)\n");
    }

    let _ = writeln!(
        prompt,
        "\n분석해서 가장 적합한 에이전트를 선택하고, 구체적인 이유와 확신도(0.0~1.0)를 제공하세요."
    );

    match mode {
        OutputMode::Text => {
            let _ = writeln!(prompt, "\n=== 응답 형식 ===");
            let _ = writeln!(prompt, "{}: <에이전트명>", SELECTION_LABEL);
            let _ = writeln!(prompt, "{}: <선택 이유>", REASON_LABEL);
            let _ = writeln!(prompt, "{}: <0.0~1.0>", CONFIDENCE_LABEL);
        }
        OutputMode::Structured => {
            let _ = writeln!(
                prompt,
                "\n=== 응답 형식 ===\nJSON 객체 {{\"selected_agent\", \"reason\", \"confidence\"}} 로만 응답하세요."
            );
        }
    }

    let _ = writeln!(prompt, "\n⚠️ 중요: 에이전트명은 다음 중 정확히 하나여야 합니다:");
    for agent in A::ALL {
        let _ = writeln!(prompt, "- {}", agent.id());
    }

    prompt
}

/// JSON schema constraining structured output to the closed agent set
pub fn decision_schema<A: AgentDomain>() -> JsonSchemaFormat {
    let ids: Vec<&str> = A::ALL.iter().map(|agent| agent.id()).collect();

    JsonSchemaFormat {
        name: "routing_decision".to_string(),
        description: Some(format!("Supervisor routing decision for the {} domain", A::NAME)),
        schema: json!({
            "type": "object",
            "properties": {
                "selected_agent": { "type": "string", "enum": ids },
                "reason": { "type": "string" },
                "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
            },
            "required": ["selected_agent", "reason", "confidence"],
            "additionalProperties": false
        }),
        strict: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::SportsAgent::{self, *};

    fn skewed() -> Distribution<SportsAgent> {
        Distribution::from_pairs([(Soccer, 0.4), (Basketball, 0.0), (Baseball, 0.35), (Tennis, 0.25)])
    }

    #[test]
    fn test_prompt_contains_query_agents_and_percentages() {
        let prompt = build_prompt("테니스 레슨 받고 싶어", &skewed(), 137, OutputMode::Text);

        assert!(prompt.contains("\"테니스 레슨 받고 싶어\""));
        assert!(prompt.contains("총 137회"));
        assert!(prompt.contains("축구_에이전트: 40.0%"));
        assert!(prompt.contains("농구_에이전트: 0.0%"));
        for agent in SportsAgent::ALL {
            assert!(prompt.contains(agent.description()));
        }
    }

    #[test]
    fn test_text_mode_states_label_contract() {
        let prompt = build_prompt("축구", &skewed(), 10, OutputMode::Text);
        assert!(prompt.contains("선택된 에이전트: <에이전트명>"));
        assert!(!prompt.contains("selected_agent"));
    }

    #[test]
    fn test_structured_mode_states_schema_contract() {
        let prompt = build_prompt("축구", &skewed(), 10, OutputMode::Structured);
        assert!(prompt.contains("selected_agent"));
        assert!(!prompt.contains("선택된 에이전트: <에이전트명>"));
    }

    #[test]
    fn test_uniform_note_only_when_uniform() {
        let uniform = build_prompt("심심해", &Distribution::<SportsAgent>::uniform(), 80, OutputMode::Text);
        assert!(uniform.contains("거의 균등"));
        let prompt = build_prompt("심심해", &skewed(), 80, OutputMode::Text);
        assert!(!prompt.contains("거의 균등"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt("야구", &skewed(), 99, OutputMode::Structured);
        let b = build_prompt("야구", &skewed(), 99, OutputMode::Structured);
        assert_eq!(a, b);
    }

    #[test]
    fn test_schema_enumerates_agents() {
        let schema = decision_schema::<SportsAgent>();
        let ids = schema.schema["properties"]["selected_agent"]["enum"].as_array().unwrap().clone();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[3], "테니스_에이전트");
        assert!(schema.strict);
    }
}
