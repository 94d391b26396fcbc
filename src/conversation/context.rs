//! Keyword-based conversation context classifier
//!
//! The upstream scattered inline keyword sniffing through the orchestration
//! code; here it is one pure, test-covered function returning tagged
//! detections. Absent detections leave the prior context value untouched;
//! a firing detection overwrites it (no confidence weighting).

use serde::Serialize;

/// Where in the (user-perceived) design process the exchange falls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Requirement,
    Design,
    Validation,
    Optimization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    CircuitDesign,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitType {
    PowerSupply,
    Amplifier,
    Digital,
    LedDriver,
    Sensor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserExpertise {
    Beginner,
    Intermediate,
    Expert,
}

/// Heuristically-inferred conversation context
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationContext {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_type: Option<ConversationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_type: Option<CircuitType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_expertise: Option<UserExpertise>,
}

/// Tagged detections from a single user message. `None` means "no signal",
/// never "signal absent".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSignals {
    pub conversation_type: Option<ConversationType>,
    pub circuit_type: Option<CircuitType>,
    pub user_expertise: Option<UserExpertise>,
    pub phase: Option<Phase>,
}

const CIRCUIT_KEYWORDS: &[&str] = &[
    "电路", "原理图", "schematic", "circuit", "pcb", "电源", "led", "电阻", "电容", "运放",
    "单片机", "稳压", "放大器", "bom", "元件",
];

const POWER_KEYWORDS: &[&str] = &["电源", "稳压", "power", "ldo", "dc-dc", "buck", "boost"];
const AMPLIFIER_KEYWORDS: &[&str] = &["放大器", "运放", "amplifier", "op-amp", "opamp", "音频"];
const DIGITAL_KEYWORDS: &[&str] = &["单片机", "数字", "mcu", "stm32", "esp32", "atmega", "逻辑"];
const LED_KEYWORDS: &[&str] = &["led", "指示灯", "发光二极管", "灯"];
const SENSOR_KEYWORDS: &[&str] = &["传感器", "sensor", "温度", "湿度", "采集"];

const BEGINNER_KEYWORDS: &[&str] = &["新手", "入门", "beginner", "什么是", "怎么入门", "简单点"];
const EXPERT_KEYWORDS: &[&str] = &["专业", "详细参数", "expert", "datasheet", "容差", "温漂"];

const REQUIREMENT_KEYWORDS: &[&str] = &["需求", "要求", "需要", "need", "want", "打算"];
const DESIGN_KEYWORDS: &[&str] = &["设计", "design", "电路图", "schematic", "画出"];
const VALIDATION_KEYWORDS: &[&str] = &["验证", "测试", "validate", "test", "检查", "对不对"];
const OPTIMIZATION_KEYWORDS: &[&str] = &["优化", "改进", "optimize", "improve", "降低成本", "功耗"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Classify one user message into context signals
pub fn classify(text: &str) -> ContextSignals {
    let lower = text.to_lowercase();

    let conversation_type = if contains_any(&lower, CIRCUIT_KEYWORDS) {
        Some(ConversationType::CircuitDesign)
    } else {
        None
    };

    // Ordered: the more specific categories win over the LED catch-all
    let circuit_type = if contains_any(&lower, POWER_KEYWORDS) {
        Some(CircuitType::PowerSupply)
    } else if contains_any(&lower, AMPLIFIER_KEYWORDS) {
        Some(CircuitType::Amplifier)
    } else if contains_any(&lower, DIGITAL_KEYWORDS) {
        Some(CircuitType::Digital)
    } else if contains_any(&lower, SENSOR_KEYWORDS) {
        Some(CircuitType::Sensor)
    } else if contains_any(&lower, LED_KEYWORDS) {
        Some(CircuitType::LedDriver)
    } else {
        None
    };

    let user_expertise = if contains_any(&lower, BEGINNER_KEYWORDS) {
        Some(UserExpertise::Beginner)
    } else if contains_any(&lower, EXPERT_KEYWORDS) {
        Some(UserExpertise::Expert)
    } else {
        None
    };

    // Later stages shadow earlier ones when a message mentions both
    let phase = if contains_any(&lower, OPTIMIZATION_KEYWORDS) {
        Some(Phase::Optimization)
    } else if contains_any(&lower, VALIDATION_KEYWORDS) {
        Some(Phase::Validation)
    } else if contains_any(&lower, DESIGN_KEYWORDS) {
        Some(Phase::Design)
    } else if contains_any(&lower, REQUIREMENT_KEYWORDS) {
        Some(Phase::Requirement)
    } else {
        None
    };

    ContextSignals {
        conversation_type,
        circuit_type,
        user_expertise,
        phase,
    }
}

impl ConversationContext {
    /// Fold a message's signals into the context. Firing detections
    /// overwrite; silent ones keep the prior value.
    pub fn apply(&mut self, signals: &ContextSignals) {
        if let Some(ct) = signals.conversation_type {
            self.conversation_type = Some(ct);
        }
        if let Some(ct) = signals.circuit_type {
            self.circuit_type = Some(ct);
        }
        if let Some(ue) = signals.user_expertise {
            self.user_expertise = Some(ue);
        }
        if let Some(p) = signals.phase {
            self.phase = p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_design_request_classifies_fully() {
        let signals = classify("我是新手，想设计一个LED指示灯电路");
        assert_eq!(signals.conversation_type, Some(ConversationType::CircuitDesign));
        assert_eq!(signals.circuit_type, Some(CircuitType::LedDriver));
        assert_eq!(signals.user_expertise, Some(UserExpertise::Beginner));
        assert_eq!(signals.phase, Some(Phase::Design));
    }

    #[test]
    fn power_beats_led_when_both_present() {
        let signals = classify("设计一个带LED指示的5V稳压电源");
        assert_eq!(signals.circuit_type, Some(CircuitType::PowerSupply));
    }

    #[test]
    fn unrelated_text_yields_no_signals() {
        let signals = classify("今天天气怎么样");
        assert_eq!(signals, ContextSignals::default());
    }

    #[test]
    fn later_phase_keywords_shadow_earlier_ones() {
        let signals = classify("帮我验证并优化这个设计");
        assert_eq!(signals.phase, Some(Phase::Optimization));
    }

    #[test]
    fn classification_is_case_insensitive() {
        let signals = classify("Design a power supply with an STM32 controller");
        assert_eq!(signals.circuit_type, Some(CircuitType::PowerSupply));
        assert_eq!(signals.phase, Some(Phase::Design));
    }

    #[test]
    fn apply_overwrites_only_on_detection() {
        let mut context = ConversationContext {
            phase: Phase::Design,
            conversation_type: Some(ConversationType::CircuitDesign),
            circuit_type: Some(CircuitType::PowerSupply),
            user_expertise: Some(UserExpertise::Expert),
        };

        // Silent message changes nothing
        context.apply(&classify("谢谢"));
        assert_eq!(context.phase, Phase::Design);
        assert_eq!(context.circuit_type, Some(CircuitType::PowerSupply));

        // Firing detection overwrites
        context.apply(&classify("帮我优化一下功耗"));
        assert_eq!(context.phase, Phase::Optimization);
        assert_eq!(context.circuit_type, Some(CircuitType::PowerSupply));
    }
}
