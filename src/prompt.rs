//! System prompt construction
//!
//! One base prompt establishing the circuit-designer role and the reply
//! format the extractor expects, plus conditional fragments keyed off the
//! latest user message and the accumulated conversation context.

use crate::conversation::{ConversationContext, Phase, UserExpertise};

/// Base prompt. The format rules here are load-bearing: the extractor
/// parses fenced ASCII diagrams, the 元件清单 table and the 物料清单 table
/// out of replies shaped this way.
const BASE_PROMPT: &str = r"你是一位资深的电子电路设计工程师，帮助用户完成电路设计。请始终使用中文回答。

回答电路设计问题时，请按以下格式组织内容：

1. 用代码块（```）给出ASCII电路图。元件用方括号标注，格式为 [编号(参数)]，例如 [R1(220Ω)]、[LED1]，连线用 ---- 表示，电源和地用 VCC、GND 标注。

2. 给出元件清单表格：

## 元件清单

| 编号 | 名称 | 型号/值 |
|------|------|---------|

3. 给出物料清单表格：

## 物料清单

| 元件 | 数量 | 值 | 封装 | 厂商 | 价格 |
|------|------|-----|------|------|------|

4. 用「## 设计原理」「## 计算方法」「## 元件选型」「## 注意事项」等小节解释设计。

如果用户的问题与电路无关，正常回答即可，不必套用上述格式。";

/// Added when the user is asking for a power-supply design specifically
const POWER_DESIGN_FRAGMENT: &str = r"

本次请求涉及电源设计，请额外说明：输入/输出电压范围、最大输出电流、纹波要求、效率估算，以及必要的保护电路（过流、过压、反接）。";

const BEGINNER_FRAGMENT: &str = r"

用户是电子初学者。请解释每个元件的作用，避免行话，给出的计算要逐步展开。";

const EXPERT_FRAGMENT: &str = r"

用户是有经验的工程师。可以直接给出关键参数、容差和选型依据，不需要解释基础概念。";

const VALIDATION_FRAGMENT: &str = r"

用户正在验证已有设计。请逐项检查元件取值、额定参数裕量和连接正确性，明确指出问题和改进建议。";

const OPTIMIZATION_FRAGMENT: &str = r"

用户希望优化已有设计。请围绕成本、功耗、体积给出具体的替代方案并量化对比。";

const POWER_KEYWORDS: &[&str] = &["电源", "稳压", "power", "ldo", "dc-dc", "buck", "boost"];
const DESIGN_KEYWORDS: &[&str] = &["设计", "design", "电路图", "schematic", "画出"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Build the system prompt for one chat turn.
///
/// The power fragment requires both a power keyword and a design keyword in
/// the same message: "电源坏了吗" alone is a question, not a design request.
pub fn build_system_prompt(latest_user_message: &str, context: &ConversationContext) -> String {
    let mut prompt = String::from(BASE_PROMPT);
    let lower = latest_user_message.to_lowercase();

    if contains_any(&lower, POWER_KEYWORDS) && contains_any(&lower, DESIGN_KEYWORDS) {
        prompt.push_str(POWER_DESIGN_FRAGMENT);
    }

    match context.user_expertise {
        Some(UserExpertise::Beginner) => prompt.push_str(BEGINNER_FRAGMENT),
        Some(UserExpertise::Expert) => prompt.push_str(EXPERT_FRAGMENT),
        _ => {}
    }

    match context.phase {
        Phase::Validation => prompt.push_str(VALIDATION_FRAGMENT),
        Phase::Optimization => prompt.push_str(OPTIMIZATION_FRAGMENT),
        _ => {}
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationContext;

    #[test]
    fn base_prompt_names_the_expected_reply_format() {
        let prompt = build_system_prompt("你好", &ConversationContext::default());
        assert!(prompt.contains("元件清单"));
        assert!(prompt.contains("物料清单"));
        assert!(prompt.contains("ASCII"));
    }

    #[test]
    fn power_fragment_requires_power_and_design_keywords() {
        let context = ConversationContext::default();

        let prompt = build_system_prompt("设计一个5V稳压电源", &context);
        assert!(prompt.contains("本次请求涉及电源设计"));

        // Power word without a design word: no fragment
        let prompt = build_system_prompt("我的电源坏了吗", &context);
        assert!(!prompt.contains("本次请求涉及电源设计"));

        // Design word without a power word: no fragment
        let prompt = build_system_prompt("设计一个LED电路", &context);
        assert!(!prompt.contains("本次请求涉及电源设计"));
    }

    #[test]
    fn expertise_fragments_follow_context() {
        let mut context = ConversationContext::default();
        context.user_expertise = Some(UserExpertise::Beginner);
        let prompt = build_system_prompt("继续", &context);
        assert!(prompt.contains("初学者"));
        assert!(!prompt.contains("有经验的工程师"));

        context.user_expertise = Some(UserExpertise::Expert);
        let prompt = build_system_prompt("继续", &context);
        assert!(prompt.contains("有经验的工程师"));
    }

    #[test]
    fn phase_fragments_for_validation_and_optimization() {
        let mut context = ConversationContext::default();
        context.phase = Phase::Validation;
        assert!(build_system_prompt("检查一下", &context).contains("正在验证"));

        context.phase = Phase::Optimization;
        assert!(build_system_prompt("再改进下", &context).contains("优化已有设计"));

        context.phase = Phase::Design;
        let prompt = build_system_prompt("继续", &context);
        assert!(!prompt.contains("正在验证"));
        assert!(!prompt.contains("优化已有设计"));
    }
}
