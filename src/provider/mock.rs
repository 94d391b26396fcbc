//! Deterministic mock provider
//!
//! Returns canned, keyword-templated circuit answers without any network
//! call, so the chat path and the extraction cascade are exercisable
//! offline and in tests.

use super::{
    ChatMessage, ChatOptions, KeyValidation, MessageRole, ProviderError, ProviderId,
    ProviderService,
};
use async_trait::async_trait;

const LED_TEMPLATE: &str = r#"好的，这是一个基础的LED指示灯电路设计。

## 电路图

```
  VCC (+5V)
   |
  [R1(220Ω)]----[LED1]----[GND]
```

## 元件清单

| 编号 | 名称 | 型号/值 |
|------|------|---------|
| R1 | 限流电阻 | 220Ω |
| LED1 | 发光二极管 | 红色 3mm |

## 物料清单

| 元件 | 数量 | 值 | 封装 | 厂商 | 价格 |
|------|------|-----|------|------|------|
| 电阻 | 1 | 220Ω | 0805 | 风华高科 | ¥0.05 |
| LED | 1 | 红色 3mm | 3mm | 国星光电 | ¥0.15 |

## 设计原理

LED正向压降约2V，工作电流取15mA。限流电阻 R1 = (5V - 2V) / 15mA ≈ 200Ω，
取标称值220Ω。

## 注意事项

LED有极性，长脚为正极，接反不会点亮。"#;

const POWER_TEMPLATE: &str = r#"好的，这是一个基于LM7805的5V线性稳压电源设计。

## 电路图

```
  VIN (+9V)
   |
  [C1(100nF)]----[U1(LM7805)]----[C2(100nF)]
                      |
                     GND
```

## 元件清单

| 编号 | 名称 | 型号/值 |
|------|------|---------|
| U1 | 三端稳压器 | LM7805 |
| C1 | 输入滤波电容 | 100nF |
| C2 | 输出滤波电容 | 100nF |

## 设计原理

LM7805将9V输入稳压到5V输出，最大输出电流1A。输入输出均需滤波电容以抑制
振荡和纹波。

## 注意事项

输出电流超过500mA时需要加装散热片。"#;

const GENERAL_TEMPLATE: &str = "我是电路设计助手。请描述你需要的电路，例如：\
设计一个LED指示灯电路、设计一个5V稳压电源、设计一个音频放大器。";

/// Deterministic mock service
pub struct MockService {
    model: String,
}

impl MockService {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    fn respond_to(text: &str) -> &'static str {
        let lower = text.to_lowercase();
        if lower.contains("led") || lower.contains("指示灯") || lower.contains("发光") {
            LED_TEMPLATE
        } else if lower.contains("电源") || lower.contains("稳压") || lower.contains("power") {
            POWER_TEMPLATE
        } else {
            GENERAL_TEMPLATE
        }
    }
}

#[async_trait]
impl ProviderService for MockService {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let latest_user = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        Ok(Self::respond_to(latest_user).to_string())
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::Mock
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn validate_key(&self) -> KeyValidation {
        KeyValidation::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn led_request_returns_led_answer() {
        let svc = MockService::new("mock-circuit-designer");
        let messages = [ChatMessage::user("设计一个LED电路")];
        let reply = svc.chat(&messages, &ChatOptions::default()).await.unwrap();
        assert!(reply.contains("LED"));
        assert!(reply.contains("```"));
        assert!(reply.contains("元件清单"));
        assert!(reply.contains("物料清单"));
    }

    #[tokio::test]
    async fn replies_are_deterministic() {
        let svc = MockService::new("mock-circuit-designer");
        let messages = [ChatMessage::user("设计一个稳压电源")];
        let a = svc.chat(&messages, &ChatOptions::default()).await.unwrap();
        let b = svc.chat(&messages, &ChatOptions::default()).await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("LM7805"));
    }

    #[tokio::test]
    async fn keys_always_validate() {
        let svc = MockService::new("mock-circuit-designer");
        assert_eq!(svc.validate_key().await, KeyValidation::Valid);
    }

    #[tokio::test]
    async fn responds_to_latest_user_message() {
        let svc = MockService::new("mock-circuit-designer");
        let messages = [
            ChatMessage::user("设计一个LED电路"),
            ChatMessage::assistant("好的"),
            ChatMessage::user("换成稳压电源"),
        ];
        let reply = svc.chat(&messages, &ChatOptions::default()).await.unwrap();
        assert!(reply.contains("LM7805"));
    }
}
