//! Heuristic extraction of structured circuit/BOM data from LLM reply text
//!
//! Best-effort text mining over unstructured assistant replies: an ordered
//! cascade of regex strategies per field, never a hard error. Every field
//! carries an explicit presence signal (`Detected`) naming the strategy
//! that produced it, so "nothing was present" and "strategy X matched" are
//! distinguishable downstream.

mod bom;
mod circuit;
mod description;

use serde::Serialize;

/// Presence signal for one extracted field
#[derive(Debug, Clone, PartialEq)]
pub enum Detected<T> {
    Found {
        value: T,
        /// Which cascade strategy produced the value
        method: &'static str,
    },
    NotFound,
}

impl<T> Detected<T> {
    pub fn found(value: T, method: &'static str) -> Self {
        Detected::Found { value, method }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Detected::Found { .. })
    }

    pub fn method(&self) -> Option<&'static str> {
        match self {
            Detected::Found { method, .. } => Some(method),
            Detected::NotFound => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Detected::Found { value, .. } => Some(value),
            Detected::NotFound => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Detected::Found { value, .. } => Some(value),
            Detected::NotFound => None,
        }
    }
}

/// Broad component category inferred from a reference designator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Resistor,
    Capacitor,
    Inductor,
    Ic,
    Diode,
    Led,
    Transistor,
    Other,
}

impl ComponentType {
    /// Infer from the letter prefix of a reference designator
    pub fn from_reference_prefix(prefix: &str) -> Self {
        let upper = prefix.to_ascii_uppercase();
        if upper == "LED" {
            return ComponentType::Led;
        }
        match upper.chars().next() {
            Some('R') => ComponentType::Resistor,
            Some('C') => ComponentType::Capacitor,
            Some('L') => ComponentType::Inductor,
            Some('U') => ComponentType::Ic,
            Some('D') => ComponentType::Diode,
            Some('Q') => ComponentType::Transistor,
            _ => ComponentType::Other,
        }
    }

    /// Generic display name used when no better name is available
    pub fn generic_name(self) -> &'static str {
        match self {
            ComponentType::Resistor => "电阻",
            ComponentType::Capacitor => "电容",
            ComponentType::Inductor => "电感",
            ComponentType::Ic => "集成电路",
            ComponentType::Diode => "二极管",
            ComponentType::Led => "LED",
            ComponentType::Transistor => "三极管",
            ComponentType::Other => "元件",
        }
    }
}

/// A parsed component. Best-effort: references may dangle or duplicate
/// relative to the BOM; this is not a validated netlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub id: String,
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitProperty {
    pub name: String,
    pub value: String,
}

/// Structured circuit parse product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascii: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub components: Vec<ComponentInfo>,
    pub connections: Vec<Connection>,
    pub properties: Vec<CircuitProperty>,
}

/// One bill-of-materials row. Extracted independently from the component
/// list; the two may disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomItem {
    pub component: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Everything the extractor pulled out of one assistant reply
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub circuit: Detected<CircuitData>,
    pub bom: Detected<Vec<BomItem>>,
    pub description: Detected<String>,
}

/// Run the full cascade over one assistant reply. Deterministic; each turn's
/// result replaces, never merges with, prior turns.
pub fn extract(text: &str) -> Extraction {
    let mut circuit = circuit::extract_circuit(text);

    let components: Vec<ComponentInfo> = circuit
        .value()
        .map(|c| c.components.clone())
        .unwrap_or_default();
    let bom = bom::extract_bom(text, &components);
    let description = description::extract_description(text);

    // The upstream concatenated the prose sections into the circuit payload
    if let (Detected::Found { value: c, .. }, Some(d)) = (&mut circuit, description.value()) {
        c.description = Some(d.clone());
    }

    Extraction {
        circuit,
        bom,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LED_REPLY: &str = r#"好的，这是一个LED电路。

```
  VCC (+5V)
   |
  [R1(220Ω)]----[LED1]----[GND]
```

## 设计原理

限流电阻按15mA工作电流选取。
"#;

    #[test]
    fn round_trip_led_circuit() {
        let extraction = extract(LED_REPLY);

        let circuit = extraction.circuit.value().expect("circuit present");
        let r1 = circuit
            .components
            .iter()
            .find(|c| c.reference == "R1")
            .expect("R1 extracted");
        assert_eq!(r1.component_type, ComponentType::Resistor);
        assert_eq!(r1.value.as_deref(), Some("220Ω"));

        let led1 = circuit
            .components
            .iter()
            .find(|c| c.reference == "LED1")
            .expect("LED1 extracted");
        assert_eq!(led1.component_type, ComponentType::Led);

        assert!(extraction.description.is_found());
        // BOM synthesized from components when no table is present
        assert_eq!(extraction.bom.method(), Some("component-defaults"));
    }

    #[test]
    fn extraction_is_deterministic() {
        let a = extract(LED_REPLY);
        let b = extract(LED_REPLY);
        assert_eq!(a, b);
    }

    #[test]
    fn plain_prose_yields_not_found_everywhere() {
        let extraction = extract("今天天气不错，适合散步。");
        assert!(!extraction.circuit.is_found());
        assert!(!extraction.bom.is_found());
        assert!(!extraction.description.is_found());
    }

    #[test]
    fn circuit_description_filled_from_prose_sections() {
        let extraction = extract(LED_REPLY);
        let circuit = extraction.circuit.value().unwrap();
        let description = circuit.description.as_deref().unwrap();
        assert!(description.contains("限流电阻"));
    }

    #[test]
    fn reference_prefix_type_inference() {
        assert_eq!(ComponentType::from_reference_prefix("R"), ComponentType::Resistor);
        assert_eq!(ComponentType::from_reference_prefix("LED"), ComponentType::Led);
        assert_eq!(ComponentType::from_reference_prefix("led"), ComponentType::Led);
        assert_eq!(ComponentType::from_reference_prefix("Q"), ComponentType::Transistor);
        assert_eq!(ComponentType::from_reference_prefix("X"), ComponentType::Other);
    }
}
