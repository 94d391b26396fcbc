//! Circuit diagram and component extraction
//!
//! Finds an ASCII-art diagram (fenced code block first, plain-line scan as
//! fallback), then pulls components from either a markdown component table
//! or the diagram's bracketed reference tokens, and derives connections
//! from dash-joined adjacent tokens on a line.

use super::{
    CircuitData, CircuitProperty, ComponentInfo, ComponentType, Connection, Detected, Endpoint,
};
use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z]*\r?\n(.*?)```").unwrap());

/// `[R1(220Ω)]`, `[LED1]`, `[GND]` — letters, optional digits, optional
/// parenthesized value. Tokens without digits are treated as rails.
static BRACKET_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Za-z]+)(\d*)(?:\(([^)]+)\))?\]").unwrap());

// ASCII word boundaries: Unicode \b treats CJK characters as word
// characters, so tokens butted against Chinese prose would not match.
static REF_DESIGNATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)(?:R|C|L|U|D|Q|LED)\d+(?-u:\b)").unwrap());

static RAIL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)(?:VCC|VDD|VSS|GND)(?-u:\b)").unwrap());

static VOLTAGE_RAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+-]\d+(?:\.\d+)?V(?-u:\b)").unwrap());

static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{4,}").unwrap());

/// Gap between two tokens on one line that counts as a wire
static WIRE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s\-=~|]*$").unwrap());

static COMPONENT_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}[^\n]*(?:元件清单|元件列表|Component List)").unwrap());

static PROPERTY_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}[^\n]*(?:电路参数|技术参数|性能指标)").unwrap());

static PROPERTY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s*\-]*([^:：\n]{1,40}?)\s*[:：]\s*(\S[^\n]*)$").unwrap());

fn looks_like_circuit(block: &str) -> bool {
    BRACKET_TOKEN.is_match(block)
        || REF_DESIGNATOR.is_match(block)
        || RAIL_TOKEN.is_match(block)
        || VOLTAGE_RAIL.is_match(block)
        || DASH_RUN.is_match(block)
}

fn line_is_diagram(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    BRACKET_TOKEN.is_match(trimmed)
        || RAIL_TOKEN.is_match(trimmed)
        || DASH_RUN.is_match(trimmed)
        || trimmed.chars().all(|c| "|+-/\\ ".contains(c))
}

/// Fenced block first, then a scan for a run of diagram-looking lines
fn find_ascii(text: &str) -> Option<(String, &'static str)> {
    for cap in FENCED_BLOCK.captures_iter(text) {
        let block = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        if looks_like_circuit(block) {
            return Some((block.trim_end().to_string(), "fenced-block"));
        }
    }

    // Plain-text fallback: the longest run of adjacent diagram lines
    let mut best: Vec<&str> = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line_is_diagram(line) {
            run.push(line);
        } else {
            if run.len() > best.len() {
                best = std::mem::take(&mut run);
            }
            run.clear();
        }
    }
    if run.len() > best.len() {
        best = run;
    }
    if best.len() >= 2 && best.iter().any(|l| BRACKET_TOKEN.is_match(l)) {
        return Some((best.join("\n"), "line-scan"));
    }
    None
}

fn is_rail(reference: &str) -> bool {
    matches!(
        reference.to_ascii_uppercase().as_str(),
        "GND" | "VCC" | "VDD" | "VSS" | "VIN" | "VOUT"
    )
}

/// Components from the diagram's bracket tokens, first occurrence wins
fn components_from_ascii(block: &str) -> Vec<ComponentInfo> {
    let mut components: Vec<ComponentInfo> = Vec::new();
    for cap in BRACKET_TOKEN.captures_iter(block) {
        let prefix = &cap[1];
        let digits = &cap[2];
        if digits.is_empty() {
            continue; // rail, not a component
        }
        let reference = format!("{prefix}{digits}");
        if components.iter().any(|c| c.reference == reference) {
            continue;
        }
        let component_type = ComponentType::from_reference_prefix(prefix);
        components.push(ComponentInfo {
            id: reference.to_lowercase(),
            name: component_type.generic_name().to_string(),
            component_type,
            reference,
            value: cap.get(3).map(|m| m.as_str().trim().to_string()),
        });
    }
    components
}

/// Markdown table rows under a component-list heading.
/// Expected columns: reference | name | value, extras ignored.
fn components_from_table(text: &str) -> Vec<ComponentInfo> {
    let Some(m) = COMPONENT_HEADING.find(text) else {
        return Vec::new();
    };
    let mut components = Vec::new();
    let mut in_table = false;
    for line in text[m.end()..].lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            if in_table {
                break;
            }
            if trimmed.starts_with('#') {
                break;
            }
            continue;
        }
        in_table = true;
        if is_separator_row(trimmed) {
            continue;
        }
        let cells: Vec<&str> = trimmed
            .trim_matches('|')
            .split('|')
            .map(str::trim)
            .collect();
        if cells.len() < 2 {
            continue;
        }
        let reference = cells[0].to_string();
        // Header rows and free-text rows both fail this shape check
        if !reference
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false)
            || !reference.chars().any(|c| c.is_ascii_digit())
        {
            continue;
        }
        let prefix: String = reference
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        let component_type = ComponentType::from_reference_prefix(&prefix);
        let name = if cells[1].is_empty() {
            component_type.generic_name().to_string()
        } else {
            cells[1].to_string()
        };
        components.push(ComponentInfo {
            id: reference.to_lowercase(),
            name,
            component_type,
            reference,
            value: cells.get(2).filter(|v| !v.is_empty()).map(|v| v.to_string()),
        });
    }
    components
}

fn is_separator_row(line: &str) -> bool {
    line.chars().all(|c| "|-: ".contains(c))
}

/// Adjacent bracket tokens on one line joined by dashes become connections
fn connections_from_ascii(block: &str) -> Vec<Connection> {
    let mut connections = Vec::new();
    for line in block.lines() {
        let tokens: Vec<(String, usize, usize)> = BRACKET_TOKEN
            .captures_iter(line)
            .map(|cap| {
                let whole = cap.get(0).unwrap();
                let reference = if cap[2].is_empty() {
                    cap[1].to_string()
                } else {
                    format!("{}{}", &cap[1], &cap[2])
                };
                (reference, whole.start(), whole.end())
            })
            .collect();
        for pair in tokens.windows(2) {
            let gap = &line[pair[0].2..pair[1].1];
            if gap.contains('-') && WIRE_GAP.is_match(gap) {
                connections.push(Connection {
                    id: format!("conn-{}", connections.len() + 1),
                    from: Endpoint {
                        component: pair[0].0.clone(),
                        pin: None,
                    },
                    to: Endpoint {
                        component: pair[1].0.clone(),
                        pin: None,
                    },
                    label: None,
                    description: None,
                });
            }
        }
    }
    connections
}

/// `name: value` bullet lines under a parameter heading
fn properties_from_text(text: &str) -> Vec<CircuitProperty> {
    let Some(m) = PROPERTY_HEADING.find(text) else {
        return Vec::new();
    };
    let mut properties = Vec::new();
    for line in text[m.end()..].lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            break;
        }
        if let Some(cap) = PROPERTY_LINE.captures(trimmed) {
            properties.push(CircuitProperty {
                name: cap[1].trim().to_string(),
                value: cap[2].trim().to_string(),
            });
        }
    }
    properties
}

pub fn extract_circuit(text: &str) -> Detected<CircuitData> {
    let ascii = find_ascii(text);

    let table_components = components_from_table(text);
    let (components, method) = if !table_components.is_empty() {
        (table_components, "component-table")
    } else if let Some((block, block_method)) = &ascii {
        (components_from_ascii(block), *block_method)
    } else {
        (Vec::new(), "")
    };

    if ascii.is_none() && components.is_empty() {
        return Detected::NotFound;
    }

    let connections = ascii
        .as_ref()
        .map(|(block, _)| connections_from_ascii(block))
        .unwrap_or_default();

    // The signal names the strategy the component list came from; the block
    // strategy is only reported when it was the sole source.
    let method = if components.is_empty() {
        ascii.as_ref().map(|(_, m)| *m).unwrap_or(method)
    } else {
        method
    };

    Detected::found(
        CircuitData {
            ascii: ascii.map(|(block, _)| block),
            description: None,
            components,
            connections,
            properties: properties_from_text(text),
        },
        method,
    )
}

// Components dedupe by reference only; conflicting re-definitions keep the
// first occurrence rather than erroring, matching the best-effort contract.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_wins_over_line_scan() {
        let text = "说明\n\n```\n[R1(1kΩ)]----[C1(100nF)]\n```\n";
        let circuit = extract_circuit(text).into_option().unwrap();
        assert_eq!(circuit.ascii.as_deref(), Some("[R1(1kΩ)]----[C1(100nF)]"));
        assert_eq!(circuit.components.len(), 2);
    }

    #[test]
    fn plain_diagram_lines_found_without_fence() {
        let text = "电路如下：\n  VCC\n   |\n  [R1(10kΩ)]----[U1]\n   |\n  GND\n后续说明。";
        let circuit = extract_circuit(text).into_option().unwrap();
        assert!(circuit.ascii.is_some());
        assert!(circuit.components.iter().any(|c| c.reference == "U1"));
    }

    #[test]
    fn fenced_block_without_circuit_markers_is_skipped() {
        let text = "```\nfn main() {}\n```\n";
        assert_eq!(extract_circuit(text), Detected::NotFound);
    }

    #[test]
    fn rails_are_endpoints_but_not_components() {
        let text = "```\n[R1(220Ω)]----[LED1]----[GND]\n```\n";
        let circuit = extract_circuit(text).into_option().unwrap();
        assert_eq!(circuit.components.len(), 2);
        assert_eq!(circuit.connections.len(), 2);
        assert_eq!(circuit.connections[1].to.component, "GND");
    }

    #[test]
    fn component_table_preferred_over_brackets() {
        let text = "## 元件清单\n\n\
            | 编号 | 名称 | 型号/值 |\n\
            |------|------|---------|\n\
            | R1 | 限流电阻 | 220Ω |\n\
            | LED1 | 发光二极管 | 红色 3mm |\n\n\
            ```\n[R1]----[LED1]\n```\n";
        let detected = extract_circuit(text);
        assert_eq!(detected.method(), Some("component-table"));
        let circuit = detected.into_option().unwrap();
        assert_eq!(circuit.components.len(), 2);
        assert_eq!(circuit.components[0].name, "限流电阻");
        assert_eq!(circuit.components[0].value.as_deref(), Some("220Ω"));
        assert_eq!(circuit.components[1].component_type, ComponentType::Led);
    }

    #[test]
    fn duplicate_references_keep_first_occurrence() {
        let text = "```\n[R1(220Ω)]----[R1(330Ω)]\n```\n";
        let circuit = extract_circuit(text).into_option().unwrap();
        assert_eq!(circuit.components.len(), 1);
        assert_eq!(circuit.components[0].value.as_deref(), Some("220Ω"));
    }

    #[test]
    fn properties_parsed_from_parameter_section() {
        let text = "```\n[R1(1kΩ)]----[GND]\n```\n\n## 电路参数\n\n- 输入电压: 5V\n- 工作电流: 15mA\n";
        let circuit = extract_circuit(text).into_option().unwrap();
        assert_eq!(circuit.properties.len(), 2);
        assert_eq!(circuit.properties[0].name, "输入电压");
        assert_eq!(circuit.properties[0].value, "5V");
    }

    #[test]
    fn unconnected_tokens_yield_no_connection() {
        let text = "```\n[R1(1kΩ)]    [C1(100nF)]\n```\n";
        let circuit = extract_circuit(text).into_option().unwrap();
        assert!(circuit.connections.is_empty());
    }
}
