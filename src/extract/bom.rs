//! Bill-of-materials extraction cascade
//!
//! Four strategies, first hit wins:
//!   1. a markdown table under a BOM heading
//!   2. synthesis from the already-extracted component list, with static
//!      price/package/manufacturer defaults per component category
//!   3. part-number patterns on lines carrying selection context words
//!   4. the same patterns over the whole reply

use super::{BomItem, ComponentInfo, ComponentType, Detected};
use once_cell::sync::Lazy;
use regex::Regex;

static BOM_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}[^\n]*(?:物料清单|BOM|Bill of Materials)").unwrap());

/// Lines that read like component selection, including alternative
/// suggestions ("NE555也可以")
static CONTEXT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"使用|选用|采用|推荐|需要|建议|也可以|可选|替代").unwrap());

// ASCII word boundaries: the default Unicode \b treats CJK characters as
// word characters, so "LM358作为" would never match with plain \b.
static IC_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)(LM\d{3}[A-Z]?|NE555|TL0\d{2}[A-Z]?)(?-u:\b)").unwrap());

static MCU_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u:\b)(STM32[A-Z0-9]+|ATmega\d+[A-Za-z]*|ESP32(?:-[A-Z0-9]+)*)(?-u:\b)")
        .unwrap()
});

static DISCRETE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)(1N\d{4}|2N\d{4}|S8050|S8550)(?-u:\b)").unwrap());

static RESISTOR_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?[kKmM]?Ω)").unwrap());

static CAPACITOR_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?[pnuµ]F)(?-u:\b)").unwrap());

/// Static catalog defaults: (unit price CNY, package, manufacturer)
fn defaults_for(component_type: ComponentType) -> (f64, &'static str, &'static str) {
    match component_type {
        ComponentType::Resistor => (0.05, "0805", "风华高科"),
        ComponentType::Capacitor => (0.08, "0805", "三星"),
        ComponentType::Inductor => (0.30, "0805", "TDK"),
        ComponentType::Ic => (2.50, "DIP-8", "TI"),
        ComponentType::Diode => (0.10, "DO-41", "安森美"),
        ComponentType::Led => (0.15, "3mm", "国星光电"),
        ComponentType::Transistor => (0.25, "TO-92", "长电科技"),
        ComponentType::Other => (0.50, "-", "通用"),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Column {
    Component,
    Quantity,
    Price,
    Package,
    Manufacturer,
    PartNumber,
    Supplier,
    Value,
    Ignored,
}

fn classify_header(cell: &str) -> Column {
    let lower = cell.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| lower.contains(k));
    if has(&["元件", "名称", "component"]) {
        Column::Component
    } else if has(&["数量", "qty", "quantity"]) {
        Column::Quantity
    } else if has(&["价格", "单价", "price"]) {
        Column::Price
    } else if has(&["封装", "package"]) {
        Column::Package
    } else if has(&["厂商", "品牌", "manufacturer"]) {
        Column::Manufacturer
    } else if has(&["料号", "型号", "part"]) {
        Column::PartNumber
    } else if has(&["供应商", "supplier"]) {
        Column::Supplier
    } else if has(&["值", "value"]) {
        Column::Value
    } else {
        Column::Ignored
    }
}

fn parse_price(cell: &str) -> Option<f64> {
    cell.trim_start_matches(['¥', '￥', '$'])
        .trim()
        .parse()
        .ok()
}

fn parse_quantity(cell: &str) -> u32 {
    let digits: String = cell.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(1)
}

fn is_separator_row(line: &str) -> bool {
    line.chars().all(|c| "|-: ".contains(c))
}

/// Strategy 1: markdown table under a BOM heading
fn from_table(text: &str) -> Vec<BomItem> {
    let Some(m) = BOM_HEADING.find(text) else {
        return Vec::new();
    };
    let mut columns: Option<Vec<Column>> = None;
    let mut items = Vec::new();
    for line in text[m.end()..].lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            if columns.is_some() || trimmed.starts_with('#') {
                break;
            }
            continue;
        }
        if is_separator_row(trimmed) {
            continue;
        }
        let cells: Vec<&str> = trimmed
            .trim_matches('|')
            .split('|')
            .map(str::trim)
            .collect();
        match &columns {
            None => columns = Some(cells.iter().map(|c| classify_header(c)).collect()),
            Some(columns) => {
                let mut item = BomItem {
                    component: String::new(),
                    quantity: 1,
                    value: None,
                    package: None,
                    manufacturer: None,
                    part_number: None,
                    supplier: None,
                    price: None,
                };
                for (cell, column) in cells.iter().zip(columns) {
                    if cell.is_empty() {
                        continue;
                    }
                    match column {
                        Column::Component => item.component = cell.to_string(),
                        Column::Quantity => item.quantity = parse_quantity(cell),
                        Column::Price => item.price = parse_price(cell),
                        Column::Package => item.package = Some(cell.to_string()),
                        Column::Manufacturer => item.manufacturer = Some(cell.to_string()),
                        Column::PartNumber => item.part_number = Some(cell.to_string()),
                        Column::Supplier => item.supplier = Some(cell.to_string()),
                        Column::Value => item.value = Some(cell.to_string()),
                        Column::Ignored => {}
                    }
                }
                if !item.component.is_empty() {
                    items.push(item);
                }
            }
        }
    }
    items
}

/// Strategy 2: synthesize rows from extracted components, grouped by
/// (category, value), with catalog defaults filling the commercial fields
fn from_components(components: &[ComponentInfo]) -> Vec<BomItem> {
    let mut items: Vec<BomItem> = Vec::new();
    for component in components {
        if let Some(existing) = items.iter_mut().find(|i| {
            i.component == component.name && i.value == component.value
        }) {
            existing.quantity += 1;
            continue;
        }
        let (price, package, manufacturer) = defaults_for(component.component_type);
        items.push(BomItem {
            component: component.name.clone(),
            quantity: 1,
            value: component.value.clone(),
            package: Some(package.to_string()),
            manufacturer: Some(manufacturer.to_string()),
            part_number: None,
            supplier: None,
            price: Some(price),
        });
    }
    items
}

fn scan_patterns(text: &str, items: &mut Vec<BomItem>) {
    let mut push = |component_type: ComponentType, part_number: Option<&str>, value: Option<&str>| {
        let duplicate = items.iter().any(|i| {
            i.part_number.as_deref() == part_number && i.value.as_deref() == value
        });
        if duplicate {
            return;
        }
        let (price, package, manufacturer) = defaults_for(component_type);
        items.push(BomItem {
            component: component_type.generic_name().to_string(),
            quantity: 1,
            value: value.map(str::to_string),
            package: Some(package.to_string()),
            manufacturer: Some(manufacturer.to_string()),
            part_number: part_number.map(str::to_string),
            supplier: None,
            price: Some(price),
        });
    };

    for cap in IC_PART.captures_iter(text) {
        push(ComponentType::Ic, Some(&cap[1]), None);
    }
    for cap in MCU_PART.captures_iter(text) {
        push(ComponentType::Ic, Some(&cap[1]), None);
    }
    for cap in DISCRETE_PART.captures_iter(text) {
        let part = &cap[1];
        let component_type = if part.starts_with("1N") {
            ComponentType::Diode
        } else {
            ComponentType::Transistor
        };
        push(component_type, Some(part), None);
    }
    for cap in RESISTOR_VALUE.captures_iter(text) {
        push(ComponentType::Resistor, None, Some(&cap[1]));
    }
    for cap in CAPACITOR_VALUE.captures_iter(text) {
        push(ComponentType::Capacitor, None, Some(&cap[1]));
    }
}

/// Strategy 3: part patterns on lines that read like component selection
fn from_context_lines(text: &str) -> Vec<BomItem> {
    let mut items = Vec::new();
    for line in text.lines().filter(|l| CONTEXT_LINE.is_match(l)) {
        scan_patterns(line, &mut items);
    }
    items
}

/// Strategy 4: part patterns over the whole reply
fn from_raw_sweep(text: &str) -> Vec<BomItem> {
    let mut items = Vec::new();
    scan_patterns(text, &mut items);
    items
}

pub fn extract_bom(text: &str, components: &[ComponentInfo]) -> Detected<Vec<BomItem>> {
    let table = from_table(text);
    if !table.is_empty() {
        return Detected::found(table, "bom-table");
    }
    if !components.is_empty() {
        return Detected::found(from_components(components), "component-defaults");
    }
    let contextual = from_context_lines(text);
    if !contextual.is_empty() {
        return Detected::found(contextual, "part-scan");
    }
    let swept = from_raw_sweep(text);
    if !swept.is_empty() {
        return Detected::found(swept, "raw-sweep");
    }
    Detected::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE_REPLY: &str = "## 物料清单\n\n\
        | 元件 | 数量 | 值 | 封装 | 厂商 | 价格 |\n\
        |------|------|-----|------|------|------|\n\
        | 限流电阻 | 1 | 220Ω | 0805 | 风华高科 | ¥0.05 |\n\
        | LED | 2 | 红色 | 3mm | 国星光电 | ¥0.15 |\n";

    #[test]
    fn table_strategy_parses_headers_and_rows() {
        let detected = extract_bom(TABLE_REPLY, &[]);
        assert_eq!(detected.method(), Some("bom-table"));
        let items = detected.into_option().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].component, "限流电阻");
        assert_eq!(items[0].value.as_deref(), Some("220Ω"));
        assert_eq!(items[0].price, Some(0.05));
        assert_eq!(items[1].quantity, 2);
        assert_eq!(items[1].package.as_deref(), Some("3mm"));
    }

    #[test]
    fn table_wins_over_component_synthesis() {
        let components = vec![ComponentInfo {
            id: "r9".into(),
            name: "电阻".into(),
            component_type: ComponentType::Resistor,
            reference: "R9".into(),
            value: Some("1kΩ".into()),
        }];
        let detected = extract_bom(TABLE_REPLY, &components);
        assert_eq!(detected.method(), Some("bom-table"));
    }

    #[test]
    fn component_synthesis_groups_and_fills_defaults() {
        let component = |reference: &str, value: &str| ComponentInfo {
            id: reference.to_lowercase(),
            name: "电阻".into(),
            component_type: ComponentType::Resistor,
            reference: reference.into(),
            value: Some(value.into()),
        };
        let components = vec![
            component("R1", "220Ω"),
            component("R2", "220Ω"),
            component("R3", "10kΩ"),
        ];
        let items = extract_bom("无表格。", &components).into_option().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].price, Some(0.05));
        assert_eq!(items[0].manufacturer.as_deref(), Some("风华高科"));
        assert_eq!(items[1].value.as_deref(), Some("10kΩ"));
    }

    #[test]
    fn context_line_scan_finds_named_parts() {
        let text = "推荐使用LM358作为运放，配合10kΩ反馈电阻。\n另外NE555也可以。";
        let detected = extract_bom(text, &[]);
        assert_eq!(detected.method(), Some("part-scan"));
        let items = detected.into_option().unwrap();
        assert!(items.iter().any(|i| i.part_number.as_deref() == Some("LM358")));
        // Alternative-suggestion phrasing counts as selection context
        assert!(items.iter().any(|i| i.part_number.as_deref() == Some("NE555")));
        assert!(items.iter().any(|i| i.value.as_deref() == Some("10kΩ")));
    }

    #[test]
    fn parts_outside_selection_context_need_the_raw_sweep() {
        // No selection wording on the line naming the part
        let text = "这个电路以前用过NE555。";
        let detected = extract_bom(text, &[]);
        assert_eq!(detected.method(), Some("raw-sweep"));
        let items = detected.into_option().unwrap();
        assert!(items.iter().any(|i| i.part_number.as_deref() == Some("NE555")));
    }

    #[test]
    fn raw_sweep_is_the_last_resort() {
        let text = "电路里有一个100nF电容。";
        let detected = extract_bom(text, &[]);
        assert_eq!(detected.method(), Some("raw-sweep"));
        let items = detected.into_option().unwrap();
        assert_eq!(items[0].value.as_deref(), Some("100nF"));
        assert_eq!(items[0].component, "电容");
    }

    #[test]
    fn no_signal_yields_not_found() {
        assert_eq!(extract_bom("谢谢你的帮助！", &[]), Detected::NotFound);
    }

    #[test]
    fn duplicate_parts_counted_once_per_scan() {
        let text = "使用LM358，再次强调选用LM358。";
        let items = extract_bom(text, &[]).into_option().unwrap();
        let lm358 = items
            .iter()
            .filter(|i| i.part_number.as_deref() == Some("LM358"))
            .count();
        assert_eq!(lm358, 1);
    }
}
