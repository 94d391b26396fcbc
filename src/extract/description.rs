//! Prose section extraction
//!
//! Collects the explanation sections a circuit reply conventionally carries
//! (design rationale, calculations, part selection, cautions) into a single
//! description string.

use super::Detected;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}[^\n]*").unwrap());

static KNOWN_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"设计原理|工作原理|计算方法|计算过程|元件选型|注意事项").unwrap()
});

pub fn extract_description(text: &str) -> Detected<String> {
    let headings: Vec<(usize, usize, &str)> = HEADING
        .find_iter(text)
        .map(|m| (m.start(), m.end(), m.as_str()))
        .collect();

    let mut sections = Vec::new();
    for (i, (_, end, heading)) in headings.iter().enumerate() {
        let Some(title) = KNOWN_TITLE.find(heading) else {
            continue;
        };
        // Body runs to the next heading, whatever its level
        let body_end = headings
            .get(i + 1)
            .map(|(next_start, _, _)| *next_start)
            .unwrap_or(text.len());
        let body = text[*end..body_end].trim();
        if !body.is_empty() {
            sections.push(format!("{}\n{}", title.as_str(), body));
        }
    }

    if sections.is_empty() {
        Detected::NotFound
    } else {
        Detected::found(sections.join("\n\n"), "section-headings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_known_sections_in_order() {
        let text = "## 设计原理\n\n限流电阻按15mA选取。\n\n## 注意事项\n\n注意LED极性。\n";
        let description = extract_description(text).into_option().unwrap();
        let principle = description.find("设计原理").unwrap();
        let caution = description.find("注意事项").unwrap();
        assert!(principle < caution);
        assert!(description.contains("限流电阻按15mA选取。"));
        assert!(description.contains("注意LED极性。"));
    }

    #[test]
    fn numbered_headings_are_recognized() {
        let text = "### 2. 计算方法\n\nR = (5V - 2V) / 15mA ≈ 200Ω\n";
        let description = extract_description(text).into_option().unwrap();
        assert!(description.starts_with("计算方法"));
    }

    #[test]
    fn section_body_stops_at_next_heading() {
        let text = "## 设计原理\n\n分压偏置。\n\n## 参考资料\n\n不相关。\n";
        let description = extract_description(text).into_option().unwrap();
        assert!(description.contains("分压偏置"));
        assert!(!description.contains("不相关"));
    }

    #[test]
    fn empty_sections_do_not_count() {
        assert_eq!(extract_description("## 设计原理\n"), Detected::NotFound);
        assert_eq!(extract_description("没有标题的普通文字。"), Detected::NotFound);
    }
}
