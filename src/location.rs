use once_cell::sync::Lazy;
use regex::Regex;

static DASH_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d+)-(\d+)\b").expect("valid regex"));
static BUILDING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*동").expect("valid regex"));
static UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*호").expect("valid regex"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Building (동) and unit (호) numbers; each is digits or empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DongHo {
    pub building: String,
    pub unit: String,
}

impl DongHo {
    fn new(building: &str, unit: &str) -> Self {
        Self {
            building: building.to_string(),
            unit: unit.to_string(),
        }
    }

    pub fn as_pair(&self) -> (&str, &str) {
        (&self.building, &self.unit)
    }
}

/// Extract building/unit numbers from a free-text location.
///
/// Strategies in order: a `101-203` pair, then `3동` / `502호` markers, then
/// (only for slots still empty) a text holding exactly two bare numbers.
pub fn extract_dong_ho(text: &str) -> DongHo {
    if let Some(caps) = DASH_PAIR.captures(text) {
        return DongHo::new(&caps[1], &caps[2]);
    }

    let first_group = |re: &Regex| {
        re.captures(text)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default()
    };
    let mut result = DongHo {
        building: first_group(&BUILDING),
        unit: first_group(&UNIT),
    };

    if result.building.is_empty() || result.unit.is_empty() {
        let numbers: Vec<&str> = DIGITS.find_iter(text).map(|m| m.as_str()).collect();
        if let [first, second] = numbers.as_slice() {
            if result.building.is_empty() {
                result.building = first.to_string();
            }
            if result.unit.is_empty() {
                result.unit = second.to_string();
            }
        }
    }

    result
}
