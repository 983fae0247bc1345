use rust_decimal::Decimal;
use serde_json::Value;

use crate::util::text;

/// 印度國家證券交易所
pub mod nse;

/// 單一報價欄位的擷取規格
pub struct FieldSpec {
    /// 表格上的欄位標題
    pub column: &'static str,
    /// 候選鍵路徑,依序嘗試,全數缺漏時該欄位視為無值
    pub paths: &'static [&'static [&'static str]],
}

/// 報價端點描述:查詢區段、欄位群的候選根路徑與欄位規格。
/// 同一個輪詢迴圈靠這組描述切換不同的端點與欄位組合,
/// 不因資料來源的差異複製迴圈本身。
pub struct Profile {
    pub name: &'static str,
    /// quote-equity 的 section 查詢參數,None 表示不帶
    pub section: Option<&'static str>,
    /// 欄位群的候選根路徑,先主要位置再備援位置,容忍上游結構漂移
    pub roots: &'static [&'static [&'static str]],
    pub fields: &'static [FieldSpec],
}

impl Profile {
    /// 表格的標題列
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.fields.len() + 2);
        header.push("Timestamp".to_string());
        header.push("Symbol".to_string());

        for field in self.fields {
            header.push(field.column.to_string());
        }

        header
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// 依鍵路徑逐層往下取 JSON 節點
pub(crate) fn dig<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;

    for key in path {
        current = current.get(key)?;
    }

    Some(current)
}

/// 依候選根路徑找出欄位群所在的節點
pub(crate) fn locate_group<'a>(
    payload: &'a Value,
    roots: &[&'static [&'static str]],
) -> Option<&'a Value> {
    roots
        .iter()
        .find_map(|root| dig(payload, root).filter(|v| v.is_object()))
}

/// 從欄位群取出單一欄位的數值,缺鍵或無法解析時回傳 None
pub(crate) fn extract_field(group: &Value, spec: &FieldSpec) -> Option<Decimal> {
    let value = spec.paths.iter().find_map(|path| {
        dig(group, path).filter(|v| !v.is_null())
    })?;

    match value {
        Value::Number(n) => text::parse_decimal(&n.to_string(), None).ok(),
        Value::String(s) => text::parse_decimal(s, None).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_dig() {
        let payload = json!({"a": {"b": {"c": 1.5}}});

        assert_eq!(dig(&payload, &["a", "b", "c"]), Some(&json!(1.5)));
        assert_eq!(dig(&payload, &["a", "x"]), None);
    }

    #[test]
    fn test_locate_group_falls_back_to_secondary_root() {
        let payload = json!({"priceInfo": {"lastPrice": 101.5}});
        let roots: &[&[&str]] = &[&["marketDeptOrderBook", "tradeInfo"], &["priceInfo"]];

        let group = locate_group(&payload, roots).unwrap();

        assert_eq!(group.get("lastPrice"), Some(&json!(101.5)));
    }

    #[test]
    fn test_locate_group_ignores_non_object_candidates() {
        let payload = json!({"marketDeptOrderBook": {"tradeInfo": "closed"}});
        let roots: &[&[&str]] = &[&["marketDeptOrderBook", "tradeInfo"], &["priceInfo"]];

        assert!(locate_group(&payload, roots).is_none());
    }

    #[test]
    fn test_extract_field_tries_paths_in_order() {
        let spec = FieldSpec {
            column: "VWAP",
            paths: &[&["vwap"], &["averagePrice"]],
        };

        let both = json!({"vwap": 101.5, "averagePrice": 99.0});
        let fallback_only = json!({"averagePrice": "1,234.56"});
        let neither = json!({"lastPrice": 10});

        assert_eq!(extract_field(&both, &spec), Some(dec!(101.5)));
        assert_eq!(extract_field(&fallback_only, &spec), Some(dec!(1234.56)));
        assert_eq!(extract_field(&neither, &spec), None);
    }

    #[test]
    fn test_extract_field_treats_null_as_missing() {
        let spec = FieldSpec {
            column: "VWAP",
            paths: &[&["vwap"], &["averagePrice"]],
        };
        let group = json!({"vwap": null, "averagePrice": 99.0});

        assert_eq!(extract_field(&group, &spec), Some(dec!(99.0)));
    }
}
