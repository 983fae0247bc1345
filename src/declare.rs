use rust_decimal::Decimal;
use strum_macros::{Display, EnumString};

/// 表格寫入模式
#[derive(Display, EnumString, PartialEq, Debug, Copy, Clone)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SheetMode {
    /// 每一輪的資料附加在既有資料之後,歷史資料持續累積
    Append,
    /// 每一輪的資料固定從資料起始列覆寫,表格永遠只保留最新一輪
    Overwrite,
}

/// 未指定追蹤清單時預設使用的 NIFTY 50 成分股
pub const DEFAULT_SYMBOLS: [&str; 50] = [
    "ADANIENT", "MARUTI", "BAJFINANCE", "EICHERMOT", "MM", "SHRIRAMFIN",
    "JSWSTEEL", "AXISBANK", "BAJAJFINSV", "NTPC", "SBIN", "POWERGRID",
    "INDUSINDBK", "TATAMOTORS", "DRREDDY", "TATASTEEL", "BAJAJ-AUTO", "TATACONSUM",
    "INFY", "KOTAKBANK", "ADANIPORTS", "COALINDIA", "HINDALCO", "ICICIBANK",
    "WIPRO", "LT", "TCS", "HDFCBANK", "HEROMOTOCO", "ONGC",
    "BEL", "SUNPHARMA", "APOLLOHOSP", "RELIANCE", "JIOFIN", "SBILIFE",
    "ITC", "TITAN", "HCLTECH", "CIPLA", "BHARTIARTL", "ETERNAL",
    "HINDUNILVR", "HDFCLIFE", "ASIANPAINT", "GRASIM", "NESTLEIND", "ULTRACEMCO",
    "TECHM", "TRENT",
];

/// 單一股票在某一輪的報價,欄位值與 Profile 的欄位順序對齊,
/// 抓取失敗或欄位缺漏時以 None 表示,不以零值充數
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRecord {
    pub recorded_at: String,
    pub stock_symbol: String,
    pub values: Vec<Option<Decimal>>,
}

impl QuoteRecord {
    pub fn new(recorded_at: String, stock_symbol: String, values: Vec<Option<Decimal>>) -> Self {
        QuoteRecord {
            recorded_at,
            stock_symbol,
            values,
        }
    }

    /// 抓取失敗時仍需佔一列,維持批次與股票清單等長
    pub fn null_filled(recorded_at: String, stock_symbol: String, field_count: usize) -> Self {
        QuoteRecord {
            recorded_at,
            stock_symbol,
            values: vec![None; field_count],
        }
    }

    /// 轉成表格的一列,缺值輸出為空白儲存格
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(self.values.len() + 2);
        row.push(self.recorded_at.clone());
        row.push(self.stock_symbol.clone());

        for value in &self.values {
            row.push(
                value
                    .map(|v| v.normalize().to_string())
                    .unwrap_or_default(),
            );
        }

        row
    }
}
