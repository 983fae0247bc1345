extern crate serde;
extern crate serde_json;

use std::{collections::HashMap, env, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    declare::{SheetMode, DEFAULT_SYMBOLS},
    logging,
};

const CONFIG_PATH: &str = "app.json";

const SHEET_ID: &str = "SHEET_ID";
const SHEETS_TOKEN: &str = "SHEETS_TOKEN";
const SHEET_MODE: &str = "SHEET_MODE";
const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
const SYMBOLS: &str = "SYMBOLS";

pub static SETTINGS: Lazy<App> = Lazy::new(|| App::get().expect("Config error"));

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub nse: Nse,
    #[serde(default)]
    pub collector: Collector,
    #[serde(default)]
    pub sheet: Sheet,
    #[serde(default)]
    pub bot: Bot,
}

/// NSE 報價端點的連線設定,標頭值屬於部署設定而非商業邏輯
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Nse {
    #[serde(default = "default_nse_host")]
    pub host: String,
    /// 報價欄位組合,對應 crawler::nse::quote 內建的 Profile 名稱
    #[serde(default = "default_nse_profile")]
    pub profile: String,
    #[serde(default = "default_nse_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_nse_accept")]
    pub accept: String,
    #[serde(default = "default_nse_referer")]
    pub referer: String,
    #[serde(default = "default_nse_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Collector {
    /// 追蹤的股票清單,輪詢與輸出列的順序都依此排序
    #[serde(default)]
    pub symbols: Vec<String>,
    /// 兩檔股票間的間隔,避免被 NSE 封禁
    #[serde(default = "default_symbol_delay_millis")]
    pub symbol_delay_millis: u64,
    /// 兩輪之間的間隔
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// 只在 NSE 盤中時段(IST 09:15-15:30)執行輪詢
    #[serde(default)]
    pub trading_hours_only: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Sheet {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Google Sheets API 的 OAuth bearer token,取得方式不在本程式範圍內
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_sheet_mode")]
    pub mode: String,
    /// overwrite 模式固定從這一列開始覆寫(第 1 列為標題)
    #[serde(default = "default_data_start_row")]
    pub data_start_row: usize,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Bot {
    #[serde(default)]
    pub telegram: Telegram,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Telegram {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub allowed: HashMap<i64, String>,
}

impl Default for Nse {
    fn default() -> Self {
        Nse {
            host: default_nse_host(),
            profile: default_nse_profile(),
            user_agent: default_nse_user_agent(),
            accept: default_nse_accept(),
            referer: default_nse_referer(),
            request_timeout_secs: default_nse_request_timeout_secs(),
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Collector {
            symbols: Vec::new(),
            symbol_delay_millis: default_symbol_delay_millis(),
            cycle_interval_secs: default_cycle_interval_secs(),
            trading_hours_only: false,
        }
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Sheet {
            spreadsheet_id: String::new(),
            sheet_name: default_sheet_name(),
            token: String::new(),
            mode: default_sheet_mode(),
            data_start_row: default_data_start_row(),
        }
    }
}

impl App {
    fn get() -> Result<Self, config::ConfigError> {
        let config_path = config_path();
        let config = if config_path.exists() {
            config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize::<App>()?
        } else {
            App::default()
        };

        Ok(config.override_with_env().with_default_symbols())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(id) = env::var(SHEET_ID) {
            self.sheet.spreadsheet_id = id;
        }

        if let Ok(token) = env::var(SHEETS_TOKEN) {
            self.sheet.token = token;
        }

        if let Ok(mode) = env::var(SHEET_MODE) {
            self.sheet.mode = mode;
        }

        if let Ok(token) = env::var(TELEGRAM_TOKEN) {
            self.bot.telegram.token = token;
        }

        if let Ok(symbols) = env::var(SYMBOLS) {
            self.collector.symbols = symbols
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    /// 設定檔未提供股票清單時改用預設的 NIFTY 50 成分股
    fn with_default_symbols(mut self) -> Self {
        if self.collector.symbols.is_empty() {
            logging::warn_file_async(
                "collector.symbols is empty, falling back to the NIFTY 50 universe".to_string(),
            );
            self.collector.symbols = DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect();
        }

        self
    }

    /// 進入輪詢前的必要設定檢查,缺漏時直接中止啟動
    pub fn validate(&self) -> Result<()> {
        if self.sheet.spreadsheet_id.is_empty() {
            return Err(anyhow!(
                "Missing sheet.spreadsheet_id (or the {} environment variable)",
                SHEET_ID
            ));
        }

        if self.sheet.token.is_empty() {
            return Err(anyhow!(
                "Missing sheet.token (or the {} environment variable)",
                SHEETS_TOKEN
            ));
        }

        self.sheet.sheet_mode()?;

        Ok(())
    }
}

impl Sheet {
    pub fn sheet_mode(&self) -> Result<SheetMode> {
        SheetMode::from_str(&self.mode)
            .map_err(|_| anyhow!("Unknown sheet.mode '{}', expected append or overwrite", self.mode))
    }
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}

fn default_nse_host() -> String {
    "www.nseindia.com".to_string()
}

fn default_nse_profile() -> String {
    "trade_info".to_string()
}

fn default_nse_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_nse_accept() -> String {
    "application/json".to_string()
}

fn default_nse_referer() -> String {
    "https://www.nseindia.com".to_string()
}

fn default_nse_request_timeout_secs() -> u64 {
    10
}

fn default_symbol_delay_millis() -> u64 {
    1000
}

fn default_cycle_interval_secs() -> u64 {
    60
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_sheet_mode() -> String {
    "append".to_string()
}

fn default_data_start_row() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_symbols_fill_in() {
        let app = App::default().with_default_symbols();

        assert_eq!(app.collector.symbols.len(), DEFAULT_SYMBOLS.len());
        assert_eq!(app.collector.symbols[0], "ADANIENT");
    }

    #[test]
    fn test_override_with_env() {
        env::set_var(SHEET_ID, "sheet-id-from-env");
        env::set_var(SYMBOLS, "RELIANCE, TCS,,INFY");

        let app = App::default().override_with_env();

        assert_eq!(app.sheet.spreadsheet_id, "sheet-id-from-env");
        assert_eq!(app.collector.symbols, vec!["RELIANCE", "TCS", "INFY"]);

        env::remove_var(SHEET_ID);
        env::remove_var(SYMBOLS);
    }

    #[test]
    fn test_validate_requires_sheet_settings() {
        let mut app = App::default();
        assert!(app.validate().is_err());

        app.sheet.spreadsheet_id = "id".to_string();
        app.sheet.token = "token".to_string();
        assert!(app.validate().is_ok());

        app.sheet.mode = "replace".to_string();
        assert!(app.validate().is_err());
    }
}
