/// 即時報價批次寫入表格
pub mod quote;
