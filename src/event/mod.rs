/// NIFTY 50 報價蒐集
pub mod nifty;
